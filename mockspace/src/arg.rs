// vim: tw=80
//! Argument constraints for [`with`](crate::MessageExpectation::with).
//!
//! A plain value constrains its position by equality.  Anything implementing
//! [`Predicate<Value>`](crate::Predicate) can be used instead with
//! [`satisfies`], and [`anything`] accepts every value.
//!
//! # Examples
//! ```
//! # use mockspace::*;
//! let constraint = ArgConstraint::from(params![
//!     1,
//!     arg::anything(),
//!     arg::function(|v: &Value| matches!(v, Value::Int(i) if *i > 3))
//! ]);
//! assert!(constraint.matches(&args![1, "x", 4]));
//! assert!(!constraint.matches(&args![1, "x", 2]));
//! ```

use std::{fmt, rc::Rc};

use predicates::prelude::*;
use predicates_tree::CaseTreeExt;

use crate::{
    object::Object,
    value::{Symbol, Value}
};

/// A constraint on one positional argument.
#[derive(Clone)]
pub enum ArgMatcher {
    /// Equal to the given value.
    Eq(Value),
    /// Any value at all.
    Anything,
    /// Accepted by a predicate.
    Pred(Rc<dyn Predicate<Value>>),
}

impl ArgMatcher {
    pub fn matches(&self, v: &Value) -> bool {
        match self {
            ArgMatcher::Eq(expected) => expected == v,
            ArgMatcher::Anything => true,
            ArgMatcher::Pred(p) => p.eval(v)
        }
    }

    /// Explain why `v` fails this matcher, if it does.
    fn explain(&self, v: &Value) -> Option<String> {
        match self {
            ArgMatcher::Eq(expected) if expected != v =>
                Some(format!("{} != {}", v, expected)),
            ArgMatcher::Pred(p) => p.find_case(false, v)
                .map(|case| case.tree().to_string()),
            _ => None
        }
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgMatcher::Eq(v) => write!(f, "{}", v),
            ArgMatcher::Anything => f.write_str("anything"),
            ArgMatcher::Pred(p) => write!(f, "{}", p)
        }
    }
}

/// Conversion into an [`ArgMatcher`], used by [`params!`](crate::params).
pub trait IntoArgMatcher {
    fn into_arg_matcher(self) -> ArgMatcher;
}

impl IntoArgMatcher for ArgMatcher {
    fn into_arg_matcher(self) -> ArgMatcher {
        self
    }
}

macro_rules! into_eq_matcher {
    ($($ty:ty),*) => {
        $(
            impl IntoArgMatcher for $ty {
                fn into_arg_matcher(self) -> ArgMatcher {
                    ArgMatcher::Eq(Value::from(self))
                }
            }
        )*
    }
}

into_eq_matcher!(Value, (), bool, i32, i64, u32, usize, f64, &str, String,
                 Symbol, Object, &Object);

/// Accept any value in this position.
pub fn anything() -> ArgMatcher {
    ArgMatcher::Anything
}

/// Require equality with `v`.
pub fn eq<V: Into<Value>>(v: V) -> ArgMatcher {
    ArgMatcher::Eq(v.into())
}

/// Accept values for which `p` holds.
pub fn satisfies<P>(p: P) -> ArgMatcher
    where P: Predicate<Value> + 'static
{
    ArgMatcher::Pred(Rc::new(p))
}

/// Accept values for which `f` returns true.  Shorthand for
/// `satisfies(predicate::function(f))`.
pub fn function<F>(f: F) -> ArgMatcher
    where F: Fn(&Value) -> bool + 'static
{
    satisfies(predicate::function(f))
}

/// The argument constraint of one expectation.
#[derive(Clone, Debug, Default)]
pub enum ArgConstraint {
    /// No `with` was given: any arguments match.
    #[default]
    Any,
    /// Positional constraints; the argument count must match too.
    List(Vec<ArgMatcher>),
}

impl ArgConstraint {
    pub fn matches(&self, args: &[Value]) -> bool {
        match self {
            ArgConstraint::Any => true,
            ArgConstraint::List(ms) => ms.len() == args.len() &&
                ms.iter().zip(args).all(|(m, a)| m.matches(a))
        }
    }

    /// Does this constraint restrict the arguments at all?
    pub fn is_specific(&self) -> bool {
        matches!(self, ArgConstraint::List(_))
    }

    /// Explain why `args` fail this constraint.
    pub(crate) fn explain(&self, args: &[Value]) -> Option<String> {
        match self {
            ArgConstraint::Any => None,
            ArgConstraint::List(ms) if ms.len() != args.len() =>
                Some(format!("expected {} argument(s), got {}", ms.len(),
                             args.len())),
            ArgConstraint::List(ms) => ms.iter()
                .zip(args)
                .find_map(|(m, a)| m.explain(a))
        }
    }
}

impl fmt::Display for ArgConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgConstraint::Any => f.write_str("any arguments"),
            ArgConstraint::List(ms) if ms.is_empty() =>
                f.write_str("no arguments"),
            ArgConstraint::List(ms) => {
                let inner = ms.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({})", inner)
            }
        }
    }
}

impl From<Vec<ArgMatcher>> for ArgConstraint {
    fn from(ms: Vec<ArgMatcher>) -> Self {
        ArgConstraint::List(ms)
    }
}

impl From<Vec<Value>> for ArgConstraint {
    fn from(vs: Vec<Value>) -> Self {
        ArgConstraint::List(vs.into_iter().map(ArgMatcher::Eq).collect())
    }
}

impl From<&[Value]> for ArgConstraint {
    fn from(vs: &[Value]) -> Self {
        ArgConstraint::from(vs.to_vec())
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(ArgConstraint::Any.matches(&[]));
        assert!(ArgConstraint::Any.matches(&[Value::from(1)]));
        assert!(!ArgConstraint::Any.is_specific());
    }

    #[test]
    fn list_requires_same_arity() {
        let c = ArgConstraint::from(vec![Value::from(1)]);
        assert!(c.matches(&[Value::from(1)]));
        assert!(!c.matches(&[Value::from(1), Value::from(2)]));
        assert_eq!(Some("expected 1 argument(s), got 2".to_owned()),
            c.explain(&[Value::from(1), Value::from(2)]));
    }

    #[test]
    fn predicate_explanation() {
        let c = ArgConstraint::from(vec![
            function(|v: &Value| matches!(v, Value::Int(_)))
        ]);
        assert!(c.matches(&[Value::from(3)]));
        assert!(c.explain(&[Value::from("x")]).is_some());
    }

    #[test]
    fn display() {
        let c = ArgConstraint::from(vec![eq(1), anything()]);
        assert_eq!("(1, anything)", c.to_string());
        assert_eq!("no arguments", ArgConstraint::List(vec![]).to_string());
    }
}
