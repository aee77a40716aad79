// vim: tw=80
//! Test doubles and method stubbing for dynamically dispatched objects.
//!
//! Mockspace temporarily replaces the behavior of a method on a single
//! object, on every instance of a class (including subclasses), or on a
//! standalone double, and later verifies that the expected calls happened.
//! Everything it changes is undone when the test's [`Space`] is reset.
//!
//! # Usage
//!
//! Stubs are installed into explicit method tables.  A [`Class`] holds one,
//! and so does every [`Object`].  Define methods with closures, or install
//! the inherent methods of a Rust type with [`#[methods]`](methods):
//!
//! ```
//! # use mockspace::*;
//! struct Greeter {
//!     name: String
//! }
//!
//! #[methods]
//! impl Greeter {
//!     fn greet(&self, greeting: String) -> String {
//!         format!("{}, {}", greeting, self.name)
//!     }
//! }
//!
//! let class = Class::with_methods::<Greeter>();
//! let obj = class.instantiate(Greeter { name: "world".to_owned() });
//! assert_eq!(Value::from("hello, world"), obj.send("greet", args!["hello"]).unwrap());
//! ```
//!
//! Each test creates a [`Space`].  Every stub and expectation is configured
//! through it, using either of two spellings.  The current one goes through
//! the space:
//!
//! ```
//! # use mockspace::*;
//! # fn main() -> Result<()> {
//! let space = Space::new();
//! let d = space.double("a mock");
//! space.allow(&d)?.to_receive("foo").and_return(1)?;
//! space.expect(&d)?.to_receive("bar").with(args![2])?.twice()?;
//! assert_eq!(Value::from(1), d.send("foo", ())?);
//! d.send("bar", args![2])?;
//! d.send("bar", args![2])?;
//! space.verify_all()
//! # }
//! ```
//!
//! The legacy one configures messages on the receiver with the
//! [`Should`](syntax::should::Should) and
//! [`AnyInstanceSyntax`](syntax::should::AnyInstanceSyntax) traits.  Using it
//! without enabling it in the [`Configuration`] is reported once per
//! capability to the space's [`DeprecationReporter`].
//!
//! # Matching Calls
//!
//! When a stubbed method is called, the entry that handles it is chosen among
//! those configured for its name.  Expectations come first, in configuration
//! order, until they reach their maximum number of calls.  Then stubs are
//! tried, argument-constrained stubs before unconstrained ones and newer stubs
//! before older ones.  Entries configured directly on an object beat those
//! copied from an `any_instance` template.  A call that nothing matches fails
//! with [`Error::UnexpectedArguments`].
//!
//! Argument constraints are given with
//! [`with`](MessageExpectation::with).  Plain values match by equality, and
//! the [`arg`] module provides wildcards and predicates:
//!
//! ```
//! # use mockspace::*;
//! # fn main() -> Result<()> {
//! let space = Space::new();
//! let d = space.double("a mock");
//! space.allow(&d)?.to_receive("foo")
//!     .with(params![
//!         arg::anything(),
//!         arg::satisfies(predicate::in_iter([Value::from(1), Value::from(2)]))
//!     ])?
//!     .and_return("small")?;
//! assert_eq!(Value::from("small"), d.send("foo", args!["x", 2])?);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuring Expectations
//!
//! A [`MessageExpectation`] is configured with qualifiers, in order: first
//! an argument constraint, then a call count, then yields, and finally one
//! action.  The actions (`and_return`, `and_raise`, ...) return nothing
//! further to configure.  A qualifier applied out of order fails with
//! [`Error::NoMethod`], as if it didn't exist.
//!
//! Sequential return values are given with
//! [`and_return_values`](MessageExpectation::and_return_values).  After the
//! last one, it repeats.
//!
//! # Every Instance of a Class
//!
//! [`Space::allow_any_instance_of`], [`Space::expect_any_instance_of`] and
//! [`any_instance`](syntax::should::AnyInstanceSyntax::any_instance)
//! configure templates on the class's [`AnyInstanceRecorder`].  Every
//! instance, existing or future, and every instance of a subclass observes
//! them.  An instance that actually receives one of the messages gets its own
//! [`Proxy`] holding copies of the templates, with call counts of its own.
//! A positive expectation must be received by exactly one instance.
//!
//! # Verification and Reset
//!
//! [`Space::verify_all`] checks every expectation, and [`Space::reset_all`]
//! restores every intercepted method.  [`Space::scope`] does both around a
//! closure.  Dropping a `Space` resets it.
//!
//! # Logging
//!
//! Mockspace logs with [`tracing`](https://docs.rs/tracing).  Installing and
//! restoring interceptions are logged at `DEBUG`, every intercepted call at
//! `TRACE`, and deprecation reports at `WARN`.

mod any_instance;
pub mod arg;
mod chain;
mod config;
mod deprecation;
mod double;
mod error;
mod expectation;
mod object;
mod proxy;
mod registry;
mod space;
pub mod syntax;
mod target;
mod value;

pub use mockspace_derive::methods;
pub use predicates::prelude::{Predicate, predicate};

pub use crate::{
    any_instance::AnyInstanceRecorder,
    arg::{ArgConstraint, ArgMatcher},
    chain::Chain,
    config::{Configuration, Syntax},
    deprecation::{Deprecation, DeprecationReporter, TracingReporter},
    double::Double,
    error::{Error, Result},
    expectation::{Kind, MessageExpectation, Options, Origin, Stage, Times},
    object::{
        Ancestors,
        Class,
        ClassId,
        Method,
        MethodKind,
        Methods,
        Object,
        ObjectId,
        Owner,
        Payload
    },
    proxy::Proxy,
    registry::MethodRegistry,
    space::Space,
    target::MessageTarget,
    value::{Block, Call, FromValue, Symbol, Value}
};

/// Build a list of [`ArgMatcher`]s for
/// [`with`](MessageExpectation::with).
///
/// Each argument is either an [`ArgMatcher`] or a plain value, which matches
/// by equality.
///
/// # Examples
/// ```
/// # use mockspace::*;
/// let c = ArgConstraint::from(params![1, arg::anything()]);
/// assert!(c.matches(&args![1, "x"]));
/// ```
#[macro_export]
macro_rules! params {
    () => { ::std::vec::Vec::<$crate::ArgMatcher>::new() };
    ($($e:expr),+ $(,)?) => {
        vec![$($crate::arg::IntoArgMatcher::into_arg_matcher($e)),+]
    };
}
