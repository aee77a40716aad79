// vim: tw=80
//! Per-object interception.
//!
//! A [`Proxy`] owns every stub and expectation configured on one object.  The
//! first entry configured for a method name swaps that object's own table
//! entry for an interceptor; removing the last entry for the name writes the
//! saved entry back.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::{Rc, Weak}
};

use tracing::{debug, trace};

use crate::{
    Error,
    Result,
    chain::{self, Chain},
    expectation::{Kind, MessageExpectation, Options, Origin},
    object::{ClassId, Method, Object, Owner},
    registry::MethodRegistry,
    space::{Space, SpaceInner},
    target::MessageTarget,
    value::{Call, Symbol, Value}
};

struct ProxyInner {
    object: Object,
    registry: Rc<MethodRegistry>,
    space: Weak<SpaceInner>,
    /// Every entry, in the order it was configured.
    entries: RefCell<Vec<MessageExpectation>>,
    intercepted: RefCell<HashSet<Symbol>>,
}

/// The stubbing and expectation target for a single object.
///
/// Obtained from [`Space::proxy_for`]; there is at most one per object and
/// space.
#[derive(Clone)]
pub struct Proxy(Rc<ProxyInner>);

/// Pick the entry that handles a call among entries of one priority layer.
///
/// Expectations are tried in configuration order, skipping those that
/// already received their maximum.  Stubs constrained by arguments beat
/// unconstrained ones, and newer stubs beat older ones.  An exhausted
/// expectation yields to a matching stub.
fn select<'a, I>(entries: I, args: &[Value]) -> Option<MessageExpectation>
    where I: Iterator<Item = &'a MessageExpectation>
{
    let (stubs, expectations): (Vec<_>, Vec<_>) = entries
        .filter(|e| e.matches(args))
        .partition(|e| e.is_stub());
    let expectation = expectations.iter()
        .find(|e| !e.called_max_times())
        .or_else(|| expectations.first());
    let stub = stubs.iter()
        .rev()
        .find(|e| e.is_specific())
        .or_else(|| stubs.last());
    match (expectation, stub) {
        (Some(e), Some(s)) if e.called_max_times() => Some((*s).clone()),
        (Some(e), _) => Some((*e).clone()),
        (None, s) => s.map(|s| (*s).clone())
    }
}

impl Proxy {
    pub(crate) fn new(object: Object, registry: Rc<MethodRegistry>,
                      space: Weak<SpaceInner>) -> Self
    {
        Proxy(Rc::new(ProxyInner {
            object,
            registry,
            space,
            entries: RefCell::default(),
            intercepted: RefCell::default()
        }))
    }

    /// The object this proxy intercepts.
    pub fn object(&self) -> &Object {
        &self.0.object
    }

    /// All entries configured for `name`, oldest first.
    pub fn expectations(&self, name: &str) -> Vec<MessageExpectation> {
        self.0.entries.borrow().iter()
            .filter(|e| e.name().as_str() == name)
            .cloned()
            .collect()
    }

    /// Is a send of `name` to the object currently intercepted?
    pub fn is_intercepting(&self, name: &str) -> bool {
        self.0.intercepted.borrow().contains(name)
    }

    #[track_caller]
    fn add(&self, name: Symbol, kind: Kind, options: Options)
        -> MessageExpectation
    {
        let e = MessageExpectation::new(name, kind, options,
            self.0.object.to_string(), Origin::Direct);
        self.push(e.clone());
        e
    }

    /// Take over an entry copied from an `any_instance` template.
    pub(crate) fn adopt(&self, e: MessageExpectation) {
        self.push(e);
    }

    fn push(&self, e: MessageExpectation) {
        let name = e.name();
        self.0.entries.borrow_mut().push(e);
        self.intercept(&name);
    }

    fn intercept(&self, name: &Symbol) {
        if !self.0.intercepted.borrow_mut().insert(name.clone()) {
            return;
        }
        let weak = Rc::downgrade(&self.0);
        let n = name.clone();
        let interceptor = Method::interceptor(move |recv, call| {
            match weak.upgrade() {
                Some(inner) => Proxy(inner).dispatch(&n, call),
                None => Err(Error::NoMethod {
                    method: n.to_string(),
                    receiver: recv.to_string()
                })
            }
        });
        let previous = self.0.object.set_singleton_method(name.clone(),
                                                          interceptor);
        self.0.registry.save(Owner::Object(self.0.object.id()), name.clone(),
                             previous);
        debug!(receiver = %self.0.object, method = %name, "intercepting");
    }

    fn restore(&self, name: &Symbol) {
        if !self.0.intercepted.borrow_mut().remove(name) {
            return;
        }
        let owner = Owner::Object(self.0.object.id());
        match self.0.registry.take(owner, name) {
            Some(Some(original)) => {
                self.0.object.set_singleton_method(name.clone(), original);
            },
            _ => {
                self.0.object.remove_singleton_method(name.as_str());
            }
        }
        debug!(receiver = %self.0.object, method = %name, "restored");
    }

    /// Route an intercepted call to the entry that should handle it.
    pub(crate) fn dispatch(&self, name: &Symbol, call: &Call) -> Result<Value>
    {
        let candidates = self.expectations(name.as_str());
        trace!(receiver = %self.0.object, method = %name,
               args = %call.describe_args(), "intercepted");
        let direct = candidates.iter().filter(|e| e.origin() == Origin::Direct);
        let inherited = candidates.iter()
            .filter(|e| e.origin() != Origin::Direct);
        let found = select(direct, &call.args)
            .or_else(|| select(inherited, &call.args));
        let has_inherited = candidates.iter()
            .any(|e| e.origin() != Origin::Direct);
        match found {
            Some(e) => {
                e.invoke(call, &|c: &Call| self.call_original(name, c))
            },
            None if !has_inherited && self.materialize(name) => {
                self.dispatch(name, call)
            },
            None if candidates.is_empty() => self.call_original(name, call),
            None if candidates.iter().any(MessageExpectation::is_negative) => {
                // Calls a negative expectation doesn't forbid pass through
                match self.0.registry.original_method(&self.0.object, name) {
                    Some(m) => m.invoke(&self.0.object, call),
                    None => Ok(Value::Nil)
                }
            },
            None => Err(self.unmatched(name, call, &candidates))
        }
    }

    /// Copy in the `any_instance` templates that the class lookup of `name`
    /// would reach, as if the object's first call had gone to the class.
    /// Returns whether any were copied.
    fn materialize(&self, name: &Symbol) -> bool {
        let space = match self.0.space.upgrade() {
            Some(inner) => Space::from_inner(inner),
            None => return false
        };
        let observer = self.0.object.class().ancestors()
            .find_map(|c| c.own_method(name.as_str()).map(|m| (c, m)));
        match observer {
            Some((class, m)) if m.is_interceptor() => {
                space.existing_recorder(&class)
                    .map_or(false, |r| r.materialize(name, self))
            },
            _ => false
        }
    }

    fn call_original(&self, name: &Symbol, call: &Call) -> Result<Value> {
        match self.0.registry.original_method(&self.0.object, name) {
            Some(m) => m.invoke(&self.0.object, call),
            None => Err(Error::NoMethod {
                method: name.to_string(),
                receiver: self.0.object.to_string()
            })
        }
    }

    fn unmatched(&self, name: &Symbol, call: &Call,
                 candidates: &[MessageExpectation]) -> Error
    {
        let expected = candidates.iter()
            .map(|e| match e.constraint().explain(&call.args) {
                Some(why) => format!("{} ({})", e.describe(), why),
                None => e.describe()
            }).collect();
        Error::UnexpectedArguments {
            receiver: self.0.object.to_string(),
            method: name.to_string(),
            args: call.describe_args(),
            expected
        }
    }

    /// Remove the entries for `name` selected by `f`, restoring the original
    /// method when none remain.  Returns how many were removed.
    fn remove_where<F>(&self, name: &Symbol, f: F) -> usize
        where F: Fn(&MessageExpectation) -> bool
    {
        let (removed, remaining) = {
            let mut entries = self.0.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|e| !(e.name() == *name && f(e)));
            let remaining = entries.iter().any(|e| e.name() == *name);
            (before - entries.len(), remaining)
        };
        if removed > 0 && !remaining {
            self.restore(name);
        }
        removed
    }

    /// Remove the stubs copied from the `any_instance` templates of `class`.
    pub(crate) fn remove_any_instance_stubs(&self, name: &Symbol,
                                            class: ClassId) -> usize
    {
        self.remove_where(name, |e| {
            e.is_stub() && e.origin() == Origin::AnyInstance(class)
        })
    }

    /// Every verification failure of this proxy's expectations.
    pub(crate) fn failures(&self) -> Vec<Error> {
        let entries = self.0.entries.borrow().clone();
        entries.iter()
            .filter_map(|e| e.verify().err())
            .collect()
    }

    /// Check every expectation configured on the object.
    pub fn verify(&self) -> Result<()> {
        match self.failures().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    /// Restore every intercepted method and discard all entries.
    pub fn reset(&self) {
        let names = self.0.intercepted.borrow().iter()
            .cloned()
            .collect::<Vec<_>>();
        for name in names.iter() {
            self.restore(name);
        }
        self.0.entries.borrow_mut().clear();
    }
}

impl MessageTarget for Proxy {
    #[track_caller]
    fn add_stub(&self, name: Symbol, options: Options) -> MessageExpectation {
        self.add(name, Kind::Stub, options)
    }

    #[track_caller]
    fn add_message_expectation(&self, name: Symbol, options: Options)
        -> MessageExpectation
    {
        self.add(name, Kind::Expectation, options)
    }

    #[track_caller]
    fn add_negative_message_expectation(&self, name: Symbol, options: Options)
        -> MessageExpectation
    {
        self.add(name, Kind::Negative, options)
    }

    fn remove_stub(&self, name: &Symbol) -> Result<()> {
        if self.remove_where(name, MessageExpectation::is_stub) == 0 {
            Err(Error::NotStubbed { method: name.to_string() })
        } else {
            Ok(())
        }
    }

    #[track_caller]
    fn add_stub_chain(&self, space: &Space, chain: Chain)
        -> Result<MessageExpectation>
    {
        chain::build(space, self, chain, Kind::Stub)
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{args, object::Class};

    fn proxy() -> Proxy {
        let class = Class::new("Widget");
        class.define("size", |_, _| Ok(Value::from(10)));
        Proxy::new(class.new_instance(), Rc::new(MethodRegistry::new()),
                   Weak::new())
    }

    #[test]
    fn newest_stub_wins() {
        let p = proxy();
        p.add_stub("size".into(), Options::default()).and_return(1).unwrap();
        p.add_stub("size".into(), Options::default()).and_return(2).unwrap();
        assert_eq!(Value::from(2), p.object().send("size", ()).unwrap());
        assert_eq!(2, p.expectations("size").len());
    }

    #[test]
    fn constrained_stub_beats_unconstrained() {
        let p = proxy();
        p.add_stub("size".into(), Options::default())
            .with(args![1]).unwrap()
            .and_return(1).unwrap();
        p.add_stub("size".into(), Options::default()).and_return(2).unwrap();
        assert_eq!(Value::from(1), p.object().send("size", args![1]).unwrap());
        assert_eq!(Value::from(2), p.object().send("size", args![3]).unwrap());
    }

    #[test]
    fn exhausted_expectation_yields_to_stub() {
        let p = proxy();
        p.add_stub("size".into(), Options::default()).and_return(1).unwrap();
        p.add_message_expectation("size".into(), Options::default())
            .and_return(2).unwrap();
        assert_eq!(Value::from(2), p.object().send("size", ()).unwrap());
        assert_eq!(Value::from(1), p.object().send("size", ()).unwrap());
        assert!(p.verify().is_ok());
    }

    #[test]
    fn unmatched_arguments() {
        let p = proxy();
        p.add_stub("size".into(), Options::default())
            .with(args![1]).unwrap();
        let e = p.object().send("size", args![2]).unwrap_err();
        match e {
            Error::UnexpectedArguments{method, args, expected, ..} => {
                assert_eq!("size", method);
                assert_eq!("(2)", args);
                assert_eq!(vec!["stub with (1) (2 != 1)".to_owned()], expected);
            },
            other => panic!("Unexpected error {:?}", other)
        }
    }

    #[test]
    fn call_original_reaches_class_method() {
        let p = proxy();
        p.add_stub("size".into(), Options::default())
            .and_call_original().unwrap();
        assert_eq!(Value::from(10), p.object().send("size", ()).unwrap());
    }

    #[test]
    fn remove_stub_restores_and_keeps_expectations() {
        let p = proxy();
        p.add_message_expectation("size".into(), Options::default())
            .and_return(5).unwrap();
        p.add_stub("size".into(), Options::default()).and_return(1).unwrap();
        p.remove_stub(&"size".into()).unwrap();
        assert!(p.is_intercepting("size"));
        assert_eq!(Value::from(5), p.object().send("size", ()).unwrap());
        let e = p.remove_stub(&"size".into()).unwrap_err();
        assert_eq!("The method `size` was not stubbed or was already unstubbed",
                   e.to_string());
    }

    #[test]
    fn reset_is_idempotent() {
        let p = proxy();
        p.add_stub("size".into(), Options::default()).and_return(1).unwrap();
        p.reset();
        p.reset();
        assert!(!p.is_intercepting("size"));
        assert!(p.0.registry.is_empty());
        assert_eq!(Value::from(10), p.object().send("size", ()).unwrap());
    }
}
