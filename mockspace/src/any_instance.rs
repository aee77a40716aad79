// vim: tw=80
//! Stubs and expectations that apply to every instance of a class.
//!
//! An [`AnyInstanceRecorder`] keeps template entries per method name and
//! swaps the class's own table entry for an observer.  Because lookup walks
//! the superclass chain, instances of subclasses reach the observer too.  The
//! first time an instance actually receives an observed message, the observer
//! gives that instance its own [`Proxy`] seeded with copies of the templates.
//! From then on the instance's calls are handled by its proxy, with call
//! counts of its own.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::{Rc, Weak}
};

use tracing::debug;

use crate::{
    Error,
    Result,
    chain::{self, Chain},
    expectation::{Kind, MessageExpectation, Options, Origin},
    object::{Class, Method, Object, Owner},
    proxy::Proxy,
    registry::MethodRegistry,
    space::{Space, SpaceInner},
    target::MessageTarget,
    value::{Call, Symbol, Value}
};

struct RecorderInner {
    class: Class,
    space: Weak<SpaceInner>,
    registry: Rc<MethodRegistry>,
    /// Template entries, in the order they were configured.
    templates: RefCell<Vec<MessageExpectation>>,
    observing: RefCell<HashSet<Symbol>>,
    /// Proxies that received copies of the templates, by method name.
    materialized: RefCell<HashMap<Symbol, Vec<Proxy>>>,
}

/// The stubbing and expectation target for every instance of one class.
///
/// Obtained from [`Space::any_instance_recorder_for`]; there is exactly one
/// per class and space.
#[derive(Clone)]
pub struct AnyInstanceRecorder(Rc<RecorderInner>);

impl AnyInstanceRecorder {
    pub(crate) fn new(class: Class, space: Weak<SpaceInner>,
                      registry: Rc<MethodRegistry>) -> Self
    {
        AnyInstanceRecorder(Rc::new(RecorderInner {
            class,
            space,
            registry,
            templates: RefCell::default(),
            observing: RefCell::default(),
            materialized: RefCell::default()
        }))
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// The template entries configured for `name`, oldest first.
    pub fn expectations(&self, name: &str) -> Vec<MessageExpectation> {
        self.0.templates.borrow().iter()
            .filter(|e| e.name().as_str() == name)
            .cloned()
            .collect()
    }

    /// Is the class's lookup of `name` currently observed?
    pub fn is_observing(&self, name: &str) -> bool {
        self.0.observing.borrow().contains(name)
    }

    /// How many instances received copies of the templates for `name`.
    pub fn materialized_count(&self, name: &str) -> usize {
        self.0.materialized.borrow().get(name).map_or(0, Vec::len)
    }

    fn has_stub_template(&self, name: &Symbol) -> bool {
        self.0.templates.borrow().iter()
            .any(|e| e.name() == *name && e.is_stub())
    }

    #[track_caller]
    fn add(&self, name: Symbol, kind: Kind, options: Options)
        -> MessageExpectation
    {
        let receiver = format!("#<Any instance of {}>", self.0.class.name());
        let e = MessageExpectation::new(name.clone(), kind, options, receiver,
            Origin::AnyInstance(self.0.class.id()));
        self.0.templates.borrow_mut().push(e.clone());
        self.observe(&name);
        let proxies = self.0.materialized.borrow()
            .get(&name)
            .cloned()
            .unwrap_or_default();
        for proxy in proxies.iter() {
            proxy.adopt(e.replicate(proxy.object()));
        }
        e
    }

    fn observe(&self, name: &Symbol) {
        if !self.0.observing.borrow_mut().insert(name.clone()) {
            return;
        }
        let weak = Rc::downgrade(&self.0);
        let n = name.clone();
        let observer = Method::interceptor(move |recv, call| {
            match weak.upgrade() {
                Some(inner) => AnyInstanceRecorder(inner).playback(&n, recv, call),
                None => Err(Error::NoMethod {
                    method: n.to_string(),
                    receiver: recv.to_string()
                })
            }
        });
        let previous = self.0.class.set_own_method(name.clone(), observer);
        self.0.registry.save(Owner::Class(self.0.class.id()), name.clone(),
                             previous);
        debug!(class = %self.0.class, method = %name, "observing");
    }

    fn restore(&self, name: &Symbol) {
        if !self.0.observing.borrow_mut().remove(name) {
            return;
        }
        let owner = Owner::Class(self.0.class.id());
        match self.0.registry.take(owner, name) {
            Some(Some(original)) => {
                self.0.class.set_own_method(name.clone(), original);
            },
            _ => {
                self.0.class.remove_own_method(name.as_str());
            }
        }
        debug!(class = %self.0.class, method = %name, "restored");
    }

    /// Give `proxy` copies of the templates for `name`.  Returns whether
    /// there were any.
    pub(crate) fn materialize(&self, name: &Symbol, proxy: &Proxy) -> bool {
        let templates = self.expectations(name.as_str());
        if templates.is_empty() {
            return false;
        }
        let recv = proxy.object();
        for template in templates.iter() {
            proxy.adopt(template.replicate(recv));
        }
        let mut materialized = self.0.materialized.borrow_mut();
        let proxies = materialized.entry(name.clone()).or_default();
        if !proxies.iter().any(|p| p.object().id() == recv.id()) {
            proxies.push(proxy.clone());
        }
        debug!(class = %self.0.class, receiver = %recv, method = %name,
               "materialized proxy");
        true
    }

    /// Handle an instance's first call of an observed method.
    fn playback(&self, name: &Symbol, recv: &Object, call: &Call)
        -> Result<Value>
    {
        let space = self.0.space.upgrade().map(Space::from_inner);
        match space {
            Some(space) if !self.expectations(name.as_str()).is_empty() => {
                let proxy = space.proxy_for(recv);
                self.materialize(name, &proxy);
                proxy.dispatch(name, call)
            },
            // Nothing recorded at this level: behave as the real method
            _ => match self.0.registry.original_method(recv, name) {
                Some(m) => m.invoke(recv, call),
                None => Err(Error::NoMethod {
                    method: name.to_string(),
                    receiver: recv.to_string()
                })
            }
        }
    }

    /// The nearest superclass recorder with stubs for `name`.
    fn inherited_recorder(&self, name: &Symbol) -> Option<AnyInstanceRecorder>
    {
        let space = self.0.space.upgrade().map(Space::from_inner)?;
        self.0.class.ancestors()
            .skip(1)
            .filter_map(|c| space.existing_recorder(&c))
            .find(|r| r.has_stub_template(name))
    }

    /// Stop observing `name`, unless a superclass observes it too.  Then the
    /// observer stays as a pass-through so that this class's instances keep
    /// their real method.
    fn stop_observing(&self, name: &Symbol) {
        let shadowing = self.0.class.superclass()
            .and_then(|s| s.find_method(name.as_str()))
            .map_or(false, |m| m.is_interceptor());
        if shadowing {
            debug!(class = %self.0.class, method = %name,
                   "shadowing superclass interception");
        } else {
            self.restore(name);
        }
    }

    /// Every verification failure of the templates themselves.
    ///
    /// Copies held by instance proxies are verified with those proxies.
    pub(crate) fn failures(&self) -> Vec<Error> {
        let unclaimed = self.0.templates.borrow().iter()
            .filter(|e| e.is_unclaimed())
            .cloned()
            .collect::<Vec<_>>();
        let first = match unclaimed.first() {
            Some(first) => first,
            None => return Vec::new()
        };
        let mut names = unclaimed.iter()
            .map(|e| e.name().to_string())
            .collect::<Vec<_>>();
        names.dedup();
        let message = first.custom_message().unwrap_or_else(|| format!(
            "Exactly one instance should have received the following message(s) but didn't: {}",
            names.join(", ")));
        vec![Error::ExpectationNotSatisfied {
            message,
            call_site: Some(first.call_site())
        }]
    }

    /// Check that every expectation template was received by some instance.
    pub fn verify(&self) -> Result<()> {
        match self.failures().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    /// Restore every observed method and discard all templates.
    pub fn reset(&self) {
        let names = self.0.observing.borrow().iter()
            .cloned()
            .collect::<Vec<_>>();
        for name in names.iter() {
            self.restore(name);
        }
        self.0.templates.borrow_mut().clear();
        self.0.materialized.borrow_mut().clear();
    }
}

impl MessageTarget for AnyInstanceRecorder {
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

    /// Remove the stub templates for `name` and their copies on instances.
    ///
    /// Expectation templates and stubs configured directly on an instance
    /// stay.  If this class has no stubs for `name` but a superclass does,
    /// the superclass's stubs are removed instead.
    fn remove_stub(&self, name: &Symbol) -> Result<()> {
        let (removed, remaining) = {
            let mut templates = self.0.templates.borrow_mut();
            let before = templates.len();
            templates.retain(|e| !(e.name() == *name && e.is_stub()));
            let remaining = templates.iter().any(|e| e.name() == *name);
            (before - templates.len(), remaining)
        };
        if removed == 0 {
            return match self.inherited_recorder(name) {
                Some(recorder) => recorder.remove_stub(name),
                None => Err(Error::NotStubbed { method: name.to_string() })
            };
        }
        let proxies = {
            let mut materialized = self.0.materialized.borrow_mut();
            if remaining {
                materialized.get(name).cloned()
            } else {
                materialized.remove(name)
            }
        }.unwrap_or_default();
        for proxy in proxies.iter() {
            proxy.remove_any_instance_stubs(name, self.0.class.id());
        }
        if !remaining {
            self.stop_observing(name);
        }
        Ok(())
    }

    #[track_caller]
    fn add_stub_chain(&self, space: &Space, chain: Chain)
        -> Result<MessageExpectation>
    {
        chain::build(space, self, chain, Kind::Stub)
    }
}
