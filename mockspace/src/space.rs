// vim: tw=80
//! The lifetime of one test's doubles, proxies and recorders.

use std::{
    cell::RefCell,
    collections::HashMap,
    mem,
    panic::Location,
    rc::Rc
};

use tracing::{debug, warn};

use crate::{
    Error,
    Result,
    any_instance::AnyInstanceRecorder,
    config::{Configuration, Syntax},
    deprecation::{Deprecation, DeprecationReporter, TracingReporter},
    double::Double,
    object::{Class, ClassId, Object, ObjectId},
    proxy::Proxy,
    registry::MethodRegistry
};

#[derive(Clone)]
enum Tracked {
    Proxy(Proxy),
    Recorder(AnyInstanceRecorder),
}

impl Tracked {
    fn failures(&self) -> Vec<Error> {
        match self {
            Tracked::Proxy(p) => p.failures(),
            Tracked::Recorder(r) => r.failures(),
        }
    }

    fn reset(&self) {
        match self {
            Tracked::Proxy(p) => p.reset(),
            Tracked::Recorder(r) => r.reset(),
        }
    }
}

pub(crate) struct SpaceInner {
    configuration: RefCell<Configuration>,
    registry: Rc<MethodRegistry>,
    proxies: RefCell<HashMap<ObjectId, Proxy>>,
    recorders: RefCell<HashMap<ClassId, AnyInstanceRecorder>>,
    doubles: RefCell<Vec<Double>>,
    /// Proxies and recorders in the order they were created.
    tracked: RefCell<Vec<Tracked>>,
    deprecations: RefCell<Vec<&'static str>>,
    reporter: RefCell<Rc<dyn DeprecationReporter>>,
    double_class: Class,
}

impl SpaceInner {
    fn reset(&self) {
        let tracked = mem::take(&mut *self.tracked.borrow_mut());
        for t in tracked.iter().rev() {
            t.reset();
        }
        self.proxies.borrow_mut().clear();
        self.recorders.borrow_mut().clear();
        self.doubles.borrow_mut().clear();
        if !tracked.is_empty() {
            debug!(entries = tracked.len(), "space reset");
        }
    }
}

impl Drop for SpaceInner {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Everything one test configured.
///
/// A `Space` tracks every [`Proxy`], [`AnyInstanceRecorder`] and [`Double`]
/// created through it.  [`verify_all`](#method.verify_all) checks their
/// expectations, and [`reset_all`](#method.reset_all) restores every method
/// they intercepted.  Dropping the space resets it too, so interception never
/// outlives the space, even when a test panics.
///
/// # Examples
/// ```
/// # use mockspace::*;
/// # use mockspace::syntax::should::Should;
/// let result = Space::scope(|space| {
///     let d = space.double("a mock");
///     d.should_receive(space, "message")?;
///     Ok(())
/// });
/// assert!(matches!(result, Err(Error::ExpectationNotSatisfied{..})));
/// ```
pub struct Space(Rc<SpaceInner>);

impl Space {
    pub fn new() -> Self {
        Space::with_configuration(Configuration::default())
    }

    pub fn with_configuration(configuration: Configuration) -> Self {
        Space(Rc::new(SpaceInner {
            configuration: RefCell::new(configuration),
            registry: Rc::new(MethodRegistry::new()),
            proxies: RefCell::default(),
            recorders: RefCell::default(),
            doubles: RefCell::default(),
            tracked: RefCell::default(),
            deprecations: RefCell::default(),
            reporter: RefCell::new(Rc::new(TracingReporter)),
            double_class: Class::new("Double")
        }))
    }

    pub(crate) fn from_inner(inner: Rc<SpaceInner>) -> Self {
        Space(inner)
    }

    /// Run `f` with a fresh space, then verify it.  The space is reset
    /// whether or not `f` or the verification failed.
    pub fn scope<F>(f: F) -> Result<()>
        where F: FnOnce(&Space) -> Result<()>
    {
        let space = Space::new();
        let result = f(&space).and_then(|()| space.verify_all());
        space.reset_all();
        result
    }

    pub fn configuration(&self) -> Configuration {
        self.0.configuration.borrow().clone()
    }

    /// Adjust the configuration in place.
    pub fn configure<F>(&self, f: F)
        where F: FnOnce(&mut Configuration)
    {
        f(&mut self.0.configuration.borrow_mut());
    }

    /// Send deprecation reports to `reporter` instead of the log.
    pub fn set_deprecation_reporter<R>(&self, reporter: R)
        where R: DeprecationReporter + 'static
    {
        *self.0.reporter.borrow_mut() = Rc::new(reporter);
    }

    /// The capabilities a deprecation was already reported for.
    pub fn deprecations(&self) -> Vec<String> {
        self.0.deprecations.borrow().iter()
            .map(|s| (*s).to_owned())
            .collect()
    }

    /// The saved originals of every method currently intercepted.
    pub fn registry(&self) -> &MethodRegistry {
        &self.0.registry
    }

    /// Create a labeled double.
    pub fn double(&self, label: &str) -> Double {
        self.make_double(Some(label.to_owned()))
    }

    pub fn anonymous_double(&self) -> Double {
        self.make_double(None)
    }

    fn make_double(&self, label: Option<String>) -> Double {
        let d = Double::new(Object::double(self.0.double_class.clone(), label));
        self.0.doubles.borrow_mut().push(d.clone());
        d
    }

    /// The proxy for `object`, created on first use.
    pub fn proxy_for(&self, object: &Object) -> Proxy {
        if let Some(p) = self.0.proxies.borrow().get(&object.id()) {
            return p.clone();
        }
        let p = Proxy::new(object.clone(), self.0.registry.clone(),
                           Rc::downgrade(&self.0));
        self.0.proxies.borrow_mut().insert(object.id(), p.clone());
        self.0.tracked.borrow_mut().push(Tracked::Proxy(p.clone()));
        p
    }

    /// The recorder for `class`, created on first use.
    pub fn any_instance_recorder_for(&self, class: &Class)
        -> AnyInstanceRecorder
    {
        if let Some(r) = self.existing_recorder(class) {
            return r;
        }
        let r = AnyInstanceRecorder::new(class.clone(), Rc::downgrade(&self.0),
                                         self.0.registry.clone());
        self.0.recorders.borrow_mut().insert(class.id(), r.clone());
        self.0.tracked.borrow_mut().push(Tracked::Recorder(r.clone()));
        r
    }

    pub(crate) fn existing_recorder(&self, class: &Class)
        -> Option<AnyInstanceRecorder>
    {
        self.0.recorders.borrow().get(&class.id()).cloned()
    }

    /// One recorder per class `any_instance` was used on.
    pub fn any_instance_recorders(&self) -> Vec<AnyInstanceRecorder> {
        self.tracked(|t| match t {
            Tracked::Recorder(r) => Some(r.clone()),
            _ => None
        })
    }

    pub fn proxies(&self) -> Vec<Proxy> {
        self.tracked(|t| match t {
            Tracked::Proxy(p) => Some(p.clone()),
            _ => None
        })
    }

    pub fn doubles(&self) -> Vec<Double> {
        self.0.doubles.borrow().clone()
    }

    fn tracked<T, F>(&self, f: F) -> Vec<T>
        where F: Fn(&Tracked) -> Option<T>
    {
        self.0.tracked.borrow().iter().filter_map(f).collect()
    }

    /// Verify every expectation configured in this space.
    ///
    /// Returns the first failure.  Any further failures are logged.
    pub fn verify_all(&self) -> Result<()> {
        let tracked = self.0.tracked.borrow().clone();
        let mut failures = tracked.iter().flat_map(Tracked::failures);
        let first = failures.next();
        for e in failures {
            warn!(error = %e, "further expectation failure");
        }
        match first {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    /// Restore every intercepted method, newest interception first, and
    /// forget all proxies, recorders and doubles.  Safe to call repeatedly.
    pub fn reset_all(&self) {
        self.0.reset();
    }

    /// Check that the legacy syntax may be used, reporting its deprecation
    /// once per capability.
    #[track_caller]
    pub(crate) fn legacy(&self, capability: &'static str,
                         replacement: &'static str) -> Result<()>
    {
        let location = Location::caller();
        let (enabled, deprecated) = {
            let c = self.0.configuration.borrow();
            (c.is_enabled(Syntax::Should), c.should_is_deprecated())
        };
        if !enabled {
            return Err(Error::NoMethod {
                method: capability.to_owned(),
                receiver: "a receiver without the `:should` syntax".to_owned()
            });
        }
        if deprecated {
            {
                let mut seen = self.0.deprecations.borrow_mut();
                if seen.contains(&capability) {
                    return Ok(());
                }
                seen.push(capability);
            }
            let deprecation = Deprecation::legacy_syntax(capability,
                                                         replacement,
                                                         location);
            let reporter = self.0.reporter.borrow().clone();
            reporter.deprecate(&deprecation);
        }
        Ok(())
    }

    /// Check that the `expect` syntax may be used.
    pub(crate) fn modern(&self, capability: &'static str) -> Result<()> {
        if self.0.configuration.borrow().is_enabled(Syntax::Expect) {
            Ok(())
        } else {
            Err(Error::NoMethod {
                method: capability.to_owned(),
                receiver: "a space without the `:expect` syntax".to_owned()
            })
        }
    }
}

impl Default for Space {
    fn default() -> Self {
        Space::new()
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{Value, expectation::Options, target::MessageTarget};

    #[test]
    fn reset_restores_in_reverse_order() {
        let space = Space::new();
        let class = Class::new("Foo");
        class.define("foo", |_, _| Ok(Value::from("real")));
        let obj = class.new_instance();
        space.any_instance_recorder_for(&class)
            .add_stub("foo".into(), Options::default())
            .and_return("stubbed").unwrap();
        assert_eq!(Value::from("stubbed"), obj.send("foo", ()).unwrap());
        assert_eq!(1, space.proxies().len());
        space.reset_all();
        space.reset_all();
        assert!(space.registry().is_empty());
        assert!(space.proxies().is_empty());
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }

    #[test]
    fn drop_resets() {
        let class = Class::new("Foo");
        class.define("foo", |_, _| Ok(Value::from("real")));
        let obj = class.new_instance();
        {
            let space = Space::new();
            space.proxy_for(&obj)
                .add_stub("foo".into(), Options::default())
                .and_return(1).unwrap();
            assert_eq!(Value::from(1), obj.send("foo", ()).unwrap());
        }
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }

    #[test]
    fn disabled_syntax() {
        let space = Space::new();
        space.configure(|c| c.set_syntax([Syntax::Expect]));
        let e = space.legacy("stub", "").unwrap_err();
        assert!(matches!(e, Error::NoMethod{..}));
        assert!(space.modern("allow").is_ok());
    }
}
