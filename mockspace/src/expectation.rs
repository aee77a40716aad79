// vim: tw=80
//! A single configured stub or expectation.

use std::{
    cell::RefCell,
    fmt,
    ops::Range,
    panic::Location,
    rc::Rc
};

use crate::{
    Error,
    Result,
    arg::ArgConstraint,
    object::{ClassId, Object, ObjectId},
    value::{Call, Symbol, Value}
};

/// Options accepted when a stub or expectation is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    /// Reported as the call site of a verification failure.
    pub expected_from: Option<String>,
    /// Replaces the generated text of a verification failure.
    pub message: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_from<S: Into<String>>(mut self, site: S) -> Self {
        self.expected_from = Some(site.into());
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// How many calls an expectation allows.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Times {
    range: Range<usize>
}

impl Times {
    pub fn any() -> Self {
        Times { range: 0..usize::MAX }
    }

    /// `usize::MAX` calls can never be counted, so it means "at least".
    pub fn exactly(n: usize) -> Self {
        Times { range: n..n.saturating_add(1) }
    }

    pub fn never() -> Self {
        Times::exactly(0)
    }

    pub fn at_least(n: usize) -> Self {
        Times { range: n..usize::MAX }
    }

    pub fn at_most(n: usize) -> Self {
        Times { range: 0..n.saturating_add(1) }
    }

    /// May the expectation receive its `count`th call?
    pub fn allows(&self, count: usize) -> bool {
        count < self.range.end
    }

    /// Has the expectation already been called the maximum allowed number of
    /// times?
    pub fn is_done(&self, count: usize) -> bool {
        count.saturating_add(1) >= self.range.end
    }

    /// Is there an upper bound that a call can reach?
    pub fn is_capped(&self) -> bool {
        self.range.end != usize::MAX && self.range.end > 1
    }

    /// Is it required that this expectation be called an exact number of
    /// times?
    pub fn is_exact(&self) -> bool {
        self.range.end.saturating_sub(self.range.start) == 1
    }

    /// Has the expectation already been called the minimum required number of
    /// times?
    pub fn is_satisfied(&self, count: usize) -> bool {
        count >= self.range.start
    }
}

impl Default for Times {
    fn default() -> Self {
        // By default, allow any number of calls
        Times::any()
    }
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 time".to_owned()
    } else {
        format!("{} times", n)
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Range { start, end } = self.range;
        if self.is_exact() {
            f.write_str(&plural(start))
        } else if end == usize::MAX && start == 0 {
            f.write_str("any number of times")
        } else if end == usize::MAX {
            write!(f, "at least {}", plural(start))
        } else {
            write!(f, "at most {}", plural(end - 1))
        }
    }
}

/// Configuration stage of an expectation.
///
/// Qualifiers move an expectation forward through these stages.  A qualifier
/// applied in a stage that doesn't accept it fails with
/// [`Error::NoMethod`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Fresh,
    Constrained,
    Counted,
    Actioned,
    Terminal,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Qualifier {
    Constraint,
    Count,
    Yield,
    Action,
}

impl Stage {
    fn advance(self, q: Qualifier) -> Option<Stage> {
        use Stage::*;
        match (self, q) {
            (Fresh, Qualifier::Constraint) => Some(Constrained),
            (Fresh | Constrained | Counted, Qualifier::Count) => Some(Counted),
            (Fresh | Constrained | Counted | Actioned, Qualifier::Yield) =>
                Some(Actioned),
            (Fresh | Constrained | Counted | Actioned, Qualifier::Action) =>
                Some(Terminal),
            _ => None
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Stage::Fresh => "a fresh",
            Stage::Constrained => "an argument-constrained",
            Stage::Counted => "a counted",
            Stage::Actioned => "a yielding",
            Stage::Terminal => "a fully configured",
        }
    }
}

/// Is an expectation checked at verification time?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Never verified.
    Stub,
    /// Verified against its call count.
    Expectation,
    /// Verified to never be received.
    Negative,
}

/// Where an entry of a [`Proxy`](crate::Proxy) came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    /// Configured on the object itself.
    Direct,
    /// Copied from an `any_instance` template of the given class.
    AnyInstance(ClassId),
}

type Implementation = Rc<dyn Fn(&Call) -> Result<Value>>;

#[derive(Clone)]
enum Action {
    Return(Value),
    Raise(String),
    Throw(Symbol, Value),
    CallOriginal,
    Invoke(Implementation),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::Return(v) => write!(f, "Return({})", v),
            Action::Raise(m) => write!(f, "Raise({:?})", m),
            Action::Throw(t, v) => write!(f, "Throw(:{}, {})", t, v),
            Action::CallOriginal => f.write_str("CallOriginal"),
            Action::Invoke(_) => f.write_str("Invoke"),
        }
    }
}

/// Configuration shared by an `any_instance` template and every per-instance
/// copy of it.
#[derive(Debug)]
struct Config {
    name: Symbol,
    kind: Kind,
    constraint: ArgConstraint,
    times: Times,
    yields: Vec<Vec<Value>>,
    actions: Vec<Action>,
    stage: Stage,
    options: Options,
    call_site: String,
    /// The instance that first received an `any_instance` expectation.
    claimed_by: Option<(ObjectId, String)>,
}

#[derive(Debug, Default)]
struct Counters {
    received: usize,
    next_action: usize,
    /// A call-time failure was already reported; don't report it again when
    /// verifying.
    failed_fast: bool,
}

#[derive(Debug)]
struct Inner {
    config: Rc<RefCell<Config>>,
    counters: RefCell<Counters>,
    receiver: String,
    receiver_id: Option<ObjectId>,
    origin: Origin,
}

/// A handle to one configured stub or expectation.
///
/// Handles are cheap to clone; every clone refers to the same expectation.
/// Configuration methods consume the handle and hand it back so they can be
/// chained with `?`.  The action methods (`and_return`, `and_raise`, ...)
/// return nothing further to configure.
#[derive(Clone, Debug)]
pub struct MessageExpectation(Rc<Inner>);

impl MessageExpectation {
    #[track_caller]
    pub(crate) fn new(name: Symbol, kind: Kind, options: Options,
                      receiver: String, origin: Origin) -> Self
    {
        let times = match kind {
            Kind::Stub => Times::any(),
            Kind::Expectation => Times::exactly(1),
            Kind::Negative => Times::never(),
        };
        let loc = Location::caller();
        let config = Config {
            name,
            kind,
            constraint: ArgConstraint::Any,
            times,
            yields: Vec::new(),
            actions: Vec::new(),
            stage: Stage::Fresh,
            options,
            call_site: format!("{}:{}", loc.file(), loc.line()),
            claimed_by: None,
        };
        MessageExpectation(Rc::new(Inner {
            config: Rc::new(RefCell::new(config)),
            counters: RefCell::default(),
            receiver,
            receiver_id: None,
            origin
        }))
    }

    /// A copy for one instance, with its own call counts, sharing this one's
    /// configuration.
    pub(crate) fn replicate(&self, receiver: &Object) -> Self {
        MessageExpectation(Rc::new(Inner {
            config: self.0.config.clone(),
            counters: RefCell::default(),
            receiver: receiver.to_string(),
            receiver_id: Some(receiver.id()),
            origin: self.0.origin
        }))
    }

    /// Do both handles refer to the same expectation?
    pub fn ptr_eq(&self, other: &MessageExpectation) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Do both handles share one configuration, as a template and its copies
    /// do?
    pub(crate) fn shares_config(&self, other: &MessageExpectation) -> bool {
        Rc::ptr_eq(&self.0.config, &other.0.config)
    }

    pub fn name(&self) -> Symbol {
        self.0.config.borrow().name.clone()
    }

    pub fn kind(&self) -> Kind {
        self.0.config.borrow().kind
    }

    pub fn origin(&self) -> Origin {
        self.0.origin
    }

    pub fn stage(&self) -> Stage {
        self.0.config.borrow().stage
    }

    pub fn is_stub(&self) -> bool {
        self.kind() == Kind::Stub
    }

    pub fn is_negative(&self) -> bool {
        self.kind() == Kind::Negative
    }

    pub fn received_count(&self) -> usize {
        self.0.counters.borrow().received
    }

    pub fn times(&self) -> Times {
        self.0.config.borrow().times.clone()
    }

    pub fn call_site(&self) -> String {
        let config = self.0.config.borrow();
        config.options.expected_from.clone()
            .unwrap_or_else(|| config.call_site.clone())
    }

    pub(crate) fn constraint(&self) -> ArgConstraint {
        self.0.config.borrow().constraint.clone()
    }

    pub(crate) fn matches(&self, args: &[Value]) -> bool {
        self.0.config.borrow().constraint.matches(args)
    }

    pub(crate) fn is_specific(&self) -> bool {
        self.0.config.borrow().constraint.is_specific()
    }

    /// Has a verified expectation already received as many calls as it
    /// allows?
    pub(crate) fn called_max_times(&self) -> bool {
        let config = self.0.config.borrow();
        config.kind != Kind::Stub && config.times.is_capped() &&
            config.times.is_done(self.0.counters.borrow().received)
    }

    /// Is this a positive expectation copied from an `any_instance` template?
    fn is_claimable(&self, config: &Config) -> bool {
        config.kind == Kind::Expectation &&
            matches!(self.0.origin, Origin::AnyInstance(_))
    }

    /// Describe this expectation for unmatched-call diagnostics.
    pub(crate) fn describe(&self) -> String {
        let config = self.0.config.borrow();
        let kind = match config.kind {
            Kind::Stub => "stub",
            Kind::Expectation => "expectation",
            Kind::Negative => "negative expectation",
        };
        format!("{} with {}", kind, config.constraint)
    }

    /// Move to the next configuration stage, or fail as if the qualifier
    /// didn't exist.
    fn transition(&self, qualifier: &str, q: Qualifier) -> Result<()> {
        let mut config = self.0.config.borrow_mut();
        match config.stage.advance(q) {
            Some(next) => {
                config.stage = next;
                Ok(())
            },
            None => Err(Error::NoMethod {
                method: qualifier.to_owned(),
                receiver: format!("{} message expectation for :{}",
                                  config.stage.describe(), config.name)
            })
        }
    }

    /// Stubs are never counted, so they don't accept call counts.
    fn set_times(self, qualifier: &str, times: Times) -> Result<Self> {
        if self.is_stub() {
            return Err(Error::NoMethod {
                method: qualifier.to_owned(),
                receiver: format!("the stub for :{}", self.name())
            });
        }
        self.transition(qualifier, Qualifier::Count)?;
        self.0.config.borrow_mut().times = times;
        Ok(self)
    }

    fn set_action(self, qualifier: &str, actions: Vec<Action>) -> Result<()> {
        self.transition(qualifier, Qualifier::Action)?;
        self.0.config.borrow_mut().actions = actions;
        Ok(())
    }

    /// Constrain the arguments this expectation accepts.
    ///
    /// Only legal as the first qualifier.
    ///
    /// # Examples
    /// ```
    /// # use mockspace::*;
    /// # use mockspace::syntax::should::Should;
    /// # fn main() -> Result<()> {
    /// let space = Space::new();
    /// let d = space.double("calculator");
    /// d.stub(&space, "add")?.with(args![1, 2])?.and_return(3)?;
    /// d.stub(&space, "add")?.with(params![arg::anything(), 0])?.and_return(0)?;
    /// assert_eq!(Value::from(3), d.send("add", args![1, 2])?);
    /// assert_eq!(Value::from(0), d.send("add", args![7, 0])?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with<C: Into<ArgConstraint>>(self, constraint: C) -> Result<Self> {
        self.transition("with", Qualifier::Constraint)?;
        self.0.config.borrow_mut().constraint = constraint.into();
        Ok(self)
    }

    /// Only accept calls without arguments.
    pub fn with_no_args(self) -> Result<Self> {
        self.transition("with_no_args", Qualifier::Constraint)?;
        self.0.config.borrow_mut().constraint = ArgConstraint::List(Vec::new());
        Ok(self)
    }

    /// Expect exactly one call.  Shortcut for [`exactly(1)`](#method.exactly).
    pub fn once(self) -> Result<Self> {
        self.set_times("once", Times::exactly(1))
    }

    pub fn twice(self) -> Result<Self> {
        self.set_times("twice", Times::exactly(2))
    }

    pub fn exactly(self, n: usize) -> Result<Self> {
        self.set_times("exactly", Times::exactly(n))
    }

    pub fn at_least(self, n: usize) -> Result<Self> {
        self.set_times("at_least", Times::at_least(n))
    }

    pub fn at_most(self, n: usize) -> Result<Self> {
        self.set_times("at_most", Times::at_most(n))
    }

    pub fn any_number_of_times(self) -> Result<Self> {
        self.set_times("any_number_of_times", Times::any())
    }

    /// Forbid this expectation from ever being called.
    ///
    /// A negative expectation is already `never`; negating it again is an
    /// error.
    pub fn never(self) -> Result<Self> {
        if self.is_negative() {
            return Err(Error::DoubleNegation {
                method: self.name().to_string()
            });
        }
        self.set_times("never", Times::never())
    }

    /// Yield `args` to the block passed with each call.  May be repeated to
    /// yield several times per call.
    pub fn and_yield(self, args: Vec<Value>) -> Result<Self> {
        self.transition("and_yield", Qualifier::Yield)?;
        self.0.config.borrow_mut().yields.push(args);
        Ok(self)
    }

    /// Return `v` from every call.
    pub fn and_return<V: Into<Value>>(self, v: V) -> Result<()> {
        self.set_action("and_return", vec![Action::Return(v.into())])
    }

    /// Return each of `vs` in turn, then keep returning the last one.
    pub fn and_return_values<I, V>(self, vs: I) -> Result<()>
        where I: IntoIterator<Item = V>, V: Into<Value>
    {
        let actions = vs.into_iter()
            .map(|v| Action::Return(v.into()))
            .collect();
        self.set_action("and_return", actions)
    }

    /// Fail every call with [`Error::Raised`].
    pub fn and_raise<M: fmt::Display>(self, message: M) -> Result<()> {
        self.set_action("and_raise", vec![Action::Raise(message.to_string())])
    }

    /// Fail every call with [`Error::Thrown`], carrying `nil`.
    pub fn and_throw<S: Into<Symbol>>(self, tag: S) -> Result<()> {
        self.and_throw_value(tag, Value::Nil)
    }

    /// Fail every call with [`Error::Thrown`], carrying `value`.
    pub fn and_throw_value<S, V>(self, tag: S, value: V) -> Result<()>
        where S: Into<Symbol>, V: Into<Value>
    {
        let action = Action::Throw(tag.into(), value.into());
        self.set_action("and_throw", vec![action])
    }

    /// Forward every call to the implementation the stub replaced.
    pub fn and_call_original(self) -> Result<()> {
        self.set_action("and_call_original", vec![Action::CallOriginal])
    }

    /// Compute the result of every call with `f`.
    pub fn returning<F>(self, f: F) -> Result<()>
        where F: Fn(&Call) -> Result<Value> + 'static
    {
        self.set_action("returning", vec![Action::Invoke(Rc::new(f))])
    }

    /// Record a call and perform the configured behavior.
    ///
    /// `original` reaches the implementation the stub replaced.
    pub(crate) fn invoke(&self, call: &Call,
                         original: &dyn Fn(&Call) -> Result<Value>)
        -> Result<Value>
    {
        // Copy out what the call needs so that nothing stays borrowed while
        // user code runs.
        let (yields, action) = {
            let mut config = self.0.config.borrow_mut();
            if self.is_claimable(&config) {
                let claim = config.claimed_by.clone();
                match (claim, self.0.receiver_id) {
                    (Some((first, desc)), Some(id)) if first != id => {
                        return Err(Error::AlreadyReceived {
                            method: config.name.to_string(),
                            receiver: self.0.receiver.clone(),
                            first: desc
                        });
                    },
                    (None, Some(id)) => {
                        config.claimed_by = Some((id, self.0.receiver.clone()));
                    },
                    _ => ()
                }
            }
            let mut counters = self.0.counters.borrow_mut();
            counters.received += 1;
            if config.kind != Kind::Stub &&
                !config.times.allows(counters.received)
            {
                counters.failed_fast = true;
                return Err(Error::TooManyCalls {
                    receiver: self.0.receiver.clone(),
                    method: format!("{}{}", config.name, call.describe_args()),
                    expected: format!("{} with {}", config.times,
                                      config.constraint),
                    received: plural(counters.received)
                });
            }
            let action = if config.actions.is_empty() {
                None
            } else {
                let i = counters.next_action.min(config.actions.len() - 1);
                counters.next_action += 1;
                Some(config.actions[i].clone())
            };
            (config.yields.clone(), action)
        };
        for args in yields.iter() {
            match &call.block {
                Some(block) => {
                    block.call(args)?;
                },
                None => return Err(Error::MissingBlock {
                    receiver: self.0.receiver.clone(),
                    method: self.name().to_string()
                })
            }
        }
        match action {
            None => Ok(Value::Nil),
            Some(Action::Return(v)) => Ok(v),
            Some(Action::Raise(m)) => Err(Error::Raised(m)),
            Some(Action::Throw(tag, value)) => Err(Error::Thrown {
                tag: tag.to_string(),
                value
            }),
            Some(Action::CallOriginal) => original(call),
            Some(Action::Invoke(f)) => f(call),
        }
    }

    /// Check the received count against the configured one.
    pub fn verify(&self) -> Result<()> {
        let config = self.0.config.borrow();
        let counters = self.0.counters.borrow();
        if config.kind == Kind::Stub || counters.failed_fast ||
            config.times.is_satisfied(counters.received)
        {
            return Ok(());
        }
        if self.is_claimable(&config) {
            let mine = matches!((&config.claimed_by, self.0.receiver_id),
                                (Some((first, _)), Some(id)) if *first == id);
            // The template reports expectations no instance received
            if !mine {
                return Ok(());
            }
        }
        let message = config.options.message.clone().unwrap_or_else(|| {
            format!("({}).{}({})\n    expected: {}\n    received: {}",
                    self.0.receiver, config.name, config.constraint,
                    config.times, plural(counters.received))
        });
        Err(Error::ExpectationNotSatisfied {
            message,
            call_site: Some(config.options.expected_from.clone()
                .unwrap_or_else(|| config.call_site.clone()))
        })
    }

    /// Has no instance received this `any_instance` template although it
    /// requires calls?
    pub(crate) fn is_unclaimed(&self) -> bool {
        let config = self.0.config.borrow();
        config.kind == Kind::Expectation && config.claimed_by.is_none() &&
            !config.times.is_satisfied(0)
    }

    /// The custom failure message, if one was configured.
    pub(crate) fn custom_message(&self) -> Option<String> {
        self.0.config.borrow().options.message.clone()
    }

    /// Would verification of this expectation pass right now?
    pub fn is_satisfied(&self) -> bool {
        self.verify().is_ok()
    }
}
