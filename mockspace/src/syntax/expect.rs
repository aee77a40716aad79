// vim: tw=80
//! The `allow`/`expect` syntax: messages configured through the space.
//!
//! # Examples
//! ```
//! # use mockspace::*;
//! # fn main() -> Result<()> {
//! let space = Space::new();
//! let d = space.double("calculator");
//! space.allow(&d)?.to_receive("add").with(args![1, 2])?.and_return(3)?;
//! space.expect(&d)?.to_receive("clear").once()?;
//! assert_eq!(Value::from(3), d.send("add", args![1, 2])?);
//! d.send("clear", ())?;
//! space.verify_all()
//! # }
//! ```

use crate::{
    Error,
    Result,
    any_instance::AnyInstanceRecorder,
    chain::{self, Chain},
    expectation::{Kind, MessageExpectation, Options},
    object::{Class, Object},
    proxy::Proxy,
    space::Space,
    target::MessageTarget,
    value::Symbol
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Allow,
    Expect,
}

enum Receiver {
    Proxy(Proxy),
    AnyInstance(AnyInstanceRecorder),
}

/// What `allow(..)` or `expect(..)` applies to.
pub struct Target<'a> {
    space: &'a Space,
    receiver: Receiver,
    mode: Mode,
}

impl Space {
    /// Stub messages to `object`.
    pub fn allow(&self, object: &Object) -> Result<Target<'_>> {
        self.target("allow", Receiver::Proxy(self.proxy_for(object)),
                    Mode::Allow)
    }

    /// Expect messages to `object`.
    pub fn expect(&self, object: &Object) -> Result<Target<'_>> {
        self.target("expect", Receiver::Proxy(self.proxy_for(object)),
                    Mode::Expect)
    }

    /// Stub messages to every instance of `class`.
    pub fn allow_any_instance_of(&self, class: &Class) -> Result<Target<'_>> {
        let recorder = self.any_instance_recorder_for(class);
        self.target("allow_any_instance_of", Receiver::AnyInstance(recorder),
                    Mode::Allow)
    }

    /// Expect exactly one instance of `class` to receive messages.
    pub fn expect_any_instance_of(&self, class: &Class) -> Result<Target<'_>> {
        let recorder = self.any_instance_recorder_for(class);
        self.target("expect_any_instance_of", Receiver::AnyInstance(recorder),
                    Mode::Expect)
    }

    fn target(&self, capability: &'static str, receiver: Receiver, mode: Mode)
        -> Result<Target<'_>>
    {
        self.modern(capability)?;
        Ok(Target { space: self, receiver, mode })
    }
}

impl Target<'_> {
    /// `allow(..).to(receive(name))` or `expect(..).to(receive(name))`
    #[track_caller]
    pub fn to_receive<N: Into<Symbol>>(&self, name: N) -> MessageExpectation {
        self.to_receive_with_options(name, Options::default())
    }

    #[track_caller]
    pub fn to_receive_with_options<N>(&self, name: N, options: Options)
        -> MessageExpectation
        where N: Into<Symbol>
    {
        let name = name.into();
        match (&self.receiver, self.mode) {
            (Receiver::Proxy(p), Mode::Allow) => p.add_stub(name, options),
            (Receiver::Proxy(p), Mode::Expect) =>
                p.add_message_expectation(name, options),
            (Receiver::AnyInstance(r), Mode::Allow) => r.add_stub(name, options),
            (Receiver::AnyInstance(r), Mode::Expect) =>
                r.add_message_expectation(name, options),
        }
    }

    /// `expect(..).not_to(receive(name))`.  Only an `expect` target can
    /// be negated.
    #[track_caller]
    pub fn not_to_receive<N: Into<Symbol>>(&self, name: N)
        -> Result<MessageExpectation>
    {
        if self.mode == Mode::Allow {
            return Err(Error::NoMethod {
                method: "not_to_receive".to_owned(),
                receiver: "an `allow` target".to_owned()
            });
        }
        let name = name.into();
        Ok(match &self.receiver {
            Receiver::Proxy(p) =>
                p.add_negative_message_expectation(name, Options::default()),
            Receiver::AnyInstance(r) =>
                r.add_negative_message_expectation(name, Options::default()),
        })
    }

    /// Same as [`not_to_receive`](#method.not_to_receive).
    #[track_caller]
    pub fn to_not_receive<N: Into<Symbol>>(&self, name: N)
        -> Result<MessageExpectation>
    {
        self.not_to_receive(name)
    }

    /// `allow(..).to(receive_message_chain(..))`.  With `expect`, the first
    /// message of the chain is expected.
    #[track_caller]
    pub fn receive_message_chain<C: Into<Chain>>(&self, chain: C)
        -> Result<MessageExpectation>
    {
        let kind = match self.mode {
            Mode::Allow => Kind::Stub,
            Mode::Expect => Kind::Expectation,
        };
        match &self.receiver {
            Receiver::Proxy(p) => chain::build(self.space, p, chain.into(), kind),
            Receiver::AnyInstance(r) =>
                chain::build(self.space, r, chain.into(), kind),
        }
    }
}
