// vim: tw=80
//! The legacy syntax: messages configured on the receiver itself.
//!
//! # Examples
//! ```
//! # use mockspace::*;
//! use mockspace::syntax::should::{AnyInstanceSyntax, Should};
//! # fn main() -> Result<()> {
//! let space = Space::new();
//! let klass = Class::new("Klass");
//! klass.define("existing_method", |_, _| Ok(Value::sym("original")));
//!
//! klass.any_instance(&space)?.stub("existing_method").and_return(1)?;
//! let obj = klass.new_instance();
//! assert_eq!(Value::from(1), obj.send("existing_method", ())?);
//!
//! obj.stub(&space, "existing_method")?.and_return(2)?;
//! assert_eq!(Value::from(2), obj.send("existing_method", ())?);
//! # Ok(())
//! # }
//! ```
//!
//! The class-level handle only starts a configuration.  Qualifiers belong to
//! the expectation it returns, so they can't come first:
//! ```compile_fail
//! # use mockspace::*;
//! # use mockspace::syntax::should::AnyInstanceSyntax;
//! # fn main() -> Result<()> {
//! let space = Space::new();
//! let klass = Class::new("Klass");
//! klass.any_instance(&space)?.with(args!["1"]).stub("foo");
//! # Ok(())
//! # }
//! ```

use crate::{
    Result,
    any_instance::AnyInstanceRecorder,
    chain::Chain,
    deprecation::{EXPECT_REPLACEMENT, UNSTUB_REPLACEMENT},
    expectation::{MessageExpectation, Options},
    object::{Class, Object},
    space::Space,
    target::MessageTarget,
    value::Symbol
};

/// Configure stubs and expectations on an object or a
/// [`Double`](crate::Double).
pub trait Should {
    fn stub<N>(&self, space: &Space, name: N) -> Result<MessageExpectation>
        where N: Into<Symbol>;

    fn stub_with_options<N>(&self, space: &Space, name: N, options: Options)
        -> Result<MessageExpectation>
        where N: Into<Symbol>;

    fn should_receive<N>(&self, space: &Space, name: N)
        -> Result<MessageExpectation>
        where N: Into<Symbol>;

    fn should_receive_with_options<N>(&self, space: &Space, name: N,
                                      options: Options)
        -> Result<MessageExpectation>
        where N: Into<Symbol>;

    fn should_not_receive<N>(&self, space: &Space, name: N)
        -> Result<MessageExpectation>
        where N: Into<Symbol>;

    fn unstub<N>(&self, space: &Space, name: N) -> Result<()>
        where N: Into<Symbol>;

    fn stub_chain<C>(&self, space: &Space, chain: C)
        -> Result<MessageExpectation>
        where C: Into<Chain>;
}

impl Should for Object {
    #[track_caller]
    fn stub<N>(&self, space: &Space, name: N) -> Result<MessageExpectation>
        where N: Into<Symbol>
    {
        space.legacy("stub", EXPECT_REPLACEMENT)?;
        Ok(space.proxy_for(self).add_stub(name.into(), Options::default()))
    }

    #[track_caller]
    fn stub_with_options<N>(&self, space: &Space, name: N, options: Options)
        -> Result<MessageExpectation>
        where N: Into<Symbol>
    {
        space.legacy("stub", EXPECT_REPLACEMENT)?;
        Ok(space.proxy_for(self).add_stub(name.into(), options))
    }

    #[track_caller]
    fn should_receive<N>(&self, space: &Space, name: N)
        -> Result<MessageExpectation>
        where N: Into<Symbol>
    {
        space.legacy("should_receive", EXPECT_REPLACEMENT)?;
        Ok(space.proxy_for(self)
           .add_message_expectation(name.into(), Options::default()))
    }

    #[track_caller]
    fn should_receive_with_options<N>(&self, space: &Space, name: N,
                                      options: Options)
        -> Result<MessageExpectation>
        where N: Into<Symbol>
    {
        space.legacy("should_receive", EXPECT_REPLACEMENT)?;
        Ok(space.proxy_for(self).add_message_expectation(name.into(), options))
    }

    #[track_caller]
    fn should_not_receive<N>(&self, space: &Space, name: N)
        -> Result<MessageExpectation>
        where N: Into<Symbol>
    {
        space.legacy("should_not_receive", EXPECT_REPLACEMENT)?;
        Ok(space.proxy_for(self)
           .add_negative_message_expectation(name.into(), Options::default()))
    }

    #[track_caller]
    fn unstub<N>(&self, space: &Space, name: N) -> Result<()>
        where N: Into<Symbol>
    {
        space.legacy("unstub", UNSTUB_REPLACEMENT)?;
        space.proxy_for(self).remove_stub(&name.into())
    }

    #[track_caller]
    fn stub_chain<C>(&self, space: &Space, chain: C)
        -> Result<MessageExpectation>
        where C: Into<Chain>
    {
        space.legacy("stub_chain", EXPECT_REPLACEMENT)?;
        space.proxy_for(self).add_stub_chain(space, chain.into())
    }
}

/// Reach every instance of a class with the legacy syntax.
pub trait AnyInstanceSyntax {
    fn any_instance<'a>(&self, space: &'a Space) -> Result<AnyInstance<'a>>;
}

impl AnyInstanceSyntax for Class {
    #[track_caller]
    fn any_instance<'a>(&self, space: &'a Space) -> Result<AnyInstance<'a>> {
        space.legacy("any_instance", EXPECT_REPLACEMENT)?;
        Ok(AnyInstance {
            space,
            recorder: space.any_instance_recorder_for(self)
        })
    }
}

/// Class-level handle returned by
/// [`any_instance`](AnyInstanceSyntax::any_instance).
pub struct AnyInstance<'a> {
    space: &'a Space,
    recorder: AnyInstanceRecorder,
}

impl AnyInstance<'_> {
    pub fn recorder(&self) -> &AnyInstanceRecorder {
        &self.recorder
    }

    #[track_caller]
    pub fn stub<N: Into<Symbol>>(&self, name: N) -> MessageExpectation {
        self.recorder.add_stub(name.into(), Options::default())
    }

    #[track_caller]
    pub fn stub_with_options<N>(&self, name: N, options: Options)
        -> MessageExpectation
        where N: Into<Symbol>
    {
        self.recorder.add_stub(name.into(), options)
    }

    #[track_caller]
    pub fn should_receive<N: Into<Symbol>>(&self, name: N)
        -> MessageExpectation
    {
        self.recorder.add_message_expectation(name.into(), Options::default())
    }

    #[track_caller]
    pub fn should_receive_with_options<N>(&self, name: N, options: Options)
        -> MessageExpectation
        where N: Into<Symbol>
    {
        self.recorder.add_message_expectation(name.into(), options)
    }

    #[track_caller]
    pub fn should_not_receive<N: Into<Symbol>>(&self, name: N)
        -> MessageExpectation
    {
        self.recorder.add_negative_message_expectation(name.into(),
                                                       Options::default())
    }

    pub fn unstub<N: Into<Symbol>>(&self, name: N) -> Result<()> {
        self.recorder.remove_stub(&name.into())
    }

    #[track_caller]
    pub fn stub_chain<C: Into<Chain>>(&self, chain: C)
        -> Result<MessageExpectation>
    {
        self.recorder.add_stub_chain(self.space, chain.into())
    }
}
