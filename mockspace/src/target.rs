// vim: tw=80
//! The operations both syntaxes reduce to.

use crate::{
    Result,
    chain::Chain,
    expectation::{MessageExpectation, Options},
    space::Space,
    value::Symbol
};

/// Something stubs and expectations can be configured on: a single object's
/// [`Proxy`](crate::Proxy) or a class's
/// [`AnyInstanceRecorder`](crate::AnyInstanceRecorder).
pub trait MessageTarget {
    /// Add an unverified stub for `name`.
    #[track_caller]
    fn add_stub(&self, name: Symbol, options: Options) -> MessageExpectation;

    /// Add an expectation for `name`, verified by
    /// [`Space::verify_all`](crate::Space::verify_all).  It expects exactly
    /// one call until configured otherwise.
    #[track_caller]
    fn add_message_expectation(&self, name: Symbol, options: Options)
        -> MessageExpectation;

    /// Add an expectation that `name` is never received.
    #[track_caller]
    fn add_negative_message_expectation(&self, name: Symbol, options: Options)
        -> MessageExpectation;

    /// Remove every stub for `name`, leaving its expectations in place.
    ///
    /// Fails with [`Error::NotStubbed`](crate::Error::NotStubbed) if there is
    /// nothing to remove.
    fn remove_stub(&self, name: &Symbol) -> Result<()>;

    /// Stub a chain of messages, each returning a double that responds to
    /// the next one.  Returns the expectation for the last message.
    #[track_caller]
    fn add_stub_chain(&self, space: &Space, chain: Chain)
        -> Result<MessageExpectation>;
}
