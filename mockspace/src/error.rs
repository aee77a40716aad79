// vim: tw=80
use thiserror::Error;

/// Everything that can go wrong while configuring, dispatching through, or
/// verifying a test double.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A verified expectation was not met by the end of the test.
    ///
    /// The text is exactly the custom message, if one was configured.
    #[error("{message}")]
    ExpectationNotSatisfied {
        message: String,
        /// Where the expectation was configured, or the `expected_from`
        /// option if one was given.
        call_site: Option<String>,
    },

    /// An intercepted method was called with arguments that no configured
    /// expectation or stub accepts.
    #[error("{receiver} received :{method} with unexpected arguments\n  expected: {}\n       got: {args}", .expected.join("\n            "))]
    UnexpectedArguments {
        receiver: String,
        method: String,
        args: String,
        expected: Vec<String>,
    },

    /// A double received a message nothing was configured for.
    #[error("{receiver} received unexpected message :{method} with {args}")]
    UnexpectedMessage {
        receiver: String,
        method: String,
        args: String,
    },

    /// A verified expectation was called more often than it allows.
    #[error("({receiver}).{method}\n    expected: {expected}\n    received: {received}")]
    TooManyCalls {
        receiver: String,
        method: String,
        expected: String,
        received: String,
    },

    /// An `any_instance` expectation was already satisfied by another
    /// instance.
    #[error("The message '{method}' was received by {receiver} but has already been received by {first}")]
    AlreadyReceived {
        method: String,
        receiver: String,
        first: String,
    },

    /// A stub configured with `and_yield` was called without a block.
    #[error("{receiver} asked to yield from :{method} but no block was passed")]
    MissingBlock {
        receiver: String,
        method: String,
    },

    #[error("The method `{method}` was not stubbed or was already unstubbed")]
    NotStubbed {
        method: String,
    },

    /// The receiver lacks the requested capability: an undefined method, a
    /// configuration qualifier used out of order, or a disabled syntax.
    #[error("undefined method `{method}' for {receiver}")]
    NoMethod {
        method: String,
        receiver: String,
    },

    #[error("`never` was applied to the negative expectation for :{method}; it is already negative, so it looks like you are trying to negate it again")]
    DoubleNegation {
        method: String,
    },

    /// An exception raised by a stub configured with `and_raise`.
    #[error("{0}")]
    Raised(String),

    /// A symbol thrown by a stub configured with `and_throw`.
    #[error("uncaught throw :{tag}")]
    Thrown {
        tag: String,
        value: crate::Value,
    },

    #[error("a message chain needs at least one method name")]
    EmptyChain,

    #[error("{receiver} does not carry a payload of type {expected}")]
    Payload {
        expected: &'static str,
        receiver: String,
    },

    #[error("wrong number of arguments for `{method}' (given {given}, expected {expected})")]
    ArgumentCount {
        method: String,
        expected: usize,
        given: usize,
    },

    #[error("expected {expected}, got {value}")]
    Conversion {
        expected: &'static str,
        value: String,
    },
}

impl Error {
    /// Is this one of the failures a mock expectation reports?
    pub fn is_mock_expectation_error(&self) -> bool {
        matches!(self,
            Error::ExpectationNotSatisfied{..} |
            Error::UnexpectedArguments{..} |
            Error::UnexpectedMessage{..} |
            Error::TooManyCalls{..} |
            Error::AlreadyReceived{..} |
            Error::MissingBlock{..} |
            Error::NotStubbed{..} |
            Error::DoubleNegation{..})
    }

    /// The configured call site of a verification failure.
    pub fn call_site(&self) -> Option<&str> {
        match self {
            Error::ExpectationNotSatisfied{call_site, ..} => call_site.as_deref(),
            _ => None
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
