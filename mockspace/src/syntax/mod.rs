// vim: tw=80
//! The two spellings of the configuration surface.
//!
//! Both reduce to the [`MessageTarget`](crate::MessageTarget) operations.
//! [`should`] is the legacy syntax: using it without enabling it explicitly
//! is reported to the space's
//! [`DeprecationReporter`](crate::DeprecationReporter).  [`expect`] is the
//! current one.

pub mod expect;
pub mod should;
