// vim: tw=80
//! Deprecation reports for the legacy syntax.

use std::panic::Location;

use tracing::warn;

pub(crate) const EXPECT_REPLACEMENT: &str =
    "the new `:expect` syntax or explicitly enable `:should`";
pub(crate) const UNSTUB_REPLACEMENT: &str =
    "`allow(...).to_receive(...).and_call_original` or explicitly enable `:should`";

/// One deprecation report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deprecation {
    pub message: String,
    pub replacement: Option<String>,
    /// `file:line` of the first deprecated use.
    pub call_site: String,
}

impl Deprecation {
    pub(crate) fn legacy_syntax(capability: &str, replacement: &str,
                                location: &Location) -> Self
    {
        Deprecation {
            message: format!("Using `{}` from the old `:should` syntax without explicitly enabling the syntax is deprecated", capability),
            replacement: Some(replacement.to_owned()),
            call_site: format!("{}:{}", location.file(), location.line())
        }
    }
}

/// Receives deprecation reports from a [`Space`](crate::Space).
pub trait DeprecationReporter {
    fn deprecate(&self, deprecation: &Deprecation);
}

/// The default reporter: logs each report as a warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl DeprecationReporter for TracingReporter {
    fn deprecate(&self, deprecation: &Deprecation) {
        warn!(call_site = %deprecation.call_site,
              replacement = deprecation.replacement.as_deref().unwrap_or(""),
              "{}", deprecation.message);
    }
}
