// vim: tw=80
//! Proc Macros for use with Mockspace
//!
//! You probably don't want to use this crate directly.  Instead, you use
//! its reexports via the [`mockspace`](../mockspace/index.html) crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::Span;

mod methods;
use crate::methods::do_methods;

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    // https://github.com/alexcrichton/proc-macro2/issues/159
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &'static str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when mockspace is built with the \"nightly\" feature.", msg);
        }
    }
}

/// Install the `&self` methods of an inherent `impl` block into a
/// `mockspace::Class`.
///
/// The block itself is emitted unchanged.  Every method's arguments are
/// converted from `mockspace::Value` with `mockspace::FromValue`, and its
/// return value converted back with `Into<mockspace::Value>`.
#[proc_macro_attribute]
pub fn methods(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: proc_macro2::TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_methods(attrs.into(), input));
    output.into()
}
