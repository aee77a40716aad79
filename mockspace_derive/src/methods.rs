// vim: tw=80
//! Turn an inherent `impl` block into method table definitions.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg,
    ImplItem,
    ImplItemFn,
    ItemImpl,
    Type,
    spanned::Spanned
};

use crate::compile_error;

/// The name the generated class gets: the last segment of the self type.
fn class_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(tp) if tp.qself.is_none() =>
            tp.path.segments.last().map(|seg| seg.ident.to_string()),
        _ => None
    }
}

/// Is this a method taking `&self`?  Reports methods that take `self` in
/// any other way.
fn takes_ref_self(f: &ImplItemFn) -> bool {
    match f.sig.inputs.first() {
        Some(FnArg::Receiver(r)) => {
            if r.reference.is_none() {
                compile_error(r.span(),
                    "#[methods] does not support methods that consume self");
                false
            } else if r.mutability.is_some() {
                compile_error(r.span(),
                    "#[methods] does not support &mut self methods");
                false
            } else {
                true
            }
        },
        // Associated functions aren't methods of instances
        _ => false
    }
}

/// Generate the `define` call for one method.
fn gen_define(self_ty: &Type, f: &ImplItemFn) -> TokenStream {
    let ident = &f.sig.ident;
    let name = ident.to_string();
    if !f.sig.generics.params.is_empty() {
        compile_error(f.sig.generics.span(),
            "#[methods] does not support generic methods");
    }
    let mut argnames = Vec::new();
    let mut conversions = Vec::new();
    for (i, arg) in f.sig.inputs.iter().skip(1).enumerate() {
        if let FnArg::Typed(pt) = arg {
            if let Type::Reference(r) = pt.ty.as_ref() {
                compile_error(r.span(),
                    "#[methods] does not support reference arguments");
            }
            let ty = &pt.ty;
            let argname = format_ident!("a{}", i);
            conversions.push(quote!(
                let #argname: #ty =
                    ::mockspace::FromValue::from_value(&call.args[#i])?;
            ));
            argnames.push(argname);
        }
    }
    let nargs = argnames.len();
    quote!(
        class.define(#name,
            |recv: &::mockspace::Object, call: &::mockspace::Call| {
                if call.args.len() != #nargs {
                    return ::std::result::Result::Err(
                        ::mockspace::Error::ArgumentCount {
                            method: #name.to_owned(),
                            expected: #nargs,
                            given: call.args.len()
                        });
                }
                let this = recv.payload::<#self_ty>()?;
                #(#conversions)*
                ::std::result::Result::Ok(
                    ::mockspace::Value::from(this.#ident(#(#argnames),*)))
            });
    )
}

pub(crate) fn do_methods(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    if !attrs.is_empty() {
        compile_error(attrs.span(), "#[methods] does not take arguments");
        return TokenStream::new();
    }
    let item: ItemImpl = match syn::parse2(input) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error()
    };
    if let Some((_, path, _)) = &item.trait_ {
        compile_error(path.span(),
            "#[methods] only supports inherent impl blocks");
        return TokenStream::new();
    }
    if !item.generics.params.is_empty() {
        compile_error(item.generics.span(),
            "#[methods] does not support generic impl blocks");
        return TokenStream::new();
    }
    let self_ty = &item.self_ty;
    let name = match class_name(self_ty) {
        Some(name) => name,
        None => {
            compile_error(self_ty.span(),
                "#[methods] requires a named self type");
            return TokenStream::new();
        }
    };
    let defines = item.items.iter()
        .filter_map(|ii| match ii {
            ImplItem::Fn(f) if takes_ref_self(f) =>
                Some(gen_define(self_ty, f)),
            _ => None
        }).collect::<Vec<_>>();
    let class = if defines.is_empty() {
        quote!(_class)
    } else {
        quote!(class)
    };
    quote!(
        impl ::mockspace::Methods for #self_ty {
            const NAME: &'static str = #name;

            fn install(#class: &::mockspace::Class) {
                #(#defines)*
            }
        }
    )
}
