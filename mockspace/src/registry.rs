// vim: tw=80
//! Saved method table entries, kept while an interception is installed.

use std::{
    cell::RefCell,
    collections::HashMap
};

use crate::{
    object::{Class, Method, Object, Owner},
    value::Symbol
};

/// Per-(owner, method name) store of the entries that interceptors replaced.
///
/// An entry exists only while the interception is installed.  A saved `None`
/// records that the owner's table had no entry of its own.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    saved: RefCell<HashMap<(Owner, Symbol), Option<Method>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the entry an interceptor is about to replace.  The first
    /// saved entry for a slot wins.
    pub(crate) fn save(&self, owner: Owner, name: Symbol,
                       previous: Option<Method>)
    {
        self.saved.borrow_mut()
            .entry((owner, name))
            .or_insert(previous);
    }

    /// Forget a saved entry, returning it so it can be written back.
    pub(crate) fn take(&self, owner: Owner, name: &Symbol)
        -> Option<Option<Method>>
    {
        self.saved.borrow_mut().remove(&(owner, name.clone()))
    }

    fn saved(&self, owner: Owner, name: &Symbol) -> Option<Option<Method>> {
        self.saved.borrow().get(&(owner, name.clone())).cloned()
    }

    /// Is an original saved for this slot?
    pub fn contains(&self, owner: Owner, name: &str) -> bool {
        self.saved.borrow().contains_key(&(owner, Symbol::new(name)))
    }

    pub fn len(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.borrow().is_empty()
    }

    /// Resolve the real implementation a send of `name` to `obj` would reach
    /// if nothing were intercepted.
    pub fn original_method(&self, obj: &Object, name: &Symbol)
        -> Option<Method>
    {
        let own = obj.singleton_method(name.as_str())
            .and_then(|m| self.unwrap_entry(Owner::Object(obj.id()), name, m));
        own.or_else(|| self.original_class_method(obj.class(), name))
    }

    /// Like [`original_method`](#method.original_method), but starting from
    /// a class's own table.
    pub fn original_class_method(&self, class: &Class, name: &Symbol)
        -> Option<Method>
    {
        class.ancestors().find_map(|c| {
            c.own_method(name.as_str())
                .and_then(|m| self.unwrap_entry(Owner::Class(c.id()), name, m))
        })
    }

    /// Look behind an interceptor at the entry it replaced.
    fn unwrap_entry(&self, owner: Owner, name: &Symbol, m: Method)
        -> Option<Method>
    {
        if m.is_interceptor() {
            self.saved(owner, name)
                .flatten()
                .filter(|saved| !saved.is_interceptor())
        } else {
            Some(m)
        }
    }
}
