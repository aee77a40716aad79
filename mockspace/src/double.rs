// vim: tw=80
//! Standalone test doubles.

use std::ops::Deref;

use crate::{
    object::Object,
    value::Value
};

/// An object that exists only to have stubs and expectations configured on
/// it.
///
/// A double has no methods of its own.  Any message nothing was configured
/// for fails with [`Error::UnexpectedMessage`](crate::Error::UnexpectedMessage).
/// Create one with [`Space::double`](crate::Space::double).
///
/// # Examples
/// ```
/// # use mockspace::*;
/// let space = Space::new();
/// let d = space.double("a mock");
/// assert_eq!("Double \"a mock\"", d.to_string());
/// assert!(matches!(d.send("anything", ()),
///                  Err(Error::UnexpectedMessage{..})));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Double(Object);

impl Double {
    pub(crate) fn new(object: Object) -> Self {
        debug_assert!(object.is_double());
        Double(object)
    }

    pub fn object(&self) -> &Object {
        &self.0
    }
}

impl Deref for Double {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

impl From<Double> for Value {
    fn from(d: Double) -> Self {
        Value::Object(d.0)
    }
}

impl From<&Double> for Value {
    fn from(d: &Double) -> Self {
        Value::Object(d.0.clone())
    }
}

impl From<Double> for Object {
    fn from(d: Double) -> Self {
        d.0
    }
}
