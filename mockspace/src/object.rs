// vim: tw=80
//! The object model that stubs are installed into.
//!
//! Every [`Class`] and every [`Object`] owns an explicit method table.  A
//! message send looks in the receiver's own ("singleton") table first and
//! then walks the class and its superclasses.  The engine intercepts a method
//! by swapping one entry of one table for an interceptor [`Method`], and
//! restores it by writing the saved entry back.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering}
};

use downcast::{downcast, Any};
use tracing::trace;

use crate::{
    Error,
    Result,
    value::{Call, Symbol, Value}
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of an [`Object`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(u64);

/// Identity of a [`Class`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClassId(u64);

/// Owner of a method table entry: either a class or a single object.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Owner {
    Class(ClassId),
    Object(ObjectId),
}

type MethodFn = dyn Fn(&Object, &Call) -> Result<Value>;

/// Does a [`Method`] hold a real implementation, or one installed by the
/// engine to intercept calls?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    Defined,
    Interceptor,
}

/// One entry of a method table.
#[derive(Clone)]
pub struct Method {
    func: Rc<MethodFn>,
    kind: MethodKind,
}

impl Method {
    pub fn new<F>(f: F) -> Self
        where F: Fn(&Object, &Call) -> Result<Value> + 'static
    {
        Method { func: Rc::new(f), kind: MethodKind::Defined }
    }

    pub(crate) fn interceptor<F>(f: F) -> Self
        where F: Fn(&Object, &Call) -> Result<Value> + 'static
    {
        Method { func: Rc::new(f), kind: MethodKind::Interceptor }
    }

    pub fn invoke(&self, receiver: &Object, call: &Call) -> Result<Value> {
        (self.func)(receiver, call)
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn is_interceptor(&self) -> bool {
        self.kind == MethodKind::Interceptor
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Method").field("kind", &self.kind).finish()
    }
}

/// Typed state carried by an [`Object`].
pub trait Payload: Any {}
downcast!(dyn Payload);

impl<T: 'static> Payload for T {}

/// A type whose inherent methods can be installed into a [`Class`].
///
/// Usually implemented with [`#[methods]`](crate::methods).
pub trait Methods: 'static {
    /// Name given to classes built by [`Class::with_methods`].
    const NAME: &'static str;

    /// Define every method of the type on `class`.
    fn install(class: &Class);
}

struct ClassInner {
    id: ClassId,
    name: String,
    superclass: Option<Class>,
    methods: RefCell<HashMap<Symbol, Method>>,
}

/// A class: a named method table with an optional superclass.
#[derive(Clone)]
pub struct Class(Rc<ClassInner>);

impl Class {
    pub fn new(name: &str) -> Self {
        Class::build(name, None)
    }

    fn build(name: &str, superclass: Option<Class>) -> Self {
        Class(Rc::new(ClassInner {
            id: ClassId(next_id()),
            name: name.to_owned(),
            superclass,
            methods: RefCell::default()
        }))
    }

    /// Create a class whose methods come from `T`.
    pub fn with_methods<T: Methods>() -> Self {
        let class = Class::new(T::NAME);
        T::install(&class);
        class
    }

    /// Create a new class deriving from this one.
    pub fn subclass(&self, name: &str) -> Self {
        Class::build(name, Some(self.clone()))
    }

    /// Install the methods of `T` into this class.
    pub fn install<T: Methods>(&self) -> &Self {
        T::install(self);
        self
    }

    pub fn id(&self) -> ClassId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn superclass(&self) -> Option<&Class> {
        self.0.superclass.as_ref()
    }

    /// This class followed by each of its superclasses, nearest first.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors(Some(self.clone()))
    }

    /// Is this class `other`, or derived from it?
    pub fn inherits(&self, other: &Class) -> bool {
        self.ancestors().any(|c| c.id() == other.id())
    }

    /// Define (or redefine) a method on this class.
    pub fn define<N, F>(&self, name: N, f: F) -> &Self
        where N: Into<Symbol>,
              F: Fn(&Object, &Call) -> Result<Value> + 'static
    {
        self.0.methods.borrow_mut().insert(name.into(), Method::new(f));
        self
    }

    /// Is `name` defined on this class or inherited by it?
    pub fn method_defined(&self, name: &str) -> bool {
        self.find_method(name).is_some()
    }

    /// Resolve `name` through the class chain, as a send would.
    pub fn find_method(&self, name: &str) -> Option<Method> {
        self.ancestors().find_map(|c| c.own_method(name))
    }

    pub fn new_instance(&self) -> Object {
        Object::build(self.clone(), ObjectKind::Plain, None)
    }

    /// Create an instance carrying typed state, for methods that need it.
    pub fn instantiate<T: 'static>(&self, payload: T) -> Object {
        Object::build(self.clone(), ObjectKind::Plain, Some(Box::new(payload)))
    }

    pub(crate) fn own_method(&self, name: &str) -> Option<Method> {
        self.0.methods.borrow().get(name).cloned()
    }

    /// Replace this class's own entry for `name`, returning the previous one.
    pub(crate) fn set_own_method(&self, name: Symbol, method: Method)
        -> Option<Method>
    {
        self.0.methods.borrow_mut().insert(name, method)
    }

    pub(crate) fn remove_own_method(&self, name: &str) -> Option<Method> {
        self.0.methods.borrow_mut().remove(name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Class) -> bool {
        self.id() == other.id()
    }
}

/// Iterator returned by [`Class::ancestors`].
pub struct Ancestors(Option<Class>);

impl Iterator for Ancestors {
    type Item = Class;

    fn next(&mut self) -> Option<Class> {
        let current = self.0.take()?;
        self.0 = current.superclass().cloned();
        Some(current)
    }
}

#[derive(Debug)]
enum ObjectKind {
    Plain,
    Double(Option<String>),
}

struct ObjectInner {
    id: ObjectId,
    class: Class,
    kind: ObjectKind,
    singleton: RefCell<HashMap<Symbol, Method>>,
    payload: Option<Box<dyn Payload>>,
}

/// A reference to an object.  Clones share identity.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    fn build(class: Class, kind: ObjectKind,
             payload: Option<Box<dyn Payload>>) -> Self
    {
        Object(Rc::new(ObjectInner {
            id: ObjectId(next_id()),
            class,
            kind,
            singleton: RefCell::default(),
            payload
        }))
    }

    pub(crate) fn double(class: Class, label: Option<String>) -> Self {
        Object::build(class, ObjectKind::Double(label), None)
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    pub fn is_double(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Double(_))
    }

    /// The label a double was created with.
    pub fn label(&self) -> Option<&str> {
        match &self.0.kind {
            ObjectKind::Double(label) => label.as_deref(),
            ObjectKind::Plain => None
        }
    }

    /// Borrow the typed state this object was instantiated with.
    pub fn payload<T: 'static>(&self) -> Result<&T> {
        self.0.payload.as_ref()
            .and_then(|p| (**p).downcast_ref::<T>().ok())
            .ok_or_else(|| Error::Payload {
                expected: std::any::type_name::<T>(),
                receiver: self.to_string()
            })
    }

    /// Define a method on this object alone.
    pub fn define_singleton_method<N, F>(&self, name: N, f: F) -> &Self
        where N: Into<Symbol>,
              F: Fn(&Object, &Call) -> Result<Value> + 'static
    {
        self.0.singleton.borrow_mut().insert(name.into(), Method::new(f));
        self
    }

    /// Does a send of `name` reach a method?
    pub fn responds_to(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Send a message to this object.
    pub fn send<N, C>(&self, name: N, call: C) -> Result<Value>
        where N: Into<Symbol>, C: Into<Call>
    {
        let name = name.into();
        let call = call.into();
        // Clone the entry out so no table stays borrowed during the call.
        match self.lookup(name.as_str()) {
            Some(method) => {
                trace!(receiver = %self, method = %name, "dispatch");
                method.invoke(self, &call)
            },
            None if self.is_double() => Err(Error::UnexpectedMessage {
                receiver: self.to_string(),
                method: name.to_string(),
                args: call.describe_args()
            }),
            None => Err(Error::NoMethod {
                method: name.to_string(),
                receiver: self.to_string()
            })
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Method> {
        self.singleton_method(name)
            .or_else(|| self.0.class.find_method(name))
    }

    pub(crate) fn singleton_method(&self, name: &str) -> Option<Method> {
        self.0.singleton.borrow().get(name).cloned()
    }

    pub(crate) fn set_singleton_method(&self, name: Symbol, method: Method)
        -> Option<Method>
    {
        self.0.singleton.borrow_mut().insert(name, method)
    }

    pub(crate) fn remove_singleton_method(&self, name: &str) -> Option<Method>
    {
        self.0.singleton.borrow_mut().remove(name)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.0.id)
            .field("class", &self.0.class.name())
            .field("kind", &self.0.kind)
            .finish()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.kind {
            ObjectKind::Double(Some(label)) => write!(f, "Double {:?}", label),
            ObjectKind::Double(None) => f.write_str("Double (anonymous)"),
            ObjectKind::Plain =>
                write!(f, "#<{}:{:#x}>", self.0.class.name(), self.0.id.0)
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        self.id() == other.id()
    }
}
