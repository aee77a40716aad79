// vim: tw=80
//! Dynamically typed values passed to and returned from dispatched methods.

use std::{
    borrow::Borrow,
    fmt,
    rc::Rc
};

use crate::{
    Error,
    Result,
    object::Object
};

/// The name of a method.
///
/// String and symbol spellings are interchangeable: anything that converts to
/// a `&str` converts to a `Symbol`, and two symbols are equal when their text
/// is.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Rc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(Rc::from(s))
    }
}

impl From<&String> for Symbol {
    fn from(s: &String) -> Self {
        Symbol::new(s)
    }
}

impl From<&Symbol> for Symbol {
    fn from(s: &Symbol) -> Self {
        s.clone()
    }
}

/// A value flowing through a dispatched call.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(Symbol),
    List(Vec<Value>),
    Object(Object),
}

impl Value {
    /// Shorthand for `Value::Sym(Symbol::new(name))`
    pub fn sym(name: &str) -> Self {
        Value::Sym(Symbol::new(name))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None
        }
    }

    /// Send a message to this value.
    ///
    /// Only objects have methods; every other variant answers with
    /// [`Error::NoMethod`].
    pub fn send<N, C>(&self, name: N, call: C) -> Result<Value>
        where N: Into<Symbol>, C: Into<Call>
    {
        match self {
            Value::Object(o) => o.send(name, call),
            other => Err(Error::NoMethod {
                method: name.into().to_string(),
                receiver: other.to_string()
            })
        }
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Sym(_) => "symbol",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) |
            (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.id() == b.id(),
            _ => false
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Sym(s) => write!(f, ":{}", s),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            },
            Value::Object(o) => write!(f, "{}", o),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $e:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $e
                }
            }
        )*
    }
}

value_from! {
    () => |_u| Value::Nil,
    bool => |b| Value::Bool(b),
    i32 => |i| Value::Int(i64::from(i)),
    i64 => |i| Value::Int(i),
    u32 => |i| Value::Int(i64::from(i)),
    usize => |i| Value::Int(i as i64),
    f64 => |x| Value::Float(x),
    &str => |s| Value::Str(s.to_owned()),
    String => |s| Value::Str(s),
    Symbol => |s| Value::Sym(s),
    Object => |o| Value::Object(o),
    &Object => |o| Value::Object(o.clone()),
    Vec<Value> => |l| Value::List(l),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Value::Nil)
    }
}

/// Conversion out of a [`Value`], used for the arguments of methods defined
/// with [`#[methods]`](crate::methods).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Conversion {
        expected,
        value: value.to_string()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other))
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("integer", other))
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(i) => i32::try_from(*i)
                .map_err(|_| mismatch("32-bit integer", value)),
            other => Err(mismatch("integer", other))
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch("float", other))
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(mismatch("string", other))
        }
    }
}

impl FromValue for Symbol {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Sym(s) => Ok(s.clone()),
            Value::Str(s) => Ok(Symbol::new(s)),
            other => Err(mismatch("symbol", other))
        }
    }
}

impl FromValue for Object {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(o) => Ok(o.clone()),
            other => Err(mismatch("object", other))
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::List(l) => l.iter().map(T::from_value).collect(),
            other => Err(mismatch("list", other))
        }
    }
}

/// A block passed along with a call.  Stubs configured with `and_yield` invoke
/// it synchronously.
#[derive(Clone)]
pub struct Block(Rc<dyn Fn(&[Value]) -> Result<Value>>);

impl Block {
    pub fn new<F>(f: F) -> Self
        where F: Fn(&[Value]) -> Result<Value> + 'static
    {
        Block(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Block")
    }
}

/// The arguments of one message send.
#[derive(Clone, Debug, Default)]
pub struct Call {
    pub args: Vec<Value>,
    pub block: Option<Block>,
}

impl Call {
    pub fn new(args: Vec<Value>) -> Self {
        Call { args, block: None }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.block = Some(block);
        self
    }

    /// Fetch a positional argument.
    pub fn arg(&self, i: usize) -> Option<&Value> {
        self.args.get(i)
    }

    /// Render the arguments the way failure messages show them.
    pub fn describe_args(&self) -> String {
        describe_args(&self.args)
    }
}

pub(crate) fn describe_args(args: &[Value]) -> String {
    if args.is_empty() {
        "(no args)".to_owned()
    } else {
        let inner = args.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("({})", inner)
    }
}

impl From<Vec<Value>> for Call {
    fn from(args: Vec<Value>) -> Self {
        Call::new(args)
    }
}

impl From<()> for Call {
    fn from(_: ()) -> Self {
        Call::default()
    }
}

impl From<&Call> for Call {
    fn from(call: &Call) -> Self {
        call.clone()
    }
}

/// Build a `Vec<Value>` from a list of expressions convertible into
/// [`Value`].
///
/// # Examples
/// ```
/// # use mockspace::*;
/// let args = args![1, "two", Value::sym("three")];
/// assert_eq!(3, args.len());
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($e:expr),+ $(,)?) => {
        vec![$($crate::Value::from($e)),+]
    };
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn symbol_and_string_spellings_are_equal() {
        assert_eq!(Symbol::from("foo"), Symbol::from(String::from("foo")));
    }

    #[test]
    fn display_like_inspect() {
        let v = Value::List(vec![Value::Nil, Value::sym("a"), "b".into(),
            Value::Int(3)]);
        assert_eq!("[nil, :a, \"b\", 3]", v.to_string());
    }

    #[test]
    fn describe_no_args() {
        assert_eq!("(no args)", Call::default().describe_args());
        assert_eq!("(1, :x)", Call::new(vec![1.into(), Value::sym("x")])
            .describe_args());
    }

    #[test]
    fn conversion_error() {
        let e = i64::from_value(&Value::sym("x")).unwrap_err();
        assert!(matches!(e, Error::Conversion{expected: "integer", ..}));
    }
}
