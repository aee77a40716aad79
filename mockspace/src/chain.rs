// vim: tw=80
//! Stubbing chains of messages like `a.b.c`.

use crate::{
    Error,
    Result,
    expectation::{Kind, MessageExpectation, Options},
    space::Space,
    target::MessageTarget,
    value::{Symbol, Value}
};

/// A chain of method names, optionally ending in a return value.
///
/// # Examples
/// ```
/// # use mockspace::*;
/// let dotted = Chain::from("one.two.three");
/// let listed = Chain::from(["one", "two", "three"]);
/// assert_eq!(dotted, listed);
///
/// // Equivalent to stubbing `one.two.three` and returning `:four`
/// let chain = Chain::from(["one", "two"]).returning("three", Value::sym("four"));
/// assert_eq!(3, chain.names().len());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    names: Vec<Symbol>,
    value: Option<Value>,
}

impl Chain {
    pub fn new<I, N>(names: I) -> Self
        where I: IntoIterator<Item = N>, N: Into<Symbol>
    {
        Chain {
            names: names.into_iter().map(Into::into).collect(),
            value: None
        }
    }

    /// Split a dot-separated chain like `"one.two.three"`.
    pub fn parse(chain: &str) -> Self {
        Chain::new(chain.split('.').filter(|s| !s.is_empty()))
    }

    /// Append `last` to the chain and make it return `value`.
    pub fn returning<N, V>(mut self, last: N, value: V) -> Self
        where N: Into<Symbol>, V: Into<Value>
    {
        self.names.push(last.into());
        self.value = Some(value.into());
        self
    }

    pub fn names(&self) -> &[Symbol] {
        &self.names
    }
}

impl From<&str> for Chain {
    fn from(chain: &str) -> Self {
        Chain::parse(chain)
    }
}

impl<N: Into<Symbol>, const K: usize> From<[N; K]> for Chain {
    fn from(names: [N; K]) -> Self {
        Chain::new(names)
    }
}

impl<N: Into<Symbol>> From<Vec<N>> for Chain {
    fn from(names: Vec<N>) -> Self {
        Chain::new(names)
    }
}

/// Configure `chain` on `target`.
///
/// The first name is added to `target` as a `kind` entry; every further name
/// lives on a fresh double returned by the previous one.  Returns the entry
/// for the last name.
#[track_caller]
pub(crate) fn build<T>(space: &Space, target: &T, chain: Chain, kind: Kind)
    -> Result<MessageExpectation>
    where T: MessageTarget + ?Sized
{
    let Chain { names, value } = chain;
    let (first, rest) = names.split_first().ok_or(Error::EmptyChain)?;
    let mut last = match kind {
        Kind::Expectation =>
            target.add_message_expectation(first.clone(), Options::default()),
        _ => target.add_stub(first.clone(), Options::default())
    };
    for (i, name) in rest.iter().enumerate() {
        let label = names[..=i].iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(".");
        let double = space.double(&label);
        last.and_return(&double)?;
        last = space.proxy_for(&double).add_stub(name.clone(),
                                                 Options::default());
    }
    if let Some(value) = value {
        last.clone().and_return(value)?;
    }
    Ok(last)
}
