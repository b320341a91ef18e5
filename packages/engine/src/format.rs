use std::fmt::Debug;
use std::hash::Hash;

/// An external representation engines convert to and from.
///
/// `Item` is the external unit (an element, a text run, a string) and `Key`
/// its identity, used by mapping tables to cross-reference items and nodes.
pub trait Format: 'static {
    /// Id of the format's base engine.
    const ID: &'static str;

    type Item: 'static;
    type Key: Clone + Eq + Hash + Debug + 'static;

    fn key(item: &Self::Item) -> Self::Key;
}
