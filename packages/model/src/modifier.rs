//! # Modifier Stack
//!
//! Formats and attribute bags attached to nodes.
//!
//! The order of a [`Modifiers`] stack is nesting order: the first modifier is
//! the outermost wrapper when the node is rendered. Two adjacent nodes whose
//! stacks share a structurally equal prefix can be rendered under the same
//! wrappers.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Key/value attributes (class, style, href, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<SmolStr, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove("class");
        } else {
            let joined = remaining.join(" ");
            self.set("class", joined);
        }
    }
}

impl<K: Into<SmolStr>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single marker in a modifier stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Modifier {
    /// Named format such as `B`, `I` or `A`. Names are uppercase.
    Format {
        name: SmolStr,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },

    /// Attributes that apply to the node itself rather than a wrapper.
    Attributes { attributes: Attributes },
}

impl Modifier {
    pub fn format(name: impl AsRef<str>) -> Self {
        Self::format_with(name, Attributes::new())
    }

    pub fn format_with(name: impl AsRef<str>, attributes: Attributes) -> Self {
        Modifier::Format {
            name: SmolStr::new(name.as_ref().to_ascii_uppercase()),
            attributes,
        }
    }

    pub fn attributes(attributes: Attributes) -> Self {
        Modifier::Attributes { attributes }
    }

    /// Format name, `None` for attribute bags.
    pub fn name(&self) -> Option<&str> {
        match self {
            Modifier::Format { name, .. } => Some(name.as_str()),
            Modifier::Attributes { .. } => None,
        }
    }

    pub fn is_format(&self, name: &str) -> bool {
        self.name().map_or(false, |n| n.eq_ignore_ascii_case(name))
    }

    pub fn attrs(&self) -> &Attributes {
        match self {
            Modifier::Format { attributes, .. } | Modifier::Attributes { attributes } => attributes,
        }
    }
}

/// Ordered modifier stack of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(Vec<Modifier>);

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Modifier> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Modifier> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Modifier> {
        self.0.first()
    }

    /// Add as the innermost modifier.
    pub fn append(&mut self, modifier: Modifier) {
        self.0.push(modifier);
    }

    /// Add as the outermost modifier.
    pub fn prepend(&mut self, modifier: Modifier) {
        self.0.insert(0, modifier);
    }

    pub fn insert(&mut self, index: usize, modifier: Modifier) {
        let index = index.min(self.0.len());
        self.0.insert(index, modifier);
    }

    pub fn remove(&mut self, index: usize) -> Option<Modifier> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    /// Remove every modifier matching `predicate`, returning how many were removed.
    pub fn remove_where(&mut self, predicate: impl Fn(&Modifier) -> bool) -> usize {
        let before = self.0.len();
        self.0.retain(|m| !predicate(m));
        before - self.0.len()
    }

    pub fn find(&self, predicate: impl Fn(&Modifier) -> bool) -> Option<&Modifier> {
        self.0.iter().find(|m| predicate(m))
    }

    pub fn contains(&self, modifier: &Modifier) -> bool {
        self.0.contains(modifier)
    }

    pub fn find_format(&self, name: &str) -> Option<&Modifier> {
        self.find(|m| m.is_format(name))
    }

    pub fn has_format(&self, name: &str) -> bool {
        self.find_format(name).is_some()
    }

    /// Remove every format named like `modifier`, or append `modifier` if
    /// there was none. Returns `true` when the format ends up applied.
    pub fn toggle(&mut self, modifier: Modifier) -> bool {
        match modifier.name() {
            Some(name) => {
                let name = name.to_string();
                if self.remove_where(|m| m.is_format(&name)) > 0 {
                    false
                } else {
                    self.append(modifier);
                    true
                }
            }
            None => {
                if let Some(index) = self.0.iter().position(|m| *m == modifier) {
                    self.0.remove(index);
                    false
                } else {
                    self.append(modifier);
                    true
                }
            }
        }
    }

    /// Append the modifiers of `other` missing from this stack, in their order.
    pub fn merge(&mut self, other: &Modifiers) {
        for modifier in other.iter() {
            if !self.contains(modifier) {
                self.0.push(modifier.clone());
            }
        }
    }

    /// Length of the structurally equal prefix shared with `other`.
    pub fn common_prefix_len(&self, other: &Modifiers) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Format modifiers only, in nesting order.
    pub fn formats(&self) -> impl Iterator<Item = &Modifier> {
        self.0.iter().filter(|m| m.name().is_some())
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Modifiers {
    type Item = &'a Modifier;
    type IntoIter = std::slice::Iter<'a, Modifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
