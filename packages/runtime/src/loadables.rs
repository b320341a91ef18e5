//! Loadables: plugin-provided entries grouped by open-ended category
//! strings and delivered to whichever plugin owns the category.

use smol_str::SmolStr;
use std::any::{type_name, Any};
use std::fmt;

/// One type-erased entry. The owning loader downcasts it.
pub struct Loadable {
    source: SmolStr,
    type_name: &'static str,
    entry: Box<dyn Any>,
}

impl Loadable {
    pub fn new<T: Any>(entry: T) -> Self {
        Self {
            source: SmolStr::default(),
            type_name: type_name::<T>(),
            entry: Box::new(entry),
        }
    }

    /// Id of the plugin that provided this entry.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.entry.is::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self {
            source,
            type_name,
            entry,
        } = self;
        match entry.downcast::<T>() {
            Ok(entry) => Ok(*entry),
            Err(entry) => Err(Self {
                source,
                type_name,
                entry,
            }),
        }
    }

    pub(crate) fn with_source(mut self, source: &str) -> Self {
        self.source = SmolStr::new(source);
        self
    }
}

impl fmt::Debug for Loadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loadable")
            .field("source", &self.source)
            .field("type", &self.type_name)
            .finish()
    }
}

/// Entries a plugin contributes, in declaration order.
#[derive(Debug, Default)]
pub struct Loadables {
    entries: Vec<(SmolStr, Loadable)>,
}

impl Loadables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Any>(&mut self, category: &str, entry: T) {
        self.entries.push((SmolStr::new(category), Loadable::new(entry)));
    }

    /// Builder form of [`Loadables::add`].
    pub fn with<T: Any>(mut self, category: &str, entry: T) -> Self {
        self.add(category, entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(category, _)| category.as_str())
    }
}

impl IntoIterator for Loadables {
    type Item = (SmolStr, Loadable);
    type IntoIter = std::vec::IntoIter<(SmolStr, Loadable)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
