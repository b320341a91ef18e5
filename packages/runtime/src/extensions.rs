//! Plugin-owned session values, stored by type. They live in
//! [`EditorState`](crate::EditorState) so a failed command rolls them back
//! together with the tree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

// Callers go through `dyn Slot` explicitly: the blanket impl also covers
// `&Box<dyn Slot>`, which is not 'static.
trait Slot {
    fn clone_slot(&self) -> Box<dyn Slot>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone> Slot for T {
    fn clone_slot(&self) -> Box<dyn Slot> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// At most one value per type.
#[derive(Default)]
pub struct Extensions {
    slots: HashMap<TypeId, Box<dyn Slot>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the one it replaces.
    pub fn insert<T: Any + Clone>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| (*previous).as_any().downcast_ref::<T>().cloned())
    }

    pub fn get<T: Any + Clone>(&self) -> Option<&T> {
        let slot = self.slots.get(&TypeId::of::<T>())?;
        (**slot).as_any().downcast_ref()
    }

    pub fn get_mut<T: Any + Clone>(&mut self) -> Option<&mut T> {
        let slot = self.slots.get_mut(&TypeId::of::<T>())?;
        (**slot).as_any_mut().downcast_mut()
    }

    pub fn remove<T: Any + Clone>(&mut self) -> Option<T> {
        let previous = self.slots.remove(&TypeId::of::<T>())?;
        (*previous).as_any().downcast_ref::<T>().cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Clone for Extensions {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(id, slot)| (*id, (**slot).clone_slot()))
                .collect(),
        }
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("len", &self.slots.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_values_are_keyed_by_type() {
        let mut extensions = Extensions::new();
        assert_eq!(extensions.insert(Counter(1)), None);
        assert_eq!(extensions.insert(String::from("x")), None);
        assert_eq!(extensions.insert(Counter(2)), Some(Counter(1)));

        assert_eq!(extensions.get::<Counter>(), Some(&Counter(2)));
        assert_eq!(extensions.get::<String>().map(String::as_str), Some("x"));
        assert_eq!(extensions.len(), 2);

        assert_eq!(extensions.remove::<String>(), Some(String::from("x")));
        assert!(extensions.get::<String>().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut extensions = Extensions::new();
        extensions.insert(Counter(1));
        let snapshot = extensions.clone();

        if let Some(counter) = extensions.get_mut::<Counter>() {
            counter.0 = 9;
        }
        assert_eq!(snapshot.get::<Counter>(), Some(&Counter(1)));
        assert_eq!(extensions.get::<Counter>(), Some(&Counter(9)));
    }
}
