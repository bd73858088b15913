// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed build items.
//!
//! An item is any `'static + Send + Sync` value. Items are keyed by their Rust
//! type: a build holds at most one value per type, which is what makes the
//! single-producer rule checkable. Values are stored type-erased behind an
//! `Arc` and recovered with a downcast keyed by the same [`ItemId`], so a
//! lookup through the typed accessors can never observe a value of the wrong
//! type.
//!
//! Data that several steps contribute to is modelled as one aggregator step
//! producing a collection type, e.g. `Vec<Route>` wrapped in a newtype.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Marker for values that can flow between build steps
pub trait BuildItem: Any + Send + Sync {}

impl<T: Any + Send + Sync> BuildItem for T {}

/// Type-erased item value as stored in the registry
pub type ItemValue = Arc<dyn Any + Send + Sync>;

/// Identity of an item type.
///
/// Equality and hashing use only the `TypeId`; the name is for diagnostics.
#[derive(Clone, Copy)]
pub struct ItemId {
    type_id: TypeId,
    name: &'static str,
}

impl ItemId {
    pub fn of<T: BuildItem>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with every module path stripped, used in graph output.
    ///
    /// `alloc::vec::Vec<my::Item>` becomes `Vec<Item>`, `(a::B, &c::D)`
    /// becomes `(B, &D)`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment_start = 0;
        for (index, ch) in self.name.char_indices() {
            if !is_path_char(ch) {
                out.push_str(last_segment(&self.name[segment_start..index]));
                out.push(ch);
                segment_start = index + ch.len_utf8();
            }
        }
        out.push_str(last_segment(&self.name[segment_start..]));
        out
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ItemId {}

impl Hash for ItemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.name)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn is_path_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == ':'
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Wrap a value for storage
pub(crate) fn erase<T: BuildItem>(value: T) -> (ItemId, ItemValue) {
    (ItemId::of::<T>(), Arc::new(value))
}

/// Recover a typed handle from a stored value
pub(crate) fn downcast<T: BuildItem>(value: &ItemValue) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

/// Values supplied from outside the build before it starts.
///
/// Every item declared with `add_initial` must be present here.
#[derive(Default, Clone)]
pub struct RootInputs(HashMap<ItemId, ItemValue>);

impl RootInputs {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Add a root value, replacing any earlier value of the same type
    pub fn insert<T: BuildItem>(&mut self, value: T) -> &mut Self {
        let (id, value) = erase(value);
        self.0.insert(id, value);
        self
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with<T: BuildItem>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.0.keys()
    }

    pub(crate) fn into_inner(self) -> HashMap<ItemId, ItemValue> {
        self.0
    }
}

impl fmt::Debug for RootInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod inner {
        pub struct Nested;
    }

    struct Wrapper<T>(#[allow(dead_code)] T);

    #[test]
    fn test_item_ids_compare_by_type() {
        assert_eq!(ItemId::of::<String>(), ItemId::of::<String>());
        assert_ne!(ItemId::of::<String>(), ItemId::of::<u32>());
    }

    #[test]
    fn test_short_name_strips_module_path() {
        assert_eq!(ItemId::of::<inner::Nested>().short_name(), "Nested");
        assert_eq!(ItemId::of::<u32>().short_name(), "u32");
        assert_eq!(
            ItemId::of::<Wrapper<inner::Nested>>().short_name(),
            "Wrapper<Nested>"
        );
        assert_eq!(ItemId::of::<Vec<String>>().short_name(), "Vec<String>");
    }

    #[test]
    fn test_short_name_keeps_tuple_and_reference_shape() {
        assert_eq!(
            ItemId::of::<(inner::Nested, String)>().short_name(),
            "(Nested, String)"
        );
        assert_eq!(
            ItemId::of::<&'static inner::Nested>().short_name(),
            "&Nested"
        );
        assert_eq!(
            ItemId::of::<[inner::Nested; 2]>().short_name(),
            "[Nested; 2]"
        );
    }

    #[test]
    fn test_downcast_round_trip() {
        let (id, value) = erase(42u64);
        assert_eq!(id, ItemId::of::<u64>());
        assert_eq!(*downcast::<u64>(&value).unwrap(), 42);
        assert!(downcast::<u32>(&value).is_none());
    }

    #[test]
    fn test_root_inputs_replace_same_type() {
        let roots = RootInputs::new().with(1u8).with(2u8).with("name".to_string());
        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&ItemId::of::<u8>()));
    }
}
