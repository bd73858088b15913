// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::item::ItemId;

/// A consumed item together with whether the step can run without it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consume {
    pub item: ItemId,
    pub optional: bool,
}

/// Static declaration of a step: its name and the items it reads and writes
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub name: String,
    pub consumes: Vec<Consume>,
    pub produces: Vec<ItemId>,
}

impl StepDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    /// Record a consumed item; a required declaration wins over an optional one
    pub(crate) fn add_consume(&mut self, item: ItemId, optional: bool) {
        match self.consumes.iter_mut().find(|c| c.item == item) {
            Some(existing) => existing.optional &= optional,
            None => self.consumes.push(Consume { item, optional }),
        }
    }

    pub(crate) fn add_produce(&mut self, item: ItemId) {
        if !self.produces.contains(&item) {
            self.produces.push(item);
        }
    }

    pub fn consumes_item(&self, item: &ItemId) -> bool {
        self.consumes.iter().any(|c| &c.item == item)
    }

    pub fn produces_item(&self, item: &ItemId) -> bool {
        self.produces.contains(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_consume_overrides_optional() {
        let mut descriptor = StepDescriptor::new("s");
        descriptor.add_consume(ItemId::of::<u32>(), true);
        descriptor.add_consume(ItemId::of::<u32>(), false);
        assert_eq!(descriptor.consumes.len(), 1);
        assert!(!descriptor.consumes[0].optional);
    }

    #[test]
    fn test_produces_are_deduplicated() {
        let mut descriptor = StepDescriptor::new("s");
        descriptor.add_produce(ItemId::of::<u32>());
        descriptor.add_produce(ItemId::of::<u32>());
        assert_eq!(descriptor.produces.len(), 1);
        assert!(descriptor.produces_item(&ItemId::of::<u32>()));
        assert!(!descriptor.consumes_item(&ItemId::of::<u32>()));
    }
}
