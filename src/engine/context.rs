// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::BuildGraph;
use crate::config::consts::ROOT_PRODUCER;
use crate::engine::{ExecutionResult, StepState};
use crate::errors::{BuildFailure, DuplicateProducerError};
use crate::item::{ItemId, ItemValue, RootInputs};

/// A published value and who published it
#[derive(Clone)]
pub(crate) struct Slot {
    pub value: ItemValue,
    pub producer: Arc<str>,
}

/// Per-build registry of produced items.
///
/// Slots are write-once. The scheduler loop is the only writer and steps
/// only ever receive `Arc` snapshots of published slots, so the registry
/// needs no locking.
#[derive(Default)]
pub struct ExecutionContext {
    slots: HashMap<ItemId, Slot>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a context with the root inputs the graph declares.
    ///
    /// Every declared root must be supplied and nothing else may be.
    pub fn with_roots(graph: &BuildGraph, roots: RootInputs) -> Result<Self, BuildFailure> {
        if let Some(missing) = graph.initial_items().iter().find(|id| !roots.contains(id)) {
            return Err(BuildFailure::MissingRootInput {
                item: missing.name().to_string(),
            });
        }
        if let Some(extra) = roots.ids().find(|id| !graph.initial_items().contains(id)) {
            return Err(BuildFailure::UndeclaredRootInput {
                item: extra.name().to_string(),
            });
        }

        let producer: Arc<str> = Arc::from(ROOT_PRODUCER);
        let slots = roots
            .into_inner()
            .into_iter()
            .map(|(id, value)| {
                (
                    id,
                    Slot {
                        value,
                        producer: Arc::clone(&producer),
                    },
                )
            })
            .collect();
        Ok(Self { slots })
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn value(&self, id: &ItemId) -> Option<&ItemValue> {
        self.slots.get(id).map(|slot| &slot.value)
    }

    /// Publish everything one step produced.
    ///
    /// Checked as a whole first, so a rejected step leaves no partial
    /// output behind.
    pub(crate) fn publish(
        &mut self,
        step: &str,
        items: Vec<(ItemId, ItemValue)>,
    ) -> Result<usize, DuplicateProducerError> {
        if let Some((id, existing)) = items
            .iter()
            .find_map(|(id, _)| self.slots.get(id).map(|slot| (id, slot)))
        {
            return Err(DuplicateProducerError {
                item: id.name().to_string(),
                existing: existing.producer.to_string(),
                step: step.to_string(),
            });
        }

        let count = items.len();
        let producer: Arc<str> = Arc::from(step);
        for (id, value) in items {
            self.slots.insert(
                id,
                Slot {
                    value,
                    producer: Arc::clone(&producer),
                },
            );
        }
        Ok(count)
    }

    pub(crate) fn into_result(self, states: HashMap<String, StepState>) -> ExecutionResult {
        ExecutionResult::new(self.slots, states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::erase;

    #[test]
    fn test_slots_are_write_once() {
        let mut context = ExecutionContext::new();
        assert_eq!(context.publish("first", vec![erase(1u32)]).unwrap(), 1);

        let err = context
            .publish("second", vec![erase(2u64), erase(3u32)])
            .unwrap_err();
        assert_eq!(err.existing, "first");
        assert_eq!(err.step, "second");
        // Rejected batch leaves nothing behind
        assert!(!context.contains(&ItemId::of::<u64>()));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_published_value_is_readable() {
        let mut context = ExecutionContext::new();
        context.publish("p", vec![erase("text".to_string())]).unwrap();
        let value = context.value(&ItemId::of::<String>()).unwrap();
        assert_eq!(
            crate::item::downcast::<String>(value).unwrap().as_str(),
            "text"
        );
    }
}
