// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::context::Slot;
use crate::engine::StepState;
use crate::item::{downcast, BuildItem, ItemId};

/// Lookup of an item that no step produced during the run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Item '{item}' was not produced")]
pub struct NotProduced {
    pub item: String,
}

/// Everything a build published, plus the final state of each step.
///
/// Root inputs are included and attributed to `<root>`.
pub struct ExecutionResult {
    slots: HashMap<ItemId, Slot>,
    states: HashMap<String, StepState>,
}

impl ExecutionResult {
    pub(crate) fn new(slots: HashMap<ItemId, Slot>, states: HashMap<String, StepState>) -> Self {
        Self { slots, states }
    }

    pub fn get<T: BuildItem>(&self) -> Result<Arc<T>, NotProduced> {
        let id = ItemId::of::<T>();
        self.slots
            .get(&id)
            .and_then(|slot| downcast::<T>(&slot.value))
            .ok_or_else(|| NotProduced {
                item: id.name().to_string(),
            })
    }

    pub fn contains<T: BuildItem>(&self) -> bool {
        self.slots.contains_key(&ItemId::of::<T>())
    }

    /// Step that published the item, or `<root>` for root inputs
    pub fn producer_of<T: BuildItem>(&self) -> Option<&str> {
        self.slots
            .get(&ItemId::of::<T>())
            .map(|slot| slot.producer.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.slots.keys()
    }

    pub fn step_state(&self, step: &str) -> Option<StepState> {
        self.states.get(step).copied()
    }

    /// Names of the steps that ended in `state`, sorted
    pub fn steps_in_state(&self, state: StepState) -> Vec<&str> {
        let mut steps: Vec<&str> = self
            .states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(name, _)| name.as_str())
            .collect();
        steps.sort_unstable();
        steps
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<String> = self.slots.keys().map(ItemId::short_name).collect();
        items.sort_unstable();
        f.debug_struct("ExecutionResult")
            .field("items", &items)
            .field("states", &self.states)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecutionContext;
    use crate::item::erase;

    struct Report(&'static str);
    #[derive(Debug)]
    struct Unused;

    #[test]
    fn test_lookup_by_type() {
        let mut context = ExecutionContext::new();
        context.publish("render", vec![erase(Report("ok"))]).unwrap();
        let states = HashMap::from([("render".to_string(), StepState::Completed)]);
        let result = context.into_result(states);

        assert_eq!(result.get::<Report>().unwrap().0, "ok");
        assert_eq!(result.producer_of::<Report>(), Some("render"));
        assert_eq!(result.step_state("render"), Some(StepState::Completed));
        assert_eq!(result.steps_in_state(StepState::Completed), vec!["render"]);

        let err = result.get::<Unused>().unwrap_err();
        assert!(err.item.ends_with("Unused"));
        assert!(!result.contains::<Unused>());
    }
}
