// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::ContextError;
use crate::item::{downcast, erase, BuildItem, ItemId, ItemValue};
use crate::step::StepDescriptor;

/// What a running step sees of the build.
///
/// Holds a snapshot of the step's consumed items taken when it was
/// dispatched, and buffers what it produces until it finishes. Access is
/// checked against the step's declaration.
pub struct StepContext {
    descriptor: Arc<StepDescriptor>,
    consumed: HashMap<ItemId, ItemValue>,
    produced: Vec<(ItemId, ItemValue)>,
    cancellation: CancellationToken,
}

impl StepContext {
    pub(crate) fn new(
        descriptor: Arc<StepDescriptor>,
        consumed: HashMap<ItemId, ItemValue>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            descriptor,
            consumed,
            produced: Vec::new(),
            cancellation,
        }
    }

    /// Name of the running step
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Read a declared item.
    ///
    /// Fails for optional items that nobody produced; use
    /// [`consume_optional`](Self::consume_optional) for those.
    pub fn consume<T: BuildItem>(&self) -> Result<Arc<T>, ContextError> {
        let id = ItemId::of::<T>();
        self.check_consume(&id)?;
        self.consumed
            .get(&id)
            .and_then(downcast::<T>)
            .ok_or_else(|| ContextError::NotAvailable {
                step: self.descriptor.name.clone(),
                item: id.name().to_string(),
            })
    }

    /// Read a declared item that may not have been produced
    pub fn consume_optional<T: BuildItem>(&self) -> Result<Option<Arc<T>>, ContextError> {
        let id = ItemId::of::<T>();
        self.check_consume(&id)?;
        Ok(self.consumed.get(&id).and_then(downcast::<T>))
    }

    /// Produce a declared item. Each item can be produced once per run.
    pub fn produce<T: BuildItem>(&mut self, value: T) -> Result<(), ContextError> {
        let (id, value) = erase(value);
        if !self.descriptor.produces_item(&id) {
            return Err(ContextError::UndeclaredProduce {
                step: self.descriptor.name.clone(),
                item: id.name().to_string(),
            });
        }
        if self.produced.iter().any(|(existing, _)| existing == &id) {
            return Err(ContextError::AlreadyProduced {
                step: self.descriptor.name.clone(),
                item: id.name().to_string(),
            });
        }
        self.produced.push((id, value));
        Ok(())
    }

    /// True once the build has failed elsewhere and stopped dispatching.
    ///
    /// Long running steps can poll this, or await
    /// [`cancellation`](Self::cancellation), to stop early.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    fn check_consume(&self, id: &ItemId) -> Result<(), ContextError> {
        if self.descriptor.consumes_item(id) {
            Ok(())
        } else {
            Err(ContextError::UndeclaredConsume {
                step: self.descriptor.name.clone(),
                item: id.name().to_string(),
            })
        }
    }

    /// First declared output the step has not produced
    pub(crate) fn missing_output(&self) -> Option<ItemId> {
        self.descriptor
            .produces
            .iter()
            .find(|id| !self.produced.iter().any(|(p, _)| p == *id))
            .copied()
    }

    /// Move the context out, leaving an empty one with the same declaration
    pub(crate) fn take(&mut self) -> StepContext {
        let empty = StepContext::new(
            Arc::clone(&self.descriptor),
            HashMap::new(),
            self.cancellation.clone(),
        );
        std::mem::replace(self, empty)
    }

    pub(crate) fn into_produced(self) -> Vec<(ItemId, ItemValue)> {
        self.produced
    }
}
