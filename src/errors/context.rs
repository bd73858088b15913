// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors a step can hit while talking to its [`StepContext`](crate::step::StepContext).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The step asked for an item it never declared as consumed
    #[error("Step '{step}' did not declare that it consumes '{item}'")]
    UndeclaredConsume { step: String, item: String },

    /// An optional item was requested through the required accessor and is absent
    #[error("Item '{item}' is not available to step '{step}'")]
    NotAvailable { step: String, item: String },

    /// The step tried to produce an item it never declared
    #[error("Step '{step}' did not declare that it produces '{item}'")]
    UndeclaredProduce { step: String, item: String },

    /// The step produced the same item twice
    #[error("Step '{step}' already produced '{item}'")]
    AlreadyProduced { step: String, item: String },
}
