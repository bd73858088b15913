// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod chain;         // graph builder + validation
pub mod config;        // scheduler configuration
pub mod engine;        // scheduler + per-build registry
pub mod errors;        // error handling
pub mod item;          // type-keyed items
pub mod observability;
pub mod step;          // step trait + context

pub use chain::{BuildChain, BuildChainBuilder};
pub use engine::ExecutionResult;
pub use errors::BuildError;
pub use item::RootInputs;
pub use step::{BuildStep, StepContext};
