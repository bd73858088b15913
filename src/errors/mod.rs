// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod context;
mod execution;
mod graph;

pub use config::ConfigError;
pub use context::ContextError;
pub use execution::{
    BoxError, BuildError, BuildFailure, DuplicateProducerError, FailurePolicy, StepExecutionError,
    StepFailure,
};
pub use graph::GraphError;
