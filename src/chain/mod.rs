// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod builder;
mod dot;
mod graph;
mod provider;
mod validation;

pub use builder::{BuildChainBuilder, StepBuilder};
pub use graph::BuildGraph;
pub(crate) use graph::StepNode;
pub use provider::BuildProvider;

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::engine::{ExecutionContext, ExecutionResult, Scheduler};
use crate::errors::BuildError;
use crate::item::RootInputs;

/// A validated graph bound to a scheduler configuration.
///
/// Immutable and cheap to clone; every [`run`](Self::run) gets its own
/// execution context, so runs are independent and may overlap.
#[derive(Clone, Debug)]
pub struct BuildChain {
    graph: Arc<BuildGraph>,
    scheduler: Scheduler,
}

impl BuildChain {
    pub(crate) fn new(graph: BuildGraph, config: SchedulerConfig) -> Self {
        Self {
            graph: Arc::new(graph),
            scheduler: Scheduler::new(config),
        }
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    /// Run every step of the chain once with the given root inputs
    pub async fn run(&self, roots: RootInputs) -> Result<ExecutionResult, BuildError> {
        let context = ExecutionContext::with_roots(&self.graph, roots).map_err(BuildError::new)?;
        self.scheduler
            .execute(Arc::clone(&self.graph), context)
            .await
    }
}
