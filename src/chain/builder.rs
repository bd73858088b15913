// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::chain::validation::build_graph;
use crate::chain::{BuildChain, BuildGraph, BuildProvider};
use crate::config::SchedulerConfig;
use crate::engine::ExecutionResult;
use crate::errors::{BuildError, GraphError};
use crate::item::{BuildItem, ItemId, RootInputs};
use crate::observability::messages::chain::{
    GraphBuilt, GraphRejected, GraphWriteFailed, GraphWritten,
};
use crate::observability::messages::StructuredLog;
use crate::step::{BuildStep, FnStep, StepContext, StepDescriptor};

/// A step as registered, before graph construction
pub(crate) struct RegisteredStep {
    pub descriptor: StepDescriptor,
    pub action: Arc<dyn BuildStep>,
}

/// Collects steps, root inputs and final items, then builds the chain.
///
/// # Examples
///
/// ```rust
/// use buildchain::chain::BuildChainBuilder;
/// use buildchain::item::RootInputs;
///
/// struct Sources(Vec<String>);
/// struct FileCount(usize);
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = BuildChainBuilder::new();
/// builder
///     .add_step_fn("scan", |ctx| {
///         ctx.produce(Sources(vec!["main.rs".into()]))?;
///         Ok(())
///     })
///     .produces::<Sources>()
///     .register();
/// builder
///     .add_step_fn("count", |ctx| {
///         let sources = ctx.consume::<Sources>()?;
///         ctx.produce(FileCount(sources.0.len()))?;
///         Ok(())
///     })
///     .consumes::<Sources>()
///     .produces::<FileCount>()
///     .register();
///
/// let result = builder.build()?.run(RootInputs::new()).await?;
/// assert_eq!(result.get::<FileCount>()?.0, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BuildChainBuilder {
    steps: Vec<RegisteredStep>,
    initial: Vec<ItemId>,
    finals: Vec<ItemId>,
    config: SchedulerConfig,
}

impl BuildChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SchedulerConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Start declaring a step backed by a [`BuildStep`] implementation
    pub fn add_step<S>(&mut self, name: impl Into<String>, step: S) -> StepBuilder<'_>
    where
        S: BuildStep + 'static,
    {
        StepBuilder {
            chain: self,
            descriptor: StepDescriptor::new(name),
            action: Arc::new(step),
        }
    }

    /// Start declaring a step backed by a synchronous closure
    pub fn add_step_fn<F>(&mut self, name: impl Into<String>, f: F) -> StepBuilder<'_>
    where
        F: Fn(&mut StepContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_step(name, FnStep::new(f))
    }

    /// Register a step from explicit item lists. All consumes are required.
    pub fn register_step<S>(
        &mut self,
        name: impl Into<String>,
        consumes: impl IntoIterator<Item = ItemId>,
        produces: impl IntoIterator<Item = ItemId>,
        action: S,
    ) -> &mut Self
    where
        S: BuildStep + 'static,
    {
        let mut step = self.add_step(name, action);
        for item in consumes {
            step = step.consumes_id(item);
        }
        for item in produces {
            step = step.produces_id(item);
        }
        step.register()
    }

    /// Declare an item supplied from outside when the build runs.
    ///
    /// No step may produce a root item.
    pub fn add_initial<T: BuildItem>(&mut self) -> &mut Self {
        push_unique(&mut self.initial, ItemId::of::<T>());
        self
    }

    /// Declare an item the build must deliver.
    ///
    /// Once any final item is declared, only steps that contribute to a
    /// final item are part of the chain.
    pub fn add_final<T: BuildItem>(&mut self) -> &mut Self {
        push_unique(&mut self.finals, ItemId::of::<T>());
        self
    }

    /// Let a provider register its steps
    pub fn add_provider(&mut self, provider: &dyn BuildProvider) -> &mut Self {
        provider.install_into(self);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Validate the registered steps and assemble the graph, without side effects
    pub fn build_graph(&self) -> Result<BuildGraph, GraphError> {
        build_graph(&self.steps, &self.initial, &self.finals)
    }

    /// Validate the registered steps and produce a runnable chain.
    ///
    /// Writes the graph as DOT when `graph_output` is configured; a write
    /// failure is logged and does not fail the build.
    pub fn build(&self) -> Result<BuildChain, GraphError> {
        let graph = match self.build_graph() {
            Ok(graph) => graph,
            Err(error) => {
                GraphRejected { error: &error }.log();
                return Err(error);
            }
        };

        GraphBuilt {
            registered_steps: graph.registered_len(),
            included_steps: graph.len(),
            start_steps: graph.start_steps().len(),
            end_steps: graph.end_steps().len(),
        }
        .log();

        if let Some(path) = &self.config.graph_output {
            match graph.write_dot_file(path) {
                Ok(()) => GraphWritten {
                    path,
                    step_count: graph.len(),
                }
                .log(),
                Err(error) => GraphWriteFailed {
                    path,
                    error: &error,
                }
                .log(),
            }
        }

        Ok(BuildChain::new(graph, self.config.clone()))
    }

    /// Build the chain and run it once
    pub async fn run_build(&self, roots: RootInputs) -> Result<ExecutionResult, BuildError> {
        self.build()?.run(roots).await
    }

    fn push(&mut self, step: RegisteredStep) {
        self.steps.push(step);
    }
}

impl fmt::Debug for BuildChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildChainBuilder")
            .field(
                "steps",
                &self.steps.iter().map(|s| &s.descriptor).collect::<Vec<_>>(),
            )
            .field("initial", &self.initial)
            .field("finals", &self.finals)
            .field("config", &self.config)
            .finish()
    }
}

fn push_unique(items: &mut Vec<ItemId>, item: ItemId) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Declares the items of one step; nothing is added until [`register`](Self::register)
#[must_use = "the step is only added to the chain by calling `register`"]
pub struct StepBuilder<'a> {
    chain: &'a mut BuildChainBuilder,
    descriptor: StepDescriptor,
    action: Arc<dyn BuildStep>,
}

impl<'a> StepBuilder<'a> {
    pub fn consumes<T: BuildItem>(self) -> Self {
        self.consumes_id(ItemId::of::<T>())
    }

    /// Consume an item if some step produces it; the step runs either way
    pub fn consumes_optional<T: BuildItem>(mut self) -> Self {
        self.descriptor.add_consume(ItemId::of::<T>(), true);
        self
    }

    pub fn produces<T: BuildItem>(self) -> Self {
        self.produces_id(ItemId::of::<T>())
    }

    pub fn consumes_id(mut self, item: ItemId) -> Self {
        self.descriptor.add_consume(item, false);
        self
    }

    pub fn produces_id(mut self, item: ItemId) -> Self {
        self.descriptor.add_produce(item);
        self
    }

    pub fn register(self) -> &'a mut BuildChainBuilder {
        self.chain.push(RegisteredStep {
            descriptor: self.descriptor,
            action: self.action,
        });
        self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::BuildStep;
    use async_trait::async_trait;

    struct Input(u32);
    struct Doubled(u32);

    struct Doubler;

    #[async_trait]
    impl BuildStep for Doubler {
        async fn execute(&self, ctx: &mut StepContext) -> anyhow::Result<()> {
            let input = ctx.consume::<Input>()?;
            ctx.produce(Doubled(input.0 * 2))?;
            Ok(())
        }
    }

    #[test]
    fn test_register_step_with_item_lists() {
        let mut builder = BuildChainBuilder::new();
        builder.add_initial::<Input>().register_step(
            "double",
            [ItemId::of::<Input>()],
            [ItemId::of::<Doubled>()],
            Doubler,
        );

        let graph = builder.build_graph().unwrap();
        let step = graph.step("double").unwrap();
        assert!(step.consumes_item(&ItemId::of::<Input>()));
        assert!(step.produces_item(&ItemId::of::<Doubled>()));
    }

    #[test]
    fn test_unregistered_step_builder_adds_nothing() {
        let mut builder = BuildChainBuilder::new();
        let _ = builder.add_step("dropped", Doubler).produces::<Doubled>();
        assert_eq!(builder.step_count(), 0);
    }

    #[test]
    fn test_initial_and_final_are_deduplicated() {
        let mut builder = BuildChainBuilder::new();
        builder
            .add_initial::<Input>()
            .add_initial::<Input>()
            .add_final::<Doubled>()
            .add_final::<Doubled>();
        builder
            .add_step("double", Doubler)
            .consumes::<Input>()
            .produces::<Doubled>()
            .register();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.initial_items().len(), 1);
        assert_eq!(graph.final_items().len(), 1);
    }

    #[tokio::test]
    async fn test_run_build_one_shot() {
        let mut builder = BuildChainBuilder::new();
        builder.add_initial::<Input>();
        builder
            .add_step("double", Doubler)
            .consumes::<Input>()
            .produces::<Doubled>()
            .register();

        let result = builder
            .run_build(RootInputs::new().with(Input(21)))
            .await
            .unwrap();
        assert_eq!(result.get::<Doubled>().unwrap().0, 42);
    }

    #[test]
    fn test_build_writes_configured_graph_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.dot");

        let mut builder =
            BuildChainBuilder::with_config(SchedulerConfig::default().with_graph_output(&path));
        builder.add_initial::<Input>();
        builder
            .add_step("double", Doubler)
            .consumes::<Input>()
            .produces::<Doubled>()
            .register();

        builder.build().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"double\""));
    }
}
