// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dependency-counting scheduler over a tokio worker pool.
//!
//! Each step carries a count of producers it still waits on. Steps whose
//! count reaches zero go to a ready queue; the scheduler loop moves them
//! onto a `JoinSet` while fewer than `max_concurrency` are in flight, and
//! settles them one at a time as they finish:
//!
//! ```text
//! ready queue --dispatch--> JoinSet --join_next--> publish items
//!      ^                                               |
//!      +------------ promote dependents ---------------+
//! ```
//!
//! The loop task owns the [`ExecutionContext`] and is its only writer.
//! Running steps hold `Arc` snapshots of the values they consume and hand
//! back what they produced, so nothing in here takes a lock.
//!
//! After the first failure nothing new is dispatched. In-flight steps are
//! drained or aborted according to [`FailurePolicy`]; steps never
//! dispatched end up [`StepState::Skipped`].

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::chain::{BuildGraph, StepNode};
use crate::config::SchedulerConfig;
use crate::engine::{ExecutionContext, ExecutionResult, StepState};
use crate::errors::{BuildError, BuildFailure, FailurePolicy, StepExecutionError, StepFailure};
use crate::item::{ItemId, ItemValue};
use crate::observability::messages::engine::{
    BuildCompleted, BuildFailed, BuildStarted, DispatchHalted,
};
use crate::observability::messages::step::{
    StepCancelled, StepCompleted, StepDispatched, StepFailed,
};
use crate::observability::messages::StructuredLog;
use crate::step::{BuildStep, StepContext};

/// Runs validated graphs according to a [`SchedulerConfig`]
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run every step of `graph` once against `context`.
    ///
    /// On failure the returned error carries the first failure observed and
    /// the items published up to the point the build stopped.
    pub async fn execute(
        &self,
        graph: Arc<BuildGraph>,
        context: ExecutionContext,
    ) -> Result<ExecutionResult, BuildError> {
        let started = Instant::now();
        let mut run = Run::new(graph.nodes(), context, &self.config);

        BuildStarted {
            step_count: run.nodes.len(),
            root_count: run.context.len(),
            max_concurrency: run.max_concurrency,
        }
        .log();

        loop {
            run.dispatch_ready();
            match run.running.join_next_with_id().await {
                Some(joined) => run.settle(joined),
                None => break,
            }
        }

        run.finish(started.elapsed())
    }
}

/// What a step hands back when it finishes cleanly
struct StepOutput {
    produced: Vec<(ItemId, ItemValue)>,
    duration: Duration,
}

type StepOutcome = Result<StepOutput, StepFailure>;

/// Mutable state of one build
struct Run<'g> {
    nodes: &'g [StepNode],
    context: ExecutionContext,
    states: Vec<StepState>,
    /// Producers each step still waits on
    remaining: Vec<usize>,
    ready: VecDeque<usize>,
    running: JoinSet<StepOutcome>,
    in_flight: HashMap<task::Id, usize>,
    cancellation: CancellationToken,
    failure: Option<BuildFailure>,
    completed: usize,
    max_concurrency: usize,
    policy: FailurePolicy,
    timeout: Option<Duration>,
}

impl<'g> Run<'g> {
    fn new(nodes: &'g [StepNode], context: ExecutionContext, config: &SchedulerConfig) -> Self {
        let remaining: Vec<usize> = nodes.iter().map(|n| n.dependencies.len()).collect();
        let ready: VecDeque<usize> = (0..nodes.len()).filter(|&i| remaining[i] == 0).collect();
        let mut states = vec![StepState::Pending; nodes.len()];
        for &index in &ready {
            states[index] = StepState::Ready;
        }

        Self {
            nodes,
            context,
            states,
            remaining,
            ready,
            running: JoinSet::new(),
            in_flight: HashMap::new(),
            cancellation: CancellationToken::new(),
            failure: None,
            completed: 0,
            max_concurrency: config.effective_concurrency(),
            policy: config.failure_policy,
            timeout: config.step_timeout(),
        }
    }

    fn dispatch_ready(&mut self) {
        let nodes = self.nodes;
        while self.failure.is_none() && self.running.len() < self.max_concurrency {
            let Some(index) = self.ready.pop_front() else {
                break;
            };
            let node = &nodes[index];

            // Snapshot of everything the step consumes; absent optionals are left out
            let consumed: HashMap<ItemId, ItemValue> = node
                .descriptor
                .consumes
                .iter()
                .filter_map(|c| {
                    self.context
                        .value(&c.item)
                        .map(|value| (c.item, Arc::clone(value)))
                })
                .collect();
            let ctx = StepContext::new(
                Arc::clone(&node.descriptor),
                consumed,
                self.cancellation.clone(),
            );

            self.transition(index, StepState::Running);
            let message = StepDispatched {
                step: &node.descriptor.name,
                in_flight: self.running.len() + 1,
            };
            message.log();
            let span = message.span("dispatch");

            let handle = self.running.spawn(
                run_step(Arc::clone(&node.action), ctx, self.timeout).instrument(span),
            );
            self.in_flight.insert(handle.id(), index);
        }
    }

    fn settle(&mut self, joined: Result<(task::Id, StepOutcome), JoinError>) {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, Ok(outcome)),
            Err(error) => (error.id(), Err(error)),
        };
        let Some(index) = self.in_flight.remove(&id) else {
            self.halt(
                "<unknown>",
                BuildFailure::Internal {
                    message: format!("finished task {id} was never dispatched"),
                },
            );
            return;
        };
        let nodes = self.nodes;
        let name = nodes[index].descriptor.name.as_str();

        match outcome {
            Ok(Ok(output)) => self.complete(index, output),
            Ok(Err(failure)) => self.fail(index, failure),
            Err(error) if error.is_cancelled() => {
                self.transition(index, StepState::Cancelled);
                StepCancelled { step: name }.log();
            }
            Err(error) => {
                let message = panic_message(error.into_panic());
                self.fail(index, StepFailure::Panicked { message });
            }
        }
    }

    fn complete(&mut self, index: usize, output: StepOutput) {
        let nodes = self.nodes;
        let node = &nodes[index];
        let name = node.descriptor.name.as_str();

        let produced = match self.context.publish(name, output.produced) {
            Ok(count) => count,
            Err(error) => {
                self.transition(index, StepState::Failed);
                StepFailed {
                    step: name,
                    error: &error,
                }
                .log();
                self.halt(name, error.into());
                return;
            }
        };

        self.transition(index, StepState::Completed);
        self.completed += 1;
        StepCompleted {
            step: name,
            produced,
            duration: output.duration,
        }
        .log();

        for &dependent in &node.dependents {
            self.remaining[dependent] -= 1;
            if self.remaining[dependent] == 0 {
                self.transition(dependent, StepState::Ready);
                self.ready.push_back(dependent);
            }
        }
    }

    fn fail(&mut self, index: usize, failure: StepFailure) {
        let nodes = self.nodes;
        let name = nodes[index].descriptor.name.as_str();
        self.transition(index, StepState::Failed);
        StepFailed {
            step: name,
            error: &failure,
        }
        .log();
        self.halt(
            name,
            StepExecutionError {
                step: name.to_string(),
                failure,
            }
            .into(),
        );
    }

    /// Record the first failure and stop dispatching. Later failures are
    /// logged by the caller and otherwise dropped.
    fn halt(&mut self, failed_step: &str, cause: BuildFailure) {
        if self.failure.is_some() {
            return;
        }
        DispatchHalted {
            failed_step,
            in_flight: self.running.len(),
            policy: self.policy,
        }
        .log();

        self.cancellation.cancel();
        if self.policy == FailurePolicy::Abort {
            self.running.abort_all();
        }
        self.failure = Some(cause);
    }

    fn transition(&mut self, index: usize, next: StepState) {
        debug_assert!(
            self.states[index].can_transition_to(next),
            "invalid step transition {} -> {next} for '{}'",
            self.states[index],
            self.nodes[index].descriptor.name
        );
        self.states[index] = next;
    }

    fn finish(mut self, duration: Duration) -> Result<ExecutionResult, BuildError> {
        let stalled = self.states.iter().any(|s| !s.is_terminal());
        for index in 0..self.states.len() {
            if !self.states[index].is_terminal() {
                self.transition(index, StepState::Skipped);
            }
        }

        let failure = match self.failure.take() {
            Some(failure) => Some(failure),
            // Only reachable if the graph had a cycle the builder missed
            None if stalled => Some(BuildFailure::Internal {
                message: "no runnable steps left but the build is incomplete".to_string(),
            }),
            None => None,
        };

        let states: HashMap<String, StepState> = self
            .nodes
            .iter()
            .zip(&self.states)
            .map(|(node, state)| (node.descriptor.name.clone(), *state))
            .collect();
        let step_count = self.nodes.len();
        let completed = self.completed;
        let result = self.context.into_result(states);

        match failure {
            Some(cause) => {
                let error = BuildError::with_partial(cause, result);
                BuildFailed {
                    error: &error,
                    completed_steps: completed,
                    duration,
                }
                .log();
                Err(error)
            }
            None => {
                BuildCompleted {
                    step_count,
                    item_count: result.len(),
                    duration,
                }
                .log();
                Ok(result)
            }
        }
    }
}

/// Body of one worker task
async fn run_step(
    action: Arc<dyn BuildStep>,
    mut ctx: StepContext,
    timeout: Option<Duration>,
) -> StepOutcome {
    let started = Instant::now();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, action.execute(&mut ctx))
            .await
            .map_err(|_| StepFailure::TimedOut(limit))?,
        None => action.execute(&mut ctx).await,
    };
    result?;

    if let Some(item) = ctx.missing_output() {
        return Err(StepFailure::MissingOutput {
            item: item.name().to_string(),
        });
    }
    Ok(StepOutput {
        produced: ctx.into_produced(),
        duration: started.elapsed(),
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7u8)), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_empty_graph_completes() {
        let graph = crate::chain::BuildChainBuilder::new().build_graph().unwrap();
        let result = Scheduler::default()
            .execute(Arc::new(graph), ExecutionContext::new())
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
