// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

use crate::engine::ExecutionResult;
use crate::errors::GraphError;

/// Boxed error type carried out of a failing step action
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How the scheduler reacts to the first failing step.
///
/// In both cases no new steps are dispatched after the failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Let already dispatched steps run to completion and keep their results
    #[default]
    Drain,
    /// Abort already dispatched steps
    Abort,
}

/// Why a single step failed
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The step action returned an error
    #[error("{source}")]
    Action {
        #[source]
        source: BoxError,
    },

    #[error("step panicked: {message}")]
    Panicked { message: String },

    #[error("step timed out after {0:?}")]
    TimedOut(Duration),

    /// The action succeeded but left a declared output unproduced
    #[error("step did not produce declared item '{item}'")]
    MissingOutput { item: String },
}

impl From<anyhow::Error> for StepFailure {
    fn from(error: anyhow::Error) -> Self {
        StepFailure::Action {
            source: error.into(),
        }
    }
}

/// A step action failed; already published items are left untouched.
#[derive(Debug, Error)]
#[error("Step '{step}' failed: {failure}")]
pub struct StepExecutionError {
    pub step: String,
    #[source]
    pub failure: StepFailure,
}

/// Runtime double write of an item slot.
///
/// The graph builder rejects multiple producers statically, so seeing this
/// means the graph and the registry disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Item '{item}' was already published by '{existing}' when step '{step}' produced it")]
pub struct DuplicateProducerError {
    pub item: String,
    pub existing: String,
    pub step: String,
}

/// The single root cause of a failed build
#[derive(Debug, Error)]
pub enum BuildFailure {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    DuplicateProducer(#[from] DuplicateProducerError),

    #[error(transparent)]
    StepExecution(#[from] StepExecutionError),

    #[error("No value supplied for root input '{item}'")]
    MissingRootInput { item: String },

    #[error("Root input '{item}' was supplied but never declared")]
    UndeclaredRootInput { item: String },

    #[error("Internal scheduler error: {message}")]
    Internal { message: String },
}

/// Error returned to the caller of a build.
///
/// Carries exactly one root cause (the first failure observed) and, when
/// execution had started, the items published before the build stopped.
#[derive(Debug, Error)]
#[error("Build failed: {cause}")]
pub struct BuildError {
    #[source]
    cause: BuildFailure,
    partial: Option<ExecutionResult>,
}

impl BuildError {
    pub fn new(cause: impl Into<BuildFailure>) -> Self {
        Self {
            cause: cause.into(),
            partial: None,
        }
    }

    pub fn with_partial(cause: impl Into<BuildFailure>, partial: ExecutionResult) -> Self {
        Self {
            cause: cause.into(),
            partial: Some(partial),
        }
    }

    pub fn cause(&self) -> &BuildFailure {
        &self.cause
    }

    /// Best effort view of what was produced before the failure
    pub fn partial_result(&self) -> Option<&ExecutionResult> {
        self.partial.as_ref()
    }

    /// Name of the step the failure is attributed to, if any
    pub fn failed_step(&self) -> Option<&str> {
        match &self.cause {
            BuildFailure::StepExecution(err) => Some(&err.step),
            BuildFailure::DuplicateProducer(err) => Some(&err.step),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (BuildFailure, Option<ExecutionResult>) {
        (self.cause, self.partial)
    }
}

impl From<GraphError> for BuildError {
    fn from(error: GraphError) -> Self {
        BuildError::new(error)
    }
}
