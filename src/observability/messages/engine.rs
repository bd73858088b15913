// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for build lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Build start and scheduler configuration
//! * Build completion and failure
//! * Dispatch being halted after a failure

use crate::errors::FailurePolicy;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Build started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use buildchain::observability::messages::engine::BuildStarted;
///
/// let msg = BuildStarted {
///     step_count: 5,
///     root_count: 2,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BuildStarted {
    pub step_count: usize,
    pub root_count: usize,
    pub max_concurrency: usize,
}

impl Display for BuildStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting build: {} steps, {} root inputs, max_concurrency={}",
            self.step_count, self.root_count, self.max_concurrency
        )
    }
}

impl StructuredLog for BuildStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            root_count = self.root_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "build",
            span_name = name,
            step_count = self.step_count,
            root_count = self.root_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Build completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use buildchain::observability::messages::engine::BuildCompleted;
/// use std::time::Duration;
///
/// let msg = BuildCompleted {
///     step_count: 5,
///     item_count: 7,
///     duration: Duration::from_millis(250),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BuildCompleted {
    pub step_count: usize,
    pub item_count: usize,
    pub duration: std::time::Duration,
}

impl Display for BuildCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Build completed: {} steps produced {} items in {:?}",
            self.step_count, self.item_count, self.duration
        )
    }
}

impl StructuredLog for BuildCompleted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            item_count = self.item_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "build_completed",
            span_name = name,
            step_count = self.step_count,
            duration = ?self.duration,
        )
    }
}

/// Build failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BuildFailed<'a> {
    pub error: &'a dyn std::error::Error,
    pub completed_steps: usize,
    pub duration: std::time::Duration,
}

impl Display for BuildFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Build failed after {} completed steps in {:?}: {}",
            self.completed_steps, self.duration, self.error
        )
    }
}

impl StructuredLog for BuildFailed<'_> {
    fn log(&self) {
        tracing::error!(
            error = %self.error,
            completed_steps = self.completed_steps,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "build_failed",
            span_name = name,
            error = %self.error,
        )
    }
}

/// First failure seen; no further steps will be dispatched.
///
/// # Log Level
/// `warn!` - Degraded but continuing until in-flight work settles
pub struct DispatchHalted<'a> {
    pub failed_step: &'a str,
    pub in_flight: usize,
    pub policy: FailurePolicy,
}

impl Display for DispatchHalted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let action = match self.policy {
            FailurePolicy::Drain => "draining",
            FailurePolicy::Abort => "aborting",
        };
        write!(
            f,
            "Step '{}' failed, dispatch halted; {} {} in-flight steps",
            self.failed_step, action, self.in_flight
        )
    }
}

impl StructuredLog for DispatchHalted<'_> {
    fn log(&self) {
        tracing::warn!(
            failed_step = self.failed_step,
            in_flight = self.in_flight,
            policy = ?self.policy,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "dispatch_halted",
            span_name = name,
            failed_step = self.failed_step,
        )
    }
}
