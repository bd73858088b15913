// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for individual step execution.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Step handed to the worker pool.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct StepDispatched<'a> {
    pub step: &'a str,
    pub in_flight: usize,
}

impl Display for StepDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' dispatched ({} in flight)",
            self.step, self.in_flight
        )
    }
}

impl StructuredLog for StepDispatched<'_> {
    fn log(&self) {
        tracing::debug!(step = self.step, in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("step", span_name = name, step = self.step)
    }
}

/// Step completed and its items were published.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use buildchain::observability::messages::step::StepCompleted;
/// use std::time::Duration;
///
/// let msg = StepCompleted {
///     step: "compile",
///     produced: 2,
///     duration: Duration::from_millis(10),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StepCompleted<'a> {
    pub step: &'a str,
    pub produced: usize,
    pub duration: std::time::Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' completed: produced={} items, duration={:?}",
            self.step, self.produced, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            step = self.step,
            produced = self.produced,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_completed",
            span_name = name,
            step = self.step,
            produced = self.produced,
        )
    }
}

/// Step failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StepFailed<'a> {
    pub step: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' failed: {}", self.step, self.error)
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(step = self.step, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_failed",
            span_name = name,
            step = self.step,
            error = %self.error,
        )
    }
}

/// In-flight step aborted after another step failed.
///
/// # Log Level
/// `warn!`
pub struct StepCancelled<'a> {
    pub step: &'a str,
}

impl Display for StepCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' cancelled", self.step)
    }
}

impl StructuredLog for StepCancelled<'_> {
    fn log(&self) {
        tracing::warn!(step = self.step, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("step_cancelled", span_name = name, step = self.step)
    }
}
