// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for build graph construction.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Build graph constructed and validated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use buildchain::observability::messages::chain::GraphBuilt;
///
/// let msg = GraphBuilt {
///     registered_steps: 6,
///     included_steps: 4,
///     start_steps: 1,
///     end_steps: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct GraphBuilt {
    pub registered_steps: usize,
    pub included_steps: usize,
    pub start_steps: usize,
    pub end_steps: usize,
}

impl Display for GraphBuilt {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Build graph ready: {} of {} steps included, {} start steps, {} end steps",
            self.included_steps, self.registered_steps, self.start_steps, self.end_steps
        )
    }
}

impl StructuredLog for GraphBuilt {
    fn log(&self) {
        tracing::info!(
            registered_steps = self.registered_steps,
            included_steps = self.included_steps,
            start_steps = self.start_steps,
            end_steps = self.end_steps,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_built",
            span_name = name,
            registered_steps = self.registered_steps,
            included_steps = self.included_steps,
        )
    }
}

/// A registered step does not contribute to any final item and is left out.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct StepExcluded<'a> {
    pub step: &'a str,
}

impl Display for StepExcluded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' excluded: it contributes to no final item",
            self.step
        )
    }
}

impl StructuredLog for StepExcluded<'_> {
    fn log(&self) {
        tracing::debug!(step = self.step, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("step_excluded", span_name = name, step = self.step)
    }
}

/// Graph construction rejected the registered steps.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct GraphRejected<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for GraphRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Build graph rejected: {}", self.error)
    }
}

impl StructuredLog for GraphRejected<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("graph_rejected", span_name = name, error = %self.error)
    }
}

/// Graph written out in DOT format.
///
/// # Log Level
/// `info!` - Important operational event
pub struct GraphWritten<'a> {
    pub path: &'a Path,
    pub step_count: usize,
}

impl Display for GraphWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wrote build graph with {} steps to {}",
            self.step_count,
            self.path.display()
        )
    }
}

impl StructuredLog for GraphWritten<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            step_count = self.step_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_written",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// Graph output could not be written. Not fatal to the build.
///
/// # Log Level
/// `warn!` - Degraded but continuing
pub struct GraphWriteFailed<'a> {
    pub path: &'a Path,
    pub error: &'a dyn std::error::Error,
}

impl Display for GraphWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to write build graph to {}: {}",
            self.path.display(),
            self.error
        )
    }
}

impl StructuredLog for GraphWriteFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            path = %self.path.display(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "graph_write_failed",
            span_name = name,
            path = %self.path.display(),
        )
    }
}
