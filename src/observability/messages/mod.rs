// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with typed fields at the right level.
//!
//! # Organization
//!
//! * `chain` - graph construction and validation
//! * `engine` - build lifecycle
//! * `step` - individual step lifecycle
//!
//! # Usage Pattern
//!
//! ```rust
//! use buildchain::observability::messages::engine::BuildStarted;
//! use buildchain::observability::messages::StructuredLog;
//!
//! let msg = BuildStarted {
//!     step_count: 5,
//!     root_count: 1,
//!     max_concurrency: 4,
//! };
//!
//! msg.log();
//! ```

pub mod chain;
pub mod engine;
pub mod step;

use tracing::Span;

/// Emit a message as a structured event or open a span carrying its fields
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
