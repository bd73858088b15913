// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod context;
mod result;
mod scheduler;
mod state;

pub use context::ExecutionContext;
pub use result::{ExecutionResult, NotProduced};
pub use scheduler::Scheduler;
pub use state::StepState;
