// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while turning registered steps into a build graph.
///
/// All of these are detected before any step runs; a build that fails
/// here never invokes a step action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A circular dependency was detected between steps
    #[error("Cyclic dependency detected: {}", render_cycle(.cycle))]
    CyclicDependency {
        /// Step names forming the cycle, in traversal order
        cycle: Vec<String>,
    },

    /// A step requires an item that nobody produces and that is not a root input
    #[error("No producer for required item '{item}' (requested by step '{step}')")]
    MissingProducer {
        /// Type name of the missing item
        item: String,
        /// The step that consumes it, or `<final>` for a final item
        step: String,
    },

    /// Two steps declare the same produced item
    #[error("Multiple producers of item '{item}': '{first}' and '{second}'")]
    MultipleProducers {
        item: String,
        first: String,
        second: String,
    },

    /// A step declares that it produces a root input
    #[error("Item '{item}' cannot be produced by step '{step}' (it is a root input)")]
    InitialItemProduced { item: String, step: String },

    /// Two steps were registered under the same name
    #[error("Duplicate step name: '{step}'")]
    DuplicateStepName { step: String },
}

fn render_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_closes_the_loop() {
        let err = GraphError::CyclicDependency {
            cycle: vec!["A".to_string(), "B2".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A -> B2 -> A");
    }

    #[test]
    fn test_missing_producer_display() {
        let err = GraphError::MissingProducer {
            item: "Z".to_string(),
            step: "D".to_string(),
        };
        assert!(err.to_string().contains("'Z'"));
        assert!(err.to_string().contains("'D'"));
    }
}
