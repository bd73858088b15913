// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Build graph validation and construction.
//!
//! Registered steps are checked in a fixed order and the first problem wins:
//!
//! 1. **Uniqueness**: step names are unique
//! 2. **Producers**: no step produces a root input, no item has two producers
//! 3. **Inclusion**: with final items declared, only steps that feed them are kept
//! 4. **References**: every required item of a kept step has a producer or is a root
//! 5. **Cycles**: DFS with a recursion stack over kept steps
//!
//! Cycle detection needs resolved edges, so it runs last. Everything here
//! is pure; no step action is touched.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::chain::builder::RegisteredStep;
use crate::chain::graph::{BuildGraph, StepNode};
use crate::config::consts::FINAL_REQUESTER;
use crate::errors::GraphError;
use crate::item::ItemId;
use crate::observability::messages::chain::StepExcluded;
use crate::observability::messages::StructuredLog;

pub(crate) fn build_graph(
    steps: &[RegisteredStep],
    initial: &[ItemId],
    finals: &[ItemId],
) -> Result<BuildGraph, GraphError> {
    validate_unique_step_names(steps)?;
    let producers = collect_producers(steps, initial)?;
    let included = select_included_steps(steps, initial, finals, &producers)?;
    validate_references(steps, initial, &included, &producers)?;

    // Compact indices: position in `included` becomes the node index
    let position: HashMap<usize, usize> = included
        .iter()
        .enumerate()
        .map(|(node, &step)| (step, node))
        .collect();

    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); included.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); included.len()];
    for (node, &step) in included.iter().enumerate() {
        for consume in &steps[step].descriptor.consumes {
            let Some(&producer) = producers.get(&consume.item) else {
                continue;
            };
            let producer_node = position[&producer];
            if !dependencies[node].contains(&producer_node) {
                dependencies[node].push(producer_node);
                dependents[producer_node].push(node);
            }
        }
    }
    for list in dependents.iter_mut() {
        list.sort_unstable();
    }

    validate_acyclic(steps, &included, &dependents)?;

    let nodes = included
        .iter()
        .zip(dependencies.into_iter().zip(dependents))
        .map(|(&step, (dependencies, dependents))| StepNode {
            descriptor: Arc::new(steps[step].descriptor.clone()),
            action: Arc::clone(&steps[step].action),
            dependencies,
            dependents,
        })
        .collect();

    Ok(BuildGraph::new(
        nodes,
        initial.to_vec(),
        finals.to_vec(),
        steps.len(),
    ))
}

fn validate_unique_step_names(steps: &[RegisteredStep]) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step.descriptor.name.as_str()) {
            return Err(GraphError::DuplicateStepName {
                step: step.descriptor.name.clone(),
            });
        }
    }
    Ok(())
}

/// Map every produced item to the index of its single producer
fn collect_producers(
    steps: &[RegisteredStep],
    initial: &[ItemId],
) -> Result<HashMap<ItemId, usize>, GraphError> {
    let mut producers: HashMap<ItemId, usize> = HashMap::new();
    for (index, step) in steps.iter().enumerate() {
        for item in &step.descriptor.produces {
            if initial.contains(item) {
                return Err(GraphError::InitialItemProduced {
                    item: item.name().to_string(),
                    step: step.descriptor.name.clone(),
                });
            }
            if let Some(&first) = producers.get(item) {
                return Err(GraphError::MultipleProducers {
                    item: item.name().to_string(),
                    first: steps[first].descriptor.name.clone(),
                    second: step.descriptor.name.clone(),
                });
            }
            producers.insert(*item, index);
        }
    }
    Ok(producers)
}

/// Steps that contribute to the final items, in registration order.
///
/// Without final items every step is included. Otherwise inclusion starts
/// from the producers of the final items and follows consumed items back to
/// their producers, optional ones included when a producer exists.
fn select_included_steps(
    steps: &[RegisteredStep],
    initial: &[ItemId],
    finals: &[ItemId],
    producers: &HashMap<ItemId, usize>,
) -> Result<Vec<usize>, GraphError> {
    if finals.is_empty() {
        return Ok((0..steps.len()).collect());
    }

    let mut included = HashSet::new();
    let mut queue = VecDeque::new();
    for item in finals {
        match producers.get(item) {
            Some(&producer) => {
                if included.insert(producer) {
                    queue.push_back(producer);
                }
            }
            None if initial.contains(item) => {}
            None => {
                return Err(GraphError::MissingProducer {
                    item: item.name().to_string(),
                    step: FINAL_REQUESTER.to_string(),
                })
            }
        }
    }

    while let Some(step) = queue.pop_front() {
        for consume in &steps[step].descriptor.consumes {
            if let Some(&producer) = producers.get(&consume.item) {
                if included.insert(producer) {
                    queue.push_back(producer);
                }
            }
        }
    }

    let mut ordered: Vec<usize> = included.into_iter().collect();
    ordered.sort_unstable();
    for (index, step) in steps.iter().enumerate() {
        if ordered.binary_search(&index).is_err() {
            StepExcluded {
                step: &step.descriptor.name,
            }
            .log();
        }
    }
    Ok(ordered)
}

fn validate_references(
    steps: &[RegisteredStep],
    initial: &[ItemId],
    included: &[usize],
    producers: &HashMap<ItemId, usize>,
) -> Result<(), GraphError> {
    for &index in included {
        let descriptor = &steps[index].descriptor;
        for consume in descriptor.consumes.iter().filter(|c| !c.optional) {
            if !producers.contains_key(&consume.item) && !initial.contains(&consume.item) {
                return Err(GraphError::MissingProducer {
                    item: consume.item.name().to_string(),
                    step: descriptor.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_acyclic(
    steps: &[RegisteredStep],
    included: &[usize],
    dependents: &[Vec<usize>],
) -> Result<(), GraphError> {
    let mut visited = vec![false; included.len()];
    let mut on_stack = vec![false; included.len()];
    let mut path = Vec::new();

    for node in 0..included.len() {
        if visited[node] {
            continue;
        }
        if let Some(cycle) =
            dfs_cycle_detection(node, dependents, &mut visited, &mut on_stack, &mut path)
        {
            return Err(GraphError::CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|n| steps[included[n]].descriptor.name.clone())
                    .collect(),
            });
        }
    }
    Ok(())
}

/// Depth-first search tracking the current path.
///
/// Nodes on `on_stack` are part of the path being explored; reaching one
/// again closes a cycle, which is the path segment starting at that node.
fn dfs_cycle_detection(
    node: usize,
    dependents: &[Vec<usize>],
    visited: &mut [bool],
    on_stack: &mut [bool],
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited[node] = true;
    on_stack[node] = true;
    path.push(node);

    for &next in &dependents[node] {
        if on_stack[next] {
            // Invariant: every node on the stack is also on the path
            let start = path.iter().position(|&n| n == next).unwrap_or(0);
            return Some(path[start..].to_vec());
        }
        if !visited[next] {
            if let Some(cycle) = dfs_cycle_detection(next, dependents, visited, on_stack, path) {
                return Some(cycle);
            }
        }
    }

    on_stack[node] = false;
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BuildChainBuilder;

    struct A;
    struct B;
    struct C;
    struct X;
    struct Y;
    struct Z;
    struct W;

    fn noop<'a>(builder: &'a mut BuildChainBuilder, name: &str) -> crate::chain::StepBuilder<'a> {
        builder.add_step_fn(name, |_ctx| Ok(()))
    }

    #[test]
    fn test_valid_empty_chain() {
        let builder = BuildChainBuilder::new();
        let graph = builder.build_graph().unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_linear_chain_edges() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "p").produces::<X>().register();
        noop(&mut builder, "c").consumes::<X>().produces::<Y>().register();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.dependencies_of("c"), Some(vec!["p"]));
        assert_eq!(graph.dependents_of("p"), Some(vec!["c"]));
        assert_eq!(graph.start_steps(), vec!["p"]);
        assert_eq!(graph.end_steps(), vec!["c"]);
    }

    #[test]
    fn test_diamond_dependency() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "a").produces::<A>().register();
        noop(&mut builder, "b").consumes::<A>().produces::<B>().register();
        noop(&mut builder, "c").consumes::<A>().produces::<C>().register();
        noop(&mut builder, "d")
            .consumes::<B>()
            .consumes::<C>()
            .produces::<X>()
            .register();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.dependents_of("a"), Some(vec!["b", "c"]));
        assert_eq!(graph.dependencies_of("d"), Some(vec!["b", "c"]));
        assert_eq!(graph.topological_order(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_two_step_cycle_names_steps_in_order() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "A").consumes::<B>().produces::<C>().register();
        noop(&mut builder, "B2").consumes::<C>().produces::<B>().register();

        let err = builder.build_graph().unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec!["A".to_string(), "B2".to_string()]
            }
        );
    }

    #[test]
    fn test_self_consumption_is_a_cycle() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "loop").consumes::<X>().produces::<X>().register();

        let err = builder.build_graph().unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec!["loop".to_string()]
            }
        );
    }

    #[test]
    fn test_cycle_deeper_in_graph() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "root").produces::<A>().register();
        noop(&mut builder, "b").consumes::<A>().consumes::<Z>().produces::<B>().register();
        noop(&mut builder, "c").consumes::<B>().produces::<C>().register();
        noop(&mut builder, "d").consumes::<C>().produces::<Z>().register();

        match builder.build_graph().unwrap_err() {
            GraphError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["b", "c", "d"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_producer_names_item_and_step() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "D").consumes::<Z>().produces::<W>().register();

        match builder.build_graph().unwrap_err() {
            GraphError::MissingProducer { item, step } => {
                assert!(item.ends_with("::Z"));
                assert_eq!(step, "D");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_root_input_satisfies_consumer() {
        let mut builder = BuildChainBuilder::new();
        builder.add_initial::<Z>();
        noop(&mut builder, "D").consumes::<Z>().produces::<W>().register();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.start_steps(), vec!["D"]);
    }

    #[test]
    fn test_optional_consume_without_producer() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "D")
            .consumes_optional::<Z>()
            .produces::<W>()
            .register();

        assert!(builder.build_graph().is_ok());
    }

    #[test]
    fn test_optional_consume_still_orders_after_producer() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "consumer")
            .consumes_optional::<Z>()
            .produces::<W>()
            .register();
        noop(&mut builder, "producer").produces::<Z>().register();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.dependencies_of("consumer"), Some(vec!["producer"]));
        assert_eq!(graph.topological_order(), vec!["producer", "consumer"]);
    }

    #[test]
    fn test_multiple_producers_rejected() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "one").produces::<X>().register();
        noop(&mut builder, "two").produces::<X>().register();

        match builder.build_graph().unwrap_err() {
            GraphError::MultipleProducers { first, second, .. } => {
                assert_eq!(first, "one");
                assert_eq!(second, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_producing_root_input_rejected() {
        let mut builder = BuildChainBuilder::new();
        builder.add_initial::<X>();
        noop(&mut builder, "p").produces::<X>().register();

        assert!(matches!(
            builder.build_graph(),
            Err(GraphError::InitialItemProduced { .. })
        ));
    }

    #[test]
    fn test_duplicate_step_names() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "same").produces::<X>().register();
        noop(&mut builder, "same").produces::<Y>().register();

        assert_eq!(
            builder.build_graph().unwrap_err(),
            GraphError::DuplicateStepName {
                step: "same".to_string()
            }
        );
    }

    #[test]
    fn test_missing_producer_reported_before_cycle() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "A").consumes::<B>().produces::<C>().register();
        noop(&mut builder, "B2").consumes::<C>().produces::<B>().register();
        noop(&mut builder, "D").consumes::<Z>().produces::<W>().register();

        assert!(matches!(
            builder.build_graph(),
            Err(GraphError::MissingProducer { .. })
        ));
    }

    #[test]
    fn test_final_items_prune_unrelated_steps() {
        let mut builder = BuildChainBuilder::new();
        noop(&mut builder, "p").produces::<X>().register();
        noop(&mut builder, "c").consumes::<X>().produces::<Y>().register();
        noop(&mut builder, "unrelated").produces::<W>().register();
        // Would be a missing producer if it were included
        noop(&mut builder, "broken").consumes::<Z>().produces::<A>().register();
        builder.add_final::<Y>();

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.step_names().collect::<Vec<_>>(), vec!["p", "c"]);
        assert_eq!(graph.registered_len(), 4);
    }

    #[test]
    fn test_final_item_without_producer() {
        let mut builder = BuildChainBuilder::new();
        builder.add_final::<Y>();

        match builder.build_graph().unwrap_err() {
            GraphError::MissingProducer { step, .. } => assert_eq!(step, FINAL_REQUESTER),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_final_item_that_is_a_root() {
        let mut builder = BuildChainBuilder::new();
        builder.add_initial::<Y>().add_final::<Y>();
        noop(&mut builder, "unrelated").produces::<W>().register();

        let graph = builder.build_graph().unwrap();
        assert!(graph.is_empty());
    }
}
