// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::item::ItemId;
use crate::step::{BuildStep, StepDescriptor};

/// A step placed in the graph, with its edges as indices into the node list
pub(crate) struct StepNode {
    pub descriptor: Arc<StepDescriptor>,
    pub action: Arc<dyn BuildStep>,
    /// Steps producing something this step consumes
    pub dependencies: Vec<usize>,
    /// Steps consuming something this step produces
    pub dependents: Vec<usize>,
}

/// Validated, immutable DAG of build steps.
///
/// Nodes keep registration order, so every query that lists steps is
/// deterministic. Edges run from producer to consumer.
pub struct BuildGraph {
    nodes: Vec<StepNode>,
    initial: Vec<ItemId>,
    finals: Vec<ItemId>,
    registered: usize,
}

impl BuildGraph {
    pub(crate) fn new(
        nodes: Vec<StepNode>,
        initial: Vec<ItemId>,
        finals: Vec<ItemId>,
        registered: usize,
    ) -> Self {
        Self {
            nodes,
            initial,
            finals,
            registered,
        }
    }

    pub(crate) fn nodes(&self) -> &[StepNode] {
        &self.nodes
    }

    /// Number of steps included in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of steps registered on the builder, included or not
    pub fn registered_len(&self) -> usize {
        self.registered
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.descriptor.name.as_str())
    }

    pub fn contains_step(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn step(&self, name: &str) -> Option<&StepDescriptor> {
        self.index_of(name).map(|i| self.nodes[i].descriptor.as_ref())
    }

    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&str>> {
        self.index_of(name)
            .map(|i| self.names(&self.nodes[i].dependencies))
    }

    pub fn dependents_of(&self, name: &str) -> Option<Vec<&str>> {
        self.index_of(name).map(|i| self.names(&self.nodes[i].dependents))
    }

    /// Steps that can run as soon as the build starts
    pub fn start_steps(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.dependencies.is_empty())
            .map(|n| n.descriptor.name.as_str())
            .collect()
    }

    /// Steps nothing else waits on
    pub fn end_steps(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.dependents.is_empty())
            .map(|n| n.descriptor.name.as_str())
            .collect()
    }

    pub fn initial_items(&self) -> &[ItemId] {
        &self.initial
    }

    pub fn final_items(&self) -> &[ItemId] {
        &self.finals
    }

    /// Every item some included step produces
    pub fn produced_items(&self) -> Vec<ItemId> {
        self.nodes
            .iter()
            .flat_map(|n| n.descriptor.produces.iter().copied())
            .collect()
    }

    /// A sequential order consistent with every dependency, using Kahn's
    /// algorithm with ties broken by registration order.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.dependencies.len()).collect();
        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(index) = queue.pop_front() {
            order.push(self.nodes[index].descriptor.name.as_str());
            for &dependent in &self.nodes[index].dependents {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        order
    }

    /// Items carried along the edge from `producer` to `consumer`
    pub(crate) fn edge_items(&self, producer: usize, consumer: usize) -> Vec<ItemId> {
        let consumer = &self.nodes[consumer].descriptor;
        self.nodes[producer]
            .descriptor
            .produces
            .iter()
            .filter(|id| consumer.consumes_item(id))
            .copied()
            .collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.descriptor.name == name)
    }

    fn names(&self, indices: &[usize]) -> Vec<&str> {
        indices
            .iter()
            .map(|&i| self.nodes[i].descriptor.name.as_str())
            .collect()
    }
}

impl fmt::Debug for BuildGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge_count: usize = self.nodes.iter().map(|n| n.dependents.len()).sum();
        f.debug_struct("BuildGraph")
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .field("edge_count", &edge_count)
            .field("initial", &self.initial)
            .field("finals", &self.finals)
            .finish()
    }
}
