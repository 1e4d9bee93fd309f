// src/pipeline/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::errors::{PromptdagError, Result};
use crate::pipeline::model::{Task, TaskId};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct dependencies: tasks whose results this one consumes.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that list this one in `after`.
    dependents: Vec<TaskId>,
}

/// In-memory DAG of tasks.
///
/// Node indices in `graph` equal the tasks' declaration indices, which is
/// what makes the topological order deterministic.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskId, DagNode>,
    graph: DiGraph<TaskId, ()>,
}

impl DagGraph {
    /// Build the graph, rejecting unknown or self-referencing prerequisites.
    ///
    /// Edge direction: dep -> task.
    pub fn from_tasks(tasks: &[Task]) -> Result<Self> {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::with_capacity(tasks.len(), 0);
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        let mut nodes: HashMap<TaskId, DagNode> = HashMap::new();

        for task in tasks.iter() {
            let idx = graph.add_node(task.id.clone());
            index.insert(task.id.as_str(), idx);
            nodes.insert(
                task.id.clone(),
                DagNode {
                    deps: task.after.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        for task in tasks.iter() {
            for (pos, dep) in task.after.iter().enumerate() {
                if task.after[..pos].contains(dep) {
                    return Err(PromptdagError::ConfigError(format!(
                        "task '{}' lists dependency '{}' more than once",
                        task.id, dep
                    )));
                }
                if dep == &task.id {
                    return Err(PromptdagError::ConfigError(format!(
                        "task '{}' cannot depend on itself",
                        task.id
                    )));
                }
                let Some(&from) = index.get(dep.as_str()) else {
                    return Err(PromptdagError::ConfigError(format!(
                        "task '{}' has unknown dependency '{}'",
                        task.id, dep
                    )));
                };
                graph.add_edge(from, index[task.id.as_str()], ());
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(task.id.clone());
                }
            }
        }

        Ok(Self { nodes, graph })
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task (its `after` list).
    pub fn dependencies_of(&self, name: &str) -> &[TaskId] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskId] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Kahn's algorithm; among ready tasks the earliest declared runs first.
    ///
    /// Returns declaration indices. Fails with [`PromptdagError::DagCycle`]
    /// naming the tasks on the cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(next) = ready.pop_first() {
            order.push(next.index());
            for dependent in self.graph.neighbors_directed(next, Direction::Outgoing) {
                let deg = &mut in_degree[dependent.index()];
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(PromptdagError::DagCycle(format!(
                "cycle detected in task DAG involving tasks {}",
                self.cycle_members().join(", ")
            )));
        }

        Ok(order)
    }

    fn cycle_members(&self) -> Vec<String> {
        let mut members: Vec<String> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .flatten()
            .map(|n| format!("'{}'", self.graph[n]))
            .collect();
        members.sort();
        members
    }
}
