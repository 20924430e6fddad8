use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use ragcore::{EdgeSpec, NodeId, NodeSpec, WorkflowError};
use std::collections::{HashMap, VecDeque};

/// Dependency graph of a workflow.
///
/// Node weights are positions in the declared node list, and graph indices
/// are assigned in the same order, so index order is declaration order.
pub struct WorkflowGraph {
    graph: DiGraph<usize, ()>,
}

impl WorkflowGraph {
    /// Build the graph, rejecting duplicate node ids and edges that name
    /// undeclared nodes.
    pub fn build(nodes: &[NodeSpec], edges: &[EdgeSpec]) -> Result<Self, WorkflowError> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_to_index: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

        for (position, node) in nodes.iter().enumerate() {
            let idx = graph.add_node(position);
            if node_to_index.insert(node.id.as_str(), idx).is_some() {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in edges {
            let from_idx = node_to_index
                .get(edge.source.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(edge.source.clone()))?;
            let to_idx = node_to_index
                .get(edge.target.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(edge.target.clone()))?;

            graph.add_edge(*from_idx, *to_idx, ());
        }

        Ok(Self { graph })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Incoming edge count per node, by declaration position.
    pub fn in_degrees(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .collect()
    }

    /// Successors of a node in edge declaration order.
    fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks adjacency newest-first
        let mut outgoing: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        outgoing.sort_by_key(|(edge, _)| *edge);
        outgoing.into_iter().map(|(_, target)| target).collect()
    }

    /// Kahn topological order as declaration positions.
    ///
    /// Ready nodes are taken first-in first-out, seeded in declaration
    /// order, so equal inputs always produce equal orders. A cycle yields
    /// an error and no partial order.
    pub fn execution_order(&self) -> Result<Vec<usize>, WorkflowError> {
        let mut in_degree = self.in_degrees();
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.node_count());

        while let Some(idx) = queue.pop_front() {
            order.push(self.graph[idx]);

            for next in self.successors(idx) {
                let remaining = &mut in_degree[next.index()];
                *remaining -= 1;
                if *remaining == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() < self.node_count() {
            return Err(WorkflowError::CyclicDependency);
        }

        Ok(order)
    }
}

/// Execution order of a node list as node ids.
pub fn execution_order(nodes: &[NodeSpec], edges: &[EdgeSpec]) -> Result<Vec<NodeId>, WorkflowError> {
    let order = WorkflowGraph::build(nodes, edges)?.execution_order()?;
    Ok(order.into_iter().map(|position| nodes[position].id.clone()).collect())
}
