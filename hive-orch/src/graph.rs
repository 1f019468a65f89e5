//! Participant graphs: building and validation.

use crate::error::GraphError;
use crate::filter::EdgeFilter;
use hive_core::Agent;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// A directed edge between two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Producing participant.
    pub from: String,
    /// Consuming participant.
    pub to: String,
    /// What the consumer receives from the producer.
    pub filter: EdgeFilter,
}

#[derive(Clone, Copy)]
struct Link {
    from: usize,
    to: usize,
    filter: EdgeFilter,
}

/// Accumulates participants and edges, then validates them into a [`Graph`].
///
/// ```
/// use hive_core::test_utils::EchoAgent;
/// use hive_orch::GraphBuilder;
/// use std::sync::Arc;
///
/// let mut builder = GraphBuilder::new();
/// builder
///     .add_node(Arc::new(EchoAgent::new("writer")))?
///     .add_node(Arc::new(EchoAgent::new("editor")))?
///     .add_edge("writer", "editor")?;
/// let graph = builder.build()?;
/// assert_eq!(graph.start_nodes(), vec!["writer"]);
/// # Ok::<(), hive_orch::GraphError>(())
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Arc<dyn Agent>>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    entry_points: Vec<usize>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant under its own name.
    ///
    /// Adding the same participant again is a no-op. A different
    /// participant reusing a registered name is rejected.
    pub fn add_node(&mut self, participant: Arc<dyn Agent>) -> Result<&mut Self, GraphError> {
        let name = participant.name();
        if name.trim().is_empty() {
            return Err(GraphError::InvalidParticipant(
                "participant name is empty".into(),
            ));
        }
        if let Some(&existing) = self.index.get(name) {
            if Arc::ptr_eq(&self.nodes[existing], &participant) {
                return Ok(self);
            }
            return Err(GraphError::InvalidParticipant(format!(
                "{name} is already registered to a different participant"
            )));
        }
        self.index.insert(name.to_owned(), self.nodes.len());
        self.nodes.push(participant);
        Ok(self)
    }

    /// Add an edge delivering the producer's final message.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<&mut Self, GraphError> {
        self.add_edge_filtered(from, to, EdgeFilter::default())
    }

    /// Add an edge with an explicit delivery filter.
    ///
    /// Re-adding an existing edge is ignored; the first filter wins.
    pub fn add_edge_filtered(
        &mut self,
        from: &str,
        to: &str,
        filter: EdgeFilter,
    ) -> Result<&mut Self, GraphError> {
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        if !self.links.iter().any(|l| l.from == from && l.to == to) {
            self.links.push(Link { from, to, filter });
        }
        Ok(self)
    }

    /// Designate a start node.
    ///
    /// Without designations, the start nodes are those with no incoming
    /// edges.
    pub fn set_entry_point(&mut self, name: &str) -> Result<&mut Self, GraphError> {
        let node = self.lookup(name)?;
        if !self.entry_points.contains(&node) {
            self.entry_points.push(node);
        }
        Ok(self)
    }

    fn lookup(&self, name: &str) -> Result<usize, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.to_owned()))
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<Graph, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        let n = self.nodes.len();
        let mut incoming = vec![Vec::new(); n];
        let mut outgoing = vec![Vec::new(); n];
        for (i, link) in self.links.iter().enumerate() {
            incoming[link.to].push(i);
            outgoing[link.from].push(link.to);
        }

        // Kahn's algorithm; whatever keeps a nonzero in-degree sits on or
        // behind a cycle.
        let mut in_degree: Vec<usize> = incoming.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &next in &outgoing[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        if order.len() < n {
            let nodes = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].name().to_owned())
                .collect();
            return Err(GraphError::CyclicGraph { nodes });
        }

        let start: Vec<usize> = if self.entry_points.is_empty() {
            (0..n).filter(|&i| incoming[i].is_empty()).collect()
        } else {
            self.entry_points.clone()
        };
        let mut reached = vec![false; n];
        let mut queue: VecDeque<usize> = start.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            if std::mem::replace(&mut reached[node], true) {
                continue;
            }
            queue.extend(outgoing[node].iter().copied());
        }
        let unreachable: Vec<String> = (0..n)
            .filter(|&i| !reached[i])
            .map(|i| self.nodes[i].name().to_owned())
            .collect();
        if !unreachable.is_empty() {
            return Err(GraphError::DisconnectedGraph { unreachable });
        }

        Ok(Graph {
            nodes: self.nodes,
            index: self.index,
            links: self.links,
            incoming,
            outgoing,
            start,
            order,
        })
    }
}

/// A validated, immutable participant graph.
///
/// Acyclic, with every participant reachable from a start node. Edges keep
/// their declaration order, which is the order a fan-in participant
/// receives its predecessors' outputs in.
#[derive(Clone)]
pub struct Graph {
    nodes: Vec<Arc<dyn Agent>>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    start: Vec<usize>,
    order: Vec<usize>,
}

impl Graph {
    /// The participant set, in registration order.
    pub fn participants(&self) -> &[Arc<dyn Agent>] {
        &self.nodes
    }

    /// Look up a participant by name.
    pub fn participant(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Whether `name` is a participant.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> Vec<Edge> {
        self.links.iter().map(|l| self.edge(l)).collect()
    }

    /// Names of the start nodes.
    pub fn start_nodes(&self) -> Vec<&str> {
        self.names(&self.start)
    }

    /// Names of the participants feeding `name`, in edge-declaration order.
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        match self.index.get(name) {
            Some(&i) => self.incoming[i]
                .iter()
                .map(|&l| self.nodes[self.links[l].from].name())
                .collect(),
            None => vec![],
        }
    }

    /// Names of the participants fed by `name`, in edge-declaration order.
    pub fn successors(&self, name: &str) -> Vec<&str> {
        match self.index.get(name) {
            Some(&i) => self.names(&self.outgoing[i]),
            None => vec![],
        }
    }

    /// A topological order; ties are broken by registration order.
    pub fn topological_order(&self) -> Vec<&str> {
        self.names(&self.order)
    }

    fn names(&self, nodes: &[usize]) -> Vec<&str> {
        nodes.iter().map(|&i| self.nodes[i].name()).collect()
    }

    fn edge(&self, link: &Link) -> Edge {
        Edge {
            from: self.nodes[link.from].name().to_owned(),
            to: self.nodes[link.to].name().to_owned(),
            filter: link.filter,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, i: usize) -> &Arc<dyn Agent> {
        &self.nodes[i]
    }

    /// Incoming edges of node `i` as `(producer, filter)`, in declaration order.
    pub(crate) fn inputs(&self, i: usize) -> impl Iterator<Item = (usize, EdgeFilter)> + '_ {
        self.incoming[i]
            .iter()
            .map(|&l| (self.links[l].from, self.links[l].filter))
    }

    pub(crate) fn in_degree(&self, i: usize) -> usize {
        self.incoming[i].len()
    }

    pub(crate) fn outputs(&self, i: usize) -> &[usize] {
        &self.outgoing[i]
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("participants", &self.names(&(0..self.nodes.len()).collect::<Vec<_>>()))
            .field("edges", &self.edges())
            .field("start_nodes", &self.start_nodes())
            .finish()
    }
}
