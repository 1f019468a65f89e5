//! Graph construction errors.

use thiserror::Error;

/// Errors returned while building a [`Graph`](crate::Graph).
///
/// These surface only from [`GraphBuilder`](crate::GraphBuilder) calls; a
/// built graph never produces them at run time.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The participant has no name, or its name belongs to a different
    /// participant already in the graph.
    #[error("invalid participant: {0}")]
    InvalidParticipant(String),

    /// An edge or entry point names a participant that was never added.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// The edges form at least one cycle.
    #[error("graph contains a cycle through: {}", nodes.join(", "))]
    CyclicGraph {
        /// Participants on or behind a cycle, in declaration order.
        nodes: Vec<String>,
    },

    /// Some participants cannot be reached from any start node.
    #[error("unreachable from every start node: {}", unreachable.join(", "))]
    DisconnectedGraph {
        /// The unreachable participants, in declaration order.
        unreachable: Vec<String>,
    },

    /// No participants were added.
    #[error("graph has no participants")]
    EmptyGraph,
}
