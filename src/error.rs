use crate::graph::{NodeId, PortDirection, PortKind};
use thiserror::Error;

/// Reasons a connection attempt is rejected. A rejected attempt never mutates the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Node {0} cannot be connected to itself")]
    SelfLoop(NodeId),

    #[error("Both ports are {0}s; a connection needs exactly one output and one input")]
    SameDirection(PortDirection),

    #[error("A {output} output cannot be connected to a {input} input")]
    KindMismatch { output: PortKind, input: PortKind },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {node} has no {direction} port at index {index}")]
    PortNotFound {
        node: NodeId,
        direction: PortDirection,
        index: usize,
    },
}

/// Errors raised by node-level store mutations and group navigation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("A node with id {0} already exists in this graph")]
    DuplicateNodeId(NodeId),

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {node_id} is a '{node_type}' boundary node and cannot be deleted")]
    ProtectedNode { node_id: NodeId, node_type: String },

    #[error("Node {0} is not a group")]
    NotAGroup(NodeId),

    #[error("Node {node_id} is a '{node_type}' boundary node, which only a group exposing that flow port can hold")]
    MisplacedBoundaryNode { node_id: NodeId, node_type: String },
}

/// Errors that can occur while generating source text from a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Node '{node_id}' has an unregistered node type: '{type_name}'")]
    UnknownNodeType { node_id: NodeId, type_name: String },

    #[error("Failed to write debug output: {0}")]
    DebugOutput(String),
}

/// Errors produced while parsing or running a graph script.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Line {line}: unknown node type '{type_name}'")]
    UnknownNodeType { line: usize, type_name: String },

    #[error("Line {line}: {source}")]
    Connect {
        line: usize,
        #[source]
        source: ConnectError,
    },

    #[error("Line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: GraphError,
    },
}

/// Errors raised when serializing or restoring projects and snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Failed to parse project JSON: {0}")]
    Json(String),

    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Snapshot decoding failed: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Unsupported project version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Errors surfaced by the round-trip loader. The document is unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Snapshot(#[from] ProjectError),
}
