//! Boundary pseudo-nodes of a group's nested store.

use crate::error::GraphError;
use crate::graph::{
    Connection, FLOW, GROUP_INPUT_TYPE, GROUP_OUTPUT_TYPE, Node, NodeId, Position, Store,
};
use tracing::debug;

/// Ids of a nested store's boundary pseudo-nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boundary {
    pub input: Option<NodeId>,
    pub output: Option<NodeId>,
}

/// Builds a GroupInput or GroupOutput pseudo-node.
pub fn boundary_node(id: NodeId, node_type: &str) -> Node {
    if node_type == GROUP_INPUT_TYPE {
        Node::new(id, GROUP_INPUT_TYPE)
            .with_ports(Vec::new(), vec![FLOW.to_string()])
            .at(40.0, 120.0)
    } else {
        Node::new(id, GROUP_OUTPUT_TYPE)
            .with_ports(vec![FLOW.to_string()], Vec::new())
            .at(640.0, 120.0)
    }
}

/// Makes `store` hold exactly one GroupInput iff `group` has a flow input, and
/// exactly one GroupOutput iff it has a flow output. Repeated calls are no-ops.
pub fn ensure_boundary(store: &mut Store, group: &Node) -> Boundary {
    Boundary {
        input: reconcile(store, GROUP_INPUT_TYPE, exposes(group, GROUP_INPUT_TYPE)),
        output: reconcile(store, GROUP_OUTPUT_TYPE, exposes(group, GROUP_OUTPUT_TYPE)),
    }
}

/// `true` if `group` has the flow port a `node_type` pseudo-node stands for.
pub(crate) fn exposes(group: &Node, node_type: &str) -> bool {
    match node_type {
        GROUP_INPUT_TYPE => group.flow_input().is_some(),
        GROUP_OUTPUT_TYPE => group.flow_output().is_some(),
        _ => false,
    }
}

fn reconcile(store: &mut Store, node_type: &str, wanted: bool) -> Option<NodeId> {
    let existing: Vec<NodeId> = store
        .nodes()
        .filter(|n| n.node_type == node_type)
        .map(|n| n.id)
        .collect();

    // The lowest id survives when duplicates slipped in.
    let keep = existing.first().copied().filter(|_| wanted);
    for id in existing.into_iter().filter(|id| Some(*id) != keep) {
        debug!(node_id = id, node_type, "removing stale boundary node");
        store.remove_node_unchecked(id);
    }

    if wanted && keep.is_none() {
        let id = store.next_node_id();
        debug!(node_id = id, node_type, "creating boundary node");
        return store.insert_node(boundary_node(id, node_type)).ok();
    }
    keep
}

/// Finds the boundary pseudo-nodes of a nested store without changing it.
pub fn find_boundary(store: &Store) -> Boundary {
    let find = |node_type: &str| {
        store
            .nodes()
            .find(|n| n.node_type == node_type)
            .map(|n| n.id)
    };
    Boundary {
        input: find(GROUP_INPUT_TYPE),
        output: find(GROUP_OUTPUT_TYPE),
    }
}

/// `true` if either end of `connection` is a boundary pseudo-node.
pub fn is_boundary_connection(store: &Store, connection: &Connection) -> bool {
    [connection.from.node, connection.to.node]
        .iter()
        .any(|id| store.node(*id).is_some_and(Node::is_boundary))
}

/// Splits a store's connections into `(internal, boundary)`, keeping relative order.
pub fn partition_connections(store: &Store) -> (Vec<Connection>, Vec<Connection>) {
    store
        .connections()
        .iter()
        .partition(|c| !is_boundary_connection(store, c))
}

/// Replaces a group's port lists and reconciles everything that depends on them:
/// connections on the group node that no longer fit are dropped and the nested
/// store's boundary nodes follow the new flow ports.
pub fn set_group_ports(
    store: &mut Store,
    id: NodeId,
    inputs: Vec<String>,
    outputs: Vec<String>,
) -> Result<Boundary, GraphError> {
    let node = store.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
    if !node.is_group {
        return Err(GraphError::NotAGroup(id));
    }
    node.inputs = inputs;
    node.outputs = outputs;

    let mut inner = node.sub_graph.take().unwrap_or_default();
    let boundary = ensure_boundary(&mut inner, node);
    inner.prune_connections();
    node.sub_graph = Some(inner);

    store.prune_connections();
    debug!(group = id, ?boundary, "group ports updated");
    Ok(boundary)
}

/// Position for a node placed from a script without coordinates.
pub(crate) fn default_position(index: usize) -> Position {
    Position::new(200.0 + 220.0 * (index % 4) as f64, 120.0 * (index / 4) as f64)
}
