use super::connection::{Connection, Endpoint};
use super::node::{FieldValue, Node, NodeId, Position};
use super::port::{PortDirection, PortRef};
use super::validate::{PortInfo, can_connect};
use crate::error::{ConnectError, GraphError};
use std::collections::BTreeMap;
use tracing::debug;

/// Owns a graph's nodes and connections.
///
/// The root graph and every group's nested graph are instances of this type.
/// Every operation is all-or-nothing: a rejected call leaves the store untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    nodes: BTreeMap<NodeId, Node>,
    connections: Vec<Connection>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// One past the highest id in use.
    pub fn next_node_id(&self) -> NodeId {
        self.nodes.keys().next_back().map_or(1, |id| id + 1)
    }

    /// Adds a node. Boundary pseudo-nodes are rejected; only their group creates them.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if node.is_boundary() {
            return Err(GraphError::MisplacedBoundaryNode {
                node_id: node.id,
                node_type: node.node_type,
            });
        }
        self.insert_node(node)
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        let id = node.id;
        debug!(node_id = id, node_type = %node.node_type, "adding node");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Removes a node and every connection that references it.
    ///
    /// Group boundary pseudo-nodes are protected; they follow their group's ports.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        if node.is_boundary() {
            return Err(GraphError::ProtectedNode {
                node_id: id,
                node_type: node.node_type.clone(),
            });
        }
        self.remove_node_unchecked(id)
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn remove_node_unchecked(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        debug!(
            node_id = id,
            removed_connections = before - self.connections.len(),
            "removed node"
        );
        Some(node)
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.position = position;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.fields.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Looks up the label of a port.
    pub fn port_label(&self, port: PortRef) -> Option<&str> {
        self.nodes
            .get(&port.node)
            .and_then(|n| n.port_label(port.direction, port.index))
    }

    fn resolve(&self, port: PortRef) -> Result<PortInfo<'_>, ConnectError> {
        let node = self
            .nodes
            .get(&port.node)
            .ok_or(ConnectError::NodeNotFound(port.node))?;
        let label = node
            .port_label(port.direction, port.index)
            .ok_or(ConnectError::PortNotFound {
                node: port.node,
                direction: port.direction,
                index: port.index,
            })?;
        Ok(PortInfo::new(port.node, port.direction, label))
    }

    /// Connects two ports.
    ///
    /// The ports may be given in either order; the connection is stored from the
    /// output to the input. An existing connection into the same input is replaced.
    pub fn add_connection(&mut self, a: PortRef, b: PortRef) -> Result<Connection, ConnectError> {
        let info_a = self.resolve(a)?;
        let info_b = self.resolve(b)?;
        if let Err(reason) = can_connect(&info_a, &info_b) {
            debug!(?a, ?b, %reason, "connection rejected");
            return Err(reason);
        }

        let (output, input) = if a.direction == PortDirection::Output {
            (a, b)
        } else {
            (b, a)
        };
        let connection = Connection::new(
            Endpoint::new(output.node, output.index),
            Endpoint::new(input.node, input.index),
        );

        self.connections.retain(|c| c.to != connection.to);
        self.connections.push(connection);
        debug!(
            from = connection.from.node,
            to = connection.to.node,
            "connected"
        );
        Ok(connection)
    }

    /// Removes and returns every connection matching `predicate`, in store order.
    pub fn remove_connection<F>(&mut self, mut predicate: F) -> Vec<Connection>
    where
        F: FnMut(&Connection) -> bool,
    {
        let mut removed = Vec::new();
        self.connections.retain(|c| {
            if predicate(c) {
                removed.push(*c);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drops connections whose endpoints no longer resolve or whose kinds no
    /// longer agree, e.g. after a node's ports changed. Returns the number dropped.
    pub fn prune_connections(&mut self) -> usize {
        let stale: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| {
                let from = self.resolve(PortRef::output(c.from.node, c.from.port));
                let to = self.resolve(PortRef::input(c.to.node, c.to.port));
                match (from, to) {
                    (Ok(from), Ok(to)) => can_connect(&from, &to).is_err(),
                    _ => true,
                }
            })
            .copied()
            .collect();
        if !stale.is_empty() {
            debug!(count = stale.len(), "pruning stale connections");
            self.connections.retain(|c| !stale.contains(c));
        }
        stale.len()
    }

    /// The connection feeding an input port, if any.
    pub fn incoming(&self, node: NodeId, port: usize) -> Option<&Connection> {
        let target = Endpoint::new(node, port);
        self.connections.iter().find(|c| c.to == target)
    }

    /// Connections leaving an output port, in connection order.
    pub fn outgoing(&self, node: NodeId, port: usize) -> impl Iterator<Item = &Connection> {
        let source = Endpoint::new(node, port);
        self.connections.iter().filter(move |c| c.from == source)
    }

    /// `true` if the node's plain `flow` input has an incoming connection.
    pub fn has_incoming_flow(&self, node: &Node) -> bool {
        node.flow_input()
            .is_some_and(|port| self.incoming(node.id, port).is_some())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }
}
