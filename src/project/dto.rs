//! The serialized project format.
//!
//! Connections that touch a group's boundary pseudo-nodes are written to
//! `groupBoundaryConnections`, apart from the store's internal connections, so a
//! reloaded group reconstructs the same boundary wiring.

use super::{Document, ModuleMetadata, Viewport};
use crate::error::{GraphError, ProjectError};
use crate::graph::{Connection, Fields, Node, NodeId, PortRef, Position, Size, Store};
use crate::group::partition_connections;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use tracing::debug;

pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDto {
    pub node_id: NodeId,
    pub port_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub from: EndpointDto,
    pub to: EndpointDto,
}

impl From<&Connection> for ConnectionDto {
    fn from(c: &Connection) -> Self {
        Self {
            from: EndpointDto {
                node_id: c.from.node,
                port_index: c.from.port,
            },
            to: EndpointDto {
                node_id: c.to.node,
                port_index: c.to.port,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub size: Size,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub sub_graph: Option<StoreDto>,
}

impl From<&Node> for NodeDto {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            node_type: node.node_type.clone(),
            position: node.position,
            size: node.size,
            inputs: node.inputs.clone(),
            outputs: node.outputs.clone(),
            fields: node.fields.clone(),
            is_group: node.is_group,
            sub_graph: node.sub_graph.as_ref().map(StoreDto::from_store),
        }
    }
}

impl NodeDto {
    pub fn into_node(self) -> Node {
        Node {
            id: self.id,
            node_type: self.node_type,
            position: self.position,
            size: self.size,
            inputs: self.inputs,
            outputs: self.outputs,
            fields: self.fields,
            is_group: self.is_group,
            sub_graph: self.sub_graph.map(StoreDto::into_nested_store),
        }
    }
}

/// A store: its nodes, internal connections and boundary connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDto {
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub connections: Vec<ConnectionDto>,
    #[serde(default)]
    pub group_boundary_connections: Vec<ConnectionDto>,
}

impl StoreDto {
    pub fn from_store(store: &Store) -> Self {
        let (internal, boundary) = partition_connections(store);
        Self {
            nodes: store.nodes().map(NodeDto::from).collect(),
            connections: internal.iter().map(ConnectionDto::from).collect(),
            group_boundary_connections: boundary.iter().map(ConnectionDto::from).collect(),
        }
    }

    /// Rebuilds a live root store. Duplicate nodes, boundary pseudo-nodes and
    /// connections that no longer resolve are dropped rather than failing the
    /// whole load.
    pub fn into_store(self) -> Store {
        self.rebuild(Store::add_node)
    }

    /// Rebuilds a group's nested store, boundary pseudo-nodes included.
    fn into_nested_store(self) -> Store {
        self.rebuild(Store::insert_node)
    }

    fn rebuild(self, add: fn(&mut Store, Node) -> Result<NodeId, GraphError>) -> Store {
        let mut store = Store::new();
        for dto in self.nodes {
            if let Err(e) = add(&mut store, dto.into_node()) {
                debug!(error = %e, "dropping node while restoring");
            }
        }
        for c in self
            .connections
            .into_iter()
            .chain(self.group_boundary_connections)
        {
            let from = PortRef::output(c.from.node_id, c.from.port_index);
            let to = PortRef::input(c.to.node_id, c.to.port_index);
            if let Err(e) = store.add_connection(from, to) {
                debug!(?c, error = %e, "dropping dangling connection");
            }
        }
        store
    }
}

/// A saved project as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: u32,
    pub module_name: String,
    #[serde(default)]
    pub module_namespace: String,
    #[serde(default)]
    pub module_description: String,
    #[serde(default)]
    pub module_flags: BTreeMap<String, bool>,
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub connections: Vec<ConnectionDto>,
    #[serde(default)]
    pub group_boundary_connections: Vec<ConnectionDto>,
    #[serde(default)]
    pub pan_offset: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl ProjectFile {
    /// Captures a document from its root, whichever group is open.
    pub fn from_document(doc: &Document) -> Self {
        let root = StoreDto::from_store(&doc.root());
        Self {
            version: PROJECT_VERSION,
            module_name: doc.metadata.name.clone(),
            module_namespace: doc.metadata.namespace.clone(),
            module_description: doc.metadata.description.clone(),
            module_flags: doc.metadata.flags.clone(),
            nodes: root.nodes,
            connections: root.connections,
            group_boundary_connections: root.group_boundary_connections,
            pan_offset: doc.viewport.pan_offset,
            zoom: doc.viewport.zoom,
        }
    }

    pub fn into_document(self) -> Result<Document, ProjectError> {
        if self.version != PROJECT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: self.version,
                expected: PROJECT_VERSION,
            });
        }
        let metadata = ModuleMetadata {
            name: self.module_name,
            namespace: self.module_namespace,
            description: self.module_description,
            flags: self.module_flags,
        };
        let viewport = Viewport {
            pan_offset: self.pan_offset,
            zoom: self.zoom,
        };
        let root = StoreDto {
            nodes: self.nodes,
            connections: self.connections,
            group_boundary_connections: self.group_boundary_connections,
        }
        .into_store();
        Ok(Document::from_parts(metadata, viewport, root))
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::Json(e.to_string()))
    }

    /// Writes the project as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        let mut file = fs::File::create(path)
            .map_err(|e| ProjectError::Io(format!("Could not create file '{}': {}", path, e)))?;
        file.write_all(json.as_bytes())
            .map_err(|e| ProjectError::Io(format!("Could not write to file '{}': {}", path, e)))?;
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, ProjectError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ProjectError::Io(format!("Could not open file '{}': {}", path, e)))?;
        let mut json = String::new();
        file.read_to_string(&mut json)
            .map_err(|e| ProjectError::Io(format!("Could not read file '{}': {}", path, e)))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{ "version": 9, "moduleName": "Old", "nodes": [] }"#;
        let project = ProjectFile::from_json(json).unwrap();
        assert_eq!(
            project.into_document(),
            Err(ProjectError::UnsupportedVersion {
                found: 9,
                expected: PROJECT_VERSION
            })
        );
    }

    #[test]
    fn test_dangling_connections_are_dropped() {
        let json = r#"{
            "version": 1,
            "moduleName": "Stale",
            "nodes": [
                { "id": 1, "type": "on-start", "position": {"x": 0, "y": 0},
                  "size": {"width": 160, "height": 60}, "inputs": [], "outputs": ["flow"] }
            ],
            "connections": [
                { "from": {"nodeId": 1, "portIndex": 0}, "to": {"nodeId": 42, "portIndex": 0} }
            ]
        }"#;
        let doc = ProjectFile::from_json(json).unwrap().into_document().unwrap();
        assert_eq!(doc.store().len(), 1);
        assert!(doc.store().connections().is_empty());
    }

    #[test]
    fn test_root_boundary_nodes_are_dropped() {
        let json = r#"{
            "version": 1,
            "moduleName": "Stray",
            "nodes": [
                { "id": 1, "type": "group-input", "position": {"x": 0, "y": 0},
                  "size": {"width": 160, "height": 60}, "inputs": [], "outputs": ["flow"] },
                { "id": 2, "type": "log", "position": {"x": 200, "y": 0},
                  "size": {"width": 160, "height": 60}, "inputs": ["flow", "message"],
                  "outputs": ["flow"] }
            ],
            "connections": [
                { "from": {"nodeId": 1, "portIndex": 0}, "to": {"nodeId": 2, "portIndex": 0} }
            ]
        }"#;
        let doc = ProjectFile::from_json(json).unwrap().into_document().unwrap();
        assert!(!doc.store().contains(1));
        assert!(doc.store().contains(2));
        assert!(doc.store().connections().is_empty());
    }
}
