//! The editable document, its serialized project form and undo snapshots.

pub mod document;
pub mod dto;
pub mod snapshot;

pub use document::Document;
pub use dto::{ConnectionDto, EndpointDto, NodeDto, PROJECT_VERSION, ProjectFile, StoreDto};
pub use snapshot::Snapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Module-level settings that travel with the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub flags: BTreeMap<String, bool>,
}

impl ModuleMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_flag(mut self, name: &str, value: bool) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }
}

/// Canvas pan and zoom. Opaque to the core; it only travels with snapshots and files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan_offset: [f64; 2],
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_offset: [0.0, 0.0],
            zoom: 1.0,
        }
    }
}
