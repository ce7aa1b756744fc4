use super::dto::StoreDto;
use super::{Document, ModuleMetadata, Viewport};
use crate::error::ProjectError;
use crate::graph::NodeId;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct OpenGroup {
    group_id: NodeId,
    viewport: Viewport,
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    metadata: ModuleMetadata,
    root: StoreDto,
    open_groups: Vec<OpenGroup>,
    viewport: Viewport,
}

/// A self-contained, immutable encoding of a whole document.
///
/// Two snapshots are equal exactly when their bytes are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn capture(doc: &Document) -> Result<Self, ProjectError> {
        let data = SnapshotData {
            metadata: doc.metadata.clone(),
            root: StoreDto::from_store(&doc.root()),
            open_groups: doc
                .navigator()
                .frames()
                .iter()
                .map(|f| OpenGroup {
                    group_id: f.group_id,
                    viewport: f.viewport,
                })
                .collect(),
            viewport: doc.viewport,
        };
        let bytes = encode_to_vec(&data, standard())
            .map_err(|e| ProjectError::Encode(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Decodes the snapshot into a fresh document.
    pub fn to_document(&self) -> Result<Document, ProjectError> {
        let (data, _): (SnapshotData, usize) = decode_from_slice(&self.bytes, standard())
            .map_err(|e| ProjectError::Decode(e.to_string()))?;

        let mut doc = Document::from_parts(data.metadata, Viewport::default(), data.root.into_store());
        for group in data.open_groups {
            doc.viewport = group.viewport;
            if let Err(e) = doc.open_group(group.group_id) {
                debug!(group = group.group_id, error = %e, "open group missing from snapshot");
                break;
            }
        }
        doc.viewport = data.viewport;
        Ok(doc)
    }

    /// Replaces `doc` with the snapshot's state. `doc` is untouched on error.
    pub fn restore(&self, doc: &mut Document) -> Result<(), ProjectError> {
        *doc = self.to_document()?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
