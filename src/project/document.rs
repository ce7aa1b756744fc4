use super::{ModuleMetadata, Viewport};
use crate::error::GraphError;
use crate::graph::{Node, NodeId, Store};
use crate::group::{Boundary, GroupNavigator, ensure_boundary, set_group_ports};

/// An editing session: metadata, the active store and the open-group path.
///
/// Edits go through [`Document::store_mut`], which always addresses the store of
/// the innermost open group (or the root when none is open).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metadata: ModuleMetadata,
    pub viewport: Viewport,
    active: Store,
    groups: GroupNavigator,
}

impl Document {
    pub fn new(metadata: ModuleMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// A document whose root graph is `root`, with no group open.
    pub fn from_parts(metadata: ModuleMetadata, viewport: Viewport, root: Store) -> Self {
        Self {
            metadata,
            viewport,
            active: root,
            groups: GroupNavigator::new(),
        }
    }

    /// The store being edited.
    pub fn store(&self) -> &Store {
        &self.active
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.active
    }

    /// The whole graph from the root, including the store being edited.
    pub fn root(&self) -> Store {
        self.groups.assemble(&self.active)
    }

    /// Opens a group of the active store, saving the current viewport.
    pub fn open_group(&mut self, group_id: NodeId) -> Result<Boundary, GraphError> {
        let boundary = self
            .groups
            .open(&mut self.active, group_id, self.viewport)?;
        self.viewport = Viewport::default();
        Ok(boundary)
    }

    /// Closes the innermost group. Returns `false` at the root.
    pub fn close_group(&mut self) -> bool {
        match self.groups.close(&mut self.active) {
            Some(viewport) => {
                self.viewport = viewport;
                true
            }
            None => false,
        }
    }

    pub fn close_all_groups(&mut self) {
        if let Some(viewport) = self.groups.close_all(&mut self.active) {
            self.viewport = viewport;
        }
    }

    pub fn group_path(&self) -> Vec<NodeId> {
        self.groups.path()
    }

    pub fn group_depth(&self) -> usize {
        self.groups.depth()
    }

    pub fn current_group(&self) -> Option<&Node> {
        self.groups.current_group()
    }

    pub fn navigator(&self) -> &GroupNavigator {
        &self.groups
    }

    /// Changes the ports of a group in the active store.
    pub fn set_group_ports(
        &mut self,
        group_id: NodeId,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Result<Boundary, GraphError> {
        set_group_ports(&mut self.active, group_id, inputs, outputs)
    }

    /// Recreates missing boundary nodes of the open group, if any.
    pub fn reconcile_boundary(&mut self) -> Boundary {
        match self.groups.current_group() {
            Some(group) => ensure_boundary(&mut self.active, group),
            None => Boundary::default(),
        }
    }

    /// The active store and the metadata, borrowed together.
    pub fn parts_mut(&mut self) -> (&mut Store, &mut ModuleMetadata) {
        (&mut self.active, &mut self.metadata)
    }

    /// Starts a fresh project, discarding every graph.
    pub fn reset(&mut self, metadata: ModuleMetadata) {
        *self = Self::new(metadata);
    }
}
