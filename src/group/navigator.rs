use super::boundary::{Boundary, ensure_boundary};
use crate::error::GraphError;
use crate::graph::{Node, NodeId, Store};
use crate::project::Viewport;
use tracing::debug;

/// A parent graph set aside while one of its groups is open.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFrame {
    pub group_id: NodeId,
    pub parent: Store,
    pub viewport: Viewport,
}

/// Tracks which group is being edited.
///
/// Opening a group swaps its nested store into the caller's active slot and keeps
/// the parent here; closing swaps it back. The group node inside the parent holds
/// no nested store while it is open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNavigator {
    frames: Vec<GroupFrame>,
}

impl GroupNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the group `group_id` of `active`, making its nested store active and
    /// reconciling its boundary nodes.
    pub fn open(
        &mut self,
        active: &mut Store,
        group_id: NodeId,
        viewport: Viewport,
    ) -> Result<Boundary, GraphError> {
        self.enter(active, group_id, viewport)?;
        let boundary = match self.current_group() {
            Some(group) => ensure_boundary(active, group),
            None => Boundary::default(),
        };
        debug!(group = group_id, depth = self.depth(), "opened group");
        Ok(boundary)
    }

    /// Like [`GroupNavigator::open`] but leaves the nested store exactly as found.
    pub fn enter(
        &mut self,
        active: &mut Store,
        group_id: NodeId,
        viewport: Viewport,
    ) -> Result<(), GraphError> {
        let node = active
            .node_mut(group_id)
            .ok_or(GraphError::NodeNotFound(group_id))?;
        if !node.is_group {
            return Err(GraphError::NotAGroup(group_id));
        }

        let inner = node.sub_graph.take().unwrap_or_default();
        let parent = std::mem::replace(active, inner);
        self.frames.push(GroupFrame {
            group_id,
            parent,
            viewport,
        });
        Ok(())
    }

    /// Closes the innermost group, returning the viewport saved when it was opened.
    pub fn close(&mut self, active: &mut Store) -> Option<Viewport> {
        let frame = self.frames.pop()?;
        active.prune_connections();
        let inner = std::mem::replace(active, frame.parent);
        if let Some(node) = active.node_mut(frame.group_id) {
            node.sub_graph = Some(inner);
        }
        debug!(group = frame.group_id, depth = self.depth(), "closed group");
        Some(frame.viewport)
    }

    /// Closes every open group.
    pub fn close_all(&mut self, active: &mut Store) -> Option<Viewport> {
        let mut outermost = None;
        while let Some(viewport) = self.close(active) {
            outermost = Some(viewport);
        }
        outermost
    }

    /// Rebuilds the full root graph around `active` without closing anything.
    pub fn assemble(&self, active: &Store) -> Store {
        let mut current = active.clone();
        for frame in self.frames.iter().rev() {
            let mut parent = frame.parent.clone();
            if let Some(node) = parent.node_mut(frame.group_id) {
                node.sub_graph = Some(current);
            }
            current = parent;
        }
        current
    }

    /// The group node whose nested store is active.
    pub fn current_group(&self) -> Option<&Node> {
        let frame = self.frames.last()?;
        frame.parent.node(frame.group_id)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_root(&self) -> bool {
        self.frames.is_empty()
    }

    /// Ids of the open groups, outermost first.
    pub fn path(&self) -> Vec<NodeId> {
        self.frames.iter().map(|f| f.group_id).collect()
    }

    pub fn frames(&self) -> &[GroupFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FLOW, GROUP_INPUT_TYPE};

    fn root_with_group() -> Store {
        let mut store = Store::new();
        store
            .add_node(Node::group(
                3,
                "Inner",
                vec![FLOW.to_string()],
                vec![FLOW.to_string()],
            ))
            .unwrap();
        store.add_node(Node::new(4, "number")).unwrap();
        store
    }

    #[test]
    fn test_open_close_swaps_stores() {
        let mut active = root_with_group();
        let mut nav = GroupNavigator::new();

        let boundary = nav.open(&mut active, 3, Viewport::default()).unwrap();
        assert_eq!(nav.path(), vec![3]);
        assert!(boundary.input.is_some() && boundary.output.is_some());
        assert!(active.nodes().any(|n| n.node_type == GROUP_INPUT_TYPE));

        let assembled = nav.assemble(&active);
        assert_eq!(assembled.node(3).and_then(|n| n.sub_graph.as_ref()), Some(&active));

        nav.close(&mut active).unwrap();
        assert!(nav.is_root());
        assert_eq!(active, assembled);
    }

    #[test]
    fn test_open_rejects_non_groups() {
        let mut active = root_with_group();
        let mut nav = GroupNavigator::new();
        assert_eq!(
            nav.open(&mut active, 4, Viewport::default()),
            Err(GraphError::NotAGroup(4))
        );
        assert_eq!(
            nav.open(&mut active, 9, Viewport::default()),
            Err(GraphError::NodeNotFound(9))
        );
        assert!(nav.is_root());
    }
}
