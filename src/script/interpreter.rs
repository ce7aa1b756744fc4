//! Executes a parsed script against a mutation API.

use super::parser::{GroupDecl, NodeDecl, Script, Statement, StatementKind};
use crate::error::{ConnectError, GraphError, ScriptError};
use crate::graph::{Connection, Node, NodeId, PortRef, Store};
use crate::group::boundary::{default_position, exposes};
use crate::group::{GroupNavigator, ensure_boundary};
use crate::project::{ModuleMetadata, Viewport};
use crate::template::TemplateRegistry;
use tracing::debug;

/// Everything a script is allowed to do.
pub trait MutationApi {
    fn set_module_name(&mut self, name: &str);
    fn set_namespace(&mut self, namespace: &str);
    fn set_description(&mut self, description: &str);
    fn set_flag(&mut self, name: &str, value: bool);
    fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError>;
    fn add_connection(&mut self, from: PortRef, to: PortRef) -> Result<Connection, ConnectError>;
    /// Directs subsequent mutations into a group's nested store.
    fn enter_group(&mut self, group_id: NodeId) -> Result<(), GraphError>;
    fn exit_group(&mut self);
}

/// Binds the mutation API to a store and its metadata.
///
/// Groups entered and never exited are closed when the binding is dropped, so
/// the store is whole again even after a failed run.
pub struct Binding<'a> {
    store: &'a mut Store,
    metadata: &'a mut ModuleMetadata,
    groups: GroupNavigator,
    enclosing: Option<Node>,
}

impl<'a> Binding<'a> {
    pub fn new(store: &'a mut Store, metadata: &'a mut ModuleMetadata) -> Self {
        Self {
            store,
            metadata,
            groups: GroupNavigator::new(),
            enclosing: None,
        }
    }

    /// Binds to the nested store of `group`, so the script may declare the
    /// boundary nodes its flow ports call for.
    pub fn with_enclosing_group(mut self, group: Node) -> Self {
        self.enclosing = Some(group);
        self
    }
}

impl Drop for Binding<'_> {
    fn drop(&mut self) {
        self.groups.close_all(self.store);
    }
}

impl MutationApi for Binding<'_> {
    fn set_module_name(&mut self, name: &str) {
        self.metadata.name = name.to_string();
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.metadata.namespace = namespace.to_string();
    }

    fn set_description(&mut self, description: &str) {
        self.metadata.description = description.to_string();
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        self.metadata.flags.insert(name.to_string(), value);
    }

    /// Boundary pseudo-nodes are accepted once per group body, and only for a
    /// flow port the enclosing group exposes.
    fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if !node.is_boundary() {
            return self.store.add_node(node);
        }
        let exposed = self
            .groups
            .current_group()
            .or(self.enclosing.as_ref())
            .is_some_and(|group| exposes(group, &node.node_type));
        let declared = self.store.nodes().any(|n| n.node_type == node.node_type);
        if !exposed || declared {
            return Err(GraphError::MisplacedBoundaryNode {
                node_id: node.id,
                node_type: node.node_type,
            });
        }
        self.store.insert_node(node)
    }

    fn add_connection(&mut self, from: PortRef, to: PortRef) -> Result<Connection, ConnectError> {
        self.store.add_connection(from, to)
    }

    fn enter_group(&mut self, group_id: NodeId) -> Result<(), GraphError> {
        self.groups
            .enter(self.store, group_id, Viewport::default())
    }

    /// Boundary nodes the body did not declare are created on the way out.
    fn exit_group(&mut self) {
        if let Some(group) = self.groups.current_group() {
            ensure_boundary(self.store, group);
        }
        self.groups.close(self.store);
    }
}

/// What a successful run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub nodes: usize,
    pub groups: usize,
    pub connections: usize,
}

pub struct Interpreter<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Runs every statement in order, stopping at the first failure. Effects of
    /// statements before the failure are left in place; callers roll back.
    pub fn run(&self, script: &Script, api: &mut dyn MutationApi) -> Result<RunStats, ScriptError> {
        let mut stats = RunStats::default();
        self.execute(&script.statements, api, &mut stats)?;
        debug!(?stats, "script finished");
        Ok(stats)
    }

    fn execute(
        &self,
        statements: &[Statement],
        api: &mut dyn MutationApi,
        stats: &mut RunStats,
    ) -> Result<(), ScriptError> {
        for statement in statements {
            let line = statement.line;
            match &statement.kind {
                StatementKind::Module(name) => api.set_module_name(name),
                StatementKind::Namespace(namespace) => api.set_namespace(namespace),
                StatementKind::Description(text) => api.set_description(text),
                StatementKind::Flag { name, value } => api.set_flag(name, *value),
                StatementKind::Node(decl) => {
                    let node = self.build_node(decl, line, stats.nodes)?;
                    api.add_node(node)
                        .map_err(|source| ScriptError::Graph { line, source })?;
                    stats.nodes += 1;
                }
                StatementKind::Group(decl) => {
                    self.run_group(decl, line, api, stats)?;
                }
                StatementKind::Connect { from, to } => {
                    api.add_connection(
                        PortRef::output(from.node, from.port),
                        PortRef::input(to.node, to.port),
                    )
                    .map_err(|source| ScriptError::Connect { line, source })?;
                    stats.connections += 1;
                }
            }
        }
        Ok(())
    }

    fn build_node(&self, decl: &NodeDecl, line: usize, index: usize) -> Result<Node, ScriptError> {
        let position = decl.position.unwrap_or_else(|| default_position(index));
        let mut node = self
            .registry
            .instantiate(&decl.node_type, decl.id, position)
            .ok_or_else(|| ScriptError::UnknownNodeType {
                line,
                type_name: decl.node_type.clone(),
            })?;
        if let Some(size) = decl.size {
            node.size = size;
        }
        node.fields
            .extend(decl.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(node)
    }

    fn run_group(
        &self,
        decl: &GroupDecl,
        line: usize,
        api: &mut dyn MutationApi,
        stats: &mut RunStats,
    ) -> Result<(), ScriptError> {
        let mut node = Node::group(decl.id, &decl.name, decl.inputs.clone(), decl.outputs.clone());
        node.position = decl
            .position
            .unwrap_or_else(|| default_position(stats.nodes));
        if let Some(size) = decl.size {
            node.size = size;
        }
        node.fields
            .extend(decl.fields.iter().map(|(k, v)| (k.clone(), v.clone())));

        let graph_error = |source| ScriptError::Graph { line, source };
        api.add_node(node).map_err(graph_error)?;
        api.enter_group(decl.id).map_err(graph_error)?;
        stats.nodes += 1;
        stats.groups += 1;

        let result = self.execute(&decl.body, api, stats);
        api.exit_group();
        result
    }
}
