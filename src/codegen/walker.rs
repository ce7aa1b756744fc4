//! Flow traversal and expression resolution over one store.

use crate::error::CodegenError;
use crate::graph::{GROUP_INPUT_TYPE, Node, NodeId, Store, port};
use crate::template::{EmitContext, TemplateRegistry, standard::operand};
use ahash::AHashSet;

/// A store being emitted and the prefix that keeps its variables unique.
pub(super) struct Scope<'s> {
    pub store: &'s Store,
    prefix: String,
}

impl<'s> Scope<'s> {
    pub fn root(store: &'s Store) -> Self {
        Self {
            store,
            prefix: String::new(),
        }
    }

    /// The scope of a group's nested store.
    pub fn nested<'g>(&self, group: &'g Node) -> Option<Scope<'g>> {
        Some(Scope {
            store: group.sub_graph.as_ref()?,
            prefix: format!("{}{}_", self.prefix, group.id),
        })
    }

    pub fn variable(&self, id: NodeId) -> String {
        format!("n{}{}", self.prefix, id)
    }
}

pub(super) struct Walker<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> Walker<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Emits `id` and everything its flow reaches.
    ///
    /// Nodes already in `visited` emit nothing. Each named flow output is walked
    /// with its own copy of `visited`; the plain `flow` output shares it.
    pub fn emit_node(
        &self,
        scope: &Scope<'_>,
        id: NodeId,
        visited: &mut AHashSet<NodeId>,
    ) -> Result<String, CodegenError> {
        if !visited.insert(id) {
            return Ok(String::new());
        }
        // Dangling: treated as no connection.
        let Some(node) = scope.store.node(id) else {
            return Ok(String::new());
        };
        let template = self.registry.require(node)?;

        let own = if node.is_group {
            self.inline_group(scope, node)?
        } else {
            let mut branches = Vec::with_capacity(node.outputs.len());
            for (index, label) in node.outputs.iter().enumerate() {
                if port::is_named_flow(label) {
                    let mut branch_visited = visited.clone();
                    branches.push(self.follow(scope, id, index, &mut branch_visited)?);
                } else {
                    branches.push(String::new());
                }
            }
            let inputs = self.resolve_inputs(scope, node, &mut AHashSet::new())?;
            let ctx = EmitContext::new(inputs, branches, scope.variable(id));
            template.emit(node, &ctx)
        };

        let next = match node.flow_output() {
            Some(port) => self.follow(scope, id, port, visited)?,
            None => String::new(),
        };
        Ok(join(&[own, next]))
    }

    /// Emits every node connected to output `port` of `id`, in connection order.
    pub fn follow(
        &self,
        scope: &Scope<'_>,
        id: NodeId,
        port: usize,
        visited: &mut AHashSet<NodeId>,
    ) -> Result<String, CodegenError> {
        let targets: Vec<NodeId> = scope.store.outgoing(id, port).map(|c| c.to.node).collect();
        let mut chunks = Vec::with_capacity(targets.len());
        for target in targets {
            chunks.push(self.emit_node(scope, target, visited)?);
        }
        Ok(join(&chunks))
    }

    /// Emits the body of a group, entered through its GroupInput.
    pub fn group_body(&self, scope: &Scope<'_>, group: &Node) -> Result<String, CodegenError> {
        let Some(inner) = scope.nested(group) else {
            return Ok(String::new());
        };
        let mut visited = AHashSet::new();
        let entries = entry_points(inner.store);
        let mut chunks = Vec::with_capacity(entries.len());
        for entry in entries {
            chunks.push(self.emit_node(&inner, entry, &mut visited)?);
        }
        Ok(join(&chunks))
    }

    fn inline_group(&self, scope: &Scope<'_>, group: &Node) -> Result<String, CodegenError> {
        if scope.store.has_incoming_flow(group) {
            self.group_body(scope, group)
        } else {
            // Extracted as a routine instead.
            Ok(String::new())
        }
    }

    fn resolve_inputs(
        &self,
        scope: &Scope<'_>,
        node: &Node,
        resolving: &mut AHashSet<NodeId>,
    ) -> Result<Vec<Option<String>>, CodegenError> {
        let mut inputs = Vec::with_capacity(node.inputs.len());
        for (index, label) in node.inputs.iter().enumerate() {
            let expr = match scope.store.incoming(node.id, index) {
                Some(c) if !port::is_flow(label) => {
                    self.expression(scope, c.from.node, c.from.port, resolving)?
                }
                _ => None,
            };
            inputs.push(expr);
        }
        Ok(inputs)
    }

    /// The expression a downstream consumer uses for output `port` of `id`.
    fn expression(
        &self,
        scope: &Scope<'_>,
        id: NodeId,
        port: usize,
        resolving: &mut AHashSet<NodeId>,
    ) -> Result<Option<String>, CodegenError> {
        let Some(node) = scope.store.node(id) else {
            return Ok(None);
        };
        let Some(label) = node.outputs.get(port) else {
            return Ok(None);
        };
        let template = self.registry.require(node)?;

        if template.is_pure() {
            if !resolving.insert(id) {
                return Ok(None);
            }
            let inputs = self.resolve_inputs(scope, node, resolving)?;
            resolving.remove(&id);

            let ctx = EmitContext::new(inputs, Vec::new(), scope.variable(id));
            let base = template.emit(node, &ctx);
            if node.data_output_count() > 1 {
                let access = template
                    .output_access(node, &base, label)
                    .unwrap_or_else(|| dotted(&base, label));
                return Ok(Some(access));
            }
            return Ok(Some(base));
        }

        let variable = scope.variable(id);
        if let Some(access) = template.output_access(node, &variable, label) {
            return Ok(Some(access));
        }
        if template.single_value_output() {
            return Ok(Some(variable));
        }
        if node.data_output_count() > 1 {
            return Ok(Some(dotted(&variable, label)));
        }
        Ok(None)
    }
}

/// Where a group's body starts: its GroupInput, or else every
/// flow node whose flow input is unconnected.
pub(super) fn entry_points(store: &Store) -> Vec<NodeId> {
    if let Some(input) = store.nodes().find(|n| n.node_type == GROUP_INPUT_TYPE) {
        return vec![input.id];
    }
    store
        .nodes()
        .filter(|n| !n.is_boundary() && n.flow_input().is_some() && !store.has_incoming_flow(n))
        .map(|n| n.id)
        .collect()
}

fn dotted(base: &str, label: &str) -> String {
    format!("{}.{}", operand(base), label)
}

/// Joins non-empty chunks with newlines.
pub(super) fn join<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| AsRef::<str>::as_ref(c))
        .filter(|c| !c.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
