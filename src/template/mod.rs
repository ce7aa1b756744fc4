//! The node-template contract and its registry.
//!
//! A template describes one node type: its port signature, whether it anchors a
//! lifecycle section, and how it renders itself as source text. The code
//! generator never embeds node-specific logic; it only calls this contract.

use crate::error::CodegenError;
use crate::graph::{FieldValue, Fields, GROUP_TYPE, Node, NodeId, Position, port};
use ahash::AHashMap;
use std::fmt;

pub mod standard;

use standard::{create_template_by_name, register_standard_templates};

/// A lifecycle section of a generated module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Init,
    Update,
    Render,
    Teardown,
    Custom(String),
}

impl Section {
    /// Name of the host hook (or custom routine) the section body is emitted into.
    pub fn hook_name(&self) -> &str {
        match self {
            Section::Init => "start",
            Section::Update => "update",
            Section::Render => "render",
            Section::Teardown => "destroy",
            Section::Custom(name) => name,
        }
    }

    /// Parameter list of the hook.
    pub fn parameters(&self) -> &'static str {
        match self {
            Section::Update => "delta",
            _ => "",
        }
    }

    pub fn lifecycle() -> [Section; 4] {
        [
            Section::Init,
            Section::Update,
            Section::Render,
            Section::Teardown,
        ]
    }
}

/// A property declared by an exposed property node.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRegistration {
    pub name: String,
    pub default: FieldValue,
}

/// Everything a template needs to render one node.
#[derive(Debug, Clone, Default)]
pub struct EmitContext {
    inputs: Vec<Option<String>>,
    branches: Vec<String>,
    variable: String,
}

impl EmitContext {
    pub fn new(inputs: Vec<Option<String>>, branches: Vec<String>, variable: String) -> Self {
        Self {
            inputs,
            branches,
            variable,
        }
    }

    /// The resolved expression of a connected data input.
    pub fn input(&self, index: usize) -> Option<&str> {
        self.inputs.get(index).and_then(|i| i.as_deref())
    }

    /// The connected expression, else the node's field rendered as a literal, else `null`.
    pub fn input_or_field(&self, index: usize, node: &Node, field: &str) -> String {
        match self.input(index) {
            Some(expr) => expr.to_string(),
            None => node
                .field(field)
                .map_or_else(|| "null".to_string(), FieldValue::to_source),
        }
    }

    /// Body text generated for a named flow output.
    pub fn branch(&self, output_index: usize) -> &str {
        self.branches.get(output_index).map_or("", String::as_str)
    }

    /// The variable holding this node's result, unique within the module.
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

/// Defines the contract for rendering a specific node type.
pub trait NodeTemplate: Send + Sync {
    fn node_type(&self) -> &str;
    fn inputs(&self) -> &[&'static str];
    fn outputs(&self) -> &[&'static str];

    /// Pure nodes have no flow ports and always render as inline expressions.
    fn is_pure(&self) -> bool {
        !self
            .inputs()
            .iter()
            .chain(self.outputs())
            .any(|label| port::is_flow(label))
    }

    /// The section this node anchors, if it is an entry point.
    fn anchor(&self, _node: &Node) -> Option<Section> {
        None
    }

    fn default_fields(&self) -> Fields {
        Fields::new()
    }

    /// Renders the node: an expression for pure nodes, statements otherwise.
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String;

    /// Overrides `base.label` access for a data output.
    fn output_access(&self, _node: &Node, _base: &str, _label: &str) -> Option<String> {
        None
    }

    /// A flow node with exactly one data output is referenced by its result variable.
    fn single_value_output(&self) -> bool {
        false
    }

    fn property(&self, _node: &Node) -> Option<PropertyRegistration> {
        None
    }
}

/// Maps node type keys to templates.
pub struct TemplateRegistry {
    templates: AHashMap<String, Box<dyn NodeTemplate>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("node_types", &self.node_types())
            .finish()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TemplateRegistry {
    /// A registry holding the standard templates.
    pub fn standard() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TemplateRegistryBuilder {
        TemplateRegistryBuilder::new()
    }

    pub fn get(&self, node_type: &str) -> Option<&dyn NodeTemplate> {
        self.templates.get(node_type).map(|t| t.as_ref())
    }

    /// The template for `node`, or `UnknownNodeType`.
    pub fn require(&self, node: &Node) -> Result<&dyn NodeTemplate, CodegenError> {
        self.get(&node.node_type)
            .ok_or_else(|| CodegenError::UnknownNodeType {
                node_id: node.id,
                type_name: node.node_type.clone(),
            })
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.templates.contains_key(node_type)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered type keys, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Places a node from a template: ports and default fields come from the template.
    pub fn instantiate(&self, node_type: &str, id: NodeId, position: Position) -> Option<Node> {
        let template = self.get(node_type)?;
        let to_labels = |labels: &[&str]| labels.iter().map(|l| l.to_string()).collect();

        let mut node = if node_type == GROUP_TYPE {
            Node::group(
                id,
                "Group",
                to_labels(template.inputs()),
                to_labels(template.outputs()),
            )
        } else {
            Node::new(id, node_type)
                .with_ports(to_labels(template.inputs()), to_labels(template.outputs()))
        };
        node.position = position;
        for (name, value) in template.default_fields() {
            node.fields.entry(name).or_insert(value);
        }
        Some(node)
    }
}

pub struct TemplateRegistryBuilder {
    templates: AHashMap<String, Box<dyn NodeTemplate>>,
}

impl Default for TemplateRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistryBuilder {
    pub fn new() -> Self {
        let mut templates: AHashMap<String, Box<dyn NodeTemplate>> = AHashMap::new();
        register_standard_templates(&mut templates);
        Self { templates }
    }

    /// Registers a standard template under a user-facing type name.
    pub fn with_type_mapping(mut self, user_type_name: &str, standard_type_name: &str) -> Self {
        if let Some(template) = create_template_by_name(standard_type_name) {
            self.templates.insert(user_type_name.to_string(), template);
        }
        self
    }

    pub fn with_template(mut self, template: Box<dyn NodeTemplate>) -> Self {
        self.templates
            .insert(template.node_type().to_string(), template);
        self
    }

    pub fn build(self) -> TemplateRegistry {
        TemplateRegistry {
            templates: self.templates,
        }
    }
}
