use super::port::{self, FLOW, PortDirection};
use super::Store;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a node, unique within the store that directly contains it.
pub type NodeId = u32;

/// Type key of a group container node.
pub const GROUP_TYPE: &str = "group";
/// Type key of the pseudo-node standing for a group's external flow input.
pub const GROUP_INPUT_TYPE: &str = "group-input";
/// Type key of the pseudo-node standing for a group's external flow output.
pub const GROUP_OUTPUT_TYPE: &str = "group-output";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 160.0,
            height: 60.0,
        }
    }
}

/// Type-specific scalar or vector state carried by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Vector(Vec<f64>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as a source literal.
    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

/// Formats a number without a trailing `.0` when it is integral.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n < 0.0 { "-Infinity" } else { "Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Quotes a string with the escapes understood by the graph script lexer.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Text(s) => write!(f, "{}", quote(s)),
            FieldValue::Vector(values) => {
                write!(f, "[{}]", values.iter().map(|v| format_number(*v)).join(", "))
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(value: Vec<f64>) -> Self {
        FieldValue::Vector(value)
    }
}

/// Ordered field map of a node.
pub type Fields = BTreeMap<String, FieldValue>;

/// A typed node placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub position: Position,
    pub size: Size,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub fields: Fields,
    pub is_group: bool,
    pub sub_graph: Option<Store>,
}

impl Node {
    /// Creates a node without ports. Use [`Node::with_ports`] or a template to add them.
    pub fn new(id: NodeId, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            position: Position::default(),
            size: Size::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            fields: Fields::new(),
            is_group: false,
            sub_graph: None,
        }
    }

    /// Creates a group node owning an empty nested store.
    pub fn group(id: NodeId, name: &str, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        let mut node = Self::new(id, GROUP_TYPE).with_ports(inputs, outputs);
        node.is_group = true;
        node.sub_graph = Some(Store::new());
        node.fields
            .insert("name".to_string(), FieldValue::Text(name.to_string()));
        node
    }

    pub fn with_ports(mut self, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// `true` for GroupInput/GroupOutput pseudo-nodes.
    pub fn is_boundary(&self) -> bool {
        is_boundary_type(&self.node_type)
    }

    pub fn port_label(&self, direction: PortDirection, index: usize) -> Option<&str> {
        let ports = match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        };
        ports.get(index).map(String::as_str)
    }

    /// Index of the plain `flow` input, if any.
    pub fn flow_input(&self) -> Option<usize> {
        self.inputs.iter().position(|l| l == FLOW)
    }

    /// Index of the plain `flow` output, if any.
    pub fn flow_output(&self) -> Option<usize> {
        self.outputs.iter().position(|l| l == FLOW)
    }

    pub fn has_flow_port(&self, direction: PortDirection) -> bool {
        let ports = match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        };
        ports.iter().any(|l| port::is_flow(l))
    }

    /// Number of non-flow outputs.
    pub fn data_output_count(&self) -> usize {
        self.outputs.iter().filter(|l| !port::is_flow(l)).count()
    }

    /// The `name` field when present, the node type otherwise.
    pub fn display_name(&self) -> &str {
        self.field("name")
            .and_then(FieldValue::as_text)
            .unwrap_or(&self.node_type)
    }
}

pub fn is_boundary_type(node_type: &str) -> bool {
    node_type == GROUP_INPUT_TYPE || node_type == GROUP_OUTPUT_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_source() {
        assert_eq!(FieldValue::Number(5.0).to_source(), "5");
        assert_eq!(FieldValue::Number(2.5).to_source(), "2.5");
        assert_eq!(FieldValue::Bool(true).to_source(), "true");
        assert_eq!(FieldValue::from("say \"hi\"").to_source(), "\"say \\\"hi\\\"\"");
        assert_eq!(FieldValue::Vector(vec![1.0, 0.5]).to_source(), "[1, 0.5]");
        assert_eq!(FieldValue::Number(f64::NEG_INFINITY).to_source(), "-Infinity");
        assert_eq!(FieldValue::Number(f64::NAN).to_source(), "NaN");
    }

    #[test]
    fn test_group_node_has_store() {
        let node = Node::group(7, "Movement", vec![FLOW.into()], vec![FLOW.into()]);
        assert!(node.is_group);
        assert!(node.sub_graph.is_some());
        assert_eq!(node.display_name(), "Movement");
        assert_eq!(node.flow_input(), Some(0));
    }
}
