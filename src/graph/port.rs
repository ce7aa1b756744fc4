use super::NodeId;
use std::fmt;

/// The reserved label of a control-flow port.
pub const FLOW: &str = "flow";

/// Prefix of a named control-flow port, e.g. `flow:true`.
pub const FLOW_PREFIX: &str = "flow:";

/// The kind of a port, derived from its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Flow,
    Data,
}

impl PortKind {
    pub fn of(label: &str) -> Self {
        if is_flow(label) {
            PortKind::Flow
        } else {
            PortKind::Data
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Flow => write!(f, "flow"),
            PortKind::Data => write!(f, "data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Structural address of a port: `(node, direction, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeId,
    pub direction: PortDirection,
    pub index: usize,
}

impl PortRef {
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            index,
        }
    }
}

/// `true` for `flow` and for named flow labels such as `flow:true`.
pub fn is_flow(label: &str) -> bool {
    label == FLOW || label.starts_with(FLOW_PREFIX)
}

/// `true` only for named flow labels (branch outputs).
pub fn is_named_flow(label: &str) -> bool {
    label.starts_with(FLOW_PREFIX)
}

/// The branch name of a named flow label: `flow:true` -> `true`.
pub fn flow_name(label: &str) -> Option<&str> {
    label.strip_prefix(FLOW_PREFIX)
}
