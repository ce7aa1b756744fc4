//! Pure connection rules.
//!
//! These checks only look at the two ports involved; resolving nodes and port
//! indices is the store's job.

use super::port::{PortDirection, PortKind};
use super::NodeId;
use crate::error::ConnectError;

/// A resolved port: the node it lives on, its direction and its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortInfo<'a> {
    pub node: NodeId,
    pub direction: PortDirection,
    pub label: &'a str,
}

impl<'a> PortInfo<'a> {
    pub fn new(node: NodeId, direction: PortDirection, label: &'a str) -> Self {
        Self {
            node,
            direction,
            label,
        }
    }

    pub fn kind(&self) -> PortKind {
        PortKind::of(self.label)
    }
}

/// Decides whether two ports may be joined.
///
/// Checks run in order: self-loop, direction, kind. Either argument may be the
/// output; the store orients the connection afterwards.
pub fn can_connect(a: &PortInfo<'_>, b: &PortInfo<'_>) -> Result<(), ConnectError> {
    if a.node == b.node {
        return Err(ConnectError::SelfLoop(a.node));
    }
    if a.direction == b.direction {
        return Err(ConnectError::SameDirection(a.direction));
    }

    let (output, input) = if a.direction == PortDirection::Output {
        (a, b)
    } else {
        (b, a)
    };
    if output.kind() != input.kind() {
        return Err(ConnectError::KindMismatch {
            output: output.kind(),
            input: input.kind(),
        });
    }
    Ok(())
}
