//! Group editing: navigation into nested stores and their boundary pseudo-nodes.

pub mod boundary;
pub mod navigator;

pub use boundary::{
    Boundary, boundary_node, ensure_boundary, find_boundary, is_boundary_connection,
    partition_connections, set_group_ports,
};
pub use navigator::{GroupFrame, GroupNavigator};
