pub mod connection;
pub mod node;
pub mod port;
pub mod store;
pub mod validate;

pub use connection::*;
pub use node::*;
pub use port::{FLOW, PortDirection, PortKind, PortRef};
pub use store::*;
pub use validate::{PortInfo, can_connect};
