//! The graph script: a small statement language that rebuilds a graph.
//!
//! ```text
//! module "Player";
//! node 1 "on-start" at (0, 0);
//! node 2 "set-property" at (240, 0) {
//!     name = "speed";
//!     value = 5;
//! }
//! connect 1:0 -> 2:0;
//! ```
//!
//! Scripts never run host code. The interpreter can only call the operations of
//! [`MutationApi`], so every effect is a store or metadata mutation.

pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod writer;

pub use interpreter::{Binding, Interpreter, MutationApi, RunStats};
pub use parser::{GroupDecl, NodeDecl, PortAddress, Script, Statement, StatementKind, parse};
pub use writer::write_script;
