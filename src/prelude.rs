//! Prelude module for convenient imports
//!
//! Re-exports the types most programs need to edit, generate and round-trip a graph.
//!
//! # Example
//!
//! ```rust,no_run
//! use kumiki::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = TemplateRegistry::standard();
//! let project = ProjectFile::from_file("path/to/player.json")?;
//! let mut doc = project.into_document()?;
//! let mut history = History::new(&doc)?;
//!
//! let edited = std::fs::read_to_string("path/to/player.graph")?;
//! RoundTripLoader::new(&registry).load_from_text(&mut doc, &mut history, &edited)?;
//!
//! let module = CodeGenerator::new(&registry).generate_document(&doc)?;
//! println!("{}", module.source);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    Connection, Endpoint, FLOW, FieldValue, Node, NodeId, PortDirection, PortKind, PortRef,
    Position, Size, Store,
};
pub use crate::group::Boundary;

// Templates and generation
pub use crate::codegen::{CodeGenerator, GeneratedModule, IndentFormatter, SourceFormatter};
pub use crate::template::{NodeTemplate, Section, TemplateRegistry};

// Documents, history and round trip
pub use crate::history::History;
pub use crate::loader::{LoadReport, RoundTripLoader};
pub use crate::project::{Document, ModuleMetadata, ProjectFile, Snapshot, Viewport};
pub use crate::script::write_script;

// Error types
pub use crate::error::{
    CodegenError, ConnectError, GraphError, LoadError, ProjectError, ScriptError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
