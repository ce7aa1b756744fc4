//! # Kumiki - Node-Graph IR and Behavior Code Generator
//!
//! **Kumiki** keeps a visual node graph structurally valid while it is edited,
//! compiles it into class-shaped behavior source, and rebuilds graphs from a small
//! graph script so that edited text can flow back into the editor.
//!
//! ## Core Workflow
//!
//! 1.  **Edit**: Place nodes from the [`template::TemplateRegistry`] into a
//!     [`project::Document`] and wire them with `Store::add_connection`. Invalid
//!     connections are rejected without touching the graph.
//! 2.  **Record**: Call [`history::History::save`] after each discrete edit to make
//!     it undoable.
//! 3.  **Generate**: Run the [`codegen::CodeGenerator`] to get the module source.
//! 4.  **Round-trip**: Export the graph with [`script::write_script`] and load edited
//!     text with [`loader::RoundTripLoader`]. A failing script leaves the document
//!     exactly as it was.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kumiki::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let registry = TemplateRegistry::standard();
//!     let mut doc = Document::new(ModuleMetadata::new("Player"));
//!     let mut history = History::new(&doc)?;
//!
//!     let start = registry
//!         .instantiate("on-start", 1, Position::new(0.0, 0.0))
//!         .ok_or("missing template")?;
//!     let set = registry
//!         .instantiate("set-property", 2, Position::new(240.0, 0.0))
//!         .ok_or("missing template")?
//!         .with_field("name", "speed")
//!         .with_field("value", 5.0)
//!         .with_field("expose", true);
//!
//!     let store = doc.store_mut();
//!     store.add_node(start)?;
//!     store.add_node(set)?;
//!     store.add_connection(PortRef::output(1, 0), PortRef::input(2, 0))?;
//!     history.save(&doc)?;
//!
//!     let module = CodeGenerator::new(&registry).generate_document(&doc)?;
//!     println!("{}", module.source);
//!     Ok(())
//! }
//! ```

pub mod codegen;
pub mod error;
pub mod graph;
pub mod group;
pub mod history;
pub mod loader;
pub mod prelude;
pub mod project;
pub mod script;
pub mod template;
