//! Transactional loading of graph scripts into a document.

use crate::error::LoadError;
use crate::history::History;
use crate::project::{Document, Snapshot};
use crate::script::{Binding, Interpreter, RunStats, parse, write_script};
use crate::template::TemplateRegistry;
use tracing::{info, warn};

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub stats: RunStats,
    /// Nodes the active store held before the load.
    pub replaced_nodes: usize,
}

/// Replaces the active store with the graph a script describes, or leaves the
/// document exactly as it was.
pub struct RoundTripLoader<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> RoundTripLoader<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self { registry }
    }

    /// The script for the active store, suitable for [`RoundTripLoader::load_from_text`].
    pub fn export_text(&self, doc: &Document) -> String {
        write_script(&doc.metadata, doc.store())
    }

    /// Loads `text` into the active store.
    ///
    /// Syntax errors are reported before anything changes. If the script fails
    /// while running, the document is restored from a snapshot taken just before
    /// and the error is returned. On success the new state is saved to `history`.
    pub fn load_from_text(
        &self,
        doc: &mut Document,
        history: &mut History,
        text: &str,
    ) -> Result<LoadReport, LoadError> {
        let script = parse(text)?;
        let backup = Snapshot::capture(doc)?;
        let replaced_nodes = doc.store().len();
        info!(
            statements = script.statements.len(),
            replaced_nodes, "loading graph script"
        );

        let enclosing = doc.current_group().cloned();
        let outcome = {
            let (store, metadata) = doc.parts_mut();
            store.clear();
            let mut binding = Binding::new(store, metadata);
            if let Some(group) = enclosing {
                binding = binding.with_enclosing_group(group);
            }
            Interpreter::new(self.registry).run(&script, &mut binding)
        };

        match outcome {
            Ok(stats) => {
                doc.reconcile_boundary();
                history.save(doc)?;
                info!(
                    nodes = stats.nodes,
                    connections = stats.connections,
                    "graph script loaded"
                );
                Ok(LoadReport {
                    stats,
                    replaced_nodes,
                })
            }
            Err(error) => {
                warn!(%error, "graph script failed, rolling back");
                backup.restore(doc)?;
                Err(error.into())
            }
        }
    }
}
