//! Compiles a node graph into a class-shaped behavior module.
//!
//! Lifecycle sections are entered from their anchor nodes and walked along flow
//! connections. Data inputs are resolved into inline expressions on demand.
//! Groups reached by flow are inlined; groups nothing flows into become routines.

use crate::error::CodegenError;
use crate::graph::{NodeId, Store};
use crate::project::{Document, ModuleMetadata};
use crate::template::{PropertyRegistration, Section, TemplateRegistry};
use ahash::AHashSet;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[cfg(feature = "debug-tools")]
use std::fs;

pub mod format;
mod walker;

pub use format::{IndentFormatter, PlainFormatter, SourceFormatter};
use walker::{Scope, Walker, join};

pub const DEFAULT_BASE_CLASS: &str = "Behavior";

/// A group emitted as a standalone method.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub group_id: NodeId,
    pub body: String,
}

/// The output of one generation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedModule {
    pub class_name: String,
    pub sections: Vec<(Section, String)>,
    /// Method each section is emitted as. Custom names are deduplicated
    /// against the hooks, each other and `constructor` / `super`.
    pub methods: BTreeMap<Section, String>,
    pub routines: Vec<Routine>,
    pub properties: Vec<PropertyRegistration>,
    pub source: String,
}

impl GeneratedModule {
    /// Unformatted body of a section, if the module has it.
    pub fn section(&self, section: &Section) -> Option<&str> {
        self.sections
            .iter()
            .find(|(s, _)| s == section)
            .map(|(_, body)| body.as_str())
    }

    pub fn method_name(&self, section: &Section) -> Option<&str> {
        self.methods.get(section).map(String::as_str)
    }

    pub fn routine(&self, name: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name)
    }
}

pub struct CodeGenerator<'a> {
    registry: &'a TemplateRegistry,
    formatter: Box<dyn SourceFormatter>,
    base_class: String,
}

pub struct CodeGeneratorBuilder<'a> {
    registry: &'a TemplateRegistry,
    formatter: Box<dyn SourceFormatter>,
    base_class: String,
}

impl<'a> CodeGeneratorBuilder<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self {
            registry,
            formatter: Box::new(IndentFormatter::default()),
            base_class: DEFAULT_BASE_CLASS.to_string(),
        }
    }

    pub fn with_formatter(mut self, formatter: Box<dyn SourceFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_base_class(mut self, base_class: &str) -> Self {
        self.base_class = base_class.to_string();
        self
    }

    pub fn build(self) -> CodeGenerator<'a> {
        CodeGenerator {
            registry: self.registry,
            formatter: self.formatter,
            base_class: self.base_class,
        }
    }
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: &'a TemplateRegistry) -> CodeGeneratorBuilder<'a> {
        CodeGeneratorBuilder::new(registry)
    }

    /// Generates from the document's root graph, whichever group is open.
    pub fn generate_document(&self, doc: &Document) -> Result<GeneratedModule, CodegenError> {
        self.generate(&doc.metadata, &doc.root())
    }

    pub fn generate(
        &self,
        metadata: &ModuleMetadata,
        root: &Store,
    ) -> Result<GeneratedModule, CodegenError> {
        self.check_types(root)?;

        let walker = Walker::new(self.registry);
        let scope = Scope::root(root);

        let mut reserved: AHashSet<String> = ["constructor", "super"]
            .into_iter()
            .map(String::from)
            .collect();
        reserved.extend(Section::lifecycle().iter().map(|s| s.hook_name().to_string()));
        let (sections, methods) = self.emit_sections(&walker, &scope, &mut reserved)?;

        let mut routines = Vec::new();
        self.collect_routines(&walker, &scope, &mut reserved, &mut routines)?;

        let mut properties = Vec::new();
        self.collect_properties(root, &mut properties);

        let class_name = class_name(&metadata.name);
        let raw = self.assemble(
            metadata,
            &class_name,
            &sections,
            &methods,
            &routines,
            &properties,
        );
        let source = self.formatter.format(&raw);

        info!(
            class = %class_name,
            sections = sections.len(),
            routines = routines.len(),
            properties = properties.len(),
            "generated module"
        );

        let module = GeneratedModule {
            class_name,
            sections,
            methods,
            routines,
            properties,
            source,
        };

        #[cfg(feature = "debug-tools")]
        self.write_debug_dump(&module)?;

        Ok(module)
    }

    /// Every node in every nested store must have a template.
    fn check_types(&self, store: &Store) -> Result<(), CodegenError> {
        for node in store.nodes() {
            self.registry.require(node)?;
            if let Some(inner) = &node.sub_graph {
                self.check_types(inner)?;
            }
        }
        Ok(())
    }

    /// Walks every section from its anchors, in id order. The four lifecycle
    /// sections are always present; custom sections follow, sorted by name, each
    /// named after its lowest anchor id when its name is taken.
    fn emit_sections(
        &self,
        walker: &Walker<'_>,
        scope: &Scope<'_>,
        taken: &mut AHashSet<String>,
    ) -> Result<(Vec<(Section, String)>, BTreeMap<Section, String>), CodegenError> {
        let mut bodies: BTreeMap<Section, (Vec<String>, AHashSet<_>, Option<NodeId>)> =
            Section::lifecycle()
                .into_iter()
                .map(|s| (s, (Vec::new(), AHashSet::new(), None)))
                .collect();

        for node in scope.store.nodes() {
            let Some(section) = self.registry.require(node)?.anchor(node) else {
                continue;
            };
            if scope.store.has_incoming_flow(node) {
                continue;
            }
            debug!(node_id = node.id, section = section.hook_name(), "section entry");
            let (chunks, visited, _) = bodies
                .entry(section)
                .or_insert_with(|| (Vec::new(), AHashSet::new(), Some(node.id)));
            chunks.push(walker.emit_node(scope, node.id, visited)?);
        }

        let mut sections = Vec::with_capacity(bodies.len());
        let mut methods = BTreeMap::new();
        for (section, (chunks, _, anchor)) in bodies {
            let method = match (&section, anchor) {
                (Section::Custom(name), Some(anchor)) => {
                    unique_name(&identifier(name), anchor, taken)
                }
                _ => section.hook_name().to_string(),
            };
            methods.insert(section.clone(), method);
            sections.push((section, join(&chunks)));
        }
        Ok((sections, methods))
    }

    fn collect_routines(
        &self,
        walker: &Walker<'_>,
        scope: &Scope<'_>,
        taken: &mut AHashSet<String>,
        routines: &mut Vec<Routine>,
    ) -> Result<(), CodegenError> {
        for node in scope.store.nodes().filter(|n| n.is_group) {
            if !scope.store.has_incoming_flow(node) {
                let body = walker.group_body(scope, node)?;
                let name = unique_name(&identifier(node.display_name()), node.id, taken);
                debug!(group = node.id, routine = %name, "extracted routine");
                routines.push(Routine {
                    name,
                    group_id: node.id,
                    body,
                });
            }
            if let Some(inner) = scope.nested(node) {
                self.collect_routines(walker, &inner, taken, routines)?;
            }
        }
        Ok(())
    }

    /// Exposed properties of every store, first declaration of a name wins.
    fn collect_properties(&self, store: &Store, out: &mut Vec<PropertyRegistration>) {
        for node in store.nodes() {
            let registration = self
                .registry
                .get(&node.node_type)
                .and_then(|t| t.property(node));
            if let Some(registration) = registration {
                if !out.iter().any(|p| p.name == registration.name) {
                    out.push(registration);
                }
            }
            if let Some(inner) = &node.sub_graph {
                self.collect_properties(inner, out);
            }
        }
    }

    fn assemble(
        &self,
        metadata: &ModuleMetadata,
        class_name: &str,
        sections: &[(Section, String)],
        methods: &BTreeMap<Section, String>,
        routines: &[Routine],
        properties: &[PropertyRegistration],
    ) -> String {
        let mut lines: Vec<String> = Vec::new();
        let namespaced = !metadata.namespace.trim().is_empty();
        if namespaced {
            lines.push(format!("namespace {} {{", metadata.namespace.trim()));
        }
        for line in metadata.description.lines() {
            lines.push(format!("// {}", line));
        }
        lines.push(format!(
            "class {} extends {} {{",
            class_name, self.base_class
        ));
        for (flag, value) in &metadata.flags {
            lines.push(format!("static {} = {};", identifier(flag), value));
        }

        lines.push("constructor() {".to_string());
        lines.push("super();".to_string());
        for property in properties {
            lines.push(format!(
                "this.registerProperty({}, {});",
                crate::graph::node::quote(&property.name),
                property.default.to_source()
            ));
        }
        lines.push("}".to_string());

        for (section, body) in sections {
            let method = methods
                .get(section)
                .cloned()
                .unwrap_or_else(|| identifier(section.hook_name()));
            lines.push(format!("{}({}) {{", method, section.parameters()));
            lines.push(body.clone());
            lines.push("}".to_string());
        }
        for routine in routines {
            lines.push(format!("{}() {{", routine.name));
            lines.push(routine.body.clone());
            lines.push("}".to_string());
        }

        lines.push("}".to_string());
        if namespaced {
            lines.push("}".to_string());
        }
        lines.join("\n")
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_dump(&self, module: &GeneratedModule) -> Result<(), CodegenError> {
        fs::create_dir_all("tmp").map_err(|e| {
            CodegenError::DebugOutput(format!("Failed to create debug directory: {}", e))
        })?;
        for (section, body) in &module.sections {
            let path = format!("tmp/{}_{}.txt", module.class_name, section.hook_name());
            fs::write(&path, body)
                .map_err(|e| CodegenError::DebugOutput(format!("{}: {}", path, e)))?;
        }
        let path = format!("tmp/{}_module.txt", module.class_name);
        fs::write(&path, &module.source)
            .map_err(|e| CodegenError::DebugOutput(format!("{}: {}", path, e)))
    }
}

/// Turns arbitrary text into an identifier: other characters become `_`.
pub fn identifier(text: &str) -> String {
    let mut out: String = text
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().is_none_or(|c| c.is_numeric()) {
        out.insert(0, '_');
    }
    out
}

fn class_name(module_name: &str) -> String {
    if module_name.trim().is_empty() {
        "Module".to_string()
    } else {
        identifier(module_name)
    }
}

/// The first free name of `base`, `base_<id>`, `base_<id>_2`, `base_<id>_3`, ...
fn unique_name(base: &str, id: NodeId, taken: &mut AHashSet<String>) -> String {
    let mut name = base.to_string();
    let mut attempt = 1;
    while taken.contains(&name) {
        name = if attempt == 1 {
            format!("{}_{}", base, id)
        } else {
            format!("{}_{}_{}", base, id, attempt)
        };
        attempt += 1;
    }
    taken.insert(name.clone());
    name
}
