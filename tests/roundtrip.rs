//! Tests for graph scripts and the transactional round-trip loader.
mod common;
use common::*;
use kumiki::prelude::*;
use kumiki::script::{Interpreter, MutationApi, parse};
use pretty_assertions::assert_eq;
use std::result::Result;

fn load(
    registry: &TemplateRegistry,
    doc: &mut Document,
    history: &mut History,
    text: &str,
) -> Result<LoadReport, LoadError> {
    RoundTripLoader::new(registry).load_from_text(doc, history, text)
}

#[test]
fn test_exported_script_reloads_isomorphic_graph() {
    let registry = TemplateRegistry::standard();
    let mut source = create_group_document(&registry, true);
    source.metadata = ModuleMetadata::new("Spawner")
        .with_namespace("Game")
        .with_description("Spawns \"things\"\nevery frame")
        .with_flag("debug", true);
    let text = RoundTripLoader::new(&registry).export_text(&source);

    let mut doc = Document::default();
    let mut history = History::new(&doc).unwrap();
    let report = load(&registry, &mut doc, &mut history, &text).expect("Failed to load");

    assert_eq!(report.replaced_nodes, 0);
    assert_eq!(report.stats.nodes, 6);
    assert_eq!(report.stats.groups, 1);
    assert_eq!(report.stats.connections, 4);

    assert_eq!(doc.metadata, source.metadata);
    assert_eq!(doc.store(), source.store());
    assert_eq!(RoundTripLoader::new(&registry).export_text(&doc), text);
    assert_eq!(history.len(), 2);
}

#[test]
fn test_exported_script_shape() {
    let registry = TemplateRegistry::standard();
    let store = create_property_store(&registry);
    let text = write_script(&ModuleMetadata::new("Player").with_flag("debug", false), &store);

    let expected = r#"module "Player";
flag debug = false;

node 1 "on-start" at (200, 0);
node 2 "set-property" at (400, 0) {
    expose = true;
    name = "speed";
    value = 5;
}
connect 1:0 -> 2:0;
"#;
    assert_eq!(text, expected);
}

#[test]
fn test_exported_script_reloads_unusual_names_and_numbers() {
    let registry = TemplateRegistry::standard();
    let mut source = Document::new(
        ModuleMetadata::new("Odd")
            .with_flag("my flag", true)
            .with_flag("size", false),
    );
    {
        let store = source.store_mut();
        place(&registry, store, 1, "number");
        store.set_field(1, "value", f64::INFINITY).unwrap();
        place(&registry, store, 2, "vector3");
        store.set_field(2, "x", f64::NEG_INFINITY).unwrap();
        store.set_field(2, "size", 1).unwrap();
        store.set_field(2, "my field", "at").unwrap();
        store.set_field(2, "true", false).unwrap();
        store
            .add_node(Node::group(3, "Body", Vec::new(), Vec::new()))
            .unwrap();
        store.set_field(3, "description", "inner").unwrap();
        store.set_field(3, "inputs", vec![1.0, f64::INFINITY]).unwrap();
    }
    let loader = RoundTripLoader::new(&registry);
    let text = loader.export_text(&source);
    assert!(text.contains("flag \"my flag\" = true;"));
    assert!(text.contains("value = inf;"));
    assert!(text.contains("x = -inf;"));
    assert!(text.contains("\"size\" = 1;"));
    assert!(text.contains("\"my field\" = \"at\";"));

    let mut doc = Document::default();
    let mut history = History::new(&doc).unwrap();
    load(&registry, &mut doc, &mut history, &text).expect("Failed to reload");

    assert_eq!(doc.metadata, source.metadata);
    assert_eq!(doc.store(), source.store());
    assert_eq!(loader.export_text(&doc), text);
}

#[test]
fn test_exported_script_reloads_nan() {
    let registry = TemplateRegistry::standard();
    let mut source = Document::new(ModuleMetadata::new("Odd"));
    place(&registry, source.store_mut(), 1, "number");
    source.store_mut().set_field(1, "value", f64::NAN).unwrap();
    let loader = RoundTripLoader::new(&registry);
    let text = loader.export_text(&source);
    assert!(text.contains("value = nan;"));

    let mut doc = Document::default();
    let mut history = History::new(&doc).unwrap();
    load(&registry, &mut doc, &mut history, &text).expect("Failed to reload");

    let value = doc.store().node(1).and_then(|n| n.field("value"));
    assert!(matches!(value, Some(FieldValue::Number(n)) if n.is_nan()));
    assert_eq!(loader.export_text(&doc), text);
}

#[test]
fn test_round_trip_preserves_generated_source() {
    let registry = TemplateRegistry::standard();
    let generator = CodeGenerator::new(&registry);
    for source in [
        Document::from_parts(
            ModuleMetadata::new("Sum"),
            Viewport::default(),
            create_sum_store(&registry),
        ),
        create_group_document(&registry, false),
    ] {
        let text = RoundTripLoader::new(&registry).export_text(&source);
        let mut doc = Document::default();
        let mut history = History::new(&doc).unwrap();
        load(&registry, &mut doc, &mut history, &text).unwrap();

        assert_eq!(
            generator.generate_document(&doc).unwrap().source,
            generator.generate_document(&source).unwrap().source
        );
    }
}

#[test]
fn test_load_replaces_active_store_and_is_undoable() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::from_parts(
        ModuleMetadata::new("Player"),
        Viewport::default(),
        create_chain_store(&registry),
    );
    let mut history = History::new(&doc).unwrap();
    let before = bytes_of(&doc);

    let text = write_script(&doc.metadata, &create_property_store(&registry));
    let report = load(&registry, &mut doc, &mut history, &text).unwrap();
    assert_eq!(report.replaced_nodes, 3);
    assert_eq!(doc.store(), &create_property_store(&registry));

    assert!(history.undo(&mut doc).unwrap());
    assert_eq!(bytes_of(&doc), before);
}

#[test]
fn test_failed_script_rolls_back_exactly() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::from_parts(
        ModuleMetadata::new("Player").with_flag("debug", true),
        Viewport::default(),
        create_property_store(&registry),
    );
    let mut history = History::new(&doc).unwrap();
    let before = bytes_of(&doc);

    let text = "module \"Broken\";\nnode 9 \"log\";\nconnect 9:0 -> 42:0;\n";
    let err = load(&registry, &mut doc, &mut history, text).unwrap_err();

    assert_eq!(
        err,
        LoadError::Script(ScriptError::Connect {
            line: 3,
            source: ConnectError::NodeNotFound(42),
        })
    );
    assert_eq!(bytes_of(&doc), before);
    assert_eq!(doc.metadata.name, "Player");
    assert_eq!(history.len(), 1);
}

#[test]
fn test_runtime_failures_are_reported_by_line() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::new(ModuleMetadata::new("Player"));
    let mut history = History::new(&doc).unwrap();
    let before = bytes_of(&doc);

    let cases = [
        (
            "node 1 \"log\";\nnode 1 \"log\";",
            ScriptError::Graph {
                line: 2,
                source: GraphError::DuplicateNodeId(1),
            },
        ),
        (
            "node 1 \"on-start\";\nnode 2 \"log\";\nconnect 1:0 -> 2:1;",
            ScriptError::Connect {
                line: 3,
                source: ConnectError::KindMismatch {
                    output: PortKind::Flow,
                    input: PortKind::Data,
                },
            },
        ),
        (
            "node 1 \"teleport\";",
            ScriptError::UnknownNodeType {
                line: 1,
                type_name: "teleport".to_string(),
            },
        ),
    ];

    for (text, expected) in cases {
        let err = load(&registry, &mut doc, &mut history, text).unwrap_err();
        assert_eq!(err, LoadError::Script(expected));
        assert_eq!(bytes_of(&doc), before);
    }
}

#[test]
fn test_failure_inside_group_body_rolls_back() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    let mut history = History::new(&doc).unwrap();
    let before = bytes_of(&doc);

    let text = r#"node 1 "on-start";
group 5 "Broken" inputs ["flow"] outputs ["flow"] {
    node 1 "group-input";
    node 2 "warp";
}
"#;
    let err = load(&registry, &mut doc, &mut history, text).unwrap_err();
    assert_eq!(
        err,
        LoadError::Script(ScriptError::UnknownNodeType {
            line: 4,
            type_name: "warp".to_string(),
        })
    );
    assert_eq!(bytes_of(&doc), before);
    assert_eq!(doc.group_depth(), 0);
}

#[test]
fn test_boundary_nodes_only_load_inside_matching_groups() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::from_parts(
        ModuleMetadata::new("Player"),
        Viewport::default(),
        create_chain_store(&registry),
    );
    let mut history = History::new(&doc).unwrap();
    let before = bytes_of(&doc);

    let misplaced = |line, node_id, node_type: &str| {
        LoadError::Script(ScriptError::Graph {
            line,
            source: GraphError::MisplacedBoundaryNode {
                node_id,
                node_type: node_type.to_string(),
            },
        })
    };
    let cases = [
        (
            "node 1 \"group-input\";\nnode 2 \"group-input\";",
            misplaced(1, 1, "group-input"),
        ),
        (
            "group 1 \"Source\" inputs [] outputs [\"flow\"] {\n    node 1 \"group-input\";\n}",
            misplaced(2, 1, "group-input"),
        ),
        (
            "group 1 \"Body\" inputs [\"flow\"] outputs [] {\n    node 1 \"group-input\";\n    node 2 \"group-input\";\n}",
            misplaced(3, 2, "group-input"),
        ),
    ];
    for (text, expected) in cases {
        assert_eq!(load(&registry, &mut doc, &mut history, text), Err(expected));
        assert_eq!(bytes_of(&doc), before);
    }
    assert_eq!(history.len(), 1);
}

#[test]
fn test_syntax_error_leaves_document_untouched() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::from_parts(
        ModuleMetadata::new("Player"),
        Viewport::default(),
        create_chain_store(&registry),
    );
    let mut history = History::new(&doc).unwrap();
    let before = doc.clone();

    let err = load(&registry, &mut doc, &mut history, "node 1 \"log\" at (0 0);").unwrap_err();
    match err {
        LoadError::Script(ScriptError::Syntax { line, message, .. }) => {
            assert_eq!(line, 1);
            assert!(message.starts_with("expected ','"), "{}", message);
        }
        other => panic!("Expected a syntax error, got {:?}", other),
    }
    assert_eq!(doc, before);
    assert_eq!(history.len(), 1);
}

#[test]
fn test_load_into_open_group_creates_boundary() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    doc.open_group(2).unwrap();
    let mut history = History::new(&doc).unwrap();

    let text = "# body only\nnode 3 \"log\" {\n    message = \"inside\";\n}\n";
    load(&registry, &mut doc, &mut history, text).unwrap();

    assert_eq!(doc.group_path(), vec![2]);
    assert_eq!(doc.metadata.name, "Spawner");
    let store = doc.store();
    assert_eq!(store.len(), 3);
    assert_eq!(
        store.node(3).and_then(|n| n.field("message")),
        Some(&FieldValue::from("inside"))
    );
    assert_eq!(store.nodes().filter(|n| n.is_boundary()).count(), 2);
}

#[test]
fn test_open_group_export_reloads_in_place() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    doc.open_group(2).unwrap();
    let inner = doc.store().clone();
    let mut history = History::new(&doc).unwrap();

    let loader = RoundTripLoader::new(&registry);
    let text = loader.export_text(&doc);
    assert!(text.contains("node 1 \"group-input\""));
    loader
        .load_from_text(&mut doc, &mut history, &text)
        .expect("Failed to reload the group body");

    assert_eq!(doc.group_path(), vec![2]);
    assert_eq!(doc.store(), &inner);
}

#[test]
fn test_nodes_without_placement_get_default_positions() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::default();
    let mut history = History::new(&doc).unwrap();

    load(
        &registry,
        &mut doc,
        &mut history,
        "node 1 \"on-start\";\nnode 2 \"log\" size (200, 80);",
    )
    .unwrap();

    let store = doc.store();
    assert_eq!(store.node(1).unwrap().position, Position::new(200.0, 0.0));
    assert_eq!(store.node(2).unwrap().position, Position::new(420.0, 0.0));
    assert_eq!(store.node(2).unwrap().size, Size::new(200.0, 80.0));
}

/// Records every call a script makes.
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl MutationApi for Recorder {
    fn set_module_name(&mut self, name: &str) {
        self.calls.push(format!("module {}", name));
    }
    fn set_namespace(&mut self, namespace: &str) {
        self.calls.push(format!("namespace {}", namespace));
    }
    fn set_description(&mut self, description: &str) {
        self.calls.push(format!("description {}", description));
    }
    fn set_flag(&mut self, name: &str, value: bool) {
        self.calls.push(format!("flag {}={}", name, value));
    }
    fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        self.calls.push(format!("node {} {}", node.id, node.node_type));
        Ok(node.id)
    }
    fn add_connection(&mut self, from: PortRef, to: PortRef) -> Result<Connection, ConnectError> {
        self.calls
            .push(format!("connect {}:{} {}:{}", from.node, from.index, to.node, to.index));
        Ok(Connection::new(
            Endpoint::new(from.node, from.index),
            Endpoint::new(to.node, to.index),
        ))
    }
    fn enter_group(&mut self, group_id: NodeId) -> Result<(), GraphError> {
        self.calls.push(format!("enter {}", group_id));
        Ok(())
    }
    fn exit_group(&mut self) {
        self.calls.push("exit".to_string());
    }
}

#[test]
fn test_scripts_only_reach_the_mutation_api() {
    let registry = TemplateRegistry::standard();
    let script = parse(
        r#"module "Player";
namespace "Game";
flag debug = true;
group 1 "Body" inputs ["flow"] outputs [] {
    node 1 "group-input";
    node 2 "log";
    connect 1:0 -> 2:0;
}
"#,
    )
    .unwrap();

    let mut recorder = Recorder::default();
    let stats = Interpreter::new(&registry).run(&script, &mut recorder).unwrap();
    assert_eq!(stats.nodes, 3);
    assert_eq!(
        recorder.calls,
        vec![
            "module Player",
            "namespace Game",
            "flag debug=true",
            "node 1 group",
            "enter 1",
            "node 1 group-input",
            "node 2 log",
            "connect 1:0 2:0",
            "exit",
        ]
    );
}
