//! Tests for group navigation, boundary pseudo-nodes and project files.
mod common;
use common::*;
use kumiki::graph::{GROUP_INPUT_TYPE, GROUP_OUTPUT_TYPE};
use kumiki::group::boundary_node;
use kumiki::prelude::*;
use kumiki::project::NodeDto;

fn count_type(store: &Store, node_type: &str) -> usize {
    store.nodes().filter(|n| n.node_type == node_type).count()
}

#[test]
fn test_open_is_idempotent() {
    let mut doc = Document::new(ModuleMetadata::new("Player"));
    doc.store_mut()
        .add_node(Node::group(1, "Body", vec![FLOW.into()], vec![FLOW.into()]))
        .unwrap();

    let first = doc.open_group(1).unwrap();
    assert_eq!(first.input, Some(1));
    assert_eq!(first.output, Some(2));
    assert!(doc.close_group());

    for _ in 0..3 {
        let again = doc.open_group(1).unwrap();
        assert_eq!(again, first);
        assert_eq!(doc.store().len(), 2);
        assert_eq!(count_type(doc.store(), GROUP_INPUT_TYPE), 1);
        assert_eq!(count_type(doc.store(), GROUP_OUTPUT_TYPE), 1);
        doc.close_group();
    }
}

#[test]
fn test_boundary_follows_flow_ports() {
    let mut doc = Document::new(ModuleMetadata::new("Player"));
    let store = doc.store_mut();
    store
        .add_node(Node::group(1, "Source", Vec::new(), vec![FLOW.into()]))
        .unwrap();
    store
        .add_node(Node::group(2, "Pure", vec!["value".into()], vec!["result".into()]))
        .unwrap();

    let boundary = doc.open_group(1).unwrap();
    assert_eq!(boundary.input, None);
    assert!(boundary.output.is_some());
    doc.close_group();

    assert_eq!(doc.open_group(2).unwrap(), Boundary::default());
    assert!(doc.store().is_empty());
}

#[test]
fn test_duplicate_boundary_nodes_are_repaired() {
    let mut doc = Document::new(ModuleMetadata::new("Player"));
    doc.store_mut()
        .add_node(Node::group(1, "Body", vec![FLOW.into()], Vec::new()))
        .unwrap();
    doc.open_group(1).unwrap();
    assert_eq!(
        doc.store_mut().add_node(boundary_node(7, GROUP_INPUT_TYPE)),
        Err(GraphError::MisplacedBoundaryNode {
            node_id: 7,
            node_type: GROUP_INPUT_TYPE.to_string(),
        })
    );
    doc.close_group();

    // A hand-edited project file is the only way duplicates reach a nested store.
    let mut project = ProjectFile::from_document(&doc);
    let body = project.nodes[0].sub_graph.as_mut().unwrap();
    body.nodes.push(NodeDto::from(&boundary_node(7, GROUP_INPUT_TYPE)));
    body.nodes.push(NodeDto::from(&boundary_node(8, GROUP_OUTPUT_TYPE)));
    let mut doc = project.into_document().unwrap();
    assert_eq!(doc.root().node(1).and_then(|g| g.sub_graph.as_ref()).map(Store::len), Some(3));

    let boundary = doc.open_group(1).unwrap();
    assert_eq!(boundary.input, Some(1));
    assert_eq!(boundary.output, None);
    assert_eq!(doc.store().len(), 1);
}

#[test]
fn test_open_rejects_missing_and_plain_nodes() {
    let registry = TemplateRegistry::standard();
    let mut doc = Document::new(ModuleMetadata::new("Player"));
    place(&registry, doc.store_mut(), 1, "log");
    let before = doc.clone();

    assert_eq!(doc.open_group(1), Err(GraphError::NotAGroup(1)));
    assert_eq!(doc.open_group(5), Err(GraphError::NodeNotFound(5)));
    assert_eq!(doc, before);
    assert!(!doc.close_group());
}

#[test]
fn test_boundary_nodes_cannot_be_deleted() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    let boundary = doc.open_group(2).unwrap();
    let input = boundary.input.unwrap();
    let inner = doc.store().clone();

    assert_eq!(
        doc.store_mut().remove_node(input),
        Err(GraphError::ProtectedNode {
            node_id: input,
            node_type: GROUP_INPUT_TYPE.to_string(),
        })
    );
    assert_eq!(doc.store(), &inner);

    doc.store_mut().remove_node(3).unwrap();
    assert!(doc.store().connections().is_empty());
    assert_eq!(doc.store().len(), 2);
}

#[test]
fn test_close_and_reopen_keeps_boundary_wiring() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, false);

    doc.open_group(2).unwrap();
    let wiring = doc.store().connections().to_vec();
    assert_eq!(wiring.len(), 2);
    doc.close_group();

    doc.open_group(2).unwrap();
    assert_eq!(doc.store().connections(), wiring.as_slice());
}

#[test]
fn test_nested_navigation_and_viewports() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    doc.viewport = Viewport {
        pan_offset: [120.0, -40.0],
        zoom: 1.5,
    };
    let root_viewport = doc.viewport;

    doc.open_group(2).unwrap();
    assert_eq!(doc.viewport, Viewport::default());
    doc.store_mut()
        .add_node(Node::group(4, "Inner", Vec::new(), Vec::new()))
        .unwrap();
    doc.viewport.zoom = 0.5;
    doc.open_group(4).unwrap();

    assert_eq!(doc.group_path(), vec![2, 4]);
    assert_eq!(doc.group_depth(), 2);
    assert_eq!(doc.current_group().map(|g| g.display_name()), Some("Inner"));

    assert!(doc.close_group());
    assert_eq!(doc.viewport.zoom, 0.5);
    doc.open_group(4).unwrap();

    doc.close_all_groups();
    assert_eq!(doc.group_depth(), 0);
    assert_eq!(doc.viewport, root_viewport);
    assert!(doc.store().contains(3));
}

#[test]
fn test_root_includes_open_group_edits() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    doc.open_group(2).unwrap();
    place(&registry, doc.store_mut(), 4, "log");

    let root = doc.root();
    let inner = root
        .node(2)
        .and_then(|g| g.sub_graph.as_ref())
        .expect("group keeps its store in the assembled root");
    assert!(inner.contains(4));
    assert_eq!(root.len(), 3);
}

#[test]
fn test_set_group_ports_reconciles_boundary() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);

    let boundary = doc
        .set_group_ports(2, vec!["value".into()], vec![FLOW.into()])
        .unwrap();
    assert_eq!(boundary.input, None);
    assert_eq!(boundary.output, Some(2));

    // The flow from on-start no longer fits the group's first input.
    let root = doc.store();
    assert_eq!(root.connections().len(), 1);
    assert_eq!(root.connections()[0].from.node, 2);

    let inner = root.node(2).and_then(|g| g.sub_graph.as_ref()).unwrap();
    assert_eq!(count_type(inner, GROUP_INPUT_TYPE), 0);
    assert_eq!(inner.connections().len(), 1);

    let boundary = doc
        .set_group_ports(2, vec![FLOW.into()], vec![FLOW.into()])
        .unwrap();
    assert_eq!(boundary.input, Some(4));

    assert_eq!(
        doc.set_group_ports(1, Vec::new(), Vec::new()),
        Err(GraphError::NotAGroup(1))
    );
}

#[test]
fn test_project_json_round_trip() {
    let registry = TemplateRegistry::standard();
    let mut doc = create_group_document(&registry, true);
    doc.metadata = ModuleMetadata::new("Spawner")
        .with_namespace("Game")
        .with_description("Spawns things")
        .with_flag("debug", false);
    doc.viewport.zoom = 2.0;

    let json = ProjectFile::from_document(&doc).to_json().unwrap();
    assert!(json.contains("\"groupBoundaryConnections\""));
    assert!(json.contains("\"moduleNamespace\": \"Game\""));
    assert!(json.contains("\"type\": \"group-input\""));

    let restored = ProjectFile::from_json(&json)
        .unwrap()
        .into_document()
        .unwrap();
    assert_eq!(restored, doc);
    assert_eq!(bytes_of(&restored), bytes_of(&doc));
}

#[test]
fn test_project_save_and_load_from_disk() {
    let registry = TemplateRegistry::standard();
    let doc = create_group_document(&registry, false);
    let path = std::env::temp_dir().join("kumiki_group_project.json");
    let path = path.to_str().unwrap();

    ProjectFile::from_document(&doc).save(path).unwrap();
    let restored = ProjectFile::from_file(path).unwrap().into_document().unwrap();
    assert_eq!(restored.root(), doc.root());

    let _ = std::fs::remove_file(path);
    assert!(matches!(
        ProjectFile::from_file(path),
        Err(ProjectError::Io(_))
    ));
}
