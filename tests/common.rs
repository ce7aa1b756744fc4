//! Common test utilities for building graphs and documents.
use kumiki::prelude::*;

/// Places a node from the standard templates at a fixed spot.
#[allow(dead_code)]
pub fn place(registry: &TemplateRegistry, store: &mut Store, id: NodeId, node_type: &str) {
    let node = registry
        .instantiate(node_type, id, Position::new(f64::from(id) * 200.0, 0.0))
        .unwrap_or_else(|| panic!("no template for '{}'", node_type));
    store.add_node(node).expect("Failed to add node");
}

/// Connects output `from_port` of `from` to input `to_port` of `to`.
#[allow(dead_code)]
pub fn wire(store: &mut Store, from: NodeId, from_port: usize, to: NodeId, to_port: usize) {
    store
        .add_connection(PortRef::output(from, from_port), PortRef::input(to, to_port))
        .expect("Failed to connect");
}

/// Creates the store of the basic property scenario.
///
/// Logic: `on-start -> set-property(speed = 5, exposed)`
#[allow(dead_code)]
pub fn create_property_store(registry: &TemplateRegistry) -> Store {
    let mut store = Store::new();
    place(registry, &mut store, 1, "on-start");
    place(registry, &mut store, 2, "set-property");
    store.set_field(2, "name", "speed").unwrap();
    store.set_field(2, "value", 5).unwrap();
    store.set_field(2, "expose", true).unwrap();
    wire(&mut store, 1, 0, 2, 0);
    store
}

/// Creates a store whose init section sums two literals.
///
/// Logic: `on-start -> set-property(total = 3 + 4)`
#[allow(dead_code)]
pub fn create_sum_store(registry: &TemplateRegistry) -> Store {
    let mut store = Store::new();
    place(registry, &mut store, 1, "on-start");
    place(registry, &mut store, 2, "set-property");
    store.set_field(2, "name", "total").unwrap();
    place(registry, &mut store, 3, "number");
    store.set_field(3, "value", 3).unwrap();
    place(registry, &mut store, 4, "number");
    store.set_field(4, "value", 4).unwrap();
    place(registry, &mut store, 5, "add");

    wire(&mut store, 1, 0, 2, 0);
    wire(&mut store, 3, 0, 5, 0);
    wire(&mut store, 4, 0, 5, 1);
    wire(&mut store, 5, 0, 2, 1);
    store
}

/// Creates a three-node flow chain `1 -> 2 -> 3`.
#[allow(dead_code)]
pub fn create_chain_store(registry: &TemplateRegistry) -> Store {
    let mut store = Store::new();
    place(registry, &mut store, 1, "on-start");
    place(registry, &mut store, 2, "log");
    place(registry, &mut store, 3, "log");
    wire(&mut store, 1, 0, 2, 0);
    wire(&mut store, 2, 0, 3, 0);
    store
}

/// Creates a document whose root holds a group with a populated body.
///
/// Root: `on-start(1) -> group "Spawn"(2) -> log "done"(3)`.
/// Body: `GroupInput(1) -> set-property(hp = 10)(3) -> GroupOutput(2)`.
#[allow(dead_code)]
pub fn create_group_document(registry: &TemplateRegistry, connected: bool) -> Document {
    let mut doc = Document::new(ModuleMetadata::new("Spawner"));
    {
        let store = doc.store_mut();
        place(registry, store, 1, "on-start");
        let group = Node::group(2, "Spawn", vec![FLOW.into()], vec![FLOW.into()]).at(400.0, 0.0);
        store.add_node(group).unwrap();
        place(registry, store, 3, "log");
        store.set_field(3, "message", "done").unwrap();
        if connected {
            wire(store, 1, 0, 2, 0);
            wire(store, 2, 0, 3, 0);
        }
    }

    let boundary = doc.open_group(2).expect("Failed to open group");
    let input = boundary.input.expect("group has a flow input");
    let output = boundary.output.expect("group has a flow output");
    {
        let inner = doc.store_mut();
        place(registry, inner, 3, "set-property");
        inner.set_field(3, "name", "hp").unwrap();
        inner.set_field(3, "value", 10).unwrap();
        wire(inner, input, 0, 3, 0);
        wire(inner, 3, 0, output, 0);
    }
    assert!(doc.close_group());
    doc
}

/// A snapshot of `doc`, for byte-for-byte comparisons.
#[allow(dead_code)]
pub fn bytes_of(doc: &Document) -> Vec<u8> {
    Snapshot::capture(doc)
        .expect("Failed to capture snapshot")
        .as_bytes()
        .to_vec()
}
