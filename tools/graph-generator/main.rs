use clap::Parser;
use kumiki::group::ensure_boundary;
use kumiki::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;

/// A CLI tool to generate random acyclic graph projects for round-trip testing
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated project JSON to
    #[arg(short, long, default_value = "generated_project.json")]
    output: String,

    /// Also write the project's graph script to this path
    #[arg(long)]
    script: Option<String>,

    /// Number of flow statements per lifecycle chain
    #[arg(long, default_value_t = 8)]
    length: usize,

    /// Number of unconnected groups (emitted as routines)
    #[arg(long, default_value_t = 1)]
    groups: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

const ANCHORS: [&str; 4] = ["on-start", "on-update", "on-render", "on-destroy"];
const OPERATORS: [&str; 4] = ["add", "subtract", "multiply", "greater"];

struct Builder<'a> {
    registry: &'a TemplateRegistry,
    store: Store,
    rng: StdRng,
}

impl Builder<'_> {
    fn place(&mut self, node_type: &str) -> Result<NodeId> {
        let id = self.store.next_node_id();
        let position = Position::new(
            self.rng.random_range(0.0..2000.0_f64).round(),
            self.rng.random_range(0.0..1200.0_f64).round(),
        );
        let node = self
            .registry
            .instantiate(node_type, id, position)
            .ok_or_else(|| format!("no template for '{}'", node_type))?;
        Ok(self.store.add_node(node)?)
    }

    /// A small pure expression tree feeding `target`'s data input.
    fn expression_into(&mut self, target: NodeId, input: usize) -> Result<()> {
        let choice = self.rng.random_range(0..OPERATORS.len());
        let op = self.place(OPERATORS[choice])?;
        for port in 0..2 {
            let literal = self.place("number")?;
            let value: i32 = self.rng.random_range(-100..=100);
            self.store.set_field(literal, "value", value)?;
            self.store
                .add_connection(PortRef::output(literal, 0), PortRef::input(op, port))?;
        }
        self.store
            .add_connection(PortRef::output(op, 0), PortRef::input(target, input))?;
        Ok(())
    }

    /// A flow chain starting at `from`'s output `port`, `length` statements long.
    fn chain(&mut self, mut from: NodeId, mut port: usize, length: usize) -> Result<()> {
        for step in 0..length {
            let next = if self.rng.random_bool(0.7) {
                let id = self.place("set-property")?;
                self.store.set_field(id, "name", format!("value{}", step))?;
                let expose = self.rng.random_bool(0.3);
                self.store.set_field(id, "expose", expose)?;
                self.expression_into(id, 1)?;
                id
            } else {
                let id = self.place("log")?;
                self.store
                    .set_field(id, "message", format!("step {}", step))?;
                id
            };
            self.store
                .add_connection(PortRef::output(from, port), PortRef::input(next, 0))?;
            from = next;
            port = 0;
        }
        Ok(())
    }

    fn group(&mut self, index: usize, length: usize) -> Result<()> {
        let id = self.store.next_node_id();
        let mut group = Node::group(
            id,
            &format!("Routine{}", index),
            vec!["flow".to_string()],
            vec!["flow".to_string()],
        );
        let mut inner = Builder {
            registry: self.registry,
            store: Store::new(),
            rng: StdRng::seed_from_u64(self.rng.random()),
        };
        let boundary = ensure_boundary(&mut inner.store, &group);
        let input = boundary.input.ok_or("group without a flow input")?;
        inner.chain(input, 0, length)?;
        group.sub_graph = Some(inner.store);
        group.position = Position::new(200.0 * index as f64, 1400.0);
        self.store.add_node(group)?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = TemplateRegistry::standard();
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating project ({} statement(s) per chain, {} group(s))...",
        cli.length, cli.groups
    );

    let mut builder = Builder {
        registry: &registry,
        store: Store::new(),
        rng,
    };
    for anchor in ANCHORS {
        let id = builder.place(anchor)?;
        builder.chain(id, 0, cli.length)?;
        println!("-> Generated '{}' chain.", anchor);
    }
    for index in 0..cli.groups {
        builder.group(index, cli.length / 2 + 1)?;
    }

    let metadata = ModuleMetadata::new("Generated").with_description("Random round-trip fixture");
    let doc = Document::from_parts(metadata, Viewport::default(), builder.store);
    ProjectFile::from_document(&doc).save(&cli.output)?;
    println!("Successfully saved project to '{}'", cli.output);

    if let Some(path) = cli.script {
        fs::write(&path, write_script(&doc.metadata, doc.store()))?;
        println!("Successfully saved graph script to '{}'", path);
    }
    Ok(())
}
