use clap::{Parser, Subcommand};
use kumiki::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Compile node-graph projects into behavior modules and round-trip graph scripts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `kumiki=trace` (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate module source from a project file
    Generate {
        /// Path to the project JSON file
        project: String,
        /// Write the source here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Base class the generated module extends
        #[arg(long, default_value = "Behavior")]
        base_class: String,
    },
    /// Export a project's root graph as a graph script
    Script {
        project: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Load a graph script into a project and save the result
    Load {
        /// Project to load into; a new project is started when it does not exist
        project: String,
        /// Path to the graph script
        script: String,
        /// Where to save the project (defaults to overwriting `project`)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Parse and run a graph script against an empty project, then report
    Check { script: String },
}

fn main() {
    let cli = Cli::parse();

    let filter = match &cli.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = TemplateRegistry::standard();
    match cli.command {
        Command::Generate {
            project,
            output,
            base_class,
        } => run_generate(&registry, &project, output, &base_class),
        Command::Script { project, output } => run_script(&project, output),
        Command::Load {
            project,
            script,
            output,
        } => run_load(&registry, &project, &script, output),
        Command::Check { script } => run_check(&registry, &script),
    }
}

fn run_generate(registry: &TemplateRegistry, project: &str, output: Option<String>, base: &str) {
    let start = Instant::now();
    let doc = load_project(project);
    let generator = CodeGenerator::builder(registry)
        .with_base_class(base)
        .build();
    let module = generator
        .generate_document(&doc)
        .unwrap_or_else(|e| exit_with_error(&format!("Generation failed: {}", e)));

    write_output(output.as_deref(), &module.source);
    eprintln!(
        "Generated '{}': {} section(s), {} routine(s), {} property registration(s) in {:?}",
        module.class_name,
        module.sections.len(),
        module.routines.len(),
        module.properties.len(),
        start.elapsed()
    );
}

fn run_script(project: &str, output: Option<String>) {
    let doc = load_project(project);
    write_output(output.as_deref(), &write_script(&doc.metadata, &doc.root()));
}

fn run_load(registry: &TemplateRegistry, project: &str, script: &str, output: Option<String>) {
    let mut doc = if fs::metadata(project).is_ok() {
        load_project(project)
    } else {
        eprintln!("Project '{}' not found. Starting a new project.", project);
        Document::default()
    };
    let text = fs::read_to_string(script)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read script '{}': {}", script, e)));
    let mut history = History::new(&doc)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to snapshot project: {}", e)));

    let report = RoundTripLoader::new(registry)
        .load_from_text(&mut doc, &mut history, &text)
        .unwrap_or_else(|e| exit_with_error(&format!("Script rejected, project unchanged: {}", e)));

    let target = output.unwrap_or_else(|| project.to_string());
    ProjectFile::from_document(&doc)
        .save(&target)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to save project: {}", e)));
    eprintln!(
        "Loaded {} node(s), {} group(s), {} connection(s) into '{}' (replaced {} node(s))",
        report.stats.nodes,
        report.stats.groups,
        report.stats.connections,
        target,
        report.replaced_nodes
    );
}

fn run_check(registry: &TemplateRegistry, script: &str) {
    let text = fs::read_to_string(script)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read script '{}': {}", script, e)));
    let mut doc = Document::default();
    let mut history = History::new(&doc)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to snapshot project: {}", e)));
    let report = RoundTripLoader::new(registry)
        .load_from_text(&mut doc, &mut history, &text)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let module = CodeGenerator::new(registry)
        .generate_document(&doc)
        .unwrap_or_else(|e| exit_with_error(&format!("Generation failed: {}", e)));

    println!("Script OK: module '{}'", module.class_name);
    println!("  Nodes:       {}", report.stats.nodes);
    println!("  Groups:      {}", report.stats.groups);
    println!("  Connections: {}", report.stats.connections);
    println!("  Routines:    {}", module.routines.len());
    println!("  Properties:  {}", module.properties.len());
}

fn load_project(path: &str) -> Document {
    ProjectFile::from_file(path)
        .and_then(ProjectFile::into_document)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load project '{}': {}", path, e)))
}

fn write_output(path: Option<&str>, text: &str) {
    match path {
        Some(path) => fs::write(path, text)
            .unwrap_or_else(|e| exit_with_error(&format!("Could not write '{}': {}", path, e))),
        None => println!("{}", text),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
