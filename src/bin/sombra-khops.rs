//! Command-line front end for k-hop neighborhood counts over CSV edge lists.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sombra_khops::{
    cli::{load_graph, CliConfig, EdgeImportConfig, ImportSummary, NodeImportConfig},
    EngineKind, KhopsRequest, NodeId,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sombra-khops",
    version,
    about = "Count k-hop neighborhoods in a graph loaded from CSV",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SOMBRA_KHOPS_CONFIG",
        help = "Config file (defaults to <config dir>/sombra/khops.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Tracing filter for stderr logs, e.g. 'debug' or 'sombra_khops=trace'"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[arg(value_name = "EDGES", help = "CSV file containing edges")]
    edges: PathBuf,

    #[arg(long, value_name = "FILE", help = "CSV file listing nodes, including isolated ones")]
    nodes: Option<PathBuf>,

    #[arg(long, help = "Edge source column name")]
    edge_src_column: Option<String>,

    #[arg(long, help = "Edge destination column name")]
    edge_dst_column: Option<String>,

    #[arg(long, help = "Edge type column name")]
    edge_type_column: Option<String>,

    #[arg(long, help = "Static edge type applied to every row")]
    edge_type: Option<String>,

    #[arg(long, help = "Node id column name")]
    node_id_column: Option<String>,
}

#[derive(Args, Debug)]
struct CountCmd {
    #[command(flatten)]
    graph: GraphArgs,

    #[arg(long, value_name = "ID", help = "Start node id")]
    start: u64,

    #[arg(
        long,
        default_value_t = 1,
        allow_negative_numbers = true,
        help = "Hop distance; values below 1 produce no result"
    )]
    distance: i64,

    #[arg(
        long = "type",
        value_name = "NAME",
        help = "Relationship type to follow (repeatable; default all)"
    )]
    types: Vec<String>,

    #[arg(long, help = "Use the parallel engine")]
    parallel: bool,

    #[arg(
        long,
        value_name = "T",
        help = "Parallel worker count; 0 uses the available hardware threads"
    )]
    threads: Option<usize>,

    #[arg(long, value_name = "MS", help = "Fail the call after this many milliseconds")]
    deadline_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count nodes within a hop distance of a start node
    Count(CountCmd),
    /// Load the graph and report what was imported
    Stats(GraphArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct CountReport {
    start: u64,
    distance: i64,
    engine: &'static str,
    relationship_types: Vec<String>,
    value: Option<i64>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let config = CliConfig::load(cli.config.clone())?;

    match cli.command {
        Command::Count(cmd) => run_count(&cmd, &config, cli.format),
        Command::Stats(graph) => {
            let (_, summary) = load(&graph, &config)?;
            emit(&cli.format, &summary, |_| print_stats_text(&summary))
        }
    }
}

fn run_count(cmd: &CountCmd, config: &CliConfig, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let (graph, _) = load(&cmd.graph, config)?;

    let mut options = config.khops_options();
    if let Some(threads) = cmd.threads {
        options = options.parallelism(resolve_threads(threads));
    }
    if let Some(ms) = cmd.deadline_ms {
        options = options.deadline(Duration::from_millis(ms));
    }
    let engine = if cmd.parallel {
        EngineKind::Parallel
    } else {
        config.engine().unwrap_or_default()
    };

    let value = KhopsRequest::new(NodeId(cmd.start))
        .distance(cmd.distance)
        .relationship_types(cmd.types.iter().cloned())
        .run(&graph, engine, &options)?;

    let report = CountReport {
        start: cmd.start,
        distance: cmd.distance,
        engine: match engine {
            EngineKind::Sequential => "sequential",
            EngineKind::Parallel => "parallel",
        },
        relationship_types: cmd.types.clone(),
        value,
    };
    emit(&format, &report, |_| {
        if let Some(count) = report.value {
            println!("{count}");
        }
    })
}

fn load(
    args: &GraphArgs,
    config: &CliConfig,
) -> Result<(sombra_khops::MemGraph, ImportSummary), Box<dyn Error>> {
    let mut edges = EdgeImportConfig::new(&args.edges);
    config.apply_edge_columns(&mut edges);
    if let Some(col) = &args.edge_src_column {
        edges.src_column = col.clone();
    }
    if let Some(col) = &args.edge_dst_column {
        edges.dst_column = col.clone();
    }
    if let Some(col) = &args.edge_type_column {
        edges.type_column = Some(col.clone());
    }
    edges.static_type = args.edge_type.clone();

    let nodes = args.nodes.as_ref().map(|path| {
        let mut nodes = NodeImportConfig::new(path);
        config.apply_node_columns(&mut nodes);
        if let Some(col) = &args.node_id_column {
            nodes.id_column = col.clone();
        }
        nodes
    });

    Ok(load_graph(&edges, nodes.as_ref())?)
}

fn resolve_threads(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(sombra_khops::traversal::DEFAULT_PARALLELISM)
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_stats_text(summary: &ImportSummary) {
    println!("Graph:");
    println!(
        "  nodes={} relationship_types={}",
        summary.node_count, summary.relationship_types
    );
    println!(
        "  edge_rows={} node_rows={}",
        summary.edges_imported, summary.nodes_imported
    );
}
