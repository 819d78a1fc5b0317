use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use precontrack::report::FullReport;
use precontrack_engine::adapter::{adapt_events, RawEvent};
use precontrack_engine::aggregate::{CandidateAggregator, InMemoryPersonDirectory};
use precontrack_engine::analytics::{DEFAULT_BOTTLENECKS, DEFAULT_RANKING};
use precontrack_engine::stage::StageProcessor;
use precontrack_registry::ResponsibilityRegistry;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "precontrack",
    about = "Precontractual process tracking and responsibility analytics",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute candidate summaries and analytics from a raw event export
    Report {
        /// Path to the JSON array of raw workflow events
        #[arg(long)]
        events: PathBuf,
        /// Optional JSON object mapping candidate ids to display names
        #[arg(long)]
        persons: Option<PathBuf>,
        /// How many bottleneck stages to report
        #[arg(long, default_value_t = DEFAULT_BOTTLENECKS)]
        bottlenecks: usize,
        /// How many candidates in each ranking
        #[arg(long, default_value_t = DEFAULT_RANKING)]
        ranking: usize,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report {
            events,
            persons,
            bottlenecks,
            ranking,
            pretty,
        } => run_report(events, persons, bottlenecks, ranking, pretty),
    }
}

fn run_report(
    events_path: PathBuf,
    persons_path: Option<PathBuf>,
    bottleneck_limit: usize,
    ranking_limit: usize,
    pretty: bool,
) -> Result<()> {
    let raw = fs::read_to_string(&events_path)
        .with_context(|| format!("reading events file {}", events_path.display()))?;
    let raw_events: Vec<RawEvent> =
        serde_json::from_str(&raw).context("events file is not a JSON array of events")?;
    debug!(events = raw_events.len(), "loaded raw events");

    let names: HashMap<String, String> = match persons_path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading persons file {}", path.display()))?;
            serde_json::from_str(&raw).context("persons file is not a JSON object of id to name")?
        }
        None => HashMap::new(),
    };

    let registry = Arc::new(ResponsibilityRegistry::default());
    let directory = Arc::new(InMemoryPersonDirectory::new(names));
    let aggregator = CandidateAggregator::new(StageProcessor::new(registry), directory);

    let candidates = aggregator.run(&adapt_events(raw_events));
    let report = FullReport::build(candidates, bottleneck_limit, ranking_limit);

    let out = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}
