//! Command-line interface for the strata layout engine
//!
//! Reads a graph snapshot as JSON, runs the layered layout pipeline, and
//! writes the computed positions (one map + bounding box per connected
//! component) back out as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use strata::core::logging::init_logging;
use strata::{layout_graph, LayoutGraph, LayoutSettings, PlacementStrategy, RankAlignment};

/// Strata - deterministic layered layout for node graphs
#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Compute deterministic layered layouts for mixed exec/data node graphs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute a layout for a graph snapshot
    Layout {
        /// Input file containing the graph as JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for computed positions (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings file (JSON, partial fields allowed)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Placement strategy override
        #[arg(long, value_enum)]
        strategy: Option<StrategyChoice>,

        /// Horizontal rank alignment override
        #[arg(long, value_enum)]
        alignment: Option<AlignmentChoice>,

        /// Legacy horizontal spacing override
        #[arg(long)]
        spacing_x: Option<f32>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a graph snapshot without computing positions
    Validate {
        /// Input file to validate (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Placement strategy choices
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum StrategyChoice {
    Simple,
    Compact,
}

impl From<StrategyChoice> for PlacementStrategy {
    fn from(value: StrategyChoice) -> Self {
        match value {
            StrategyChoice::Simple => PlacementStrategy::Simple,
            StrategyChoice::Compact => PlacementStrategy::Compact,
        }
    }
}

/// Rank alignment choices
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum AlignmentChoice {
    Left,
    Center,
    Right,
}

impl From<AlignmentChoice> for RankAlignment {
    fn from(value: AlignmentChoice) -> Self {
        match value {
            AlignmentChoice::Left => RankAlignment::Left,
            AlignmentChoice::Center => RankAlignment::Center,
            AlignmentChoice::Right => RankAlignment::Right,
        }
    }
}

/// Main CLI application
pub struct StrataApp;

impl StrataApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over CLI flags.
        let log_level = std::env::var("STRATA_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var("STRATA_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Strata v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Layout {
                input,
                output,
                settings,
                strategy,
                alignment,
                spacing_x,
                pretty,
            } => self.layout_command(
                input,
                output,
                settings,
                strategy,
                alignment,
                spacing_x,
                pretty,
                cli.verbose,
            ),
            Commands::Validate { input } => self.validate_command(input, cli.verbose),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        settings_path: Option<PathBuf>,
        strategy: Option<StrategyChoice>,
        alignment: Option<AlignmentChoice>,
        spacing_x: Option<f32>,
        pretty: bool,
        verbose: bool,
    ) -> Result<()> {
        let graph = read_graph(input.as_deref())?;

        let mut settings = match settings_path {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read settings file {}", path.display()))?;
                serde_json::from_str::<LayoutSettings>(&text)
                    .with_context(|| format!("Invalid settings JSON in {}", path.display()))?
            }
            None => LayoutSettings::default(),
        };
        if let Some(strategy) = strategy {
            settings.strategy = strategy.into();
        }
        if let Some(alignment) = alignment {
            settings.rank_alignment = alignment.into();
        }
        if let Some(spacing_x) = spacing_x {
            settings.node_spacing_x = spacing_x;
        }

        let results = layout_graph(&graph, &settings)?;
        if verbose {
            eprintln!(
                "Laid out {} component(s), {} node(s)",
                results.len(),
                results.iter().map(|r| r.positions.len()).sum::<usize>()
            );
        }

        let json = if pretty {
            serde_json::to_string_pretty(&results)?
        } else {
            serde_json::to_string(&results)?
        };
        write_output(output.as_deref(), &json)
    }

    fn validate_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let graph = read_graph(input.as_deref())?;
        let mut keys: Vec<_> = graph.nodes.iter().map(|n| n.key).collect();
        keys.sort();
        keys.dedup();
        if keys.len() != graph.nodes.len() {
            return Err(anyhow!("graph contains duplicate node keys"));
        }
        if verbose {
            eprintln!(
                "Graph OK: {} node(s), {} edge(s)",
                graph.nodes.len(),
                graph.edges.len()
            );
        }
        println!("valid");
        Ok(())
    }
}

impl Default for StrataApp {
    fn default() -> Self {
        Self::new()
    }
}

fn read_graph(input: Option<&std::path::Path>) -> Result<LayoutGraph> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?,
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&text).context("Invalid graph JSON")
}

fn write_output(output: Option<&std::path::Path>, json: &str) -> Result<()> {
    match output {
        Some(path) if path.as_os_str() != "-" => fs::write(path, json)
            .with_context(|| format!("Failed to write output file {}", path.display())),
        _ => {
            let mut stdout = io::stdout();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}
