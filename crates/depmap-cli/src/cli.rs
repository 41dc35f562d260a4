//! Command-line interface for the depmap utility
//!
//! Provides a CLI to lay out dependency-map payloads, inspect edge
//! classification, and fetch maps from a running backend.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::colorizer::{paint_kind, paint_relationship};
use depmap::client::{ApiClient, FetchCoordinator};
use depmap::core::logging::init_logging;
use depmap::core::RawGraph;
use depmap::graph::{ForceLayout, LayoutConfig, Scene, ScenePipeline};

/// Depmap - Lay out and inspect infrastructure dependency maps
#[derive(Parser)]
#[command(name = "depmap")]
#[command(about = "A Rust utility to lay out and inspect infrastructure dependency maps")]
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
    /// Lay out a dependency-map payload and print positions and regions
    Layout {
        /// Input file containing a JSON payload (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit machine-readable JSON instead of the text listing
        #[arg(long)]
        json: bool,

        /// Canvas width in layout units
        #[arg(long)]
        width: Option<f64>,

        /// Canvas height in layout units
        #[arg(long)]
        height: Option<f64>,

        /// Simulation rounds
        #[arg(long)]
        iterations: Option<usize>,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Classify the edges of a payload and print their visual treatment
    Classify {
        /// Input file containing a JSON payload (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Fetch a dependency map from a backend and print the scene summary
    Fetch {
        /// Base URL of the backend (scheme and host)
        #[arg(long, default_value = "http://localhost:3000")]
        base_url: String,

        /// System name to fetch the map for
        #[arg(short, long)]
        system: String,

        /// Cap the number of nodes the backend returns
        #[arg(long)]
        max_nodes: Option<u32>,

        /// Refetch every N seconds instead of exiting after one fetch
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,

        /// Stop after this many fetches in watch mode
        #[arg(long)]
        count: Option<usize>,

        /// Emit machine-readable JSON instead of the text listing
        #[arg(long)]
        json: bool,
    },
}

/// When to colorize output
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if output is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Main CLI application
pub struct DepmapApp;

impl DepmapApp {
    pub fn new() -> Self {
        Self
    }

    fn pipeline(width: Option<f64>, height: Option<f64>, iterations: Option<usize>) -> ScenePipeline {
        let defaults = LayoutConfig::default();
        let config = LayoutConfig {
            width: width.unwrap_or(defaults.width),
            height: height.unwrap_or(defaults.height),
            iterations: iterations.unwrap_or(defaults.iterations),
            ..defaults
        };
        ScenePipeline::with_layout(ForceLayout::with_config(config))
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Initialize logging with CLI flags (environment variables take precedence)
        let log_level_str = std::env::var("DEPMAP_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("DEPMAP_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        // Reinitialize logging with CLI/environment settings
        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Depmap v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Layout {
                input,
                output,
                json,
                width,
                height,
                iterations,
                color,
            } => self.layout_command(input, output, json, width, height, iterations, color, cli.verbose),
            Commands::Classify { input, color } => self.classify_command(input, color, cli.verbose),
            Commands::Fetch {
                base_url,
                system,
                max_nodes,
                watch,
                count,
                json,
            } => self.fetch_command(base_url, system, max_nodes, watch, count, json, cli.verbose),
        }
    }

    /// Handle the layout command
    #[allow(clippy::too_many_arguments)]
    fn layout_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        json: bool,
        width: Option<f64>,
        height: Option<f64>,
        iterations: Option<usize>,
        color: ColorChoice,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let raw: RawGraph = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse payload: {}", e))?;
        let scene = Self::pipeline(width, height, iterations).build(&raw);

        let rendered = if json {
            scene_to_json(&scene)?
        } else {
            let colorize = self.should_colorize(&output, color);
            render_scene_text(&scene, colorize)
        };
        self.write_output(output, &rendered)
    }

    /// Handle the classify command
    fn classify_command(
        &self,
        input: Option<PathBuf>,
        color: ColorChoice,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let raw: RawGraph = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse payload: {}", e))?;
        let scene = ScenePipeline::new().build(&raw);
        let colorize = self.should_colorize(&None, color);
        self.write_output(None, &render_classification(&scene, colorize))
    }

    /// Handle the fetch command
    #[allow(clippy::too_many_arguments)]
    fn fetch_command(
        &self,
        base_url: String,
        system: String,
        max_nodes: Option<u32>,
        watch: Option<u64>,
        count: Option<usize>,
        json: bool,
        verbose: bool,
    ) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let client = ApiClient::new(base_url);
            let mut coordinator = FetchCoordinator::new();

            let fetches = match watch {
                Some(_) => count.unwrap_or(usize::MAX),
                None => 1,
            };
            let period = Duration::from_secs(watch.unwrap_or(0));

            for round in 0..fetches {
                if round > 0 {
                    tokio::time::sleep(period).await;
                }
                debug!(round, system = %system, "Fetching dependency map");
                let client = client.clone();
                let system = system.clone();
                coordinator
                    .begin(async move { client.fetch_dependency_map(&system, max_nodes).await });
                coordinator.settle().await;

                let Some(scene) = coordinator.latest() else {
                    return Err(anyhow!(
                        "Fetch failed and no earlier scene is available; \
                         check --base-url and retry"
                    ));
                };
                if verbose {
                    eprintln!(
                        "Fetch {} completed: {} nodes, {} edges",
                        round + 1,
                        scene.snapshot.node_count(),
                        scene.snapshot.edge_count()
                    );
                }
                let rendered = if json {
                    scene_to_json(&scene)?
                } else {
                    render_scene_text(&scene, false)
                };
                self.write_output(None, &rendered)?;
            }
            Ok(())
        })
    }

    /// Determine if we should colorize the output based on color choice and output destination
    fn should_colorize(&self, output: &Option<PathBuf>, color: ColorChoice) -> bool {
        match color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                // Check NO_COLOR environment variable
                if std::env::var("NO_COLOR").is_ok() {
                    return false;
                }
                // Only colorize if outputting to stdout and it's a terminal
                match output {
                    None => crossterm::tty::IsTty::is_tty(&std::io::stdout()),
                    Some(p) if p.to_str() == Some("-") => {
                        crossterm::tty::IsTty::is_tty(&std::io::stdout())
                    }
                    Some(_) => false, // Writing to file, no colors
                }
            }
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) => {
                if path.to_string_lossy() == "-" {
                    let mut content = String::new();
                    io::stdin().read_to_string(&mut content)?;
                    Ok(content)
                } else {
                    fs::read_to_string(&path).map_err(|e| {
                        anyhow!("Failed to read input file '{}': {}", path.display(), e)
                    })
                }
            }
            None => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        let stdout_content = if content.is_empty() || content.ends_with('\n') {
            content.to_string()
        } else {
            format!("{}\n", content)
        };

        match output {
            Some(path) => {
                if path.to_string_lossy() == "-" {
                    print!("{}", stdout_content);
                    io::stdout().flush()?;
                } else {
                    fs::write(&path, content).map_err(|e| {
                        anyhow!("Failed to write output file '{}': {}", path.display(), e)
                    })?;
                }
            }
            None => {
                print!("{}", stdout_content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

impl Default for DepmapApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Text listing of a scene: containers with regions, leaves with positions,
/// then edges with their classification
fn render_scene_text(scene: &Scene, colorize: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} nodes, {} edges ({} node records skipped, {} edge records skipped)",
        scene.snapshot.node_count(),
        scene.snapshot.edge_count(),
        scene.skipped_nodes,
        scene.skipped_edges,
    );

    let mut nodes: Vec<_> = scene.snapshot.nodes.iter().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    for node in nodes.iter().filter(|n| n.is_container()) {
        let tag = paint_kind(node.kind, colorize);
        match scene.layout.region(&node.id) {
            Some(r) => {
                let _ = writeln!(
                    out,
                    "  {:<40} {:<12} region {:.0}x{:.0} at ({:.0}, {:.0})",
                    node.id, tag, r.width, r.height, r.x, r.y
                );
            }
            None => {
                let _ = writeln!(out, "  {:<40} {:<12} no region", node.id, tag);
            }
        }
    }
    for node in nodes.iter().filter(|n| !n.is_container()) {
        let tag = paint_kind(node.kind, colorize);
        match scene.layout.position(&node.id) {
            Some(p) => {
                let _ = writeln!(out, "  {:<40} {:<12} ({:.0}, {:.0})", node.id, tag, p.x, p.y);
            }
            None => {
                let _ = writeln!(out, "  {:<40} {:<12} unplaced", node.id, tag);
            }
        }
    }

    if !scene.snapshot.edges.is_empty() {
        let _ = writeln!(out);
        let mut edges: Vec<_> = scene.snapshot.edges.iter().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        for edge in edges {
            let tag = paint_relationship(edge.kind, colorize);
            let _ = writeln!(out, "  {} -> {}  [{}]", edge.source, edge.target, tag);
        }
    }
    out
}

/// Per-edge classification listing with the style each edge will render with
fn render_classification(scene: &Scene, colorize: bool) -> String {
    let mut out = String::new();
    let mut edges: Vec<_> = scene.snapshot.edges.iter().collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));

    for edge in &edges {
        let tag = paint_relationship(edge.kind, colorize);
        let style = scene.styles.get(&edge.id);
        let _ = write!(out, "  {} -> {}  [{}]", edge.source, edge.target, tag);
        if let Some(style) = style {
            let _ = write!(
                out,
                "  {} width {:.1}{}{}",
                style.color,
                style.width,
                if style.dashed { " dashed" } else { "" },
                if style.animated { " animated" } else { "" },
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let verified = edges
        .iter()
        .filter(|e| e.kind == depmap::core::RelationshipKind::VerifiedTraffic)
        .count();
    let _ = writeln!(
        out,
        "Total: {} edges, {} carrying verified traffic",
        edges.len(),
        verified
    );
    out
}

/// Machine-readable scene dump
fn scene_to_json(scene: &Scene) -> Result<String> {
    let nodes: Vec<_> = scene
        .snapshot
        .nodes
        .iter()
        .map(|n| {
            let position = scene.layout.position(&n.id);
            let region = scene.layout.region(&n.id);
            serde_json::json!({
                "id": n.id,
                "kind": n.kind.to_string(),
                "name": n.name,
                "parent": n.parent,
                "score": n.score,
                "position": position.map(|p| serde_json::json!({"x": p.x, "y": p.y})),
                "region": region.map(|r| serde_json::json!({
                    "x": r.x, "y": r.y, "width": r.width, "height": r.height,
                })),
            })
        })
        .collect();

    let edges: Vec<_> = scene
        .snapshot
        .edges
        .iter()
        .map(|e| {
            let style = scene.styles.get(&e.id);
            serde_json::json!({
                "id": e.id,
                "source": e.source,
                "target": e.target,
                "kind": e.kind.to_string(),
                "protocol": e.attrs.protocol,
                "port": e.attrs.port,
                "style": style.map(|s| serde_json::json!({
                    "color": s.color,
                    "dashed": s.dashed,
                    "width": s.width,
                    "animated": s.animated,
                })),
            })
        })
        .collect();

    let doc = serde_json::json!({
        "canvas": {"width": scene.layout.width, "height": scene.layout.height},
        "nodes": nodes,
        "edges": edges,
        "skipped_nodes": scene.skipped_nodes,
        "skipped_edges": scene.skipped_edges,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use depmap::graph::scene_from_json;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "nodes": [
            {"id": "vpc-1", "type": "vpc"},
            {"id": "subnet-1", "type": "subnet", "vpc_id": "vpc-1"},
            {"id": "i-1", "type": "ec2", "subnet_id": "subnet-1"},
            {"id": "db-1", "type": "rds", "subnet_id": "subnet-1"}
        ],
        "edges": [
            {"id": "e-1", "source": "i-1", "target": "db-1", "type": "actual_traffic"}
        ]
    }"#;

    #[test]
    fn test_cli_parsing_layout_command() {
        let args = vec![
            "depmap", "layout", "--input", "map.json", "--output", "out.txt", "--json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Layout {
                input,
                output,
                json,
                width,
                color,
                ..
            } => {
                assert_eq!(input.unwrap().to_string_lossy(), "map.json");
                assert_eq!(output.unwrap().to_string_lossy(), "out.txt");
                assert!(json);
                assert!(width.is_none());
                assert_eq!(color, ColorChoice::Auto); // default
            }
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn test_cli_parsing_classify_command() {
        let args = vec!["depmap", "classify", "--input", "map.json", "--color", "never"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Classify { input, color } => {
                assert_eq!(input.unwrap().to_string_lossy(), "map.json");
                assert_eq!(color, ColorChoice::Never);
            }
            _ => panic!("Expected Classify command"),
        }
    }

    #[test]
    fn test_cli_parsing_fetch_command() {
        let args = vec![
            "depmap", "fetch", "--system", "prod", "--max-nodes", "50", "--watch", "30",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Fetch {
                base_url,
                system,
                max_nodes,
                watch,
                count,
                json,
            } => {
                assert_eq!(base_url, "http://localhost:3000"); // default
                assert_eq!(system, "prod");
                assert_eq!(max_nodes, Some(50));
                assert_eq!(watch, Some(30));
                assert!(count.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_verbose_flag() {
        let args = vec!["depmap", "--verbose", "classify"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_read_input_from_file() {
        let app = DepmapApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("map.json");
        fs::write(&file_path, SAMPLE).unwrap();

        let content = app.read_input(Some(file_path)).unwrap();
        assert_eq!(content, SAMPLE);
    }

    #[test]
    fn test_write_output_to_file() {
        let app = DepmapApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("out.txt");

        app.write_output(Some(file_path.clone()), "listing").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "listing");
    }

    #[test]
    fn test_render_scene_text_lists_every_node() {
        let scene = scene_from_json(SAMPLE).unwrap();
        let text = render_scene_text(&scene, false);
        for id in ["vpc-1", "subnet-1", "i-1", "db-1"] {
            assert!(text.contains(id), "listing missing {}", id);
        }
        assert!(text.contains("region"));
        assert!(text.contains("i-1 -> db-1"));
        assert!(!text.contains('\x1b'), "uncolored output has ANSI codes");
    }

    #[test]
    fn test_render_classification_summary() {
        let scene = scene_from_json(SAMPLE).unwrap();
        let text = render_classification(&scene, false);
        assert!(text.contains("verified-traffic"));
        assert!(text.contains("animated"));
        assert!(text.contains("1 carrying verified traffic"));
    }

    #[test]
    fn test_scene_to_json_round_trips() {
        let scene = scene_from_json(SAMPLE).unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&scene_to_json(&scene).unwrap()).unwrap();
        assert_eq!(doc["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(doc["edges"].as_array().unwrap().len(), 1);
        assert_eq!(doc["edges"][0]["kind"], "verified-traffic");
        assert!(doc["canvas"]["width"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_layout_command_writes_output_file() {
        let app = DepmapApp::new();
        let dir = tempdir().unwrap();
        let input = dir.path().join("map.json");
        let output = dir.path().join("out.txt");
        fs::write(&input, SAMPLE).unwrap();

        app.layout_command(
            Some(input),
            Some(output.clone()),
            false,
            None,
            None,
            None,
            ColorChoice::Never,
            false,
        )
        .unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("4 nodes, 1 edges"));
    }

    #[test]
    fn test_layout_command_rejects_malformed_payload() {
        let app = DepmapApp::new();
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(&input, "{not json").unwrap();

        let result = app.layout_command(
            Some(input),
            None,
            false,
            None,
            None,
            None,
            ColorChoice::Never,
            false,
        );
        assert!(result.is_err());
    }
}
