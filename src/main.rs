use std::path::Path;

use anyhow::Context;
use clap::Parser;
use nodemap::{EngineConfig, Entities, KindFilter, NodeMap, PhysicsParam};
use tracing::info;

mod cli;

use cli::{Cli, Commands};

/// Kinetic energy below which the layout counts as settled
const SETTLE_THRESHOLD: f64 = 0.01;

const FIT_PADDING: f64 = 20.0;

struct LayoutArgs<'a> {
    entities: &'a Path,
    config: Option<&'a Path>,
    ticks: usize,
    filter: KindFilter,
    canvas: Option<(f64, f64)>,
    output: Option<&'a Path>,
}

fn layout(args: LayoutArgs<'_>) -> anyhow::Result<()> {
    let config = match args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let entities = Entities::from_path(args.entities)
        .with_context(|| format!("failed to load entities from {}", args.entities.display()))?;

    let mut map = NodeMap::new(config, nodemap::ManualScheduler::new());
    map.set_entities(entities);
    map.set_filter(args.filter);
    let ticks = map.settle(args.ticks, SETTLE_THRESHOLD);
    if let Some((width, height)) = args.canvas {
        map.fit_to_view(width, height, FIT_PADDING);
    }
    map.teardown();

    let snapshot = map.snapshot();
    info!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        ticks,
        "layout settled"
    );

    let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
    match args.output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn params_table() -> String {
    let header = format!("{:<18}{:>10}{:>10}{:>10}", "parameter", "default", "min", "max");
    let rows = PhysicsParam::ALL.into_iter().map(|param| {
        let (min, max) = param.range();
        format!(
            "{:<18}{:>10}{:>10}{:>10}",
            param.to_string(),
            param.default_value(),
            min,
            max
        )
    });
    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nodemap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout {
            entities,
            config,
            ticks,
            filter,
            width,
            height,
            output,
        } => layout(LayoutArgs {
            entities: &entities,
            config: config.as_deref(),
            ticks,
            filter,
            canvas: width.zip(height),
            output: output.as_deref(),
        })?,
        Commands::Params => println!("{}", params_table()),
    }

    Ok(())
}
