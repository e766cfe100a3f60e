use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nodemap::KindFilter;

/// Lay out production-tracking entities as a force-directed node map.
#[derive(Parser, Debug)]
#[command(name = "nodemap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and settle a node map, then print the render snapshot as JSON
    Layout {
        /// Entities file (.json, .yaml or .yml)
        #[arg(short, long)]
        entities: PathBuf,

        /// Engine configuration file (.json, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum number of simulation ticks
        #[arg(short, long, default_value = "300")]
        ticks: usize,

        /// Node kinds to show: all, episode, task or member
        #[arg(short, long, default_value = "all")]
        filter: KindFilter,

        /// Fit the view into a canvas this wide (requires --height)
        #[arg(long, requires = "height")]
        width: Option<f64>,

        /// Fit the view into a canvas this high (requires --width)
        #[arg(long, requires = "width")]
        height: Option<f64>,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the tunable physics parameters with their defaults and ranges
    Params,
}
