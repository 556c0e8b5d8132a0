use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all issues and pull requests of a GitHub repository and write its open-count timeline
    FetchTimeline {
        /// Repository as org/name
        repo: String,
        /// Path to an optional GitHub config YAML
        #[arg(short, long)]
        config: Option<String>,
        /// Directory receiving <org>/<name>.json
        #[arg(short, long, default_value = "data")]
        data_dir: String,
        /// Drop records closed before they were created instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Plot a timeline JSON document into a PNG chart
    PlotTimeline {
        /// Timeline JSON file
        #[arg(short, long)]
        input: String,
        /// Output PNG file
        #[arg(short, long)]
        output: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
