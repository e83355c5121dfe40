//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::config::OutputFormat;

/// Reshape investigation record bags into mind-map trees
#[derive(Parser, Debug)]
#[command(name = "casemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory searched for a local .casemap.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert one record-bag document to a mind-map
    Build {
        /// Input JSON document (bare bag or API envelope)
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Write to file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
        /// User id shown in the root title
        #[arg(long)]
        user_id: Option<String>,
        /// User name shown in the root title
        #[arg(long)]
        name: Option<String>,
        /// Tree format: hide children of collapsed nodes
        #[arg(long)]
        collapsed: bool,
    },

    /// Convert every *.json document below a directory
    Batch {
        /// Directory to scan
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Output directory (default: config output.dir, else next to inputs)
        #[arg(long, value_hint = ValueHint::DirPath)]
        out_dir: Option<PathBuf>,
        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

/// Output format as given on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Compact widget JSON
    Json,
    /// Indented widget JSON
    Pretty,
    /// Terminal tree
    Tree,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Pretty => OutputFormat::Pretty,
            FormatArg::Tree => OutputFormat::Tree,
        }
    }
}
