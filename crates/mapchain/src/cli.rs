//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

/// Compose, query and generate source maps.
#[derive(Debug, Parser)]
#[command(name = "mapchain")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Path to mapchain.json (defaults to the working directory)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Log library events to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// The available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compose a map with the maps of earlier passes
    Compose {
        /// Map of the last pass
        map: Utf8PathBuf,

        /// Maps of earlier passes, most recent first
        #[arg(required = true)]
        previous: Vec<Utf8PathBuf>,

        /// Name of the generated file in the composed map
        #[arg(long)]
        file: Option<String>,

        /// Give every generated line a mapping at column 0
        #[arg(long = "fill-lines")]
        fill_lines: bool,

        /// Write the composed map here instead of stdout
        #[arg(long, short = 'o')]
        out: Option<Utf8PathBuf>,
    },

    /// Find the original position of a generated position
    Lookup {
        /// Source map to query
        map: Utf8PathBuf,

        /// 1-based generated line
        #[arg(long, requires = "column", conflicts_with = "offset")]
        line: Option<u32>,

        /// 1-based generated column (UTF-16 units)
        #[arg(long, requires = "line")]
        column: Option<u32>,

        /// Generated file that `--offset` points into
        #[arg(long)]
        generated: Option<Utf8PathBuf>,

        /// Byte offset into the generated file
        #[arg(long, requires = "generated", conflicts_with = "column")]
        offset: Option<u32>,

        /// Only accept a mapping that starts exactly at the position
        #[arg(long)]
        exact: bool,
    },

    /// Find the generated positions of an original position
    Find {
        /// Source map to query
        map: Utf8PathBuf,

        /// Original source path as listed in the map
        #[arg(long)]
        source: String,

        /// 1-based original line
        #[arg(long)]
        line: u32,

        /// 1-based original column
        #[arg(long)]
        column: Option<u32>,
    },

    /// Print the decoded mappings of a map
    Inspect {
        /// Source map to print
        map: Utf8PathBuf,
    },

    /// Print or update the sourceMappingURL comment of a file
    Url {
        /// Generated file
        file: Utf8PathBuf,

        /// New URL
        #[arg(long, conflicts_with = "remove")]
        set: Option<String>,

        /// Remove the comment
        #[arg(long)]
        remove: bool,

        /// Use a `/*# ... */` comment when appending
        #[arg(long)]
        block: bool,

        /// Update the file in place instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// Copy a file through a mapping writer
    Generate {
        /// Input file
        source: Utf8PathBuf,

        /// Output file; the map is written next to it with a `.map` suffix
        #[arg(long, short = 'o')]
        out: Utf8PathBuf,

        /// Record one mapping per line
        #[arg(long = "line-only")]
        line_only: bool,

        /// Indent unit used by `--wrap`
        #[arg(long)]
        indent: Option<String>,

        /// Wrap the output in an immediately invoked function
        #[arg(long)]
        wrap: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}
