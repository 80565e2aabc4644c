use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Split, rename, stamp and report on cutoff and reconnection order PDFs.
#[derive(Debug, Parser)]
#[command(name = "corte", about, version)]
pub struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split scanned pages into one document per half and name them
    Import(ImportArgs),

    /// Draw order information onto the first page of a PDF
    Stamp(StampArgs),

    /// Compose an order report on a letterhead PDF
    Report(ReportArgs),

    /// Print the positioned text runs and extracted fields of each half
    Runs {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Pixels per point used for rendering
        #[arg(long)]
        scale: Option<f64>,

        /// Fraction of the page height assigned to the top half
        #[arg(long)]
        cut_ratio: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input PDF files, processed in the given order
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fraction of the page height assigned to the top half
    #[arg(long)]
    pub cut_ratio: Option<f64>,

    /// Pixels per point used for rendering
    #[arg(long)]
    pub scale: Option<f64>,

    /// Prefix prepended to every generated filename
    #[arg(long)]
    pub prefix: Option<String>,

    /// Do not reuse the connection number as registration number
    #[arg(long)]
    pub no_fallback: bool,

    /// Write the included records into this directory
    #[arg(long, value_name = "DIR", conflicts_with = "archive")]
    pub out: Option<PathBuf>,

    /// Write the included records into this ZIP archive
    #[arg(long, value_name = "FILE.zip")]
    pub archive: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct StampArgs {
    /// PDF to stamp
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Label/value line, written as 'Label=Value' (repeatable)
    #[arg(long = "line", value_name = "LABEL=VALUE")]
    pub lines: Vec<String>,

    /// Plain text line (repeatable, kept in order with --line)
    #[arg(long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,

    /// Layout of the stamp
    #[arg(long, value_enum, default_value_t = StampMode::Card)]
    pub mode: StampMode,

    /// Bold title row (card mode only)
    #[arg(long)]
    pub title: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output PDF path
    #[arg(long, short)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Letterhead PDF whose first page is the background of every page
    #[arg(long)]
    pub template: PathBuf,

    /// JSON file holding an array of order rows
    #[arg(long, value_name = "ROWS.json")]
    pub rows: PathBuf,

    /// Comma-separated field ids, in display order. Default: all fields
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Label of the period covered by the report
    #[arg(long, default_value = "")]
    pub date_range: String,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output PDF path
    #[arg(long, short)]
    pub output: PathBuf,
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Stamp layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StampMode {
    /// Bordered card in the top-right corner
    Card,
    /// Centered block near the top of the page
    Centered,
}
