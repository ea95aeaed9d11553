//! CLI argument parsing for docweave

use clap::Parser;
use std::path::PathBuf;

/// docweave - compile template trees into rendered documents
#[derive(Parser, Debug)]
#[command(name = "dw")]
#[command(author, version, about = "Compile template trees with macros and embedded markdown", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Variable binding for the root scope (repeatable)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,

    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Use <!--{{ }}--> delimiters in markup files
    #[arg(long)]
    pub html: bool,

    /// Compile all inputs into one registry and execute a single root
    #[arg(long)]
    pub shared: bool,

    /// Root template to execute in shared mode (default: last input)
    #[arg(long, requires = "shared")]
    pub root: Option<String>,

    /// Serve the output directory over HTTP after compiling
    #[arg(short, long)]
    pub serve: bool,

    /// Root documents (or, with --shared, the ordered template files)
    #[arg(required = true, value_name = "DOCUMENTS")]
    pub documents: Vec<PathBuf>,
}
