//! docweave - template-composition document compiler
//!
//! CLI entry point: compile documents into one output, optionally serve it.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use docweave::cli::Cli;
use docweave::config::Config;
use docweave::error::CompileError;
use docweave::executor::{CompileMode, DocumentExecutor};
use docweave::registry::Delimiters;
use docweave::server;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let output = cli.output.clone().ok_or(CompileError::MissingOutput)?;
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let delimiters = if cli.html {
        Delimiters::Markup
    } else {
        Delimiters::Standard
    };
    let mode = if cli.shared {
        CompileMode::Shared { root: cli.root.clone() }
    } else {
        CompileMode::Isolated
    };
    debug!(?mode, ?delimiters, ?output, "run: compiling");

    // Compilation is synchronous; keep it off the async workers
    let documents = cli.documents.clone();
    let defines = cli.defines.clone();
    let compile_config = config.clone();
    let compile_output = output.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let executor = DocumentExecutor::new(&compile_config, delimiters, defines.as_slice())?;
        executor.run(&mode, &documents, &compile_output)?;
        Ok(())
    })
    .await
    .context("Compilation task panicked")??;

    eprintln!("{} Wrote {}", "✓".green(), output.display());

    if cli.serve {
        let dir = server::public_dir(&config.server, &output);
        server::serve(&config.server, &dir).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    if let Err(e) = setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()) {
        eprintln!("{} {:#}", "error:".red(), e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red(), e);
        std::process::exit(1);
    }
}
