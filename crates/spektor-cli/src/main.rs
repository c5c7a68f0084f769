//! spektor CLI
//!
//! Collect host inventory, persist it as JSON, and query it through a local
//! Ollama model.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use spektor_exec::LocalRunner;
use spektor_inventory::{CollectOptions, Extra, collect, load, save};
use spektor_llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaClient};
use spektor_report::{DEFAULT_DEBUG_DIR, ReportOptions, ReportTarget};

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "spektor")]
#[command(about = "Host inventory collection with LLM-backed reporting", long_about = None)]
struct Cli {
    /// Ollama server URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// System prompt: a file path if one exists, else literal text
    #[arg(long, global = true)]
    system_prompt: Option<String>,

    /// Display thinking content from the model
    #[arg(long, global = true)]
    show_thinking: bool,

    /// Save raw model output (thinking included) to the debug directory
    #[arg(long, global = true)]
    save_thinking: bool,

    /// Log raw streamed chunks and session metadata
    #[arg(long, global = true)]
    debug_llm: bool,

    /// Directory for debug artifacts
    #[arg(long, global = true)]
    debug_dir: Option<PathBuf>,

    /// TOML config file with server/model/debug defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect system information into a JSON document
    Collect {
        /// Where to write the document
        #[arg(long, default_value = "inventory.json")]
        output: PathBuf,

        /// Per-command timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Extra probes to include (docker, systemd, kvm)
        #[arg(long, value_delimiter = ',')]
        extras: Vec<String>,

        /// Capture every command result as a JSON artifact in this directory
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },

    /// Generate an LLM report from a saved document
    Report {
        /// Document to report on
        #[arg(long, default_value = "inventory.json")]
        doc: PathBuf,

        /// Sections to analyse; whole-document overview when omitted
        #[arg(long)]
        section: Vec<String>,
    },

    /// Ask a free-form question about a saved document
    Ask {
        /// Document to query
        #[arg(long, default_value = "inventory.json")]
        doc: PathBuf,

        /// The question
        question: String,
    },

    /// Print a saved document, or one section of it
    Show {
        /// Document to print
        #[arg(long, default_value = "inventory.json")]
        doc: PathBuf,

        /// Section to print
        #[arg(long)]
        section: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            CliConfig::from_file(path)?
        }
        None => CliConfig::default(),
    };

    let server = cli
        .server
        .clone()
        .or(file_config.server)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model = cli
        .model
        .clone()
        .or(file_config.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let debug_dir = cli
        .debug_dir
        .clone()
        .or(file_config.debug_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEBUG_DIR));
    debug!(%server, %model, "resolved model endpoint");

    let report_options = ReportOptions {
        show_thinking: cli.show_thinking,
        save_thinking: cli.save_thinking,
        debug_capture: cli.debug_llm,
        debug_dir,
        system_prompt: cli.system_prompt.clone(),
    };

    match cli.command {
        Commands::Collect {
            output,
            timeout,
            extras,
            raw_dir,
        } => {
            let extras = extras
                .iter()
                .map(|e| e.parse::<Extra>().map_err(|e| eyre!(e)))
                .collect::<Result<Vec<_>>>()?;

            let options = CollectOptions {
                timeout: Duration::from_secs(timeout),
                extras,
                raw_dir,
            };
            let runner = LocalRunner::new();
            let doc = collect(&runner, &options).await;

            save(&doc, &output)?;
            println!("Inventory written to {}", output.display());
            if !doc.validation_issues.is_empty() {
                println!("Validation issues:");
                for issue in &doc.validation_issues {
                    println!("  - {issue}");
                }
            }
        }

        Commands::Report { doc, section } => {
            let document = load(&doc)?;
            let client = OllamaClient::new(&server, model)?;
            let target = if section.is_empty() {
                ReportTarget::Overview
            } else {
                ReportTarget::Sections(section)
            };
            let mut out = std::io::stdout();
            spektor_report::report(&client, &document, &target, &report_options, &mut out)
                .await?;
            println!();
        }

        Commands::Ask { doc, question } => {
            let document = load(&doc)?;
            let client = OllamaClient::new(&server, model)?;
            let mut out = std::io::stdout();
            spektor_report::ask(&client, &document, &question, &report_options, &mut out)
                .await?;
            println!();
        }

        Commands::Show { doc, section } => {
            let document = load(&doc)?;
            let value = match &section {
                Some(name) => document
                    .section(name)
                    .ok_or_else(|| eyre!("unknown section: {name}"))?
                    .clone(),
                None => serde_json::to_value(&document)?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
