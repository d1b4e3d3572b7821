//! gradup CLI: run and inspect GradUp+ assessment attempts.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gradup",
    version,
    about = "Placement assessment traversal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an attempt from a script of actions
    Run {
        /// Assessment to attempt (default: from config)
        #[arg(long)]
        assessment_id: Option<String>,

        /// Source to fetch it from (default: from config)
        #[arg(long)]
        source: Option<String>,

        /// Action script; reads stdin when omitted
        #[arg(long)]
        script: Option<PathBuf>,

        /// Drive the attempt in real time, one tick per second
        #[arg(long)]
        live: bool,

        /// Output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a saved attempt summary
    Show {
        /// Summary JSON written by `gradup run`
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate assessment TOML files
    Validate {
        /// Path to assessment file or directory
        #[arg(long)]
        assessment: PathBuf,
    },

    /// List the assessments a source offers
    List {
        /// Source name (default: from config)
        #[arg(long)]
        source: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example assessment
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "gradup=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            assessment_id,
            source,
            script,
            live,
            output,
            format,
            config,
        } => {
            commands::run::execute(commands::run::RunArgs {
                assessment_id,
                source,
                script,
                live,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Show { report, format } => commands::show::execute(report, format),
        Commands::Validate { assessment } => commands::validate::execute(assessment),
        Commands::List { source, config } => commands::list::execute(source, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
