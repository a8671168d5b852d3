use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chat_core::RuleStage;
use clap::{Parser, Subcommand};
use context_manager::{ContextPipeline, PipelineContext, PipelineStatus};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod inputs;
mod rules;

use inputs::{load_session, Configs, Inputs};
use rules::RuleReport;

#[derive(Parser)]
#[command(name = "context-cli")]
#[command(about = "Build model context from a saved chat session")]
#[command(version)]
struct Cli {
    /// Write logs to stderr as JSON lines
    #[arg(long, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the context pipeline and print messages, logs and stats as JSON
    Build {
        /// Session snapshot (JSON)
        session: PathBuf,
        /// Agent config (JSON or TOML)
        #[arg(long)]
        agent: Option<PathBuf>,
        /// User profile (JSON or TOML)
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Pipeline settings; defaults to the config directory
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Context budget in the configured unit
        #[arg(long)]
        budget: Option<usize>,
        /// Build up to this node instead of the active leaf
        #[arg(long)]
        leaf: Option<Uuid>,
        #[arg(long, default_value = "false")]
        pretty: bool,
    },
    /// Print the node ids and roles of a branch
    Path {
        session: PathBuf,
        #[arg(long)]
        leaf: Option<Uuid>,
    },
    /// Report structural problems in a session snapshot
    Validate { session: PathBuf },
    /// List the effective regex rules with the layer each one came from
    Rules {
        #[arg(long)]
        agent: Option<PathBuf>,
        #[arg(long)]
        profile: Option<PathBuf>,
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Show display-stage rules instead of request-stage ones
        #[arg(long, default_value = "false")]
        display: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Build {
            session,
            agent,
            profile,
            settings,
            budget,
            leaf,
            pretty,
        } => {
            let inputs = Inputs::load(&session, agent.as_ref(), profile.as_ref(), settings.as_ref())?;
            build(&inputs, budget, leaf, pretty).await
        }
        Commands::Path { session, leaf } => {
            let session = load_session(&session)?;
            let path = match leaf {
                Some(leaf) => session.branch_path(leaf),
                None => session.active_path(),
            };
            for node in &path.nodes {
                println!("{}\t{}", node.id, node.role);
            }
            if let Some(issue) = &path.issue {
                eprintln!("incomplete: {issue}");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { session } => {
            let session = load_session(&session)?;
            let issues = session.validate();
            println!("{}", serde_json::to_string_pretty(&issues)?);
            Ok(if issues.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Rules {
            agent,
            profile,
            settings,
            display,
        } => {
            let configs = Configs::load(agent.as_ref(), profile.as_ref(), settings.as_ref())?;
            let stage = if display { RuleStage::Display } else { RuleStage::Request };
            let report = RuleReport::build(&configs, stage);
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn build(inputs: &Inputs, budget: Option<usize>, leaf: Option<Uuid>, pretty: bool) -> Result<ExitCode> {
    let pipeline = ContextPipeline::with_default_processors(&inputs.configs.settings);

    let mut ctx = PipelineContext::new(&inputs.session);
    if let Some(agent) = &inputs.configs.agent {
        ctx = ctx.with_agent(agent);
    }
    if let Some(profile) = &inputs.configs.profile {
        ctx = ctx.with_profile(profile);
    }
    if let Some(budget) = budget {
        ctx = ctx.with_budget(budget);
    }
    if let Some(leaf) = leaf {
        ctx = ctx.with_leaf(leaf);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let output = pipeline.execute_with_cancel(ctx, &cancel).await;
    tracing::info!(
        session_id = %inputs.session.id,
        messages = output.messages.len(),
        errors = output.errors().count(),
        duration_us = output.stats.total_duration_us,
        "context built"
    );

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("failed to serialize pipeline output")?;
    println!("{rendered}");

    Ok(match output.status {
        PipelineStatus::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
