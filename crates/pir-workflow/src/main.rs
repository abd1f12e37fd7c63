use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pir_model::{Decision, DocumentId, ProcessId, ProjectId, Role};
use pir_workflow::monitor::{MonitorBoard, MonitoredRun, RunCondition};
use pir_workflow::{
    AdvanceOutcome, ApprovalEngine, CapabilityResolver, JournalEntry, PirConfig, RespondOutcome,
    Seed, StartReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pirctl", version, about = "pir document approval workflow")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List processes a company may start
    Processes {
        /// Company name; global processes only when omitted
        #[arg(long)]
        company: Option<String>,
    },
    /// List documents
    Documents {
        /// Only documents of this project
        #[arg(long)]
        project: Option<String>,
    },
    /// Run the demo approval flow and print a JSON report
    Simulate {
        /// Seed file (TOML or JSON)
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Only the linear start/advance flow, no rule-driven responses
        #[arg(long)]
        steps_only: bool,
    },
    /// Show capabilities and navigation of a role
    Capabilities {
        /// Role name, e.g. `designer`
        #[arg(long)]
        role: Role,
    },
    /// Run the demo flow and print its transition journal
    Journal {
        /// Check the hash chain and fail if broken
        #[arg(long)]
        verify: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    started: StartReport,
    advances: Vec<AdvanceOutcome>,
    responses: Vec<(String, RespondOutcome)>,
    documents: Vec<pir_model::Document>,
    monitor: Vec<MonitoredRun>,
    events_seen: usize,
    journal_intact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PirConfig::load_from_file(path)?,
        None => PirConfig::new(),
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Processes { company } => {
            let engine = build_engine(&config, None)?;
            for process in engine.access().accessible_processes(company.as_deref()) {
                println!(
                    "{:<8} {:<9} {} ({} steps){}",
                    process.id,
                    process.status,
                    process.name,
                    process.steps,
                    if process.is_template { " [template]" } else { "" }
                );
            }
        }
        Commands::Documents { project } => {
            let engine = build_engine(&config, None)?;
            let docs = match project {
                Some(project) => engine.store().list_by_project(&ProjectId::new(project)?),
                None => engine.store().list(),
            };
            for doc in docs {
                let progress = doc
                    .process_info()
                    .map(|info| {
                        format!(
                            " {} {}/{}",
                            info.process_name(),
                            info.current_step(),
                            info.total_steps()
                        )
                    })
                    .unwrap_or_default();
                println!("{:<8} {:<12} {}{progress}", doc.id, doc.status(), doc.name);
            }
        }
        Commands::Simulate { seed, steps_only } => {
            let engine = build_engine(&config, seed.as_deref())?;
            let report = simulate(&engine, &config, steps_only).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Capabilities { role } => {
            let resolver = CapabilityResolver::new();
            let output = serde_json::json!({
                "role": role,
                "capabilities": resolver.capabilities(role),
                "navigation": resolver.navigation(role),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Journal { verify } => {
            let engine = build_engine(&config, None)?;
            simulate(&engine, &config, false).await?;
            let entries: Vec<JournalEntry> = engine.journal().entries();
            println!("{}", serde_json::to_string_pretty(&entries)?);
            if verify {
                engine
                    .journal()
                    .verify_integrity()
                    .context("journal verification failed")?;
                let head = entries.last().map(JournalEntry::hash_hex).unwrap_or_default();
                eprintln!("journal verified: {} entries, head {head}", entries.len());
            }
        }
    }

    Ok(())
}

fn build_engine(config: &PirConfig, seed_override: Option<&Path>) -> Result<ApprovalEngine> {
    let seed = match seed_override.or(config.seed_path.as_deref()) {
        Some(path) => Seed::load_from_file(path)
            .with_context(|| format!("loading seed {}", path.display()))?,
        None => Seed::demo()?,
    };
    Ok(ApprovalEngine::from_seed(seed, config)?)
}

/// Demo flow: setlgroup starts the estimate template on doc-9 and walks it
/// to approval; then the in-flight review of doc-2 is answered by its
/// experts and director.
async fn simulate(
    engine: &ApprovalEngine,
    config: &PirConfig,
    steps_only: bool,
) -> Result<SimulationReport> {
    let mut events = engine.subscribe();

    let board = MonitorBoard::from_store(engine.store());
    board.track(
        MonitoredRun::running(DocumentId::new("doc-5")?, "Design documentation approval", 1, 2)
            .with_condition(RunCondition::Error),
    );
    let ticker = board.spawn(config.monitor_interval());

    let doc = DocumentId::new("doc-9")?;
    let started = engine
        .start_process(Some("setlgroup"), &ProcessId::new("proc-1")?, &[doc.clone()])
        .await?;
    if started.started.is_empty() {
        bail!("doc-9 is missing from the seed");
    }

    let mut advances = Vec::new();
    loop {
        let outcome = engine.try_advance(&doc).await?;
        advances.push(outcome);
        if outcome == AdvanceOutcome::Approved {
            break;
        }
    }

    let mut responses = Vec::new();
    if !steps_only {
        let review = DocumentId::new("doc-2")?;
        for (participant, decision) in [
            ("expert-1", Decision::Approve),
            ("expert-2", Decision::Reject),
            ("expert-3", Decision::Approve),
            ("director", Decision::Approve),
        ] {
            match engine.respond(&review, participant, decision).await {
                Ok(outcome) => responses.push((participant.to_string(), outcome)),
                Err(e) if e.is_state_conflict() || e.is_not_found() => {
                    tracing::warn!(participant, error = %e, "response not applied");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    ticker.shutdown().await;
    let journal_intact = engine.journal().verify_integrity().is_ok();
    let mut events_seen = 0usize;
    loop {
        match events.try_recv() {
            Ok(_) => events_seen += 1,
            Err(TryRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event subscriber lagging");
                events_seen += usize::try_from(missed).unwrap_or(usize::MAX);
            }
            Err(_) => break,
        }
    }

    Ok(SimulationReport {
        started,
        advances,
        responses,
        documents: engine.store().list(),
        monitor: board.snapshot(),
        events_seen,
        journal_intact,
    })
}
