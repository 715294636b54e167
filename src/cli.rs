// src/cli.rs

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, warn};
use tweakctl::{
    config::Settings,
    orchestrator::{BatchReport, TweakOrchestrator},
    runner::ElevatedScriptRunner,
    state::StateStore,
    tweaks::{group_by_category, loader::TweakLoader, Tweak, TweakCategory},
    utils::registry::RegistryStore,
    worker::{TweakAction, TweakWorker, WorkerEvent, WorkerMessage},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "tweakctl", bin_name = "tweakctl")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory containing tweak files
    #[arg(long, global = true, value_name = "DIR")]
    pub tweaks_dir: Option<PathBuf>,

    /// Location of the tweak state file
    #[arg(long, global = true, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available tweaks grouped by category
    List(ListArgs),
    /// Back up the affected registry values and apply a tweak
    Enable(TweakArgs),
    /// Restore the values backed up when a tweak was enabled
    Disable(TweakArgs),
    /// Enable a disabled tweak or disable an enabled one
    Toggle(TweakArgs),
    /// Run a tweak's script once, without backup or state tracking
    Apply(TweakArgs),
    /// Run every tweak in a category once
    ApplyCategory(CategoryArgs),
    /// Show the persisted state of every known tweak
    Status,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show this category
    #[arg(long)]
    pub category: Option<TweakCategory>,
}

#[derive(Args, Debug)]
pub struct TweakArgs {
    /// Tweak id (the tweak file name)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct CategoryArgs {
    pub category: TweakCategory,
}

impl Command {
    pub fn run(&self, settings: &Settings, states: StateStore) -> anyhow::Result<()> {
        match self {
            Self::List(args) => list(settings, &states, args.category),
            Self::Status => {
                status(&states);
                Ok(())
            }
            Self::Enable(args) => run_single(settings, states, &args.id, TweakAction::Enable),
            Self::Disable(args) => run_single(settings, states, &args.id, TweakAction::Disable),
            Self::Toggle(args) => run_single(settings, states, &args.id, TweakAction::Toggle),
            Self::Apply(args) => run_single(settings, states, &args.id, TweakAction::ApplyOnce),
            Self::ApplyCategory(args) => run_category(settings, states, args.category),
        }
    }
}

fn load_tweaks(settings: &Settings, states: &StateStore) -> anyhow::Result<Vec<Tweak>> {
    let loader = TweakLoader::new(&settings.tweaks_dir);
    loader
        .load(states)
        .with_context(|| format!("Failed to load tweaks from '{}'", loader.tweaks_dir().display()))
}

fn list(
    settings: &Settings,
    states: &StateStore,
    only: Option<TweakCategory>,
) -> anyhow::Result<()> {
    let tweaks = load_tweaks(settings, states)?;

    for (category, group) in group_by_category(&tweaks) {
        if only.is_some_and(|c| c != category) {
            continue;
        }

        let enabled = group.iter().filter(|t| t.enabled).count();
        println!("{} ({}/{} enabled)", category, enabled, group.len());
        for tweak in group {
            let hardware = tweak
                .compatible_hardware
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  [{}] {:<32} {}{} ({})",
                if tweak.enabled { "x" } else { " " },
                tweak.id,
                tweak.title,
                if tweak.requires_restart { " *restart*" } else { "" },
                hardware
            );
        }
    }
    Ok(())
}

fn status(states: &StateStore) {
    if states.is_empty() {
        println!("No tweak state recorded in '{}'.", states.path().display());
        return;
    }

    for (id, state) in states.states() {
        println!(
            "{:<32} enabled={:<5} applied={:<5} backup={:<3} modified={}",
            id,
            state.is_enabled,
            state.is_applied,
            state.backup_data.as_ref().map_or(0, |b| b.len()),
            state.last_modified.to_rfc3339()
        );
    }
}

#[cfg(windows)]
fn system_registry() -> Arc<dyn RegistryStore> {
    Arc::new(tweakctl::utils::registry::WindowsRegistry::new())
}

#[cfg(not(windows))]
fn system_registry() -> Arc<dyn RegistryStore> {
    warn!("No system registry on this platform; backups will be empty.");
    Arc::new(tweakctl::utils::registry::MemoryRegistry::new())
}

fn start_worker(states: StateStore) -> TweakWorker {
    let orchestrator = TweakOrchestrator::new(
        system_registry(),
        states,
        Arc::new(ElevatedScriptRunner::new()),
    );
    TweakWorker::start(orchestrator)
}

fn run_single(
    settings: &Settings,
    states: StateStore,
    id: &str,
    action: TweakAction,
) -> anyhow::Result<()> {
    let tweaks = load_tweaks(settings, &states)?;
    let Some(tweak) = tweaks.into_iter().find(|t| t.id == id) else {
        bail!("No tweak with id '{}'", id);
    };

    let worker = start_worker(states);
    worker
        .submit(WorkerMessage::Execute { tweak, action })
        .context("Failed to submit tweak to worker")?;

    while let Some(event) = worker.recv_event() {
        match event {
            WorkerEvent::Started { id, action } => debug!("{} -> {} started.", id, action),
            WorkerEvent::Completed {
                tweak,
                outcome,
                message,
            } => {
                println!("{}", message);
                if outcome.is_success() && tweak.requires_restart {
                    println!("A restart is required for this tweak to take effect.");
                }
                worker.shutdown();
                if !outcome.is_success() {
                    bail!("{} ({})", tweak.id, outcome);
                }
                return Ok(());
            }
            other => warn!("Unexpected worker event: {:?}", other),
        }
    }

    bail!("Worker stopped before reporting a result")
}

fn run_category(
    settings: &Settings,
    states: StateStore,
    category: TweakCategory,
) -> anyhow::Result<()> {
    let tweaks: Vec<Tweak> = load_tweaks(settings, &states)?
        .into_iter()
        .filter(|t| t.category == category)
        .collect();

    if tweaks.is_empty() {
        println!("No tweaks in category {}.", category);
        return Ok(());
    }

    let worker = start_worker(states);
    worker
        .submit(WorkerMessage::ApplyBatch { tweaks })
        .context("Failed to submit batch to worker")?;

    while let Some(event) = worker.recv_event() {
        match event {
            WorkerEvent::BatchProgress {
                index,
                total,
                id,
                outcome,
            } => println!("[{}/{}] {}: {}", index + 1, total, id, outcome),
            WorkerEvent::BatchFinished { report, .. } => {
                print_report(category, report);
                worker.shutdown();
                return Ok(());
            }
            other => warn!("Unexpected worker event: {:?}", other),
        }
    }

    bail!("Worker stopped before finishing the batch")
}

fn print_report(category: TweakCategory, report: BatchReport) {
    if report.failed == 0 {
        println!(
            "All {} {} tweak(s) applied successfully.",
            report.succeeded, category
        );
    } else {
        println!(
            "{} {} tweak(s) applied, {} failed.",
            report.succeeded, category, report.failed
        );
    }
}
