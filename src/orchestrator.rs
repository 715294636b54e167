// src/orchestrator.rs

use std::{fmt, sync::Arc};

use tracing::{debug, error, info, warn};

use crate::{
    backup::BackupStore, runner::ScriptRunner, script::sanitize, state::StateStore,
    tweaks::Tweak, utils::registry::RegistryStore,
};

/// Result of one orchestrator operation on one tweak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran and exited with code 0.
    Applied,
    /// The stored backup was written back.
    Reverted,
    /// The tweak has no script content; nothing was run.
    EmptyScript,
    /// The script could not be launched or exited non-zero.
    ScriptFailed,
    /// Revert was requested but no backup is stored for the tweak.
    NoBackup,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Applied | Outcome::Reverted)
    }

    /// User-facing status line for `title`.
    pub fn message(&self, title: &str) -> String {
        match self {
            Outcome::Applied => format!("Tweak '{}' applied successfully.", title),
            Outcome::Reverted => format!("Tweak '{}' reverted successfully.", title),
            Outcome::EmptyScript => format!("Tweak '{}' has no script to run.", title),
            Outcome::ScriptFailed => format!(
                "Failed to apply tweak '{}'. Check that administrator rights were granted.",
                title
            ),
            Outcome::NoBackup => format!(
                "No backup found for tweak '{}'; it cannot be reverted.",
                title
            ),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::Applied => "applied",
            Outcome::Reverted => "reverted",
            Outcome::EmptyScript => "empty script",
            Outcome::ScriptFailed => "script failed",
            Outcome::NoBackup => "no backup",
        };
        f.write_str(text)
    }
}

/// Aggregate of a bulk apply. `succeeded + failed` equals the number of
/// tweaks submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs, backs up and reverts tweaks, keeping the state file in step.
///
/// Operations never return errors: failures are logged and surface as an
/// unsuccessful [`Outcome`]. Persistence failures are logged and do not
/// change the outcome of an operation whose script already ran.
pub struct TweakOrchestrator {
    backups: BackupStore,
    states: StateStore,
    runner: Arc<dyn ScriptRunner>,
}

impl TweakOrchestrator {
    pub fn new(
        registry: Arc<dyn RegistryStore>,
        states: StateStore,
        runner: Arc<dyn ScriptRunner>,
    ) -> Self {
        Self {
            backups: BackupStore::new(registry),
            states,
            runner,
        }
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Sanitizes and runs the script without touching persisted state.
    pub fn execute_only(&self, tweak: &mut Tweak) -> Outcome {
        if tweak.script.trim().is_empty() {
            warn!("{} -> Script is empty; nothing to run.", tweak.id);
            return Outcome::EmptyScript;
        }

        let script = sanitize(&tweak.script);
        debug!(
            "{} -> Running sanitized script with {} line(s).",
            tweak.id,
            script.lines().count()
        );

        if self.runner.run(&script) {
            tweak.applied = true;
            info!("{} -> Script completed successfully.", tweak.id);
            Outcome::Applied
        } else {
            error!("{} -> Script failed.", tweak.id);
            Outcome::ScriptFailed
        }
    }

    /// Captures current values, runs the script, and records the tweak as enabled.
    ///
    /// When the tweak is already recorded as enabled with a backup, that
    /// backup is kept so it still holds the values from before the first apply.
    pub fn execute_with_backup(&mut self, tweak: &mut Tweak) -> Outcome {
        let keep_existing =
            self.states.is_enabled(&tweak.id) && self.states.backup(&tweak.id).is_some();

        if keep_existing {
            debug!(
                "{} -> Already enabled; keeping the existing backup.",
                tweak.id
            );
        } else {
            match self.backups.snapshot(&tweak.id, &tweak.script) {
                Some(record) => {
                    if let Err(e) = self.states.save_backup(&tweak.id, record) {
                        error!("{} -> Failed to persist backup: {}", tweak.id, e);
                    }
                }
                None => warn!(
                    "{} -> No existing registry values captured; revert will not be possible.",
                    tweak.id
                ),
            }
        }

        let outcome = self.execute_only(tweak);
        if outcome.is_success() {
            tweak.enabled = true;
            if let Err(e) = self.states.set_state(&tweak.id, true, true) {
                error!("{} -> Failed to persist enabled state: {}", tweak.id, e);
            }
        }
        outcome
    }

    /// Writes the stored backup back to the registry and records the tweak as
    /// disabled. No script runs. The backup is discarded once restored.
    pub fn revert(&mut self, tweak: &mut Tweak) -> Outcome {
        let Some(record) = self.states.backup(&tweak.id).cloned() else {
            warn!("{} -> No backup stored; cannot revert.", tweak.id);
            return Outcome::NoBackup;
        };

        let summary = self.backups.restore(&tweak.id, &record);
        info!(
            "{} -> Reverted {} value(s), {} skipped.",
            tweak.id, summary.restored, summary.skipped
        );

        tweak.applied = false;
        tweak.enabled = false;
        if let Err(e) = self.states.set_state(&tweak.id, false, false) {
            error!("{} -> Failed to persist disabled state: {}", tweak.id, e);
        }
        if let Err(e) = self.states.clear_backup(&tweak.id) {
            error!("{} -> Failed to discard backup: {}", tweak.id, e);
        }

        Outcome::Reverted
    }

    /// Reverts an enabled tweak, enables a disabled one.
    pub fn toggle(&mut self, tweak: &mut Tweak) -> Outcome {
        if tweak.enabled {
            self.revert(tweak)
        } else {
            self.execute_with_backup(tweak)
        }
    }

    /// Runs each tweak's script once, one after another, without backups or
    /// persisted state. Failures are counted and the batch carries on.
    pub fn apply_batch(&self, tweaks: &mut [Tweak]) -> BatchReport {
        self.apply_batch_with(tweaks, |_, _, _| {})
    }

    /// Like [`TweakOrchestrator::apply_batch`], calling `on_progress` with the
    /// index, tweak and outcome after each one.
    pub fn apply_batch_with<F>(&self, tweaks: &mut [Tweak], mut on_progress: F) -> BatchReport
    where
        F: FnMut(usize, &Tweak, Outcome),
    {
        let mut report = BatchReport::default();

        for (index, tweak) in tweaks.iter_mut().enumerate() {
            let outcome = self.execute_only(tweak);
            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            on_progress(index, &*tweak, outcome);
        }

        info!(
            "Batch finished: {} succeeded, {} failed.",
            report.succeeded, report.failed
        );
        report
    }
}
