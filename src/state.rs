// src/state.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{
    backup::BackupRecord,
    constants::CORRUPT_STATE_SUFFIX,
    errors::StateStoreError,
};

/// Persisted state of one tweak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TweakState {
    pub is_enabled: bool,
    pub is_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_data: Option<BackupRecord>,
    pub last_modified: DateTime<Local>,
}

impl Default for TweakState {
    fn default() -> Self {
        Self {
            is_enabled: false,
            is_applied: false,
            backup_data: None,
            last_modified: Local::now(),
        }
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateDocument {
    #[serde(default)]
    states: IndexMap<String, TweakState>,
}

/// File-backed map from tweak id to `TweakState`.
///
/// Construction does no I/O; call [`StateStore::load`] before use. Every
/// mutation rewrites the whole file. There is no locking: two stores on the
/// same path overwrite each other, the last save wins.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    states: IndexMap<String, TweakState>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            states: IndexMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state file. A missing file is an empty store.
    ///
    /// On error the in-memory states are left empty.
    pub fn load(&mut self) -> Result<(), StateStoreError> {
        self.states.clear();

        if !self.path.exists() {
            debug!(
                "State file '{}' does not exist yet; starting empty.",
                self.path.display()
            );
            return Ok(());
        }

        let json = fs::read_to_string(&self.path).map_err(|source| StateStoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let document: StateDocument =
            serde_json::from_str(&json).map_err(|source| StateStoreError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;

        self.states = document.states;
        info!(
            "Loaded {} tweak state(s) from '{}'.",
            self.states.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Moves the state file aside to `<file>.corrupt`, replacing any earlier
    /// one. Later saves then start a fresh file.
    ///
    /// # Returns
    ///
    /// The path the file was moved to.
    pub fn quarantine_corrupt(&self) -> Result<PathBuf, StateStoreError> {
        let mut target = self.path.clone().into_os_string();
        target.push(CORRUPT_STATE_SUFFIX);
        let target = PathBuf::from(target);

        fs::rename(&self.path, &target).map_err(|source| StateStoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        warn!(
            "Moved unreadable state file '{}' to '{}'.",
            self.path.display(),
            target.display()
        );
        Ok(target)
    }

    /// Writes every state to disk, replacing the file.
    pub fn save(&self) -> Result<(), StateStoreError> {
        let io_error = |source| StateStoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let document = StateDocument {
            states: self.states.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, json).map_err(io_error)?;

        trace!(
            "Saved {} tweak state(s) to '{}'.",
            self.states.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn get(&self, tweak_id: &str) -> Option<&TweakState> {
        self.states.get(tweak_id)
    }

    /// Unknown ids are disabled.
    pub fn is_enabled(&self, tweak_id: &str) -> bool {
        self.states.get(tweak_id).is_some_and(|s| s.is_enabled)
    }

    pub fn is_applied(&self, tweak_id: &str) -> bool {
        self.states.get(tweak_id).is_some_and(|s| s.is_applied)
    }

    pub fn backup(&self, tweak_id: &str) -> Option<&BackupRecord> {
        self.states
            .get(tweak_id)
            .and_then(|s| s.backup_data.as_ref())
    }

    pub fn states(&self) -> impl Iterator<Item = (&String, &TweakState)> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn entry(&mut self, tweak_id: &str) -> &mut TweakState {
        let state = self.states.entry(tweak_id.to_string()).or_default();
        state.last_modified = Local::now();
        state
    }

    /// Records the enabled/applied flags and persists.
    pub fn set_state(
        &mut self,
        tweak_id: &str,
        enabled: bool,
        applied: bool,
    ) -> Result<(), StateStoreError> {
        let state = self.entry(tweak_id);
        state.is_enabled = enabled;
        state.is_applied = applied;
        debug!(
            "{} -> State set to enabled={}, applied={}.",
            tweak_id, enabled, applied
        );
        self.save()
    }

    /// Stores the backup record for a tweak, replacing any previous one, and persists.
    pub fn save_backup(
        &mut self,
        tweak_id: &str,
        record: BackupRecord,
    ) -> Result<(), StateStoreError> {
        debug!(
            "{} -> Storing backup with {} value(s).",
            tweak_id,
            record.len()
        );
        self.entry(tweak_id).backup_data = Some(record);
        self.save()
    }

    /// Drops the backup record for a tweak and persists. Unknown ids are a no-op.
    pub fn clear_backup(&mut self, tweak_id: &str) -> Result<(), StateStoreError> {
        if !self.states.contains_key(tweak_id) {
            return Ok(());
        }
        self.entry(tweak_id).backup_data = None;
        self.save()
    }
}
