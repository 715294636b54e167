// src/backup.rs

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    constants::PATH_SEPARATOR,
    script::{extract_registry_references, RegistryReference},
    utils::registry::{RegistryKeyValue, RegistryPath, RegistryStore},
};

/// Values captured before a tweak runs, keyed by `"keyPath\valueName"`.
///
/// Key paths are kept exactly as the script spelled them; the root alias is
/// only resolved when a value is read or written.
///
/// In the state file each entry maps to a `{"Kind": ..., "Data": ...}` object
/// rather than a bare value, e.g. `"HKLM\\X\\Y": {"Kind": "Dword", "Data": 1}`.
/// The kind tag lets `restore` write a DWORD back as a DWORD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupRecord(IndexMap<String, RegistryKeyValue>);

impl BackupRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composite_key(reference: &RegistryReference) -> String {
        format!(
            "{}{}{}",
            reference.key_path, PATH_SEPARATOR, reference.value_name
        )
    }

    /// Splits a composite key at its last separator.
    pub fn split_composite_key(key: &str) -> Option<(&str, &str)> {
        key.rsplit_once(PATH_SEPARATOR)
            .filter(|(path, name)| !path.is_empty() && !name.is_empty())
    }

    pub fn insert(&mut self, reference: &RegistryReference, value: RegistryKeyValue) {
        self.0.insert(Self::composite_key(reference), value);
    }

    pub fn contains(&self, reference: &RegistryReference) -> bool {
        self.0.contains_key(&Self::composite_key(reference))
    }

    pub fn get(&self, composite_key: &str) -> Option<&RegistryKeyValue> {
        self.0.get(composite_key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryKeyValue)> {
        self.0.iter()
    }
}

/// What a restore pass did. Entries that could not be written are skipped,
/// never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub skipped: usize,
}

/// Captures and restores registry values through a `RegistryStore`.
#[derive(Clone)]
pub struct BackupStore {
    registry: Arc<dyn RegistryStore>,
}

impl BackupStore {
    pub fn new(registry: Arc<dyn RegistryStore>) -> Self {
        Self { registry }
    }

    /// Reads the current value of every slot `script` writes to.
    ///
    /// # Returns
    ///
    /// - `Some(BackupRecord)` with every value that could be read.
    /// - `None` if nothing could be captured, so there is nothing to restore.
    pub fn snapshot(&self, tweak_id: &str, script: &str) -> Option<BackupRecord> {
        let references = extract_registry_references(script);
        debug!(
            "{} -> Found {} registry reference(s) to back up.",
            tweak_id,
            references.len()
        );

        let mut record = BackupRecord::new();
        for reference in &references {
            if record.contains(reference) {
                continue;
            }

            match self.read(reference) {
                Ok(Some(value)) => {
                    trace!(
                        "{} -> Captured '{}\\{}' = {}.",
                        tweak_id,
                        reference.key_path,
                        reference.value_name,
                        value
                    );
                    record.insert(reference, value);
                }
                Ok(None) => {
                    debug!(
                        "{} -> '{}\\{}' does not exist yet; nothing to back up.",
                        tweak_id, reference.key_path, reference.value_name
                    );
                }
                Err(e) => {
                    debug!(
                        "{} -> Could not back up '{}\\{}': {}",
                        tweak_id, reference.key_path, reference.value_name, e
                    );
                }
            }
        }

        if record.is_empty() {
            None
        } else {
            Some(record)
        }
    }

    fn read(&self, reference: &RegistryReference) -> anyhow::Result<Option<RegistryKeyValue>> {
        let path = RegistryPath::parse(&reference.key_path)?;
        Ok(self.registry.get(&path, &reference.value_name)?)
    }

    /// Writes every captured value back. A failing entry is logged and
    /// skipped; the pass always runs to the end.
    pub fn restore(&self, tweak_id: &str, record: &BackupRecord) -> RestoreSummary {
        let mut summary = RestoreSummary::default();

        for (composite_key, value) in record.iter() {
            match self.write(composite_key, value) {
                Ok(()) => {
                    trace!("{} -> Restored '{}' to {}.", tweak_id, composite_key, value);
                    summary.restored += 1;
                }
                Err(e) => {
                    warn!("{} -> Failed to restore '{}': {}", tweak_id, composite_key, e);
                    summary.skipped += 1;
                }
            }
        }

        debug!(
            "{} -> Restore finished: {} restored, {} skipped.",
            tweak_id, summary.restored, summary.skipped
        );
        summary
    }

    fn write(&self, composite_key: &str, value: &RegistryKeyValue) -> anyhow::Result<()> {
        let (key_path, value_name) = BackupRecord::split_composite_key(composite_key)
            .ok_or_else(|| anyhow::anyhow!("Malformed backup key '{}'", composite_key))?;
        let path = RegistryPath::parse(key_path)?;
        self.registry.set(&path, value_name, value)?;
        Ok(())
    }
}
