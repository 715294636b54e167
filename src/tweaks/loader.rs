// src/tweaks/loader.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::Tweak;
use crate::{constants::UNTITLED_TWEAK, errors::LoaderError, state::StateStore};

/// On-disk tweak artifact.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TweakFileData {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    batch_title: Option<String>,
    #[serde(default)]
    batch_content: Option<String>,
}

/// Reads tweak artifacts from a directory tree.
///
/// Only files without any `.` in their name are artifacts; the file name is
/// the tweak id.
#[derive(Debug, Clone)]
pub struct TweakLoader {
    tweaks_dir: PathBuf,
}

impl TweakLoader {
    pub fn new(tweaks_dir: impl Into<PathBuf>) -> Self {
        Self {
            tweaks_dir: tweaks_dir.into(),
        }
    }

    pub fn tweaks_dir(&self) -> &Path {
        &self.tweaks_dir
    }

    /// Loads every usable tweak and seeds `enabled` from `states`.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Tweak>)` in path order. Unreadable, malformed, unsuccessful
    ///   or empty artifacts are logged and left out.
    /// - `Err(LoaderError)` if the directory itself is missing or unreadable.
    pub fn load(&self, states: &StateStore) -> Result<Vec<Tweak>, LoaderError> {
        if !self.tweaks_dir.is_dir() {
            return Err(LoaderError::DirectoryNotFound(
                self.tweaks_dir.display().to_string(),
            ));
        }

        let mut files = Vec::new();
        collect_artifacts(&self.tweaks_dir, &mut files)?;
        files.sort();
        debug!(
            "Found {} tweak file(s) in '{}'.",
            files.len(),
            self.tweaks_dir.display()
        );

        let mut tweaks = Vec::with_capacity(files.len());
        for file in &files {
            match load_artifact(file) {
                Ok(Some(mut tweak)) => {
                    tweak.enabled = states.is_enabled(&tweak.id);
                    tweaks.push(tweak);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping tweak file: {}", e),
            }
        }

        info!("Loaded {} tweak(s).", tweaks.len());
        Ok(tweaks)
    }
}

fn collect_artifacts(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoaderError> {
    let read_error = |source| LoaderError::Read {
        path: dir.display().to_string(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            collect_artifacts(&path, files)?;
        } else if is_artifact_name(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_artifact_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| !name.to_string_lossy().contains('.'))
        .unwrap_or(false)
}

/// Parses one artifact.
///
/// # Returns
///
/// - `Ok(Some(Tweak))` for a successful artifact with script content.
/// - `Ok(None)` when the artifact is marked unsuccessful or has no script.
/// - `Err(LoaderError)` when it cannot be read or parsed.
fn load_artifact(path: &Path) -> Result<Option<Tweak>, LoaderError> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| LoaderError::Read {
        path: shown.clone(),
        source,
    })?;
    let data: TweakFileData =
        serde_json::from_str(&content).map_err(|source| LoaderError::Parse {
            path: shown.clone(),
            source,
        })?;

    let script = match data.batch_content {
        Some(script) if data.success && !script.is_empty() => script,
        _ => {
            debug!("'{}' has no usable script; skipping.", shown);
            return Ok(None);
        }
    };

    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = data
        .batch_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_TWEAK.to_string());

    Ok(Some(Tweak::new(id, title, script)))
}

#[cfg(test)]
mod tests {
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::tweaks::TweakCategory;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn artifact(title: &str, content: &str) -> String {
        serde_json::json!({
            "success": true,
            "batchTitle": title,
            "batchContent": content,
        })
        .to_string()
    }

    fn empty_states(dir: &TempDir) -> StateStore {
        StateStore::new(dir.path().join("states.json"))
    }

    #[test]
    fn test_load_reads_extensionless_files_recursively() {
        let dir = tempdir().unwrap();
        let tweaks_dir = dir.path().join("Tweaks");
        fs::create_dir_all(tweaks_dir.join("gpu")).unwrap();

        write(&tweaks_dir, "menu_delay", &artifact("Menu delay", "REG ADD HKCU\\X /v Y /d 0"));
        write(
            &tweaks_dir.join("gpu"),
            "nv_latency",
            &artifact("NVIDIA latency", "REG ADD HKLM\\X /v Y /d 1"),
        );
        write(&tweaks_dir, "ignored.json", &artifact("Ignored", "echo"));
        write(&tweaks_dir, "app.config", "<xml/>");

        let tweaks = TweakLoader::new(&tweaks_dir)
            .load(&empty_states(&dir))
            .unwrap();

        let ids: Vec<_> = tweaks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["nv_latency", "menu_delay"]);
        assert_eq!(tweaks[0].category, TweakCategory::Nvidia);
        assert_eq!(tweaks[1].title, "Menu delay");
    }

    #[test]
    fn test_load_skips_unusable_artifacts() {
        let dir = tempdir().unwrap();
        let tweaks_dir = dir.path().join("Tweaks");
        fs::create_dir_all(&tweaks_dir).unwrap();

        write(&tweaks_dir, "broken", "{ not json");
        write(
            &tweaks_dir,
            "failed",
            r#"{ "success": false, "batchTitle": "X", "batchContent": "echo" }"#,
        );
        write(&tweaks_dir, "empty", &artifact("Empty", ""));
        write(
            &tweaks_dir,
            "untitled",
            r#"{ "success": true, "batchContent": "echo hi" }"#,
        );

        let tweaks = TweakLoader::new(&tweaks_dir)
            .load(&empty_states(&dir))
            .unwrap();

        assert_eq!(tweaks.len(), 1);
        assert_eq!(tweaks[0].id, "untitled");
        assert_eq!(tweaks[0].title, UNTITLED_TWEAK);
    }

    #[test]
    fn test_load_seeds_enabled_from_state() {
        let dir = tempdir().unwrap();
        let tweaks_dir = dir.path().join("Tweaks");
        fs::create_dir_all(&tweaks_dir).unwrap();
        write(&tweaks_dir, "on", &artifact("On", "echo on"));
        write(&tweaks_dir, "off", &artifact("Off", "echo off"));

        let mut states = empty_states(&dir);
        states.set_state("on", true, true).unwrap();

        let tweaks = TweakLoader::new(&tweaks_dir).load(&states).unwrap();
        let on = tweaks.iter().find(|t| t.id == "on").unwrap();
        let off = tweaks.iter().find(|t| t.id == "off").unwrap();
        assert!(on.enabled);
        assert!(!on.applied);
        assert!(!off.enabled);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = TweakLoader::new(dir.path().join("nope")).load(&empty_states(&dir));
        assert!(matches!(result, Err(LoaderError::DirectoryNotFound(_))));
    }
}
