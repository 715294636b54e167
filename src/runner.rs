// src/runner.rs

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::TempPath;
use tracing::{debug, error, info, warn};

use crate::{
    constants::{COMMAND_INTERPRETER, TEMP_SCRIPT_PREFIX, TEMP_SCRIPT_SUFFIX},
    errors::RunnerError,
    utils::elevation::run_elevated,
};

/// Executes sanitized script text and reports whether it succeeded.
pub trait ScriptRunner: Send + Sync {
    /// Runs the script to completion. Blocking.
    fn run(&self, script: &str) -> bool;
}

/// Runs scripts as a transient `.bat` file under an elevated, hidden
/// command interpreter.
#[derive(Debug, Default, Clone)]
pub struct ElevatedScriptRunner {
    /// Where script files are written; the system temp directory when unset.
    temp_dir: Option<PathBuf>,
}

impl ElevatedScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(temp_dir.into()),
        }
    }

    /// Writes the script, runs it, and always removes the file afterwards.
    fn execute(&self, script: &str) -> Result<u32, RunnerError> {
        let script_path = write_temp_script(script, self.temp_dir.as_deref())?;
        debug!("Wrote temporary script '{}'.", script_path.display());

        let parameters = format!("/c \"{}\"", script_path.display());
        let result = run_elevated(COMMAND_INTERPRETER, &parameters);

        let shown = script_path.display().to_string();
        if let Err(e) = script_path.close() {
            warn!("Failed to delete temporary script '{}': {}", shown, e);
        }

        result
    }
}

impl ScriptRunner for ElevatedScriptRunner {
    fn run(&self, script: &str) -> bool {
        match self.execute(script) {
            Ok(0) => {
                info!("Elevated script finished successfully.");
                true
            }
            Ok(code) => {
                warn!("Elevated script exited with code {}.", code);
                false
            }
            Err(e) => {
                error!("Elevated script did not run: {}", e);
                false
            }
        }
    }
}

/// Creates a uniquely named `tweak_*.bat` file in `dir`, or the system temp
/// directory. The returned path deletes the file when closed or dropped.
fn write_temp_script(script: &str, dir: Option<&Path>) -> Result<TempPath, RunnerError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_SCRIPT_PREFIX).suffix(TEMP_SCRIPT_SUFFIX);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(RunnerError::TempFile)?;

    file.write_all(script.as_bytes())
        .and_then(|_| file.flush())
        .map_err(RunnerError::TempFile)?;

    // Release our handle so the interpreter can open the file.
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_temp_script_is_named_and_written() {
        let path = write_temp_script("echo one\r\necho two", None).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with(TEMP_SCRIPT_PREFIX));
        assert!(name.ends_with(TEMP_SCRIPT_SUFFIX));
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo one\r\necho two");
    }

    #[test]
    fn test_temp_script_is_removed_after_close() {
        let path = write_temp_script("exit 0", None).unwrap();
        let location = path.to_path_buf();
        assert!(location.exists());

        path.close().unwrap();
        assert!(!location.exists());
    }

    fn script_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(TEMP_SCRIPT_PREFIX) && name.ends_with(TEMP_SCRIPT_SUFFIX))
            .collect()
    }

    #[test]
    fn test_temp_script_is_written_to_chosen_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_script("exit 0", Some(dir.path())).unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(script_files(dir.path()).len(), 1);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_failed_run_leaves_no_script_behind() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ElevatedScriptRunner::in_dir(dir.path());

        assert!(!runner.run("exit 0"));
        assert!(script_files(dir.path()).is_empty());
    }
}
