// src/config.rs

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::level_filters::LevelFilter;

use crate::constants::{
    APP_DATA_DIR_NAME, STATE_FILE_ENV, STATE_FILE_NAME, TWEAKS_DIR_ENV, TWEAKS_DIR_NAME,
};

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tweaks_dir: PathBuf,
    pub state_file: PathBuf,
    /// Number of `-v` flags given.
    pub verbosity: u8,
}

impl Settings {
    /// Resolves each path from the explicit override, then the environment,
    /// then the built-in default.
    pub fn resolve(
        tweaks_dir: Option<PathBuf>,
        state_file: Option<PathBuf>,
        verbosity: u8,
    ) -> anyhow::Result<Self> {
        Self::resolve_with(tweaks_dir, state_file, verbosity, |key| env::var_os(key))
    }

    fn resolve_with<E>(
        tweaks_dir: Option<PathBuf>,
        state_file: Option<PathBuf>,
        verbosity: u8,
        lookup: E,
    ) -> anyhow::Result<Self>
    where
        E: Fn(&str) -> Option<OsString>,
    {
        let from_env = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let tweaks_dir = match tweaks_dir.or_else(|| from_env(TWEAKS_DIR_ENV)) {
            Some(dir) => dir,
            None => default_tweaks_dir(),
        };
        let state_file = match state_file.or_else(|| from_env(STATE_FILE_ENV)) {
            Some(file) => file,
            None => default_state_file()?,
        };

        Ok(Self {
            tweaks_dir,
            state_file,
            verbosity,
        })
    }

    /// Log level for the configured verbosity.
    pub fn level_filter(&self) -> LevelFilter {
        level_filter_for(self.verbosity)
    }
}

fn level_filter_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `Tweaks` next to the executable when it exists, otherwise `./Tweaks`.
pub fn default_tweaks_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join(TWEAKS_DIR_NAME))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(TWEAKS_DIR_NAME))
}

/// The state file under the per-user data directory.
pub fn default_state_file() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not determine the user data directory")?;
    Ok(data_dir.join(APP_DATA_DIR_NAME).join(STATE_FILE_NAME))
}
