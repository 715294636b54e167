// src/errors.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid registry key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Unsupported registry hive: {0}")]
    UnsupportedHive(String),

    #[error("Failed to open registry key: {0}")]
    KeyOpenError(String),

    #[error("Failed to read registry value: {0}")]
    ReadValueError(String),

    #[error("Failed to set registry value: {0}")]
    SetValueError(String),

    #[error("Unsupported registry value type: {0}")]
    UnsupportedValueType(String),
}

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Failed to access state file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize tweak states: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to prepare temporary script file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to launch elevated process: {0}")]
    Launch(String),

    #[error("Failed to wait for elevated process: {0}")]
    Wait(String),

    #[error("Elevated execution is not supported on this platform")]
    Unsupported,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Tweaks directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Failed to read tweak file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse tweak file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
