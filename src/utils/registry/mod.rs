// src/utils/registry/mod.rs

mod memory;
#[cfg(windows)]
mod winreg_store;

use std::fmt;

pub use memory::MemoryRegistry;
use serde::{Deserialize, Serialize};
#[cfg(windows)]
pub use winreg_store::WindowsRegistry;

use crate::{constants::PATH_SEPARATOR, errors::RegistryError};

/// The two configuration roots tweak scripts are allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistryRoot {
    LocalMachine,
    CurrentUser,
}

impl RegistryRoot {
    /// Every accepted spelling of each root, short forms first.
    const ALIASES: [(&'static str, RegistryRoot); 4] = [
        ("HKLM", RegistryRoot::LocalMachine),
        ("HKCU", RegistryRoot::CurrentUser),
        ("HKEY_LOCAL_MACHINE", RegistryRoot::LocalMachine),
        ("HKEY_CURRENT_USER", RegistryRoot::CurrentUser),
    ];

    /// Resolves a root alias (case-insensitive) to its canonical root.
    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|(_, root)| *root)
    }

    /// All alias spellings, used by the script sanitizer.
    pub fn aliases() -> impl Iterator<Item = &'static str> {
        Self::ALIASES.iter().map(|(name, _)| *name)
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            RegistryRoot::LocalMachine => "HKEY_LOCAL_MACHINE",
            RegistryRoot::CurrentUser => "HKEY_CURRENT_USER",
        }
    }
}

/// A key path split into its canonical root and the subkey below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryPath {
    pub root: RegistryRoot,
    pub subkey: String,
}

impl RegistryPath {
    /// Parses a full key path such as `HKLM\Software\X`.
    ///
    /// # Returns
    ///
    /// - `Ok(RegistryPath)` when the root alias is known and a subkey follows it.
    /// - `Err(RegistryError)` otherwise.
    pub fn parse(path: &str) -> Result<Self, RegistryError> {
        let trimmed = path.trim().trim_matches('"');
        let (alias, subkey) = trimmed.split_once(PATH_SEPARATOR).ok_or_else(|| {
            RegistryError::InvalidKeyFormat(format!(
                "'{}'. Expected format 'HKxx\\Subkey\\...'",
                path
            ))
        })?;

        let root = RegistryRoot::from_alias(alias)
            .ok_or_else(|| RegistryError::UnsupportedHive(alias.to_string()))?;

        let subkey = subkey.trim_matches(PATH_SEPARATOR);
        if subkey.is_empty() {
            return Err(RegistryError::InvalidKeyFormat(format!(
                "'{}' has no subkey",
                path
            )));
        }

        Ok(Self {
            root,
            subkey: subkey.to_string(),
        })
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.root.canonical_name(),
            PATH_SEPARATOR,
            self.subkey
        )
    }
}

/// Enumeration of supported registry value types.
///
/// Serialized with an explicit kind tag so a value read back from the state
/// file is written with the same registry type it was captured with.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "Kind", content = "Data")]
pub enum RegistryKeyValue {
    Dword(u32),
    Qword(u64),
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    Binary(Vec<u8>),
}

impl fmt::Display for RegistryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKeyValue::Dword(v) => write!(f, "Dword({})", v),
            RegistryKeyValue::Qword(v) => write!(f, "Qword({})", v),
            RegistryKeyValue::String(v) => write!(f, "String({})", v),
            RegistryKeyValue::ExpandString(v) => write!(f, "ExpandString({})", v),
            RegistryKeyValue::MultiString(v) => write!(f, "MultiString({:?})", v),
            RegistryKeyValue::Binary(v) => write!(f, "Binary({:?})", v),
        }
    }
}

/// Key-value view of the OS configuration store.
///
/// `get` distinguishes a missing value (`Ok(None)`) from a key that cannot be
/// opened (`Err`). `set` only opens existing keys for write; it never creates
/// intermediate keys.
pub trait RegistryStore: Send + Sync {
    fn get(
        &self,
        path: &RegistryPath,
        value_name: &str,
    ) -> Result<Option<RegistryKeyValue>, RegistryError>;

    fn set(
        &self,
        path: &RegistryPath,
        value_name: &str,
        value: &RegistryKeyValue,
    ) -> Result<(), RegistryError>;

    fn enumerate(&self, path: &RegistryPath)
        -> Result<Vec<(String, RegistryKeyValue)>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_aliases_resolve_case_insensitively() {
        assert_eq!(
            RegistryRoot::from_alias("hklm"),
            Some(RegistryRoot::LocalMachine)
        );
        assert_eq!(
            RegistryRoot::from_alias("HKEY_current_USER"),
            Some(RegistryRoot::CurrentUser)
        );
        assert_eq!(RegistryRoot::from_alias("HKCR"), None);
    }

    #[test]
    fn test_parse_short_and_long_forms_to_same_path() {
        let short = RegistryPath::parse("HKCU\\Software\\Foo").unwrap();
        let long = RegistryPath::parse("HKEY_CURRENT_USER\\Software\\Foo").unwrap();
        assert_eq!(short, long);
        assert_eq!(short.to_string(), "HKEY_CURRENT_USER\\Software\\Foo");
    }

    #[test]
    fn test_parse_strips_quotes() {
        let path = RegistryPath::parse("\"HKLM\\Software\\X\"").unwrap();
        assert_eq!(path.root, RegistryRoot::LocalMachine);
        assert_eq!(path.subkey, "Software\\X");
    }

    #[test]
    fn test_invalid_registry_path() {
        let invalid_paths = vec![
            "",
            "INVALID_HIVE\\Software",
            "HKEY_CLASSES_ROOT\\Software",
            "HKEY_CURRENT_USER", // Missing subkey
            "HKLM\\",
        ];

        for path in invalid_paths {
            let result = RegistryPath::parse(path);
            assert!(result.is_err(), "Path '{}' should be invalid", path);
        }
    }

    #[test]
    fn test_value_serializes_with_kind_tag() {
        let json = serde_json::to_value(RegistryKeyValue::Dword(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "Kind": "Dword", "Data": 7 }));

        let back: RegistryKeyValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, RegistryKeyValue::Dword(7));
    }
}
