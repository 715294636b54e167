// src/utils/registry/memory.rs

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use tracing::trace;

use super::{RegistryKeyValue, RegistryPath, RegistryRoot, RegistryStore};
use crate::errors::RegistryError;

type KeyId = (RegistryRoot, String);

/// Values stored under one key, indexed by lowercase name.
/// The original spelling of each name is kept for enumeration.
type KeyValues = BTreeMap<String, (String, RegistryKeyValue)>;

/// In-process registry used when the real configuration store is unavailable
/// or must not be touched. Key and value names compare case-insensitively,
/// like the Windows registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: Mutex<BTreeMap<KeyId, KeyValues>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_id(path: &RegistryPath) -> KeyId {
        (path.root, path.subkey.to_lowercase())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<KeyId, KeyValues>> {
        // A poisoned map is still structurally valid.
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates the key if needed and writes the value. This is the equivalent
    /// of what a script's `REG ADD` does, as opposed to `RegistryStore::set`.
    pub fn insert(&self, path: &RegistryPath, value_name: &str, value: RegistryKeyValue) {
        trace!("Memory registry: {}\\{} <- {}", path, value_name, value);
        self.lock().entry(Self::key_id(path)).or_default().insert(
            value_name.to_lowercase(),
            (value_name.to_string(), value),
        );
    }

    /// Creates an empty key.
    pub fn create_key(&self, path: &RegistryPath) {
        self.lock().entry(Self::key_id(path)).or_default();
    }
}

impl RegistryStore for MemoryRegistry {
    fn get(
        &self,
        path: &RegistryPath,
        value_name: &str,
    ) -> Result<Option<RegistryKeyValue>, RegistryError> {
        let keys = self.lock();
        let values = keys
            .get(&Self::key_id(path))
            .ok_or_else(|| RegistryError::KeyOpenError(path.to_string()))?;

        Ok(values
            .get(&value_name.to_lowercase())
            .map(|(_, value)| value.clone()))
    }

    fn set(
        &self,
        path: &RegistryPath,
        value_name: &str,
        value: &RegistryKeyValue,
    ) -> Result<(), RegistryError> {
        let mut keys = self.lock();
        let values = keys
            .get_mut(&Self::key_id(path))
            .ok_or_else(|| RegistryError::KeyOpenError(path.to_string()))?;

        values.insert(
            value_name.to_lowercase(),
            (value_name.to_string(), value.clone()),
        );
        Ok(())
    }

    fn enumerate(
        &self,
        path: &RegistryPath,
    ) -> Result<Vec<(String, RegistryKeyValue)>, RegistryError> {
        let keys = self.lock();
        let values = keys
            .get(&Self::key_id(path))
            .ok_or_else(|| RegistryError::KeyOpenError(path.to_string()))?;

        Ok(values.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> RegistryPath {
        RegistryPath::parse(p).unwrap()
    }

    #[test]
    fn test_get_distinguishes_missing_key_and_missing_value() {
        let registry = MemoryRegistry::new();
        assert!(registry.get(&path("HKCU\\Foo"), "Bar").is_err());

        registry.create_key(&path("HKCU\\Foo"));
        assert_eq!(registry.get(&path("HKCU\\Foo"), "Bar").unwrap(), None);
    }

    #[test]
    fn test_names_are_case_insensitive_and_aliases_share_storage() {
        let registry = MemoryRegistry::new();
        registry.insert(&path("HKCU\\Software\\Foo"), "Bar", RegistryKeyValue::Dword(1));

        let value = registry
            .get(&path("HKEY_CURRENT_USER\\software\\FOO"), "bar")
            .unwrap();
        assert_eq!(value, Some(RegistryKeyValue::Dword(1)));
    }

    #[test]
    fn test_set_requires_existing_key() {
        let registry = MemoryRegistry::new();
        let result = registry.set(&path("HKLM\\Nope"), "X", &RegistryKeyValue::Dword(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_enumerate_keeps_original_names() {
        let registry = MemoryRegistry::new();
        let key = path("HKLM\\Software\\Enum");
        registry.insert(&key, "First", RegistryKeyValue::String("a".into()));
        registry.insert(&key, "Second", RegistryKeyValue::Binary(vec![1, 2]));

        let mut names: Vec<String> = registry
            .enumerate(&key)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["First".to_string(), "Second".to_string()]);
    }
}
