// src/utils/registry/winreg_store.rs

use tracing::trace;
use winreg::{
    enums::{
        RegType::{REG_BINARY, REG_DWORD, REG_EXPAND_SZ, REG_MULTI_SZ, REG_QWORD, REG_SZ},
        HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WRITE,
    },
    types::{FromRegValue, ToRegValue},
    RegKey, RegValue,
};

use super::{RegistryKeyValue, RegistryPath, RegistryRoot, RegistryStore};
use crate::errors::RegistryError;

/// `RegistryStore` bound to the live Windows registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &RegistryPath, flags: u32) -> Result<RegKey, RegistryError> {
        let hive = match path.root {
            RegistryRoot::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
            RegistryRoot::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
        };

        hive.open_subkey_with_flags(&path.subkey, flags)
            .map_err(|e| RegistryError::KeyOpenError(format!("'{}': {}", path, e)))
    }
}

impl RegistryStore for WindowsRegistry {
    fn get(
        &self,
        path: &RegistryPath,
        value_name: &str,
    ) -> Result<Option<RegistryKeyValue>, RegistryError> {
        let key = Self::open(path, KEY_READ)?;

        match key.get_raw_value(value_name) {
            Ok(raw) => decode_value(value_name, &raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::ReadValueError(format!(
                "'{}' in '{}': {}",
                value_name, path, e
            ))),
        }
    }

    fn set(
        &self,
        path: &RegistryPath,
        value_name: &str,
        value: &RegistryKeyValue,
    ) -> Result<(), RegistryError> {
        let key = Self::open(path, KEY_WRITE)?;
        trace!("Writing {} to '{}\\{}'", value, path, value_name);

        key.set_raw_value(value_name, &encode_value(value))
            .map_err(|e| {
                RegistryError::SetValueError(format!(
                    "'{}' to '{}' in '{}': {}",
                    value_name, value, path, e
                ))
            })
    }

    fn enumerate(
        &self,
        path: &RegistryPath,
    ) -> Result<Vec<(String, RegistryKeyValue)>, RegistryError> {
        let key = Self::open(path, KEY_READ)?;

        let mut values = Vec::new();
        for entry in key.enum_values() {
            let (name, raw) = entry.map_err(|e| {
                RegistryError::ReadValueError(format!("enumerating '{}': {}", path, e))
            })?;
            match decode_value(&name, &raw) {
                Ok(value) => values.push((name, value)),
                Err(e) => trace!("Skipping '{}' in '{}': {}", name, path, e),
            }
        }
        Ok(values)
    }
}

/// Converts a raw registry value into the typed representation.
fn decode_value(value_name: &str, raw: &RegValue) -> Result<RegistryKeyValue, RegistryError> {
    let read_error =
        |e: std::io::Error| RegistryError::ReadValueError(format!("'{}': {}", value_name, e));

    match raw.vtype {
        REG_DWORD => u32::from_reg_value(raw)
            .map(RegistryKeyValue::Dword)
            .map_err(read_error),
        REG_QWORD => u64::from_reg_value(raw)
            .map(RegistryKeyValue::Qword)
            .map_err(read_error),
        REG_SZ => String::from_reg_value(raw)
            .map(RegistryKeyValue::String)
            .map_err(read_error),
        REG_EXPAND_SZ => String::from_reg_value(raw)
            .map(RegistryKeyValue::ExpandString)
            .map_err(read_error),
        REG_MULTI_SZ => Vec::<String>::from_reg_value(raw)
            .map(RegistryKeyValue::MultiString)
            .map_err(read_error),
        REG_BINARY => Ok(RegistryKeyValue::Binary(raw.bytes.clone())),
        ref other => Err(RegistryError::UnsupportedValueType(format!(
            "{:?} for '{}'",
            other, value_name
        ))),
    }
}

fn encode_value(value: &RegistryKeyValue) -> RegValue {
    match value {
        RegistryKeyValue::Dword(v) => v.to_reg_value(),
        RegistryKeyValue::Qword(v) => v.to_reg_value(),
        RegistryKeyValue::String(s) => s.to_reg_value(),
        RegistryKeyValue::ExpandString(s) => {
            let mut raw = s.to_reg_value();
            raw.vtype = REG_EXPAND_SZ;
            raw
        }
        RegistryKeyValue::MultiString(v) => v.to_reg_value(),
        RegistryKeyValue::Binary(data) => RegValue {
            bytes: data.clone(),
            vtype: REG_BINARY,
        },
    }
}
