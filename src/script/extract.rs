// src/script/extract.rs

use super::is_reg_add_line;
use crate::constants::VALUE_FLAG;

/// One registry slot a script writes to, as written in the script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryReference {
    pub key_path: String,
    pub value_name: String,
}

impl RegistryReference {
    pub fn new(key_path: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            value_name: value_name.into(),
        }
    }
}

/// Position of the key path token: `REG`, `ADD`, then the key.
const KEY_PATH_TOKEN_INDEX: usize = 2;

/// Lists every (key path, value name) pair written by `REG ADD` lines, in
/// source order. Duplicates are kept. Lines missing either part are skipped.
///
/// Tokenization is plain whitespace splitting, so a quoted key path that
/// contains spaces yields only its first word.
pub fn extract_registry_references(script: &str) -> Vec<RegistryReference> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| is_reg_add_line(line))
        .filter_map(parse_reg_add_line)
        .collect()
}

fn parse_reg_add_line(line: &str) -> Option<RegistryReference> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let key_path = tokens
        .get(KEY_PATH_TOKEN_INDEX)
        .map(|token| token.trim_matches('"'))
        .filter(|token| !token.is_empty())?;

    let value_name = tokens
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(VALUE_FLAG))
        .map(|pair| pair[1].trim_matches('"'))
        .filter(|name| !name.is_empty())?;

    Some(RegistryReference::new(key_path, value_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_quoted_key_and_value() {
        let refs =
            extract_registry_references("REG ADD \"HKLM\\Software\\X\" /v Y /t REG_SZ /d test /f");
        assert_eq!(refs, vec![RegistryReference::new("HKLM\\Software\\X", "Y")]);
    }

    #[test]
    fn test_keeps_source_order_and_duplicates() {
        let script = "\
REG ADD HKCU\\A /v One /d 1
echo skipped
reg add \"HKLM\\B\" /V \"Two\" /d 2 /f
REG ADD HKCU\\A /v One /d 3";

        let refs = extract_registry_references(script);
        assert_eq!(
            refs,
            vec![
                RegistryReference::new("HKCU\\A", "One"),
                RegistryReference::new("HKLM\\B", "Two"),
                RegistryReference::new("HKCU\\A", "One"),
            ]
        );
    }

    #[test]
    fn test_lines_without_value_flag_are_ignored() {
        let script = "REG ADD HKCU\\Software\\Key /f\nREG ADD HKCU\\Software\\Key /ve /d x";
        assert!(extract_registry_references(script).is_empty());
    }

    #[test]
    fn test_value_flag_as_last_token_is_ignored() {
        assert!(extract_registry_references("REG ADD HKCU\\K /v").is_empty());
    }

    #[test]
    fn test_non_reg_add_commands_are_ignored() {
        let script = "REG DELETE HKCU\\K /v V /f\nREGEDIT /s file.reg\nsc stop X";
        assert!(extract_registry_references(script).is_empty());
    }

    #[test]
    fn test_extraction_is_syntactic_only() {
        let refs = extract_registry_references("REG ADD NotARoot\\Path /v Name");
        assert_eq!(refs, vec![RegistryReference::new("NotARoot\\Path", "Name")]);
    }
}
