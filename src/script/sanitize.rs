// src/script/sanitize.rs

use super::{is_reg_add_line, starts_with_ignore_case};
use crate::{
    constants::{COMMENT_PREFIX, FORCE_FLAG, REM_KEYWORD, SCRIPT_LINE_ENDING},
    utils::registry::RegistryRoot,
};

/// Normalizes raw script text into the form handed to the runner.
///
/// Blank lines and comments (`::` and `REM`) are dropped, registry-add lines
/// get their key path quoted and a forced-overwrite flag, and the surviving
/// lines are joined with CRLF. Empty input is returned unchanged. The
/// transform is idempotent.
pub fn sanitize(script: &str) -> String {
    if script.is_empty() {
        return String::new();
    }

    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .map(|line| {
            if is_reg_add_line(line) || starts_with_root_alias(line) {
                repair_reg_add(line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(SCRIPT_LINE_ENDING)
}

fn is_comment(line: &str) -> bool {
    if line.starts_with(COMMENT_PREFIX) {
        return true;
    }
    // `REM` only counts as a whole word; `REMOVE_X.exe` is a command.
    starts_with_ignore_case(line, REM_KEYWORD)
        && line[REM_KEYWORD.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// True when `token` starts with `<alias>\` for any known root alias.
fn token_has_root_prefix(token: &str) -> bool {
    RegistryRoot::aliases().any(|alias| {
        starts_with_ignore_case(token, alias)
            && token[alias.len()..].starts_with(crate::constants::PATH_SEPARATOR)
    })
}

fn starts_with_root_alias(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(token_has_root_prefix)
}

/// Whitespace-separated tokens of `line` with their byte offsets.
fn token_spans(line: &str) -> impl Iterator<Item = (usize, &str)> {
    line.split_whitespace()
        .map(move |token| (token.as_ptr() as usize - line.as_ptr() as usize, token))
}

/// Quotes the key-path token and appends the forced-overwrite flag.
/// Everything else in the line, including spacing inside data, is kept as is.
fn repair_reg_add(line: &str) -> String {
    let mut repaired = line.to_string();

    let already_quoted = line
        .split_whitespace()
        .any(|token| token.strip_prefix('"').is_some_and(token_has_root_prefix));

    if !already_quoted {
        if let Some((start, token)) = token_spans(line).find(|(_, t)| token_has_root_prefix(t)) {
            // Closing quote first so `start` stays valid.
            if !token.ends_with('"') {
                repaired.insert(start + token.len(), '"');
            }
            repaired.insert(start, '"');
        }
    }

    let has_force_flag = line
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case(FORCE_FLAG));
    if !has_force_flag {
        repaired.push(' ');
        repaired.push_str(FORCE_FLAG);
    }

    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_unchanged() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_drops_comments_and_blank_lines() {
        let script = ":: header\n\nREM explain\r\n   \n@echo off\nrem lower case\n";
        assert_eq!(sanitize(script), "@echo off");
    }

    #[test]
    fn test_rem_prefix_inside_word_is_not_a_comment() {
        assert_eq!(sanitize("REMOVE_TEMP.exe"), "REMOVE_TEMP.exe");
    }

    #[test]
    fn test_joins_with_crlf_and_trims() {
        let script = "  echo one  \necho two";
        assert_eq!(sanitize(script), "echo one\r\necho two");
    }

    #[test]
    fn test_quotes_key_and_appends_force_flag() {
        let script = "REG ADD HKLM\\Software\\X /v Y /t REG_DWORD /d 1";
        assert_eq!(
            sanitize(script),
            "REG ADD \"HKLM\\Software\\X\" /v Y /t REG_DWORD /d 1 /f"
        );
    }

    #[test]
    fn test_repairs_bare_root_alias_line() {
        let sanitized = sanitize("HKLM\\Software\\X /v Y /d 1");
        assert!(sanitized.starts_with("\"HKLM\\Software\\X\""));
        assert!(sanitized.ends_with(" /f"));
    }

    #[test]
    fn test_already_quoted_key_is_left_alone() {
        let script = "REG ADD \"HKCU\\Control Panel\\Mouse\" /v MouseSpeed /d 0 /f";
        assert_eq!(sanitize(script), script);
    }

    #[test]
    fn test_repair_keeps_spacing_inside_data() {
        let repaired = "REG ADD \"HKCU\\X\" /v Y /t REG_SZ /d \"a  b\" /f";
        assert_eq!(sanitize(repaired), repaired);

        let tabbed = "REG ADD HKCU\\X /v Y /t REG_SZ /d \"a\tb\"";
        assert_eq!(
            sanitize(tabbed),
            "REG ADD \"HKCU\\X\" /v Y /t REG_SZ /d \"a\tb\" /f"
        );

        let wide = "REG  ADD   HKLM\\Software\\X  /v Y /d  1";
        assert_eq!(
            sanitize(wide),
            "REG  ADD   \"HKLM\\Software\\X\"  /v Y /d  1 /f"
        );
    }

    #[test]
    fn test_long_root_alias_gets_quoted() {
        let script = "reg add HKEY_CURRENT_USER\\Software\\Foo /v Bar /d 1";
        assert_eq!(
            sanitize(script),
            "reg add \"HKEY_CURRENT_USER\\Software\\Foo\" /v Bar /d 1 /f"
        );
    }

    #[test]
    fn test_non_registry_lines_pass_through() {
        let script = "powercfg -setactive SCHEME_MIN\nsc config SysMain start= disabled";
        assert_eq!(
            sanitize(script),
            "powercfg -setactive SCHEME_MIN\r\nsc config SysMain start= disabled"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let scripts = [
            "",
            "REG ADD HKLM\\Software\\X /v Y /t REG_DWORD /d 1",
            "HKCU\\Software\\X /v Y /d 1\n:: c\nREM c\n\n",
            "REG ADD \"HKLM\\A B\\C\" /v \"Name\" /d \"a b\" /f\r\n@echo off",
            "reg add HKCU\\Software\\Half\" /v Q",
            "REG ADD HKEY_LOCAL_MACHINE\\SYSTEM\\X /v Y /d 0 /F",
            "REG ADD HKCU\\X /v Y /d \"a \t  b\"",
            "   \n\n",
        ];

        for script in scripts {
            let once = sanitize(script);
            let twice = sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", script);
        }
    }
}
