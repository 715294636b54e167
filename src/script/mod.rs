// src/script/mod.rs

//! The narrow slice of the batch dialect the core understands: `REG ADD`
//! lines. Everything else in a script is opaque and passed through.

mod extract;
mod sanitize;

pub use extract::{extract_registry_references, RegistryReference};
pub use sanitize::sanitize;

use crate::constants::REG_ADD_KEYWORD;

/// True when the first tokens of `line` spell the `REG ADD` keyword.
pub(crate) fn is_reg_add_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    REG_ADD_KEYWORD.split_whitespace().all(|expected| {
        tokens
            .next()
            .is_some_and(|token| token.eq_ignore_ascii_case(expected))
    })
}

pub(crate) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
