// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Date token resolution for path and name patterns
//!
//! Patterns carry placeholders such as `{yyyy}` or `{yyyymmdd}` that are
//! replaced with the calendar fields of a reference instant, viewed in the
//! configuration's time zone. Anything inside braces that is not a known
//! token is copied through untouched, so a typo yields a visibly wrong path
//! instead of an error.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("constant regex pattern is valid"));

/// Recognized tokens and the strftime format each expands to
const TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("yy", "%y"),
    ("mm", "%m"),
    ("dd", "%d"),
    ("hh", "%H"),
    ("yyyymmdd", "%Y%m%d"),
    ("yymmdd", "%y%m%d"),
    ("yyyymm", "%Y%m"),
    ("mmdd", "%m%d"),
    ("yyyy-mm-dd", "%Y-%m-%d"),
];

fn token_format(name: &str) -> Option<&'static str> {
    TOKENS
        .iter()
        .find(|(token, _)| *token == name)
        .map(|(_, format)| *format)
}

/// Resolve every recognized `{token}` in `template` against `at` in `zone`
pub fn resolve(template: &str, at: DateTime<Utc>, zone: Tz) -> String {
    let local = at.with_timezone(&zone);
    TOKEN_PATTERN
        .replace_all(template, |caps: &regex::Captures| match token_format(&caps[1]) {
            Some(format) => local.format(format).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Brace groups in `template` that are not recognized tokens
///
/// Used by configuration validation to warn about likely typos.
pub fn unrecognized_tokens(template: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(template)
        .filter(|caps| token_format(&caps[1]).is_none())
        .map(|caps| caps[0].to_string())
        .collect()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
