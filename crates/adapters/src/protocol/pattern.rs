// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File name matching with `*` and `?` globs

use regex::Regex;

/// A resolved file name pattern
///
/// `*` matches any run of characters and `?` matches exactly one. Every other
/// character matches itself.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Option<Regex>,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Self {
        let matcher = if Self::has_glob(pattern) {
            let mut expr = String::with_capacity(pattern.len() + 8);
            expr.push('^');
            for ch in pattern.chars() {
                match ch {
                    '*' => expr.push_str("[^/]*"),
                    '?' => expr.push_str("[^/]"),
                    other => expr.push_str(&regex::escape(&other.to_string())),
                }
            }
            expr.push('$');
            // Every literal is escaped, so the expression is always valid
            Regex::new(&expr).ok()
        } else {
            None
        };
        Self {
            source: pattern.to_string(),
            matcher,
        }
    }

    fn has_glob(pattern: &str) -> bool {
        pattern.contains(['*', '?'])
    }

    /// True when the pattern names exactly one file
    pub fn is_exact(&self) -> bool {
        self.matcher.is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Some(re) => re.is_match(name),
            None => self.source == name,
        }
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
