//! # Path Matcher Module
//!
//! Valuta il pattern `--exclude` contro i path visitati dal walker.
//!
//! ## Regole:
//! - Il pattern è compilato una sola volta all'avvio (`globset`)
//! - Supporta alternative con le graffe: `{.git,*.jpg}`
//! - `*` attraversa anche i separatori: il pattern copre l'intero path
//! - Pattern vuoto o assente: non esclude mai nulla
//! - I path vengono normalizzati con `/` prima del confronto

use crate::error::OptimizeError;
use globset::{Glob, GlobMatcher};
use std::path::Path;

/// Compiled exclusion rule.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    pattern: String,
    matcher: Option<GlobMatcher>,
}

impl PathMatcher {
    /// Compile `pattern`. `None` and `""` produce a matcher that never matches.
    pub fn new(pattern: Option<&str>) -> Result<Self, OptimizeError> {
        match pattern.filter(|p| !p.is_empty()) {
            Some(pattern) => Ok(Self {
                pattern: pattern.to_string(),
                matcher: Some(Glob::new(pattern)?.compile_matcher()),
            }),
            None => Ok(Self::default()),
        }
    }

    /// The raw pattern as given on the command line.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match an already normalized path.
    pub fn matches(&self, normalized_path: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|m| m.is_match(normalized_path))
    }

    /// Match a filesystem path in its normalized `/` form.
    ///
    /// Without a pattern the path is never converted.
    pub fn matches_path(&self, path: &Path) -> bool {
        self.matcher.is_some() && self.matches(&normalize(path))
    }
}

/// Convert OS separators to `/` and drop leading `./` components.
pub fn normalize(path: &Path) -> String {
    let slashed = path.to_string_lossy().replace('\\', "/");
    let mut trimmed = slashed.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest.trim_start_matches('/');
    }
    trimmed.to_string()
}
