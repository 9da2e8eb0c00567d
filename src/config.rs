//! Run configuration built from command-line flags.
//!
//! There is no configuration file. The CLI layer turns its flags into two
//! plain values:
//! - [`OrganizeOptions`]: the mode switches consulted for every file
//! - [`FilterConfig`]: exclusion rules, compiled once into [`CompiledFilters`]
//!
//! Filtering supports:
//! - Hidden file skipping (names starting with ".")
//! - File extension matching
//! - Glob pattern matching against the path relative to the source root
//! - Regex pattern matching against the file name

use glob::Pattern;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while compiling filter rules.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern {
        /// The glob pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
}

/// Mode switches for a single organize run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeOptions {
    /// Add a `YYYY-MM-DD` folder (file modification date) under each category.
    pub by_date: bool,
    /// Copy files instead of moving them.
    pub copy_mode: bool,
    /// Plan only; never touch the filesystem.
    pub dry_run: bool,
    /// Skip files whose content was already placed during this run.
    pub skip_duplicates: bool,
    /// Also treat files already under the destination as placed content.
    /// Only meaningful together with `skip_duplicates`.
    pub index_existing: bool,
    /// Sniff file content when the extension is unknown.
    pub detect_content: bool,
}

impl OrganizeOptions {
    /// Verb for log and report lines.
    pub fn action_label(&self) -> &'static str {
        if self.copy_mode { "copy" } else { "move" }
    }
}

/// Exclusion rules as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Skip files whose name starts with "." (default: process them).
    pub skip_hidden: bool,
    /// File extensions to exclude (e.g., "bak", "tmp", "part").
    pub exclude_extensions: Vec<String>,
    /// Glob patterns to exclude (e.g., "*.tmp", "node_modules/**").
    pub exclude_patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub exclude_regex: Vec<String>,
}

impl FilterConfig {
    /// Compile configuration into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Compiled filter rules, ready for per-file matching.
#[derive(Debug)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self {
            skip_hidden: false,
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }

    fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = config
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: config.skip_hidden,
            exclude_extensions: config
                .exclude_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file should be organized.
    ///
    /// `relative_path` is the file's path relative to the source root.
    /// Checks run in order with early exit: hidden name, extension, glob
    /// patterns, regex patterns. Everything else is included.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self::allow_all()
    }
}
