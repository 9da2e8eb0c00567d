//! dirsort - sort a folder tree into category and date subdirectories
//!
//! This library classifies files by extension, builds collision-free
//! destination paths, skips byte-identical duplicates and moves or copies
//! files (or only plans it, in dry-run mode), tallying every outcome.

pub mod cli;
pub mod config;
pub mod duplicate;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod summary;

pub use config::{CompiledFilters, ConfigError, FilterConfig, OrganizeOptions};
pub use duplicate::DuplicateIndex;
pub use file_category::{Category, FileMapper, classify};
pub use file_organizer::{OrganizeError, Organizer, Outcome, Placement};
pub use summary::{RunReport, Summary};

pub use cli::{Args, run_cli};
