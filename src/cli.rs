//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument definitions
//! - Source and destination validation
//! - The recursive walk and per-file dispatch
//! - Progress, per-file lines, summary and the optional JSON report

use crate::config::{CompiledFilters, FilterConfig, OrganizeOptions};
use crate::file_organizer::{Organizer, OrganizeError, OrganizeResult, Outcome, is_partial_file};
use crate::output::OutputFormatter;
use crate::summary::RunReport;
use clap::Parser;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sort a folder into category (and optional date) subfolders
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dirsort", version, about, long_about = None)]
pub struct Args {
    /// Source directory to scan (recursive)
    #[arg(short, long, value_name = "PATH")]
    pub source: PathBuf,

    /// Destination root directory
    #[arg(short, long, value_name = "PATH")]
    pub dest: PathBuf,

    /// Create a date folder (YYYY-MM-DD, file modification date) under each category
    #[arg(long)]
    pub by_date: bool,

    /// Copy files instead of moving them
    #[arg(long)]
    pub copy: bool,

    /// Show what would happen without changing files
    #[arg(long)]
    pub dry_run: bool,

    /// Skip files that are byte-identical (SHA-1) to one already placed
    #[arg(long)]
    pub skip_duplicates: bool,

    /// With --skip-duplicates, also compare against files already in the destination
    #[arg(long, requires = "skip_duplicates")]
    pub index_existing: bool,

    /// Detect the type of files with unknown extensions from their content
    #[arg(long)]
    pub detect_content: bool,

    /// Glob pattern (relative to the source) to exclude; repeatable
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// File extension to exclude; repeatable
    #[arg(long = "exclude-ext", value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Regex matched against file names to exclude; repeatable
    #[arg(long = "exclude-regex", value_name = "REGEX")]
    pub exclude_regex: Vec<String>,

    /// Skip hidden files (names starting with ".")
    #[arg(long)]
    pub skip_hidden: bool,

    /// Write a JSON report of every decision to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Only print the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level: error, warn, info, debug, trace (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Mode switches for the placement engine.
    pub fn options(&self) -> OrganizeOptions {
        OrganizeOptions {
            by_date: self.by_date,
            copy_mode: self.copy,
            dry_run: self.dry_run,
            skip_duplicates: self.skip_duplicates,
            index_existing: self.index_existing,
            detect_content: self.detect_content,
        }
    }

    /// Exclusion rules as given.
    pub fn filters(&self) -> FilterConfig {
        FilterConfig {
            skip_hidden: self.skip_hidden,
            exclude_extensions: self.exclude_ext.clone(),
            exclude_patterns: self.exclude.clone(),
            exclude_regex: self.exclude_regex.clone(),
        }
    }
}

/// Runs one organize pass as described by `args`.
///
/// Returns the report of the run. Only setup problems are errors; files that
/// fail are counted in the report and the run carries on.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["dirsort", "-s", "/home/me/Downloads", "-d", "/home/me/Sorted", "--copy"]);
/// match run_cli(&args) {
///     Ok(report) => println!("{} files placed", report.summary.placed()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> OrganizeResult<RunReport> {
    let filters = args.filters().compile()?;
    let options = args.options();

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Planning {} -> {}",
            args.source.display(),
            args.dest.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} -> {} ({})",
            args.source.display(),
            args.dest.display(),
            options.action_label()
        ));
    }

    let report = organize_directory(&args.source, &args.dest, options, &filters, args.quiet)?;

    OutputFormatter::summary_table(&report);

    if let Some(report_path) = &args.report {
        write_report(&report, report_path)?;
        OutputFormatter::success(&format!("Report written to {}", report_path.display()));
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    } else if !report.summary.is_complete_success() {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(report)
}

/// Walks `source` and places every file under `dest`.
///
/// # Errors
///
/// Returns a setup error if the source is missing or not a directory, or if
/// the destination cannot be used. Nothing is placed in that case.
pub fn organize_directory(
    source: &Path,
    dest: &Path,
    options: OrganizeOptions,
    filters: &CompiledFilters,
    quiet: bool,
) -> OrganizeResult<RunReport> {
    validate_setup(source, dest, &options)?;

    let mut report = RunReport::new(source.to_path_buf(), dest.to_path_buf(), options);
    let (files, walk_errors) = collect_files(source, dest, filters);
    info!(
        "Found {} files under {} ({} unreadable entries)",
        files.len(),
        source.display(),
        walk_errors.len()
    );

    let pb = OutputFormatter::create_progress_bar(files.len() as u64);
    let emit = |outcome: &Outcome| {
        if !quiet || matches!(outcome, Outcome::SkippedError { .. }) {
            let line = OutputFormatter::outcome_line(outcome, dest);
            pb.suspend(|| println!("{}", line));
        }
    };

    for outcome in walk_errors {
        emit(&outcome);
        report.push(outcome);
    }

    let mut organizer = Organizer::new(dest, options);
    for file in &files {
        pb.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let outcome = organizer.place(file);
        emit(&outcome);
        report.push(outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(report)
}

/// Checks the source and destination before anything is touched.
fn validate_setup(source: &Path, dest: &Path, options: &OrganizeOptions) -> OrganizeResult<()> {
    if !source.exists() {
        return Err(OrganizeError::InvalidSource {
            path: source.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }
    if !source.is_dir() {
        return Err(OrganizeError::InvalidSource {
            path: source.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    if let (Ok(source_canonical), Ok(dest_canonical)) =
        (fs::canonicalize(source), fs::canonicalize(dest))
        && source_canonical == dest_canonical
    {
        return Err(OrganizeError::InvalidDestination {
            path: dest.to_path_buf(),
            reason: "must differ from the source directory".to_string(),
        });
    }

    if dest.exists() {
        if !dest.is_dir() {
            return Err(OrganizeError::InvalidDestination {
                path: dest.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
    } else if !options.dry_run {
        fs::create_dir_all(dest).map_err(|e| OrganizeError::InvalidDestination {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

/// Lists the files to organize, sorted by name within each directory.
///
/// The destination tree (when it lies inside the source) and in-flight
/// partial copies are left out. Entries the walk cannot read come back as
/// error outcomes.
fn collect_files(
    source: &Path,
    dest: &Path,
    filters: &CompiledFilters,
) -> (Vec<PathBuf>, Vec<Outcome>) {
    let dest_canonical = fs::canonicalize(dest).ok();
    let dest_in_source = is_inside(dest, source, fs::canonicalize(source).ok().as_deref());
    let mut files = Vec::new();
    let mut errors = Vec::new();

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !dest_in_source || !is_inside(entry.path(), dest, dest_canonical.as_deref())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(source).to_path_buf();
                warn!("Cannot read {}: {}", path.display(), e);
                errors.push(Outcome::SkippedError {
                    source: path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_partial_file(path) {
            continue;
        }

        let relative = path.strip_prefix(source).unwrap_or(path);
        if !filters.should_include(relative) {
            debug!("Excluded by filters: {}", relative.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    (files, errors)
}

/// True if `path` is `root` or lies below it.
fn is_inside(path: &Path, root: &Path, root_canonical: Option<&Path>) -> bool {
    if path.starts_with(root) {
        return true;
    }
    match (root_canonical, fs::canonicalize(path)) {
        (Some(root_canonical), Ok(path)) => path.starts_with(root_canonical),
        _ => false,
    }
}

fn write_report(report: &RunReport, path: &Path) -> OrganizeResult<()> {
    let json = report
        .to_json()
        .map_err(|e| OrganizeError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
    fs::write(path, json).map_err(|e| OrganizeError::ReportWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
