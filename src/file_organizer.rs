/// Placement engine: decides where each file goes and puts it there.
///
/// For every file the [`Organizer`] reads metadata, classifies the extension,
/// optionally hashes the content to skip duplicates, builds the destination
/// `dest/<Category>/[<YYYY-MM-DD>/]<name>`, picks a free name, and then moves,
/// copies or only plans the transfer. Per-file failures never escape
/// [`Organizer::place`]; they come back as [`Outcome::SkippedError`].
use crate::config::{ConfigError, OrganizeOptions};
use crate::duplicate::{DuplicateIndex, hash_file};
use crate::file_category::{Category, FileMapper};
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Marks in-flight copies inside the destination tree.
pub const PARTIAL_SUFFIX: &str = ".dirsort-partial";

/// Errors that can occur while organizing.
///
/// Setup errors abort a run before any file is touched. The rest are
/// per-file and end up as [`Outcome::SkippedError`].
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory is missing or not a directory.
    #[error("Invalid source directory {}: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: String },
    /// The destination exists but is not a directory, or cannot be created.
    #[error("Invalid destination directory {}: {reason}", .path.display())]
    InvalidDestination { path: PathBuf, reason: String },
    /// Filter rules did not compile.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The JSON report could not be written.
    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWriteFailed { path: PathBuf, source: io::Error },
    /// Metadata or content of a source file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead { path: PathBuf, source: io::Error },
    /// A category or date directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Copying or moving a file failed.
    #[error("Failed to transfer {} to {}: {cause}", .path.display(), .destination.display())]
    Transfer {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        cause: io::Error,
    },
}

impl OrganizeError {
    /// Returns true for errors that abort the whole run.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource { .. }
                | Self::InvalidDestination { .. }
                | Self::Config(_)
                | Self::ReportWriteFailed { .. }
        )
    }
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Everything known about one source file before it is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// Lowercased extension without the dot; empty if the name has none.
    pub extension: String,
    pub category: Category,
    /// SHA-1 of the content, computed only when duplicates are skipped.
    pub hash: Option<String>,
}

impl FileRecord {
    /// Reads metadata, classifies and (if asked) hashes a file.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::FileRead` if the file vanished, is not a
    /// regular file, or cannot be read for hashing.
    pub fn read(
        path: &Path,
        mapper: &FileMapper,
        options: &OrganizeOptions,
    ) -> OrganizeResult<Self> {
        let read_error = |source: io::Error| OrganizeError::FileRead {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(read_error)?;
        if !metadata.is_file() {
            return Err(read_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let modified = metadata.modified().map_err(read_error)?;

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mut category = mapper.classify(&extension);
        if category == Category::Other && options.detect_content {
            category = sniff_category(path, mapper);
        }

        let hash = if options.skip_duplicates {
            Some(hash_file(path).map_err(read_error)?)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified,
            extension,
            category,
            hash,
        })
    }
}

/// Classifies by magic bytes; anything unrecognized stays `Other`.
fn sniff_category(path: &Path, mapper: &FileMapper) -> Category {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => {
            debug!(
                "Detected {} ({}) for {}",
                kind.mime_type(),
                kind.extension(),
                path.display()
            );
            mapper.classify(kind.extension())
        }
        Ok(None) => Category::Other,
        Err(e) => {
            debug!("Content detection failed for {}: {}", path.display(), e);
            Category::Other
        }
    }
}

/// Where a file went (or would go).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
    pub bytes: u64,
}

/// Result of handling one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outcome {
    Moved(Placement),
    Copied(Placement),
    WouldMove(Placement),
    WouldCopy(Placement),
    /// Same content was already placed at `duplicate_of`.
    SkippedDuplicate {
        source: PathBuf,
        hash: String,
        duplicate_of: PathBuf,
    },
    SkippedError {
        source: PathBuf,
        reason: String,
    },
}

impl Outcome {
    /// The file this outcome is about.
    pub fn source(&self) -> &Path {
        match self {
            Outcome::Moved(p)
            | Outcome::Copied(p)
            | Outcome::WouldMove(p)
            | Outcome::WouldCopy(p) => &p.source,
            Outcome::SkippedDuplicate { source, .. } | Outcome::SkippedError { source, .. } => {
                source
            }
        }
    }

    /// The placement, for moved, copied and planned files.
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Outcome::Moved(p)
            | Outcome::Copied(p)
            | Outcome::WouldMove(p)
            | Outcome::WouldCopy(p) => Some(p),
            _ => None,
        }
    }

    /// Destination path, if the file was (or would be) placed.
    pub fn destination(&self) -> Option<&Path> {
        self.placement().map(|p| p.destination.as_path())
    }

    /// Returns true for outcomes that only describe a planned transfer.
    pub fn is_planned(&self) -> bool {
        matches!(self, Outcome::WouldMove(_) | Outcome::WouldCopy(_))
    }

    /// Short label used in output and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Moved(_) => "moved",
            Outcome::Copied(_) => "copied",
            Outcome::WouldMove(_) => "would move",
            Outcome::WouldCopy(_) => "would copy",
            Outcome::SkippedDuplicate { .. } => "skipped duplicate",
            Outcome::SkippedError { .. } => "error",
        }
    }
}

/// Places files under a destination root for the duration of one run.
///
/// Holds the only state shared between files: the duplicate index and the
/// set of destinations already claimed in this run.
pub struct Organizer<'m> {
    dest_root: PathBuf,
    options: OrganizeOptions,
    mapper: &'m FileMapper,
    index: DuplicateIndex,
    claimed: HashSet<PathBuf>,
}

impl Organizer<'static> {
    /// Creates an organizer using the standard extension table.
    ///
    /// With `skip_duplicates` and `index_existing` set, files already under
    /// `dest_root` are hashed up front and count as placed.
    pub fn new(dest_root: impl Into<PathBuf>, options: OrganizeOptions) -> Self {
        Organizer::with_mapper(dest_root, options, FileMapper::standard())
    }
}

impl<'m> Organizer<'m> {
    /// Creates an organizer with a custom extension table.
    pub fn with_mapper(
        dest_root: impl Into<PathBuf>,
        options: OrganizeOptions,
        mapper: &'m FileMapper,
    ) -> Self {
        let dest_root = dest_root.into();
        let index = if options.skip_duplicates && options.index_existing {
            DuplicateIndex::seed_from_dir(&dest_root)
        } else {
            DuplicateIndex::new()
        };

        Self {
            dest_root,
            options,
            mapper,
            index,
            claimed: HashSet::new(),
        }
    }

    /// Handles one file and reports what happened.
    ///
    /// Never fails: read and transfer errors become `Outcome::SkippedError`
    /// and leave the source untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::config::OrganizeOptions;
    /// use dirsort::file_organizer::Organizer;
    /// use std::path::Path;
    ///
    /// let options = OrganizeOptions { copy_mode: true, ..Default::default() };
    /// let mut organizer = Organizer::new("/home/me/Sorted", options);
    /// let outcome = organizer.place(Path::new("/home/me/Downloads/photo.jpg"));
    /// println!("{}: {:?}", outcome.label(), outcome.destination());
    /// ```
    pub fn place(&mut self, file_path: &Path) -> Outcome {
        match self.try_place(file_path) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{}", e);
                Outcome::SkippedError {
                    source: file_path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_place(&mut self, file_path: &Path) -> OrganizeResult<Outcome> {
        let record = FileRecord::read(file_path, self.mapper, &self.options)?;

        if let Some(hash) = &record.hash
            && let Some(original) = self.index.original_of(hash)
        {
            debug!(
                "{} duplicates {} (sha1 {})",
                file_path.display(),
                original.display(),
                hash
            );
            return Ok(Outcome::SkippedDuplicate {
                source: record.path,
                hash: hash.clone(),
                duplicate_of: original.to_path_buf(),
            });
        }

        let file_name = file_path.file_name().ok_or_else(|| OrganizeError::FileRead {
            path: file_path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
        })?;

        let date = self.options.by_date.then(|| date_folder(record.modified));
        let target_dir = destination_dir(&self.dest_root, record.category, date.as_deref());
        let claimed = &self.claimed;
        let destination = resolve_collision(&target_dir.join(file_name), |candidate| {
            claimed.contains(candidate) || entry_exists(candidate)
        });

        let placement = Placement {
            source: record.path.clone(),
            destination: destination.clone(),
            category: record.category,
            bytes: record.size,
        };

        let outcome = match (self.options.dry_run, self.options.copy_mode) {
            (true, true) => Outcome::WouldCopy(placement),
            (true, false) => Outcome::WouldMove(placement),
            (false, copy_mode) => {
                transfer(file_path, &destination, copy_mode)?;
                if copy_mode {
                    Outcome::Copied(placement)
                } else {
                    Outcome::Moved(placement)
                }
            }
        };

        debug!(
            "{} {} -> {}",
            outcome.label(),
            file_path.display(),
            destination.display()
        );

        self.claimed.insert(destination.clone());
        if let Some(hash) = record.hash {
            self.index.insert(hash, destination);
        }

        Ok(outcome)
    }
}

/// Formats a modification time as the `YYYY-MM-DD` folder name (local time).
pub fn date_folder(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified)
        .format("%Y-%m-%d")
        .to_string()
}

/// Builds `dest_root/<Category>[/<date>]`.
pub fn destination_dir(dest_root: &Path, category: Category, date: Option<&str>) -> PathBuf {
    let mut dir = dest_root.join(category.dir_name());
    if let Some(date) = date {
        dir.push(date);
    }
    dir
}

/// Returns `candidate` or the first free `stem (n).ext` sibling, n = 1, 2, ...
///
/// Names without an extension get the suffix at the end (`README (1)`), and
/// only the last extension is kept after it (`backup.tar (1).gz`).
pub fn resolve_collision(candidate: &Path, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    if !is_taken(candidate) {
        return candidate.to_path_buf();
    }

    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));
    let stem = candidate.file_stem().unwrap_or_default();
    let extension = candidate.extension();

    let mut n: u64 = 1;
    loop {
        let mut name = stem.to_os_string();
        name.push(format!(" ({n})"));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let alternative = parent.join(name);
        if !is_taken(&alternative) {
            return alternative;
        }
        n += 1;
    }
}

/// True if anything, including a dangling symlink, sits at `path`.
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Copies or moves `source` to `destination`, creating parent directories.
///
/// The final name only ever appears once the content is complete. A move
/// across filesystems is copy-then-delete; if the source cannot be deleted the
/// new copy is removed again, so the file is never lost.
fn transfer(source: &Path, destination: &Path, copy_mode: bool) -> OrganizeResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let transfer_error = |cause: io::Error| OrganizeError::Transfer {
        path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        cause,
    };

    if copy_mode {
        return copy_via_partial(source, destination).map_err(transfer_error);
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "{} is on another filesystem, copying then deleting",
                source.display()
            );
            copy_via_partial(source, destination).map_err(transfer_error)?;
            if let Err(e) = fs::remove_file(source) {
                if let Err(cleanup) = fs::remove_file(destination) {
                    warn!(
                        "Could not remove {} after failed move, file now exists twice: {}",
                        destination.display(),
                        cleanup
                    );
                }
                return Err(transfer_error(e));
            }
            Ok(())
        }
        Err(e) => Err(transfer_error(e)),
    }
}

/// Copies through a hidden sibling and renames it into place when complete.
fn copy_via_partial(source: &Path, destination: &Path) -> io::Result<()> {
    let partial = partial_path(destination);
    let result = write_partial(source, &partial).and_then(|()| fs::rename(&partial, destination));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

/// Streams `source` into a freshly created `partial`, then stamps the source
/// mtime and permissions on the open handle. Permissions go last so a
/// read-only source never locks the copy before it is complete.
fn write_partial(source: &Path, partial: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    let mut reader = fs::File::open(source)?;
    let mut writer = fs::File::create(partial)?;

    let copied = io::copy(&mut reader, &mut writer)?;
    if copied != metadata.len() {
        return Err(io::Error::other(format!(
            "short copy: {} of {} bytes",
            copied,
            metadata.len()
        )));
    }

    writer.set_modified(metadata.modified()?)?;
    writer.sync_all()?;
    writer.set_permissions(metadata.permissions())
}

/// `.<name>.<pid>.dirsort-partial` next to the final destination.
fn partial_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(".{}.{}{}", file_name, std::process::id(), PARTIAL_SUFFIX);
    match destination.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// True for names of the shape [`partial_path`] produces.
pub fn is_partial_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some(rest) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(PARTIAL_SUFFIX))
    else {
        return false;
    };
    match rest.rsplit_once('.') {
        Some((file_name, pid)) => {
            !file_name.is_empty() && !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
