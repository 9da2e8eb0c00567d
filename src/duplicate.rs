//! Content-hash index for duplicate skipping.
//!
//! Files are identified by the SHA-1 of their bytes, stored as lowercase hex.
//! The index lives for one run and is never written to disk, so changing the
//! hash function only affects which files a single run considers equal.

use log::{debug, warn};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read size for streaming hash computation (1 MiB)
const HASH_BUFFER_SIZE: usize = 1 << 20;

/// Computes the SHA-1 of a file's contents as lowercase hex.
///
/// The file is streamed, so memory use does not depend on file size.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hashes of content already placed, each with the path it was placed at.
#[derive(Debug, Default, Clone)]
pub struct DuplicateIndex {
    entries: HashMap<String, PathBuf>,
}

impl DuplicateIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from every readable file under `root`.
    ///
    /// Unreadable files are logged and left out. A missing root yields an
    /// empty index.
    pub fn seed_from_dir(root: &Path) -> Self {
        let mut index = Self::new();
        if !root.is_dir() {
            return index;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry while indexing {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match hash_file(entry.path()) {
                Ok(hash) => {
                    index.insert(hash, entry.path().to_path_buf());
                }
                Err(e) => warn!("Could not hash {}: {}", entry.path().display(), e),
            }
        }

        debug!("Indexed {} existing files under {}", index.len(), root.display());
        index
    }

    /// Returns true if content with this hash was already placed.
    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    /// Where content with this hash was first placed.
    pub fn original_of(&self, hash: &str) -> Option<&Path> {
        self.entries.get(hash).map(PathBuf::as_path)
    }

    /// Records a placement. The first path recorded for a hash is kept.
    ///
    /// Returns false if the hash was already present.
    pub fn insert(&mut self, hash: String, placed_at: PathBuf) -> bool {
        match self.entries.entry(hash) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(placed_at);
                true
            }
        }
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
