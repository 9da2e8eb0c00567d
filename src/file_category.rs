/// File categorization by extension.
///
/// Every file lands in exactly one [`Category`]. The extension table is a plain
/// map built once on first use, so adding a mapping never means adding a branch.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, classify};
///
/// assert_eq!(classify("jpg"), Category::Images);
/// assert_eq!(classify(".PDF"), Category::Documents);
/// assert_eq!(classify("xyz"), Category::Other);
/// assert_eq!(classify(""), Category::Other);
/// ```
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// A broad file category.
///
/// The category name doubles as the directory name under the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Documents, spreadsheets and presentations (PDF, DOCX, XLSX, TXT, etc.)
    Documents,
    /// Audio files (MP3, WAV, FLAC, AAC)
    Audio,
    /// Video files (MP4, MOV, MKV, etc.)
    Video,
    /// Archive files (ZIP, RAR, 7Z, TAR, etc.)
    Archives,
    /// Source code and structured text (PY, JS, JSON, YAML, etc.)
    Code,
    /// 3D, CAD and BIM models (DWG, DXF, STEP, etc.)
    #[serde(rename = "CAD")]
    Cad,
    /// Anything without a known extension
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 8] = [
        Category::Images,
        Category::Documents,
        Category::Audio,
        Category::Video,
        Category::Archives,
        Category::Code,
        Category::Cad,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Cad.dir_name(), "CAD");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Cad => "CAD",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Extension table shipped with the tool.
const STANDARD_EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff", "svg"],
    ),
    (
        Category::Documents,
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "rtf",
        ],
    ),
    (Category::Audio, &["mp3", "wav", "flac", "aac"]),
    (Category::Video, &["mp4", "mov", "avi", "mkv", "webm"]),
    (Category::Archives, &["zip", "rar", "7z", "tar", "gz", "bz2"]),
    (
        Category::Code,
        &[
            "py", "js", "ts", "java", "cpp", "c", "cs", "go", "rb", "php", "sh", "bat", "ps1",
            "json", "yaml", "yml", "xml", "html", "css",
        ],
    ),
    (
        Category::Cad,
        &[
            "dwg", "dxf", "rvt", "skp", "obj", "fbx", "dae", "step", "stp",
        ],
    ),
];

static STANDARD_MAPPER: LazyLock<FileMapper> = LazyLock::new(FileMapper::new);

/// Maps file extensions to categories.
///
/// Lookups are case-insensitive and ignore a leading dot.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self::empty();
        for (category, extensions) in STANDARD_EXTENSIONS {
            for ext in *extensions {
                mapper.add_extension_mapping(ext, *category);
            }
        }
        mapper
    }

    /// Creates a mapper with no mappings; everything classifies as `Other`.
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    /// The process-wide standard mapper, built on first use.
    pub fn standard() -> &'static FileMapper {
        &STANDARD_MAPPER
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(normalize_extension(ext), category);
    }

    /// Maps a file extension to a category, or `None` if the extension is unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category("pdf"), Some(Category::Documents));
    /// assert_eq!(mapper.extension_to_category(".PNG"), Some(Category::Images));
    /// assert_eq!(mapper.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&normalize_extension(ext)).copied()
    }

    /// Classifies an extension, defaulting to `Category::Other`.
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_to_category(ext).unwrap_or(Category::Other)
    }

    /// Classifies a path by its extension.
    ///
    /// Paths without an extension (including dotfiles like `.bashrc`) are `Other`.
    pub fn classify_path(&self, path: &Path) -> Category {
        path.extension()
            .map(|ext| self.classify(&ext.to_string_lossy()))
            .unwrap_or(Category::Other)
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    /// Returns true if the mapper knows no extensions.
    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies an extension against the standard table.
pub fn classify(extension: &str) -> Category {
    FileMapper::standard().classify(extension)
}

/// Classifies a path by its extension against the standard table.
pub fn classify_path(path: &Path) -> Category {
    FileMapper::standard().classify_path(path)
}

fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_lowercase()
}
