use dirsort::cli::{Args, organize_directory, run_cli};
use dirsort::config::{CompiledFilters, FilterConfig, OrganizeOptions};
use dirsort::file_organizer::{OrganizeError, Outcome, date_folder};
use dirsort::summary::RunReport;
/// Integration tests for dirsort
///
/// These tests run whole organize passes against temporary directory trees.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Copy mode and collision safety
/// 3. Dry-run mode verification
/// 4. Duplicate skipping
/// 5. Date folders, filtering and reports
/// 6. Edge cases and setup errors
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary `source/` and `dest/` pair.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("source")).expect("Failed to create source");
        TestFixture { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn source(&self) -> PathBuf {
        self.root().join("source")
    }

    fn dest(&self) -> PathBuf {
        self.root().join("dest")
    }

    /// Create a file (and any parent directories) under the source.
    fn create_file(&self, rel_path: &str, content: &[u8]) -> PathBuf {
        let path = self.source().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn create_text_file(&self, rel_path: &str, content: &str) -> PathBuf {
        self.create_file(rel_path, content.as_bytes())
    }

    fn create_files(&self, files: &[(&str, &str)]) {
        for (name, content) in files {
            self.create_text_file(name, content);
        }
    }

    fn run(&self, options: OrganizeOptions) -> RunReport {
        self.run_with_filters(options, &CompiledFilters::allow_all())
    }

    fn run_with_filters(&self, options: OrganizeOptions, filters: &CompiledFilters) -> RunReport {
        organize_directory(&self.source(), &self.dest(), options, filters, true)
            .expect("Organize run failed")
    }

    fn assert_dest_file(&self, rel_path: &str, content: &str) {
        let path = self.dest().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
        assert_eq!(
            fs::read_to_string(&path).expect("Failed to read file"),
            content,
            "Unexpected content in {}",
            path.display()
        );
    }

    fn assert_dest_missing(&self, rel_path: &str) {
        let path = self.dest().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// All files under `dir`, recursively, sorted.
    fn list_files_recursive(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(dir, &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

fn copy_mode() -> OrganizeOptions {
    OrganizeOptions {
        copy_mode: true,
        ..Default::default()
    }
}

fn destinations(report: &RunReport) -> Vec<PathBuf> {
    report
        .outcomes
        .iter()
        .filter_map(|o| o.destination().map(Path::to_path_buf))
        .collect()
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_move_sorts_example_files_into_categories() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("photo.jpg", "jpg"),
        ("report.pdf", "pdf"),
        ("song.mp3", "mp3"),
        ("archive.zip", "zip"),
        ("script.py", "py"),
        ("mystery.xyz", "xyz"),
    ]);

    let report = fixture.run(OrganizeOptions::default());

    fixture.assert_dest_file("Images/photo.jpg", "jpg");
    fixture.assert_dest_file("Documents/report.pdf", "pdf");
    fixture.assert_dest_file("Audio/song.mp3", "mp3");
    fixture.assert_dest_file("Archives/archive.zip", "zip");
    fixture.assert_dest_file("Code/script.py", "py");
    fixture.assert_dest_file("Other/mystery.xyz", "xyz");

    assert!(
        TestFixture::list_files_recursive(&fixture.source()).is_empty(),
        "Source should hold no files after a move"
    );
    assert_eq!(report.summary.moved, 6);
    assert_eq!(report.summary.total_bytes, 18);
    assert!(report.summary.is_complete_success());
}

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let report = fixture.run(OrganizeOptions::default());

    assert_eq!(report.summary.total_processed(), 0);
    assert!(fixture.dest().is_dir(), "Destination root is created");
    assert!(TestFixture::list_files_recursive(&fixture.dest()).is_empty());
}

#[test]
fn test_nested_source_files_are_flattened_without_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/notes.txt", "first");
    fixture.create_text_file("b/notes.txt", "second");
    fixture.create_text_file("b/deeper/model.DWG", "cad");

    let report = fixture.run(OrganizeOptions::default());

    fixture.assert_dest_file("Documents/notes.txt", "first");
    fixture.assert_dest_file("Documents/notes (1).txt", "second");
    fixture.assert_dest_file("CAD/model.DWG", "cad");
    assert_eq!(report.summary.moved, 3);
}

// ============================================================================
// Test Suite 2: Copy Mode and Collision Safety
// ============================================================================

#[test]
fn test_copy_round_trip_is_byte_identical() {
    let fixture = TestFixture::new();
    let bytes: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    let source = fixture.create_file("blob.zip", &bytes);

    let report = fixture.run(copy_mode());

    let copied = fixture.dest().join("Archives").join("blob.zip");
    assert!(source.exists(), "Copy mode must keep the source");
    assert_eq!(fs::read(&copied).unwrap(), bytes);
    assert_eq!(report.summary.copied, 1);
    assert_eq!(report.summary.total_bytes, bytes.len() as u64);
}

#[test]
fn test_copy_twice_never_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("photo.png", "png"), ("todo.md", "md")]);

    let first = fixture.run(copy_mode());
    let second = fixture.run(copy_mode());

    fixture.assert_dest_file("Images/photo.png", "png");
    fixture.assert_dest_file("Images/photo (1).png", "png");
    fixture.assert_dest_file("Documents/todo.md", "md");
    fixture.assert_dest_file("Documents/todo (1).md", "md");
    assert_eq!(first.summary.copied, 2);
    assert_eq!(second.summary.copied, 2);

    let third = fixture.run(copy_mode());
    assert_eq!(third.summary.copied, 2);
    fixture.assert_dest_file("Images/photo (2).png", "png");
}

#[test]
fn test_copy_read_only_files_twice() {
    let fixture = TestFixture::new();
    let source = fixture.create_text_file("contract.pdf", "signed");
    let mut permissions = fs::metadata(&source).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&source, permissions).unwrap();

    let first = fixture.run(copy_mode());
    let second = fixture.run(copy_mode());

    assert_eq!(first.summary.copied, 1);
    assert_eq!(second.summary.copied, 1);
    assert_eq!(first.summary.skipped_error + second.summary.skipped_error, 0);
    fixture.assert_dest_file("Documents/contract.pdf", "signed");
    fixture.assert_dest_file("Documents/contract (1).pdf", "signed");
    let copied = fixture.dest().join("Documents").join("contract.pdf");
    assert!(fs::metadata(copied).unwrap().permissions().readonly());
}

#[test]
fn test_no_partial_files_left_behind() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.gif", "gif"), ("b.mov", "mov")]);

    fixture.run(copy_mode());

    let leftovers: Vec<_> = TestFixture::list_files_recursive(&fixture.dest())
        .into_iter()
        .filter(|p| p.to_string_lossy().contains("partial"))
        .collect();
    assert!(leftovers.is_empty(), "Unexpected partial files: {:?}", leftovers);
}

// ============================================================================
// Test Suite 3: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("photo.jpg", "jpg"), ("report.pdf", "pdf")]);

    let report = fixture.run(OrganizeOptions {
        dry_run: true,
        ..Default::default()
    });

    assert!(!fixture.dest().exists(), "Dry run must not create the destination");
    assert!(fixture.source().join("photo.jpg").exists());
    assert!(fixture.source().join("report.pdf").exists());
    assert_eq!(report.summary.would_move, 2);
    assert_eq!(report.summary.moved, 0);
    assert!(report.outcomes.iter().all(Outcome::is_planned));
}

#[test]
fn test_dry_run_plan_matches_real_run() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("x/photo.jpg", "one"),
        ("y/photo.jpg", "two"),
        ("z/photo.jpg", "one"),
        ("song.flac", "flac"),
    ]);
    fs::create_dir_all(fixture.dest().join("Images")).unwrap();
    fs::write(fixture.dest().join("Images").join("photo.jpg"), "already here").unwrap();

    let options = OrganizeOptions {
        skip_duplicates: true,
        ..Default::default()
    };
    let plan = fixture.run(OrganizeOptions {
        dry_run: true,
        ..options
    });
    let real = fixture.run(options);

    assert_eq!(destinations(&plan), destinations(&real));
    assert_eq!(plan.summary.would_move, real.summary.moved);
    assert_eq!(plan.summary.skipped_duplicate, real.summary.skipped_duplicate);
    fixture.assert_dest_file("Images/photo.jpg", "already here");
    fixture.assert_dest_file("Images/photo (1).jpg", "one");
    fixture.assert_dest_file("Images/photo (2).jpg", "two");
}

// ============================================================================
// Test Suite 4: Duplicate Skipping
// ============================================================================

#[test]
fn test_skip_duplicates_places_one_copy() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a/holiday.jpg", "same pixels"), ("b/holiday-copy.jpg", "same pixels")]);

    let report = fixture.run(OrganizeOptions {
        skip_duplicates: true,
        ..Default::default()
    });

    assert_eq!(report.summary.moved, 1);
    assert_eq!(report.summary.skipped_duplicate, 1);
    fixture.assert_dest_file("Images/holiday.jpg", "same pixels");
    fixture.assert_dest_missing("Images/holiday-copy.jpg");
    assert_eq!(TestFixture::list_files_recursive(&fixture.dest()).len(), 1);
    assert!(
        fixture.source().join("b/holiday-copy.jpg").exists(),
        "Skipped duplicates stay in the source"
    );
}

#[test]
fn test_duplicates_across_categories_are_detected() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("data.json", "{}"), ("data.txt", "{}")]);

    let report = fixture.run(OrganizeOptions {
        skip_duplicates: true,
        copy_mode: true,
        ..Default::default()
    });

    assert_eq!(report.summary.copied, 1);
    assert_eq!(report.summary.skipped_duplicate, 1);
}

#[test]
fn test_without_skip_duplicates_both_are_placed() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.wav", "tone"), ("b.wav", "tone")]);

    let report = fixture.run(OrganizeOptions::default());

    assert_eq!(report.summary.moved, 2);
    fixture.assert_dest_file("Audio/a.wav", "tone");
    fixture.assert_dest_file("Audio/b.wav", "tone");
}

#[test]
fn test_duplicate_scope_is_current_run_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file("doc.pdf", "content");
    let options = OrganizeOptions {
        skip_duplicates: true,
        copy_mode: true,
        ..Default::default()
    };

    fixture.run(options);
    let second = fixture.run(options);

    assert_eq!(second.summary.copied, 1);
    fixture.assert_dest_file("Documents/doc (1).pdf", "content");
}

#[test]
fn test_index_existing_skips_content_already_in_dest() {
    let fixture = TestFixture::new();
    fixture.create_text_file("doc.pdf", "content");
    let options = OrganizeOptions {
        skip_duplicates: true,
        index_existing: true,
        copy_mode: true,
        ..Default::default()
    };

    let first = fixture.run(options);
    let second = fixture.run(options);

    assert_eq!(first.summary.copied, 1);
    assert_eq!(second.summary.copied, 0);
    assert_eq!(second.summary.skipped_duplicate, 1);
    fixture.assert_dest_missing("Documents/doc (1).pdf");
}

// ============================================================================
// Test Suite 5: Date Folders, Filtering and Reports
// ============================================================================

#[test]
fn test_by_date_uses_file_modification_date() {
    let fixture = TestFixture::new();
    let path = fixture.create_text_file("scan.tiff", "tiff");
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    fixture.run(OrganizeOptions {
        by_date: true,
        ..Default::default()
    });

    let expected = format!("Images/{}/scan.tiff", date_folder(modified));
    fixture.assert_dest_file(&expected, "tiff");
}

#[test]
fn test_filters_exclude_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("keep.txt", "keep"),
        ("old.bak", "bak"),
        (".hidden.txt", "hidden"),
        ("node_modules/pkg/index.js", "js"),
        ("~$draft.docx", "lock"),
    ]);

    let filters = FilterConfig {
        skip_hidden: true,
        exclude_extensions: vec!["bak".to_string()],
        exclude_patterns: vec!["node_modules/**".to_string()],
        exclude_regex: vec![r"^~\$".to_string()],
    }
    .compile()
    .expect("Filters should compile");

    let report = fixture.run_with_filters(OrganizeOptions::default(), &filters);

    assert_eq!(report.summary.moved, 1);
    fixture.assert_dest_file("Documents/keep.txt", "keep");
    assert!(fixture.source().join("old.bak").exists());
    assert!(fixture.source().join(".hidden.txt").exists());
    assert!(fixture.source().join("node_modules/pkg/index.js").exists());
    assert!(fixture.source().join("~$draft.docx").exists());
}

#[test]
fn test_hidden_files_processed_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".env", "secret");

    let report = fixture.run(OrganizeOptions::default());

    assert_eq!(report.summary.moved, 1);
    fixture.assert_dest_file("Other/.env", "secret");
}

#[test]
fn test_run_cli_writes_json_report() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.jpg", "a"), ("b.step", "b")]);
    let report_path = fixture.root().join("report.json");

    let args = Args {
        source: fixture.source(),
        dest: fixture.dest(),
        copy: true,
        quiet: true,
        report: Some(report_path.clone()),
        ..Default::default()
    };
    let report = run_cli(&args).expect("Run should succeed");
    assert_eq!(report.summary.copied, 2);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["copied"], 2);
    assert_eq!(json["options"]["copy_mode"], true);
    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["action"], "copied");
    assert_eq!(outcomes[0]["category"], "Images");
    assert_eq!(outcomes[1]["category"], "CAD");
}

// ============================================================================
// Test Suite 6: Edge Cases and Setup Errors
// ============================================================================

#[test]
fn test_missing_source_is_setup_error() {
    let fixture = TestFixture::new();
    let missing = fixture.root().join("nope");

    let result = organize_directory(
        &missing,
        &fixture.dest(),
        OrganizeOptions::default(),
        &CompiledFilters::allow_all(),
        true,
    );

    let err = result.expect_err("Missing source must fail");
    assert!(err.is_setup());
    assert!(!fixture.dest().exists());
}

#[test]
fn test_invalid_filter_is_setup_error() {
    let fixture = TestFixture::new();
    let args = Args {
        source: fixture.source(),
        dest: fixture.dest(),
        exclude_regex: vec!["(unclosed".to_string()],
        ..Default::default()
    };

    let err = run_cli(&args).expect_err("Invalid regex must fail");
    assert!(matches!(err, OrganizeError::Config(_)));
}

#[test]
fn test_dest_inside_source_is_not_reprocessed() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "jpg");
    let dest = fixture.source().join("Sorted");
    fs::create_dir_all(dest.join("Images")).unwrap();
    fs::write(dest.join("Images").join("old.jpg"), "old").unwrap();

    let report = organize_directory(
        &fixture.source(),
        &dest,
        OrganizeOptions::default(),
        &CompiledFilters::allow_all(),
        true,
    )
    .expect("Run should succeed");

    assert_eq!(report.summary.moved, 1);
    assert_eq!(fs::read_to_string(dest.join("Images").join("photo.jpg")).unwrap(), "jpg");
    assert_eq!(fs::read_to_string(dest.join("Images").join("old.jpg")).unwrap(), "old");
    assert!(!dest.join("Images").join("old (1).jpg").exists());
}

#[test]
fn test_dest_above_source_still_walks_source() {
    let fixture = TestFixture::new();
    fixture.create_text_file("song.mp3", "mp3");

    let report = organize_directory(
        &fixture.source(),
        fixture.root(),
        OrganizeOptions::default(),
        &CompiledFilters::allow_all(),
        true,
    )
    .expect("Run should succeed");

    assert_eq!(report.summary.moved, 1);
    assert_eq!(fs::read_to_string(fixture.root().join("Audio").join("song.mp3")).unwrap(), "mp3");
}

#[test]
fn test_destination_blocked_by_file_counts_errors_and_keeps_sources() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.jpg", "a"), ("b.pdf", "b")]);
    fs::create_dir_all(fixture.dest()).unwrap();
    // A file where the category directory should go.
    fs::write(fixture.dest().join("Images"), "blocker").unwrap();

    let report = fixture.run(OrganizeOptions::default());

    assert_eq!(report.summary.skipped_error, 1);
    assert_eq!(report.summary.moved, 1);
    assert!(fixture.source().join("a.jpg").exists(), "Failed file stays in source");
    fixture.assert_dest_file("Documents/b.pdf", "b");
}
