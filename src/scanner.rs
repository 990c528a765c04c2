use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffixes of type catalog files picked up next to the Rust sources
const CATALOG_SUFFIXES: &[&str] = &[".types.yaml", ".types.yml", ".types.json"];

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find the Rust source
/// files and type catalogs (`*.types.yaml`, `*.types.json`) that describe its interfaces.
/// It skips the `target` directory and hidden directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use doc_view::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
///
/// Paths are sorted so repeated runs document types in the same order.
#[derive(Debug)]
pub struct ScanResult {
    /// All discovered `.rs` files
    pub rust_files: Vec<PathBuf>,
    /// All discovered type catalog files
    pub catalog_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Scans the directory tree and collects source and catalog files.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path does not exist or is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        let metadata = std::fs::metadata(&self.root_path)
            .with_context(|| format!("Failed to access project: {}", self.root_path.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Project path is not a directory: {}", self.root_path.display());
        }

        let mut rust_files = Vec::new();
        let mut catalog_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !path.is_file() {
                        continue;
                    }
                    let file_name = entry.file_name().to_string_lossy();
                    if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    } else if CATALOG_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix)) {
                        catalog_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort();
        catalog_files.sort();
        debug!(
            "Found {} Rust files and {} catalogs under {}",
            rust_files.len(),
            catalog_files.len(),
            self.root_path.display()
        );

        Ok(ScanResult {
            rust_files,
            catalog_files,
            warnings,
        })
    }
}
