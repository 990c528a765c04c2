use crate::error::Error;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// AST parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code into a syntax tree
/// and records the module path each file contributes to, so that the descriptor
/// adapter can give every struct and function a qualified name.
///
/// # Example
///
/// ```no_run
/// use doc_view::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/main.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Module the file defines, such as `crate::model::user`
    pub module_path: String,
    /// The parsed syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single Rust source file. The module path is `crate`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        Self::parse_with_module(path, "crate".to_string())
    }

    /// Parses a file that lives below the project `root`, deriving its module path
    /// from its location.
    pub fn parse_project_file(root: &Path, path: &Path) -> Result<ParsedFile> {
        Self::parse_with_module(path, module_path(root, path))
    }

    fn parse_with_module(path: &Path, module_path: String) -> Result<ParsedFile> {
        debug!("Parsing file: {} ({})", path.display(), module_path);

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .map_err(|e| Error::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            })
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module_path,
            syntax_tree,
        })
    }

    /// Parses every file of a project, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, so documentation can still be
    /// generated for the rest of the project.
    pub fn parse_files(root: &Path, paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_project_file(root, path).inspect_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

/// Module path of a source file relative to the project root.
///
/// `src/model/user.rs` becomes `crate::model::user`; `lib.rs`, `main.rs` and
/// `mod.rs` name their directory.
pub fn module_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.first().map(String::as_str) == Some("src") {
        segments.remove(0);
    }
    if matches!(
        segments.last().map(String::as_str),
        Some("lib" | "main" | "mod")
    ) {
        segments.pop();
    }

    let mut module = String::from("crate");
    for segment in segments {
        module.push_str("::");
        module.push_str(&segment.replace('-', "_"));
    }
    module
}
