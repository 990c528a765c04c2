//! Doc View - Parameter documentation from interface definitions.
//!
//! This library turns the types and endpoint functions of a Rust project into
//! parameter documentation: Markdown tables, JSON examples with a comment per
//! field, JSON-Schema documents and API-catalog payloads. Everything is derived
//! by static analysis; nothing in the analysed project is compiled or run.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans project directories for Rust files and type catalogs
//! 2. [`parser`] - Parses Rust source files into syntax trees
//! 3. [`descriptor`] - Type and method descriptors, from syntax trees or catalog files
//! 4. [`classifier`] - Sorts a type into primitive, string-like, collection, map, enum or object
//! 5. [`field_selector`] - Decides which fields are documented, their names and required flags
//! 6. [`tree_builder`] - Expands a type into a tree of [`model::Node`]s
//! 7. [`example`] - Synthesizes example values
//! 8. [`render`] - Markdown, JSON-with-comments and JSON-Schema renderers
//! 9. [`endpoint`] - Endpoint documents built from method descriptors
//! 10. [`upload`] - API-catalog payloads and the clients that save them
//! 11. [`serializer`] - YAML/JSON serialization and output
//!
//! # Example Usage
//!
//! ```no_run
//! use doc_view::{
//!     config::Settings,
//!     descriptor::{rust::catalog_from_files, TypeRef},
//!     parser::AstParser,
//!     render::markdown,
//!     scanner::FileScanner,
//!     tree_builder::ParamTreeBuilder,
//! };
//! use std::collections::HashMap;
//! use std::path::PathBuf;
//!
//! let scanner = FileScanner::new(PathBuf::from("./my-project"));
//! let scan_result = scanner.scan().unwrap();
//! let parsed_files: Vec<_> = AstParser::parse_files(scanner.root_path(), &scan_result.rust_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let catalog = catalog_from_files(&parsed_files);
//! let settings = Settings::default();
//! let builder = ParamTreeBuilder::new(&settings, &catalog);
//! let nodes = builder
//!     .build_children(Some(&TypeRef::parse("Page<User>")), &HashMap::new())
//!     .unwrap();
//!
//! println!("{}", markdown::render(&nodes, &settings));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod example;
pub mod field_selector;
pub mod model;
pub mod parser;
pub mod render;
pub mod scanner;
pub mod serializer;
pub mod tree_builder;
pub mod upload;
