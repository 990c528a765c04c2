//! Serialization of documents and rendered output.
//!
//! Endpoint documents and parameter trees serialize to YAML or pretty JSON;
//! rendered text goes to a file or to stdout.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a value to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(value).context("Failed to serialize document to YAML")
}

/// Serializes a value to pretty-printed JSON, keeping field order.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize document to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and its parent directories if they don't exist, or
/// overwrites the file if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Writes to `path` when given, otherwise prints to stdout
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => write_to_file(content, path),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ShapeKind;
    use crate::endpoint::EndpointDoc;
    use crate::model::Node;
    use tempfile::TempDir;

    fn create_test_document() -> EndpointDoc {
        EndpointDoc {
            name: "用户详情".to_string(),
            path: "/users/{id}".to_string(),
            method: "GET".to_string(),
            function: "get_user".to_string(),
            response_body: vec![
                Node::leaf("id", "u64", ShapeKind::Primitive).with_required(true),
                Node::leaf("name", "String", ShapeKind::StringLike),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("function: get_user"));
        assert!(yaml.contains("method: GET"));
        assert!(yaml.contains("content_type: form"));
        assert!(yaml.contains("response_body:"));
    }

    #[test]
    fn test_serialize_json_keeps_field_order() {
        let json = serialize_json(&create_test_document()).unwrap();

        let id = json.find("\"id\"").unwrap();
        let name = json.rfind("\"name\": \"name\"").unwrap();
        assert!(id < name);
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["response_body"][0]["type"], "u64");
        assert_eq!(parsed["response_body"][0]["required"], true);
    }

    #[test]
    fn test_roundtrip_yaml_serialization() {
        let doc = create_test_document();
        let yaml = serialize_yaml(&doc).unwrap();

        let deserialized: EndpointDoc = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("api.md");

        write_to_file("content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("api.md");

        write_to_file("initial content", &file_path).unwrap();
        emit("new content", Some(&file_path)).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}
