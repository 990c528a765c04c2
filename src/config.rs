//! Documentation settings.
//!
//! A [`Settings`] value is threaded explicitly through classification, field
//! selection, tree building and rendering. Nothing in the crate reads settings
//! from global state, so several configurations can be evaluated side by side.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// How field names are transformed before display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNameCase {
    /// Keep the declared name
    #[default]
    Identity,
    /// Convert camelCase names to snake_case
    SnakeCase,
}

/// Settings consumed by the extraction and rendering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Field and parameter names that are never documented
    pub exclude_field_names: BTreeSet<String>,
    /// Annotations that exclude a field
    pub exclude_field_annotations: Vec<String>,
    /// Qualified-name prefixes of declaring types whose fields are excluded
    pub exclude_class_packages: Vec<String>,
    /// Parameter types (or supertypes) that are never documented
    pub exclude_parameter_types: Vec<String>,
    /// Annotations marking a field or parameter as required
    pub required_field_annotations: Vec<String>,
    /// Whether a doc-comment tag can mark a field as required
    pub required_use_comment_tag: bool,
    /// Name of the doc-comment tag marking a field as required
    pub required_tag: String,
    pub field_name_case: FieldNameCase,
    /// Whether the naming-override annotation is honoured
    pub use_field_name_annotation: bool,
    /// Annotation whose value overrides the field name
    pub field_name_annotation: String,
    /// Schema annotation carrying `description` and `required`
    pub schema_annotation: String,
    /// Legacy schema annotation carrying `value` and `required`
    pub legacy_schema_annotation: String,
    /// Annotation marking a query/form parameter, may carry `name` and `required`
    pub request_param_annotation: String,
    /// Annotation marking a request header parameter
    pub header_annotation: String,
    /// Suffix that code generators append to proto message fields
    pub proto_field_suffix: String,
    /// Render nested body tables one per level instead of one indented table
    pub separate_param: bool,
    pub prefix_symbol_1: String,
    pub prefix_symbol_2: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exclude_field_names: ["serialVersionUID".to_string()].into_iter().collect(),
            exclude_field_annotations: vec![
                "serde::skip".to_string(),
                "serde::skip_serializing".to_string(),
                "com.fasterxml.jackson.annotation.JsonIgnore".to_string(),
            ],
            exclude_class_packages: Vec::new(),
            exclude_parameter_types: vec![
                "State".to_string(),
                "Extension".to_string(),
                "HttpRequest".to_string(),
                "javax.servlet.ServletRequest".to_string(),
                "javax.servlet.ServletResponse".to_string(),
            ],
            required_field_annotations: vec![
                "validate::required".to_string(),
                "javax.validation.constraints.NotNull".to_string(),
                "javax.validation.constraints.NotBlank".to_string(),
                "javax.validation.constraints.NotEmpty".to_string(),
            ],
            required_use_comment_tag: true,
            required_tag: "required".to_string(),
            field_name_case: FieldNameCase::Identity,
            use_field_name_annotation: true,
            field_name_annotation: "serde::rename".to_string(),
            schema_annotation: "schema".to_string(),
            legacy_schema_annotation: "api_model_property".to_string(),
            request_param_annotation: "param".to_string(),
            header_annotation: "header".to_string(),
            proto_field_suffix: "_".to_string(),
            separate_param: false,
            prefix_symbol_1: "└".to_string(),
            prefix_symbol_2: "─".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML (`.yaml`/`.yml`) or JSON (`.json`) file.
    ///
    /// Keys absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            other => Err(Error::ConfigError(format!(
                "不支持的配置文件格式 '{}': {}",
                other,
                path.display()
            ))),
        }
    }

    /// Marker prepended to a nested row name in the flat Markdown layout
    pub fn nesting_prefix(&self, depth: usize) -> String {
        if depth == 0 {
            return String::new();
        }
        format!("{}{}", self.prefix_symbol_1, self.prefix_symbol_2.repeat(depth))
    }
}
