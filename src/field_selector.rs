//! Per-field and per-parameter decisions: exclusion, required flag, display
//! name, description and explicit example.

use crate::config::{FieldNameCase, Settings};
use crate::descriptor::{
    annotation_value, is_annotated, FieldDescriptor, Modifier, ParamDescriptor, TypeSource,
};
use log::debug;

/// Doc-comment tag carrying an explicit example value
pub const EXAMPLE_TAG: &str = "value";

pub struct FieldSelector<'a> {
    settings: &'a Settings,
    source: &'a dyn TypeSource,
}

impl<'a> FieldSelector<'a> {
    pub fn new(settings: &'a Settings, source: &'a dyn TypeSource) -> Self {
        Self { settings, source }
    }

    /// Whether a field is left out of the documentation. The first matching
    /// rule wins.
    pub fn is_excluded(&self, field: &FieldDescriptor, is_proto_owner: bool) -> bool {
        let settings = self.settings;

        if is_proto_owner && !field.name.ends_with(&settings.proto_field_suffix) {
            debug!("Excluding proto field {} without generated suffix", field.name);
            return true;
        }
        if settings.exclude_field_names.contains(&field.name) {
            return true;
        }
        if field.has_modifier(Modifier::Static) || field.has_modifier(Modifier::Transient) {
            return true;
        }
        if settings
            .exclude_field_annotations
            .iter()
            .any(|name| is_annotated(&field.annotations, name))
        {
            debug!("Excluding annotated field {}", field.name);
            return true;
        }
        settings
            .exclude_class_packages
            .iter()
            .any(|prefix| field.declaring_type.starts_with(prefix.as_str()))
    }

    /// Parameters are excluded by type (or supertype) and by name
    pub fn is_param_excluded(&self, param: &ParamDescriptor) -> bool {
        let excluded_type = self
            .settings
            .exclude_parameter_types
            .iter()
            .any(|excluded| self.source.is_assignable(&param.ty, excluded));

        excluded_type || self.settings.exclude_field_names.contains(&param.name)
    }

    pub fn is_required(&self, field: &FieldDescriptor) -> bool {
        let settings = self.settings;

        if settings
            .required_field_annotations
            .iter()
            .any(|name| is_annotated(&field.annotations, name))
        {
            return true;
        }

        for schema in [&settings.schema_annotation, &settings.legacy_schema_annotation] {
            let required = annotation_value(&field.annotations, schema, "required");
            if required.is_some_and(|value| value.contains("true")) {
                return true;
            }
        }

        settings.required_use_comment_tag
            && field
                .doc
                .as_ref()
                .is_some_and(|doc| doc.has_tag(&settings.required_tag))
    }

    pub fn is_param_required(&self, param: &ParamDescriptor) -> bool {
        let settings = self.settings;

        if settings
            .required_field_annotations
            .iter()
            .any(|name| is_annotated(&param.annotations, name))
        {
            return true;
        }

        for marker in [&settings.request_param_annotation, &settings.header_annotation] {
            if param.annotations.iter().any(|ann| ann.matches(marker)) {
                let required = annotation_value(&param.annotations, marker, "required");
                return !required.is_some_and(|value| value.eq_ignore_ascii_case("false"));
            }
        }

        false
    }

    /// Display name: annotation override, else the configured case transform.
    /// Proto fields lose their generated suffix afterwards.
    pub fn field_name(&self, field: &FieldDescriptor, is_proto_owner: bool) -> String {
        let settings = self.settings;

        let overridden = settings
            .use_field_name_annotation
            .then(|| annotation_value(&field.annotations, &settings.field_name_annotation, "value"))
            .flatten()
            .filter(|value| !value.trim().is_empty());

        let name = match overridden {
            Some(value) => value.to_string(),
            None => match settings.field_name_case {
                FieldNameCase::Identity => field.name.clone(),
                FieldNameCase::SnakeCase => camel_to_snake(&field.name),
            },
        };

        if is_proto_owner && !settings.proto_field_suffix.is_empty() {
            if let Some(stripped) = name.strip_suffix(settings.proto_field_suffix.as_str()) {
                return stripped.to_string();
            }
        }
        name
    }

    /// First non-blank of: schema description, legacy schema value, trailing
    /// comment, doc text
    pub fn description(&self, field: &FieldDescriptor) -> String {
        let settings = self.settings;

        let from_schema = annotation_value(&field.annotations, &settings.schema_annotation, "description");
        let from_legacy = annotation_value(&field.annotations, &settings.legacy_schema_annotation, "value");
        let from_doc = field.doc.as_ref().map(|doc| doc.summary());

        [
            from_schema.map(str::to_string),
            from_legacy.map(str::to_string),
            field.trailing_comment.clone(),
            from_doc,
        ]
        .into_iter()
        .flatten()
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
    }

    /// Explicit example from the `@value` doc tag, empty when absent
    pub fn example(&self, field: &FieldDescriptor) -> String {
        field
            .doc
            .as_ref()
            .and_then(|doc| doc.tag(EXAMPLE_TAG))
            .unwrap_or_default()
            .to_string()
    }
}

/// `userName` → `user_name`; only lower-to-upper boundaries split words
pub fn camel_to_snake(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if previous_lower && c.is_ascii_uppercase() {
            snake.push('_');
        }
        previous_lower = c.is_ascii_lowercase();
        snake.extend(c.to_lowercase());
    }
    snake
}
