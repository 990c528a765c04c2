//! Renderers from parameter trees to documentation text.

pub mod json_desc;
pub mod json_schema;
pub mod markdown;
