//! Example values for leaves and whole bodies.
//!
//! Everything here is a pure function of the node: the same type always
//! yields the same example.

use crate::classifier::{basic_type, extract_element_type, BasicType, ShapeKind};
use crate::model::{Node, Param};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

const DATE_TIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";
const DATE_PATTERN: &str = "yyyy-MM-dd";
const TIME_PATTERN: &str = "HH:mm:ss";
const ZERO_UUID: &str = "00000000-0000-0000-0000-000000000000";

fn basic_example(basic: BasicType) -> &'static str {
    match basic {
        BasicType::Integer => "0",
        BasicType::Float | BasicType::Decimal => "0.0",
        BasicType::Boolean => "false",
        BasicType::String | BasicType::Char => "",
        BasicType::Date | BasicType::DateTime => DATE_TIME_PATTERN,
        BasicType::LocalDate => DATE_PATTERN,
        BasicType::LocalTime => TIME_PATTERN,
        BasicType::Uuid => ZERO_UUID,
    }
}

/// Element type text of an array-shaped node: `List<Long>` → `Long`,
/// `int[]` → `int`
pub fn element_type_name(type_name: &str) -> &str {
    let element = extract_element_type(type_name);
    if element == type_name {
        type_name.strip_suffix("[]").unwrap_or(type_name)
    } else {
        element
    }
}

/// Representative value for a node without an explicit example
pub fn synthesize(node: &Node) -> String {
    if node.is_array && node.children.is_empty() {
        return match basic_type(element_type_name(&node.type_name)) {
            Some(basic) => format!("[{}]", literal_for(basic, basic_example(basic))),
            None => "[]".to_string(),
        };
    }
    if let Some(basic) = basic_type(&node.type_name) {
        return basic_example(basic).to_string();
    }
    match node.kind {
        ShapeKind::Object | ShapeKind::Map | ShapeKind::GenericParam if node.children.is_empty() => {
            "{}".to_string()
        }
        _ => String::new(),
    }
}

/// The explicit example, else a synthesized one
pub fn example_or_default(node: &Node) -> String {
    if node.example.is_empty() {
        synthesize(node)
    } else {
        node.example.clone()
    }
}

/// Whether a leaf's JSON literal is written without quotes
pub fn is_unquoted(node: &Node) -> bool {
    if let Some(basic) = basic_type(&node.type_name) {
        return !basic.needs_quote();
    }
    node.children.is_empty()
        && (node.is_array
            || node.is_map
            || matches!(node.kind, ShapeKind::Object | ShapeKind::GenericParam))
}

/// JSON literal text of a leaf, quoted and escaped when its type requires it
pub fn leaf_literal(node: &Node) -> String {
    let example = example_or_default(node);
    if is_unquoted(node) {
        example
    } else {
        quote(&example)
    }
}

fn literal_for(basic: BasicType, example: &str) -> String {
    if basic.needs_quote() {
        quote(example)
    } else {
        example.to_string()
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// An example body that keeps field declaration order when serialized
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ExampleValue>),
    Object(Vec<(String, ExampleValue)>),
}

impl Serialize for ExampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExampleValue::Bool(value) => serializer.serialize_bool(*value),
            ExampleValue::Integer(value) => serializer.serialize_i64(*value),
            ExampleValue::Float(value) => serializer.serialize_f64(*value),
            ExampleValue::String(value) => serializer.serialize_str(value),
            ExampleValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ExampleValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Example body for a list of top-level nodes
pub fn example_value(nodes: &[Node]) -> ExampleValue {
    ExampleValue::Object(
        nodes
            .iter()
            .map(|node| (node.name.clone(), node_value(node)))
            .collect(),
    )
}

fn node_value(node: &Node) -> ExampleValue {
    if node.is_array {
        if node.children.is_empty() {
            let element = element_type_name(&node.type_name);
            return match basic_type(element) {
                Some(basic) => ExampleValue::Array(vec![typed_value(basic, basic_example(basic))]),
                None => ExampleValue::Array(Vec::new()),
            };
        }
        return ExampleValue::Array(vec![example_value(&node.children)]);
    }
    if !node.children.is_empty() || node.is_map || matches!(node.kind, ShapeKind::Object) {
        return example_value(&node.children);
    }

    let example = example_or_default(node);
    match basic_type(&node.type_name) {
        Some(basic) => typed_value(basic, &example),
        None => ExampleValue::String(example),
    }
}

fn typed_value(basic: BasicType, example: &str) -> ExampleValue {
    let parsed = match basic {
        BasicType::Integer => example.parse().ok().map(ExampleValue::Integer),
        BasicType::Float | BasicType::Decimal => example.parse().ok().map(ExampleValue::Float),
        BasicType::Boolean => example.parse().ok().map(ExampleValue::Bool),
        _ => None,
    };
    parsed.unwrap_or_else(|| ExampleValue::String(example.to_string()))
}

/// `a=1&b=2` body of a form request
pub fn form_example(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| {
            let node = Node::from(param);
            format!("{}={}", param.name, example_or_default(&node))
        })
        .collect::<Vec<_>>()
        .join("&")
}
