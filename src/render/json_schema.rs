//! JSON-Schema documents for API catalogs.
//!
//! Key names and key order are part of the catalog contract: `type`,
//! `required`, `title`, `description`, `properties`, `items`.

use crate::classifier::{basic_type, BasicType, ShapeKind};
use crate::error::Result;
use crate::example::element_type_name;
use crate::model::Node;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const TYPE_OBJECT: &str = "object";
pub const TYPE_ARRAY: &str = "array";
pub const TYPE_STRING: &str = "string";
pub const TYPE_NUMBER: &str = "number";
pub const TYPE_BOOLEAN: &str = "boolean";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
}

impl JsonSchema {
    fn typed(schema_type: &str, description: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            required: None,
            title: None,
            description: Some(description.to_string()),
            properties: None,
            items: None,
        }
    }

    fn object(nodes: &[Node], description: &str) -> Self {
        let (required, properties) = build_properties(nodes);
        Self {
            required: Some(required),
            properties: Some(properties),
            ..Self::typed(TYPE_OBJECT, description)
        }
    }

    pub fn property(&self, name: &str) -> Option<&JsonSchema> {
        self.properties.as_ref()?.get(name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Properties in field declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(pub Vec<(String, JsonSchema)>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&JsonSchema> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

/// Schema of a whole body. Empty input gives an object without properties.
pub fn render(nodes: &[Node]) -> JsonSchema {
    let (required, properties) = build_properties(nodes);
    JsonSchema {
        schema_type: TYPE_OBJECT.to_string(),
        required: Some(required),
        title: Some(" ".to_string()),
        description: Some(" ".to_string()),
        properties: Some(properties),
        items: None,
    }
}

/// Properties of one object level and the names required at that level
fn build_properties(nodes: &[Node]) -> (Vec<String>, Properties) {
    let mut required = Vec::new();
    let mut properties = Vec::with_capacity(nodes.len());

    for node in nodes {
        let schema = match schema_type(node) {
            TYPE_ARRAY => JsonSchema {
                items: Some(Box::new(items_schema(node))),
                ..JsonSchema::typed(TYPE_ARRAY, &node.description)
            },
            TYPE_OBJECT => JsonSchema::object(&node.children, &node.description),
            other => JsonSchema::typed(other, &node.description),
        };

        if node.required {
            required.push(node.name.clone());
        }
        properties.push((node.name.clone(), schema));
    }

    (required, Properties(properties))
}

fn items_schema(node: &Node) -> JsonSchema {
    if !node.children.is_empty() {
        return JsonSchema::object(&node.children, &node.description);
    }

    let element = element_type_name(&node.type_name);
    let item_type = type_name_schema_type(element);
    let mut items = JsonSchema::typed(item_type, &node.description);
    if item_type == TYPE_OBJECT {
        items.properties = Some(Properties::default());
    }
    items
}

/// Schema type of a node: shape flags first, then its display type
pub fn schema_type(node: &Node) -> &'static str {
    if node.is_collection {
        return TYPE_ARRAY;
    }
    if node.is_map {
        return TYPE_OBJECT;
    }
    if node.kind == ShapeKind::Enum {
        return TYPE_STRING;
    }
    type_name_schema_type(&node.type_name)
}

fn type_name_schema_type(type_name: &str) -> &'static str {
    let type_name = type_name.trim();
    if type_name.is_empty() {
        return TYPE_OBJECT;
    }
    match basic_type(type_name) {
        Some(basic) if basic.is_numeric() => TYPE_NUMBER,
        Some(BasicType::Boolean) => TYPE_BOOLEAN,
        _ if type_name.ends_with("[]") => TYPE_ARRAY,
        Some(_) => TYPE_STRING,
        None => TYPE_OBJECT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn array(name: &str, type_name: &str, children: Vec<Node>) -> Node {
        let mut node = Node::leaf(name, type_name, ShapeKind::Collection).with_children(children);
        node.is_array = true;
        node.is_collection = !type_name.ends_with("[]");
        node
    }

    #[test]
    fn test_required_and_primitive_items() {
        let nodes = vec![
            Node::leaf("id", "int", ShapeKind::Primitive).with_required(true),
            array("tags", "List<String>", Vec::new()),
        ];

        let schema = render(&nodes);

        assert_eq!(schema.required, Some(vec!["id".to_string()]));
        assert_eq!(schema.property("id").unwrap().schema_type, "number");
        let tags = schema.property("tags").unwrap();
        assert_eq!(tags.schema_type, "array");
        assert_eq!(tags.items.as_ref().unwrap().schema_type, "string");
    }

    #[test]
    fn test_array_of_objects() {
        let nodes = vec![array(
            "users",
            "List<User>",
            vec![Node::leaf("name", "String", ShapeKind::StringLike).with_required(true)],
        )];

        let schema = render(&nodes);
        let items = schema.property("users").unwrap().items.as_ref().unwrap();

        assert_eq!(items.schema_type, "object");
        assert_eq!(items.property("name").unwrap().schema_type, "string");
        assert_eq!(items.required, Some(vec!["name".to_string()]));
        assert_eq!(schema.required, Some(Vec::new()));
    }

    #[test]
    fn test_required_lists_are_per_level() {
        let address = Node::leaf("address", "Address", ShapeKind::Object).with_children(vec![
            Node::leaf("city", "String", ShapeKind::StringLike).with_required(true),
        ]);
        let schema = render(&[address]);

        assert_eq!(schema.required, Some(Vec::new()));
        let address = schema.property("address").unwrap();
        assert_eq!(address.schema_type, "object");
        assert_eq!(address.required, Some(vec!["city".to_string()]));
    }

    #[test]
    fn test_type_mapping() {
        let mut map = Node::leaf("extra", "Map<String, Object>", ShapeKind::Map);
        map.is_map = true;
        let nodes = vec![
            Node::leaf("flag", "Boolean", ShapeKind::Primitive),
            Node::leaf("price", "BigDecimal", ShapeKind::Primitive),
            Node::leaf("created", "LocalDateTime", ShapeKind::StringLike),
            Node::leaf("status", "Status", ShapeKind::Enum),
            Node::leaf("owner", "User", ShapeKind::Object),
            Node::leaf("blank", "", ShapeKind::Object),
            array("codes", "int[]", Vec::new()),
            array("refs", "List<Ref>", Vec::new()),
            map,
        ];

        let schema = render(&nodes);
        let types: Vec<&str> = schema
            .properties
            .as_ref()
            .unwrap()
            .0
            .iter()
            .map(|(_, s)| s.schema_type.as_str())
            .collect();

        assert_eq!(
            types,
            vec!["boolean", "number", "string", "string", "object", "object", "array", "array", "object"]
        );
        let codes = schema.property("codes").unwrap();
        assert_eq!(codes.items.as_ref().unwrap().schema_type, "number");
        let refs = schema.property("refs").unwrap().items.as_ref().unwrap();
        assert_eq!(refs.schema_type, "object");
        assert_eq!(refs.properties, Some(Properties::default()));
    }

    #[test]
    fn test_serialized_key_order() {
        let nodes = vec![
            Node::leaf("b", "int", ShapeKind::Primitive).with_description("second letter"),
            Node::leaf("a", "String", ShapeKind::StringLike),
        ];

        let json = render(&nodes).to_json().unwrap();

        assert_eq!(
            json,
            r#"{"type":"object","required":[],"title":" ","description":" ","properties":{"b":{"type":"number","description":"second letter"},"a":{"type":"string","description":""}}}"#
        );
        assert_eq!(json, render(&nodes).to_json().unwrap());
    }

    #[test]
    fn test_empty_input() {
        let schema = render(&[]);
        assert_eq!(
            schema.to_json().unwrap(),
            r#"{"type":"object","required":[],"title":" ","description":" ","properties":{}}"#
        );
    }
}
