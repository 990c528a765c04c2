//! The parameter tree and its flat counterparts.

use crate::classifier::ShapeKind;
use serde::{Deserialize, Serialize};

/// One field, parameter or header of a documented interface.
///
/// Nodes form a tree through `children`; a node is never shared between two
/// trees. Only array, map and object shaped nodes carry children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Display type such as `int` or `List<UserDTO>`
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub example: String,
    pub required: bool,
    /// Rendered as a JSON array (collections and `T[]` arrays)
    pub is_array: bool,
    pub is_map: bool,
    /// A collection type proper, as opposed to a `T[]` array
    pub is_collection: bool,
    pub children: Vec<Node>,
    /// Nesting level for indentation; top-level children sit at 0
    pub depth: usize,
    /// Qualified name of the underlying object type, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualified_type_name: Option<String>,
    pub kind: ShapeKind,
}

impl Node {
    pub fn leaf(name: impl Into<String>, type_name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// A query or form parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub example: String,
    pub required: bool,
    #[serde(skip)]
    pub kind: ShapeKind,
}

impl From<&Param> for Node {
    fn from(param: &Param) -> Self {
        Node {
            name: param.name.clone(),
            type_name: param.type_name.clone(),
            description: param.description.clone(),
            example: param.example.clone(),
            required: param.required,
            kind: param.kind,
            ..Default::default()
        }
    }
}

/// A request header; `value` is its default or example value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
    pub description: String,
    pub required: bool,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: String::new(),
            required,
        }
    }
}

impl From<&Header> for Node {
    fn from(header: &Header) -> Self {
        Node {
            name: header.name.clone(),
            type_name: "String".to_string(),
            description: header.description.clone(),
            example: header.value.clone(),
            required: header.required,
            kind: ShapeKind::StringLike,
            ..Default::default()
        }
    }
}
