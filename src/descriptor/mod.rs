//! Host-neutral description of interface types.
//!
//! The tree builder never talks to a concrete reflection API. It asks a
//! [`TypeSource`] for [`TypeDescriptor`]s: their fields, annotations and doc
//! comments. Adapters turn a concrete host into descriptors:
//!
//! - [`catalog`] - an in-memory registry, loadable from YAML/JSON catalogs
//!   (Java-style classes, Protocol-Buffer messages, ...)
//! - [`rust`] - Rust structs, enums and functions read from `syn` trees

pub mod catalog;
pub mod rust;
pub mod type_ref;

pub use type_ref::{simple_name, TypeRef};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Name of the collection supertype used by inheritance checks
pub const COLLECTION: &str = "Collection";
/// Name of the map supertype used by inheritance checks
pub const MAP: &str = "Map";

/// Well-known collection and map types and the supertype they inherit from
const BUILTIN_SUPERTYPES: &[(&str, &str)] = &[
    ("Iterable", COLLECTION),
    ("List", COLLECTION),
    ("ArrayList", COLLECTION),
    ("LinkedList", COLLECTION),
    ("Set", COLLECTION),
    ("HashSet", COLLECTION),
    ("LinkedHashSet", COLLECTION),
    ("TreeSet", COLLECTION),
    ("SortedSet", COLLECTION),
    ("Queue", COLLECTION),
    ("Deque", COLLECTION),
    ("Vec", COLLECTION),
    ("VecDeque", COLLECTION),
    ("BTreeSet", COLLECTION),
    ("BinaryHeap", COLLECTION),
    ("HashMap", MAP),
    ("LinkedHashMap", MAP),
    ("TreeMap", MAP),
    ("SortedMap", MAP),
    ("ConcurrentHashMap", MAP),
    ("BTreeMap", MAP),
];

fn builtin_supertype(name: &str) -> Option<&'static str> {
    let simple = simple_name(name);
    BUILTIN_SUPERTYPES
        .iter()
        .find(|(known, _)| *known == simple)
        .map(|(_, supertype)| *supertype)
}

/// An annotation (Java annotation, Rust attribute, proto option) on a field,
/// parameter or method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name, qualified or simple
    pub name: String,
    /// Attribute values in declaration order; flags carry `"true"`
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Exact match, or a simple-name match when either side is a
    /// dot-qualified name.
    pub fn matches(&self, name: &str) -> bool {
        if self.name == name {
            return true;
        }
        let qualified = self.name.contains('.') || name.contains('.');
        qualified && simple_name(&self.name) == simple_name(name)
    }
}

/// Whether `name` is present among `annotations`.
///
/// `owner::key` addresses a key inside an attribute list, so `serde::skip`
/// matches `#[serde(skip)]`.
pub fn is_annotated(annotations: &[Annotation], name: &str) -> bool {
    if annotations.iter().any(|ann| ann.matches(name)) {
        return true;
    }
    match name.rsplit_once("::") {
        Some((owner, key)) => annotations
            .iter()
            .any(|ann| ann.matches(owner) && ann.attribute(key).is_some()),
        None => false,
    }
}

/// Value of `attribute` on the annotation `name`, or of the key addressed by
/// an `owner::key` name.
pub fn annotation_value<'a>(
    annotations: &'a [Annotation],
    name: &str,
    attribute: &str,
) -> Option<&'a str> {
    if let Some(ann) = annotations.iter().find(|ann| ann.matches(name)) {
        return ann.attribute(attribute);
    }
    let (owner, key) = name.rsplit_once("::")?;
    annotations
        .iter()
        .filter(|ann| ann.matches(owner))
        .find_map(|ann| ann.attribute(key))
}

/// A tag line (`@required`, `@value 42`) of a doc comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    pub name: String,
    pub value: String,
}

/// A doc comment split into its free text and its `@tag` lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocComment {
    pub text: String,
    pub tags: Vec<DocTag>,
}

impl DocComment {
    pub fn parse(raw: &str) -> Self {
        let mut text_lines = Vec::new();
        let mut tags = Vec::new();

        for line in raw.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            if let Some(tag) = line.strip_prefix('@') {
                let (name, value) = match tag.split_once(char::is_whitespace) {
                    Some((name, value)) => (name, value.trim()),
                    None => (tag, ""),
                };
                if !name.is_empty() {
                    tags.push(DocTag {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
            } else if !line.is_empty() {
                text_lines.push(line);
            }
        }

        Self {
            text: text_lines.join("\n"),
            tags,
        }
    }

    /// The free text on a single line, as used in table cells
    pub fn summary(&self) -> String {
        self.text.lines().collect::<Vec<_>>().join(" ")
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value.as_str())
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }
}

impl From<String> for DocComment {
    fn from(raw: String) -> Self {
        DocComment::parse(&raw)
    }
}

impl From<DocComment> for String {
    fn from(doc: DocComment) -> Self {
        let mut lines: Vec<String> = doc.text.lines().map(str::to_string).collect();
        for tag in doc.tags {
            if tag.value.is_empty() {
                lines.push(format!("@{}", tag.name));
            } else {
                lines.push(format!("@{} {}", tag.name, tag.value));
            }
        }
        lines.join("\n")
    }
}

/// Field modifiers relevant to documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Static,
    Transient,
}

/// A field of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub doc: Option<DocComment>,
    /// Non-doc comment trailing the declaration
    #[serde(default)]
    pub trailing_comment: Option<String>,
    /// Qualified name of the type declaring this field
    #[serde(default)]
    pub declaring_type: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Vec::new(),
            annotations: Vec::new(),
            doc: None,
            trailing_comment: None,
            declaring_type: String::new(),
        }
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// Whether a descriptor is a plain object or an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    #[default]
    Object,
    Enum,
}

/// Everything the builder needs to know about one declared type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Simple name
    pub name: String,
    #[serde(default)]
    pub qualified_name: String,
    #[serde(default)]
    pub kind: DescriptorKind,
    /// Declared generic parameter names, in order
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Extended/implemented types, with their type arguments
    #[serde(default)]
    pub supertypes: Vec<TypeRef>,
    /// Own fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub variants: Vec<String>,
    /// Generated from a Protocol-Buffer message
    #[serde(default)]
    pub is_proto: bool,
}

impl TypeDescriptor {
    pub fn object(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            name: simple_name(&qualified_name).to_string(),
            qualified_name,
            ..Default::default()
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DescriptorKind::Enum
    }

    /// Map from this type's generic parameters to the arguments of `ty`
    pub fn generics_for(&self, ty: &TypeRef) -> HashMap<String, TypeRef> {
        self.type_params
            .iter()
            .cloned()
            .zip(ty.args.iter().cloned())
            .collect()
    }
}

/// A parameter of a documented method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A documented remote-call endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// Owning type or module, if any
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub doc: Option<DocComment>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// The "describe this type" capability the builder depends on
pub trait TypeSource {
    /// Find a type by qualified or simple name
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor>;

    /// Find a documented method by name
    fn method(&self, name: &str) -> Option<&MethodDescriptor>;

    /// Whether `ty` is `target` or inherits from it
    fn is_assignable(&self, ty: &TypeRef, target: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![ty.name.clone()];

        while let Some(name) = pending.pop() {
            if simple_name(&name) == simple_name(target) {
                return true;
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(supertype) = builtin_supertype(&name) {
                pending.push(supertype.to_string());
            }
            if let Some(descriptor) = self.lookup(&name) {
                pending.extend(descriptor.supertypes.iter().map(|s| s.name.clone()));
            }
        }
        false
    }

    fn is_collection(&self, ty: &TypeRef) -> bool {
        !ty.is_array() && self.is_assignable(ty, COLLECTION)
    }

    fn is_map(&self, ty: &TypeRef) -> bool {
        !ty.is_array() && self.is_assignable(ty, MAP)
    }

    /// Own fields followed by inherited ones, with the generic parameters of
    /// each supertype replaced by the arguments it was extended with.
    fn all_fields(&self, descriptor: &TypeDescriptor) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        collect_fields(self, descriptor, &HashMap::new(), &mut visited, &mut fields);
        fields
    }
}

fn collect_fields<S: TypeSource + ?Sized>(
    source: &S,
    descriptor: &TypeDescriptor,
    generics: &HashMap<String, TypeRef>,
    visited: &mut HashSet<String>,
    fields: &mut Vec<FieldDescriptor>,
) {
    if !visited.insert(descriptor.qualified_name.clone()) {
        return;
    }

    for field in &descriptor.fields {
        let mut field = field.clone();
        field.ty = field.ty.substitute(generics);
        fields.push(field);
    }

    for supertype in &descriptor.supertypes {
        let supertype = supertype.substitute(generics);
        if let Some(parent) = source.lookup(&supertype.name) {
            let parent_generics = parent.generics_for(&supertype);
            collect_fields(source, parent, &parent_generics, visited, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_annotated_exact_and_keyed() {
        let annotations = vec![
            Annotation::new("serde").with_attribute("skip", "true"),
            Annotation::new("javax.validation.constraints.NotNull"),
        ];

        assert!(is_annotated(&annotations, "serde"));
        assert!(is_annotated(&annotations, "serde::skip"));
        assert!(!is_annotated(&annotations, "serde::rename"));
        assert!(is_annotated(&annotations, "javax.validation.constraints.NotNull"));
        assert!(is_annotated(&annotations, "NotNull"));
        assert!(!is_annotated(&annotations, "validate::required"));
    }

    #[test]
    fn test_annotation_value_lookup() {
        let annotations = vec![
            Annotation::new("serde").with_attribute("rename", "userName"),
            Annotation::new("com.fasterxml.jackson.annotation.JsonProperty")
                .with_attribute("value", "user_id"),
        ];

        assert_eq!(
            annotation_value(&annotations, "serde::rename", "value"),
            Some("userName")
        );
        assert_eq!(
            annotation_value(
                &annotations,
                "com.fasterxml.jackson.annotation.JsonProperty",
                "value"
            ),
            Some("user_id")
        );
        assert_eq!(annotation_value(&annotations, "schema", "description"), None);
    }

    #[test]
    fn test_doc_comment_parse() {
        let doc = DocComment::parse("用户名称\n第二行\n@required\n@value tom");

        assert_eq!(doc.text, "用户名称\n第二行");
        assert_eq!(doc.summary(), "用户名称 第二行");
        assert!(doc.has_tag("required"));
        assert_eq!(doc.tag("value"), Some("tom"));
        assert_eq!(doc.tag("required"), Some(""));
        assert!(!doc.has_tag("name"));
    }

    #[test]
    fn test_doc_comment_javadoc_stars() {
        let doc = DocComment::parse(" * 总数\n * @value 10");
        assert_eq!(doc.text, "总数");
        assert_eq!(doc.tag("value"), Some("10"));
    }

    #[test]
    fn test_builtin_collection_detection() {
        struct Empty;
        impl TypeSource for Empty {
            fn lookup(&self, _name: &str) -> Option<&TypeDescriptor> {
                None
            }
            fn method(&self, _name: &str) -> Option<&MethodDescriptor> {
                None
            }
        }

        assert!(Empty.is_collection(&TypeRef::parse("List<String>")));
        assert!(Empty.is_collection(&TypeRef::parse("java.util.ArrayList<String>")));
        assert!(Empty.is_collection(&TypeRef::parse("Vec<u8>")));
        assert!(Empty.is_map(&TypeRef::parse("HashMap<String, User>")));
        assert!(!Empty.is_map(&TypeRef::parse("User")));
        assert!(!Empty.is_collection(&TypeRef::parse("List<String>[]")));
    }
}
