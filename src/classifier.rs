//! Shape classification of type references.

use crate::descriptor::{simple_name, TypeRef, TypeSource};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Structural classification of a type, governing how it is recursed and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Numeric and boolean types, rendered unquoted
    Primitive,
    /// Strings, characters, dates and identifiers, rendered quoted
    StringLike,
    Collection,
    Map,
    Enum,
    #[default]
    Object,
    /// A type parameter with no substitution
    GenericParam,
}

impl ShapeKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, ShapeKind::Primitive | ShapeKind::StringLike | ShapeKind::Enum)
    }
}

/// Canonical kinds of the basic types every host knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Integer,
    Float,
    Decimal,
    Boolean,
    String,
    Char,
    Date,
    DateTime,
    LocalDate,
    LocalTime,
    Uuid,
}

impl BasicType {
    pub fn is_numeric(self) -> bool {
        matches!(self, BasicType::Integer | BasicType::Float | BasicType::Decimal)
    }

    /// Numeric and boolean literals are written without quotes
    pub fn needs_quote(self) -> bool {
        !matches!(
            self,
            BasicType::Integer | BasicType::Float | BasicType::Decimal | BasicType::Boolean
        )
    }
}

static BASIC_TYPES: LazyLock<HashMap<&'static str, BasicType>> = LazyLock::new(|| {
    let table: &[(&[&str], BasicType)] = &[
        (
            &[
                "byte", "short", "int", "long", "Byte", "Short", "Integer", "Long",
                "BigInteger", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
                "u64", "u128", "usize", "int32", "int64", "uint32", "uint64", "sint32",
                "sint64", "fixed32", "fixed64", "sfixed32", "sfixed64",
            ],
            BasicType::Integer,
        ),
        (&["float", "double", "Float", "Double", "f32", "f64"], BasicType::Float),
        (&["BigDecimal", "Decimal"], BasicType::Decimal),
        (&["boolean", "Boolean", "bool"], BasicType::Boolean),
        (
            &["String", "str", "string", "CharSequence", "bytes"],
            BasicType::String,
        ),
        (&["char", "Character"], BasicType::Char),
        (&["Date", "Timestamp", "SystemTime"], BasicType::Date),
        (
            &["LocalDateTime", "DateTime", "NaiveDateTime", "OffsetDateTime", "Instant"],
            BasicType::DateTime,
        ),
        (&["LocalDate", "NaiveDate"], BasicType::LocalDate),
        (&["LocalTime", "NaiveTime", "Time"], BasicType::LocalTime),
        (&["UUID", "Uuid"], BasicType::Uuid),
    ];

    table
        .iter()
        .flat_map(|(names, kind)| names.iter().map(move |name| (*name, *kind)))
        .collect()
});

/// Look up a basic type by (simple) name
pub fn basic_type(name: &str) -> Option<BasicType> {
    BASIC_TYPES.get(simple_name(name.trim())).copied()
}

/// Element type text of a parameterized type: the text between the first `<`
/// and the last `>`, cut at the first comma. Text without a well-formed
/// bracket pair is returned unchanged.
pub fn extract_element_type(type_text: &str) -> &str {
    let (Some(lt), Some(gt)) = (type_text.find('<'), type_text.rfind('>')) else {
        return type_text;
    };
    if gt <= lt {
        return type_text;
    }
    let inner = type_text[lt + 1..gt].trim();
    match inner.find(',') {
        Some(comma) => inner[..comma].trim(),
        None => inner,
    }
}

/// Classifies type references against a [`TypeSource`]
pub struct TypeClassifier<'a> {
    source: &'a dyn TypeSource,
}

impl<'a> TypeClassifier<'a> {
    pub fn new(source: &'a dyn TypeSource) -> Self {
        Self { source }
    }

    /// Classify `ty` after replacing generic parameters found in `generics`
    pub fn classify(&self, ty: &TypeRef, generics: &HashMap<String, TypeRef>) -> ShapeKind {
        self.classify_resolved(&ty.substitute(generics))
    }

    /// Classify a type whose generic parameters were already substituted
    pub fn classify_resolved(&self, ty: &TypeRef) -> ShapeKind {
        if ty.is_array() {
            return ShapeKind::Collection;
        }
        if let Some(basic) = basic_type(&ty.name) {
            return if basic.needs_quote() {
                ShapeKind::StringLike
            } else {
                ShapeKind::Primitive
            };
        }
        if self.source.is_collection(ty) {
            return ShapeKind::Collection;
        }
        if self.source.is_map(ty) {
            return ShapeKind::Map;
        }

        match self.source.lookup(&ty.name) {
            Some(descriptor) if descriptor.is_enum() => ShapeKind::Enum,
            Some(_) => ShapeKind::Object,
            None if looks_like_type_param(ty) => {
                debug!("Unresolved generic parameter {}", ty.name);
                ShapeKind::GenericParam
            }
            None => ShapeKind::Object,
        }
    }

    /// Element type of an array or collection, value type of a map.
    ///
    /// `None` when the type carries no usable type argument.
    pub fn element_type(&self, ty: &TypeRef, shape: ShapeKind) -> Option<TypeRef> {
        match shape {
            ShapeKind::Collection if ty.is_array() => ty.component(),
            ShapeKind::Collection => ty.args.first().cloned(),
            ShapeKind::Map => ty.args.get(1).cloned(),
            _ => None,
        }
    }
}

/// `T`, `K`, `V`, `E1`: short upper-case names that no source declares
fn looks_like_type_param(ty: &TypeRef) -> bool {
    let name = ty.name.as_str();
    ty.args.is_empty()
        && (1..=2).contains(&name.len())
        && name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
