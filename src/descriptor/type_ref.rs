use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A parsed type expression such as `Map<String, List<User>>` or `int[]`.
///
/// Catalog files write type references as plain strings, so the serde
/// representation is the displayed text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeRef {
    /// Type name, possibly qualified (`java.util.List`, `std::vec::Vec`)
    pub name: String,
    /// Angle-bracket type arguments
    pub args: Vec<TypeRef>,
    /// Number of trailing `[]` array dimensions
    pub array_dims: usize,
}

impl TypeRef {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            array_dims: 0,
        }
    }

    /// Same type with one more array dimension
    pub fn array_of(inner: TypeRef) -> Self {
        Self {
            array_dims: inner.array_dims + 1,
            ..inner
        }
    }

    /// Parse a type expression. Malformed text degrades to a bare name
    /// holding the trimmed input.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let mut parser = Parser {
            chars: trimmed.chars().collect(),
            pos: 0,
        };
        match parser.parse_type() {
            Some(parsed) if parser.at_end() => parsed,
            _ => Self::simple(trimmed),
        }
    }

    /// Last path segment of the name (`java.util.List` → `List`)
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// The element type of an array (`User[]` → `User`)
    pub fn component(&self) -> Option<TypeRef> {
        if !self.is_array() {
            return None;
        }
        Some(Self {
            name: self.name.clone(),
            args: self.args.clone(),
            array_dims: self.array_dims - 1,
        })
    }

    /// Replace generic parameters by their concrete types.
    pub fn substitute(&self, generics: &HashMap<String, TypeRef>) -> TypeRef {
        if self.args.is_empty() {
            if let Some(concrete) = generics.get(&self.name) {
                return Self {
                    array_dims: concrete.array_dims + self.array_dims,
                    ..concrete.clone()
                };
            }
        }
        Self {
            name: self.name.clone(),
            args: self.args.iter().map(|arg| arg.substitute(generics)).collect(),
            array_dims: self.array_dims,
        }
    }
}

/// Last segment of a `.` or `::` separated path
pub fn simple_name(name: &str) -> &str {
    let after_colons = name.rsplit("::").next().unwrap_or(name);
    after_colons.rsplit('.').next().unwrap_or(after_colons)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl From<String> for TypeRef {
    fn from(text: String) -> Self {
        TypeRef::parse(&text)
    }
}

impl From<TypeRef> for String {
    fn from(type_ref: TypeRef) -> Self {
        type_ref.to_string()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '>' | ',' | '[' | ']') {
                break;
            }
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        let name = name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return None,
                }
            }
        }

        let mut array_dims = 0;
        loop {
            self.skip_whitespace();
            if self.peek() == Some('[') && self.chars.get(self.pos + 1) == Some(&']') {
                self.pos += 2;
                array_dims += 1;
            } else {
                break;
            }
        }

        Some(TypeRef {
            name,
            args,
            array_dims,
        })
    }
}
