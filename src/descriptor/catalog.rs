//! Type catalogs.
//!
//! A [`TypeCatalog`] holds the descriptors the tree builder resolves types
//! against. It is filled from Rust sources or loaded from YAML/JSON catalog
//! files that describe types of other hosts, and several catalogs merge into one.

use super::{simple_name, MethodDescriptor, TypeDescriptor, TypeSource};
use crate::error::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// On-disk layout of a type catalog
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub types: Vec<TypeDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

/// In-memory registry of type and method descriptors.
///
/// Types are found by qualified name first, then by simple name. When two
/// types share a simple name the first registered one wins the simple-name
/// lookup.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: Vec<TypeDescriptor>,
    by_qualified: HashMap<String, usize>,
    by_simple: HashMap<String, usize>,
    methods: Vec<MethodDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a YAML (`.yaml`/`.yml`) or JSON (`.json`) file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading type catalog from {}", path.display());
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let file: CatalogFile = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(Error::ConfigError(format!(
                    "不支持的类型目录格式 '{}': {}",
                    other,
                    path.display()
                )))
            }
        };

        let mut catalog = Self::new();
        catalog.extend(file);
        debug!(
            "Loaded {} types and {} methods",
            catalog.types.len(),
            catalog.methods.len()
        );
        Ok(catalog)
    }

    /// Register every type and method of another catalog
    pub fn merge(&mut self, other: TypeCatalog) {
        self.extend(CatalogFile {
            types: other.types,
            methods: other.methods,
        });
    }

    pub fn extend(&mut self, file: CatalogFile) {
        for descriptor in file.types {
            self.insert(descriptor);
        }
        for method in file.methods {
            self.insert_method(method);
        }
    }

    /// Register a type. Missing names are derived from one another and
    /// fields without a declaring type are attributed to this one.
    pub fn insert(&mut self, mut descriptor: TypeDescriptor) {
        if descriptor.qualified_name.is_empty() {
            descriptor.qualified_name = descriptor.name.clone();
        }
        if descriptor.name.is_empty() {
            descriptor.name = simple_name(&descriptor.qualified_name).to_string();
        }
        for field in &mut descriptor.fields {
            if field.declaring_type.is_empty() {
                field.declaring_type = descriptor.qualified_name.clone();
            }
        }

        if let Some(&existing) = self.by_qualified.get(&descriptor.qualified_name) {
            warn!(
                "Type {} registered twice, keeping the latest definition",
                descriptor.qualified_name
            );
            self.types[existing] = descriptor;
            return;
        }

        let idx = self.types.len();
        self.by_qualified
            .insert(descriptor.qualified_name.clone(), idx);
        self.by_simple.entry(descriptor.name.clone()).or_insert(idx);
        self.types.push(descriptor);
    }

    pub fn insert_method(&mut self, method: MethodDescriptor) {
        self.methods.push(method);
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeSource for TypeCatalog {
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        let idx = self
            .by_qualified
            .get(name)
            .or_else(|| self.by_simple.get(simple_name(name)))?;
        self.types.get(*idx)
    }

    /// Accepts a bare method name or `Owner#method`
    fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        let (owner, method_name) = match name.split_once('#') {
            Some((owner, method_name)) => (Some(owner), method_name),
            None => (None, name),
        };

        self.methods.iter().find(|method| {
            method.name == method_name
                && owner.map_or(true, |owner| {
                    method
                        .owner
                        .as_deref()
                        .is_some_and(|declared| declared == owner || simple_name(declared) == owner)
                })
        })
    }
}
