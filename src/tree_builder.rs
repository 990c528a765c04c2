//! Recursive construction of parameter trees from type descriptors.

use crate::classifier::{ShapeKind, TypeClassifier};
use crate::config::Settings;
use crate::descriptor::{is_annotated, FieldDescriptor, TypeDescriptor, TypeRef, TypeSource};
use crate::error::{Error, Result};
use crate::field_selector::FieldSelector;
use crate::model::Node;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fields carrying this annotation are replaced by the fields of their type
pub const FLATTEN_ANNOTATION: &str = "serde::flatten";

/// Lets a caller abandon an in-flight build, explicitly or after a deadline.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Per-level state, handed down by value
#[derive(Debug, Clone, Default)]
struct BuildContext {
    /// Depth of the nodes built at this level
    depth: usize,
    /// Generic parameter bindings of the type whose fields are being built
    generics: HashMap<String, TypeRef>,
    /// Qualified names of the object types on the current root-to-node path
    visited: Vec<String>,
}

impl BuildContext {
    fn root(generics: HashMap<String, TypeRef>) -> Self {
        Self {
            generics,
            ..Default::default()
        }
    }

    fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    fn enter(&self, qualified_name: &str, generics: HashMap<String, TypeRef>) -> Self {
        let mut visited = self.visited.clone();
        visited.push(qualified_name.to_string());
        Self {
            depth: self.depth,
            generics,
            visited,
        }
    }
}

/// Builds [`Node`] trees for root types
pub struct ParamTreeBuilder<'a> {
    source: &'a dyn TypeSource,
    classifier: TypeClassifier<'a>,
    selector: FieldSelector<'a>,
    cancel: CancelToken,
}

impl<'a> ParamTreeBuilder<'a> {
    pub fn new(settings: &'a Settings, source: &'a dyn TypeSource) -> Self {
        Self {
            source,
            classifier: TypeClassifier::new(source),
            selector: FieldSelector::new(settings, source),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn classifier(&self) -> &TypeClassifier<'a> {
        &self.classifier
    }

    pub fn selector(&self) -> &FieldSelector<'a> {
        &self.selector
    }

    /// Build the tree of `root`. An absent or void root gives an empty tree.
    ///
    /// # Errors
    ///
    /// Only [`Error::Cancelled`]; unresolvable types and cycles degrade the tree.
    pub fn build(
        &self,
        root: Option<&TypeRef>,
        generics: &HashMap<String, TypeRef>,
    ) -> Result<Node> {
        self.check_cancelled()?;

        let Some(root) = root.filter(|ty| !is_void(ty)) else {
            return Ok(Node::default());
        };

        let ty = root.substitute(generics);
        let shape = self.classifier.classify_resolved(&ty);
        debug!("Building tree for {} ({:?})", ty, shape);

        let mut node = Node {
            type_name: ty.to_string(),
            ..Default::default()
        };
        self.apply_shape(&mut node, &ty, shape);

        let ctx = BuildContext::root(generics.clone());
        node.children = self.structure_children(&ty, shape, &ctx)?;
        node.qualified_type_name = self.object_type(&ty, shape).map(|d| d.qualified_name.clone());
        Ok(node)
    }

    /// Top-level nodes of `root`, the input every renderer takes
    pub fn build_children(
        &self,
        root: Option<&TypeRef>,
        generics: &HashMap<String, TypeRef>,
    ) -> Result<Vec<Node>> {
        Ok(self.build(root, generics)?.children)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!("Tree build cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Shape flags, degraded kind and enum example
    fn apply_shape(&self, node: &mut Node, ty: &TypeRef, shape: ShapeKind) {
        node.kind = shape;
        match shape {
            ShapeKind::Collection => {
                node.is_array = true;
                node.is_collection = !ty.is_array();
            }
            ShapeKind::Map => node.is_map = true,
            ShapeKind::Enum => {
                if node.example.is_empty() {
                    if let Some(first) = self
                        .source
                        .lookup(&ty.name)
                        .and_then(|descriptor| descriptor.variants.first())
                    {
                        node.example = first.clone();
                    }
                }
            }
            ShapeKind::GenericParam => {
                warn!("Generic parameter {} has no substitution, documenting as object", ty);
                node.kind = ShapeKind::Object;
            }
            ShapeKind::Primitive | ShapeKind::StringLike | ShapeKind::Object => {}
        }
    }

    /// The object descriptor whose fields become the children of a node of
    /// type `ty`, looking through collections and map values
    fn object_type(&self, ty: &TypeRef, shape: ShapeKind) -> Option<&TypeDescriptor> {
        match shape {
            ShapeKind::Object => self.source.lookup(&ty.name),
            ShapeKind::Collection | ShapeKind::Map => {
                let inner = self.classifier.element_type(ty, shape)?;
                let inner_shape = self.classifier.classify_resolved(&inner);
                self.object_type(&inner, inner_shape)
            }
            _ => None,
        }
    }

    /// Children of a node of type `ty`, built at `ctx.depth`
    fn structure_children(
        &self,
        ty: &TypeRef,
        shape: ShapeKind,
        ctx: &BuildContext,
    ) -> Result<Vec<Node>> {
        match shape {
            ShapeKind::Object => self.object_children(ty, ctx),
            ShapeKind::Collection | ShapeKind::Map => {
                let Some(inner) = self.classifier.element_type(ty, shape) else {
                    debug!("{} has no type argument, leaving it childless", ty);
                    return Ok(Vec::new());
                };
                let inner_shape = self.classifier.classify_resolved(&inner);
                self.structure_children(&inner, inner_shape, ctx)
            }
            ShapeKind::Primitive
            | ShapeKind::StringLike
            | ShapeKind::Enum
            | ShapeKind::GenericParam => Ok(Vec::new()),
        }
    }

    fn object_children(&self, ty: &TypeRef, ctx: &BuildContext) -> Result<Vec<Node>> {
        let Some(descriptor) = self.source.lookup(&ty.name) else {
            warn!("Unresolved type {}, documenting without fields", ty);
            return Ok(Vec::new());
        };

        if ctx.visited.contains(&descriptor.qualified_name) {
            warn!(
                "Type {} re-enters itself, truncating the branch",
                descriptor.qualified_name
            );
            return Ok(Vec::new());
        }

        let mut generics = descriptor.generics_for(ty);
        if ty.args.is_empty() {
            for param in &descriptor.type_params {
                if let Some(bound) = ctx.generics.get(param) {
                    generics.insert(param.clone(), bound.clone());
                }
            }
        }

        let child_ctx = ctx.enter(&descriptor.qualified_name, generics);
        self.fields_of(descriptor, &child_ctx)
    }

    fn fields_of(&self, descriptor: &TypeDescriptor, ctx: &BuildContext) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        for field in self.source.all_fields(descriptor) {
            self.check_cancelled()?;

            if self.selector.is_excluded(&field, descriptor.is_proto) {
                debug!("Skipping excluded field {}.{}", descriptor.name, field.name);
                continue;
            }

            if is_annotated(&field.annotations, FLATTEN_ANNOTATION) {
                let ty = field.ty.substitute(&ctx.generics);
                nodes.extend(self.object_children(&ty, ctx)?);
                continue;
            }

            nodes.push(self.field_node(&field, descriptor.is_proto, ctx)?);
        }

        Ok(nodes)
    }

    fn field_node(
        &self,
        field: &FieldDescriptor,
        is_proto_owner: bool,
        ctx: &BuildContext,
    ) -> Result<Node> {
        let ty = field.ty.substitute(&ctx.generics);
        let shape = self.classifier.classify_resolved(&ty);
        debug!("Field {}: {} ({:?})", field.name, ty, shape);

        let mut node = Node {
            name: self.selector.field_name(field, is_proto_owner),
            type_name: ty.to_string(),
            description: self.selector.description(field),
            example: self.selector.example(field),
            required: self.selector.is_required(field),
            depth: ctx.depth,
            ..Default::default()
        };
        self.apply_shape(&mut node, &ty, shape);
        node.children = self.structure_children(&ty, shape, &ctx.nested())?;
        Ok(node)
    }
}

fn is_void(ty: &TypeRef) -> bool {
    matches!(ty.name.as_str(), "" | "()" | "void" | "Void" | "java.lang.Void")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::rust::catalog_from_files;
    use crate::descriptor::catalog::TypeCatalog;
    use crate::parser::ParsedFile;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn catalog_from_code(code: &str) -> TypeCatalog {
        catalog_from_files(&[ParsedFile {
            path: PathBuf::from("model.rs"),
            module_path: "crate::model".to_string(),
            syntax_tree: syn::parse_file(code).unwrap(),
        }])
    }

    fn build(catalog: &TypeCatalog, root: &str) -> Node {
        let settings = Settings::default();
        ParamTreeBuilder::new(&settings, catalog)
            .build(Some(&TypeRef::parse(root)), &HashMap::new())
            .unwrap()
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_object_fields_in_declaration_order() {
        let catalog = catalog_from_code(
            r#"
            pub struct User {
                /// 主键
                /// @required
                pub id: i64,
                pub name: String,
                #[serde(skip)]
                pub password: String,
                pub email: Option<String>,
            }
            "#,
        );

        let root = build(&catalog, "User");

        assert_eq!(root.qualified_type_name.as_deref(), Some("crate::model::User"));
        assert_eq!(names(&root.children), vec!["id", "name", "email"]);
        assert_eq!(root.children[0].description, "主键");
        assert!(root.children[0].required);
        assert!(!root.children[1].required);
        assert_eq!(root.children[2].type_name, "String");
        assert!(root.children.iter().all(|n| n.depth == 0 && n.is_leaf()));
    }

    #[test]
    fn test_prost_message_fields_are_documented() {
        let catalog = catalog_from_code(
            r#"
            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct HelloRequest {
                /// 问候语
                #[prost(string, tag = "1")]
                pub greeting: String,
                #[prost(int32, tag = "2")]
                pub count: i32,
            }
            "#,
        );

        let root = build(&catalog, "HelloRequest");

        assert_eq!(names(&root.children), vec!["greeting", "count"]);
        assert_eq!(root.children[0].description, "问候语");
        assert_eq!(root.children[1].type_name, "i32");
    }

    #[test]
    fn test_primitive_root_is_single_leaf() {
        let catalog = TypeCatalog::new();
        let root = build(&catalog, "int");
        assert_eq!(root.type_name, "int");
        assert_eq!(root.kind, ShapeKind::Primitive);
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_absent_and_void_roots_are_empty() {
        let catalog = TypeCatalog::new();
        let settings = Settings::default();
        let builder = ParamTreeBuilder::new(&settings, &catalog);

        assert_eq!(builder.build(None, &HashMap::new()).unwrap(), Node::default());
        assert!(builder
            .build_children(Some(&TypeRef::simple("()")), &HashMap::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_self_reference_is_truncated() {
        let catalog = catalog_from_code(
            r#"
            pub struct Node {
                pub value: i32,
                pub next: Box<Node>,
                pub children: Vec<Node>,
            }
            "#,
        );

        let root = build(&catalog, "Node");

        assert_eq!(names(&root.children), vec!["value", "next", "children"]);
        let next = &root.children[1];
        assert_eq!(next.type_name, "Node");
        assert!(next.children.is_empty());
        let children = &root.children[2];
        assert!(children.is_array);
        assert!(children.children.is_empty());
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let catalog = catalog_from_code(
            r#"
            pub struct Department { pub name: String, pub manager: Employee }
            pub struct Employee { pub name: String, pub department: Department }
            "#,
        );

        let root = build(&catalog, "Department");
        let manager = &root.children[1];
        assert_eq!(names(&manager.children), vec!["name", "department"]);
        assert_eq!(manager.children[1].depth, 1);
        assert!(manager.children[1].children.is_empty());
    }

    #[test]
    fn test_array_of_objects_has_element_fields() {
        let catalog = catalog_from_code(
            r#"
            pub struct User { pub name: String }
            pub struct Team {
                pub members: Vec<User>,
                pub tags: Vec<String>,
                pub matrix: Vec<Vec<User>>,
                pub slots: [User; 3],
            }
            "#,
        );

        let root = build(&catalog, "Team");
        let members = &root.children[0];
        assert!(members.is_array && members.is_collection);
        assert_eq!(members.kind, ShapeKind::Collection);
        assert_eq!(names(&members.children), vec!["name"]);
        assert_eq!(members.children[0].depth, 1);

        let tags = &root.children[1];
        assert!(tags.is_array);
        assert!(tags.children.is_empty());

        let matrix = &root.children[2];
        assert_eq!(names(&matrix.children), vec!["name"]);

        let slots = &root.children[3];
        assert!(slots.is_array);
        assert!(!slots.is_collection);
        assert_eq!(slots.type_name, "User[]");
        assert_eq!(names(&slots.children), vec!["name"]);
    }

    #[test]
    fn test_collection_root() {
        let catalog = catalog_from_code("pub struct User { pub name: String }");
        let root = build(&catalog, "List<User>");

        assert!(root.is_array);
        assert_eq!(root.qualified_type_name.as_deref(), Some("crate::model::User"));
        assert_eq!(names(&root.children), vec!["name"]);
    }

    #[test]
    fn test_map_children_are_value_fields() {
        let catalog = catalog_from_code(
            r#"
            pub struct Score { pub points: i32 }
            pub struct Board {
                pub scores: HashMap<String, Score>,
                pub counts: BTreeMap<String, u32>,
            }
            "#,
        );

        let root = build(&catalog, "Board");
        let scores = &root.children[0];
        assert!(scores.is_map);
        assert_eq!(names(&scores.children), vec!["points"]);
        assert!(root.children[1].is_map);
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn test_generic_substitution() {
        let catalog = catalog_from_code(
            r#"
            pub struct User { pub name: String }
            pub struct Page<T> {
                pub total: u64,
                pub records: Vec<T>,
                pub first: Option<T>,
            }
            pub struct Wrapper<K> { pub page: Page<K> }
            "#,
        );

        let root = build(&catalog, "Page<User>");
        assert_eq!(root.children[1].type_name, "Vec<User>");
        assert_eq!(names(&root.children[1].children), vec!["name"]);
        assert_eq!(root.children[2].type_name, "User");
        assert_eq!(names(&root.children[2].children), vec!["name"]);

        let nested = build(&catalog, "Wrapper<User>");
        let page = &nested.children[0];
        assert_eq!(page.type_name, "Page<User>");
        assert_eq!(page.children[1].type_name, "Vec<User>");
        assert_eq!(names(&page.children[1].children), vec!["name"]);

        let settings = Settings::default();
        let mut generics = HashMap::new();
        generics.insert("T".to_string(), TypeRef::simple("User"));
        let raw = ParamTreeBuilder::new(&settings, &catalog)
            .build(Some(&TypeRef::simple("Page")), &generics)
            .unwrap();
        assert_eq!(raw.children[2].type_name, "User");
    }

    #[test]
    fn test_nested_same_generic_type_is_truncated() {
        let catalog = catalog_from_code(
            r#"
            pub struct User { pub name: String }
            pub struct Wrapper<T> { pub inner: T, pub note: String }
            "#,
        );

        let root = build(&catalog, "Wrapper<Wrapper<User>>");

        // re-entry is keyed on the declared type, not its arguments
        assert_eq!(names(&root.children), vec!["inner", "note"]);
        let inner = &root.children[0];
        assert_eq!(inner.type_name, "Wrapper<User>");
        assert_eq!(inner.kind, ShapeKind::Object);
        assert!(inner.children.is_empty());
    }

    #[test]
    fn test_unresolved_generic_degrades_to_object() {
        let catalog = catalog_from_code("pub struct Holder<T> { pub value: T, pub items: Vec<T> }");

        let root = build(&catalog, "Holder");
        let value = &root.children[0];
        assert_eq!(value.kind, ShapeKind::Object);
        assert!(value.children.is_empty());
        assert!(root.children[1].is_array);
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn test_flatten_splices_fields() {
        let catalog = catalog_from_code(
            r#"
            pub struct Audit { pub created_by: String, pub created_at: String }
            pub struct Order {
                pub id: u64,
                #[serde(flatten)]
                pub audit: Audit,
                pub note: String,
            }
            "#,
        );

        let root = build(&catalog, "Order");
        assert_eq!(
            names(&root.children),
            vec!["id", "created_by", "created_at", "note"]
        );
        assert!(root.children.iter().all(|n| n.depth == 0));
    }

    #[test]
    fn test_enum_example_and_rename() {
        let catalog = catalog_from_code(
            r#"
            pub enum Status { Active, Disabled }
            #[serde(rename_all = "camelCase")]
            pub struct Account { pub account_status: Status }
            "#,
        );

        let root = build(&catalog, "Account");
        let status = &root.children[0];
        assert_eq!(status.name, "accountStatus");
        assert_eq!(status.kind, ShapeKind::Enum);
        assert_eq!(status.example, "Active");
    }

    #[test]
    fn test_cancelled_build_returns_error() {
        let catalog = catalog_from_code("pub struct User { pub name: String }");
        let settings = Settings::default();
        let token = CancelToken::new();
        let builder = ParamTreeBuilder::new(&settings, &catalog).with_cancel_token(token.clone());

        assert!(builder.build(Some(&TypeRef::simple("User")), &HashMap::new()).is_ok());
        token.cancel();
        let err = builder
            .build(Some(&TypeRef::simple("User")), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let catalog = TypeCatalog::new();
        let settings = Settings::default();
        let token = CancelToken::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(token.is_cancelled());

        let builder = ParamTreeBuilder::new(&settings, &catalog).with_cancel_token(token);
        assert!(matches!(
            builder.build(Some(&TypeRef::simple("int")), &HashMap::new()),
            Err(Error::Cancelled)
        ));
    }
}
