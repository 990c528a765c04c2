//! Descriptors for Rust source code.
//!
//! Structs become object descriptors and enums become enum descriptors.
//! Functions carrying a route attribute and public inherent methods become
//! method descriptors. Attributes are kept as annotations, `///` docs as doc
//! comments. Items under `#[cfg(test)]` and `#[test]` functions are skipped.

use super::catalog::TypeCatalog;
use super::{
    Annotation, DescriptorKind, DocComment, FieldDescriptor, MethodDescriptor, Modifier,
    ParamDescriptor, TypeDescriptor, TypeRef,
};
use crate::endpoint::route;
use crate::parser::ParsedFile;
use log::debug;
use syn::parse::ParseStream;
use syn::visit::Visit;
use syn::{Attribute, Expr, Lit, Meta, Token};

/// Smart pointers and `Option` are documented as their inner type
const TRANSPARENT_WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc", "Cow", "RefCell", "Cell"];

/// Build a catalog from the structs, enums and endpoint functions in `parsed_files`
pub fn catalog_from_files(parsed_files: &[ParsedFile]) -> TypeCatalog {
    let mut visitor = DescriptorVisitor::default();

    for parsed_file in parsed_files {
        visitor.module_path = parsed_file.module_path.clone();
        visitor.visit_file(&parsed_file.syntax_tree);
    }

    debug!(
        "Collected {} types and {} methods from {} files",
        visitor.types.len(),
        visitor.methods.len(),
        parsed_files.len()
    );

    let mut catalog = TypeCatalog::new();
    for descriptor in visitor.types {
        catalog.insert(descriptor);
    }
    for method in visitor.methods {
        catalog.insert_method(method);
    }
    catalog
}

#[derive(Default)]
struct DescriptorVisitor {
    module_path: String,
    impl_owner: Option<String>,
    types: Vec<TypeDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl DescriptorVisitor {
    fn qualify(&self, ident: &syn::Ident) -> String {
        if self.module_path.is_empty() {
            ident.to_string()
        } else {
            format!("{}::{}", self.module_path, ident)
        }
    }

    fn method_from_signature(
        &self,
        sig: &syn::Signature,
        attrs: &[Attribute],
        owner: Option<String>,
    ) -> MethodDescriptor {
        let mut params = Vec::new();
        for (idx, input) in sig.inputs.iter().enumerate() {
            let syn::FnArg::Typed(pat_type) = input else {
                continue;
            };
            params.push(ParamDescriptor {
                name: pattern_name(&pat_type.pat).unwrap_or_else(|| format!("arg{}", idx)),
                ty: type_ref(&pat_type.ty),
                annotations: annotations(&pat_type.attrs),
            });
        }

        let return_type = match &sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => Some(type_ref(ty)),
        };

        MethodDescriptor {
            name: sig.ident.to_string(),
            owner,
            params,
            return_type,
            doc: doc_comment(attrs),
            annotations: annotations(attrs),
        }
    }
}

impl<'ast> Visit<'ast> for DescriptorVisitor {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        let qualified_name = self.qualify(&node.ident);
        debug!("Describing struct {}", qualified_name);

        let container_annotations = annotations(&node.attrs);
        let rename_rule = rename_all_rule(&container_annotations);

        let mut descriptor = TypeDescriptor::object(qualified_name.clone());
        descriptor.type_params = node
            .generics
            .type_params()
            .map(|param| param.ident.to_string())
            .collect();

        if let syn::Fields::Named(named) = &node.fields {
            for field in &named.named {
                let Some(ident) = &field.ident else {
                    continue;
                };
                let name = ident.to_string();
                let name = name.strip_prefix("r#").unwrap_or(&name).to_string();

                let mut described = FieldDescriptor::new(name.clone(), type_ref(&field.ty));
                described.annotations = annotations(&field.attrs);
                if let Some(rule) = rename_rule.as_deref() {
                    apply_rename_all(&mut described.annotations, rule, &name);
                }
                described.doc = doc_comment(&field.attrs);
                described.declaring_type = qualified_name.clone();
                if is_phantom(&field.ty) {
                    described.modifiers.push(Modifier::Transient);
                }
                descriptor.fields.push(described);
            }
        }

        self.types.push(descriptor);
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        let qualified_name = self.qualify(&node.ident);
        debug!("Describing enum {}", qualified_name);

        let rename_rule = rename_all_rule(&annotations(&node.attrs));
        let variants = node
            .variants
            .iter()
            .map(|variant| {
                let ident = variant.ident.to_string();
                let variant_annotations = annotations(&variant.attrs);
                super::annotation_value(&variant_annotations, "serde::rename", "value")
                    .map(str::to_string)
                    .or_else(|| rename_rule.as_deref().map(|rule| rename(rule, &ident)))
                    .unwrap_or(ident)
            })
            .collect();

        let mut descriptor = TypeDescriptor::object(qualified_name);
        descriptor.kind = DescriptorKind::Enum;
        descriptor.variants = variants;
        self.types.push(descriptor);
    }

    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        let annotations = annotations(&node.attrs);
        if is_test_item(&annotations) || route(&annotations).is_none() {
            debug!("Skipping function {} without route", node.sig.ident);
            return;
        }
        let owner = (!self.module_path.is_empty()).then(|| self.module_path.clone());
        let method = self.method_from_signature(&node.sig, &node.attrs, owner);
        self.methods.push(method);
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        // trait impls only add framework plumbing
        if node.trait_.is_some() {
            return;
        }
        let previous = self.impl_owner.take();
        self.impl_owner = Some(type_ref(&node.self_ty).simple_name().to_string());
        syn::visit::visit_item_impl(self, node);
        self.impl_owner = previous;
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        let annotations = annotations(&node.attrs);
        let is_public = matches!(node.vis, syn::Visibility::Public(_));
        if is_test_item(&annotations) || (!is_public && route(&annotations).is_none()) {
            debug!("Skipping method {}", node.sig.ident);
            return;
        }
        let method = self.method_from_signature(&node.sig, &node.attrs, self.impl_owner.clone());
        self.methods.push(method);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_none() || is_test_item(&annotations(&node.attrs)) {
            return;
        }
        let previous = self.module_path.clone();
        self.module_path = self.qualify(&node.ident);
        syn::visit::visit_item_mod(self, node);
        self.module_path = previous;
    }
}

/// Convert a `syn` type into a type reference
pub fn type_ref(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Path(type_path) => path_type_ref(&type_path.path),
        syn::Type::Reference(reference) => type_ref(&reference.elem),
        syn::Type::Array(array) => TypeRef::array_of(type_ref(&array.elem)),
        syn::Type::Slice(slice) => TypeRef::array_of(type_ref(&slice.elem)),
        syn::Type::Paren(paren) => type_ref(&paren.elem),
        syn::Type::Group(group) => type_ref(&group.elem),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeRef::simple("()"),
        _ => TypeRef::simple("Unknown"),
    }
}

fn path_type_ref(path: &syn::Path) -> TypeRef {
    let Some(last) = path.segments.last() else {
        return TypeRef::simple("Unknown");
    };

    let args: Vec<TypeRef> = match &last.arguments {
        syn::PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(inner) => Some(type_ref(inner)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    if TRANSPARENT_WRAPPERS.contains(&last.ident.to_string().as_str()) {
        if let [inner] = args.as_slice() {
            return inner.clone();
        }
    }

    let name = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    TypeRef::generic(name, args)
}

fn is_phantom(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(type_path)
        if type_path.path.segments.last().is_some_and(|s| s.ident == "PhantomData"))
}

fn pattern_name(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(ident) => Some(ident.ident.to_string()),
        // `Json(body): Json<T>` destructuring
        syn::Pat::TupleStruct(tuple) => tuple.elems.first().and_then(pattern_name),
        syn::Pat::Reference(reference) => pattern_name(&reference.pat),
        syn::Pat::Type(typed) => pattern_name(&typed.pat),
        _ => None,
    }
}

/// Collect `///` lines into a doc comment
pub fn doc_comment(attrs: &[Attribute]) -> Option<DocComment> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(name_value) => literal_text(&name_value.value),
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(DocComment::parse(&lines.join("\n")))
}

/// Convert every non-doc attribute into an annotation
pub fn annotations(attrs: &[Attribute]) -> Vec<Annotation> {
    attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(annotation)
        .collect()
}

fn annotation(attr: &Attribute) -> Annotation {
    let mut annotation = Annotation::new(path_text(attr.path()));

    match &attr.meta {
        Meta::Path(_) => {}
        Meta::NameValue(name_value) => {
            let value = literal_text(&name_value.value).unwrap_or_else(|| "true".to_string());
            annotation.attributes.push(("value".to_string(), value));
        }
        Meta::List(_) => match attr.parse_args_with(parse_attribute_args) {
            Ok(attributes) => annotation.attributes = attributes,
            Err(e) => debug!("Skipping arguments of #[{}]: {}", annotation.name, e),
        },
    }

    annotation
}

/// Parse `"literal", key = value, flag, nested(..)` attribute arguments.
/// A leading literal is stored under `value`, bare flags and nested lists
/// under their name with `"true"`.
fn parse_attribute_args(input: ParseStream) -> syn::Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();

    while !input.is_empty() {
        if input.peek(Lit) {
            let lit: Lit = input.parse()?;
            if let Some(text) = lit_text(&lit) {
                attributes.push(("value".to_string(), text));
            }
        } else {
            match input.parse::<Meta>()? {
                Meta::Path(path) => attributes.push((path_text(&path), "true".to_string())),
                Meta::List(list) => attributes.push((path_text(&list.path), "true".to_string())),
                Meta::NameValue(name_value) => {
                    let value = literal_text(&name_value.value)
                        .unwrap_or_else(|| "true".to_string());
                    attributes.push((path_text(&name_value.path), value));
                }
            }
        }

        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }

    Ok(attributes)
}

fn path_text(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => lit_text(&expr_lit.lit),
        _ => None,
    }
}

fn lit_text(lit: &Lit) -> Option<String> {
    match lit {
        Lit::Str(s) => Some(s.value()),
        Lit::Int(i) => Some(i.base10_digits().to_string()),
        Lit::Float(f) => Some(f.base10_digits().to_string()),
        Lit::Bool(b) => Some(b.value.to_string()),
        Lit::Char(c) => Some(c.value().to_string()),
        _ => None,
    }
}

/// `#[test]`, `#[tokio::test]` or `#[cfg(test)]`
fn is_test_item(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|ann| {
        super::simple_name(&ann.name) == "test"
            || (ann.name == "cfg" && ann.attribute("test").is_some())
    })
}

fn rename_all_rule(annotations: &[Annotation]) -> Option<String> {
    super::annotation_value(annotations, "serde::rename_all", "value").map(str::to_string)
}

/// Give a field without its own `rename` the name `rename_all` produces
fn apply_rename_all(annotations: &mut Vec<Annotation>, rule: &str, name: &str) {
    if super::annotation_value(annotations, "serde::rename", "value").is_some() {
        return;
    }
    let renamed = rename(rule, name);
    if renamed == name {
        return;
    }
    match annotations.iter_mut().find(|ann| ann.name == "serde") {
        Some(serde) => serde.attributes.push(("rename".to_string(), renamed)),
        None => annotations.push(Annotation::new("serde").with_attribute("rename", renamed)),
    }
}

/// Apply a serde `rename_all` rule to a snake_case field or PascalCase variant
fn rename(rule: &str, name: &str) -> String {
    let words: Vec<String> = split_words(name);
    let capitalize = |word: &str| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }
    };

    match rule {
        "lowercase" => words.concat(),
        "UPPERCASE" => words.concat().to_uppercase(),
        "PascalCase" => words.iter().map(|w| capitalize(w)).collect(),
        "camelCase" => words
            .iter()
            .enumerate()
            .map(|(idx, w)| if idx == 0 { w.clone() } else { capitalize(w) })
            .collect(),
        "snake_case" => words.join("_"),
        "SCREAMING_SNAKE_CASE" => words.join("_").to_uppercase(),
        "kebab-case" => words.join("-"),
        "SCREAMING-KEBAB-CASE" => words.join("-").to_uppercase(),
        _ => name.to_string(),
    }
}

fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(c.to_lowercase());
        } else {
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
