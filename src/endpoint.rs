//! Endpoint documents: one documented method with its headers, parameters
//! and bodies, plus the rendered fragments of its Markdown page.

use crate::classifier::ShapeKind;
use crate::config::Settings;
use crate::descriptor::{
    annotation_value, simple_name, Annotation, MethodDescriptor, ParamDescriptor, TypeRef,
    TypeSource,
};
use crate::error::Result;
use crate::example::{example_value, form_example};
use crate::model::{Header, Node, Param};
use crate::render::json_desc::{self, ELEMENT_NODE};
use crate::render::markdown;
use crate::tree_builder::{CancelToken, ParamTreeBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Doc tag overriding the endpoint title
pub const NAME_TAG: &str = "name";
/// Doc tag describing a parameter: `@param page 页码`
pub const PARAM_TAG: &str = "param";
/// Method of endpoints without an HTTP route
pub const RPC_METHOD: &str = "RPC";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

const ROUTE_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];
const BODY_WRAPPERS: &[&str] = &["Json"];
const PARAM_WRAPPERS: &[&str] = &["Query", "Form", "Path"];
const RESPONSE_WRAPPERS: &[&str] = &["Json", "Result"];

/// Encoding of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Json,
    #[default]
    Form,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Form => "application/x-www-form-urlencoded",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Form => "form",
        }
    }
}

/// Everything documented about one endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointDoc {
    pub name: String,
    pub desc: String,
    pub path: String,
    pub method: String,
    /// Name of the documented function
    pub function: String,
    pub content_type: ContentType,
    pub headers: Vec<Header>,
    pub params: Vec<Param>,
    pub request_body: Vec<Node>,
    pub response_body: Vec<Node>,
}

impl EndpointDoc {
    pub fn is_rpc(&self) -> bool {
        self.method == RPC_METHOD
    }
}

/// Builds [`EndpointDoc`]s from method descriptors
pub struct EndpointBuilder<'a> {
    settings: &'a Settings,
    source: &'a dyn TypeSource,
    trees: ParamTreeBuilder<'a>,
}

impl<'a> EndpointBuilder<'a> {
    pub fn new(settings: &'a Settings, source: &'a dyn TypeSource) -> Self {
        Self {
            settings,
            source,
            trees: ParamTreeBuilder::new(settings, source),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.trees = self.trees.with_cancel_token(cancel);
        self
    }

    pub fn build(&self, method: &MethodDescriptor) -> Result<EndpointDoc> {
        info!("Documenting endpoint {}", method.name);

        let doc = method.doc.clone().unwrap_or_default();
        let name = doc
            .tag(NAME_TAG)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| method.name.clone());

        let (http_method, path) = match route(&method.annotations) {
            Some(route) => route,
            None => {
                let owner = method.owner.as_deref().map(simple_name).unwrap_or("crate");
                (RPC_METHOD.to_string(), format!("{}#{}", owner, method.name))
            }
        };
        let is_rpc = http_method == RPC_METHOD;

        let mut request = RequestParts::default();
        for param in &method.params {
            if self.trees.selector().is_param_excluded(param) {
                debug!("Skipping excluded parameter {}", param.name);
                continue;
            }
            self.add_param(method, param, is_rpc, &mut request)?;
        }

        let content_type = if request.has_body {
            ContentType::Json
        } else {
            ContentType::Form
        };
        let mut headers = vec![Header::new(CONTENT_TYPE_HEADER, content_type.mime(), true)];
        headers.extend(request.headers);

        let response_body = match method.return_type.as_ref().map(unwrap_response) {
            Some(ty) => self.body_nodes(ELEMENT_NODE, &ty, false)?,
            None => Vec::new(),
        };

        Ok(EndpointDoc {
            name,
            desc: doc.text.clone(),
            path,
            method: http_method,
            function: method.name.clone(),
            content_type,
            headers,
            params: request.params,
            request_body: request.body,
            response_body,
        })
    }

    fn add_param(
        &self,
        method: &MethodDescriptor,
        param: &ParamDescriptor,
        is_rpc: bool,
        request: &mut RequestParts,
    ) -> Result<()> {
        let selector = self.trees.selector();

        if param
            .annotations
            .iter()
            .any(|ann| ann.matches(&self.settings.header_annotation))
        {
            request.headers.push(self.header(method, param));
            return Ok(());
        }

        let wrapper = simple_name(&param.ty.name);
        if BODY_WRAPPERS.contains(&wrapper) {
            let inner = param.ty.args.first().unwrap_or(&param.ty);
            let required = selector.is_param_required(param);
            request.has_body = true;
            request.body.extend(self.body_nodes(&param.name, inner, required)?);
            return Ok(());
        }

        let ty = match param.ty.args.first() {
            Some(inner) if PARAM_WRAPPERS.contains(&wrapper) => inner,
            _ => &param.ty,
        };
        let shape = self.trees.classifier().classify_resolved(ty);

        if shape == ShapeKind::Object {
            if is_rpc {
                let required = selector.is_param_required(param);
                request.has_body = true;
                request.body.extend(self.body_nodes(&param.name, ty, required)?);
            } else {
                self.field_params(ty, request);
            }
            return Ok(());
        }

        if is_rpc {
            let required = selector.is_param_required(param);
            request.has_body = true;
            request.body.extend(self.body_nodes(&param.name, ty, required)?);
            return Ok(());
        }

        let name = annotation_value(&param.annotations, &self.settings.request_param_annotation, "name")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&param.name)
            .to_string();
        if !request.param_names.insert(name.clone()) {
            return Ok(());
        }
        request.params.push(Param {
            description: param_doc(method, &param.name),
            type_name: ty.to_string(),
            required: selector.is_param_required(param),
            kind: shape,
            name,
            ..Default::default()
        });
        Ok(())
    }

    fn header(&self, method: &MethodDescriptor, param: &ParamDescriptor) -> Header {
        let annotations = &param.annotations;
        let marker = self.settings.header_annotation.as_str();
        let lookup = |key: &str| {
            annotation_value(annotations, marker, key)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };

        let mut header = Header::new(
            lookup("name").or_else(|| lookup("value")).unwrap_or_else(|| param.name.clone()),
            lookup("default").or_else(|| lookup("default_value")).unwrap_or_default(),
            self.trees.selector().is_param_required(param),
        );
        header.description = lookup("description").unwrap_or_else(|| param_doc(method, &param.name));
        header
    }

    /// One query parameter per leaf field of an object, first name wins
    fn field_params(&self, ty: &TypeRef, request: &mut RequestParts) {
        let Some(descriptor) = self.source.lookup(&ty.name) else {
            debug!("Parameter type {} is unknown, skipping", ty);
            return;
        };
        let selector = self.trees.selector();
        let generics = descriptor.generics_for(ty);

        for field in self.source.all_fields(descriptor) {
            if selector.is_excluded(&field, descriptor.is_proto) {
                continue;
            }
            let field_ty = field.ty.substitute(&generics);
            let shape = self.trees.classifier().classify_resolved(&field_ty);
            if !shape.is_leaf() {
                continue;
            }
            let name = selector.field_name(&field, descriptor.is_proto);
            if !request.param_names.insert(name.clone()) {
                continue;
            }
            request.params.push(Param {
                name,
                type_name: field_ty.to_string(),
                description: selector.description(&field),
                example: selector.example(&field),
                required: selector.is_required(&field),
                kind: shape,
            });
        }
    }

    /// Nodes a value of type `ty` contributes to a body. Objects contribute
    /// their fields; anything else, maps included, becomes one node named `name`.
    fn body_nodes(&self, name: &str, ty: &TypeRef, required: bool) -> Result<Vec<Node>> {
        let mut root = self.trees.build(Some(ty), &HashMap::new())?;
        if root == Node::default() {
            return Ok(Vec::new());
        }
        if root.kind == ShapeKind::Object {
            return Ok(root.children);
        }

        root.name = name.to_string();
        root.required = required;
        root.qualified_type_name = None;
        deepen(&mut root.children);
        Ok(vec![root])
    }
}

#[derive(Default)]
struct RequestParts {
    headers: Vec<Header>,
    params: Vec<Param>,
    param_names: HashSet<String>,
    body: Vec<Node>,
    has_body: bool,
}

/// HTTP method and path of a route attribute such as `#[get("/users")]` or
/// `#[route("/users", method = "GET")]`
pub fn route(annotations: &[Annotation]) -> Option<(String, String)> {
    annotations.iter().find_map(|ann| {
        let name = ann.name.rsplit("::").next().unwrap_or(&ann.name);
        let path = ann.attribute("value").unwrap_or("/").to_string();
        if ROUTE_METHODS.contains(&name) {
            return Some((name.to_ascii_uppercase(), path));
        }
        if name == "route" {
            let method = ann.attribute("method").unwrap_or("GET");
            return Some((method.to_ascii_uppercase(), path));
        }
        None
    })
}

/// `Result<Json<T>, E>` → `T`
fn unwrap_response(ty: &TypeRef) -> TypeRef {
    let mut current = ty.clone();
    while RESPONSE_WRAPPERS.contains(&simple_name(&current.name)) {
        match current.args.first() {
            Some(inner) => current = inner.clone(),
            None => break,
        }
    }
    current
}

/// Description from a `@param name text` doc tag
fn param_doc(method: &MethodDescriptor, name: &str) -> String {
    let Some(doc) = &method.doc else {
        return String::new();
    };
    doc.tags
        .iter()
        .filter(|tag| tag.name == PARAM_TAG)
        .find_map(|tag| {
            let (param, text) = tag.value.split_once(char::is_whitespace)?;
            (param == name).then(|| text.trim().to_string())
        })
        .unwrap_or_default()
}

fn deepen(nodes: &mut [Node]) {
    for node in nodes {
        node.depth += 1;
        deepen(&mut node.children);
    }
}

/// Rendered fragments of one endpoint page
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EndpointDocData {
    pub name: String,
    pub desc: String,
    pub path: String,
    pub method: String,
    pub request_header: String,
    pub request_param: String,
    pub request_body: String,
    pub request_json_with_desc: String,
    pub request_example: String,
    pub response_param: String,
    pub response_json_with_desc: String,
    pub response_example: String,
}

impl EndpointDocData {
    pub fn new(doc: &EndpointDoc, settings: &Settings) -> Result<Self> {
        Ok(Self {
            name: doc.name.clone(),
            desc: doc.desc.clone(),
            path: doc.path.clone(),
            method: doc.method.clone(),
            request_header: markdown::render_headers(&doc.headers),
            request_param: markdown::render_params(&doc.params),
            request_body: markdown::render(&doc.request_body, settings),
            request_json_with_desc: json_desc::render(&doc.request_body),
            request_example: request_example(doc)?,
            response_param: markdown::render(&doc.response_body, settings),
            response_json_with_desc: json_desc::render(&doc.response_body),
            response_example: response_example(doc)?,
        })
    }

    /// The whole endpoint page
    pub fn markdown(&self) -> String {
        let mut out = format!("## {}\n\n", self.name);
        if !self.desc.trim().is_empty() {
            out.push_str(&format!("{}\n\n", self.desc.trim()));
        }
        out.push_str(&format!("**请求地址:** `{}`\n\n", self.path));
        out.push_str(&format!("**请求方式:** `{}`\n\n", self.method));

        section(&mut out, "请求头", &self.request_header);
        let params = format!("{}{}", self.request_param, self.request_body);
        section(&mut out, "请求参数", &params);
        section(&mut out, "请求示例", &self.request_example);
        section(&mut out, "返回参数", &self.response_param);
        section(&mut out, "返回示例", &self.response_example);
        out
    }
}

fn section(out: &mut String, title: &str, content: &str) {
    let content = content.trim_end();
    if content.is_empty() {
        return;
    }
    out.push_str(&format!("**{}:**\n\n{}\n\n", title, content));
}

/// Pretty JSON example of a body, empty when the body is
pub fn body_example(nodes: &[Node]) -> Result<String> {
    if nodes.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string_pretty(&example_value(nodes))?)
}

fn request_example(doc: &EndpointDoc) -> Result<String> {
    let form = form_example(&doc.params);
    let body = body_example(&doc.request_body)?;

    let form_block = (!form.is_empty()).then(|| format!("```Form\n{}\n```", form));
    let body_block = (!body.is_empty()).then(|| format!("```JSON\n{}\n```", body));
    Ok([form_block, body_block]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn response_example(doc: &EndpointDoc) -> Result<String> {
    let body = body_example(&doc.response_body)?;
    if body.is_empty() {
        return Ok(body);
    }
    Ok(format!("```JSON\n{}\n```\n\n", body))
}
