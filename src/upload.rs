//! API-catalog payloads and the clients that submit them.
//!
//! A payload is derived from an [`EndpointDoc`] without touching its trees,
//! so a failed submission can be retried or the trees re-rendered.

use crate::config::Settings;
use crate::endpoint::{ContentType, EndpointDoc, EndpointDocData};
use crate::example::form_example;
use crate::error::{Error, Result};
use crate::render::json_schema;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Path prefix of RPC endpoints in a catalog, which only knows HTTP routes.
/// `UserService#create` is stored as `/RPC/UserService/create`.
pub const RPC_PATH_PREFIX: &str = "/RPC/";
pub const RESPONSE_BODY_TYPE: &str = "json";

fn required_flag(required: bool) -> String {
    if required { "1" } else { "0" }.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogHeader {
    pub name: String,
    pub value: String,
    pub desc: String,
    /// `"1"` or `"0"`
    pub required: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub example: String,
    pub desc: String,
    /// `"1"` or `"0"`
    pub required: String,
}

/// One interface as an API catalog stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPayload {
    pub title: String,
    pub path: String,
    pub method: String,
    pub req_body_type: String,
    pub req_headers: Vec<CatalogHeader>,
    pub req_query: Vec<CatalogQuery>,
    pub req_body_is_json_schema: bool,
    /// JSON-Schema text of the request body, JSON requests only
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub req_body_other: String,
    pub res_body_type: String,
    /// JSON-Schema text of the response body
    pub res_body: String,
    pub markdown: String,
}

impl CatalogPayload {
    pub fn new(doc: &EndpointDoc, settings: &Settings) -> Result<Self> {
        let data = EndpointDocData::new(doc, settings)?;

        let (method, path) = if doc.is_rpc() {
            ("POST".to_string(), format!("{}{}", RPC_PATH_PREFIX, doc.path.replace('#', "/")))
        } else {
            (doc.method.clone(), doc.path.clone())
        };

        let req_headers = doc
            .headers
            .iter()
            .map(|header| CatalogHeader {
                name: header.name.clone(),
                value: header.value.clone(),
                desc: header.description.clone(),
                required: required_flag(header.required),
            })
            .collect();

        let req_query = doc
            .params
            .iter()
            .map(|param| CatalogQuery {
                name: param.name.clone(),
                type_name: param.type_name.clone(),
                example: param.example.clone(),
                desc: param.description.clone(),
                required: required_flag(param.required),
            })
            .collect();

        let is_json = doc.content_type == ContentType::Json;
        let req_body_other = if is_json {
            json_schema::render(&doc.request_body).to_json()?
        } else {
            String::new()
        };

        Ok(Self {
            title: doc.name.clone(),
            path,
            method,
            req_body_type: doc.content_type.as_str().to_string(),
            req_headers,
            req_query,
            req_body_is_json_schema: is_json,
            req_body_other,
            res_body_type: RESPONSE_BODY_TYPE.to_string(),
            res_body: json_schema::render(&doc.response_body).to_json()?,
            markdown: catalog_description(doc, &data),
        })
    }
}

/// Description page stored with the interface: name, description and the
/// request and response examples with field comments
pub fn catalog_description(doc: &EndpointDoc, data: &EndpointDocData) -> String {
    let request = if data.request_json_with_desc.trim().is_empty() {
        form_example(&doc.params)
    } else {
        data.request_json_with_desc.clone()
    };

    format!(
        "**接口名称:**\n\n{}\n\n**接口描述:**\n\n{}\n\n**请求示例:**\n\n```{}\n{}\n```\n\n**返回示例:**\n\n```json\n{}\n```\n\n",
        doc.name,
        doc.desc,
        doc.content_type.as_str(),
        request,
        data.response_json_with_desc
    )
}

/// Destination of catalog payloads
pub trait CatalogClient {
    /// Submit one payload. Failures are [`Error::UploadError`].
    fn save(&self, payload: &CatalogPayload) -> Result<()>;
}

/// Writes each payload as a JSON file into a directory
pub struct FileCatalogClient {
    dir: PathBuf,
}

impl FileCatalogClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `GET /users/{id}` → `get_users_id.json`
    pub fn file_name(payload: &CatalogPayload) -> String {
        let raw = format!("{}_{}", payload.method, payload.path).to_ascii_lowercase();
        let mut name = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c);
            } else if !name.ends_with('_') {
                name.push('_');
            }
        }
        format!("{}.json", name.trim_end_matches('_'))
    }
}

impl CatalogClient for FileCatalogClient {
    fn save(&self, payload: &CatalogPayload) -> Result<()> {
        let path = self.dir.join(Self::file_name(payload));
        debug!("Saving catalog payload to {}", path.display());

        let content = serde_json::to_string_pretty(payload)
            .map_err(|e| Error::UploadError(format!("{}: {}", payload.title, e)))?;
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, content))
            .map_err(|e| Error::UploadError(format!("{}: {}", path.display(), e)))?;

        info!("Saved {} {} to {}", payload.method, payload.path, path.display());
        Ok(())
    }
}
