use crate::config::Settings;
use crate::descriptor::catalog::TypeCatalog;
use crate::descriptor::rust::catalog_from_files;
use crate::descriptor::{MethodDescriptor, TypeRef, TypeSource};
use crate::endpoint::{EndpointBuilder, EndpointDoc, EndpointDocData};
use crate::parser::{AstParser, ParsedFile};
use crate::render::json_schema::{self, JsonSchema};
use crate::render::{json_desc, markdown};
use crate::scanner::FileScanner;
use crate::serializer::{emit, serialize_json, serialize_yaml};
use crate::tree_builder::{CancelToken, ParamTreeBuilder};
use crate::upload::{CatalogClient, CatalogPayload, FileCatalogClient};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Doc View - Generate parameter documentation from interface definitions
#[derive(Parser, Debug)]
#[command(name = "doc-view")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Type to document, e.g. `Page<User>` (repeatable)
    #[arg(short = 't', long = "type", value_name = "TYPE", conflicts_with = "endpoints")]
    pub types: Vec<String>,

    /// Endpoint to document, `name` or `Owner#name` (repeatable).
    /// Every endpoint is documented when neither types nor endpoints are given.
    #[arg(short = 'e', long = "endpoint", value_name = "NAME")]
    pub endpoints: Vec<String>,

    /// Settings file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Additional type catalog files (YAML or JSON)
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalogs: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "markdown")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout).
    /// With `payload` this is the directory payload files are saved to.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// One Markdown table per nesting level
    #[arg(long = "separate")]
    pub separate: bool,

    /// Abandon tree building after this many seconds
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown tables, or full endpoint pages
    Markdown,
    /// JSON with a `//` description per field
    JsonDesc,
    /// JSON-Schema documents
    JsonSchema,
    /// YAML dump of the parameter trees or endpoint documents
    Document,
    /// API-catalog payloads
    Payload,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if args.output_format == OutputFormat::Payload && !args.types.is_empty() {
        anyhow::bail!("The payload format documents endpoints, not types");
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// JSON-Schema pair of one endpoint
#[derive(Debug, Serialize)]
struct EndpointSchemas {
    name: String,
    request: JsonSchema,
    response: JsonSchema,
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting documentation generation...");

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if args.separate {
        settings.separate_param = true;
    }

    let catalog = load_catalog(&args)?;
    info!(
        "Catalog holds {} types and {} endpoints",
        catalog.len(),
        catalog.methods().len()
    );

    let cancel = match args.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    let content = if args.types.is_empty() {
        render_endpoints(&args, &settings, &catalog, cancel)?
    } else {
        Some(render_types(&args, &settings, &catalog, cancel)?)
    };

    if let Some(content) = content {
        emit(&content, args.output_path.as_deref())?;
    }

    info!("Generation complete!");
    Ok(())
}

/// Types and endpoints of the project sources, the scanned catalog files and
/// the catalog files named on the command line
fn load_catalog(args: &CliArgs) -> Result<TypeCatalog> {
    info!("Scanning project directory...");
    let scanner = FileScanner::new(args.project_path.clone());
    let scan_result = scanner.scan()?;
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    info!(
        "Found {} Rust files and {} catalog files",
        scan_result.rust_files.len(),
        scan_result.catalog_files.len()
    );

    let parsed_files: Vec<ParsedFile> =
        AstParser::parse_files(scanner.root_path(), &scan_result.rust_files)
            .into_iter()
            .filter_map(|result| match result {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("Skipping file due to parse error: {}", e);
                    None
                }
            })
            .collect();
    info!("Successfully parsed {} files", parsed_files.len());

    let mut catalog = catalog_from_files(&parsed_files);
    for path in scan_result.catalog_files.iter().chain(&args.catalogs) {
        let loaded = TypeCatalog::load(path)
            .with_context(|| format!("Failed to load type catalog {}", path.display()))?;
        catalog.merge(loaded);
    }
    Ok(catalog)
}

fn render_types(
    args: &CliArgs,
    settings: &Settings,
    catalog: &TypeCatalog,
    cancel: CancelToken,
) -> Result<String> {
    let builder = ParamTreeBuilder::new(settings, catalog).with_cancel_token(cancel);
    let mut sections = Vec::new();
    let mut roots = Vec::new();

    for type_text in &args.types {
        let ty = TypeRef::parse(type_text);
        let root = builder
            .build(Some(&ty), &HashMap::new())
            .with_context(|| format!("Failed to document {}", type_text))?;
        debug!("{} has {} nodes", ty, root.descendant_count());

        match args.output_format {
            OutputFormat::Markdown => sections.push(format!(
                "## {}\n\n{}",
                ty,
                markdown::render(&root.children, settings)
            )),
            OutputFormat::JsonDesc => sections.push(json_desc::render(&root.children)),
            OutputFormat::JsonSchema => {
                sections.push(json_schema::render(&root.children).to_json_pretty()?)
            }
            OutputFormat::Document | OutputFormat::Payload => {}
        }
        roots.push(root);
    }

    if args.output_format == OutputFormat::Document {
        return serialize_yaml(&roots);
    }
    Ok(sections.join("\n"))
}

/// Rendered endpoints; `None` when payloads were saved through a client
fn render_endpoints(
    args: &CliArgs,
    settings: &Settings,
    catalog: &TypeCatalog,
    cancel: CancelToken,
) -> Result<Option<String>> {
    let methods = select_methods(args, catalog)?;
    if methods.is_empty() {
        warn!("No endpoints found in the project");
    }

    let builder = EndpointBuilder::new(settings, catalog).with_cancel_token(cancel);
    let docs = methods
        .iter()
        .map(|method| {
            builder
                .build(method)
                .with_context(|| format!("Failed to document endpoint {}", method.name))
        })
        .collect::<Result<Vec<EndpointDoc>>>()?;
    info!("Documented {} endpoints", docs.len());

    let content = match args.output_format {
        OutputFormat::Markdown => docs
            .iter()
            .map(|doc| Ok(EndpointDocData::new(doc, settings)?.markdown()))
            .collect::<Result<Vec<_>>>()?
            .join("\n"),
        OutputFormat::JsonDesc => docs
            .iter()
            .map(|doc| {
                format!(
                    "// {} 请求\n{}\n// {} 返回\n{}\n",
                    doc.name,
                    json_desc::render(&doc.request_body),
                    doc.name,
                    json_desc::render(&doc.response_body)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::JsonSchema => {
            let schemas: Vec<EndpointSchemas> = docs
                .iter()
                .map(|doc| EndpointSchemas {
                    name: doc.name.clone(),
                    request: json_schema::render(&doc.request_body),
                    response: json_schema::render(&doc.response_body),
                })
                .collect();
            serialize_json(&schemas)?
        }
        OutputFormat::Document => serialize_yaml(&docs)?,
        OutputFormat::Payload => {
            let payloads = docs
                .iter()
                .map(|doc| CatalogPayload::new(doc, settings))
                .collect::<crate::error::Result<Vec<_>>>()?;

            if let Some(dir) = &args.output_path {
                let client = FileCatalogClient::new(dir);
                for payload in &payloads {
                    client.save(payload)?;
                }
                info!("Saved {} payloads to {}", payloads.len(), dir.display());
                return Ok(None);
            }
            serialize_json(&payloads)?
        }
    };
    Ok(Some(content))
}

fn select_methods<'a>(args: &CliArgs, catalog: &'a TypeCatalog) -> Result<Vec<&'a MethodDescriptor>> {
    if args.endpoints.is_empty() {
        return Ok(catalog.methods().iter().collect());
    }
    args.endpoints
        .iter()
        .map(|name| {
            catalog
                .method(name)
                .with_context(|| format!("Endpoint not found: {}", name))
        })
        .collect()
}
