use doc_view::{
    config::Settings,
    descriptor::{catalog::TypeCatalog, rust::catalog_from_files, TypeRef, TypeSource},
    endpoint::{ContentType, EndpointBuilder, EndpointDoc, EndpointDocData},
    model::Node,
    parser::AstParser,
    render::{json_desc, json_schema, markdown},
    scanner::FileScanner,
    tree_builder::ParamTreeBuilder,
    upload::CatalogPayload,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn shop_project() -> TempDir {
    create_test_project(vec![
        ("src/model.rs", include_str!("fixtures/shop_project/src/model.rs")),
        ("src/api.rs", include_str!("fixtures/shop_project/src/api.rs")),
        (
            "legacy.types.yaml",
            include_str!("fixtures/shop_project/legacy.types.yaml"),
        ),
    ])
}

/// Scan, parse and load the whole project the way the CLI does
fn load_catalog(project: &TempDir) -> TypeCatalog {
    let scanner = FileScanner::new(project.path().to_path_buf());
    let scan_result = scanner.scan().expect("Failed to scan directory");
    assert_eq!(scan_result.rust_files.len(), 2);
    assert_eq!(scan_result.catalog_files.len(), 1);

    let parsed_files: Vec<_> = AstParser::parse_files(scanner.root_path(), &scan_result.rust_files)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(parsed_files.len(), 2, "Should parse every fixture file");

    let mut catalog = catalog_from_files(&parsed_files);
    for path in &scan_result.catalog_files {
        catalog.merge(TypeCatalog::load(path).expect("Failed to load catalog"));
    }
    catalog
}

fn tree(catalog: &TypeCatalog, settings: &Settings, root: &str) -> Vec<Node> {
    ParamTreeBuilder::new(settings, catalog)
        .build_children(Some(&TypeRef::parse(root)), &HashMap::new())
        .expect("Failed to build tree")
}

fn endpoint(catalog: &TypeCatalog, settings: &Settings, name: &str) -> EndpointDoc {
    let method = catalog.method(name).expect("Endpoint should exist");
    EndpointBuilder::new(settings, catalog)
        .build(method)
        .expect("Failed to build endpoint")
}

fn names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

#[test]
fn test_catalog_combines_sources_and_type_files() {
    let project = shop_project();
    let catalog = load_catalog(&project);

    assert_eq!(
        catalog.lookup("User").unwrap().qualified_name,
        "crate::model::User"
    );
    assert_eq!(
        catalog.lookup("Account").unwrap().qualified_name,
        "com.shop.Account"
    );
    assert!(catalog.lookup("Status").unwrap().is_enum());
    assert!(catalog.method("get_user").is_some());
    assert!(catalog.method("CategoryService#tree").is_some());
}

#[test]
fn test_generic_page_markdown() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let nodes = tree(&catalog, &settings, "Page<User>");

    assert_eq!(
        markdown::render(&nodes, &settings),
        "|参数名|类型|必填|描述|\n\
         |:-----|:-----|:-----|:-----|\n\
         |total|i64|N|总数|\n\
         |items|Vec<User>|N||\n\
         |└─id|i64|Y|主键|\n\
         |└─name|String|N|用户名|\n\
         |└─mail|String|N||\n\
         |└─tags|Vec<String>|N||\n\
         |└─status|Status|N||\n"
    );
}

#[test]
fn test_separated_markdown_has_one_table_per_level() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings {
        separate_param: true,
        ..Default::default()
    };

    let nodes = tree(&catalog, &settings, "Page<User>");
    let rendered = markdown::render(&nodes, &settings);

    assert_eq!(rendered.matches("|参数名|类型|必填|描述|").count(), 2);
    assert!(rendered.contains("\n- Vec<User> items\n\n"));
    assert!(!rendered.contains("└"));
}

#[test]
fn test_primitive_fields_markdown() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let nodes = tree(&catalog, &settings, "Account");

    assert_eq!(
        markdown::render(&nodes, &settings),
        "|参数名|类型|必填|描述|\n|:-----|:-----|:-----|:-----|\n|id|int|Y||\n|name|String|Y||\n"
    );
}

#[test]
fn test_json_schema_required_and_collection() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let schema = json_schema::render(&tree(&catalog, &settings, "Tagged"));
    let value: serde_json::Value = serde_json::from_str(&schema.to_json().unwrap()).unwrap();

    assert_eq!(value["required"], serde_json::json!(["id"]));
    assert_eq!(value["properties"]["id"]["type"], "number");
    assert_eq!(value["properties"]["tags"]["type"], "array");
    assert_eq!(value["properties"]["tags"]["items"]["type"], "string");
}

#[test]
fn test_commented_json() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let nodes = tree(&catalog, &settings, "Counter");

    assert_eq!(
        json_desc::render(&nodes),
        "{\n\"count\": 0,    // 总数\n\"note\": \"\"\n}"
    );
}

#[test]
fn test_self_referential_type_terminates() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let nodes = tree(&catalog, &settings, "Category");

    assert_eq!(names(&nodes), vec!["name", "parent"]);
    assert_eq!(nodes[1].type_name, "Category");
    assert!(nodes[1].children.is_empty());
}

#[test]
fn test_array_of_objects_in_markdown_and_schema() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let nodes = tree(&catalog, &settings, "Page<User>");
    let items = &nodes[1];
    assert!(items.is_array);
    assert_eq!(names(&items.children), vec!["id", "name", "mail", "tags", "status"]);

    let schema = json_schema::render(&nodes);
    let items_schema = schema.property("items").unwrap();
    assert_eq!(items_schema.schema_type, "array");
    let element = items_schema.items.as_deref().unwrap();
    assert_eq!(element.schema_type, "object");
    assert_eq!(element.property("name").unwrap().schema_type, "string");
    assert_eq!(element.property("status").unwrap().schema_type, "string");
}

#[test]
fn test_rendering_is_idempotent() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();
    let nodes = tree(&catalog, &settings, "Page<User>");

    assert_eq!(
        markdown::render(&nodes, &settings),
        markdown::render(&nodes, &settings)
    );
    assert_eq!(json_desc::render(&nodes), json_desc::render(&nodes));
    assert_eq!(
        json_schema::render(&nodes).to_json().unwrap(),
        json_schema::render(&nodes).to_json().unwrap()
    );
}

#[test]
fn test_get_endpoint_from_sources() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let doc = endpoint(&catalog, &settings, "get_user");

    assert_eq!(doc.name, "用户详情");
    assert!(doc.desc.contains("根据主键查询用户"));
    assert_eq!(doc.method, "GET");
    assert_eq!(doc.path, "/users/{id}");
    assert_eq!(doc.content_type, ContentType::Form);

    let headers: Vec<&str> = doc.headers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(headers, vec!["Content-Type", "X-Token"]);
    assert_eq!(doc.headers[1].description, "令牌");

    let params: Vec<&str> = doc.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["id"]);
    assert!(doc.request_body.is_empty());
    assert_eq!(
        names(&doc.response_body),
        vec!["id", "name", "mail", "tags", "status"]
    );
}

#[test]
fn test_query_endpoint_form_example() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let doc = endpoint(&catalog, &settings, "list_users");
    let data = EndpointDocData::new(&doc, &settings).unwrap();

    assert_eq!(data.request_example, "```Form\npage=1&keyword=\n```");
    assert!(data.response_param.contains("|total|i64|N|总数|"));
    assert!(data.response_param.contains("|└─name|String|N|用户名|"));
}

#[test]
fn test_json_body_endpoint_and_payload() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let doc = endpoint(&catalog, &settings, "create_user");
    assert_eq!(doc.content_type, ContentType::Json);
    assert_eq!(doc.headers[0].value, "application/json");
    assert_eq!(
        names(&doc.request_body),
        vec!["id", "name", "mail", "tags", "status"]
    );

    let payload = CatalogPayload::new(&doc, &settings).unwrap();
    assert_eq!(payload.method, "POST");
    assert_eq!(payload.path, "/users");
    let body: serde_json::Value = serde_json::from_str(&payload.req_body_other).unwrap();
    assert_eq!(body["required"], serde_json::json!(["id"]));
    assert_eq!(body["properties"]["tags"]["items"]["type"], "string");
}

#[test]
fn test_rpc_endpoint_from_impl_method() {
    let project = shop_project();
    let catalog = load_catalog(&project);
    let settings = Settings::default();

    let doc = endpoint(&catalog, &settings, "CategoryService#tree");

    assert!(doc.is_rpc());
    assert_eq!(doc.path, "CategoryService#tree");
    assert_eq!(names(&doc.request_body), vec!["root"]);
    assert_eq!(names(&doc.response_body), vec!["name", "parent"]);

    let payload = CatalogPayload::new(&doc, &settings).unwrap();
    assert_eq!(payload.method, "POST");
    assert_eq!(payload.path, "/RPC/CategoryService/tree");
}
