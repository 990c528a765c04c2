//! Markdown parameter tables.

use crate::config::Settings;
use crate::model::{Header, Node, Param};

pub const TABLE_HEADER: &str = "|参数名|类型|必填|描述|\n|:-----|:-----|:-----|:-----|\n";
pub const HEADER_TABLE_HEADER: &str = "|参数名|参数值|必填|描述|\n|:-----|:-----|:-----|:-----|\n";

fn required_mark(required: bool) -> &'static str {
    if required {
        "Y"
    } else {
        "N"
    }
}

fn row(out: &mut String, name: &str, second: &str, required: bool, description: &str) {
    out.push('|');
    out.push_str(name);
    out.push('|');
    out.push_str(second);
    out.push('|');
    out.push_str(required_mark(required));
    out.push('|');
    out.push_str(description);
    out.push_str("|\n");
}

/// Body table in the layout the settings ask for
pub fn render(nodes: &[Node], settings: &Settings) -> String {
    if settings.separate_param {
        render_separated(nodes)
    } else {
        render_flat(nodes, settings)
    }
}

/// One table; nested rows carry the nesting prefix in their name cell
pub fn render_flat(nodes: &[Node], settings: &Settings) -> String {
    if nodes.is_empty() {
        return String::new();
    }
    let mut out = String::from(TABLE_HEADER);
    flat_rows(&mut out, nodes, settings, 0);
    out
}

fn flat_rows(out: &mut String, nodes: &[Node], settings: &Settings, depth: usize) {
    for node in nodes {
        let name = format!("{}{}", settings.nesting_prefix(depth), node.name);
        row(out, &name, &node.type_name, node.required, &node.description);
        if !node.children.is_empty() {
            flat_rows(out, &node.children, settings, depth + 1);
        }
    }
}

/// One table per nesting level; every row with children is followed, after
/// its table, by a `- <type> <name>` heading and the children's own table
pub fn render_separated(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return String::new();
    }

    let mut out = String::from(TABLE_HEADER);
    for node in nodes {
        row(&mut out, &node.name, &node.type_name, node.required, &node.description);
    }

    for node in nodes.iter().filter(|node| !node.children.is_empty()) {
        out.push_str("\n- ");
        out.push_str(&node.type_name);
        out.push(' ');
        out.push_str(&node.name);
        out.push_str("\n\n");
        out.push_str(&render_separated(&node.children));
    }
    out
}

/// Flat table of query or form parameters
pub fn render_params(params: &[Param]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let mut out = String::from(TABLE_HEADER);
    for param in params {
        row(&mut out, &param.name, &param.type_name, param.required, &param.description);
    }
    out
}

/// Header table: name, value, required, description. Never nested.
pub fn render_headers(headers: &[Header]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut out = String::from(HEADER_TABLE_HEADER);
    for header in headers {
        row(&mut out, &header.name, &header.value, header.required, &header.description);
    }
    out
}
