//! JSON text with a trailing `//` comment per described field.
//!
//! The output is documentation, not strict JSON.

use crate::example::leaf_literal;
use crate::model::Node;

const INDENT: &str = "    ";
/// Name of the synthetic wrapper some trees put around array elements
pub const ELEMENT_NODE: &str = "element";

pub fn render(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return String::new();
    }
    let mut out = String::from("{\n");
    content(&mut out, nodes, 0);
    out.push('}');
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn add_description(out: &mut String, node: &Node) {
    let description = node.description.trim();
    if description.is_empty() {
        out.push('\n');
    } else {
        out.push_str(INDENT);
        out.push_str("// ");
        out.push_str(description);
        out.push('\n');
    }
}

/// Children to render inside a node, looking through an `element` wrapper
fn effective_children(node: &Node) -> &[Node] {
    match node.children.as_slice() {
        [only] if only.name == ELEMENT_NODE => &only.children,
        children => children,
    }
}

fn content(out: &mut String, nodes: &[Node], level: usize) {
    for (idx, node) in nodes.iter().enumerate() {
        let is_last = idx + 1 == nodes.len();

        indent(out, level);
        out.push('"');
        out.push_str(&node.name);
        out.push_str("\": ");

        let children = effective_children(node);
        if children.is_empty() {
            out.push_str(&leaf_literal(node));
            if !is_last {
                out.push(',');
            }
            add_description(out, node);
            continue;
        }

        if node.is_array {
            out.push('[');
            add_description(out, node);
            indent(out, level + 1);
            out.push_str("{\n");
            content(out, children, level + 2);
            indent(out, level + 1);
            out.push_str("}\n");
            indent(out, level);
            out.push(']');
        } else {
            out.push('{');
            add_description(out, node);
            content(out, children, level + 1);
            indent(out, level);
            out.push('}');
        }
        if !is_last {
            out.push(',');
        }
        out.push('\n');
    }
}
