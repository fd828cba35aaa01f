//! GitHub-flavored markdown renderer.
//!
//! Layout: module heading, navigation index, then one section per type with
//! its properties and methods in corpus order.

use crate::error::Result;
use crate::model::*;
use crate::render::Renderer;
use crate::toc;
use std::collections::HashMap;

pub struct MarkdownRenderer;

/// Index heading for types whose owner name is empty.
const GLOBAL_GROUP: &str = "(global)";

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &Documentation) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("# {} `assembly`\n", doc.module));

        let mut anchors = toc::Anchors::default();
        let sections: HashMap<&str, String> = doc
            .types
            .iter()
            .map(|t| (t.full_name.as_str(), anchors.type_section(&t.name)))
            .collect();

        if !doc.index.is_empty() {
            lines.push("## Index\n".to_string());
            for group in &doc.index {
                let key = if group.key.is_empty() {
                    GLOBAL_GROUP
                } else {
                    &group.key
                };
                lines.push(format!("- {}", key));
                for name in &group.types {
                    let full_name = if group.key.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", group.key, name)
                    };
                    let anchor = match sections.get(full_name.as_str()) {
                        Some(anchor) => anchor.clone(),
                        None => toc::github_slug(&format!("{} class", name)),
                    };
                    lines.push(format!("  - {}", toc::link(name, &anchor)));
                }
            }
            lines.push(String::new());
        }

        for node in &doc.types {
            render_type(node, &mut lines);
        }

        let mut output = lines.join("\n");
        output.push('\n');
        Ok(output)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn render_type(node: &TypeNode, lines: &mut Vec<String>) {
    lines.push(format!("## {} `class`\n", node.name));
    if !node.namespace.is_empty() {
        lines.push(format!("##### Namespace: `{}`\n", node.namespace));
    }
    if !node.interfaces.is_empty() {
        let list: Vec<String> = node.interfaces.iter().map(|i| format!("`{}`", i)).collect();
        lines.push(format!("##### Interfaces: {}\n", list.join(", ")));
    }
    if !node.summary.is_empty() {
        lines.push(node.summary.clone());
        lines.push(String::new());
    }
    lines.push("---\n".to_string());

    let properties: Vec<&PropertyNode> = node.properties().collect();
    if !properties.is_empty() {
        lines.push("### Properties\n".to_string());
        for property in properties {
            render_property(property, lines);
        }
    }

    let methods: Vec<&MethodNode> = node.methods().collect();
    if !methods.is_empty() {
        lines.push("### Methods\n".to_string());
        for method in methods {
            render_method(method, lines);
        }
    }
}

fn render_property(property: &PropertyNode, lines: &mut Vec<String>) {
    lines.push(format!("#### {} `property`\n", property.name));
    if let Some(ref detail) = property.detail {
        lines.push(format!("###### `{}`\n", property_signature(&property.name, detail)));
    }
    if !property.summary.is_empty() {
        lines.push(property.summary.clone());
        lines.push(String::new());
    }
}

/// `static Int32 Size { get; set; }`
fn property_signature(name: &str, detail: &PropertyDetail) -> String {
    let mut accessors = String::new();
    if detail.has_get {
        accessors.push_str("get; ");
    }
    if detail.has_set {
        accessors.push_str("set; ");
    }
    format!(
        "{}{} {} {{ {}}}",
        if detail.is_static { "static " } else { "" },
        detail.type_name,
        name,
        accessors
    )
}

fn render_method(method: &MethodNode, lines: &mut Vec<String>) {
    let label = if method.is_constructor {
        "constructor"
    } else {
        "method"
    };
    lines.push(format!("#### {} `{}`\n", method.name, label));

    if let Some(ref signature) = method.signature {
        lines.push("```c#".to_string());
        lines.push(signature.text.clone());
        lines.push("```\n".to_string());
    }

    let arguments = method.arguments();
    if !arguments.is_empty() {
        lines.push("| Parameter | Type | Default | Summary |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for arg in arguments {
            let default = match arg.default_value {
                Some(ref value) => format!("`{}`", escape_cell(value)),
                None => String::new(),
            };
            lines.push(format!(
                "| {} | `{}` | {} | {} |",
                arg.name,
                escape_cell(&arg.type_name),
                default,
                escape_cell(&arg.summary)
            ));
        }
        lines.push(String::new());
    }

    if let Some(return_type) = method.return_type() {
        lines.push(format!("###### Returns: `{}`\n", return_type));
        if let Some(ref summary) = method.returns_summary {
            lines.push(summary.clone());
            lines.push(String::new());
        }
    }

    if !method.summary.is_empty() {
        lines.push("###### Detail:\n".to_string());
        lines.push(method.summary.clone());
        lines.push(String::new());
    }

    lines.push("---\n".to_string());
}

/// Table cells are single-line and must not contain bare pipes.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}
