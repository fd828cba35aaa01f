//! XML comment corpus reader.
//!
//! Every `<member name="...">` element anywhere in the document becomes one
//! [`CommentEntry`]. Members with unparseable identifiers are skipped.

use super::signature;
use crate::error::{DocError, Result};
use crate::model::{CommentEntry, CommentFragment, CommentNode, EntryKind};
use std::collections::HashMap;
use std::path::Path;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

/// Parsed corpus: entries in document order.
#[derive(Debug, Default)]
pub struct Corpus {
    /// `<assembly><name>` when present
    pub module_name: Option<String>,
    pub entries: Vec<CommentEntry>,
    /// Number of `<member>` elements skipped as malformed
    pub skipped: usize,
}

pub fn parse(xml: &str, path: &Path) -> Result<Corpus> {
    let package = parser::parse(xml).map_err(|e| DocError::CorpusUnreadable {
        path: path.to_path_buf(),
        message: format!("{:?}", e),
    })?;
    let document = package.as_document();

    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(e) => Some(e),
            _ => None,
        })
        .ok_or_else(|| DocError::CorpusUnreadable {
            path: path.to_path_buf(),
            message: "no root element".to_string(),
        })?;

    let mut corpus = Corpus {
        module_name: descendants(root, "assembly")
            .into_iter()
            .next()
            .and_then(|a| child_elements(a, "name").into_iter().next())
            .map(|n| text_content(n).trim().to_string())
            .filter(|n| !n.is_empty()),
        ..Default::default()
    };

    for member in descendants(root, "member") {
        match read_member(member) {
            Ok(entry) => corpus.entries.push(entry),
            Err(e) => {
                tracing::warn!("skipping entry: {}", e);
                corpus.skipped += 1;
            }
        }
    }
    Ok(corpus)
}

fn read_member(member: Element<'_>) -> Result<CommentEntry> {
    let id = member
        .attribute_value("name")
        .ok_or_else(|| DocError::MalformedEntry {
            id: String::new(),
            reason: "member without name attribute".to_string(),
        })?
        .to_string();
    let sig = signature::parse(&id)?;

    let summary = descendants(member, "summary")
        .into_iter()
        .next()
        .map(fragment);
    let returns = match sig.kind {
        EntryKind::Method => descendants(member, "returns").into_iter().next().map(fragment),
        _ => None,
    };

    let mut parameter_comments = HashMap::new();
    for param in descendants(member, "param") {
        if let Some(name) = param.attribute_value("name") {
            parameter_comments
                .entry(name.to_string())
                .or_insert_with(|| fragment(param));
        }
    }

    Ok(CommentEntry {
        id,
        kind: sig.kind,
        simple_name: sig.simple_name,
        owner_name: sig.owner_name,
        full_name: sig.full_name,
        raw_parameters: sig.parameters,
        return_token: sig.return_token,
        summary,
        parameter_comments,
        returns,
    })
}

/// Convert an element's mixed content into a [`CommentFragment`].
fn fragment(element: Element<'_>) -> CommentFragment {
    let mut nodes = Vec::new();
    collect_nodes(element, &mut nodes);
    CommentFragment { nodes }
}

fn collect_nodes(element: Element<'_>, nodes: &mut Vec<CommentNode>) {
    for child in element.children() {
        match child {
            ChildOfElement::Text(t) => nodes.push(CommentNode::Text(t.text().to_string())),
            ChildOfElement::Element(e) => match e.name().local_part() {
                "code" => nodes.push(CommentNode::Code(text_content(e))),
                "c" => nodes.push(CommentNode::Inline(text_content(e))),
                "see" | "seealso" => {
                    if let Some(cref) = e.attribute_value("cref") {
                        nodes.push(CommentNode::Inline(cref_display(cref)));
                    } else if let Some(word) = e.attribute_value("langword") {
                        nodes.push(CommentNode::Inline(word.to_string()));
                    } else {
                        collect_nodes(e, nodes);
                    }
                }
                "paramref" | "typeparamref" => {
                    if let Some(name) = e.attribute_value("name") {
                        nodes.push(CommentNode::Inline(name.to_string()));
                    }
                }
                "para" | "br" => {
                    nodes.push(CommentNode::Break);
                    collect_nodes(e, nodes);
                    nodes.push(CommentNode::Break);
                }
                _ => collect_nodes(e, nodes),
            },
            _ => {}
        }
    }
}

/// `T:Acme.Widget` → `Widget`, `M:Acme.Widget.Reset` → `Widget.Reset`.
fn cref_display(cref: &str) -> String {
    match signature::parse(cref) {
        Ok(sig) if sig.kind == EntryKind::Type => crate::module::simple_name(&sig.full_name).to_string(),
        Ok(sig) => {
            let owner = crate::module::simple_name(&sig.owner_name);
            if owner.is_empty() {
                sig.simple_name
            } else {
                format!("{}.{}", owner, sig.simple_name)
            }
        }
        Err(_) => cref
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(cref)
            .to_string(),
    }
}

fn text_content(element: Element<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child {
            ChildOfElement::Text(t) => out.push_str(t.text()),
            ChildOfElement::Element(e) => out.push_str(&text_content(e)),
            _ => {}
        }
    }
    out
}

fn child_elements<'d>(element: Element<'d>, name: &str) -> Vec<Element<'d>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(e) if e.name().local_part() == name => Some(e),
            _ => None,
        })
        .collect()
}

/// All descendant elements named `name`, in document order.
fn descendants<'d>(element: Element<'d>, name: &str) -> Vec<Element<'d>> {
    let mut found = Vec::new();
    for child in element.children() {
        if let ChildOfElement::Element(e) = child {
            if e.name().local_part() == name {
                found.push(e);
            }
            found.extend(descendants(e, name));
        }
    }
    found
}
