//! Builds the document tree from corpus entries and resolved metadata.
//!
//! Type entries must resolve; a missing type aborts the build. Members that
//! cannot be matched are kept with their comment text and no signature.

use crate::error::{DocError, Result};
use crate::model::*;
use crate::module::simple_name;
use crate::normalize::normalize;
use crate::parser::signature::CONSTRUCTOR;
use crate::resolve::{MemberDescriptor, MemberResolver, TypeResolver};

/// Assemble the tree for `module` from `entries` (corpus order).
pub fn assemble(
    module: &str,
    entries: &[CommentEntry],
    types: &mut TypeResolver<'_>,
) -> Result<Documentation> {
    let subject = types.subject();
    let mut nodes = Vec::new();

    for entry in entries.iter().filter(|e| e.kind == EntryKind::Type) {
        let descriptor =
            types
                .resolve(&entry.full_name, subject)
                .ok_or_else(|| DocError::TypeResolutionFailed {
                    full_name: entry.full_name.clone(),
                })?;

        let mut members = MemberResolver::new(types);
        let children = entries
            .iter()
            .filter(|e| e.kind != EntryKind::Type && e.owner_name == entry.full_name)
            .map(|child| match child.kind {
                EntryKind::Property => MemberNode::Property(property_node(child, &descriptor, &mut members)),
                _ => MemberNode::Method(method_node(child, &descriptor, &mut members)),
            })
            .collect();

        nodes.push(TypeNode {
            name: entry.simple_name.clone(),
            full_name: entry.full_name.clone(),
            owner_name: entry.owner_name.clone(),
            namespace: descriptor.namespace.clone(),
            interfaces: descriptor
                .interfaces
                .iter()
                .map(|i| simple_name(i).to_string())
                .collect(),
            summary: normalize(entry.summary.as_ref()),
            members: children,
            descriptor,
        });
    }

    Ok(Documentation {
        module: module.to_string(),
        index: build_index(entries),
        types: nodes,
    })
}

fn method_node(
    entry: &CommentEntry,
    owner: &crate::module::TypeDescriptor,
    members: &mut MemberResolver<'_, '_>,
) -> MethodNode {
    let is_constructor = entry.simple_name == CONSTRUCTOR;
    let name = if is_constructor {
        owner.name().to_string()
    } else {
        entry
            .simple_name
            .split("``")
            .next()
            .unwrap_or(&entry.simple_name)
            .to_string()
    };

    let signature = match members.resolve_returning(
        owner,
        &entry.simple_name,
        entry.raw_parameters(),
        entry.return_token.as_deref(),
    ) {
        Ok(descriptor) => Some(method_signature(entry, descriptor)),
        Err(e) => {
            tracing::warn!("{}: {}", entry.id, e);
            None
        }
    };

    MethodNode {
        name,
        owner_name: entry.owner_name.clone(),
        is_constructor,
        summary: normalize(entry.summary.as_ref()),
        returns_summary: entry
            .returns
            .as_ref()
            .map(|r| normalize(Some(r)))
            .filter(|r| !r.is_empty()),
        signature,
    }
}

fn method_signature(entry: &CommentEntry, descriptor: MemberDescriptor) -> MethodSignature {
    let arguments = descriptor
        .parameters
        .iter()
        .map(|p| ArgumentNode {
            name: p.name.clone(),
            type_name: p.type_name.clone(),
            required: !p.has_default,
            default_value: p.default_value.clone(),
            summary: normalize(entry.parameter_comments.get(&p.name)),
        })
        .collect();

    MethodSignature {
        text: descriptor.signature(),
        return_type: descriptor.return_type.clone(),
        is_static: descriptor.is_static,
        is_extension: descriptor.is_extension,
        arguments,
        descriptor,
    }
}

fn property_node(
    entry: &CommentEntry,
    owner: &crate::module::TypeDescriptor,
    members: &mut MemberResolver<'_, '_>,
) -> PropertyNode {
    let detail = match members.resolve_property(owner, &entry.simple_name) {
        Ok(descriptor) => Some(PropertyDetail {
            type_name: descriptor.type_name.clone(),
            has_get: descriptor.has_get,
            has_set: descriptor.has_set,
            is_static: descriptor.is_static,
            descriptor,
        }),
        Err(e) => {
            tracing::warn!("{}: {}", entry.id, e);
            None
        }
    };

    PropertyNode {
        name: entry.simple_name.clone(),
        owner_name: entry.owner_name.clone(),
        summary: normalize(entry.summary.as_ref()),
        detail,
    }
}

/// Group type entries by owner name, keeping first-seen order.
fn build_index(entries: &[CommentEntry]) -> Vec<IndexGroup> {
    let mut groups: Vec<IndexGroup> = Vec::new();
    for entry in entries.iter().filter(|e| e.kind == EntryKind::Type) {
        match groups.iter_mut().find(|g| g.key == entry.owner_name) {
            Some(group) => group.types.push(entry.simple_name.clone()),
            None => groups.push(IndexGroup {
                key: entry.owner_name.clone(),
                types: vec![entry.simple_name.clone()],
            }),
        }
    }
    groups
}
