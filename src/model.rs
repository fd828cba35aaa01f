//! Parsed corpus entries and the assembled document tree.

use crate::module::TypeDescriptor;
use crate::resolve::{MemberDescriptor, PropertyDescriptor};
use serde::Serialize;
use std::collections::HashMap;

/// Entity kind carried by the one-letter tag of a corpus identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// `T:`
    Type,
    /// `M:` (methods and `#ctor` constructors)
    Method,
    /// `P:`
    Property,
}

/// One parsed `<member>` of the comment corpus. Read-only once built.
#[derive(Debug, Clone)]
pub struct CommentEntry {
    /// Raw identifier, e.g. `M:Acme.Widget.Resize(System.Int32)`
    pub id: String,
    pub kind: EntryKind,
    /// Last dot-delimited segment of `full_name`
    pub simple_name: String,
    /// `full_name` without the trailing `.simple_name`
    pub owner_name: String,
    pub full_name: String,
    /// Unresolved parameter type tokens, `Some` only for methods
    pub raw_parameters: Option<Vec<String>>,
    /// Declared return after `~` (conversion operators only)
    pub return_token: Option<String>,
    pub summary: Option<CommentFragment>,
    /// `<param name="...">` text keyed by parameter name
    pub parameter_comments: HashMap<String, CommentFragment>,
    pub returns: Option<CommentFragment>,
}

impl CommentEntry {
    pub fn raw_parameters(&self) -> &[String] {
        self.raw_parameters.as_deref().unwrap_or(&[])
    }
}

/// A structured comment body: free text runs interleaved with markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFragment {
    pub nodes: Vec<CommentNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentNode {
    /// Plain text run, whitespace untouched
    Text(String),
    /// `<code>` block
    Code(String),
    /// `<c>`, `<see cref>`, `<paramref>` and friends, rendered as inline code
    Inline(String),
    /// `<para>` boundary
    Break,
}

// -- Document tree ------------------------------------------------------------

/// Complete, renderable documentation for one module.
#[derive(Debug, Serialize)]
pub struct Documentation {
    pub module: String,
    pub index: Vec<IndexGroup>,
    pub types: Vec<TypeNode>,
}

/// Navigation bucket: types sharing an owner name, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexGroup {
    pub key: String,
    pub types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TypeNode {
    pub name: String,
    pub full_name: String,
    pub owner_name: String,
    pub namespace: String,
    /// Simple names of the declared interfaces
    pub interfaces: Vec<String>,
    pub summary: String,
    /// Children in corpus order; every child's owner name is `full_name`
    pub members: Vec<MemberNode>,
    #[serde(skip)]
    pub descriptor: TypeDescriptor,
}

impl TypeNode {
    pub fn methods(&self) -> impl Iterator<Item = &MethodNode> {
        self.members.iter().filter_map(|m| match m {
            MemberNode::Method(method) => Some(method),
            MemberNode::Property(_) => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyNode> {
        self.members.iter().filter_map(|m| match m {
            MemberNode::Property(property) => Some(property),
            MemberNode::Method(_) => None,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemberNode {
    Method(MethodNode),
    Property(PropertyNode),
}

impl MemberNode {
    pub fn name(&self) -> &str {
        match self {
            MemberNode::Method(m) => &m.name,
            MemberNode::Property(p) => &p.name,
        }
    }

    pub fn owner_name(&self) -> &str {
        match self {
            MemberNode::Method(m) => &m.owner_name,
            MemberNode::Property(p) => &p.owner_name,
        }
    }
}

/// A method or constructor. `signature` is `None` when the corpus entry
/// could not be matched against the module (degraded node).
#[derive(Debug, Serialize)]
pub struct MethodNode {
    pub name: String,
    pub owner_name: String,
    pub is_constructor: bool,
    pub summary: String,
    pub returns_summary: Option<String>,
    pub signature: Option<MethodSignature>,
}

impl MethodNode {
    pub fn arguments(&self) -> &[ArgumentNode] {
        self.signature
            .as_ref()
            .map(|s| s.arguments.as_slice())
            .unwrap_or(&[])
    }

    /// Display return type; empty for constructors, `void` and degraded nodes.
    pub fn return_type(&self) -> Option<&str> {
        self.signature.as_ref().and_then(|s| s.return_type.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct MethodSignature {
    /// e.g. `public static Int32 Add(this Int32 a, Int32 b = 0)`
    pub text: String,
    pub return_type: Option<String>,
    pub is_static: bool,
    pub is_extension: bool,
    pub arguments: Vec<ArgumentNode>,
    #[serde(skip)]
    pub descriptor: MemberDescriptor,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgumentNode {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct PropertyNode {
    pub name: String,
    pub owner_name: String,
    pub summary: String,
    pub detail: Option<PropertyDetail>,
}

#[derive(Debug, Serialize)]
pub struct PropertyDetail {
    pub type_name: String,
    pub has_get: bool,
    pub has_set: bool,
    pub is_static: bool,
    #[serde(skip)]
    pub descriptor: PropertyDescriptor,
}
