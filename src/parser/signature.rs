//! Corpus identifier parser.
//!
//! Identifiers look like `T:Acme.Widget`, `P:Acme.Widget.Size` or
//! `M:Acme.Widget.#ctor(System.Int32,System.Collections.Generic.List{System.String})`.
//! Conversion operators carry their return type after a `~`.

use crate::error::{DocError, Result};
use crate::model::EntryKind;
use regex::Regex;
use std::sync::LazyLock;

static RE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^:\s]+):([^()~]+?)\s*(?:\((.*)\))?\s*(?:~(.+?))?\s*$").unwrap()
});

/// Name used by the corpus for instance constructors.
pub const CONSTRUCTOR: &str = "#ctor";

/// A parsed identifier. Parameter tokens are left unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub kind: EntryKind,
    pub full_name: String,
    pub simple_name: String,
    pub owner_name: String,
    /// `Some` only for methods, empty when the method takes no parameters
    pub parameters: Option<Vec<String>>,
    /// Return type after `~` (conversion operators)
    pub return_token: Option<String>,
}

impl Signature {
    pub fn is_constructor(&self) -> bool {
        self.kind == EntryKind::Method && self.simple_name == CONSTRUCTOR
    }
}

/// Parse one identifier string.
pub fn parse(id: &str) -> Result<Signature> {
    let malformed = |reason: &str| DocError::MalformedEntry {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let caps = RE_IDENTIFIER
        .captures(id)
        .ok_or_else(|| malformed("missing kind tag"))?;

    let kind = match &caps[1] {
        "T" => EntryKind::Type,
        "M" => EntryKind::Method,
        "P" => EntryKind::Property,
        other => return Err(malformed(&format!("unrecognized kind tag '{other}'"))),
    };

    let full_name = caps[2].trim().to_string();
    if full_name.is_empty() || full_name.ends_with('.') {
        return Err(malformed("empty name"));
    }

    let simple_name = full_name
        .rsplit('.')
        .next()
        .unwrap_or(&full_name)
        .to_string();
    let owner_name = full_name
        .strip_suffix(&simple_name)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or("")
        .to_string();

    let parameters = match kind {
        EntryKind::Method => Some(
            caps.get(3)
                .map(|m| split_parameters(m.as_str()))
                .unwrap_or_default(),
        ),
        _ => None,
    };

    Ok(Signature {
        kind,
        full_name,
        simple_name,
        owner_name,
        parameters,
        return_token: caps.get(4).map(|m| m.as_str().trim().to_string()),
    })
}

/// Split a parameter list on commas that are not nested inside `{}` or `[]`.
pub fn split_parameters(list: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in list.chars() {
        match c {
            '{' | '[' => {
                depth += 1;
                current.push(c);
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                push_token(&mut tokens, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_token(&mut tokens, &current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, raw: &str) {
    let token = raw.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_entry() {
        let sig = parse("T:Acme.Widgets.Widget").unwrap();
        assert_eq!(sig.kind, EntryKind::Type);
        assert_eq!(sig.simple_name, "Widget");
        assert_eq!(sig.owner_name, "Acme.Widgets");
        assert_eq!(sig.parameters, None);
    }

    #[test]
    fn type_without_namespace_has_empty_owner() {
        let sig = parse("T:Widget").unwrap();
        assert_eq!(sig.simple_name, "Widget");
        assert_eq!(sig.owner_name, "");
    }

    #[test]
    fn owner_strips_only_the_suffix() {
        let sig = parse("M:Acme.Reset.Reset").unwrap();
        assert_eq!(sig.owner_name, "Acme.Reset");
        assert_eq!(sig.simple_name, "Reset");
    }

    #[test]
    fn method_without_parameters() {
        let sig = parse("M:Acme.Widget.Reset").unwrap();
        assert_eq!(sig.kind, EntryKind::Method);
        assert_eq!(sig.parameters, Some(vec![]));
    }

    #[test]
    fn method_with_parameters() {
        let sig = parse("M:Acme.Widget.Resize(System.Int32,System.String)").unwrap();
        assert_eq!(sig.simple_name, "Resize");
        assert_eq!(sig.owner_name, "Acme.Widget");
        assert_eq!(
            sig.parameters,
            Some(vec!["System.Int32".to_string(), "System.String".to_string()])
        );
    }

    #[test]
    fn constructor_name_is_preserved() {
        let sig = parse("M:Acme.Widget.#ctor(System.Int32)").unwrap();
        assert_eq!(sig.simple_name, CONSTRUCTOR);
        assert!(sig.is_constructor());
        assert_eq!(sig.owner_name, "Acme.Widget");
    }

    #[test]
    fn generic_parameters_stay_whole() {
        let sig = parse(
            "M:Acme.Cache.Fill(System.Collections.Generic.Dictionary{System.String,System.Int32},System.Int32[0:,0:])",
        )
        .unwrap();
        assert_eq!(
            sig.parameters,
            Some(vec![
                "System.Collections.Generic.Dictionary{System.String,System.Int32}".to_string(),
                "System.Int32[0:,0:]".to_string(),
            ])
        );
    }

    #[test]
    fn conversion_operator_return() {
        let sig = parse("M:Acme.Money.op_Implicit(Acme.Money)~System.Decimal").unwrap();
        assert_eq!(sig.simple_name, "op_Implicit");
        assert_eq!(sig.return_token.as_deref(), Some("System.Decimal"));
    }

    #[test]
    fn property_ignores_indexer_parameters() {
        let sig = parse("P:Acme.Grid.Item(System.Int32)").unwrap();
        assert_eq!(sig.kind, EntryKind::Property);
        assert_eq!(sig.simple_name, "Item");
        assert_eq!(sig.parameters, None);
    }

    #[test]
    fn missing_tag_is_malformed() {
        let err = parse("Acme.Widget").unwrap_err();
        assert!(matches!(err, DocError::MalformedEntry { .. }));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let err = parse("F:Acme.Widget.count").unwrap_err();
        match err {
            DocError::MalformedEntry { reason, .. } => assert!(reason.contains("'F'")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
