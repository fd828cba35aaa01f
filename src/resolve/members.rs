//! Member resolution: overload-aware lookup of methods, constructors and
//! properties on a resolved owner type.
//!
//! Overloads are told apart by parameter type identity. Every corpus token
//! and every declared parameter type is bound through the [`TypeResolver`]
//! in the owner's module context, and the bound forms are compared
//! positionally.

use super::types::{ResolvedType, TypeResolver, TypeToken};
use crate::error::{DocError, Result};
use crate::module::{
    builtin, simple_name, MethodDefinition, TypeDescriptor, Visibility, EXTENSION_ATTRIBUTE,
};
use crate::parser::signature::CONSTRUCTOR;

/// A concrete method or constructor. Constructors are named after the type.
#[derive(Debug, Clone, Default)]
pub struct MemberDescriptor {
    pub name: String,
    pub owner: TypeDescriptor,
    pub is_constructor: bool,
    /// Display return type; `None` for constructors and `void`
    pub return_type: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub visibility: Visibility,
    pub is_public: bool,
    pub is_private: bool,
    pub is_family: bool,
    pub is_assembly: bool,
    pub is_static: bool,
    pub generic_arity: usize,
    /// Declared with the extension-method marker
    pub is_extension: bool,
    /// Position in the owner's constructor or method table
    slot: usize,
}

impl PartialEq for MemberDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.is_constructor == other.is_constructor
            && self.slot == other.slot
    }
}

impl Eq for MemberDescriptor {}

#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Display type, e.g. `List<String>`
    pub type_name: String,
    pub type_token: TypeToken,
    pub has_default: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub name: String,
    pub owner: TypeDescriptor,
    pub type_name: String,
    pub has_get: bool,
    pub has_set: bool,
    pub is_static: bool,
}

impl MemberDescriptor {
    /// C#-style declaration line.
    pub fn signature(&self) -> String {
        let mut out = String::from(visibility_keyword(self.visibility));
        if self.is_static {
            out.push_str(" static");
        }
        if !self.is_constructor {
            out.push(' ');
            out.push_str(self.return_type.as_deref().unwrap_or("void"));
        }
        out.push(' ');
        out.push_str(&self.name);
        if self.generic_arity > 0 {
            let params: Vec<String> = (0..self.generic_arity)
                .map(|i| TypeToken::MethodParam(i).display())
                .collect();
            out.push_str(&format!("<{}>", params.join(", ")));
        }

        let params: Vec<String> = self
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut text = String::new();
                if i == 0 && self.is_extension {
                    text.push_str("this ");
                }
                text.push_str(&format!("{} {}", p.type_name, p.name));
                if let Some(ref default) = p.default_value {
                    text.push_str(&format!(" = {}", default));
                }
                text
            })
            .collect();
        out.push_str(&format!("({})", params.join(", ")));
        out
    }
}

fn visibility_keyword(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Private => "private",
        Visibility::Family => "protected",
        Visibility::Assembly => "internal",
        Visibility::FamilyOrAssembly => "protected internal",
        Visibility::FamilyAndAssembly => "private protected",
    }
}

/// Looks up members of owner types through a borrowed [`TypeResolver`].
pub struct MemberResolver<'r, 'l> {
    types: &'r mut TypeResolver<'l>,
}

impl<'r, 'l> MemberResolver<'r, 'l> {
    pub fn new(types: &'r mut TypeResolver<'l>) -> Self {
        MemberResolver { types }
    }

    /// Resolve a method (or `#ctor`) by name and raw parameter tokens.
    pub fn resolve(
        &mut self,
        owner: &TypeDescriptor,
        simple_name: &str,
        raw_parameters: &[String],
    ) -> Result<MemberDescriptor> {
        self.resolve_returning(owner, simple_name, raw_parameters, None)
    }

    /// Like [`resolve`](Self::resolve), also matching the return type when
    /// the corpus states one (conversion operators).
    pub fn resolve_returning(
        &mut self,
        owner: &TypeDescriptor,
        simple_name: &str,
        raw_parameters: &[String],
        return_token: Option<&str>,
    ) -> Result<MemberDescriptor> {
        let not_found = || DocError::MemberNotFound {
            owner: owner.full_name.clone(),
            member: simple_name.to_string(),
            parameters: raw_parameters.to_vec(),
        };

        let is_constructor = simple_name == CONSTRUCTOR;
        let (base_name, arity) = split_generic_arity(simple_name);

        let candidates: Vec<(usize, MethodDefinition)> = {
            let def = self
                .types
                .modules()
                .definition(owner)
                .ok_or_else(not_found)?;
            let table = if is_constructor {
                &def.constructors
            } else {
                &def.methods
            };
            table
                .iter()
                .enumerate()
                .filter(|(_, m)| {
                    is_constructor
                        || (m.name == base_name && arity.map_or(true, |n| m.generic_arity == n))
                })
                .map(|(i, m)| (i, m.clone()))
                .collect()
        };

        let wanted = self.bind_all(raw_parameters, owner).ok_or_else(not_found)?;
        let wanted_return = match return_token {
            Some(token) => Some(
                self.types
                    .resolve_token(&TypeToken::parse(token), owner.module)
                    .ok_or_else(not_found)?,
            ),
            None => None,
        };

        for (slot, candidate) in candidates {
            if candidate.parameters.len() != wanted.len() {
                continue;
            }
            let declared: Vec<String> = candidate
                .parameters
                .iter()
                .map(|p| p.type_name.clone())
                .collect();
            if self.bind_all(&declared, owner).as_ref() != Some(&wanted) {
                continue;
            }
            if let Some(ref expected) = wanted_return {
                let declared_return = self
                    .types
                    .resolve_token(&TypeToken::parse(&candidate.return_type), owner.module);
                if declared_return.as_ref() != Some(expected) {
                    continue;
                }
            }
            return Ok(describe(owner, slot, &candidate, is_constructor));
        }

        Err(not_found())
    }

    /// Resolve a property by name.
    pub fn resolve_property(
        &mut self,
        owner: &TypeDescriptor,
        name: &str,
    ) -> Result<PropertyDescriptor> {
        let def = self
            .types
            .modules()
            .definition(owner)
            .and_then(|def| def.properties.iter().find(|p| p.name == name))
            .ok_or_else(|| DocError::MemberNotFound {
                owner: owner.full_name.clone(),
                member: name.to_string(),
                parameters: Vec::new(),
            })?;

        Ok(PropertyDescriptor {
            name: def.name.clone(),
            owner: owner.clone(),
            type_name: TypeToken::parse(&def.type_name).display(),
            has_get: def.get,
            has_set: def.set,
            is_static: def.is_static,
        })
    }

    fn bind_all(&mut self, tokens: &[String], owner: &TypeDescriptor) -> Option<Vec<ResolvedType>> {
        tokens
            .iter()
            .map(|t| self.types.resolve_token(&TypeToken::parse(t), owner.module))
            .collect()
    }
}

/// `Map``1` → (`Map`, Some(1)).
fn split_generic_arity(name: &str) -> (&str, Option<usize>) {
    match name.split_once("``") {
        Some((base, arity)) => (base, arity.parse().ok()),
        None => (name, None),
    }
}

fn describe(
    owner: &TypeDescriptor,
    slot: usize,
    def: &MethodDefinition,
    is_constructor: bool,
) -> MemberDescriptor {
    let return_type = if is_constructor {
        None
    } else {
        let token = TypeToken::parse(&def.return_type);
        match token.definition_name() {
            Some(name) if name == builtin::VOID => None,
            _ => Some(token.display()),
        }
    };

    let parameters = def
        .parameters
        .iter()
        .map(|p| {
            let type_token = TypeToken::parse(&p.type_name);
            let has_default = p.optional || p.default.is_some();
            let default_value = match &p.default {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(value) => Some(value.to_string()),
                None if p.optional => Some("null".to_string()),
                None => None,
            };
            ParameterDescriptor {
                name: p.name.clone(),
                type_name: type_token.display(),
                type_token,
                has_default,
                default_value,
            }
        })
        .collect();

    MemberDescriptor {
        name: if is_constructor {
            simple_name(&owner.full_name).to_string()
        } else {
            def.name.clone()
        },
        owner: owner.clone(),
        is_constructor,
        return_type,
        parameters,
        visibility: def.visibility,
        is_public: def.visibility == Visibility::Public,
        is_private: def.visibility == Visibility::Private,
        is_family: def.visibility == Visibility::Family,
        is_assembly: def.visibility == Visibility::Assembly,
        is_static: def.is_static,
        generic_arity: def.generic_arity,
        is_extension: def.attributes.iter().any(|a| a == EXTENSION_ATTRIBUTE),
        slot,
    }
}
