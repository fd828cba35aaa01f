//! Binding corpus tokens to concrete descriptors.

pub mod members;
pub mod types;

pub use members::{MemberDescriptor, MemberResolver, ParameterDescriptor, PropertyDescriptor};
pub use types::{NearDependencies, ResolvedType, TypeHook, TypeResolver, TypeToken};
