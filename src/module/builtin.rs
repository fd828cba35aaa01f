//! Framework types that are always resolvable without loading anything.

use super::{ModuleImage, TypeDefinition};

pub const CORE_MODULE: &str = "System.Private.CoreLib";
pub const VOID: &str = "System.Void";

/// Reference names that denote the framework itself.
const CORE_REFERENCES: &[&str] = &[
    CORE_MODULE,
    "mscorlib",
    "netstandard",
    "System.Runtime",
    "System.Collections",
    "System.Core",
    "System",
];

const CORE_TYPES: &[(&str, &[&str])] = &[
    (VOID, &[]),
    ("System.Object", &[]),
    ("System.Boolean", &["System.IComparable", "System.IConvertible"]),
    ("System.Byte", &["System.IComparable", "System.IConvertible"]),
    ("System.SByte", &["System.IComparable", "System.IConvertible"]),
    ("System.Char", &["System.IComparable", "System.IConvertible"]),
    ("System.Int16", &["System.IComparable", "System.IConvertible"]),
    ("System.UInt16", &["System.IComparable", "System.IConvertible"]),
    ("System.Int32", &["System.IComparable", "System.IConvertible"]),
    ("System.UInt32", &["System.IComparable", "System.IConvertible"]),
    ("System.Int64", &["System.IComparable", "System.IConvertible"]),
    ("System.UInt64", &["System.IComparable", "System.IConvertible"]),
    ("System.Single", &["System.IComparable", "System.IConvertible"]),
    ("System.Double", &["System.IComparable", "System.IConvertible"]),
    ("System.Decimal", &["System.IComparable", "System.IConvertible"]),
    ("System.IntPtr", &[]),
    ("System.UIntPtr", &[]),
    (
        "System.String",
        &[
            "System.IComparable",
            "System.Collections.Generic.IEnumerable`1",
        ],
    ),
    ("System.DateTime", &["System.IComparable"]),
    ("System.DateTimeOffset", &["System.IComparable"]),
    ("System.TimeSpan", &["System.IComparable"]),
    ("System.Guid", &["System.IComparable"]),
    ("System.Type", &[]),
    ("System.Exception", &[]),
    ("System.Uri", &[]),
    ("System.Array", &["System.Collections.IEnumerable"]),
    ("System.Delegate", &[]),
    ("System.Enum", &[]),
    ("System.Attribute", &[]),
    ("System.IDisposable", &[]),
    ("System.IComparable", &[]),
    ("System.IConvertible", &[]),
    ("System.Action", &[]),
    ("System.Action`1", &[]),
    ("System.Action`2", &[]),
    ("System.Func`1", &[]),
    ("System.Func`2", &[]),
    ("System.Func`3", &[]),
    ("System.Nullable`1", &[]),
    ("System.Collections.IEnumerable", &[]),
    (
        "System.Collections.Generic.IEnumerable`1",
        &["System.Collections.IEnumerable"],
    ),
    (
        "System.Collections.Generic.ICollection`1",
        &["System.Collections.Generic.IEnumerable`1"],
    ),
    (
        "System.Collections.Generic.IList`1",
        &["System.Collections.Generic.ICollection`1"],
    ),
    (
        "System.Collections.Generic.IDictionary`2",
        &["System.Collections.Generic.ICollection`1"],
    ),
    (
        "System.Collections.Generic.List`1",
        &["System.Collections.Generic.IList`1"],
    ),
    (
        "System.Collections.Generic.Dictionary`2",
        &["System.Collections.Generic.IDictionary`2"],
    ),
    (
        "System.Collections.Generic.HashSet`1",
        &["System.Collections.Generic.ICollection`1"],
    ),
    ("System.Threading.CancellationToken", &[]),
    ("System.Threading.Tasks.Task", &[]),
    ("System.Threading.Tasks.Task`1", &[]),
];

/// Namespaces owned by the framework. Types under them that no loaded
/// module declares are still identified by their full name.
const FRAMEWORK_NAMESPACES: &[&str] = &["System", "Microsoft"];

pub fn is_core_reference(name: &str) -> bool {
    CORE_REFERENCES.contains(&name)
}

pub fn is_framework_name(full_name: &str) -> bool {
    FRAMEWORK_NAMESPACES.iter().any(|ns| {
        full_name
            .strip_prefix(ns)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

pub fn core_module() -> ModuleImage {
    ModuleImage {
        name: CORE_MODULE.to_string(),
        references: Vec::new(),
        types: CORE_TYPES
            .iter()
            .map(|(name, interfaces)| TypeDefinition {
                full_name: name.to_string(),
                interfaces: interfaces.iter().map(|i| i.to_string()).collect(),
                ..Default::default()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_module_has_primitives() {
        let core = core_module();
        assert!(core.types.iter().any(|t| t.full_name == "System.Int32"));
        assert!(core.types.iter().any(|t| t.full_name == VOID));
    }

    #[test]
    fn framework_names() {
        assert!(is_framework_name("System.IO.Stream"));
        assert!(is_framework_name("Microsoft.Extensions.Logging.ILogger`1"));
        assert!(!is_framework_name("Systemic.Widget"));
        assert!(!is_framework_name("Acme.System.Widget"));
    }

    #[test]
    fn framework_references_are_core() {
        assert!(is_core_reference("mscorlib"));
        assert!(is_core_reference("netstandard"));
        assert!(!is_core_reference("Acme.Core"));
    }
}
