//! The type-name AST.
//!
//! A parsed type name is a closed tree of [`TypeName`] nodes. The hierarchy
//! is fixed by the reflection name format, so consumers match on it
//! exhaustively instead of going through a visitor.
//!
//! Generic arity is derived once, at node construction, by splitting the
//! back-tick-encoded digit suffix off the raw name: "List\`1" stores
//! raw_name "List\`1", unmangled name "List" and arity 1. The unmangled name
//! is what definition lookups use; the raw name exists for display and
//! round-tripping.

use std::fmt::{self, Write as _};

use crate::{
    identity::AssemblyIdentity,
    intern::{Name, NamePool},
    typename::write_escaped,
};

/// A structured type name.
///
/// `ByRef` never wraps another `ByRef` and only ever appears as the outermost
/// modifier; the grammar enforces both.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    /// A namespace-qualified top-level name
    Namespace(NamespaceName),
    /// A type nested inside another type (`Outer+Inner`)
    Nested(NestedName),
    /// A generic instantiation ("List\`1[T]")
    Generic(GenericName),
    /// An array type; rank 0 is the single-dimension zero-lower-bound vector
    Array(ArrayName),
    /// An unmanaged pointer (`T*`)
    Pointer(Box<TypeName>),
    /// A managed pointer (`T&`)
    ByRef(Box<TypeName>),
    /// A name carrying its own assembly qualifier
    Qualified(QualifiedName),
}

impl TypeName {
    /// Strip an assembly qualifier, if any.
    #[must_use]
    pub fn unqualified(&self) -> &TypeName {
        match self {
            TypeName::Qualified(qualified) => &qualified.inner,
            other => other,
        }
    }

    /// The declared generic arity of a nominal name, zero elsewhere.
    #[must_use]
    pub fn generic_arity(&self) -> u32 {
        match self {
            TypeName::Namespace(name) => name.arity,
            TypeName::Nested(name) => name.arity,
            _ => 0,
        }
    }
}

/// A top-level name: dotted namespace path plus the final segment.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceName {
    /// Namespace segments, outermost first; empty for global types
    pub namespace: Vec<Name>,
    /// The final segment as written, back-tick suffix included
    pub raw_name: Name,
    /// The final segment with any arity suffix removed
    pub name: Name,
    /// Generic arity encoded in the suffix, zero when absent
    pub arity: u32,
}

impl NamespaceName {
    /// Build a node, splitting the arity suffix off `raw`.
    #[must_use]
    pub fn new(pool: &NamePool, namespace: Vec<Name>, raw: &str) -> Self {
        let (unmangled, arity) = split_generic_arity(raw);
        NamespaceName {
            namespace,
            raw_name: pool.get_or_intern(raw),
            name: pool.get_or_intern(unmangled),
            arity,
        }
    }
}

/// A nested name: the containing type plus one more segment.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedName {
    /// The containing type (a `Namespace` or another `Nested` node)
    pub containing: Box<TypeName>,
    /// The nested segment as written
    pub raw_name: Name,
    /// The nested segment with any arity suffix removed
    pub name: Name,
    /// Generic arity encoded in the suffix, zero when absent
    pub arity: u32,
}

impl NestedName {
    /// Build a node, splitting the arity suffix off `raw`.
    #[must_use]
    pub fn new(pool: &NamePool, containing: TypeName, raw: &str) -> Self {
        let (unmangled, arity) = split_generic_arity(raw);
        NestedName {
            containing: Box::new(containing),
            raw_name: pool.get_or_intern(raw),
            name: pool.get_or_intern(unmangled),
            arity,
        }
    }
}

/// A generic instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericName {
    /// The template (a `Namespace` or `Nested` node)
    pub template: Box<TypeName>,
    /// Ordered type arguments
    pub args: Vec<TypeName>,
}

/// An array type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayName {
    /// Element type
    pub element: Box<TypeName>,
    /// 0 = vector, 1 = general array of rank 1 (`[*]`), n = rank n
    pub rank: u32,
}

/// A name with an assembly qualifier.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    /// The qualified type
    pub inner: Box<TypeName>,
    /// Identity of the assembly the name is scoped to; carries the
    /// retargetable flag
    pub identity: AssemblyIdentity,
}

/// Split a trailing `` `n `` arity suffix off a raw name.
///
/// The suffix must be a backtick followed by one or more decimal digits;
/// anything else leaves the name untouched with arity zero.
fn split_generic_arity(raw: &str) -> (&str, u32) {
    let Some(tick) = raw.rfind('`') else {
        return (raw, 0);
    };

    let digits = &raw[tick + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (raw, 0);
    }

    match digits.parse::<u32>() {
        Ok(arity) => (&raw[..tick], arity),
        Err(_) => (raw, 0),
    }
}

impl fmt::Display for TypeName {
    /// Render the name back into grammar form. Delimiters inside identifiers
    /// are re-escaped and assembly-qualified generic arguments are
    /// double-bracketed, so the output re-parses to a structurally equal
    /// tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Namespace(name) => {
                for segment in &name.namespace {
                    write_escaped(f, segment.as_str())?;
                    f.write_char('.')?;
                }
                write_escaped(f, name.raw_name.as_str())
            }
            TypeName::Nested(name) => {
                write!(f, "{}", name.containing)?;
                f.write_char('+')?;
                write_escaped(f, name.raw_name.as_str())
            }
            TypeName::Generic(generic) => {
                write!(f, "{}", generic.template)?;
                f.write_char('[')?;
                for (i, arg) in generic.args.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    if matches!(arg, TypeName::Qualified(_)) {
                        write!(f, "[{arg}]")?;
                    } else {
                        write!(f, "{arg}")?;
                    }
                }
                f.write_char(']')
            }
            TypeName::Array(array) => {
                write!(f, "{}", array.element)?;
                match array.rank {
                    0 => f.write_str("[]"),
                    1 => f.write_str("[*]"),
                    rank => {
                        f.write_char('[')?;
                        for _ in 1..rank {
                            f.write_char(',')?;
                        }
                        f.write_char(']')
                    }
                }
            }
            TypeName::Pointer(target) => write!(f, "{target}*"),
            TypeName::ByRef(target) => write!(f, "{target}&"),
            TypeName::Qualified(qualified) => {
                write!(f, "{}, {}", qualified.inner, qualified.identity)
            }
        }
    }
}
