//! Parsing of textual assembly-qualified type names.
//!
//! Metadata stores type references in two shapes: structured table rows, and
//! plain strings in the reflection display format (`Type.GetType` names).
//! The string form shows up inside serialized attribute values - `typeof(...)`
//! arguments and enum type names carry it - and this module turns it into a
//! structured [`TypeName`] AST.
//!
//! # Grammar
//!
//! ```text
//! FullName        := Type [ ',' AssemblyName ]
//! Type            := Nominal [ '[' GenericArgs ']' ] { '*' | '[' Rank ']' } [ '&' ]
//! Nominal         := Identifier ('.' Identifier)* ('+' Identifier)*
//! GenericArgs     := GenericArg (',' GenericArg)*
//! GenericArg      := '[' FullName ']' | Type
//! Rank            := '' | '*' | ','+
//! AssemblyName    := Identifier { ',' Key '=' Value }
//! ```
//!
//! A backslash escapes the following character inside any identifier. The
//! grammar is LL(1) except for one spot: a `[` after a nominal name opens
//! either a generic-argument list or an array-rank specifier, decided by
//! taking a scanner snapshot, peeking one token past the bracket, and
//! rewinding when the bracket turns out to be an array.
//!
//! # Failure policy
//!
//! [`parse_type_name`] returns `None` for anything other than a well-formed
//! name spanning the whole input. Malformed names are an expected input class
//! (hand-crafted and obfuscated assemblies routinely carry them), so they are
//! not an error condition; the caller decides whether an unparseable name is
//! worth reporting.
//!
//! # Examples
//!
//! ```rust
//! use cildecode::{parse_type_name, NamePool, TypeName};
//!
//! let pool = NamePool::new();
//! let name = parse_type_name("System.Collections.Generic.List`1[System.Int32][]", &pool).unwrap();
//!
//! let TypeName::Array(array) = &name else { panic!() };
//! assert_eq!(array.rank, 0); // vector
//! ```

mod ast;
mod parser;
mod scanner;

pub use ast::{ArrayName, GenericName, NamespaceName, NestedName, QualifiedName, TypeName};
pub use parser::{parse_assembly_identity, parse_type_name};
pub use scanner::{ScanMode, Scanner, Snapshot, Token, TokenKind};

use std::fmt::{self, Write as _};

/// Write `s` with every grammar delimiter backslash-escaped, so the output
/// scans back to a single identifier token.
pub(crate) fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        if matches!(c, '\\' | '[' | ']' | ',' | '+' | '*' | '&' | '=' | '.') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}
