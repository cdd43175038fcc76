// Copyright 2025 The cildecode contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # cildecode
//!
//! Decoders for the two string/blob payload formats embedded in .NET
//! metadata: textual assembly-qualified type names, and the binary
//! serialized-value blobs attached to custom attribute and declarative
//! security rows. Both decode into structured, typed in-memory values that a
//! metadata reader can inspect and bind against its own type system.
//!
//! ## Features
//!
//! - **Type-name parsing** - The full reflection display-name grammar:
//!   nested types, generic instantiations with per-argument assembly
//!   qualifiers, array/pointer/by-ref modifiers, backslash escapes, and the
//!   assembly-identity sub-grammar (Version, Culture, PublicKeyToken,
//!   Retargetable)
//! - **Custom attribute decoding** - ECMA-335 II.23.3 blobs, driven by the
//!   resolved constructor's parameter types, fixed and named arguments
//! - **Security attribute decoding** - the binary 2.0 permission set format,
//!   including its three-step constructor lookup
//! - **Best-effort failure policy** - malformed names parse to `None`,
//!   damaged blobs decode to placeholder records; nothing here panics or
//!   aborts metadata loading
//! - **Host integration** - name binding, enum width policy and member
//!   lookup enter through the [`TypeResolver`] trait; identifier interning
//!   through an explicit [`NamePool`] capability
//!
//! ## Quick Start
//!
//! ```rust
//! use cildecode::prelude::*;
//!
//! let pool = NamePool::new();
//! let name = parse_type_name(
//!     "System.Collections.Generic.List`1[[System.Int32, mscorlib, \
//!      Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089]]",
//!     &pool,
//! )
//! .unwrap();
//!
//! let TypeName::Generic(generic) = &name else { panic!() };
//! assert_eq!(generic.template.generic_arity(), 1);
//! assert!(name.to_string().contains("PublicKeyToken=b77a5c561934e089"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! attribute row ──► decode_custom_attribute ──┐
//!                                             ├──► ValueReader ──► Expression
//! DeclSecurity row ─► decode_permission_set ──┘        │
//!                                                      ▼ (Type / Enum tags)
//!                    parse_type_name ◄───────── serialized type names
//!                          │
//!                          ▼
//!                 TypeResolver::bind_type_name (host)
//! ```
//!
//! The decoders own no resolution logic: everything nominal flows through
//! the host's [`TypeResolver`], which may legitimately answer "not loaded
//! yet" - decoding degrades gracefully instead of failing.
//!
//! ## Thread Safety
//!
//! All decoding is synchronous and operates on immutable byte regions.
//! Decoded records are immutable (`Send + Sync`); the only shared-mutable
//! surface is the [`NamePool`], which is concurrency-safe internally.
//!
//! ## References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom attribute encoding
//! - ECMA-335 6th Edition, Partition II, Section 22.11 - DeclSecurity table

#[macro_use]
pub(crate) mod error;

pub(crate) mod intern;
pub(crate) mod parser;
pub(crate) mod token;

pub mod attributes;
pub mod identity;
pub mod typename;
pub mod typesystem;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use cildecode::prelude::*;
///
/// let pool = NamePool::new();
/// assert!(parse_type_name("System.Int32", &pool).is_some());
/// ```
pub mod prelude;

/// The result type used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

/// Low-level byte cursor over attribute blobs.
///
/// See [`parser::Parser`] for bounds-checked primitive and compressed
/// integer reads.
pub use parser::{CilIO, Parser};

/// Identity-interned identifiers and their lookup-or-create pool.
pub use intern::{Name, NamePool};

/// Metadata row token carried on decoded attribute records.
pub use token::Token;

/// Assembly identity produced by the assembly-name sub-grammar.
pub use identity::{AssemblyIdentity, AssemblyVersion};

/// Type-name parsing entry points and the AST they produce.
pub use typename::{parse_assembly_identity, parse_type_name, TypeName};

/// The minimal type-reference model and the host resolution seam.
pub use typesystem::{
    CilFlavor, CilType, CilTypeRc, MemberRef, MemberRefRc, TypeResolver, WellKnownTypes,
};

/// Attribute decoding entry points and the records they produce.
pub use attributes::{
    decode_custom_attribute, decode_permission_set, Constant, ConstantValue, CustomAttribute,
    CustomAttributeList, CustomAttributeRc, DecodeContext, Expression, NamedArgument,
    PermissionFormat, SecurityAction, SecurityDeclaration, SecurityEntry, ValueReader,
};
