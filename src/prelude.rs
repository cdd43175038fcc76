//! Convenient re-exports of the most commonly used types and traits.
//!
//! This module provides a curated selection of the most frequently used
//! items from across the crate, allowing for convenient glob imports:
//!
//! ```rust
//! use cildecode::prelude::*;
//!
//! let pool = NamePool::new();
//! let name = parse_type_name("System.String[]", &pool).unwrap();
//! assert!(matches!(name, TypeName::Array(_)));
//! ```

pub use crate::{
    attributes::{
        decode_custom_attribute, decode_permission_set, Constant, ConstantValue, CustomAttribute,
        CustomAttributeList, CustomAttributeRc, DecodeContext, Expression, NamedArgument,
        PermissionFormat, SecurityAction, SecurityDeclaration, SecurityEntry, ValueReader,
    },
    identity::{AssemblyIdentity, AssemblyVersion},
    intern::{Name, NamePool},
    parser::Parser,
    token::Token,
    typename::{parse_assembly_identity, parse_type_name, TypeName},
    typesystem::{
        CilFlavor, CilType, CilTypeRc, MemberRef, MemberRefRc, TypeResolver, WellKnownTypes,
    },
    Error, Result,
};
