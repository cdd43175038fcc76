//! Custom and security attribute blob decoding.
//!
//! Attribute rows store their arguments as binary "serialized value" blobs.
//! This module decodes both encodings into the typed [`Expression`] model:
//!
//! - **Custom attributes** (ECMA-335 II.23.3): a prolog, the constructor's
//!   fixed arguments decoded against its declared parameter types, then a
//!   counted list of named field/property assignments.
//! - **Security attributes** (the binary 2.0 permission set format): a
//!   counted list of permission entries, each naming its own attribute type
//!   and carrying named arguments only.
//!
//! Both decoders drive the shared [`ValueReader`], which recovers from blob
//! damage in place (sticky failure flags, zero-valued placeholders) instead
//! of propagating errors. When a serialized value embeds a textual type name
//! - a typeof argument, an enum payload, a permission class - the reader
//! calls back into [`crate::typename`] and binds the parsed name through the
//! host's [`crate::typesystem::TypeResolver`].
//!
//! # Failure policy
//!
//! Decoding always returns a well-typed result. A structurally damaged
//! custom attribute becomes an empty placeholder record (never a partial
//! one); a damaged security declaration loses its whole entry list, since
//! the format models one atomic permission set. One bad attribute never
//! blocks the rest of metadata loading.
//!
//! # Thread Safety
//!
//! Decoding is synchronous and shares no mutable state; concurrent decode
//! calls for different rows are independent as long as each has its own
//! reader. The decoded records are immutable and `Send + Sync`.

mod custom;
mod reader;
mod security;
mod types;

pub use custom::decode_custom_attribute;
pub use reader::{DecodeContext, ValueReader};
pub use security::{
    decode_permission_set, permission_classes, PermissionFormat, SecurityAction,
    SecurityDeclaration, SecurityEntry, SecurityPermissionFlags, FALLBACK_PERMISSION_BASE,
    PERMISSION_SET_BINARY_MARKER, PERMISSION_SET_XML_MARKER,
};
pub use types::*;
