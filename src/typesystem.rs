//! Minimal type-reference model shared between the decoders and their host.
//!
//! The decoders never resolve names themselves; they interrogate
//! [`CilType`] references handed to them - either as constructor parameter
//! types or as the result of binding a parsed [`crate::typename::TypeName`]
//! through the host's [`TypeResolver`]. A reference is just enough structure
//! to direct decoding: a display name plus a [`CilFlavor`] classifying how a
//! serialized value of that type is laid out.
//!
//! The full type-system object model (definitions, members, inheritance,
//! cross-assembly resolution) lives behind the [`TypeResolver`] trait. Hosts
//! with a real metadata universe implement it against their registries; tests
//! implement it with a handful of canned answers.

use std::sync::Arc;

use crate::{intern::Name, typename::TypeName};

/// A reference-counted pointer to a [`CilType`]
pub type CilTypeRc = Arc<CilType>;
/// A reference-counted pointer to a [`MemberRef`]
pub type MemberRefRc = Arc<MemberRef>;

/// Classification of a type reference for value decoding purposes.
///
/// The flavor determines the wire layout of a serialized value of the type:
/// primitives are fixed-width little-endian, strings and types are
/// length-prefixed, arrays carry a count prefix, enums borrow their
/// underlying integral width, and [`CilFlavor::Unresolved`] defers to the
/// host's width-guessing policy.
#[derive(Debug, Clone, PartialEq)]
pub enum CilFlavor {
    /// Void type (for completeness, rarely seen in attribute signatures)
    Void,
    /// Boolean value, one byte
    Boolean,
    /// 16-bit Unicode code unit
    Char,
    /// Signed 8-bit integer
    I1,
    /// Unsigned 8-bit integer
    U1,
    /// Signed 16-bit integer
    I2,
    /// Unsigned 16-bit integer
    U2,
    /// Signed 32-bit integer
    I4,
    /// Unsigned 32-bit integer
    U4,
    /// Signed 64-bit integer
    I8,
    /// Unsigned 64-bit integer
    U8,
    /// 32-bit floating point
    R4,
    /// 64-bit floating point
    R8,
    /// Native signed integer (platform-dependent size)
    I,
    /// Native unsigned integer (platform-dependent size)
    U,
    /// System.String
    String,
    /// System.Object - serialized values carry their concrete type inline
    Object,
    /// System.Type - serialized as an assembly-qualified type name string
    SystemType,
    /// Single-dimension, zero-lower-bound array
    SzArray {
        /// Element type of the array
        element: CilTypeRc,
    },
    /// An enum type. `underlying_size` is the byte width of its underlying
    /// integral type when the definition is loaded, `None` when it is not.
    Enum {
        /// Byte width of the underlying integral type (1, 2, 4 or 8)
        underlying_size: Option<usize>,
    },
    /// A reference that does not (yet) resolve to any loaded definition.
    Unresolved,
}

impl CilFlavor {
    /// Check if this flavor is a fixed-width primitive.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            CilFlavor::Boolean
                | CilFlavor::Char
                | CilFlavor::I1
                | CilFlavor::U1
                | CilFlavor::I2
                | CilFlavor::U2
                | CilFlavor::I4
                | CilFlavor::U4
                | CilFlavor::I8
                | CilFlavor::U8
                | CilFlavor::R4
                | CilFlavor::R8
                | CilFlavor::I
                | CilFlavor::U
        )
    }
}

/// A type reference: a display name plus a decoding classification.
///
/// Instances are immutable and shared via [`CilTypeRc`]. The decoders create
/// them for well-known and array types; everything nominal comes from the
/// host's [`TypeResolver::bind_type_name`].
#[derive(Debug, Clone, PartialEq)]
pub struct CilType {
    /// Full display name of the type (e.g. "System.Int32")
    pub name: String,
    /// Decoding classification
    pub flavor: CilFlavor,
}

impl CilType {
    /// Create a new type reference.
    #[must_use]
    pub fn new(name: impl Into<String>, flavor: CilFlavor) -> CilTypeRc {
        Arc::new(CilType {
            name: name.into(),
            flavor,
        })
    }

    /// Create an unresolved reference carrying only a name.
    #[must_use]
    pub fn unresolved(name: impl Into<String>) -> CilTypeRc {
        Self::new(name, CilFlavor::Unresolved)
    }

    /// Create an enum-flavored reference with an unknown underlying width.
    #[must_use]
    pub fn unresolved_enum(name: impl Into<String>) -> CilTypeRc {
        Self::new(
            name,
            CilFlavor::Enum {
                underlying_size: None,
            },
        )
    }

    /// Returns `true` for enum-flavored references.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self.flavor, CilFlavor::Enum { .. })
    }
}

/// Pre-built references for the types with a fixed serialized layout.
///
/// One instance per decode context; the contained `Arc`s are cloned into
/// every expression that mentions a well-known type, so repeated decoding
/// does not re-allocate names.
pub struct WellKnownTypes {
    void: CilTypeRc,
    boolean: CilTypeRc,
    char_type: CilTypeRc,
    sbyte: CilTypeRc,
    byte: CilTypeRc,
    int16: CilTypeRc,
    uint16: CilTypeRc,
    int32: CilTypeRc,
    uint32: CilTypeRc,
    int64: CilTypeRc,
    uint64: CilTypeRc,
    single: CilTypeRc,
    double: CilTypeRc,
    intptr: CilTypeRc,
    uintptr: CilTypeRc,
    string: CilTypeRc,
    object: CilTypeRc,
    system_type: CilTypeRc,
}

impl WellKnownTypes {
    /// Build the table.
    #[must_use]
    pub fn new() -> Self {
        WellKnownTypes {
            void: CilType::new("System.Void", CilFlavor::Void),
            boolean: CilType::new("System.Boolean", CilFlavor::Boolean),
            char_type: CilType::new("System.Char", CilFlavor::Char),
            sbyte: CilType::new("System.SByte", CilFlavor::I1),
            byte: CilType::new("System.Byte", CilFlavor::U1),
            int16: CilType::new("System.Int16", CilFlavor::I2),
            uint16: CilType::new("System.UInt16", CilFlavor::U2),
            int32: CilType::new("System.Int32", CilFlavor::I4),
            uint32: CilType::new("System.UInt32", CilFlavor::U4),
            int64: CilType::new("System.Int64", CilFlavor::I8),
            uint64: CilType::new("System.UInt64", CilFlavor::U8),
            single: CilType::new("System.Single", CilFlavor::R4),
            double: CilType::new("System.Double", CilFlavor::R8),
            intptr: CilType::new("System.IntPtr", CilFlavor::I),
            uintptr: CilType::new("System.UIntPtr", CilFlavor::U),
            string: CilType::new("System.String", CilFlavor::String),
            object: CilType::new("System.Object", CilFlavor::Object),
            system_type: CilType::new("System.Type", CilFlavor::SystemType),
        }
    }

    /// The reference for a primitive flavor, `None` for non-primitives.
    #[must_use]
    pub fn primitive(&self, flavor: &CilFlavor) -> Option<CilTypeRc> {
        let ty = match flavor {
            CilFlavor::Void => &self.void,
            CilFlavor::Boolean => &self.boolean,
            CilFlavor::Char => &self.char_type,
            CilFlavor::I1 => &self.sbyte,
            CilFlavor::U1 => &self.byte,
            CilFlavor::I2 => &self.int16,
            CilFlavor::U2 => &self.uint16,
            CilFlavor::I4 => &self.int32,
            CilFlavor::U4 => &self.uint32,
            CilFlavor::I8 => &self.int64,
            CilFlavor::U8 => &self.uint64,
            CilFlavor::R4 => &self.single,
            CilFlavor::R8 => &self.double,
            CilFlavor::I => &self.intptr,
            CilFlavor::U => &self.uintptr,
            _ => return None,
        };
        Some(ty.clone())
    }

    /// System.String
    #[must_use]
    pub fn string(&self) -> CilTypeRc {
        self.string.clone()
    }

    /// System.Object
    #[must_use]
    pub fn object(&self) -> CilTypeRc {
        self.object.clone()
    }

    /// System.Type
    #[must_use]
    pub fn system_type(&self) -> CilTypeRc {
        self.system_type.clone()
    }

    /// System.Int32
    #[must_use]
    pub fn int32(&self) -> CilTypeRc {
        self.int32.clone()
    }

    /// A single-dimension array of `element`.
    #[must_use]
    pub fn sz_array(&self, element: CilTypeRc) -> CilTypeRc {
        CilType::new(
            format!("{}[]", element.name),
            CilFlavor::SzArray { element },
        )
    }
}

impl Default for WellKnownTypes {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference to a member (constructor, field or property) of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    /// Member name (".ctor" for constructors)
    pub name: Name,
    /// The type owning the member
    pub owner: CilTypeRc,
    /// Ordered parameter types, for constructor-shaped members
    pub params: Vec<CilTypeRc>,
    /// `true` when the reference was synthesized by the decoder because no
    /// real member could be found
    pub synthesized: bool,
}

impl MemberRef {
    /// Create a member reference.
    #[must_use]
    pub fn new(name: Name, owner: CilTypeRc, params: Vec<CilTypeRc>) -> MemberRefRc {
        Arc::new(MemberRef {
            name,
            owner,
            params,
            synthesized: false,
        })
    }
}

/// Host-supplied resolution services consumed by the decoders.
///
/// Implementations must be safe to call with names that do not (yet) resolve
/// to a loaded definition: [`TypeResolver::bind_type_name`] never fails, it
/// returns an [`CilFlavor::Unresolved`] (or unknown-width enum) reference
/// instead. Any interning caches behind an implementation must make their
/// own lookup-or-create operations thread-safe.
pub trait TypeResolver {
    /// Bind a parsed type name to a concrete, possibly-unresolved reference
    /// against the resolver's owning module/assembly context.
    fn bind_type_name(&self, name: &TypeName) -> CilTypeRc;

    /// Guess the underlying integral width (1, 2, 4 or 8 bytes) of an
    /// unresolvable enum reference found inside a serialized value. `None`
    /// means no guess is possible and decoding of that value cannot succeed
    /// under any assumption.
    fn guess_enum_underlying_size(&self, unresolved: &CilTypeRc) -> Option<usize> {
        let _ = unresolved;
        None
    }

    /// Search a resolved type definition for an instance constructor with
    /// exactly one parameter. Returns `None` when the type has no loaded
    /// definition or no such constructor.
    fn find_instance_constructor(&self, ty: &CilTypeRc) -> Option<MemberRefRc> {
        let _ = ty;
        None
    }

    /// Search the module's member-reference table for a constructor-shaped
    /// reference whose owning type matches `ty` by identity.
    fn find_constructor_reference(&self, ty: &CilTypeRc) -> Option<MemberRefRc> {
        let _ = ty;
        None
    }

    /// The well-known permission base type used as the owner of synthesized
    /// placeholder constructors when neither lookup succeeds.
    fn fallback_permission_type(&self) -> CilTypeRc {
        CilType::unresolved(crate::attributes::FALLBACK_PERMISSION_BASE)
    }

    /// Find the field or property `name` on `ty`, for named-argument
    /// resolution.
    fn find_member(&self, ty: &CilTypeRc, name: &Name) -> Option<MemberRefRc> {
        let _ = (ty, name);
        None
    }
}
