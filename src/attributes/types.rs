//! Expression and record types produced by attribute decoding.
//!
//! Everything here is created once, at decode time, from an immutable byte
//! region and never mutated afterwards. The single exception is the memoized
//! resolved-member lookup on [`NamedArgument`], which is computed lazily on
//! first access and cached; recomputing would yield the same answer, so the
//! cell needs no invalidation.

use std::{fmt, sync::Arc, sync::OnceLock};

use crate::{
    intern::Name,
    token::Token,
    typesystem::{CilFlavor, CilTypeRc, MemberRefRc, TypeResolver},
};

/// A reference-counted pointer to a [`CustomAttribute`]
pub type CustomAttributeRc = Arc<CustomAttribute>;
/// A vector that holds a list of [`CustomAttribute`] instances for storage on
/// parent objects
pub type CustomAttributeList = Arc<boxcar::Vec<CustomAttributeRc>>;

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}

/// Standard prolog of a custom attribute blob (ECMA-335 II.23.3).
pub const CUSTOM_ATTRIBUTE_PROLOG: u16 = 0x0001;

/// Marker byte for a null string inside a serialized value.
pub const NULL_STRING_MARKER: u8 = 0xFF;

/// A decoded serialized value.
///
/// The hierarchy is closed - it is fixed by the binary attribute format, not
/// user-extensible - so consumers match exhaustively instead of visiting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A primitive, string or null constant
    Constant(Constant),
    /// A single-dimension array creation. `elements` is `None` for the
    /// absent array (count prefix -1), distinct from an empty array.
    ArrayCreate {
        /// Element type of the array
        element_type: CilTypeRc,
        /// Decoded elements, or `None` for the absent array
        elements: Option<Vec<Expression>>,
    },
    /// A typeof(...) argument. `target` is `None` when the serialized type
    /// name could not be parsed or bound.
    TypeOf {
        /// The referenced type, when it could be resolved
        target: Option<CilTypeRc>,
    },
}

/// A constant expression: a static type plus its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// The static type of the constant
    pub ty: CilTypeRc,
    /// The decoded payload
    pub value: ConstantValue,
}

/// The payload of a [`Constant`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode, lossily decoded)
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// Native signed integer (platform-dependent size)
    I(isize),
    /// Native unsigned integer (platform-dependent size)
    U(usize),
    /// UTF-8 string; `None` is the null string
    String(Option<String>),
    /// Null reference (null typeof argument, failed boxed value)
    Null,
}

impl ConstantValue {
    /// The zero-valued placeholder for a flavor, used when a read fails.
    #[must_use]
    pub fn zero_of(flavor: &CilFlavor) -> ConstantValue {
        match flavor {
            CilFlavor::Boolean => ConstantValue::Bool(false),
            CilFlavor::Char => ConstantValue::Char('\0'),
            CilFlavor::I1 => ConstantValue::I1(0),
            CilFlavor::U1 => ConstantValue::U1(0),
            CilFlavor::I2 => ConstantValue::I2(0),
            CilFlavor::U2 => ConstantValue::U2(0),
            CilFlavor::I4 => ConstantValue::I4(0),
            CilFlavor::U4 => ConstantValue::U4(0),
            CilFlavor::I8 => ConstantValue::I8(0),
            CilFlavor::U8 => ConstantValue::U8(0),
            CilFlavor::R4 => ConstantValue::R4(0.0),
            CilFlavor::R8 => ConstantValue::R8(0.0),
            CilFlavor::I => ConstantValue::I(0),
            CilFlavor::U => ConstantValue::U(0),
            CilFlavor::String => ConstantValue::String(None),
            CilFlavor::Enum { .. } | CilFlavor::Unresolved => ConstantValue::I4(0),
            _ => ConstantValue::Null,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Bool(v) => write!(f, "{v}"),
            ConstantValue::Char(v) => write!(f, "'{v}'"),
            ConstantValue::I1(v) => write!(f, "{v}"),
            ConstantValue::U1(v) => write!(f, "{v}"),
            ConstantValue::I2(v) => write!(f, "{v}"),
            ConstantValue::U2(v) => write!(f, "{v}"),
            ConstantValue::I4(v) => write!(f, "{v}"),
            ConstantValue::U4(v) => write!(f, "{v}"),
            ConstantValue::I8(v) => write!(f, "{v}"),
            ConstantValue::U8(v) => write!(f, "{v}"),
            ConstantValue::R4(v) => write!(f, "{v}"),
            ConstantValue::R8(v) => write!(f, "{v}"),
            ConstantValue::I(v) => write!(f, "{v}"),
            ConstantValue::U(v) => write!(f, "{v}"),
            ConstantValue::String(Some(v)) => write!(f, "\"{v}\""),
            ConstantValue::String(None) | ConstantValue::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(constant) => write!(f, "{}", constant.value),
            Expression::ArrayCreate { elements: None, .. } => write!(f, "null"),
            Expression::ArrayCreate {
                elements: Some(elements),
                ..
            } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Expression::TypeOf {
                target: Some(target),
            } => write!(f, "typeof({})", target.name),
            Expression::TypeOf { target: None } => write!(f, "typeof(?)"),
        }
    }
}

/// A named field or property assignment inside an attribute.
#[derive(Debug)]
pub struct NamedArgument {
    /// Name of the field or property
    pub name: Name,
    /// Whether this assigns a field (`true`) or a property (`false`)
    pub is_field: bool,
    /// The declared type embedded in the blob
    pub member_type: CilTypeRc,
    /// The decoded value
    pub value: Expression,
    /// Memoized member resolution; see [`NamedArgument::resolved_member`]
    resolved: OnceLock<Option<MemberRefRc>>,
}

impl NamedArgument {
    /// Create a named argument with an unresolved member cell.
    #[must_use]
    pub fn new(name: Name, is_field: bool, member_type: CilTypeRc, value: Expression) -> Self {
        NamedArgument {
            name,
            is_field,
            member_type,
            value,
            resolved: OnceLock::new(),
        }
    }

    /// Resolve the field or property this argument assigns on `owner` (the
    /// attribute type), computing through the resolver at most once. The
    /// owning record is immutable, so the cached answer never needs
    /// invalidation.
    pub fn resolved_member(
        &self,
        owner: &CilTypeRc,
        resolver: &dyn TypeResolver,
    ) -> Option<MemberRefRc> {
        self.resolved
            .get_or_init(|| resolver.find_member(owner, &self.name))
            .clone()
    }
}

impl Clone for NamedArgument {
    fn clone(&self) -> Self {
        let resolved = OnceLock::new();
        if let Some(cached) = self.resolved.get() {
            let _ = resolved.set(cached.clone());
        }
        NamedArgument {
            name: self.name.clone(),
            is_field: self.is_field,
            member_type: self.member_type.clone(),
            value: self.value.clone(),
            resolved,
        }
    }
}

impl PartialEq for NamedArgument {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.is_field == other.is_field
            && self.member_type == other.member_type
            && self.value == other.value
    }
}

/// A decoded custom attribute row.
///
/// Decoding either fully succeeds or the record is an empty placeholder with
/// the same shape; partially decoded argument lists are never exposed.
#[derive(Debug, Clone)]
pub struct CustomAttribute {
    /// Token of the CustomAttribute row this record was decoded from
    pub token: Token,
    /// The attribute constructor
    pub constructor: MemberRefRc,
    /// Constructor arguments in declaration order
    pub fixed_args: Vec<Expression>,
    /// Named field and property assignments
    pub named_args: Vec<NamedArgument>,
}

impl CustomAttribute {
    /// The empty placeholder record produced when decoding aborts.
    #[must_use]
    pub fn placeholder(token: Token, constructor: MemberRefRc) -> CustomAttributeRc {
        Arc::new(CustomAttribute {
            token,
            constructor,
            fixed_args: Vec::new(),
            named_args: Vec::new(),
        })
    }
}
