//! Type-directed reader for serialized attribute values.
//!
//! [`ValueReader`] walks a forward-only cursor over an immutable blob and
//! decodes one value per declared type: primitives are fixed-width
//! little-endian, strings are length-prefixed UTF-8, arrays carry a 4-byte
//! signed count, boxed values name their concrete type inline, and enum
//! payloads borrow the width of their underlying integral type. When the
//! reader meets a serialized type name (a `typeof` argument or an enum tag)
//! it calls back into the type-name parser and binds the result through the
//! host resolver.
//!
//! # Failure policy
//!
//! Blob damage is expected input, not an exceptional condition. A read past
//! the end of the blob records the sticky [`ValueReader::decode_failed`] flag
//! and produces a zero-valued placeholder of the right shape without
//! advancing the cursor past the end - the recursion never aborts, so sibling
//! array elements and named arguments still get their attempt. An enum whose
//! width cannot even be guessed additionally clears
//! [`ValueReader::more_permutations_possible`], telling callers that retrying
//! the decode under different assumptions cannot succeed.

use crate::{
    attributes::types::{
        Constant, ConstantValue, Expression, NamedArgument, NULL_STRING_MARKER,
        SERIALIZATION_TYPE,
    },
    intern::NamePool,
    parser::{CilIO, Parser},
    typename::parse_type_name,
    typesystem::{CilFlavor, CilType, CilTypeRc, TypeResolver, WellKnownTypes},
};

/// Maximum nesting depth for serialized value decoding.
///
/// Limits stack use when decoding adversarial blobs (arrays of arrays of
/// boxed arrays, ...). Legitimate attribute values nest a handful of levels.
const MAX_NESTING_DEPTH: usize = 64;

/// Shared services for one decoding session: the host resolver, the name
/// pool, and the pre-built well-known type references.
pub struct DecodeContext<'a> {
    /// Host resolution services
    pub resolver: &'a dyn TypeResolver,
    /// Interning table for identifiers
    pub names: &'a NamePool,
    types: WellKnownTypes,
}

impl<'a> DecodeContext<'a> {
    /// Bundle a resolver and a name pool into a context.
    #[must_use]
    pub fn new(resolver: &'a dyn TypeResolver, names: &'a NamePool) -> Self {
        DecodeContext {
            resolver,
            names,
            types: WellKnownTypes::new(),
        }
    }

    /// The well-known type references of this session.
    #[must_use]
    pub fn types(&self) -> &WellKnownTypes {
        &self.types
    }
}

/// Recursive, type-directed decoder over one value blob.
///
/// Create one reader per blob; the two sticky flags accumulate across all
/// reads made through it. Readers are cheap and single-use - the attribute
/// decoders construct one per row.
pub struct ValueReader<'a, 'ctx> {
    parser: Parser<'a>,
    ctx: &'ctx DecodeContext<'ctx>,
    failed: bool,
    more_permutations: bool,
    depth: usize,
}

impl<'a, 'ctx> ValueReader<'a, 'ctx> {
    /// Create a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8], ctx: &'ctx DecodeContext<'ctx>) -> Self {
        ValueReader {
            parser: Parser::new(data),
            ctx,
            failed: false,
            more_permutations: true,
            depth: 0,
        }
    }

    /// `true` once any read has failed. Sticky and advisory: values keep
    /// being produced, but the enclosing record should not be trusted.
    #[must_use]
    pub fn decode_failed(&self) -> bool {
        self.failed
    }

    /// `false` once a failure is known to be unrecoverable under any
    /// alternate decoding assumption.
    #[must_use]
    pub fn more_permutations_possible(&self) -> bool {
        self.more_permutations
    }

    pub(crate) fn parser_mut(&mut self) -> &mut Parser<'a> {
        &mut self.parser
    }

    fn read_or_default<T: CilIO + Default>(&mut self) -> T {
        match self.parser.read_le::<T>() {
            Ok(value) => value,
            Err(_) => {
                self.failed = true;
                T::default()
            }
        }
    }

    /// Read one fixed-width primitive of the given flavor. Shortage yields
    /// the flavor's zero value with the failure flag set.
    fn read_primitive(&mut self, flavor: &CilFlavor) -> ConstantValue {
        match flavor {
            CilFlavor::Boolean => ConstantValue::Bool(self.read_or_default::<u8>() != 0),
            CilFlavor::Char => {
                let raw = self.read_or_default::<u16>();
                ConstantValue::Char(char::from_u32(u32::from(raw)).unwrap_or('\u{FFFD}'))
            }
            CilFlavor::I1 => ConstantValue::I1(self.read_or_default::<i8>()),
            CilFlavor::U1 => ConstantValue::U1(self.read_or_default::<u8>()),
            CilFlavor::I2 => ConstantValue::I2(self.read_or_default::<i16>()),
            CilFlavor::U2 => ConstantValue::U2(self.read_or_default::<u16>()),
            CilFlavor::I4 => ConstantValue::I4(self.read_or_default::<i32>()),
            CilFlavor::U4 => ConstantValue::U4(self.read_or_default::<u32>()),
            CilFlavor::I8 => ConstantValue::I8(self.read_or_default::<i64>()),
            CilFlavor::U8 => ConstantValue::U8(self.read_or_default::<u64>()),
            CilFlavor::R4 => ConstantValue::R4(self.read_or_default::<f32>()),
            CilFlavor::R8 => ConstantValue::R8(self.read_or_default::<f64>()),
            CilFlavor::I => {
                if cfg!(target_pointer_width = "64") {
                    let value = self.read_or_default::<i64>();
                    #[allow(clippy::cast_possible_truncation)]
                    ConstantValue::I(value as isize)
                } else {
                    let value = self.read_or_default::<i32>();
                    ConstantValue::I(value as isize)
                }
            }
            CilFlavor::U => {
                if cfg!(target_pointer_width = "64") {
                    let value = self.read_or_default::<u64>();
                    #[allow(clippy::cast_possible_truncation)]
                    ConstantValue::U(value as usize)
                } else {
                    let value = self.read_or_default::<u32>();
                    ConstantValue::U(value as usize)
                }
            }
            _ => {
                self.failed = true;
                ConstantValue::Null
            }
        }
    }

    /// Read an enum payload of the given underlying width. Returns `None`
    /// only for widths outside 1/2/4/8; a bounds failure yields the zero
    /// value with the failure flag set, like any primitive read.
    fn read_enum_payload(&mut self, size: usize) -> Option<ConstantValue> {
        match size {
            1 => Some(ConstantValue::U1(self.read_or_default::<u8>())),
            2 => Some(ConstantValue::U2(self.read_or_default::<u16>())),
            4 => Some(ConstantValue::I4(self.read_or_default::<i32>())),
            8 => Some(ConstantValue::I8(self.read_or_default::<i64>())),
            _ => None,
        }
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// Returns `None` both for the null marker (0xFF) and for a truncated
    /// read; the two cases are told apart by [`ValueReader::decode_failed`].
    /// Length 0 is the empty string. Invalid UTF-8 decodes lossily rather
    /// than failing the record.
    pub fn read_serialized_string(&mut self) -> Option<String> {
        let Ok(first) = self.parser.peek_byte() else {
            self.failed = true;
            return None;
        };

        if first == NULL_STRING_MARKER {
            let _ = self.parser.advance();
            return None;
        }

        let Ok(length) = self.parser.read_compressed_uint() else {
            self.failed = true;
            return None;
        };
        if length == 0 {
            return Some(String::new());
        }

        let length = length as usize;
        if length > self.parser.remaining() {
            self.failed = true;
            return None;
        }

        let start = self.parser.pos();
        let _ = self.parser.advance_by(length);
        let bytes = &self.parser.data()[start..start + length];
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read one serialization-type tag and produce the reference it selects.
    ///
    /// `SZArray` recurses into its element tag; `Enum` reads a
    /// length-prefixed serialized type name, parses it and binds it through
    /// the resolver, marking the result enum-flavored. An unknown tag is a
    /// failure and returns `None`.
    pub fn read_field_or_property_type(&mut self) -> Option<CilTypeRc> {
        let Ok(tag) = self.parser.read_le::<u8>() else {
            self.failed = true;
            return None;
        };

        let flavor = match tag {
            SERIALIZATION_TYPE::BOOLEAN => Some(CilFlavor::Boolean),
            SERIALIZATION_TYPE::CHAR => Some(CilFlavor::Char),
            SERIALIZATION_TYPE::I1 => Some(CilFlavor::I1),
            SERIALIZATION_TYPE::U1 => Some(CilFlavor::U1),
            SERIALIZATION_TYPE::I2 => Some(CilFlavor::I2),
            SERIALIZATION_TYPE::U2 => Some(CilFlavor::U2),
            SERIALIZATION_TYPE::I4 => Some(CilFlavor::I4),
            SERIALIZATION_TYPE::U4 => Some(CilFlavor::U4),
            SERIALIZATION_TYPE::I8 => Some(CilFlavor::I8),
            SERIALIZATION_TYPE::U8 => Some(CilFlavor::U8),
            SERIALIZATION_TYPE::R4 => Some(CilFlavor::R4),
            SERIALIZATION_TYPE::R8 => Some(CilFlavor::R8),
            _ => None,
        };
        if let Some(flavor) = flavor {
            return self.ctx.types().primitive(&flavor);
        }

        match tag {
            SERIALIZATION_TYPE::STRING => Some(self.ctx.types().string()),
            SERIALIZATION_TYPE::TYPE => Some(self.ctx.types().system_type()),
            SERIALIZATION_TYPE::TAGGED_OBJECT => Some(self.ctx.types().object()),
            SERIALIZATION_TYPE::SZARRAY => {
                if self.depth >= MAX_NESTING_DEPTH {
                    self.failed = true;
                    return None;
                }
                self.depth += 1;
                let element = self.read_field_or_property_type();
                self.depth -= 1;
                Some(self.ctx.types().sz_array(element?))
            }
            SERIALIZATION_TYPE::ENUM => {
                let text = self.read_serialized_string();
                let Some(text) = text else {
                    self.failed = true;
                    return None;
                };

                match parse_type_name(&text, self.ctx.names) {
                    Some(ast) => {
                        let bound = self.ctx.resolver.bind_type_name(&ast);
                        if bound.is_enum() {
                            Some(bound)
                        } else {
                            // The blob says enum; trust it over an
                            // inconclusive binding.
                            Some(CilType::unresolved_enum(bound.name.clone()))
                        }
                    }
                    None => Some(CilType::unresolved_enum(text)),
                }
            }
            _ => {
                self.failed = true;
                None
            }
        }
    }

    /// Decode one value of the declared type.
    ///
    /// Always returns a well-typed expression; failures are recorded in the
    /// sticky flags and surface as zero-valued placeholders.
    pub fn read_value(&mut self, ty: &CilTypeRc) -> Expression {
        if self.depth >= MAX_NESTING_DEPTH {
            self.failed = true;
            self.more_permutations = false;
            return Expression::Constant(Constant {
                ty: ty.clone(),
                value: ConstantValue::zero_of(&ty.flavor),
            });
        }

        self.depth += 1;
        let value = self.read_value_inner(ty);
        self.depth -= 1;
        value
    }

    fn read_value_inner(&mut self, ty: &CilTypeRc) -> Expression {
        match &ty.flavor {
            flavor if flavor.is_primitive() => Expression::Constant(Constant {
                ty: ty.clone(),
                value: self.read_primitive(flavor),
            }),
            CilFlavor::String => Expression::Constant(Constant {
                ty: ty.clone(),
                value: ConstantValue::String(self.read_serialized_string()),
            }),
            CilFlavor::SystemType => match self.read_serialized_string() {
                None => Expression::Constant(Constant {
                    ty: ty.clone(),
                    value: ConstantValue::Null,
                }),
                Some(text) if text.is_empty() => Expression::Constant(Constant {
                    ty: ty.clone(),
                    value: ConstantValue::Null,
                }),
                Some(text) => match parse_type_name(&text, self.ctx.names) {
                    Some(ast) => Expression::TypeOf {
                        target: Some(self.ctx.resolver.bind_type_name(&ast)),
                    },
                    // An unparseable target still yields a typeof value.
                    None => Expression::TypeOf { target: None },
                },
            },
            CilFlavor::Object => match self.read_field_or_property_type() {
                Some(concrete) => self.read_value(&concrete),
                None => Expression::Constant(Constant {
                    ty: ty.clone(),
                    value: ConstantValue::Null,
                }),
            },
            CilFlavor::SzArray { element } => {
                let count = match self.parser.read_le::<i32>() {
                    Ok(count) => count,
                    Err(_) => {
                        self.failed = true;
                        return Expression::ArrayCreate {
                            element_type: element.clone(),
                            elements: None,
                        };
                    }
                };

                if count == -1 {
                    // Absent array, distinct from an empty one.
                    return Expression::ArrayCreate {
                        element_type: element.clone(),
                        elements: None,
                    };
                }

                #[allow(clippy::cast_sign_loss)]
                let count = if count < 0 {
                    self.failed = true;
                    return Expression::ArrayCreate {
                        element_type: element.clone(),
                        elements: None,
                    };
                } else {
                    count as usize
                };

                // Every element consumes at least one byte; a count beyond
                // the remaining bytes cannot be satisfied.
                if count > self.parser.remaining() {
                    self.failed = true;
                    return Expression::ArrayCreate {
                        element_type: element.clone(),
                        elements: None,
                    };
                }

                let mut elements = Vec::with_capacity(count);
                for _ in 0..count {
                    elements.push(self.read_value(element));
                }
                Expression::ArrayCreate {
                    element_type: element.clone(),
                    elements: Some(elements),
                }
            }
            CilFlavor::Enum {
                underlying_size: Some(size),
            } => match self.read_enum_payload(*size) {
                Some(value) => Expression::Constant(Constant {
                    ty: ty.clone(),
                    value,
                }),
                None => {
                    self.failed = true;
                    self.more_permutations = false;
                    Expression::Constant(Constant {
                        ty: ty.clone(),
                        value: ConstantValue::I4(0),
                    })
                }
            },
            CilFlavor::Enum {
                underlying_size: None,
            }
            | CilFlavor::Unresolved => {
                let guessed = self
                    .ctx
                    .resolver
                    .guess_enum_underlying_size(ty)
                    .and_then(|size| self.read_enum_payload(size));

                match guessed {
                    Some(value) => Expression::Constant(Constant {
                        ty: ty.clone(),
                        value,
                    }),
                    None => {
                        self.failed = true;
                        self.more_permutations = false;
                        Expression::Constant(Constant {
                            ty: ty.clone(),
                            value: ConstantValue::I4(0),
                        })
                    }
                }
            }
            // Void consumes nothing; the primitive guard above covers the
            // rest of the flavor space.
            _ => Expression::Constant(Constant {
                ty: ty.clone(),
                value: ConstantValue::Null,
            }),
        }
    }

    /// Read one named argument: field/property tag, embedded type, member
    /// name, then the value. Returns `None` on any failure.
    pub(crate) fn read_named_argument(&mut self) -> Option<NamedArgument> {
        let Ok(kind) = self.parser.read_le::<u8>() else {
            self.failed = true;
            return None;
        };
        let is_field = match kind {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            _ => {
                self.failed = true;
                return None;
            }
        };

        let member_type = self.read_field_or_property_type()?;
        let name = self.read_serialized_string()?;
        if self.failed {
            return None;
        }

        let value = self.read_value(&member_type);
        if self.failed {
            return None;
        }

        Some(NamedArgument::new(
            self.ctx.names.get_or_intern(&name),
            is_field,
            member_type,
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::factories::TestResolver;

    fn assert_i4(expr: &Expression, expected: i32) {
        match expr {
            Expression::Constant(Constant {
                value: ConstantValue::I4(v),
                ..
            }) => assert_eq!(*v, expected),
            other => panic!("expected I4 constant, got {other:?}"),
        }
    }

    #[test]
    fn primitive_reads() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [
            0x01, // bool true
            0x41, 0x00, // char 'A'
            0xFF, // i1 -1
            0x00, 0x80, // i2 -32768
            0xD2, 0x04, 0x00, 0x00, // i4 1234
            0x00, 0x00, 0x20, 0x41, // f32 10.0
        ];
        let mut reader = ValueReader::new(&data, &ctx);
        let types = ctx.types();

        let value = reader.read_value(&types.primitive(&CilFlavor::Boolean).unwrap());
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::Bool(true),
                ..
            })
        ));
        let value = reader.read_value(&types.primitive(&CilFlavor::Char).unwrap());
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::Char('A'),
                ..
            })
        ));
        let value = reader.read_value(&types.primitive(&CilFlavor::I1).unwrap());
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::I1(-1),
                ..
            })
        ));
        let value = reader.read_value(&types.primitive(&CilFlavor::I2).unwrap());
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::I2(-32768),
                ..
            })
        ));
        assert_i4(
            &reader.read_value(&types.primitive(&CilFlavor::I4).unwrap()),
            1234,
        );
        let value = reader.read_value(&types.primitive(&CilFlavor::R4).unwrap());
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::R4(v),
                ..
            }) if v == 10.0
        ));

        assert!(!reader.decode_failed());
    }

    #[test]
    fn truncated_primitive_yields_zero_and_sets_failed() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [0x01, 0x02]; // two bytes, an i4 needs four
        let mut reader = ValueReader::new(&data, &ctx);
        let int32 = ctx.types().int32();

        let value = reader.read_value(&int32);
        assert_i4(&value, 0);
        assert!(reader.decode_failed());
        assert!(reader.more_permutations_possible());
        // Cursor did not advance past the blob end
        assert_eq!(reader.parser.pos(), 0);
    }

    #[test]
    fn string_null_empty_and_value() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);
        let string = ctx.types().string();

        let data = [0xFF]; // null marker
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&string);
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::String(None),
                ..
            })
        ));
        assert!(!reader.decode_failed());

        let data = [0x00]; // length 0
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&string);
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::String(Some(s)),
                ..
            }) if s.is_empty()
        ));

        let data = [0x05, b'H', b'e', b'l', b'l', b'o'];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&string);
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::String(Some(s)),
                ..
            }) if s == "Hello"
        ));
    }

    #[test]
    fn string_length_past_end_fails() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [0x10, b'x']; // claims 16 bytes, has 1
        let mut reader = ValueReader::new(&data, &ctx);
        assert!(reader.read_serialized_string().is_none());
        assert!(reader.decode_failed());
    }

    #[test]
    fn absent_array_is_distinct_from_empty() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);
        let array = ctx.types().sz_array(ctx.types().int32());

        let data = [0xFF, 0xFF, 0xFF, 0xFF]; // count -1
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&array);
        assert!(matches!(
            value,
            Expression::ArrayCreate { elements: None, .. }
        ));
        assert!(!reader.decode_failed());

        let data = [0x00, 0x00, 0x00, 0x00]; // count 0
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&array);
        assert!(matches!(
            value,
            Expression::ArrayCreate {
                elements: Some(elements),
                ..
            } if elements.is_empty()
        ));
    }

    #[test]
    fn array_elements_decode_in_order() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);
        let array = ctx.types().sz_array(ctx.types().int32());

        let data = [
            0x02, 0x00, 0x00, 0x00, // count 2
            0x0A, 0x00, 0x00, 0x00, // 10
            0x14, 0x00, 0x00, 0x00, // 20
        ];
        let mut reader = ValueReader::new(&data, &ctx);
        let Expression::ArrayCreate {
            elements: Some(elements),
            ..
        } = reader.read_value(&array)
        else {
            panic!("expected array");
        };
        assert_i4(&elements[0], 10);
        assert_i4(&elements[1], 20);
    }

    #[test]
    fn array_count_beyond_remaining_fails_without_allocating() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);
        let array = ctx.types().sz_array(ctx.types().int32());

        let data = [0xFF, 0xFF, 0xFF, 0x7F, 0x01]; // count i32::MAX, 1 byte left
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&array);
        assert!(matches!(
            value,
            Expression::ArrayCreate { elements: None, .. }
        ));
        assert!(reader.decode_failed());
    }

    #[test]
    fn truncated_array_still_yields_all_elements() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);
        let array = ctx.types().sz_array(ctx.types().int32());

        let data = [
            0x02, 0x00, 0x00, 0x00, // count 2
            0x0A, 0x00, 0x00, 0x00, // 10
            0x14, // truncated second element
        ];
        let mut reader = ValueReader::new(&data, &ctx);
        let Expression::ArrayCreate {
            elements: Some(elements),
            ..
        } = reader.read_value(&array)
        else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
        assert_i4(&elements[0], 10);
        assert_i4(&elements[1], 0); // placeholder
        assert!(reader.decode_failed());
    }

    #[test]
    fn boxed_value_reads_concrete_type_then_value() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [SERIALIZATION_TYPE::I4, 0x2A, 0x00, 0x00, 0x00];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&ctx.types().object());
        assert_i4(&value, 42);
        assert!(!reader.decode_failed());
    }

    #[test]
    fn typeof_parses_and_binds() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let text = b"System.Int32";
        let mut data = vec![text.len() as u8];
        data.extend_from_slice(text);
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&ctx.types().system_type());
        let Expression::TypeOf {
            target: Some(target),
        } = value
        else {
            panic!("expected typeof");
        };
        assert_eq!(target.name, "System.Int32");
    }

    #[test]
    fn typeof_null_and_empty_yield_null_constant() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        for data in [&[0xFFu8][..], &[0x00][..]] {
            let mut reader = ValueReader::new(data, &ctx);
            let value = reader.read_value(&ctx.types().system_type());
            assert!(matches!(
                value,
                Expression::Constant(Constant {
                    value: ConstantValue::Null,
                    ..
                })
            ));
        }
    }

    #[test]
    fn typeof_unparseable_name_is_target_none() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let text = b"Not[A]Valid]Name";
        let mut data = vec![text.len() as u8];
        data.extend_from_slice(text);
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&ctx.types().system_type());
        assert!(matches!(value, Expression::TypeOf { target: None }));
        assert!(!reader.decode_failed());
    }

    #[test]
    fn enum_with_known_underlying_width() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let day_of_week = CilType::new(
            "System.DayOfWeek",
            CilFlavor::Enum {
                underlying_size: Some(4),
            },
        );
        let data = [0x03, 0x00, 0x00, 0x00];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&day_of_week);
        assert_i4(&value, 3);

        let short_enum = CilType::new(
            "Some.ShortEnum",
            CilFlavor::Enum {
                underlying_size: Some(2),
            },
        );
        let data = [0x07, 0x00];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&short_enum);
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::U2(7),
                ..
            })
        ));
    }

    #[test]
    fn unresolved_enum_uses_host_guess() {
        let resolver = TestResolver::new().with_guess("External.Flags", 2);
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let external = CilType::unresolved_enum("External.Flags");
        let data = [0x05, 0x00];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&external);
        assert!(matches!(
            value,
            Expression::Constant(Constant {
                value: ConstantValue::U2(5),
                ..
            })
        ));
        assert!(!reader.decode_failed());
        assert!(reader.more_permutations_possible());
    }

    #[test]
    fn unguessable_enum_width_is_unrecoverable() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let external = CilType::unresolved_enum("External.Flags");
        let data = [0x05, 0x00, 0x00, 0x00];
        let mut reader = ValueReader::new(&data, &ctx);
        let value = reader.read_value(&external);
        assert_i4(&value, 0);
        assert!(reader.decode_failed());
        assert!(!reader.more_permutations_possible());
    }

    #[test]
    fn enum_tag_reads_type_name_from_blob() {
        let resolver = TestResolver::new().with_enum("System.DayOfWeek", 4);
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let text = b"System.DayOfWeek";
        let mut data = vec![SERIALIZATION_TYPE::ENUM, text.len() as u8];
        data.extend_from_slice(text);
        let mut reader = ValueReader::new(&data, &ctx);
        let ty = reader.read_field_or_property_type().unwrap();
        assert!(ty.is_enum());
        assert_eq!(
            ty.flavor,
            CilFlavor::Enum {
                underlying_size: Some(4)
            }
        );
    }

    #[test]
    fn unknown_tag_is_a_failure() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [0x99];
        let mut reader = ValueReader::new(&data, &ctx);
        assert!(reader.read_field_or_property_type().is_none());
        assert!(reader.decode_failed());
    }

    #[test]
    fn nested_szarray_tags_build_nested_types() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = [
            SERIALIZATION_TYPE::SZARRAY,
            SERIALIZATION_TYPE::SZARRAY,
            SERIALIZATION_TYPE::U1,
        ];
        let mut reader = ValueReader::new(&data, &ctx);
        let ty = reader.read_field_or_property_type().unwrap();
        assert_eq!(ty.name, "System.Byte[][]");
    }

    #[test]
    fn runaway_szarray_nesting_is_bounded() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = vec![SERIALIZATION_TYPE::SZARRAY; 10_000];
        let mut reader = ValueReader::new(&data, &ctx);
        assert!(reader.read_field_or_property_type().is_none());
        assert!(reader.decode_failed());
    }
}
