//! Custom attribute blob decoding (ECMA-335 II.23.3).
//!
//! A custom attribute blob is a 2-byte prolog (0x0001), the constructor's
//! fixed arguments in declaration order, a 2-byte named-argument count, and
//! that many field/property assignments. Fixed arguments carry no type
//! information of their own - decoding is driven by the resolved
//! constructor's parameter types - while named arguments embed a
//! serialization-type tag before the member name and value.
//!
//! Decoding is all-or-nothing per record: a bad prolog, a failed fixed
//! argument or a failed named argument aborts the whole record, and the
//! caller receives the empty placeholder instead. Fixed arguments that were
//! already decoded are discarded; a partially decoded record is never
//! exposed. One malformed attribute therefore cannot block the rest of
//! metadata loading, and well-formed rows next to it decode normally.

use crate::{
    attributes::{
        reader::{DecodeContext, ValueReader},
        types::{CustomAttribute, CustomAttributeRc, CUSTOM_ATTRIBUTE_PROLOG},
    },
    token::Token,
    typesystem::MemberRefRc,
};
use std::sync::Arc;

/// Decode one custom attribute blob against its resolved constructor.
///
/// `constructor.params` supplies the ordered fixed-argument types. The
/// returned record is either fully decoded or the empty placeholder; see the
/// module docs for the abort policy.
///
/// # Examples
///
/// ```rust
/// use cildecode::{decode_custom_attribute, DecodeContext, NamePool, Token};
/// # use cildecode::{CilType, CilTypeRc, MemberRef, TypeResolver, TypeName};
/// # struct NullResolver;
/// # impl TypeResolver for NullResolver {
/// #     fn bind_type_name(&self, name: &TypeName) -> CilTypeRc {
/// #         CilType::unresolved(name.to_string())
/// #     }
/// # }
///
/// let names = NamePool::new();
/// let resolver = NullResolver;
/// let ctx = DecodeContext::new(&resolver, &names);
///
/// // [Obsolete("Hello")] - a single string fixed argument
/// let ctor = MemberRef::new(
///     names.get_or_intern(".ctor"),
///     CilType::unresolved("System.ObsoleteAttribute"),
///     vec![ctx.types().string()],
/// );
/// let blob = [0x01, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o', 0x00, 0x00];
///
/// let attribute = decode_custom_attribute(&ctx, Token::new(0x0C000001), &ctor, &blob);
/// assert_eq!(attribute.fixed_args.len(), 1);
/// assert_eq!(attribute.fixed_args[0].to_string(), "\"Hello\"");
/// ```
#[must_use]
pub fn decode_custom_attribute(
    ctx: &DecodeContext<'_>,
    token: Token,
    constructor: &MemberRefRc,
    data: &[u8],
) -> CustomAttributeRc {
    let mut reader = ValueReader::new(data, ctx);

    match reader.parser_mut().read_le::<u16>() {
        Ok(CUSTOM_ATTRIBUTE_PROLOG) => {}
        _ => return CustomAttribute::placeholder(token, constructor.clone()),
    }

    let mut fixed_args = Vec::with_capacity(constructor.params.len());
    for param_type in &constructor.params {
        let value = reader.read_value(param_type);
        if reader.decode_failed() {
            return CustomAttribute::placeholder(token, constructor.clone());
        }
        fixed_args.push(value);
    }

    let Ok(named_count) = reader.parser_mut().read_le::<u16>() else {
        return CustomAttribute::placeholder(token, constructor.clone());
    };

    let mut named_args = Vec::with_capacity(usize::from(named_count));
    for _ in 0..named_count {
        let Some(argument) = reader.read_named_argument() else {
            return CustomAttribute::placeholder(token, constructor.clone());
        };
        named_args.push(argument);
    }

    Arc::new(CustomAttribute {
        token,
        constructor: constructor.clone(),
        fixed_args,
        named_args,
    })
}
