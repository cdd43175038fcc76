//! End-to-end attribute decoding against a small host resolver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cildecode::{
    decode_custom_attribute, decode_permission_set, CilFlavor, CilType, CilTypeRc, Constant,
    ConstantValue, DecodeContext, Expression, MemberRef, MemberRefRc, Name, NamePool,
    PermissionFormat, SecurityAction, Token, TypeName, TypeResolver, WellKnownTypes,
};

/// A host with a handful of loaded definitions: one enum, one permission
/// class with a constructor, and member lookup for named arguments.
struct Host {
    enums: HashMap<String, usize>,
    constructors: HashMap<String, CilTypeRc>,
    member_lookups: AtomicUsize,
    names: NamePool,
    types: WellKnownTypes,
}

impl Host {
    fn new() -> Self {
        let mut enums = HashMap::new();
        enums.insert("System.AttributeTargets".to_string(), 4usize);

        let mut constructors = HashMap::new();
        let permission: CilTypeRc = CilType::unresolved(
            "System.Security.Permissions.SecurityPermissionAttribute",
        );
        constructors.insert(permission.name.clone(), permission);

        Host {
            enums,
            constructors,
            member_lookups: AtomicUsize::new(0),
            names: NamePool::new(),
            types: WellKnownTypes::new(),
        }
    }
}

impl TypeResolver for Host {
    fn bind_type_name(&self, name: &TypeName) -> CilTypeRc {
        let rendered = name.unqualified().to_string();
        match self.enums.get(&rendered) {
            Some(size) => CilType::new(
                rendered,
                CilFlavor::Enum {
                    underlying_size: Some(*size),
                },
            ),
            None => self
                .constructors
                .get(&rendered)
                .cloned()
                .unwrap_or_else(|| CilType::unresolved(rendered)),
        }
    }

    fn find_instance_constructor(&self, ty: &CilTypeRc) -> Option<MemberRefRc> {
        let known = self.constructors.get(&ty.name)?;
        Some(MemberRef::new(
            self.names.get_or_intern(".ctor"),
            known.clone(),
            vec![self.types.int32()],
        ))
    }

    fn find_member(&self, ty: &CilTypeRc, name: &Name) -> Option<MemberRefRc> {
        self.member_lookups.fetch_add(1, Ordering::Relaxed);
        Some(MemberRef::new(
            name.clone(),
            ty.clone(),
            Vec::new(),
        ))
    }
}

fn make_ctor(names: &NamePool, params: Vec<CilTypeRc>) -> MemberRefRc {
    MemberRef::new(
        names.get_or_intern(".ctor"),
        CilType::unresolved("My.TestAttribute"),
        params,
    )
}

#[test]
fn attribute_usage_shaped_blob() {
    // [AttributeUsage(AttributeTargets.Class | AttributeTargets.Struct, AllowMultiple = true)]
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);

    let targets = CilType::new(
        "System.AttributeTargets",
        CilFlavor::Enum {
            underlying_size: Some(4),
        },
    );
    let ctor = make_ctor(&names, vec![targets]);

    let blob = [
        0x01, 0x00, // prolog
        0x0C, 0x00, 0x00, 0x00, // Class | Struct
        0x01, 0x00, // one named argument
        0x54, // property
        0x02, // boolean
        0x0D, b'A', b'l', b'l', b'o', b'w', b'M', b'u', b'l', b't', b'i', b'p', b'l',
        b'e', // "AllowMultiple"
        0x01, // true
    ];
    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0001), &ctor, &blob);

    assert_eq!(attribute.fixed_args.len(), 1);
    assert!(matches!(
        &attribute.fixed_args[0],
        Expression::Constant(Constant {
            value: ConstantValue::I4(0x0C),
            ..
        })
    ));

    assert_eq!(attribute.named_args.len(), 1);
    let allow_multiple = &attribute.named_args[0];
    assert_eq!(allow_multiple.name, "AllowMultiple");
    assert!(!allow_multiple.is_field);
    assert!(matches!(
        &allow_multiple.value,
        Expression::Constant(Constant {
            value: ConstantValue::Bool(true),
            ..
        })
    ));
}

#[test]
fn named_argument_member_resolution_is_computed_once() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);
    let ctor = make_ctor(&names, Vec::new());

    let blob = [
        0x01, 0x00, // prolog
        0x01, 0x00, // one named argument
        0x53, // field
        0x08, // i4
        0x05, b'L', b'e', b'v', b'e', b'l', // "Level"
        0x07, 0x00, 0x00, 0x00,
    ];
    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0002), &ctor, &blob);
    let argument = &attribute.named_args[0];

    let first = argument
        .resolved_member(&ctor.owner, &host)
        .expect("member should resolve");
    let second = argument.resolved_member(&ctor.owner, &host).unwrap();
    assert_eq!(first, second);
    assert_eq!(host.member_lookups.load(Ordering::Relaxed), 1);
    assert_eq!(first.name, "Level");
}

#[test]
fn typeof_argument_binds_through_host() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);
    let ctor = make_ctor(&names, vec![ctx.types().system_type()]);

    let type_text = b"System.AttributeTargets";
    let mut blob = vec![0x01, 0x00];
    blob.push(type_text.len() as u8);
    blob.extend_from_slice(type_text);
    blob.extend_from_slice(&[0x00, 0x00]);

    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0003), &ctor, &blob);
    let Expression::TypeOf {
        target: Some(target),
    } = &attribute.fixed_args[0]
    else {
        panic!("expected bound typeof")
    };
    // The host recognized the name as its loaded enum definition.
    assert!(target.is_enum());
}

#[test]
fn string_array_fixed_argument() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);
    let ctor = make_ctor(&names, vec![ctx.types().sz_array(ctx.types().string())]);

    let blob = [
        0x01, 0x00, // prolog
        0x02, 0x00, 0x00, 0x00, // two elements
        0x02, b'h', b'i', // "hi"
        0xFF, // null string
        0x00, 0x00, // named count
    ];
    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0004), &ctor, &blob);
    let Expression::ArrayCreate {
        elements: Some(elements),
        ..
    } = &attribute.fixed_args[0]
    else {
        panic!("expected array")
    };
    assert_eq!(elements.len(), 2);
    assert!(matches!(
        &elements[0],
        Expression::Constant(Constant {
            value: ConstantValue::String(Some(s)),
            ..
        }) if s == "hi"
    ));
    assert!(matches!(
        &elements[1],
        Expression::Constant(Constant {
            value: ConstantValue::String(None),
            ..
        })
    ));
}

#[test]
fn truncated_blob_discards_already_decoded_arguments() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);
    let ctor = make_ctor(
        &names,
        vec![ctx.types().int32(), ctx.types().int32(), ctx.types().int32()],
    );

    // Two full arguments, the third cut mid-value.
    let blob = [
        0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00,
    ];
    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0005), &ctor, &blob);
    assert!(attribute.fixed_args.is_empty());
    assert!(attribute.named_args.is_empty());
}

#[test]
fn security_permission_set_end_to_end() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);

    let class = b"System.Security.Permissions.SecurityPermissionAttribute";
    let mut named = vec![0x54, 0x02, 0x0C];
    named.extend_from_slice(b"Unrestricted");
    named.push(0x01);

    let mut entry = Vec::new();
    entry.push(class.len() as u8);
    entry.extend_from_slice(class);
    let mut inner = vec![0x01]; // one named argument
    inner.extend_from_slice(&named);
    entry.push(inner.len() as u8);
    entry.extend_from_slice(&inner);

    let mut data = vec![0x2E, 0x01];
    data.extend_from_slice(&entry);

    let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);
    assert_eq!(declaration.format, PermissionFormat::BinaryV2);
    assert_eq!(declaration.entries.len(), 1);

    let entry = &declaration.entries[0];
    // The host had a real definition, so the constructor is not synthesized.
    assert!(!entry.constructor.synthesized);
    assert_eq!(
        entry.class_name(),
        "System.Security.Permissions.SecurityPermissionAttribute"
    );
    assert!(entry.is_unrestricted());
    assert!(declaration.is_unrestricted());
}

#[test]
fn security_set_with_failing_entry_is_atomic() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);

    fn entry(class: &[u8]) -> Vec<u8> {
        let mut out = vec![class.len() as u8];
        out.extend_from_slice(class);
        out.extend_from_slice(&[0x01, 0x00]); // blob size 1, zero named args
        out
    }

    let mut data = vec![0x2E, 0x03];
    data.extend_from_slice(&entry(b"Good.Permission"));
    data.extend_from_slice(&entry(b"Broken[Permission")); // unparseable name
    data.extend_from_slice(&entry(b"Also.Good"));

    let declaration = decode_permission_set(&ctx, SecurityAction::RequestMinimum, &data);
    assert!(declaration.entries.is_empty());
}

#[test]
fn records_are_shareable_across_threads() {
    let host = Host::new();
    let names = NamePool::new();
    let ctx = DecodeContext::new(&host, &names);
    let ctor = make_ctor(&names, vec![ctx.types().int32()]);

    let blob = [0x01, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00];
    let attribute = decode_custom_attribute(&ctx, Token::new(0x0C00_0006), &ctor, &blob);

    let list: cildecode::CustomAttributeList = Arc::new(boxcar::Vec::new());
    list.push(attribute.clone());

    let handle = {
        let list = list.clone();
        std::thread::spawn(move || list.count())
    };
    assert_eq!(handle.join().unwrap(), 1);
    assert_eq!(attribute.fixed_args.len(), 1);
}
