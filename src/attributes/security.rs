//! Declarative security attribute decoding (the binary "2.0" format).
//!
//! `DeclSecurity` rows attach permission sets to assemblies, types and
//! methods. The .NET 2.0 binary format opens with a `.` marker (0x2E)
//! followed by a compressed entry count; each entry names its own attribute
//! type with a length-prefixed serialized type name and carries named
//! arguments only - this format has no positional arguments. Older rows
//! store an XML document instead (marker `<`), which is detected and kept
//! raw but not interpreted.
//!
//! Unlike custom attributes, the format represents one atomic permission
//! set: a failure on *any* entry aborts the entire list for the
//! declaration, because a partial permission set is not meaningful.
//!
//! # Constructor lookup
//!
//! Each entry's attribute type is bound through the host resolver, then a
//! constructor is found in this order: an instance constructor with exactly
//! one parameter on the resolved definition, a constructor-shaped
//! member reference matching the type by identity, and finally a
//! synthesized placeholder constructor on the well-known permission base
//! type - downstream code always gets a non-null constructor to report.

use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::{
    attributes::{
        reader::{DecodeContext, ValueReader},
        types::{ConstantValue, Constant, Expression, NamedArgument},
    },
    typename::parse_type_name,
    typesystem::{MemberRef, MemberRefRc},
};

/// Marker byte of the binary 2.0 permission set format ('.').
pub const PERMISSION_SET_BINARY_MARKER: u8 = 0x2E;
/// Marker byte of the legacy XML permission set format ('<').
pub const PERMISSION_SET_XML_MARKER: u8 = 0x3C;

/// Owner type for synthesized placeholder constructors.
pub const FALLBACK_PERMISSION_BASE: &str = "System.Security.Permissions.SecurityAttribute";

/// Security actions as defined in ECMA-335 II.22.11.
///
/// The action controls how the runtime applies the permission set to the
/// decorated code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityAction {
    /// Without further checks, refuse Demand for the specified permission.
    Deny,
    /// Check that all callers in the call chain have the permission.
    Demand,
    /// Without further checks, satisfy Demand for the specified permission.
    Assert,
    /// Check that the current assembly has the permission (non-CAS).
    NonCasDemand,
    /// Check that the immediate caller has the permission at link time.
    LinkDemand,
    /// The permission is required to inherit or override.
    InheritanceDemand,
    /// Minimum permissions required to run (assembly-level, obsolete).
    RequestMinimum,
    /// Optional permissions to grant (assembly-level, obsolete).
    RequestOptional,
    /// Permissions that must not be granted (assembly-level, obsolete).
    RequestRefuse,
    /// Reserved for prejitting.
    PrejitGrant,
    /// Reserved for prejitting.
    PrejitDeny,
    /// Non-CAS version of LinkDemand.
    NonCasLinkDemand,
    /// Non-CAS version of InheritanceDemand.
    NonCasInheritance,
    /// Link demand choice (.NET 4.0 transparency model).
    LinkDemandChoice,
    /// Inheritance demand choice (.NET 4.0 transparency model).
    InheritanceDemandChoice,
    /// Demand choice (.NET 4.0 transparency model).
    DemandChoice,
    /// Refuse Demand for all permissions other than those specified.
    PermitOnly,
    /// Unknown security action code.
    Unknown(u16),
}

impl From<u16> for SecurityAction {
    fn from(value: u16) -> Self {
        match value {
            0x0001 => SecurityAction::Deny,
            0x0002 => SecurityAction::Demand,
            0x0003 => SecurityAction::Assert,
            0x0004 => SecurityAction::NonCasDemand,
            0x0005 => SecurityAction::LinkDemand,
            0x0006 => SecurityAction::InheritanceDemand,
            0x0007 => SecurityAction::RequestMinimum,
            0x0008 => SecurityAction::RequestOptional,
            0x0009 => SecurityAction::RequestRefuse,
            0x000A => SecurityAction::PrejitGrant,
            0x000B => SecurityAction::PrejitDeny,
            0x000C => SecurityAction::NonCasLinkDemand,
            0x000D => SecurityAction::NonCasInheritance,
            0x000E => SecurityAction::LinkDemandChoice,
            0x000F => SecurityAction::InheritanceDemandChoice,
            0x0010 => SecurityAction::DemandChoice,
            0x0011 => SecurityAction::PermitOnly,
            other => SecurityAction::Unknown(other),
        }
    }
}

/// The supported permission set formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionFormat {
    /// Binary 2.0 format, '.'-marked
    BinaryV2,
    /// XML document, kept raw and not interpreted
    Xml,
    /// Unidentified leading byte
    Unknown,
}

bitflags! {
    /// SecurityPermissionFlag values carried by SecurityPermission entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SecurityPermissionFlags: i32 {
        /// Code is allowed to assert permissions its callers lack.
        const ASSERTION = 0x0000_0001;
        /// Code may execute without runtime verification.
        const SKIP_VERIFICATION = 0x0000_0004;
        /// Code is allowed to run at all.
        const EXECUTION = 0x0000_0008;
        /// Unsafe/unverifiable code may execute.
        const UNSAFE_CODE = 0x0000_0020;
        /// Evidence objects may be created and manipulated.
        const CONTROL_EVIDENCE = 0x0000_0040;
        /// Serialization and deserialization are permitted.
        const SERIALIZATION = 0x0000_0080;
        /// Assembly binding redirects may be configured.
        const BINDING = 0x0000_0100;
        /// Thread state may be manipulated.
        const CONTROL_THREAD = 0x0000_0200;
        /// Security principals may be manipulated.
        const CONTROL_PRINCIPAL = 0x0000_0400;
        /// Security policy may be modified.
        const CONTROL_POLICY = 0x0000_0800;
        /// Application domains may be created and controlled.
        const CONTROL_APPDOMAINS = 0x0000_1000;
        /// Security infrastructure access is permitted.
        const INFRASTRUCTURE = 0x0000_2000;
        /// Remoting channels may be configured.
        const REMOTING = 0x0000_4000;
        /// Domain behavior may be manipulated.
        const CONTROL_DOMAIN = 0x0000_8000;
        /// Reflection over non-public members is permitted.
        const REFLECTION = 0x0001_0000;
    }
}

/// Full type names of common .NET permission classes.
pub mod permission_classes {
    /// Controls access to files and directories
    pub const FILE_IO_PERMISSION: &str = "System.Security.Permissions.FileIOPermission";
    /// Controls security-sensitive operations
    pub const SECURITY_PERMISSION: &str = "System.Security.Permissions.SecurityPermission";
    /// Controls registry access
    pub const REGISTRY_PERMISSION: &str = "System.Security.Permissions.RegistryPermission";
    /// Controls use of reflection
    pub const REFLECTION_PERMISSION: &str = "System.Security.Permissions.ReflectionPermission";
    /// Controls environment variable access
    pub const ENVIRONMENT_PERMISSION: &str = "System.Security.Permissions.EnvironmentPermission";
    /// Controls UI operations and clipboard access
    pub const UI_PERMISSION: &str = "System.Security.Permissions.UIPermission";
}

/// One permission entry: its attribute constructor and named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEntry {
    /// The entry's attribute constructor; synthesized when no real one was
    /// found
    pub constructor: MemberRefRc,
    /// Named field and property assignments (this format has no fixed
    /// arguments)
    pub named_args: Vec<NamedArgument>,
}

impl SecurityEntry {
    /// The full name of the permission class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.constructor.owner.name
    }

    /// `true` when the entry sets `Unrestricted = true`.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.named_args.iter().any(|arg| {
            arg.name == "Unrestricted"
                && matches!(
                    &arg.value,
                    Expression::Constant(Constant {
                        value: ConstantValue::Bool(true),
                        ..
                    })
                )
        })
    }

    /// The `Flags` named argument as [`SecurityPermissionFlags`], when
    /// present and integral.
    #[must_use]
    pub fn security_flags(&self) -> Option<SecurityPermissionFlags> {
        self.named_args.iter().find_map(|arg| {
            if arg.name != "Flags" {
                return None;
            }
            match &arg.value {
                Expression::Constant(Constant {
                    value: ConstantValue::I4(flags),
                    ..
                }) => Some(SecurityPermissionFlags::from_bits_truncate(*flags)),
                _ => None,
            }
        })
    }
}

/// A decoded `DeclSecurity` row: the action plus its permission entries.
///
/// `entries` is empty when the row was XML, unrecognized, or failed to
/// decode; `raw` always preserves the original bytes.
#[derive(Debug, Clone)]
pub struct SecurityDeclaration {
    /// How the permission set is applied
    pub action: SecurityAction,
    /// Detected format of the raw data
    pub format: PermissionFormat,
    /// The decoded permission entries
    pub entries: Vec<SecurityEntry>,
    /// The original permission set bytes
    pub raw: Vec<u8>,
}

impl SecurityDeclaration {
    /// `true` when any entry grants unrestricted access.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.entries.iter().any(SecurityEntry::is_unrestricted)
    }

    /// Find an entry by permission class name.
    #[must_use]
    pub fn entry(&self, class_name: &str) -> Option<&SecurityEntry> {
        self.entries
            .iter()
            .find(|entry| entry.class_name() == class_name)
    }

    fn empty(action: SecurityAction, format: PermissionFormat, raw: &[u8]) -> Self {
        SecurityDeclaration {
            action,
            format,
            entries: Vec::new(),
            raw: raw.to_vec(),
        }
    }
}

impl fmt::Display for SecurityDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.format == PermissionFormat::Xml {
            return write!(f, "{}", String::from_utf8_lossy(&self.raw));
        }

        writeln!(f, "Permission Set ({:?}, {:?}):", self.action, self.format)?;
        for entry in &self.entries {
            writeln!(f, "\t - {}", entry.class_name())?;
            for arg in &entry.named_args {
                writeln!(f, "\t  * {} = {}", arg.name, arg.value)?;
            }
        }
        Ok(())
    }
}

/// Decode one `DeclSecurity` permission set.
///
/// `action` comes from the row's 2-byte action field, read by the caller.
/// XML and unrecognized formats yield zero entries with the raw bytes
/// preserved. In the binary format a failure on any entry empties the whole
/// list; see the module docs.
#[must_use]
pub fn decode_permission_set(
    ctx: &DecodeContext<'_>,
    action: SecurityAction,
    data: &[u8],
) -> SecurityDeclaration {
    match data.first() {
        Some(&PERMISSION_SET_BINARY_MARKER) => decode_binary_v2(ctx, action, data),
        Some(&PERMISSION_SET_XML_MARKER) => {
            SecurityDeclaration::empty(action, PermissionFormat::Xml, data)
        }
        _ => SecurityDeclaration::empty(action, PermissionFormat::Unknown, data),
    }
}

fn decode_binary_v2(
    ctx: &DecodeContext<'_>,
    action: SecurityAction,
    data: &[u8],
) -> SecurityDeclaration {
    let mut reader = ValueReader::new(data, ctx);
    let _ = reader.parser_mut().advance(); // format marker

    let Ok(entry_count) = reader.parser_mut().read_compressed_uint() else {
        return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
    };

    let mut entries = Vec::new();
    for _ in 0..entry_count {
        let Some(class_name) = reader.read_serialized_string() else {
            return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
        };
        if reader.decode_failed() {
            return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
        }

        let Some(name_ast) = parse_type_name(&class_name, ctx.names) else {
            return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
        };
        let attribute_type = ctx.resolver.bind_type_name(&name_ast);

        let constructor = ctx
            .resolver
            .find_instance_constructor(&attribute_type)
            .or_else(|| ctx.resolver.find_constructor_reference(&attribute_type))
            .unwrap_or_else(|| {
                Arc::new(MemberRef {
                    name: ctx.names.get_or_intern(".ctor"),
                    owner: ctx.resolver.fallback_permission_type(),
                    params: vec![ctx.types().int32()],
                    synthesized: true,
                })
            });

        // The per-entry blob size is redundant with the named-argument
        // structure that follows; read and discard.
        let Ok(_blob_size) = reader.parser_mut().read_compressed_uint() else {
            return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
        };

        let Ok(named_count) = reader.parser_mut().read_compressed_uint() else {
            return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
        };

        let mut named_args = Vec::new();
        for _ in 0..named_count {
            let Some(argument) = reader.read_named_argument() else {
                return SecurityDeclaration::empty(action, PermissionFormat::BinaryV2, data);
            };
            named_args.push(argument);
        }

        entries.push(SecurityEntry {
            constructor,
            named_args,
        });
    }

    SecurityDeclaration {
        action,
        format: PermissionFormat::BinaryV2,
        entries,
        raw: data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attributes::types::SERIALIZATION_TYPE,
        intern::NamePool,
        test::factories::TestResolver,
    };

    /// Build one binary-format entry: class name, blob size, named args.
    fn entry_bytes(class_name: &str, named_args: &[&[u8]]) -> Vec<u8> {
        let mut blob = Vec::new();
        #[allow(clippy::cast_possible_truncation)]
        blob.push(named_args.len() as u8);
        for arg in named_args {
            blob.extend_from_slice(arg);
        }

        let mut out = Vec::new();
        #[allow(clippy::cast_possible_truncation)]
        out.push(class_name.len() as u8);
        out.extend_from_slice(class_name.as_bytes());
        #[allow(clippy::cast_possible_truncation)]
        out.push(blob.len() as u8);
        out.extend_from_slice(&blob);
        out
    }

    fn unrestricted_arg() -> Vec<u8> {
        let mut arg = vec![
            SERIALIZATION_TYPE::PROPERTY,
            SERIALIZATION_TYPE::BOOLEAN,
            12,
        ];
        arg.extend_from_slice(b"Unrestricted");
        arg.push(0x01);
        arg
    }

    fn permission_set(entries: &[Vec<u8>]) -> Vec<u8> {
        let mut data = vec![PERMISSION_SET_BINARY_MARKER];
        #[allow(clippy::cast_possible_truncation)]
        data.push(entries.len() as u8);
        for entry in entries {
            data.extend_from_slice(entry);
        }
        data
    }

    #[test]
    fn action_codes_round_trip() {
        assert_eq!(SecurityAction::from(0x0002), SecurityAction::Demand);
        assert_eq!(SecurityAction::from(0x0005), SecurityAction::LinkDemand);
        assert_eq!(SecurityAction::from(0x0011), SecurityAction::PermitOnly);
        assert_eq!(SecurityAction::from(0x9999), SecurityAction::Unknown(0x9999));
    }

    #[test]
    fn wrong_marker_yields_no_entries() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &[0x00, 0x01]);
        assert_eq!(declaration.format, PermissionFormat::Unknown);
        assert!(declaration.entries.is_empty());

        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &[]);
        assert_eq!(declaration.format, PermissionFormat::Unknown);
    }

    #[test]
    fn xml_sets_detect_without_decoding() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let xml = b"<PermissionSet class=\"System.Security.PermissionSet\"/>";
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, xml);
        assert_eq!(declaration.format, PermissionFormat::Xml);
        assert!(declaration.entries.is_empty());
        assert_eq!(declaration.raw, xml);
        assert!(declaration.to_string().starts_with("<PermissionSet"));
    }

    #[test]
    fn single_entry_with_named_argument() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = permission_set(&[entry_bytes(
            permission_classes::SECURITY_PERMISSION,
            &[&unrestricted_arg()],
        )]);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);

        assert_eq!(declaration.entries.len(), 1);
        let entry = &declaration.entries[0];
        assert_eq!(entry.named_args.len(), 1);
        assert_eq!(entry.named_args[0].name, "Unrestricted");
        assert!(entry.is_unrestricted());
        assert!(declaration.is_unrestricted());
    }

    #[test]
    fn constructor_falls_back_to_synthesized_placeholder() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = permission_set(&[entry_bytes("Unknown.Permission", &[])]);
        let declaration = decode_permission_set(&ctx, SecurityAction::LinkDemand, &data);

        let constructor = &declaration.entries[0].constructor;
        assert!(constructor.synthesized);
        assert_eq!(constructor.owner.name, FALLBACK_PERMISSION_BASE);
        assert_eq!(constructor.params.len(), 1);
    }

    #[test]
    fn known_type_uses_real_constructor() {
        let resolver =
            TestResolver::new().with_constructor(permission_classes::FILE_IO_PERMISSION);
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = permission_set(&[entry_bytes(permission_classes::FILE_IO_PERMISSION, &[])]);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);

        let constructor = &declaration.entries[0].constructor;
        assert!(!constructor.synthesized);
        assert_eq!(
            constructor.owner.name,
            permission_classes::FILE_IO_PERMISSION
        );
    }

    #[test]
    fn failing_middle_entry_empties_the_whole_list() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let good = entry_bytes(permission_classes::SECURITY_PERMISSION, &[]);
        // Unparseable type name: unbalanced bracket
        let bad = entry_bytes("Broken[Name", &[]);

        let data = permission_set(&[good.clone(), bad, good]);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);
        assert_eq!(declaration.format, PermissionFormat::BinaryV2);
        assert!(declaration.entries.is_empty());
    }

    #[test]
    fn truncated_entry_empties_the_whole_list() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let mut data = permission_set(&[entry_bytes(
            permission_classes::SECURITY_PERMISSION,
            &[&unrestricted_arg()],
        )]);
        data.truncate(data.len() - 4);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);
        assert!(declaration.entries.is_empty());
    }

    #[test]
    fn security_flags_parse_from_named_argument() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let mut flags_arg = vec![
            SERIALIZATION_TYPE::PROPERTY,
            SERIALIZATION_TYPE::I4,
            5,
        ];
        flags_arg.extend_from_slice(b"Flags");
        flags_arg.extend_from_slice(&0x0000_0024i32.to_le_bytes()); // SkipVerification | UnsafeCode

        let data = permission_set(&[entry_bytes(
            permission_classes::SECURITY_PERMISSION,
            &[&flags_arg],
        )]);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);
        let flags = declaration.entries[0].security_flags().unwrap();
        assert!(flags.contains(SecurityPermissionFlags::SKIP_VERIFICATION));
        assert!(flags.contains(SecurityPermissionFlags::UNSAFE_CODE));
        assert!(!flags.contains(SecurityPermissionFlags::REFLECTION));
    }

    #[test]
    fn display_lists_entries() {
        let resolver = TestResolver::new();
        let names = NamePool::new();
        let ctx = DecodeContext::new(&resolver, &names);

        let data = permission_set(&[entry_bytes(
            permission_classes::SECURITY_PERMISSION,
            &[&unrestricted_arg()],
        )]);
        let declaration = decode_permission_set(&ctx, SecurityAction::Demand, &data);
        let rendered = declaration.to_string();
        assert!(rendered.contains("Unrestricted = true"));
    }
}
