//! Assembly identity for assembly-qualified type names.
//!
//! An [`AssemblyIdentity`] is the structured form of the `Name, Version=...,
//! Culture=..., PublicKeyToken=...` suffix of an assembly-qualified type name.
//! It is produced exclusively by the assembly-name sub-grammar of the
//! type-name parser (see [`crate::typename`]); every field not present in the
//! source text takes its documented default.
//!
//! Identity here is purely descriptive. Binding an identity to a loaded
//! assembly reference (lookup-or-create against an interning cache) is the
//! host's job, performed inside its [`crate::typesystem::TypeResolver`]
//! implementation.

use std::fmt;

use crate::{intern::Name, typename::write_escaped, Result};

/// Complete identity information parsed from an assembly display name.
///
/// # Defaults
///
/// - `version` - zero ([`AssemblyVersion::ZERO`]) when no `Version=` pair is present
/// - `culture` - `None` (culture-neutral); `Culture=neutral` normalizes to `None`
/// - `public_key_token` - `None` (no strong name); `PublicKeyToken=null` also maps here
/// - `retargetable` - `false`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g., "mscorlib", "System.Core").
    pub name: Name,

    /// Four-part version number for compatibility and binding.
    pub version: AssemblyVersion,

    /// Culture for localized satellite assemblies. `None` indicates a
    /// culture-neutral assembly.
    pub culture: Option<String>,

    /// The 8-byte public key token, in the byte order of its hex spelling.
    /// `None` means the assembly is not strong-named.
    pub public_key_token: Option<[u8; 8]>,

    /// Whether the reference may be satisfied by an assembly from a different
    /// publisher (`Retargetable=true`).
    pub retargetable: bool,
}

impl AssemblyIdentity {
    /// Create an identity carrying only a simple name, all other fields at
    /// their defaults.
    #[must_use]
    pub fn with_name(name: Name) -> Self {
        AssemblyIdentity {
            name,
            version: AssemblyVersion::ZERO,
            culture: None,
            public_key_token: None,
            retargetable: false,
        }
    }

    /// Returns `true` if the identity carries a public key token.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.public_key_token.is_some()
    }

    /// Returns `true` for culture-neutral assemblies.
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }
}

impl fmt::Display for AssemblyIdentity {
    /// Render the identity in display-name form. The output re-parses to an
    /// equal identity through the assembly-name grammar.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.name.as_str())?;

        write!(f, ", Version={}", self.version)?;
        write!(f, ", Culture={}", self.culture.as_deref().unwrap_or("neutral"))?;

        f.write_str(", PublicKeyToken=")?;
        match &self.public_key_token {
            Some(token) => f.write_str(&hex::encode(token))?,
            None => f.write_str("null")?,
        }

        if self.retargetable {
            f.write_str(", Retargetable=true")?;
        }

        Ok(())
    }
}

/// Four-part version numbering for .NET assemblies.
///
/// Compared component-wise in order: major, minor, build, revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build version component.
    pub build: u16,
    /// Revision version component.
    pub revision: u16,
}

impl AssemblyVersion {
    /// The unspecified-version sentinel (`0.0.0.0`).
    pub const ZERO: AssemblyVersion = AssemblyVersion {
        major: 0,
        minor: 0,
        build: 0,
        revision: 0,
    };

    /// Create a version from its four components.
    #[must_use]
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a dotted version string.
    ///
    /// Accepts one to four dot-separated components, each a decimal `u16`;
    /// missing components default to zero. Anything else is malformed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an invalid format or component.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.is_empty() || parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}
