//! Assembly identity: the name, version, culture and strong name of an assembly.
//!
//! [`AssemblyIdentity`] is what an assembly says about itself in its `Assembly` table. Its
//! full name (`Name, Version=a.b.c.d, Culture=neutral, PublicKeyToken=...`) is the
//! canonical key under which resolved assemblies are deduplicated. The processor
//! architecture is not part of it.

use std::{fmt, fmt::Write as _, str::FromStr};

use crate::{
    metadata::{
        identity::{cryptographic::token_to_hex, AssemblyName, Identity},
        tables::{Assembly, AssemblyFlags, AssemblyHashAlgorithm},
    },
    Error, Result,
};

/// The full identity of an assembly.
///
/// Two identities are equal when their names, versions, cultures and public key tokens are
/// equal, whatever architecture they were built for. A full key and its token compare equal.
///
/// # Examples
///
/// ```rust
/// use refscope::metadata::identity::{AssemblyIdentity, AssemblyVersion};
///
/// let identity = AssemblyIdentity::parse(
///     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
/// )?;
/// assert_eq!(identity.version, AssemblyVersion::new(4, 0, 0, 0));
/// assert_eq!(identity.public_key_token(), Some(0x89e0_3419_565c_7ab7));
/// # Ok::<(), refscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct AssemblyIdentity {
    /// Simple name, without extension
    pub name: String,
    /// Four part version
    pub version: AssemblyVersion,
    /// Culture, `None` for neutral
    pub culture: Option<String>,
    /// Public key or token, `None` for assemblies without a strong name
    pub strong_name: Option<Identity>,
    /// Target architecture, if recorded
    pub processor_architecture: Option<ProcessorArchitecture>,
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.culture == other.culture
            && self.public_key_token() == other.public_key_token()
    }
}

impl Eq for AssemblyIdentity {}

impl std::hash::Hash for AssemblyIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.culture.hash(state);
        self.public_key_token().hash(state);
    }
}

/// A four part assembly version, `major.minor.build.revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

/// Processor architecture of an assembly, as used in display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorArchitecture {
    /// Architecture neutral
    MSIL,
    /// 32-bit Intel
    X86,
    /// Itanium
    IA64,
    /// 64-bit Intel and AMD
    AMD64,
    /// 32-bit ARM
    ARM,
    /// 64-bit ARM
    ARM64,
}

impl AssemblyIdentity {
    /// Create an identity from its parts.
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: Option<String>,
        strong_name: Option<Identity>,
        processor_architecture: Option<ProcessorArchitecture>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            culture,
            strong_name,
            processor_architecture,
        }
    }

    /// Build the identity of an assembly from its manifest row.
    ///
    /// The processor architecture is only recorded when the flags mark it as specified.
    #[must_use]
    pub fn from_assembly(assembly: &Assembly) -> Self {
        let strong_name = if assembly.public_key.is_empty() {
            None
        } else {
            Identity::from(&assembly.public_key, true).ok()
        };

        Self {
            name: assembly.name.clone(),
            version: AssemblyVersion::new(
                assembly.major_version,
                assembly.minor_version,
                assembly.build_number,
                assembly.revision_number,
            ),
            culture: assembly.culture.clone().filter(|culture| !culture.is_empty()),
            strong_name,
            processor_architecture: ProcessorArchitecture::from_flags(assembly.flags),
        }
    }

    /// Parse a display name. Missing components default to version `0.0.0.0`, neutral
    /// culture and no strong name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty name or an invalid component.
    pub fn parse(display_name: &str) -> Result<Self> {
        let name = AssemblyName::parse(display_name)?;

        Ok(Self {
            version: name.version.unwrap_or_default(),
            culture: name.culture.filter(|culture| !AssemblyName::is_neutral(culture)),
            strong_name: name.public_key_token,
            processor_architecture: name.processor_architecture,
            name: name.name,
        })
    }

    /// The public key token, computed with SHA-1 when the full key is known.
    #[must_use]
    pub fn public_key_token(&self) -> Option<u64> {
        self.strong_name
            .as_ref()
            .and_then(|identity| identity.to_token(AssemblyHashAlgorithm::SHA1).ok())
    }

    /// The canonical full name,
    /// `Name, Version=a.b.c.d, Culture=<culture|neutral>, PublicKeyToken=<hex|null>`.
    ///
    /// Builds of one assembly for different architectures share a full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 80);

        result.push_str(&self.name);
        let _ = write!(result, ", Version={}", self.version);
        let _ = write!(
            result,
            ", Culture={}",
            self.culture.as_deref().unwrap_or("neutral")
        );

        result.push_str(", PublicKeyToken=");
        match self.public_key_token() {
            Some(token) => result.push_str(&token_to_hex(token)),
            None => result.push_str("null"),
        }

        result
    }

    /// The [`full name`](AssemblyIdentity::full_name) followed by
    /// `ProcessorArchitecture=` when one is recorded.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = self.full_name();
        if let Some(arch) = &self.processor_architecture {
            let _ = write!(result, ", ProcessorArchitecture={}", arch);
        }
        result
    }

    /// `true` if the identity carries a public key or token
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.strong_name.is_some()
    }

    /// `true` if the culture is neutral
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }
}

impl AssemblyVersion {
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse one to four dot separated components; missing components are 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for more than four or non-numeric components.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();

        if parts.len() > 4 {
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

impl ProcessorArchitecture {
    /// Parse the value of a `ProcessorArchitecture=` component, case-insensitively.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown architecture.
    pub fn parse(arch_str: &str) -> Result<Self> {
        match arch_str.trim().to_lowercase().as_str() {
            "msil" => Ok(Self::MSIL),
            "x86" => Ok(Self::X86),
            "ia64" => Ok(Self::IA64),
            "amd64" | "x64" => Ok(Self::AMD64),
            "arm" => Ok(Self::ARM),
            "arm64" => Ok(Self::ARM64),
            _ => Err(malformed_error!(
                "Unknown processor architecture: '{}'",
                arch_str.trim()
            )),
        }
    }

    /// Decode the architecture bits of `AssemblyFlags`, if marked as specified.
    #[must_use]
    pub fn from_flags(flags: AssemblyFlags) -> Option<Self> {
        if !flags.contains(AssemblyFlags::PA_SPECIFIED) {
            return None;
        }

        match flags.processor_architecture() {
            1 => Some(Self::MSIL),
            2 => Some(Self::X86),
            3 => Some(Self::IA64),
            4 => Some(Self::AMD64),
            5 => Some(Self::ARM),
            _ => None,
        }
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

impl fmt::Display for ProcessorArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch_str = match self {
            Self::MSIL => "MSIL",
            Self::X86 => "x86",
            Self::IA64 => "IA64",
            Self::AMD64 => "AMD64",
            Self::ARM => "ARM",
            Self::ARM64 => "ARM64",
        };
        write!(f, "{}", arch_str)
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::identity::cryptographic::ECMA_PUBLIC_KEY;

    #[test]
    fn version_parse() {
        assert_eq!(
            AssemblyVersion::parse("4.0.30319.42").unwrap(),
            AssemblyVersion::new(4, 0, 30319, 42)
        );
        assert_eq!(
            AssemblyVersion::parse("1.2").unwrap(),
            AssemblyVersion::new(1, 2, 0, 0)
        );
        assert!(AssemblyVersion::parse("").is_err());
        assert!(AssemblyVersion::parse("1.2.3.4.5").is_err());
        assert!(AssemblyVersion::parse("1.2.abc.4").is_err());
        assert!(AssemblyVersion::parse("70000").is_err());
    }

    #[test]
    fn version_ordering() {
        assert!(AssemblyVersion::new(2, 0, 0, 0) > AssemblyVersion::new(1, 9, 9, 9));
        assert!(AssemblyVersion::new(1, 0, 1, 0) > AssemblyVersion::new(1, 0, 0, 7));
    }

    #[test]
    fn display_name_formats() {
        let unsigned = AssemblyIdentity::new(
            "LibB",
            AssemblyVersion::new(1, 0, 0, 0),
            None,
            None,
            None,
        );
        assert_eq!(
            unsigned.display_name(),
            "LibB, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
        );

        let signed = AssemblyIdentity::new(
            "System.Runtime",
            AssemblyVersion::new(8, 0, 0, 0),
            Some("en-US".to_string()),
            Some(Identity::EcmaKey(ECMA_PUBLIC_KEY.to_vec())),
            Some(ProcessorArchitecture::AMD64),
        );
        assert_eq!(
            signed.to_string(),
            "System.Runtime, Version=8.0.0.0, Culture=en-US, PublicKeyToken=b77a5c561934e089, ProcessorArchitecture=AMD64"
        );
        assert_eq!(
            signed.full_name(),
            "System.Runtime, Version=8.0.0.0, Culture=en-US, PublicKeyToken=b77a5c561934e089"
        );
    }

    #[test]
    fn architecture_is_not_part_of_identity() {
        let x86 = AssemblyIdentity::new(
            "LibX",
            AssemblyVersion::new(1, 0, 0, 0),
            None,
            None,
            Some(ProcessorArchitecture::X86),
        );
        let msil = AssemblyIdentity::new(
            "LibX",
            AssemblyVersion::new(1, 0, 0, 0),
            None,
            None,
            Some(ProcessorArchitecture::MSIL),
        );

        assert_eq!(x86, msil);
        assert_eq!(x86.full_name(), msil.full_name());
        assert_ne!(x86.display_name(), msil.display_name());
    }

    #[test]
    fn parse_round_trip() {
        let text = "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";
        let identity: AssemblyIdentity = text.parse().unwrap();

        assert_eq!(identity.name, "mscorlib");
        assert!(identity.is_culture_neutral());
        assert!(identity.is_strong_named());
        assert_eq!(identity.display_name(), text);
    }

    #[test]
    fn key_and_token_compare_equal() {
        let with_key = AssemblyIdentity::new(
            "mscorlib",
            AssemblyVersion::new(4, 0, 0, 0),
            None,
            Some(Identity::EcmaKey(ECMA_PUBLIC_KEY.to_vec())),
            None,
        );
        let with_token = AssemblyIdentity::parse(
            "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
        )
        .unwrap();

        assert_eq!(with_key, with_token);
        assert_eq!(with_key.display_name(), with_token.display_name());
    }

    #[test]
    fn from_assembly_row() {
        let assembly = Assembly {
            rid: 1,
            hash_alg_id: AssemblyHashAlgorithm::SHA1,
            major_version: 1,
            minor_version: 2,
            build_number: 3,
            revision_number: 4,
            flags: AssemblyFlags::PA_SPECIFIED | AssemblyFlags::from_bits_retain(0x10),
            public_key: Vec::new(),
            name: "LibA".to_string(),
            culture: Some(String::new()),
        };

        let identity = AssemblyIdentity::from_assembly(&assembly);
        assert_eq!(identity.version, AssemblyVersion::new(1, 2, 3, 4));
        assert!(identity.culture.is_none());
        assert!(identity.strong_name.is_none());
        assert_eq!(identity.processor_architecture, Some(ProcessorArchitecture::MSIL));
    }

    #[test]
    fn processor_architecture_parse() {
        assert_eq!(
            ProcessorArchitecture::parse("x64").unwrap(),
            ProcessorArchitecture::AMD64
        );
        assert_eq!(
            ProcessorArchitecture::parse(" MSIL ").unwrap(),
            ProcessorArchitecture::MSIL
        );
        assert!(ProcessorArchitecture::parse("sparc").is_err());
    }
}
