//! Declared assembly names.
//!
//! An [`AssemblyName`] is what a referencing party asks for: a project file entry or an
//! `AssemblyRef` row. Unlike [`AssemblyIdentity`], every component besides the simple name
//! may be left open, and an open component matches anything.

use std::{fmt, fmt::Write as _, str::FromStr};

use crate::{
    metadata::{
        identity::{
            cryptographic::{token_from_hex, token_to_hex},
            AssemblyIdentity, AssemblyVersion, Identity, ProcessorArchitecture,
        },
        tables::{AssemblyHashAlgorithm, AssemblyRef},
    },
    Error, Result,
};

/// A possibly partial assembly name, as written in a reference.
///
/// # Examples
///
/// ```rust
/// use refscope::metadata::identity::{AssemblyName, AssemblyVersion};
///
/// let name = AssemblyName::parse("LibB, version=1.0")?;
/// assert_eq!(name.name, "LibB");
/// assert_eq!(name.version, Some(AssemblyVersion::new(1, 0, 0, 0)));
/// assert!(name.culture.is_none());
/// # Ok::<(), refscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyName {
    /// Simple name, compared case-insensitively
    pub name: String,
    /// Required version, if any
    pub version: Option<AssemblyVersion>,
    /// Required culture as written; `neutral` requires a culture-neutral assembly
    pub culture: Option<String>,
    /// Required public key or token; `PublicKeyToken=null` leaves it open
    pub public_key_token: Option<Identity>,
    /// Requested architecture, informational only
    pub processor_architecture: Option<ProcessorArchitecture>,
}

impl AssemblyName {
    /// A name with only the simple name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            culture: None,
            public_key_token: None,
            processor_architecture: None,
        }
    }

    /// Builder style setter for the version.
    #[must_use]
    pub fn with_version(mut self, version: AssemblyVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Builder style setter for the culture.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Builder style setter for the public key token.
    #[must_use]
    pub fn with_token(mut self, token: u64) -> Self {
        self.public_key_token = Some(Identity::Token(token));
        self
    }

    /// The name an `AssemblyRef` row asks for. Version and culture are always set.
    #[must_use]
    pub fn from_assembly_ref(assembly_ref: &AssemblyRef) -> Self {
        Self {
            name: assembly_ref.name.clone(),
            version: Some(AssemblyVersion::new(
                assembly_ref.major_version,
                assembly_ref.minor_version,
                assembly_ref.build_number,
                assembly_ref.revision_number,
            )),
            culture: Some(
                assembly_ref
                    .culture
                    .clone()
                    .unwrap_or_else(|| "neutral".to_string()),
            ),
            public_key_token: assembly_ref.identifier.clone(),
            processor_architecture: None,
        }
    }

    /// Parse a display name such as `LibB, Version=1.0, Culture=neutral, PublicKeyToken=null`.
    ///
    /// Keys are matched case-insensitively and unknown keys are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty name, a component without `=`, or
    /// an invalid version, token or architecture.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut result = Self::new(name);
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(malformed_error!(
                    "Invalid assembly name component '{}' in '{}'",
                    part,
                    display_name
                ));
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "version" => result.version = Some(AssemblyVersion::parse(value)?),
                "culture" => result.culture = Some(value.to_string()),
                "publickeytoken" => {
                    if !value.is_empty() && !value.eq_ignore_ascii_case("null") {
                        result.public_key_token = Some(Identity::Token(token_from_hex(value)?));
                    }
                }
                "processorarchitecture" => {
                    result.processor_architecture = Some(ProcessorArchitecture::parse(value)?);
                }
                _ => {}
            }
        }

        Ok(result)
    }

    /// `true` if `culture` denotes the neutral culture.
    #[must_use]
    pub fn is_neutral(culture: &str) -> bool {
        culture.is_empty() || culture.eq_ignore_ascii_case("neutral")
    }

    /// Check whether an assembly identity satisfies this name.
    ///
    /// The simple name is compared case-insensitively. Version, culture and token are only
    /// checked when present, and then must match exactly.
    #[must_use]
    pub fn matches(&self, identity: &AssemblyIdentity) -> bool {
        if !self.name.eq_ignore_ascii_case(&identity.name) {
            return false;
        }

        if let Some(version) = &self.version {
            if *version != identity.version {
                return false;
            }
        }

        if let Some(culture) = &self.culture {
            let satisfied = match &identity.culture {
                None => Self::is_neutral(culture),
                Some(actual) => actual.eq_ignore_ascii_case(culture),
            };
            if !satisfied {
                return false;
            }
        }

        if let Some(required) = self.public_key_token() {
            if identity.public_key_token() != Some(required) {
                return false;
            }
        }

        true
    }

    /// The required public key token, if any.
    #[must_use]
    pub fn public_key_token(&self) -> Option<u64> {
        self.public_key_token
            .as_ref()
            .and_then(|identity| identity.to_token(AssemblyHashAlgorithm::SHA1).ok())
    }

    /// Display form with only the components that are set.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = self.name.clone();

        if let Some(version) = &self.version {
            let _ = write!(result, ", Version={}", version);
        }
        if let Some(culture) = &self.culture {
            let _ = write!(result, ", Culture={}", culture);
        }
        if let Some(token) = self.public_key_token() {
            let _ = write!(result, ", PublicKeyToken={}", token_to_hex(token));
        }
        if let Some(arch) = &self.processor_architecture {
            let _ = write!(result, ", ProcessorArchitecture={}", arch);
        }

        result
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AssemblyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::AssemblyFlags;

    fn identity(text: &str) -> AssemblyIdentity {
        AssemblyIdentity::parse(text).unwrap()
    }

    #[test]
    fn parse_simple_name() {
        let name = AssemblyName::parse("LibA").unwrap();
        assert_eq!(name, AssemblyName::new("LibA"));
        assert_eq!(name.display_name(), "LibA");
    }

    #[test]
    fn parse_keys_case_insensitive() {
        let name = AssemblyName::parse(
            "LibB, VERSION=1.0, culture=de-DE, publickeytoken=b77a5c561934e089, processorarchitecture=msil",
        )
        .unwrap();

        assert_eq!(name.version, Some(AssemblyVersion::new(1, 0, 0, 0)));
        assert_eq!(name.culture.as_deref(), Some("de-DE"));
        assert_eq!(name.public_key_token(), Some(0x89e0_3419_565c_7ab7));
        assert_eq!(name.processor_architecture, Some(ProcessorArchitecture::MSIL));
    }

    #[test]
    fn parse_null_token() {
        let name = AssemblyName::parse("LibB, PublicKeyToken=null").unwrap();
        assert!(name.public_key_token.is_none());
    }

    #[test]
    fn parse_invalid() {
        assert!(AssemblyName::parse("").is_err());
        assert!(AssemblyName::parse(" , Version=1.0").is_err());
        assert!(AssemblyName::parse("LibB, Version").is_err());
        assert!(AssemblyName::parse("LibB, Version=x").is_err());
        assert!(AssemblyName::parse("LibB, PublicKeyToken=abc").is_err());
    }

    #[test]
    fn matches_partial() {
        let target = identity("LibB, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null");

        assert!(AssemblyName::new("libb").matches(&target));
        assert!(AssemblyName::parse("LibB, Version=1.0").unwrap().matches(&target));
        assert!(AssemblyName::parse("LibB, Culture=neutral").unwrap().matches(&target));
        assert!(!AssemblyName::parse("LibB, Version=2.0").unwrap().matches(&target));
        assert!(!AssemblyName::parse("LibB, Culture=fr").unwrap().matches(&target));
        assert!(!AssemblyName::new("LibC").matches(&target));
    }

    #[test]
    fn matches_token() {
        let signed =
            identity("mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089");
        let unsigned = identity("mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=null");
        let name = AssemblyName::new("mscorlib").with_token(0x89e0_3419_565c_7ab7);

        assert!(name.matches(&signed));
        assert!(!name.matches(&unsigned));
        assert!(AssemblyName::new("mscorlib").matches(&signed));
    }

    #[test]
    fn from_reference_row() {
        let row = AssemblyRef {
            rid: 1,
            major_version: 1,
            minor_version: 0,
            build_number: 0,
            revision_number: 0,
            flags: AssemblyFlags::empty(),
            identifier: None,
            name: "LibC".to_string(),
            culture: None,
            hash_value: None,
        };

        let name = AssemblyName::from_assembly_ref(&row);
        assert_eq!(name.display_name(), "LibC, Version=1.0.0.0, Culture=neutral");
        assert!(name.matches(&identity("LibC, Version=1.0.0.0")));
        assert!(!name.matches(&identity("LibC, Version=1.0.0.1")));
    }
}
