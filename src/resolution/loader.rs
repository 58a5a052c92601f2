//! Loading assemblies by path or by name.
//!
//! [`AssemblyLoader`] is the seam between reference resolution and the outside world. It
//! is an object-safe trait so tests can count or fake loads, while [`ProbingLoader`]
//! provides the default behaviour: probe a list of directories for `<Name>.dll` and
//! `<Name>.exe`, then fall back to an [`AssemblyRegistry`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    metadata::{
        assemblyview::AssemblyView,
        identity::{AssemblyIdentity, AssemblyName},
    },
    resolution::registry::{is_plain_simple_name, AssemblyRegistry},
    Error, Result,
};

/// The parts of an assembly image that resolution needs, detached from the image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAssembly {
    identity: AssemblyIdentity,
    public_key: Vec<u8>,
    references: Vec<AssemblyName>,
    location: Option<PathBuf>,
    strong_name_signed: bool,
}

impl LoadedAssembly {
    /// Create an artifact from its parts, without a backing image.
    pub fn new(
        identity: AssemblyIdentity,
        public_key: Vec<u8>,
        references: Vec<AssemblyName>,
    ) -> Self {
        let strong_name_signed = !public_key.is_empty();
        LoadedAssembly {
            identity,
            public_key,
            references,
            location: None,
            strong_name_signed,
        }
    }

    /// Attach the file the artifact was loaded from.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Extract identity, key and references from a parsed image.
    ///
    /// # Errors
    /// Returns an error if the manifest or a reference row cannot be decoded.
    pub fn from_view(view: &AssemblyView, location: Option<PathBuf>) -> Result<Self> {
        let assembly = view.assembly()?;

        Ok(LoadedAssembly {
            identity: AssemblyIdentity::from_assembly(&assembly),
            public_key: assembly.public_key,
            references: view.references()?,
            location,
            strong_name_signed: view.is_strong_name_signed(),
        })
    }

    /// Parse an image held in memory.
    ///
    /// # Errors
    /// Returns a recoverable error (see [`Error::is_recoverable`]) if `data` is not a valid
    /// .NET assembly.
    pub fn from_mem(data: Vec<u8>, location: Option<PathBuf>) -> Result<Self> {
        let view = AssemblyView::from_mem(data)?;
        Self::from_view(&view, location)
    }

    /// Read and parse an image from disk, recording `path` as its location.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be read, or any error of
    /// [`LoadedAssembly::from_mem`].
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_mem(std::fs::read(path)?, Some(path.to_path_buf()))
    }

    /// The identity declared in the manifest
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    /// The full public key, empty for assemblies without a strong name
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Names of the referenced assemblies, in table order
    #[must_use]
    pub fn references(&self) -> &[AssemblyName] {
        &self.references
    }

    /// The file this artifact was loaded from, if any
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// `true` if the assembly carries a non-empty public key.
    ///
    /// Delay-signed assemblies count as signed here; see
    /// [`LoadedAssembly::is_strong_name_signed`] for the signature itself.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        !self.public_key.is_empty()
    }

    /// `true` if the CLI header claims a strong name signature
    #[must_use]
    pub fn is_strong_name_signed(&self) -> bool {
        self.strong_name_signed
    }
}

/// Loads assemblies for [`crate::resolution::AssemblyReference`].
///
/// Implementations must report expected failures (missing files, identity mismatches,
/// bad images) with errors for which [`Error::is_recoverable`] holds. Anything else is
/// treated as fatal by the caller.
pub trait AssemblyLoader: Send + Sync {
    /// Read the raw bytes of a file.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be read.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    /// Turn image bytes read from `path` into a loaded artifact.
    ///
    /// # Errors
    /// Returns a recoverable error if the bytes are not a valid .NET assembly.
    fn load_image(&self, data: Vec<u8>, path: &Path) -> Result<Arc<LoadedAssembly>> {
        Ok(Arc::new(LoadedAssembly::from_mem(
            data,
            Some(path.to_path_buf()),
        )?))
    }

    /// Load the assembly that exactly satisfies `name`.
    ///
    /// Version, culture and public key token are honoured when present on `name`.
    ///
    /// # Errors
    /// Returns [`Error::AssemblyNotFound`] if no candidate exists and
    /// [`Error::LoadConflict`] if candidates exist but none matches.
    fn load_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>>;

    /// Load an assembly by simple name from the registry, ignoring version and token.
    ///
    /// # Errors
    /// Returns [`Error::AssemblyNotFound`] if the registry has no matching assembly.
    fn load_partial_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>>;
}

/// The default [`AssemblyLoader`]: directory probing plus an optional registry.
///
/// # Examples
///
/// ```rust,no_run
/// use refscope::resolution::{DirectoryRegistry, ProbingLoader};
///
/// let loader = ProbingLoader::new()
///     .with_probe_path("bin/Debug")
///     .with_registry(DirectoryRegistry::system());
/// ```
#[derive(Default)]
pub struct ProbingLoader {
    probe_paths: Vec<PathBuf>,
    registry: Option<Arc<dyn AssemblyRegistry>>,
}

impl ProbingLoader {
    /// A loader that probes nothing and has no registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to probe for `<Name>.dll` and `<Name>.exe`.
    #[must_use]
    pub fn with_probe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.probe_paths.push(path.into());
        self
    }

    /// Use `registry` after the probe directories, and for partial name lookups.
    #[must_use]
    pub fn with_registry(mut self, registry: impl AssemblyRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Use a shared registry.
    #[must_use]
    pub fn with_shared_registry(mut self, registry: Arc<dyn AssemblyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The configured probe directories
    #[must_use]
    pub fn probe_paths(&self) -> &[PathBuf] {
        &self.probe_paths
    }

    fn probe_candidates(&self, simple_name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if !is_plain_simple_name(simple_name) {
            log::debug!("Refusing to probe for '{}'", simple_name);
            return candidates;
        }

        for directory in &self.probe_paths {
            for extension in ["dll", "exe"] {
                let candidate = directory.join(format!("{simple_name}.{extension}"));
                if candidate.is_file() {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    fn registry_candidates(&self, simple_name: &str) -> Vec<PathBuf> {
        if !is_plain_simple_name(simple_name) {
            return Vec::new();
        }

        self.registry
            .as_ref()
            .map(|registry| registry.candidates(simple_name))
            .unwrap_or_default()
    }

    /// Load `path`, turning recoverable failures into `Ok(None)`.
    fn try_load(&self, path: &Path) -> Result<Option<Arc<LoadedAssembly>>> {
        let loaded = self
            .read_file(path)
            .and_then(|data| self.load_image(data, path));

        match loaded {
            Ok(assembly) => Ok(Some(assembly)),
            Err(error) if error.is_recoverable() => {
                log::debug!("Skipping candidate {}: {}", path.display(), error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

impl AssemblyLoader for ProbingLoader {
    fn load_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        let mut conflict = None;

        let candidates = self
            .probe_candidates(&name.name)
            .into_iter()
            .chain(self.registry_candidates(&name.name));

        for candidate in candidates {
            let Some(assembly) = self.try_load(&candidate)? else {
                continue;
            };

            if name.matches(assembly.identity()) {
                log::debug!("Loaded '{}' from {}", name, candidate.display());
                return Ok(assembly);
            }

            log::debug!(
                "Candidate {} is '{}', not '{}'",
                candidate.display(),
                assembly.identity(),
                name
            );
            conflict.get_or_insert_with(|| assembly.identity().display_name());
        }

        match conflict {
            Some(found) => Err(Error::LoadConflict {
                requested: name.display_name(),
                found,
            }),
            None => Err(Error::AssemblyNotFound(name.display_name())),
        }
    }

    fn load_partial_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        let mut best: Option<Arc<LoadedAssembly>> = None;

        for candidate in self.registry_candidates(&name.name) {
            let Some(assembly) = self.try_load(&candidate)? else {
                continue;
            };

            let identity = assembly.identity();
            if !identity.name.eq_ignore_ascii_case(&name.name) {
                continue;
            }
            if let Some(culture) = &name.culture {
                let culture_matches = match &identity.culture {
                    None => AssemblyName::is_neutral(culture),
                    Some(actual) => actual.eq_ignore_ascii_case(culture),
                };
                if !culture_matches {
                    continue;
                }
            }

            if best
                .as_ref()
                .is_none_or(|current| identity.version > current.identity().version)
            {
                best = Some(assembly);
            }
        }

        match best {
            Some(assembly) => {
                log::debug!("Partial name '{}' bound to '{}'", name, assembly.identity());
                Ok(assembly)
            }
            None => Err(Error::AssemblyNotFound(name.display_name())),
        }
    }
}
