//! A single resolvable assembly reference.
//!
//! An [`AssemblyReference`] is created for every declared dependency, either from a
//! project file or while expanding the references of an already resolved assembly. All
//! of the expensive work (loading, identity extraction, reference expansion) is deferred
//! until first use and memoized, so handing the same reference to several consumers
//! never loads an image twice.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
    sync::{Arc, OnceLock},
};

use crate::{
    metadata::identity::{AssemblyIdentity, AssemblyName},
    resolution::loader::{AssemblyLoader, LoadedAssembly},
    Result,
};

/// One declared dependency, resolved lazily through an [`AssemblyLoader`].
///
/// A reference is created from either a path or a name. Resolution tries, in order:
///
/// 1. an exact name load, honouring version, culture and token,
/// 2. a partial name lookup against the registry,
/// 3. loading the declared path.
///
/// Expected failures (missing file, identity conflict, bad image) leave the reference
/// unresolved. Any other error is returned to the caller and nothing is memoized, so a
/// later call retries.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use refscope::resolution::{AssemblyReference, ProbingLoader};
///
/// let loader = Arc::new(ProbingLoader::new().with_probe_path("bin"));
/// let reference = AssemblyReference::from_path("bin/LibA.dll", loader);
///
/// if let Some(identity) = reference.canonical_identity()? {
///     println!("{identity}: signed = {:?}", reference.is_signed()?);
/// }
/// # Ok::<(), refscope::Error>(())
/// ```
pub struct AssemblyReference {
    name: Option<AssemblyName>,
    declared_path: Option<PathBuf>,
    /// Absolute path, written at most once
    path: OnceLock<PathBuf>,
    loader: Arc<dyn AssemblyLoader>,
    resolved: OnceLock<Option<Arc<LoadedAssembly>>>,
    references: OnceLock<Option<Vec<Arc<AssemblyReference>>>>,
}

impl AssemblyReference {
    /// A reference to the assembly stored at `path`.
    pub fn from_path(path: impl Into<PathBuf>, loader: Arc<dyn AssemblyLoader>) -> Self {
        Self::create(None, Some(path.into()), loader)
    }

    /// A reference to the assembly named `name`.
    pub fn from_name(name: AssemblyName, loader: Arc<dyn AssemblyLoader>) -> Self {
        Self::create(Some(name), None, loader)
    }

    fn create(
        name: Option<AssemblyName>,
        declared_path: Option<PathBuf>,
        loader: Arc<dyn AssemblyLoader>,
    ) -> Self {
        AssemblyReference {
            name,
            declared_path,
            path: OnceLock::new(),
            loader,
            resolved: OnceLock::new(),
            references: OnceLock::new(),
        }
    }

    /// Resolve the reference to a loaded assembly.
    ///
    /// Returns `Ok(None)` if the reference cannot be resolved. The outcome is computed
    /// once; subsequent calls return the memoized value without touching the loader.
    ///
    /// # Errors
    /// Returns any non-recoverable loader error (see [`crate::Error::is_recoverable`]).
    pub fn resolve(&self) -> Result<Option<Arc<LoadedAssembly>>> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved.clone());
        }

        let resolved = self.try_resolve()?;
        Ok(self.resolved.get_or_init(|| resolved).clone())
    }

    fn try_resolve(&self) -> Result<Option<Arc<LoadedAssembly>>> {
        if let Some(name) = &self.name {
            match self.loader.load_name(name) {
                Ok(assembly) => return Ok(Some(assembly)),
                Err(error) if error.is_recoverable() => {
                    log::debug!("Exact load of '{}' failed: {}", name, error);
                }
                Err(error) => return Err(error),
            }

            match self.loader.load_partial_name(name) {
                Ok(assembly) => return Ok(Some(assembly)),
                Err(error) if error.is_recoverable() => {
                    log::debug!("Partial load of '{}' failed: {}", name, error);
                }
                Err(error) => return Err(error),
            }
        }

        let Some(declared) = &self.declared_path else {
            return Ok(None);
        };
        if declared.as_os_str().is_empty() {
            return Ok(None);
        }

        let absolute = match absolute_path(declared) {
            Ok(absolute) => absolute,
            Err(error) if error.is_recoverable() => {
                log::debug!("Cannot make {} absolute: {}", declared.display(), error);
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        let path = self.path.get_or_init(|| absolute);

        let loaded = self
            .loader
            .read_file(path)
            .and_then(|data| self.loader.load_image(data, path));

        match loaded {
            Ok(assembly) => Ok(Some(assembly)),
            Err(error) if error.is_recoverable() => {
                log::debug!("Loading {} failed: {}", path.display(), error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// The identity of the resolved assembly, `None` if unresolved.
    ///
    /// On first success this also records the assembly's location as the path of the
    /// reference, unless a path is already known.
    ///
    /// # Errors
    /// See [`AssemblyReference::resolve`].
    pub fn canonical_identity(&self) -> Result<Option<&AssemblyIdentity>> {
        self.resolve()?;

        let Some(Some(assembly)) = self.resolved.get() else {
            return Ok(None);
        };

        if self.declared_path.is_none() {
            if let Some(location) = assembly.location() {
                self.path.get_or_init(|| location.to_path_buf());
            }
        }

        Ok(Some(assembly.identity()))
    }

    /// The assemblies this one references, as new unresolved references sharing the same
    /// loader. `None` if this reference is unresolved.
    ///
    /// # Errors
    /// See [`AssemblyReference::resolve`].
    pub fn references(&self) -> Result<Option<&[Arc<AssemblyReference>]>> {
        if let Some(references) = self.references.get() {
            return Ok(references.as_deref());
        }

        let references = self.resolve()?.map(|assembly| {
            assembly
                .references()
                .iter()
                .map(|name| {
                    Arc::new(AssemblyReference::from_name(
                        name.clone(),
                        Arc::clone(&self.loader),
                    ))
                })
                .collect::<Vec<_>>()
        });

        Ok(self.references.get_or_init(|| references).as_deref())
    }

    /// `Some(true)` if the resolved assembly carries a public key, `None` if unresolved.
    ///
    /// # Errors
    /// See [`AssemblyReference::resolve`].
    pub fn is_signed(&self) -> Result<Option<bool>> {
        Ok(self.resolve()?.map(|assembly| assembly.is_signed()))
    }

    /// `true` if the reference was declared by name alone, without a version.
    ///
    /// Such references are expected to be satisfied by the system registry. This only
    /// inspects the declared fields and never resolves.
    #[must_use]
    pub fn is_registry_resident(&self) -> bool {
        self.declared_path.is_none()
            && self
                .name
                .as_ref()
                .is_none_or(|name| name.version.is_none())
    }

    /// The best known path: the absolute or back-filled path if set, otherwise the
    /// declared one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path
            .get()
            .map(PathBuf::as_path)
            .or(self.declared_path.as_deref())
    }

    /// The name this reference was declared with
    #[must_use]
    pub fn declared_name(&self) -> Option<&AssemblyName> {
        self.name.as_ref()
    }

    /// The path this reference was declared with
    #[must_use]
    pub fn declared_path(&self) -> Option<&Path> {
        self.declared_path.as_deref()
    }

    /// The resolved assembly, if resolution already ran and succeeded.
    #[must_use]
    pub fn artifact(&self) -> Option<&Arc<LoadedAssembly>> {
        self.resolved.get().and_then(Option::as_ref)
    }

    /// Text describing the reference as declared: the path or the display name.
    #[must_use]
    pub fn literal(&self) -> String {
        match (&self.declared_path, &self.name) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(name)) => name.display_name(),
            (None, None) => String::new(),
        }
    }
}

impl fmt::Display for AssemblyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal())
    }
}

impl fmt::Debug for AssemblyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyReference")
            .field("name", &self.name)
            .field("declared_path", &self.declared_path)
            .field("path", &self.path.get())
            .field("resolved", &self.resolved.get().map(Option::is_some))
            .finish_non_exhaustive()
    }
}

/// `path` relative to the current directory, with `.` and `..` removed lexically.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }

    Ok(normalize(&std::env::current_dir()?.join(path)))
}

fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    result.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    result.pop();
                }
            }
            other => result.push(other.as_os_str()),
        }
    }

    result
}
