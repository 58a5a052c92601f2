//! `ProjectLoader` builder for setting up a project walk.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    project::ProjectDefinition,
    resolution::{AssemblyLoader, AssemblyReference, DirectoryRegistry, ProbingLoader},
    Error, Result,
};

/// Builder for a [`ProjectDefinition`] together with the loader its references use.
///
/// Unless a custom loader is supplied, references are resolved by a [`ProbingLoader`]
/// probing the configured directories (the project directory if none are given) and then
/// a [`DirectoryRegistry`] made of the configured roots, plus the system cache when
/// enabled.
///
/// # Usage Examples
///
/// ```rust,no_run
/// use refscope::project::ProjectLoader;
///
/// let project = ProjectLoader::new()
///     .project_file("App/App.csproj")?
///     .with_probe_path("App/bin/Release")?
///     .with_registry_root("/opt/reference-assemblies")?
///     .build()?;
/// # Ok::<(), refscope::Error>(())
/// ```
#[derive(Default)]
pub struct ProjectLoader {
    /// MSBuild project to read `<Reference>` items from
    project_file: Option<PathBuf>,
    /// Assemblies declared in addition to the project's references
    dependency_files: Vec<PathBuf>,
    /// Directories probed for `<Name>.dll` / `<Name>.exe`
    probe_paths: Vec<PathBuf>,
    /// Extra registry roots
    registry_roots: Vec<PathBuf>,
    /// Whether to search the system assembly cache
    system_registry: bool,
    /// Replaces the probing loader entirely
    loader: Option<Arc<dyn AssemblyLoader>>,
}

impl ProjectLoader {
    /// Create a new ProjectLoader builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project file.
    ///
    /// # Errors
    /// Returns an error if the path does not exist.
    pub fn project_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Error(format!(
                "Project file does not exist: {}",
                path.display()
            )));
        }
        self.project_file = Some(path.to_path_buf());
        Ok(self)
    }

    /// Declare an additional assembly by path.
    ///
    /// # Errors
    /// Returns an error if the path does not exist.
    pub fn with_dependency<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Error(format!(
                "Dependency file does not exist: {}",
                path.display()
            )));
        }
        self.dependency_files.push(path.to_path_buf());
        Ok(self)
    }

    /// Add a directory to probe for referenced assemblies.
    ///
    /// # Errors
    /// Returns an error if the path does not exist or is not a directory.
    pub fn with_probe_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::Error(format!(
                "Probe path does not exist or is not a directory: {}",
                path.display()
            )));
        }
        self.probe_paths.push(path.to_path_buf());
        Ok(self)
    }

    /// Add a registry root, searched after the probe paths.
    ///
    /// # Errors
    /// Returns an error if the path does not exist or is not a directory.
    pub fn with_registry_root<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::Error(format!(
                "Registry root does not exist or is not a directory: {}",
                path.display()
            )));
        }
        self.registry_roots.push(path.to_path_buf());
        Ok(self)
    }

    /// Also search the system assembly cache (see [`DirectoryRegistry::system`]).
    #[must_use]
    pub fn system_registry(mut self, enabled: bool) -> Self {
        self.system_registry = enabled;
        self
    }

    /// Resolve through `loader` instead of the configured probing loader.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn AssemblyLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Read the project and bind its references to the loader.
    ///
    /// # Errors
    /// Returns an error if neither a project file nor a dependency was given, or if the
    /// project file cannot be read.
    pub fn build(self) -> Result<ProjectDefinition> {
        if self.project_file.is_none() && self.dependency_files.is_empty() {
            return Err(Error::Error(
                "No project specified. Use project_file() or with_dependency().".to_string(),
            ));
        }

        let loader = match &self.loader {
            Some(loader) => Arc::clone(loader),
            None => self.probing_loader(),
        };

        let mut project = match &self.project_file {
            Some(path) => ProjectDefinition::from_file(path, Arc::clone(&loader))?,
            None => ProjectDefinition::new(Vec::new()),
        };

        project.references.extend(self.dependency_files.iter().map(|path| {
            Arc::new(AssemblyReference::from_path(path, Arc::clone(&loader)))
        }));

        Ok(project)
    }

    fn probing_loader(&self) -> Arc<dyn AssemblyLoader> {
        let mut probe_paths = self.probe_paths.clone();
        if probe_paths.is_empty() {
            let project_dir = self
                .project_file
                .as_deref()
                .and_then(Path::parent)
                .map(|dir| {
                    if dir.as_os_str().is_empty() {
                        PathBuf::from(".")
                    } else {
                        dir.to_path_buf()
                    }
                });
            probe_paths.extend(project_dir);
        }

        let mut registry = if self.system_registry {
            DirectoryRegistry::system()
        } else {
            DirectoryRegistry::new()
        };
        for root in &self.registry_roots {
            registry = registry.with_root(root);
        }

        let mut loader = ProbingLoader::new().with_registry(registry);
        for path in probe_paths {
            loader = loader.with_probe_path(path);
        }

        log::debug!(
            "Probing {:?}, registry roots {:?}",
            loader.probe_paths(),
            self.registry_roots
        );
        Arc::new(loader)
    }
}
