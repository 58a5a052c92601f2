//! MSBuild project files as the starting point of a walk.
//!
//! A [`ProjectDefinition`] holds the references a project declares. They are read from
//! `<Reference>` items:
//!
//! ```xml
//! <ItemGroup>
//!   <Reference Include="System.Xml" />
//!   <Reference Include="LibA">
//!     <HintPath>..\lib\LibA.dll</HintPath>
//!   </Reference>
//! </ItemGroup>
//! ```
//!
//! An item with a `HintPath` becomes a path reference, resolved relative to the project
//! directory. Every other item becomes a name reference built from its `Include`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refscope::project::ProjectLoader;
//!
//! let project = ProjectLoader::new()
//!     .project_file("App/App.csproj")?
//!     .with_probe_path("App/bin/Debug")?
//!     .system_registry(true)
//!     .build()?;
//!
//! let collected = project.collect_references(None)?;
//! println!("{} assemblies referenced", collected.len());
//! # Ok::<(), refscope::Error>(())
//! ```

mod loader;

pub use loader::ProjectLoader;

use std::{
    path::{Path, PathBuf, MAIN_SEPARATOR_STR},
    sync::Arc,
};

use quick_xml::{events::Event, Reader};

use crate::{
    metadata::identity::AssemblyName,
    resolution::{
        collect_transitive_references, AssemblyLoader, AssemblyReference, CollectedReferences,
        ReferenceWalker,
    },
    Result,
};

/// A reference as written in a project file, before it is bound to a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredReference {
    /// `<HintPath>`, made absolute against the project directory
    Path(PathBuf),
    /// `Include` of an item without a hint path
    Name(AssemblyName),
}

impl DeclaredReference {
    /// Bind the declaration to `loader`.
    pub fn into_reference(self, loader: Arc<dyn AssemblyLoader>) -> AssemblyReference {
        match self {
            DeclaredReference::Path(path) => AssemblyReference::from_path(path, loader),
            DeclaredReference::Name(name) => AssemblyReference::from_name(name, loader),
        }
    }
}

/// Read the `<Reference>` items of an MSBuild project.
///
/// `base_dir` is the directory hint paths are relative to. Backslashes in hint paths are
/// treated as separators on every platform.
///
/// # Errors
/// Returns [`crate::Error::XmlError`] for invalid XML, or [`crate::Error::Malformed`] for an
/// item with an empty or unparsable `Include`.
pub fn read_references(xml: &str, base_dir: &Path) -> Result<Vec<DeclaredReference>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut declared = Vec::new();
    let mut item: Option<(String, Option<String>)> = None;
    let mut in_hint_path = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) if element.local_name().as_ref() == b"Reference" => {
                item = Some((include(&element)?, None));
            }
            Event::Empty(element) if element.local_name().as_ref() == b"Reference" => {
                declared.push(declare(&include(&element)?, None, base_dir)?);
            }
            Event::Start(element) if element.local_name().as_ref() == b"HintPath" => {
                in_hint_path = item.is_some();
            }
            Event::Text(text) if in_hint_path => {
                if let Some((_, hint_path)) = item.as_mut() {
                    *hint_path = Some(text.unescape()?.into_owned());
                }
            }
            Event::End(element) if element.local_name().as_ref() == b"HintPath" => {
                in_hint_path = false;
            }
            Event::End(element) if element.local_name().as_ref() == b"Reference" => {
                if let Some((include, hint_path)) = item.take() {
                    declared.push(declare(&include, hint_path.as_deref(), base_dir)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(declared)
}

fn include(element: &quick_xml::events::BytesStart) -> Result<String> {
    let attribute = element
        .try_get_attribute("Include")
        .map_err(quick_xml::Error::from)?;

    match attribute {
        Some(attribute) => Ok(attribute.unescape_value()?.trim().to_string()),
        None => Err(malformed_error!("<Reference> without Include attribute")),
    }
}

fn declare(include: &str, hint_path: Option<&str>, base_dir: &Path) -> Result<DeclaredReference> {
    match hint_path.map(str::trim).filter(|hint| !hint.is_empty()) {
        Some(hint) => Ok(DeclaredReference::Path(
            base_dir.join(hint.replace('\\', MAIN_SEPARATOR_STR)),
        )),
        None => Ok(DeclaredReference::Name(AssemblyName::parse(include)?)),
    }
}

/// The declared references of a project, bound to a loader.
pub struct ProjectDefinition {
    path: Option<PathBuf>,
    references: Vec<Arc<AssemblyReference>>,
}

impl ProjectDefinition {
    /// A project made of an explicit reference list.
    #[must_use]
    pub fn new(references: Vec<Arc<AssemblyReference>>) -> Self {
        ProjectDefinition {
            path: None,
            references,
        }
    }

    /// Read the project file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, or any error of
    /// [`read_references`].
    pub fn from_file(path: &Path, loader: Arc<dyn AssemblyLoader>) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut project = Self::parse(&xml, base_dir, loader)?;
        project.path = Some(path.to_path_buf());
        Ok(project)
    }

    /// Read a project from its XML text; hint paths are relative to `base_dir`.
    ///
    /// # Errors
    /// See [`read_references`].
    pub fn parse(xml: &str, base_dir: &Path, loader: Arc<dyn AssemblyLoader>) -> Result<Self> {
        let references = read_references(xml, base_dir)?
            .into_iter()
            .map(|declared| Arc::new(declared.into_reference(Arc::clone(&loader))))
            .collect::<Vec<_>>();

        log::debug!("Project declares {} reference(s)", references.len());
        Ok(Self::new(references))
    }

    /// The project file, if the definition was read from disk
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The directly declared references
    #[must_use]
    pub fn references(&self) -> &[Arc<AssemblyReference>] {
        &self.references
    }

    /// Collect every assembly the project references, directly or transitively.
    ///
    /// # Errors
    /// Returns any fatal resolution error.
    pub fn collect_references(
        &self,
        include: Option<&dyn Fn(&AssemblyReference) -> bool>,
    ) -> Result<CollectedReferences> {
        collect_transitive_references(self.references.iter().cloned(), include)
    }

    /// Collect with a configured walker, for filtering and cancellation.
    ///
    /// # Errors
    /// See [`ReferenceWalker::collect`].
    pub fn collect_with(&self, walker: &ReferenceWalker) -> Result<CollectedReferences> {
        walker.collect(self.references.iter().cloned())
    }
}
