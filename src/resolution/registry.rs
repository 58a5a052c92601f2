//! System-wide assembly registries.
//!
//! A registry answers one question: which files might contain an assembly with a given
//! simple name. [`DirectoryRegistry`] understands the global assembly cache layout
//!
//! ```text
//! <root>/<Name>/<[v4.0_]Version>_<Culture>_<PublicKeyToken>/<Name>.dll
//! ```
//!
//! as well as flat directories holding `<Name>.dll` directly, which is how reference
//! assembly packs are laid out.

use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};

use crate::metadata::identity::AssemblyVersion;

/// A source of candidate files for name-based resolution.
pub trait AssemblyRegistry: Send + Sync {
    /// Candidate files for `simple_name`, most preferred first.
    ///
    /// Returning a file does not promise it matches; the loader verifies the identity.
    fn candidates(&self, simple_name: &str) -> Vec<PathBuf>;
}

/// A registry backed by one or more directory trees.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRegistry {
    roots: Vec<PathBuf>,
}

impl DirectoryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `root` as well.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// The well-known global assembly cache locations of this machine.
    ///
    /// Directories that do not exist are dropped, so this is empty on hosts without a
    /// .NET Framework installation.
    #[must_use]
    pub fn system() -> Self {
        let mut roots = Vec::new();

        if let Some(windir) = std::env::var_os("WINDIR") {
            let windir = PathBuf::from(windir);
            for gac in ["GAC_MSIL", "GAC_32", "GAC_64", "GAC"] {
                roots.push(windir.join("Microsoft.NET").join("assembly").join(gac));
                roots.push(windir.join("assembly").join(gac));
            }
        }
        roots.push(PathBuf::from("/usr/lib/mono/gac"));
        roots.push(PathBuf::from("/usr/local/lib/mono/gac"));

        roots.retain(|root| root.is_dir());
        DirectoryRegistry { roots }
    }

    /// The searched roots
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn cache_candidates(
        root: &Path,
        simple_name: &str,
        found: &mut Vec<(Option<AssemblyVersion>, PathBuf)>,
    ) {
        let Some(name_dir) = find_entry(root, simple_name, true) else {
            return;
        };
        let Ok(entries) = fs::read_dir(&name_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let version_dir = entry.path();
            if !version_dir.is_dir() {
                continue;
            }

            let Some(file) = find_entry(&version_dir, &format!("{simple_name}.dll"), false)
            else {
                continue;
            };

            let version = entry
                .file_name()
                .to_str()
                .and_then(parse_cache_directory)
                .map(|(version, _, _)| version);
            found.push((version, file));
        }
    }
}

impl AssemblyRegistry for DirectoryRegistry {
    fn candidates(&self, simple_name: &str) -> Vec<PathBuf> {
        if !is_plain_simple_name(simple_name) {
            log::debug!("Refusing to look up '{}' in the registry", simple_name);
            return Vec::new();
        }

        let mut found = Vec::new();

        for root in &self.roots {
            Self::cache_candidates(root, simple_name, &mut found);

            if let Some(file) = find_entry(root, &format!("{simple_name}.dll"), false) {
                found.push((None, file));
            }
        }

        // Stable sort keeps root order between equal versions
        found.sort_by_key(|(version, _)| Reverse(*version));
        log::debug!(
            "Registry has {} candidate(s) for '{}'",
            found.len(),
            simple_name
        );

        found.into_iter().map(|(_, path)| path).collect()
    }
}

/// `true` if `simple_name` can be used as a single file name component.
///
/// Names read from metadata are untrusted; separators, drive colons and `.`/`..` would
/// let a lookup leave the searched directory.
#[must_use]
pub fn is_plain_simple_name(simple_name: &str) -> bool {
    !simple_name.is_empty()
        && simple_name != "."
        && simple_name != ".."
        && !simple_name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
}

/// Split a cache directory name into version, culture and token text.
///
/// Accepts both `1.0.0.0_neutral_b77a5c561934e089` and the `v4.0_` prefixed form used by
/// the .NET 4 cache. Culture and token may be empty.
#[must_use]
pub fn parse_cache_directory(name: &str) -> Option<(AssemblyVersion, &str, &str)> {
    let name = name.strip_prefix("v4.0_").unwrap_or(name);

    let mut parts = name.splitn(3, '_');
    let version = AssemblyVersion::parse(parts.next()?).ok()?;
    let culture = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();

    Some((version, culture, token))
}

/// Look up `name` in `dir`, ignoring ASCII case.
fn find_entry(dir: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
    let exact = dir.join(name);
    if (want_dir && exact.is_dir()) || (!want_dir && exact.is_file()) {
        return Some(exact);
    }

    fs::read_dir(dir).ok()?.flatten().find_map(|entry| {
        let path = entry.path();
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|file_name| file_name.eq_ignore_ascii_case(name));
        let kind_matches = if want_dir { path.is_dir() } else { path.is_file() };

        (matches && kind_matches).then_some(path)
    })
}
