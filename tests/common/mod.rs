//! Text fixtures standing in for assembly images.
//!
//! A fixture file describes one assembly:
//!
//! ```text
//! LibA, Version=1.0.0.0
//! key 0024000004800000
//! -> LibB, Version=1.0
//! ```
//!
//! The first line is the identity, an optional `key` line holds the public key in hex and
//! every `->` line declares a reference. [`FixtureLoader`] serves `<dir>/<Name>.asm` for
//! exact loads and `<dir>/registry/<Name>.asm` for partial loads.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use refscope::{
    metadata::identity::{AssemblyIdentity, AssemblyName, Identity},
    resolution::{AssemblyLoader, LoadedAssembly},
    Error, Result,
};

fn bad_fixture(path: &Path, message: &str) -> Error {
    Error::Malformed {
        message: format!("{}: {}", path.display(), message),
        file: file!(),
        line: line!(),
    }
}

/// Parse fixture text into an assembly.
pub fn parse_fixture(text: &str, path: &Path) -> Result<LoadedAssembly> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| bad_fixture(path, "missing identity"))?;

    let mut identity = AssemblyIdentity::parse(header)?;
    let mut public_key = Vec::new();
    let mut references = Vec::new();

    for line in lines {
        if let Some(key) = line.strip_prefix("key ") {
            public_key = hex::decode(key.trim()).map_err(|_| bad_fixture(path, "bad key"))?;
            identity.strong_name = Some(Identity::PubKey(public_key.clone()));
        } else if let Some(reference) = line.strip_prefix("->") {
            references.push(AssemblyName::parse(reference.trim())?);
        } else {
            return Err(bad_fixture(path, line));
        }
    }

    Ok(LoadedAssembly::new(identity, public_key, references).with_location(path))
}

/// Loads text fixtures and counts loads per file.
pub struct FixtureLoader {
    dir: PathBuf,
    loads: Mutex<HashMap<PathBuf, usize>>,
}

impl FixtureLoader {
    pub fn new(dir: &Path) -> Arc<Self> {
        Arc::new(FixtureLoader {
            dir: dir.to_path_buf(),
            loads: Mutex::new(HashMap::new()),
        })
    }

    /// How often `file_name` (relative to the fixture directory) was read
    pub fn loads_of(&self, file_name: &str) -> usize {
        self.loads
            .lock()
            .unwrap()
            .get(&self.dir.join(file_name))
            .copied()
            .unwrap_or_default()
    }

    fn load_from(&self, path: &Path) -> Result<Arc<LoadedAssembly>> {
        let data = self.read_file(path)?;
        self.load_image(data, path)
    }
}

impl AssemblyLoader for FixtureLoader {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let data = fs::read(path)?;
        *self
            .loads
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        Ok(data)
    }

    fn load_image(&self, data: Vec<u8>, path: &Path) -> Result<Arc<LoadedAssembly>> {
        let text = String::from_utf8(data).map_err(|_| bad_fixture(path, "not text"))?;
        Ok(Arc::new(parse_fixture(&text, path)?))
    }

    fn load_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        let path = self.dir.join(format!("{}.asm", name.name));
        if !path.is_file() {
            return Err(Error::AssemblyNotFound(name.display_name()));
        }

        let assembly = self.load_from(&path)?;
        if name.matches(assembly.identity()) {
            Ok(assembly)
        } else {
            Err(Error::LoadConflict {
                requested: name.display_name(),
                found: assembly.identity().display_name(),
            })
        }
    }

    fn load_partial_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        let path = self.dir.join("registry").join(format!("{}.asm", name.name));
        if !path.is_file() {
            return Err(Error::AssemblyNotFound(name.display_name()));
        }
        self.load_from(&path)
    }
}

/// Write a fixture file below `dir`, creating parent directories.
pub fn write_fixture(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, text)?;
    Ok(path)
}
