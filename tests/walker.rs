mod common;

use std::sync::Arc;

use common::{write_fixture, FixtureLoader};
use refscope::{
    metadata::identity::AssemblyName,
    resolution::{
        collect_transitive_references, AssemblyLoader, AssemblyReference, CancellationToken,
        ReferenceWalker,
    },
    Error, Result,
};

fn name_ref(text: &str, loader: &Arc<FixtureLoader>) -> Result<Arc<AssemblyReference>> {
    let loader: Arc<dyn AssemblyLoader> = loader.clone();
    Ok(Arc::new(AssemblyReference::from_name(
        AssemblyName::parse(text)?,
        loader,
    )))
}

const LIB_B: &str = "LibB, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null";

#[test]
fn project_with_shared_dependency() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let lib_a = write_fixture(
        dir.path(),
        "libA.bin",
        "LibA, Version=2.1.0.0\nkey 00240000048000009400\n-> LibB, Version=1.0",
    )?;
    write_fixture(dir.path(), "LibB.asm", "LibB, Version=1.0.0.0")?;

    let loader = FixtureLoader::new(dir.path());
    let dyn_loader: Arc<dyn AssemblyLoader> = loader.clone();
    let initial = vec![
        Arc::new(AssemblyReference::from_path(&lib_a, dyn_loader)),
        name_ref("LibB, Version=1.0", &loader)?,
    ];

    let collected = collect_transitive_references(initial, None)?;

    assert_eq!(collected.len(), 2);
    let lib_b = collected.get(LIB_B).expect("LibB collected");
    assert_eq!(lib_b.is_signed()?, Some(false));
    assert!(!lib_b.is_registry_resident());

    let (_, lib_a_ref) = collected
        .iter()
        .find(|(identity, _)| identity.starts_with("LibA, Version=2.1.0.0"))
        .expect("LibA collected");
    assert_eq!(lib_a_ref.is_signed()?, Some(true));
    assert_eq!(lib_a_ref.path(), Some(lib_a.as_path()));

    let candidates: Vec<_> = collected.signing_candidates().collect();
    assert_eq!(candidates.len(), 1);
    assert_eq!(loader.loads_of("libA.bin"), 1);
    Ok(())
}

#[test]
fn cycles_and_diamonds() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), "A.asm", "A, Version=1.0\n-> B\n-> C")?;
    write_fixture(dir.path(), "B.asm", "B, Version=1.0\n-> D")?;
    write_fixture(dir.path(), "C.asm", "C, Version=1.0\n-> D\n-> A")?;
    write_fixture(dir.path(), "D.asm", "D, Version=1.0\n-> B")?;

    let loader = FixtureLoader::new(dir.path());
    let collected = collect_transitive_references(vec![name_ref("A", &loader)?], None)?;

    assert_eq!(collected.len(), 4);
    assert!(collected.unresolved().is_empty());
    let mut names: Vec<_> = collected
        .identities()
        .map(|identity| identity.split(',').next().unwrap_or_default().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["A", "B", "C", "D"]);
    Ok(())
}

#[test]
fn registry_fallback_and_unresolved() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(
        dir.path(),
        "App.asm",
        "App, Version=1.0\n-> System.Xml\n-> LibOld, Version=3.0\n-> Ghost, Version=1.0",
    )?;
    write_fixture(
        dir.path(),
        "registry/System.Xml.asm",
        "System.Xml, Version=4.0.0.0\nkey 0000000000000000",
    )?;
    write_fixture(dir.path(), "LibOld.asm", "LibOld, Version=2.0")?;
    write_fixture(dir.path(), "Broken.asm", "not a fixture, Version=x")?;

    let loader = FixtureLoader::new(dir.path());
    let initial = vec![name_ref("App", &loader)?, name_ref("Broken", &loader)?];
    let collected = collect_transitive_references(initial, None)?;

    assert_eq!(collected.len(), 2);
    let xml = collected
        .iter()
        .find(|(identity, _)| identity.starts_with("System.Xml,"))
        .map(|(_, reference)| reference)
        .expect("registry assembly collected");
    assert!(xml.is_registry_resident());
    assert_eq!(xml.is_signed()?, Some(true));

    let unresolved: Vec<_> = collected
        .unresolved()
        .iter()
        .map(|reference| reference.literal())
        .collect();
    assert_eq!(
        unresolved,
        ["Broken", "LibOld, Version=3.0.0.0", "Ghost, Version=1.0.0.0"]
    );
    Ok(())
}

#[test]
fn filter_and_cancellation() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), "A.asm", "A, Version=1.0\n-> B\n-> System")?;
    write_fixture(dir.path(), "B.asm", "B, Version=1.0")?;
    write_fixture(dir.path(), "registry/System.asm", "System, Version=4.0")?;

    let loader = FixtureLoader::new(dir.path());
    let seeds = vec![name_ref("A, Version=1.0", &loader)?];

    let collected = ReferenceWalker::new()
        .filter(|reference| !reference.is_registry_resident())
        .collect(seeds.clone())?;
    assert_eq!(collected.len(), 1);
    assert_eq!(loader.loads_of("B.asm"), 0);
    assert_eq!(loader.loads_of("registry/System.asm"), 0);

    let token = CancellationToken::new();
    token.cancel();
    let result = ReferenceWalker::new().cancellation(token).collect(seeds);
    assert!(matches!(result, Err(Error::Cancelled)));
    Ok(())
}
