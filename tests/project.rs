mod common;

use std::sync::Arc;

use common::{write_fixture, FixtureLoader};
use refscope::{
    project::{DeclaredReference, ProjectDefinition, ProjectLoader},
    Result,
};

const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net48</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="libA">
      <HintPath>lib\libA.bin</HintPath>
    </Reference>
    <Reference Include="LibB, Version=1.0" />
    <Reference Include="System.Core" />
  </ItemGroup>
</Project>"#;

#[test]
fn project_file_to_collected_references() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let project_path = write_fixture(dir.path(), "App.csproj", PROJECT)?;
    write_fixture(dir.path(), "lib/libA.bin", "LibA, Version=1.0\n-> LibB, Version=1.0")?;
    write_fixture(dir.path(), "LibB.asm", "LibB, Version=1.0")?;

    let loader = FixtureLoader::new(dir.path());
    let project = ProjectDefinition::from_file(&project_path, loader.clone())?;

    assert_eq!(project.references().len(), 3);
    assert_eq!(
        project.references()[0].declared_path(),
        Some(dir.path().join("lib").join("libA.bin").as_path())
    );
    assert!(project.references()[2].is_registry_resident());

    let collected = project.collect_references(None)?;
    assert_eq!(collected.len(), 2);
    assert_eq!(collected.unresolved().len(), 1);
    assert_eq!(collected.unresolved()[0].literal(), "System.Core");
    assert_eq!(loader.loads_of("LibB.asm"), 2);

    let skip_registry = |reference: &refscope::resolution::AssemblyReference| {
        !reference.is_registry_resident()
    };
    let collected = project.collect_references(Some(&skip_registry))?;
    assert_eq!(collected.len(), 2);
    assert!(collected.unresolved().is_empty());
    Ok(())
}

#[test]
fn loader_builder_with_custom_loader() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let project_path = write_fixture(dir.path(), "App.csproj", PROJECT)?;
    let loader = FixtureLoader::new(dir.path());

    let project = ProjectLoader::new()
        .project_file(&project_path)?
        .with_loader(loader)
        .build()?;

    assert_eq!(project.path(), Some(project_path.as_path()));
    let collected = project.collect_references(None)?;
    assert!(collected.is_empty());
    assert_eq!(collected.unresolved().len(), 3);
    Ok(())
}

#[test]
fn declared_references_from_text() -> Result<()> {
    let declared = refscope::project::read_references(PROJECT, "/work".as_ref())?;

    assert!(matches!(&declared[0], DeclaredReference::Path(path) if path.ends_with("libA.bin")));
    assert!(matches!(&declared[2], DeclaredReference::Name(name) if name.name == "System.Core"));

    let explicit = ProjectDefinition::new(vec![Arc::new(
        declared[1]
            .clone()
            .into_reference(FixtureLoader::new("/work".as_ref())),
    )]);
    assert_eq!(explicit.references()[0].literal(), "LibB, Version=1.0.0.0");
    Ok(())
}
