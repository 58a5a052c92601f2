use anyhow::Context;
use refscope::{
    project::ProjectLoader,
    resolution::{AssemblyReference, CancellationToken, CollectedReferences, ReferenceWalker},
};
use serde::Serialize;

use crate::{
    app::{GlobalOptions, WalkOptions},
    output::{print_output, Align, TabWriter},
};

#[derive(Serialize)]
struct ReferenceEntry {
    identity: String,
    path: Option<String>,
    signed: Option<bool>,
    registry_resident: bool,
    needs_signing: bool,
}

#[derive(Serialize)]
struct Report {
    project: String,
    references: Vec<ReferenceEntry>,
    unresolved: Vec<String>,
}

fn reference_entry(
    identity: &str,
    reference: &AssemblyReference,
) -> anyhow::Result<ReferenceEntry> {
    let signed = reference.is_signed()?;
    let registry_resident = reference.is_registry_resident();

    Ok(ReferenceEntry {
        identity: identity.to_string(),
        path: reference.path().map(|path| path.display().to_string()),
        signed,
        registry_resident,
        needs_signing: signed == Some(false) && !registry_resident,
    })
}

fn build_report(opts: &WalkOptions, collected: &CollectedReferences) -> anyhow::Result<Report> {
    let mut references = Vec::with_capacity(collected.len());
    for (identity, reference) in collected.iter() {
        let entry = reference_entry(identity, reference)?;
        if opts.unsigned_only && entry.signed != Some(false) {
            continue;
        }
        references.push(entry);
    }
    references.sort_by(|a, b| a.identity.cmp(&b.identity));

    Ok(Report {
        project: opts.project.display().to_string(),
        references,
        unresolved: collected
            .unresolved()
            .iter()
            .map(|reference| reference.literal())
            .collect(),
    })
}

fn signed_label(signed: Option<bool>) -> &'static str {
    match signed {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    }
}

/// Walk the references of `opts.project` and print them.
pub fn run(
    opts: &WalkOptions,
    global: &GlobalOptions,
    cancellation: CancellationToken,
) -> anyhow::Result<()> {
    let mut loader = ProjectLoader::new()
        .project_file(&opts.project)
        .with_context(|| format!("failed to open project: {}", opts.project.display()))?
        .system_registry(true);
    for path in &opts.probe {
        loader = loader.with_probe_path(path)?;
    }
    for root in &opts.registry {
        loader = loader.with_registry_root(root)?;
    }

    let project = loader
        .build()
        .with_context(|| format!("failed to read project: {}", opts.project.display()))?;
    log::info!(
        "{} declares {} reference(s)",
        opts.project.display(),
        project.references().len()
    );

    let mut walker = ReferenceWalker::new().cancellation(cancellation);
    if opts.skip_registry {
        walker = walker.filter(|reference| !reference.is_registry_resident());
    }

    let collected = project
        .collect_with(&walker)
        .context("failed to collect references")?;

    for reference in collected.unresolved() {
        log::warn!("Unresolved reference '{}'", reference);
    }

    let report = build_report(opts, &collected)?;
    print_output(&report, global, |report| {
        let mut table = TabWriter::new(&[
            ("Assembly", Align::Left),
            ("Signed", Align::Center),
            ("Registry", Align::Center),
            ("Path", Align::Left),
        ]);
        for entry in &report.references {
            table.row(vec![
                entry.identity.clone(),
                signed_label(entry.signed).to_string(),
                if entry.registry_resident { "yes" } else { "no" }.to_string(),
                entry.path.clone().unwrap_or_default(),
            ]);
        }
        table.print();

        let candidates = report
            .references
            .iter()
            .filter(|entry| entry.needs_signing)
            .count();
        println!();
        println!(
            "{} assemblies, {} need signing, {} unresolved",
            report.references.len(),
            candidates,
            report.unresolved.len()
        );
    })
}
