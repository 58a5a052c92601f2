#![allow(unused)]
extern crate refscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use refscope::{
    metadata::identity::{AssemblyIdentity, AssemblyName, AssemblyVersion},
    resolution::{
        collect_transitive_references, AssemblyLoader, AssemblyReference, LoadedAssembly,
    },
    Error, Result,
};
use std::{collections::HashMap, hint::black_box, sync::Arc};

/// An in-memory layered graph: every assembly in layer `n` references every assembly in
/// layer `n + 1`, which produces many diamonds.
struct LayeredLoader {
    assemblies: HashMap<String, Arc<LoadedAssembly>>,
}

impl LayeredLoader {
    fn new(layers: usize, width: usize) -> Self {
        let mut assemblies = HashMap::new();
        for layer in 0..layers {
            for index in 0..width {
                let name = format!("L{layer}N{index}");
                let references = if layer + 1 < layers {
                    (0..width)
                        .map(|next| AssemblyName::new(format!("L{}N{next}", layer + 1)))
                        .collect()
                } else {
                    Vec::new()
                };
                let identity = AssemblyIdentity::new(
                    name.clone(),
                    AssemblyVersion::new(1, 0, 0, 0),
                    None,
                    None,
                    None,
                );
                assemblies.insert(
                    name,
                    Arc::new(LoadedAssembly::new(identity, Vec::new(), references)),
                );
            }
        }
        LayeredLoader { assemblies }
    }
}

impl AssemblyLoader for LayeredLoader {
    fn load_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        self.assemblies
            .get(&name.name)
            .cloned()
            .ok_or_else(|| Error::AssemblyNotFound(name.name.clone()))
    }

    fn load_partial_name(&self, name: &AssemblyName) -> Result<Arc<LoadedAssembly>> {
        Err(Error::AssemblyNotFound(name.name.clone()))
    }
}

/// Benchmark a full walk over layered graphs of growing width.
///
/// References are created fresh for every iteration, so each walk pays for resolution
/// and deduplication of every diamond.
fn bench_layered_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walker_layered");
    for width in [4usize, 16, 32] {
        let loader: Arc<dyn AssemblyLoader> = Arc::new(LayeredLoader::new(6, width));

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let initial: Vec<_> = (0..width)
                    .map(|index| {
                        Arc::new(AssemblyReference::from_name(
                            AssemblyName::new(format!("L0N{index}")),
                            Arc::clone(&loader),
                        ))
                    })
                    .collect();
                let collected = collect_transitive_references(initial, None).unwrap();
                black_box(collected.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layered_walk);
criterion_main!(benches);
