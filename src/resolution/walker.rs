//! Transitive reference collection.
//!
//! The walker performs a breadth-first traversal over [`AssemblyReference`]s. Every
//! resolved reference is keyed by the full name of its canonical identity, so an
//! assembly reachable along several paths (a diamond) or through a cycle is visited and
//! expanded exactly once. Unresolved references are recorded once per literal.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{resolution::reference::AssemblyReference, Error, Result};

/// Decides whether a reference takes part in the walk.
pub type ReferenceFilter<'a> = dyn Fn(&AssemblyReference) -> bool + 'a;

/// A shared flag to stop a running walk from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Walks sharing this token stop at their next step.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once [`CancellationToken::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The transitive closure produced by a walk.
///
/// Resolved references are keyed by the full name of their canonical identity
/// (`Name, Version=.., Culture=.., PublicKeyToken=..`). The map is unordered; references
/// that could not be resolved are kept separately in discovery order, one per literal.
#[derive(Debug, Default)]
pub struct CollectedReferences {
    resolved: HashMap<String, Arc<AssemblyReference>>,
    unresolved: Vec<Arc<AssemblyReference>>,
    unresolved_literals: HashSet<String>,
}

impl CollectedReferences {
    /// Look up a reference by canonical full name
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&Arc<AssemblyReference>> {
        self.resolved.get(identity)
    }

    /// `true` if `identity` was collected
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.resolved.contains_key(identity)
    }

    /// Number of resolved references
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// `true` if nothing was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Iterate over `(identity, reference)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<AssemblyReference>)> {
        self.resolved
            .iter()
            .map(|(identity, reference)| (identity.as_str(), reference))
    }

    /// Canonical full names of the collected references
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }

    /// References that could not be resolved, in discovery order.
    #[must_use]
    pub fn unresolved(&self) -> &[Arc<AssemblyReference>] {
        &self.unresolved
    }

    /// Resolved references whose assembly carries no public key.
    pub fn unsigned(&self) -> impl Iterator<Item = &Arc<AssemblyReference>> {
        self.resolved
            .values()
            .filter(|reference| is_unsigned(reference))
    }

    /// References declared by bare name, expected to come from the system registry.
    pub fn registry_resident(&self) -> impl Iterator<Item = &Arc<AssemblyReference>> {
        self.resolved
            .values()
            .filter(|reference| reference.is_registry_resident())
    }

    /// Unsigned references that are not registry resident: what a signing step would
    /// have to sign.
    pub fn signing_candidates(&self) -> impl Iterator<Item = &Arc<AssemblyReference>> {
        self.unsigned()
            .filter(|reference| !reference.is_registry_resident())
    }
}

/// Collected references are always resolved, so the memoized artifact is present.
fn is_unsigned(reference: &AssemblyReference) -> bool {
    reference
        .artifact()
        .is_some_and(|assembly| !assembly.is_signed())
}

impl<'a> IntoIterator for &'a CollectedReferences {
    type Item = (&'a String, &'a Arc<AssemblyReference>);
    type IntoIter = std::collections::hash_map::Iter<'a, String, Arc<AssemblyReference>>;

    fn into_iter(self) -> Self::IntoIter {
        self.resolved.iter()
    }
}

/// Breadth-first collector of transitive references.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use refscope::resolution::{
///     AssemblyReference, CancellationToken, ProbingLoader, ReferenceWalker,
/// };
///
/// let loader = Arc::new(ProbingLoader::new().with_probe_path("bin"));
/// let initial = vec![Arc::new(AssemblyReference::from_path("bin/App.exe", loader))];
///
/// let collected = ReferenceWalker::new()
///     .filter(|reference| !reference.is_registry_resident())
///     .cancellation(CancellationToken::new())
///     .collect(initial)?;
///
/// for (identity, reference) in collected.iter() {
///     println!("{identity} -> {:?}", reference.path());
/// }
/// # Ok::<(), refscope::Error>(())
/// ```
#[derive(Default)]
pub struct ReferenceWalker<'a> {
    filter: Option<Box<ReferenceFilter<'a>>>,
    cancellation: Option<CancellationToken>,
}

impl<'a> ReferenceWalker<'a> {
    /// A walker that includes everything and cannot be cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only follow references accepted by `filter`, at every depth.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&AssemblyReference) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Stop with [`Error::Cancelled`] once `token` is cancelled.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Walk from `initial` and return the transitive closure.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if cancelled, or any fatal resolution error.
    pub fn collect(
        &self,
        initial: impl IntoIterator<Item = Arc<AssemblyReference>>,
    ) -> Result<CollectedReferences> {
        let included = |reference: &AssemblyReference| {
            self.filter.as_ref().is_none_or(|filter| filter(reference))
        };

        let mut queue: VecDeque<_> = initial
            .into_iter()
            .filter(|reference| included(reference))
            .collect();
        let mut collected = CollectedReferences::default();

        while let Some(reference) = queue.pop_front() {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                return Err(Error::Cancelled);
            }

            let literal = reference.literal();
            if collected.unresolved_literals.contains(&literal) {
                continue;
            }

            let Some(identity) = reference.canonical_identity()? else {
                log::debug!("Unresolved reference '{}'", literal);
                collected.unresolved_literals.insert(literal);
                collected.unresolved.push(reference);
                continue;
            };

            let key = identity.full_name();
            if collected.resolved.contains_key(&key) {
                continue;
            }

            if let Some(children) = reference.references()? {
                log::debug!("'{}' declares {} reference(s)", key, children.len());
                queue.extend(
                    children
                        .iter()
                        .filter(|child| included(child))
                        .cloned(),
                );
            }

            collected.resolved.insert(key, reference);
        }

        Ok(collected)
    }
}

impl fmt::Debug for ReferenceWalker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceWalker")
            .field("filter", &self.filter.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

/// Collect the transitive closure of `initial`, following only references accepted by
/// `include` when given.
///
/// # Errors
/// Returns any fatal resolution error.
pub fn collect_transitive_references(
    initial: impl IntoIterator<Item = Arc<AssemblyReference>>,
    include: Option<&dyn Fn(&AssemblyReference) -> bool>,
) -> Result<CollectedReferences> {
    let mut walker = ReferenceWalker::new();
    if let Some(include) = include {
        walker = walker.filter(include);
    }
    walker.collect(initial)
}
