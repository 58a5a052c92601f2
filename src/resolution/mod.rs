//! Reference resolution and transitive collection.
//!
//! This module ties the metadata layer to the filesystem:
//!
//! - [`AssemblyLoader`] turns paths and names into [`LoadedAssembly`] values,
//!   [`ProbingLoader`] being the default implementation
//! - [`AssemblyRegistry`] supplies candidates for name lookups, see [`DirectoryRegistry`]
//! - [`AssemblyReference`] is one lazily resolved dependency
//! - [`ReferenceWalker`] collects the transitive closure of a set of references
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use refscope::resolution::{
//!     collect_transitive_references, AssemblyReference, DirectoryRegistry, ProbingLoader,
//! };
//!
//! let loader = Arc::new(
//!     ProbingLoader::new()
//!         .with_probe_path("bin/Release")
//!         .with_registry(DirectoryRegistry::system()),
//! );
//! let app = Arc::new(AssemblyReference::from_path("bin/Release/App.exe", loader));
//!
//! let collected = collect_transitive_references(vec![app], None)?;
//! for reference in collected.signing_candidates() {
//!     println!("needs signing: {}", reference);
//! }
//! # Ok::<(), refscope::Error>(())
//! ```

pub mod loader;
pub mod reference;
pub mod registry;
pub mod walker;

pub use loader::{AssemblyLoader, LoadedAssembly, ProbingLoader};
pub use reference::AssemblyReference;
pub use registry::{AssemblyRegistry, DirectoryRegistry};
pub use walker::{
    collect_transitive_references, CancellationToken, CollectedReferences, ReferenceFilter,
    ReferenceWalker,
};
