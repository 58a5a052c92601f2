//! # refscope Prelude
//!
//! The types needed to read a project, walk its references and inspect the result.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all refscope operations
pub use crate::Error;

/// The result type used throughout refscope
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata
// ================================================================================================

/// Parsed assembly image
pub use crate::metadata::assemblyview::AssemblyView;

/// Assembly identity types
pub use crate::metadata::identity::{
    AssemblyIdentity, AssemblyName, AssemblyVersion, Identity, ProcessorArchitecture,
};

/// Raw manifest rows
pub use crate::metadata::tables::{Assembly, AssemblyFlags, AssemblyRef};

// ================================================================================================
// Resolution
// ================================================================================================

/// Loading and resolving references
pub use crate::resolution::{
    collect_transitive_references, AssemblyLoader, AssemblyReference, AssemblyRegistry,
    CancellationToken, CollectedReferences, DirectoryRegistry, LoadedAssembly, ProbingLoader,
    ReferenceWalker,
};

/// Project files
pub use crate::project::{DeclaredReference, ProjectDefinition, ProjectLoader};
