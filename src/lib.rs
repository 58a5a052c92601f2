// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

//! # refscope
//!
//! Find every .NET assembly a project depends on, directly or transitively, and tell which
//! of them lack a strong name.
//!
//! `refscope` reads the `<Reference>` items of an MSBuild project, resolves each one to an
//! assembly image (by hint path, by probing directories, or through a global assembly
//! cache style registry), reads the `AssemblyRef` table of every image it finds and keeps
//! walking until the closure is complete. The result is keyed by canonical assembly
//! identity, so diamonds and cycles are visited once, and unresolvable references are
//! reported instead of aborting the walk.
//!
//! ## Features
//!
//! - **Pure Rust metadata reader** - CLI header, metadata root, `#~` tables, `#Strings` and
//!   `#Blob` heaps, without requiring Windows or the .NET runtime
//! - **Assembly identities** - display name parsing and formatting, public key tokens
//! - **Lazy, memoized resolution** - every image is loaded at most once per reference
//! - **Classification** - signed, unsigned and registry resident references
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refscope::prelude::*;
//!
//! let project = ProjectLoader::new()
//!     .project_file("App/App.csproj")?
//!     .with_probe_path("App/bin/Debug")?
//!     .system_registry(true)
//!     .build()?;
//!
//! let collected = project.collect_references(None)?;
//! for reference in collected.signing_candidates() {
//!     println!("unsigned: {} ({:?})", reference, reference.path());
//! }
//! for reference in collected.unresolved() {
//!     println!("unresolved: {}", reference);
//! }
//! # Ok::<(), refscope::Error>(())
//! ```
//!
//! ### Reading a single image
//!
//! ```rust,no_run
//! use refscope::metadata::assemblyview::AssemblyView;
//! use std::path::Path;
//!
//! let view = AssemblyView::from_file(Path::new("LibA.dll"))?;
//! println!("{}", view.identity()?);
//! for name in view.references()? {
//!     println!("  -> {}", name);
//! }
//! # Ok::<(), refscope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Failures that only mean "this assembly
//! cannot be used" (missing file, identity conflict, malformed image) are recognised by
//! [`Error::is_recoverable`] and turn a reference into an unresolved one; everything else
//! is propagated to the caller.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use refscope::prelude::*;
///
/// let view = AssemblyView::from_file("LibA.dll".as_ref())?;
/// let identity: AssemblyIdentity = view.identity()?;
/// # Ok::<(), refscope::Error>(())
/// ```
pub mod prelude;

/// ECMA-335 metadata needed for reference resolution.
///
/// # Key Components
///
/// - [`metadata::assemblyview`] - Parsed image exposing identity and references
/// - [`metadata::cor20header`] - CLI header, strong name signature flag
/// - [`metadata::root`] - Metadata root and stream directory
/// - [`metadata::streams`] - `#Strings`, `#Blob` and `#~` streams
/// - [`metadata::tables`] - `Assembly` and `AssemblyRef` rows
/// - [`metadata::identity`] - Assembly identities, names and public key tokens
pub mod metadata;

/// Reference resolution and transitive collection.
pub mod resolution;

/// MSBuild project files.
pub mod project;

/// `refscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `refscope` Error type
///
/// See [`Error::is_recoverable`] for how resolution treats each variant.
pub use error::Error;

pub use metadata::streams::{Blob, StreamHeader, Strings, TablesHeader};

pub use file::{parser::Parser, File};
