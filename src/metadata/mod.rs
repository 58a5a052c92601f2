//! Metadata parsing for .NET assemblies.
//!
//! Only the parts of ECMA-335 that describe an assembly's identity and its outbound
//! references are read: the CLI header, the metadata root, the `#Strings` and `#Blob`
//! heaps, and the `Assembly` and `AssemblyRef` tables of the `#~` stream. Row sizes of all
//! other tables are still computed so that the two tables can be located.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refscope::metadata::assemblyview::AssemblyView;
//!
//! let view = AssemblyView::from_file("LibA.dll".as_ref())?;
//! let identity = view.identity()?;
//! println!("{} signed: {}", identity, view.is_strong_name_signed());
//! # Ok::<(), refscope::Error>(())
//! ```

/// Parsed image exposing identity, public key and references
pub mod assemblyview;
/// Implementation of the Header of CIL
pub mod cor20header;
/// Assembly identities, names and public key tokens
pub mod identity;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of the physical metadata streams
pub mod streams;
/// Implementation of the metadata tables
pub mod tables;
