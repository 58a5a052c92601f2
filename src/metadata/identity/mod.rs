//! Assembly identities, declared names and strong name keys.
//!
//! - [`AssemblyIdentity`] - what an assembly is, read from its manifest
//! - [`AssemblyName`] - what a reference asks for, possibly partial
//! - [`Identity`] - a public key or public key token
//!
//! # Reference
//! * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.6.2.1.3, II.22.2, II.22.5

pub mod assembly;
pub mod cryptographic;
pub mod name;

pub use assembly::{AssemblyIdentity, AssemblyVersion, ProcessorArchitecture};
pub use cryptographic::Identity;
pub use name::AssemblyName;
