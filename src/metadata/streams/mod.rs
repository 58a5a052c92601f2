//! Metadata streams: the tables stream and the heaps it indexes into.
//!
//! Resolution only needs three of them. `#~` locates the `Assembly` and `AssemblyRef` rows,
//! `#Strings` holds names and cultures, and `#Blob` holds public keys and tokens.
//!
//! # Reference
//! * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2

mod blob;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::Blob;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
