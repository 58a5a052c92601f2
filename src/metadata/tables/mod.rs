//! Metadata tables needed for assembly identity and reference discovery.
//!
//! Only the `Assembly` and `AssemblyRef` tables are decoded into rows. Every other table is
//! known by its schema alone: its row size is computed from [`TableInfo`] so that the
//! offsets of the two tables of interest can be located inside the `#~` stream.
//!
//! # Reference
//! * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.22

use bitflags::bitflags;

mod assembly;
mod assemblyref;
mod codedindex;
mod table;
mod tableid;
mod tableinfo;

pub use assembly::{Assembly, AssemblyRaw};
pub use assemblyref::{AssemblyRef, AssemblyRefRaw};
pub use codedindex::CodedIndexType;
pub use table::{MetadataTable, RowReadable};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// `AssemblyFlags` of the `Assembly` and `AssemblyRef` tables (ECMA-335 II.23.1.2)
    pub struct AssemblyFlags : u32 {
        /// The blob holds the full public key rather than its token
        const PUBLIC_KEY = 0x0001;
        /// Processor architecture bits are present
        const PA_SPECIFIED = 0x0080;
        /// Mask of the processor architecture bits
        const PA_MASK = 0x0070;
        /// The implementation may be retargeted at runtime
        const RETARGETABLE = 0x0100;
        /// Windows Runtime content
        const WINDOWS_RUNTIME = 0x0200;
        /// Reserved
        const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
        /// Reserved
        const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
    }
}

impl AssemblyFlags {
    /// The raw processor architecture value stored in bits 4 to 6.
    #[must_use]
    pub fn processor_architecture(&self) -> u32 {
        (self.bits() & Self::PA_MASK.bits()) >> 4
    }
}

#[allow(non_snake_case)]
/// Hash algorithms referenced by `Assembly::hash_alg_id`
pub mod AssemblyHashAlgorithm {
    /// No hash
    pub const NONE: u32 = 0x0000;
    /// MD5
    pub const MD5: u32 = 0x8003;
    /// SHA-1
    pub const SHA1: u32 = 0x8004;
}
