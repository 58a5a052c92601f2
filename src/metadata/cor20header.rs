//! CLI (COR20) runtime header.
//!
//! The CLR runtime header is pointed to by data directory 14 of the PE optional header. It
//! locates the metadata root and records whether the image carries a strong name signature.
//!
//! # Reference
//! * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.25.3.3

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// `COMIMAGE_FLAGS_STRONGNAMESIGNED`: the image has a strong name signature.
pub const COMIMAGE_FLAGS_STRONGNAMESIGNED: u32 = 0x0000_0008;

/// The CLI header of a .NET image.
///
/// Only the fields needed for assembly resolution are validated; the reserved and
/// rarely used directory pairs are read so that a truncated header is detected.
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major runtime version required to run the image
    pub major_runtime_version: u16,
    /// Minor part of the runtime version
    pub minor_runtime_version: u16,
    /// RVA of the physical metadata
    pub meta_data_rva: u32,
    /// Size of the physical metadata
    pub meta_data_size: u32,
    /// `COMIMAGE_FLAGS_*` bits
    pub flags: u32,
    /// Token of the entry point method, or 0
    pub entry_point_token: u32,
    /// RVA of managed resources
    pub resource_rva: u32,
    /// Size of managed resources
    pub resource_size: u32,
    /// RVA of the strong name signature blob
    pub strong_name_signature_rva: u32,
    /// Size of the strong name signature blob
    pub strong_name_signature_size: u32,
}

impl Cor20Header {
    /// Create a [`Cor20Header`] from a sequence of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 72 bytes are supplied, or
    /// [`crate::Error::Malformed`] if the size field or metadata directory is invalid.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < 72 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != 72 {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_rva == 0 || meta_data_size == 0 {
            return Err(malformed_error!("Metadata directory cannot be empty"));
        }

        let flags = parser.read_le::<u32>()?;
        let entry_point_token = parser.read_le::<u32>()?;
        let resource_rva = parser.read_le::<u32>()?;
        let resource_size = parser.read_le::<u32>()?;
        let strong_name_signature_rva = parser.read_le::<u32>()?;
        let strong_name_signature_size = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
            resource_rva,
            resource_size,
            strong_name_signature_rva,
            strong_name_signature_size,
        })
    }

    /// Returns `true` if the image claims a strong name signature.
    ///
    /// A delay-signed assembly carries a public key but has this flag cleared.
    #[must_use]
    pub fn is_strong_name_signed(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_STRONGNAMESIGNED != 0
            && self.strong_name_signature_rva != 0
            && self.strong_name_signature_size != 0
    }
}
