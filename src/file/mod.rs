//! PE container for .NET assembly images.
//!
//! This module wraps [`goblin`]'s PE parser in a self-referencing [`File`] that owns the raw
//! image bytes alongside the parsed headers. It only keeps what assembly resolution needs:
//! validation that the image carries a CLR runtime header, the location of that header,
//! and RVA to file offset mapping for locating the metadata.
//!
//! # Key Components
//!
//! - [`File`] - Owned image bytes plus parsed PE headers
//! - [`parser::Parser`] - Cursor reader for compressed integers and strings
//! - [`io`] - Bounds-checked little-endian primitives
//!
//! # Examples
//!
//! ```rust,no_run
//! use refscope::File;
//!
//! let file = File::from_file(std::path::Path::new("LibA.dll"))?;
//! let (clr_rva, clr_size) = file.clr()?;
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let header = file.data_slice(clr_offset, clr_size)?;
//! assert_eq!(header.len(), clr_size);
//! # Ok::<(), refscope::Error>(())
//! ```

pub mod io;
pub mod parser;

use std::path::Path;

use crate::{
    Error::{Empty, GoblinErr, OutOfBounds},
    Result,
};
use goblin::pe::PE;
use ouroboros::self_referencing;

#[self_referencing]
/// Represents a loaded PE file with .NET metadata.
///
/// Construction validates that the PE has an optional header and a CLR runtime header
/// data directory. Images that fail this check are reported as
/// [`crate::Error::NotSupported`] (a native PE) or a malformed/goblin error.
pub struct File {
    /// The raw image bytes.
    data: Vec<u8>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads a PE file from the given path.
    ///
    /// The whole file is read into memory, so no handle to it stays open after this returns.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be read, or any error of
    /// [`File::from_mem`].
    pub fn from_file(file: &Path) -> Result<File> {
        let data = std::fs::read(file)?;

        Self::from_mem(data)
    }

    /// Loads a PE file from a memory buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer is empty
    /// - The data is not a valid PE format
    /// - The PE file does not contain .NET metadata (missing CLR runtime header)
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        File::try_new(data, |data| match PE::parse(data) {
            Ok(pe) => match pe.header.optional_header {
                Some(optional_header) => {
                    if optional_header
                        .data_directories
                        .get_clr_runtime_header()
                        .is_none()
                    {
                        Err(crate::Error::NotSupported)
                    } else {
                        Ok(pe)
                    }
                }
                None => Err(malformed_error!("File does not have an OptionalHeader")),
            },
            Err(error) => Err(GoblinErr(error)),
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.borrow_data().len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.borrow_data().is_empty()
    }

    /// Returns the raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.borrow_data()
    }

    /// Returns a bounds-checked slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range leaves the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.borrow_data();
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };
        if end > data.len() {
            return Err(OutOfBounds);
        }

        Ok(&data[offset..end])
    }

    /// Returns the RVA and size of the CLR runtime header.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the directory is absent. Construction
    /// already rejects such images, so this only guards against a directory with a zero
    /// address.
    pub fn clr(&self) -> Result<(usize, usize)> {
        self.with_pe(|pe| {
            let optional_header = pe
                .header
                .optional_header
                .ok_or_else(|| malformed_error!("File does not have an OptionalHeader"))?;
            let clr_dir = optional_header
                .data_directories
                .get_clr_runtime_header()
                .ok_or(crate::Error::NotSupported)?;

            if clr_dir.virtual_address == 0 {
                return Err(crate::Error::NotSupported);
            }

            Ok((clr_dir.virtual_address as usize, clr_dir.size as usize))
        })
    }

    /// Converts a relative virtual address (RVA) to a file offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if no section contains the RVA.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 =
            u32::try_from(rva).map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

        self.with_pe(|pe| {
            for section in &pe.sections {
                let extent = section.virtual_size.max(section.size_of_raw_data);
                let Some(section_max) = section.virtual_address.checked_add(extent) else {
                    return Err(malformed_error!(
                        "Section malformed, causing integer overflow - {} + {}",
                        section.virtual_address,
                        extent
                    ));
                };

                if section.virtual_address <= rva_u32 && rva_u32 < section_max {
                    return Ok((rva - section.virtual_address as usize)
                        + section.pointer_to_raw_data as usize);
                }
            }

            Err(malformed_error!(
                "RVA could not be converted to offset - {}",
                rva
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ImageBuilder;

    #[test]
    fn empty_input() {
        assert!(matches!(File::from_mem(Vec::new()), Err(crate::Error::Empty)));
    }

    #[test]
    fn not_a_pe() {
        let result = File::from_mem(b"this is not a portable executable".to_vec());
        assert!(result.is_err());
        assert!(result.err().is_some_and(|e| e.is_recoverable()));
    }

    #[test]
    fn locates_clr_header() {
        let image = ImageBuilder::new("LibA").build();
        let file = File::from_mem(image).unwrap();

        let (clr_rva, clr_size) = file.clr().unwrap();
        assert_eq!(clr_rva, ImageBuilder::TEXT_RVA as usize);
        assert_eq!(clr_size, 72);

        let offset = file.rva_to_offset(clr_rva).unwrap();
        assert_eq!(offset, ImageBuilder::TEXT_FILE_OFFSET as usize);

        let header = file.data_slice(offset, 4).unwrap();
        assert_eq!(header, &72u32.to_le_bytes());
    }

    #[test]
    fn rva_outside_sections() {
        let image = ImageBuilder::new("LibA").build();
        let file = File::from_mem(image).unwrap();
        assert!(file.rva_to_offset(0x10).is_err());
    }
}
