use crate::{file::parser::Parser, Result};

/// A stream header provides the names, and the position and length of a particular table or heap.
/// The length of a stream header structure is not fixed, but depends on the length of its name
/// field (a variable length null-terminated string).
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Memory offset to start of this stream from start of the metadata root
    pub offset: u32,
    /// Size of this stream in bytes, shall be a multiple of 4
    pub size: u32,
    /// Name of the stream as null-terminated variable length array of ASCII characters, padded to
    /// the next 4-byte boundary with \0 characters
    pub name: String,
}

impl StreamHeader {
    /// Read a [`StreamHeader`] at the current position of `parser`, leaving the parser on the
    /// next 4-byte boundary after the name.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input, or
    /// [`crate::Error::Malformed`] for an unreasonable stream name.
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;
        let name = parser.read_string_utf8()?;
        parser.align(4)?;

        if name.is_empty() || name.len() > 32 {
            return Err(malformed_error!("Invalid stream name - '{}'", name));
        }

        Ok(StreamHeader { offset, size, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            b'#', b'S', b't', b'r', b'i', b'n', b'g', b's', 0x00, 0x00, 0x00, 0x00,
            0xFF,
        ];

        let mut parser = Parser::new(&header_bytes);
        let header = StreamHeader::read(&mut parser).unwrap();

        assert_eq!(header.offset, 0x6C);
        assert_eq!(header.size, 0x10);
        assert_eq!(header.name, "#Strings");
        assert_eq!(parser.pos(), 20);
    }

    #[test]
    fn empty_name() {
        let header_bytes = [0x6C, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0, 0];
        let mut parser = Parser::new(&header_bytes);
        assert!(StreamHeader::read(&mut parser).is_err());
    }
}
