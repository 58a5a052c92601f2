use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        identity::Identity,
        streams::{Blob, Strings},
        tables::{AssemblyFlags, RowReadable, TableId, TableInfoRef},
    },
    Result,
};

/// A row of the `AssemblyRef` table as stored on disk, with heap indexes unresolved.
#[derive(Clone, Debug)]
pub struct AssemblyRefRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Offset of the row inside the table data
    pub offset: usize,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    /// Raw `AssemblyFlags`; `PUBLIC_KEY` decides how `public_key_or_token` is read
    pub flags: u32,
    /// Index into the `#Blob` heap
    pub public_key_or_token: u32,
    /// Index into the `#Strings` heap
    pub name: u32,
    /// Index into the `#Strings` heap
    pub culture: u32,
    /// Index into the `#Blob` heap
    pub hash_value: u32,
}

/// A resolved reference from one assembly to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyRef {
    pub rid: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    pub flags: AssemblyFlags,
    /// Full key or token of the referenced assembly, `None` if it has no strong name
    pub identifier: Option<Identity>,
    pub name: String,
    /// `None` for the neutral culture
    pub culture: Option<String>,
    /// Hash of the referenced assembly, rarely present
    pub hash_value: Option<Vec<u8>>,
}

impl AssemblyRefRaw {
    /// Resolve heap indexes into an [`AssemblyRef`].
    ///
    /// An empty key or token blob is treated the same as a missing one.
    ///
    /// # Errors
    /// Returns an error if a heap index is out of bounds, a string is not valid UTF-8, or a
    /// token blob is shorter than 8 bytes.
    pub fn to_owned(&self, strings: &Strings, blob: &Blob) -> Result<AssemblyRef> {
        let identifier = if self.public_key_or_token == 0 {
            None
        } else {
            let data = blob.get(self.public_key_or_token as usize)?;
            if data.is_empty() {
                None
            } else {
                Some(Identity::from(
                    data,
                    self.flags & AssemblyFlags::PUBLIC_KEY.bits() != 0,
                )?)
            }
        };

        Ok(AssemblyRef {
            rid: self.rid,
            major_version: self.major_version,
            minor_version: self.minor_version,
            build_number: self.build_number,
            revision_number: self.revision_number,
            flags: AssemblyFlags::from_bits_retain(self.flags),
            identifier,
            name: strings.get(self.name as usize)?.to_string(),
            culture: if self.culture == 0 {
                None
            } else {
                Some(strings.get(self.culture as usize)?.to_string())
            },
            hash_value: if self.hash_value == 0 {
                None
            } else {
                Some(blob.get(self.hash_value as usize)?.to_vec())
            },
        })
    }
}

impl RowReadable for AssemblyRefRaw {
    const TABLE_ID: TableId = TableId::AssemblyRef;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(AssemblyRefRaw {
            rid,
            offset: *offset,
            major_version: read_le_at::<u16>(data, offset)?,
            minor_version: read_le_at::<u16>(data, offset)?,
            build_number: read_le_at::<u16>(data, offset)?,
            revision_number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u32>(data, offset)?,
            public_key_or_token: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            culture: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            hash_value: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}
