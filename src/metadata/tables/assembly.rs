use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{Blob, Strings},
        tables::{AssemblyFlags, RowReadable, TableId, TableInfoRef},
    },
    Result,
};

/// A row of the `Assembly` table as stored on disk, with heap indexes unresolved.
///
/// The table holds at most one row: the manifest of the image. A module without it is not
/// an assembly.
#[derive(Clone, Debug)]
pub struct AssemblyRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// `AssemblyHashAlgorithm` used for file hashes and the public key token
    pub hash_alg_id: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    /// Raw `AssemblyFlags`
    pub flags: u32,
    /// Index into the `#Blob` heap
    pub public_key: u32,
    /// Index into the `#Strings` heap
    pub name: u32,
    /// Index into the `#Strings` heap
    pub culture: u32,
}

/// The resolved manifest of an assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembly {
    pub rid: u32,
    pub hash_alg_id: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    pub flags: AssemblyFlags,
    /// Full public key, empty if the assembly has no strong name
    pub public_key: Vec<u8>,
    pub name: String,
    /// `None` for the neutral culture
    pub culture: Option<String>,
}

impl AssemblyRaw {
    /// Resolve heap indexes into an [`Assembly`].
    ///
    /// # Errors
    /// Returns an error if a heap index is out of bounds or a string is not valid UTF-8.
    pub fn to_owned(&self, strings: &Strings, blob: &Blob) -> Result<Assembly> {
        Ok(Assembly {
            rid: self.rid,
            hash_alg_id: self.hash_alg_id,
            major_version: self.major_version,
            minor_version: self.minor_version,
            build_number: self.build_number,
            revision_number: self.revision_number,
            flags: AssemblyFlags::from_bits_retain(self.flags),
            public_key: if self.public_key == 0 {
                Vec::new()
            } else {
                blob.get(self.public_key as usize)?.to_vec()
            },
            name: strings.get(self.name as usize)?.to_string(),
            culture: if self.culture == 0 {
                None
            } else {
                Some(strings.get(self.culture as usize)?.to_string())
            },
        })
    }
}

impl RowReadable for AssemblyRaw {
    const TABLE_ID: TableId = TableId::Assembly;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(AssemblyRaw {
            rid,
            offset: *offset,
            hash_alg_id: read_le_at::<u32>(data, offset)?,
            major_version: read_le_at::<u16>(data, offset)?,
            minor_version: read_le_at::<u16>(data, offset)?,
            build_number: read_le_at::<u16>(data, offset)?,
            revision_number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u32>(data, offset)?,
            public_key: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            culture: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::{MetadataTable, TableInfo};

    #[test]
    fn crafted_short() {
        let data = vec![
            0x04, 0x80, 0x00, 0x00, // hash_alg_id
            0x01, 0x00, // major_version
            0x02, 0x00, // minor_version
            0x03, 0x00, // build_number
            0x04, 0x00, // revision_number
            0x01, 0x00, 0x00, 0x00, // flags
            0x06, 0x06, // public_key
            0x07, 0x07, // name
            0x08, 0x08, // culture
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Assembly, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<AssemblyRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_size(), 22);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.hash_alg_id, 0x8004);
        assert_eq!(row.major_version, 1);
        assert_eq!(row.minor_version, 2);
        assert_eq!(row.build_number, 3);
        assert_eq!(row.revision_number, 4);
        assert_eq!(row.flags, 0x1);
        assert_eq!(row.public_key, 0x0606);
        assert_eq!(row.name, 0x0707);
        assert_eq!(row.culture, 0x0808);

        assert!(table.get(0).is_err());
        assert!(table.get(2).is_err());
    }

    #[test]
    fn crafted_long() {
        let data = vec![
            0x04, 0x80, 0x00, 0x00, // hash_alg_id
            0x01, 0x00, // major_version
            0x02, 0x00, // minor_version
            0x03, 0x00, // build_number
            0x04, 0x00, // revision_number
            0x00, 0x00, 0x00, 0x00, // flags
            0x06, 0x06, 0x06, 0x06, // public_key
            0x07, 0x07, 0x07, 0x07, // name
            0x08, 0x08, 0x08, 0x08, // culture
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Assembly, 1)],
            true,
            true,
            true,
        ));
        let table = MetadataTable::<AssemblyRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.public_key, 0x0606_0606);
        assert_eq!(row.name, 0x0707_0707);
        assert_eq!(row.culture, 0x0808_0808);
    }

    #[test]
    fn to_owned() {
        let strings_data = b"\0LibA\0de-DE\0";
        let blob_data: [u8; 5] = [0x00, 0x03, 0xAA, 0xBB, 0xCC];
        let strings = Strings::from(strings_data).unwrap();
        let blob = Blob::from(&blob_data).unwrap();

        let raw = AssemblyRaw {
            rid: 1,
            offset: 0,
            hash_alg_id: 0x8004,
            major_version: 1,
            minor_version: 0,
            build_number: 0,
            revision_number: 0,
            flags: 0x1,
            public_key: 1,
            name: 1,
            culture: 6,
        };

        let assembly = raw.to_owned(&strings, &blob).unwrap();
        assert_eq!(assembly.name, "LibA");
        assert_eq!(assembly.culture.as_deref(), Some("de-DE"));
        assert_eq!(assembly.public_key, vec![0xAA, 0xBB, 0xCC]);
        assert!(assembly.flags.contains(AssemblyFlags::PUBLIC_KEY));

        let unsigned = AssemblyRaw {
            public_key: 0,
            culture: 0,
            ..raw
        };
        let assembly = unsigned.to_owned(&strings, &blob).unwrap();
        assert!(assembly.public_key.is_empty());
        assert!(assembly.culture.is_none());
    }
}
