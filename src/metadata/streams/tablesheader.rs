use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::parser::Parser,
    metadata::tables::{MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef},
    Error::OutOfBounds,
    Result,
};

/// `HeapSizes` bit signalling four bytes of extra data after the row counts
const EXTRA_DATA: u8 = 0x40;

/// The header of the `#~` (or uncompressed `#-`) stream and the layout of the tables behind it.
///
/// The header lists which tables are present and how many rows each holds. Rows follow
/// directly, table after table in [`TableId`] order, without padding. [`TablesHeader`]
/// records where each known table starts so typed views can be handed out on demand.
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.6
pub struct TablesHeader<'a> {
    /// Major version of the table schema, 2 for current images
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Raw `HeapSizes` flags
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Sizing information shared with every table view
    pub info: TableInfoRef,
    data: &'a [u8],
    table_offsets: Vec<Option<usize>>,
}

impl<'a> TablesHeader<'a> {
    /// Parse the tables header from the stream data.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for a truncated header, or
    /// [`crate::Error::Malformed`] if no table is present.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        let mut parser = Parser::new(data);

        let _reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        let _reserved = parser.read_le::<u8>()?;
        let valid = parser.read_le::<u64>()?;
        let sorted = parser.read_le::<u64>()?;

        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let mut row_counts = [0u32; 64];
        for (bit, rows) in row_counts.iter_mut().enumerate() {
            if valid & (1u64 << bit) != 0 {
                *rows = parser.read_le::<u32>()?;
            }
        }

        if heap_sizes & EXTRA_DATA != 0 {
            let _extra = parser.read_le::<u32>()?;
        }

        let info = Arc::new(TableInfo::new(&row_counts[..TableId::COUNT], heap_sizes));

        let mut table_offsets = vec![None; TableId::COUNT];
        let mut current_offset = parser.pos();
        for table_id in TableId::iter() {
            let rows = row_counts[table_id as usize];
            if rows == 0 {
                continue;
            }

            table_offsets[table_id as usize] = Some(current_offset);

            let Some(size) = (rows as usize).checked_mul(info.row_size(table_id) as usize) else {
                return Err(OutOfBounds);
            };
            current_offset = current_offset.checked_add(size).ok_or(OutOfBounds)?;
        }

        Ok(TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            info,
            data,
            table_offsets,
        })
    }

    /// Number of tables present in the stream
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Number of rows of `table_id`, 0 if the table is absent.
    #[must_use]
    pub fn row_count(&self, table_id: TableId) -> u32 {
        self.info.get(table_id).rows
    }

    /// Typed view over the rows of `T::TABLE_ID`, or `None` if the table is absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the table extends past the stream.
    pub fn table<T: RowReadable>(&self) -> Result<Option<MetadataTable<'a, T>>> {
        let Some(offset) = self.table_offsets[T::TABLE_ID as usize] else {
            return Ok(None);
        };

        if offset > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(Some(MetadataTable::new(
            &self.data[offset..],
            self.row_count(T::TABLE_ID),
            self.info.clone(),
        )?))
    }
}
