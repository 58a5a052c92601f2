use std::marker::PhantomData;

use crate::{
    metadata::tables::{TableId, TableInfoRef},
    Error::OutOfBounds,
    Result,
};

/// A row type that can be decoded from a metadata table.
pub trait RowReadable: Sized {
    /// The table this row belongs to
    const TABLE_ID: TableId;

    /// Size of one row in bytes
    fn row_size(sizes: &TableInfoRef) -> u32 {
        sizes.row_size(Self::TABLE_ID)
    }

    /// Read the row with id `rid`, starting at `offset`, advancing `offset` past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row does not fit into `data`.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// A typed view over the rows of a single metadata table.
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Create a table view over `data`, which starts at the first row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is too short for `row_count` rows.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = T::row_size(&sizes);
        let Some(size) = (row_count as usize).checked_mul(row_size as usize) else {
            return Err(OutOfBounds);
        };
        if size > data.len() {
            return Err(OutOfBounds);
        }

        Ok(MetadataTable {
            data: &data[..size],
            row_count,
            row_size,
            sizes,
            _phantom: PhantomData,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Read the row with the 1-based id `rid`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `rid` is 0 or past the last row.
    pub fn get(&self, rid: u32) -> Result<T> {
        if rid == 0 || rid > self.row_count {
            return Err(OutOfBounds);
        }

        let mut offset = (rid as usize - 1) * self.row_size as usize;
        T::row_read(self.data, &mut offset, rid, &self.sizes)
    }

    /// Iterate over all rows in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<T>> + '_ {
        (1..=self.row_count).map(move |rid| self.get(rid))
    }
}
