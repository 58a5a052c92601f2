use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::{CodedIndexType, TableId};

/// Row count and derived index width of a single table.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows present in the table
    pub rows: u32,
    /// Number of bits needed to address every row
    pub bits: u8,
    /// `true` if a simple index into this table needs 4 bytes
    pub is_large: bool,
}

impl TableRowInfo {
    /// Derive index widths from a row count.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Sizing information for the tables of one `#~` stream.
///
/// Every column width in ECMA-335 metadata depends on the heap size flags and on the row
/// counts of the referenced tables. [`TableInfo`] collects both once, so that row sizes
/// and offsets can be computed without touching the row data.
#[derive(Clone, Default, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// A shared [`TableInfo`]
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Build the sizing information from per-table row counts and the `HeapSizes` byte.
    ///
    /// `row_counts` is indexed by [`TableId`]; missing trailing entries count as empty.
    #[must_use]
    pub fn new(row_counts: &[u32], heap_sizes: u8) -> Self {
        let rows = TableId::iter()
            .map(|table| TableRowInfo::new(row_counts.get(table as usize).copied().unwrap_or(0)))
            .collect();

        let mut table_info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_sizes & 0x01 == 0x01,
            is_large_index_guid: heap_sizes & 0x02 == 0x02,
            is_large_index_blob: heap_sizes & 0x04 == 0x04,
        };

        table_info.calculate_coded_index_bits();
        table_info
    }

    #[cfg(test)]
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut row_counts = vec![0; TableId::COUNT];
        for (table, rows) in valid_tables {
            row_counts[*table as usize] = *rows;
        }

        let heap_sizes = u8::from(large_str) | u8::from(large_guid) << 1 | u8::from(large_blob) << 2;
        TableInfo::new(&row_counts, heap_sizes)
    }

    /// Row information of `table`.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// `true` if `#Strings` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// `true` if `#GUID` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// `true` if `#Blob` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a simple index into `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        if self.rows[table as usize].is_large {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a coded index of the given kind.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Size in bytes of one row of `table`, following the column layouts of ECMA-335 II.22.
    #[must_use]
    #[rustfmt::skip]
    pub fn row_size(&self, table: TableId) -> u32 {
        let s = self.str_bytes();
        let g = self.guid_bytes();
        let b = self.blob_bytes();
        let i = |table: TableId| self.table_index_bytes(table);
        let c = |coded: CodedIndexType| self.coded_index_bytes(coded);

        let size = match table {
            TableId::Module                 => 2 + s + g + g + g,
            TableId::TypeRef                => c(CodedIndexType::ResolutionScope) + s + s,
            TableId::TypeDef                => 4 + s + s + c(CodedIndexType::TypeDefOrRef) + i(TableId::Field) + i(TableId::MethodDef),
            TableId::FieldPtr               => i(TableId::Field),
            TableId::Field                  => 2 + s + b,
            TableId::MethodPtr              => i(TableId::MethodDef),
            TableId::MethodDef              => 4 + 2 + 2 + s + b + i(TableId::Param),
            TableId::ParamPtr               => i(TableId::Param),
            TableId::Param                  => 2 + 2 + s,
            TableId::InterfaceImpl          => i(TableId::TypeDef) + c(CodedIndexType::TypeDefOrRef),
            TableId::MemberRef              => c(CodedIndexType::MemberRefParent) + s + b,
            TableId::Constant               => 1 + 1 + c(CodedIndexType::HasConstant) + b,
            TableId::CustomAttribute        => c(CodedIndexType::HasCustomAttribute) + c(CodedIndexType::CustomAttributeType) + b,
            TableId::FieldMarshal           => c(CodedIndexType::HasFieldMarshal) + b,
            TableId::DeclSecurity           => 2 + c(CodedIndexType::HasDeclSecurity) + b,
            TableId::ClassLayout            => 2 + 4 + i(TableId::TypeDef),
            TableId::FieldLayout            => 4 + i(TableId::Field),
            TableId::StandAloneSig          => b,
            TableId::EventMap               => i(TableId::TypeDef) + i(TableId::Event),
            TableId::EventPtr               => i(TableId::Event),
            TableId::Event                  => 2 + s + c(CodedIndexType::TypeDefOrRef),
            TableId::PropertyMap            => i(TableId::TypeDef) + i(TableId::Property),
            TableId::PropertyPtr            => i(TableId::Property),
            TableId::Property               => 2 + s + b,
            TableId::MethodSemantics        => 2 + i(TableId::MethodDef) + c(CodedIndexType::HasSemantics),
            TableId::MethodImpl             => i(TableId::TypeDef) + c(CodedIndexType::MethodDefOrRef) + c(CodedIndexType::MethodDefOrRef),
            TableId::ModuleRef              => s,
            TableId::TypeSpec               => b,
            TableId::ImplMap                => 2 + c(CodedIndexType::MemberForwarded) + s + i(TableId::ModuleRef),
            TableId::FieldRVA               => 4 + i(TableId::Field),
            TableId::EncLog                 => 4 + 4,
            TableId::EncMap                 => 4,
            TableId::Assembly               => 4 + 2 + 2 + 2 + 2 + 4 + b + s + s,
            TableId::AssemblyProcessor      => 4,
            TableId::AssemblyOS             => 4 + 4 + 4,
            TableId::AssemblyRef            => 2 + 2 + 2 + 2 + 4 + b + s + s + b,
            TableId::AssemblyRefProcessor   => 4 + i(TableId::AssemblyRef),
            TableId::AssemblyRefOS          => 4 + 4 + 4 + i(TableId::AssemblyRef),
            TableId::File                   => 4 + s + b,
            TableId::ExportedType           => 4 + 4 + s + s + c(CodedIndexType::Implementation),
            TableId::ManifestResource       => 4 + 4 + s + c(CodedIndexType::Implementation),
            TableId::NestedClass            => i(TableId::TypeDef) + i(TableId::TypeDef),
            TableId::GenericParam           => 2 + 2 + c(CodedIndexType::TypeOrMethodDef) + s,
            TableId::MethodSpec             => c(CodedIndexType::MethodDefOrRef) + b,
            TableId::GenericParamConstraint => i(TableId::GenericParam) + c(CodedIndexType::TypeDefOrRef),
        };

        u32::from(size)
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let max_bits = coded_index
                .tables()
                .iter()
                .map(|table| self.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);

            self.coded_indexes[coded_index as usize] = max_bits + coded_index.tag_bits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_heaps() {
        let info = TableInfo::new_test(&[(TableId::Assembly, 1), (TableId::AssemblyRef, 3)], false, false, false);

        assert_eq!(info.get(TableId::AssemblyRef).rows, 3);
        assert_eq!(info.row_size(TableId::Module), 10);
        assert_eq!(info.row_size(TableId::TypeDef), 14);
        assert_eq!(info.row_size(TableId::Assembly), 22);
        assert_eq!(info.row_size(TableId::AssemblyRef), 20);
        assert_eq!(info.row_size(TableId::CustomAttribute), 6);
    }

    #[test]
    fn large_heaps() {
        let info = TableInfo::new_test(&[(TableId::AssemblyRef, 1)], true, true, true);

        assert_eq!(info.row_size(TableId::Module), 2 + 4 * 4);
        assert_eq!(info.row_size(TableId::Assembly), 16 + 4 + 8);
        assert_eq!(info.row_size(TableId::AssemblyRef), 12 + 8 + 8);
    }

    #[test]
    fn coded_index_widens() {
        // HasCustomAttribute has 5 tag bits, so more than 2^11 rows need 4 bytes
        let info = TableInfo::new_test(&[(TableId::MethodDef, 0x0800)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 4);
        assert_eq!(info.coded_index_bytes(CodedIndexType::MethodDefOrRef), 2);

        let info = TableInfo::new_test(&[(TableId::MethodDef, 0x07FF)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 2);

        let info = TableInfo::new_test(&[(TableId::TypeDef, 0x1_0000)], false, false, false);
        assert_eq!(info.table_index_bytes(TableId::TypeDef), 4);
    }
}
