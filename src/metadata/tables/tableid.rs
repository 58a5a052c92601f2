use strum::{EnumCount, EnumIter};

/// Identifiers of the ECMA-335 metadata tables, in the order they appear inside the `#~`
/// stream.
///
/// The discriminant is the bit position of the table in the `valid` vector of the tables
/// header. Portable PDB tables are not listed; their row counts are still consumed when
/// parsing the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
#[repr(u8)]
pub enum TableId {
    /// `Module`, 0x00
    Module = 0x00,
    /// `TypeRef`, 0x01
    TypeRef = 0x01,
    /// `TypeDef`, 0x02
    TypeDef = 0x02,
    /// `FieldPtr`, 0x03
    FieldPtr = 0x03,
    /// `Field`, 0x04
    Field = 0x04,
    /// `MethodPtr`, 0x05
    MethodPtr = 0x05,
    /// `MethodDef`, 0x06
    MethodDef = 0x06,
    /// `ParamPtr`, 0x07
    ParamPtr = 0x07,
    /// `Param`, 0x08
    Param = 0x08,
    /// `InterfaceImpl`, 0x09
    InterfaceImpl = 0x09,
    /// `MemberRef`, 0x0A
    MemberRef = 0x0A,
    /// `Constant`, 0x0B
    Constant = 0x0B,
    /// `CustomAttribute`, 0x0C
    CustomAttribute = 0x0C,
    /// `FieldMarshal`, 0x0D
    FieldMarshal = 0x0D,
    /// `DeclSecurity`, 0x0E
    DeclSecurity = 0x0E,
    /// `ClassLayout`, 0x0F
    ClassLayout = 0x0F,
    /// `FieldLayout`, 0x10
    FieldLayout = 0x10,
    /// `StandAloneSig`, 0x11
    StandAloneSig = 0x11,
    /// `EventMap`, 0x12
    EventMap = 0x12,
    /// `EventPtr`, 0x13
    EventPtr = 0x13,
    /// `Event`, 0x14
    Event = 0x14,
    /// `PropertyMap`, 0x15
    PropertyMap = 0x15,
    /// `PropertyPtr`, 0x16
    PropertyPtr = 0x16,
    /// `Property`, 0x17
    Property = 0x17,
    /// `MethodSemantics`, 0x18
    MethodSemantics = 0x18,
    /// `MethodImpl`, 0x19
    MethodImpl = 0x19,
    /// `ModuleRef`, 0x1A
    ModuleRef = 0x1A,
    /// `TypeSpec`, 0x1B
    TypeSpec = 0x1B,
    /// `ImplMap`, 0x1C
    ImplMap = 0x1C,
    /// `FieldRVA`, 0x1D
    FieldRVA = 0x1D,
    /// `EncLog`, 0x1E
    EncLog = 0x1E,
    /// `EncMap`, 0x1F
    EncMap = 0x1F,
    /// `Assembly`, 0x20
    Assembly = 0x20,
    /// `AssemblyProcessor`, 0x21
    AssemblyProcessor = 0x21,
    /// `AssemblyOS`, 0x22
    AssemblyOS = 0x22,
    /// `AssemblyRef`, 0x23
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor`, 0x24
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS`, 0x25
    AssemblyRefOS = 0x25,
    /// `File`, 0x26
    File = 0x26,
    /// `ExportedType`, 0x27
    ExportedType = 0x27,
    /// `ManifestResource`, 0x28
    ManifestResource = 0x28,
    /// `NestedClass`, 0x29
    NestedClass = 0x29,
    /// `GenericParam`, 0x2A
    GenericParam = 0x2A,
    /// `MethodSpec`, 0x2B
    MethodSpec = 0x2B,
    /// `GenericParamConstraint`, 0x2C
    GenericParamConstraint = 0x2C,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn ordered_by_bit_position() {
        assert_eq!(TableId::COUNT, 0x2D);
        for (position, table) in TableId::iter().enumerate() {
            assert_eq!(table as usize, position);
        }
    }
}
