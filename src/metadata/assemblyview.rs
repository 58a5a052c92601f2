//! Parsed view of a .NET assembly image.
//!
//! [`AssemblyView`] owns the image bytes and borrows the metadata structures from them:
//! the CLI header, the metadata root, the tables stream and the `#Strings` and `#Blob`
//! heaps. On top of that it decodes what reference resolution needs, namely the assembly's
//! own identity and public key and the names of the assemblies it references.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refscope::metadata::assemblyview::AssemblyView;
//!
//! let view = AssemblyView::from_file(std::path::Path::new("LibA.dll"))?;
//! println!("{}", view.identity()?);
//! for name in view.references()? {
//!     println!("  -> {}", name);
//! }
//! # Ok::<(), refscope::Error>(())
//! ```

use std::{path::Path, sync::Arc};

use ouroboros::self_referencing;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        identity::{AssemblyIdentity, AssemblyName},
        root::Root,
        streams::{Blob, StreamHeader, Strings, TablesHeader},
        tables::{Assembly, AssemblyRaw, AssemblyRef, AssemblyRefRaw},
    },
    Error::NotSupported,
    Result,
};

/// Metadata structures borrowed from the image bytes.
pub struct AssemblyViewData<'a> {
    /// The CLI header
    pub cor20header: Cor20Header,
    /// The metadata root and stream directory
    pub metadata_root: Root,
    /// The `#~` or `#-` stream
    pub metadata_tables: TablesHeader<'a>,
    /// The `#Strings` heap
    pub strings: Strings<'a>,
    /// The `#Blob` heap, absent in images that never needed one
    pub blobs: Option<Blob<'a>>,
}

impl<'a> AssemblyViewData<'a> {
    /// Locate and parse the metadata of `file`.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the tables or strings stream is missing,
    /// and a malformed or out of bounds error for damaged headers.
    pub fn from_file(file: &'a File) -> Result<Self> {
        let (clr_rva, clr_size) = file.clr()?;
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20header = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(cor20header.meta_data_rva as usize)?;
        let metadata_slice =
            file.data_slice(metadata_offset, cor20header.meta_data_size as usize)?;
        let metadata_root = Root::read(metadata_slice)?;

        let mut metadata_tables = None;
        let mut strings = None;
        let mut blobs = None;

        for stream in &metadata_root.stream_headers {
            let start = stream.offset as usize;
            let stream_data = &metadata_slice[start..start + stream.size as usize];

            match stream.name.as_str() {
                "#~" | "#-" => metadata_tables = Some(TablesHeader::from(stream_data)?),
                "#Strings" => strings = Some(Strings::from(stream_data)?),
                "#Blob" => blobs = Some(Blob::from(stream_data)?),
                _ => {}
            }
        }

        let (Some(metadata_tables), Some(strings)) = (metadata_tables, strings) else {
            return Err(NotSupported);
        };

        Ok(AssemblyViewData {
            cor20header,
            metadata_root,
            metadata_tables,
            strings,
            blobs,
        })
    }
}

#[self_referencing]
/// A loaded assembly image with its metadata parsed in place.
pub struct AssemblyView {
    file: Arc<File>,

    #[borrows(file)]
    #[not_covariant]
    data: AssemblyViewData<'this>,
}

impl AssemblyView {
    /// Read and parse an image from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, or any error of
    /// [`AssemblyView::from_mem`].
    pub fn from_file(file: &Path) -> Result<Self> {
        let input = Arc::new(File::from_file(file)?);
        Self::load(input)
    }

    /// Parse an image from memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`], [`crate::Error::GoblinErr`] or
    /// [`crate::Error::NotSupported`] for inputs that are not .NET images, and malformed or
    /// out of bounds errors for damaged metadata.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        let input = Arc::new(File::from_mem(data)?);
        Self::load(input)
    }

    fn load(file: Arc<File>) -> Result<Self> {
        AssemblyView::try_new(file, |file| AssemblyViewData::from_file(file))
    }

    pub fn cor20header(&self) -> &Cor20Header {
        self.with_data(|data| &data.cor20header)
    }

    pub fn metadata_root(&self) -> &Root {
        self.with_data(|data| &data.metadata_root)
    }

    pub fn streams(&self) -> &[StreamHeader] {
        self.with_data(|data| &data.metadata_root.stream_headers)
    }

    pub fn file(&self) -> &Arc<File> {
        self.borrow_file()
    }

    /// The manifest row of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for a module without an `Assembly` table, or
    /// an error if the row cannot be decoded.
    pub fn assembly(&self) -> Result<Assembly> {
        self.with_data(|data| {
            let Some(table) = data.metadata_tables.table::<AssemblyRaw>()? else {
                return Err(NotSupported);
            };

            let empty = Blob::empty();
            let blobs = data.blobs.as_ref().unwrap_or(&empty);
            table.get(1)?.to_owned(&data.strings, blobs)
        })
    }

    /// The identity the assembly declares for itself.
    ///
    /// # Errors
    /// See [`AssemblyView::assembly`].
    pub fn identity(&self) -> Result<AssemblyIdentity> {
        Ok(AssemblyIdentity::from_assembly(&self.assembly()?))
    }

    /// The full public key, empty if the assembly has no strong name.
    ///
    /// # Errors
    /// See [`AssemblyView::assembly`].
    pub fn public_key(&self) -> Result<Vec<u8>> {
        Ok(self.assembly()?.public_key)
    }

    /// The raw `AssemblyRef` rows, in table order.
    ///
    /// # Errors
    /// Returns an error if a row or one of its heap entries cannot be decoded.
    pub fn assembly_refs(&self) -> Result<Vec<AssemblyRef>> {
        self.with_data(|data| {
            let Some(table) = data.metadata_tables.table::<AssemblyRefRaw>()? else {
                return Ok(Vec::new());
            };

            let empty = Blob::empty();
            let blobs = data.blobs.as_ref().unwrap_or(&empty);
            table
                .iter()
                .map(|row| row?.to_owned(&data.strings, blobs))
                .collect()
        })
    }

    /// The names of all referenced assemblies, in table order.
    ///
    /// # Errors
    /// See [`AssemblyView::assembly_refs`].
    pub fn references(&self) -> Result<Vec<AssemblyName>> {
        Ok(self
            .assembly_refs()?
            .iter()
            .map(AssemblyName::from_assembly_ref)
            .collect())
    }

    /// `true` if the CLI header claims a strong name signature.
    pub fn is_strong_name_signed(&self) -> bool {
        self.cor20header().is_strong_name_signed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::identity::{AssemblyVersion, Identity},
        test::ImageBuilder,
    };

    #[test]
    fn unsigned_without_references() {
        let image = ImageBuilder::new("LibA").version(1, 2, 3, 4).build();
        let view = AssemblyView::from_mem(image).unwrap();

        let identity = view.identity().unwrap();
        assert_eq!(identity.name, "LibA");
        assert_eq!(identity.version, AssemblyVersion::new(1, 2, 3, 4));
        assert!(identity.culture.is_none());
        assert!(view.public_key().unwrap().is_empty());
        assert!(view.references().unwrap().is_empty());
        assert!(!view.is_strong_name_signed());

        let names: Vec<&str> = view.streams().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["#~", "#Strings", "#Blob"]);
        assert_eq!(view.metadata_root().version, "v4.0.30319");
    }

    #[test]
    fn signed_with_references() {
        let key = vec![0x24; 160];
        let image = ImageBuilder::new("LibA")
            .version(2, 0, 0, 0)
            .culture("de-DE")
            .public_key(&key)
            .reference("LibB", (1, 0, 0, 0), None)
            .reference("mscorlib", (4, 0, 0, 0), Some(0x89e0_3419_565c_7ab7))
            .build();
        let view = AssemblyView::from_mem(image).unwrap();

        let identity = view.identity().unwrap();
        assert_eq!(identity.culture.as_deref(), Some("de-DE"));
        assert_eq!(identity.strong_name, Some(Identity::PubKey(key.clone())));
        assert_eq!(view.public_key().unwrap(), key);
        assert!(view.is_strong_name_signed());

        let references = view.references().unwrap();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].display_name(), "LibB, Version=1.0.0.0, Culture=neutral");
        assert_eq!(
            references[1].display_name(),
            "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
        );
    }

    #[test]
    fn not_an_image() {
        assert!(AssemblyView::from_mem(Vec::new()).is_err());
        assert!(AssemblyView::from_mem(b"MZ not really a PE".to_vec()).is_err());

        let mut image = ImageBuilder::new("LibA").build();
        image.truncate(ImageBuilder::TEXT_FILE_OFFSET as usize + 0x40);
        assert!(AssemblyView::from_mem(image).is_err());
    }
}
