use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into two groups. Failures that describe a missing, conflicting or
/// malformed assembly are *recoverable* during reference resolution: an
/// [`crate::resolution::AssemblyReference`] turns them into an "unresolved" result and the
/// walk carries on. Everything else signals an environment or programming defect and is
/// propagated to the caller. [`Error::is_recoverable`] is the single place that draws this
/// line.
///
/// # Error Categories
///
/// ## Image Format Errors (recoverable)
/// - [`Error::InvalidOffset`] - Invalid file offset during parsing
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond file boundaries
/// - [`Error::NotSupported`] - Not a .NET assembly, or an unsupported layout
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::GoblinErr`] - PE parsing errors from goblin crate
///
/// ## Resolution Errors (recoverable)
/// - [`Error::AssemblyNotFound`] - No candidate file exists for a name
/// - [`Error::LoadConflict`] - A candidate exists but its identity does not match
/// - [`Error::FileError`] - Only when the underlying I/O error is `NotFound`
///
/// ## Fatal Errors
/// - [`Error::FileError`] - Any other I/O failure (permissions, device errors, ...)
/// - [`Error::XmlError`] - Project file could not be read as XML
/// - [`Error::Cancelled`] - A traversal was cancelled by its caller
/// - [`Error::Error`] - Generic failure
///
/// # Examples
///
/// ```rust
/// use refscope::Error;
///
/// let missing = Error::AssemblyNotFound("LibB".to_string());
/// assert!(missing.is_recoverable());
///
/// let cancelled = Error::Cancelled;
/// assert!(!cancelled.is_recoverable());
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // File parsing Errors
    /// Encountered an invalid offset while parsing file structures.
    #[error("Could not retrieve a valid offset!")]
    InvalidOffset,

    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the file structure is corrupted or doesn't
    /// conform to the expected .NET PE format. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// Returned for PE files without a CLR runtime header, or for metadata layouts
    /// this crate does not read (e.g. a missing `#~` stream).
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Only the `NotFound` kind is considered recoverable during resolution. Permission
    /// and device errors are treated as fatal.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Error from the quick-xml crate while reading a project file.
    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    /// No file could be found for the requested assembly name.
    ///
    /// The associated value is the display name that was requested.
    #[error("Could not find assembly '{0}'")]
    AssemblyNotFound(String),

    /// A file was found for the requested name, but the identity it declares does not
    /// match the request (different version, culture or public key token).
    #[error("Located assembly '{found}' does not match the requested '{requested}'")]
    LoadConflict {
        /// The display name that was requested
        requested: String,
        /// The display name of the assembly that was found instead
        found: String,
    },

    /// The traversal was cancelled through its [`crate::resolution::CancellationToken`].
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns `true` if this error describes an assembly that is missing, conflicting
    /// or not a valid image.
    ///
    /// Reference resolution converts these into "unresolved" and moves on; every other
    /// error is propagated unchanged.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::AssemblyNotFound(_)
            | Error::LoadConflict { .. }
            | Error::InvalidOffset
            | Error::Malformed { .. }
            | Error::OutOfBounds
            | Error::NotSupported
            | Error::Empty
            | Error::GoblinErr(_) => true,
            Error::FileError(error) => error.kind() == std::io::ErrorKind::NotFound,
            Error::XmlError(_) | Error::Cancelled | Error::Error(_) => false,
        }
    }
}
