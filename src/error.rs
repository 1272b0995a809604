use std::fmt;

/// Error type returned by scws-rs public APIs.
#[derive(Debug)]
pub enum ScwsError {
    /// Dynamic library could not be loaded.
    LibraryLoad(String),
    /// Required symbol could not be resolved from the library.
    SymbolLoad(String),
    /// Rust string contained an interior `NUL` byte for C interop.
    NulByte(std::ffi::NulError),
    /// User-provided arguments were invalid.
    InvalidArgument(String),
    /// Operation attempted on an instance whose engine handle was already
    /// released with [`crate::Scws::destroy`].
    InvalidState(String),
    /// Error reported by the SCWS C API.
    Api(String),
}

impl fmt::Display for ScwsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScwsError::LibraryLoad(message) => write!(f, "failed to load library: {message}"),
            ScwsError::SymbolLoad(message) => write!(f, "failed to load symbol: {message}"),
            ScwsError::NulByte(error) => write!(f, "string contains NUL byte: {error}"),
            ScwsError::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            ScwsError::InvalidState(message) => write!(f, "invalid state: {message}"),
            ScwsError::Api(message) => write!(f, "scws api error: {message}"),
        }
    }
}

impl std::error::Error for ScwsError {}

impl From<std::ffi::NulError> for ScwsError {
    fn from(value: std::ffi::NulError) -> Self {
        ScwsError::NulByte(value)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScwsError>;
