use thiserror::Error;

/// Main error type for index operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid value for gamma coding: {0} (only positive integers are encodable)")]
    InvalidValue(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Snapshot error: incompatible version {actual}, expected <= {expected}")]
    IncompatibleSnapshot { expected: u32, actual: u32 },

    #[error("Index is sealed: documents cannot be added after compression")]
    Sealed,

    #[error("Ordinal space exhausted after {0} documents")]
    OrdinalOverflow(u32),

    #[error("Page store error: {0}")]
    PageStore(String),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// True when persisted state could not be turned back into a valid index
    pub fn is_deserialization_failure(&self) -> bool {
        matches!(
            self,
            IndexError::Corrupt(_)
                | IndexError::Serialization(_)
                | IndexError::IncompatibleSnapshot { .. }
        )
    }
}
