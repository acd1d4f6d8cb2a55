use crate::dictionary::TableKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid magic number in index header")]
    InvalidMagic,

    #[error("Unsupported index format tag: {0:?}")]
    UnsupportedFormatVersion([u8; 2]),

    #[error("Unknown game code: {0}")]
    UnknownGame(String),

    #[error("Truncated index: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    TruncatedIndex {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Asset '{asset}' references unknown {table} id {id:#x}")]
    DanglingReference {
        table: TableKind,
        id: u32,
        asset: String,
    },

    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    #[error("Cannot build an index from an empty asset list")]
    EmptyIndex,

    #[error("Invalid asset descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("No byte size recorded for source block {0}")]
    MissingSourceSize(String),

    #[error("{field} value {value} exceeds the format limit of {max}")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Unresolved {table} reference '{value}' while writing asset records")]
    UnresolvedReference { table: TableKind, value: String },

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("External step failed: {0}")]
    External(String),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl IndexError {
    /// True for every failure a decode call can report about the file itself.
    ///
    /// Callers showing a single "invalid index file" message branch on this
    /// instead of matching each kind.
    pub fn is_invalid_index(&self) -> bool {
        matches!(
            self,
            IndexError::InvalidMagic
                | IndexError::UnsupportedFormatVersion(_)
                | IndexError::UnknownGame(_)
                | IndexError::TruncatedIndex { .. }
                | IndexError::DanglingReference { .. }
                | IndexError::MalformedIndex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
