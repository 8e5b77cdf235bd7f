//! Error types for particle parameters.
//!
//! Sampling and parameter loading never fail: unknown modes and missing
//! fields fall back to defaults. The errors here cover the operations that
//! really can fail, decoding binary data blocks and reading or writing
//! configuration files.

use std::fmt;

/// Errors that can occur while decoding a binary data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataBlockError {
    /// The buffer does not start with the data block magic.
    InvalidMagic(u32),
    /// The buffer ended before the named item could be read.
    UnexpectedEof(&'static str),
    /// A param carried a type tag this build does not know.
    UnknownParamType(u8),
    /// A string in the buffer was not valid UTF-8.
    InvalidUtf8,
    /// A param or block referenced a string id missing from the string table.
    UnknownStringId(u16),
    /// Too many params, blocks or strings to fit the binary counters.
    TooLarge(&'static str),
    /// Blocks nested deeper than the given limit.
    TooDeep(usize),
}

impl fmt::Display for DataBlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataBlockError::InvalidMagic(magic) => {
                write!(f, "Invalid data block format (magic {:#010x})", magic)
            }
            DataBlockError::UnexpectedEof(what) => write!(
                f,
                "Binary data is corrupted: unexpected end of data while reading {}",
                what
            ),
            DataBlockError::UnknownParamType(tag) => {
                write!(f, "Binary data is corrupted: unknown param type {}", tag)
            }
            DataBlockError::InvalidUtf8 => {
                write!(f, "Binary data is corrupted: string is not valid UTF-8")
            }
            DataBlockError::UnknownStringId(id) => {
                write!(f, "Binary data is corrupted: unknown string id {}", id)
            }
            DataBlockError::TooLarge(what) => {
                write!(f, "Data block has too many {} to encode", what)
            }
            DataBlockError::TooDeep(limit) => {
                write!(f, "Data block nesting exceeds {} levels", limit)
            }
        }
    }
}

impl std::error::Error for DataBlockError {}

/// Errors that can occur when saving or loading a particle system
/// configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the file.
    Io(std::io::Error),
    /// The file is not valid JSON for a configuration.
    Json(serde_json::Error),
    /// The file is not a valid binary data block.
    DataBlock(DataBlockError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access config file: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse config JSON: {}", e),
            ConfigError::DataBlock(e) => write!(f, "Failed to decode config data block: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::DataBlock(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<DataBlockError> for ConfigError {
    fn from(e: DataBlockError) -> Self {
        ConfigError::DataBlock(e)
    }
}
