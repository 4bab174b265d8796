//! Error types for the coinset dataset builder.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the coinset dataset builder.
///
/// Every variant aborts the enclosing run. Post-listing gaps are reported as
/// diagnostics, never through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// A row field (date or number) could not be parsed.
    #[error("Parse error in {asset} (line {line}): {message}")]
    Parse {
        asset: String,
        line: usize,
        message: String,
    },

    /// The row source for an asset is unavailable.
    #[error("Failed to load asset {asset}: {source}")]
    AssetLoad {
        asset: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or truncated binary container.
    #[error("Decode error at byte {byte_offset}: {reason}")]
    Decode { reason: String, byte_offset: usize },

    /// Filesystem failure while writing the container.
    #[error("I/O error while encoding: {0}")]
    EncodeIo(#[source] std::io::Error),

    /// Other I/O error, e.g. reading a container back.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Experiment violates the uniform-window invariant.
    #[error("Inconsistent experiment: {0}")]
    Inconsistent(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error.
    pub fn parse(asset: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            asset: asset.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an asset load error.
    pub fn asset_load(asset: impl Into<String>, source: std::io::Error) -> Self {
        Error::AssetLoad {
            asset: asset.into(),
            source,
        }
    }

    /// Create a decode error.
    pub fn decode(reason: impl Into<String>, byte_offset: usize) -> Self {
        Error::Decode {
            reason: reason.into(),
            byte_offset,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an inconsistency error.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Error::Inconsistent(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_carries_offset() {
        let err = Error::decode("truncated snapshot", 36);
        assert_eq!(err.to_string(), "Decode error at byte 36: truncated snapshot");
    }

    #[test]
    fn test_asset_load_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::asset_load("btc", io);
        assert!(err.to_string().contains("btc"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
