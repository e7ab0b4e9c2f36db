use thiserror::Error;

use crate::asset::AssetRef;

/// Errors surfaced by editor operations.
///
/// None of these terminate the editor session; the host shows them as
/// notifications and carries on.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A tool or viewport parameter was out of range. The previous value is kept.
    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A stamp or uploaded image could not be resolved.
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),

    /// Snapshot data could not be decoded. The document was left untouched.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The document could not be written to a snapshot that restores. Nothing was recorded.
    #[error("cannot snapshot document: {0}")]
    Serialize(String),

    /// Encoding the rasterized canvas failed.
    #[error("failed to encode {format} export: {reason}")]
    Export { format: &'static str, reason: String },
}

impl EditorError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure to turn an [`AssetRef`] into pixels.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetLoadError {
    #[error("asset {asset} is unreachable: {reason}")]
    Unreachable { asset: AssetRef, reason: String },

    #[error("asset {asset} could not be decoded: {reason}")]
    Undecodable { asset: AssetRef, reason: String },

    #[error("asset {0} uses an unsupported scheme")]
    Unsupported(AssetRef),

    #[error("asset load was cancelled")]
    Cancelled,
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
