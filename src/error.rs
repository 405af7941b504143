//! Error types for extraction and upload handling.
//!
//! Display strings are part of the HTTP contract: they are returned verbatim
//! in the `error` field of failed `/upload` responses.

/// Failures while turning KML text into a placemark summary.
#[derive(Debug, thiserror::Error)]
pub enum KmlError {
    /// Malformed XML, or a document the tree builder refuses to descend into.
    #[error("Error parsing KML.")]
    Parse { reason: String },

    #[error("Invalid KML structure. No <kml> tag found.")]
    InvalidStructure,

    #[error("No Placemark data found.")]
    NoPlacemarkData,
}

impl From<roxmltree::Error> for KmlError {
    fn from(err: roxmltree::Error) -> Self {
        KmlError::Parse { reason: err.to_string() }
    }
}

/// Failures in the upload gateway before extraction starts.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded.")]
    MissingFile,

    #[error("Invalid file type")]
    InvalidFileType { file_name: String },

    #[error("Unexpected field")]
    UnexpectedField { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
