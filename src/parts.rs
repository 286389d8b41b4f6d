#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Turns exam photos and answer-key PDFs into base64 inline parts.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as Base64};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// A file's contents as base64 text, tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFilePart {
    /// MIME type, eg. `image/jpeg` or `application/pdf`
    mime_type: String,
    /// Standard (padded) base64 of the file contents
    data:      String,
}

impl EncodedFilePart {
    /// Returns the MIME type of the encoded file.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decodes the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        Base64.decode(&self.data)
    }
}

/// Encodes an in-memory buffer.
pub fn encode_bytes(bytes: &[u8], mime_type: impl Into<String>) -> EncodedFilePart {
    EncodedFilePart {
        mime_type: mime_type.into(),
        data:      Base64.encode(bytes),
    }
}

/// Guesses the MIME type of a file from its extension, falling back to
/// `application/octet-stream`.
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Reads and encodes a file, guessing its MIME type from the extension.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<EncodedFilePart, GradeError> {
    let path = path.as_ref();
    encode_file_as(path, mime_type_for(path)).await
}

/// Reads and encodes a file with an explicit MIME type.
pub async fn encode_file_as(
    path: impl AsRef<Path>,
    mime_type: impl Into<String>,
) -> Result<EncodedFilePart, GradeError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| GradeError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!("Encoded {} ({} bytes)", path.display(), bytes.len());

    Ok(encode_bytes(&bytes, mime_type))
}

/// Encodes every file concurrently.
///
/// The output order matches `paths` whatever order the reads finish in. The
/// first failure aborts the whole batch.
pub async fn encode_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<EncodedFilePart>, GradeError> {
    try_join_all(paths.iter().map(|path| encode_file(path))).await
}
