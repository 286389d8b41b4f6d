#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use reqwest::StatusCode;

/// Errors raised while talking to the Gemini `generateContent` endpoint.
#[derive(thiserror::Error, Debug)]
pub enum GeminiError {
    /// The request never produced an HTTP response.
    #[error("Could not reach the Gemini API")]
    Transport(#[from] reqwest::Error),
    /// Gemini answered with a non-success status (bad key, quota, ...).
    #[error("Gemini API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: StatusCode,
        /// Raw response body, usually a JSON error object
        body:   String,
    },
    /// The response envelope did not match the expected shape.
    #[error("Could not decode the Gemini response envelope: {body}")]
    Decode {
        /// serde_json failure
        #[source]
        source: serde_json::Error,
        /// Raw response body
        body:   String,
    },
    /// Gemini returned no candidate text at all.
    #[error("Gemini returned no text{}", blocked_suffix(.block_reason))]
    EmptyResponse {
        /// `promptFeedback.blockReason`, if the prompt was blocked
        block_reason: Option<String>,
    },
}

/// Renders the optional block reason for [`GeminiError::EmptyResponse`].
fn blocked_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" (blocked: {r})"))
        .unwrap_or_default()
}

/// Errors surfaced by answer-key extraction and exam grading.
///
/// Malformed model output never shows up here; the interpreter recovers from
/// it locally.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// An exam page or answer-key file could not be read.
    #[error("Could not read {}", .path.display())]
    Encode {
        /// File that failed to load
        path:   PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// A grading request was built without any exam pages.
    #[error("At least one exam page is required to grade an exam")]
    NoExamPages,
    /// The model call failed.
    #[error(transparent)]
    Model(#[from] GeminiError),
}

/// Errors raised by the Google Sheets wrapper.
#[derive(thiserror::Error, Debug)]
pub enum SheetsError {
    /// No access token, or the stored one has expired.
    #[error(
        "Not authenticated with Google; run `examgrader setup --google-token ...` with a token \
         granted the {} scope",
        crate::sheets::SHEETS_SCOPE
    )]
    NotAuthenticated,
    /// The sheet link does not contain a spreadsheet id.
    #[error("Could not find a spreadsheet id in `{0}`")]
    InvalidLink(String),
    /// The configured API root is not a usable base URL.
    #[error("Invalid Google Sheets endpoint `{0}`")]
    InvalidEndpoint(String),
    /// Transport failure.
    #[error("Could not reach the Google Sheets API")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("Google Sheets API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: StatusCode,
        /// Raw response body
        body:   String,
    },
}
