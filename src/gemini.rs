#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Minimal client for Gemini's REST `generateContent` endpoint.
//!
//! Only what a single request/response cycle needs: text and inline-data
//! parts on the way in, the first candidate's text on the way out. Failed
//! calls are never retried.

use std::{future::Future, time::Duration};

use bon::Builder;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{error::GeminiError, parts::EncodedFilePart};

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// API root used when `GEMINI_ENDPOINT` is not set.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One element of a prompt: either text or an inline file.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text
    Text {
        /// The text content
        text: String,
    },
    /// A base64 file payload
    InlineData {
        /// Encoded file with its MIME type
        #[serde(rename = "inlineData")]
        inline_data: EncodedFilePart,
    },
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Returns the text if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }

    /// Returns the encoded file if this is an inline-data part.
    pub fn as_inline_data(&self) -> Option<&EncodedFilePart> {
        match self {
            Part::Text { .. } => None,
            Part::InlineData { inline_data } => Some(inline_data),
        }
    }
}

impl From<EncodedFilePart> for Part {
    fn from(inline_data: EncodedFilePart) -> Self {
        Part::InlineData { inline_data }
    }
}

/// Anything that turns a sequence of prompt parts into free-form text.
///
/// [`GeminiModel`] is the production implementation; tests substitute their
/// own.
pub trait GenerativeModel {
    /// Sends `parts` as a single user turn and returns the model's text.
    fn generate(&self, parts: Vec<Part>)
    -> impl Future<Output = Result<String, GeminiError>> + Send;
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// `user` for requests, `model` in responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role:  Option<String>,
    /// Ordered prompt parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; always exactly one user turn here
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Wraps `parts` in a single user turn.
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate completions, possibly empty when the prompt was blocked
    #[serde(default)]
    pub candidates:      Vec<Candidate>,
    /// Present when the prompt itself was rejected
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Candidate completion item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; missing when generation stopped early
    pub content:       Option<CandidateContent>,
    /// `STOP`, `MAX_TOKENS`, `SAFETY`, ...
    pub finish_reason: Option<String>,
}

/// Content of a candidate. Kept separate from [`Content`] because response
/// parts may carry fields (thoughts, function calls) we do not model.
#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    /// Response parts
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A response part; only text is of interest.
#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    /// Generated text, if this is a text part
    pub text:    Option<String>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default)]
    pub thought: bool,
}

/// Feedback about the prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Why the prompt was blocked
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn into_text(self) -> Result<String, GeminiError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GeminiError::EmptyResponse { block_reason });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let block_reason =
                block_reason.or(candidate.finish_reason.filter(|reason| reason != "STOP"));
            return Err(GeminiError::EmptyResponse { block_reason });
        }

        Ok(text)
    }
}

/// A Gemini model reachable over HTTPS.
///
/// Holds only a credential and a model id, so it is cheap to recreate per
/// call and safe to share between concurrent grading attempts.
#[derive(Clone, Builder)]
#[builder(on(String, into))]
pub struct GeminiModel {
    /// Shared HTTP client
    #[builder(default)]
    http:     Client,
    /// Gemini API key
    api_key:  String,
    /// Model identifier, eg. `gemini-3-pro-preview`
    #[builder(default = DEFAULT_MODEL.to_string())]
    model:    String,
    /// API root, without a trailing slash
    #[builder(default = DEFAULT_ENDPOINT.to_string())]
    endpoint: String,
    /// Per-request timeout
    #[builder(default = Duration::from_secs(300))]
    timeout:  Duration,
}

impl GeminiModel {
    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the full `generateContent` URL for this model.
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

impl GenerativeModel for GeminiModel {
    async fn generate(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        tracing::info!("Sending {} part(s) to {}", parts.len(), self.model);

        let response = self
            .http
            .post(self.url())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::new(parts))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeminiError::Status { status, body });
        }

        let envelope: GenerateContentResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(source) => return Err(GeminiError::Decode { source, body }),
        };

        envelope.into_text()
    }
}
