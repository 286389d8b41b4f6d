#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use reqwest::Client;

use crate::{
    error::{GradeError, SheetsError},
    gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiModel},
    grade,
    interpret::ScorePolicy,
    parts::encode_file,
    prompts::Prompts,
    sheets::SheetsClient,
    storage::SettingsStore,
    types::GradingResult,
};

/// Default timeout for a single model call, in seconds. Multi-page vision
/// requests on the pro models routinely take over a minute.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Gemini tuning parameters sourced from the environment.
#[derive(Debug, Clone)]
pub struct GeminiEnv {
    /// `GEMINI_API_KEY`, if set
    api_key:  Option<String>,
    /// `GEMINI_MODEL`, or [`DEFAULT_MODEL`]
    model:    String,
    /// `GEMINI_ENDPOINT`, or [`DEFAULT_ENDPOINT`]
    endpoint: String,
    /// `EXAMGRADER_TIMEOUT_SECS`, or [`DEFAULT_TIMEOUT_SECS`]
    timeout:  Duration,
}

impl GeminiEnv {
    /// Reads the Gemini settings from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key:  read_var("GEMINI_API_KEY"),
            model:    read_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: read_var("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout:  read_timeout_secs("EXAMGRADER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Returns the API key from the environment, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the API root.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Everything one grading run needs, built once by the caller and passed
/// around explicitly.
///
/// Two sessions with different keys can grade concurrently; nothing here is
/// global.
#[derive(Clone)]
pub struct Session {
    /// HTTP client shared by the Gemini and Sheets wrappers
    http:         Client,
    /// Model handle
    gemini:       GeminiModel,
    /// Prompt templates
    prompts:      Prompts,
    /// How decoded scores are treated
    score_policy: ScorePolicy,
}

impl Session {
    /// Creates a session for `api_key`, taking the remaining Gemini settings
    /// from `env`.
    pub fn new(api_key: impl Into<String>, env: &GeminiEnv) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to construct shared HTTP client")?;

        let gemini = GeminiModel::builder()
            .http(http.clone())
            .api_key(api_key)
            .model(env.model())
            .endpoint(env.endpoint())
            .timeout(env.timeout())
            .build();

        Ok(Self {
            http,
            gemini,
            prompts: Prompts::default(),
            score_policy: ScorePolicy::default(),
        })
    }

    /// Creates a session using `GEMINI_API_KEY`, falling back to the key in
    /// `store`.
    pub fn from_env_or_store(store: &SettingsStore) -> Result<Self> {
        let env = GeminiEnv::from_env();
        let key = match env.api_key().or_else(|| store.gemini_api_key()) {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!(
                "No Gemini API key configured. Run `examgrader setup --api-key <KEY>` or set \
                 GEMINI_API_KEY."
            ),
        };

        Self::new(key, &env)
    }

    /// Returns a copy using `policy` for decoded scores.
    pub fn with_score_policy(mut self, policy: ScorePolicy) -> Self {
        self.score_policy = policy;
        self
    }

    /// Returns a copy using custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Returns the model handle.
    pub fn gemini(&self) -> &GeminiModel {
        &self.gemini
    }

    /// Returns the prompt templates.
    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Returns the score policy.
    pub fn score_policy(&self) -> ScorePolicy {
        self.score_policy
    }

    /// Returns a clone of the shared HTTP client.
    pub fn http_client(&self) -> Client {
        self.http.clone()
    }

    /// Extracts the answer key from a PDF on disk.
    pub async fn extract_answer_key(&self, pdf: impl AsRef<Path>) -> Result<String, GradeError> {
        let part = encode_file(pdf).await?;
        grade::extract_answer_key_with(&self.gemini, &self.prompts, part).await
    }

    /// Grades the exam pages at `pages` against `answer_key`.
    pub async fn grade<P: AsRef<Path>>(
        &self,
        answer_key: &str,
        pages: &[P],
    ) -> Result<GradingResult, GradeError> {
        grade::grade_files(&self.gemini, &self.prompts, answer_key, pages, self.score_policy)
            .await
    }

    /// Builds a Sheets client from a stored token.
    pub fn sheets(&self, token: Option<String>) -> Result<SheetsClient, SheetsError> {
        SheetsClient::authenticated(self.http_client(), token)
    }
}

/// Reads a trimmed, non-empty environment variable.
fn read_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
