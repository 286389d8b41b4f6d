#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Credentials and preferences persisted between runs as a small JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Name of the settings file inside the settings directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Seconds shaved off a Google token's lifetime so it is never used right at
/// the edge of expiry.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Returns the settings directory: `EXAMGRADER_HOME`, else
/// `$HOME/.examgrader`, else `./.examgrader`.
pub fn default_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("EXAMGRADER_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".examgrader")
}

/// Everything remembered between runs. Keys match the ones the web app kept
/// in local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key:      Option<String>,
    /// Link to the results spreadsheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_link:   Option<String>,
    /// OAuth client id for Google Sheets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_client_id:    Option<String>,
    /// Most recently extracted (and possibly hand-edited) answer key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_key_markdown: Option<String>,
    /// Google OAuth access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,
    /// Token expiry, unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_token_expiry: Option<i64>,
}

/// A [`Settings`] bound to the file it was loaded from.
///
/// Setters only change the in-memory copy; call [`SettingsStore::save`] to
/// persist them.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Full path of `settings.json`
    path:     PathBuf,
    /// Current values
    settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `dir`; a missing file yields empty settings.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        let settings = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Could not parse {}", path.display()))?
        } else {
            Settings::default()
        };

        Ok(Self { path, settings })
    }

    /// Loads settings from [`default_dir`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_dir())
    }

    /// Writes the settings back to disk, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Could not write {}", self.path.display()))?;
        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Returns the path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the Gemini API key.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.settings.gemini_api_key.as_deref()
    }

    /// Stores the Gemini API key.
    pub fn set_gemini_api_key(&mut self, key: impl Into<String>) {
        self.settings.gemini_api_key = Some(key.into());
    }

    /// Returns the spreadsheet link.
    pub fn google_sheet_link(&self) -> Option<&str> {
        self.settings.google_sheet_link.as_deref()
    }

    /// Stores the spreadsheet link.
    pub fn set_google_sheet_link(&mut self, link: impl Into<String>) {
        self.settings.google_sheet_link = Some(link.into());
    }

    /// Returns the OAuth client id.
    pub fn google_client_id(&self) -> Option<&str> {
        self.settings.google_client_id.as_deref()
    }

    /// Stores the OAuth client id.
    pub fn set_google_client_id(&mut self, client_id: impl Into<String>) {
        self.settings.google_client_id = Some(client_id.into());
    }

    /// Returns the stored answer key.
    pub fn answer_key(&self) -> Option<&str> {
        self.settings.answer_key_markdown.as_deref()
    }

    /// Stores the answer key.
    pub fn set_answer_key(&mut self, answer_key: impl Into<String>) {
        self.settings.answer_key_markdown = Some(answer_key.into());
    }

    /// Returns the Google access token if it has not expired. An expired
    /// token is cleared.
    pub fn google_token(&mut self) -> Option<String> {
        self.google_token_at(Utc::now().timestamp_millis())
    }

    /// [`SettingsStore::google_token`] against an explicit clock.
    pub fn google_token_at(&mut self, now_millis: i64) -> Option<String> {
        let token = self.settings.google_access_token.clone()?;
        let expiry = self.settings.google_token_expiry?;

        if now_millis > expiry {
            tracing::info!("Stored Google token expired; clearing it");
            self.remove_google_token();
            return None;
        }

        Some(token)
    }

    /// Stores a Google access token valid for `expires_in_secs`.
    pub fn set_google_token(&mut self, token: impl Into<String>, expires_in_secs: i64) {
        self.set_google_token_at(token, expires_in_secs, Utc::now().timestamp_millis());
    }

    /// [`SettingsStore::set_google_token`] against an explicit clock.
    pub fn set_google_token_at(
        &mut self,
        token: impl Into<String>,
        expires_in_secs: i64,
        now_millis: i64,
    ) {
        if expires_in_secs <= TOKEN_EXPIRY_MARGIN_SECS {
            tracing::warn!(
                "Google token lifetime of {expires_in_secs}s is within the \
                 {TOKEN_EXPIRY_MARGIN_SECS}s expiry margin; it will be treated as expired"
            );
        }

        let lifetime_millis = expires_in_secs
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .saturating_mul(1000);
        let expiry = now_millis.saturating_add(lifetime_millis);
        self.settings.google_access_token = Some(token.into());
        self.settings.google_token_expiry = Some(expiry);
    }

    /// Forgets the Google access token.
    pub fn remove_google_token(&mut self) {
        self.settings.google_access_token = None;
        self.settings.google_token_expiry = None;
    }
}
