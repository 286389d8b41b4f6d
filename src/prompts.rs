#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Instruction templates sent to the model.

use serde::{Deserialize, Serialize};

/// Placeholder in the grading template that receives the answer key.
pub const ANSWER_KEY_PLACEHOLDER: &str = "{answer_key}";

/// Prompt templates for answer-key extraction and grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompts {
    /// Asks for the answer key inside a PDF as clean, sectioned text.
    extract_answer_key: String,
    /// Grading instructions and the JSON output contract; contains
    /// [`ANSWER_KEY_PLACEHOLDER`].
    grade_exam:         String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            extract_answer_key: include_str!("prompts/extract_answer_key.md").to_string(),
            grade_exam:         include_str!("prompts/grade_exam.md").to_string(),
        }
    }
}

impl Prompts {
    /// Returns the answer-key extraction prompt.
    pub fn extract_answer_key(&self) -> &str {
        &self.extract_answer_key
    }

    /// Returns the raw grading template, placeholder included.
    pub fn grade_exam_template(&self) -> &str {
        &self.grade_exam
    }

    /// Renders the grading prompt with `answer_key` embedded inline.
    pub fn grade_exam(&self, answer_key: &str) -> String {
        self.grade_exam
            .replacen(ANSWER_KEY_PLACEHOLDER, answer_key.trim(), 1)
    }

    /// Returns a copy with a custom grading template.
    pub fn with_grade_exam(mut self, template: impl Into<String>) -> Self {
        self.grade_exam = template.into();
        self
    }

    /// Returns a copy with a custom extraction prompt.
    pub fn with_extract_answer_key(mut self, prompt: impl Into<String>) -> Self {
        self.extract_answer_key = prompt.into();
        self
    }
}
