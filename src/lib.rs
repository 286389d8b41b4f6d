//! # examgrader
//!
//! Grades photographed exams against an answer key with a Gemini model, and
//! optionally logs each result to a Google Sheet.
//!
//! The answer key is extracted from a PDF once, then every exam is sent to
//! the model as one instruction plus its page images. The model's reply is
//! decoded into a [`GradingResult`]; a reply that is not valid JSON still
//! yields a result holding the raw text.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Session object and environment-driven configuration
pub mod config;
/// Error types for the model, grading and Sheets seams
pub mod error;
/// Gemini `generateContent` client and the model abstraction
pub mod gemini;
/// Request building for answer-key extraction and grading
pub mod grade;
/// Decoding of grading replies
pub mod interpret;
/// Base64 inline file parts
pub mod parts;
/// Prompt templates
pub mod prompts;
/// Google Sheets wrapper
pub mod sheets;
/// Settings persisted between runs
pub mod storage;
/// Shared result types
pub mod types;

pub use config::Session;
pub use error::{GeminiError, GradeError, SheetsError};
pub use gemini::{GeminiModel, GenerativeModel, Part};
pub use grade::{GradingRequest, extract_answer_key, grade_exam, grade_files};
pub use interpret::{ScorePolicy, interpret, interpret_with};
pub use parts::{EncodedFilePart, encode_all, encode_bytes, encode_file};
pub use types::GradingResult;
