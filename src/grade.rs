#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds the two model requests this tool makes: answer-key extraction from
//! a PDF, and grading of exam pages against that key.

use std::path::Path;

use crate::{
    error::GradeError,
    gemini::{GenerativeModel, Part},
    interpret::{ScorePolicy, interpret_with},
    parts::{EncodedFilePart, encode_all},
    prompts::Prompts,
    types::GradingResult,
};

/// One grading invocation: the rendered instruction plus the exam pages.
///
/// Built once and never mutated; the constructor rejects an empty page set so
/// the model is never asked to grade nothing.
#[derive(Debug, Clone)]
pub struct GradingRequest {
    /// Grading instructions with the answer key embedded
    instruction_text:      String,
    /// Answer key as supplied by the caller
    reference_answer_text: String,
    /// Exam pages, in the order they were given
    student_parts:         Vec<EncodedFilePart>,
}

impl GradingRequest {
    /// Creates a request with the built-in grading prompt.
    pub fn new(
        answer_key: impl Into<String>,
        pages: Vec<EncodedFilePart>,
    ) -> Result<Self, GradeError> {
        Self::with_prompts(&Prompts::default(), answer_key, pages)
    }

    /// Creates a request rendering `prompts`' grading template.
    pub fn with_prompts(
        prompts: &Prompts,
        answer_key: impl Into<String>,
        pages: Vec<EncodedFilePart>,
    ) -> Result<Self, GradeError> {
        if pages.is_empty() {
            return Err(GradeError::NoExamPages);
        }

        let reference_answer_text = answer_key.into();
        Ok(Self {
            instruction_text: prompts.grade_exam(&reference_answer_text),
            reference_answer_text,
            student_parts: pages,
        })
    }

    /// Returns the rendered instruction.
    pub fn instruction_text(&self) -> &str {
        &self.instruction_text
    }

    /// Returns the answer key.
    pub fn reference_answer_text(&self) -> &str {
        &self.reference_answer_text
    }

    /// Returns the exam pages.
    pub fn student_parts(&self) -> &[EncodedFilePart] {
        &self.student_parts
    }

    /// Consumes the request into model parts: the instruction first, then
    /// every page in order.
    pub fn into_parts(self) -> Vec<Part> {
        std::iter::once(Part::text(self.instruction_text))
            .chain(self.student_parts.into_iter().map(Part::from))
            .collect()
    }
}

/// Asks the model to pull the answer key out of a PDF, using the built-in
/// prompt. The reply is returned verbatim.
pub async fn extract_answer_key<M: GenerativeModel>(
    model: &M,
    pdf: EncodedFilePart,
) -> Result<String, GradeError> {
    extract_answer_key_with(model, &Prompts::default(), pdf).await
}

/// Like [`extract_answer_key`], with a custom prompt set.
pub async fn extract_answer_key_with<M: GenerativeModel>(
    model: &M,
    prompts: &Prompts,
    pdf: EncodedFilePart,
) -> Result<String, GradeError> {
    let parts = vec![Part::text(prompts.extract_answer_key()), Part::from(pdf)];

    let text = model.generate(parts).await.inspect_err(|e| {
        tracing::error!("Error extracting answer key from PDF: {e}");
    })?;
    Ok(text)
}

/// Sends a grading request and interprets the reply.
///
/// Only a failed model call is an error; an unparseable reply comes back as
/// a degraded [`GradingResult`].
pub async fn grade_exam<M: GenerativeModel>(
    model: &M,
    request: GradingRequest,
    policy: ScorePolicy,
) -> Result<GradingResult, GradeError> {
    let pages = request.student_parts().len();
    let text = model.generate(request.into_parts()).await.inspect_err(|e| {
        tracing::error!("Error grading exam: {e}");
    })?;

    let result = interpret_with(&text, policy);
    let student = match result.student_name.as_str() {
        "" => "<unknown>",
        name => name,
    };
    tracing::info!("Graded {pages} page(s): {student} scored {}", result.score);
    Ok(result)
}

/// Encodes exam pages from disk concurrently, then grades them.
///
/// If any page fails to load, nothing is sent to the model.
pub async fn grade_files<M, P>(
    model: &M,
    prompts: &Prompts,
    answer_key: &str,
    pages: &[P],
    policy: ScorePolicy,
) -> Result<GradingResult, GradeError>
where
    M: GenerativeModel,
    P: AsRef<Path>,
{
    if pages.is_empty() {
        return Err(GradeError::NoExamPages);
    }

    let parts = encode_all(pages).await?;
    let request = GradingRequest::with_prompts(prompts, answer_key, parts)?;
    grade_exam(model, request, policy).await
}
