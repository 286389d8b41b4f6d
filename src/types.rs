#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize, de};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

/// Outcome of grading one exam.
///
/// Field names on the wire match the JSON contract in the grading prompt.
/// Missing or `null` fields decode to empty/zero values and `score` is not
/// range-checked here; see [`crate::interpret::ScorePolicy`].
#[derive(Tabled, Debug, Clone, PartialEq, Default, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    #[tabled(rename = "Student")]
    /// * `student_name`: name written on the exam, empty if unreadable
    #[serde(default, deserialize_with = "nullable_string")]
    #[builder(default)]
    pub student_name:    String,
    #[tabled(rename = "Score")]
    /// * `score`: total out of 100
    #[serde(default, deserialize_with = "lenient_score")]
    #[builder(default)]
    pub score:           f64,
    #[tabled(rename = "Feedback")]
    /// * `feedback`: overall comment for the student
    #[serde(default, deserialize_with = "nullable_string")]
    #[builder(default)]
    pub feedback:        String,
    #[tabled(skip)]
    /// * `detailed_result`: per-question breakdown, in markdown
    #[serde(default, deserialize_with = "nullable_string")]
    #[builder(default)]
    pub detailed_result: String,
}

impl GradingResult {
    /// Flattens the result into a spreadsheet row:
    /// `[timestamp, student name, score, feedback, detailed result]`.
    pub fn to_row(&self, timestamp: impl Into<String>) -> Vec<String> {
        vec![
            timestamp.into(),
            self.student_name.clone(),
            self.score.to_string(),
            self.feedback.clone(),
            self.detailed_result.clone(),
        ]
    }

    /// Renders the summary table followed by the detailed breakdown.
    pub fn render(&self) -> String {
        let table = Table::new([self])
            .with(Style::modern())
            .with(Panel::header("Grading Result"))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .to_string();

        if self.detailed_result.trim().is_empty() {
            table
        } else {
            format!("{table}\n\n{}", self.detailed_result.trim())
        }
    }
}

/// Reads a string, treating `null` as empty.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a score given as a number or a numeric string; `null` is zero.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    /// Shapes a model has been seen to use for the score.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        /// `85`
        Number(f64),
        /// `"85"`
        Text(String),
    }

    match Option::<Score>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Score::Number(n)) => Ok(n),
        Some(Score::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("score is not a number: {s:?}"))),
    }
}
