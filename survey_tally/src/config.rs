// ********* Input data structures ***********

use serde::Deserialize;
use std::collections::BTreeMap;

/// One question definition from the export: the prompt text and its ordered
/// list of answer options.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct SurveyQuestion {
    pub question: String,
    // The export spells the field this way.
    #[serde(rename = "choises")]
    pub choices: Vec<String>,
}

/// One participant's full set of answers.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct Respondent {
    #[serde(rename = "Respuestas")]
    pub answers: Vec<AnswerRecord>,
}

/// A single answer record: one question identifier (the 1-based position of
/// the question, as a string) mapped to the selection made by the respondent.
pub type AnswerRecord = BTreeMap<String, Selection>;

/// The selection for one question. Single-select questions carry one option
/// reference, multi-select questions carry a list of them.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    One(OptionRef),
    Many(Vec<OptionRef>),
}

impl Selection {
    /// The selection as a uniform sequence, regardless of how it was written
    /// in the export.
    pub fn as_slice(&self) -> &[OptionRef] {
        match self {
            Selection::One(r) => std::slice::from_ref(r),
            Selection::Many(rs) => rs,
        }
    }
}

/// A reference to an answer option: the 1-based index of the option within
/// the question's option list, written either as a JSON number or as a
/// numeric string.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionRef {
    Index(u64),
    Text(String),
}

impl OptionRef {
    /// The 1-based option index, if the reference is readable as one.
    pub fn index(&self) -> Option<u64> {
        match self {
            OptionRef::Index(n) => Some(*n),
            OptionRef::Text(s) => s.trim().parse::<u64>().ok(),
        }
    }
}

/// The raw survey export.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct Survey {
    pub questions: Vec<SurveyQuestion>,
    #[serde(rename = "Encuestados")]
    pub respondents: Vec<Respondent>,
}

// ******** Output data structures *********

/// The tally for one answer option.
///
/// The percentage is computed against the total respondent count, not the
/// total number of selections. For multi-select questions this means the
/// percentages of one question may sum above 100.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct OptionStats {
    pub count: u64,
    pub percentage: f64,
    /// The percentage rounded to two decimals, with a trailing percent sign.
    pub formatted: String,
}

/// The aggregated results for one question. Options appear in the order they
/// were first encountered while scanning the respondents.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionResult {
    pub question: String,
    pub options: Vec<(String, OptionStats)>,
}

/// The aggregated results for the whole survey, keyed by question identifier
/// in first-encounter order.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyStats {
    pub results: Vec<(String, QuestionResult)>,
    pub total_respondents: u64,
}

impl SurveyStats {
    pub fn get(&self, question_id: &str) -> Option<&QuestionResult> {
        self.results
            .iter()
            .find(|(qid, _)| qid == question_id)
            .map(|(_, r)| r)
    }
}
