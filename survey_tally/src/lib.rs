mod config;
use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::config::*;

/// The question text used when an answer record references a question
/// identifier with no definition in the export.
pub const UNKNOWN_QUESTION: &str = "Unknown question";

/// The label synthesized for an option index outside the defined option list
/// of its question.
pub fn undefined_option_label(option_index: u64) -> String {
    format!("Option {} (undefined)", option_index)
}

/// Renders a percentage value to two decimal places with a trailing percent
/// sign, e.g. `75.00%`.
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

// Insertion-ordered mapping on top of a vector of pairs. Display order
// follows the order of the input data, so plain maps are not enough here.
fn ordered_entry<'a, K: PartialEq + Clone, V: Default>(
    map: &'a mut Vec<(K, V)>,
    key: &K,
) -> &'a mut V {
    if let Some(pos) = map.iter().position(|(k, _)| k == key) {
        &mut map[pos].1
    } else {
        map.push((key.clone(), V::default()));
        let last = map.len() - 1;
        &mut map[last].1
    }
}

/// Tallies the answers of a survey and computes counts and percentages for
/// every question.
///
/// Percentages are computed against the total respondent count, which is
/// fixed for the whole survey. Questions and options are returned in the
/// order they are first encountered while scanning the respondents.
///
/// A survey with no respondents yields an empty result set with a total of
/// zero.
pub fn run_survey_stats(survey: &Survey) -> SurveyStats {
    let total = survey.respondents.len() as u64;
    info!(
        "Processing {:?} respondents over {:?} question definitions",
        total,
        survey.questions.len()
    );
    if total == 0 {
        return SurveyStats {
            results: Vec::new(),
            total_respondents: 0,
        };
    }

    // Question identifiers are the 1-based position of the question,
    // stringified, which is how the answer records key them.
    let index: HashMap<String, &SurveyQuestion> = survey
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| ((i + 1).to_string(), q))
        .collect();

    // question id -> option index (1-based) -> count
    let mut tallies: Vec<(String, Vec<(u64, u64)>)> = Vec::new();
    for (lineno, respondent) in survey.respondents.iter().enumerate() {
        for record in respondent.answers.iter() {
            for (question_id, selection) in record.iter() {
                for opt in selection.as_slice() {
                    let option_index = match opt.index() {
                        Some(x) => x,
                        None => {
                            warn!(
                                "respondent {}: skipping unreadable option {:?} for question {}",
                                lineno, opt, question_id
                            );
                            continue;
                        }
                    };
                    let counts = ordered_entry(&mut tallies, question_id);
                    *ordered_entry(counts, &option_index) += 1;
                }
            }
        }
    }
    debug!("run_survey_stats: tallies: {:?}", tallies);

    let mut results: Vec<(String, QuestionResult)> = Vec::new();
    for (question_id, counts) in tallies.iter() {
        let info = index.get(question_id.as_str());
        let question = match info {
            Some(q) => q.question.clone(),
            None => UNKNOWN_QUESTION.to_string(),
        };

        let mut options: Vec<(String, OptionStats)> = Vec::new();
        for (option_index, count) in counts.iter() {
            let text = info
                .and_then(|q| {
                    option_index
                        .checked_sub(1)
                        .and_then(|zero_based| q.choices.get(zero_based as usize))
                })
                .cloned()
                .unwrap_or_else(|| undefined_option_label(*option_index));

            let percentage = (*count as f64 / total as f64) * 100.0;
            *ordered_entry(&mut options, &text) = OptionStats {
                count: *count,
                percentage,
                formatted: format_percentage(percentage),
            };
        }

        results.push((
            question_id.clone(),
            QuestionResult { question, options },
        ));
    }

    SurveyStats {
        results,
        total_respondents: total,
    }
}
