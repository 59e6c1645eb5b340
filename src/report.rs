use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_tally::*;

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod chart;

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening survey file {path}"))]
    OpeningJson { source: io::Error, path: String },
    #[snafu(display("Error parsing survey file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error creating the output directory {path}"))]
    CreatingOutputDir { source: io::Error, path: String },
    #[snafu(display("Error rendering chart {path}: {message}"))]
    Render { message: String, path: String },
    #[snafu(display("Error writing summary {path}"))]
    WritingSummary { source: io::Error, path: String },
    #[snafu(display("The tabulated summary differs from the reference {path}"))]
    SummaryMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// The configuration of one analysis run. The defaults match the original
/// survey campaign this tool was written for.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisConfig {
    pub input_file: String,
    /// The question identifiers for which a chart image is produced.
    pub chart_questions: Vec<String>,
    pub output_dir: String,
    pub render_charts: bool,
    /// Where to write the JSON summary ('stdout' or a file path), if anywhere.
    pub summary_out: Option<String>,
    /// A reference summary to check the tabulated output against.
    pub reference: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            input_file: "Encuesta.json".to_string(),
            chart_questions: ["3", "4", "7", "8", "10", "11", "12"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: "graficos".to_string(),
            render_charts: true,
            summary_out: None,
            reference: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_args(args: &Args) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            input_file: args.input.clone().unwrap_or(defaults.input_file),
            chart_questions: args.charts.clone().unwrap_or(defaults.chart_questions),
            output_dir: args.output_dir.clone().unwrap_or(defaults.output_dir),
            render_charts: !args.no_charts,
            summary_out: args.out.clone(),
            reference: args.reference.clone(),
        }
    }
}

fn load_survey(path: &str) -> ReportResult<Survey> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("load_survey: read {} bytes from {}", contents.len(), path);
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
}

/// Loads and tallies a survey file.
///
/// Input errors do not propagate past this boundary: a missing or unparseable
/// file is reported on the console and yields `(None, 0)`. A valid file with
/// zero respondents yields an empty-but-present result set, so the caller can
/// tell "nothing to show" apart from a failure.
pub fn aggregate(path: &str) -> (Option<SurveyStats>, u64) {
    let survey = match load_survey(path) {
        Ok(s) => s,
        Err(e @ ReportError::OpeningJson { .. }) => {
            warn!("aggregate: {:?}", e);
            println!("Error: the file '{}' was not found.", path);
            return (None, 0);
        }
        Err(e) => {
            warn!("aggregate: {:?}", e);
            println!("Error: the file '{}' is not a valid survey export.", path);
            return (None, 0);
        }
    };
    let stats = run_survey_stats(&survey);
    if stats.total_respondents == 0 {
        println!("Warning: there are no respondents in the file.");
    }
    let total = stats.total_respondents;
    (Some(stats), total)
}

fn result_stats_to_json(stats: &SurveyStats) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for (question_id, qr) in stats.results.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (option_text, os) in qr.options.iter() {
            tally.insert(
                option_text.clone(),
                json!({
                    "count": os.count.to_string(),
                    "percentage": os.formatted,
                }),
            );
        }
        let js = json!({"question": question_id, "text": qr.question, "tally": tally});
        l.push(js);
    }
    l
}

/// The header of the JSON summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub input: String,
    #[serde(rename = "totalRespondents")]
    pub total_respondents: String,
}

fn build_summary_js(config: &AnalysisConfig, stats: &SurveyStats) -> JSValue {
    let c = SummaryConfig {
        input: config.input_file.clone(),
        total_respondents: stats.total_respondents.to_string(),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(stats),
    })
}

pub fn read_summary(path: String) -> ReportResult<JSValue> {
    let contents =
        fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path: path.as_str() })?;
    debug!("read_summary: read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

fn write_summary(out: &str, pretty_js_stats: &str) -> ReportResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js_stats);
    } else {
        fs::write(out, pretty_js_stats).context(WritingSummarySnafu { path: out })?;
        info!("Summary written to {}", out);
    }
    Ok(())
}

/// Runs the whole pipeline: aggregate the input file, print the per-question
/// results on the console, render the charts for the selected questions and
/// optionally write or check the JSON summary.
pub fn run_report(config: &AnalysisConfig) -> ReportResult<()> {
    info!("config: {:?}", config);
    let (maybe_stats, total) = aggregate(&config.input_file);
    let stats = match maybe_stats {
        Some(s) => s,
        // The diagnostic has already been printed.
        None => return Ok(()),
    };
    if stats.results.is_empty() {
        return Ok(());
    }

    println!("\n--- Survey analysis (N={}) ---", total);
    for (question_id, qr) in stats.results.iter() {
        println!("\n--- Question {}: {} ---", question_id, qr.question);
        for (option_text, os) in qr.options.iter() {
            println!("  - {}: {} ({})", option_text, os.count, os.formatted);
        }

        if config.render_charts && config.chart_questions.iter().any(|q| q == question_id) {
            let path = chart::render_bar_chart(question_id, qr, total, &config.output_dir)?;
            println!("Chart saved to {}", path.display());
        }
    }

    if config.render_charts {
        println!(
            "\nAnalysis complete. The charts are in the '{}' directory.",
            config.output_dir
        );
    } else {
        println!("\nAnalysis complete.");
    }

    let result_js = build_summary_js(config, &stats);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {
        path: config.input_file.as_str(),
    })?;

    if let Some(out) = &config.summary_out {
        write_summary(out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &config.reference {
        let summary_ref = read_summary(summary_p.clone())?;
        debug!("run_report: reference summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
                path: summary_p.as_str(),
            })?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return SummaryMismatchSnafu {
                path: summary_p.as_str(),
            }
            .fail();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const BASIC_SURVEY: &str = r#"{
        "questions": [
            {"question": "Do you use digital tools?", "choises": ["Yes", "No"]}
        ],
        "Encuestados": [
            {"Respuestas": [{"1": 1}]},
            {"Respuestas": [{"1": 1}]},
            {"Respuestas": [{"1": 2}]},
            {"Respuestas": [{"1": 1}]}
        ]
    }"#;

    fn write_input(dir: &std::path::Path, contents: &str) -> String {
        let p: PathBuf = dir.join("survey.json");
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    #[test]
    fn aggregate_missing_file_yields_none() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("does_not_exist.json");
        let (stats, total) = aggregate(&p.display().to_string());
        assert!(stats.is_none());
        assert_eq!(total, 0);
    }

    #[test]
    fn aggregate_invalid_json_yields_none() {
        let dir = tempdir().unwrap();
        let p = write_input(dir.path(), "this is not json {");
        let (stats, total) = aggregate(&p);
        assert!(stats.is_none());
        assert_eq!(total, 0);
    }

    #[test]
    fn aggregate_wrong_structure_yields_none() {
        let dir = tempdir().unwrap();
        let p = write_input(dir.path(), r#"{"some": "other", "document": true}"#);
        let (stats, total) = aggregate(&p);
        assert!(stats.is_none());
        assert_eq!(total, 0);
    }

    #[test]
    fn aggregate_zero_respondents_yields_empty_results() {
        let dir = tempdir().unwrap();
        let p = write_input(
            dir.path(),
            r#"{"questions": [{"question": "Q", "choises": ["A"]}], "Encuestados": []}"#,
        );
        let (stats, total) = aggregate(&p);
        let stats = stats.unwrap();
        assert_eq!(total, 0);
        assert!(stats.results.is_empty());
    }

    #[test]
    fn aggregate_basic_survey() {
        let dir = tempdir().unwrap();
        let p = write_input(dir.path(), BASIC_SURVEY);
        let (stats, total) = aggregate(&p);
        let stats = stats.unwrap();
        assert_eq!(total, 4);
        let q = stats.get("1").unwrap();
        assert_eq!(q.options[0].1.count, 3);
        assert_eq!(q.options[0].1.formatted, "75.00%");
    }

    #[test]
    fn config_defaults_match_the_original_campaign() {
        let c = AnalysisConfig::default();
        assert_eq!(c.input_file, "Encuesta.json");
        assert_eq!(c.output_dir, "graficos");
        assert_eq!(
            c.chart_questions,
            vec!["3", "4", "7", "8", "10", "11", "12"]
        );
        assert!(c.render_charts);
    }

    #[test]
    fn summary_json_shape() {
        let dir = tempdir().unwrap();
        let p = write_input(dir.path(), BASIC_SURVEY);
        let (stats, _) = aggregate(&p);
        let config = AnalysisConfig {
            input_file: p,
            ..AnalysisConfig::default()
        };
        let js = build_summary_js(&config, &stats.unwrap());
        assert_eq!(js["config"]["totalRespondents"], json!("4"));
        let results = js["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["question"], json!("1"));
        assert_eq!(results[0]["tally"]["Yes"]["count"], json!("3"));
        assert_eq!(results[0]["tally"]["No"]["percentage"], json!("25.00%"));
    }

    #[test]
    fn summary_matches_its_own_reference() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), BASIC_SURVEY);
        let summary_path = dir.path().join("summary.json").display().to_string();

        // First run writes the summary, second run checks against it.
        let mut config = AnalysisConfig {
            input_file: input,
            render_charts: false,
            summary_out: Some(summary_path.clone()),
            ..AnalysisConfig::default()
        };
        run_report(&config).unwrap();
        config.summary_out = None;
        config.reference = Some(summary_path);
        run_report(&config).unwrap();
    }

    #[test]
    fn mismatched_reference_fails() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), BASIC_SURVEY);
        let ref_path = dir.path().join("reference.json");
        fs::write(&ref_path, r#"{"results": []}"#).unwrap();

        let config = AnalysisConfig {
            input_file: input,
            render_charts: false,
            reference: Some(ref_path.display().to_string()),
            ..AnalysisConfig::default()
        };
        let res = run_report(&config);
        assert!(matches!(res, Err(ReportError::SummaryMismatch { .. })));
    }

    #[test]
    fn run_report_short_circuits_on_missing_input() {
        let dir = tempdir().unwrap();
        let config = AnalysisConfig {
            input_file: dir.path().join("nope.json").display().to_string(),
            ..AnalysisConfig::default()
        };
        // The failure is consumed at the aggregation boundary.
        run_report(&config).unwrap();
        assert!(!dir.path().join("graficos").exists());
    }
}
