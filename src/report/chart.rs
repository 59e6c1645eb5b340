use log::debug;

use plotters::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use snafu::prelude::*;
use survey_tally::QuestionResult;

use crate::report::{CreatingOutputDirSnafu, ReportResult, RenderSnafu};

// Same hue as the original campaign charts.
const BAR_COLOR: RGBColor = RGBColor(0x00, 0x77, 0xb6);

/// Derives a filesystem-safe base name from a question text: the first five
/// whitespace-delimited words joined with underscores, restricted to
/// `[A-Za-z0-9_]`.
pub fn sanitize_title(question: &str) -> String {
    let head: Vec<&str> = question.split_whitespace().take(5).collect();
    head.join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// The file name of the chart for a question: `P<id>_<sanitized title>.png`.
pub fn chart_file_name(question_id: &str, question: &str) -> String {
    format!("P{}_{}.png", question_id, sanitize_title(question))
}

/// The upper bound of the percentage axis: fixed at 100, widened when a
/// multi-select question pushes an option above it.
pub fn x_axis_upper_bound(percentages: &[f64]) -> f64 {
    let max_pct = percentages.iter().cloned().fold(0.0_f64, f64::max);
    (max_pct + 10.0).max(100.0)
}

// The rows are drawn bottom-up, so the first option maps to the top row.
fn label_for_row(labels: &[String], row: i32) -> String {
    let rows = labels.len() as i32;
    let i = rows - 1 - row;
    if (0..rows).contains(&i) {
        labels[i as usize].clone()
    } else {
        String::new()
    }
}

/// Renders one question's results as a horizontal bar chart and writes it as
/// a PNG file under `output_dir` (created if missing, existing files are
/// overwritten). Returns the path of the written file.
pub fn render_bar_chart(
    question_id: &str,
    result: &QuestionResult,
    total_respondents: u64,
    output_dir: &str,
) -> ReportResult<PathBuf> {
    fs::create_dir_all(output_dir).context(CreatingOutputDirSnafu { path: output_dir })?;
    let file_path = Path::new(output_dir).join(chart_file_name(question_id, &result.question));
    debug!("render_bar_chart: rendering to {:?}", file_path);

    let labels: Vec<String> = result.options.iter().map(|(t, _)| t.clone()).collect();
    let values: Vec<f64> = result.options.iter().map(|(_, s)| s.percentage).collect();
    let rows = labels.len();
    let x_max = x_axis_upper_bound(&values);

    let err = |message: String| {
        RenderSnafu {
            message,
            path: file_path.display().to_string(),
        }
        .build()
    };

    // The drawing area is flushed and dropped before returning, one chart at
    // a time.
    {
        let root = BitMapBackend::new(&file_path, (1000, 600)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| err(e.to_string()))?;

        let caption = format!(
            "P{}: {} (N={})",
            question_id, result.question, total_respondents
        );
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(260)
            .build_cartesian_2d(0f64..x_max, (0..rows as i32).into_segmented())
            .map_err(|e| err(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Share of respondents (%)")
            .y_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(r) => label_for_row(&labels, *r),
                _ => String::new(),
            })
            .draw()
            .map_err(|e| err(e.to_string()))?;

        for (i, value) in values.iter().enumerate() {
            let row = (rows - 1 - i) as i32;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(row)),
                        (*value, SegmentValue::Exact(row + 1)),
                    ],
                    BAR_COLOR.filled(),
                )))
                .map_err(|e| err(e.to_string()))?;
            // The percentage, just past the end of the bar.
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{:.1}%", value),
                    (*value + 0.5, SegmentValue::CenterOf(row)),
                    ("sans-serif", 15),
                )))
                .map_err(|e| err(e.to_string()))?;
        }

        root.present().map_err(|e| err(e.to_string()))?;
    }

    Ok(file_path)
}
