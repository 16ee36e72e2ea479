use std::fmt::Write as _;

use crate::{
    data::{format_float, round_to},
    dataset::ColumnSummary,
    histogram::HistogramResult,
};

const BAR_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let flat = cell.replace(['\n', '\r', '\t'], " ");
            format!("{flat:<width$}")
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

/// One row per bin with a proportional bar of `#` characters.
pub fn histogram_rows(result: &HistogramResult) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "left".to_string(),
        "right".to_string(),
        format!("{} weighted by {}", result.value_column, result.weighting),
        String::new(),
    ];
    let peak = result.max_count();
    let rows = result
        .bins
        .iter()
        .map(|bin| {
            let filled = if peak > 0.0 && bin.count > 0.0 {
                ((bin.count / peak) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            vec![
                format_float(round_to(bin.left, 3)),
                format_float(round_to(bin.right, 3)),
                format_float(bin.count),
                "#".repeat(filled),
            ]
        })
        .collect();
    (headers, rows)
}

pub fn column_rows(summaries: &[ColumnSummary]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "#".to_string(),
        "column".to_string(),
        "values".to_string(),
        "numeric".to_string(),
    ];
    let rows = summaries
        .iter()
        .enumerate()
        .map(|(idx, summary)| {
            vec![
                (idx + 1).to_string(),
                summary.name.clone(),
                summary.non_missing.to_string(),
                summary.numeric.to_string(),
            ]
        })
        .collect();
    (headers, rows)
}
