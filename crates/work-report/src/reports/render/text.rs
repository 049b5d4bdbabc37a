use super::table::{Column, TabularReport};
use std::fmt::Write;

const MAX_COLUMN_WIDTH: usize = 48;

/// Plain-text rendering for terminals. Continuation rows leave group columns blank.
pub fn render_text(table: &TabularReport) -> String {
    let header = TabularReport::header();
    let lines: Vec<[String; 6]> = table
        .rows
        .iter()
        .map(|row| {
            let mut line: [String; 6] = Default::default();
            for (slot, column) in line.iter_mut().zip(Column::ALL) {
                *slot = match column {
                    Column::Tasks => row.task.to_string(),
                    _ => row
                        .cell(column)
                        .map(|cell| cell.text.clone())
                        .unwrap_or_default(),
                };
            }
            line
        })
        .collect();

    let mut widths = header.map(|label| label.chars().count());
    for line in &lines {
        for (width, text) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(text.chars().count()).min(MAX_COLUMN_WIDTH);
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for line in &lines {
        push_line(&mut out, line.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 6]) {
    let rendered: Vec<String> = cells
        .zip(widths)
        .map(|(text, &width)| format!("{:<width$}", truncate(text, width)))
        .collect();
    let _ = writeln!(out, "{}", rendered.join(" | ").trim_end());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
