use super::table::{Column, TabularReport};
use std::fmt::Write;

/// Escape text for HTML attribute and body positions.
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the table as an HTML `<table>` fragment with `rowspan` on group cells.
pub fn render_html(table: &TabularReport) -> String {
    let mut buf = String::from("<table class=\"work-report\"><thead><tr>");
    for column in Column::ALL {
        let _ = write!(buf, "<th>{}</th>", esc(column.label()));
    }
    buf.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        buf.push_str("<tr>");
        for cell in &row.group_cells {
            if cell.row_span > 1 {
                let _ = write!(buf, "<td rowspan=\"{}\">{}</td>", cell.row_span, esc(&cell.text));
            } else {
                let _ = write!(buf, "<td>{}</td>", esc(&cell.text));
            }
        }
        let _ = write!(buf, "<td>{}</td></tr>", esc(&row.task.to_string()));
    }

    buf.push_str("</tbody></table>");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::render::table::{Cell, TableRow, TaskCell};

    fn cells(span: usize) -> Vec<Cell> {
        Column::GROUP
            .iter()
            .map(|&column| Cell {
                column,
                text: if column == Column::Team { "R&D".to_string() } else { "x".to_string() },
                row_span: span,
            })
            .collect()
    }

    #[test]
    fn spans_and_escapes_group_cells() {
        let table = TabularReport {
            rows: vec![
                TableRow {
                    group_index: 0,
                    group_cells: cells(2),
                    task: TaskCell::Task {
                        status: "WIP".to_string(),
                        details: "<draft>".to_string(),
                    },
                },
                TableRow {
                    group_index: 0,
                    group_cells: Vec::new(),
                    task: TaskCell::NoTasks,
                },
            ],
        };

        let html = render_html(&table);
        assert_eq!(html.matches("rowspan=\"2\"").count(), 5);
        assert!(html.contains("<td rowspan=\"2\">R&amp;D</td>"));
        assert!(html.contains("<td>WIP: &lt;draft&gt;</td>"));
        assert_eq!(html.matches("<tr>").count(), 3);
    }
}
