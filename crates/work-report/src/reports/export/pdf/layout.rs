use super::writer::{text_width, wrap, Canvas, Font, PAGE_HEIGHT, PAGE_WIDTH};
use super::{AttendanceSection, SummaryDocument};
use crate::reports::render::{Cell, Column, TableRow, TabularReport};
use std::collections::HashMap;
use std::fmt;

const MARGIN: f32 = 36.0;
const FOOTER_HEIGHT: f32 = 30.0;
const BODY_SIZE: f32 = 8.0;
const LEADING: f32 = 10.0;
const PADDING: f32 = 3.0;
const HEADER_ROW_HEIGHT: f32 = 16.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BODY_BOTTOM: f32 = PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT;

const TABLE_SHARES: [f32; 6] = [0.13, 0.13, 0.14, 0.08, 0.12, 0.40];
const ATTENDANCE_SHARES: [f32; 5] = [0.36, 0.16, 0.16, 0.16, 0.16];
const ATTENDANCE_HEADER: [&str; 5] = [
    "Manager",
    "Total Resources",
    "Present",
    "Absent",
    "Attendance %",
];

/// A table row placed on a page. Group cells are present on the first row of each
/// group on that page, with the span trimmed to the rows the page holds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PagedRow {
    pub(crate) row: usize,
    pub(crate) group_cells: Vec<Cell>,
    pub(crate) height: f32,
}

/// Splits rows into pages by height. The first page may have less room than the rest.
pub(crate) fn paginate(
    rows: &[TableRow],
    heights: &[f32],
    first_capacity: f32,
    capacity: f32,
) -> Vec<Vec<PagedRow>> {
    let mut pages: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();
    let mut remaining = first_capacity;

    for (index, &height) in heights.iter().enumerate().take(rows.len()) {
        if height > remaining && (!current.is_empty() || remaining < capacity) {
            pages.push(std::mem::take(&mut current));
            remaining = capacity;
        }
        current.push(index);
        remaining -= height;
    }
    if !current.is_empty() {
        pages.push(current);
    }

    let mut group_heads: HashMap<usize, &[Cell]> = HashMap::new();
    for row in rows.iter().filter(|row| row.starts_group()) {
        group_heads.entry(row.group_index).or_insert(&row.group_cells);
    }

    pages
        .into_iter()
        .map(|page| {
            let mut spans: HashMap<usize, usize> = HashMap::new();
            for &index in &page {
                *spans.entry(rows[index].group_index).or_default() += 1;
            }

            let mut opened = Vec::new();
            page.iter()
                .map(|&index| {
                    let group = rows[index].group_index;
                    let group_cells: Vec<Cell> = if opened.contains(&group) {
                        Vec::new()
                    } else {
                        opened.push(group);
                        let span = spans.get(&group).copied().unwrap_or(1);
                        group_heads
                            .get(&group)
                            .map(|cells| {
                                cells
                                    .iter()
                                    .map(|cell| Cell {
                                        row_span: span,
                                        ..cell.clone()
                                    })
                                    .collect()
                            })
                            .unwrap_or_default()
                    };
                    PagedRow {
                        row: index,
                        group_cells,
                        height: heights[index],
                    }
                })
                .collect()
        })
        .collect()
}

struct Composer {
    done: Vec<Canvas>,
    current: Canvas,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Canvas::default(),
            y: MARGIN,
        }
    }

    fn remaining(&self) -> f32 {
        BODY_BOTTOM - self.y
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = MARGIN;
    }

    fn finish(mut self, contact_line: &str) -> Result<Vec<Canvas>, fmt::Error> {
        self.done.push(self.current);
        let total = self.done.len();
        for (index, page) in self.done.iter_mut().enumerate() {
            let baseline = PAGE_HEIGHT - MARGIN + 8.0;
            page.line(MARGIN, baseline - 12.0, PAGE_WIDTH - MARGIN, baseline - 12.0)?;
            page.text(Font::Regular, BODY_SIZE, MARGIN, baseline, contact_line)?;
            let label = format!("Page {} of {}", index + 1, total);
            let x = PAGE_WIDTH - MARGIN - text_width(&label, BODY_SIZE);
            page.text(Font::Regular, BODY_SIZE, x, baseline, &label)?;
        }
        Ok(self.done)
    }
}

fn column_widths<const N: usize>(shares: [f32; N]) -> [f32; N] {
    shares.map(|share| share * CONTENT_WIDTH)
}

fn lines_for(text: &str, width: f32) -> Vec<String> {
    wrap(text, BODY_SIZE, width - 2.0 * PADDING)
}

fn cell_height(lines: usize) -> f32 {
    lines as f32 * LEADING + 2.0 * PADDING
}

fn draw_cell(
    canvas: &mut Canvas,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    text: &str,
) -> fmt::Result {
    canvas.stroke_rect(x, y, width, height)?;
    let fits = (((height - 2.0 * PADDING) / LEADING).floor() as usize).max(1);
    for (line_no, line) in lines_for(text, width).iter().take(fits).enumerate() {
        let baseline = y + PADDING + BODY_SIZE + line_no as f32 * LEADING;
        canvas.text(Font::Regular, BODY_SIZE, x + PADDING, baseline, line)?;
    }
    Ok(())
}

fn draw_header(canvas: &mut Canvas, y: f32, labels: &[&str], widths: &[f32]) -> fmt::Result {
    canvas.fill_rect(MARGIN, y, CONTENT_WIDTH, HEADER_ROW_HEIGHT, 0.85)?;
    let mut x = MARGIN;
    for (label, width) in labels.iter().zip(widths) {
        canvas.stroke_rect(x, y, *width, HEADER_ROW_HEIGHT)?;
        canvas.text(Font::Bold, BODY_SIZE, x + PADDING, y + PADDING + BODY_SIZE, label)?;
        x += width;
    }
    Ok(())
}

fn compose_heading(composer: &mut Composer, document: &SummaryDocument) -> fmt::Result {
    composer.y += 16.0;
    composer
        .current
        .text(Font::Bold, 16.0, MARGIN, composer.y, &document.title)?;
    composer.y += 16.0;

    let generated = format!(
        "Generated on: {}",
        document.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    composer
        .current
        .text(Font::Regular, 9.0, MARGIN, composer.y, &generated)?;
    composer.y += 12.0;

    if let Some(description) = &document.filter_description {
        for line in wrap(description, 9.0, CONTENT_WIDTH) {
            composer.current.text(Font::Regular, 9.0, MARGIN, composer.y, &line)?;
            composer.y += 12.0;
        }
    }
    composer.y += 8.0;
    Ok(())
}

fn compose_attendance(composer: &mut Composer, section: &AttendanceSection) -> fmt::Result {
    let widths = column_widths(ATTENDANCE_SHARES);
    let row_height = cell_height(1);

    if composer.remaining() < 14.0 + HEADER_ROW_HEIGHT + row_height {
        composer.new_page();
    }
    composer.y += 11.0;
    let heading = format!("Attendance Summary ({})", section.date.format("%Y-%m-%d"));
    composer
        .current
        .text(Font::Bold, 11.0, MARGIN, composer.y, &heading)?;
    composer.y += 6.0;
    draw_header(&mut composer.current, composer.y, &ATTENDANCE_HEADER, &widths)?;
    composer.y += HEADER_ROW_HEIGHT;

    for entry in &section.entries {
        if composer.remaining() < row_height {
            composer.new_page();
            draw_header(&mut composer.current, composer.y, &ATTENDANCE_HEADER, &widths)?;
            composer.y += HEADER_ROW_HEIGHT;
        }
        let values = [
            entry.manager.clone(),
            entry.total_resources.to_string(),
            entry.present.to_string(),
            entry.absent.to_string(),
            entry.attendance_pct_label(),
        ];
        let mut x = MARGIN;
        for (value, width) in values.iter().zip(widths) {
            draw_cell(&mut composer.current, x, composer.y, width, row_height, value)?;
            x += width;
        }
        composer.y += row_height;
    }
    composer.y += 12.0;
    Ok(())
}

fn row_heights(table: &TabularReport, widths: &[f32; 6], max_height: f32) -> Vec<f32> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut lines = lines_for(&row.task.to_string(), widths[5]).len();
            for cell in row.group_cells.iter().filter(|cell| cell.row_span == 1) {
                let width = column_index(cell.column).map_or(widths[0], |index| widths[index]);
                lines = lines.max(lines_for(&cell.text, width).len());
            }
            cell_height(lines).min(max_height)
        })
        .collect()
}

fn column_index(column: Column) -> Option<usize> {
    Column::ALL.iter().position(|candidate| *candidate == column)
}

fn compose_table(composer: &mut Composer, table: &TabularReport) -> fmt::Result {
    let widths = column_widths(TABLE_SHARES);
    let labels = TabularReport::header();
    let full_capacity = BODY_BOTTOM - MARGIN - HEADER_ROW_HEIGHT;
    let heights = row_heights(table, &widths, full_capacity);

    let needed = 17.0 + HEADER_ROW_HEIGHT + heights.first().copied().unwrap_or(0.0);
    if composer.remaining() < needed {
        composer.new_page();
    }
    composer.y += 11.0;
    composer
        .current
        .text(Font::Bold, 11.0, MARGIN, composer.y, "Work Report Summary")?;
    composer.y += 6.0;

    let first_capacity = composer.remaining() - HEADER_ROW_HEIGHT;
    let pages = paginate(&table.rows, &heights, first_capacity, full_capacity);
    if pages.is_empty() {
        draw_header(&mut composer.current, composer.y, &labels, &widths)?;
        return Ok(());
    }

    let mut offsets = [MARGIN; 6];
    for index in 1..offsets.len() {
        offsets[index] = offsets[index - 1] + widths[index - 1];
    }

    for (page_no, page) in pages.iter().enumerate() {
        if page_no > 0 {
            composer.new_page();
        }
        if page.is_empty() {
            continue;
        }
        draw_header(&mut composer.current, composer.y, &labels, &widths)?;
        composer.y += HEADER_ROW_HEIGHT;

        for (position, placed) in page.iter().enumerate() {
            for cell in &placed.group_cells {
                let Some(index) = column_index(cell.column) else {
                    continue;
                };
                let span_height: f32 = page[position..]
                    .iter()
                    .take(cell.row_span)
                    .map(|row| row.height)
                    .sum();
                draw_cell(
                    &mut composer.current,
                    offsets[index],
                    composer.y,
                    widths[index],
                    span_height,
                    &cell.text,
                )?;
            }
            let task = table.rows[placed.row].task.to_string();
            draw_cell(
                &mut composer.current,
                offsets[5],
                composer.y,
                widths[5],
                placed.height,
                &task,
            )?;
            composer.y += placed.height;
        }
    }
    Ok(())
}

/// Lays the document out into page content streams, footers included.
pub(crate) fn compose(document: &SummaryDocument) -> Result<Vec<Canvas>, fmt::Error> {
    let mut composer = Composer::new();
    compose_heading(&mut composer, document)?;

    if let Some(section) = document
        .attendance
        .as_ref()
        .filter(|section| !section.entries.is_empty())
    {
        compose_attendance(&mut composer, section)?;
    }

    compose_table(&mut composer, &document.table)?;
    composer.finish(&document.contact_line)
}
