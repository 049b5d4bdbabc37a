mod layout;
mod writer;

use super::ExportError;
use crate::config::ExportConfig;
use crate::reports::aggregate::AttendanceSummaryEntry;
use crate::reports::render::TabularReport;
use chrono::{NaiveDate, NaiveDateTime};

/// Attendance rows printed ahead of the report table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSection {
    pub date: NaiveDate,
    pub entries: Vec<AttendanceSummaryEntry>,
}

/// Everything printed in the summary PDF.
#[derive(Debug, Clone)]
pub struct SummaryDocument {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub filter_description: Option<String>,
    /// Omitted from the document when `None` or empty.
    pub attendance: Option<AttendanceSection>,
    pub table: TabularReport,
    pub contact_line: String,
}

#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl SummaryDocument {
    pub fn new(config: &ExportConfig, table: TabularReport, generated_at: NaiveDateTime) -> Self {
        Self {
            title: config.title.clone(),
            generated_at,
            filter_description: None,
            attendance: None,
            table,
            contact_line: config.contact_line.clone(),
        }
    }

    pub fn with_filter_description(mut self, description: Option<String>) -> Self {
        self.filter_description = description;
        self
    }

    pub fn with_attendance(mut self, attendance: Option<AttendanceSection>) -> Self {
        self.attendance = attendance;
        self
    }

    pub fn render(&self) -> Result<PdfOutput, ExportError> {
        let pages = layout::compose(self)?;
        let page_count = pages.len();
        let bytes = writer::encode(&pages)?;
        Ok(PdfOutput { bytes, page_count })
    }
}
