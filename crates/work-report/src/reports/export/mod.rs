//! Flat CSV and paginated PDF exports of the filtered report set.

pub mod csv;
pub mod pdf;

use crate::config::ExportConfig;
use crate::reports::domain::WorkReport;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub use self::csv::{parse_export, write_reports_csv};
pub use self::pdf::{AttendanceSection, PdfOutput, SummaryDocument};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("export i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to compose pdf content: {0}")]
    Pdf(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn file_name(self, date: NaiveDate) -> String {
        match self {
            ExportFormat::Csv => format!("work_reports_{}.csv", date.format("%Y-%m-%d")),
            ExportFormat::Pdf => format!("work_report_summary_{}.pdf", date.format("%Y-%m-%d")),
        }
    }
}

/// Writes `bytes` to `path` through a sibling temp file so a failed export leaves nothing behind.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let temp = path.with_file_name(format!(".{file_name}.partial"));

    let result = fs::write(&temp, bytes).and_then(|_| fs::rename(&temp, path));
    if let Err(err) = result {
        let _ = fs::remove_file(&temp);
        return Err(err.into());
    }
    Ok(())
}

/// Writes exports into the configured directory using dated file names.
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn target(&self, format: ExportFormat, date: NaiveDate) -> PathBuf {
        self.config.output_dir.join(format.file_name(date))
    }

    pub fn export_csv(
        &self,
        reports: &[WorkReport],
        date: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        let bytes = write_reports_csv(reports)?;
        let path = self.target(ExportFormat::Csv, date);
        write_atomically(&path, &bytes)?;
        info!(path = %path.display(), reports = reports.len(), "csv export written");
        Ok(path)
    }

    pub fn export_pdf(
        &self,
        document: &SummaryDocument,
        date: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        let output = document.render()?;
        let path = self.target(ExportFormat::Pdf, date);
        write_atomically(&path, &output.bytes)?;
        info!(path = %path.display(), pages = output.page_count, "pdf export written");
        Ok(path)
    }
}
