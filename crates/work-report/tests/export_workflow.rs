use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use work_report::config::ExportConfig;
use work_report::reports::export::{parse_export, AttendanceSection, SummaryDocument};
use work_report::reports::{
    attendance_summary, group_reports, render_groups, ExportFormat, Exporter, ReportBundle,
    ReportFilter,
};

fn snapshot() -> ReportBundle {
    let data = include_bytes!("data/portal_snapshot.json");
    ReportBundle::from_reader(&data[..]).expect("snapshot parses")
}

fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!("work-report-it-{label}-{nanos}"));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn exporter(dir: &PathBuf) -> Exporter {
    Exporter::new(ExportConfig {
        output_dir: dir.clone(),
        ..ExportConfig::default()
    })
}

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date")
}

#[test]
fn csv_export_writes_one_line_per_task_and_reads_back() {
    let dir = scratch_dir("csv");
    let bundle = snapshot();

    let path = exporter(&dir)
        .export_csv(&bundle.reports, export_date())
        .expect("csv export");
    assert_eq!(path, dir.join("work_reports_2025-03-07.csv"));

    let text = fs::read_to_string(&path).expect("read export");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Employee Name,Department,Team,Reporting Manager,Task Details,Status")
    );
    assert_eq!(lines.count(), 5);

    let reports = parse_export(text.as_bytes()).expect("export parses");
    let authors: Vec<&str> = reports
        .iter()
        .map(|report| report.employee_name.as_str())
        .collect();
    assert_eq!(
        authors,
        vec!["Arjun Mehta", "Divya Nair", "Rohit Sen", "Sameer Khan"]
    );
    assert_eq!(reports[0].tasks, bundle.reports[0].tasks);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn empty_selection_still_exports_a_header() {
    let dir = scratch_dir("csv-empty");
    let bundle = snapshot();
    let filter = ReportFilter {
        department: Some("Finance".to_string()),
        ..ReportFilter::default()
    };

    let reports = bundle.filtered(&filter);
    assert!(reports.is_empty());
    let path = exporter(&dir)
        .export_csv(&reports, export_date())
        .expect("csv export");
    let text = fs::read_to_string(path).expect("read export");
    assert_eq!(text.lines().count(), 1);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn pdf_export_includes_attendance_and_table() {
    let dir = scratch_dir("pdf");
    let bundle = snapshot();
    let catalog = bundle.catalog();
    let groups = group_reports(&bundle.reports, &bundle.departments, &catalog);
    let table = render_groups(&groups, &catalog);
    let exporter = exporter(&dir);

    let generated_at = export_date()
        .and_hms_opt(18, 30, 0)
        .expect("valid time");
    let document = SummaryDocument::new(exporter.config(), table, generated_at)
        .with_filter_description(Some("Date: 2025-03-07".to_string()))
        .with_attendance(Some(AttendanceSection {
            date: export_date(),
            entries: attendance_summary(export_date(), &bundle.reports, &bundle.departments),
        }));

    let path = exporter.export_pdf(&document, export_date()).expect("pdf export");
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some(ExportFormat::Pdf.file_name(export_date()).as_str())
    );

    let bytes = fs::read(&path).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("Daily Work Report Summary"));
    assert!(text.contains("Attendance Summary"));
    assert!(text.contains("Priya Raman"));
    assert!(text.contains("Page 1 of 1"));
    assert!(text.trim_end().ends_with("%%EOF"));

    let leftovers: Vec<_> = fs::read_dir(&dir)
        .expect("list dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn export_into_missing_directory_fails_cleanly() {
    let dir = scratch_dir("missing").join("does-not-exist");
    let bundle = snapshot();

    let result = exporter(&dir).export_csv(&bundle.reports, export_date());
    assert!(result.is_err());
    assert!(!dir.exists());
}
