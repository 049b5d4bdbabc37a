use crate::infra::{load_source, parse_date};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use work_report::config::AppConfig;
use work_report::error::AppError;
use work_report::portal::auth::LoginForm;
use work_report::portal::{
    BackendClient, FetchOutcome, FetchSlot, PortalContext, PortalError, ReportFetcher,
    ReportSource,
};
use work_report::reports::export::{AttendanceSection, SummaryDocument};
use work_report::reports::render::{render_html, render_text};
use work_report::reports::{
    render_groups, Exporter, GroupOrder, ReportFilter, ReportGrouper, TabularReport,
};

type Fetcher = ReportFetcher<Arc<dyn ReportSource>>;

#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// JSON report snapshot to read instead of the live backend
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Bearer token for the live backend (overrides PORTAL_API_TOKEN)
    #[arg(long)]
    pub(crate) token: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct FilterArgs {
    /// Department to include ("All Departments" for no restriction)
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Team to include ("All Teams" for no restriction)
    #[arg(long)]
    pub(crate) team: Option<String>,
    /// Reporting manager to include ("All Reporting Managers" for no restriction)
    #[arg(long)]
    pub(crate) manager: Option<String>,
    /// First report date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Last report date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: Option<NaiveDate>,
}

impl FilterArgs {
    fn into_filter(self) -> ReportFilter {
        ReportFilter {
            department: self.department,
            team: self.team,
            manager: self.manager,
            from_date: self.from,
            to_date: self.to,
        }
        .normalized()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TableFormat {
    #[default]
    Text,
    Html,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ExportKind {
    #[default]
    Csv,
    Pdf,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Order groups by department, team and manager instead of first appearance
    #[arg(long)]
    pub(crate) sorted: bool,
    /// Output format for the grouped table
    #[arg(long, value_enum, default_value_t = TableFormat::Text)]
    pub(crate) format: TableFormat,
}

#[derive(Args, Debug)]
pub(crate) struct QuickSummaryArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Reporting date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Export format
    #[arg(long, value_enum, default_value_t = ExportKind::Csv)]
    pub(crate) format: ExportKind,
    /// Date stamped into the file name (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Attendance date for the PDF attendance section (defaults to --date)
    #[arg(long, value_parser = parse_date)]
    pub(crate) attendance_date: Option<NaiveDate>,
    /// Override the configured export directory
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub(crate) email: String,
    /// Account password
    #[arg(long)]
    pub(crate) password: String,
}

fn prepare(source: SourceArgs) -> Result<(AppConfig, Fetcher), AppError> {
    let config = AppConfig::load()?;
    let source = load_source(&config.backend, source.snapshot, source.token)?;
    Ok((config, ReportFetcher::new(source)))
}

/// Value held by `slot` once `outcome` settled, or the fetch error.
fn settled<T: Clone + Default>(outcome: FetchOutcome, slot: &FetchSlot<T>) -> Result<T, AppError> {
    match outcome {
        FetchOutcome::Failed(err) => Err(err.into()),
        FetchOutcome::Applied | FetchOutcome::Superseded => Ok(slot.value().unwrap_or_default()),
    }
}

async fn build_table(
    fetcher: &Fetcher,
    filter: ReportFilter,
    order: GroupOrder,
) -> Result<(Vec<work_report::reports::ReportGroup>, TabularReport), AppError> {
    let source = fetcher.source();
    let directory = source.departments().await?;
    let catalog = source.status_options().await?;
    let reports = settled(fetcher.fetch_reports(filter).await, fetcher.reports())?;

    let groups = ReportGrouper::new(&directory, &catalog)
        .order(order)
        .group(&reports);
    let table = render_groups(&groups, &catalog);
    Ok((groups, table))
}

pub(crate) async fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let SummaryArgs {
        source,
        filter,
        sorted,
        format,
    } = args;

    let (_, fetcher) = prepare(source)?;
    let filter = filter.into_filter();
    let description = filter.describe();
    let order = if sorted {
        GroupOrder::Sorted
    } else {
        GroupOrder::Encounter
    };
    let (groups, table) = build_table(&fetcher, filter, order).await?;

    match format {
        TableFormat::Text => {
            println!("Work report summary");
            if let Some(description) = description {
                println!("{description}");
            }
            println!("{} groups, {} rows\n", groups.len(), table.len());
            print!("{}", render_text(&table));
        }
        TableFormat::Html => print!("{}", render_html(&table)),
        TableFormat::Json => match serde_json::to_string_pretty(&groups) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Summary payload unavailable: {err}"),
        },
    }

    Ok(())
}

pub(crate) async fn run_quick_summary(args: QuickSummaryArgs) -> Result<(), AppError> {
    let (_, fetcher) = prepare(args.source)?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let (summary_outcome, attendance_outcome) = tokio::join!(
        fetcher.fetch_quick_summary(date),
        fetcher.fetch_attendance(date)
    );
    let summary = settled(summary_outcome, fetcher.quick_summary())?;
    let attendance = settled(attendance_outcome, fetcher.attendance())?;

    println!("Quick summary for {date}");
    if summary.summary.is_empty() {
        println!("- no teams in the directory");
    }
    for entry in &summary.summary {
        println!(
            "- {} / {}: {}/{} reported ({})",
            entry.department,
            entry.team,
            entry.reported_count,
            entry.total_employees,
            entry.reported_pct_label()
        );
    }
    let (reported, total) = summary.totals();
    println!("Total: {reported}/{total} reported");

    if !summary.not_reported_managers.is_empty() {
        println!(
            "Managers without a report: {}",
            summary.not_reported_managers.join(", ")
        );
    }
    if !summary.not_reported_employees.is_empty() {
        println!(
            "Employees without a report: {}",
            summary.not_reported_employees.join(", ")
        );
    }

    println!("\nAttendance");
    if attendance.is_empty() {
        println!("- no managers with resources");
    }
    for entry in &attendance {
        println!(
            "- {}: {}/{} present, {} absent ({})",
            entry.manager,
            entry.present,
            entry.total_resources,
            entry.absent,
            entry.attendance_pct_label()
        );
    }

    Ok(())
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        source,
        filter,
        format,
        date,
        attendance_date,
        output_dir,
    } = args;

    let (mut config, fetcher) = prepare(source)?;
    if let Some(dir) = output_dir {
        config.export.output_dir = dir;
    }
    let exporter = Exporter::new(config.export);
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let filter = filter.into_filter();

    let path = match format {
        ExportKind::Csv => {
            let reports = settled(fetcher.fetch_reports(filter).await, fetcher.reports())?;
            exporter.export_csv(&reports, date)?
        }
        ExportKind::Pdf => {
            let attendance_date = attendance_date.unwrap_or(date);
            export_pdf(&fetcher, &exporter, filter, date, attendance_date).await?
        }
    };

    println!("Export written to {}", path.display());
    Ok(())
}

async fn export_pdf(
    fetcher: &Fetcher,
    exporter: &Exporter,
    filter: ReportFilter,
    date: NaiveDate,
    attendance_date: NaiveDate,
) -> Result<PathBuf, AppError> {
    let description = filter.describe();
    let (_, table) = build_table(fetcher, filter, GroupOrder::Encounter).await?;
    let attendance = attendance_section(fetcher, attendance_date).await;

    let document = SummaryDocument::new(exporter.config(), table, Local::now().naive_local())
        .with_filter_description(description)
        .with_attendance(attendance);
    Ok(exporter.export_pdf(&document, date)?)
}

/// Attendance printed ahead of the PDF table. A failed fetch leaves the section out.
async fn attendance_section(fetcher: &Fetcher, day: NaiveDate) -> Option<AttendanceSection> {
    match fetcher.fetch_attendance(day).await {
        FetchOutcome::Failed(err) => {
            warn!(%day, error = %err, "attendance unavailable, exporting pdf without it");
            None
        }
        FetchOutcome::Applied | FetchOutcome::Superseded => fetcher
            .attendance()
            .value()
            .map(|entries| AttendanceSection { date: day, entries }),
    }
}

pub(crate) async fn run_login(args: LoginArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let client = BackendClient::new(&config.backend)?;
    let request = LoginForm {
        email: args.email,
        password: args.password,
    }
    .validate()
    .map_err(PortalError::from)?;

    let context = PortalContext::new();
    let response = context.guard(client.login(&request).await)?;
    let session = context.login(response);

    let views: Vec<&str> = session.role().views().into_iter().map(|view| view.label()).collect();
    println!("Signed in as {} ({})", session.user.name, session.role().label());
    println!("Available views: {}", views.join(", "));
    println!("PORTAL_API_TOKEN={}", session.token);
    Ok(())
}
