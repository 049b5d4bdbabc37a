use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use work_report::config::{BackendConfig, ExportConfig};
use work_report::error::AppError;
use work_report::portal::{BackendClient, ReportSource};
use work_report::reports::ReportBundle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) export: Arc<ExportConfig>,
}

/// Snapshot file when one is given, otherwise the configured backend.
pub(crate) fn load_source(
    backend: &BackendConfig,
    snapshot: Option<PathBuf>,
    token: Option<String>,
) -> Result<Arc<dyn ReportSource>, AppError> {
    match snapshot {
        Some(path) => {
            let bundle = ReportBundle::from_path(&path)?;
            info!(
                path = %path.display(),
                reports = bundle.reports.len(),
                "loaded report snapshot"
            );
            Ok(Arc::new(bundle))
        }
        None => {
            let mut client = BackendClient::new(backend)?;
            if let Some(token) = token {
                client.set_token(Some(token));
            }
            info!(
                base_url = %client.base_url(),
                authenticated = client.has_token(),
                "using live backend"
            );
            Ok(Arc::new(client))
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn parse_date_trims_and_reports_input() {
        assert_eq!(
            parse_date(" 2025-03-07 "),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date"))
        );
        let err = parse_date("07/03/2025").expect_err("wrong format");
        assert!(err.contains("07/03/2025"));
    }

    #[test]
    fn missing_snapshot_is_a_snapshot_error() {
        let backend = BackendConfig {
            base_url: Url::parse("http://127.0.0.1:8000/api").expect("valid url"),
            api_token: None,
            timeout: Duration::from_secs(5),
        };
        let result = load_source(
            &backend,
            Some(PathBuf::from("/definitely/not/here.json")),
            None,
        );
        assert!(matches!(result, Err(AppError::Snapshot(_))));
    }
}
