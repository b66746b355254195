use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use quote_optimizer::config::parse_margin_floor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_floor(raw: &str) -> Result<f64, String> {
    parse_margin_floor(raw)
        .map_err(|_| format!("margin floor must be a fraction between 0 and 1 (got '{raw}')"))
}
