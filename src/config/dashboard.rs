use crate::{
    config::optional_var,
    error::{ClassboardResult, ParseSecondsSnafu},
};
use snafu::ResultExt;
use std::time::Duration;

pub const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(2 * 60);
pub const DEFAULT_RETAIN_FOR: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub server_ip: String,
    ///when set, the dashboard goes over HTTP to this API rather than straight to the db
    pub api_base: Option<String>,
    pub stale_after: Duration,
    ///how long a stale entry is kept around before being dropped
    pub retain_for: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_ip: DEFAULT_SERVER_IP.to_string(),
            api_base: None,
            stale_after: DEFAULT_STALE_AFTER,
            retain_for: DEFAULT_RETAIN_FOR,
        }
    }
}

impl DashboardConfig {
    pub fn new() -> ClassboardResult<Self> {
        Self::from_lookup(optional_var)
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> ClassboardResult<Self> {
        let seconds = |name: &'static str, default: Duration| -> ClassboardResult<Duration> {
            lookup(name).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .map(Duration::from_secs)
                    .context(ParseSecondsSnafu { name })
            })
        };

        Ok(Self {
            server_ip: lookup("CLASSBOARD_SERVER_IP")
                .unwrap_or_else(|| DEFAULT_SERVER_IP.to_string()),
            api_base: lookup("CLASSBOARD_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string()),
            stale_after: seconds("CLASSBOARD_STALE_SECS", DEFAULT_STALE_AFTER)?,
            retain_for: seconds("CLASSBOARD_RETAIN_SECS", DEFAULT_RETAIN_FOR)?,
        })
    }
}
