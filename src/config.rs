//! Execution and tool options.
//!
//! Options are plain values passed to the functions that use them; nothing
//! here is process-wide. Each struct can be deserialized (missing fields take
//! their defaults) or read from environment variables.

use crate::error::ConfigError;
use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const WAIT_TIMEOUT_VAR: &str = "EXECUTE_FUNCTION_WAIT_TIMEOUT";
pub const ROW_LIMIT_VAR: &str = "EXECUTE_FUNCTION_ROW_LIMIT";
pub const BYTE_LIMIT_VAR: &str = "EXECUTE_FUNCTION_BYTE_LIMIT";
pub const LIST_MAX_RESULTS_VAR: &str = "UC_LIST_FUNCTIONS_MAX_RESULTS";

pub const MAX_POLL_DELAY: Duration = Duration::from_secs(60);

/// Options for running a function through an execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// How long the warehouse waits synchronously before reporting the
    /// statement as pending.
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,

    /// Maximum rows returned; more rows set `truncated`.
    pub row_limit: usize,

    /// Maximum result bytes returned; more bytes set `truncated`.
    pub byte_limit: usize,

    /// Polls of a pending statement before giving up.
    pub poll_attempts: u32,

    /// Delay before the first poll; doubled for each later poll, capped at
    /// [`MAX_POLL_DELAY`].
    #[serde(with = "humantime_serde")]
    pub poll_backoff: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            row_limit: 100,
            byte_limit: 4096,
            poll_attempts: 6,
            poll_backoff: Duration::from_secs(2),
        }
    }
}

impl ExecutionOptions {
    /// Reads the `EXECUTE_FUNCTION_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(text) = lookup(WAIT_TIMEOUT_VAR) {
            options.wait_timeout = parse_duration(&text).map_err(|reason| ConfigError {
                variable: WAIT_TIMEOUT_VAR.to_string(),
                value: text.clone(),
                reason,
            })?;
        }
        if let Some(text) = lookup(ROW_LIMIT_VAR) {
            options.row_limit = parse_count(ROW_LIMIT_VAR, &text)?;
        }
        if let Some(text) = lookup(BYTE_LIMIT_VAR) {
            options.byte_limit = parse_count(BYTE_LIMIT_VAR, &text)?;
        }
        Ok(options)
    }

    /// The wait timeout as statement-API text, e.g. `30s`.
    pub fn wait_timeout_text(&self) -> String {
        format!("{}s", self.wait_timeout.as_secs())
    }

    /// Backoff between polls of a pending statement.
    pub fn poll_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.poll_backoff)
            .with_max_delay(MAX_POLL_DELAY.max(self.poll_backoff))
            .with_max_times(self.poll_attempts as usize)
    }
}

/// Options for exposing catalog functions as tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOptions {
    /// Cap on functions listed when expanding `catalog.schema.*`.
    pub list_max_results: usize,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            list_max_results: 100,
        }
    }
}

impl ToolOptions {
    /// Reads `UC_LIST_FUNCTIONS_MAX_RESULTS` over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(text) = lookup(LIST_MAX_RESULTS_VAR) {
            options.list_max_results = parse_count(LIST_MAX_RESULTS_VAR, &text)?;
        }
        Ok(options)
    }
}

fn parse_count(variable: &str, text: &str) -> Result<usize, ConfigError> {
    text.trim().parse().map_err(|_| ConfigError {
        variable: variable.to_string(),
        value: text.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

/// Parses human-readable durations (`30s`, `1m 30s`, `500ms`) or bare
/// seconds (`30`).
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse()
            .map(Duration::from_secs)
            .map_err(|err| format!("{err}"));
    }
    humantime::parse_duration(text).map_err(|err| format!("{err}, expected a duration such as `30s`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_statement_api() {
        let options = ExecutionOptions::default();
        assert_eq!(options.wait_timeout_text(), "30s");
        assert_eq!(options.row_limit, 100);
        assert_eq!(options.byte_limit, 4096);
        assert_eq!(ToolOptions::default().list_max_results, 100);
    }

    #[test]
    fn environment_overrides() {
        let options = ExecutionOptions::from_lookup(lookup(&[
            (WAIT_TIMEOUT_VAR, "10s"),
            (ROW_LIMIT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(options.wait_timeout, Duration::from_secs(10));
        assert_eq!(options.row_limit, 5);
        assert_eq!(options.byte_limit, 4096);

        let tools = ToolOptions::from_lookup(lookup(&[(LIST_MAX_RESULTS_VAR, "7")])).unwrap();
        assert_eq!(tools.list_max_results, 7);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = ExecutionOptions::from_lookup(lookup(&[(BYTE_LIMIT_VAR, "lots")])).unwrap_err();
        assert_eq!(err.variable, BYTE_LIMIT_VAR);
        let err = ExecutionOptions::from_lookup(lookup(&[(WAIT_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert_eq!(err.variable, WAIT_TIMEOUT_VAR);
    }

    #[test]
    fn wait_timeout_accepts_human_durations() {
        let read = |text: &str| {
            ExecutionOptions::from_lookup(lookup(&[(WAIT_TIMEOUT_VAR, text)]))
                .unwrap()
                .wait_timeout
        };
        assert_eq!(read("1m"), Duration::from_secs(60));
        assert_eq!(read("1m 30s"), Duration::from_secs(90));
        assert_eq!(read("45"), Duration::from_secs(45));
        assert_eq!(read("1500ms"), Duration::from_millis(1500));
    }

    #[test]
    fn backoff_doubles() {
        let options = ExecutionOptions::default();
        let delays: Vec<u64> = options.poll_policy().build().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32, 60]);
    }

    #[test]
    fn deserializes_partial_json() {
        let options: ExecutionOptions =
            serde_json::from_str(r#"{"wait_timeout": "5s", "poll_backoff": "0s"}"#).unwrap();
        assert_eq!(options.wait_timeout, Duration::from_secs(5));
        assert_eq!(options.poll_backoff, Duration::ZERO);
        assert_eq!(options.row_limit, 100);

        let text = serde_json::to_string(&ExecutionOptions::default()).unwrap();
        assert!(text.contains(r#""wait_timeout":"30s""#), "{text}");

        let options: ExecutionOptions = serde_json::from_str(r#"{"poll_backoff": "1m 30s"}"#).unwrap();
        assert_eq!(options.poll_backoff, Duration::from_secs(90));
    }
}
