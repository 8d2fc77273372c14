//! Logger configuration
//!
//! A [`Config`] is plain data: build one from a preset, from the environment
//! or from JSON, then hand it to [`LoggerBuilder`](crate::LoggerBuilder).

mod presets;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};

/// Environment variable holding the filter directive.
pub const LEVEL_VAR: &str = "PHOENIX_LOG";
/// Environment variable holding the output format.
pub const FORMAT_VAR: &str = "PHOENIX_LOG_FORMAT";

/// Complete logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// `EnvFilter` directive, e.g. `info,phoenix_validator=debug`.
    pub level: String,
    pub format: Format,
    pub display: DisplayConfig,
    pub fields: Fields,
    pub writer: Writer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            fields: Fields::default(),
            writer: Writer::Stderr,
        }
    }
}

impl Config {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> LogResult<Self> {
        serde_json::from_str(json).map_err(|e| LogError::Config(e.to_string()))
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line, human oriented.
    Pretty,
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LogError::Config(format!("unknown log format `{other}`"))),
        }
    }
}

/// What each log line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    pub colors: bool,
    pub time: bool,
    /// File and line of the callsite.
    pub source: bool,
    pub target: bool,
    pub thread_ids: bool,
    /// Lift event fields to the top level of JSON output.
    pub flatten: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            time: true,
            source: false,
            target: true,
            thread_ids: false,
            flatten: false,
        }
    }
}

impl DisplayConfig {
    /// Overrides flags from `PHOENIX_LOG_COLORS`, `PHOENIX_LOG_TIME`,
    /// `PHOENIX_LOG_SOURCE`, `PHOENIX_LOG_TARGET` and `PHOENIX_LOG_THREAD_IDS`.
    /// Unparseable values are ignored.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flags: [(&str, &mut bool); 5] = [
            ("PHOENIX_LOG_COLORS", &mut self.colors),
            ("PHOENIX_LOG_TIME", &mut self.time),
            ("PHOENIX_LOG_SOURCE", &mut self.source),
            ("PHOENIX_LOG_TARGET", &mut self.target),
            ("PHOENIX_LOG_THREAD_IDS", &mut self.thread_ids),
        ];
        for (key, flag) in flags {
            if let Some(value) = lookup(key).as_deref().and_then(parse_flag) {
                *flag = value;
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Fields attached to every event through the root span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fields {
    pub service: Option<String>,
    pub env: Option<String>,
    pub version: Option<String>,
}

impl Fields {
    /// Reads `PHOENIX_SERVICE`, `PHOENIX_ENV` and `PHOENIX_VERSION`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            service: read("PHOENIX_SERVICE"),
            env: read("PHOENIX_ENV"),
            version: read("PHOENIX_VERSION"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.env.is_none() && self.version.is_none()
    }
}

/// Destination of formatted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Writer {
    #[default]
    Stderr,
    Stdout,
    /// Output captured by the test harness.
    Test,
}
