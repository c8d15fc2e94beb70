use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::CalendarRange;
use crate::segment::{SegmentRule, SegmentationConfig};

/// Effective engine configuration: defaults, overlaid by an optional TOML file,
/// overlaid by environment variables.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub calendar: CalendarRange,
    pub cleaning: CleaningConfig,
    pub segmentation: SegmentationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CleaningConfig {
    /// Trim and title-case label columns (region, ship mode, segment, category...).
    pub normalize_text: bool,
    /// Cap per-row profit margin at this nearest-rank percentile; `None` disables.
    pub margin_cap_percentile: Option<f64>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self { normalize_text: true, margin_cap_percentile: Some(99.0) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

const ENV_CONFIG_PATH: &str = "SHOPMETRICS_CONFIG";
const ENV_LOG_LEVEL: &str = "SHOPMETRICS_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "SHOPMETRICS_LOG_FORMAT";
const ENV_ANALYSIS_DATE: &str = "SHOPMETRICS_ANALYSIS_DATE";

const DEFAULT_CONFIG_FILE: &str = "shopmetrics.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    calendar: Option<RawCalendar>,
    cleaning: Option<RawCleaning>,
    segmentation: Option<RawSegmentation>,
    logging: Option<RawLogging>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCalendar {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCleaning {
    normalize_text: Option<bool>,
    margin_cap_percentile: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSegmentation {
    version: Option<u32>,
    analysis_date: Option<String>,
    bands: Option<u32>,
    segment_rules: Option<Vec<RawSegmentRule>>,
    clv_tier_labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSegmentRule {
    min_score: u32,
    label: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogging {
    level: Option<String>,
    format: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calendar: default_calendar(),
            cleaning: CleaningConfig::default(),
            segmentation: SegmentationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_calendar() -> CalendarRange {
    CalendarRange {
        start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or(NaiveDate::MIN),
        end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
    }
}

impl EngineConfig {
    /// Load with precedence: environment > config file > defaults.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let env_path = env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        // A path named through the environment is as explicit as --config; it must
        // exist rather than silently fall through to defaults.
        let explicit_env = options.config_path.is_none() && env_path.is_some();
        let path = options.config_path.or(env_path).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });

        let raw = match path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(&path)
                    .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
                toml::from_str::<RawConfig>(&contents)
                    .map_err(|source| ConfigError::ParseFile { path, source })?
            }
            Some(path) if options.require_file || explicit_env => {
                return Err(ConfigError::MissingConfigFile(path))
            }
            _ if options.require_file => {
                return Err(ConfigError::MissingConfigFile(PathBuf::from(DEFAULT_CONFIG_FILE)))
            }
            _ => RawConfig::default(),
        };

        let mut config = Self::default();
        config.apply_file(raw)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, raw: RawConfig) -> Result<(), ConfigError> {
        if let Some(calendar) = raw.calendar {
            if let Some(start) = calendar.start {
                self.calendar.start = parse_date("calendar.start", &start)?;
            }
            if let Some(end) = calendar.end {
                self.calendar.end = parse_date("calendar.end", &end)?;
            }
        }
        if let Some(cleaning) = raw.cleaning {
            if let Some(normalize) = cleaning.normalize_text {
                self.cleaning.normalize_text = normalize;
            }
            if let Some(cap) = cleaning.margin_cap_percentile {
                self.cleaning.margin_cap_percentile = (cap > 0.0).then_some(cap);
            }
        }
        if let Some(segmentation) = raw.segmentation {
            if let Some(version) = segmentation.version {
                self.segmentation.version = version;
            }
            if let Some(date) = segmentation.analysis_date {
                self.segmentation.analysis_date = parse_date("segmentation.analysis_date", &date)?;
            }
            if let Some(bands) = segmentation.bands {
                self.segmentation.bands = bands;
            }
            if let Some(rules) = segmentation.segment_rules {
                self.segmentation.segment_rules = rules
                    .into_iter()
                    .map(|rule| SegmentRule { min_score: rule.min_score, label: rule.label })
                    .collect();
            }
            if let Some(labels) = segmentation.clv_tier_labels {
                self.segmentation.clv_tier_labels = labels;
            }
        }
        if let Some(logging) = raw.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format.parse().map_err(|_| {
                    ConfigError::Validation(format!("unknown logging.format `{format}`"))
                })?;
            }
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Ok(format) = env::var(ENV_LOG_FORMAT) {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: ENV_LOG_FORMAT.to_string(),
                value: format,
            })?;
        }
        if let Ok(date) = env::var(ENV_ANALYSIS_DATE) {
            self.segmentation.analysis_date =
                NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                    ConfigError::InvalidEnvOverride {
                        key: ENV_ANALYSIS_DATE.to_string(),
                        value: date,
                    }
                })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar.start > self.calendar.end {
            return Err(ConfigError::Validation(format!(
                "calendar.start {} is after calendar.end {}",
                self.calendar.start, self.calendar.end
            )));
        }
        if let Some(cap) = self.cleaning.margin_cap_percentile {
            if cap <= 0.0 || cap > 100.0 {
                return Err(ConfigError::Validation(format!(
                    "cleaning.margin_cap_percentile {cap} is outside (0, 100]"
                )));
            }
        }
        if self.segmentation.bands < 2 {
            return Err(ConfigError::Validation(
                "segmentation.bands must be at least 2".to_string(),
            ));
        }
        if self.segmentation.clv_tier_labels.len() != self.segmentation.bands as usize {
            return Err(ConfigError::Validation(format!(
                "segmentation.clv_tier_labels has {} entries but bands is {}",
                self.segmentation.clv_tier_labels.len(),
                self.segmentation.bands
            )));
        }
        if self.segmentation.segment_rules.is_empty() {
            return Err(ConfigError::Validation(
                "segmentation.segment_rules must not be empty".to_string(),
            ));
        }
        let known_levels = ["trace", "debug", "info", "warn", "error"];
        if !known_levels.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown logging.level `{}`",
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ConfigError::Validation(format!("{field} `{value}` is not a YYYY-MM-DD date")))
}
