//! Job configuration: a TOML file overlaid with environment variables.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use mrp_fetch::{FetchOptions, UnrecognizedOutputPolicy};
use mrp_load::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use mrp_model::{
    DEFAULT_CONTACT, DEFAULT_EXPECTED_PROPERTY_COUNT, DEFAULT_JOB_NAME, DEFAULT_REMOTE_DIR,
    DEFAULT_SCHEMA, RunContext, TableRef,
};
use mrp_notify::{DEFAULT_RELAY, DEFAULT_RELAY_PORT, parse_recipient_list};

/// Config file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_FILE: &str = "market-rate.toml";
pub const DEFAULT_TRANSFER_PROGRAM: &str = "winscp.com";
pub const DEFAULT_STAGING_DIR: &str = "temp_dir";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw configuration as read from disk; every field is optional until
/// [`RunConfig::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub job_name: Option<String>,
    pub contact: Option<String>,
    pub staging_dir: Option<PathBuf>,
    pub lookup_path: Option<PathBuf>,
    pub expected_property_count: Option<usize>,
    pub transfer: TransferSection,
    pub sink: SinkSection,
    pub mail: MailSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferSection {
    pub program: Option<PathBuf>,
    pub session_url: Option<String>,
    pub host_key: Option<String>,
    pub target_filename: Option<String>,
    pub remote_dir: Option<String>,
    pub unrecognized_output: Option<UnrecognizedOutputPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkSection {
    pub connection_string: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailSection {
    pub relay: Option<String>,
    pub port: Option<u16>,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipients: Vec<String>,
}

impl RunConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists. An explicitly named file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::read(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay values from the environment. `lookup` is usually
    /// `|key| std::env::var(key).ok()`; empty values are ignored.
    #[must_use]
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("PROPERTY_LOOKUP_PATH") {
            self.lookup_path = Some(PathBuf::from(value));
        }
        if let Some(value) = get("TRANSFER_PROGRAM") {
            self.transfer.program = Some(PathBuf::from(value));
        }
        if let Some(value) = get("SESSION_URL") {
            self.transfer.session_url = Some(value);
        }
        if let Some(value) = get("HOSTKEY") {
            self.transfer.host_key = Some(value);
        }
        if let Some(value) = get("TARGET_FILENAME") {
            self.transfer.target_filename = Some(value);
        }
        if let Some(value) = get("SQL_CONNECTION_STRING") {
            self.sink.connection_string = Some(value);
        }
        if let Some(value) = get("SQL_TABLE") {
            self.sink.table = Some(value);
        }
        if let Some(value) = get("ERROR_SENDER") {
            self.mail.sender = Some(value);
        }
        if let Some(value) = get("ERROR_SENDER_PASSWORD") {
            self.mail.password = Some(value);
        }
        if let Some(value) = get("ERROR_RECIPIENTS_LIST") {
            self.mail.recipients = parse_recipient_list(&value);
        }
        self
    }

    /// Fill defaults and check that every required value is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent key, or
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let expected_property_count = self
            .expected_property_count
            .unwrap_or(DEFAULT_EXPECTED_PROPERTY_COUNT);
        if expected_property_count == 0 {
            return Err(ConfigError::Invalid {
                key: "expected_property_count",
                reason: "must be at least 1".to_string(),
            });
        }
        let batch_size = self.sink.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(ConfigError::Invalid {
                key: "sink.batch_size",
                reason: format!("must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"),
            });
        }

        Ok(Settings {
            job_name: self.job_name.unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
            contact: self.contact.unwrap_or_else(|| DEFAULT_CONTACT.to_string()),
            staging_dir: self
                .staging_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            lookup_path: required(self.lookup_path, "lookup_path")?,
            expected_property_count,
            transfer: TransferSettings {
                program: self
                    .transfer
                    .program
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSFER_PROGRAM)),
                session_url: required(self.transfer.session_url, "transfer.session_url")?,
                host_key: required(self.transfer.host_key, "transfer.host_key")?,
                target_filename: required(
                    self.transfer.target_filename,
                    "transfer.target_filename",
                )?,
                remote_dir: self
                    .transfer
                    .remote_dir
                    .unwrap_or_else(|| DEFAULT_REMOTE_DIR.to_string()),
                unrecognized_output: self.transfer.unrecognized_output.unwrap_or_default(),
            },
            sink: SinkSettings {
                connection_string: required(
                    self.sink.connection_string,
                    "sink.connection_string",
                )?,
                destination: TableRef::new(
                    self.sink
                        .schema
                        .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
                    required(self.sink.table, "sink.table")?,
                ),
                batch_size,
            },
            mail: MailSettings {
                relay: self.mail.relay.unwrap_or_else(|| DEFAULT_RELAY.to_string()),
                port: self.mail.port.unwrap_or(DEFAULT_RELAY_PORT),
                sender: required(self.mail.sender, "mail.sender")?,
                password: required(self.mail.password, "mail.password")?,
                recipients: self.mail.recipients,
            },
        })
    }
}

fn required<T>(value: Option<T>, key: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(key))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub job_name: String,
    pub contact: String,
    pub staging_dir: PathBuf,
    pub lookup_path: PathBuf,
    pub expected_property_count: usize,
    pub transfer: TransferSettings,
    pub sink: SinkSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub program: PathBuf,
    pub session_url: String,
    pub host_key: String,
    pub target_filename: String,
    pub remote_dir: String,
    pub unrecognized_output: UnrecognizedOutputPolicy,
}

#[derive(Clone)]
pub struct SinkSettings {
    pub connection_string: String,
    pub destination: TableRef,
    pub batch_size: usize,
}

impl fmt::Debug for SinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSettings")
            .field("connection_string", &"<redacted>")
            .field("destination", &self.destination)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[derive(Clone)]
pub struct MailSettings {
    pub relay: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub recipients: Vec<String>,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("relay", &self.relay)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl Settings {
    /// Context for a run on `run_date`.
    pub fn run_context(&self, run_date: NaiveDate) -> RunContext {
        RunContext::new(run_date, self.sink.destination.clone())
            .with_job_name(&self.job_name)
            .with_contact(&self.contact)
            .with_staging_dir(&self.staging_dir)
            .with_target_filename(&self.transfer.target_filename)
            .with_remote_dir(&self.transfer.remote_dir)
            .with_expected_property_count(self.expected_property_count)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new(&self.transfer.session_url, &self.transfer.host_key)
            .with_unrecognized_output(self.transfer.unrecognized_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
lookup_path = "lookup.csv"

[transfer]
session_url = "sftp://rpa@feeds.example.com/"
host_key = "ssh-ed25519 255 abc"
target_filename = "market_rates.csv"

[sink]
connection_string = "host=db user=etl"
table = "MarketRates"

[mail]
sender = "etl@example.com"
password = "hunter2"
recipients = ["ops@example.com"]
"#;

    #[test]
    fn minimal_file_resolves_with_defaults() {
        let settings = RunConfig::parse(MINIMAL).unwrap().resolve().unwrap();
        assert_eq!(settings.job_name, DEFAULT_JOB_NAME);
        assert_eq!(settings.staging_dir, PathBuf::from("temp_dir"));
        assert_eq!(settings.expected_property_count, 111);
        assert_eq!(settings.transfer.program, PathBuf::from("winscp.com"));
        assert_eq!(settings.transfer.remote_dir, "outgoing");
        assert_eq!(
            settings.transfer.unrecognized_output,
            UnrecognizedOutputPolicy::TreatAsSuccess
        );
        assert_eq!(settings.sink.destination.to_string(), "ads.MarketRates");
        assert_eq!(settings.sink.batch_size, 260);
        assert_eq!(settings.mail.relay, "smtp.office365.com");
        assert_eq!(settings.mail.port, 587);
    }

    #[test]
    fn missing_table_is_named() {
        let mut config = RunConfig::parse(MINIMAL).unwrap();
        config.sink.table = None;
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("sink.table")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(RunConfig::parse("tabel = \"x\"").is_err());
    }

    #[test]
    fn policy_parses_kebab_case() {
        let config = RunConfig::parse("[transfer]\nunrecognized_output = \"treat-as-failure\"")
            .unwrap();
        assert_eq!(
            config.transfer.unrecognized_output,
            Some(UnrecognizedOutputPolicy::TreatAsFailure)
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = RunConfig::parse(MINIMAL).unwrap().resolve().unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("user=etl"));
    }

    #[test]
    fn run_context_carries_settings() {
        let settings = RunConfig::parse(MINIMAL).unwrap().resolve().unwrap();
        let ctx = settings.run_context(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(ctx.staged_file(), PathBuf::from("temp_dir").join("market_rates.csv"));
        assert_eq!(ctx.destination.table, "MarketRates");
    }
}
