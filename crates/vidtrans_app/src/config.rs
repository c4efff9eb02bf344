use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vidtrans_core::{LanguageCode, DEFAULT_LANGUAGE};
use vidtrans_engine::{ApiFlavor, ClientSettings};

use crate::cli::Cli;
use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "vidtrans.ron";

/// Settings read from `vidtrans.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api: ApiFlavor,
    pub poll_interval_ms: u64,
    /// 0 polls without a time limit.
    pub max_poll_minutes: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub default_language: String,
    pub log: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api: ApiFlavor::Primary,
            poll_interval_ms: 2000,
            max_poll_minutes: 60,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            output_dir: PathBuf::from("output"),
            default_language: DEFAULT_LANGUAGE.to_string(),
            log: LogDestination::File,
        }
    }
}

impl AppConfig {
    /// Loads `explicit` if given (it must exist), else `./vidtrans.ron` when
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Global CLI flags win over file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(api) = cli.api {
            self.api = api.into();
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api: self.api,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_duration: (self.max_poll_minutes > 0)
                .then(|| Duration::from_secs(self.max_poll_minutes * 60)),
        }
    }

    pub fn language(&self) -> Result<LanguageCode> {
        LanguageCode::parse(&self.default_language)
            .with_context(|| format!("default_language {:?}", self.default_language))
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.poll_interval_ms > 0, "poll_interval_ms must be positive");
        anyhow::ensure!(
            self.connect_timeout_secs > 0 && self.request_timeout_secs > 0,
            "timeouts must be positive"
        );
        self.language()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(AppConfig::from_ron("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = AppConfig::from_ron(
            r#"(
                base_url: "https://translate.example.com",
                api: alternate,
                max_poll_minutes: 0,
                default_language: "fr",
                log: both,
            )"#,
        )
        .unwrap();

        assert_eq!(config.api, ApiFlavor::Alternate);
        assert_eq!(config.log, LogDestination::Both);
        assert_eq!(config.poll_interval_ms, 2000);
        let settings = config.client_settings();
        assert_eq!(settings.base_url, "https://translate.example.com");
        assert_eq!(settings.max_poll_duration, None);
        assert_eq!(config.language().unwrap().as_str(), "fr");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_ron("(poll_interval_ms: 0)").is_err());
        assert!(AppConfig::from_ron(r#"(default_language: "spanish")"#).is_err());
        assert!(AppConfig::from_ron("(api: sideways)").is_err());
    }

    #[test]
    fn cli_flags_override_file() {
        let mut config = AppConfig::default();
        let cli = Cli::parse_from([
            "vidtrans",
            "--base-url",
            "http://10.0.0.2:5000",
            "--api",
            "alternate",
            "--log",
            "terminal",
            "languages",
        ]);
        config.apply_cli(&cli);

        assert_eq!(config.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.api, ApiFlavor::Alternate);
        assert_eq!(config.log, LogDestination::Terminal);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.ron"))).is_err());

        let path = dir.path().join("vidtrans.ron");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "(output_dir: \"videos\")").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("videos"));
    }

    #[test]
    fn default_settings_poll_every_two_seconds_for_an_hour() {
        let settings = AppConfig::default().client_settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(2000));
        assert_eq!(settings.max_poll_duration, Some(Duration::from_secs(3600)));
    }
}
