use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::poller::PollSettings;

/// Which backend route family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// `/api/upload` + `/api/youtube`, results carry `status`/`message`.
    #[default]
    Primary,
    /// Single `/api/translate` route, results carry `video_id`.
    Alternate,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api: ApiFlavor,
    pub connect_timeout: Duration,
    /// Applies to status checks and JSON submissions; uploads and downloads
    /// are bounded only by the connect timeout.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_duration: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api: ApiFlavor::Primary,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(2000),
            max_poll_duration: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl ClientSettings {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            max_duration: self.max_poll_duration,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Build(String),
}

/// reqwest-backed implementation of the submission, status and download clients.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) settings: ClientSettings,
    base_url: Url,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn api(&self) -> ApiFlavor {
        self.settings.api
    }

    /// Builds `{base}/{segments...}`, encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Resolves a server-relative path such as `/api/download/t1` against the base.
    pub(crate) fn resolve(&self, relative: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(relative.trim_start_matches('/'))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid("expected an http(s) url".to_string()));
    }
    // A trailing slash makes `join` append instead of replacing the last segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

pub(crate) fn map_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> ReqwestBackend {
        ReqwestBackend::new(ClientSettings {
            base_url: base.to_string(),
            ..ClientSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_encodes_task_ids() {
        let backend = backend("http://localhost:5000");
        let url = backend.endpoint(&["api", "status", "a b/c"]);
        assert_eq!(url.as_str(), "http://localhost:5000/api/status/a%20b%2Fc");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let backend = backend("https://example.com/translator");
        assert_eq!(
            backend.endpoint(&["api", "upload"]).as_str(),
            "https://example.com/translator/api/upload"
        );
        assert_eq!(
            backend.resolve("/api/download/t1").unwrap().as_str(),
            "https://example.com/translator/api/download/t1"
        );
    }

    #[test]
    fn non_http_base_is_rejected() {
        let err = ReqwestBackend::new(ClientSettings {
            base_url: "ftp://example.com".into(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn default_cadence_is_two_seconds() {
        let settings = ClientSettings::default().poll_settings();
        assert_eq!(settings.interval, Duration::from_millis(2000));
        assert!(settings.max_duration.is_some());
    }
}
