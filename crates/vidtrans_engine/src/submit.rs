use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use vidtrans_logging::{vt_info, vt_warn};

use crate::client::{map_reqwest_error, ApiFlavor, ReqwestBackend};
use crate::SubmissionError;

const UPLOAD_FAILED: &str = "Video upload failed";
const URL_FAILED: &str = "Failed to process video URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitSource {
    Upload {
        path: PathBuf,
        file_name: String,
        mime: String,
    },
    UrlReference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub source: SubmitSource,
    pub target_language: String,
}

/// Job-creation request; returns the backend task id.
#[async_trait::async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, SubmissionError>;
}

#[async_trait::async_trait]
impl SubmissionClient for ReqwestBackend {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, SubmissionError> {
        let language = request.target_language.trim();
        if language.is_empty() {
            return Err(SubmissionError::Validation(
                "A target language is required".to_string(),
            ));
        }

        let (builder, fallback) = match &request.source {
            SubmitSource::UrlReference(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(SubmissionError::Validation(
                        "Please select a video file or enter a video URL.".to_string(),
                    ));
                }
                (self.url_request(url, language), URL_FAILED)
            }
            SubmitSource::Upload {
                path,
                file_name,
                mime,
            } => {
                let contents = tokio::fs::read(path).await.map_err(|err| {
                    SubmissionError::Validation(format!(
                        "Could not read {}: {}",
                        path.display(),
                        err
                    ))
                })?;
                if contents.is_empty() {
                    return Err(SubmissionError::Validation(
                        "The selected video file is empty".to_string(),
                    ));
                }
                let video = Part::bytes(contents)
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|_| {
                        SubmissionError::Validation("Please select a valid video file.".to_string())
                    })?;
                let form = Form::new()
                    .part("video", video)
                    .text("target_language", language.to_string());
                let route = match self.api() {
                    ApiFlavor::Primary => "upload",
                    ApiFlavor::Alternate => "translate",
                };
                let url = self.endpoint(&["api", route]);
                vt_info!("POST {} file={} lang={}", url.path(), file_name, language);
                (self.client.post(url).multipart(form), UPLOAD_FAILED)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|err| SubmissionError::Transport {
                fallback,
                detail: map_reqwest_error(&err),
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| SubmissionError::Transport {
                fallback,
                detail: map_reqwest_error(&err),
            })?;

        let result = parse_submission_reply(status, &body, fallback);
        match &result {
            Ok(task_id) => vt_info!("Submission accepted, task {}", task_id),
            Err(err) => vt_warn!("Submission failed (HTTP {}): {}", status.as_u16(), err),
        }
        result
    }
}

impl ReqwestBackend {
    fn url_request(&self, url: &str, language: &str) -> reqwest::RequestBuilder {
        match self.api() {
            ApiFlavor::Primary => {
                let endpoint = self.endpoint(&["api", "youtube"]);
                vt_info!("POST {} url={} lang={}", endpoint.path(), url, language);
                self.client
                    .post(endpoint)
                    .timeout(self.settings.request_timeout)
                    .json(&serde_json::json!({
                        "url": url,
                        "target_language": language,
                    }))
            }
            ApiFlavor::Alternate => {
                let endpoint = self.endpoint(&["api", "translate"]);
                vt_info!("POST {} url={} lang={}", endpoint.path(), url, language);
                let form = Form::new()
                    .text("youtube_url", url.to_string())
                    .text("target_language", language.to_string());
                self.client
                    .post(endpoint)
                    .timeout(self.settings.request_timeout)
                    .multipart(form)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitReply {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Interprets a job-creation response.
///
/// A non-2xx status, `"status": "error"`, or an `error` field without a task
/// id is a rejection carrying the server text, else `fallback`.
pub fn parse_submission_reply(
    status: reqwest::StatusCode,
    body: &[u8],
    fallback: &'static str,
) -> Result<String, SubmissionError> {
    let reply: SubmitReply = match serde_json::from_slice(body) {
        Ok(reply) => reply,
        Err(_) if status.is_success() => return Err(SubmissionError::MalformedResponse),
        Err(_) => {
            return Err(SubmissionError::Rejected {
                status: Some(status.as_u16()),
                message: fallback.to_string(),
            })
        }
    };

    let signals_error = reply.status.as_deref() == Some("error")
        || (reply.error.is_some() && reply.task_id.is_none());
    if !status.is_success() || signals_error {
        let message = reply
            .message
            .or(reply.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(SubmissionError::Rejected {
            status: Some(status.as_u16()),
            message,
        });
    }

    reply
        .task_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(SubmissionError::MissingTaskId)
}
