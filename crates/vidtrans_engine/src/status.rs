use serde::Deserialize;
use serde_json::Value;
use vidtrans_logging::vt_debug;

use crate::client::{map_reqwest_error, ApiFlavor, ReqwestBackend};
use crate::{PollError, ResultOutcome, StatusRecord, TaskResult, TaskState};

/// Single status query for a task id.
#[async_trait::async_trait]
pub trait StatusClient: Send + Sync {
    async fn status(&self, task_id: &str) -> Result<StatusRecord, PollError>;
}

#[async_trait::async_trait]
impl StatusClient for ReqwestBackend {
    async fn status(&self, task_id: &str) -> Result<StatusRecord, PollError> {
        let url = self.endpoint(&["api", "status", task_id]);
        vt_debug!("GET {}", url.path());

        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| PollError::Transport(map_reqwest_error(&err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PollError::Transport(map_reqwest_error(&err)))?;
        parse_status(self.settings.api, &body)
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    state: String,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    meta: Option<Value>,
    #[serde(default)]
    info: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Parses a status body from either API family into a [`StatusRecord`].
///
/// Only `state` is required. Nested fields are read leniently because the
/// backend forwards task metadata verbatim.
pub fn parse_status(api: ApiFlavor, body: &[u8]) -> Result<StatusRecord, PollError> {
    let wire: WireStatus =
        serde_json::from_slice(body).map_err(|err| PollError::Malformed(err.to_string()))?;

    let mut record = StatusRecord::new(TaskState::from_wire(&wire.state));
    match record.state {
        TaskState::Queued => {
            record.progress_label = wire.status.as_ref().and_then(text);
        }
        TaskState::Progress => {
            record.progress_label = field_text(wire.meta.as_ref(), "status")
                .or_else(|| field_text(wire.info.as_ref(), "status"));
            record.progress_percent = wire
                .info
                .as_ref()
                .and_then(|info| info.get("progress"))
                .and_then(Value::as_f64)
                .map(|p| p.clamp(0.0, 100.0).round() as u8);
        }
        TaskState::Success => {
            record.result = success_result(api, wire.result.as_ref());
        }
        TaskState::Failure => {
            let message = wire
                .result
                .as_ref()
                .and_then(|result| text(result).or_else(|| field_text(Some(result), "message")))
                .or_else(|| wire.error.as_ref().and_then(text));
            record.result = Some(TaskResult {
                outcome: ResultOutcome::Error,
                message,
                video_id: None,
            });
        }
        TaskState::Unrecognized(_) => {}
    }

    Ok(record)
}

fn success_result(api: ApiFlavor, result: Option<&Value>) -> Option<TaskResult> {
    let outcome = match field_text(result, "status").as_deref() {
        Some("success") => ResultOutcome::Success,
        Some("info") => ResultOutcome::Info,
        Some("error") => ResultOutcome::Error,
        // The alternate API signals success by state alone.
        _ if api == ApiFlavor::Alternate => ResultOutcome::Success,
        _ if result.is_none() => return None,
        _ => {
            return Some(TaskResult {
                outcome: ResultOutcome::Error,
                message: Some("Unexpected task result from server".to_string()),
                video_id: None,
            })
        }
    };

    Some(TaskResult {
        outcome,
        message: field_text(result, "message"),
        video_id: field_text(result, "video_id"),
    })
}

fn field_text(value: Option<&Value>, key: &str) -> Option<String> {
    value.and_then(|v| v.get(key)).and_then(text)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> StatusRecord {
        parse_status(ApiFlavor::Primary, body.as_bytes()).unwrap()
    }

    #[test]
    fn progress_reads_meta_status() {
        let record = parse(r#"{"state":"PROGRESS","meta":{"status":"Transcribing"}}"#);
        assert_eq!(record.state, TaskState::Progress);
        assert_eq!(record.progress_label.as_deref(), Some("Transcribing"));
        assert_eq!(record.progress_percent, None);
    }

    #[test]
    fn pending_uses_top_level_status_text() {
        let record = parse(r#"{"state":"PENDING","status":"Task is pending..."}"#);
        assert_eq!(record.state, TaskState::Queued);
        assert_eq!(record.progress_label.as_deref(), Some("Task is pending..."));
    }

    #[test]
    fn primary_success_outcomes() {
        let ok = parse(r#"{"state":"SUCCESS","result":{"status":"success","video_path":"x"}}"#);
        assert_eq!(ok.result.unwrap().outcome, ResultOutcome::Success);

        let info = parse(r#"{"state":"SUCCESS","result":{"status":"info","message":"No speech"}}"#);
        let info = info.result.unwrap();
        assert_eq!(info.outcome, ResultOutcome::Info);
        assert_eq!(info.message.as_deref(), Some("No speech"));

        let err = parse(r#"{"state":"SUCCESS","result":{"status":"error","message":"boom"}}"#);
        assert_eq!(err.result.unwrap().outcome, ResultOutcome::Error);
    }

    #[test]
    fn primary_success_without_status_is_an_error_result() {
        let record = parse(r#"{"state":"SUCCESS","result":{"video_path":"x"}}"#);
        assert_eq!(record.result.unwrap().outcome, ResultOutcome::Error);

        let record = parse(r#"{"state":"SUCCESS"}"#);
        assert_eq!(record.result, None);
    }

    #[test]
    fn failure_message_from_result_string_or_error_field() {
        let record = parse(r#"{"state":"FAILURE","result":"bad codec"}"#);
        assert_eq!(record.result.unwrap().message.as_deref(), Some("bad codec"));

        let record = parse(r#"{"state":"FAILURE","error":"worker lost"}"#);
        assert_eq!(record.result.unwrap().message.as_deref(), Some("worker lost"));

        let record = parse(r#"{"state":"FAILURE"}"#);
        assert_eq!(record.result.unwrap().message, None);
    }

    #[test]
    fn alternate_success_carries_video_id_and_percent() {
        let record = parse_status(
            ApiFlavor::Alternate,
            br#"{"state":"SUCCESS","result":{"video_id":"v42"}}"#,
        )
        .unwrap();
        let result = record.result.unwrap();
        assert_eq!(result.outcome, ResultOutcome::Success);
        assert_eq!(result.video_id.as_deref(), Some("v42"));

        let record =
            parse_status(ApiFlavor::Alternate, br#"{"state":"PROGRESS","info":{"progress":37.6}}"#)
                .unwrap();
        assert_eq!(record.progress_percent, Some(38));
    }

    #[test]
    fn unknown_state_is_kept_verbatim() {
        let record = parse(r#"{"state":"RETRY","error":"{'exc': 'x'}"}"#);
        assert_eq!(record.state, TaskState::Unrecognized("RETRY".into()));
        assert_eq!(record.result, None);
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert!(matches!(
            parse_status(ApiFlavor::Primary, b"<html>502</html>"),
            Err(PollError::Malformed(_))
        ));
        assert!(matches!(
            parse_status(ApiFlavor::Primary, br#"{"status":"ok"}"#),
            Err(PollError::Malformed(_))
        ));
    }
}
