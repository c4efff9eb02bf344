use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::persist::PersistError;

pub type Generation = u64;

/// Backend task state as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Progress,
    Success,
    Failure,
    Unrecognized(String),
}

impl TaskState {
    pub fn from_wire(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("PENDING")
            || raw.eq_ignore_ascii_case("RECEIVED")
            || raw.eq_ignore_ascii_case("QUEUED")
        {
            TaskState::Queued
        } else if raw.eq_ignore_ascii_case("PROGRESS") {
            TaskState::Progress
        } else if raw.eq_ignore_ascii_case("SUCCESS") {
            TaskState::Success
        } else if raw.eq_ignore_ascii_case("FAILURE") {
            TaskState::Failure
        } else {
            TaskState::Unrecognized(raw.to_string())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub outcome: ResultOutcome,
    pub message: Option<String>,
    /// Artifact id for the download route; only the alternate API sends it.
    pub video_id: Option<String>,
}

/// Normalized answer of one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub state: TaskState,
    pub progress_label: Option<String>,
    pub progress_percent: Option<u8>,
    pub result: Option<TaskResult>,
}

impl StatusRecord {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            progress_label: None,
            progress_percent: None,
            result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The backend reported the task as failed.
    Task,
    /// The status check itself failed.
    Transport,
    /// The poll loop ran past its maximum duration.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEventKind {
    Progress {
        label: Option<String>,
        percent: Option<u8>,
    },
    Succeeded {
        artifact_id: String,
    },
    Info {
        message: Option<String>,
    },
    Failed {
        cause: FailureCause,
        message: String,
    },
}

impl PollEventKind {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollEventKind::Progress { .. })
    }
}

/// One lifecycle event per poll iteration, tagged with the generation it ran under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEvent {
    pub generation: Generation,
    pub task_id: String,
    pub kind: PollEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        generation: Generation,
        result: Result<String, SubmissionError>,
    },
    Poll(PollEvent),
    Downloaded {
        generation: Generation,
        result: Result<PathBuf, String>,
    },
    /// The engine thread could not start or has exited.
    Stopped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("{fallback}")]
    Transport {
        fallback: &'static str,
        detail: String,
    },
    #[error("Failed to parse server response")]
    MalformedResponse,
    #[error("Server response did not include a task id")]
    MissingTaskId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("status request failed: {0}")]
    Transport(String),
    #[error("status endpoint returned HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed status response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Failed to download video: {0}")]
    Transport(String),
    #[error("invalid download reference {0:?}")]
    InvalidReference(String),
    #[error("Failed to save video: {0}")]
    Persist(#[from] PersistError),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Task => write!(f, "task failure"),
            FailureCause::Transport => write!(f, "status check failure"),
            FailureCause::TimedOut => write!(f, "poll timeout"),
        }
    }
}
