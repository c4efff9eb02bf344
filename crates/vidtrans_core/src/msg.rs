use std::path::PathBuf;

use crate::{FileHandle, Generation, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a local file; clears any entered URL.
    FileSelected(FileHandle),
    /// User edited the URL box; clears any selected file.
    UrlEdited(String),
    /// User picked a target language code.
    LanguageSelected(String),
    /// User clicked Translate.
    SubmitClicked,
    /// Resume polling a task created outside this session.
    ResumeTask { task_id: TaskId },
    /// User abandoned the current session.
    ResetClicked,
    /// Backend accepted the submission.
    SubmissionAccepted {
        generation: Generation,
        task_id: TaskId,
    },
    /// Submission failed in transport or was rejected by the backend.
    SubmissionRejected {
        generation: Generation,
        message: String,
    },
    /// Transient status for the polled task.
    TaskProgress {
        generation: Generation,
        label: Option<String>,
        percent: Option<u8>,
    },
    /// Terminal success; `artifact_id` names the downloadable result.
    TaskSucceeded {
        generation: Generation,
        artifact_id: String,
    },
    /// Terminal outcome without a result to download.
    TaskInfo {
        generation: Generation,
        message: Option<String>,
    },
    /// Terminal failure, backend-reported or a failed status check.
    TaskFailed {
        generation: Generation,
        message: String,
    },
    /// User clicked Download.
    DownloadClicked,
    /// Download transfer finished.
    DownloadFinished {
        generation: Generation,
        result: Result<PathBuf, String>,
    },
}
