use crate::{DownloadRef, Generation, SubmissionRequest, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        generation: Generation,
        request: SubmissionRequest,
    },
    StartPolling {
        generation: Generation,
        task_id: TaskId,
    },
    /// Stop whatever poll loop is running; its late events are already stale.
    CancelPolling,
    Download {
        generation: Generation,
        download: DownloadRef,
    },
}
