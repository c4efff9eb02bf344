use crate::{DownloadStatus, Notice, Phase, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceView {
    #[default]
    None,
    File {
        name: String,
    },
    Url {
        url: String,
    },
}

/// Download affordance; only present while the phase is `Succeeded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadView {
    pub path: String,
    pub status: Option<DownloadStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub source: SourceView,
    pub target_language: String,
    pub task_id: Option<TaskId>,
    pub progress_label: Option<String>,
    pub progress_percent: u8,
    pub notice: Option<Notice>,
    pub download: Option<DownloadView>,
    pub controls_enabled: bool,
    pub dirty: bool,
}
