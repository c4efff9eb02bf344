use std::path::PathBuf;

use crate::request::{FileHandle, LanguageCode, SourceKind, ValidationError};
use crate::result_gate::{DownloadRef, InvalidArtifactId, ResultGate};
use crate::view_model::{AppViewModel, DownloadView, SourceView};

pub type TaskId = String;
pub type Generation = u64;

pub const DEFAULT_PROGRESS_LABEL: &str = "Processing...";

const SUBMIT_PERCENT: u8 = 25;
const POLL_PERCENT: u8 = 50;
const DONE_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Info,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Info | Phase::Failed)
    }

    /// Submission controls are disabled while a task is being created or polled.
    pub fn controls_enabled(self) -> bool {
        !matches!(self, Phase::Submitting | Phase::Polling)
    }
}

/// The mutually exclusive form input: a file, a URL, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceInput {
    #[default]
    Empty,
    File(FileHandle),
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    InProgress,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveTask {
    task_id: TaskId,
    generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: Phase,
    input: SourceInput,
    language: LanguageCode,
    generation: Generation,
    active: Option<ActiveTask>,
    last_task_id: Option<TaskId>,
    progress_label: Option<String>,
    progress_percent: u8,
    notice: Option<Notice>,
    gate: ResultGate,
    download: Option<DownloadStatus>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(language: LanguageCode) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn input(&self) -> &SourceInput {
        &self.input
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    /// The task currently eligible for polling, if any.
    pub fn active_task_id(&self) -> Option<&str> {
        self.active.as_ref().map(|task| task.task_id.as_str())
    }

    pub fn download_ref(&self) -> Option<&DownloadRef> {
        self.gate.current()
    }

    pub fn download_status(&self) -> Option<&DownloadStatus> {
        self.download.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        let source = match &self.input {
            SourceInput::Empty => SourceView::None,
            SourceInput::File(file) => SourceView::File {
                name: file.file_name.clone(),
            },
            SourceInput::Url(url) => SourceView::Url { url: url.clone() },
        };
        let download = match (self.phase, self.gate.current()) {
            (Phase::Succeeded, Some(download)) => Some(DownloadView {
                path: download.path().to_string(),
                status: self.download.clone(),
            }),
            _ => None,
        };

        AppViewModel {
            phase: self.phase,
            source,
            target_language: self.language.to_string(),
            task_id: self
                .active
                .as_ref()
                .map(|task| task.task_id.clone())
                .or_else(|| self.last_task_id.clone()),
            progress_label: self.progress_label.clone(),
            progress_percent: self.progress_percent,
            notice: self.notice.clone(),
            download,
            controls_enabled: self.phase.controls_enabled(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True when `generation` belongs to the live task and the session is in `phase`.
    pub(crate) fn is_current(&self, generation: Generation, phase: Phase) -> bool {
        self.generation == generation && self.phase == phase
    }

    pub(crate) fn select_file(&mut self, file: FileHandle) {
        self.leave_terminal_phase();
        if !file.is_video() {
            self.notice = Some(Notice::new(
                Severity::Error,
                ValidationError::NotAVideo.to_string(),
            ));
        } else {
            self.notice = None;
            self.input = SourceInput::File(file);
        }
        self.mark_dirty();
    }

    pub(crate) fn edit_url(&mut self, text: String) {
        self.leave_terminal_phase();
        self.input = if text.is_empty() {
            SourceInput::Empty
        } else {
            SourceInput::Url(text)
        };
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn select_language(&mut self, raw: &str) {
        self.leave_terminal_phase();
        match LanguageCode::parse(raw) {
            Ok(code) => {
                self.language = code;
                self.notice = None;
            }
            Err(err) => self.notice = Some(Notice::new(Severity::Error, err.to_string())),
        }
        self.mark_dirty();
    }

    pub(crate) fn reject_submission_input(&mut self, err: &ValidationError) {
        self.notice = Some(Notice::new(Severity::Error, err.to_string()));
        self.mark_dirty();
    }

    /// Enters `Submitting` under a fresh generation and returns it.
    pub(crate) fn begin_submission(&mut self, kind: SourceKind) -> Generation {
        self.generation += 1;
        self.phase = Phase::Submitting;
        self.active = None;
        self.gate.disable();
        self.download = None;
        self.notice = None;
        self.progress_percent = SUBMIT_PERCENT;
        self.progress_label = Some(
            match kind {
                SourceKind::Upload => "Uploading video...",
                SourceKind::UrlReference => "Processing URL...",
            }
            .to_string(),
        );
        self.mark_dirty();
        self.generation
    }

    /// Enters `Polling` for an already-known task under a fresh generation.
    pub(crate) fn begin_resume(&mut self, task_id: TaskId) -> Generation {
        self.generation += 1;
        self.phase = Phase::Polling;
        self.gate.disable();
        self.download = None;
        self.notice = None;
        self.progress_percent = POLL_PERCENT;
        self.progress_label = Some(DEFAULT_PROGRESS_LABEL.to_string());
        self.active = Some(ActiveTask {
            task_id: task_id.clone(),
            generation: self.generation,
        });
        self.last_task_id = Some(task_id);
        self.mark_dirty();
        self.generation
    }

    pub(crate) fn start_polling(&mut self, task_id: TaskId) {
        self.phase = Phase::Polling;
        self.active = Some(ActiveTask {
            task_id: task_id.clone(),
            generation: self.generation,
        });
        self.last_task_id = Some(task_id);
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(&mut self, label: Option<String>, percent: Option<u8>) {
        let label = label
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRESS_LABEL.to_string());
        // Terminal records own 100%.
        let percent = percent.map_or(POLL_PERCENT, |p| p.min(DONE_PERCENT - 1));
        if self.progress_label.as_deref() != Some(label.as_str())
            || self.progress_percent != percent
        {
            self.progress_label = Some(label);
            self.progress_percent = percent;
            self.mark_dirty();
        }
    }

    pub(crate) fn succeed(&mut self, artifact_id: &str) -> Result<(), InvalidArtifactId> {
        match self.gate.enable(artifact_id) {
            Ok(_) => {
                self.finish(
                    Phase::Succeeded,
                    Notice::new(Severity::Success, "Video processed successfully!"),
                );
                Ok(())
            }
            Err(err) => {
                self.fail("Server returned an invalid download reference");
                Err(err)
            }
        }
    }

    pub(crate) fn finish_with_info(&mut self, message: Option<String>) {
        self.gate.disable();
        let text = message.unwrap_or_else(|| "Task finished without a translated video".into());
        self.finish(Phase::Info, Notice::new(Severity::Info, text));
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.gate.disable();
        self.finish(Phase::Failed, Notice::new(Severity::Error, message));
    }

    pub(crate) fn begin_download(&mut self) -> Option<DownloadRef> {
        if self.phase != Phase::Succeeded || self.download == Some(DownloadStatus::InProgress) {
            return None;
        }
        let download = self.gate.current()?.clone();
        self.download = Some(DownloadStatus::InProgress);
        self.mark_dirty();
        Some(download)
    }

    pub(crate) fn finish_download(&mut self, result: Result<PathBuf, String>) {
        self.download = Some(match result {
            Ok(path) => DownloadStatus::Saved(path),
            Err(message) => DownloadStatus::Failed(message),
        });
        self.mark_dirty();
    }

    pub(crate) fn has_active_task(&self) -> bool {
        self.active.is_some()
    }

    /// Abandons any in-flight work and returns to `Idle`, keeping the inputs.
    pub(crate) fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.active = None;
        self.gate.disable();
        self.download = None;
        self.notice = None;
        self.progress_label = None;
        self.progress_percent = 0;
        self.mark_dirty();
    }

    fn finish(&mut self, phase: Phase, notice: Notice) {
        self.phase = phase;
        self.active = None;
        self.progress_percent = DONE_PERCENT;
        self.notice = Some(notice);
        self.mark_dirty();
    }

    fn leave_terminal_phase(&mut self) {
        if self.phase.is_terminal() {
            self.reset();
        }
    }
}
