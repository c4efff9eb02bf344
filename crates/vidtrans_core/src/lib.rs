//! Vidtrans core: pure session state machine and view-model helpers.
mod effect;
mod msg;
mod request;
mod result_gate;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use request::{
    FileHandle, LanguageCode, SourceKind, SubmissionRequest, SubmissionSource, ValidationError,
    DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES,
};
pub use result_gate::{DownloadRef, InvalidArtifactId, ResultGate, DOWNLOAD_ROUTE};
pub use state::{
    AppState, DownloadStatus, Generation, Notice, Phase, Severity, SourceInput, TaskId,
    DEFAULT_PROGRESS_LABEL,
};
pub use update::update;
pub use view_model::{AppViewModel, DownloadView, SourceView};
