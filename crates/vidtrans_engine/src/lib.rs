//! Vidtrans engine: backend clients, task polling and effect execution.
mod client;
mod download;
mod engine;
mod persist;
mod poller;
mod status;
mod submit;
mod types;

pub use client::{ApiFlavor, ClientError, ClientSettings, ReqwestBackend};
pub use download::{filename_from_disposition, ResultDownloader, DEFAULT_DOWNLOAD_FILENAME};
pub use engine::EngineHandle;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use poller::{classify, ChannelEventSink, EventSink, PollOutcome, PollSettings, TaskPoller};
pub use status::{parse_status, StatusClient};
pub use submit::{parse_submission_reply, SubmissionClient, SubmitRequest, SubmitSource};
pub use types::{
    DownloadError, EngineEvent, FailureCause, Generation, PollError, PollEvent, PollEventKind,
    ResultOutcome, StatusRecord, SubmissionError, TaskResult, TaskState,
};
