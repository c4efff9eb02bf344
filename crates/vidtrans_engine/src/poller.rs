use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vidtrans_logging::{short_id, vt_debug, vt_info, vt_warn};

use crate::status::StatusClient;
use crate::{
    EngineEvent, FailureCause, Generation, PollEvent, PollEventKind, ResultOutcome, StatusRecord,
    TaskState,
};

pub const STATUS_CHECK_FAILED: &str = "Error checking task status";
pub const POLL_TIMED_OUT: &str = "Timed out waiting for the translation to finish";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between the end of one status call and the start of the next.
    pub interval: Duration,
    /// `None` polls until a terminal record arrives.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_duration: Some(Duration::from_secs(60 * 60)),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A terminal event was emitted.
    Finished,
    Cancelled,
}

/// Repeated status queries for one task, one event per query.
#[derive(Clone)]
pub struct TaskPoller {
    client: Arc<dyn StatusClient>,
    settings: PollSettings,
}

struct LoopState {
    client: Arc<dyn StatusClient>,
    task_id: String,
    generation: Generation,
    interval: Duration,
    deadline: Option<Instant>,
    first: bool,
    done: bool,
}

impl TaskPoller {
    pub fn new(client: Arc<dyn StatusClient>, settings: PollSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Lazily polls `task_id`. The first query is issued immediately, each
    /// later one `interval` after the previous call returned. The stream ends
    /// after the first terminal event.
    pub fn events(
        &self,
        task_id: impl Into<String>,
        generation: Generation,
    ) -> impl Stream<Item = PollEvent> + Send + 'static {
        let start = LoopState {
            client: self.client.clone(),
            task_id: task_id.into(),
            generation,
            interval: self.settings.interval,
            deadline: self.settings.max_duration.map(|max| Instant::now() + max),
            first: true,
            done: false,
        };

        stream::unfold(start, |mut st| async move {
            if st.done {
                return None;
            }
            if st.first {
                st.first = false;
            } else {
                tokio::time::sleep(st.interval).await;
            }

            let kind = match st.deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    vt_warn!("Giving up on task {}: poll deadline reached", short_id(&st.task_id));
                    PollEventKind::Failed {
                        cause: FailureCause::TimedOut,
                        message: POLL_TIMED_OUT.to_string(),
                    }
                }
                _ => match st.client.status(&st.task_id).await {
                    Ok(record) => classify(&st.task_id, &record),
                    Err(err) => {
                        vt_warn!("Status check for {} failed: {}", short_id(&st.task_id), err);
                        PollEventKind::Failed {
                            cause: FailureCause::Transport,
                            message: STATUS_CHECK_FAILED.to_string(),
                        }
                    }
                },
            };

            st.done = kind.is_terminal();
            let event = PollEvent {
                generation: st.generation,
                task_id: st.task_id.clone(),
                kind,
            };
            Some((event, st))
        })
    }

    /// Drives [`TaskPoller::events`] into `sink` until a terminal event or cancellation.
    pub async fn run(
        &self,
        task_id: &str,
        generation: Generation,
        cancel: CancellationToken,
        sink: &dyn EventSink,
    ) -> PollOutcome {
        vt_info!("Polling task {} (generation {})", short_id(task_id), generation);
        let events = self.events(task_id, generation);
        futures_util::pin_mut!(events);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    vt_info!("Polling of task {} cancelled", short_id(task_id));
                    return PollOutcome::Cancelled;
                }
                next = events.next() => match next {
                    Some(event) => {
                        let terminal = event.kind.is_terminal();
                        vt_debug!("Task {}: {:?}", short_id(task_id), event.kind);
                        sink.emit(EngineEvent::Poll(event));
                        if terminal {
                            return PollOutcome::Finished;
                        }
                    }
                    None => return PollOutcome::Finished,
                },
            }
        }
    }
}

/// Maps one status record to the lifecycle event it produces.
pub fn classify(task_id: &str, record: &StatusRecord) -> PollEventKind {
    match &record.state {
        TaskState::Queued | TaskState::Progress | TaskState::Unrecognized(_) => {
            PollEventKind::Progress {
                label: record.progress_label.clone(),
                percent: record.progress_percent,
            }
        }
        TaskState::Failure => {
            let detail = record
                .result
                .as_ref()
                .and_then(|result| result.message.as_deref())
                .unwrap_or("Unknown error");
            PollEventKind::Failed {
                cause: FailureCause::Task,
                message: format!("Task failed: {detail}"),
            }
        }
        TaskState::Success => match &record.result {
            Some(result) => match result.outcome {
                ResultOutcome::Success => PollEventKind::Succeeded {
                    artifact_id: result
                        .video_id
                        .clone()
                        .unwrap_or_else(|| task_id.to_string()),
                },
                ResultOutcome::Info => PollEventKind::Info {
                    message: result.message.clone(),
                },
                ResultOutcome::Error => PollEventKind::Failed {
                    cause: FailureCause::Task,
                    message: result
                        .message
                        .clone()
                        .unwrap_or_else(|| "Translation failed".to_string()),
                },
            },
            None => PollEventKind::Failed {
                cause: FailureCause::Task,
                message: "Unexpected task result from server".to_string(),
            },
        },
    }
}
