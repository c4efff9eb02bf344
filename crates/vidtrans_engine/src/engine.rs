use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;
use vidtrans_logging::{short_id, vt_debug, vt_error, vt_info};

use crate::client::{ClientError, ClientSettings, ReqwestBackend};
use crate::download::ResultDownloader;
use crate::poller::{ChannelEventSink, PollSettings, TaskPoller};
use crate::status::StatusClient;
use crate::submit::{SubmissionClient, SubmitRequest};
use crate::{EngineEvent, Generation};

enum EngineCommand {
    Submit {
        generation: Generation,
        request: SubmitRequest,
    },
    StartPolling {
        generation: Generation,
        task_id: String,
    },
    CancelPolling,
    Download {
        generation: Generation,
        path: String,
        output_dir: PathBuf,
    },
}

/// Bridge between the synchronous app loop and the engine thread.
///
/// Commands run on a single-threaded tokio runtime; results come back as
/// [`EngineEvent`]s in completion order.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let poll = settings.poll_settings();
        let backend = Arc::new(ReqwestBackend::new(settings)?);
        Ok(Self::with_backend(backend, poll))
    }

    pub fn with_backend<B>(backend: Arc<B>, poll: PollSettings) -> Self
    where
        B: SubmissionClient + StatusClient + ResultDownloader + 'static,
    {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    vt_error!("Failed to start engine runtime: {}", err);
                    let _ = event_tx.send(EngineEvent::Stopped {
                        reason: format!("failed to start runtime: {err}"),
                    });
                    return;
                }
            };
            let poller = TaskPoller::new(backend.clone(), poll);
            runtime.block_on(run_engine(backend, poller, cmd_rx, event_tx));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, generation: Generation, request: SubmitRequest) {
        self.send(EngineCommand::Submit {
            generation,
            request,
        });
    }

    /// Starts polling `task_id`, cancelling any poll already running.
    pub fn start_polling(&self, generation: Generation, task_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            generation,
            task_id: task_id.into(),
        });
    }

    pub fn cancel_polling(&self) {
        self.send(EngineCommand::CancelPolling);
    }

    pub fn download(&self, generation: Generation, path: impl Into<String>, output_dir: PathBuf) {
        self.send(EngineCommand::Download {
            generation,
            path: path.into(),
            output_dir,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. A vanished engine thread is
    /// reported as [`EngineEvent::Stopped`].
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(EngineEvent::Stopped {
                reason: "engine thread exited".to_string(),
            }),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            vt_error!("Engine thread is gone; command dropped");
        }
    }
}

async fn run_engine<B>(
    backend: Arc<B>,
    poller: TaskPoller,
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) where
    B: SubmissionClient + StatusClient + ResultDownloader + 'static,
{
    let mut active_poll: Option<CancellationToken> = None;

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::Submit {
                generation,
                request,
            } => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = backend.submit(&request).await;
                    let _ = event_tx.send(EngineEvent::Submitted { generation, result });
                });
            }
            EngineCommand::StartPolling {
                generation,
                task_id,
            } => {
                if let Some(previous) = active_poll.take() {
                    previous.cancel();
                }
                let token = CancellationToken::new();
                active_poll = Some(token.clone());
                let poller = poller.clone();
                let sink = ChannelEventSink::new(event_tx.clone());
                tokio::spawn(async move {
                    let outcome = poller.run(&task_id, generation, token, &sink).await;
                    vt_debug!("Poll loop for {} ended: {:?}", short_id(&task_id), outcome);
                });
            }
            EngineCommand::CancelPolling => {
                if let Some(token) = active_poll.take() {
                    token.cancel();
                }
            }
            EngineCommand::Download {
                generation,
                path,
                output_dir,
            } => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = backend
                        .download(&path, &output_dir)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = event_tx.send(EngineEvent::Downloaded { generation, result });
                });
            }
        }
    }

    if let Some(token) = active_poll.take() {
        token.cancel();
    }
    vt_info!("Engine command channel closed");
    let _ = event_tx.send(EngineEvent::Stopped {
        reason: "command channel closed".to_string(),
    });
}
