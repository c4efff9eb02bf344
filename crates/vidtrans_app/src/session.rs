use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use vidtrans_core::{update, AppState, DownloadRef, DownloadStatus, Effect, Msg, Phase};
use vidtrans_engine::ApiFlavor;
use vidtrans_logging::{short_id, vt_debug, vt_info};

use crate::effects::{EffectRunner, Inbound};
use crate::persistence::{save_last_task, LastTask};
use crate::render::Renderer;

const RECV_TICK: Duration = Duration::from_millis(250);

/// How a finished session ended, used for the exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub phase: Phase,
    pub download: Option<DownloadStatus>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.phase, Phase::Succeeded | Phase::Info)
            && !matches!(self.download, Some(DownloadStatus::Failed(_)))
    }
}

/// What the driver loop does after a message has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Next {
    Wait,
    Dispatch(Msg),
    Done,
}

pub(crate) fn next_step(state: &AppState, auto_download: bool) -> Next {
    match state.phase() {
        Phase::Submitting | Phase::Polling => Next::Wait,
        Phase::Succeeded if auto_download => match state.download_status() {
            None => Next::Dispatch(Msg::DownloadClicked),
            Some(DownloadStatus::InProgress) => Next::Wait,
            Some(_) => Next::Done,
        },
        // Idle here means the input was rejected before anything was sent.
        Phase::Idle | Phase::Succeeded | Phase::Info | Phase::Failed => Next::Done,
    }
}

/// Drives one submission (or resumed task) from the first message to a
/// terminal phase, rendering every state change to `out`.
pub struct Session<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    out: W,
    api: ApiFlavor,
    auto_download: bool,
}

impl<W: Write> Session<W> {
    pub fn new(state: AppState, runner: EffectRunner, out: W, api: ApiFlavor) -> Self {
        Self {
            state,
            runner,
            renderer: Renderer::default(),
            out,
            api,
            auto_download: false,
        }
    }

    pub fn auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    pub fn run(mut self, initial: Vec<Msg>) -> Result<SessionReport> {
        for msg in initial {
            self.dispatch(msg)?;
        }

        loop {
            match next_step(&self.state, self.auto_download) {
                Next::Done => break,
                Next::Dispatch(msg) => {
                    self.dispatch(msg)?;
                    continue;
                }
                Next::Wait => {}
            }

            match self.runner.next(RECV_TICK) {
                Some(Inbound::Msg(msg)) => self.dispatch(msg)?,
                Some(Inbound::EngineStopped(reason)) => bail!("engine stopped: {reason}"),
                None => {}
            }
        }

        Ok(SessionReport {
            phase: self.state.phase(),
            download: self.state.download_status().cloned(),
        })
    }

    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        vt_debug!("Dispatch {:?}", msg);
        // Only a fresh submission is recorded; a resumed task keeps its record.
        let submitted = matches!(msg, Msg::SubmissionAccepted { .. });
        let previous_task = self.state.active_task_id().map(str::to_string);

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in self.renderer.render(&state.view()) {
                writeln!(self.out, "{line}").context("writing session output")?;
            }
        }

        if let Some(task_id) = state.active_task_id().filter(|_| submitted) {
            if previous_task.as_deref() != Some(task_id) {
                vt_info!("Tracking task {}", short_id(task_id));
                let record = LastTask::now(task_id, self.api, state.language().as_str());
                save_last_task(self.runner.output_dir(), &record);
            }
        }

        self.state = state;
        self.runner.enqueue(effects);
        Ok(())
    }
}

/// Downloads a finished result outside of a session, e.g. for a task from an
/// earlier run.
pub fn download_artifact(runner: &EffectRunner, artifact_id: &str) -> Result<PathBuf> {
    let download = DownloadRef::for_artifact(artifact_id)
        .with_context(|| format!("artifact id {artifact_id:?}"))?;
    runner.enqueue(vec![Effect::Download {
        generation: 0,
        download,
    }]);

    loop {
        match runner.next(RECV_TICK) {
            Some(Inbound::Msg(Msg::DownloadFinished { result, .. })) => {
                return result.map_err(anyhow::Error::msg);
            }
            Some(Inbound::Msg(other)) => vt_debug!("Ignoring {:?} while downloading", other),
            Some(Inbound::EngineStopped(reason)) => bail!("engine stopped: {reason}"),
            None => {}
        }
    }
}
