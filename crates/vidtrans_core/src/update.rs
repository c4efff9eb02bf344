use vidtrans_logging::{vt_debug, vt_warn};

use crate::{AppState, Effect, Generation, Msg, Phase, SourceInput, SubmissionRequest};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages produced by the engine carry the generation they were issued
/// under. A message whose generation or expected phase no longer matches is
/// dropped without touching state.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            if state.phase().controls_enabled() {
                state.select_file(file);
            }
            Vec::new()
        }
        Msg::UrlEdited(text) => {
            if state.phase().controls_enabled() {
                state.edit_url(text);
            }
            Vec::new()
        }
        Msg::LanguageSelected(raw) => {
            if state.phase().controls_enabled() {
                state.select_language(&raw);
            }
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::ResumeTask { task_id } => {
            if !state.phase().controls_enabled() || task_id.trim().is_empty() {
                return (state, Vec::new());
            }
            let generation = state.begin_resume(task_id.clone());
            vec![Effect::StartPolling {
                generation,
                task_id,
            }]
        }
        Msg::ResetClicked => {
            let had_task = state.has_active_task();
            if state.phase() == Phase::Idle && !had_task {
                return (state, Vec::new());
            }
            state.reset();
            if had_task {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionAccepted {
            generation,
            task_id,
        } => {
            if !accepts(&state, generation, Phase::Submitting, "SubmissionAccepted") {
                return (state, Vec::new());
            }
            state.start_polling(task_id.clone());
            vec![Effect::StartPolling {
                generation,
                task_id,
            }]
        }
        Msg::SubmissionRejected {
            generation,
            message,
        } => {
            if accepts(&state, generation, Phase::Submitting, "SubmissionRejected") {
                state.fail(message);
            }
            Vec::new()
        }
        Msg::TaskProgress {
            generation,
            label,
            percent,
        } => {
            if accepts(&state, generation, Phase::Polling, "TaskProgress") {
                state.apply_progress(label, percent);
            }
            Vec::new()
        }
        Msg::TaskSucceeded {
            generation,
            artifact_id,
        } => {
            if accepts(&state, generation, Phase::Polling, "TaskSucceeded") {
                if let Err(err) = state.succeed(&artifact_id) {
                    vt_warn!("Rejecting download reference: {}", err);
                }
            }
            Vec::new()
        }
        Msg::TaskInfo {
            generation,
            message,
        } => {
            if accepts(&state, generation, Phase::Polling, "TaskInfo") {
                state.finish_with_info(message);
            }
            Vec::new()
        }
        Msg::TaskFailed {
            generation,
            message,
        } => {
            if accepts(&state, generation, Phase::Polling, "TaskFailed") {
                state.fail(message);
            }
            Vec::new()
        }
        Msg::DownloadClicked => match state.begin_download() {
            Some(download) => vec![Effect::Download {
                generation: state.generation(),
                download,
            }],
            None => Vec::new(),
        },
        Msg::DownloadFinished { generation, result } => {
            let in_flight = matches!(
                state.download_status(),
                Some(crate::DownloadStatus::InProgress)
            );
            if in_flight && accepts(&state, generation, Phase::Succeeded, "DownloadFinished") {
                state.finish_download(result);
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if !state.phase().controls_enabled() {
        return Vec::new();
    }

    let (file, url) = match state.input() {
        SourceInput::Empty => (None, ""),
        SourceInput::File(file) => (Some(file), ""),
        SourceInput::Url(url) => (None, url.as_str()),
    };
    let request = match SubmissionRequest::from_inputs(file, url, state.language()) {
        Ok(request) => request,
        Err(err) => {
            vt_debug!("Submission rejected before sending: {}", err);
            state.reject_submission_input(&err);
            return Vec::new();
        }
    };

    let had_task = state.has_active_task();
    let generation = state.begin_submission(request.source.kind());
    let mut effects = Vec::with_capacity(2);
    if had_task {
        effects.push(Effect::CancelPolling);
    }
    effects.push(Effect::Submit {
        generation,
        request,
    });
    effects
}

fn accepts(state: &AppState, generation: Generation, phase: Phase, what: &str) -> bool {
    if state.is_current(generation, phase) {
        return true;
    }
    vt_debug!(
        "Discarding stale {} (generation {}, current {}, phase {:?})",
        what,
        generation,
        state.generation(),
        state.phase()
    );
    false
}
