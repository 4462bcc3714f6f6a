use crate::domain::{PhaseState, PublishState, WizardState, WizardStep};
use crate::jobs::{JobKind, JobOutput, JobRunEvent, JobState};
use loom_core::LanguageKey;

use super::events::{ServiceEvent, WizardEvent};

pub fn reduce(mut state: WizardState, ev: WizardEvent) -> WizardState {
    match ev {
        WizardEvent::StepChanged(step) => {
            state.step = step;
            state.last_error = None;
        }

        WizardEvent::Service { session: _, ev } => apply_service_event(&mut state, ev),

        WizardEvent::UserError(msg) => {
            state.last_error = Some(msg);
        }
    }
    state
}

fn apply_service_event(state: &mut WizardState, ev: ServiceEvent) {
    match ev {
        ServiceEvent::UploadStarted => {
            state.upload = PhaseState::Running;
            state.last_error = None;
        }
        ServiceEvent::ImageAttached(media) => {
            state.draft.media = Some(media);
            state.upload = PhaseState::Complete;
        }
        ServiceEvent::UploadFailed { message } => {
            state.upload = PhaseState::Failed(message.clone());
            state.last_error = Some(message);
        }

        ServiceEvent::AnalysisStarted => {
            state.analysis = PhaseState::Running;
            state.last_error = None;
        }
        ServiceEvent::AnalysisReady(result) => {
            if state.draft.apply_analysis(result).is_ok() {
                state.analysis = PhaseState::Complete;
            }
        }
        ServiceEvent::AnalysisFailed { message } => {
            state.analysis = PhaseState::Failed(message.clone());
            state.last_error = Some(message);
        }

        ServiceEvent::Job {
            language,
            kind,
            attempt_id: _,
            ev,
        } => apply_job_event(state, language, kind, ev),

        ServiceEvent::PublishStarted => {
            state.publish = PublishState::Running;
            state.last_error = None;
        }
        ServiceEvent::PublishSucceeded(id) => {
            state.draft.mark_published();
            state.publish = PublishState::Succeeded(id);
            state.step = WizardStep::Published;
        }
        ServiceEvent::PublishFailed { message } => {
            state.publish = PublishState::Failed(message.clone());
            state.last_error = Some(message);
        }
    }
}

// Attempt-id and staleness filtering happens at the kernel's drain
// point; by the time an event reaches here it targets the live attempt
// of an existing, non-terminal slot.
fn apply_job_event(state: &mut WizardState, language: LanguageKey, kind: JobKind, ev: JobRunEvent) {
    let Some(job) = state.jobs.get_mut(&language, kind) else {
        return;
    };

    match ev {
        JobRunEvent::Started => {
            if job.state == JobState::Pending {
                job.state = JobState::Running;
            }
        }
        JobRunEvent::Progress(p) => {
            if job.state == JobState::Running {
                job.progress = p.clamp(0.0, 1.0);
            }
        }
        JobRunEvent::Succeeded(output) => {
            job.state = JobState::Succeeded;
            job.progress = 1.0;
            let write_res = match output {
                JobOutput::Translation(text) => state.draft.set_translation(language, text),
                JobOutput::Audio(clip) => state.draft.set_audio(language, clip),
            };
            // A deselect cancels the slot before evicting the language,
            // so a rejected write here only ever drops stale output.
            if let Err(e) = write_res {
                tracing::debug!(error = %e, "dropped job output for evicted language");
            }
        }
        JobRunEvent::Failed(failure) => {
            job.state = JobState::Failed(failure);
        }
        JobRunEvent::Cancelled => {
            job.state = JobState::Cancelled;
        }
    }
}
