use crate::domain::{PhaseState, PublishState, WizardState, WizardStep};
use crate::gates;
use crate::jobs::{JobKind, JobState};
use loom_core::{EditField, LanguageKey};

/// Header/navigation projection for the step rail and Next/Back buttons.
#[derive(Debug, Clone)]
pub struct WizardVm {
    pub step: WizardStep,
    pub step_label: &'static str,
    pub step_index: usize,
    pub step_count: usize,
    pub can_next: bool,
    pub can_previous: bool,
    pub unmet_conditions: Vec<String>,
    pub last_error: Option<String>,
}

pub fn wizard_vm(state: &WizardState) -> WizardVm {
    let unmet = gates::unmet_conditions(state);
    let index = WizardStep::ORDERED
        .iter()
        .position(|s| *s == state.step)
        .unwrap_or(0);
    WizardVm {
        step: state.step,
        step_label: state.step.label(),
        step_index: index,
        step_count: WizardStep::ORDERED.len(),
        can_next: unmet.is_empty() && !state.step.is_terminal(),
        can_previous: state.step.previous().is_some(),
        unmet_conditions: unmet,
        last_error: state.last_error.clone(),
    }
}

/// One row of the per-language progress list.
#[derive(Debug, Clone)]
pub struct LanguageJobVm {
    pub language: LanguageKey,
    pub status_label: String,
    pub progress: f32,
    pub show_spinner: bool,
    pub can_retry: bool,
    pub can_cancel: bool,
    pub failure: Option<String>,
}

/// The whole progress panel for one job kind.
#[derive(Debug, Clone)]
pub struct JobPanelVm {
    pub rows: Vec<LanguageJobVm>,
    pub aggregate_progress: f32,
}

pub fn job_panel_vm(state: &WizardState, kind: JobKind) -> JobPanelVm {
    let selected = state.draft.selected_languages();
    let rows = selected
        .iter()
        .map(|language| {
            let job = state.jobs.get(language, kind);
            let (status_label, failure) = match job.map(|j| &j.state) {
                None | Some(JobState::Pending) => ("Waiting".to_string(), None),
                Some(JobState::Running) => ("Working…".to_string(), None),
                Some(JobState::Succeeded) => ("Done".to_string(), None),
                Some(JobState::Failed(f)) => ("Failed".to_string(), Some(f.message())),
                Some(JobState::Cancelled) => ("Cancelled".to_string(), None),
            };
            LanguageJobVm {
                language: language.clone(),
                status_label,
                progress: job.map(|j| j.progress).unwrap_or(0.0),
                show_spinner: matches!(job.map(|j| &j.state), Some(JobState::Running)),
                can_retry: job.map(|j| j.can_retry()).unwrap_or(false),
                can_cancel: job.map(|j| j.is_active()).unwrap_or(false),
                failure,
            }
        })
        .collect();

    JobPanelVm {
        rows,
        aggregate_progress: state.jobs.aggregate_progress(kind, selected),
    }
}

/// Editing affordances for one `(language, field)` editor surface.
#[derive(Debug, Clone)]
pub struct EditorFieldVm {
    pub value: String,
    pub editable: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub fn editor_field_vm(
    state: &WizardState,
    language: &LanguageKey,
    field: EditField,
) -> Option<EditorFieldVm> {
    let value = state.draft.field_value(language, field)?.to_string();
    let locked = state.jobs.translation_running(language) || state.draft.is_published();
    Some(EditorFieldVm {
        value,
        editable: !locked,
        can_undo: !locked && state.history.can_undo(language, field),
        can_redo: !locked && state.history.can_redo(language, field),
    })
}

/// Status line for the Upload and Analyzing steps.
pub fn phase_label(phase: &PhaseState, noun: &str) -> String {
    match phase {
        PhaseState::Idle => format!("{noun} not started"),
        PhaseState::Running => format!("{noun} in progress…"),
        PhaseState::Complete => format!("{noun} complete"),
        PhaseState::Failed(msg) => format!("{noun} failed: {msg}"),
    }
}

#[derive(Debug, Clone)]
pub struct PublishVm {
    pub status_label: String,
    pub can_publish: bool,
    pub published_id: Option<String>,
}

pub fn publish_vm(state: &WizardState) -> PublishVm {
    let (status_label, can_publish, published_id) = match &state.publish {
        PublishState::Idle => ("Ready to publish".to_string(), true, None),
        PublishState::Running => ("Publishing…".to_string(), false, None),
        PublishState::Succeeded(id) => ("Published".to_string(), false, Some(id.0.clone())),
        PublishState::Failed(msg) => (format!("Publish failed: {msg}"), true, None),
    };
    PublishVm {
        status_label,
        can_publish: can_publish && state.step == WizardStep::Finalize,
        published_id,
    }
}
