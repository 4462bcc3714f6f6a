mod common;

use common::*;

use std::time::Duration;

use loom_app_core::{JobFailure, JobKind, JobState, WizardCommand, WizardStep};
use loom_core::LanguageKey;

fn lang(code: &str) -> LanguageKey {
    LanguageKey::new(code)
}

fn translation_state(state: &loom_app_core::WizardState, code: &str) -> Option<JobState> {
    state
        .jobs
        .get(&lang(code), JobKind::Translation)
        .map(|j| j.state.clone())
}

#[test]
fn cancelled_job_stays_cancelled() {
    let mut kernel = kernel_with_translator(ScriptedTranslator::new().with_delay("es", 400));
    drive_to_review(&mut kernel);
    kernel.dispatch(WizardCommand::SelectLanguage(lang("es")));
    kernel.dispatch(WizardCommand::Next);

    pump_until(&mut kernel, "es running", |s| {
        translation_state(s, "es") == Some(JobState::Running)
    });
    kernel.dispatch(WizardCommand::CancelJob {
        language: lang("es"),
        kind: JobKind::Translation,
    });
    assert_eq!(
        translation_state(&kernel.store.state(), "es"),
        Some(JobState::Cancelled)
    );

    // Long enough for the provider to have answered, had it not been
    // cancelled: nothing the worker emits lands anymore.
    pump_for(&mut kernel, Duration::from_millis(600));
    let state = kernel.store.state();
    assert_eq!(translation_state(&state, "es"), Some(JobState::Cancelled));
    assert!(state.draft.translation(&lang("es")).is_none());

    let slot = state.jobs.get(&lang("es"), JobKind::Translation).unwrap();
    assert!(slot.can_retry());
    assert!((slot.progress - 0.0).abs() < f32::EPSILON);
}

#[test]
fn slow_provider_times_out_into_failed() {
    let mut kernel = kernel_with_translator(ScriptedTranslator::new().with_delay("es", 5_000))
        .with_job_timeout(Duration::from_millis(100));
    drive_to_review(&mut kernel);
    kernel.dispatch(WizardCommand::SelectLanguage(lang("es")));
    kernel.dispatch(WizardCommand::Next);

    pump_until(&mut kernel, "es timed out", |s| {
        translation_state(s, "es") == Some(JobState::Failed(JobFailure::Timeout))
    });

    // Bookkept like a cancellation: no output, retry available.
    let state = kernel.store.state();
    assert!(state.draft.translation(&lang("es")).is_none());
    let slot = state.jobs.get(&lang("es"), JobKind::Translation).unwrap();
    assert!(slot.can_retry());
    assert_eq!(slot.attempt, 1);
}

#[test]
fn deselecting_a_language_cancels_and_evicts_it() {
    let mut kernel = kernel_with_translator(ScriptedTranslator::new().with_delay("hi", 400));
    drive_to_review(&mut kernel);
    kernel.dispatch(WizardCommand::SelectLanguage(lang("es")));
    kernel.dispatch(WizardCommand::SelectLanguage(lang("hi")));
    kernel.dispatch(WizardCommand::Next);

    pump_until(&mut kernel, "es done, hi running", |s| {
        translation_state(s, "es") == Some(JobState::Succeeded)
            && translation_state(s, "hi") == Some(JobState::Running)
    });

    kernel.dispatch(WizardCommand::DeselectLanguage(lang("hi")));
    let state = kernel.store.state();
    assert!(!state.draft.selected_languages().contains(&lang("hi")));
    assert_eq!(translation_state(&state, "hi"), Some(JobState::Cancelled));

    // The worker's late result for hi is discarded, not resurrected.
    pump_for(&mut kernel, Duration::from_millis(600));
    let state = kernel.store.state();
    assert!(state.draft.translation(&lang("hi")).is_none());
    assert_eq!(translation_state(&state, "hi"), Some(JobState::Cancelled));

    // With only es selected the gate is satisfied again.
    kernel.dispatch(WizardCommand::Next);
    assert_eq!(kernel.store.state().step, WizardStep::TranslationReview);
}

#[test]
fn re_entering_a_job_step_keeps_the_running_attempt() {
    let mut kernel = kernel_with_translator(ScriptedTranslator::new().with_delay("es", 300));
    drive_to_review(&mut kernel);
    kernel.dispatch(WizardCommand::SelectLanguage(lang("es")));
    kernel.dispatch(WizardCommand::Next);

    pump_until(&mut kernel, "es running", |s| {
        translation_state(s, "es") == Some(JobState::Running)
    });
    let attempt_id = kernel
        .store
        .state()
        .jobs
        .get(&lang("es"), JobKind::Translation)
        .unwrap()
        .attempt_id;

    kernel.dispatch(WizardCommand::Previous);
    kernel.dispatch(WizardCommand::Next);

    let slot = kernel.store.state();
    let slot = slot.jobs.get(&lang("es"), JobKind::Translation).unwrap();
    assert_eq!(slot.attempt_id, attempt_id);
    assert_eq!(slot.attempt, 1);

    pump_until(&mut kernel, "es succeeded", |s| {
        translation_state(s, "es") == Some(JobState::Succeeded)
    });
    let state = kernel.store.state();
    let slot = state.jobs.get(&lang("es"), JobKind::Translation).unwrap();
    assert_eq!(slot.attempt_id, attempt_id);
    assert_eq!(slot.attempt, 1);
}

#[test]
fn reset_abandons_the_session() {
    let mut kernel = kernel_with_translator(ScriptedTranslator::new().with_delay("es", 400));
    drive_to_review(&mut kernel);
    kernel.dispatch(WizardCommand::SelectLanguage(lang("es")));
    kernel.dispatch(WizardCommand::Next);
    pump_until(&mut kernel, "es running", |s| {
        translation_state(s, "es") == Some(JobState::Running)
    });

    let old_session = kernel.store.state().session;
    kernel.dispatch(WizardCommand::Reset);

    let state = kernel.store.state();
    assert_eq!(state.step, WizardStep::Upload);
    assert_ne!(state.session, old_session);
    assert!(state.draft.media.is_none());
    assert_eq!(state.jobs.iter().count(), 0);

    // Events from the abandoned session never reach the new one.
    pump_for(&mut kernel, Duration::from_millis(600));
    let state = kernel.store.state();
    assert_eq!(state.jobs.iter().count(), 0);
    assert!(state.draft.translation(&lang("es")).is_none());
    assert!(state.last_error.is_none());
}
