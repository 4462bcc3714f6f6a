use crate::domain::{PhaseState, PublishState, WizardState, WizardStep};
use crate::jobs::{JobKind, JobState};

/// `Next` was attempted with the current step's gate still blocked.
/// Carries the user-displayable list of unmet conditions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot continue: {}", .0.join("; "))]
pub struct GateNotSatisfied(pub Vec<String>);

/// Conditions still blocking `Next` from the current step. Empty means
/// the gate is satisfied. Failed jobs surface as a user decision (retry
/// or remove the language) rather than a hard stop elsewhere.
pub fn unmet_conditions(state: &WizardState) -> Vec<String> {
    match state.step {
        WizardStep::Upload => {
            let mut unmet = Vec::new();
            if state.upload.is_running() {
                unmet.push("Image upload is still in progress".to_string());
            } else if state.draft.media.is_none() {
                unmet.push("No image has been uploaded".to_string());
            }
            unmet
        }

        WizardStep::Analyzing => {
            let mut unmet = Vec::new();
            match &state.analysis {
                PhaseState::Running => unmet.push("Analysis is still running".to_string()),
                PhaseState::Failed(msg) => unmet.push(format!("Analysis failed: {msg}")),
                PhaseState::Idle => unmet.push("Analysis has not started".to_string()),
                PhaseState::Complete => {}
            }
            if state.draft.title.trim().is_empty() || state.draft.body.trim().is_empty() {
                unmet.push("Analysis produced no story text".to_string());
            }
            unmet
        }

        WizardStep::Review => {
            let mut unmet = Vec::new();
            if state.draft.title.trim().is_empty() {
                unmet.push("Story title is empty".to_string());
            }
            if state.draft.body.trim().is_empty() {
                unmet.push("Story body is empty".to_string());
            }
            if state.draft.selected_languages().is_empty() {
                unmet.push("No target languages selected".to_string());
            }
            unmet
        }

        WizardStep::Translation => job_conditions(state, JobKind::Translation, "Translation"),

        WizardStep::TranslationReview => {
            let missing: Vec<_> = state
                .draft
                .selected_languages()
                .iter()
                .filter(|lang| state.draft.translation(lang).is_none())
                .collect();
            if missing.is_empty() {
                Vec::new()
            } else {
                vec![format!("{} languages have no translation", missing.len())]
            }
        }

        WizardStep::Audio => job_conditions(state, JobKind::AudioSynthesis, "Narration"),

        WizardStep::Finalize => match &state.publish {
            PublishState::Running => vec!["Publishing is already in progress".to_string()],
            _ => Vec::new(),
        },

        WizardStep::Published => vec!["Story is already published".to_string()],
    }
}

fn job_conditions(state: &WizardState, kind: JobKind, noun: &str) -> Vec<String> {
    let mut pending = 0usize;
    let mut unmet = Vec::new();

    for lang in state.draft.selected_languages() {
        match state.jobs.get(lang, kind).map(|j| &j.state) {
            Some(JobState::Succeeded) => {}
            Some(JobState::Failed(failure)) => unmet.push(format!(
                "{noun} for '{lang}' failed ({}); retry it or remove the language",
                failure.message()
            )),
            Some(JobState::Cancelled) => unmet.push(format!(
                "{noun} for '{lang}' was cancelled; retry it or remove the language"
            )),
            Some(JobState::Pending) | Some(JobState::Running) | None => pending += 1,
        }
    }

    if pending > 0 {
        let plural = if pending == 1 { "language" } else { "languages" };
        unmet.insert(0, format!("{pending} {plural} still pending"));
    }
    unmet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Job, JobFailure};
    use loom_core::{LanguageKey, StoryText};

    fn review_ready_state() -> WizardState {
        let mut state = WizardState::default();
        state.draft.title = "A fox".into();
        state.draft.body = "Once upon a time.".into();
        state
            .draft
            .select_language(LanguageKey::new("es"))
            .unwrap();
        state
            .draft
            .select_language(LanguageKey::new("hi"))
            .unwrap();
        state
    }

    #[test]
    fn review_gate_requires_text_and_languages() {
        let mut state = WizardState::default();
        state.step = WizardStep::Review;
        let unmet = unmet_conditions(&state);
        assert_eq!(unmet.len(), 3);

        let state = {
            let mut s = review_ready_state();
            s.step = WizardStep::Review;
            s
        };
        assert!(unmet_conditions(&state).is_empty());
    }

    #[test]
    fn translation_gate_counts_pending_and_names_failures() {
        let mut state = review_ready_state();
        state.step = WizardStep::Translation;

        // Nothing started yet: both languages pending.
        assert_eq!(unmet_conditions(&state), vec!["2 languages still pending"]);

        let mut es = Job::new(LanguageKey::new("es"), JobKind::Translation, 1);
        es.state = JobState::Succeeded;
        state.jobs.put(es);
        let mut hi = Job::new(LanguageKey::new("hi"), JobKind::Translation, 1);
        hi.state = JobState::Failed(JobFailure::TransientNetwork("connection reset".into()));
        state.jobs.put(hi);

        let unmet = unmet_conditions(&state);
        assert_eq!(unmet.len(), 1);
        assert!(unmet[0].contains("'hi'"));
        assert!(unmet[0].contains("retry it or remove the language"));
    }

    #[test]
    fn translation_gate_clears_when_all_succeed() {
        let mut state = review_ready_state();
        state.step = WizardStep::Translation;
        for code in ["es", "hi"] {
            let lang = LanguageKey::new(code);
            state
                .draft
                .set_translation(
                    lang.clone(),
                    StoryText {
                        title: "t".into(),
                        body: "b".into(),
                    },
                )
                .unwrap();
            let mut job = Job::new(lang, JobKind::Translation, 1);
            job.state = JobState::Succeeded;
            job.progress = 1.0;
            state.jobs.put(job);
        }
        assert!(unmet_conditions(&state).is_empty());
    }

    #[test]
    fn dropping_a_failed_language_satisfies_the_gate() {
        let mut state = review_ready_state();
        state.step = WizardStep::Translation;
        let mut es = Job::new(LanguageKey::new("es"), JobKind::Translation, 1);
        es.state = JobState::Succeeded;
        state.jobs.put(es);
        let mut hi = Job::new(LanguageKey::new("hi"), JobKind::Translation, 1);
        hi.state = JobState::Failed(JobFailure::Timeout);
        state.jobs.put(hi);
        assert!(!unmet_conditions(&state).is_empty());

        let hi = LanguageKey::new("hi");
        state.draft.deselect_language(&hi).unwrap();
        state.jobs.remove_language(&hi);
        assert!(unmet_conditions(&state).is_empty());
    }
}
