use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use loom_core::{AudioRef, LanguageKey, ProviderError, StoryText};

/// Identity of one job attempt. A retry mints a fresh id so late events
/// from a replaced attempt can never be mistaken for the current one.
pub type JobAttemptId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    Translation,
    AudioSynthesis,
}

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobFailure {
    TransientNetwork(String),
    ProviderRejected(String),
    Timeout,
}

impl JobFailure {
    pub fn message(&self) -> String {
        match self {
            JobFailure::TransientNetwork(m) => format!("Network error: {m}"),
            JobFailure::ProviderRejected(m) => format!("Rejected by provider: {m}"),
            JobFailure::Timeout => "Timed out".to_string(),
        }
    }
}

impl From<ProviderError> for JobFailure {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::TransientNetwork(m) => JobFailure::TransientNetwork(m),
            ProviderError::Rejected(m) => JobFailure::ProviderRejected(m),
            ProviderError::Timeout => JobFailure::Timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(JobFailure),
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed(_) | JobState::Cancelled
        )
    }
}

/// One unit of async work: translate or synthesize one language.
///
/// State transitions are strictly `Pending → Running → terminal`; a
/// retry replaces the whole value rather than re-entering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    pub language: LanguageKey,
    pub state: JobState,
    pub progress: f32,
    pub attempt: u32,
    pub attempt_id: JobAttemptId,
}

impl Job {
    pub fn new(language: LanguageKey, kind: JobKind, attempt: u32) -> Self {
        Self {
            kind,
            language,
            state: JobState::Pending,
            progress: 0.0,
            attempt,
            attempt_id: Uuid::new_v4(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, JobState::Pending | JobState::Running)
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.state, JobState::Failed(_) | JobState::Cancelled)
    }
}

/// Payload delivered with a job's single `Succeeded` notification.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Translation(StoryText),
    Audio(AudioRef),
}

/// Lifecycle notifications emitted by a job worker. Each attempt emits
/// `Started`, zero or more `Progress`, then exactly one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRunEvent {
    Started,
    Progress(f32),
    Succeeded(JobOutput),
    Failed(JobFailure),
    Cancelled,
}

/// All job slots of the wizard, keyed by `(language, kind)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobBoard {
    slots: HashMap<(LanguageKey, JobKind), Job>,
}

impl JobBoard {
    pub fn get(&self, language: &LanguageKey, kind: JobKind) -> Option<&Job> {
        self.slots.get(&(language.clone(), kind))
    }

    pub fn get_mut(&mut self, language: &LanguageKey, kind: JobKind) -> Option<&mut Job> {
        self.slots.get_mut(&(language.clone(), kind))
    }

    /// Installs a job, replacing whatever occupied the slot.
    pub fn put(&mut self, job: Job) {
        self.slots.insert((job.language.clone(), job.kind), job);
    }

    /// Drops every slot for a language, both kinds.
    pub fn remove_language(&mut self, language: &LanguageKey) {
        self.slots.retain(|(lang, _), _| lang != language);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.values()
    }

    /// Whether a translation for this language is currently regenerating.
    /// Undo/redo for the language is locked while this holds.
    pub fn translation_running(&self, language: &LanguageKey) -> bool {
        self.get(language, JobKind::Translation)
            .map(|j| matches!(j.state, JobState::Running))
            .unwrap_or(false)
    }

    /// Languages whose translation jobs are currently running.
    pub fn locked_languages(&self) -> BTreeSet<LanguageKey> {
        self.slots
            .values()
            .filter(|j| j.kind == JobKind::Translation && matches!(j.state, JobState::Running))
            .map(|j| j.language.clone())
            .collect()
    }

    /// Mean fractional progress over the given language set for one kind.
    /// Languages without a slot yet count as zero.
    pub fn aggregate_progress(&self, kind: JobKind, languages: &BTreeSet<LanguageKey>) -> f32 {
        if languages.is_empty() {
            return 0.0;
        }
        let sum: f32 = languages
            .iter()
            .map(|lang| self.get(lang, kind).map(|j| j.progress).unwrap_or(0.0))
            .sum();
        sum / languages.len() as f32
    }

    /// Whether every language in the set has a succeeded job of this kind.
    pub fn all_succeeded(&self, kind: JobKind, languages: &BTreeSet<LanguageKey>) -> bool {
        languages.iter().all(|lang| {
            self.get(lang, kind)
                .map(|j| j.state == JobState::Succeeded)
                .unwrap_or(false)
        })
    }
}
