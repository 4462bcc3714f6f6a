use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::EditHistory;
use crate::jobs::JobBoard;
use loom_core::{ContentDraft, LanguageKey, PublishedId, VoiceId};

/// Identity of one wizard run. `Reset` rotates it; events carrying a
/// stale session id are discarded at the kernel's drain point.
pub type SessionId = Uuid;

/// The wizard's seven linear steps plus the terminal published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    Upload,
    Analyzing,
    Review,
    Translation,
    TranslationReview,
    Audio,
    Finalize,
    Published,
}

impl WizardStep {
    pub const ORDERED: [WizardStep; 8] = [
        WizardStep::Upload,
        WizardStep::Analyzing,
        WizardStep::Review,
        WizardStep::Translation,
        WizardStep::TranslationReview,
        WizardStep::Audio,
        WizardStep::Finalize,
        WizardStep::Published,
    ];

    pub fn next(self) -> Option<WizardStep> {
        let ix = Self::ORDERED.iter().position(|s| *s == self)?;
        Self::ORDERED.get(ix + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        if self == WizardStep::Published {
            return None;
        }
        let ix = Self::ORDERED.iter().position(|s| *s == self)?;
        ix.checked_sub(1).map(|p| Self::ORDERED[p])
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStep::Published
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Upload => "Upload image",
            WizardStep::Analyzing => "Analyzing",
            WizardStep::Review => "Review story",
            WizardStep::Translation => "Translating",
            WizardStep::TranslationReview => "Review translations",
            WizardStep::Audio => "Narration",
            WizardStep::Finalize => "Finalize",
            WizardStep::Published => "Published",
        }
    }
}

/// Lifecycle of a one-shot background operation (upload, analysis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseState {
    Idle,
    Running,
    Complete,
    Failed(String),
}

impl PhaseState {
    pub fn is_running(&self) -> bool {
        matches!(self, PhaseState::Running)
    }
}

/// Lifecycle of the terminal publish operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    Running,
    Succeeded(PublishedId),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub voice: VoiceId,
    pub speed: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice: VoiceId(loom_config::DEFAULT_VOICE.to_string()),
            speed: loom_config::DEFAULT_VOICE_SPEED,
        }
    }
}

/// Full state of one wizard run. Cloned out of the store for reads;
/// mutated only through the reducer and the kernel's scoped paths.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub session: SessionId,
    pub step: WizardStep,
    pub draft: ContentDraft,
    pub jobs: JobBoard,
    pub history: EditHistory,
    pub settings: AudioSettings,
    pub upload: PhaseState,
    pub analysis: PhaseState,
    pub publish: PublishState,
    pub last_error: Option<String>,
}

impl WizardState {
    pub fn new(source_language: LanguageKey) -> Self {
        Self {
            session: Uuid::new_v4(),
            step: WizardStep::Upload,
            draft: ContentDraft::new(source_language),
            jobs: JobBoard::default(),
            history: EditHistory::default(),
            settings: AudioSettings::default(),
            upload: PhaseState::Idle,
            analysis: PhaseState::Idle,
            publish: PublishState::Idle,
            last_error: None,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(LanguageKey::new(loom_config::DEFAULT_SOURCE_LANGUAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_linear_and_published_is_terminal() {
        let mut step = WizardStep::Upload;
        let mut seen = vec![step];
        while let Some(next) = step.next() {
            step = next;
            seen.push(step);
        }
        assert_eq!(seen, WizardStep::ORDERED.to_vec());
        assert_eq!(WizardStep::Published.next(), None);
        assert_eq!(WizardStep::Published.previous(), None);
        assert_eq!(WizardStep::Upload.previous(), None);
        assert_eq!(
            WizardStep::TranslationReview.previous(),
            Some(WizardStep::Translation)
        );
    }
}
