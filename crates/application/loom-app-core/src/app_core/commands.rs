use std::collections::BTreeSet;

use crate::domain::AudioSettings;
use crate::jobs::JobKind;
use loom_core::{EditField, LanguageKey};

#[derive(Debug, Clone)]
pub enum WizardCommand {
    // Step navigation
    Next,
    Previous,
    Reset,

    // One-shot operations
    UploadImage(Vec<u8>),
    RetryAnalysis,

    // Draft editing
    EditField {
        language: LanguageKey,
        field: EditField,
        value: String,
    },
    SetTags(BTreeSet<String>),
    SelectLanguage(LanguageKey),
    DeselectLanguage(LanguageKey),
    UpdateAudioSettings(AudioSettings),

    // Per-language jobs
    CancelJob {
        language: LanguageKey,
        kind: JobKind,
    },
    RetryJob {
        language: LanguageKey,
        kind: JobKind,
    },

    // History
    Undo,
    Redo,
}
