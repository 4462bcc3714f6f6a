use crate::draft::EditField;
use crate::language::LanguageKey;

/// Failure reported by an external provider (translation, speech,
/// vision, image upload). Non-fatal: terminates the owning job only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    TransientNetwork(String),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("provider call timed out")]
    Timeout,
}

/// Failure from the story repository during publish.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository rejected the story: {0}")]
    Rejected(String),
}

/// Violation of the draft's structural rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("language '{0}' is not selected")]
    LanguageNotSelected(LanguageKey),
    #[error("no translation exists yet for '{0}'")]
    MissingTranslation(LanguageKey),
    #[error("draft is published and can no longer be modified")]
    Published,
}

/// Failure applying an undo/redo snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// A translation job for this language is still running; applying
    /// the snapshot would race its completion callback.
    #[error("'{language}' is being regenerated; undo/redo is unavailable")]
    Conflict { language: LanguageKey },
    #[error("snapshot target {field:?} for '{language}' no longer exists")]
    MissingTarget {
        language: LanguageKey,
        field: EditField,
    },
    #[error(transparent)]
    Draft(#[from] DraftError),
}
