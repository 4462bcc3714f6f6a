pub mod draft;
pub mod error;
pub mod language;

pub use draft::{
    AnalysisResult, AudioRef, ContentDraft, EditField, EditSnapshot, MediaRef, PublishedId,
    StoryText, VoiceId,
};
pub use error::{DraftError, EditError, ProviderError, RepositoryError};
pub use language::LanguageKey;
