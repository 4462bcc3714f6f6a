use async_trait::async_trait;
use tokio::sync::mpsc;

use loom_core::{
    AnalysisResult, AudioRef, ContentDraft, LanguageKey, MediaRef, ProviderError, PublishedId,
    RepositoryError, StoryText, VoiceId,
};

/// Channel a provider call may push fractional progress (0.0..=1.0)
/// into at its own checkpoints. Senders must treat a full or closed
/// channel as a dropped sample, never an error.
pub type ProgressSink = mpsc::Sender<f32>;

/// Translates one story into one target language.
#[async_trait]
pub trait TranslationPort: Send + Sync + 'static {
    async fn translate(
        &self,
        source: &StoryText,
        target: &LanguageKey,
        progress: Option<ProgressSink>,
    ) -> Result<StoryText, ProviderError>;
}

/// Synthesizes narration audio for one language.
#[async_trait]
pub trait AudioPort: Send + Sync + 'static {
    async fn synthesize(
        &self,
        text: &str,
        language: &LanguageKey,
        voice: &VoiceId,
        speed: f32,
        progress: Option<ProgressSink>,
    ) -> Result<AudioRef, ProviderError>;
}

/// Vision provider turning the uploaded image into story text.
#[async_trait]
pub trait AnalysisPort: Send + Sync + 'static {
    async fn describe(&self, media: &MediaRef) -> Result<AnalysisResult, ProviderError>;
}

/// One-shot upload of the source image. Outside the per-language job
/// model; runs once from the Upload step.
#[async_trait]
pub trait ImagePort: Send + Sync + 'static {
    async fn upload(&self, bytes: Vec<u8>) -> Result<MediaRef, ProviderError>;
}

/// Store of finished stories. Called exactly once per successful
/// publish; retried publishes must be idempotent on the remote side.
#[async_trait]
pub trait StoryRepositoryPort: Send + Sync + 'static {
    async fn publish(&self, draft: &ContentDraft) -> Result<PublishedId, RepositoryError>;
}
