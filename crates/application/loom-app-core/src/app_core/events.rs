use crate::domain::{SessionId, WizardStep};
use crate::jobs::{JobAttemptId, JobKind, JobRunEvent};
use loom_core::{AnalysisResult, LanguageKey, MediaRef, PublishedId};

#[derive(Debug, Clone)]
pub enum WizardEvent {
    // Navigation
    StepChanged(WizardStep),

    // Anything born on a worker thread; filtered by session at the
    // kernel's drain point before it reaches the reducer.
    Service {
        session: SessionId,
        ev: ServiceEvent,
    },

    // User-visible errors
    UserError(String),
}

#[derive(Debug, Clone)]
pub enum ServiceEvent {
    // Image upload (one-shot)
    UploadStarted,
    ImageAttached(MediaRef),
    UploadFailed { message: String },

    // Vision analysis (one-shot)
    AnalysisStarted,
    AnalysisReady(AnalysisResult),
    AnalysisFailed { message: String },

    // Per-language jobs
    Job {
        language: LanguageKey,
        kind: JobKind,
        attempt_id: JobAttemptId,
        ev: JobRunEvent,
    },

    // Publish (one-shot, terminal)
    PublishStarted,
    PublishSucceeded(PublishedId),
    PublishFailed { message: String },
}
