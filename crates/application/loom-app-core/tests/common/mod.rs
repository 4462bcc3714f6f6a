#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use loom_app_core::{
    AnalysisPort, AudioPort, ImagePort, ProgressSink, StoryRepositoryPort, TranslationPort,
    WizardKernel, WizardState, WizardStore,
};
use loom_core::{
    AnalysisResult, AudioRef, ContentDraft, LanguageKey, MediaRef, ProviderError, PublishedId,
    RepositoryError, StoryText, VoiceId,
};

pub struct StaticImage;

#[async_trait]
impl ImagePort for StaticImage {
    async fn upload(&self, _bytes: Vec<u8>) -> Result<MediaRef, ProviderError> {
        Ok(MediaRef {
            uri: "media:test-1".into(),
        })
    }
}

pub struct StaticAnalysis;

#[async_trait]
impl AnalysisPort for StaticAnalysis {
    async fn describe(&self, _media: &MediaRef) -> Result<AnalysisResult, ProviderError> {
        Ok(AnalysisResult {
            title: "A curious fox".into(),
            body: "Once upon a time, a fox found a lantern.".into(),
            tags: BTreeSet::from(["fox".to_string(), "night".to_string()]),
        })
    }
}

/// Translator whose per-language behavior tests script: an optional
/// delay before answering and a set of languages whose first attempt
/// fails with a transient network error.
#[derive(Default)]
pub struct ScriptedTranslator {
    fail_once: Mutex<HashSet<String>>,
    delays_ms: HashMap<String, u64>,
}

impl ScriptedTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_once(languages: &[&str]) -> Self {
        Self {
            fail_once: Mutex::new(languages.iter().map(|s| s.to_string()).collect()),
            delays_ms: HashMap::new(),
        }
    }

    pub fn with_delay(mut self, language: &str, ms: u64) -> Self {
        self.delays_ms.insert(language.to_string(), ms);
        self
    }
}

#[async_trait]
impl TranslationPort for ScriptedTranslator {
    async fn translate(
        &self,
        source: &StoryText,
        target: &LanguageKey,
        progress: Option<ProgressSink>,
    ) -> Result<StoryText, ProviderError> {
        if let Some(ms) = self.delays_ms.get(target.code()) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if let Some(p) = progress {
            let _ = p.send(0.5).await;
        }
        let failed = self.fail_once.lock().unwrap().remove(target.code());
        if failed {
            return Err(ProviderError::TransientNetwork("connection reset".into()));
        }
        Ok(StoryText {
            title: format!("[{target}] {}", source.title),
            body: format!("[{target}] {}", source.body),
        })
    }
}

pub struct StaticAudio;

#[async_trait]
impl AudioPort for StaticAudio {
    async fn synthesize(
        &self,
        _text: &str,
        language: &LanguageKey,
        _voice: &VoiceId,
        _speed: f32,
        progress: Option<ProgressSink>,
    ) -> Result<AudioRef, ProviderError> {
        if let Some(p) = progress {
            let _ = p.send(1.0).await;
        }
        Ok(AudioRef {
            uri: format!("blob:{language}"),
            duration_secs: 12.0,
        })
    }
}

pub struct StaticRepo;

#[async_trait]
impl StoryRepositoryPort for StaticRepo {
    async fn publish(&self, _draft: &ContentDraft) -> Result<PublishedId, RepositoryError> {
        Ok(PublishedId("story-1".into()))
    }
}

pub type TestKernel =
    WizardKernel<StaticImage, StaticAnalysis, ScriptedTranslator, StaticAudio, StaticRepo>;

pub fn kernel_with_translator(translator: ScriptedTranslator) -> TestKernel {
    WizardKernel::new(
        WizardStore::default(),
        StaticImage,
        StaticAnalysis,
        translator,
        StaticAudio,
        StaticRepo,
    )
}

pub fn kernel_with_state(state: WizardState, translator: ScriptedTranslator) -> TestKernel {
    WizardKernel::new(
        WizardStore::new(state),
        StaticImage,
        StaticAnalysis,
        translator,
        StaticAudio,
        StaticRepo,
    )
}

/// Ticks the kernel until the predicate holds or a deadline passes.
pub fn pump_until(kernel: &mut TestKernel, what: &str, pred: impl Fn(&WizardState) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        kernel.tick();
        if pred(&kernel.store.state()) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for: {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Lets in-flight workers run for a while, then applies their events.
pub fn pump_for(kernel: &mut TestKernel, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        kernel.tick();
        std::thread::sleep(Duration::from_millis(5));
    }
    kernel.tick();
}

/// Drives a fresh kernel through upload and analysis up to `Review`.
pub fn drive_to_review(kernel: &mut TestKernel) {
    use loom_app_core::{WizardCommand, WizardStep};

    kernel.dispatch(WizardCommand::UploadImage(vec![0xAB; 8]));
    pump_until(kernel, "image attached", |s| s.draft.media.is_some());

    kernel.dispatch(WizardCommand::Next);
    pump_until(kernel, "analysis complete", |s| {
        !s.draft.title.is_empty() && !s.draft.body.is_empty()
    });

    kernel.dispatch(WizardCommand::Next);
    assert_eq!(kernel.store.state().step, WizardStep::Review);
}
