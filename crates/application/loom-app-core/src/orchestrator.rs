use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app_core::{ServiceEvent, WizardEvent};
use crate::domain::{AudioSettings, SessionId};
use crate::jobs::{JobAttemptId, JobFailure, JobKind, JobOutput, JobRunEvent};
use crate::ports::{AudioPort, TranslationPort};
use loom_core::{LanguageKey, ProviderError, StoryText};

/// Runs one worker per `(language, kind)` job slot.
///
/// Each worker is an independently scheduled unit: a named thread
/// driving the shared runtime, racing the provider call against its
/// cancellation token and a timeout. Workers never touch state; they
/// only emit [`ServiceEvent::Job`] notifications that the kernel
/// filters and the reducer applies. Failure of one worker never stops
/// a sibling.
pub struct JobOrchestrator<T, A> {
    translator: Arc<T>,
    audio: Arc<A>,
    tx: mpsc::Sender<WizardEvent>,
    tokens: HashMap<(LanguageKey, JobKind), CancellationToken>,
    timeout: Duration,
}

impl<T, A> JobOrchestrator<T, A>
where
    T: TranslationPort,
    A: AudioPort,
{
    pub fn new(translator: Arc<T>, audio: Arc<A>, tx: mpsc::Sender<WizardEvent>) -> Self {
        Self {
            translator,
            audio,
            tx,
            tokens: HashMap::new(),
            timeout: Duration::from_secs(loom_config::DEFAULT_JOB_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Signals one slot's worker to stop at its next checkpoint.
    /// Cooperative: the worker finishes its current await first.
    /// Cancelling an absent or finished slot is a no-op.
    pub fn cancel(&mut self, language: &LanguageKey, kind: JobKind) {
        if let Some(token) = self.tokens.remove(&(language.clone(), kind)) {
            tracing::debug!(%language, ?kind, "cancelling job");
            token.cancel();
        }
    }

    pub fn cancel_language(&mut self, language: &LanguageKey) {
        self.cancel(language, JobKind::Translation);
        self.cancel(language, JobKind::AudioSynthesis);
    }

    pub fn cancel_all(&mut self) {
        for (_, token) in self.tokens.drain() {
            token.cancel();
        }
    }

    pub fn start_translation(
        &mut self,
        session: SessionId,
        language: LanguageKey,
        attempt_id: JobAttemptId,
        source: StoryText,
    ) -> anyhow::Result<()> {
        let token = self.install_token(&language, JobKind::Translation);
        let tx = self.tx.clone();
        let translator = self.translator.clone();
        let timeout = self.timeout;
        let lang = language.clone();

        std::thread::Builder::new()
            .name(format!("loom-translate-{language}"))
            .spawn(move || {
                run_worker(
                    tx,
                    session,
                    lang.clone(),
                    JobKind::Translation,
                    attempt_id,
                    token,
                    timeout,
                    move |progress| async move {
                        translator
                            .translate(&source, &lang, Some(progress))
                            .await
                            .map(JobOutput::Translation)
                    },
                );
            })
            .context("Failed to spawn translation worker thread")?;
        Ok(())
    }

    pub fn start_audio(
        &mut self,
        session: SessionId,
        language: LanguageKey,
        attempt_id: JobAttemptId,
        narration: String,
        settings: AudioSettings,
    ) -> anyhow::Result<()> {
        let token = self.install_token(&language, JobKind::AudioSynthesis);
        let tx = self.tx.clone();
        let audio = self.audio.clone();
        let timeout = self.timeout;
        let lang = language.clone();

        std::thread::Builder::new()
            .name(format!("loom-narrate-{language}"))
            .spawn(move || {
                run_worker(
                    tx,
                    session,
                    lang.clone(),
                    JobKind::AudioSynthesis,
                    attempt_id,
                    token,
                    timeout,
                    move |progress| async move {
                        audio
                            .synthesize(
                                &narration,
                                &lang,
                                &settings.voice,
                                settings.speed,
                                Some(progress),
                            )
                            .await
                            .map(JobOutput::Audio)
                    },
                );
            })
            .context("Failed to spawn audio worker thread")?;
        Ok(())
    }

    /// A retry reuses the slot: the fresh token replaces the old one,
    /// which is cancelled in case its worker is somehow still alive.
    fn install_token(&mut self, language: &LanguageKey, kind: JobKind) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(old) = self
            .tokens
            .insert((language.clone(), kind), token.clone())
        {
            old.cancel();
        }
        token
    }
}

/// Body shared by both worker kinds: emit `Started`, forward progress
/// checkpoints, and finish with exactly one terminal event per attempt.
fn run_worker<F, Fut>(
    tx: mpsc::Sender<WizardEvent>,
    session: SessionId,
    language: LanguageKey,
    kind: JobKind,
    attempt_id: JobAttemptId,
    token: CancellationToken,
    timeout: Duration,
    work: F,
) where
    F: FnOnce(mpsc::Sender<f32>) -> Fut,
    Fut: std::future::Future<Output = Result<JobOutput, ProviderError>>,
{
    let emit = |ev: JobRunEvent| WizardEvent::Service {
        session,
        ev: ServiceEvent::Job {
            language: language.clone(),
            kind,
            attempt_id,
            ev,
        },
    };

    let rt = match crate::async_runtime::runtime() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = tx.blocking_send(emit(JobRunEvent::Failed(JobFailure::TransientNetwork(
                format!("Failed to start async runtime: {e}"),
            ))));
            return;
        }
    };

    rt.block_on(async {
        let _ = tx.send(emit(JobRunEvent::Started)).await;

        let (prog_tx, mut prog_rx) = mpsc::channel(16);
        let work_fut = tokio::time::timeout(timeout, work(prog_tx));
        tokio::pin!(work_fut);
        let mut progress_open = true;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%language, ?kind, "worker observed cancellation");
                    let _ = tx.send(emit(JobRunEvent::Cancelled)).await;
                    return;
                }
                res = &mut work_fut => {
                    let terminal = match res {
                        Ok(Ok(output)) => JobRunEvent::Succeeded(output),
                        Ok(Err(e)) => {
                            tracing::warn!(%language, ?kind, error = %e, "job failed");
                            JobRunEvent::Failed(e.into())
                        }
                        Err(_elapsed) => {
                            tracing::warn!(%language, ?kind, "job timed out");
                            JobRunEvent::Failed(JobFailure::Timeout)
                        }
                    };
                    let _ = tx.send(emit(terminal)).await;
                    return;
                }
                maybe_p = prog_rx.recv(), if progress_open => {
                    match maybe_p {
                        Some(p) => {
                            let _ = tx.try_send(emit(JobRunEvent::Progress(p)));
                        }
                        None => progress_open = false,
                    }
                }
            }
        }
    });
}
