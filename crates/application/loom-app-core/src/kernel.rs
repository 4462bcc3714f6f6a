use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_core::{ServiceEvent, WizardCommand, WizardEvent, WizardStore};
use crate::domain::{PhaseState, PublishState, WizardStep};
use crate::gates::{self, GateNotSatisfied};
use crate::jobs::{Job, JobFailure, JobKind, JobRunEvent, JobState};
use crate::orchestrator::JobOrchestrator;
use crate::ports::{AnalysisPort, AudioPort, ImagePort, StoryRepositoryPort, TranslationPort};
use loom_core::{DraftError, EditError, EditField, LanguageKey};

/// The wizard's single coordinating owner.
///
/// Every write path into the draft funnels through here: orchestrator
/// results arrive on the event channel and are applied in [`tick`],
/// user edits and undo/redo run synchronously under the store lock.
/// That sequencing is what lets the three writer paths share the
/// translation and audio maps without a global lock.
///
/// [`tick`]: WizardKernel::tick
pub struct WizardKernel<I, V, T, A, R> {
    pub store: WizardStore,
    image: Arc<I>,
    analysis: Arc<V>,
    repository: Arc<R>,
    orchestrator: JobOrchestrator<T, A>,

    tx: mpsc::Sender<WizardEvent>,
    rx: mpsc::Receiver<WizardEvent>,
}

impl<I, V, T, A, R> WizardKernel<I, V, T, A, R>
where
    I: ImagePort,
    V: AnalysisPort,
    T: TranslationPort,
    A: AudioPort,
    R: StoryRepositoryPort,
{
    pub fn new(
        store: WizardStore,
        image: I,
        analysis: V,
        translator: T,
        audio: A,
        repository: R,
    ) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let orchestrator = JobOrchestrator::new(Arc::new(translator), Arc::new(audio), tx.clone());
        Self {
            store,
            image: Arc::new(image),
            analysis: Arc::new(analysis),
            repository: Arc::new(repository),
            orchestrator,
            tx,
            rx,
        }
    }

    pub fn with_job_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    pub fn dispatch(&mut self, cmd: WizardCommand) {
        match cmd {
            WizardCommand::Next => {
                if let Err(e) = self.advance() {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }
            WizardCommand::Previous => self.go_back(),
            WizardCommand::Reset => self.reset(),

            WizardCommand::UploadImage(bytes) => self.upload_image(bytes),
            WizardCommand::RetryAnalysis => {
                let state = self.store.state();
                if state.step == WizardStep::Analyzing
                    && matches!(state.analysis, PhaseState::Failed(_))
                {
                    self.start_analysis();
                }
            }

            WizardCommand::EditField {
                language,
                field,
                value,
            } => {
                if let Err(e) = self.edit_field(&language, field, value) {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }
            WizardCommand::SetTags(tags) => {
                let res = self.store.with_state_mut(|s| s.draft.set_tags(tags));
                if let Err(e) = res {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }
            WizardCommand::SelectLanguage(language) => self.select_language(language),
            WizardCommand::DeselectLanguage(language) => self.deselect_language(&language),
            WizardCommand::UpdateAudioSettings(mut settings) => {
                settings.speed = loom_config::clamp_voice_speed(settings.speed);
                self.store.with_state_mut(|s| s.settings = settings);
            }

            WizardCommand::CancelJob { language, kind } => self.cancel_job(&language, kind),
            WizardCommand::RetryJob { language, kind } => {
                if let Err(e) = self.retry_job(&language, kind) {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }

            WizardCommand::Undo => {
                if let Err(e) = self.undo() {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }
            WizardCommand::Redo => {
                if let Err(e) = self.redo() {
                    self.store.apply(WizardEvent::UserError(e.to_string()));
                }
            }
        }
    }

    /// Attempts the `Next` transition. From `Finalize` this launches the
    /// publish worker instead of changing step; the step flips to
    /// `Published` only when the repository confirms.
    pub fn advance(&mut self) -> Result<(), GateNotSatisfied> {
        let state = self.store.state();
        let unmet = gates::unmet_conditions(&state);
        if !unmet.is_empty() {
            return Err(GateNotSatisfied(unmet));
        }

        if state.step == WizardStep::Finalize {
            self.start_publish();
            return Ok(());
        }

        if let Some(next) = state.step.next() {
            self.store.apply(WizardEvent::StepChanged(next));
            self.on_enter(next);
        }
        Ok(())
    }

    /// `Previous` is always allowed and never cancels in-flight jobs;
    /// they keep running so no progress is lost on return.
    pub fn go_back(&mut self) {
        let state = self.store.state();
        if let Some(prev) = state.step.previous() {
            self.store.apply(WizardEvent::StepChanged(prev));
            self.on_enter(prev);
        }
    }

    /// Discards the draft, the history and every running job, and
    /// returns to `Upload` under a fresh session id so nothing from the
    /// abandoned run can reach the new one.
    pub fn reset(&mut self) {
        tracing::debug!("wizard reset");
        self.orchestrator.cancel_all();
        self.store.with_state_mut(|s| {
            let source = s.draft.source_language.clone();
            *s = crate::domain::WizardState::new(source);
        });
    }

    // Step entry is idempotent: succeeded and running work is never
    // restarted, so bouncing Previous/Next is free.
    fn on_enter(&mut self, step: WizardStep) {
        match step {
            WizardStep::Analyzing => self.start_analysis(),
            WizardStep::Translation => self.start_translation_batch(),
            WizardStep::Audio => self.start_audio_batch(),
            _ => {}
        }
    }

    // --- One-shot operations ---

    fn upload_image(&mut self, bytes: Vec<u8>) {
        let state = self.store.state();
        if state.upload.is_running() || state.step != WizardStep::Upload {
            return;
        }
        let session = state.session;
        self.store.apply(WizardEvent::Service {
            session,
            ev: ServiceEvent::UploadStarted,
        });

        let tx = self.tx.clone();
        let image = self.image.clone();
        let spawn_res = std::thread::Builder::new()
            .name("loom-upload".into())
            .spawn(move || {
                let ev = match crate::async_runtime::runtime()
                    .and_then(|rt| rt.block_on(image.upload(bytes)).map_err(Into::into))
                {
                    Ok(media) => ServiceEvent::ImageAttached(media),
                    Err(e) => ServiceEvent::UploadFailed {
                        message: e.to_string(),
                    },
                };
                let _ = tx.blocking_send(WizardEvent::Service { session, ev });
            });
        if let Err(e) = spawn_res {
            self.store.apply(WizardEvent::Service {
                session,
                ev: ServiceEvent::UploadFailed {
                    message: format!("Failed to start upload worker thread: {e}"),
                },
            });
        }
    }

    fn start_analysis(&mut self) {
        let state = self.store.state();
        if matches!(state.analysis, PhaseState::Running | PhaseState::Complete) {
            return;
        }
        let Some(media) = state.draft.media.clone() else {
            return;
        };
        let session = state.session;
        self.store.apply(WizardEvent::Service {
            session,
            ev: ServiceEvent::AnalysisStarted,
        });

        let tx = self.tx.clone();
        let analysis = self.analysis.clone();
        let spawn_res = std::thread::Builder::new()
            .name("loom-analyze".into())
            .spawn(move || {
                let ev = match crate::async_runtime::runtime()
                    .and_then(|rt| rt.block_on(analysis.describe(&media)).map_err(Into::into))
                {
                    Ok(result) => ServiceEvent::AnalysisReady(result),
                    Err(e) => ServiceEvent::AnalysisFailed {
                        message: e.to_string(),
                    },
                };
                let _ = tx.blocking_send(WizardEvent::Service { session, ev });
            });
        if let Err(e) = spawn_res {
            self.store.apply(WizardEvent::Service {
                session,
                ev: ServiceEvent::AnalysisFailed {
                    message: format!("Failed to start analysis worker thread: {e}"),
                },
            });
        }
    }

    fn start_publish(&mut self) {
        let state = self.store.state();
        if matches!(state.publish, PublishState::Running) {
            return;
        }
        let session = state.session;
        self.store.apply(WizardEvent::Service {
            session,
            ev: ServiceEvent::PublishStarted,
        });

        let tx = self.tx.clone();
        let repository = self.repository.clone();
        let draft = state.draft;
        let spawn_res = std::thread::Builder::new()
            .name("loom-publish".into())
            .spawn(move || {
                let ev = match crate::async_runtime::runtime()
                    .and_then(|rt| rt.block_on(repository.publish(&draft)).map_err(Into::into))
                {
                    Ok(id) => ServiceEvent::PublishSucceeded(id),
                    Err(e) => ServiceEvent::PublishFailed {
                        message: e.to_string(),
                    },
                };
                let _ = tx.blocking_send(WizardEvent::Service { session, ev });
            });
        if let Err(e) = spawn_res {
            self.store.apply(WizardEvent::Service {
                session,
                ev: ServiceEvent::PublishFailed {
                    message: format!("Failed to start publish worker thread: {e}"),
                },
            });
        }
    }

    // --- Per-language jobs ---

    fn start_translation_batch(&mut self) {
        let state = self.store.state();
        let source = state.draft.source_text();
        for language in state.draft.selected_languages().clone() {
            self.launch_job(JobKind::Translation, &language, |kernel, job| {
                kernel.orchestrator.start_translation(
                    state.session,
                    job.language.clone(),
                    job.attempt_id,
                    source.clone(),
                )
            });
        }
    }

    fn start_audio_batch(&mut self) {
        let state = self.store.state();
        for language in state.draft.selected_languages().clone() {
            let Some(text) = state.draft.current_text(&language) else {
                continue;
            };
            let narration = text.narration();
            let settings = state.settings.clone();
            self.launch_job(JobKind::AudioSynthesis, &language, |kernel, job| {
                kernel.orchestrator.start_audio(
                    state.session,
                    job.language.clone(),
                    job.attempt_id,
                    narration.clone(),
                    settings.clone(),
                )
            });
        }
    }

    /// Installs a fresh job in the slot and starts its worker, unless
    /// the slot already holds an active or succeeded job of this kind.
    fn launch_job(
        &mut self,
        kind: JobKind,
        language: &LanguageKey,
        start: impl FnOnce(&mut Self, &Job) -> anyhow::Result<()>,
    ) {
        let (skip, attempt) = self.store.with_state_mut(|s| {
            match s.jobs.get(language, kind) {
                Some(j) if j.is_active() || j.state == JobState::Succeeded => (true, 0),
                Some(j) => (false, j.attempt + 1),
                None => (false, 1),
            }
        });
        if skip {
            return;
        }

        let job = Job::new(language.clone(), kind, attempt);
        tracing::debug!(%language, ?kind, attempt, "starting job");
        self.store.with_state_mut(|s| s.jobs.put(job.clone()));

        if let Err(e) = start(self, &job) {
            let session = self.store.state().session;
            self.store.apply(WizardEvent::Service {
                session,
                ev: ServiceEvent::Job {
                    language: language.clone(),
                    kind,
                    attempt_id: job.attempt_id,
                    ev: JobRunEvent::Failed(JobFailure::TransientNetwork(e.to_string())),
                },
            });
        }
    }

    /// Cooperative cancel: the slot is marked `Cancelled` immediately
    /// and the worker token tripped; any event the worker still emits
    /// for this attempt is discarded in [`tick`](Self::tick). Cancelling
    /// a finished or absent job is a no-op.
    pub fn cancel_job(&mut self, language: &LanguageKey, kind: JobKind) {
        self.orchestrator.cancel(language, kind);
        self.store.with_state_mut(|s| {
            if let Some(job) = s.jobs.get_mut(language, kind) {
                if job.is_active() {
                    job.state = JobState::Cancelled;
                }
            }
        });
    }

    /// User-initiated retry from `Failed` or `Cancelled`: replaces the
    /// slot with a fresh attempt and a clean progress counter.
    pub fn retry_job(&mut self, language: &LanguageKey, kind: JobKind) -> anyhow::Result<()> {
        let state = self.store.state();
        let retryable = state
            .jobs
            .get(language, kind)
            .map(|j| j.can_retry())
            .unwrap_or(false);
        if !retryable {
            anyhow::bail!("only failed or cancelled jobs can be retried");
        }

        match kind {
            JobKind::Translation => {
                let source = state.draft.source_text();
                self.launch_job(kind, language, |kernel, job| {
                    kernel.orchestrator.start_translation(
                        state.session,
                        job.language.clone(),
                        job.attempt_id,
                        source.clone(),
                    )
                });
            }
            JobKind::AudioSynthesis => {
                let text = state
                    .draft
                    .current_text(language)
                    .ok_or_else(|| anyhow::anyhow!("no story text for '{language}'"))?;
                let narration = text.narration();
                let settings = state.settings.clone();
                self.launch_job(kind, language, |kernel, job| {
                    kernel.orchestrator.start_audio(
                        state.session,
                        job.language.clone(),
                        job.attempt_id,
                        narration.clone(),
                        settings.clone(),
                    )
                });
            }
        }
        Ok(())
    }

    // --- Language selection ---

    pub fn select_language(&mut self, language: LanguageKey) {
        if !loom_config::is_supported_language(language.code()) {
            self.store.apply(WizardEvent::UserError(format!(
                "'{language}' is not a supported language"
            )));
            return;
        }
        let res = self
            .store
            .with_state_mut(|s| s.draft.select_language(language));
        if let Err(e) = res {
            self.store.apply(WizardEvent::UserError(e.to_string()));
            return;
        }

        // Selecting while already on a job step starts the missing job.
        match self.store.state().step {
            WizardStep::Translation => self.start_translation_batch(),
            WizardStep::Audio => self.start_audio_batch(),
            _ => {}
        }
    }

    /// Deselecting cancels the language's jobs and evicts its outputs
    /// and history in one sequenced write.
    pub fn deselect_language(&mut self, language: &LanguageKey) {
        self.orchestrator.cancel_language(language);
        let res = self.store.with_state_mut(|s| {
            for kind in [JobKind::Translation, JobKind::AudioSynthesis] {
                if let Some(job) = s.jobs.get_mut(language, kind) {
                    if job.is_active() {
                        job.state = JobState::Cancelled;
                    }
                }
            }
            s.history.purge_language(language);
            s.draft.deselect_language(language)
        });
        if let Err(e) = res {
            self.store.apply(WizardEvent::UserError(e.to_string()));
        }
    }

    // --- Editing & history ---

    /// The recorded-edit path: snapshots the pre-edit value, then
    /// mutates. Refused while the language's translation is
    /// regenerating, exactly like undo/redo.
    pub fn edit_field(
        &mut self,
        language: &LanguageKey,
        field: EditField,
        value: String,
    ) -> Result<(), EditError> {
        self.store.with_state_mut(|s| {
            if s.draft.is_published() {
                return Err(EditError::Draft(DraftError::Published));
            }
            if s.jobs.translation_running(language) {
                return Err(EditError::Conflict {
                    language: language.clone(),
                });
            }
            s.history.record_before_edit(&s.draft, language, field)?;
            s.draft
                .set_field(language, field, value)
                .map_err(EditError::from)
        })
    }

    /// Applies the most recent undo snapshot. Fails with a conflict,
    /// mutating nothing, if the snapshot's language is mid-regeneration.
    pub fn undo(&mut self) -> Result<bool, EditError> {
        self.store.with_state_mut(|s| {
            let locked = s.jobs.locked_languages();
            s.history.undo(&mut s.draft, &locked)
        })
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        self.store.with_state_mut(|s| {
            let locked = s.jobs.locked_languages();
            s.history.redo(&mut s.draft, &locked)
        })
    }

    // --- Event pump ---

    /// Call from the embedder's loop to apply pending worker events.
    /// Events from a previous session are dropped, and job events are
    /// applied only when they target the slot's live, non-terminal
    /// attempt — this is what makes terminal notifications exactly-once
    /// and cancellation terminal.
    pub fn tick(&mut self) {
        while let Ok(ev) = self.rx.try_recv() {
            if let WizardEvent::Service { session, ev: service } = &ev {
                let state = self.store.state();
                if *session != state.session {
                    continue;
                }
                if let ServiceEvent::Job {
                    language,
                    kind,
                    attempt_id,
                    ..
                } = service
                {
                    let live = state
                        .jobs
                        .get(language, *kind)
                        .map(|j| j.attempt_id == *attempt_id && !j.state.is_terminal())
                        .unwrap_or(false);
                    if !live {
                        continue;
                    }
                }
            }
            self.store.apply(ev);
        }
    }

    pub fn sender(&self) -> mpsc::Sender<WizardEvent> {
        self.tx.clone()
    }
}
