use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::DraftError;
use crate::language::LanguageKey;

/// Opaque handle to an uploaded source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub uri: String,
}

/// Opaque handle to a synthesized narration clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub uri: String,
    pub duration_secs: f64,
}

/// Identifier of a synthesis voice, as understood by the speech provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub String);

/// Identifier assigned by the story repository on publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishedId(pub String);

/// Title and body text of the story in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryText {
    pub title: String,
    pub body: String,
}

impl StoryText {
    /// Text handed to speech synthesis: title, pause, then the body.
    pub fn narration(&self) -> String {
        format!("{}. {}", self.title.trim_end_matches('.'), self.body)
    }
}

/// Output of the vision/analysis provider for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub body: String,
    pub tags: BTreeSet<String>,
}

/// Which editable text field of a language a snapshot or edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditField {
    Title,
    Body,
}

/// One recorded value of an editable field. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSnapshot {
    pub language: LanguageKey,
    pub field: EditField,
    pub value: String,
    pub at: DateTime<Utc>,
}

/// The story being built across the wizard's steps.
///
/// Single source of truth for one piece of content. `translations` and
/// `audio` keys are always a subset of `selected_languages`; removing a
/// language evicts its outputs. Once published the draft is frozen and
/// every mutating method returns [`DraftError::Published`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub source_language: LanguageKey,
    pub title: String,
    pub body: String,
    pub tags: BTreeSet<String>,
    pub media: Option<MediaRef>,
    selected_languages: BTreeSet<LanguageKey>,
    translations: BTreeMap<LanguageKey, StoryText>,
    audio: BTreeMap<LanguageKey, AudioRef>,
    published: bool,
}

impl ContentDraft {
    pub fn new(source_language: LanguageKey) -> Self {
        Self {
            source_language,
            title: String::new(),
            body: String::new(),
            tags: BTreeSet::new(),
            media: None,
            selected_languages: BTreeSet::new(),
            translations: BTreeMap::new(),
            audio: BTreeMap::new(),
            published: false,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn mark_published(&mut self) {
        self.published = true;
    }

    pub fn selected_languages(&self) -> &BTreeSet<LanguageKey> {
        &self.selected_languages
    }

    pub fn translation(&self, language: &LanguageKey) -> Option<&StoryText> {
        self.translations.get(language)
    }

    pub fn translations(&self) -> &BTreeMap<LanguageKey, StoryText> {
        &self.translations
    }

    pub fn audio(&self, language: &LanguageKey) -> Option<&AudioRef> {
        self.audio.get(language)
    }

    pub fn audio_artifacts(&self) -> &BTreeMap<LanguageKey, AudioRef> {
        &self.audio
    }

    /// The story text the source language currently carries.
    pub fn source_text(&self) -> StoryText {
        StoryText {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }

    /// Current text for a language: the (possibly edited) translation for
    /// targets, the primary fields for the source language.
    pub fn current_text(&self, language: &LanguageKey) -> Option<StoryText> {
        if *language == self.source_language {
            Some(self.source_text())
        } else {
            self.translations.get(language).cloned()
        }
    }

    pub fn select_language(&mut self, language: LanguageKey) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        if language != self.source_language {
            self.selected_languages.insert(language);
        }
        Ok(())
    }

    /// Removes a language and evicts any outputs it accumulated. Cancelling
    /// the corresponding jobs is the caller's responsibility.
    pub fn deselect_language(&mut self, language: &LanguageKey) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        self.selected_languages.remove(language);
        self.translations.remove(language);
        self.audio.remove(language);
        Ok(())
    }

    pub fn set_translation(
        &mut self,
        language: LanguageKey,
        text: StoryText,
    ) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        if !self.selected_languages.contains(&language) {
            return Err(DraftError::LanguageNotSelected(language));
        }
        self.translations.insert(language, text);
        Ok(())
    }

    pub fn set_audio(&mut self, language: LanguageKey, clip: AudioRef) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        if !self.selected_languages.contains(&language) {
            return Err(DraftError::LanguageNotSelected(language));
        }
        self.audio.insert(language, clip);
        Ok(())
    }

    /// Replaces the tag set wholesale; tags are source-language metadata
    /// and carry no per-language history.
    pub fn set_tags(&mut self, tags: BTreeSet<String>) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        self.tags = tags;
        Ok(())
    }

    pub fn apply_analysis(&mut self, analysis: AnalysisResult) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        self.title = analysis.title;
        self.body = analysis.body;
        self.tags = analysis.tags;
        Ok(())
    }

    /// Reads the current value of an editable field.
    pub fn field_value(&self, language: &LanguageKey, field: EditField) -> Option<&str> {
        if *language == self.source_language {
            Some(match field {
                EditField::Title => &self.title,
                EditField::Body => &self.body,
            })
        } else {
            self.translations.get(language).map(|t| match field {
                EditField::Title => t.title.as_str(),
                EditField::Body => t.body.as_str(),
            })
        }
    }

    /// Writes an editable field. Target-language fields require an
    /// existing translation entry; absent slots are never created here.
    pub fn set_field(
        &mut self,
        language: &LanguageKey,
        field: EditField,
        value: String,
    ) -> Result<(), DraftError> {
        self.ensure_mutable()?;
        if *language == self.source_language {
            match field {
                EditField::Title => self.title = value,
                EditField::Body => self.body = value,
            }
            return Ok(());
        }
        if !self.selected_languages.contains(language) {
            return Err(DraftError::LanguageNotSelected(language.clone()));
        }
        let text = self
            .translations
            .get_mut(language)
            .ok_or_else(|| DraftError::MissingTranslation(language.clone()))?;
        match field {
            EditField::Title => text.title = value,
            EditField::Body => text.body = value,
        }
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), DraftError> {
        if self.published {
            Err(DraftError::Published)
        } else {
            Ok(())
        }
    }
}
