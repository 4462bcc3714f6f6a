use chrono::Utc;
use std::collections::BTreeSet;

use loom_core::{ContentDraft, EditError, EditField, EditSnapshot, LanguageKey};

/// Undo/redo stacks over the draft's editable fields.
///
/// One history per draft, bounded at [`loom_config::MAX_HISTORY_SNAPSHOTS`]
/// entries across both stacks; oldest undo entries are evicted first and
/// redo entries never are. The `replaying` flag suppresses re-recording
/// while a snapshot is being applied, so undoing never pollutes the
/// stacks it is popping from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditHistory {
    undo: Vec<EditSnapshot>,
    redo: Vec<EditSnapshot>,
    replaying: bool,
}

impl EditHistory {
    /// Records the pre-edit value of `(language, field)`. Must be called
    /// by the editing path before the mutation lands. Clears the redo
    /// stack unless the edit is itself an undo/redo replay.
    pub fn record_before_edit(
        &mut self,
        draft: &ContentDraft,
        language: &LanguageKey,
        field: EditField,
    ) -> Result<(), EditError> {
        if self.replaying {
            return Ok(());
        }
        let value = draft
            .field_value(language, field)
            .ok_or_else(|| EditError::MissingTarget {
                language: language.clone(),
                field,
            })?
            .to_string();
        self.undo.push(EditSnapshot {
            language: language.clone(),
            field,
            value,
            at: Utc::now(),
        });
        self.redo.clear();
        self.enforce_cap();
        Ok(())
    }

    /// Reverts the most recent edit. `locked` holds languages whose
    /// translation is mid-regeneration; popping a snapshot for one of
    /// them fails with a conflict and mutates nothing.
    pub fn undo(
        &mut self,
        draft: &mut ContentDraft,
        locked: &BTreeSet<LanguageKey>,
    ) -> Result<bool, EditError> {
        let Some(snapshot) = self.undo.last().cloned() else {
            return Ok(false);
        };
        let restored = self.apply(draft, &snapshot, locked)?;
        self.undo.pop();
        self.redo.push(restored);
        Ok(true)
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(
        &mut self,
        draft: &mut ContentDraft,
        locked: &BTreeSet<LanguageKey>,
    ) -> Result<bool, EditError> {
        let Some(snapshot) = self.redo.last().cloned() else {
            return Ok(false);
        };
        let restored = self.apply(draft, &snapshot, locked)?;
        self.redo.pop();
        self.undo.push(restored);
        Ok(true)
    }

    /// Applies one snapshot and returns the displaced current value.
    /// Checks every precondition before touching the draft or the
    /// stacks, so a failure leaves both untouched.
    fn apply(
        &mut self,
        draft: &mut ContentDraft,
        snapshot: &EditSnapshot,
        locked: &BTreeSet<LanguageKey>,
    ) -> Result<EditSnapshot, EditError> {
        if locked.contains(&snapshot.language) {
            return Err(EditError::Conflict {
                language: snapshot.language.clone(),
            });
        }
        let current = draft
            .field_value(&snapshot.language, snapshot.field)
            .ok_or_else(|| EditError::MissingTarget {
                language: snapshot.language.clone(),
                field: snapshot.field,
            })?
            .to_string();

        self.replaying = true;
        let res = draft.set_field(&snapshot.language, snapshot.field, snapshot.value.clone());
        self.replaying = false;
        res?;

        Ok(EditSnapshot {
            language: snapshot.language.clone(),
            field: snapshot.field,
            value: current,
            at: Utc::now(),
        })
    }

    /// Whether the next undo would target this field.
    pub fn can_undo(&self, language: &LanguageKey, field: EditField) -> bool {
        self.undo
            .last()
            .map(|s| s.language == *language && s.field == field)
            .unwrap_or(false)
    }

    /// Whether the next redo would target this field.
    pub fn can_redo(&self, language: &LanguageKey, field: EditField) -> bool {
        self.redo
            .last()
            .map(|s| s.language == *language && s.field == field)
            .unwrap_or(false)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn len(&self) -> usize {
        self.undo.len() + self.redo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }

    /// Drops every snapshot touching a language. Used when the language
    /// is deselected and its outputs evicted.
    pub fn purge_language(&mut self, language: &LanguageKey) {
        self.undo.retain(|s| s.language != *language);
        self.redo.retain(|s| s.language != *language);
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn enforce_cap(&mut self) {
        while self.len() > loom_config::MAX_HISTORY_SNAPSHOTS && !self.undo.is_empty() {
            self.undo.remove(0);
        }
    }
}
