//! Per-question file upload lifecycle.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Uploading -> Done -> Idle        (removal)
//!         Uploading -> Failed -> Uploading (retry)
//! ```
//!
//! Every `start` hands out an [`UploadTicket`] numbered by attempt. Events
//! carrying a ticket from a superseded attempt are dropped, so a late
//! success from an earlier upload can never overwrite a newer file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::answer::{Answer, FileRef};
use super::question::QuestionId;
use super::store::FormValueStore;
use crate::error::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Done,
    Failed,
}

/// Upload state of one file-upload question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadState {
    pub phase: UploadPhase,
    pub progress_percent: u8,
    /// Name of the file being (or last) uploaded.
    pub file_name: Option<String>,
    pub file_ref: Option<FileRef>,
    /// Error message of the last failed attempt.
    pub error: Option<String>,
    attempt: u64,
}

impl UploadState {
    pub fn is_done(&self) -> bool {
        self.phase == UploadPhase::Done && self.file_ref.is_some()
    }
}

/// Identifies one upload attempt for one question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadTicket {
    pub question_id: QuestionId,
    attempt: u64,
}

/// Tracks uploads for every file-upload question of a questionnaire.
#[derive(Debug, Clone, Default)]
pub struct UploadCoordinator {
    states: HashMap<QuestionId, UploadState>,
    next_attempt: u64,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; questions never touched report `Idle`.
    pub fn state(&self, question_id: impl Into<QuestionId>) -> UploadState {
        self.states.get(&question_id.into()).cloned().unwrap_or_default()
    }

    pub fn phase(&self, question_id: impl Into<QuestionId>) -> UploadPhase {
        self.states
            .get(&question_id.into())
            .map_or(UploadPhase::Idle, |s| s.phase)
    }

    /// Mark a document delivered with the questionnaire as already uploaded.
    pub fn seed(&mut self, question_id: QuestionId, file: FileRef, store: &mut FormValueStore) {
        store.load_initial([(question_id.clone(), Answer::File(file.clone()))]);
        self.states.insert(
            question_id,
            UploadState {
                phase: UploadPhase::Done,
                progress_percent: 100,
                file_name: Some(file.file_name.clone()),
                file_ref: Some(file),
                error: None,
                attempt: 0,
            },
        );
    }

    /// Begin an upload attempt, superseding any earlier attempt for the question.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::PrerequisiteMissing`] when the parent
    /// questionnaire has no identifier yet; nothing changes in that case.
    pub fn start(
        &mut self,
        question_id: impl Into<QuestionId>,
        questionnaire_id: Option<&str>,
        file_name: &str,
        store: &mut FormValueStore,
    ) -> Result<UploadTicket, UploadError> {
        let question_id = question_id.into();
        if questionnaire_id.map_or(true, |id| id.trim().is_empty()) {
            return Err(UploadError::PrerequisiteMissing);
        }

        self.next_attempt += 1;
        let attempt = self.next_attempt;
        if let Some(previous) = self.states.get(&question_id) {
            if previous.phase == UploadPhase::Uploading {
                tracing::debug!(%question_id, superseded = previous.attempt, "superseding in-flight upload");
            }
        }
        store.clear(question_id.clone());
        self.states.insert(
            question_id.clone(),
            UploadState {
                phase: UploadPhase::Uploading,
                progress_percent: 0,
                file_name: Some(file_name.to_string()),
                file_ref: None,
                error: None,
                attempt,
            },
        );
        tracing::info!(%question_id, attempt, file_name, "upload started");
        Ok(UploadTicket {
            question_id,
            attempt,
        })
    }

    /// Apply a progress event. Progress only moves forward and caps at 100.
    ///
    /// Returns whether the event was applied.
    pub fn progress(&mut self, ticket: &UploadTicket, percent: u8) -> bool {
        let Some(state) = self.active_mut(ticket) else {
            return false;
        };
        let percent = percent.min(100);
        if percent > state.progress_percent {
            state.progress_percent = percent;
        }
        true
    }

    /// Bind the uploaded document into the store and move to `Done`.
    ///
    /// Returns whether the result was applied.
    pub fn complete(
        &mut self,
        ticket: &UploadTicket,
        file: FileRef,
        store: &mut FormValueStore,
    ) -> bool {
        let Some(state) = self.active_mut(ticket) else {
            return false;
        };
        state.phase = UploadPhase::Done;
        state.progress_percent = 100;
        state.file_ref = Some(file.clone());
        tracing::info!(question_id = %ticket.question_id, document_id = %file.document_id, "upload finished");
        store.set(ticket.question_id.clone(), Answer::File(file));
        true
    }

    /// Record a failed attempt. The store entry stays unset.
    ///
    /// Returns whether the failure was applied.
    pub fn fail(&mut self, ticket: &UploadTicket, message: impl Into<String>) -> bool {
        let Some(state) = self.active_mut(ticket) else {
            return false;
        };
        let message = message.into();
        tracing::warn!(question_id = %ticket.question_id, error = %message, "upload failed");
        state.phase = UploadPhase::Failed;
        state.progress_percent = 0;
        state.error = Some(message);
        true
    }

    /// Drop the file for a question: cancels an in-flight attempt or deletes
    /// a finished one. Clears both the upload state and the store entry.
    pub fn remove(
        &mut self,
        question_id: impl Into<QuestionId>,
        store: &mut FormValueStore,
    ) -> Option<FileRef> {
        let question_id = question_id.into();
        let removed = self.states.remove(&question_id);
        store.clear(question_id.clone());
        if let Some(state) = &removed {
            tracing::info!(%question_id, phase = ?state.phase, "upload removed");
        }
        removed.and_then(|s| s.file_ref)
    }

    /// Whether the question has a finished upload bound into the store.
    pub fn is_satisfied(&self, question_id: impl Into<QuestionId>, store: &FormValueStore) -> bool {
        let question_id = question_id.into();
        let done = self
            .states
            .get(&question_id)
            .is_some_and(UploadState::is_done);
        done && matches!(store.get(question_id), Some(Answer::File(_)))
    }

    fn active_mut(&mut self, ticket: &UploadTicket) -> Option<&mut UploadState> {
        match self.states.get_mut(&ticket.question_id) {
            Some(state) if state.attempt == ticket.attempt && state.phase == UploadPhase::Uploading => {
                Some(state)
            }
            _ => {
                tracing::debug!(
                    question_id = %ticket.question_id,
                    attempt = ticket.attempt,
                    "ignoring stale upload event"
                );
                None
            }
        }
    }
}
