//! Wizard controller shared by the three questionnaires.
//!
//! ## State
//!
//! ```text
//! Editing --submit ok--> Submitted (terminal)
//! Editing --close------> Closed
//! ```
//!
//! Network actions are split in three: a synchronous `begin_*` that
//! snapshots the payload and takes the in-flight slot, the gateway call
//! (awaited by whoever drives the controller), and a `finish_*` that applies
//! the result. The `save`, `submit` and `upload_file` helpers compose the
//! three for callers that simply await.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::answer::{Answer, FileRef};
use super::kind::{encode_responses, Questionnaire, QuestionnaireKind};
use super::question::{Question, QuestionId, QuestionType};
use super::section::{Layout, Section, WizardPosition};
use super::store::FormValueStore;
use super::upload::{UploadCoordinator, UploadPhase, UploadTicket};
use super::validator::{SectionValidator, Validation};
use crate::error::{GatewayError, UploadError, WizardError};
use crate::gateway::wire::{ResponsesPayload, UploadReceipt, UploadRequest};
use crate::gateway::SubmissionGateway;

pub const SUBMIT_CONFIRM_TITLE: &str = "Submit questionnaire?";
pub const SUBMIT_CONFIRM_MESSAGE: &str = "You cannot modify your answers after submission.";

/// Lifecycle of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardState {
    Editing,
    Submitted,
    Closed,
}

/// Action holding the in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlight {
    Save,
    Submit,
}

impl InFlight {
    fn name(self) -> &'static str {
        match self {
            InFlight::Save => "save",
            InFlight::Submit => "submit",
        }
    }
}

/// Answer to "you have unsaved changes".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    SaveAndReturn,
    Discard,
    Stay,
}

/// User-facing confirmations the wizard needs.
pub trait Prompter {
    fn confirm_submit(&self, title: &str, message: &str) -> bool;
    fn unsaved_changes(&self) -> UnsavedChoice;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted by the backend; the wizard is done, go to the dashboard.
    Submitted,
    /// User declined the confirmation.
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// Leave for the dashboard.
    Left { saved: bool },
    Stayed,
}

/// Snapshot taken by [`WizardController::begin_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub payload: ResponsesPayload,
    generation: u64,
    revision: u64,
}

/// Payload that passed full validation, awaiting confirmation.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub payload: ResponsesPayload,
}

#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub payload: ResponsesPayload,
    generation: u64,
}

/// Drives one questionnaire from load to submission.
#[derive(Debug)]
pub struct WizardController {
    kind: QuestionnaireKind,
    questionnaire_id: Option<String>,
    layout: Layout,
    position: WizardPosition,
    store: FormValueStore,
    uploads: UploadCoordinator,
    in_flight: Option<InFlight>,
    generation: u64,
    state: WizardState,
    last_saved_at: Option<DateTime<Utc>>,
    max_upload_bytes: Option<u64>,
}

impl WizardController {
    /// Build a controller positioned on the first section.
    ///
    /// # Errors
    ///
    /// [`WizardError::EmptyQuestionnaire`] when there is no section to show.
    pub fn new(questionnaire: Questionnaire) -> Result<Self, WizardError> {
        let position = questionnaire
            .layout
            .first()
            .ok_or(WizardError::EmptyQuestionnaire)?;

        let mut store = FormValueStore::new();
        store.load_initial(questionnaire.answers);
        let mut uploads = UploadCoordinator::new();
        for (question_id, file) in questionnaire.documents {
            uploads.seed(question_id, file, &mut store);
        }

        tracing::debug!(
            kind = %questionnaire.kind,
            sections = questionnaire.layout.sections().len(),
            answers = store.len(),
            "wizard ready"
        );

        Ok(Self {
            kind: questionnaire.kind,
            questionnaire_id: questionnaire.questionnaire_id,
            layout: questionnaire.layout,
            position,
            store,
            uploads,
            in_flight: None,
            generation: 0,
            state: WizardState::Editing,
            last_saved_at: None,
            max_upload_bytes: None,
        })
    }

    /// Fetch a questionnaire and build its controller.
    pub async fn load<G: SubmissionGateway>(
        gateway: &G,
        kind: QuestionnaireKind,
    ) -> Result<Self, WizardError> {
        let envelope = gateway.fetch(kind).await?;
        Self::new(Questionnaire::from_envelope(envelope))
    }

    /// Refuse files larger than `limit_mb` before any request is made.
    pub fn with_max_upload_mb(mut self, limit_mb: u64) -> Self {
        self.max_upload_bytes = Some(limit_mb.saturating_mul(1024 * 1024));
        self
    }

    pub fn kind(&self) -> QuestionnaireKind {
        self.kind
    }

    pub fn questionnaire_id(&self) -> Option<&str> {
        self.questionnaire_id.as_deref()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn position(&self) -> WizardPosition {
        self.position
    }

    /// Section on screen. Positions are only committed after a `contains`
    /// check, so this is `Some` for any controller built by [`Self::new`].
    pub fn current_section(&self) -> Option<&Section> {
        self.layout.section_at(self.position)
    }

    pub fn store(&self) -> &FormValueStore {
        &self.store
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn is_last_section(&self) -> bool {
        self.layout.is_last(self.position)
    }

    pub fn progress_percent(&self) -> u8 {
        self.layout.progress_percent(self.position)
    }

    /// Save is offered only with unsaved edits and nothing in flight.
    pub fn can_save(&self) -> bool {
        self.state == WizardState::Editing && self.in_flight.is_none() && self.store.is_dirty()
    }

    /// Validation of the section on screen, without moving.
    pub fn validate_current(&self) -> Validation {
        self.current_section().map_or(Validation::Valid, |section| {
            SectionValidator::new(&self.store, &self.uploads).validate(section)
        })
    }

    // ----- answers -----

    /// Store a value for a question of any section.
    ///
    /// File-upload questions only take values through the upload flow.
    pub fn answer(
        &mut self,
        question_id: impl Into<QuestionId>,
        answer: Answer,
    ) -> Result<(), WizardError> {
        self.ensure_editing()?;
        let question_id = question_id.into();
        let question = self.question(&question_id)?;
        if question.question_type == QuestionType::FileUpload {
            return Err(WizardError::AnswerMismatch {
                id: question_id,
                expected: "a file upload",
            });
        }
        if !answer.fits(question.question_type) {
            return Err(WizardError::AnswerMismatch {
                id: question_id,
                expected: question.question_type.label(),
            });
        }
        self.store.set(question_id, answer);
        Ok(())
    }

    pub fn clear_answer(
        &mut self,
        question_id: impl Into<QuestionId>,
    ) -> Result<Option<Answer>, WizardError> {
        self.ensure_editing()?;
        let question_id = question_id.into();
        let question = self.question(&question_id)?;
        if question.question_type == QuestionType::FileUpload {
            return Ok(self.uploads.remove(question_id, &mut self.store).map(Answer::File));
        }
        Ok(self.store.clear(question_id))
    }

    // ----- navigation -----

    /// Move to `target` once the section being left validates.
    ///
    /// Nothing changes on failure; values are never touched by navigation.
    pub fn go_to(&mut self, target: WizardPosition) -> Result<(), WizardError> {
        self.ensure_editing()?;
        if !self.layout.contains(target) {
            return Err(WizardError::InvalidPosition(target.to_string()));
        }
        if target == self.position {
            return Ok(());
        }
        if let Validation::Invalid(failures) = self.validate_current() {
            tracing::debug!(from = %self.position, to = %target, failures = failures.len(), "navigation blocked");
            return Err(WizardError::ValidationFailed { failures });
        }
        tracing::debug!(from = %self.position, to = %target, "section changed");
        self.position = target;
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), WizardError> {
        let target = self
            .layout
            .next(self.position)
            .ok_or_else(|| WizardError::InvalidPosition(format!("after {}", self.position)))?;
        self.go_to(target)
    }

    pub fn previous(&mut self) -> Result<(), WizardError> {
        let target = self
            .layout
            .previous(self.position)
            .ok_or_else(|| WizardError::InvalidPosition(format!("before {}", self.position)))?;
        self.go_to(target)
    }

    /// Jump to a top-level step (section, or first sub-factor of a factor).
    pub fn go_to_step(&mut self, section_index: usize) -> Result<(), WizardError> {
        let target = self.layout.step(section_index).ok_or_else(|| {
            WizardError::InvalidPosition(section_index.saturating_add(1).to_string())
        })?;
        self.go_to(target)
    }

    /// Jump to a sub-factor of the current main factor.
    pub fn go_to_sub_step(&mut self, sub_section_index: usize) -> Result<(), WizardError> {
        let target = WizardPosition::nested(self.position.section_index, sub_section_index);
        self.go_to(target)
    }

    // ----- save -----

    /// Snapshot every answer and take the in-flight slot.
    pub fn begin_save(&mut self) -> Result<SaveTicket, WizardError> {
        self.ensure_editing()?;
        self.ensure_idle()?;
        self.in_flight = Some(InFlight::Save);
        Ok(SaveTicket {
            payload: encode_responses(self.kind, &self.layout, &self.store, false),
            generation: self.generation,
            revision: self.store.revision(),
        })
    }

    /// Apply a save result. Edits made while it was in flight keep the form dirty.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), GatewayError>,
    ) -> Result<(), WizardError> {
        if ticket.generation != self.generation {
            tracing::debug!("dropping save result for closed wizard");
            return Ok(());
        }
        self.in_flight = None;
        match result {
            Ok(()) => {
                let clean = self.store.mark_clean_at(ticket.revision);
                self.last_saved_at = Some(Utc::now());
                tracing::info!(kind = %self.kind, clean, "progress saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "save failed");
                Err(e.into())
            }
        }
    }

    pub async fn save<G: SubmissionGateway>(&mut self, gateway: &G) -> Result<(), WizardError> {
        let ticket = self.begin_save()?;
        let result = gateway.save(self.kind, &ticket.payload).await;
        self.finish_save(ticket, result)
    }

    // ----- submit -----

    /// Validate every section at once, wherever the wizard stands.
    ///
    /// # Errors
    ///
    /// [`WizardError::IncompleteSubmission`] listing every failing question
    /// across all sections, in wizard order.
    pub fn check_complete(&self) -> Result<(), WizardError> {
        let failures = SectionValidator::new(&self.store, &self.uploads)
            .validate_all(self.layout.sections())
            .into_failures();
        if failures.is_empty() {
            return Ok(());
        }
        let missing = failures.iter().map(|f| f.question_text.clone()).collect();
        Err(WizardError::IncompleteSubmission { missing, failures })
    }

    /// Check that submit may proceed: last section, nothing in flight, and
    /// every section valid.
    pub fn prepare_submit(&self) -> Result<PendingSubmission, WizardError> {
        self.ensure_editing()?;
        self.ensure_idle()?;
        if !self.is_last_section() {
            return Err(WizardError::NotOnLastSection);
        }
        self.check_complete()?;
        Ok(PendingSubmission {
            payload: encode_responses(self.kind, &self.layout, &self.store, true),
        })
    }

    pub fn begin_submit(&mut self, pending: PendingSubmission) -> Result<SubmitTicket, WizardError> {
        self.ensure_editing()?;
        self.ensure_idle()?;
        self.in_flight = Some(InFlight::Submit);
        Ok(SubmitTicket {
            payload: pending.payload,
            generation: self.generation,
        })
    }

    /// Apply a submit result. Success is terminal; failure keeps every answer.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<(), GatewayError>,
    ) -> Result<(), WizardError> {
        if ticket.generation != self.generation {
            tracing::debug!("dropping submit result for closed wizard");
            return Ok(());
        }
        self.in_flight = None;
        match result {
            Ok(()) => {
                self.state = WizardState::Submitted;
                self.store.mark_clean_at(self.store.revision());
                tracing::info!(kind = %self.kind, "questionnaire submitted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "submit failed");
                Err(e.into())
            }
        }
    }

    pub async fn submit<G: SubmissionGateway, P: Prompter>(
        &mut self,
        gateway: &G,
        prompter: &P,
    ) -> Result<SubmitOutcome, WizardError> {
        let pending = self.prepare_submit()?;
        if !prompter.confirm_submit(SUBMIT_CONFIRM_TITLE, SUBMIT_CONFIRM_MESSAGE) {
            return Ok(SubmitOutcome::Declined);
        }
        let ticket = self.begin_submit(pending)?;
        let result = gateway.submit(self.kind, &ticket.payload).await;
        self.finish_submit(ticket, result)?;
        Ok(SubmitOutcome::Submitted)
    }

    // ----- leaving -----

    /// Leave for the dashboard, asking first when there are unsaved edits.
    ///
    /// A failed save-and-return keeps the user on the wizard and returns the error.
    pub async fn return_to_dashboard<G: SubmissionGateway, P: Prompter>(
        &mut self,
        gateway: &G,
        prompter: &P,
    ) -> Result<ReturnOutcome, WizardError> {
        if self.state != WizardState::Editing || !self.store.is_dirty() {
            return Ok(ReturnOutcome::Left { saved: false });
        }
        match prompter.unsaved_changes() {
            UnsavedChoice::SaveAndReturn => {
                self.save(gateway).await?;
                Ok(ReturnOutcome::Left { saved: true })
            }
            UnsavedChoice::Discard => {
                tracing::info!(kind = %self.kind, "unsaved changes discarded");
                Ok(ReturnOutcome::Left { saved: false })
            }
            UnsavedChoice::Stay => Ok(ReturnOutcome::Stayed),
        }
    }

    /// Tear down: results of requests still in flight are dropped.
    pub fn close(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        if self.state == WizardState::Editing {
            self.state = WizardState::Closed;
        }
    }

    // ----- uploads -----

    /// Start an upload attempt for a file-upload question.
    pub fn begin_upload(
        &mut self,
        question_id: impl Into<QuestionId>,
        file_name: &str,
        size_bytes: u64,
    ) -> Result<UploadTicket, WizardError> {
        self.ensure_editing()?;
        let question_id = question_id.into();
        let question = self.question(&question_id)?;
        if question.question_type != QuestionType::FileUpload {
            return Err(UploadError::NotFileQuestion(question_id).into());
        }
        if let Some(limit) = self.max_upload_bytes {
            if size_bytes > limit {
                return Err(UploadError::TooLarge {
                    file_name: file_name.to_string(),
                    size_mb: size_bytes as f64 / (1024.0 * 1024.0),
                    limit_mb: limit / (1024 * 1024),
                }
                .into());
            }
        }
        Ok(self.uploads.start(
            question_id,
            self.questionnaire_id.as_deref(),
            file_name,
            &mut self.store,
        )?)
    }

    pub fn upload_progress(&mut self, ticket: &UploadTicket, percent: u8) -> bool {
        self.uploads.progress(ticket, percent)
    }

    /// Apply an upload result. Stale results are ignored.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadReceipt, GatewayError>,
    ) -> Result<(), WizardError> {
        if self.state == WizardState::Closed {
            return Ok(());
        }
        match result {
            Ok(receipt) => {
                let file_name = self
                    .uploads
                    .state(&ticket.question_id)
                    .file_name
                    .unwrap_or_default();
                let file = FileRef {
                    document_id: receipt.document_id,
                    file_name,
                    url: receipt.file_url,
                };
                self.uploads.complete(&ticket, file, &mut self.store);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if self.uploads.fail(&ticket, message.clone()) {
                    Err(UploadError::Failed(message).into())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Cancel an in-flight upload or delete a finished one.
    pub fn remove_upload(
        &mut self,
        question_id: impl Into<QuestionId>,
    ) -> Result<Option<FileRef>, WizardError> {
        self.ensure_editing()?;
        let question_id = question_id.into();
        let question = self.question(&question_id)?;
        if question.question_type != QuestionType::FileUpload {
            return Err(UploadError::NotFileQuestion(question_id).into());
        }
        if self.uploads.phase(&question_id) == UploadPhase::Idle {
            return Err(UploadError::NoActiveUpload(question_id).into());
        }
        Ok(self.uploads.remove(question_id, &mut self.store))
    }

    /// Upload `bytes` for a question, applying progress while the request runs.
    pub async fn upload_file<G: SubmissionGateway>(
        &mut self,
        gateway: &G,
        question_id: impl Into<QuestionId>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), WizardError> {
        let question_id = question_id.into();
        let ticket = self.begin_upload(question_id.clone(), file_name, bytes.len() as u64)?;
        let request = UploadRequest {
            question_id,
            questionnaire_id: self.questionnaire_id.clone().unwrap_or_default(),
            file_name: file_name.to_string(),
            bytes,
        };

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        let upload = gateway.upload(request, move |percent| {
            let _ = tx.send(percent);
        });
        tokio::pin!(upload);

        let result = loop {
            tokio::select! {
                result = &mut upload => break result,
                Some(percent) = rx.recv() => {
                    self.uploads.progress(&ticket, percent);
                }
            }
        };
        while let Ok(percent) = rx.try_recv() {
            self.uploads.progress(&ticket, percent);
        }

        self.finish_upload(ticket, result)
    }

    fn question(&self, question_id: &QuestionId) -> Result<&Question, WizardError> {
        self.layout
            .question(question_id)
            .ok_or_else(|| WizardError::UnknownQuestion(question_id.clone()))
    }

    fn ensure_editing(&self) -> Result<(), WizardError> {
        match self.state {
            WizardState::Editing => Ok(()),
            WizardState::Submitted => Err(WizardError::AlreadySubmitted),
            WizardState::Closed => Err(WizardError::Cancelled),
        }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        match self.in_flight {
            Some(action) => Err(WizardError::Busy {
                action: action.name(),
            }),
            None => Ok(()),
        }
    }
}
