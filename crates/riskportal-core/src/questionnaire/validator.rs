//! Section-scoped validation.
//!
//! Only the questions of the section being checked are looked at; other
//! sections are validated when the user leaves them or at submit time.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::answer::Answer;
use super::question::{Question, QuestionId, QuestionType};
use super::section::Section;
use super::store::FormValueStore;
use super::upload::{UploadCoordinator, UploadPhase};

/// Minimum trimmed length of a short answer.
pub const MIN_SHORT_ANSWER_LEN: usize = 3;

/// Why a question failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// No value stored.
    Missing,
    /// Text contains only whitespace.
    WhitespaceOnly,
    /// Trimmed text shorter than the minimum.
    TooShort { min: usize },
    /// Stored choice is not one of the question's options.
    UnknownChoice,
    /// A file upload is still running or failed.
    UploadIncomplete { phase: UploadPhase },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Missing => write!(f, "this field is required"),
            FailureReason::WhitespaceOnly => write!(f, "answer cannot be only whitespace"),
            FailureReason::TooShort { min } => {
                write!(f, "answer must be at least {min} characters long")
            }
            FailureReason::UnknownChoice => write!(f, "selected choice is not available"),
            FailureReason::UploadIncomplete { phase } => match phase {
                UploadPhase::Uploading => write!(f, "upload still in progress"),
                UploadPhase::Failed => write!(f, "upload failed, please retry"),
                _ => write!(f, "please upload a file"),
            },
        }
    }
}

/// One failing question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub question_id: QuestionId,
    pub question_text: String,
    pub reason: FailureReason,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.question_text, self.reason)
    }
}

/// Outcome of validating one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(Vec<ValidationFailure>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            Validation::Valid => &[],
            Validation::Invalid(failures) => failures,
        }
    }

    pub fn into_failures(self) -> Vec<ValidationFailure> {
        match self {
            Validation::Valid => Vec::new(),
            Validation::Invalid(failures) => failures,
        }
    }
}

/// Validates questions against the store and upload state.
pub struct SectionValidator<'a> {
    store: &'a FormValueStore,
    uploads: &'a UploadCoordinator,
}

impl<'a> SectionValidator<'a> {
    pub fn new(store: &'a FormValueStore, uploads: &'a UploadCoordinator) -> Self {
        Self { store, uploads }
    }

    pub fn validate(&self, section: &Section) -> Validation {
        self.validate_questions(section.questions())
    }

    /// Validate every question of several sections, in order.
    pub fn validate_all<'s>(&self, sections: impl IntoIterator<Item = &'s Section>) -> Validation {
        self.validate_questions(sections.into_iter().flat_map(Section::questions))
    }

    fn validate_questions<'q>(&self, questions: impl Iterator<Item = &'q Question>) -> Validation {
        let failures: Vec<ValidationFailure> = questions
            .filter_map(|q| {
                self.check(q).map(|reason| ValidationFailure {
                    question_id: q.id.clone(),
                    question_text: q.text.clone(),
                    reason,
                })
            })
            .collect();
        if failures.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(failures)
        }
    }

    /// Failure reason for one question, if any.
    pub fn check(&self, question: &Question) -> Option<FailureReason> {
        let value = self.store.get(&question.id);
        match question.question_type {
            QuestionType::YesNo => match value {
                Some(Answer::YesNo(_)) => None,
                _ => Some(FailureReason::Missing),
            },
            QuestionType::MultipleChoice => match value {
                Some(Answer::Choice(id)) if question.choice(*id).is_some() => None,
                Some(Answer::Choice(_)) => Some(FailureReason::UnknownChoice),
                _ => Some(FailureReason::Missing),
            },
            QuestionType::ShortAnswer => match value {
                Some(Answer::Text(text)) => check_text(text),
                _ => Some(FailureReason::Missing),
            },
            QuestionType::FileUpload => {
                if !question.is_required() || self.uploads.is_satisfied(&question.id, self.store) {
                    return None;
                }
                match self.uploads.phase(&question.id) {
                    phase @ (UploadPhase::Uploading | UploadPhase::Failed) => {
                        Some(FailureReason::UploadIncomplete { phase })
                    }
                    _ => Some(FailureReason::Missing),
                }
            }
        }
    }
}

fn check_text(text: &str) -> Option<FailureReason> {
    let trimmed = text.trim();
    if text.is_empty() {
        Some(FailureReason::Missing)
    } else if trimmed.is_empty() {
        Some(FailureReason::WhitespaceOnly)
    } else if trimmed.chars().count() < MIN_SHORT_ANSWER_LEN {
        Some(FailureReason::TooShort {
            min: MIN_SHORT_ANSWER_LEN,
        })
    } else {
        None
    }
}
