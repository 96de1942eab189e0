//! Questionnaire flavours and their wire formats.
//!
//! Each flavour has its own endpoint and its own save/submit payload. The
//! shared wizard never sees those differences: it gets a [`Questionnaire`]
//! from [`Questionnaire::from_envelope`] and hands the store back to
//! [`encode_responses`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::answer::{Answer, FileRef};
use super::question::{QuestionId, QuestionType};
use super::section::{Layout, SectionGrouper};
use super::store::FormValueStore;
use crate::auth::Role;
use crate::gateway::wire::{
    ContextualResponse, CorporateResponse, FileUploadRef, QuestionnaireEnvelope, RawResponse,
    ResponseRecord, ResponsesPayload, RiskResponse,
};

/// The three questionnaires a vendor fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionnaireKind {
    Corporate,
    Contextual,
    RiskAssessment,
}

impl QuestionnaireKind {
    pub const ALL: [QuestionnaireKind; 3] = [
        QuestionnaireKind::Corporate,
        QuestionnaireKind::Contextual,
        QuestionnaireKind::RiskAssessment,
    ];

    /// Fetch endpoint, relative to the API base URL.
    pub fn path(&self) -> String {
        format!("api/v1/vendor/questionnaires/{}/", self.slug())
    }

    pub fn save_path(&self) -> String {
        format!("{}save/", self.path())
    }

    pub fn submit_path(&self) -> String {
        format!("{}submit/", self.path())
    }

    pub fn slug(&self) -> &'static str {
        match self {
            QuestionnaireKind::Corporate => "corporate",
            QuestionnaireKind::Contextual => "contextual",
            QuestionnaireKind::RiskAssessment => "risk-assessment",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            QuestionnaireKind::Corporate => "Corporate Questionnaire",
            QuestionnaireKind::Contextual => "Contextual Questionnaire",
            QuestionnaireKind::RiskAssessment => "Risk Assessment",
        }
    }

    /// Type assumed for records that carry none.
    pub fn default_question_type(&self) -> Option<QuestionType> {
        match self {
            QuestionnaireKind::Corporate => Some(QuestionType::ShortAnswer),
            QuestionnaireKind::Contextual => Some(QuestionType::MultipleChoice),
            QuestionnaireKind::RiskAssessment => None,
        }
    }

    pub fn required_role(&self) -> Role {
        Role::Vendor
    }

    /// Whether submit sends the full payload with `"submit": true`.
    pub fn submit_flag(&self) -> bool {
        matches!(self, QuestionnaireKind::RiskAssessment)
    }
}

impl fmt::Display for QuestionnaireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for QuestionnaireKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "corporate" => Ok(QuestionnaireKind::Corporate),
            "contextual" => Ok(QuestionnaireKind::Contextual),
            "risk-assessment" | "risk" | "ra" => Ok(QuestionnaireKind::RiskAssessment),
            other => Err(format!(
                "unknown questionnaire '{other}' (expected corporate, contextual or risk-assessment)"
            )),
        }
    }
}

/// A fetched questionnaire, grouped and ready for the wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct Questionnaire {
    pub kind: QuestionnaireKind,
    /// Parent id required before any file upload; risk assessment only.
    pub questionnaire_id: Option<String>,
    pub layout: Layout,
    /// Stored answers from earlier saves.
    pub answers: Vec<(QuestionId, Answer)>,
    /// Documents uploaded in earlier sessions.
    pub documents: Vec<(QuestionId, FileRef)>,
}

impl Questionnaire {
    pub fn from_envelope(envelope: QuestionnaireEnvelope) -> Self {
        match envelope {
            QuestionnaireEnvelope::Corporate(env) => Self::flat(QuestionnaireKind::Corporate, env),
            QuestionnaireEnvelope::Contextual(env) => Self::flat(QuestionnaireKind::Contextual, env),
            QuestionnaireEnvelope::RiskAssessment(env) => {
                let layout = SectionGrouper::nest(&env.main_factors);
                let answers = decode_answers(&layout, env.responses.as_deref().unwrap_or_default());
                let documents = env
                    .documents
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|doc| {
                        let known = layout
                            .question(&doc.question)
                            .is_some_and(|q| q.question_type == QuestionType::FileUpload);
                        if !known {
                            tracing::debug!(question_id = %doc.question, "ignoring document for unknown question");
                        }
                        known
                    })
                    .map(|doc| (doc.question, FileRef::from_url(doc.id, doc.file)))
                    .collect();
                Self {
                    kind: QuestionnaireKind::RiskAssessment,
                    questionnaire_id: env.questionnaire_id.filter(|id| !id.trim().is_empty()),
                    layout,
                    answers,
                    documents,
                }
            }
        }
    }

    fn flat(kind: QuestionnaireKind, env: crate::gateway::wire::FlatEnvelope) -> Self {
        let layout = SectionGrouper::group_raw(&env.questions, kind.default_question_type());
        let answers = decode_answers(&layout, env.responses.as_deref().unwrap_or_default());
        Self {
            kind,
            questionnaire_id: None,
            layout,
            answers,
            documents: Vec::new(),
        }
    }
}

/// Turn stored responses into answers, by each question's type.
///
/// Responses for unknown or unsupported questions, and values that do not
/// fit their question, are skipped.
fn decode_answers(layout: &Layout, responses: &[RawResponse]) -> Vec<(QuestionId, Answer)> {
    responses
        .iter()
        .filter_map(|response| {
            let Some(question) = layout.question(&response.question_id) else {
                tracing::debug!(question_id = %response.question_id, "ignoring response for unknown question");
                return None;
            };
            let answer = match question.question_type {
                QuestionType::YesNo => response.yes_no().map(Answer::YesNo),
                QuestionType::MultipleChoice => response.choice().map(Answer::Choice),
                QuestionType::ShortAnswer => response
                    .text()
                    .filter(|t| !t.is_empty())
                    .map(|t| Answer::Text(t.to_string())),
                // delivered through `documents`
                QuestionType::FileUpload => None,
            }?;
            Some((question.id.clone(), answer))
        })
        .collect()
}

/// Build the save/submit body for every supported question of the layout.
///
/// Unanswered questions are still listed, with an empty or null value.
pub fn encode_responses(
    kind: QuestionnaireKind,
    layout: &Layout,
    store: &FormValueStore,
    submit: bool,
) -> ResponsesPayload {
    let responses = layout
        .questions()
        .map(|question| {
            let value = store.get(&question.id);
            let text = || {
                value
                    .and_then(Answer::as_text)
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default()
            };
            match kind {
                QuestionnaireKind::Corporate => ResponseRecord::Corporate(CorporateResponse {
                    question_id: question.id.clone(),
                    response_text: text(),
                }),
                QuestionnaireKind::Contextual => ResponseRecord::Contextual(ContextualResponse {
                    question_id: question.id.clone(),
                    choice_id: value.and_then(Answer::as_choice),
                }),
                QuestionnaireKind::RiskAssessment => {
                    let question_id = question.id.clone();
                    ResponseRecord::RiskAssessment(match question.question_type {
                        QuestionType::YesNo => RiskResponse::YesNo {
                            question_id,
                            answer: value.and_then(Answer::as_bool),
                        },
                        QuestionType::MultipleChoice => RiskResponse::MultipleChoice {
                            question_id,
                            choice_id: value.and_then(Answer::as_choice),
                        },
                        QuestionType::ShortAnswer => RiskResponse::ShortAnswer {
                            question_id,
                            answer: text(),
                        },
                        QuestionType::FileUpload => RiskResponse::FileUpload {
                            question_id,
                            file_upload: value.and_then(Answer::as_file).map(|file| FileUploadRef {
                                document_id: file.document_id.clone(),
                                file_url: file.url.clone(),
                            }),
                        },
                    })
                }
            }
        })
        .collect();

    ResponsesPayload {
        responses,
        submit: (submit && kind.submit_flag()).then_some(true),
    }
}
