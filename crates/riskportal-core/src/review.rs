//! RA-team scoring of a submitted risk assessment.
//!
//! Only free-text and file answers are scored by hand; yes/no and
//! multiple-choice answers are scored by the backend. The final risk score
//! comes back from `complete` and is shown as-is.

use std::collections::BTreeMap;

use crate::error::{ReviewError, Result};
use crate::gateway::wire::{
    RiskCalculation, ScoreEntry, ScoresPayload, SubmissionDetail,
};
use crate::gateway::ReviewGateway;
use crate::questionnaire::{QuestionId, QuestionType, SectionGrouper};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// A question the reviewer must score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreableQuestion {
    pub id: QuestionId,
    pub text: String,
    pub question_type: QuestionType,
    /// Factor / sub-factor the question belongs to.
    pub section: String,
    /// What the vendor answered: text, or a document URL.
    pub response: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScoreSheet {
    submission_id: i64,
    vendor_name: Option<String>,
    questions: Vec<ScoreableQuestion>,
    scores: BTreeMap<QuestionId, Score>,
}

impl ScoreSheet {
    /// Build the sheet, pre-filled with scores saved in an earlier session.
    pub fn from_submission(submission_id: i64, detail: &SubmissionDetail) -> Self {
        let mut questions = Vec::new();
        let mut scores = BTreeMap::new();

        if let Some(ra) = &detail.risk_assessment {
            let layout = SectionGrouper::nest(&ra.main_factors);
            for section in layout.sections() {
                for question in section.questions() {
                    if !matches!(
                        question.question_type,
                        QuestionType::ShortAnswer | QuestionType::FileUpload
                    ) {
                        continue;
                    }
                    let reviewed = ra.responses.iter().find(|r| r.question_id == question.id);
                    let response = reviewed.and_then(|r| match question.question_type {
                        QuestionType::FileUpload => r.file_url.clone(),
                        _ => r.response_text.clone(),
                    });
                    if let Some(value) = reviewed.and_then(|r| r.score) {
                        scores.insert(
                            question.id.clone(),
                            Score {
                                value,
                                comment: reviewed
                                    .and_then(|r| r.ra_comment.clone())
                                    .filter(|c| !c.is_empty()),
                            },
                        );
                    }
                    questions.push(ScoreableQuestion {
                        id: question.id.clone(),
                        text: question.text.clone(),
                        question_type: question.question_type,
                        section: section.name.clone(),
                        response,
                    });
                }
            }
        }

        Self {
            submission_id,
            vendor_name: detail
                .vendor_info
                .as_ref()
                .and_then(|v| v.company_name.clone()),
            questions,
            scores,
        }
    }

    pub fn submission_id(&self) -> i64 {
        self.submission_id
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.vendor_name.as_deref()
    }

    pub fn questions(&self) -> &[ScoreableQuestion] {
        &self.questions
    }

    pub fn score(&self, id: impl Into<QuestionId>) -> Option<&Score> {
        self.scores.get(&id.into())
    }

    /// Record a 0-10 score. A blank comment counts as none.
    pub fn set_score(
        &mut self,
        id: impl Into<QuestionId>,
        value: f64,
        comment: Option<&str>,
    ) -> std::result::Result<(), ReviewError> {
        let id = id.into();
        if !self.questions.iter().any(|q| q.id == id) {
            return Err(ReviewError::NotScoreable(id));
        }
        if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ReviewError::ScoreOutOfRange { id, score: value });
        }
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);
        self.scores.insert(id, Score { value, comment });
        Ok(())
    }

    /// Every scoreable question must have a score before completing.
    pub fn validate(&self) -> std::result::Result<(), ReviewError> {
        let missing: Vec<QuestionId> = self
            .questions
            .iter()
            .filter(|q| !self.scores.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReviewError::MissingScores(missing))
        }
    }

    /// Scores entered so far, in question order.
    pub fn payload(&self) -> ScoresPayload {
        ScoresPayload {
            scores: self
                .questions
                .iter()
                .filter_map(|q| {
                    self.scores.get(&q.id).map(|s| ScoreEntry {
                        question_id: q.id.clone(),
                        score: s.value,
                        comment: s.comment.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        }
    }

    /// Persist the scores entered so far.
    pub async fn save<G: ReviewGateway>(&self, gateway: &G) -> Result<()> {
        gateway
            .save_scores(self.submission_id, &self.payload())
            .await?;
        tracing::info!(submission_id = self.submission_id, scored = self.scores.len(), "scores saved");
        Ok(())
    }

    /// Save every score and close the review.
    pub async fn complete<G: ReviewGateway>(&self, gateway: &G) -> Result<Option<RiskCalculation>> {
        self.validate()?;
        self.save(gateway).await?;
        let response = gateway.complete_review(self.submission_id).await?;
        tracing::info!(submission_id = self.submission_id, "review completed");
        Ok(response.risk_calculation)
    }
}
