//! JSON request/response shapes of the portal backend.

use serde::{Deserialize, Deserializer, Serialize};

use crate::progress::AssessmentStatus;
use crate::questionnaire::question::{ChoiceId, QuestionId, RawQuestion};
use crate::questionnaire::section::RawMainFactor;

/// Accept an identifier sent either as a JSON number or a string.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Previously stored answer as returned by a questionnaire fetch.
///
/// Each endpoint fills a different subset of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub question_id: QuestionId,
    #[serde(default)]
    pub response_text: Option<String>,
    /// Contextual endpoint: a choice id, or a full choice object.
    #[serde(default)]
    pub selected_choice: Option<serde_json::Value>,
    #[serde(default)]
    pub choice_id: Option<ChoiceId>,
    /// Risk-assessment endpoint: bool for YN, text for SA.
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
}

impl RawResponse {
    /// Selected choice id, whichever field carried it.
    pub fn choice(&self) -> Option<ChoiceId> {
        self.choice_id.or_else(|| match &self.selected_choice {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::Object(obj)) => obj.get("id").and_then(|v| v.as_i64()),
            _ => None,
        })
    }

    /// Free-text answer, whichever field carried it.
    pub fn text(&self) -> Option<&str> {
        self.response_text
            .as_deref()
            .or_else(|| self.answer.as_ref().and_then(|v| v.as_str()))
    }

    pub fn yes_no(&self) -> Option<bool> {
        self.answer.as_ref().and_then(|v| v.as_bool())
    }
}

/// Document already uploaded for a risk-assessment question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub question: QuestionId,
    pub file: String,
}

/// Corporate and contextual fetch response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatEnvelope {
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
    #[serde(default)]
    pub responses: Option<Vec<RawResponse>>,
}

/// Risk-assessment fetch response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentEnvelope {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub questionnaire_id: Option<String>,
    #[serde(default)]
    pub main_factors: Vec<RawMainFactor>,
    #[serde(default)]
    pub responses: Option<Vec<RawResponse>>,
    #[serde(default)]
    pub documents: Option<Vec<RawDocument>>,
}

/// A fetched questionnaire, tagged by flavour.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionnaireEnvelope {
    Corporate(FlatEnvelope),
    Contextual(FlatEnvelope),
    RiskAssessment(RiskAssessmentEnvelope),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateResponse {
    pub question_id: QuestionId,
    pub response_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualResponse {
    pub question_id: QuestionId,
    pub choice_id: Option<ChoiceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadRef {
    pub document_id: String,
    pub file_url: String,
}

/// Risk-assessment response, tagged by question type code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RiskResponse {
    #[serde(rename = "YN")]
    YesNo {
        question_id: QuestionId,
        answer: Option<bool>,
    },
    #[serde(rename = "MC")]
    MultipleChoice {
        question_id: QuestionId,
        choice_id: Option<ChoiceId>,
    },
    #[serde(rename = "SA")]
    ShortAnswer {
        question_id: QuestionId,
        answer: String,
    },
    #[serde(rename = "FU")]
    FileUpload {
        question_id: QuestionId,
        file_upload: Option<FileUploadRef>,
    },
}

impl RiskResponse {
    pub fn question_id(&self) -> &QuestionId {
        match self {
            RiskResponse::YesNo { question_id, .. }
            | RiskResponse::MultipleChoice { question_id, .. }
            | RiskResponse::ShortAnswer { question_id, .. }
            | RiskResponse::FileUpload { question_id, .. } => question_id,
        }
    }
}

/// One entry of a save/submit body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseRecord {
    Corporate(CorporateResponse),
    Contextual(ContextualResponse),
    RiskAssessment(RiskResponse),
}

impl ResponseRecord {
    pub fn question_id(&self) -> &QuestionId {
        match self {
            ResponseRecord::Corporate(r) => &r.question_id,
            ResponseRecord::Contextual(r) => &r.question_id,
            ResponseRecord::RiskAssessment(r) => r.question_id(),
        }
    }
}

/// Save/submit request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesPayload {
    pub responses: Vec<ResponseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<bool>,
}

/// File upload request (sent as multipart form data).
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub question_id: QuestionId,
    pub questionnaire_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(deserialize_with = "id_string")]
    pub document_id: String,
    pub file_url: String,
}

/// Vendor dashboard response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorDashboard {
    pub assessment_status: AssessmentStatus,
}

/// Entry of the RA-team pending review list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub id: i64,
    pub vendor_name: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaDashboard {
    #[serde(default)]
    pub pending_reviews: Vec<PendingReview>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorInfo {
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Vendor response as seen by a reviewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewedResponse {
    pub question_id: QuestionId,
    #[serde(default)]
    pub requires_scoring: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub ra_comment: Option<String>,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub yes_no_response: Option<bool>,
    #[serde(default)]
    pub selected_choice: Option<serde_json::Value>,
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentReview {
    #[serde(default)]
    pub main_factors: Vec<RawMainFactor>,
    #[serde(default)]
    pub responses: Vec<ReviewedResponse>,
}

/// RA-team view of one vendor submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDetail {
    #[serde(default)]
    pub vendor_info: Option<VendorInfo>,
    #[serde(default)]
    pub risk_assessment: Option<RiskAssessmentReview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub question_id: QuestionId,
    pub score: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresPayload {
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Backend-computed result; shown as-is, never recomputed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCalculation {
    pub final_score: f64,
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompleteReviewResponse {
    #[serde(default)]
    pub risk_calculation: Option<RiskCalculation>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
