//! Question normalization.
//!
//! The backend delivers three differently shaped question records (corporate,
//! contextual, risk-assessment). They are all read into [`RawQuestion`] and
//! normalized into one [`Question`] shape that the rest of the wizard works
//! with. Records that cannot be normalized become [`UnsupportedQuestion`]
//! placeholders instead of aborting the load.

use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::error::QuestionError;

/// Question identifier, stable across save/submit cycles.
///
/// Most endpoints key questions by integer, but string keys are accepted
/// too. A string holding an integer reads as that integer, so `"12"` and
/// `12` name the same question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Key(String),
}

impl QuestionId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            QuestionId::Number(n) => Some(*n),
            QuestionId::Key(_) => None,
        }
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        QuestionId::Number(0)
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(i64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(n) => QuestionId::Number(n),
            Wire::Text(s) => QuestionId::from(s),
        })
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{n}"),
            QuestionId::Key(k) => f.write_str(k),
        }
    }
}

impl FromStr for QuestionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QuestionId::from(s))
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        QuestionId::Number(n)
    }
}

impl From<i32> for QuestionId {
    fn from(n: i32) -> Self {
        QuestionId::Number(i64::from(n))
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(n) => QuestionId::Number(n),
            Err(_) => QuestionId::Key(s.to_string()),
        }
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        match s.trim().parse::<i64>() {
            Ok(n) => QuestionId::Number(n),
            Err(_) => QuestionId::Key(s),
        }
    }
}

impl From<&QuestionId> for QuestionId {
    fn from(id: &QuestionId) -> Self {
        id.clone()
    }
}

impl PartialEq<i64> for QuestionId {
    fn eq(&self, other: &i64) -> bool {
        self.as_number() == Some(*other)
    }
}

impl PartialEq<i32> for QuestionId {
    fn eq(&self, other: &i32) -> bool {
        self.as_number() == Some(i64::from(*other))
    }
}

/// Choice identifier within a multiple-choice question.
pub type ChoiceId = i64;

/// Answer type of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "YN")]
    YesNo,
    #[serde(rename = "MC")]
    MultipleChoice,
    #[serde(rename = "SA")]
    ShortAnswer,
    #[serde(rename = "FU")]
    FileUpload,
}

impl QuestionType {
    /// Wire code used by the risk-assessment endpoints.
    pub fn code(&self) -> &'static str {
        match self {
            QuestionType::YesNo => "YN",
            QuestionType::MultipleChoice => "MC",
            QuestionType::ShortAnswer => "SA",
            QuestionType::FileUpload => "FU",
        }
    }

    /// Parse a wire code or long name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yn" | "yes_no" | "yesno" => Some(QuestionType::YesNo),
            "mc" | "multiple_choice" | "multiplechoice" => Some(QuestionType::MultipleChoice),
            "sa" | "short_answer" | "shortanswer" => Some(QuestionType::ShortAnswer),
            "fu" | "file_upload" | "fileupload" => Some(QuestionType::FileUpload),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::YesNo => "yes/no",
            QuestionType::MultipleChoice => "multiple choice",
            QuestionType::ShortAnswer => "short answer",
            QuestionType::FileUpload => "file upload",
        }
    }
}

/// A choice option for a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
    /// Percentage adjustment interpreted by the scoring backend.
    #[serde(default)]
    pub modifier: f64,
}

/// Question record as delivered by any of the questionnaire endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: QuestionId,
    #[serde(default, rename = "type")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Prompt field used by the corporate endpoint. `text` wins when both
    /// are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub required: Option<bool>,
}

impl RawQuestion {
    /// Prompt text, whichever field carried it.
    pub fn prompt(&self) -> Option<&str> {
        self.text.as_deref().or(self.question_text.as_deref())
    }
}

/// Normalized, typed question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub text: String,
    /// Display weight (0-100). Also drives tiering when no section is given.
    pub weight: f64,
    /// Explicit grouping label, if the backend supplied one.
    pub section: Option<String>,
    /// Non-empty for multiple-choice questions, empty otherwise.
    pub choices: Vec<Choice>,
    /// Only file-upload questions may be optional.
    pub required: bool,
}

impl Question {
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// Placeholder for a record the wizard cannot render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedQuestion {
    pub id: QuestionId,
    pub text: String,
    pub weight: f64,
    pub section: Option<String>,
    pub reason: String,
}

/// One slot in a section: either a usable question or a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestionEntry {
    Supported(Question),
    Unsupported(UnsupportedQuestion),
}

impl QuestionEntry {
    pub fn id(&self) -> &QuestionId {
        match self {
            QuestionEntry::Supported(q) => &q.id,
            QuestionEntry::Unsupported(u) => &u.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            QuestionEntry::Supported(q) => &q.text,
            QuestionEntry::Unsupported(u) => &u.text,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            QuestionEntry::Supported(q) => q.weight,
            QuestionEntry::Unsupported(u) => u.weight,
        }
    }

    pub fn section(&self) -> Option<&str> {
        match self {
            QuestionEntry::Supported(q) => q.section.as_deref(),
            QuestionEntry::Unsupported(u) => u.section.as_deref(),
        }
    }

    pub fn as_question(&self) -> Option<&Question> {
        match self {
            QuestionEntry::Supported(q) => Some(q),
            QuestionEntry::Unsupported(_) => None,
        }
    }
}

/// Normalize a raw record into a typed question.
///
/// `default_type` applies when the record carries no `type` field (the
/// corporate and contextual endpoints never send one).
///
/// # Errors
///
/// Returns [`QuestionError::Malformed`] for an unrecognized or missing type,
/// a multiple-choice question without choices, a missing prompt, or a weight
/// outside 0-100.
pub fn normalize(
    raw: &RawQuestion,
    default_type: Option<QuestionType>,
) -> Result<Question, QuestionError> {
    let malformed = |reason: String| QuestionError::Malformed {
        id: raw.id.clone(),
        reason,
    };

    let question_type = match raw.question_type.as_deref() {
        Some(code) => QuestionType::parse(code)
            .ok_or_else(|| malformed(format!("unsupported question type '{code}'")))?,
        None => default_type.ok_or_else(|| malformed("missing question type".to_string()))?,
    };

    let text = raw
        .prompt()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed("missing question text".to_string()))?
        .to_string();

    let weight = raw.weight.unwrap_or(0.0);
    if !weight.is_finite() || !(0.0..=100.0).contains(&weight) {
        return Err(malformed(format!("weight {weight} outside 0-100")));
    }

    let choices = match question_type {
        QuestionType::MultipleChoice => match &raw.choices {
            Some(choices) if !choices.is_empty() => choices.clone(),
            _ => return Err(malformed("multiple-choice question without choices".to_string())),
        },
        _ => Vec::new(),
    };

    let required = match question_type {
        QuestionType::FileUpload => raw.required.unwrap_or(true),
        _ => true,
    };

    let section = raw
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(Question {
        id: raw.id.clone(),
        question_type,
        text,
        weight,
        section,
        choices,
        required,
    })
}

/// Normalize a record, degrading to a placeholder when it is malformed.
pub fn normalize_entry(raw: &RawQuestion, default_type: Option<QuestionType>) -> QuestionEntry {
    match normalize(raw, default_type) {
        Ok(question) => QuestionEntry::Supported(question),
        Err(QuestionError::Malformed { id, reason }) => {
            tracing::warn!(question_id = %id, %reason, "rendering unsupported question placeholder");
            QuestionEntry::Unsupported(UnsupportedQuestion {
                id: id.clone(),
                text: raw
                    .prompt()
                    .map(String::from)
                    .unwrap_or_else(|| format!("Question {id}")),
                weight: raw.weight.filter(|w| w.is_finite()).unwrap_or(0.0),
                section: raw.section.clone().filter(|s| !s.trim().is_empty()),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, ty: Option<&str>) -> RawQuestion {
        RawQuestion {
            id: id.into(),
            question_type: ty.map(String::from),
            text: Some(format!("Question {id}?")),
            weight: Some(12.5),
            ..Default::default()
        }
    }

    #[test]
    fn parses_wire_codes_and_long_names() {
        assert_eq!(QuestionType::parse("YN"), Some(QuestionType::YesNo));
        assert_eq!(QuestionType::parse("mc"), Some(QuestionType::MultipleChoice));
        assert_eq!(QuestionType::parse("short_answer"), Some(QuestionType::ShortAnswer));
        assert_eq!(QuestionType::parse(" FU "), Some(QuestionType::FileUpload));
        assert_eq!(QuestionType::parse("XX"), None);
    }

    #[test]
    fn default_type_applies_when_type_absent() {
        let q = normalize(&raw(1, None), Some(QuestionType::ShortAnswer)).unwrap();
        assert_eq!(q.question_type, QuestionType::ShortAnswer);
        assert!(q.required);
    }

    #[test]
    fn missing_type_without_default_is_malformed() {
        let err = normalize(&raw(2, None), None).unwrap_err();
        let QuestionError::Malformed { id, .. } = err;
        assert_eq!(id, 2);
    }

    #[test]
    fn unknown_type_is_malformed() {
        let err = normalize(&raw(3, Some("SLIDER")), None).unwrap_err();
        let QuestionError::Malformed { reason, .. } = err;
        assert!(reason.contains("SLIDER"));
    }

    #[test]
    fn multiple_choice_requires_choices() {
        let mut r = raw(4, Some("MC"));
        assert!(normalize(&r, None).is_err());

        r.choices = Some(vec![]);
        assert!(normalize(&r, None).is_err());

        r.choices = Some(vec![Choice {
            id: 10,
            text: "Cloud".into(),
            modifier: 5.0,
        }]);
        let q = normalize(&r, None).unwrap();
        assert_eq!(q.choices.len(), 1);
        assert_eq!(q.choice(10).map(|c| c.text.as_str()), Some("Cloud"));
    }

    #[test]
    fn question_text_field_is_accepted() {
        let r: RawQuestion = serde_json::from_value(serde_json::json!({
            "id": 7,
            "question_text": "Company name",
            "section": "General"
        }))
        .unwrap();
        let q = normalize(&r, Some(QuestionType::ShortAnswer)).unwrap();
        assert_eq!(q.text, "Company name");
        assert_eq!(q.section.as_deref(), Some("General"));
    }

    #[test]
    fn text_wins_when_both_prompt_fields_are_sent() {
        let r: RawQuestion = serde_json::from_value(serde_json::json!({
            "id": 7,
            "text": "Legal name",
            "question_text": "Company name"
        }))
        .unwrap();
        let q = normalize(&r, Some(QuestionType::ShortAnswer)).unwrap();
        assert_eq!(q.text, "Legal name");
    }

    #[test]
    fn string_ids_are_accepted() {
        let r: RawQuestion = serde_json::from_value(serde_json::json!({
            "id": "q-1",
            "text": "Hosting region"
        }))
        .unwrap();
        assert_eq!(r.id, QuestionId::Key("q-1".into()));
        assert_eq!(serde_json::to_value(&r.id).unwrap(), serde_json::json!("q-1"));

        let numeric: QuestionId = serde_json::from_value(serde_json::json!("12")).unwrap();
        assert_eq!(numeric, QuestionId::Number(12));
        assert_eq!(numeric, 12);
        assert_eq!("q-1".parse::<QuestionId>().unwrap().to_string(), "q-1");
    }

    #[test]
    fn only_file_upload_may_be_optional() {
        let mut r = raw(5, Some("FU"));
        r.required = Some(false);
        assert!(!normalize(&r, None).unwrap().required);

        let mut r = raw(6, Some("SA"));
        r.required = Some(false);
        assert!(normalize(&r, None).unwrap().required);
    }

    #[test]
    fn weight_out_of_range_is_malformed() {
        let mut r = raw(8, Some("YN"));
        r.weight = Some(120.0);
        assert!(normalize(&r, None).is_err());
    }

    #[test]
    fn malformed_record_becomes_placeholder() {
        let entry = normalize_entry(&raw(9, Some("MATRIX")), None);
        match entry {
            QuestionEntry::Unsupported(u) => {
                assert_eq!(u.id, 9);
                assert_eq!(u.text, "Question 9?");
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
    }
}
