//! Answer values held by the form store.

use serde::{Deserialize, Serialize};

use super::question::{ChoiceId, QuestionType};

/// Reference to a document stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub document_id: String,
    pub file_name: String,
    pub url: String,
}

impl FileRef {
    /// Build a reference from a stored document URL, taking the last path
    /// segment as the display name.
    pub fn from_url(document_id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let file_name = url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(url.as_str())
            .to_string();
        Self {
            document_id: document_id.into(),
            file_name,
            url,
        }
    }
}

/// Current value of one question, tagged by the question's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    YesNo(bool),
    Choice(ChoiceId),
    Text(String),
    File(FileRef),
}

impl Answer {
    /// Whether this value can be stored for a question of `question_type`.
    pub fn fits(&self, question_type: QuestionType) -> bool {
        matches!(
            (self, question_type),
            (Answer::YesNo(_), QuestionType::YesNo)
                | (Answer::Choice(_), QuestionType::MultipleChoice)
                | (Answer::Text(_), QuestionType::ShortAnswer)
                | (Answer::File(_), QuestionType::FileUpload)
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<ChoiceId> {
        match self {
            Answer::Choice(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::YesNo(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Answer::File(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_url_segment() {
        let f = FileRef::from_url("12", "/media/documents/policy.pdf");
        assert_eq!(f.file_name, "policy.pdf");
        assert_eq!(f.document_id, "12");
    }

    #[test]
    fn answers_fit_only_their_type() {
        assert!(Answer::YesNo(true).fits(QuestionType::YesNo));
        assert!(Answer::Choice(3).fits(QuestionType::MultipleChoice));
        assert!(!Answer::Text("x".into()).fits(QuestionType::FileUpload));
        assert!(!Answer::YesNo(false).fits(QuestionType::ShortAnswer));
    }
}
