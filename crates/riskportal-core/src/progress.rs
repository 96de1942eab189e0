//! Vendor assessment status and questionnaire unlock order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::questionnaire::QuestionnaireKind;

/// Status of one questionnaire as reported by the vendor dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Submitted,
    Completed,
}

impl StageStatus {
    /// Submitted or completed questionnaires are read-only.
    pub fn is_finished(&self) -> bool {
        matches!(self, StageStatus::Submitted | StageStatus::Completed)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageStatus::NotStarted => "Not Started",
            StageStatus::InProgress => "In Progress",
            StageStatus::Submitted => "Submitted",
            StageStatus::Completed => "Completed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub status: StageStatus,
}

/// `assessment_status` block of the vendor dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssessmentStatus {
    #[serde(default)]
    pub corporate: Stage,
    #[serde(default)]
    pub contextual: Stage,
    #[serde(default)]
    pub risk_assessment: Stage,
}

impl AssessmentStatus {
    pub fn status(&self, kind: QuestionnaireKind) -> StageStatus {
        match kind {
            QuestionnaireKind::Corporate => self.corporate.status,
            QuestionnaireKind::Contextual => self.contextual.status,
            QuestionnaireKind::RiskAssessment => self.risk_assessment.status,
        }
    }

    /// Corporate is always open; each later questionnaire opens once the
    /// one before it is finished.
    pub fn is_unlocked(&self, kind: QuestionnaireKind) -> bool {
        match kind {
            QuestionnaireKind::Corporate => true,
            QuestionnaireKind::Contextual => self.corporate.status.is_finished(),
            QuestionnaireKind::RiskAssessment => {
                self.corporate.status.is_finished() && self.contextual.status.is_finished()
            }
        }
    }

    /// Unlocked and not yet finished.
    pub fn is_editable(&self, kind: QuestionnaireKind) -> bool {
        self.is_unlocked(kind) && !self.status(kind).is_finished()
    }

    /// 0 corporate, 1 contextual, 2 risk assessment, 3 all done.
    pub fn current_step(&self) -> u8 {
        QuestionnaireKind::ALL
            .iter()
            .position(|kind| !self.status(*kind).is_finished())
            .map_or(3, |i| i as u8)
    }

    /// Questionnaire the vendor should work on next.
    pub fn next_questionnaire(&self) -> Option<QuestionnaireKind> {
        QuestionnaireKind::ALL.get(self.current_step() as usize).copied()
    }
}
