//! Section grouping and wizard positions.
//!
//! Flat questionnaires are partitioned by explicit section label, falling
//! back to a weight tier. The risk-assessment questionnaire arrives already
//! nested (main factor -> sub-factor -> question) and is used as-is.
//!
//! Grouping happens once at load time. Section order is never re-derived
//! while editing, so positions stay valid for the life of the wizard.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::question::{
    normalize_entry, Question, QuestionEntry, QuestionId, QuestionType, RawQuestion,
};

pub const CRITICAL_FACTORS: &str = "Critical Factors";
pub const IMPORTANT_FACTORS: &str = "Important Factors";
pub const STANDARD_FACTORS: &str = "Standard Factors";

/// Tier label for a question weight.
///
/// `>= 20` is critical, `10..20` important, anything lower standard.
pub fn weight_tier(weight: f64) -> &'static str {
    if weight >= 20.0 {
        CRITICAL_FACTORS
    } else if weight >= 10.0 {
        IMPORTANT_FACTORS
    } else {
        STANDARD_FACTORS
    }
}

/// Ordered group of questions under one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Display weight (sub-factors only).
    pub weight: Option<f64>,
    pub entries: Vec<QuestionEntry>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
            entries: Vec::new(),
        }
    }

    /// Supported questions in display order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.entries.iter().filter_map(QuestionEntry::as_question)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top level of the two-level risk-assessment structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainFactor {
    pub name: String,
    pub weight: f64,
    pub sub_factors: Vec<Section>,
}

/// Backend shape of a main factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMainFactor {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub sub_factors: Vec<RawSubFactor>,
}

/// Backend shape of a sub-factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSubFactor {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

/// `{section_index, sub_section_index}`; the sub index is absent for flat
/// questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WizardPosition {
    pub section_index: usize,
    pub sub_section_index: Option<usize>,
}

impl WizardPosition {
    pub fn flat(section_index: usize) -> Self {
        Self {
            section_index,
            sub_section_index: None,
        }
    }

    pub fn nested(section_index: usize, sub_section_index: usize) -> Self {
        Self {
            section_index,
            sub_section_index: Some(sub_section_index),
        }
    }
}

impl fmt::Display for WizardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_section_index {
            Some(sub) => write!(
                f,
                "{}.{}",
                self.section_index.saturating_add(1),
                sub.saturating_add(1)
            ),
            None => write!(f, "{}", self.section_index.saturating_add(1)),
        }
    }
}

/// Grouped questionnaire structure the wizard navigates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layout {
    Flat(Vec<Section>),
    Nested(Vec<MainFactor>),
}

impl Layout {
    /// Every navigable position, in wizard order.
    pub fn positions(&self) -> Vec<WizardPosition> {
        match self {
            Layout::Flat(sections) => (0..sections.len()).map(WizardPosition::flat).collect(),
            Layout::Nested(factors) => factors
                .iter()
                .enumerate()
                .flat_map(|(fi, factor)| {
                    (0..factor.sub_factors.len()).map(move |si| WizardPosition::nested(fi, si))
                })
                .collect(),
        }
    }

    pub fn section_at(&self, pos: WizardPosition) -> Option<&Section> {
        match (self, pos.sub_section_index) {
            (Layout::Flat(sections), None) => sections.get(pos.section_index),
            (Layout::Nested(factors), Some(sub)) => factors
                .get(pos.section_index)
                .and_then(|f| f.sub_factors.get(sub)),
            _ => None,
        }
    }

    pub fn contains(&self, pos: WizardPosition) -> bool {
        self.section_at(pos).is_some()
    }

    pub fn first(&self) -> Option<WizardPosition> {
        self.positions().first().copied()
    }

    pub fn last(&self) -> Option<WizardPosition> {
        self.positions().last().copied()
    }

    pub fn is_last(&self, pos: WizardPosition) -> bool {
        self.last() == Some(pos)
    }

    pub fn next(&self, pos: WizardPosition) -> Option<WizardPosition> {
        let positions = self.positions();
        let idx = positions.iter().position(|p| *p == pos)?;
        positions.get(idx + 1).copied()
    }

    /// From the first sub-factor of a factor this lands on the last
    /// sub-factor of the previous factor.
    pub fn previous(&self, pos: WizardPosition) -> Option<WizardPosition> {
        let positions = self.positions();
        let idx = positions.iter().position(|p| *p == pos)?;
        idx.checked_sub(1).and_then(|i| positions.get(i).copied())
    }

    /// Target of a click on a top-level step indicator.
    pub fn step(&self, section_index: usize) -> Option<WizardPosition> {
        let pos = match self {
            Layout::Flat(_) => WizardPosition::flat(section_index),
            Layout::Nested(_) => WizardPosition::nested(section_index, 0),
        };
        self.contains(pos).then_some(pos)
    }

    /// Every section, in wizard order.
    pub fn sections(&self) -> Vec<&Section> {
        match self {
            Layout::Flat(sections) => sections.iter().collect(),
            Layout::Nested(factors) => factors.iter().flat_map(|f| f.sub_factors.iter()).collect(),
        }
    }

    /// Every supported question across all sections.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections().into_iter().flat_map(Section::questions)
    }

    pub fn question(&self, id: impl Into<QuestionId>) -> Option<&Question> {
        let id = id.into();
        self.questions().find(|q| q.id == id)
    }

    /// Number of top-level steps (sections, or main factors).
    pub fn step_count(&self) -> usize {
        match self {
            Layout::Flat(sections) => sections.len(),
            Layout::Nested(factors) => factors.len(),
        }
    }

    /// Display progress within the current step, 0-100.
    pub fn progress_percent(&self, pos: WizardPosition) -> u8 {
        let (index, count) = match (self, pos.sub_section_index) {
            (Layout::Nested(factors), Some(sub)) => (
                sub,
                factors
                    .get(pos.section_index)
                    .map_or(0, |f| f.sub_factors.len()),
            ),
            _ => (pos.section_index, self.step_count()),
        };
        if count == 0 {
            return 0;
        }
        ((index as f64 / count as f64) * 100.0).round() as u8
    }
}

/// Partitions questions into ordered sections.
pub struct SectionGrouper;

impl SectionGrouper {
    /// Group flat entries by label (or weight tier), in first-seen order.
    pub fn group(entries: Vec<QuestionEntry>) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        for entry in entries {
            let key = entry
                .section()
                .map(String::from)
                .unwrap_or_else(|| weight_tier(entry.weight()).to_string());
            match sections.iter_mut().find(|s| s.name == key) {
                Some(section) => section.entries.push(entry),
                None => {
                    let mut section = Section::new(key);
                    section.entries.push(entry);
                    sections.push(section);
                }
            }
        }
        sections
    }

    /// Normalize and group a flat list of raw records.
    pub fn group_raw(raw: &[RawQuestion], default_type: Option<QuestionType>) -> Layout {
        let entries = raw
            .iter()
            .map(|r| normalize_entry(r, default_type))
            .collect();
        Layout::Flat(Self::group(entries))
    }

    /// Keep the backend's factor/sub-factor nesting, normalizing questions in place.
    ///
    /// Factors and sub-factors are kept even when empty so step indices
    /// match the backend's factor order. A factor without sub-factors has no
    /// navigable position.
    pub fn nest(factors: &[RawMainFactor]) -> Layout {
        Layout::Nested(
            factors
                .iter()
                .map(|factor| MainFactor {
                    name: factor.name.clone(),
                    weight: factor.weight,
                    sub_factors: factor
                        .sub_factors
                        .iter()
                        .map(|sub| Section {
                            name: sub.name.clone(),
                            weight: Some(sub.weight),
                            entries: sub
                                .questions
                                .iter()
                                .map(|q| normalize_entry(q, None))
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(id: i64, weight: f64, section: Option<&str>) -> RawQuestion {
        RawQuestion {
            id: id.into(),
            text: Some(format!("Q{id}")),
            weight: Some(weight),
            section: section.map(String::from),
            ..Default::default()
        }
    }

    fn names(layout: &Layout) -> Vec<String> {
        layout.sections().iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(weight_tier(20.0), CRITICAL_FACTORS);
        assert_eq!(weight_tier(19.9), IMPORTANT_FACTORS);
        assert_eq!(weight_tier(10.0), IMPORTANT_FACTORS);
        assert_eq!(weight_tier(9.9), STANDARD_FACTORS);
        assert_eq!(weight_tier(0.0), STANDARD_FACTORS);
    }

    #[test]
    fn labels_group_in_first_seen_order() {
        let layout = SectionGrouper::group_raw(
            &[
                raw(1, 0.0, Some("Security")),
                raw(2, 0.0, Some("General")),
                raw(3, 0.0, Some("Security")),
            ],
            Some(QuestionType::ShortAnswer),
        );
        assert_eq!(names(&layout), vec!["Security", "General"]);
        let ids: Vec<_> = layout.sections()[0].questions().map(|q| q.id.clone()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn weights_group_into_tiers() {
        let layout = SectionGrouper::group_raw(
            &[raw(1, 5.0, None), raw(2, 25.0, None), raw(3, 15.0, None), raw(4, 30.0, None)],
            Some(QuestionType::MultipleChoice),
        );
        // contextual questions without choices become placeholders but still group
        assert_eq!(
            names(&layout),
            vec![STANDARD_FACTORS, CRITICAL_FACTORS, IMPORTANT_FACTORS]
        );
        assert_eq!(layout.sections()[1].len(), 2);
    }

    #[test]
    fn nested_positions_walk_factor_major() {
        let factors = vec![
            RawMainFactor {
                name: "Technical".into(),
                weight: 60.0,
                sub_factors: vec![
                    RawSubFactor {
                        name: "Access".into(),
                        weight: 30.0,
                        questions: vec![RawQuestion {
                            question_type: Some("YN".into()),
                            ..raw(1, 10.0, None)
                        }],
                    },
                    RawSubFactor {
                        name: "Network".into(),
                        weight: 30.0,
                        questions: vec![RawQuestion {
                            question_type: Some("SA".into()),
                            ..raw(2, 10.0, None)
                        }],
                    },
                ],
            },
            RawMainFactor {
                name: "Organisational".into(),
                weight: 40.0,
                sub_factors: vec![RawSubFactor {
                    name: "Policy".into(),
                    weight: 40.0,
                    questions: vec![RawQuestion {
                        question_type: Some("FU".into()),
                        ..raw(3, 10.0, None)
                    }],
                }],
            },
        ];
        let layout = SectionGrouper::nest(&factors);
        assert_eq!(
            layout.positions(),
            vec![
                WizardPosition::nested(0, 0),
                WizardPosition::nested(0, 1),
                WizardPosition::nested(1, 0)
            ]
        );
        assert_eq!(
            layout.previous(WizardPosition::nested(1, 0)),
            Some(WizardPosition::nested(0, 1))
        );
        assert_eq!(layout.next(WizardPosition::nested(1, 0)), None);
        assert_eq!(layout.step(1), Some(WizardPosition::nested(1, 0)));
        assert!(layout.is_last(WizardPosition::nested(1, 0)));
        assert!(!layout.contains(WizardPosition::flat(0)));
        assert_eq!(layout.progress_percent(WizardPosition::nested(0, 1)), 50);
    }

    #[test]
    fn empty_factors_keep_their_step_index() {
        let factors = vec![
            RawMainFactor {
                name: "Technical".into(),
                weight: 50.0,
                sub_factors: vec![],
            },
            RawMainFactor {
                name: "Governance".into(),
                weight: 50.0,
                sub_factors: vec![
                    RawSubFactor {
                        name: "Policy".into(),
                        weight: 25.0,
                        questions: vec![],
                    },
                    RawSubFactor {
                        name: "Training".into(),
                        weight: 25.0,
                        questions: vec![RawQuestion {
                            question_type: Some("SA".into()),
                            ..raw(1, 10.0, None)
                        }],
                    },
                ],
            },
        ];
        let layout = SectionGrouper::nest(&factors);
        assert_eq!(layout.step_count(), 2);
        assert_eq!(layout.step(0), None);
        assert_eq!(layout.step(1), Some(WizardPosition::nested(1, 0)));
        assert_eq!(
            layout.positions(),
            vec![WizardPosition::nested(1, 0), WizardPosition::nested(1, 1)]
        );
        assert!(layout.section_at(WizardPosition::nested(1, 0)).is_some_and(Section::is_empty));
    }

    proptest! {
        #[test]
        fn grouping_is_deterministic(
            items in proptest::collection::vec((0.0f64..100.0, proptest::option::of(0u8..4)), 0..40)
        ) {
            let raws: Vec<RawQuestion> = items
                .iter()
                .enumerate()
                .map(|(i, (w, s))| raw(i as i64, *w, s.map(|n| ["A", "B", "C", "D"][n as usize])))
                .collect();
            let first = SectionGrouper::group_raw(&raws, Some(QuestionType::ShortAnswer));
            let second = SectionGrouper::group_raw(&raws, Some(QuestionType::ShortAnswer));
            prop_assert_eq!(&first, &second);

            // every question lands in exactly one section
            let total: usize = first.sections().iter().map(|s| s.len()).sum();
            prop_assert_eq!(total, raws.len());
        }

        #[test]
        fn tiers_partition_the_weight_range(w in 0.0f64..100.0) {
            let tier = weight_tier(w);
            let expected = if w >= 20.0 {
                CRITICAL_FACTORS
            } else if w >= 10.0 {
                IMPORTANT_FACTORS
            } else {
                STANDARD_FACTORS
            };
            prop_assert_eq!(tier, expected);
        }
    }
}
