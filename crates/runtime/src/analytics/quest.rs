//! Quest difficulty from the length of the plan that completes it.

use serde::{Deserialize, Serialize};

use crate::resolver::PlanOutcome;

/// Plans shorter than this are easy.
const EASY_BELOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestDifficulty {
    /// Already complete.
    None,
    Easy,
    Hard,
    Impossible,
}

impl QuestDifficulty {
    /// Grades a solver outcome. A timeout grades nothing.
    pub fn assess(outcome: &PlanOutcome) -> Option<Self> {
        match outcome {
            PlanOutcome::Found(plan) => Some(match plan.len() {
                0 => Self::None,
                len if len < EASY_BELOW => Self::Easy,
                _ => Self::Hard,
            }),
            PlanOutcome::Unsolvable => Some(Self::Impossible),
            PlanOutcome::Timeout => None,
        }
    }

    /// Concept the dialogue content uses to gate on this grade.
    pub fn concept(self) -> &'static str {
        match self {
            Self::None => "cpt_quest_none",
            Self::Easy => "cpt_quest_easy",
            Self::Hard => "cpt_quest_hard",
            Self::Impossible => "cpt_quest_impossible",
        }
    }
}
