//! Player archetype from the mix of moves in a trace.

use dialogue_core::MoveKind;
use planner::PlanStep;
use serde::{Deserialize, Serialize};

/// Share of moves one category needs before it defines the player.
const DOMINANCE_PERCENT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Mostly context shifts.
    Explorer,
    /// Mostly learning and applying concepts.
    Investigator,
    /// Mostly trigger activations.
    Collector,
    /// Mostly mood and item behaviors.
    Performer,
    /// No category dominates.
    Wanderer,
}

/// Move counts per archetype category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMix {
    pub shifts: usize,
    pub insights: usize,
    pub triggers: usize,
    pub behaviors: usize,
}

impl MoveMix {
    pub fn record(&mut self, kind: MoveKind) {
        match kind {
            MoveKind::ShiftContext => self.shifts += 1,
            MoveKind::LearnConcept | MoveKind::ApplyConcept | MoveKind::ApplyComboConcept => {
                self.insights += 1
            }
            MoveKind::ActivateTrigger => self.triggers += 1,
            MoveKind::Behavior => self.behaviors += 1,
        }
    }

    /// Counts the steps of `trace`. Steps that are not dialogue moves are
    /// ignored.
    pub fn from_trace<'a>(trace: impl IntoIterator<Item = &'a PlanStep>) -> Self {
        let mut mix = Self::default();
        for kind in trace.into_iter().filter_map(PlanStep::kind) {
            mix.record(kind);
        }
        mix
    }

    pub fn total(&self) -> usize {
        self.shifts + self.insights + self.triggers + self.behaviors
    }

    /// The strictly largest category if it holds more than the dominance
    /// share, [`Archetype::Wanderer`] otherwise.
    pub fn archetype(&self) -> Archetype {
        let total = self.total();
        let ranked = [
            (Archetype::Explorer, self.shifts),
            (Archetype::Investigator, self.insights),
            (Archetype::Collector, self.triggers),
            (Archetype::Performer, self.behaviors),
        ];
        let top = ranked.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let mut leaders = ranked.iter().filter(|(_, count)| *count == top);

        match (leaders.next(), leaders.next()) {
            (Some((archetype, count)), None) if count * 100 > total * DOMINANCE_PERCENT => {
                *archetype
            }
            _ => Archetype::Wanderer,
        }
    }
}
