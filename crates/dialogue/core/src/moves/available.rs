//! Legal-move enumeration.
//!
//! Candidates are generated from the graph around the current context and
//! filtered through each kind's `pre_validate`. No planner is involved.

use crate::graph::{GraphModel, ItemCondition, RuleId};
use crate::state::SessionState;

use super::{
    ActivateTrigger, ApplyComboConcept, ApplyConcept, LearnConcept, Move, PerformBehavior,
    ShiftContext,
};

/// Returns every legal move for `state`, using the character's own behavior rules.
///
/// Order is deterministic: shifts, concept learning, triggers, unlocks, then
/// behaviors, each in arena order. No move appears twice.
pub fn valid_moves(graph: &GraphModel, state: &SessionState) -> Vec<Move> {
    match graph.character(state.character) {
        Some(character) => valid_moves_with_rules(graph, state, &character.rules),
        None => {
            tracing::warn!(character = %state.character, "session bound to unknown character");
            Vec::new()
        }
    }
}

/// Like [`valid_moves`], restricting behavior moves to `rules`.
pub fn valid_moves_with_rules(
    graph: &GraphModel,
    state: &SessionState,
    rules: &[RuleId],
) -> Vec<Move> {
    candidate_moves(graph, state, rules)
        .into_iter()
        .filter(|candidate| candidate.pre_validate(state, graph).is_ok())
        .collect()
}

/// Returns true if `candidate` is currently legal.
pub fn is_valid(graph: &GraphModel, state: &SessionState, candidate: &Move) -> bool {
    candidate.pre_validate(state, graph).is_ok()
}

fn candidate_moves(graph: &GraphModel, state: &SessionState, rules: &[RuleId]) -> Vec<Move> {
    let Some(current) = graph.context(state.context) else {
        return Vec::new();
    };
    let mut moves = Vec::new();

    for &to in &current.connections {
        moves.push(ShiftContext::new(current.id, to).into());
    }

    if current.provides_concept.is_some() {
        moves.push(LearnConcept::new(current.id).into());
    }

    for trigger in graph.triggers_in(current.id) {
        moves.push(ActivateTrigger::new(trigger.id).into());
    }

    for &target in &current.connections {
        let Some(def) = graph.context(target) else {
            continue;
        };
        if def.required_concept.is_some() {
            moves.push(ApplyConcept::new(current.id, target).into());
        }
        if def.required_combo.is_some() {
            moves.push(ApplyComboConcept::new(current.id, target).into());
        }
    }

    for rule in rules.iter().filter_map(|id| graph.rule(*id)) {
        match rule.condition {
            ItemCondition::Unrestricted | ItemCondition::EmptyHanded => {
                moves.push(PerformBehavior::new(rule.id, None).into());
            }
            ItemCondition::Holding(_) | ItemCondition::Wearing(_) | ItemCondition::Carrying(_) => {
                for &item in state.inventory.keys() {
                    moves.push(PerformBehavior::new(rule.id, Some(item)).into());
                }
            }
        }
    }

    moves.dedup();
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::moves::MoveKind;

    #[test]
    fn start_state_moves() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let described: Vec<_> = valid_moves(&graph, &state)
            .iter()
            .map(|m| m.describe(&graph))
            .collect();

        assert_eq!(
            described,
            [
                "shift-context ctx_tavern_intro -> ctx_bar_counter",
                "apply-concept ctx_tavern_intro -> ctx_neutral_talk",
                "behavior rule_hush with item_grey_cloak",
            ]
        );
    }

    #[test]
    fn restricting_rules_hides_behaviors() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let moves = valid_moves_with_rules(&graph, &state, &[]);
        assert!(moves.iter().all(|m| m.kind() != MoveKind::Behavior));
    }

    #[test]
    fn every_listed_move_passes_validation() {
        let graph = fixtures::tavern();
        let state = fixtures::at_neutral_talk(&graph);
        for candidate in valid_moves(&graph, &state) {
            assert!(is_valid(&graph, &state, &candidate));
        }
    }
}
