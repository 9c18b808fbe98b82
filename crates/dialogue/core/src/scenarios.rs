//! Cross-module behavior of the validator and the engine on the tavern world.

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::engine::{TransitionEngine, TransitionError, apply};
use crate::fixtures;
use crate::graph::{GraphModel, TriggerId};
use crate::moves::{
    ActivateTrigger, ApplyComboConcept, ApplyConcept, Move, PerformBehavior, ShiftContext,
    SystemAction, valid_moves,
};
use crate::state::SessionState;

fn ctx(graph: &GraphModel, name: &str) -> crate::graph::ContextId {
    graph.context_id(name).unwrap()
}

#[test]
fn neutral_talk_opens_with_the_quest_concept() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let intro = ctx(&graph, "ctx_tavern_intro");
    let talk = ctx(&graph, "ctx_neutral_talk");
    assert!(state.holds(graph.concept_id("cpt_quest_none").unwrap()));

    let unlock: Move = ApplyConcept::new(intro, talk).into();
    assert!(valid_moves(&graph, &state).contains(&unlock));
    let state = apply(&graph, &state, &unlock).unwrap();

    let shift: Move = ShiftContext::new(intro, talk).into();
    assert!(valid_moves(&graph, &state).contains(&shift));
    let state = apply(&graph, &state, &shift).unwrap();

    assert_eq!(state.context, talk);
    assert!(state.visited.contains(&talk));
}

#[test]
fn combo_appears_once_both_concepts_are_held() {
    let graph = fixtures::tavern();
    let engine = TransitionEngine::new(&graph);
    let talk = ctx(&graph, "ctx_neutral_talk");
    let entry = ctx(&graph, "ctx_shadow_entry");
    let combo: Move = ApplyComboConcept::new(talk, entry).into();

    let state = fixtures::at_neutral_talk(&graph);
    let rumor = ActivateTrigger::new(graph.trigger_id("trig_hear_rumor").unwrap());
    let state = engine.apply(&state, &rumor.into()).unwrap().state;
    assert!(state.holds(graph.concept_id("cpt_shadow_rumor").unwrap()));
    assert!(!valid_moves(&graph, &state).contains(&combo));

    let coin = ActivateTrigger::new(graph.trigger_id("trig_find_coin").unwrap());
    let state = engine.apply(&state, &coin.into()).unwrap().state;
    assert!(valid_moves(&graph, &state).contains(&combo));

    let opened = engine.apply(&state, &combo).unwrap();
    assert_eq!(opened.delta.unlocked, vec![entry]);
    assert!(!opened.state.is_locked(&graph, entry));
}

#[test]
fn combo_replay_after_unlock_is_rejected() {
    let graph = fixtures::tavern();
    let talk = ctx(&graph, "ctx_neutral_talk");
    let entry = ctx(&graph, "ctx_shadow_entry");
    let mut state = fixtures::at_neutral_talk(&graph);
    state.concepts.insert(graph.concept_id("cpt_shadow_rumor").unwrap());
    state.concepts.insert(graph.concept_id("cpt_shadow_token").unwrap());

    let combo: Move = ApplyComboConcept::new(talk, entry).into();
    let opened = apply(&graph, &state, &combo).unwrap();

    assert!(!valid_moves(&graph, &opened).contains(&combo));
    let err = apply(&graph, &opened, &combo).unwrap_err();
    assert!(err.is_invalid_move());
    assert_eq!(opened.unlocked.iter().filter(|id| **id == entry).count(), 1);
}

#[test]
fn mood_switches_the_available_behavior() {
    let graph = fixtures::tavern();
    let engine = TransitionEngine::new(&graph);
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let stone = graph.item_id("item_focus_stone").unwrap();
    let glare: Move =
        PerformBehavior::new(graph.rule_id("rule_glare").unwrap(), Some(stone)).into();
    let laugh: Move = PerformBehavior::new(graph.rule_id("rule_laugh").unwrap(), None).into();

    let angry = engine
        .apply_system(&state, &SystemAction::set_mood(graph.mood_id("angry").unwrap()))
        .unwrap()
        .state;
    let moves = valid_moves(&graph, &angry);
    assert!(moves.contains(&glare));
    assert!(!moves.contains(&laugh));

    let joyful = engine
        .apply_system(&angry, &SystemAction::set_mood(graph.mood_id("joyful").unwrap()))
        .unwrap()
        .state;
    let moves = valid_moves(&graph, &joyful);
    assert!(!moves.contains(&glare));
    assert!(moves.contains(&laugh));

    let fired = engine.apply(&joyful, &laugh).unwrap();
    assert_eq!(fired.event, graph.rule_id("rule_laugh").ok());
    assert_eq!(fired.state.context, joyful.context);
}

#[test]
fn transitions_are_deterministic() {
    let graph = fixtures::tavern();
    let state = fixtures::at_neutral_talk(&graph);
    for candidate in valid_moves(&graph, &state) {
        let first = apply(&graph, &state.clone(), &candidate).unwrap();
        let second = apply(&graph, &state.clone(), &candidate).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn repeatable_triggers_stay_legal() {
    let graph = fixtures::tavern();
    let intro = ctx(&graph, "ctx_tavern_intro");
    let counter = ctx(&graph, "ctx_bar_counter");
    let start = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let mut state = apply(&graph, &start, &ShiftContext::new(intro, counter).into()).unwrap();

    let drink: Move = ActivateTrigger::new(graph.trigger_id("trig_order_drink").unwrap()).into();
    for _ in 0..3 {
        assert!(valid_moves(&graph, &state).contains(&drink));
        state = apply(&graph, &state, &drink).unwrap();
    }
    assert!(state.exhausted.is_empty());
}

#[test]
fn seven_moves_reach_the_den() {
    let graph = fixtures::tavern();
    let engine = TransitionEngine::new(&graph);
    let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let intro = ctx(&graph, "ctx_tavern_intro");
    let talk = ctx(&graph, "ctx_neutral_talk");
    let entry = ctx(&graph, "ctx_shadow_entry");
    let den = ctx(&graph, "ctx_shadow_den");

    let route: [Move; 7] = [
        ApplyConcept::new(intro, talk).into(),
        ShiftContext::new(intro, talk).into(),
        ActivateTrigger::new(graph.trigger_id("trig_hear_rumor").unwrap()).into(),
        ActivateTrigger::new(graph.trigger_id("trig_find_coin").unwrap()).into(),
        ApplyComboConcept::new(talk, entry).into(),
        ShiftContext::new(talk, entry).into(),
        ShiftContext::new(entry, den).into(),
    ];
    for step in &route {
        state = engine.apply(&state, step).unwrap().state;
    }

    assert_eq!(state.context, den);
    assert_eq!(graph.mood(state.mood).unwrap().name, "angry");
    assert_eq!(state.nonce, 7);
}

#[test]
fn invalid_moves_never_mutate() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let den = ctx(&graph, "ctx_shadow_den");
    let entry = ctx(&graph, "ctx_shadow_entry");

    let result = apply(&graph, &state, &ShiftContext::new(entry, den).into());
    assert!(matches!(result, Err(TransitionError::InvalidMove { .. })));
    assert_eq!(state.nonce, 0);
}

proptest! {
    #[test]
    fn random_walks_keep_session_invariants(
        choices in proptest::collection::vec((any::<u16>(), 0_u8..8), 0..40)
    ) {
        let graph = fixtures::tavern();
        let engine = TransitionEngine::new(&graph);
        let moods: Vec<_> = graph.moods().map(|def| def.id).collect();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let mut spent: BTreeSet<TriggerId> = BTreeSet::new();

        for (pick, mood) in choices {
            // Occasionally let the embedding application change the mood.
            if let Some(&next) = moods.get(usize::from(mood)) {
                state = engine.apply_system(&state, &SystemAction::set_mood(next)).unwrap().state;
            }

            let moves = valid_moves(&graph, &state);
            for candidate in &moves {
                if let Move::ActivateTrigger(trigger) = candidate {
                    prop_assert!(!spent.contains(&trigger.trigger));
                }
            }
            if moves.is_empty() {
                break;
            }

            let candidate = moves[usize::from(pick) % moves.len()];
            let first = engine.apply(&state, &candidate).unwrap();
            let second = engine.apply(&state, &candidate).unwrap();
            prop_assert_eq!(&first, &second);

            prop_assert!(first.state.concepts.is_superset(&state.concepts));
            prop_assert!(first.state.visited.contains(&first.state.context));

            if let Move::ActivateTrigger(trigger) = candidate
                && graph.trigger(trigger.trigger).is_some_and(|def| def.is_unique)
            {
                spent.insert(trigger.trigger);
            }
            state = first.state;
        }
    }
}
