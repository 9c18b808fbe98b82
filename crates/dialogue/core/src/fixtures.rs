//! Reference worlds shared by tests across the workspace.
//!
//! The tavern follows one barkeep through a small mental-state graph:
//!
//! ```text
//! ctx_tavern_intro <-> ctx_bar_counter
//!        |
//!        v  (locked: cpt_quest_none)
//! ctx_neutral_talk -> ctx_shadow_entry -> ctx_shadow_den
//!                     (locked: cpt_shadow_rumor + cpt_shadow_token)
//! ```
//!
//! The shortest route from the start to the goal takes seven moves.

use crate::engine::TransitionEngine;
use crate::graph::{
    CharacterId, CharacterSpec, ConnectionSpec, ContextSpec, EquipmentSpec, GraphBuilder,
    GraphModel, ItemCategory, ItemCondition, ItemSpec, RuleSpec, TriggerSpec,
};
use crate::moves::{ApplyConcept, ShiftContext};
use crate::state::SessionState;

pub const BARKEEP: &str = "barkeep";
pub const WARDEN: &str = "warden";

pub fn tavern_builder() -> GraphBuilder {
    let mut builder = GraphBuilder::new();
    builder
        .concepts([
            "cpt_quest_none",
            "cpt_local_gossip",
            "cpt_shadow_rumor",
            "cpt_shadow_token",
            "cpt_trusted",
        ])
        .item(ItemSpec::new("item_focus_stone", ItemCategory::Holdable).tagged("focus"))
        .item(ItemSpec::new("item_grey_cloak", ItemCategory::Wearable).tagged("stealth"))
        .item(
            ItemSpec::new("item_shadow_coin", ItemCategory::Holdable)
                .tagged("shadow")
                .tagged("currency"),
        )
        .character(barkeep_spec());
    builder
}

pub fn barkeep_spec() -> CharacterSpec {
    CharacterSpec {
        id: BARKEEP.into(),
        goal: "ctx_shadow_den".into(),
        equipment: vec![
            EquipmentSpec {
                item: "item_focus_stone".into(),
                possession: None,
            },
            EquipmentSpec {
                item: "item_grey_cloak".into(),
                possession: None,
            },
        ],
        contexts: vec![
            ContextSpec::new("ctx_tavern_intro")
                .start()
                .provides("cpt_quest_none")
                .connect(ConnectionSpec::to("ctx_neutral_talk"))
                .connect(ConnectionSpec::both_ways("ctx_bar_counter")),
            ContextSpec::new("ctx_bar_counter")
                .provides("cpt_local_gossip")
                .induces("joyful"),
            ContextSpec::new("ctx_neutral_talk")
                .locked_by("cpt_quest_none")
                .connect(ConnectionSpec::to("ctx_tavern_intro"))
                .connect(ConnectionSpec::to("ctx_shadow_entry")),
            ContextSpec::new("ctx_shadow_entry")
                .locked_by_combo("cpt_shadow_rumor", "cpt_shadow_token")
                .connect(ConnectionSpec::to("ctx_shadow_den")),
            ContextSpec::new("ctx_shadow_den").induces("angry"),
        ],
        triggers: vec![
            TriggerSpec::new("trig_hear_rumor", "ctx_neutral_talk")
                .yields("cpt_shadow_rumor")
                .unique(),
            TriggerSpec::new("trig_find_coin", "ctx_neutral_talk")
                .yields("cpt_shadow_token")
                .gives("item_shadow_coin")
                .unique(),
            TriggerSpec::new("trig_order_drink", "ctx_bar_counter"),
            TriggerSpec::new("trig_share_secret", "ctx_bar_counter")
                .requires("cpt_shadow_rumor")
                .yields("cpt_trusted")
                .unique(),
        ],
        behavior_rules: vec![
            RuleSpec::new("rule_glare", "angry", ItemCondition::Holding("focus".into()))
                .template("{npc} grips the focus stone and glares."),
            RuleSpec::new("rule_laugh", "joyful", ItemCondition::Unrestricted)
                .template("{npc} laughs and slaps the counter."),
            RuleSpec::new("rule_hush", "neutral", ItemCondition::Wearing("stealth".into()))
                .template("{npc} pulls the grey hood lower."),
            RuleSpec::new("rule_shrug", "wary", ItemCondition::EmptyHanded)
                .template("{npc} shrugs, empty palms up."),
        ],
        ..CharacterSpec::default()
    }
}

/// Builds the tavern world.
pub fn tavern() -> GraphModel {
    tavern_builder().build().expect("tavern fixture is well formed")
}

pub fn barkeep(graph: &GraphModel) -> CharacterId {
    graph.character_id(BARKEEP).expect("tavern defines the barkeep")
}

/// Barkeep session standing in `ctx_neutral_talk`, reached through the engine
/// by unlocking it and shifting in. Holds `cpt_quest_none` only.
pub fn at_neutral_talk(graph: &GraphModel) -> SessionState {
    let start = SessionState::new(graph, barkeep(graph)).expect("barkeep session");
    let intro = graph.context_id("ctx_tavern_intro").expect("intro context");
    let talk = graph.context_id("ctx_neutral_talk").expect("talk context");

    let engine = TransitionEngine::new(graph);
    let unlocked = engine
        .apply(&start, &ApplyConcept::new(intro, talk).into())
        .expect("unlock neutral talk");
    engine
        .apply(&unlocked.state, &ShiftContext::new(intro, talk).into())
        .expect("enter neutral talk")
        .state
}

/// A world whose goal sits behind a lock nothing can open.
pub fn sealed_vault() -> GraphModel {
    GraphBuilder::new()
        .concepts(["cpt_dust", "cpt_seal"])
        .character(CharacterSpec {
            id: WARDEN.into(),
            goal: "vault_core".into(),
            contexts: vec![
                ContextSpec::new("vault_hall")
                    .start()
                    .connect(ConnectionSpec::both_ways("vault_stairs"))
                    .connect(ConnectionSpec::to("vault_core")),
                ContextSpec::new("vault_stairs"),
                ContextSpec::new("vault_core").locked_by("cpt_seal"),
            ],
            triggers: vec![TriggerSpec::new("trig_sweep", "vault_stairs").yields("cpt_dust")],
            ..CharacterSpec::default()
        })
        .build()
        .expect("vault fixture is well formed")
}

pub fn warden(graph: &GraphModel) -> CharacterId {
    graph.character_id(WARDEN).expect("vault defines the warden")
}
