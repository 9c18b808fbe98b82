//! The `narrative-flow` domain: static navigation actions plus one compiled
//! action per behavior rule.

use std::collections::BTreeSet;

use dialogue_core::{BehaviorRule, GraphError, GraphModel, ItemCondition, MoodId, TagId};

use crate::pddl::{
    ActionSchema, Atom, Domain, Effect, Formula, PredicateDef, Requirement, Term, Typed,
};

pub const DOMAIN_NAME: &str = "narrative-flow";

/// Prefix of every compiled behavior action.
pub const BEHAVIOR_PREFIX: &str = "do-";

pub const TYPES: [&str; 8] = [
    "context", "concept", "trigger", "agent", "item", "tag", "mood", "behavior",
];

pub fn behavior_action_name(rule: &str) -> String {
    format!("{BEHAVIOR_PREFIX}{rule}")
}

// Schema helpers. Arguments written `?x` are variables, anything else is a
// constant; only used for the fixed schemas below, never for content names.
fn term(arg: &str) -> Term {
    match arg.strip_prefix('?') {
        Some(var) => Term::var(var),
        None => Term::constant(arg),
    }
}

fn atom(predicate: &str, args: &[&str]) -> Atom {
    Atom::new(predicate, args.iter().copied().map(term))
}

fn holds(predicate: &str, args: &[&str]) -> Formula {
    Formula::Atom(atom(predicate, args))
}

fn lacks(predicate: &str, args: &[&str]) -> Formula {
    Formula::not(holds(predicate, args))
}

fn add(predicate: &str, args: &[&str]) -> Effect {
    Effect::Add(atom(predicate, args))
}

fn del(predicate: &str, args: &[&str]) -> Effect {
    Effect::Del(atom(predicate, args))
}

fn params(spec: &[(&str, &str)]) -> Vec<Typed> {
    spec.iter().map(|(name, ty)| Typed::new(*name, *ty)).collect()
}

fn predicate(name: &str, spec: &[(&str, &str)]) -> PredicateDef {
    PredicateDef {
        name: name.to_owned(),
        params: params(spec),
    }
}

fn predicates() -> Vec<PredicateDef> {
    vec![
        predicate("connected", &[("from", "context"), ("to", "context")]),
        predicate("locked", &[("c", "context")]),
        predicate("requires-concept", &[("c", "context"), ("k", "concept")]),
        predicate(
            "requires-combo",
            &[("c", "context"), ("k1", "concept"), ("k2", "concept")],
        ),
        predicate("provides-concept", &[("c", "context"), ("k", "concept")]),
        predicate("induces-mood", &[("c", "context"), ("m", "mood")]),
        predicate("alters-mood", &[("c", "context")]),
        predicate("in-context", &[("t", "trigger"), ("c", "context")]),
        predicate("trigger-requires", &[("t", "trigger"), ("k", "concept")]),
        predicate("trigger-yields", &[("t", "trigger"), ("k", "concept")]),
        predicate("trigger-gives", &[("t", "trigger"), ("i", "item")]),
        predicate("unique-trigger", &[("t", "trigger")]),
        predicate("wearable", &[("i", "item")]),
        predicate("active-context", &[("a", "agent"), ("c", "context")]),
        predicate("has-concept", &[("a", "agent"), ("k", "concept")]),
        predicate("visited", &[("c", "context")]),
        predicate("exhausted", &[("t", "trigger")]),
        predicate("current-mood", &[("a", "agent"), ("m", "mood")]),
        predicate("wearing", &[("a", "agent"), ("i", "item")]),
        predicate("holding", &[("a", "agent"), ("i", "item")]),
        predicate("carrying", &[("a", "agent"), ("i", "item")]),
        predicate("has-tag", &[("i", "item"), ("g", "tag")]),
        predicate("behavior-fired", &[("b", "behavior")]),
    ]
}

fn shift_context() -> ActionSchema {
    ActionSchema {
        name: "shift-context".into(),
        params: params(&[("a", "agent"), ("from", "context"), ("to", "context")]),
        precondition: Formula::And(vec![
            holds("active-context", &["?a", "?from"]),
            holds("connected", &["?from", "?to"]),
            lacks("locked", &["?to"]),
        ]),
        effect: Effect::And(vec![
            del("active-context", &["?a", "?from"]),
            add("active-context", &["?a", "?to"]),
            add("visited", &["?to"]),
            Effect::forall(
                params(&[("k", "concept")]),
                Effect::when(
                    holds("provides-concept", &["?to", "?k"]),
                    add("has-concept", &["?a", "?k"]),
                ),
            ),
            // Deletes land before adds, so an induced mood replaces the old one.
            Effect::forall(
                params(&[("m", "mood")]),
                Effect::when(
                    Formula::And(vec![
                        holds("alters-mood", &["?to"]),
                        holds("current-mood", &["?a", "?m"]),
                    ]),
                    del("current-mood", &["?a", "?m"]),
                ),
            ),
            Effect::forall(
                params(&[("m", "mood")]),
                Effect::when(
                    holds("induces-mood", &["?to", "?m"]),
                    add("current-mood", &["?a", "?m"]),
                ),
            ),
        ]),
    }
}

fn learn_concept() -> ActionSchema {
    ActionSchema {
        name: "learn-concept".into(),
        params: params(&[("a", "agent"), ("c", "context"), ("k", "concept")]),
        precondition: Formula::And(vec![
            holds("active-context", &["?a", "?c"]),
            holds("provides-concept", &["?c", "?k"]),
            lacks("has-concept", &["?a", "?k"]),
        ]),
        effect: add("has-concept", &["?a", "?k"]),
    }
}

fn activate_trigger() -> ActionSchema {
    let acquire = |wearable: Formula, slot: &str| {
        Effect::forall(
            params(&[("i", "item")]),
            Effect::when(
                Formula::And(vec![
                    holds("trigger-gives", &["?t", "?i"]),
                    wearable,
                    lacks("carrying", &["?a", "?i"]),
                ]),
                Effect::And(vec![add(slot, &["?a", "?i"]), add("carrying", &["?a", "?i"])]),
            ),
        )
    };

    ActionSchema {
        name: "activate-trigger".into(),
        params: params(&[("a", "agent"), ("c", "context"), ("t", "trigger")]),
        precondition: Formula::And(vec![
            holds("active-context", &["?a", "?c"]),
            holds("in-context", &["?t", "?c"]),
            lacks("exhausted", &["?t"]),
            Formula::forall(
                params(&[("k", "concept")]),
                Formula::imply(
                    holds("trigger-requires", &["?t", "?k"]),
                    holds("has-concept", &["?a", "?k"]),
                ),
            ),
        ]),
        effect: Effect::And(vec![
            Effect::when(holds("unique-trigger", &["?t"]), add("exhausted", &["?t"])),
            Effect::forall(
                params(&[("k", "concept")]),
                Effect::when(
                    holds("trigger-yields", &["?t", "?k"]),
                    add("has-concept", &["?a", "?k"]),
                ),
            ),
            acquire(holds("wearable", &["?i"]), "wearing"),
            acquire(lacks("wearable", &["?i"]), "holding"),
        ]),
    }
}

fn apply_concept() -> ActionSchema {
    ActionSchema {
        name: "apply-concept".into(),
        params: params(&[
            ("a", "agent"),
            ("from", "context"),
            ("to", "context"),
            ("k", "concept"),
        ]),
        precondition: Formula::And(vec![
            holds("active-context", &["?a", "?from"]),
            holds("connected", &["?from", "?to"]),
            holds("locked", &["?to"]),
            holds("requires-concept", &["?to", "?k"]),
            holds("has-concept", &["?a", "?k"]),
        ]),
        effect: del("locked", &["?to"]),
    }
}

fn apply_combo_concept() -> ActionSchema {
    ActionSchema {
        name: "apply-combo-concept".into(),
        params: params(&[
            ("a", "agent"),
            ("from", "context"),
            ("to", "context"),
            ("k1", "concept"),
            ("k2", "concept"),
        ]),
        precondition: Formula::And(vec![
            holds("active-context", &["?a", "?from"]),
            holds("connected", &["?from", "?to"]),
            holds("locked", &["?to"]),
            holds("requires-combo", &["?to", "?k1", "?k2"]),
            holds("has-concept", &["?a", "?k1"]),
            holds("has-concept", &["?a", "?k2"]),
        ]),
        effect: del("locked", &["?to"]),
    }
}

/// Compiles a behavior rule into its planning action.
///
/// Mood, tag and rule names enter the schema as typed constants resolved
/// through the graph, so an unknown reference fails here rather than in
/// the rendered text.
pub fn behavior_action(graph: &GraphModel, rule: &BehaviorRule) -> Result<ActionSchema, GraphError> {
    let agent = Term::var("a");
    let item = Term::var("i");
    let mood = Term::constant(graph.require_mood(rule.mood)?.name.as_str());

    let mut precondition = vec![Formula::atom("current-mood", [agent.clone(), mood])];
    let mut schema_params = vec![Typed::new("a", "agent")];

    let tagged = |tag: &TagId| -> Result<Formula, GraphError> {
        Ok(Formula::atom(
            "has-tag",
            [item.clone(), Term::constant(graph.require_tag(*tag)?.name.as_str())],
        ))
    };
    let slot = |predicate: &str| Formula::atom(predicate, [agent.clone(), item.clone()]);

    match &rule.condition {
        ItemCondition::Unrestricted => {}
        ItemCondition::Holding(tag) => {
            schema_params.push(Typed::new("i", "item"));
            precondition.extend([slot("holding"), tagged(tag)?]);
        }
        ItemCondition::Wearing(tag) => {
            schema_params.push(Typed::new("i", "item"));
            precondition.extend([slot("wearing"), tagged(tag)?]);
        }
        ItemCondition::Carrying(tag) => {
            schema_params.push(Typed::new("i", "item"));
            precondition.extend([
                Formula::Or(vec![slot("holding"), slot("wearing")]),
                tagged(tag)?,
            ]);
        }
        ItemCondition::EmptyHanded => {
            precondition.push(Formula::forall(
                vec![Typed::new("i", "item")],
                Formula::not(slot("holding")),
            ));
        }
    }

    Ok(ActionSchema {
        name: behavior_action_name(&rule.name),
        params: schema_params,
        precondition: Formula::And(precondition),
        effect: Effect::add("behavior-fired", [Term::constant(rule.name.as_str())]),
    })
}

/// Builds the domain for a set of behavior rules, given in canonical order.
pub(super) fn build(graph: &GraphModel, rules: &[&BehaviorRule]) -> Result<Domain, GraphError> {
    let moods: BTreeSet<MoodId> = rules.iter().map(|rule| rule.mood).collect();
    let tags: BTreeSet<TagId> = rules.iter().filter_map(|rule| rule.condition.tag().copied()).collect();

    let mut constants = Vec::with_capacity(moods.len() + tags.len() + rules.len());
    for id in moods {
        constants.push(Typed::new(graph.require_mood(id)?.name.as_str(), "mood"));
    }
    for id in tags {
        constants.push(Typed::new(graph.require_tag(id)?.name.as_str(), "tag"));
    }
    constants.extend(rules.iter().map(|rule| Typed::new(rule.name.as_str(), "behavior")));

    let mut actions = vec![
        shift_context(),
        learn_concept(),
        activate_trigger(),
        apply_concept(),
        apply_combo_concept(),
    ];
    for rule in rules {
        actions.push(behavior_action(graph, rule)?);
    }

    Ok(Domain {
        name: DOMAIN_NAME.to_owned(),
        requirements: vec![
            Requirement::Strips,
            Requirement::Typing,
            Requirement::NegativePreconditions,
            Requirement::DisjunctivePreconditions,
            Requirement::UniversalPreconditions,
            Requirement::ConditionalEffects,
        ],
        types: TYPES.iter().map(|ty| (*ty).to_owned()).collect(),
        constants,
        predicates: predicates(),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_core::fixtures;

    #[test]
    fn holding_rule_binds_an_item_parameter() {
        let graph = fixtures::tavern();
        let glare = graph.rule(graph.rule_id("rule_glare").unwrap()).unwrap();
        let action = behavior_action(&graph, glare).unwrap();

        assert_eq!(action.name, "do-rule_glare");
        assert_eq!(action.params, vec![Typed::new("a", "agent"), Typed::new("i", "item")]);
        assert_eq!(
            action.precondition.to_string(),
            "(and (current-mood ?a angry) (holding ?a ?i) (has-tag ?i focus))"
        );
        assert_eq!(action.effect.to_string(), "(behavior-fired rule_glare)");
    }

    #[test]
    fn empty_handed_rule_quantifies_over_items() {
        let graph = fixtures::tavern();
        let shrug = graph.rule(graph.rule_id("rule_shrug").unwrap()).unwrap();
        let action = behavior_action(&graph, shrug).unwrap();

        assert_eq!(action.params.len(), 1);
        assert_eq!(
            action.precondition.to_string(),
            "(and (current-mood ?a wary) (forall (?i - item) (not (holding ?a ?i))))"
        );
    }

    #[test]
    fn constants_cover_rule_moods_tags_and_names() {
        let graph = fixtures::tavern();
        let rules: Vec<_> = graph.character_rules(fixtures::barkeep(&graph)).collect();
        let domain = build(&graph, &rules).unwrap();

        let names: Vec<_> = domain.constants.iter().map(|c| c.name.as_str()).collect();
        for expected in ["angry", "joyful", "wary", "focus", "stealth", "rule_laugh"] {
            assert!(names.contains(&expected), "missing constant {expected}");
        }
        assert_eq!(domain.actions.len(), 5 + rules.len());
    }
}
