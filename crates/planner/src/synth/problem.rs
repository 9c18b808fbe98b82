//! The `narrative-journey` problem: objects, initial facts and goal for one
//! session snapshot.

use std::collections::HashSet;

use dialogue_core::{
    CharacterDef, GraphError, GraphModel, ItemCategory, ObjectKind, Possession, SessionState,
};

use crate::pddl::{Domain, Fact, Formula, Problem, Term, Typed};

use super::{Goal, SynthesisError};

pub const PROBLEM_NAME: &str = "narrative-journey";

pub(super) struct ProblemInput<'a> {
    pub graph: &'a GraphModel,
    pub character: &'a CharacterDef,
    pub state: &'a SessionState,
    pub agent: &'a str,
    pub domain: &'a Domain,
}

pub(super) fn build(input: &ProblemInput<'_>, goal: &Goal) -> Result<Problem, SynthesisError> {
    Ok(Problem {
        name: PROBLEM_NAME.to_owned(),
        domain: input.domain.name.clone(),
        objects: objects(input)?,
        init: init(input)?,
        goal: goal_formula(input, goal)?,
    })
}

fn objects(input: &ProblemInput<'_>) -> Result<Vec<Typed>, GraphError> {
    let ProblemInput {
        graph, character, ..
    } = *input;
    let constants: HashSet<&str> = input.domain.constants.iter().map(|c| c.name.as_str()).collect();

    let mut objects = vec![Typed::new(input.agent, "agent")];
    for id in &character.contexts {
        objects.push(Typed::new(graph.require_context(*id)?.name.as_str(), "context"));
    }
    objects.extend(graph.concepts().map(|def| Typed::new(def.name.as_str(), "concept")));
    for id in &character.triggers {
        objects.push(Typed::new(graph.require_trigger(*id)?.name.as_str(), "trigger"));
    }
    objects.extend(graph.items().map(|def| Typed::new(def.name.as_str(), "item")));

    let undeclared = |name: &&str| !constants.contains(name);
    objects.extend(
        graph
            .tags()
            .map(|def| def.name.as_str())
            .filter(undeclared)
            .map(|name| Typed::new(name, "tag")),
    );
    objects.extend(
        graph
            .moods()
            .map(|def| def.name.as_str())
            .filter(undeclared)
            .map(|name| Typed::new(name, "mood")),
    );
    objects.extend(
        graph
            .character_rules(character.id)
            .map(|rule| rule.name.as_str())
            .filter(undeclared)
            .map(|name| Typed::new(name, "behavior")),
    );
    Ok(objects)
}

fn init(input: &ProblemInput<'_>) -> Result<Vec<Fact>, GraphError> {
    let ProblemInput {
        graph,
        character,
        state,
        agent,
        ..
    } = *input;
    let mut facts = Vec::new();

    // Static structure of the character's graph.
    for id in &character.contexts {
        let context = graph.require_context(*id)?;
        let name = context.name.as_str();
        for target in &context.connections {
            facts.push(Fact::new("connected", [name, graph.require_context(*target)?.name.as_str()]));
        }
        if state.is_locked(graph, context.id) {
            facts.push(Fact::new("locked", [name]));
        }
        if let Some(concept) = context.required_concept {
            facts.push(Fact::new("requires-concept", [name, graph.require_concept(concept)?.name.as_str()]));
        }
        if let Some((first, second)) = context.required_combo {
            facts.push(Fact::new(
                "requires-combo",
                [
                    name,
                    graph.require_concept(first)?.name.as_str(),
                    graph.require_concept(second)?.name.as_str(),
                ],
            ));
        }
        if let Some(concept) = context.provides_concept {
            facts.push(Fact::new("provides-concept", [name, graph.require_concept(concept)?.name.as_str()]));
        }
        if let Some(mood) = context.induces_mood {
            facts.push(Fact::new("induces-mood", [name, graph.require_mood(mood)?.name.as_str()]));
            facts.push(Fact::new("alters-mood", [name]));
        }
    }

    for id in &character.triggers {
        let trigger = graph.require_trigger(*id)?;
        let name = trigger.name.as_str();
        facts.push(Fact::new("in-context", [name, graph.require_context(trigger.context)?.name.as_str()]));
        if let Some(concept) = trigger.requires {
            facts.push(Fact::new("trigger-requires", [name, graph.require_concept(concept)?.name.as_str()]));
        }
        for concept in &trigger.yields {
            facts.push(Fact::new("trigger-yields", [name, graph.require_concept(*concept)?.name.as_str()]));
        }
        for item in &trigger.gives {
            facts.push(Fact::new("trigger-gives", [name, graph.require_item(*item)?.name.as_str()]));
        }
        if trigger.is_unique {
            facts.push(Fact::new("unique-trigger", [name]));
        }
    }

    for item in graph.items() {
        if item.category == ItemCategory::Wearable {
            facts.push(Fact::new("wearable", [item.name.as_str()]));
        }
        for tag in &item.tags {
            facts.push(Fact::new("has-tag", [item.name.as_str(), graph.require_tag(*tag)?.name.as_str()]));
        }
    }

    // Session snapshot.
    facts.push(Fact::new(
        "active-context",
        [agent, graph.require_context(state.context)?.name.as_str()],
    ));
    for concept in &state.concepts {
        facts.push(Fact::new("has-concept", [agent, graph.require_concept(*concept)?.name.as_str()]));
    }
    for context in &state.visited {
        facts.push(Fact::new("visited", [graph.require_context(*context)?.name.as_str()]));
    }
    for trigger in &state.exhausted {
        facts.push(Fact::new("exhausted", [graph.require_trigger(*trigger)?.name.as_str()]));
    }
    facts.push(Fact::new("current-mood", [agent, graph.require_mood(state.mood)?.name.as_str()]));
    for (item, possession) in &state.inventory {
        let name = graph.require_item(*item)?.name.as_str();
        let slot = match possession {
            Possession::Held => "holding",
            Possession::Worn => "wearing",
        };
        facts.push(Fact::new(slot, [agent, name]));
        facts.push(Fact::new("carrying", [agent, name]));
    }
    for rule in &state.fired {
        facts.push(Fact::new("behavior-fired", [graph.require_rule(*rule)?.name.as_str()]));
    }

    facts.sort();
    facts.dedup();
    Ok(facts)
}

fn goal_formula(input: &ProblemInput<'_>, goal: &Goal) -> Result<Formula, SynthesisError> {
    let ProblemInput {
        graph, character, ..
    } = *input;
    let foreign = |kind: ObjectKind, name: &str| SynthesisError::ForeignObject {
        kind,
        name: name.to_owned(),
        character: character.name.clone(),
    };

    Ok(match goal {
        Goal::TerminalContext => Formula::atom(
            "visited",
            [Term::constant(graph.require_context(character.goal)?.name.as_str())],
        ),
        Goal::Visited(id) => {
            let context = graph.require_context(*id)?;
            if context.character != character.id {
                return Err(foreign(ObjectKind::Context, &context.name));
            }
            Formula::atom("visited", [Term::constant(context.name.as_str())])
        }
        Goal::HoldsConcept(id) => Formula::atom(
            "has-concept",
            [
                Term::constant(input.agent),
                Term::constant(graph.require_concept(*id)?.name.as_str()),
            ],
        ),
        Goal::Fired(id) => {
            let rule = graph.require_rule(*id)?;
            if rule.character != character.id {
                return Err(foreign(ObjectKind::Rule, &rule.name));
            }
            Formula::atom("behavior-fired", [Term::constant(rule.name.as_str())])
        }
        Goal::All(goals) => Formula::And(
            goals
                .iter()
                .map(|goal| goal_formula(input, goal))
                .collect::<Result<_, _>>()?,
        ),
    })
}
