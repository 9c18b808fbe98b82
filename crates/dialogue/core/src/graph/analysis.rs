//! Design-time reachability analysis.
//!
//! Computes a relaxed fixpoint over a character's graph: concepts are never
//! lost and trigger uniqueness is ignored, so anything outside the fixpoint
//! can never be reached by any session. Findings are warnings for authors,
//! never runtime errors.

use std::collections::BTreeSet;

use super::{CharacterId, ConceptId, ContextDef, ContextId, GraphError, GraphModel};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphWarning {
    #[error("{character}: context '{context}' has no path from the start context")]
    Unreachable { character: String, context: String },

    #[error("{character}: context '{context}' is connected but its lock can never be opened")]
    NeverUnlockable { character: String, context: String },

    #[error("{character}: goal context '{goal}' can never be visited")]
    GoalUnreachable { character: String, goal: String },

    #[error("{character}: trigger '{trigger}' can never fire")]
    UnusedTrigger { character: String, trigger: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachabilityReport {
    pub contexts: BTreeSet<ContextId>,
    pub concepts: BTreeSet<ConceptId>,
    pub warnings: Vec<GraphWarning>,
}

impl ReachabilityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn opens(ctx: &ContextDef, concepts: &BTreeSet<ConceptId>) -> bool {
    if !ctx.is_locked {
        return true;
    }
    let single = ctx
        .required_concept
        .is_some_and(|concept| concepts.contains(&concept));
    let combo = ctx
        .required_combo
        .is_some_and(|(a, b)| concepts.contains(&a) && concepts.contains(&b));
    single || combo
}

pub fn analyze(graph: &GraphModel, character: CharacterId) -> Result<ReachabilityReport, GraphError> {
    let def = graph.require_character(character)?;

    let mut contexts = BTreeSet::from([def.start]);
    let mut concepts = BTreeSet::new();

    loop {
        let before = (contexts.len(), concepts.len());

        for id in contexts.clone() {
            let ctx = graph.require_context(id)?;
            concepts.extend(ctx.provides_concept);

            for trigger in graph.triggers_in(id) {
                if trigger.requires.is_none_or(|c| concepts.contains(&c)) {
                    concepts.extend(trigger.yields.iter().copied());
                }
            }

            for &target in &ctx.connections {
                if opens(graph.require_context(target)?, &concepts) {
                    contexts.insert(target);
                }
            }
        }

        if (contexts.len(), concepts.len()) == before {
            break;
        }
    }

    let mut warnings = Vec::new();
    let connected: BTreeSet<ContextId> = contexts
        .iter()
        .filter_map(|id| graph.context(*id))
        .flat_map(|ctx| ctx.connections.iter().copied())
        .collect();

    for &id in &def.contexts {
        if contexts.contains(&id) {
            continue;
        }
        let context = graph.require_context(id)?.name.clone();
        let character = def.name.clone();
        warnings.push(if connected.contains(&id) {
            GraphWarning::NeverUnlockable { character, context }
        } else {
            GraphWarning::Unreachable { character, context }
        });
    }

    if !contexts.contains(&def.goal) {
        warnings.push(GraphWarning::GoalUnreachable {
            character: def.name.clone(),
            goal: graph.require_context(def.goal)?.name.clone(),
        });
    }

    for &id in &def.triggers {
        let trigger = graph.require_trigger(id)?;
        let fires = contexts.contains(&trigger.context)
            && trigger.requires.is_none_or(|c| concepts.contains(&c));
        if !fires {
            warnings.push(GraphWarning::UnusedTrigger {
                character: def.name.clone(),
                trigger: trigger.name.clone(),
            });
        }
    }

    for warning in &warnings {
        tracing::warn!(%warning, "dead content");
    }

    Ok(ReachabilityReport {
        contexts,
        concepts,
        warnings,
    })
}
