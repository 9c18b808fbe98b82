use std::collections::HashMap;

use crate::config::PlannerConfig;

use super::{
    BehaviorRule, CharacterDef, CharacterId, CharacterSpec, ConceptDef, ConceptId, ContextDef,
    ContextId, GraphError, GraphModel, ItemCondition, ItemDef, ItemId, ItemSpec, MoodDef, MoodId,
    ObjectKind, ObjectRef, RuleId, TagDef, TagId, TriggerDef, TriggerId, is_valid_identifier,
};

/// Collects declarative specs and produces an immutable [`GraphModel`].
///
/// Concepts, tags and moods are shared across all characters and may be
/// declared more than once; contexts, triggers, items, rules and characters
/// must be unique. Every reference is resolved in [`GraphBuilder::build`].
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    concepts: Vec<String>,
    tags: Vec<String>,
    moods: Vec<String>,
    items: Vec<ItemSpec>,
    characters: Vec<CharacterSpec>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concept(&mut self, name: impl Into<String>) -> &mut Self {
        self.concepts.push(name.into());
        self
    }

    pub fn concepts<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn tag(&mut self, name: impl Into<String>) -> &mut Self {
        self.tags.push(name.into());
        self
    }

    pub fn mood(&mut self, name: impl Into<String>) -> &mut Self {
        self.moods.push(name.into());
        self
    }

    pub fn item(&mut self, item: ItemSpec) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn character(&mut self, character: CharacterSpec) -> &mut Self {
        self.characters.push(character);
        self
    }

    /// Resolves every spec into a graph stamped with generation 0.
    pub fn build(&self) -> Result<GraphModel, GraphError> {
        let mut graph = GraphModel {
            generation: 0,
            names: HashMap::new(),
            contexts: Vec::new(),
            concepts: Vec::new(),
            triggers: Vec::new(),
            items: Vec::new(),
            tags: Vec::new(),
            moods: Vec::new(),
            rules: Vec::new(),
            characters: Vec::new(),
        };

        for name in &self.concepts {
            intern_concept(&mut graph, name)?;
        }
        for name in &self.tags {
            intern_tag(&mut graph, name)?;
        }
        for name in &self.moods {
            intern_mood(&mut graph, name)?;
        }
        for item in &self.items {
            define_item(&mut graph, item)?;
        }

        // Declare every character-owned name first so contexts may reference
        // each other regardless of declaration order.
        let declared = self
            .characters
            .iter()
            .map(|spec| declare_character(&mut graph, spec))
            .collect::<Result<Vec<_>, _>>()?;

        for (spec, character) in self.characters.iter().zip(declared) {
            resolve_character(&mut graph, spec, character)?;
        }

        tracing::debug!(
            contexts = graph.contexts.len(),
            concepts = graph.concepts.len(),
            triggers = graph.triggers.len(),
            items = graph.items.len(),
            characters = graph.characters.len(),
            "graph model built"
        );

        Ok(graph)
    }
}

fn check_identifier(name: &str) -> Result<(), GraphError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(GraphError::InvalidIdentifier {
            name: name.to_owned(),
        })
    }
}

/// Binds a fresh name, rejecting any existing binding.
fn bind(graph: &mut GraphModel, name: &str, object: ObjectRef) -> Result<(), GraphError> {
    check_identifier(name)?;
    if let Some(existing) = graph.names.get(name) {
        return Err(if existing.kind() == object.kind() {
            GraphError::DuplicateDefinition {
                kind: object.kind(),
                name: name.to_owned(),
            }
        } else {
            GraphError::NameConflict {
                name: name.to_owned(),
                existing: existing.kind(),
                requested: object.kind(),
            }
        });
    }
    graph.names.insert(name.to_owned(), object);
    Ok(())
}

fn conflict(name: &str, existing: ObjectRef, requested: ObjectKind) -> GraphError {
    GraphError::NameConflict {
        name: name.to_owned(),
        existing: existing.kind(),
        requested,
    }
}

fn intern_concept(graph: &mut GraphModel, name: &str) -> Result<ConceptId, GraphError> {
    match graph.names.get(name) {
        Some(ObjectRef::Concept(id)) => Ok(*id),
        Some(other) => Err(conflict(name, *other, ObjectKind::Concept)),
        None => {
            let id = ConceptId::from_index(graph.concepts.len());
            bind(graph, name, ObjectRef::Concept(id))?;
            graph.concepts.push(ConceptDef {
                id,
                name: name.to_owned(),
            });
            Ok(id)
        }
    }
}

fn intern_tag(graph: &mut GraphModel, name: &str) -> Result<TagId, GraphError> {
    match graph.names.get(name) {
        Some(ObjectRef::Tag(id)) => Ok(*id),
        Some(other) => Err(conflict(name, *other, ObjectKind::Tag)),
        None => {
            let id = TagId::from_index(graph.tags.len());
            bind(graph, name, ObjectRef::Tag(id))?;
            graph.tags.push(TagDef {
                id,
                name: name.to_owned(),
            });
            Ok(id)
        }
    }
}

fn intern_mood(graph: &mut GraphModel, name: &str) -> Result<MoodId, GraphError> {
    match graph.names.get(name) {
        Some(ObjectRef::Mood(id)) => Ok(*id),
        Some(other) => Err(conflict(name, *other, ObjectKind::Mood)),
        None => {
            let id = MoodId::from_index(graph.moods.len());
            bind(graph, name, ObjectRef::Mood(id))?;
            graph.moods.push(MoodDef {
                id,
                name: name.to_owned(),
            });
            Ok(id)
        }
    }
}

fn lookup_concept(graph: &GraphModel, name: &str) -> Result<ConceptId, GraphError> {
    graph.concept_id(name)
}

fn lookup_tag(graph: &GraphModel, name: &str) -> Result<TagId, GraphError> {
    graph.tag_id(name)
}

fn define_item(graph: &mut GraphModel, spec: &ItemSpec) -> Result<ItemId, GraphError> {
    let id = ItemId::from_index(graph.items.len());
    bind(graph, &spec.id, ObjectRef::Item(id))?;

    let mut tags = spec
        .tags
        .iter()
        .map(|tag| intern_tag(graph, tag))
        .collect::<Result<Vec<_>, _>>()?;
    tags.sort_unstable();
    tags.dedup();

    graph.items.push(ItemDef {
        id,
        name: spec.id.clone(),
        category: spec.category,
        tags,
    });
    Ok(id)
}

fn declare_character(
    graph: &mut GraphModel,
    spec: &CharacterSpec,
) -> Result<CharacterId, GraphError> {
    let character = CharacterId::from_index(graph.characters.len());
    bind(graph, &spec.id, ObjectRef::Character(character))?;

    let mut contexts = Vec::with_capacity(spec.contexts.len());
    for ctx in &spec.contexts {
        let id = ContextId::from_index(graph.contexts.len());
        bind(graph, &ctx.id, ObjectRef::Context(id))?;
        graph.contexts.push(ContextDef {
            id,
            name: ctx.id.clone(),
            character,
            is_start: ctx.is_start,
            is_locked: ctx.is_locked,
            required_concept: None,
            required_combo: None,
            provides_concept: None,
            induces_mood: None,
            connections: Vec::new(),
        });
        contexts.push(id);
    }

    let start = match &spec.start {
        Some(_) => None,
        None => contexts
            .iter()
            .copied()
            .find(|id| graph.contexts[id.index()].is_start),
    };

    let mut triggers = Vec::with_capacity(spec.triggers.len());
    for trigger in &spec.triggers {
        let id = TriggerId::from_index(graph.triggers.len());
        bind(graph, &trigger.id, ObjectRef::Trigger(id))?;
        graph.triggers.push(TriggerDef {
            id,
            name: trigger.id.clone(),
            character,
            context: contexts.first().copied().unwrap_or(ContextId(0)),
            requires: None,
            yields: Vec::new(),
            gives: Vec::new(),
            is_unique: trigger.is_unique,
        });
        triggers.push(id);
    }

    let mut rules = Vec::with_capacity(spec.behavior_rules.len());
    for rule in &spec.behavior_rules {
        let id = RuleId::from_index(graph.rules.len());
        bind(graph, &rule.id, ObjectRef::Rule(id))?;
        graph.rules.push(BehaviorRule {
            id,
            name: rule.id.clone(),
            character,
            mood: MoodId(0),
            condition: ItemCondition::Unrestricted,
            template: rule.template.clone(),
        });
        rules.push(id);
    }

    let placeholder = contexts.first().copied().unwrap_or(ContextId(0));
    graph.characters.push(CharacterDef {
        id: character,
        name: spec.id.clone(),
        start: start.unwrap_or(placeholder),
        goal: placeholder,
        mood: MoodId(0),
        equipment: Vec::new(),
        contexts,
        triggers,
        rules,
    });

    if spec.start.is_none() && start.is_none() {
        return Err(GraphError::MissingStart {
            character: spec.id.clone(),
        });
    }

    Ok(character)
}

/// Resolves a context name that must belong to `character`.
fn owned_context(
    graph: &GraphModel,
    character: CharacterId,
    name: &str,
) -> Result<ContextId, GraphError> {
    let id = graph.context_id(name)?;
    if graph.contexts[id.index()].character != character {
        return Err(GraphError::ForeignContext {
            character: graph.characters[character.index()].name.clone(),
            context: name.to_owned(),
        });
    }
    Ok(id)
}

fn resolve_character(
    graph: &mut GraphModel,
    spec: &CharacterSpec,
    character: CharacterId,
) -> Result<(), GraphError> {
    let mut edges: Vec<(ContextId, ContextId)> = Vec::new();

    for ctx in &spec.contexts {
        let id = graph.context_id(&ctx.id)?;

        let required_concept = ctx
            .required_concept
            .as_deref()
            .map(|name| lookup_concept(graph, name))
            .transpose()?;
        let required_combo = match &ctx.required_combo {
            Some((first, second)) => {
                if first == second {
                    return Err(GraphError::DegenerateCombo {
                        context: ctx.id.clone(),
                        concept: first.clone(),
                    });
                }
                Some((lookup_concept(graph, first)?, lookup_concept(graph, second)?))
            }
            None => None,
        };
        let provides_concept = ctx
            .provides_concept
            .as_deref()
            .map(|name| lookup_concept(graph, name))
            .transpose()?;
        let induces_mood = ctx
            .induces_mood
            .as_deref()
            .map(|name| intern_mood(graph, name))
            .transpose()?;

        for connection in &ctx.connections {
            let target = owned_context(graph, character, &connection.to)?;
            edges.push((id, target));
            if connection.bidirectional {
                edges.push((target, id));
            }
        }

        let def = &mut graph.contexts[id.index()];
        def.required_concept = required_concept;
        def.required_combo = required_combo;
        def.provides_concept = provides_concept;
        def.induces_mood = induces_mood;
    }

    for (from, to) in edges {
        graph.contexts[from.index()].connections.push(to);
    }
    for id in graph.characters[character.index()].contexts.clone() {
        let connections = &mut graph.contexts[id.index()].connections;
        connections.sort_unstable();
        connections.dedup();
    }

    for trigger in &spec.triggers {
        let id = graph.trigger_id(&trigger.id)?;
        let context = owned_context(graph, character, &trigger.parent_context)?;
        let requires = trigger
            .requires
            .as_deref()
            .map(|name| lookup_concept(graph, name))
            .transpose()?;
        let yields = trigger
            .yields
            .iter()
            .map(|name| lookup_concept(graph, name))
            .collect::<Result<Vec<_>, _>>()?;
        let gives = trigger
            .gives
            .iter()
            .map(|name| graph.item_id(name))
            .collect::<Result<Vec<_>, _>>()?;

        let def = &mut graph.triggers[id.index()];
        def.context = context;
        def.requires = requires;
        def.yields = yields;
        def.gives = gives;
    }

    for rule in &spec.behavior_rules {
        let id = graph.rule_id(&rule.id)?;
        let mood = intern_mood(graph, &rule.mood)?;
        let condition = match &rule.condition {
            ItemCondition::Unrestricted => ItemCondition::Unrestricted,
            ItemCondition::EmptyHanded => ItemCondition::EmptyHanded,
            ItemCondition::Holding(tag) => ItemCondition::Holding(lookup_tag(graph, tag)?),
            ItemCondition::Wearing(tag) => ItemCondition::Wearing(lookup_tag(graph, tag)?),
            ItemCondition::Carrying(tag) => ItemCondition::Carrying(lookup_tag(graph, tag)?),
        };

        let def = &mut graph.rules[id.index()];
        def.mood = mood;
        def.condition = condition;
    }

    let start = match &spec.start {
        Some(name) => Some(owned_context(graph, character, name)?),
        None => None,
    };
    let goal = owned_context(graph, character, &spec.goal)?;
    let mood = intern_mood(
        graph,
        spec.mood.as_deref().unwrap_or(PlannerConfig::DEFAULT_MOOD),
    )?;
    let mut equipment = Vec::with_capacity(spec.equipment.len());
    for entry in &spec.equipment {
        let item = graph.item_id(&entry.item)?;
        let possession = entry
            .possession
            .unwrap_or_else(|| graph.items[item.index()].category.default_possession());
        equipment.push((item, possession));
    }
    equipment.sort_unstable();
    equipment.dedup_by_key(|(item, _)| *item);

    let def = &mut graph.characters[character.index()];
    if let Some(start) = start {
        def.start = start;
    }
    def.goal = goal;
    def.mood = mood;
    def.equipment = equipment;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectionSpec, ContextSpec, ItemCategory, RuleSpec, TriggerSpec};

    fn minimal(id: &str) -> CharacterSpec {
        CharacterSpec {
            id: id.into(),
            goal: format!("{id}_end"),
            contexts: vec![
                ContextSpec::new(format!("{id}_start"))
                    .start()
                    .connect(ConnectionSpec::to(format!("{id}_end"))),
                ContextSpec::new(format!("{id}_end")),
            ],
            ..CharacterSpec::default()
        }
    }

    #[test]
    fn builds_minimal_character() {
        let graph = GraphBuilder::new().character(minimal("mira")).build().unwrap();
        let mira = graph.character_id("mira").unwrap();
        let def = graph.character(mira).unwrap();
        assert_eq!(graph.context(def.start).unwrap().name, "mira_start");
        assert_eq!(graph.context(def.goal).unwrap().name, "mira_end");
        assert_eq!(graph.mood(def.mood).unwrap().name, PlannerConfig::DEFAULT_MOOD);
    }

    #[test]
    fn rejects_unknown_concept() {
        let mut spec = minimal("mira");
        spec.contexts[1] = ContextSpec::new("mira_end").locked_by("cpt_missing");
        let err = GraphBuilder::new().character(spec).build().unwrap_err();
        assert_eq!(err, GraphError::unknown(ObjectKind::Concept, "cpt_missing"));
    }

    #[test]
    fn rejects_conflicting_kinds() {
        let err = GraphBuilder::new()
            .concept("mira_end")
            .character(minimal("mira"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::NameConflict {
                existing: ObjectKind::Concept,
                requested: ObjectKind::Context,
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_contexts() {
        let mut spec = minimal("mira");
        spec.contexts.push(ContextSpec::new("mira_end"));
        let err = GraphBuilder::new().character(spec).build().unwrap_err();
        assert!(matches!(err, GraphError::DuplicateDefinition { .. }));
    }

    #[test]
    fn rejects_foreign_connections() {
        let mut mira = minimal("mira");
        mira.contexts[0] = mira.contexts[0]
            .clone()
            .connect(ConnectionSpec::to("oren_start"));
        let err = GraphBuilder::new()
            .character(mira)
            .character(minimal("oren"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::ForeignContext { .. }));
    }

    #[test]
    fn rejects_invalid_identifier() {
        let err = GraphBuilder::new()
            .concept("bad name")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidIdentifier { .. }));
    }

    #[test]
    fn requires_a_start_context() {
        let mut spec = minimal("mira");
        spec.contexts[0].is_start = false;
        let err = GraphBuilder::new().character(spec).build().unwrap_err();
        assert!(matches!(err, GraphError::MissingStart { .. }));
    }

    #[test]
    fn rule_tags_must_exist() {
        let mut spec = minimal("mira");
        spec.behavior_rules.push(RuleSpec::new(
            "rule_glare",
            "angry",
            ItemCondition::Holding("focus".into()),
        ));
        let err = GraphBuilder::new().character(spec).build().unwrap_err();
        assert_eq!(err, GraphError::unknown(ObjectKind::Tag, "focus"));
    }

    #[test]
    fn shared_concepts_are_interned_once() {
        let mut mira = minimal("mira");
        mira.triggers
            .push(TriggerSpec::new("trig_a", "mira_start").yields("cpt_shared"));
        let mut oren = minimal("oren");
        oren.triggers
            .push(TriggerSpec::new("trig_b", "oren_start").yields("cpt_shared"));

        let graph = GraphBuilder::new()
            .concept("cpt_shared")
            .concept("cpt_shared")
            .item(ItemSpec::new("item_coin", ItemCategory::Holdable).tagged("currency"))
            .character(mira)
            .character(oren)
            .build()
            .unwrap();

        assert_eq!(graph.concepts().len(), 1);
        let a = graph.trigger(graph.trigger_id("trig_a").unwrap()).unwrap();
        let b = graph.trigger(graph.trigger_id("trig_b").unwrap()).unwrap();
        assert_eq!(a.yields, b.yields);
    }
}
