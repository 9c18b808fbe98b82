//! World atlas loader.
//!
//! An atlas is either a single RON file holding a [`WorldAtlas`], or a
//! directory laid out as:
//!
//! ```text
//! atlas/
//! ├── world.ron            (WorldAtlas without characters)
//! └── characters/
//!     ├── barkeep.ron      (CharacterFile)
//!     └── warden.ron
//! ```
//!
//! Character files are read in file-name order so the resulting arena is
//! stable across platforms.

use std::path::Path;

use anyhow::Context as _;
use dialogue_core::{
    CharacterSpec, ConnectionSpec, ContextSpec, GraphBuilder, GraphModel, ItemSpec,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// World-level content shared by every character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldAtlas {
    pub name: String,
    pub concepts: Vec<String>,
    pub tags: Vec<String>,
    pub moods: Vec<String>,
    pub items: Vec<ItemSpec>,
    pub characters: Vec<CharacterFile>,
}

/// One character plus the shared concepts it introduces and patches applied
/// to its contexts before the graph is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterFile {
    pub concepts: Vec<String>,
    pub overrides: Vec<ContextOverride>,
    pub character: CharacterSpec,
}

/// Field-level patch of a single context. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOverride {
    pub context: String,
    /// `Some(false)` also clears both lock requirements.
    pub is_locked: Option<bool>,
    pub required_concept: Option<String>,
    pub required_combo: Option<(String, String)>,
    pub provides_concept: Option<String>,
    pub induces_mood: Option<String>,
    pub add_connections: Vec<ConnectionSpec>,
    pub remove_connections: Vec<String>,
}

impl ContextOverride {
    fn apply(&self, ctx: &mut ContextSpec) {
        if let Some(locked) = self.is_locked {
            ctx.is_locked = locked;
            if !locked {
                ctx.required_concept = None;
                ctx.required_combo = None;
            }
        }
        if let Some(concept) = &self.required_concept {
            ctx.required_concept = Some(concept.clone());
        }
        if let Some(combo) = &self.required_combo {
            ctx.required_combo = Some(combo.clone());
        }
        if let Some(concept) = &self.provides_concept {
            ctx.provides_concept = Some(concept.clone());
        }
        if let Some(mood) = &self.induces_mood {
            ctx.induces_mood = Some(mood.clone());
        }
        ctx.connections
            .retain(|conn| !self.remove_connections.contains(&conn.to));
        for conn in &self.add_connections {
            if !ctx.connections.contains(conn) {
                ctx.connections.push(conn.clone());
            }
        }
    }
}

impl CharacterFile {
    /// Applies every override to the character's contexts.
    pub fn resolved(&self) -> LoadResult<CharacterSpec> {
        let mut spec = self.character.clone();
        for patch in &self.overrides {
            let ctx = spec
                .contexts
                .iter_mut()
                .find(|ctx| ctx.id == patch.context)
                .with_context(|| {
                    format!(
                        "override targets unknown context '{}' of character '{}'",
                        patch.context, spec.id
                    )
                })?;
            patch.apply(ctx);
        }
        Ok(spec)
    }
}

impl WorldAtlas {
    /// World and per-character concepts in first-seen order, without duplicates.
    pub fn merged_concepts(&self) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        let all = self
            .concepts
            .iter()
            .chain(self.characters.iter().flat_map(|c| c.concepts.iter()));
        for concept in all {
            if !merged.contains(concept) {
                merged.push(concept.clone());
            }
        }
        merged
    }

    /// Builds the immutable graph model.
    pub fn build(&self) -> LoadResult<GraphModel> {
        let mut builder = GraphBuilder::new();
        builder.concepts(self.merged_concepts());
        for tag in &self.tags {
            builder.tag(tag.clone());
        }
        for mood in &self.moods {
            builder.mood(mood.clone());
        }
        for item in &self.items {
            builder.item(item.clone());
        }
        for character in &self.characters {
            builder.character(character.resolved()?);
        }
        let graph = builder
            .build()
            .with_context(|| format!("failed to build world '{}'", self.name))?;
        tracing::info!(
            world = %self.name,
            characters = self.characters.len(),
            concepts = graph.concepts().len(),
            "atlas loaded"
        );
        Ok(graph)
    }
}

/// Loader for world atlases from RON files.
pub struct AtlasLoader;

impl AtlasLoader {
    /// Reads an atlas from a single file or an atlas directory.
    pub fn read(path: &Path) -> LoadResult<WorldAtlas> {
        if path.is_dir() {
            Self::read_dir(path)
        } else {
            Self::parse(&read_file(path)?)
                .with_context(|| format!("in atlas {}", path.display()))
        }
    }

    /// Reads and builds the graph model in one step.
    pub fn load(path: &Path) -> LoadResult<GraphModel> {
        Self::read(path)?.build()
    }

    pub fn parse(text: &str) -> LoadResult<WorldAtlas> {
        ron::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse world atlas RON: {}", e))
    }

    fn read_dir(dir: &Path) -> LoadResult<WorldAtlas> {
        let world_path = dir.join("world.ron");
        let mut atlas = Self::parse(&read_file(&world_path)?)
            .with_context(|| format!("in {}", world_path.display()))?;

        let characters_dir = dir.join("characters");
        if !characters_dir.is_dir() {
            return Ok(atlas);
        }
        let mut paths = std::fs::read_dir(&characters_dir)
            .with_context(|| format!("Failed to list {}", characters_dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|p| p.extension().is_some_and(|ext| ext == "ron"));
        paths.sort();

        for path in paths {
            let file: CharacterFile = ron::from_str(&read_file(&path)?).map_err(|e| {
                anyhow::anyhow!("Failed to parse character RON at {}: {}", path.display(), e)
            })?;
            atlas.characters.push(file);
        }
        Ok(atlas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATLAS: &str = r#"(
        name: "hall",
        concepts: ["cpt_key"],
        characters: [
            (
                concepts: ["cpt_key", "cpt_map"],
                overrides: [
                    (context: "hall_vault", is_locked: Some(false)),
                    (context: "hall_door", add_connections: [(to: "hall_vault")]),
                ],
                character: (
                    id: "porter",
                    goal: "hall_vault",
                    contexts: [
                        (id: "hall_door", is_start: true),
                        (id: "hall_vault", is_locked: true, required_concept: Some("cpt_map")),
                    ],
                ),
            ),
        ],
    )"#;

    #[test]
    fn concepts_merge_without_duplicates() {
        let atlas = AtlasLoader::parse(ATLAS).unwrap();
        assert_eq!(atlas.merged_concepts(), ["cpt_key", "cpt_map"]);
    }

    #[test]
    fn overrides_patch_contexts_before_building() {
        let graph = AtlasLoader::parse(ATLAS).unwrap().build().unwrap();
        let door = graph.context_id("hall_door").unwrap();
        let vault = graph.context_id("hall_vault").unwrap();

        let vault_def = graph.context(vault).unwrap();
        assert!(!vault_def.is_locked);
        assert_eq!(vault_def.required_concept, None);
        assert!(graph.context(door).unwrap().connects_to(vault));
    }

    #[test]
    fn override_of_unknown_context_is_an_error() {
        let text = ATLAS.replace("context: \"hall_vault\"", "context: \"hall_cellar\"");
        let err = AtlasLoader::parse(&text).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("hall_cellar"));
    }
}
