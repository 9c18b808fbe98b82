//! Data-driven dialogue content.
//!
//! Loads world atlases (RON) into the immutable graph model, planner tuning
//! (TOML) into [`PlannerConfig`](dialogue_core::PlannerConfig), and checks a
//! loaded world end to end before any session is opened.

pub mod loaders;
pub mod validate;

pub use loaders::{
    AtlasLoader, CharacterFile, ConfigLoader, ContentFactory, ContextOverride, LoadResult,
    WorldAtlas,
};
pub use validate::{CharacterReport, WorldReport, validate_world};
