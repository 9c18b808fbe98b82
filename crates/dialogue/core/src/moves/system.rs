//! Explicit system transitions.
//!
//! Mood and inventory only change through entry effects, trigger yields, or
//! one of these transitions issued by the embedding application. They never
//! appear in the legal move set and are not planning actions.

use crate::graph::{GraphModel, ItemId, MoodId, Possession};
use crate::state::SessionState;

use super::{MoveTransition, SystemError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetMood {
    pub mood: MoodId,
}

impl MoveTransition for SetMood {
    type Error = SystemError;

    fn pre_validate(&self, _state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        graph.require_mood(self.mood)?;
        Ok(())
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.mood = self.mood;
        Ok(())
    }
}

/// Puts an item into the inventory, or changes how an owned item is carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrantItem {
    pub item: ItemId,
    pub possession: Possession,
}

impl MoveTransition for GrantItem {
    type Error = SystemError;

    fn pre_validate(&self, _state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        graph.require_item(self.item)?;
        Ok(())
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.inventory.insert(self.item, self.possession);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropItem {
    pub item: ItemId,
}

impl MoveTransition for DropItem {
    type Error = SystemError;

    fn pre_validate(&self, state: &SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        if state.inventory.contains_key(&self.item) {
            Ok(())
        } else {
            Err(SystemError::ItemNotCarried { item: self.item })
        }
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.inventory.remove(&self.item);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SystemAction {
    SetMood(SetMood),
    GrantItem(GrantItem),
    DropItem(DropItem),
}

impl SystemAction {
    pub fn set_mood(mood: MoodId) -> Self {
        Self::SetMood(SetMood { mood })
    }

    pub fn grant_item(item: ItemId, possession: Possession) -> Self {
        Self::GrantItem(GrantItem { item, possession })
    }

    pub fn drop_item(item: ItemId) -> Self {
        Self::DropItem(DropItem { item })
    }
}
