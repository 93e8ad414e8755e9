//! Canonical player record plus field-level validation.
//!
//! Business rules live in the engines; this module only guarantees that a
//! single field write never leaves the record structurally invalid (hp stays
//! within `[0, max_hp]`, level never decreases, names stay printable).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::game::errors::GameError;
use crate::game::progression::xp_required;
use crate::game::types::{
    Attributes, Coords, InteractionMode, Path, PlayerId, PLAYER_SCHEMA_VERSION,
};

pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub display_name: String,
    /// `None` until chosen, and again after a defeat.
    pub path: Option<Path>,
    pub position: Coords,
    pub hp: u32,
    pub max_hp: u32,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    /// Rank progress on the chosen path.
    pub path_xp: u64,
    pub rank_index: u32,
    /// Granted on level-up and by quests.
    pub stat_points: u32,
    /// Granted on breakthrough.
    pub attribute_points: u32,
    pub attributes: Attributes,
    #[serde(default)]
    pub inventory: BTreeSet<String>,
    #[serde(default)]
    pub active_quests: BTreeSet<String>,
    #[serde(default)]
    pub completed_quests: BTreeSet<String>,
    #[serde(default)]
    pub mode: InteractionMode,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(id: PlayerId, display_name: &str, spawn: Coords, max_hp: u32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            id,
            display_name: display_name.to_string(),
            path: None,
            position: spawn,
            hp: max_hp,
            max_hp,
            level: 1,
            xp: 0,
            xp_to_next_level: xp_required(1),
            path_xp: 0,
            rank_index: 0,
            stat_points: 0,
            attribute_points: 0,
            attributes: Attributes::default(),
            inventory: BTreeSet::new(),
            active_quests: BTreeSet::new(),
            completed_quests: BTreeSet::new(),
            mode: InteractionMode::Idle,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    /// Write hp, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: u32) {
        self.hp = hp.min(self.max_hp);
    }

    /// Write max_hp (at least 1); current hp is pulled down if it now exceeds it.
    pub fn set_max_hp(&mut self, max_hp: u32) {
        self.max_hp = max_hp.max(1);
        self.hp = self.hp.min(self.max_hp);
    }

    /// Subtract damage without underflow and return the remaining hp.
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        self.hp = self.hp.saturating_sub(damage);
        self.hp
    }

    pub fn restore_hp(&mut self) {
        self.hp = self.max_hp;
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Defeat reset: full hp, back to spawn, path cleared so it must be re-chosen.
    pub fn reset_after_defeat(&mut self, spawn: Coords) {
        self.restore_hp();
        self.position = spawn;
        self.path = None;
        self.mode = InteractionMode::Idle;
    }

    /// Raise the level; lowering it is a structural error.
    pub fn set_level(&mut self, level: u32) -> Result<(), GameError> {
        if level < self.level {
            return Err(GameError::precondition(format!(
                "level cannot decrease ({} -> {})",
                self.level, level
            )));
        }
        self.level = level;
        Ok(())
    }

    pub fn move_to(&mut self, position: Coords) {
        self.position = position;
    }

    /// Pick the path once; a chosen path can only be cleared by a defeat.
    pub fn choose_path(&mut self, path: Path) -> Result<(), GameError> {
        if let Some(current) = self.path {
            return Err(GameError::precondition(format!(
                "you already follow the {} path",
                current.display_name()
            )));
        }
        self.path = Some(path);
        Ok(())
    }

    pub fn begin_chat(&mut self, target: PlayerId) {
        self.mode = InteractionMode::Chatting(target);
    }

    pub fn end_chat(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    pub fn set_display_name(&mut self, name: &str) -> Result<(), GameError> {
        self.display_name = validate_display_name(name)?;
        Ok(())
    }

    /// Structural sanity check used on records coming back from a store.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.max_hp == 0 {
            return Err(GameError::precondition("max_hp must be positive"));
        }
        if self.hp > self.max_hp {
            return Err(GameError::precondition(format!(
                "hp {} exceeds max_hp {}",
                self.hp, self.max_hp
            )));
        }
        if self.level == 0 {
            return Err(GameError::precondition("level must be at least 1"));
        }
        if self.xp_to_next_level == 0 {
            return Err(GameError::precondition("xp_to_next_level must be positive"));
        }
        Ok(())
    }

    pub fn is_colocated_with(&self, other: &PlayerRecord) -> bool {
        self.position == other.position
    }
}

/// Trim and check a display name: 1..=32 characters, no control characters.
pub fn validate_display_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidAction("name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(GameError::InvalidAction(format!(
            "name longer than {} characters",
            MAX_DISPLAY_NAME_CHARS
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(GameError::InvalidAction(
            "name contains control characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Sparse field update. Only `Some` fields are written; everything else on the
/// stored record is left exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub display_name: Option<String>,
    /// `Some(None)` clears the path.
    pub path: Option<Option<Path>>,
    pub position: Option<Coords>,
    pub hp: Option<u32>,
    pub max_hp: Option<u32>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
    pub xp_to_next_level: Option<u64>,
    pub path_xp: Option<u64>,
    pub rank_index: Option<u32>,
    pub stat_points: Option<u32>,
    pub attribute_points: Option<u32>,
    pub attributes: Option<Attributes>,
    pub inventory: Option<BTreeSet<String>>,
    pub active_quests: Option<BTreeSet<String>>,
    pub completed_quests: Option<BTreeSet<String>>,
    pub mode: Option<InteractionMode>,
}

macro_rules! diff_field {
    ($update:ident, $before:ident, $after:ident, $($field:ident),+ $(,)?) => {
        $(
            if $before.$field != $after.$field {
                $update.$field = Some($after.$field.clone());
            }
        )+
    };
}

impl PlayerUpdate {
    /// Build the minimal update that turns `before` into `after`.
    pub fn diff(before: &PlayerRecord, after: &PlayerRecord) -> Self {
        let mut update = PlayerUpdate::default();
        diff_field!(
            update,
            before,
            after,
            display_name,
            path,
            position,
            hp,
            max_hp,
            level,
            xp,
            xp_to_next_level,
            path_xp,
            rank_index,
            stat_points,
            attribute_points,
            attributes,
            inventory,
            active_quests,
            completed_quests,
            mode,
        );
        update
    }

    pub fn is_empty(&self) -> bool {
        *self == PlayerUpdate::default()
    }

    /// Apply onto a record through the validating setters. The record is only
    /// modified if every field is acceptable.
    pub fn apply_to(&self, record: &mut PlayerRecord) -> Result<(), GameError> {
        let mut next = record.clone();
        if let Some(name) = &self.display_name {
            next.set_display_name(name)?;
        }
        if let Some(path) = self.path {
            next.path = path;
        }
        if let Some(position) = self.position {
            next.position = position;
        }
        // max_hp first so that an hp write in the same update clamps against it
        if let Some(max_hp) = self.max_hp {
            next.set_max_hp(max_hp);
        }
        if let Some(hp) = self.hp {
            next.set_hp(hp);
        }
        if let Some(level) = self.level {
            next.set_level(level)?;
        }
        if let Some(xp) = self.xp {
            next.xp = xp;
        }
        if let Some(required) = self.xp_to_next_level {
            if required == 0 {
                return Err(GameError::precondition("xp_to_next_level must be positive"));
            }
            next.xp_to_next_level = required;
        }
        if let Some(path_xp) = self.path_xp {
            next.path_xp = path_xp;
        }
        if let Some(rank_index) = self.rank_index {
            next.rank_index = rank_index;
        }
        if let Some(points) = self.stat_points {
            next.stat_points = points;
        }
        if let Some(points) = self.attribute_points {
            next.attribute_points = points;
        }
        if let Some(attributes) = &self.attributes {
            next.attributes = attributes.clone();
        }
        if let Some(inventory) = &self.inventory {
            next.inventory = inventory.clone();
        }
        if let Some(active) = &self.active_quests {
            next.active_quests = active.clone();
        }
        if let Some(completed) = &self.completed_quests {
            next.completed_quests = completed.clone();
        }
        if let Some(mode) = self.mode {
            next.mode = mode;
        }
        *record = next;
        Ok(())
    }
}

/// Inventory listing for the `inventory` action.
pub fn format_inventory(player: &PlayerRecord) -> String {
    if player.inventory.is_empty() {
        return "Your pack is empty.".to_string();
    }
    let mut out = String::from("=== INVENTORY ===\n");
    for item in &player.inventory {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
    out
}
