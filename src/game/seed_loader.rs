//! Data-driven quest catalog.
//!
//! The catalog file is a JSON array of quest definitions, for example:
//!
//! ```json
//! [
//!   {
//!     "id": "first_steps",
//!     "title": "First Steps",
//!     "description": "Walk ten steps.",
//!     "trigger": { "type": "level", "value": 1 },
//!     "objective": { "type": "move", "count": 10 },
//!     "reward": { "xp": 50, "stat_points": 1 }
//!   }
//! ]
//! ```

use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::game::errors::GameError;
use crate::game::quest::{QuestCatalog, QuestDefinition, QuestObjective};
use crate::game::state::starter_quests;

fn invalid_data(path: &Path, detail: impl std::fmt::Display) -> GameError {
    GameError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Failed to parse {}: {}", path.display(), detail),
    ))
}

/// Load quest definitions from a JSON file.
pub fn load_quests_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<QuestDefinition>, GameError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let quests: Vec<QuestDefinition> =
        serde_json::from_str(&contents).map_err(|e| invalid_data(path, e))?;

    let mut seen = HashSet::new();
    for quest in &quests {
        if quest.id.trim().is_empty() {
            return Err(invalid_data(path, "quest with empty id"));
        }
        if !seen.insert(quest.id.as_str()) {
            return Err(invalid_data(path, format!("duplicate quest id '{}'", quest.id)));
        }
        if matches!(quest.objective, QuestObjective::Move { count: 0 }) {
            warn!("quest {} has a zero move count; it completes on the first move", quest.id);
        }
    }
    info!("loaded {} quests from {}", quests.len(), path.display());
    Ok(quests)
}

/// Catalog from `path` when given, the built-in starter quests otherwise.
pub fn load_catalog(path: Option<&Path>) -> Result<QuestCatalog, GameError> {
    let quests = match path {
        Some(path) => load_quests_from_json(path)?,
        None => starter_quests(),
    };
    Ok(QuestCatalog::new(quests))
}
