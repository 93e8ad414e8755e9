//! Player-progression and world-state engine.
//!
//! Leaves first: the static [`world`] map, the typed [`player`] record, the
//! [`progression`], [`quest`] and [`combat`] engines, and the [`dispatch`]
//! entry point that ties them to a [`storage`] backend and a presenter.

pub mod combat;
pub mod dispatch;
pub mod errors;
pub mod player;
pub mod progression;
pub mod quest;
pub mod seed_loader;
pub mod state;
pub mod storage;
pub mod types;
pub mod world;

pub use combat::{attack, AttackOutcome, DamageRoller, RandomRoller, ScriptedRolls};
pub use dispatch::{
    Action, ActionReport, ActionRequest, DeliveryError, Dispatcher, NullPresenter, Presenter,
    RecordingPresenter, ACTION_IDS,
};
pub use errors::GameError;
pub use player::{format_inventory, PlayerRecord, PlayerUpdate};
pub use progression::{
    add_xp, breakthrough, can_breakthrough, format_status, rank_info, title_for, xp_required,
    BreakthroughOutcome,
};
pub use quest::{
    evaluate_quests, format_quest_log, QuestCatalog, QuestDefinition, QuestEvent, QuestLog,
    QuestObjective, QuestReward, QuestTrigger,
};
pub use seed_loader::{load_catalog, load_quests_from_json};
pub use state::{standard_world, starter_quests};
pub use storage::{ChangeSet, MemoryStore, PlayerStore, SledStore, SledStoreBuilder};
pub use types::*;
pub use world::{Bounds, Location, Region, WorldMap};
