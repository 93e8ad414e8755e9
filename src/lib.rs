//! # Sysrpg - player progression and world-state engine
//!
//! Sysrpg is the rules core of a chat-driven cultivation RPG: players walk a
//! coordinate world split into regions, level up through xp, climb the rank
//! ladder of their chosen path through breakthroughs, complete quests and
//! fight each other. Transport, menus and hosting stay outside the crate; a
//! small console front end ships with the binary for local play.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sysrpg::config::Config;
//! use sysrpg::game::{
//!     standard_world, starter_quests, Action, ActionRequest, Direction, Dispatcher,
//!     QuestCatalog, SledStoreBuilder,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = SledStoreBuilder::new(config.storage.db_path()).open()?;
//!     let dispatcher = Dispatcher::new(
//!         Arc::new(store),
//!         standard_world(&config.game),
//!         QuestCatalog::new(starter_quests()),
//!         config.game.clone(),
//!     )?;
//!
//!     dispatcher.start(1, "Arin")?;
//!     dispatcher.handle(ActionRequest::new(1, Action::Move(Direction::East)))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - world map, player record, progression, quests, combat and the dispatcher
//! - [`config`] - TOML configuration and validation
//! - [`console`] - line-based local transport
//! - [`logutil`] - single-line escaping for user text in logs

pub mod config;
pub mod console;
pub mod game;
pub mod logutil;
