//! # Configuration
//!
//! Sysrpg reads a single TOML file with three sections:
//!
//! - [`GameConfig`] - world size, spawn point, hp and combat/training tuning
//! - [`StorageConfig`] - where the sled database lives
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```rust,no_run
//! use sysrpg::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("World: {}x{}", config.game.world_width, config.game.world_height);
//!     Ok(())
//! }
//! ```
//!
//! ```toml
//! [game]
//! world_width = 50
//! world_height = 50
//! spawn_x = 25
//! spawn_y = 25
//! default_hp = 100
//! damage_min = 10
//! damage_max = 25
//! train_xp = 10
//! train_path_xp = 25
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tokio::fs;

use crate::game::types::Coords;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_world_size")]
    pub world_width: i32,
    #[serde(default = "default_world_size")]
    pub world_height: i32,
    #[serde(default = "default_spawn")]
    pub spawn_x: i32,
    #[serde(default = "default_spawn")]
    pub spawn_y: i32,
    #[serde(default = "default_hp")]
    pub default_hp: u32,
    #[serde(default = "default_damage_min")]
    pub damage_min: u32,
    #[serde(default = "default_damage_max")]
    pub damage_max: u32,
    /// Ordinary xp granted per `train`.
    #[serde(default = "default_train_xp")]
    pub train_xp: u64,
    /// Path-xp granted per `train`.
    #[serde(default = "default_train_path_xp")]
    pub train_path_xp: u64,
    /// JSON quest catalog; the built-in starter quests are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quests_file: Option<String>,
}

fn default_world_size() -> i32 {
    50
}

fn default_spawn() -> i32 {
    25
}

fn default_hp() -> u32 {
    100
}

fn default_damage_min() -> u32 {
    10
}

fn default_damage_max() -> u32 {
    25
}

fn default_train_xp() -> u64 {
    10
}

fn default_train_path_xp() -> u64 {
    25
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: default_world_size(),
            world_height: default_world_size(),
            spawn_x: default_spawn(),
            spawn_y: default_spawn(),
            default_hp: default_hp(),
            damage_min: default_damage_min(),
            damage_max: default_damage_max(),
            train_xp: default_train_xp(),
            train_path_xp: default_train_path_xp(),
            quests_file: None,
        }
    }
}

impl GameConfig {
    pub fn spawn(&self) -> Coords {
        Coords::new(self.spawn_x, self.spawn_y)
    }

    pub fn damage_range(&self) -> RangeInclusive<u32> {
        self.damage_min..=self.damage_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Defaults to `<data_dir>/sysrpg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("sysrpg"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("sysrpg.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        if game.world_width <= 0 || game.world_height <= 0 {
            return Err(anyhow!(
                "world size must be positive (got {}x{})",
                game.world_width,
                game.world_height
            ));
        }
        if game.spawn_x < 0
            || game.spawn_y < 0
            || game.spawn_x >= game.world_width
            || game.spawn_y >= game.world_height
        {
            return Err(anyhow!(
                "spawn ({}, {}) lies outside the {}x{} world",
                game.spawn_x,
                game.spawn_y,
                game.world_width,
                game.world_height
            ));
        }
        if game.default_hp == 0 {
            return Err(anyhow!("default_hp must be at least 1"));
        }
        if game.damage_min > game.damage_max {
            return Err(anyhow!(
                "damage_min {} exceeds damage_max {}",
                game.damage_min,
                game.damage_max
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.spawn(), Coords::new(25, 25));
        assert_eq!(config.game.damage_range(), 10..=25);
        assert_eq!(config.storage.db_path(), PathBuf::from("./data").join("sysrpg"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str("[game]\ndamage_max = 40\n").expect("parse");
        assert_eq!(config.game.damage_max, 40);
        assert_eq!(config.game.world_width, 50);
        assert_eq!(config.storage.data_dir, "./data");
    }

    #[test]
    fn rejects_inverted_damage_range() {
        let mut config = Config::default();
        config.game.damage_min = 30;
        config.game.damage_max = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_spawn_outside_world() {
        let mut config = Config::default();
        config.game.spawn_x = 50;
        assert!(config.validate().is_err());
        config.game.spawn_x = 25;
        config.game.world_height = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn default_file_round_trips() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_str().expect("utf8 path");
        Config::create_default(path).await.expect("write");
        let loaded = Config::load(path).await.expect("load");
        assert_eq!(loaded.game, GameConfig::default());
    }
}
