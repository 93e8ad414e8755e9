use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const QUEST_SCHEMA_VERSION: u8 = 1;

/// Opaque numeric player identifier handed to us by the transport.
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four cardinal directions. North increases `y`, east increases `x`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Specialization chosen at onboarding; gates training and the rank ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Path {
    Cultivation,
    Mana,
}

impl Path {
    pub fn display_name(self) -> &'static str {
        match self {
            Path::Cultivation => "Cultivation",
            Path::Mana => "Mana",
        }
    }
}

impl FromStr for Path {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cultivation" | "tahzib" => Ok(Path::Cultivation),
            "mana" => Ok(Path::Mana),
            other => Err(format!("unknown path '{}'", other)),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attributes {
    pub strength: u32,
    pub agility: u32,
    pub intelligence: u32,
    pub stamina: u32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 5,
            agility: 5,
            intelligence: 5,
            stamina: 100,
        }
    }
}

/// Transient conversational state of a player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Idle,
    /// The next inbound text message is relayed to this player.
    Chatting(PlayerId),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Active,
    Completed,
}

/// Persistent (player, quest) progress record. Created once when the quest's
/// trigger first fires and moved to `Completed` exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestRecord {
    pub player_id: PlayerId,
    pub quest_id: String,
    pub status: QuestStatus,
    /// Qualifying events counted so far for counted objectives.
    #[serde(default)]
    pub progress: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub schema_version: u8,
}

impl QuestRecord {
    pub fn new(player_id: PlayerId, quest_id: &str) -> Self {
        Self {
            player_id,
            quest_id: quest_id.to_string(),
            status: QuestStatus::Active,
            progress: 0,
            started_at: Utc::now(),
            completed_at: None,
            schema_version: QUEST_SCHEMA_VERSION,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    pub fn is_complete(&self) -> bool {
        self.status == QuestStatus::Completed
    }

    pub fn mark_complete(&mut self) {
        self.status = QuestStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Alert,
}

/// Text produced by the engine for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub target_player_id: PlayerId,
    pub text: String,
    pub severity: Severity,
}

impl NotificationEvent {
    pub fn new(target_player_id: PlayerId, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            target_player_id,
            text: text.into(),
            severity,
        }
    }

    pub fn info(target: PlayerId, text: impl Into<String>) -> Self {
        Self::new(target, Severity::Info, text)
    }

    pub fn success(target: PlayerId, text: impl Into<String>) -> Self {
        Self::new(target, Severity::Success, text)
    }

    pub fn warning(target: PlayerId, text: impl Into<String>) -> Self {
        Self::new(target, Severity::Warning, text)
    }

    pub fn alert(target: PlayerId, text: impl Into<String>) -> Self {
        Self::new(target, Severity::Alert, text)
    }
}

/// Asks the presentation layer to re-render location and status for a player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderRequest {
    pub player_id: PlayerId,
}
