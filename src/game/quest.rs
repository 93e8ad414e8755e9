//! Quest trigger/completion state machine.
//!
//! Every (player, quest) pair moves `inactive -> active -> completed`:
//! a record is created the first time the trigger holds, and completed the
//! first time the objective is met by a triggering event. Completion is
//! terminal; re-evaluating a completed quest never re-applies its reward.
//!
//! Evaluation walks the whole catalog for every event, so its cost grows with
//! the number of quest definitions.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::game::player::PlayerRecord;
use crate::game::progression::add_xp;
use crate::game::types::{Coords, NotificationEvent, PlayerId, QuestRecord};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestTrigger {
    /// Fires once the player's level reaches `value`.
    Level { value: u32 },
}

impl QuestTrigger {
    pub fn holds(&self, player: &PlayerRecord) -> bool {
        match self {
            QuestTrigger::Level { value } => player.level >= *value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestObjective {
    /// Count successful movement events until `count` is reached.
    Move { count: u32 },
    /// Stand exactly on `coords` after a movement event.
    ReachCoord { coords: Coords },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestReward {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub stat_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub trigger: QuestTrigger,
    pub objective: QuestObjective,
    #[serde(default)]
    pub reward: QuestReward,
}

impl QuestDefinition {
    pub fn new(id: &str, title: &str, trigger: QuestTrigger, objective: QuestObjective) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            trigger,
            objective,
            reward: QuestReward::default(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_reward_xp(mut self, xp: u64) -> Self {
        self.reward.xp = xp;
        self
    }

    pub fn with_reward_item(mut self, item_id: &str) -> Self {
        self.reward.items.push(item_id.to_string());
        self
    }

    pub fn with_reward_stat_points(mut self, points: u32) -> Self {
        self.reward.stat_points = points;
        self
    }
}

/// Ordered set of quest definitions; evaluation follows this order.
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: Vec<QuestDefinition>,
}

impl QuestCatalog {
    pub fn new(quests: Vec<QuestDefinition>) -> Self {
        let mut seen = BTreeSet::new();
        let quests = quests
            .into_iter()
            .filter(|q| seen.insert(q.id.clone()))
            .collect();
        Self { quests }
    }

    pub fn get(&self, quest_id: &str) -> Option<&QuestDefinition> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestDefinition> {
        self.quests.iter()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

/// Kind of player action that caused an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    Login,
    /// A movement that actually changed the player's position.
    Move,
    /// A movement attempt that was blocked.
    MoveBlocked,
    Train,
    Breakthrough,
    Attack,
    Chat,
    View,
    Profile,
}

/// A player's quest records loaded for one action, with write tracking.
#[derive(Debug, Clone)]
pub struct QuestLog {
    player_id: PlayerId,
    records: BTreeMap<String, QuestRecord>,
    dirty: BTreeSet<String>,
}

impl QuestLog {
    pub fn new(player_id: PlayerId, records: Vec<QuestRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| r.player_id == player_id)
            .map(|r| (r.quest_id.clone(), r))
            .collect();
        Self {
            player_id,
            records,
            dirty: BTreeSet::new(),
        }
    }

    pub fn get(&self, quest_id: &str) -> Option<&QuestRecord> {
        self.records.get(quest_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &QuestRecord> {
        self.records.values()
    }

    /// Records created or modified since the last call.
    pub fn take_changes(&mut self) -> Vec<QuestRecord> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty
            .into_iter()
            .filter_map(|id| self.records.get(&id).cloned())
            .collect()
    }

    fn activate(&mut self, quest_id: &str) -> bool {
        if self.records.contains_key(quest_id) {
            return false;
        }
        self.records
            .insert(quest_id.to_string(), QuestRecord::new(self.player_id, quest_id));
        self.dirty.insert(quest_id.to_string());
        true
    }

    /// Run `f` on the record if it is still active; the record is marked for
    /// writing only when `f` actually changed it.
    fn update_active(&mut self, quest_id: &str, f: impl FnOnce(&mut QuestRecord) -> bool) -> bool {
        let Some(record) = self.records.get_mut(quest_id).filter(|r| r.is_active()) else {
            return false;
        };
        let before = record.clone();
        let result = f(record);
        if *record != before {
            self.dirty.insert(quest_id.to_string());
        }
        result
    }
}

/// Whether this event advances the objective, updating any counter.
fn objective_met(
    objective: &QuestObjective,
    record: &mut QuestRecord,
    player: &PlayerRecord,
    event: QuestEvent,
) -> bool {
    if event != QuestEvent::Move {
        return false;
    }
    match objective {
        QuestObjective::Move { count } => {
            record.progress = record.progress.saturating_add(1).min(*count);
            record.progress >= *count
        }
        QuestObjective::ReachCoord { coords } => player.position == *coords,
    }
}

fn apply_reward(
    quest: &QuestDefinition,
    player: &mut PlayerRecord,
    notes: &mut Vec<NotificationEvent>,
) {
    let reward = &quest.reward;
    if reward.xp > 0 {
        let gain = add_xp(player, reward.xp);
        notes.extend(gain.notifications(player.id));
    }
    for item in &reward.items {
        player.inventory.insert(item.clone());
        notes.push(NotificationEvent::info(
            player.id,
            format!("Received item: {}", item),
        ));
    }
    if reward.stat_points > 0 {
        player.stat_points = player.stat_points.saturating_add(reward.stat_points);
        notes.push(NotificationEvent::info(
            player.id,
            format!("Received {} stat point(s).", reward.stat_points),
        ));
    }
}

/// Run every quest definition against the player for one event.
///
/// Activation and completion both happen here; the reward of a quest is
/// applied in the same pass that completes it. Mutations land on `player`
/// and `log`; the caller persists them.
pub fn evaluate_quests(
    catalog: &QuestCatalog,
    player: &mut PlayerRecord,
    log: &mut QuestLog,
    event: QuestEvent,
) -> Vec<NotificationEvent> {
    let mut notes = Vec::new();

    for quest in catalog.iter() {
        if player.completed_quests.contains(&quest.id) {
            continue;
        }

        if quest.trigger.holds(player) && log.activate(&quest.id) {
            player.active_quests.insert(quest.id.clone());
            debug!("player {} activated quest {}", player.id, quest.id);
            let mut text = format!("New quest: {}", quest.title);
            if !quest.description.is_empty() {
                text.push('\n');
                text.push_str(&quest.description);
            }
            notes.push(NotificationEvent::info(player.id, text));
        }

        let completed = log.update_active(&quest.id, |record| {
            let met = objective_met(&quest.objective, record, player, event);
            if met {
                record.mark_complete();
            }
            met
        });

        if completed {
            player.active_quests.remove(&quest.id);
            player.completed_quests.insert(quest.id.clone());
            info!("player {} completed quest {}", player.id, quest.id);
            notes.push(NotificationEvent::success(
                player.id,
                format!("Quest complete: {}", quest.title),
            ));
            apply_reward(quest, player, &mut notes);
        }
    }

    notes
}

/// Quest journal for the `quests` action.
pub fn format_quest_log(catalog: &QuestCatalog, log: &QuestLog) -> String {
    let mut active = Vec::new();
    let mut completed = Vec::new();
    for record in log.records() {
        let title = catalog
            .get(&record.quest_id)
            .map(|q| q.title.as_str())
            .unwrap_or(record.quest_id.as_str());
        if record.is_complete() {
            completed.push(format!("[x] {}", title));
            continue;
        }
        let progress = match catalog.get(&record.quest_id).map(|q| &q.objective) {
            Some(QuestObjective::Move { count }) => format!(" [{}/{}]", record.progress, count),
            Some(QuestObjective::ReachCoord { coords }) => format!(" (reach {})", coords),
            None => String::new(),
        };
        active.push(format!("[ ] {}{}", title, progress));
    }

    if active.is_empty() && completed.is_empty() {
        return "No quests yet.".to_string();
    }
    let mut out = String::from("=== QUESTS ===\n");
    for line in active.iter().chain(completed.iter()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::QuestStatus;

    fn catalog() -> QuestCatalog {
        QuestCatalog::new(vec![
            QuestDefinition::new(
                "walk",
                "Walk",
                QuestTrigger::Level { value: 1 },
                QuestObjective::Move { count: 3 },
            )
            .with_reward_xp(50)
            .with_reward_stat_points(1),
            QuestDefinition::new(
                "hut",
                "Hut",
                QuestTrigger::Level { value: 2 },
                QuestObjective::ReachCoord {
                    coords: Coords::new(35, 25),
                },
            )
            .with_reward_item("small_health_potion"),
        ])
    }

    fn player() -> PlayerRecord {
        PlayerRecord::new(9, "Mira", Coords::new(25, 25), 100)
    }

    #[test]
    fn trigger_creates_record_once() {
        let catalog = catalog();
        let mut p = player();
        let mut log = QuestLog::new(p.id, Vec::new());

        let notes = evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Login);
        assert_eq!(notes.len(), 1);
        assert!(log.get("walk").is_some());
        assert!(log.get("hut").is_none());
        assert_eq!(log.take_changes().len(), 1);

        let notes = evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Login);
        assert!(notes.is_empty());
        assert!(log.take_changes().is_empty());
    }

    #[test]
    fn counted_objective_completes_on_target() {
        let catalog = catalog();
        let mut p = player();
        let mut log = QuestLog::new(p.id, Vec::new());
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Login);

        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Train);
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert_eq!(log.get("walk").unwrap().status, QuestStatus::Active);
        assert_eq!(log.get("walk").unwrap().progress, 2);

        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert!(log.get("walk").unwrap().is_complete());
        assert_eq!(p.xp, 50);
        assert_eq!(p.stat_points, 1);
        assert!(p.completed_quests.contains("walk"));
        assert!(!p.active_quests.contains("walk"));

        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert_eq!(p.xp, 50);
        assert_eq!(p.stat_points, 1);
    }

    #[test]
    fn reach_objective_needs_exact_position() {
        let catalog = catalog();
        let mut p = player();
        p.level = 2;
        let mut log = QuestLog::new(p.id, Vec::new());
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Login);

        p.position = Coords::new(35, 24);
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert!(log.get("hut").unwrap().is_active());

        p.position = Coords::new(35, 25);
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::View);
        assert!(log.get("hut").unwrap().is_active());

        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert!(log.get("hut").unwrap().is_complete());
        assert!(p.inventory.contains("small_health_potion"));
    }

    #[test]
    fn completed_records_from_store_are_terminal() {
        let catalog = catalog();
        let mut p = player();
        let mut done = QuestRecord::new(p.id, "walk");
        done.mark_complete();
        let mut log = QuestLog::new(p.id, vec![done]);

        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert!(log.get("walk").unwrap().is_complete());
        assert_eq!(p.xp, 0);
        assert!(log.take_changes().is_empty());
    }

    #[test]
    fn catalog_drops_duplicate_ids() {
        let mut quests: Vec<QuestDefinition> = catalog().iter().cloned().collect();
        quests.push(quests[0].clone());
        assert_eq!(QuestCatalog::new(quests).len(), 2);
    }

    #[test]
    fn quest_log_lists_progress() {
        let catalog = catalog();
        let mut p = player();
        let mut log = QuestLog::new(p.id, Vec::new());
        assert_eq!(format_quest_log(&catalog, &log), "No quests yet.");
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Login);
        evaluate_quests(&catalog, &mut p, &mut log, QuestEvent::Move);
        assert!(format_quest_log(&catalog, &log).contains("[ ] Walk [1/3]"));
    }
}
