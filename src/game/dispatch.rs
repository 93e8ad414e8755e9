//! Top-level entry point: parses actions, checks preconditions, routes to the
//! engines, commits the result and emits notifications and render requests.
//!
//! Every action runs load -> mutate in memory -> commit. Nothing reaches the
//! store unless the whole action succeeded, and nothing is delivered to the
//! presenter unless the commit did. Actions for different players run in
//! parallel; an attack holds both participants' locks, taken in ascending id
//! order.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::GameConfig;
use crate::game::combat::{attack, AttackOutcome, DamageRoller, RandomRoller};
use crate::game::errors::GameError;
use crate::game::player::{
    format_inventory, validate_display_name, PlayerRecord, PlayerUpdate,
};
use crate::game::progression::{
    breakthrough, format_status, title_for, train, BreakthroughOutcome,
};
use crate::game::quest::{
    evaluate_quests, format_quest_log, QuestCatalog, QuestEvent, QuestLog,
};
use crate::game::storage::{ChangeSet, PlayerStore};
use crate::game::types::{
    Direction, InteractionMode, NotificationEvent, Path, PlayerId, RenderRequest,
};
use crate::game::world::WorldMap;
use crate::logutil::escape_log;

/// Closed set of player actions, resolved once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Train,
    Breakthrough,
    Attack(PlayerId),
    Chat(PlayerId),
    Status,
    Inventory,
    Go(String),
    Quests,
    ChoosePath(Path),
    SetName(String),
}

/// Identifiers accepted by [`Action::parse`].
pub const ACTION_IDS: &[&str] = &[
    "move",
    "train",
    "breakthrough",
    "attack",
    "chat",
    "status",
    "inventory",
    "go",
    "quests",
    "path",
    "name",
];

fn parse_target(action_id: &str, args: Option<&str>) -> Result<PlayerId, GameError> {
    let raw = args
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| GameError::InvalidAction(format!("{} needs a target id", action_id)))?;
    raw.parse::<PlayerId>()
        .map_err(|_| GameError::InvalidAction(format!("bad target id '{}'", escape_log(raw))))
}

fn require_arg<'a>(action_id: &str, args: Option<&'a str>) -> Result<&'a str, GameError> {
    args.map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| GameError::InvalidAction(format!("{} needs an argument", action_id)))
}

fn reject_arg(action_id: &str, args: Option<&str>) -> Result<(), GameError> {
    match args.map(str::trim) {
        Some(a) if !a.is_empty() => Err(GameError::InvalidAction(format!(
            "{} takes no argument",
            action_id
        ))),
        _ => Ok(()),
    }
}

impl Action {
    /// Resolve an action identifier and its optional argument.
    pub fn parse(action_id: &str, args: Option<&str>) -> Result<Self, GameError> {
        let id = action_id.trim().to_ascii_lowercase();
        let action = match id.as_str() {
            "move" => {
                let dir = require_arg(&id, args)?;
                Action::Move(dir.parse::<Direction>().map_err(|_| {
                    GameError::InvalidAction(format!("unknown direction '{}'", escape_log(dir)))
                })?)
            }
            "train" => {
                reject_arg(&id, args)?;
                Action::Train
            }
            "breakthrough" => {
                reject_arg(&id, args)?;
                Action::Breakthrough
            }
            "attack" => Action::Attack(parse_target(&id, args)?),
            "chat" => Action::Chat(parse_target(&id, args)?),
            "status" => {
                reject_arg(&id, args)?;
                Action::Status
            }
            "inventory" => {
                reject_arg(&id, args)?;
                Action::Inventory
            }
            "quests" => {
                reject_arg(&id, args)?;
                Action::Quests
            }
            "go" => Action::Go(require_arg(&id, args)?.to_ascii_lowercase()),
            "path" => {
                let raw = require_arg(&id, args)?;
                Action::ChoosePath(raw.parse::<Path>().map_err(|_| {
                    GameError::InvalidAction(format!("unknown path '{}'", escape_log(raw)))
                })?)
            }
            "name" => Action::SetName(require_arg(&id, args)?.to_string()),
            _ => {
                return Err(GameError::InvalidAction(format!(
                    "unknown action '{}'",
                    escape_log(action_id)
                )))
            }
        };
        Ok(action)
    }

    pub fn id(&self) -> &'static str {
        match self {
            Action::Move(_) => "move",
            Action::Train => "train",
            Action::Breakthrough => "breakthrough",
            Action::Attack(_) => "attack",
            Action::Chat(_) => "chat",
            Action::Status => "status",
            Action::Inventory => "inventory",
            Action::Go(_) => "go",
            Action::Quests => "quests",
            Action::ChoosePath(_) => "path",
            Action::SetName(_) => "name",
        }
    }
}

impl FromStr for Action {
    type Err = GameError;

    /// `move:north`, `attack:42`, `status`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((id, args)) => Action::parse(id, Some(args)),
            None => Action::parse(s, None),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move(dir) => write!(f, "move:{}", dir.name()),
            Action::Attack(id) | Action::Chat(id) => write!(f, "{}:{}", self.id(), id),
            Action::Go(name) => write!(f, "go:{}", name),
            Action::ChoosePath(path) => write!(f, "path:{}", path),
            Action::SetName(name) => write!(f, "name:{}", name),
            _ => f.write_str(self.id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub player_id: PlayerId,
    pub action: Action,
}

impl ActionRequest {
    pub fn new(player_id: PlayerId, action: Action) -> Self {
        Self { player_id, action }
    }

    pub fn parse(
        player_id: PlayerId,
        action_id: &str,
        args: Option<&str>,
    ) -> Result<Self, GameError> {
        Ok(Self::new(player_id, Action::parse(action_id, args)?))
    }
}

/// Delivery failure reported by a presenter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery to player {player_id} failed: {reason}")]
pub struct DeliveryError {
    pub player_id: PlayerId,
    pub reason: String,
}

/// Presentation layer fed by the dispatcher.
pub trait Presenter: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), DeliveryError>;

    /// `screen` is the location and status text current after the action.
    fn render(&self, request: &RenderRequest, screen: &str) -> Result<(), DeliveryError>;
}

/// Presenter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn notify(&self, _event: &NotificationEvent) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn render(&self, _request: &RenderRequest, _screen: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Keeps every delivered event; individual players can be made unreachable.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    notifications: Mutex<Vec<NotificationEvent>>,
    renders: Mutex<Vec<(RenderRequest, String)>>,
    unreachable: Mutex<HashSet<PlayerId>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, player_id: PlayerId, unreachable: bool) {
        let mut set = relock(&self.unreachable);
        if unreachable {
            set.insert(player_id);
        } else {
            set.remove(&player_id);
        }
    }

    pub fn notifications(&self) -> Vec<NotificationEvent> {
        relock(&self.notifications).clone()
    }

    pub fn notifications_for(&self, player_id: PlayerId) -> Vec<NotificationEvent> {
        relock(&self.notifications)
            .iter()
            .filter(|n| n.target_player_id == player_id)
            .cloned()
            .collect()
    }

    pub fn renders(&self) -> Vec<(RenderRequest, String)> {
        relock(&self.renders).clone()
    }

    pub fn clear(&self) {
        relock(&self.notifications).clear();
        relock(&self.renders).clear();
    }

    fn check_reachable(&self, player_id: PlayerId) -> Result<(), DeliveryError> {
        if relock(&self.unreachable).contains(&player_id) {
            return Err(DeliveryError {
                player_id,
                reason: "unreachable".to_string(),
            });
        }
        Ok(())
    }
}

impl Presenter for RecordingPresenter {
    fn notify(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        self.check_reachable(event.target_player_id)?;
        relock(&self.notifications).push(event.clone());
        Ok(())
    }

    fn render(&self, request: &RenderRequest, screen: &str) -> Result<(), DeliveryError> {
        self.check_reachable(request.player_id)?;
        relock(&self.renders).push((*request, screen.to_string()));
        Ok(())
    }
}

/// What an applied action produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    pub notifications: Vec<NotificationEvent>,
    pub renders: Vec<RenderRequest>,
    /// Notifications or renders the presenter failed to deliver. The action
    /// itself was still committed.
    pub undelivered: usize,
}

impl ActionReport {
    pub fn texts_for(&self, player_id: PlayerId) -> Vec<&str> {
        self.notifications
            .iter()
            .filter(|n| n.target_player_id == player_id)
            .map(|n| n.text.as_str())
            .collect()
    }
}

/// Engine mutations of one action, before commit.
struct Effects {
    notes: Vec<NotificationEvent>,
    renders: Vec<PlayerId>,
}

impl Effects {
    fn for_player(player_id: PlayerId) -> Self {
        Self {
            notes: Vec::new(),
            renders: vec![player_id],
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn PlayerStore>,
    world: Arc<WorldMap>,
    catalog: Arc<QuestCatalog>,
    settings: GameConfig,
    roller: Arc<dyn DamageRoller>,
    presenter: Arc<dyn Presenter>,
    locks: Mutex<HashMap<PlayerId, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    /// Fails when the world's spawn cell is not walkable: new and defeated
    /// players would be stuck there.
    pub fn new(
        store: Arc<dyn PlayerStore>,
        world: WorldMap,
        catalog: QuestCatalog,
        settings: GameConfig,
    ) -> Result<Self, GameError> {
        let spawn = world.spawn();
        if !world.is_walkable(spawn) {
            return Err(GameError::precondition(format!(
                "spawn {} is not a walkable cell of the world",
                spawn
            )));
        }
        Ok(Self {
            store,
            world: Arc::new(world),
            catalog: Arc::new(catalog),
            settings,
            roller: Arc::new(RandomRoller),
            presenter: Arc::new(NullPresenter),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_roller(mut self, roller: Arc<dyn DamageRoller>) -> Self {
        self.roller = roller;
        self
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn world(&self) -> &WorldMap {
        &self.world
    }

    pub fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn PlayerStore {
        self.store.as_ref()
    }

    pub fn player(&self, player_id: PlayerId) -> Result<PlayerRecord, GameError> {
        self.store.get_player(player_id)
    }

    /// Registry entry for `player_id`. Entries nobody else holds are pruned
    /// first, so ids that never became players do not accumulate.
    fn lock_for(&self, player_id: PlayerId) -> Arc<Mutex<()>> {
        let mut locks = relock(&self.locks);
        locks.retain(|id, lock| *id == player_id || Arc::strong_count(lock) > 1);
        locks
            .entry(player_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        relock(&self.locks).len()
    }

    /// Location plus a one-line status summary.
    pub fn screen(&self, player: &PlayerRecord) -> String {
        format!(
            "{}\n{} the {} | Lv {} ({}/{} XP) | HP {}/{}",
            self.world.describe(player.position),
            player.display_name,
            title_for(player.rank_index),
            player.level,
            player.xp,
            player.xp_to_next_level,
            player.hp,
            player.max_hp
        )
    }

    /// First contact. Creates the record at spawn with no path; later calls
    /// just greet the player again.
    pub fn start(
        &self,
        player_id: PlayerId,
        display_name: &str,
    ) -> Result<ActionReport, GameError> {
        let lock = self.lock_for(player_id);
        let _guard = relock(&lock);

        let (mut player, created) = match self.store.find_player(player_id)? {
            Some(existing) => (existing, false),
            None => {
                let name = validate_display_name(display_name).unwrap_or_else(|_| {
                    debug!(
                        "player {} offered unusable name '{}'",
                        player_id,
                        escape_log(display_name)
                    );
                    format!("Player {}", player_id)
                });
                let record = PlayerRecord::new(
                    player_id,
                    &name,
                    self.world.spawn(),
                    self.settings.default_hp,
                );
                (record, true)
            }
        };
        let before = player.clone();
        let mut log = QuestLog::new(player_id, self.store.list_quest_records(player_id)?);

        let mut effects = Effects::for_player(player_id);
        if created {
            info!("new player {} ({})", player_id, escape_log(&player.display_name));
            effects.notes.push(NotificationEvent::info(
                player_id,
                format!(
                    "Welcome, {}! Your journey begins here. \
                     Choose a path with path:cultivation or path:mana.",
                    player.display_name
                ),
            ));
        } else {
            effects.notes.push(NotificationEvent::info(
                player_id,
                format!("Welcome back, {}.", player.display_name),
            ));
        }
        effects
            .notes
            .extend(evaluate_quests(&self.catalog, &mut player, &mut log, QuestEvent::Login));

        let changes = if created {
            ChangeSet::new().with_new_player(player.clone())
        } else {
            ChangeSet::new().with_player(player_id, PlayerUpdate::diff(&before, &player))
        };
        self.store.commit(changes.with_quests(log.take_changes()))?;
        Ok(self.deliver(effects))
    }

    /// Apply one action.
    pub fn handle(&self, request: ActionRequest) -> Result<ActionReport, GameError> {
        let ActionRequest { player_id, action } = request;
        debug!("player {} -> {}", player_id, escape_log(&action.to_string()));
        let result = match action {
            Action::Attack(target) => self.handle_attack(player_id, target),
            other => self.handle_solo(player_id, other),
        };
        if let Err(e) = &result {
            warn!("player {} action rejected: {}", player_id, e);
        }
        result
    }

    /// Inbound free text. While chatting it is relayed to the chat partner,
    /// and the mode drops back to idle whether or not the relay got through.
    /// A store failure while looking up the partner fails the whole action.
    pub fn handle_text(
        &self,
        player_id: PlayerId,
        text: &str,
    ) -> Result<ActionReport, GameError> {
        let lock = self.lock_for(player_id);
        let _guard = relock(&lock);

        let mut player = self.store.get_player(player_id)?;
        let InteractionMode::Chatting(target_id) = player.mode else {
            return Err(GameError::InvalidAction(
                "not in a conversation; use chat:<player id> first".to_string(),
            ));
        };
        let before = player.clone();
        let mut log = QuestLog::new(player_id, self.store.list_quest_records(player_id)?);

        let target_known = self.store.find_player(target_id)?.is_some();
        player.end_chat();
        let mut effects = Effects::for_player(player_id);
        effects
            .notes
            .extend(evaluate_quests(&self.catalog, &mut player, &mut log, QuestEvent::Chat));
        self.store.commit(
            ChangeSet::new()
                .with_player(player_id, PlayerUpdate::diff(&before, &player))
                .with_quests(log.take_changes()),
        )?;

        debug!("player {} -> {}: {}", player_id, target_id, escape_log(text));
        let relay = NotificationEvent::info(
            target_id,
            format!("{} says: {}", player.display_name, text.trim()),
        );
        let relayed = target_known
            && match self.presenter.notify(&relay) {
                Ok(()) => true,
                Err(e) => {
                    warn!("chat relay from {} failed: {}", player_id, e);
                    false
                }
            };
        effects.notes.insert(
            0,
            if relayed {
                NotificationEvent::success(player_id, "Message sent.")
            } else {
                NotificationEvent::warning(player_id, "Your message could not be delivered.")
            },
        );
        let mut report = self.deliver(effects);
        if relayed {
            report.notifications.insert(0, relay);
        }
        Ok(report)
    }

    fn handle_solo(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<ActionReport, GameError> {
        let lock = self.lock_for(player_id);
        let _guard = relock(&lock);

        let mut player = self.store.get_player(player_id)?;
        let before = player.clone();
        let mut log = QuestLog::new(player_id, self.store.list_quest_records(player_id)?);
        let mut effects = Effects::for_player(player_id);

        let event = self.apply(&action, &mut player, &log, &mut effects)?;
        effects
            .notes
            .extend(evaluate_quests(&self.catalog, &mut player, &mut log, event));

        self.store.commit(
            ChangeSet::new()
                .with_player(player_id, PlayerUpdate::diff(&before, &player))
                .with_quests(log.take_changes()),
        )?;
        Ok(self.deliver(effects))
    }

    /// Route a single-player action to its engine. Errors leave `player`
    /// untouched.
    fn apply(
        &self,
        action: &Action,
        player: &mut PlayerRecord,
        log: &QuestLog,
        effects: &mut Effects,
    ) -> Result<QuestEvent, GameError> {
        let id = player.id;
        let event = match action {
            Action::Move(direction) => {
                if self.world.move_player(player, *direction) {
                    QuestEvent::Move
                } else {
                    effects.notes.push(NotificationEvent::warning(
                        id,
                        format!("You cannot go {} from here.", direction.name()),
                    ));
                    QuestEvent::MoveBlocked
                }
            }
            Action::Go(exit) => {
                if !self.world.take_exit(player, exit) {
                    return Err(GameError::precondition(format!(
                        "no exit named '{}' here",
                        escape_log(exit)
                    )));
                }
                QuestEvent::Move
            }
            Action::Train => {
                let path = Self::require_path(player)?;
                let result = train(
                    player,
                    self.settings.train_path_xp,
                    self.settings.train_xp,
                );
                effects.notes.push(NotificationEvent::info(
                    id,
                    format!(
                        "You train along the {} path (+{} path XP).",
                        path.display_name(),
                        result.path_xp_gained
                    ),
                ));
                effects.notes.extend(result.xp.notifications(id));
                if result.breakthrough_ready {
                    effects.notes.push(NotificationEvent::success(
                        id,
                        "You feel ready for a breakthrough.",
                    ));
                }
                QuestEvent::Train
            }
            Action::Breakthrough => {
                Self::require_path(player)?;
                match breakthrough(player) {
                    BreakthroughOutcome::Advanced { new_rank, .. } => {
                        effects.notes.push(NotificationEvent::success(
                            id,
                            format!(
                                "Breakthrough! You are now {}. Title: {}.",
                                new_rank,
                                title_for(player.rank_index)
                            ),
                        ));
                    }
                    BreakthroughOutcome::NotReady { path_xp, needed } => {
                        let text = match needed {
                            Some(needed) => format!(
                                "Not ready to break through ({}/{} path XP).",
                                path_xp, needed
                            ),
                            None => "You stand at the peak. No further rank awaits.".to_string(),
                        };
                        effects.notes.push(NotificationEvent::info(id, text));
                    }
                }
                QuestEvent::Breakthrough
            }
            Action::Chat(target_id) => {
                let target = self.target(player, *target_id)?;
                if !player.is_colocated_with(&target) {
                    return Err(GameError::precondition(format!(
                        "{} is not here",
                        target.display_name
                    )));
                }
                player.begin_chat(target.id);
                effects.notes.push(NotificationEvent::info(
                    id,
                    format!(
                        "You are talking to {}. Your next message will be passed on.",
                        target.display_name
                    ),
                ));
                QuestEvent::Chat
            }
            Action::Status => {
                effects
                    .notes
                    .push(NotificationEvent::info(id, format_status(player)));
                QuestEvent::Profile
            }
            Action::Inventory => {
                effects
                    .notes
                    .push(NotificationEvent::info(id, format_inventory(player)));
                QuestEvent::View
            }
            Action::Quests => {
                effects.notes.push(NotificationEvent::info(
                    id,
                    format_quest_log(&self.catalog, log),
                ));
                QuestEvent::View
            }
            Action::ChoosePath(path) => {
                player.choose_path(*path)?;
                info!("player {} chose the {} path", id, path);
                effects.notes.push(NotificationEvent::success(
                    id,
                    format!("You have chosen the {} path.", path.display_name()),
                ));
                QuestEvent::Profile
            }
            Action::SetName(name) => {
                player.set_display_name(name)?;
                effects.notes.push(NotificationEvent::info(
                    id,
                    format!("You are now known as {}.", player.display_name),
                ));
                QuestEvent::Profile
            }
            Action::Attack(_) => {
                return Err(GameError::InvalidAction(
                    "attack is resolved across two players".to_string(),
                ))
            }
        };
        Ok(event)
    }

    fn handle_attack(
        &self,
        attacker_id: PlayerId,
        defender_id: PlayerId,
    ) -> Result<ActionReport, GameError> {
        if attacker_id == defender_id {
            return Err(GameError::precondition("you cannot attack yourself"));
        }
        let (first, second) = if attacker_id < defender_id {
            (attacker_id, defender_id)
        } else {
            (defender_id, attacker_id)
        };
        let first_lock = self.lock_for(first);
        let second_lock = self.lock_for(second);
        let _first_guard = relock(&first_lock);
        let _second_guard = relock(&second_lock);

        let mut attacker = self.store.get_player(attacker_id)?;
        let mut defender = self.target(&attacker, defender_id)?;
        let attacker_before = attacker.clone();
        let defender_before = defender.clone();
        let mut log = QuestLog::new(
            attacker_id,
            self.store.list_quest_records(attacker_id)?,
        );

        let outcome = attack(
            &attacker,
            &mut defender,
            self.settings.damage_range(),
            self.roller.as_ref(),
            self.world.spawn(),
        );
        let mut effects = Effects::for_player(attacker_id);
        effects
            .notes
            .extend(outcome.notifications(&attacker, &defender));
        if matches!(outcome, AttackOutcome::Defeated { .. }) {
            effects.renders.push(defender_id);
        }
        effects.notes.extend(evaluate_quests(
            &self.catalog,
            &mut attacker,
            &mut log,
            QuestEvent::Attack,
        ));

        self.store.commit(
            ChangeSet::new()
                .with_player(
                    attacker_id,
                    PlayerUpdate::diff(&attacker_before, &attacker),
                )
                .with_player(
                    defender_id,
                    PlayerUpdate::diff(&defender_before, &defender),
                )
                .with_quests(log.take_changes()),
        )?;
        Ok(self.deliver(effects))
    }

    fn require_path(player: &PlayerRecord) -> Result<Path, GameError> {
        player.path.ok_or_else(|| {
            GameError::precondition("choose a path first (path:cultivation or path:mana)")
        })
    }

    fn target(
        &self,
        player: &PlayerRecord,
        target_id: PlayerId,
    ) -> Result<PlayerRecord, GameError> {
        if target_id == player.id {
            return Err(GameError::precondition("that is you"));
        }
        self.store
            .find_player(target_id)?
            .ok_or_else(|| GameError::NotFound(format!("player: {}", target_id)))
    }

    /// Hand committed effects to the presenter. Delivery failures are logged
    /// and counted, never turned into action failures.
    fn deliver(&self, effects: Effects) -> ActionReport {
        let mut report = ActionReport::default();
        for note in &effects.notes {
            if let Err(e) = self.presenter.notify(note) {
                warn!("{}", e);
                report.undelivered += 1;
            }
        }
        for player_id in effects.renders {
            let request = RenderRequest { player_id };
            match self.store.find_player(player_id) {
                Ok(Some(player)) => {
                    if let Err(e) = self.presenter.render(&request, &self.screen(&player)) {
                        warn!("{}", e);
                        report.undelivered += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("render for player {} skipped: {}", player_id, e);
                    report.undelivered += 1;
                }
            }
            report.renders.push(request);
        }
        report.notifications = effects.notes;
        report
    }
}
