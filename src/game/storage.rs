use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use log::{debug, warn};
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::player::{PlayerRecord, PlayerUpdate};
use crate::game::types::{PlayerId, QuestRecord, PLAYER_SCHEMA_VERSION, QUEST_SCHEMA_VERSION};

const TREE_PRIMARY: &str = "sysrpg";
const PLAYERS_PREFIX: &str = "players:";
const QUESTS_PREFIX: &str = "quests:";

/// Every write produced by one action. Committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Records written whole, before any update below is applied.
    pub created: Vec<PlayerRecord>,
    pub players: Vec<(PlayerId, PlayerUpdate)>,
    pub quests: Vec<QuestRecord>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_player(mut self, record: PlayerRecord) -> Self {
        self.created.push(record);
        self
    }

    /// Empty updates are dropped.
    pub fn with_player(mut self, id: PlayerId, update: PlayerUpdate) -> Self {
        if !update.is_empty() {
            self.players.push((id, update));
        }
        self
    }

    pub fn with_quests(mut self, records: Vec<QuestRecord>) -> Self {
        self.quests.extend(records);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.players.is_empty() && self.quests.is_empty()
    }
}

/// Persistence boundary for player and quest records.
///
/// Implementations keep at most one quest record per (player, quest) pair and
/// refuse to move a completed record back to active.
pub trait PlayerStore: Send + Sync {
    fn find_player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, GameError>;

    fn get_player(&self, id: PlayerId) -> Result<PlayerRecord, GameError> {
        self.find_player(id)?
            .ok_or_else(|| GameError::NotFound(format!("player: {}", id)))
    }

    /// Insert or overwrite a whole record.
    fn put_player(&self, player: PlayerRecord) -> Result<(), GameError>;

    /// Write only the fields present in `update`; returns the stored result.
    fn update_player(
        &self,
        id: PlayerId,
        update: &PlayerUpdate,
    ) -> Result<PlayerRecord, GameError>;

    fn list_player_ids(&self) -> Result<Vec<PlayerId>, GameError>;

    fn get_quest_record(
        &self,
        player_id: PlayerId,
        quest_id: &str,
    ) -> Result<Option<QuestRecord>, GameError>;

    fn list_quest_records(&self, player_id: PlayerId) -> Result<Vec<QuestRecord>, GameError>;

    fn put_quest_record(&self, record: QuestRecord) -> Result<(), GameError> {
        self.commit(ChangeSet::new().with_quests(vec![record]))
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), GameError>;
}

fn check_quest_transition(
    existing: Option<&QuestRecord>,
    next: &QuestRecord,
) -> Result<(), GameError> {
    if let Some(current) = existing {
        if current.is_complete() && !next.is_complete() {
            return Err(GameError::precondition(format!(
                "quest {} is already completed for player {}",
                next.quest_id, next.player_id
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MemoryTables {
    players: HashMap<PlayerId, PlayerRecord>,
    quests: BTreeMap<(PlayerId, String), QuestRecord>,
}

/// In-process store. `set_unavailable(true)` makes every call fail with
/// `StoreFailure`, which is how tests exercise backend outages.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), GameError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GameError::StoreFailure("memory store unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryTables>, GameError> {
        self.check_available()?;
        self.tables
            .read()
            .map_err(|_| GameError::StoreFailure("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryTables>, GameError> {
        self.check_available()?;
        self.tables
            .write()
            .map_err(|_| GameError::StoreFailure("memory store lock poisoned".into()))
    }
}

impl PlayerStore for MemoryStore {
    fn find_player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, GameError> {
        Ok(self.read()?.players.get(&id).cloned())
    }

    fn put_player(&self, mut player: PlayerRecord) -> Result<(), GameError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.validate()?;
        self.write()?.players.insert(player.id, player);
        Ok(())
    }

    fn update_player(
        &self,
        id: PlayerId,
        update: &PlayerUpdate,
    ) -> Result<PlayerRecord, GameError> {
        let mut tables = self.write()?;
        let record = tables
            .players
            .get_mut(&id)
            .ok_or_else(|| GameError::NotFound(format!("player: {}", id)))?;
        update.apply_to(record)?;
        Ok(record.clone())
    }

    fn list_player_ids(&self) -> Result<Vec<PlayerId>, GameError> {
        let mut ids: Vec<PlayerId> = self.read()?.players.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn get_quest_record(
        &self,
        player_id: PlayerId,
        quest_id: &str,
    ) -> Result<Option<QuestRecord>, GameError> {
        Ok(self
            .read()?
            .quests
            .get(&(player_id, quest_id.to_string()))
            .cloned())
    }

    fn list_quest_records(&self, player_id: PlayerId) -> Result<Vec<QuestRecord>, GameError> {
        Ok(self
            .read()?
            .quests
            .range((player_id, String::new())..)
            .take_while(|((pid, _), _)| *pid == player_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), GameError> {
        let mut tables = self.write()?;

        // Stage everything first so a rejected change leaves the tables untouched.
        let mut staged_players = Vec::with_capacity(changes.created.len() + changes.players.len());
        for mut record in changes.created {
            record.schema_version = PLAYER_SCHEMA_VERSION;
            record.validate()?;
            staged_players.push(record);
        }
        for (id, update) in &changes.players {
            let mut record = staged_players
                .iter()
                .rev()
                .find(|p: &&PlayerRecord| p.id == *id)
                .cloned()
                .or_else(|| tables.players.get(id).cloned())
                .ok_or_else(|| GameError::NotFound(format!("player: {}", id)))?;
            update.apply_to(&mut record)?;
            staged_players.push(record);
        }
        let mut staged_quests = Vec::with_capacity(changes.quests.len());
        for mut record in changes.quests {
            record.schema_version = QUEST_SCHEMA_VERSION;
            let key = (record.player_id, record.quest_id.clone());
            check_quest_transition(tables.quests.get(&key), &record)?;
            staged_quests.push((key, record));
        }

        for record in staged_players {
            tables.players.insert(record.id, record);
        }
        for (key, record) in staged_quests {
            tables.quests.insert(key, record);
        }
        Ok(())
    }
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledStoreBuilder {
    path: PathBuf,
    flush_on_commit: bool,
}

impl SledStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_commit: true,
        }
    }

    /// Skip the fsync after each commit (faster tests, weaker durability).
    pub fn without_flush(mut self) -> Self {
        self.flush_on_commit = false;
        self
    }

    pub fn open(self) -> Result<SledStore, GameError> {
        SledStore::open_with_options(self.path, self.flush_on_commit)
    }
}

/// Sled-backed persistence for player and quest records.
pub struct SledStore {
    _db: sled::Db,
    primary: sled::Tree,
    flush_on_commit: bool,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(
        path: P,
        flush_on_commit: bool,
    ) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        debug!("opened player store at {}", path_ref.display());
        Ok(Self {
            _db: db,
            primary,
            flush_on_commit,
        })
    }

    fn player_key(id: PlayerId) -> Vec<u8> {
        format!("{}{:020}", PLAYERS_PREFIX, id).into_bytes()
    }

    fn quest_prefix(player_id: PlayerId) -> Vec<u8> {
        format!("{}{:020}:", QUESTS_PREFIX, player_id).into_bytes()
    }

    fn quest_key(player_id: PlayerId, quest_id: &str) -> Vec<u8> {
        let mut key = Self::quest_prefix(player_id);
        key.extend_from_slice(quest_id.as_bytes());
        key
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(bytes)?)
    }

    fn decode_player(bytes: &IVec) -> Result<PlayerRecord, GameError> {
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn decode_quest(bytes: &IVec) -> Result<QuestRecord, GameError> {
        let record: QuestRecord = Self::deserialize(bytes)?;
        if record.schema_version != QUEST_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "quest",
                expected: QUEST_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn flush(&self) -> Result<(), GameError> {
        if self.flush_on_commit {
            self.primary.flush()?;
        }
        Ok(())
    }
}

impl PlayerStore for SledStore {
    fn find_player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, GameError> {
        match self.primary.get(Self::player_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_player(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_player(&self, mut player: PlayerRecord) -> Result<(), GameError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.validate()?;
        let bytes = Self::serialize(&player)?;
        self.primary.insert(Self::player_key(player.id), bytes)?;
        self.flush()
    }

    fn update_player(
        &self,
        id: PlayerId,
        update: &PlayerUpdate,
    ) -> Result<PlayerRecord, GameError> {
        let mut record = self.get_player(id)?;
        update.apply_to(&mut record)?;
        let bytes = Self::serialize(&record)?;
        self.primary.insert(Self::player_key(id), bytes)?;
        self.flush()?;
        Ok(record)
    }

    fn list_player_ids(&self) -> Result<Vec<PlayerId>, GameError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(PLAYERS_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            match text.strip_prefix(PLAYERS_PREFIX).map(str::parse::<PlayerId>) {
                Some(Ok(id)) => ids.push(id),
                _ => warn!("skipping malformed player key {}", text),
            }
        }
        Ok(ids)
    }

    fn get_quest_record(
        &self,
        player_id: PlayerId,
        quest_id: &str,
    ) -> Result<Option<QuestRecord>, GameError> {
        match self.primary.get(Self::quest_key(player_id, quest_id))? {
            Some(bytes) => Ok(Some(Self::decode_quest(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_quest_records(&self, player_id: PlayerId) -> Result<Vec<QuestRecord>, GameError> {
        let mut records = Vec::new();
        for entry in self.primary.scan_prefix(Self::quest_prefix(player_id)) {
            let (_, bytes) = entry?;
            records.push(Self::decode_quest(&bytes)?);
        }
        Ok(records)
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), GameError> {
        let mut batch = sled::Batch::default();
        let mut staged: HashMap<PlayerId, PlayerRecord> = HashMap::new();

        for mut record in changes.created {
            record.schema_version = PLAYER_SCHEMA_VERSION;
            record.validate()?;
            staged.insert(record.id, record);
        }
        for (id, update) in &changes.players {
            let mut record = match staged.remove(id) {
                Some(record) => record,
                None => self.get_player(*id)?,
            };
            update.apply_to(&mut record)?;
            staged.insert(*id, record);
        }
        for record in staged.values() {
            batch.insert(Self::player_key(record.id), Self::serialize(record)?);
        }

        for mut record in changes.quests {
            record.schema_version = QUEST_SCHEMA_VERSION;
            let existing = self.get_quest_record(record.player_id, &record.quest_id)?;
            check_quest_transition(existing.as_ref(), &record)?;
            batch.insert(
                Self::quest_key(record.player_id, &record.quest_id),
                Self::serialize(&record)?,
            );
        }

        self.primary.apply_batch(batch)?;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Coords;
    use tempfile::TempDir;

    fn player(id: PlayerId) -> PlayerRecord {
        PlayerRecord::new(id, "tester", Coords::new(25, 25), 100)
    }

    #[test]
    fn memory_store_sparse_update_keeps_other_fields() {
        let store = MemoryStore::new();
        let mut record = player(1);
        record.inventory.insert("stone".into());
        store.put_player(record).expect("put");

        let update = PlayerUpdate {
            hp: Some(40),
            ..Default::default()
        };
        let updated = store.update_player(1, &update).expect("update");
        assert_eq!(updated.hp, 40);
        assert!(updated.inventory.contains("stone"));
        assert_eq!(updated.position, Coords::new(25, 25));
    }

    #[test]
    fn memory_store_unavailable_fails_every_call() {
        let store = MemoryStore::new();
        store.put_player(player(1)).expect("put");
        store.set_unavailable(true);
        let err = store.find_player(1).unwrap_err();
        assert!(err.is_store_failure());
        store.set_unavailable(false);
        assert!(store.find_player(1).expect("find").is_some());
    }

    #[test]
    fn memory_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.put_player(player(1)).expect("put");
        let mut done = QuestRecord::new(1, "q");
        done.mark_complete();
        store.put_quest_record(done).expect("complete");

        let changes = ChangeSet::new()
            .with_player(
                1,
                PlayerUpdate {
                    hp: Some(10),
                    ..Default::default()
                },
            )
            .with_quests(vec![QuestRecord::new(1, "q")]);
        assert!(store.commit(changes).is_err());
        assert_eq!(store.get_player(1).expect("get").hp, 100);
        assert!(store
            .get_quest_record(1, "q")
            .expect("quest")
            .expect("present")
            .is_complete());
    }

    #[test]
    fn sled_store_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        store.put_player(player(7)).expect("put");
        store.put_player(player(3)).expect("put");

        let fetched = store.get_player(7).expect("get");
        assert_eq!(fetched.display_name, "tester");
        assert_eq!(store.list_player_ids().expect("ids"), vec![3, 7]);
        assert!(matches!(store.get_player(99), Err(GameError::NotFound(_))));
    }

    #[test]
    fn sled_commit_writes_players_and_quests() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        store.put_player(player(1)).expect("put");

        let mut record = QuestRecord::new(1, "first_steps");
        record.progress = 3;
        let changes = ChangeSet::new()
            .with_player(
                1,
                PlayerUpdate {
                    position: Some(Coords::new(26, 25)),
                    ..Default::default()
                },
            )
            .with_quests(vec![record]);
        store.commit(changes).expect("commit");

        assert_eq!(store.get_player(1).expect("get").position, Coords::new(26, 25));
        let quests = store.list_quest_records(1).expect("quests");
        assert_eq!(quests.len(), 1);
        assert_eq!(quests[0].progress, 3);
        assert!(store.list_quest_records(2).expect("quests").is_empty());
    }

    #[test]
    fn sled_refuses_completed_to_active() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = QuestRecord::new(1, "q");
        record.mark_complete();
        store.put_quest_record(record).expect("complete");
        let err = store.put_quest_record(QuestRecord::new(1, "q")).unwrap_err();
        assert!(matches!(err, GameError::PreconditionFailed(_)));
    }
}
