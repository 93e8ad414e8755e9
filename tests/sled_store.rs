//! Sled-backed store: sparse updates, persistence across reopen, and a full
//! dispatcher session on disk.

use std::sync::Arc;

use sysrpg::config::GameConfig;
use sysrpg::game::{
    standard_world, starter_quests, Action, ActionRequest, Coords, Direction, Dispatcher,
    PlayerRecord, PlayerStore, PlayerUpdate, QuestCatalog, QuestRecord, SledStoreBuilder,
};
use tempfile::TempDir;

#[test]
fn sparse_update_leaves_other_fields_alone() {
    let dir = TempDir::new().expect("tempdir");
    let store = SledStoreBuilder::new(dir.path()).open().expect("store");
    let mut player = PlayerRecord::new(5, "Arin", Coords::new(25, 25), 100);
    player.inventory.insert("stone".to_string());
    player.stat_points = 3;
    store.put_player(player).expect("put");

    let update = PlayerUpdate {
        hp: Some(12),
        position: Some(Coords::new(30, 21)),
        ..Default::default()
    };
    let updated = store.update_player(5, &update).expect("update");
    assert_eq!(updated.hp, 12);
    assert_eq!(updated.position, Coords::new(30, 21));
    assert_eq!(updated.stat_points, 3);
    assert!(updated.inventory.contains("stone"));
    assert_eq!(updated.display_name, "Arin");
}

#[test]
fn invalid_update_is_refused_whole() {
    let dir = TempDir::new().expect("tempdir");
    let store = SledStoreBuilder::new(dir.path()).open().expect("store");
    let mut player = PlayerRecord::new(5, "Arin", Coords::new(25, 25), 100);
    player.level = 3;
    store.put_player(player).expect("put");

    let update = PlayerUpdate {
        hp: Some(1),
        level: Some(2),
        ..Default::default()
    };
    assert!(store.update_player(5, &update).is_err());
    let stored = store.get_player(5).expect("get");
    assert_eq!(stored.hp, 100);
    assert_eq!(stored.level, 3);
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    {
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        store
            .put_player(PlayerRecord::new(9, "Bexa", Coords::new(25, 25), 100))
            .expect("put");
        let mut quest = QuestRecord::new(9, "first_steps");
        quest.progress = 4;
        store.put_quest_record(quest).expect("quest");
    }
    let store = SledStoreBuilder::new(dir.path()).open().expect("reopen");
    assert_eq!(store.get_player(9).expect("get").display_name, "Bexa");
    let quest = store
        .get_quest_record(9, "first_steps")
        .expect("lookup")
        .expect("present");
    assert_eq!(quest.progress, 4);
}

#[test]
fn dispatcher_session_on_disk() {
    let dir = TempDir::new().expect("tempdir");
    let settings = GameConfig::default();
    let store = Arc::new(
        SledStoreBuilder::new(dir.path().join("db"))
            .without_flush()
            .open()
            .expect("store"),
    );
    let dispatcher = Dispatcher::new(
        store.clone(),
        standard_world(&settings),
        QuestCatalog::new(starter_quests()),
        settings,
    )
    .expect("dispatcher");
    dispatcher.start(1, "Arin").expect("start");
    for _ in 0..3 {
        dispatcher
            .handle(ActionRequest::new(1, Action::Move(Direction::East)))
            .expect("move");
    }
    assert_eq!(store.get_player(1).expect("get").position, Coords::new(28, 25));
    let quests = store.list_quest_records(1).expect("quests");
    assert_eq!(quests.len(), 1);
    assert_eq!(quests[0].progress, 3);
    assert_eq!(store.list_player_ids().expect("ids"), vec![1]);
}
