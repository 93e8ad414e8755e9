//! Shared fixtures for the integration tests.

use std::sync::Arc;

use sysrpg::config::GameConfig;
use sysrpg::game::{
    standard_world, starter_quests, Dispatcher, MemoryStore, QuestCatalog, RecordingPresenter,
    ScriptedRolls,
};

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<MemoryStore>,
    pub presenter: Arc<RecordingPresenter>,
    pub rolls: Arc<ScriptedRolls>,
}

/// Standard world and starter quests on an in-memory store.
pub fn harness() -> Harness {
    harness_with(QuestCatalog::new(starter_quests()))
}

#[allow(dead_code)] // not every test binary needs a custom catalog
pub fn harness_with(catalog: QuestCatalog) -> Harness {
    let settings = GameConfig::default();
    let store = Arc::new(MemoryStore::new());
    let presenter = Arc::new(RecordingPresenter::new());
    let rolls = Arc::new(ScriptedRolls::default());
    let dispatcher = Dispatcher::new(store.clone(), standard_world(&settings), catalog, settings)
        .expect("dispatcher")
        .with_presenter(presenter.clone())
        .with_roller(rolls.clone());
    Harness {
        dispatcher: Arc::new(dispatcher),
        store,
        presenter,
        rolls,
    }
}
