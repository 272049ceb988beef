//! End-to-end tests for the full hearthd substrate stack.
//!
//! Each test wires the real pieces together (in-memory `SQLite`, real store
//! adapter, real gateway, real keyval service) and exercises the substrate
//! the way feature modules do — no static state, one isolated registry per
//! test.

use std::sync::{Arc, Mutex};

use hearth_adapter_storage_memory::MemoryStore;
use hearth_adapter_storage_sqlite_sqlx::{Config, SqliteKeyValStore};
use hearth_app::dedup::DedupPublish;
use hearth_app::gateway::ModuleGateway;
use hearth_app::keyval::{KeyVal, KeyValHandle, ListenerOpts};
use hearth_app::ports::KeyValStore;
use hearth_app::router::listener;
use hearth_domain::group::{GroupConfig, GroupEffect};
use hearth_domain::key::KeyPath;
use hearth_domain::log::LogContext;

/// Build a fully-wired substrate backed by an in-memory `SQLite` database.
async fn substrate(groups: GroupConfig) -> (Arc<ModuleGateway>, Arc<KeyVal<SqliteKeyValStore>>, SqliteKeyValStore) {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let store = SqliteKeyValStore::new(db.pool().clone());
    let gateway = Arc::new(ModuleGateway::new());
    let keyval = KeyVal::new(Arc::clone(&gateway), store.clone(), groups);
    (gateway, keyval, store)
}

fn group_config() -> GroupConfig {
    let mut groups = GroupConfig::default();
    let trigger = KeyPath::parse("room.lights.ceiling").unwrap();
    groups.insert(
        trigger.clone(),
        KeyPath::parse("room.lights.nightstand").unwrap(),
        GroupEffect::Same,
    );
    groups.insert(
        trigger,
        KeyPath::parse("room.leds.hexes").unwrap(),
        GroupEffect::Invert,
    );
    groups
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn should_replay_requests_issued_before_init_in_order() {
    let (_gateway, keyval, store) = substrate(GroupConfig::default()).await;

    let mut tasks = Vec::new();
    for i in 0..4 {
        let handle: KeyValHandle<_> = keyval
            .external(LogContext::new(), "scene.EXTERNAL")
            .unwrap();
        tasks.push(tokio::spawn(async move {
            handle.set("scene.sequence", &i.to_string(), false).await
        }));
        settle().await;
    }

    // Nothing lands before init.
    assert_eq!(store.get("scene.sequence").await.unwrap(), None);

    keyval.init(&[]).await.unwrap();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // FIFO drain: the last queued write wins.
    assert_eq!(
        store.get("scene.sequence").await.unwrap().as_deref(),
        Some("3")
    );
}

#[tokio::test]
async fn should_propagate_group_effects_into_sqlite() {
    let (_gateway, keyval, store) = substrate(group_config()).await;
    keyval.init(&[]).await.unwrap();

    let handle = keyval
        .external(LogContext::new(), "switch.EXTERNAL")
        .unwrap();
    handle.set("room.lights.ceiling", "1", true).await.unwrap();

    assert_eq!(
        store.get("room.lights.nightstand").await.unwrap().as_deref(),
        Some("1")
    );
    assert_eq!(
        store.get("room.leds.hexes").await.unwrap().as_deref(),
        Some("0")
    );
}

#[tokio::test]
async fn should_notify_prefix_listeners_across_modules() {
    let (_gateway, keyval, _store) = substrate(GroupConfig::default()).await;
    keyval.init(&["lights".to_string()]).await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    keyval
        .add_listener(
            Some("aggregates"),
            listener(move |value, _ctx| {
                let recorded = Arc::clone(&recorded);
                async move {
                    recorded.lock().unwrap().push(value);
                    Ok(())
                }
            }),
            ListenerOpts::default(),
        )
        .unwrap();

    let handle = keyval.external(LogContext::new(), "bot.EXTERNAL").unwrap();
    // Seeded by init.
    assert_eq!(handle.get("aggregates.lights").await.unwrap(), "0");
    handle.set("aggregates.lights", "1", true).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), ["1"]);
}

#[tokio::test]
async fn should_correlate_deferred_work_with_the_caller() {
    let (_gateway, keyval, _store) = substrate(GroupConfig::default()).await;

    let ctx = LogContext::new();
    let handle = keyval.external(ctx.clone(), "cast.EXTERNAL").unwrap();
    let task = tokio::spawn(async move { handle.set("cast.active", "1", false).await });
    settle().await;
    assert!(ctx.entries().is_empty());

    keyval.init(&[]).await.unwrap();
    task.await.unwrap().unwrap();

    let messages: Vec<_> = ctx
        .entries()
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    assert!(
        messages
            .iter()
            .any(|message| message.contains("cast.active")),
        "caller context should carry the deferred call's entries, got {messages:?}"
    );
}

#[tokio::test]
async fn should_deduplicate_state_broadcasts() {
    // An ephemeral hub: same substrate, memory-backed store.
    let gateway = Arc::new(ModuleGateway::new());
    let keyval = KeyVal::new(
        Arc::clone(&gateway),
        MemoryStore::new(),
        GroupConfig::default(),
    );
    keyval.init(&[]).await.unwrap();

    // A realtime bridge pushing state changes to clients through the gate.
    let sent = Arc::new(Mutex::new(Vec::new()));
    let outbox = Arc::clone(&sent);
    let gate = Arc::new(DedupPublish::new(move |payload: String| {
        let outbox = Arc::clone(&outbox);
        async move {
            outbox.lock().unwrap().push(payload);
            Ok(1)
        }
    }));

    let broadcast = Arc::clone(&gate);
    keyval
        .add_listener(
            Some("room.devices.speakers"),
            listener(move |value, _ctx| {
                let broadcast = Arc::clone(&broadcast);
                async move { broadcast.publish(value).await.map(|_| ()) }
            }),
            ListenerOpts::default(),
        )
        .unwrap();

    let handle = keyval.external(LogContext::new(), "cast.EXTERNAL").unwrap();
    handle.set("room.devices.speakers", "1", true).await.unwrap();
    handle.set("room.devices.speakers", "1", true).await.unwrap();
    handle.set("room.devices.speakers", "0", true).await.unwrap();

    assert_eq!(*sent.lock().unwrap(), ["1", "0"]);
}
