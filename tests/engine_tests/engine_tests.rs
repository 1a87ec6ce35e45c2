//! Tests for QueueEngine
//!
//! These tests verify:
//! - FIFO delivery and depth accounting
//! - Empty / unknown channel signals
//! - Registry ordering and implicit registration
//! - Serialized mutation under concurrent callers
//! - Delivered-record policies, recovery policies, commit modes
//! - Failure semantics with a fault-injecting store
//! - Persistence across reopen

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use atlasq::config::{
    CommitMode, Config, DeliveredRecordPolicy, LockGranularity, RecoveryPolicy, WalSyncStrategy,
};
use atlasq::engine::QueueEngine;
use atlasq::protocol::{Command, Status};
use atlasq::storage::{KvStore, MemoryStore, WriteBatch, WriteOptions};
use atlasq::QueueError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_engine(config: Config) -> QueueEngine {
    QueueEngine::new(Arc::new(MemoryStore::new()), config)
}

fn setup_temp_engine() -> (TempDir, QueueEngine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = QueueEngine::open(durable_config(&temp_dir)).unwrap();
    (temp_dir, engine)
}

fn durable_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn raw_get(engine: &QueueEngine, key: &str) -> Option<Vec<u8>> {
    engine.store().get(key.as_bytes()).unwrap()
}

fn raw_put(engine: &QueueEngine, key: &str, value: &str) {
    engine
        .store()
        .put(key.as_bytes(), value.as_bytes(), &WriteOptions::default())
        .unwrap();
}

/// MemoryStore that fails any write touching `fail_key`
#[derive(Default)]
struct FaultyStore {
    inner: MemoryStore,
    fail_key: Mutex<Option<Vec<u8>>>,
}

impl FaultyStore {
    fn fail_on(&self, key: &str) {
        *self.fail_key.lock().unwrap() = Some(key.as_bytes().to_vec());
    }

    fn heal(&self) {
        *self.fail_key.lock().unwrap() = None;
    }
}

impl KvStore for FaultyStore {
    fn get(&self, key: &[u8]) -> atlasq::Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn write(&self, batch: WriteBatch, options: &WriteOptions) -> atlasq::Result<()> {
        if let Some(fail_key) = self.fail_key.lock().unwrap().as_deref() {
            if batch.operations().iter().any(|op| op.key() == fail_key) {
                return Err(QueueError::Storage("injected write failure".to_string()));
            }
        }
        self.inner.write(batch, options)
    }
}

fn faulty_engine(config: Config) -> (Arc<FaultyStore>, QueueEngine) {
    let store = Arc::new(FaultyStore::default());
    let engine = QueueEngine::new(store.clone(), config);
    (store, engine)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_fifo_order() {
    let engine = QueueEngine::in_memory();

    for i in 0..20 {
        engine.enqueue("jobs", format!("job-{}", i)).unwrap();
    }
    for i in 0..20 {
        assert_eq!(engine.dequeue("jobs").unwrap(), format!("job-{}", i).as_bytes());
    }
}

#[test]
fn test_enqueue_assigns_gapless_sequences() {
    let engine = QueueEngine::in_memory();

    assert_eq!(engine.enqueue("jobs", "a").unwrap(), 1);
    assert_eq!(engine.enqueue("jobs", "b").unwrap(), 2);
    assert_eq!(engine.enqueue("jobs", "c").unwrap(), 3);
    assert_eq!(engine.enqueue("other", "x").unwrap(), 1);
}

#[test]
fn test_depth_accounting() {
    let engine = QueueEngine::in_memory();

    for _ in 0..7 {
        engine.enqueue("jobs", "v").unwrap();
    }
    for _ in 0..3 {
        engine.dequeue("jobs").unwrap();
    }

    assert_eq!(engine.depth("jobs").unwrap(), 4);
}

#[test]
fn test_depth_of_unknown_channel_is_zero() {
    let engine = QueueEngine::in_memory();
    assert_eq!(engine.depth("nobody").unwrap(), 0);
}

#[test]
fn test_orders_scenario() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("orders", "x").unwrap();
    engine.enqueue("orders", "y").unwrap();
    assert_eq!(engine.depth("orders").unwrap(), 2);

    assert_eq!(engine.dequeue("orders").unwrap(), "x".as_bytes());
    assert_eq!(engine.depth("orders").unwrap(), 1);

    assert_eq!(engine.dequeue("orders").unwrap(), "y".as_bytes());
    assert_eq!(engine.depth("orders").unwrap(), 0);

    assert!(matches!(
        engine.dequeue("orders"),
        Err(QueueError::QueueEmpty(ref name)) if name == "orders"
    ));
}

#[test]
fn test_binary_values_round_trip() {
    let engine = QueueEngine::in_memory();
    let value: Vec<u8> = (0..=255).collect();

    engine.enqueue("bin", value.clone()).unwrap();
    assert_eq!(engine.dequeue("bin").unwrap(), value);
}

// =============================================================================
// Empty / Unknown Channel Tests
// =============================================================================

#[test]
fn test_dequeue_empty_channel() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "only").unwrap();
    engine.dequeue("jobs").unwrap();

    let err = engine.dequeue("jobs").unwrap_err();
    assert!(matches!(err, QueueError::QueueEmpty(_)));
    assert_eq!(engine.depth("jobs").unwrap(), 0);
}

#[test]
fn test_empty_dequeue_resets_cursors() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();
    engine.dequeue("jobs").unwrap();
    engine.dequeue("jobs").unwrap();

    assert_eq!(raw_get(&engine, "jobs:getpos"), Some(b"2".to_vec()));
    assert!(engine.dequeue("jobs").is_err());
    assert_eq!(raw_get(&engine, "jobs:getpos"), Some(b"0".to_vec()));
    assert_eq!(raw_get(&engine, "jobs:setpos"), Some(b"0".to_vec()));

    // Numbering restarts after the reset
    assert_eq!(engine.enqueue("jobs", "c").unwrap(), 1);
    assert_eq!(engine.dequeue("jobs").unwrap(), "c".as_bytes());
}

#[test]
fn test_dequeue_unknown_channel() {
    let engine = QueueEngine::in_memory();

    assert!(matches!(
        engine.dequeue("ghost"),
        Err(QueueError::ChannelNotFound(ref name)) if name == "ghost"
    ));

    engine.enqueue("ghost", "boo").unwrap();
    assert!(engine.list_channels().unwrap().contains(&"ghost".to_string()));
    assert_eq!(engine.dequeue("ghost").unwrap(), "boo".as_bytes());
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_list_channels_in_registration_order() {
    let engine = QueueEngine::in_memory();
    assert!(engine.list_channels().unwrap().is_empty());

    engine.enqueue("A", "1").unwrap();
    engine.enqueue("B", "1").unwrap();
    engine.enqueue("C", "1").unwrap();
    engine.enqueue("A", "2").unwrap();

    assert_eq!(engine.list_channels().unwrap(), vec!["A", "B", "C"]);
}

#[test]
fn test_status_reports_every_channel() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("a", "1").unwrap();
    engine.enqueue("a", "2").unwrap();
    engine.enqueue("b", "1").unwrap();
    engine.dequeue("a").unwrap();

    let status = engine.status().unwrap();
    assert_eq!(status.len(), 2);
    let cursors: Vec<_> = status
        .iter()
        .map(|s| (s.name.as_str(), s.head, s.tail, s.depth))
        .collect();
    assert_eq!(cursors, vec![("a", 1, 2, 1), ("b", 0, 1, 1)]);
}

#[test]
fn test_remove_channel_keeps_records() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();
    engine.remove_channel("jobs").unwrap();

    assert!(engine.list_channels().unwrap().is_empty());
    assert!(matches!(engine.dequeue("jobs"), Err(QueueError::ChannelNotFound(_))));
    assert_eq!(engine.depth("jobs").unwrap(), 2);
    assert_eq!(raw_get(&engine, "jobs:1"), Some(b"a".to_vec()));
}

#[test]
fn test_remove_unknown_channel() {
    let engine = QueueEngine::in_memory();
    assert!(matches!(
        engine.remove_channel("ghost"),
        Err(QueueError::ChannelNotFound(_))
    ));
}

#[test]
fn test_purge_channel() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();
    engine.enqueue("jobs", "c").unwrap();
    engine.dequeue("jobs").unwrap();

    assert_eq!(engine.purge_channel("jobs").unwrap(), 2);
    assert!(engine.list_channels().unwrap().is_empty());
    assert_eq!(raw_get(&engine, "jobs:2"), None);
    assert_eq!(raw_get(&engine, "jobs:3"), None);
    assert_eq!(raw_get(&engine, "jobs:getpos"), None);
    assert_eq!(raw_get(&engine, "jobs:setpos"), None);

    assert_eq!(engine.enqueue("jobs", "fresh").unwrap(), 1);
    assert_eq!(engine.dequeue("jobs").unwrap(), "fresh".as_bytes());
}

// =============================================================================
// Delivered Record Policy Tests
// =============================================================================

#[test]
fn test_reclaim_deletes_delivered_record() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();
    engine.dequeue("jobs").unwrap();

    assert_eq!(raw_get(&engine, "jobs:1"), None);
    assert_eq!(raw_get(&engine, "jobs:2"), Some(b"b".to_vec()));
}

#[test]
fn test_retain_legacy_keeps_delivered_record() {
    let engine = memory_engine(
        Config::builder()
            .delivered_record_policy(DeliveredRecordPolicy::RetainLegacy)
            .build(),
    );

    raw_put(&engine, "jobs", "bare-key");
    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();

    assert_eq!(engine.dequeue("jobs").unwrap(), "a".as_bytes());
    assert_eq!(engine.dequeue("jobs").unwrap(), "b".as_bytes());

    // Delivered records accumulate; the bare channel key is what gets deleted
    assert_eq!(raw_get(&engine, "jobs:1"), Some(b"a".to_vec()));
    assert_eq!(raw_get(&engine, "jobs:2"), Some(b"b".to_vec()));
    assert_eq!(raw_get(&engine, "jobs"), None);
}

#[test]
fn test_retain_legacy_never_erases_registry() {
    let engine = memory_engine(
        Config::builder()
            .delivered_record_policy(DeliveredRecordPolicy::RetainLegacy)
            .build(),
    );

    engine.enqueue("other", "x").unwrap();
    engine.enqueue("channel", "y").unwrap();
    assert_eq!(engine.dequeue("channel").unwrap(), "y".as_bytes());

    assert_eq!(engine.list_channels().unwrap(), vec!["other", "channel"]);
}

/// Channels named after another channel's keys must leave it untouched
fn colon_names_stay_isolated(policy: DeliveredRecordPolicy) {
    let engine = memory_engine(Config::builder().delivered_record_policy(policy).build());

    engine.enqueue("a", "m1").unwrap();
    engine.enqueue("a", "m2").unwrap();
    engine.enqueue("a", "m3").unwrap();
    assert_eq!(engine.dequeue("a").unwrap(), "m1".as_bytes());

    for name in ["a:getpos", "a:setpos", "a:2", "a:3", "channel"] {
        engine.enqueue(name, "intruder").unwrap();
        assert_eq!(engine.dequeue(name).unwrap(), "intruder".as_bytes());
    }

    assert_eq!(engine.depth("a").unwrap(), 2);
    assert_eq!(raw_get(&engine, "a:getpos"), Some(b"1".to_vec()));
    assert_eq!(raw_get(&engine, "a:setpos"), Some(b"3".to_vec()));
    assert_eq!(engine.dequeue("a").unwrap(), "m2".as_bytes());
    assert_eq!(engine.dequeue("a").unwrap(), "m3".as_bytes());
    assert!(matches!(engine.dequeue("a"), Err(QueueError::QueueEmpty(_))));
    assert_eq!(engine.list_channels().unwrap()[0], "a");
}

#[test]
fn test_colon_names_stay_isolated_with_reclaim() {
    colon_names_stay_isolated(DeliveredRecordPolicy::Reclaim);
}

#[test]
fn test_colon_names_stay_isolated_with_retain_legacy() {
    colon_names_stay_isolated(DeliveredRecordPolicy::RetainLegacy);
}

#[test]
fn test_retain_legacy_skips_bare_keys_with_colons() {
    let engine = memory_engine(
        Config::builder()
            .delivered_record_policy(DeliveredRecordPolicy::RetainLegacy)
            .build(),
    );

    raw_put(&engine, "x:y", "foreign");
    engine.enqueue("x:y", "v").unwrap();
    engine.dequeue("x:y").unwrap();

    assert_eq!(raw_get(&engine, "x:y"), Some(b"foreign".to_vec()));
}

#[test]
fn test_purge_with_retain_legacy_removes_delivered_records() {
    let engine = memory_engine(
        Config::builder()
            .delivered_record_policy(DeliveredRecordPolicy::RetainLegacy)
            .build(),
    );

    engine.enqueue("jobs", "a").unwrap();
    engine.enqueue("jobs", "b").unwrap();
    engine.dequeue("jobs").unwrap();

    assert_eq!(engine.purge_channel("jobs").unwrap(), 1);
    assert_eq!(raw_get(&engine, "jobs:1"), None);
    assert_eq!(raw_get(&engine, "jobs:2"), None);
}

// =============================================================================
// Recovery Policy Tests
// =============================================================================

#[test]
fn test_lenient_recovery_treats_garbage_as_zero() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    raw_put(&engine, "jobs:getpos", "not-a-number");

    assert_eq!(engine.depth("jobs").unwrap(), 1);
    assert_eq!(engine.dequeue("jobs").unwrap(), "a".as_bytes());
}

#[test]
fn test_strict_recovery_rejects_garbage() {
    let engine = memory_engine(
        Config::builder()
            .recovery_policy(RecoveryPolicy::Strict)
            .build(),
    );

    engine.enqueue("jobs", "a").unwrap();
    raw_put(&engine, "jobs:setpos", "??");

    assert!(matches!(
        engine.depth("jobs"),
        Err(QueueError::CorruptPosition { ref key, .. }) if key == "jobs:setpos"
    ));
    assert!(matches!(
        engine.dequeue("jobs"),
        Err(QueueError::CorruptPosition { .. })
    ));
}

#[test]
fn test_head_ahead_of_tail_lenient_resets() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    raw_put(&engine, "jobs:getpos", "5");
    raw_put(&engine, "jobs:setpos", "3");

    assert!(matches!(engine.dequeue("jobs"), Err(QueueError::QueueEmpty(_))));
    assert_eq!(raw_get(&engine, "jobs:getpos"), Some(b"0".to_vec()));
    assert_eq!(raw_get(&engine, "jobs:setpos"), Some(b"0".to_vec()));
}

#[test]
fn test_head_ahead_of_tail_strict_fails() {
    let engine = memory_engine(
        Config::builder()
            .recovery_policy(RecoveryPolicy::Strict)
            .build(),
    );

    engine.enqueue("jobs", "a").unwrap();
    raw_put(&engine, "jobs:getpos", "5");

    assert!(matches!(
        engine.dequeue("jobs"),
        Err(QueueError::CorruptPosition { .. })
    ));
    assert_eq!(raw_get(&engine, "jobs:getpos"), Some(b"5".to_vec()));
}

#[test]
fn test_missing_message_record() {
    let engine = QueueEngine::in_memory();

    engine.enqueue("jobs", "a").unwrap();
    engine
        .store()
        .delete(b"jobs:1", &WriteOptions::default())
        .unwrap();

    assert!(matches!(
        engine.dequeue("jobs"),
        Err(QueueError::MessageNotFound { ref channel, sequence: 1 }) if channel == "jobs"
    ));
    // Cursors are untouched
    assert_eq!(engine.depth("jobs").unwrap(), 1);
}

// =============================================================================
// Failure Semantics Tests
// =============================================================================

#[test]
fn test_failed_message_write_leaves_tail_unchanged() {
    let (store, engine) = faulty_engine(Config::default());

    engine.enqueue("orders", "first").unwrap();
    store.fail_on("orders:2");

    let err = engine.enqueue("orders", "second").unwrap_err();
    assert!(err.is_storage());
    assert_eq!(engine.depth("orders").unwrap(), 1);

    store.heal();
    assert_eq!(engine.enqueue("orders", "second").unwrap(), 2);
    assert_eq!(engine.dequeue("orders").unwrap(), "first".as_bytes());
    assert_eq!(engine.dequeue("orders").unwrap(), "second".as_bytes());
}

#[test]
fn test_failed_registration_surfaces_error() {
    let (store, engine) = faulty_engine(Config::default());
    store.fail_on("channel");

    assert!(engine.enqueue("orders", "x").unwrap_err().is_storage());
    assert!(engine.list_channels().unwrap().is_empty());
}

#[test]
fn test_sequential_tail_failure_orphans_record() {
    let (store, engine) = faulty_engine(Config::default());

    engine.enqueue("orders", "first").unwrap();
    store.fail_on("orders:setpos");

    assert!(engine.enqueue("orders", "second").is_err());
    // Message landed, cursor did not: the accepted inconsistency window
    assert_eq!(store.get(b"orders:2").unwrap(), Some(b"second".to_vec()));
    assert_eq!(engine.depth("orders").unwrap(), 1);
}

#[test]
fn test_atomic_commit_all_or_nothing() {
    let (store, engine) = faulty_engine(
        Config::builder().commit_mode(CommitMode::Atomic).build(),
    );

    engine.enqueue("orders", "first").unwrap();
    store.fail_on("orders:setpos");

    assert!(engine.enqueue("orders", "second").is_err());
    assert_eq!(store.get(b"orders:2").unwrap(), None);
    assert_eq!(engine.depth("orders").unwrap(), 1);

    store.heal();
    store.fail_on("orders:getpos");
    assert!(engine.dequeue("orders").is_err());
    // Record survives because the batch holding its delete failed
    assert_eq!(store.get(b"orders:1").unwrap(), Some(b"first".to_vec()));

    store.heal();
    assert_eq!(engine.dequeue("orders").unwrap(), "first".as_bytes());
}

#[test]
fn test_atomic_commit_scenario() {
    let engine = memory_engine(Config::builder().commit_mode(CommitMode::Atomic).build());

    engine.enqueue("orders", "x").unwrap();
    engine.enqueue("orders", "y").unwrap();
    assert_eq!(engine.dequeue("orders").unwrap(), "x".as_bytes());
    assert_eq!(engine.dequeue("orders").unwrap(), "y".as_bytes());
    assert!(matches!(engine.dequeue("orders"), Err(QueueError::QueueEmpty(_))));
    assert_eq!(raw_get(&engine, "orders:1"), None);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

fn concurrent_enqueue_same_channel(granularity: LockGranularity) {
    let engine = Arc::new(memory_engine(
        Config::builder().lock_granularity(granularity).build(),
    ));
    let threads = 8;
    let per_thread = 50;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|i| engine.enqueue("shared", format!("{}-{}", t, i)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut sequences = HashSet::new();
    for handle in handles {
        for sequence in handle.join().unwrap() {
            assert!(sequences.insert(sequence), "duplicate sequence {}", sequence);
        }
    }

    let total = (threads * per_thread) as u64;
    assert_eq!(sequences.len() as u64, total);
    assert_eq!(engine.depth("shared").unwrap(), total);

    let mut values = HashSet::new();
    for _ in 0..total {
        values.insert(engine.dequeue("shared").unwrap());
    }
    assert_eq!(values.len() as u64, total);
}

#[test]
fn test_concurrent_enqueue_per_channel_locks() {
    concurrent_enqueue_same_channel(LockGranularity::PerChannel);
}

#[test]
fn test_concurrent_enqueue_global_lock() {
    concurrent_enqueue_same_channel(LockGranularity::Global);
}

#[test]
fn test_concurrent_registration_loses_no_channel() {
    let engine = Arc::new(QueueEngine::in_memory());

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..10 {
                    engine.enqueue(&format!("chan-{}-{}", t, i), "v").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let channels: HashSet<_> = engine.list_channels().unwrap().into_iter().collect();
    assert_eq!(channels.len(), 160);
}

#[test]
fn test_unknown_names_do_not_accumulate_locks() {
    let engine = QueueEngine::in_memory();
    engine.enqueue("real", "x").unwrap();

    for i in 0..10_000 {
        let name = format!("ghost-{}", i);
        assert!(matches!(
            engine.dequeue(&name),
            Err(QueueError::ChannelNotFound(_))
        ));
    }
    engine.purge_channel("real").unwrap();

    assert!(engine.locks().tracked() <= 64);
}

#[test]
fn test_concurrent_producers_and_consumers() {
    let engine = Arc::new(QueueEngine::in_memory());
    let total = 200u64;

    let producer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..total {
                engine.enqueue("pipe", i.to_string()).unwrap();
            }
        })
    };

    let consumer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let mut received = Vec::new();
            while (received.len() as u64) < total {
                match engine.dequeue("pipe") {
                    Ok(value) => received.push(String::from_utf8(value.to_vec()).unwrap()),
                    Err(QueueError::QueueEmpty(_)) | Err(QueueError::ChannelNotFound(_)) => {
                        thread::yield_now()
                    }
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
            received
        })
    };

    producer.join().unwrap();
    let received = consumer.join().unwrap();
    let expected: Vec<String> = (0..total).map(|i| i.to_string()).collect();
    assert_eq!(received, expected);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_engine_open_creates_wal() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("queues");

    let _engine = QueueEngine::open_path(&data_dir).unwrap();

    assert!(data_dir.join("wal.log").exists());
}

#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = QueueEngine::open(durable_config(&temp_dir)).unwrap();
        engine.enqueue("orders", "x").unwrap();
        engine.enqueue("orders", "y").unwrap();
        engine.enqueue("audit", "z").unwrap();
        engine.dequeue("orders").unwrap();
        engine.close().unwrap();
    }

    let engine = QueueEngine::open(durable_config(&temp_dir)).unwrap();
    assert_eq!(engine.list_channels().unwrap(), vec!["orders", "audit"]);
    assert_eq!(engine.depth("orders").unwrap(), 1);
    assert_eq!(engine.dequeue("orders").unwrap(), "y".as_bytes());
    assert_eq!(engine.enqueue("orders", "w").unwrap(), 3);
}

#[test]
fn test_durable_scenario_with_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .compaction_threshold(512)
        .build();

    {
        let engine = QueueEngine::open(config.clone()).unwrap();
        for i in 0..100 {
            engine.enqueue("bulk", format!("message-{}", i)).unwrap();
        }
        for _ in 0..60 {
            engine.dequeue("bulk").unwrap();
        }
        engine.close().unwrap();
    }

    let engine = QueueEngine::open(config).unwrap();
    assert_eq!(engine.depth("bulk").unwrap(), 40);
    assert_eq!(engine.dequeue("bulk").unwrap(), "message-60".as_bytes());
}

#[test]
fn test_retained_records_past_threshold_survive_repeated_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .compaction_threshold(1024)
        .delivered_record_policy(DeliveredRecordPolicy::RetainLegacy)
        .build();

    {
        let engine = QueueEngine::open(config.clone()).unwrap();
        for i in 0..300 {
            assert_eq!(engine.enqueue("keep", format!("record-{:04}", i)).unwrap(), i + 1);
            if i % 2 == 1 {
                engine.dequeue("keep").unwrap();
            }
        }
        engine.close().unwrap();
    }

    let engine = QueueEngine::open(config).unwrap();
    assert_eq!(engine.depth("keep").unwrap(), 150);
    assert_eq!(engine.dequeue("keep").unwrap(), "record-0150".as_bytes());
    assert_eq!(raw_get(&engine, "keep:1"), Some(b"record-0000".to_vec()));
}

#[test]
fn test_temp_engine_basic() {
    let (_temp, engine) = setup_temp_engine();

    engine.enqueue("jobs", "a").unwrap();
    assert_eq!(engine.dequeue("jobs").unwrap(), "a".as_bytes());
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_enqueue_and_dequeue() {
    let engine = QueueEngine::in_memory();

    let response = engine
        .execute(Command::Enqueue {
            channel: "jobs".to_string(),
            value: "payload".into(),
        })
        .unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.as_u64().unwrap(), 1);

    let response = engine
        .execute(Command::Dequeue {
            channel: "jobs".to_string(),
        })
        .unwrap();
    assert_eq!(response.payload, Some(b"payload".to_vec()));
}

#[test]
fn test_execute_list_depth_status_ping() {
    let engine = QueueEngine::in_memory();
    engine.enqueue("a", "1").unwrap();
    engine.enqueue("b", "1").unwrap();

    let list = engine.execute(Command::ListChannels).unwrap();
    assert_eq!(list.as_channels().unwrap(), vec!["a", "b"]);

    let depth = engine
        .execute(Command::Depth {
            channel: "a".to_string(),
        })
        .unwrap();
    assert_eq!(depth.as_u64().unwrap(), 1);

    let status = engine.execute(Command::Status).unwrap();
    assert_eq!(status.as_status().unwrap(), engine.status().unwrap());

    let pong = engine.execute(Command::Ping).unwrap();
    assert_eq!(pong.payload, Some(b"PONG".to_vec()));
}

#[test]
fn test_execute_validates_channel_names() {
    let engine = QueueEngine::in_memory();

    let too_long = "x".repeat(81);
    let err = engine
        .execute(Command::Enqueue {
            channel: too_long,
            value: "v".into(),
        })
        .unwrap_err();
    assert!(matches!(err, QueueError::Validation(_)));

    let err = engine
        .execute(Command::Dequeue {
            channel: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, QueueError::Validation(_)));

    let longest = "y".repeat(80);
    engine
        .execute(Command::Enqueue {
            channel: longest.clone(),
            value: "v".into(),
        })
        .unwrap();
    assert_eq!(engine.list_channels().unwrap(), vec![longest]);
}

#[test]
fn test_execute_surfaces_queue_errors() {
    let engine = QueueEngine::in_memory();

    let err = engine
        .execute(Command::Dequeue {
            channel: "ghost".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, QueueError::ChannelNotFound(_)));
}
