//! End-to-end mirroring through the public crates
//!
//! Exercises the full flow a driver uses: lock the root pair, wire console and
//! log-file sinks, then run cycles against a changing source tree.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use mirror_core::{
    ActionKind, LogFileSink, MemorySink, Mirror, MirrorConfig, MultiSink, Scheduler,
};
use mirror_fs::RootLock;
use mirror_test_utils::{TreePair, mtime, relative_paths, set_mtime};

#[test]
fn test_create_update_delete_process() {
    let pair = TreePair::new();
    let log = pair.root().join("test_log.log");
    let memory = Arc::new(MemorySink::new());
    let sink = MultiSink::new()
        .with(Arc::clone(&memory))
        .with(LogFileSink::create(&log).unwrap());
    let mirror = Mirror::new(pair.source(), pair.replica(), Arc::new(sink));

    // 1st cycle: creation
    let source_file = pair.write_source("test_file.txt", "Testing creation and sync");
    mirror.reconcile().unwrap();

    let logs = fs::read_to_string(&log).unwrap();
    assert!(logs.contains("Replica folder created"));
    pair.assert_replica_exists("test_file.txt");

    // 2nd cycle: update
    let previous = mtime(&source_file);
    fs::write(&source_file, "Updated Content").unwrap();
    set_mtime(&source_file, previous + 5);
    mirror.reconcile().unwrap();
    assert_eq!(pair.read_replica("test_file.txt"), "Updated Content");

    // 3rd cycle: deletion
    pair.remove_source("test_file.txt");
    mirror.reconcile().unwrap();
    pair.assert_replica_missing("test_file.txt");

    let kinds: Vec<_> = memory.actions().into_iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActionKind::ReplicaRootCreated,
            ActionKind::FileCreated,
            ActionKind::FileUpdated,
            ActionKind::FileRemoved,
        ]
    );
    let logs = fs::read_to_string(&log).unwrap();
    assert_eq!(logs.lines().count(), 4);
    assert!(logs.contains("File updated"));
    assert!(logs.contains("File removed"));
}

#[test]
fn test_nested_directories_sync() {
    let pair = TreePair::new();
    pair.write_source("nested_dir/nested_file.txt", "Nested file content");
    let mirror = Mirror::new(pair.source(), pair.replica(), Arc::new(MemorySink::new()));

    mirror.reconcile().unwrap();

    pair.assert_replica_exists("nested_dir");
    assert_eq!(
        pair.read_replica("nested_dir/nested_file.txt"),
        "Nested file content"
    );
    assert_eq!(relative_paths(pair.replica()), relative_paths(pair.source()));
}

#[test]
fn test_config_file_drives_a_mirror() {
    let pair = TreePair::new();
    pair.write_source("a.txt", "X");
    let config_path = pair.root().join("mirror.toml");
    fs::write(
        &config_path,
        format!(
            "source = {:?}\nreplica = {:?}\ninterval = 1\ndry_run = false\n",
            pair.source(),
            pair.replica()
        ),
    )
    .unwrap();

    let settings = MirrorConfig::load(&config_path).unwrap().resolve().unwrap();
    let mirror = Mirror::new(&settings.source, &settings.replica, Arc::new(MemorySink::new()))
        .dry_run(settings.dry_run);
    mirror.reconcile().unwrap();

    assert_eq!(pair.read_replica("a.txt"), "X");
}

#[test]
fn test_lock_excludes_a_second_driver() {
    let pair = TreePair::new();
    let lock_dir = tempfile::tempdir().unwrap();

    let _held = RootLock::acquire_in(lock_dir.path(), pair.source(), pair.replica()).unwrap();

    assert!(RootLock::acquire_in(lock_dir.path(), pair.source(), pair.replica()).is_err());
}

#[tokio::test]
async fn test_scheduler_converges_a_changing_tree() {
    let pair = TreePair::new();
    pair.write_source("first.txt", "1");
    pair.write_replica("stray.txt", "stray");
    let memory = Arc::new(MemorySink::new());
    let mirror = Arc::new(Mirror::new(pair.source(), pair.replica(), memory.clone()));
    let scheduler = Scheduler::new(Duration::from_millis(150)).with_max_cycles(2);

    let source = pair.source().to_path_buf();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        fs::create_dir(source.join("later")).unwrap();
        fs::write(source.join("later").join("second.txt"), "2").unwrap();
    });

    let outcome = scheduler.run(mirror).await;
    writer.await.unwrap();

    assert_eq!(outcome.cycles, 2);
    assert_eq!(outcome.unclean_cycles, 0);
    assert_eq!(relative_paths(pair.replica()), relative_paths(pair.source()));
    assert_eq!(pair.read_replica("later/second.txt"), "2");
    assert!(
        memory
            .actions()
            .iter()
            .any(|r| r.kind == ActionKind::FileRemoved)
    );
}
