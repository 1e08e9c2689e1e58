//! One entry failing must not stop or damage its siblings.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use mirror_core::{ActionKind, Error, Event, EventSink, MemorySink, Mirror};
use mirror_test_utils::TreePair;

/// Records events and deletes a source file right after the first file
/// copy is reported, so the next sibling vanishes between listing and copy.
struct VanishingSource {
    events: MemorySink,
    victim: Mutex<Option<PathBuf>>,
}

impl VanishingSource {
    fn new(victim: PathBuf) -> Self {
        Self {
            events: MemorySink::new(),
            victim: Mutex::new(Some(victim)),
        }
    }
}

impl EventSink for VanishingSource {
    fn emit(&self, event: &Event) {
        if let Event::Action(record) = event {
            if record.kind == ActionKind::FileCreated {
                if let Some(victim) = self.victim.lock().unwrap().take() {
                    fs::remove_file(victim).unwrap();
                }
            }
        }
        self.events.emit(event);
    }
}

#[test]
fn vanished_source_file_does_not_block_siblings() {
    let pair = TreePair::new();
    pair.write_source("a.txt", "A");
    let doomed = pair.write_source("b.txt", "B");
    pair.write_source("c.txt", "C");
    let sink = Arc::new(VanishingSource::new(doomed));
    let mirror = Mirror::new(pair.source(), pair.replica(), sink.clone());

    let report = mirror.reconcile().unwrap();

    assert_eq!(pair.read_replica("a.txt"), "A");
    assert_eq!(pair.read_replica("c.txt"), "C");
    pair.assert_replica_missing("b.txt");
    assert_eq!(report.failures.len(), 1);
    let failures = sink.events.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.starts_with("Failed to copy"));
    assert!(failures[0].message.contains("b.txt"));
    assert_eq!(report.files_created, 2);
    assert!(matches!(
        report.into_result(),
        Err(Error::Incomplete { failures: 1 })
    ));

    // The next cycle sees the source as it is now and converges.
    let report = mirror.reconcile().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.total_actions(), 0);

    pair.write_source("b.txt", "B again");
    let report = mirror.reconcile().unwrap();
    assert!(report.is_clean());
    assert_eq!(pair.read_replica("b.txt"), "B again");
}

#[cfg(unix)]
mod permissions {
    use super::*;
    use mirror_test_utils::{mtime, set_mtime};
    use std::fs::{File, Permissions};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Whether mode bits actually deny access here; privileged users bypass them.
    fn permissions_enforced(dir: &Path) -> bool {
        let probe = dir.join(".mode-check");
        fs::write(&probe, "x").unwrap();
        fs::set_permissions(&probe, Permissions::from_mode(0o000)).unwrap();
        let denied = File::open(&probe).is_err();
        fs::set_permissions(&probe, Permissions::from_mode(0o644)).unwrap();
        fs::remove_file(&probe).unwrap();
        denied
    }

    #[test]
    fn unreadable_file_does_not_block_siblings() {
        let pair = TreePair::new();
        if !permissions_enforced(pair.root()) {
            eprintln!("Skipping test: permission bits are not enforced for this user");
            return;
        }
        pair.write_source("a.txt", "A");
        let secret = pair.write_source("b.txt", "B");
        pair.write_source("c.txt", "C");
        fs::set_permissions(&secret, Permissions::from_mode(0o000)).unwrap();
        let sink = Arc::new(MemorySink::new());
        let mirror = Mirror::new(pair.source(), pair.replica(), sink.clone());

        let report = mirror.reconcile().unwrap();

        fs::set_permissions(&secret, Permissions::from_mode(0o644)).unwrap();

        assert_eq!(pair.read_replica("a.txt"), "A");
        assert_eq!(pair.read_replica("c.txt"), "C");
        pair.assert_replica_missing("b.txt");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(sink.failures().len(), 1);
        assert!(sink.failures()[0].message.starts_with("Failed to copy"));

        // The next cycle heals once the condition clears.
        let report = mirror.reconcile().unwrap();
        assert!(report.is_clean());
        assert_eq!(pair.read_replica("b.txt"), "B");
    }

    #[test]
    fn unlistable_source_directory_keeps_its_replica() {
        let pair = TreePair::new();
        if !permissions_enforced(pair.root()) {
            eprintln!("Skipping test: permission bits are not enforced for this user");
            return;
        }
        pair.write_source("locked/inside.txt", "inside");
        pair.write_source("open.txt", "open");
        let sink = Arc::new(MemorySink::new());
        let mirror = Mirror::new(pair.source(), pair.replica(), sink.clone());
        mirror.reconcile().unwrap();

        let locked = pair.source_path("locked");
        fs::set_permissions(&locked, Permissions::from_mode(0o000)).unwrap();
        let open = pair.write_source("open.txt", "open again");
        set_mtime(&open, mtime(&open) + 60);

        let report = mirror.reconcile();

        fs::set_permissions(&locked, Permissions::from_mode(0o755)).unwrap();

        let report = report.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(pair.read_replica("locked/inside.txt"), "inside");
        assert_eq!(pair.read_replica("open.txt"), "open again");
    }
}
