use std::sync::Arc;
use std::time::Duration;

use mirror_core::{MemorySink, Mirror, Scheduler, SchedulerOutcome};
use mirror_test_utils::TreePair;

fn mirror_for(pair: &TreePair) -> (Arc<Mirror>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let mirror = Mirror::new(pair.source(), pair.replica(), sink.clone());
    (Arc::new(mirror), sink)
}

#[tokio::test]
async fn runs_the_requested_number_of_cycles() {
    let pair = TreePair::new();
    pair.write_source("a.txt", "X");
    let (mirror, sink) = mirror_for(&pair);
    let scheduler = Scheduler::new(Duration::from_millis(10)).with_max_cycles(3);

    let outcome = scheduler.run(mirror).await;

    assert_eq!(
        outcome,
        SchedulerOutcome {
            cycles: 3,
            unclean_cycles: 0
        }
    );
    assert_eq!(pair.read_replica("a.txt"), "X");
    // Only the first cycle had anything to do.
    assert_eq!(sink.actions().len(), 2);
}

#[tokio::test]
async fn picks_up_changes_between_cycles() {
    let pair = TreePair::new();
    let (mirror, _sink) = mirror_for(&pair);
    let scheduler = Scheduler::new(Duration::from_millis(200)).with_max_cycles(2);

    let writer = {
        let path = pair.source_path("late.txt");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            std::fs::write(path, "late").unwrap();
        })
    };

    let outcome = scheduler.run(mirror).await;
    writer.await.unwrap();

    assert_eq!(outcome.cycles, 2);
    assert_eq!(pair.read_replica("late.txt"), "late");
}

#[tokio::test]
async fn failing_cycles_do_not_stop_the_loop() {
    let pair = TreePair::new();
    std::fs::remove_dir(pair.source()).unwrap();
    let (mirror, sink) = mirror_for(&pair);
    let scheduler = Scheduler::new(Duration::from_millis(5)).with_max_cycles(3);

    let outcome = scheduler.run(mirror).await;

    assert_eq!(outcome.cycles, 3);
    assert_eq!(outcome.unclean_cycles, 3);
    assert_eq!(sink.failures().len(), 3);
    assert!(!pair.replica().exists());
}

#[tokio::test]
async fn cancellation_interrupts_the_wait() {
    let pair = TreePair::new();
    pair.write_source("a.txt", "X");
    let (mirror, sink) = mirror_for(&pair);
    let scheduler = Scheduler::new(Duration::from_secs(3600));
    let token = scheduler.cancellation_token();

    let handle = tokio::spawn(async move { scheduler.run(mirror).await });

    while sink.actions().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    token.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop promptly after cancellation")
        .unwrap();
    assert_eq!(outcome.cycles, 1);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let pair = TreePair::new();
    let (mirror, sink) = mirror_for(&pair);
    let scheduler = Scheduler::new(Duration::from_millis(10));
    scheduler.cancellation_token().cancel();

    let outcome = scheduler.run(mirror).await;

    assert_eq!(outcome.cycles, 0);
    assert!(sink.events().is_empty());
}
