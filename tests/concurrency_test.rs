use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use spotfetch::concurrency::map_with_concurrency;
use tokio::time::sleep;

#[tokio::test]
async fn test_output_matches_input_order_for_every_limit() {
    let items: Vec<u64> = (0..12).collect();

    for limit in [1, 3, 5, 12, 50] {
        let doubled = map_with_concurrency(&items, limit, |n| async move {
            // Later items finish first
            sleep(Duration::from_millis(20 - *n)).await;
            Ok::<_, String>(n * 2)
        })
        .await
        .unwrap();

        let expected: Vec<u64> = items.iter().map(|n| n * 2).collect();
        assert_eq!(doubled, expected, "limit {}", limit);
    }
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let items: Vec<usize> = (0..20).collect();
    let active = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    let results = map_with_concurrency(&items, 3, |n| {
        let active = &active;
        let peak = &peak;
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(5)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, String>(*n)
        }
    })
    .await
    .unwrap();

    assert_eq!(results.len(), 20);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_limit_runs_sequentially() {
    let items = vec!["a", "b", "c"];
    let active = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    let results = map_with_concurrency(&items, 0, |s| {
        let active = &active;
        let peak = &peak;
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, String>(s.to_uppercase())
        }
    })
    .await
    .unwrap();

    assert_eq!(results, vec!["A", "B", "C"]);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_input() {
    let items: Vec<u32> = Vec::new();
    let results = map_with_concurrency(&items, 4, |n| async move { Ok::<_, String>(*n) })
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_first_error_fails_the_map() {
    let items: Vec<u32> = (0..10).collect();

    let result = map_with_concurrency(&items, 2, |n| async move {
        if *n == 4 {
            Err(format!("item {} failed", n))
        } else {
            Ok(*n)
        }
    })
    .await;

    assert_eq!(result, Err("item 4 failed".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_slow_item_only_blocks_its_own_worker() {
    let items: Vec<u64> = (0..7).collect();
    let finished = AtomicUsize::new(0);
    let done_before_slow = AtomicUsize::new(usize::MAX);

    let results = map_with_concurrency(&items, 2, |n| {
        let finished = &finished;
        let done_before_slow = &done_before_slow;
        async move {
            if *n == 0 {
                sleep(Duration::from_secs(60)).await;
                done_before_slow.store(finished.load(Ordering::SeqCst), Ordering::SeqCst);
            } else {
                sleep(Duration::from_millis(10)).await;
            }
            finished.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(*n)
        }
    })
    .await
    .unwrap();

    assert_eq!(results, items);
    assert_eq!(done_before_slow.load(Ordering::SeqCst), 6);
}
