//! End-to-end subset scenarios.

use keyed_set::{
    Collection, EventKind, EventStream, Observable, SetEvent, Store, Subset, Subsetable,
};
use std::collections::HashMap;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn letters() -> Collection<String> {
    Collection::from_entries([
        ("a", "A".to_string()),
        ("b", "B".to_string()),
        ("c", "C".to_string()),
    ])
}

fn summarize<V: Clone>(events: &[SetEvent<V>]) -> Vec<(EventKind, V, String)> {
    events
        .iter()
        .map(|e| (e.kind(), e.element().clone(), e.key().to_string()))
        .collect()
}

fn expected(kind: EventKind, element: &str, key: &str) -> (EventKind, String, String) {
    (kind, element.to_string(), key.to_string())
}

#[test]
fn test_unfiltered_subset_proxies_master_changes() {
    init_tracing();
    let master = letters();
    let subset = master.subset().unwrap();
    let stream = EventStream::new(&subset).unwrap();

    master.set("d", "D".to_string());
    master.remove("c");
    master.set("c", "C".to_string());

    let events = stream.drain();
    assert_eq!(
        summarize(&events),
        vec![
            expected(EventKind::Add, "D", "d"),
            expected(EventKind::Remove, "C", "c"),
            expected(EventKind::Add, "C", "c"),
        ]
    );
    assert!(events.iter().all(|e| e.target() == subset.id()));

    let expected_entries: HashMap<String, String> =
        [("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    assert_eq!(master.get_all(), expected_entries);
    assert_eq!(subset.get_all(), expected_entries);
}

#[test]
fn test_add_event_is_readable_from_target_during_dispatch() {
    let master = letters();
    let subset = master.subset().unwrap();

    let view = subset.clone();
    let consistent = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let log = Arc::clone(&consistent);
    let _sub = subset
        .on(EventKind::Add, move |event| {
            log.lock()
                .push(view.get(event.key()).as_ref() == Some(event.element()));
        })
        .unwrap();

    master.set("d", "D".to_string());
    master.set("a", "a".to_string());

    assert_eq!(*consistent.lock(), vec![true, true]);
}

#[test]
fn test_subset_reflects_all_master_changes() {
    let master = letters();
    let subset = master.subset().unwrap();

    master.set("d", "D".to_string());
    master.remove("c");
    master.set("c", "C".to_string());
    master.set("a", "a".to_string());
    master.remove("b");

    assert_eq!(subset.get_all(), master.get_all());
}

#[test]
fn test_filtered_subset_scenario() {
    let master: Collection<i32> =
        Collection::from_entries([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
    let even = master.subset_with(|n, _, _| n % 2 == 0).unwrap();

    let initial: HashMap<String, i32> =
        [("b".to_string(), 2), ("d".to_string(), 4)].into_iter().collect();
    assert_eq!(even.get_all(), initial);

    let stream = EventStream::new(&even).unwrap();

    master.remove("d");
    master.set("d", 4);
    master.remove("c");
    master.set("c", 3);

    let events = stream.drain();
    assert_eq!(
        summarize(&events),
        vec![
            (EventKind::Remove, 4, "d".to_string()),
            (EventKind::Add, 4, "d".to_string()),
        ]
    );
    assert_eq!(even.get_all(), initial);
}

#[test]
fn test_subset_write_reaches_subset_through_master_event() {
    let master = letters();
    let subset = master.subset().unwrap();
    let master_stream = EventStream::new(&master).unwrap();
    let subset_stream = EventStream::new(&subset).unwrap();

    subset.set("d", "D".to_string());

    assert_eq!(master.get("d").as_deref(), Some("D"));
    assert_eq!(subset.get("d").as_deref(), Some("D"));

    let master_events = master_stream.drain();
    let subset_events = subset_stream.drain();
    assert_eq!(master_events.len(), 1);
    assert_eq!(master_events[0].target(), master.id());
    assert_eq!(subset_events.len(), 1);
    assert_eq!(subset_events[0].target(), subset.id());
}

#[test]
fn test_disposed_subset_ignores_master() {
    let master = letters();
    let subset = master.subset().unwrap();
    let calls = Arc::new(parking_lot::Mutex::new(0));

    let counter = Arc::clone(&calls);
    let _sub = subset
        .on(EventKind::Add, move |_| *counter.lock() += 1)
        .unwrap();

    subset.dispose();
    master.set("d", "D".to_string());
    master.remove("a");

    assert!(subset.is_disposed());
    assert!(subset.is_empty());
    assert_eq!(*calls.lock(), 0);
    assert_eq!(master.len(), 3);
}

#[test]
fn test_many_subsets_on_one_master() {
    let master: Collection<i32> = Collection::new();
    let small = master.subset_with(|n, _, _| *n < 10).unwrap();
    let large = master.subset_with(|n, _, _| *n >= 10).unwrap();
    let all = master.subset().unwrap();

    for (i, n) in [3, 30, 7, 70].into_iter().enumerate() {
        master.set(format!("k{}", i), n);
    }

    assert_eq!(small.len(), 2);
    assert_eq!(large.len(), 2);
    assert_eq!(all.len(), 4);

    // Moving a key across the boundary: removal leaves `small`, add lands in `large`.
    master.set("k0", 300);
    assert!(!small.has("k0"));
    assert_eq!(large.get("k0"), Some(300));
    assert_eq!(all.get("k0"), Some(300));
}

#[test]
fn test_filter_writing_through_its_subset_keeps_views_consistent() {
    init_tracing();
    let master: Collection<i32> = Collection::new();
    let tagged = master
        .subset_with(|n: &i32, key: &str, me: &Subset<Collection<i32>, i32>| {
            // Every accepted "item*" entry records a marker next to it.
            if key.starts_with("item") {
                me.set(format!("seen_{}", key), *n);
            }
            true
        })
        .unwrap();
    let nested = tagged.subset_with(|n, _, _| *n > 1).unwrap();

    master.set("item1", 1);
    master.set("item2", 2);

    assert_eq!(master.get("seen_item2"), Some(2));
    assert_eq!(tagged.get_all(), master.get_all());
    assert_eq!(nested.len(), 2);
    assert!(nested.has("seen_item2"));
}
