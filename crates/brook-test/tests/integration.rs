//! End-to-end suites across the core, collect, and bridge crates.

use std::sync::Arc;

use brook_bridge::{
    notification_source, updatable_bool, BroadcastCenter, MemoryBroadcastCenter,
    MemorySettingsStore, Notification, SettingsStore,
};
use brook_collect::{ArrayVariable, ObservableArray, ObservableArrayExt};
use brook_core::{just, never, Signal, Source, SourceExt};
use brook_test::Recorder;

#[test]
fn merged_notification_channels_share_one_lifecycle() {
    let center = Arc::new(MemoryBroadcastCenter::new());
    let added = notification_source(
        Arc::clone(&center) as Arc<dyn BroadcastCenter>,
        "item-added",
        None,
        None,
    );
    let removed = notification_source(
        Arc::clone(&center) as Arc<dyn BroadcastCenter>,
        "item-removed",
        None,
        None,
    );

    let merged = added.merged(removed);
    assert_eq!(center.observer_count(), 0);

    let recorder = Recorder::attached(&merged);
    assert_eq!(center.observer_count(), 2);

    center.post(Notification::new("item-added", None));
    center.post(Notification::new("item-removed", None));
    center.post(Notification::new("unrelated", None));

    let names: Vec<String> = recorder.values().into_iter().map(|n| n.name).collect();
    assert_eq!(names, vec!["item-added", "item-removed"]);

    merged.remove(&recorder.sink());
    assert_eq!(center.observer_count(), 0);
}

#[test]
fn merged_chain_stays_flat_and_orders_by_arrival() {
    let a = Signal::<u32>::new();
    let b = Signal::<u32>::new();
    let c = Signal::<u32>::new();

    let merged = a.clone().merged(b.clone()).merge(c.clone());
    assert_eq!(merged.inputs().len(), 3);

    let recorder = Recorder::attached(&merged);
    b.send(2);
    a.send(1);
    c.send(3);
    assert_eq!(recorder.values(), vec![2, 1, 3]);
}

#[test]
fn trivial_sources_obey_their_contracts_inside_a_merge() {
    let live = Signal::<u32>::new();
    let merged = never::<u32>().merged(live.clone()).merge(just(5u32));

    // just(5) fires into the composite the moment the composite
    // subscribes to it (first sink attach).
    let recorder = Recorder::attached(&merged);
    assert_eq!(recorder.values(), vec![5]);

    live.send(6);
    assert_eq!(recorder.values(), vec![5, 6]);
}

#[test]
fn substituted_view_round_trips_through_arbitrary_edits() {
    let inner = ArrayVariable::<u32>::new(vec![]);
    let view = inner.clone().replacing_if_empty(vec![9, 9]);
    let recorder = Recorder::attached(&view.changes());

    let mut exposed = view.value();
    assert_eq!(exposed, vec![9, 9]);

    inner.push(1);
    inner.push(2);
    inner.remove_at(0);
    inner.set_value(vec![]);
    inner.replace_range(0..0, vec![4, 5, 6]);
    inner.remove_at(1);

    for change in recorder.values() {
        change.apply_to(&mut exposed);
    }
    assert_eq!(exposed, view.value());
    assert_eq!(exposed, vec![4, 6]);
}

#[test]
fn settings_flag_feeds_a_merged_stream() {
    let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
    let flag = updatable_bool(Arc::clone(&store), "dark-mode", false);

    let manual = Signal::<bool>::new();
    let merged = flag.changes().merged(manual.clone());
    let recorder = Recorder::attached(&merged);

    flag.set(true).unwrap();
    manual.send(false);
    assert_eq!(recorder.values(), vec![true, false]);
}

#[test]
fn detached_consumer_stops_receiving_everywhere() {
    let a = Signal::<u32>::new();
    let merged = a.clone().merged(never());
    let recorder = Recorder::attached(&merged);

    a.send(1);
    merged.remove(&recorder.sink());
    a.send(2);

    assert_eq!(recorder.values(), vec![1]);
    assert_eq!(a.subscriber_count(), 0);
}
