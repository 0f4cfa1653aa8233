//! Property suites for the connection protocol, the flattening law, and
//! the substituted change stream.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use brook_collect::{ArrayChange, ArrayVariable, ObservableArray, ObservableArrayExt};
use brook_core::{AnySink, MergedSource, Signal, Source, SourceExt};
use brook_test::Recorder;

/// One scripted edit against an `ArrayVariable`.
#[derive(Clone, Debug)]
enum Edit {
    Push(u32),
    RemoveAt(usize),
    SetValue(Vec<u32>),
    Replace(usize, usize, Vec<u32>),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u32..100).prop_map(Edit::Push),
        (0usize..8).prop_map(Edit::RemoveAt),
        proptest::collection::vec(0u32..100, 0..5).prop_map(Edit::SetValue),
        (0usize..8, 0usize..8, proptest::collection::vec(0u32..100, 0..4))
            .prop_map(|(lo, hi, es)| Edit::Replace(lo, hi, es)),
    ]
}

fn apply_edit(array: &ArrayVariable<u32>, edit: &Edit) {
    let len = array.count();
    match edit {
        Edit::Push(v) => array.push(*v),
        Edit::RemoveAt(i) => {
            if len > 0 {
                array.remove_at(i % len);
            }
        }
        Edit::SetValue(vs) => array.set_value(vs.clone()),
        Edit::Replace(lo, hi, es) => {
            let lo = lo % (len + 1);
            let hi = lo + (hi % (len - lo + 1));
            array.replace_range(lo..hi, es.clone());
        }
    }
}

proptest! {
    /// Replaying the substituted view's change stream reproduces the
    /// view's value at every step, for any legal edit sequence.
    #[test]
    fn prop_substituted_stream_round_trips(
        substitution in proptest::collection::vec(0u32..100, 0..4),
        edits in proptest::collection::vec(edit_strategy(), 0..24),
    ) {
        let inner = ArrayVariable::<u32>::new(vec![]);
        let view = inner.clone().replacing_if_empty(substitution);

        let exposed = Arc::new(Mutex::new(view.value()));
        let replay = Arc::clone(&exposed);
        let checker = AnySink::from_fn(move |change: ArrayChange<u32>| {
            let mut value = replay.lock();
            change.apply_to(&mut value);
        });
        view.changes().add(checker);

        for edit in &edits {
            apply_edit(&inner, edit);
            // After every edit the replayed value matches the reported one.
            prop_assert_eq!(exposed.lock().clone(), view.value());
        }
    }

    /// Chained merges always flatten to a single composite over the
    /// original inputs, and one subscriber means exactly one subscription
    /// per input.
    #[test]
    fn prop_merge_chain_stays_flat(chain_len in 1usize..12) {
        let inputs: Vec<Signal<u32>> = (0..chain_len).map(|_| Signal::new()).collect();

        let mut merged = MergedSource::merge_all([inputs[0].clone()]);
        for input in &inputs[1..] {
            merged = merged.merge(input.clone());
        }
        prop_assert_eq!(merged.inputs().len(), chain_len);

        let recorder = Recorder::attached(&merged);
        for input in &inputs {
            prop_assert_eq!(input.subscriber_count(), 1);
        }

        for (i, input) in inputs.iter().enumerate() {
            input.send(i as u32);
        }
        prop_assert_eq!(recorder.values(), (0..chain_len as u32).collect::<Vec<_>>());

        merged.remove(&recorder.sink());
        for input in &inputs {
            prop_assert_eq!(input.subscriber_count(), 0);
        }
    }

    /// Start/stop hooks stay balanced under arbitrary attach/detach
    /// schedules driven through a merged composite.
    #[test]
    fn prop_merged_lifecycle_balances(ops in proptest::collection::vec((0usize..3, any::<bool>()), 0..48)) {
        let a = Signal::<u32>::new();
        let b = Signal::<u32>::new();
        let merged = a.clone().merged(b.clone());

        let pool: Vec<AnySink<u32>> = (0..3).map(|_| AnySink::from_fn(|_| {})).collect();
        let mut attached = [false; 3];

        for (i, do_add) in ops {
            if do_add {
                merged.add(pool[i].clone());
                attached[i] = true;
            } else {
                merged.remove(&pool[i]);
                attached[i] = false;
            }
            let expected = if attached.iter().any(|&x| x) { 1 } else { 0 };
            prop_assert_eq!(a.subscriber_count(), expected);
            prop_assert_eq!(b.subscriber_count(), expected);
        }
    }
}
