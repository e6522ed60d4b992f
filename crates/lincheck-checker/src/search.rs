//! Backtracking linearization search.
//!
//! This is the Wing-Gong search with Lowe's memoization, run over the
//! in-place [`LinkedEntries`] list:
//!
//! 1. Scan the remaining entries from the head. At each call, try to step the
//!    model with the call's input and its return's output.
//! 2. On success, if the resulting `(frontier, state)` pair is new, commit
//!    the operation: push a frame, lift the pair out of the list and rescan
//!    from the head.
//! 3. Reaching a return means some pending operation must be linearized
//!    before anything further can be, and none could: pop the last frame,
//!    put its operation back and resume scanning right after it.
//!
//! The list empties exactly when every operation has been committed, and
//! popping with an empty stack proves that no linearization exists.
//!
//! The loop is iterative and allocation-free apart from cache entries and
//! optional partial witnesses.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use lincheck_core::EventValue;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bitset::Bitset;
use crate::cache::VisitedCache;
use crate::entry::Timeline;
use crate::linked::{LinkedEntries, HEAD};
use crate::model::Model;

/// Knobs for a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Record the longest partial linearization seen for every operation.
    pub compute_partial: bool,
    /// Prune with the visited-state cache. Disabling it never changes the
    /// verdict, only the running time.
    pub enable_caching: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            compute_partial: false,
            enable_caching: true,
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// Every operation was committed to a linearization.
    Linearizable,
    /// The search space was exhausted without finding one.
    Illegal,
    /// The kill flag was raised before the search finished.
    Cancelled,
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Linearizable => write!(f, "linearizable"),
            SearchOutcome::Illegal => write!(f, "illegal"),
            SearchOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Operations committed (frames pushed).
    pub states_explored: u64,
    /// Frames popped.
    pub backtracks: u64,
    /// Candidates skipped because their `(frontier, state)` was cached.
    pub cache_hits: u64,
    /// Candidates the model refused to step.
    pub step_failures: u64,
    /// Deepest frame stack reached.
    pub max_depth: usize,
    /// Entries in the visited cache at exit.
    pub cache_size: usize,
}

impl SearchStats {
    /// Adds `other`'s counters into `self`. `max_depth` takes the maximum.
    pub fn merge(&mut self, other: &SearchStats) {
        self.states_explored += other.states_explored;
        self.backtracks += other.backtracks;
        self.cache_hits += other.cache_hits;
        self.step_failures += other.step_failures;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.cache_size += other.cache_size;
    }
}

/// Result of searching one timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    /// How the search ended.
    pub outcome: SearchOutcome,
    /// Witnesses as operation-id sequences, deduplicated, in order of the
    /// lowest operation id they were recorded for.
    ///
    /// On success this is the single full linearization. Otherwise, when
    /// partial witnesses were requested, it holds the longest committed
    /// prefix seen for each operation that was ever committed.
    pub partial_linearizations: Vec<Vec<usize>>,
    /// Search counters.
    pub stats: SearchStats,
}

/// A committed operation and the model state before it was applied.
struct Frame<S> {
    node: usize,
    state: S,
}

/// Searches for a linearization of `timeline` under `model`.
///
/// `kill` is polled once per iteration; raising it makes the search return
/// [`SearchOutcome::Cancelled`] with whatever partial witnesses it recorded.
pub fn check_single<M: Model>(
    model: &M,
    timeline: &Timeline<M::Input, M::Output>,
    options: SearchOptions,
    kill: &AtomicBool,
) -> SearchReport {
    let entries = timeline.entries();
    let n = timeline.operations();

    let mut list = LinkedEntries::new(timeline);
    let mut linearized = Bitset::new(n);
    let mut cache: VisitedCache<M::State> = VisitedCache::new();
    let mut calls: Vec<Frame<M::State>> = Vec::new();
    let mut longest: Vec<Option<Rc<[usize]>>> = vec![None; n];
    let mut stats = SearchStats::default();

    let mut state = model.init();
    let mut cursor = list.next(HEAD);

    while !list.is_empty() {
        if kill.load(Ordering::Relaxed) {
            return finish(SearchOutcome::Cancelled, &longest, stats, cache.len());
        }

        // A call node and its return, or a dead end.
        let candidate = cursor.and_then(|node| list.matched(node).map(|ret| (node, ret)));

        if let Some((call, ret)) = candidate {
            let stepped = match (&entries[list.entry(call)].value, &entries[list.entry(ret)].value)
            {
                (EventValue::Call(input), EventValue::Return(output)) => {
                    model.step(&state, input, output)
                }
                _ => None,
            };

            let Some(next_state) = stepped else {
                stats.step_failures += 1;
                cursor = list.next(call);
                continue;
            };

            let id = list.op(call);
            debug_assert!(!linearized.contains(id));
            linearized.set(id);
            if options.enable_caching {
                if cache.contains(&linearized, &next_state, |a, b| model.equal(a, b)) {
                    linearized.clear(id);
                    stats.cache_hits += 1;
                    cursor = list.next(call);
                    continue;
                }
                cache.insert(linearized.clone(), next_state.clone());
            }

            let prior = std::mem::replace(&mut state, next_state);
            calls.push(Frame { node: call, state: prior });
            list.lift(call);
            cursor = list.next(HEAD);

            stats.states_explored += 1;
            stats.max_depth = stats.max_depth.max(calls.len());
        } else {
            if calls.is_empty() {
                return finish(SearchOutcome::Illegal, &longest, stats, cache.len());
            }

            if options.compute_partial {
                record_partial(&list, &calls, &mut longest);
            }

            if let Some(top) = calls.pop() {
                state = top.state;
                linearized.clear(list.op(top.node));
                list.unlift(top.node);
                cursor = list.next(top.node);
                stats.backtracks += 1;
            }
        }
    }

    let full: Rc<[usize]> = calls.iter().map(|frame| list.op(frame.node)).collect();
    for slot in longest.iter_mut() {
        *slot = Some(Rc::clone(&full));
    }
    finish(SearchOutcome::Linearizable, &longest, stats, cache.len())
}

/// Records the current stack as the longest attempt for every operation on
/// it whose previous record is shorter.
fn record_partial<S>(
    list: &LinkedEntries,
    calls: &[Frame<S>],
    longest: &mut [Option<Rc<[usize]>>],
) {
    let depth = calls.len();
    let mut seq: Option<Rc<[usize]>> = None;
    for frame in calls {
        let id = list.op(frame.node);
        if longest[id].as_ref().map_or(true, |prev| depth > prev.len()) {
            let shared =
                seq.get_or_insert_with(|| calls.iter().map(|f| list.op(f.node)).collect());
            longest[id] = Some(Rc::clone(shared));
        }
    }
}

fn finish(
    outcome: SearchOutcome,
    longest: &[Option<Rc<[usize]>>],
    mut stats: SearchStats,
    cache_size: usize,
) -> SearchReport {
    stats.cache_size = cache_size;

    let mut seen: HashSet<&[usize]> = HashSet::new();
    let mut partial_linearizations = Vec::new();
    for seq in longest.iter().flatten() {
        if seen.insert(&**seq) {
            partial_linearizations.push(seq.to_vec());
        }
    }

    trace!(
        %outcome,
        states = stats.states_explored,
        backtracks = stats.backtracks,
        cache_hits = stats.cache_hits,
        "search finished"
    );

    SearchReport {
        outcome,
        partial_linearizations,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lincheck_core::{ClientId, Event, Operation};

    /// Integer register: `Some(v)` writes `v`, `None` reads.
    struct Register;

    impl Model for Register {
        type State = i32;
        type Input = Option<i32>;
        type Output = i32;

        fn init(&self) -> i32 {
            0
        }

        fn step(&self, state: &i32, input: &Option<i32>, output: &i32) -> Option<i32> {
            match input {
                Some(v) => Some(*v),
                None => (output == state).then_some(*state),
            }
        }
    }

    fn write(client: u32, v: i32, call: i64, ret: i64) -> Operation<Option<i32>, i32> {
        Operation::new(ClientId(client), Some(v), call, 0, ret)
    }

    fn read(client: u32, v: i32, call: i64, ret: i64) -> Operation<Option<i32>, i32> {
        Operation::new(ClientId(client), None, call, v, ret)
    }

    fn run(ops: Vec<Operation<Option<i32>, i32>>, options: SearchOptions) -> SearchReport {
        let timeline = Timeline::from_operations(ops).unwrap();
        check_single(&Register, &timeline, options, &AtomicBool::new(false))
    }

    fn partial() -> SearchOptions {
        SearchOptions {
            compute_partial: true,
            ..SearchOptions::default()
        }
    }

    #[test]
    fn test_sequential_history_is_linearizable() {
        let report = run(vec![write(0, 1, 0, 10), read(0, 1, 20, 30)], partial());
        assert_eq!(report.outcome, SearchOutcome::Linearizable);
        assert_eq!(report.partial_linearizations, vec![vec![0, 1]]);
        assert_eq!(report.stats.max_depth, 2);
    }

    #[test]
    fn test_concurrent_writes_in_reverse_order() {
        // Three overlapping writes observed by sequential reads 3, 2, 1.
        let report = run(
            vec![
                write(0, 1, 0, 100),
                write(1, 2, 0, 100),
                write(2, 3, 0, 100),
                read(3, 3, 10, 20),
                read(3, 2, 30, 40),
                read(3, 1, 50, 60),
            ],
            partial(),
        );
        assert_eq!(report.outcome, SearchOutcome::Linearizable);
        assert_eq!(report.partial_linearizations, vec![vec![2, 3, 1, 4, 0, 5]]);
    }

    #[test]
    fn test_stale_read_is_illegal() {
        // The read starts after the write returned but sees the old value.
        let report = run(vec![write(0, 1, 0, 10), read(1, 0, 20, 30)], partial());
        assert_eq!(report.outcome, SearchOutcome::Illegal);
        assert_eq!(report.partial_linearizations, vec![vec![0]]);
        assert_eq!(report.stats.backtracks, 1);
    }

    #[test]
    fn test_partial_witness_tracks_longest_prefix() {
        // w1 then r1 is fine; r0 overlaps r1 but not w1, so it cannot fit.
        let report = run(
            vec![write(0, 1, 0, 10), read(1, 1, 20, 40), read(2, 0, 30, 50)],
            partial(),
        );
        assert_eq!(report.outcome, SearchOutcome::Illegal);
        assert_eq!(report.partial_linearizations, vec![vec![0, 1]]);
    }

    #[test]
    fn test_no_partials_unless_requested() {
        let report = run(
            vec![write(0, 1, 0, 10), read(1, 0, 20, 30)],
            SearchOptions::default(),
        );
        assert_eq!(report.outcome, SearchOutcome::Illegal);
        assert!(report.partial_linearizations.is_empty());
    }

    #[test]
    fn test_read_with_concurrent_write_sees_either_value() {
        for observed in [0, 1] {
            let report = run(
                vec![write(0, 1, 0, 10), read(1, observed, 5, 15)],
                SearchOptions::default(),
            );
            assert_eq!(report.outcome, SearchOutcome::Linearizable);
        }
    }

    #[test]
    fn test_sequentially_consistent_but_not_linearizable() {
        // P1 reads 1 and then P2 reads 0 while the write is still pending.
        let report = run(
            vec![write(0, 1, 0, 100), read(1, 1, 10, 20), read(2, 0, 30, 40)],
            SearchOptions::default(),
        );
        assert_eq!(report.outcome, SearchOutcome::Illegal);
    }

    #[test]
    fn test_cache_does_not_change_verdict() {
        let ops = vec![
            write(0, 1, 0, 100),
            write(1, 2, 0, 100),
            read(2, 2, 10, 20),
            read(2, 1, 30, 40),
            read(3, 2, 50, 60),
        ];
        let cached = run(ops.clone(), SearchOptions::default());
        let uncached = run(
            ops,
            SearchOptions {
                enable_caching: false,
                ..SearchOptions::default()
            },
        );
        assert_eq!(cached.outcome, uncached.outcome);
        assert_eq!(uncached.stats.cache_hits, 0);
        assert_eq!(uncached.stats.cache_size, 0);
    }

    #[test]
    fn test_cache_prunes_equivalent_orderings() {
        // Writes of the same value commute; the second ordering hits the cache.
        let report = run(
            vec![
                write(0, 7, 0, 10),
                write(1, 7, 0, 10),
                read(2, 3, 20, 30),
            ],
            SearchOptions::default(),
        );
        assert_eq!(report.outcome, SearchOutcome::Illegal);
        assert!(report.stats.cache_hits > 0);
    }

    #[test]
    fn test_kill_flag_cancels() {
        let timeline =
            Timeline::from_operations(vec![write(0, 1, 0, 10), read(1, 1, 20, 30)]).unwrap();
        let report = check_single(&Register, &timeline, partial(), &AtomicBool::new(true));
        assert_eq!(report.outcome, SearchOutcome::Cancelled);
        assert!(report.partial_linearizations.is_empty());
    }

    /// Register that raises its kill flag after a fixed number of steps.
    struct TrippingRegister {
        steps: std::sync::atomic::AtomicU64,
        trip_after: u64,
        kill: AtomicBool,
    }

    impl Model for TrippingRegister {
        type State = i32;
        type Input = Option<i32>;
        type Output = i32;

        fn init(&self) -> i32 {
            Register.init()
        }

        fn step(&self, state: &i32, input: &Option<i32>, output: &i32) -> Option<i32> {
            if self.steps.fetch_add(1, Ordering::Relaxed) + 1 >= self.trip_after {
                self.kill.store(true, Ordering::Relaxed);
            }
            Register.step(state, input, output)
        }
    }

    #[test]
    fn test_cancel_mid_search_keeps_partials() {
        // Concurrent writes and a read nobody satisfies: the search backtracks
        // through many dead ends long before it could finish.
        let mut ops: Vec<_> = (1..=12).map(|v| write(v as u32, v, 0, 100)).collect();
        ops.push(read(0, -1, 0, 100));
        let timeline = Timeline::from_operations(ops.clone()).unwrap();

        let model = TrippingRegister {
            steps: std::sync::atomic::AtomicU64::new(0),
            trip_after: 500,
            kill: AtomicBool::new(false),
        };
        let report = check_single(&model, &timeline, partial(), &model.kill);

        assert_eq!(report.outcome, SearchOutcome::Cancelled);
        assert!(report.stats.backtracks > 0);
        assert!(!report.partial_linearizations.is_empty());
        for witness in &report.partial_linearizations {
            assert!(!witness.is_empty() && witness.len() < ops.len());
            let mut state = Register.init();
            for &id in witness {
                state = Register
                    .step(&state, &ops[id].input, &ops[id].output)
                    .expect("partial witness must replay");
            }
        }
    }

    #[test]
    fn test_empty_timeline() {
        let report = run(Vec::new(), partial());
        assert_eq!(report.outcome, SearchOutcome::Linearizable);
        assert!(report.partial_linearizations.is_empty());
    }

    #[test]
    fn test_event_history() {
        let events = vec![
            Event::call(ClientId(0), 0, Some(5)),
            Event::call(ClientId(1), 1, None),
            Event::ret(ClientId(1), 1, 5),
            Event::ret(ClientId(0), 0, 0),
        ];
        let timeline = Timeline::from_events(events).unwrap();
        let report = check_single(&Register, &timeline, partial(), &AtomicBool::new(false));
        assert_eq!(report.outcome, SearchOutcome::Linearizable);
        assert_eq!(report.partial_linearizations, vec![vec![0, 1]]);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = SearchStats {
            states_explored: 3,
            max_depth: 2,
            ..SearchStats::default()
        };
        let b = SearchStats {
            states_explored: 4,
            backtracks: 1,
            max_depth: 5,
            ..SearchStats::default()
        };
        a.merge(&b);
        assert_eq!(a.states_explored, 7);
        assert_eq!(a.backtracks, 1);
        assert_eq!(a.max_depth, 5);
    }
}
