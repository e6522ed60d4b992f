//! Shared helpers for the integration tests.

#![allow(dead_code)]

use lincheck_checker::models::RegisterInput;
use lincheck_checker::Model;
use lincheck_core::{ClientId, Operation};
use rand::Rng;

pub type RegisterOp = Operation<RegisterInput, i64>;

pub fn put(client: u32, value: i64, call: i64, ret: i64) -> RegisterOp {
    Operation::new(ClientId(client), RegisterInput::Put(value), call, 0, ret)
}

pub fn get(client: u32, value: i64, call: i64, ret: i64) -> RegisterOp {
    Operation::new(ClientId(client), RegisterInput::Get, call, value, ret)
}

/// A random register history of up to `max_ops` operations over a tiny value
/// domain, so that both linearizable and illegal histories are common.
pub fn random_register_history(rng: &mut impl Rng, max_ops: usize) -> Vec<RegisterOp> {
    let len = rng.gen_range(1..=max_ops);
    (0..len)
        .map(|k| {
            let client = (k % 3) as u32;
            let call = rng.gen_range(0..20);
            let ret = call + rng.gen_range(0..8);
            if rng.gen_bool(0.5) {
                put(client, rng.gen_range(0..3), call, ret)
            } else {
                get(client, rng.gen_range(0..3), call, ret)
            }
        })
        .collect()
}

/// Returns true if `order` (a permutation of operation indices) respects
/// real-time order: no operation appears before one that returned before it
/// was called.
pub fn respects_real_time<I, O>(history: &[Operation<I, O>], order: &[usize]) -> bool {
    order.iter().enumerate().all(|(pos, &later)| {
        order[pos + 1..]
            .iter()
            .all(|&after| !history[after].precedes(&history[later]))
    })
}

/// Replays `order` through `model` from its initial state.
pub fn replays<M: Model>(model: &M, history: &[Operation<M::Input, M::Output>], order: &[usize]) -> bool {
    let mut state = model.init();
    for &id in order {
        let op = &history[id];
        match model.step(&state, &op.input, &op.output) {
            Some(next) => state = next,
            None => return false,
        }
    }
    true
}

/// Checks that `witness` is a complete, valid linearization of `history`.
pub fn is_valid_witness<M: Model>(
    model: &M,
    history: &[Operation<M::Input, M::Output>],
    witness: &[usize],
) -> bool {
    let mut sorted = witness.to_vec();
    sorted.sort_unstable();
    sorted == (0..history.len()).collect::<Vec<_>>()
        && respects_real_time(history, witness)
        && replays(model, history, witness)
}

/// Exhaustively tries every permutation. Only usable on tiny histories.
pub fn brute_force_linearizable<M: Model>(model: &M, history: &[Operation<M::Input, M::Output>]) -> bool {
    fn go<M: Model>(
        model: &M,
        history: &[Operation<M::Input, M::Output>],
        state: &M::State,
        used: &mut Vec<bool>,
        order: &mut Vec<usize>,
    ) -> bool {
        if order.len() == history.len() {
            return true;
        }
        for i in 0..history.len() {
            if used[i] {
                continue;
            }
            // Every unused operation that returned before i was called must
            // already be placed.
            let blocked = (0..history.len()).any(|j| !used[j] && j != i && history[j].precedes(&history[i]));
            if blocked {
                continue;
            }
            if let Some(next) = model.step(state, &history[i].input, &history[i].output) {
                used[i] = true;
                order.push(i);
                if go(model, history, &next, used, order) {
                    return true;
                }
                order.pop();
                used[i] = false;
            }
        }
        false
    }

    let mut used = vec![false; history.len()];
    go(model, history, &model.init(), &mut used, &mut Vec::new())
}
