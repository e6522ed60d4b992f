//! Sequential specification models.
//!
//! A [`Model`] describes how the object under test behaves when operations
//! are applied one at a time. The checker searches for an ordering of the
//! recorded operations that the model accepts.
//!
//! [`NondeterministicModel`] is the variant whose step function may produce
//! several successor states. [`PowerSetModel`] adapts it to [`Model`] by
//! tracking the set of all states the object could be in.

use std::fmt::Debug;

use lincheck_core::{Event, Operation};

/// A sequential specification of a system.
///
/// Models must be purely functional: `step` returns a new state and never
/// mutates its arguments. The checker relies on this to backtrack by simply
/// restoring an earlier state value.
///
/// Only `init` and `step` are required. Implementing the partition hooks can
/// greatly speed up checking: a history is linearizable if and only if every
/// partition is, and partitions are searched independently. With a
/// partitioned key/value model, for example, the per-partition state can be a
/// single value instead of a whole map.
///
/// # Example
///
/// ```rust
/// use lincheck_checker::Model;
///
/// struct Counter;
///
/// impl Model for Counter {
///     type State = i64;
///     type Input = i64;
///     type Output = i64;
///
///     fn init(&self) -> i64 {
///         0
///     }
///
///     // Adds `input` and returns the new total.
///     fn step(&self, state: &i64, input: &i64, output: &i64) -> Option<i64> {
///         let next = state + input;
///         (next == *output).then_some(next)
///     }
/// }
///
/// assert_eq!(Counter.step(&0, &2, &2), Some(2));
/// assert_eq!(Counter.step(&0, &2, &3), None);
/// ```
pub trait Model: Send + Sync {
    /// The state of the modelled object.
    type State: Clone + PartialEq + Debug + Send;

    /// The argument of an operation.
    type Input: Clone + Debug + Send + Sync;

    /// The value an operation returned.
    type Output: Clone + Debug + Send + Sync;

    /// Initial state of the system.
    fn init(&self) -> Self::State;

    /// Applies one operation to `state`.
    ///
    /// Returns the successor state if the system, in `state`, can accept
    /// `input` and respond with `output`; `None` otherwise.
    fn step(
        &self,
        state: &Self::State,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Option<Self::State>;

    /// Equality on states, used to recognise already explored search states.
    ///
    /// # Default Implementation
    ///
    /// Structural equality (`==`).
    fn equal(&self, s1: &Self::State, s2: &Self::State) -> bool {
        s1 == s2
    }

    /// Splits an operation history into independently checkable parts.
    ///
    /// # Default Implementation
    ///
    /// A single partition containing the whole history.
    fn partition(
        &self,
        history: Vec<Operation<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Operation<Self::Input, Self::Output>>> {
        vec![history]
    }

    /// Splits an event history into independently checkable parts.
    ///
    /// Every partition must contain both halves of each operation it holds.
    ///
    /// # Default Implementation
    ///
    /// A single partition containing the whole history.
    fn partition_events(
        &self,
        history: Vec<Event<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Event<Self::Input, Self::Output>>> {
        vec![history]
    }

    /// Describes an operation for diagnostics, e.g. `get('x') -> 'y'`.
    fn describe_operation(&self, input: &Self::Input, output: &Self::Output) -> String {
        format!("{:?} -> {:?}", input, output)
    }

    /// Describes a state for diagnostics.
    fn describe_state(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }

    /// Get the name of this model for debugging purposes.
    fn name(&self) -> &str {
        "unnamed-model"
    }
}

/// A sequential specification whose step function may yield several
/// successor states.
///
/// Convert it into a [`Model`] with [`PowerSetModel::new`].
pub trait NondeterministicModel: Send + Sync {
    /// The state of the modelled object.
    type State: Clone + PartialEq + Debug + Send;

    /// The argument of an operation.
    type Input: Clone + Debug + Send + Sync;

    /// The value an operation returned.
    type Output: Clone + Debug + Send + Sync;

    /// All possible initial states.
    fn init(&self) -> Vec<Self::State>;

    /// All possible successor states. Empty if the system cannot accept
    /// `input` and respond with `output` from `state`.
    fn step(
        &self,
        state: &Self::State,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Vec<Self::State>;

    /// Equality on states. Defaults to `==`.
    fn equal(&self, s1: &Self::State, s2: &Self::State) -> bool {
        s1 == s2
    }

    /// See [`Model::partition`].
    fn partition(
        &self,
        history: Vec<Operation<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Operation<Self::Input, Self::Output>>> {
        vec![history]
    }

    /// See [`Model::partition_events`].
    fn partition_events(
        &self,
        history: Vec<Event<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Event<Self::Input, Self::Output>>> {
        vec![history]
    }

    /// See [`Model::describe_operation`].
    fn describe_operation(&self, input: &Self::Input, output: &Self::Output) -> String {
        format!("{:?} -> {:?}", input, output)
    }

    /// See [`Model::describe_state`].
    fn describe_state(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }

    /// Get the name of this model for debugging purposes.
    fn name(&self) -> &str {
        "unnamed-model"
    }
}

/// Adapts a [`NondeterministicModel`] into a [`Model`] whose state is the
/// deduplicated set of all states the inner model could be in.
///
/// A step succeeds when at least one inner state can take it.
#[derive(Debug, Clone)]
pub struct PowerSetModel<N> {
    inner: N,
}

impl<N: NondeterministicModel> PowerSetModel<N> {
    /// Wraps a nondeterministic model.
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    /// Returns the wrapped model.
    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// Drops states equal (under the inner model's `equal`) to an earlier one.
    fn merge(&self, states: Vec<N::State>) -> Vec<N::State> {
        let mut unique: Vec<N::State> = Vec::with_capacity(states.len());
        for state in states {
            if !unique.iter().any(|u| self.inner.equal(&state, u)) {
                unique.push(state);
            }
        }
        unique
    }
}

impl<N: NondeterministicModel> Model for PowerSetModel<N> {
    type State = Vec<N::State>;
    type Input = N::Input;
    type Output = N::Output;

    fn init(&self) -> Self::State {
        self.merge(self.inner.init())
    }

    fn step(
        &self,
        states: &Self::State,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Option<Self::State> {
        let next: Vec<N::State> = states
            .iter()
            .flat_map(|state| self.inner.step(state, input, output))
            .collect();
        let next = self.merge(next);
        (!next.is_empty()).then_some(next)
    }

    // Both sides are already merged, so equal sizes plus one-way inclusion
    // means set equality.
    fn equal(&self, s1: &Self::State, s2: &Self::State) -> bool {
        s1.len() == s2.len()
            && s1
                .iter()
                .all(|a| s2.iter().any(|b| self.inner.equal(a, b)))
    }

    fn partition(
        &self,
        history: Vec<Operation<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Operation<Self::Input, Self::Output>>> {
        self.inner.partition(history)
    }

    fn partition_events(
        &self,
        history: Vec<Event<Self::Input, Self::Output>>,
    ) -> Vec<Vec<Event<Self::Input, Self::Output>>> {
        self.inner.partition_events(history)
    }

    fn describe_operation(&self, input: &Self::Input, output: &Self::Output) -> String {
        self.inner.describe_operation(input, output)
    }

    fn describe_state(&self, states: &Self::State) -> String {
        let parts: Vec<String> = states
            .iter()
            .map(|s| self.inner.describe_state(s))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
