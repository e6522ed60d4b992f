//! Linearizability checker front end.
//!
//! The [`LinearizabilityChecker`] partitions a history with the model, runs
//! one independent search per partition on tokio's blocking pool, and
//! supervises them:
//!
//! - every partition gets its own kill flag, polled by its search loop;
//! - when the configured timeout elapses, all flags are raised;
//! - as soon as one partition is proven illegal, all flags are raised too,
//!   since one illegal partition makes the whole history illegal (verbose
//!   checks skip this so that every partition gets its witnesses);
//! - an external [`CancelHandle`] raises all flags on request.
//!
//! Searches share nothing but the model, so partitions scale across threads
//! without locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lincheck_core::{Event, Operation};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::config::CheckerConfig;
use crate::entry::Timeline;
use crate::error::{CheckerError, Result};
use crate::info::LinearizationInfo;
use crate::model::Model;
use crate::result::{CheckResult, CheckStatus, PartitionReport};
use crate::search::{self, SearchOutcome, SearchReport};

/// Requests cancellation of in-flight checks.
///
/// Cancellation is sticky: once cancelled, every check started through the
/// owning checker returns `Unknown` until [`CancelHandle::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    /// Create a new, untriggered handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels running and future checks.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation.
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Per-partition kill flags, raised together on drop.
///
/// A caller may drop a check future at any await point, for example under
/// `tokio::time::timeout`. The blocking searches cannot be aborted, so they
/// must be told to stop through their flags.
struct KillSwitch {
    flags: Vec<Arc<AtomicBool>>,
}

impl KillSwitch {
    fn new(partitions: usize) -> Self {
        Self {
            flags: (0..partitions)
                .map(|_| Arc::new(AtomicBool::new(false)))
                .collect(),
        }
    }

    fn flag(&self, partition: usize) -> Arc<AtomicBool> {
        Arc::clone(&self.flags[partition])
    }

    fn raise_all(&self) {
        for flag in &self.flags {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for KillSwitch {
    fn drop(&mut self) {
        self.raise_all();
    }
}

/// A linearizability checker for one model.
///
/// # Example
///
/// ```rust
/// use lincheck_checker::models::{RegisterInput, RegisterModel};
/// use lincheck_checker::{CheckStatus, LinearizabilityChecker};
/// use lincheck_core::{ClientId, Operation};
///
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let history = vec![
///     Operation::new(ClientId(0), RegisterInput::Put(1), 0, 0, 10),
///     Operation::new(ClientId(1), RegisterInput::Get, 20, 1, 30),
/// ];
/// let result = LinearizabilityChecker::new(RegisterModel)
///     .check_operations(history)
///     .await?;
/// assert_eq!(result.status, CheckStatus::Ok);
/// # Ok(()) }
/// ```
pub struct LinearizabilityChecker<M> {
    /// The sequential specification model.
    model: Arc<M>,
    /// Configuration for the checker.
    config: CheckerConfig,
    cancel: CancelHandle,
}

impl<M> LinearizabilityChecker<M>
where
    M: Model + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::State: 'static,
{
    /// Create a new linearizability checker.
    pub fn new(model: M) -> Self {
        Self::with_config(model, CheckerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(model: M, config: CheckerConfig) -> Self {
        Self {
            model: Arc::new(model),
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Set the timeout for checking.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// The model this checker checks against.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The active configuration.
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// A handle that cancels this checker's running checks.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Checks an operation history.
    ///
    /// # Errors
    ///
    /// Returns an error if an operation returns before it is called or a
    /// search task fails.
    pub async fn check_operations(
        &self,
        history: Vec<Operation<M::Input, M::Output>>,
    ) -> Result<CheckResult> {
        let timelines = self.operation_timelines(history)?;
        let (result, _) = self.run(timelines, false).await?;
        Ok(result)
    }

    /// Checks an operation history and returns the witnesses found.
    pub async fn check_operations_verbose(
        &self,
        history: Vec<Operation<M::Input, M::Output>>,
    ) -> Result<(CheckResult, LinearizationInfo<M::Input, M::Output>)> {
        let timelines = self.operation_timelines(history)?;
        self.run(timelines, true).await
    }

    /// Checks an event history.
    ///
    /// # Errors
    ///
    /// Returns an error if a partition breaks the call/return pairing
    /// contract or a search task fails.
    pub async fn check_events(
        &self,
        history: Vec<Event<M::Input, M::Output>>,
    ) -> Result<CheckResult> {
        let timelines = self.event_timelines(history)?;
        let (result, _) = self.run(timelines, false).await?;
        Ok(result)
    }

    /// Checks an event history and returns the witnesses found.
    pub async fn check_events_verbose(
        &self,
        history: Vec<Event<M::Input, M::Output>>,
    ) -> Result<(CheckResult, LinearizationInfo<M::Input, M::Output>)> {
        let timelines = self.event_timelines(history)?;
        self.run(timelines, true).await
    }

    fn operation_timelines(
        &self,
        history: Vec<Operation<M::Input, M::Output>>,
    ) -> Result<Vec<Timeline<M::Input, M::Output>>> {
        self.model
            .partition(history)
            .into_iter()
            .map(|partition| Timeline::from_operations(partition).map_err(CheckerError::from))
            .collect()
    }

    fn event_timelines(
        &self,
        history: Vec<Event<M::Input, M::Output>>,
    ) -> Result<Vec<Timeline<M::Input, M::Output>>> {
        self.model
            .partition_events(history)
            .into_iter()
            .map(|partition| Timeline::from_events(partition).map_err(CheckerError::from))
            .collect()
    }

    /// Searches every partition concurrently and supervises the searches.
    async fn run(
        &self,
        timelines: Vec<Timeline<M::Input, M::Output>>,
        verbose: bool,
    ) -> Result<(CheckResult, LinearizationInfo<M::Input, M::Output>)> {
        let start = Instant::now();
        let options = self.config.search_options(verbose);
        let timelines: Vec<Arc<Timeline<M::Input, M::Output>>> =
            timelines.into_iter().map(Arc::new).collect();
        // Raises every flag when the check returns or its future is dropped.
        let kills = KillSwitch::new(timelines.len());
        let kill_all = || kills.raise_all();

        // Register interest before checking the flag so a cancel that races
        // with startup is not missed.
        let cancelled = self.cancel.inner.notify.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();
        if self.cancel.is_cancelled() {
            kill_all();
        }

        debug!(
            model = self.model.name(),
            partitions = timelines.len(),
            timeout_ms = self.config.timeout_ms,
            "Dispatching partition searches"
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, SearchReport)>();
        let mut handles = Vec::with_capacity(timelines.len());
        for (index, timeline) in timelines.iter().enumerate() {
            let model = Arc::clone(&self.model);
            let timeline = Arc::clone(timeline);
            let kill = kills.flag(index);
            let tx = tx.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let report = search::check_single(&*model, &timeline, options, &kill);
                // The receiver only goes away if the supervisor gave up.
                let _ = tx.send((index, report));
            }));
        }
        drop(tx);

        let deadline = self.config.timeout();
        let sleep = async move {
            match deadline {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(sleep);

        let mut reports: Vec<Option<SearchReport>> = timelines.iter().map(|_| None).collect();
        let mut timed_out = false;
        let mut short_circuited = false;
        let mut cancel_seen = false;

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some((index, report)) = received else { break };
                    debug!(
                        partition = index,
                        outcome = %report.outcome,
                        states = report.stats.states_explored,
                        backtracks = report.stats.backtracks,
                        "Partition search finished"
                    );
                    // Verbose checks keep searching so every partition
                    // reports complete witnesses.
                    if report.outcome == SearchOutcome::Illegal && !verbose && !short_circuited {
                        short_circuited = true;
                        warn!(partition = index, "Partition is not linearizable, cancelling remaining searches");
                        kill_all();
                    }
                    reports[index] = Some(report);
                }
                _ = &mut sleep, if !timed_out => {
                    timed_out = true;
                    debug!("Check deadline elapsed, cancelling searches");
                    kill_all();
                }
                _ = &mut cancelled, if !cancel_seen => {
                    cancel_seen = true;
                    debug!("Check cancelled by caller");
                    kill_all();
                }
            }
        }

        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                return Err(CheckerError::TaskFailed {
                    partition: index,
                    message: e.to_string(),
                });
            }
        }

        let mut partitions = Vec::with_capacity(reports.len());
        let mut partial_linearizations = Vec::with_capacity(reports.len());
        for (index, report) in reports.into_iter().enumerate() {
            let report = report.ok_or_else(|| CheckerError::TaskFailed {
                partition: index,
                message: "search exited without a report".into(),
            })?;
            partitions.push(PartitionReport {
                index,
                operations: timelines[index].operations(),
                status: CheckStatus::from(report.outcome),
                stats: report.stats,
            });
            partial_linearizations.push(report.partial_linearizations);
        }

        let result = CheckResult::from_partitions(partitions, start.elapsed());
        info!(
            model = self.model.name(),
            status = %result.status,
            partitions = result.stats.num_partitions,
            operations = result.stats.num_operations,
            duration_ms = result.duration.as_millis() as u64,
            "Linearizability check complete"
        );

        let history = if verbose {
            timelines
                .into_iter()
                .map(|timeline| {
                    Arc::try_unwrap(timeline)
                        .unwrap_or_else(|shared| (*shared).clone())
                        .into_entries()
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok((
            result,
            LinearizationInfo {
                history,
                partial_linearizations: if verbose {
                    partial_linearizations
                } else {
                    Vec::new()
                },
            },
        ))
    }
}

/// Returns whether an operation history is linearizable, with no timeout.
pub async fn check_operations<M>(
    model: M,
    history: Vec<Operation<M::Input, M::Output>>,
) -> Result<bool>
where
    M: Model + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::State: 'static,
{
    let result = LinearizabilityChecker::new(model)
        .check_operations(history)
        .await?;
    Ok(result.is_ok())
}

/// Returns whether an event history is linearizable, with no timeout.
pub async fn check_events<M>(model: M, history: Vec<Event<M::Input, M::Output>>) -> Result<bool>
where
    M: Model + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::State: 'static,
{
    let result = LinearizabilityChecker::new(model).check_events(history).await?;
    Ok(result.is_ok())
}

/// Checks an operation history, giving up after `timeout` if one is given.
pub async fn check_operations_timeout<M>(
    model: M,
    history: Vec<Operation<M::Input, M::Output>>,
    timeout: Option<Duration>,
) -> Result<CheckStatus>
where
    M: Model + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::State: 'static,
{
    let config = match timeout {
        Some(timeout) => CheckerConfig::default().with_timeout(timeout),
        None => CheckerConfig::default(),
    };
    let result = LinearizabilityChecker::with_config(model, config)
        .check_operations(history)
        .await?;
    Ok(result.status)
}

/// Checks an event history, giving up after `timeout` if one is given.
pub async fn check_events_timeout<M>(
    model: M,
    history: Vec<Event<M::Input, M::Output>>,
    timeout: Option<Duration>,
) -> Result<CheckStatus>
where
    M: Model + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::State: 'static,
{
    let config = match timeout {
        Some(timeout) => CheckerConfig::default().with_timeout(timeout),
        None => CheckerConfig::default(),
    };
    let result = LinearizabilityChecker::with_config(model, config)
        .check_events(history)
        .await?;
    Ok(result.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RegisterInput, RegisterModel};
    use lincheck_core::ClientId;

    fn put(client: u32, v: i64, call: i64, ret: i64) -> Operation<RegisterInput, i64> {
        Operation::new(ClientId(client), RegisterInput::Put(v), call, 0, ret)
    }

    fn get(client: u32, v: i64, call: i64, ret: i64) -> Operation<RegisterInput, i64> {
        Operation::new(ClientId(client), RegisterInput::Get, call, v, ret)
    }

    /// Register that counts every step the search asks of it.
    struct CountingRegister {
        steps: Arc<std::sync::atomic::AtomicU64>,
    }

    impl Model for CountingRegister {
        type State = i64;
        type Input = RegisterInput;
        type Output = i64;

        fn init(&self) -> i64 {
            RegisterModel.init()
        }

        fn step(&self, state: &i64, input: &RegisterInput, output: &i64) -> Option<i64> {
            self.steps.fetch_add(1, Ordering::Relaxed);
            RegisterModel.step(state, input, output)
        }
    }

    #[tokio::test]
    async fn test_dropped_check_stops_searches() {
        // Fully concurrent writes and an impossible read: exponential search.
        let mut history: Vec<_> = (1..=28).map(|v| put(v as u32, v, 0, 1_000)).collect();
        history.push(get(0, -1, 0, 1_000));

        let steps = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let checker = LinearizabilityChecker::new(CountingRegister {
            steps: Arc::clone(&steps),
        });
        let outcome =
            tokio::time::timeout(Duration::from_millis(50), checker.check_operations(history)).await;
        assert!(outcome.is_err(), "search should still be running at the deadline");

        // Give the search a moment to observe its flag, then make sure it
        // has stopped stepping the model.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_drop = steps.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(steps.load(Ordering::Relaxed), after_drop);
    }

    #[test]
    fn test_kill_switch_raises_flags_on_drop() {
        let kills = KillSwitch::new(3);
        let flags: Vec<_> = (0..3).map(|i| kills.flag(i)).collect();
        assert!(flags.iter().all(|f| !f.load(Ordering::Relaxed)));
        drop(kills);
        assert!(flags.iter().all(|f| f.load(Ordering::Relaxed)));
    }

    #[tokio::test]
    async fn test_simple_linearizable_history() {
        let checker = LinearizabilityChecker::new(RegisterModel)
            .with_timeout(Duration::from_secs(5));
        let result = checker
            .check_operations(vec![put(0, 1, 0, 10), get(1, 1, 20, 30)])
            .await
            .unwrap();
        assert!(result.is_ok(), "Simple sequential history should be linearizable");
        assert_eq!(result.stats.num_operations, 2);
        assert_eq!(result.partitions.len(), 1);
    }

    #[tokio::test]
    async fn test_illegal_history() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let result = checker
            .check_operations(vec![put(0, 1, 0, 10), get(1, 2, 5, 15)])
            .await
            .unwrap();
        assert!(result.is_illegal());
    }

    #[tokio::test]
    async fn test_empty_history() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let result = checker.check_operations(Vec::new()).await.unwrap();
        assert!(result.is_ok(), "Empty history should be linearizable");
    }

    #[tokio::test]
    async fn test_verbose_returns_witness() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let (result, info) = checker
            .check_operations_verbose(vec![put(0, 1, 0, 10), get(1, 1, 20, 30)])
            .await
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(info.partial_linearizations, vec![vec![vec![0, 1]]]);
        assert_eq!(info.history[0].len(), 4);
    }

    #[tokio::test]
    async fn test_non_verbose_info_is_empty() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let timelines = checker
            .operation_timelines(vec![put(0, 1, 0, 10)])
            .unwrap();
        let (_, info) = checker.run(timelines, false).await.unwrap();
        assert!(info.history.is_empty());
        assert!(info.partial_linearizations.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_check_is_unknown() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let handle = checker.cancel_handle();
        handle.cancel();
        assert!(handle.is_cancelled());

        let result = checker
            .check_operations(vec![put(0, 1, 0, 10), get(1, 1, 20, 30)])
            .await
            .unwrap();
        assert!(result.is_unknown());

        handle.reset();
        let result = checker
            .check_operations(vec![put(0, 1, 0, 10), get(1, 1, 20, 30)])
            .await
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_events_rejected() {
        let checker = LinearizabilityChecker::new(RegisterModel);
        let err = checker
            .check_events(vec![Event::call(ClientId(0), 0, RegisterInput::Get)])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckerError::History(_)));
    }

    #[tokio::test]
    async fn test_free_functions() {
        assert!(check_operations(RegisterModel, vec![put(0, 3, 0, 1), get(0, 3, 2, 3)])
            .await
            .unwrap());
        assert!(!check_events(
            RegisterModel,
            vec![
                Event::call(ClientId(0), 0, RegisterInput::Get),
                Event::ret(ClientId(0), 0, 9),
            ],
        )
        .await
        .unwrap());

        let status = check_operations_timeout(
            RegisterModel,
            vec![put(0, 3, 0, 1)],
            Some(Duration::from_secs(1)),
        )
        .await
        .unwrap();
        assert_eq!(status, CheckStatus::Ok);

        let status = check_events_timeout(
            RegisterModel,
            vec![
                Event::call(ClientId(0), 0, RegisterInput::Put(2)),
                Event::ret(ClientId(0), 0, 0),
            ],
            None,
        )
        .await
        .unwrap();
        assert_eq!(status, CheckStatus::Ok);
    }
}
