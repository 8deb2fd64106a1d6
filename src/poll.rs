//! Periodic task scheduler shared by the telemetry modules.
//!
//! A [`PollScheduler`] holds a set of named tasks, each with its own period.
//! Tasks run concurrently with each other, but a single task never overlaps
//! itself: the next tick is only awaited once the previous cycle settled.
//!
//! Each cycle runs in its own spawned future, so an error or panic in one
//! cycle is logged and the task simply tries again on its next tick.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use govwatch::poll::PollScheduler;
//!
//! # tokio_test::block_on(async {
//! let mut scheduler = PollScheduler::new("example");
//! scheduler.register("heartbeat", Duration::from_secs(1), || async {
//!     Ok::<(), anyhow::Error>(())
//! });
//! scheduler.start();
//! assert!(scheduler.is_running());
//! scheduler.stop();
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

type Callback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct PollTask {
    name: &'static str,
    period: Duration,
    callback: Callback,
}

/// Named set of periodic tasks with start/stop/restart semantics.
pub struct PollScheduler {
    owner: &'static str,
    tasks: Vec<PollTask>,
    handles: Vec<JoinHandle<()>>,
}

impl fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollScheduler")
            .field("owner", &self.owner)
            .field(
                "tasks",
                &self
                    .tasks
                    .iter()
                    .map(|t| (t.name, t.period))
                    .collect::<Vec<_>>(),
            )
            .field("live", &self.handles.len())
            .finish()
    }
}

impl PollScheduler {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            tasks: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Register a task. Takes effect on the next [`start`](Self::start).
    ///
    /// Registering a name twice replaces the earlier task.
    pub fn register<F, Fut>(&mut self, name: &'static str, period: Duration, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: Callback = Arc::new(move || callback().boxed());
        self.tasks.retain(|t| t.name != name);
        self.tasks.push(PollTask {
            name,
            period,
            callback,
        });
    }

    /// Start every registered task. Any live handles are stopped first, so
    /// calling this twice never leaves duplicate timers.
    pub fn start(&mut self) {
        self.stop();
        for task in &self.tasks {
            let handle = tokio::spawn(run_task(
                self.owner,
                task.name,
                task.period,
                task.callback.clone(),
            ));
            self.handles.push(handle);
        }
        info!(owner = self.owner, tasks = self.tasks.len(), "poll scheduler started");
    }

    /// Cancel every live task. Idempotent.
    ///
    /// A cycle already in flight is not aborted; whatever it reports is left
    /// for the owner to discard.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!(owner = self.owner, "poll scheduler stopped");
    }

    pub fn restart(&mut self) {
        self.start();
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Number of task handles currently held.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    pub fn task_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tasks.iter().map(|t| t.name)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_task(owner: &'static str, name: &'static str, period: Duration, callback: Callback) {
    // First firing one period after start.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        debug!(owner, task = name, "poll cycle");
        match tokio::spawn(callback()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(owner, task = name, "poll cycle failed: {e:#}"),
            Err(e) if e.is_panic() => error!(owner, task = name, "poll cycle panicked"),
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static {
        let counter = counter.clone();
        move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_fire_at_their_own_period() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));

        let mut scheduler = PollScheduler::new("test");
        scheduler.register("fast", Duration::from_secs(1), counter_task(&fast));
        scheduler.register("slow", Duration::from_secs(3), counter_task(&slow));
        scheduler.start();

        time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(fast.load(Ordering::SeqCst), 6);
        assert_eq!(slow.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new("test");
        scheduler.register("tick", Duration::from_secs(1), counter_task(&count));
        scheduler.start();
        time::sleep(Duration::from_millis(2500)).await;

        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());

        let seen = count.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_one_handle_per_task() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new("test");
        scheduler.register("a", Duration::from_secs(1), counter_task(&count));
        scheduler.register("b", Duration::from_secs(1), counter_task(&count));
        scheduler.start();
        scheduler.start();
        scheduler.restart();
        assert_eq!(scheduler.live_handles(), 2);

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_task_does_not_affect_others() {
        let ok = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));

        let mut scheduler = PollScheduler::new("test");
        scheduler.register("ok", Duration::from_secs(1), counter_task(&ok));
        let f = failures.clone();
        scheduler.register("broken", Duration::from_secs(1), move || {
            let f = f.clone();
            async move {
                let n = f.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 1 {
                    panic!("cycle {n} blew up");
                }
                let result: anyhow::Result<()> = Err(anyhow::anyhow!("transient failure"));
                result
            }
        });
        scheduler.start();

        time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(ok.load(Ordering::SeqCst), 4);
        // keeps retrying on its own cadence after errors and panics
        assert_eq!(failures.load(Ordering::SeqCst), 4);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_of_one_task_never_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let mut scheduler = PollScheduler::new("test");
        let (a, m, r) = (active.clone(), max_active.clone(), runs.clone());
        scheduler.register("slow", Duration::from_secs(1), move || {
            let (a, m, r) = (a.clone(), m.clone(), r.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                // three periods of work
                time::sleep(Duration::from_secs(3)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                r.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        });
        scheduler.start();

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new("test");
        scheduler.register("tick", Duration::from_secs(1), counter_task(&count));
        scheduler.register("tick", Duration::from_secs(2), counter_task(&count));
        assert_eq!(scheduler.task_names().collect::<Vec<_>>(), vec!["tick"]);
    }
}
