use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::{Handle, TryCurrentError};

/// Deferred work handed to a [`TimerScheduler`].
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

// Roughly 30 years, the same horizon Tokio uses for "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, clamped to a far-future instant instead of overflowing.
pub fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Source of delayed callbacks.
///
/// Every scheduled task runs exactly once; there is no cancellation.
pub trait TimerScheduler: Send + Sync {
    /// Current instant on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: TimerTask);
}

/// Runs each task on a Tokio task after `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Scheduler spawning onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime the caller is running on.
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl TimerScheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

#[derive(Default)]
struct VirtualClock {
    elapsed: Duration,
    sequence: u64,
    timers: BTreeMap<(Duration, u64), TimerTask>,
}

/// Virtual-time scheduler.
///
/// Nothing fires until [`advance`](Self::advance) moves the clock; timers due
/// at the same instant fire in the order they were scheduled.
pub struct ManualScheduler {
    origin: Instant,
    clock: Mutex<VirtualClock>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.lock();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &clock.elapsed)
            .field("pending", &clock.timers.len())
            .finish()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Virtual clock starting now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            clock: Mutex::new(VirtualClock::default()),
        }
    }

    /// The instant virtual time started from.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Virtual time since [`origin`](Self::origin).
    pub fn elapsed(&self) -> Duration {
        self.clock.lock().elapsed
    }

    /// Timers not yet fired.
    pub fn pending(&self) -> usize {
        self.clock.lock().timers.len()
    }

    /// Move virtual time forward by `by`, firing every timer that falls due.
    ///
    /// Tasks scheduled while advancing fire too if their deadline is within
    /// the window. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.lock().elapsed.saturating_add(by);
        let mut fired = 0;

        loop {
            let task = {
                let mut clock = self.clock.lock();
                let due = clock
                    .timers
                    .first_key_value()
                    .map(|(&(deadline, _), _)| deadline)
                    .filter(|deadline| *deadline <= target);
                match due {
                    Some(deadline) => {
                        clock.elapsed = clock.elapsed.max(deadline);
                        clock.timers.pop_first().map(|(_, task)| task)
                    }
                    None => {
                        clock.elapsed = target;
                        None
                    }
                }
            };

            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }

    /// Fire everything currently scheduled, however far in the future.
    pub fn run_all(&self) -> usize {
        let last = self
            .clock
            .lock()
            .timers
            .last_key_value()
            .map(|(&(deadline, _), _)| deadline);
        match last {
            Some(deadline) => {
                let by = deadline.saturating_sub(self.elapsed());
                self.advance(by)
            }
            None => 0,
        }
    }
}

impl TimerScheduler for ManualScheduler {
    fn now(&self) -> Instant {
        deadline_after(self.origin, self.elapsed())
    }

    fn schedule(&self, delay: Duration, task: TimerTask) {
        let mut clock = self.clock.lock();
        let deadline = clock.elapsed.saturating_add(delay);
        clock.sequence += 1;
        let key = (deadline, clock.sequence);
        clock.timers.insert(key, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TimerTask) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &'static str| -> TimerTask {
            let sink = sink.clone();
            Box::new(move || sink.lock().push(label))
        };
        (log, make)
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::from_millis(300), task("late"));
        scheduler.schedule(Duration::from_millis(100), task("early"));
        scheduler.schedule(Duration::from_millis(100), task("early-second"));

        assert_eq!(scheduler.advance(Duration::from_millis(99)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 2);
        assert_eq!(*log.lock(), vec!["early", "early-second"]);

        assert_eq!(scheduler.advance(Duration::from_millis(500)), 1);
        assert_eq!(*log.lock(), vec!["early", "early-second", "late"]);
        assert_eq!(scheduler.elapsed(), Duration::from_millis(600));
    }

    #[test]
    fn zero_delay_waits_for_an_advance() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.schedule(Duration::ZERO, task("now"));
        assert!(log.lock().is_empty());
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.advance(Duration::ZERO), 1);
        assert_eq!(*log.lock(), vec!["now"]);
    }

    #[test]
    fn tasks_scheduled_while_advancing_fire_within_the_window() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (log, task) = recorder();

        let nested = scheduler.clone();
        let follow_up = task("follow-up");
        let mut follow_up = Some(follow_up);
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                if let Some(next) = follow_up.take() {
                    nested.schedule(Duration::from_millis(10), next);
                }
            }),
        );

        assert_eq!(scheduler.advance(Duration::from_millis(25)), 2);
        assert_eq!(*log.lock(), vec!["follow-up"]);
    }

    #[test]
    fn now_tracks_virtual_time() {
        let scheduler = ManualScheduler::new();
        scheduler.advance(Duration::from_millis(250));
        assert_eq!(
            scheduler.now() - scheduler.origin(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn deadlines_clamp_instead_of_overflowing() {
        let scheduler = ManualScheduler::new();
        let origin = scheduler.origin();
        assert!(deadline_after(origin, Duration::MAX) > origin);
        assert_eq!(
            deadline_after(origin, Duration::from_secs(1)),
            origin + Duration::from_secs(1)
        );

        let (log, task) = recorder();
        scheduler.schedule(Duration::MAX, task("never"));
        assert_eq!(scheduler.run_all(), 1);
        assert_eq!(*log.lock(), vec!["never"]);
        assert!(scheduler.now() > origin);
    }

    #[test]
    fn run_all_drains_future_timers() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        scheduler.schedule(Duration::from_secs(5), task("far"));
        assert_eq!(scheduler.run_all(), 1);
        assert_eq!(*log.lock(), vec!["far"]);
        assert_eq!(scheduler.run_all(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_fires_after_the_delay() {
        let scheduler = TokioScheduler::try_current().expect("runtime");
        let (tx, rx) = tokio::sync::oneshot::channel();

        let started = scheduler.now();
        scheduler.schedule(
            Duration::from_millis(300),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        rx.await.expect("timer fired");
        assert!(scheduler.now() - started >= Duration::from_millis(300));
    }
}
