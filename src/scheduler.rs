//! Periodic job scheduling.
//!
//! The engine never owns a thread or timer. It asks a [`JobScheduler`] for a
//! cancellable periodic job and gets called back on every tick.
//!
//! [`TickScheduler`] is a portable implementation without async/await or
//! platform-specific timers. The caller is responsible for sleeping/waiting
//! between polls, which also makes it usable as a virtual clock.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use embassy_time::{Duration, Instant};
use heapless::Vec;

/// Shortest period a job can be scheduled with.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Work invoked on every tick of a periodic job.
pub trait PeriodicJob {
    /// Run one iteration. Must not block.
    ///
    /// `token` is the value the job was spawned with.
    fn run(&self, now: Instant, token: u32);
}

/// Error returned when a periodic job cannot be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The scheduler has no room for another job
    NoFreeSlot,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFreeSlot => f.write_str("no free scheduler slot"),
        }
    }
}

/// Capability to run cancellable periodic jobs.
///
/// Implement this trait to bind the engine to a task runtime.
pub trait JobScheduler<'a> {
    /// Handle of a spawned job
    type Handle;

    /// Start calling `job` every `period`, passing `token` to each run.
    fn spawn_periodic(
        &self,
        period: Duration,
        job: &'a dyn PeriodicJob,
        token: u32,
    ) -> Result<Self::Handle, SpawnError>;

    /// Stop the job.
    ///
    /// No run starts after this returns. A run already in progress on
    /// another context is not waited for: jobs that must not act after
    /// cancellation compare the `token` they receive with their own state.
    /// Calling it from inside the job's own `run` is allowed.
    fn cancel(&self, handle: Self::Handle);
}

/// Handle of a job spawned on a [`TickScheduler`].
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle(u32);

/// Result of a poll.
#[derive(Debug, Clone, Copy)]
pub struct PollResult {
    /// The earliest deadline of a scheduled job, if any.
    pub next_deadline: Option<Instant>,
    /// How long to wait until the next poll (zero if behind schedule).
    pub sleep_duration: Duration,
}

#[derive(Clone, Copy)]
struct Slot<'a> {
    id: u32,
    period: Duration,
    /// `None` until the first poll after spawning
    next_due: Option<Instant>,
    token: u32,
    job: &'a dyn PeriodicJob,
}

/// Plain array without drop glue, so jobs may borrow locals that are
/// declared after the scheduler.
struct SlotTable<'a, const N: usize> {
    slots: [Option<Slot<'a>>; N],
    next_id: u32,
}

impl<'a, const N: usize> SlotTable<'a, N> {
    fn position(&self, id: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(slot) if slot.id == id))
    }

    fn live(&self) -> impl Iterator<Item = &Slot<'a>> {
        self.slots.iter().flatten()
    }
}

/// Caller-paced scheduler for up to `N` jobs.
///
/// # Usage
///
/// ```ignore
/// let scheduler: TickScheduler<'_, 4> = TickScheduler::new();
/// let engine = EffectEngine::new(&strip, &scheduler, 0);
/// engine.start()?;
///
/// loop {
///     let result = scheduler.poll(Instant::now());
///     // Platform-specific sleep
///     sleep_ms(result.sleep_duration.as_millis());
/// }
/// ```
pub struct TickScheduler<'a, const N: usize> {
    inner: Mutex<RefCell<SlotTable<'a, N>>>,
}

impl<'a, const N: usize> TickScheduler<'a, N> {
    /// Create an empty scheduler
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(SlotTable {
                slots: [None; N],
                next_id: 0,
            })),
        }
    }

    /// Number of live jobs
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().live().count())
    }

    /// Check if no job is scheduled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every job that is due at `now` and return timing information.
    ///
    /// This method:
    /// 1. Applies drift correction to jobs that have fallen too far behind
    /// 2. Runs each due job once
    /// 3. Returns the earliest deadline among the remaining jobs
    ///
    /// Jobs spawned while polling first run on the next poll.
    pub fn poll(&self, now: Instant) -> PollResult {
        let due = self.collect_due(now);

        for (id, token, job) in due {
            // An earlier job may have cancelled this one
            let live = critical_section::with(|cs| {
                self.inner.borrow(cs).borrow().position(id).is_some()
            });
            if !live {
                continue;
            }

            job.run(now, token);

            critical_section::with(|cs| {
                let mut table = self.inner.borrow(cs).borrow_mut();
                if let Some(slot) = table.slots.iter_mut().flatten().find(|slot| slot.id == id) {
                    slot.next_due = slot.next_due.map(|due| due + slot.period);
                }
            });
        }

        let next_deadline = critical_section::with(|cs| {
            let table = self.inner.borrow(cs).borrow();
            table
                .live()
                .map(|slot| slot.next_due.unwrap_or(now))
                .min()
        });
        let sleep_duration = next_deadline
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(Duration::from_millis(0));

        PollResult {
            next_deadline,
            sleep_duration,
        }
    }

    fn collect_due(&self, now: Instant) -> Vec<(u32, u32, &'a dyn PeriodicJob), N> {
        critical_section::with(|cs| {
            let mut table = self.inner.borrow(cs).borrow_mut();
            let mut due = Vec::new();
            for slot in table.slots.iter_mut().flatten() {
                let next_due = match slot.next_due {
                    // Drift correction: if we've fallen too far behind, reset to now
                    // This prevents catch-up bursts after long stalls
                    Some(next_due) if now > next_due + slot.period * 2 => now,
                    Some(next_due) => next_due,
                    None => now,
                };
                slot.next_due = Some(next_due);
                if now >= next_due {
                    // At most N live slots
                    let _ = due.push((slot.id, slot.token, slot.job));
                }
            }
            due
        })
    }
}

impl<const N: usize> Default for TickScheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> JobScheduler<'a> for TickScheduler<'a, N> {
    type Handle = JobHandle;

    fn spawn_periodic(
        &self,
        period: Duration,
        job: &'a dyn PeriodicJob,
        token: u32,
    ) -> Result<JobHandle, SpawnError> {
        critical_section::with(|cs| {
            let mut table = self.inner.borrow(cs).borrow_mut();
            let id = table.next_id;
            let free = table
                .slots
                .iter_mut()
                .find(|slot| slot.is_none())
                .ok_or(SpawnError::NoFreeSlot)?;
            *free = Some(Slot {
                id,
                period: period.max(MIN_PERIOD),
                next_due: None,
                token,
                job,
            });
            table.next_id = id.wrapping_add(1);
            Ok(JobHandle(id))
        })
    }

    fn cancel(&self, handle: JobHandle) {
        critical_section::with(|cs| {
            let mut table = self.inner.borrow(cs).borrow_mut();
            if let Some(index) = table.position(handle.0) {
                table.slots[index] = None;
            }
        });
    }
}
