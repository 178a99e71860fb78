//! Timer scheduling for the fade.
//!
//! [`Scheduler`] is the slice of a host event loop the fade needs: one-shot
//! timers, repeating timers, and cancellation. [`VirtualScheduler`] runs
//! those timers against a manually advanced clock so time-dependent
//! behavior is deterministic in tests.
//!
//! ```text
//! set_timeout ──┐
//!               ├──→ timers (due_ms, seq) ──advance_to(t)──→ callbacks fire in order
//! set_interval ─┘                                 │
//!                                  clear_timer ───┘ (safe from inside a callback)
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::result::FadeResult;

/// Opaque identifier for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(i32);

impl TimerHandle {
    /// Wrap a raw host timer id
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw host timer id
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Host event-loop timers
pub trait Scheduler {
    /// Run `callback` once after `delay_ms`
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> FadeResult<TimerHandle>;

    /// Run `callback` every `interval_ms` until cleared
    fn set_interval(
        &self,
        interval_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> FadeResult<TimerHandle>;

    /// Cancel a timer. Unknown or already-cleared handles are ignored.
    fn clear_timer(&self, handle: TimerHandle);
}

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeating(Box<dyn FnMut()>),
}

struct VirtualTimer {
    due_ms: u64,
    seq: u64,
    period_ms: Option<u64>,
    // None while the callback is running
    callback: Option<Callback>,
}

#[derive(Default)]
struct VirtualState {
    now_ms: u64,
    next_id: i32,
    next_seq: u64,
    timers: BTreeMap<TimerHandle, VirtualTimer>,
    fired: u64,
}

impl VirtualState {
    fn register(&mut self, delay_ms: u64, period_ms: Option<u64>, callback: Callback) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(
            handle,
            VirtualTimer {
                due_ms: self.now_ms + delay_ms,
                seq,
                period_ms,
                callback: Some(callback),
            },
        );
        handle
    }

    fn next_due(&self, limit_ms: Option<u64>) -> Option<(TimerHandle, u64)> {
        self.timers
            .iter()
            .filter(|(_, t)| t.callback.is_some())
            .filter(|(_, t)| limit_ms.map_or(true, |limit| t.due_ms <= limit))
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(handle, t)| (*handle, t.due_ms))
    }
}

/// Deterministic scheduler driven by an explicit clock.
///
/// Clones share the same clock and timer table. The clock starts at 0 and
/// only moves when advanced.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    state: Rc<RefCell<VirtualState>>,
}

impl std::fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VirtualScheduler")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.timers.len())
            .field("fired", &state.fired)
            .finish()
    }
}

impl VirtualScheduler {
    /// Create a scheduler with its clock at 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    /// Number of timers still scheduled
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Total callbacks fired so far
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.state.borrow().fired
    }

    /// Whether `handle` is still scheduled
    #[must_use]
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.state.borrow().timers.contains_key(&handle)
    }

    /// Due time of the earliest pending timer
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.state.borrow().next_due(None).map(|(_, due)| due)
    }

    /// Advance the clock by `ms`, firing every timer that comes due.
    ///
    /// Returns the number of callbacks fired.
    pub fn advance_by(&self, ms: u64) -> usize {
        let target = self.now_ms() + ms;
        self.advance_to(target)
    }

    /// Advance the clock to `target_ms`, firing every timer due at or before it.
    ///
    /// A target in the past leaves the clock where it is. Returns the
    /// number of callbacks fired.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut fired = 0;
        loop {
            let next = self.state.borrow().next_due(Some(target_ms));
            let Some((handle, _)) = next else { break };
            self.fire(handle);
            fired += 1;
        }
        let mut state = self.state.borrow_mut();
        state.now_ms = state.now_ms.max(target_ms);
        fired
    }

    /// Fire timers in due order until none remain or `max_callbacks` have run.
    ///
    /// Returns the number of callbacks fired.
    pub fn run_until_idle(&self, max_callbacks: usize) -> usize {
        let mut fired = 0;
        while fired < max_callbacks {
            let next = self.state.borrow().next_due(None);
            let Some((handle, _)) = next else { break };
            self.fire(handle);
            fired += 1;
        }
        fired
    }

    fn fire(&self, handle: TimerHandle) {
        let callback = {
            let mut state = self.state.borrow_mut();
            let Some(timer) = state.timers.get_mut(&handle) else {
                return;
            };
            let (due, period) = (timer.due_ms, timer.period_ms);
            let callback = timer.callback.take();
            match period {
                Some(period) => {
                    let seq = state.next_seq;
                    state.next_seq += 1;
                    if let Some(timer) = state.timers.get_mut(&handle) {
                        timer.due_ms += period;
                        timer.seq = seq;
                    }
                }
                None => {
                    state.timers.remove(&handle);
                }
            }
            state.now_ms = state.now_ms.max(due);
            state.fired += 1;
            callback
        };

        // No borrow is held here; the callback may schedule or clear timers.
        match callback {
            Some(Callback::Once(f)) => f(),
            Some(Callback::Repeating(mut f)) => {
                f();
                let mut state = self.state.borrow_mut();
                if let Some(timer) = state.timers.get_mut(&handle) {
                    timer.callback = Some(Callback::Repeating(f));
                }
            }
            None => {}
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> FadeResult<TimerHandle> {
        let handle =
            self.state
                .borrow_mut()
                .register(u64::from(delay_ms), None, Callback::Once(callback));
        tracing::trace!(%handle, delay_ms, "timeout scheduled");
        Ok(handle)
    }

    fn set_interval(
        &self,
        interval_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> FadeResult<TimerHandle> {
        // A zero period would never let the clock move
        let period = u64::from(interval_ms.max(1));
        let handle = self.state.borrow_mut().register(
            period,
            Some(period),
            Callback::Repeating(callback),
        );
        tracing::trace!(%handle, interval_ms, "interval scheduled");
        Ok(handle)
    }

    fn clear_timer(&self, handle: TimerHandle) {
        if self.state.borrow_mut().timers.remove(&handle).is_some() {
            tracing::trace!(%handle, "timer cleared");
        }
    }
}
