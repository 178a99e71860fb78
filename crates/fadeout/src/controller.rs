//! Fade controller: the Opaque → Fading → Hidden state machine.
//!
//! # Architecture
//!
//! ```text
//! start_fade ──set_opacity(1)──→ Opaque
//!                                  │  set_timeout(initial_delay_ms)
//!                                  ▼
//!                                Fading ◄──┐ set_interval(tick_interval_ms)
//!                                  │       │ opacity = 1 - ticks * step
//!                                  │───────┘
//!                                  │  ticks == ceil(1 / step)
//!                                  ▼
//!                                Hidden  (interval cleared, display: none)
//! ```
//!
//! The interval handle lives in the shared state, so the tick callback that
//! detects the terminal tick can cancel its own timer.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::{FadeConfig, OPACITY_EPSILON};
use crate::dom::{ElementLookup, StyleTarget};
use crate::result::{FadeError, FadeResult};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::style::{Display, OPAQUE, TRANSPARENT};

/// Lifecycle stage of a fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FadePhase {
    /// Fully opaque, waiting for the initial delay
    #[default]
    Opaque,
    /// Opacity decreasing on every tick
    Fading,
    /// Fully transparent and removed from layout
    Hidden,
}

impl std::fmt::Display for FadePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opaque => f.pad("opaque"),
            Self::Fading => f.pad("fading"),
            Self::Hidden => f.pad("hidden"),
        }
    }
}

#[derive(Debug)]
struct FadeState<E> {
    element: E,
    config: FadeConfig,
    phase: FadePhase,
    ticks: u32,
    opacity: f64,
    delay: Option<TimerHandle>,
    interval: Option<TimerHandle>,
}

/// Handle to a running (or finished) fade.
///
/// Clones observe the same fade. Dropping every handle does not stop the
/// fade; the scheduled callbacks keep it alive until the element is hidden.
#[derive(Debug)]
pub struct FadeController<E, S> {
    state: Rc<RefCell<FadeState<E>>>,
    scheduler: S,
}

impl<E, S: Clone> Clone for FadeController<E, S> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            scheduler: self.scheduler.clone(),
        }
    }
}

/// Resolve `id` through `lookup` and start fading it.
///
/// # Errors
///
/// Returns [`FadeError::TargetNotFound`] if `id` does not resolve, and
/// whatever [`start_fade`] returns otherwise. On either error no style is
/// written and no timer is scheduled.
pub fn fade_element_by_id<L, S>(
    lookup: &L,
    id: &str,
    config: FadeConfig,
    scheduler: &S,
) -> FadeResult<FadeController<L::Element, S>>
where
    L: ElementLookup,
    L::Element: 'static,
    S: Scheduler + Clone + 'static,
{
    let Some(element) = lookup.element_by_id(id) else {
        tracing::warn!(id, "fade target not found");
        return Err(FadeError::target_not_found(id));
    };
    start_fade(element, config, scheduler)
}

/// Start fading an already-resolved element.
///
/// Validates `config`, sets opacity to 1 immediately and schedules the
/// initial delay.
///
/// # Errors
///
/// Returns error if the config is invalid, the first style write fails, or
/// the scheduler refuses the delay timer.
pub fn start_fade<E, S>(
    element: E,
    config: FadeConfig,
    scheduler: &S,
) -> FadeResult<FadeController<E, S>>
where
    E: StyleTarget + 'static,
    S: Scheduler + Clone + 'static,
{
    config.validate()?;
    element.set_opacity(OPAQUE)?;

    let controller = FadeController {
        state: Rc::new(RefCell::new(FadeState {
            element,
            config,
            phase: FadePhase::Opaque,
            ticks: 0,
            opacity: OPAQUE,
            delay: None,
            interval: None,
        })),
        scheduler: scheduler.clone(),
    };

    let on_delay = controller.clone();
    let delay = scheduler.set_timeout(
        config.initial_delay_ms,
        Box::new(move || on_delay.begin_fading()),
    )?;
    controller.state.borrow_mut().delay = Some(delay);

    tracing::info!(
        delay_ms = config.initial_delay_ms,
        interval_ms = config.tick_interval_ms,
        step = config.opacity_step,
        ticks = config.total_ticks(),
        "fade scheduled"
    );
    Ok(controller)
}

impl<E, S> FadeController<E, S>
where
    E: StyleTarget + 'static,
    S: Scheduler + Clone + 'static,
{
    fn begin_fading(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.phase != FadePhase::Opaque {
                tracing::warn!(phase = %state.phase, "delay elapsed outside opaque phase; ignored");
                return;
            }
            state.delay = None;
            // Re-assert full opacity at the start of the fade
            if let Err(e) = state.element.set_opacity(OPAQUE) {
                tracing::error!(error = %e, "failed to reset opacity");
            }
            state.opacity = OPAQUE;
            state.phase = FadePhase::Fading;
        }

        let interval_ms = self.state.borrow().config.tick_interval_ms;
        let on_tick = self.clone();
        match self
            .scheduler
            .set_interval(interval_ms, Box::new(move || on_tick.tick()))
        {
            Ok(handle) => {
                self.state.borrow_mut().interval = Some(handle);
                tracing::info!(%handle, interval_ms, "fading started");
            }
            Err(e) => {
                // Without ticks the fade can never finish; hide right away
                tracing::error!(error = %e, "failed to schedule fade ticks");
                self.finish();
            }
        }
    }

    fn tick(&self) {
        let finished = {
            let mut state = self.state.borrow_mut();
            if state.phase != FadePhase::Fading {
                tracing::warn!(phase = %state.phase, "tick outside fading phase; ignored");
                return;
            }
            state.ticks += 1;
            let opacity = state.config.opacity_after(state.ticks);
            if let Err(e) = state.element.set_opacity(opacity) {
                tracing::error!(error = %e, "failed to write opacity");
            }
            state.opacity = opacity;
            tracing::debug!(tick = state.ticks, opacity, "fade tick");
            state.ticks >= state.config.total_ticks() || opacity <= OPACITY_EPSILON
        };

        if finished {
            self.finish();
        }
    }

    fn finish(&self) {
        let (interval, ticks) = {
            let mut state = self.state.borrow_mut();
            if state.phase == FadePhase::Hidden {
                return;
            }
            state.phase = FadePhase::Hidden;
            // Hidden always means fully transparent, even when ticks never ran
            if state.opacity > OPACITY_EPSILON {
                if let Err(e) = state.element.set_opacity(TRANSPARENT) {
                    tracing::error!(error = %e, "failed to clear opacity");
                }
            }
            state.opacity = TRANSPARENT;
            if let Err(e) = state.element.set_display(Display::Hidden) {
                tracing::error!(error = %e, "failed to hide element");
            }
            (state.interval.take(), state.ticks)
        };

        if let Some(handle) = interval {
            self.scheduler.clear_timer(handle);
        }
        tracing::info!(ticks, "fade complete; element hidden");
    }
}

impl<E, S> FadeController<E, S> {
    /// Current lifecycle stage
    #[must_use]
    pub fn phase(&self) -> FadePhase {
        self.state.borrow().phase
    }

    /// Ticks run so far
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.state.borrow().ticks
    }

    /// Last opacity written by the controller
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    /// Whether the element has been hidden
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase() == FadePhase::Hidden
    }

    /// Timing this fade runs with
    #[must_use]
    pub fn config(&self) -> FadeConfig {
        self.state.borrow().config
    }

    /// Pending initial-delay timer, if the delay has not elapsed yet
    #[must_use]
    pub fn delay_timer(&self) -> Option<TimerHandle> {
        self.state.borrow().delay
    }

    /// Running tick timer, if fading is in progress
    #[must_use]
    pub fn interval_timer(&self) -> Option<TimerHandle> {
        self.state.borrow().interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MockDom, MockElement, StyleMutation};
    use crate::scheduler::VirtualScheduler;

    fn setup() -> (MockElement, VirtualScheduler, FadeController<MockElement, VirtualScheduler>) {
        let el = MockElement::new("myDiv");
        let sched = VirtualScheduler::new();
        let fade = start_fade(el.clone(), FadeConfig::default(), &sched).unwrap();
        (el, sched, fade)
    }

    #[test]
    fn test_start_sets_opaque() {
        let (el, sched, fade) = setup();
        assert_eq!(el.opacity(), 1.0);
        assert!(el.has_inline_opacity());
        assert_eq!(fade.phase(), FadePhase::Opaque);
        assert_eq!(sched.pending_timers(), 1);
        assert!(fade.delay_timer().is_some());
        assert!(fade.interval_timer().is_none());
    }

    #[test]
    fn test_nothing_happens_before_delay() {
        let (el, sched, fade) = setup();
        sched.advance_to(2999);
        assert_eq!(el.mutation_count(), 1);
        assert_eq!(fade.phase(), FadePhase::Opaque);
    }

    #[test]
    fn test_delay_starts_fading() {
        let (el, sched, fade) = setup();
        sched.advance_to(3000);
        assert_eq!(fade.phase(), FadePhase::Fading);
        assert_eq!(el.opacity(), 1.0);
        assert_eq!(el.opacity_history(), vec![1.0, 1.0]);
        assert!(fade.delay_timer().is_none());
        assert!(fade.interval_timer().is_some());
    }

    #[test]
    fn test_each_tick_removes_one_step() {
        let (el, sched, fade) = setup();
        sched.advance_to(3100);
        assert!((el.opacity() - 0.9).abs() < 1e-9);
        sched.advance_to(3500);
        assert!((el.opacity() - 0.5).abs() < 1e-9);
        assert_eq!(fade.ticks(), 5);
        assert!(!el.is_hidden());
    }

    #[test]
    fn test_terminal_tick_hides_and_cancels() {
        let (el, sched, fade) = setup();
        sched.advance_to(4000);
        assert_eq!(fade.phase(), FadePhase::Hidden);
        assert!(fade.is_finished());
        assert_eq!(el.opacity(), 0.0);
        assert!(el.is_hidden());
        assert_eq!(fade.ticks(), 10);
        assert!(fade.interval_timer().is_none());
        assert_eq!(sched.pending_timers(), 0);
    }

    #[test]
    fn test_no_mutation_after_hidden() {
        let (el, sched, _fade) = setup();
        sched.advance_to(4000);
        let count = el.mutation_count();
        sched.advance_to(10_000);
        assert_eq!(el.mutation_count(), count);
        assert_eq!(
            el.mutations().last(),
            Some(&StyleMutation::Display(Display::Hidden))
        );
    }

    #[test]
    fn test_hidden_exactly_once() {
        let (el, sched, _fade) = setup();
        sched.run_until_idle(1000);
        let hides = el
            .mutations()
            .iter()
            .filter(|m| matches!(m, StyleMutation::Display(_)))
            .count();
        assert_eq!(hides, 1);
    }

    #[test]
    fn test_missing_target() {
        let dom = MockDom::new().with_element("other");
        let sched = VirtualScheduler::new();
        let err = fade_element_by_id(&dom, "myDiv", FadeConfig::default(), &sched).unwrap_err();
        assert!(matches!(err, FadeError::TargetNotFound { ref id } if id == "myDiv"));
        assert_eq!(sched.pending_timers(), 0);
        assert_eq!(dom.get("other").unwrap().mutation_count(), 0);
    }

    #[test]
    fn test_invalid_config_schedules_nothing() {
        let el = MockElement::new("myDiv");
        let sched = VirtualScheduler::new();
        let config = FadeConfig::new().with_opacity_step(0.0);
        let err = start_fade(el.clone(), config, &sched).unwrap_err();
        assert!(matches!(err, FadeError::InvalidConfig { .. }));
        assert_eq!(el.mutation_count(), 0);
        assert_eq!(sched.pending_timers(), 0);
    }

    /// Accepts the delay timer but refuses to register intervals
    #[derive(Debug, Clone, Default)]
    struct NoIntervalScheduler {
        inner: VirtualScheduler,
    }

    impl Scheduler for NoIntervalScheduler {
        fn set_timeout(
            &self,
            delay_ms: u32,
            callback: Box<dyn FnOnce()>,
        ) -> FadeResult<TimerHandle> {
            self.inner.set_timeout(delay_ms, callback)
        }

        fn set_interval(&self, _: u32, _: Box<dyn FnMut()>) -> FadeResult<TimerHandle> {
            Err(FadeError::host("interval refused"))
        }

        fn clear_timer(&self, handle: TimerHandle) {
            self.inner.clear_timer(handle);
        }
    }

    #[test]
    fn test_refused_interval_hides_transparent() {
        let el = MockElement::new("myDiv");
        let sched = NoIntervalScheduler::default();
        let fade = start_fade(el.clone(), FadeConfig::default(), &sched).unwrap();

        sched.inner.advance_to(3000);

        assert_eq!(fade.phase(), FadePhase::Hidden);
        assert!(el.is_hidden());
        assert_eq!(el.opacity(), 0.0);
        assert_eq!(fade.opacity(), el.opacity());
        assert_eq!(
            el.mutations().last(),
            Some(&StyleMutation::Display(Display::Hidden))
        );
        assert_eq!(sched.inner.pending_timers(), 0);
    }

    #[test]
    fn test_invalid_config_by_id_schedules_nothing() {
        let dom = MockDom::new().with_element("myDiv");
        let sched = VirtualScheduler::new();
        let config = FadeConfig::new().with_tick_interval_ms(0);
        let err = fade_element_by_id(&dom, "myDiv", config, &sched).unwrap_err();
        assert!(matches!(err, FadeError::InvalidConfig { .. }));
        assert_eq!(dom.get("myDiv").unwrap().mutation_count(), 0);
        assert_eq!(sched.pending_timers(), 0);
    }

    #[test]
    fn test_lookup_resolves_element() {
        let dom = MockDom::new().with_element("myDiv");
        let sched = VirtualScheduler::new();
        let fade = fade_element_by_id(&dom, "myDiv", FadeConfig::default(), &sched).unwrap();
        sched.advance_to(4000);
        assert!(fade.is_finished());
        assert!(dom.get("myDiv").unwrap().is_hidden());
    }

    #[test]
    fn test_uneven_step_reaches_zero() {
        let el = MockElement::new("box");
        let sched = VirtualScheduler::new();
        let config = FadeConfig::new().with_opacity_step(0.3);
        let fade = start_fade(el.clone(), config, &sched).unwrap();
        sched.advance_to(3300);
        assert!((el.opacity() - 0.1).abs() < 1e-9);
        assert!(!el.is_hidden());
        sched.advance_to(3400);
        assert_eq!(el.opacity(), 0.0);
        assert!(el.is_hidden());
        assert_eq!(fade.ticks(), 4);
    }

    #[test]
    fn test_zero_delay() {
        let el = MockElement::new("box");
        let sched = VirtualScheduler::new();
        let config = FadeConfig::new().with_initial_delay_ms(0);
        let fade = start_fade(el, config, &sched).unwrap();
        sched.advance_to(0);
        assert_eq!(fade.phase(), FadePhase::Fading);
        sched.advance_to(1000);
        assert!(fade.is_finished());
    }

    #[test]
    fn test_dropped_handle_still_finishes() {
        let el = MockElement::new("box");
        let sched = VirtualScheduler::new();
        drop(start_fade(el.clone(), FadeConfig::default(), &sched).unwrap());
        sched.advance_to(4000);
        assert!(el.is_hidden());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(FadePhase::Opaque.to_string(), "opaque");
        assert_eq!(FadePhase::Fading.to_string(), "fading");
        assert_eq!(FadePhase::Hidden.to_string(), "hidden");
    }
}
