//! Property-based tests for fade termination and monotonicity

#![allow(clippy::unwrap_used)]

use fadeout::prelude::*;
use proptest::prelude::*;

// ===== Strategy definitions =====

/// Steps from tiny to a single full-opacity jump
fn step_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.1),
        Just(0.3),
        Just(1.0 / 3.0),
        Just(1.0),
        0.01f64..=1.0f64,
    ]
}

fn config_strategy() -> impl Strategy<Value = FadeConfig> {
    (0u32..5000, 1u32..500, step_strategy()).prop_map(|(delay, interval, step)| {
        FadeConfig::new()
            .with_initial_delay_ms(delay)
            .with_tick_interval_ms(interval)
            .with_opacity_step(step)
    })
}

fn run(config: FadeConfig) -> (MockElement, VirtualScheduler, FadeController<MockElement, VirtualScheduler>) {
    let el = MockElement::new("target");
    let clock = VirtualScheduler::new();
    let fade = start_fade(el.clone(), config, &clock).unwrap();
    (el, clock, fade)
}

proptest! {
    /// The fade always finishes after exactly ceil(1 / step) ticks
    #[test]
    fn prop_terminates_within_tick_bound(config in config_strategy()) {
        let (el, clock, fade) = run(config);
        let bound = (1.0 / config.opacity_step).ceil() as u32;

        clock.run_until_idle(bound as usize + 10);

        prop_assert!(fade.is_finished());
        prop_assert!(el.is_hidden());
        prop_assert_eq!(el.opacity(), 0.0);
        prop_assert!(fade.ticks() <= bound);
        prop_assert_eq!(fade.ticks(), config.total_ticks());
        prop_assert_eq!(clock.pending_timers(), 0);
        prop_assert_eq!(clock.now_ms(), config.total_duration_ms());
    }

    /// Opacity never increases once fading begins
    #[test]
    fn prop_opacity_non_increasing(config in config_strategy()) {
        let (el, clock, _fade) = run(config);
        clock.run_until_idle(usize::MAX);

        let history = el.opacity_history();
        for pair in history.windows(2) {
            prop_assert!(pair[1] <= pair[0], "{} then {}", pair[0], pair[1]);
        }
    }

    /// Display flips to hidden exactly once, as the final write
    #[test]
    fn prop_hidden_once_and_last(config in config_strategy()) {
        let (el, clock, _fade) = run(config);
        clock.run_until_idle(usize::MAX);

        let mutations = el.mutations();
        let hides = mutations
            .iter()
            .filter(|m| matches!(m, StyleMutation::Display(Display::Hidden)))
            .count();
        prop_assert_eq!(hides, 1);
        prop_assert_eq!(mutations.last(), Some(&StyleMutation::Display(Display::Hidden)));
    }

    /// Nothing moves before the initial delay
    #[test]
    fn prop_untouched_during_delay(config in config_strategy()) {
        prop_assume!(config.initial_delay_ms > 0);
        let (el, clock, fade) = run(config);
        clock.advance_to(u64::from(config.initial_delay_ms) - 1);

        prop_assert_eq!(el.mutation_count(), 1);
        prop_assert_eq!(fade.phase(), FadePhase::Opaque);
    }
}
