//! Fade Timeline Demo
//!
//! Runs the default fade against a mock element on a virtual clock and
//! prints the element's style after every 100ms step.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=fadeout=debug cargo run --example fade_timeline -p fadeout
//! ```

use fadeout::prelude::*;
use fadeout::style::opacity_css;
use tracing_subscriber::EnvFilter;

fn main() -> FadeResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Fade Timeline Demo ===\n");

    let dom = MockDom::new().with_element("myDiv");
    let clock = VirtualScheduler::new();
    let config = FadeConfig::default();
    let fade = fade_element_by_id(&dom, "myDiv", config, &clock)?;
    let el = dom
        .get("myDiv")
        .ok_or_else(|| FadeError::target_not_found("myDiv"))?;

    println!(
        "delay {}ms, tick {}ms, step {} -> {} ticks, hidden at t={}ms\n",
        config.initial_delay_ms,
        config.tick_interval_ms,
        config.opacity_step,
        config.total_ticks(),
        config.total_duration_ms()
    );

    let end = config.total_duration_ms() + u64::from(config.tick_interval_ms);
    let mut t = u64::from(config.initial_delay_ms);
    clock.advance_to(t);
    while t <= end {
        println!(
            "t={t:>5}ms  phase={:<7} opacity={:<4} display={}",
            fade.phase(),
            opacity_css(el.opacity()),
            el.display()
        );
        t += u64::from(config.tick_interval_ms);
        clock.advance_to(t);
    }

    println!("\npending timers: {}", clock.pending_timers());
    println!("style writes:   {}", el.mutation_count());

    match fade_element_by_id(&dom, "missing", config, &clock) {
        Err(e) => println!("lookup of #missing: {e}"),
        Ok(_) => println!("lookup of #missing unexpectedly succeeded"),
    }
    Ok(())
}
