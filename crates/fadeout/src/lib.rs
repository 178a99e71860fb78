//! fadeout: delayed opacity fade-out for a single page element.
//!
//! After an initial delay the target's opacity drops by a fixed step on
//! every tick until it reaches zero; the element is then removed from
//! layout (`display: none`) and the tick timer is cancelled.
//!
//! The controller is generic over the element ([`StyleTarget`]) and the
//! event loop ([`Scheduler`]). Native builds use [`MockDom`] and
//! [`VirtualScheduler`]; the `wasm` feature adds `web-sys` bindings and a
//! `fade_out(id)` export.
//!
//! # Example
//!
//! ```rust
//! use fadeout::prelude::*;
//!
//! let dom = MockDom::new().with_element("myDiv");
//! let clock = VirtualScheduler::new();
//! let fade = fade_element_by_id(&dom, "myDiv", FadeConfig::default(), &clock).unwrap();
//!
//! clock.advance_to(3100);
//! assert!((fade.opacity() - 0.9).abs() < 1e-9);
//!
//! clock.advance_to(4000);
//! assert!(dom.get("myDiv").unwrap().is_hidden());
//! assert_eq!(clock.pending_timers(), 0);
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::float_cmp
    )
)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod controller;
pub mod dom;
pub mod result;
pub mod scheduler;
pub mod style;

#[cfg(feature = "wasm")]
pub mod browser;

pub use config::FadeConfig;
pub use controller::{fade_element_by_id, start_fade, FadeController, FadePhase};
pub use dom::{ElementLookup, MockDom, MockElement, StyleMutation, StyleTarget};
pub use result::{FadeError, FadeResult};
pub use scheduler::{Scheduler, TimerHandle, VirtualScheduler};
pub use style::Display;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::FadeConfig;
    pub use crate::controller::{fade_element_by_id, start_fade, FadeController, FadePhase};
    pub use crate::dom::{ElementLookup, MockDom, MockElement, StyleMutation, StyleTarget};
    pub use crate::result::{FadeError, FadeResult};
    pub use crate::scheduler::{Scheduler, TimerHandle, VirtualScheduler};
    pub use crate::style::Display;

    #[cfg(feature = "wasm")]
    pub use crate::browser::{BrowserDocument, BrowserElement, BrowserScheduler};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let dom = MockDom::new().with_element("banner");
        let clock = VirtualScheduler::new();
        let fade = fade_element_by_id(&dom, "banner", FadeConfig::default(), &clock).unwrap();
        assert_eq!(fade.phase(), FadePhase::Opaque);
    }

    #[test]
    fn test_two_fades_share_a_clock() {
        let mut dom = MockDom::new();
        let slow = dom.insert("slow");
        let fast = dom.insert("fast");
        let clock = VirtualScheduler::new();

        fade_element_by_id(&dom, "slow", FadeConfig::default(), &clock).unwrap();
        let quick = FadeConfig::new()
            .with_initial_delay_ms(100)
            .with_tick_interval_ms(10)
            .with_opacity_step(0.5);
        fade_element_by_id(&dom, "fast", quick, &clock).unwrap();

        clock.advance_to(200);
        assert!(fast.is_hidden());
        assert!(!slow.is_hidden());
        assert_eq!(slow.opacity(), 1.0);

        clock.advance_to(4000);
        assert!(slow.is_hidden());
        assert_eq!(clock.pending_timers(), 0);
    }
}
