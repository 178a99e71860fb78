//! Browser bindings for the fade.
//!
//! Maps [`StyleTarget`], [`ElementLookup`] and [`Scheduler`] onto `web-sys`
//! and exports `fade_out` to JavaScript.

// Note: This module is already conditionally compiled via #[cfg(feature = "wasm")] in lib.rs

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, Document, HtmlElement, Window};

use crate::config::FadeConfig;
use crate::controller::fade_element_by_id;
use crate::dom::{ElementLookup, StyleTarget};
use crate::result::{FadeError, FadeResult};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::style::{opacity_css, Display};

fn host_error(context: &str, err: &JsValue) -> FadeError {
    FadeError::host(format!("{context}: {err:?}"))
}

fn timeout_arg(ms: u32) -> FadeResult<i32> {
    i32::try_from(ms).map_err(|_| FadeError::invalid_config(format!("{ms}ms exceeds i32::MAX")))
}

/// A page element addressed through its inline style
#[derive(Debug, Clone)]
pub struct BrowserElement {
    element: HtmlElement,
}

impl BrowserElement {
    /// Wrap an element handle
    #[must_use]
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }
}

impl StyleTarget for BrowserElement {
    fn set_opacity(&self, opacity: f64) -> FadeResult<()> {
        self.element
            .style()
            .set_property("opacity", &opacity_css(opacity))
            .map_err(|e| host_error("set opacity", &e))
    }

    fn set_display(&self, display: Display) -> FadeResult<()> {
        self.element
            .style()
            .set_property("display", display.as_css())
            .map_err(|e| host_error("set display", &e))
    }
}

/// `document.getElementById` lookup
#[derive(Debug, Clone)]
pub struct BrowserDocument {
    document: Document,
}

impl BrowserDocument {
    /// Document of the global window
    pub fn current() -> FadeResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| FadeError::host("no global document"))?;
        Ok(Self { document })
    }
}

impl ElementLookup for BrowserDocument {
    type Element = BrowserElement;

    fn element_by_id(&self, id: &str) -> Option<BrowserElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(BrowserElement::new)
    }
}

/// Cleared interval closures waiting to be dropped.
///
/// A cleared closure may still be on the call stack (the fade clears its
/// interval from inside the tick), so it is parked here and dropped by a
/// later zero-delay task. The parked closure holds the fade controller,
/// which holds the scheduler, which holds this list; draining breaks that
/// cycle.
struct Parked<T> {
    items: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for Parked<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T: 'static> Parked<T> {
    fn new() -> Self {
        Self {
            items: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn park(&self, item: T) {
        self.items.borrow_mut().push(item);
    }

    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Task that drops everything parked at the time it runs
    fn drain_task(&self) -> impl FnOnce() + 'static {
        let items = Rc::clone(&self.items);
        move || {
            let parked = std::mem::take(&mut *items.borrow_mut());
            drop(parked);
        }
    }
}

/// `window.setTimeout` / `setInterval` scheduler.
///
/// Interval closures are owned here until cleared.
#[derive(Clone)]
pub struct BrowserScheduler {
    window: Window,
    intervals: Rc<RefCell<HashMap<i32, Closure<dyn FnMut()>>>>,
    retired: Parked<Closure<dyn FnMut()>>,
}

impl std::fmt::Debug for BrowserScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserScheduler")
            .field("intervals", &self.intervals.borrow().len())
            .field("retired", &self.retired.len())
            .finish()
    }
}

impl BrowserScheduler {
    /// Scheduler on the global window
    pub fn current() -> FadeResult<Self> {
        let window = web_sys::window().ok_or_else(|| FadeError::host("no global window"))?;
        Ok(Self {
            window,
            intervals: Rc::new(RefCell::new(HashMap::new())),
            retired: Parked::new(),
        })
    }
}

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> FadeResult<TimerHandle> {
        let closure = Closure::once_into_js(move || callback());
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.unchecked_ref(),
                timeout_arg(delay_ms)?,
            )
            .map_err(|e| host_error("setTimeout", &e))?;
        Ok(TimerHandle::from_raw(id))
    }

    fn set_interval(
        &self,
        interval_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> FadeResult<TimerHandle> {
        let closure = Closure::wrap(callback);
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                timeout_arg(interval_ms)?,
            )
            .map_err(|e| host_error("setInterval", &e))?;
        self.intervals.borrow_mut().insert(id, closure);
        Ok(TimerHandle::from_raw(id))
    }

    fn clear_timer(&self, handle: TimerHandle) {
        // Timeouts and intervals share one id pool
        self.window.clear_interval_with_handle(handle.raw());
        let removed = self.intervals.borrow_mut().remove(&handle.raw());
        let Some(closure) = removed else { return };

        self.retired.park(closure);
        let drain = Closure::once_into_js(self.retired.drain_task());
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(drain.unchecked_ref(), 0)
        {
            tracing::warn!(%handle, error = ?e, "failed to schedule closure cleanup");
        }
    }
}

fn fade_out_with(element_id: &str, config: FadeConfig) -> FadeResult<()> {
    let document = BrowserDocument::current()?;
    let scheduler = BrowserScheduler::current()?;
    fade_element_by_id(&document, element_id, config, &scheduler)?;
    Ok(())
}

fn to_js(err: FadeError) -> JsValue {
    let message = err.to_string();
    console::error_1(&JsValue::from_str(&message));
    js_sys::Error::new(&message).into()
}

/// Fade out the element with `element_id`: wait 3 s, then drop opacity by
/// 0.1 every 100 ms and hide it.
#[wasm_bindgen]
pub fn fade_out(element_id: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    fade_out_with(element_id, FadeConfig::default()).map_err(to_js)
}

/// Like [`fade_out`], with timing read from a JSON object such as
/// `{"initial_delay_ms": 1000, "tick_interval_ms": 50, "opacity_step": 0.05}`.
#[wasm_bindgen]
pub fn fade_out_with_config(element_id: &str, config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let config = FadeConfig::from_json(config_json).map_err(to_js)?;
    fade_out_with(element_id, config).map_err(to_js)
}
