//! Element handles and lookup.
//!
//! The fade only needs two capabilities from its host: find an element by
//! id, and write two style properties on it. [`MockDom`] provides both in
//! memory and records every style write, so the effect can be tested
//! without a browser.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::result::FadeResult;
use crate::style::{clamp_opacity, Display, OPAQUE};

/// Something whose opacity and display can be written
pub trait StyleTarget {
    /// Write the `opacity` style
    fn set_opacity(&self, opacity: f64) -> FadeResult<()>;

    /// Write the `display` style
    fn set_display(&self, display: Display) -> FadeResult<()>;
}

/// Host capability for resolving an element by identifier
pub trait ElementLookup {
    /// Handle type for resolved elements
    type Element: StyleTarget;

    /// Resolve `id`, or `None` if no such element exists
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// A single style write observed on a [`MockElement`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleMutation {
    /// `opacity` was set to this value
    Opacity(f64),
    /// `display` was set to this value
    Display(Display),
}

#[derive(Debug)]
struct MockElementState {
    id: String,
    opacity: Option<f64>,
    display: Display,
    mutations: Vec<StyleMutation>,
}

/// In-memory element; clones share the same underlying node
#[derive(Debug, Clone)]
pub struct MockElement {
    state: Rc<RefCell<MockElementState>>,
}

impl MockElement {
    /// Creates a visible element with no inline opacity
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockElementState {
                id: id.to_string(),
                opacity: None,
                display: Display::Normal,
                mutations: Vec::new(),
            })),
        }
    }

    /// Element ID
    #[must_use]
    pub fn id(&self) -> String {
        self.state.borrow().id.clone()
    }

    /// Effective opacity; an unset style reads as opaque
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity.unwrap_or(OPAQUE)
    }

    /// Whether opacity has ever been written
    #[must_use]
    pub fn has_inline_opacity(&self) -> bool {
        self.state.borrow().opacity.is_some()
    }

    /// Current display state
    #[must_use]
    pub fn display(&self) -> Display {
        self.state.borrow().display
    }

    /// Whether the element is removed from layout
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.display().is_hidden()
    }

    /// Every style write, oldest first
    #[must_use]
    pub fn mutations(&self) -> Vec<StyleMutation> {
        self.state.borrow().mutations.clone()
    }

    /// Number of style writes so far
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.state.borrow().mutations.len()
    }

    /// Opacity values written, oldest first
    #[must_use]
    pub fn opacity_history(&self) -> Vec<f64> {
        self.state
            .borrow()
            .mutations
            .iter()
            .filter_map(|m| match m {
                StyleMutation::Opacity(v) => Some(*v),
                StyleMutation::Display(_) => None,
            })
            .collect()
    }

    /// Whether two handles refer to the same node
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl StyleTarget for MockElement {
    fn set_opacity(&self, opacity: f64) -> FadeResult<()> {
        let opacity = clamp_opacity(opacity);
        let mut state = self.state.borrow_mut();
        state.opacity = Some(opacity);
        state.mutations.push(StyleMutation::Opacity(opacity));
        Ok(())
    }

    fn set_display(&self, display: Display) -> FadeResult<()> {
        let mut state = self.state.borrow_mut();
        state.display = display;
        state.mutations.push(StyleMutation::Display(display));
        Ok(())
    }
}

/// Mock DOM holding elements by ID
#[derive(Debug, Clone, Default)]
pub struct MockDom {
    elements: HashMap<String, MockElement>,
}

impl MockDom {
    /// Creates an empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element and returns this DOM
    #[must_use]
    pub fn with_element(mut self, id: &str) -> Self {
        self.insert(id);
        self
    }

    /// Adds (or replaces) an element and returns a handle to it
    pub fn insert(&mut self, id: &str) -> MockElement {
        let element = MockElement::new(id);
        self.elements.insert(id.to_string(), element.clone());
        element
    }

    /// Removes an element
    pub fn remove(&mut self, id: &str) -> Option<MockElement> {
        self.elements.remove(id)
    }

    /// Gets an element handle
    #[must_use]
    pub fn get(&self, id: &str) -> Option<MockElement> {
        self.elements.get(id).cloned()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the DOM has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementLookup for MockDom {
    type Element = MockElement;

    fn element_by_id(&self, id: &str) -> Option<MockElement> {
        self.get(id)
    }
}
