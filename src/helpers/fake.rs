//! Scriptable in-memory [`Browser`] for exercising the scanner and the
//! punch form without a real portal.
//!
//! Elements are registered under the exact CSS string the automator will
//! look them up with. Clicking an element can reveal or hide others, which is
//! enough to model the add-punch modal opening, its dropdowns populating and
//! the modal closing on save. As with a real Find Elements call, lookups
//! return hidden elements as well; only `displayed` tells them apart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::errors::BrowserError;
use crate::helpers::browser::{Browser, ElementRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Goto(String),
    Click { css: String, text: String },
    SendKeys { css: String, text: String },
}

#[derive(Debug, Default)]
struct FakeElement {
    css: String,
    text: String,
    parent: Option<ElementRef>,
    attributes: HashMap<String, String>,
    visible: bool,
    reveals: Vec<ElementRef>,
    hides: Vec<ElementRef>,
    fail_send_keys: bool,
}

#[derive(Debug, Default)]
struct FakeDom {
    next_id: usize,
    order: Vec<ElementRef>,
    elements: HashMap<ElementRef, FakeElement>,
    actions: Vec<Action>,
}

impl FakeDom {
    fn insert(&mut self, parent: Option<&ElementRef>, css: &str, text: &str, visible: bool) -> ElementRef {
        self.next_id += 1;
        let id = ElementRef(format!("fake-{}", self.next_id));
        self.order.push(id.clone());
        self.elements.insert(
            id.clone(),
            FakeElement {
                css: css.to_string(),
                text: text.to_string(),
                parent: parent.cloned(),
                visible,
                ..Default::default()
            },
        );
        id
    }

    fn get(&self, element: &ElementRef) -> Result<&FakeElement, BrowserError> {
        self.elements
            .get(element)
            .ok_or_else(|| BrowserError::UnknownElement(element.0.clone()))
    }

    fn get_mut(&mut self, element: &ElementRef) -> Result<&mut FakeElement, BrowserError> {
        self.elements
            .get_mut(element)
            .ok_or_else(|| BrowserError::UnknownElement(element.0.clone()))
    }

    fn set_visible(&mut self, targets: &[ElementRef], visible: bool) {
        for target in targets {
            if let Some(el) = self.elements.get_mut(target) {
                el.visible = visible;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    dom: Mutex<FakeDom>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn dom(&self) -> MutexGuard<'_, FakeDom> {
        self.dom.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, css: &str) -> ElementRef {
        self.dom().insert(None, css, "", true)
    }

    pub fn add_text(&self, css: &str, text: &str) -> ElementRef {
        self.dom().insert(None, css, text, true)
    }

    pub fn add_in(&self, parent: &ElementRef, css: &str, text: &str) -> ElementRef {
        self.dom().insert(Some(parent), css, text, true)
    }

    /// Registered but invisible until something reveals it.
    pub fn add_hidden(&self, css: &str, text: &str) -> ElementRef {
        self.dom().insert(None, css, text, false)
    }

    pub fn set_attribute(&self, element: &ElementRef, name: &str, value: &str) {
        if let Some(el) = self.dom().elements.get_mut(element) {
            el.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn reveal_on_click(&self, trigger: &ElementRef, target: &ElementRef) {
        if let Some(el) = self.dom().elements.get_mut(trigger) {
            el.reveals.push(target.clone());
        }
    }

    pub fn hide_on_click(&self, trigger: &ElementRef, target: &ElementRef) {
        if let Some(el) = self.dom().elements.get_mut(trigger) {
            el.hides.push(target.clone());
        }
    }

    pub fn fail_send_keys(&self, element: &ElementRef) {
        if let Some(el) = self.dom().elements.get_mut(element) {
            el.fail_send_keys = true;
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.dom().actions.clone()
    }

    /// Just the clicks, as `(css, text)` pairs.
    pub fn clicks(&self) -> Vec<(String, String)> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Click { css, text } => Some((css, text)),
                _ => None,
            })
            .collect()
    }

    /// Just the typed values, as `(css, text)` pairs.
    pub fn typed(&self) -> Vec<(String, String)> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::SendKeys { css, text } => Some((css, text)),
                _ => None,
            })
            .collect()
    }
}

impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.dom().actions.push(Action::Goto(url.to_string()));
        Ok(())
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        css: &str,
    ) -> Result<Vec<ElementRef>, BrowserError> {
        let dom = self.dom();
        if let Some(scope) = scope {
            dom.get(scope)?;
        }
        Ok(dom
            .order
            .iter()
            .filter(|id| {
                dom.elements
                    .get(*id)
                    .is_some_and(|el| el.css == css && el.parent.as_ref() == scope)
            })
            .cloned()
            .collect())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, BrowserError> {
        Ok(self.dom().get(element)?.text.clone())
    }

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(self.dom().get(element)?.attributes.get(name).cloned())
    }

    async fn displayed(&self, element: &ElementRef) -> Result<bool, BrowserError> {
        Ok(self.dom().get(element)?.visible)
    }

    async fn click(&self, element: &ElementRef) -> Result<(), BrowserError> {
        let mut dom = self.dom();
        let el = dom.get(element)?;
        let action = Action::Click {
            css: el.css.clone(),
            text: el.text.clone(),
        };
        let reveals = el.reveals.clone();
        let hides = el.hides.clone();
        dom.actions.push(action);
        dom.set_visible(&reveals, true);
        dom.set_visible(&hides, false);
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        let mut dom = self.dom();
        let el = dom.get_mut(element)?;
        if el.fail_send_keys {
            return Err(BrowserError::Scripted(element.0.clone()));
        }
        let action = Action::SendKeys {
            css: el.css.clone(),
            text: text.to_string(),
        };
        dom.actions.push(action);
        Ok(())
    }
}
