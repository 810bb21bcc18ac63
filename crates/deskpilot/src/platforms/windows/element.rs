use super::engine::ThreadSafeAutomation;
use crate::element::{ControlKind, RangeValue, UIElement, UIElementImpl};
use crate::AutomationError;
use std::fmt;
use std::sync::Arc;
use uiautomation::patterns::{UIRangeValuePattern, UITogglePattern, UIValuePattern};
use uiautomation::types::{ToggleState, TreeScope};

pub(crate) struct ThreadSafeElement(pub uiautomation::UIElement);

unsafe impl Send for ThreadSafeElement {}
unsafe impl Sync for ThreadSafeElement {}

pub struct WindowsUIElement {
    element: ThreadSafeElement,
    automation: Arc<ThreadSafeAutomation>,
}

impl WindowsUIElement {
    pub(crate) fn wrap(
        element: uiautomation::UIElement,
        automation: Arc<ThreadSafeAutomation>,
    ) -> UIElement {
        UIElement::new(Arc::new(Self {
            element: ThreadSafeElement(element),
            automation,
        }))
    }

    fn raw(&self) -> &uiautomation::UIElement {
        &self.element.0
    }
}

fn platform_err(what: &str, e: uiautomation::Error) -> AutomationError {
    AutomationError::PlatformError(format!("{what}: {e}"))
}

impl fmt::Debug for WindowsUIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsUIElement")
            .field("name", &self.name())
            .field("role", &self.role())
            .finish()
    }
}

impl UIElementImpl for WindowsUIElement {
    fn name(&self) -> Option<String> {
        self.raw()
            .get_name()
            .ok()
            .filter(|n| !n.trim().is_empty())
    }

    fn role(&self) -> ControlKind {
        self.raw()
            .get_control_type()
            .map(|ct| ControlKind::from_role(&format!("{:?}", ct)))
            .unwrap_or_else(|_| ControlKind::Other("Unknown".to_string()))
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        let condition = self
            .automation
            .0
            .create_true_condition()
            .map_err(|e| platform_err("Failed to create true condition", e))?;
        // A node that vanished mid-walk simply has no children.
        let children = self
            .raw()
            .find_all(TreeScope::Children, &condition)
            .unwrap_or_default();
        Ok(children
            .into_iter()
            .map(|c| WindowsUIElement::wrap(c, self.automation.clone()))
            .collect())
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        self.raw()
            .is_offscreen()
            .map(|off| !off)
            .map_err(|e| platform_err("Failed to read visibility", e))
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.raw()
            .is_enabled()
            .map_err(|e| platform_err("Failed to read enabled state", e))
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.raw()
            .set_focus()
            .map_err(|e| platform_err("Failed to focus", e))
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.raw()
            .click()
            .map_err(|e| platform_err("Failed to click", e))
    }

    fn toggle_state(&self) -> Result<Option<bool>, AutomationError> {
        let pattern = self
            .raw()
            .get_pattern::<UITogglePattern>()
            .map_err(|e| platform_err("Toggle pattern not supported", e))?;
        let state = pattern
            .get_toggle_state()
            .map_err(|e| platform_err("Failed to read toggle state", e))?;
        Ok(match state {
            ToggleState::On => Some(true),
            ToggleState::Off => Some(false),
            _ => None,
        })
    }

    fn range_value(&self) -> Result<Option<RangeValue>, AutomationError> {
        let pattern = match self.raw().get_pattern::<UIRangeValuePattern>() {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };
        let current = pattern
            .get_value()
            .map_err(|e| platform_err("Failed to read range value", e))?;
        let min = pattern
            .get_minimum()
            .map_err(|e| platform_err("Failed to read range minimum", e))?;
        let max = pattern
            .get_maximum()
            .map_err(|e| platform_err("Failed to read range maximum", e))?;
        Ok(Some(RangeValue { current, min, max }))
    }

    fn set_range_value(&self, value: f64) -> Result<(), AutomationError> {
        let pattern = self
            .raw()
            .get_pattern::<UIRangeValuePattern>()
            .map_err(|e| platform_err("RangeValue pattern not supported", e))?;
        pattern
            .set_value(value)
            .map_err(|e| platform_err("Failed to set range value", e))
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        let pattern = self
            .raw()
            .get_pattern::<UIValuePattern>()
            .map_err(|e| platform_err("Value pattern not supported", e))?;
        pattern
            .set_value(text)
            .map_err(|e| platform_err("Failed to set text", e))
    }
}
