//! Ephemeral views of live accessibility-tree nodes.
//!
//! A [`UIElement`] is only valid for the lookup that produced it. The OS can
//! destroy or re-parent the underlying node at any time, so callers re-locate
//! elements right before acting on them instead of holding on to them.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Control kinds exposed by the accessibility backends.
///
/// Names follow the UI Automation control type names (`Button`, `CheckBox`, ...).
/// Anything we do not model explicitly is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    CheckBox,
    ToggleButton,
    RadioButton,
    Hyperlink,
    MenuItem,
    TabItem,
    ListItem,
    ComboBox,
    Edit,
    Text,
    Slider,
    Window,
    Pane,
    Group,
    Other(String),
}

impl ControlKind {
    /// Parse a role name as reported by the platform. Matching is case-insensitive.
    pub fn from_role(role: &str) -> Self {
        match role.trim().to_lowercase().as_str() {
            "button" => ControlKind::Button,
            "checkbox" => ControlKind::CheckBox,
            "togglebutton" | "toggle" => ControlKind::ToggleButton,
            "radiobutton" => ControlKind::RadioButton,
            "hyperlink" | "link" => ControlKind::Hyperlink,
            "menuitem" => ControlKind::MenuItem,
            "tabitem" => ControlKind::TabItem,
            "listitem" => ControlKind::ListItem,
            "combobox" => ControlKind::ComboBox,
            "edit" => ControlKind::Edit,
            "text" => ControlKind::Text,
            "slider" => ControlKind::Slider,
            "window" => ControlKind::Window,
            "pane" => ControlKind::Pane,
            "group" => ControlKind::Group,
            _ => ControlKind::Other(role.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ControlKind::Button => "Button",
            ControlKind::CheckBox => "CheckBox",
            ControlKind::ToggleButton => "ToggleButton",
            ControlKind::RadioButton => "RadioButton",
            ControlKind::Hyperlink => "Hyperlink",
            ControlKind::MenuItem => "MenuItem",
            ControlKind::TabItem => "TabItem",
            ControlKind::ListItem => "ListItem",
            ControlKind::ComboBox => "ComboBox",
            ControlKind::Edit => "Edit",
            ControlKind::Text => "Text",
            ControlKind::Slider => "Slider",
            ControlKind::Window => "Window",
            ControlKind::Pane => "Pane",
            ControlKind::Group => "Group",
            ControlKind::Other(role) => role,
        }
    }

    /// Kinds a user would activate by clicking.
    pub fn is_clickable(&self) -> bool {
        matches!(
            self,
            ControlKind::Button
                | ControlKind::Hyperlink
                | ControlKind::MenuItem
                | ControlKind::ToggleButton
                | ControlKind::CheckBox
        )
    }

    /// Kinds carrying an on/off state.
    pub fn is_toggle(&self) -> bool {
        matches!(self, ControlKind::ToggleButton | ControlKind::CheckBox)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ControlKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ControlKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let role = String::deserialize(deserializer)?;
        Ok(ControlKind::from_role(&role))
    }
}

/// Current position of a range control (slider) and its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    pub current: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeValue {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Platform-specific element behaviour. Implemented by each accessibility backend.
pub trait UIElementImpl: Send + Sync + fmt::Debug {
    /// Accessible name; `None` when absent or blank.
    fn name(&self) -> Option<String>;
    fn role(&self) -> ControlKind;
    fn children(&self) -> Result<Vec<UIElement>, AutomationError>;
    fn is_visible(&self) -> Result<bool, AutomationError>;
    fn is_enabled(&self) -> Result<bool, AutomationError>;
    fn focus(&self) -> Result<(), AutomationError>;
    /// Synthetic click on the element.
    fn click(&self) -> Result<(), AutomationError>;
    /// `Some(true)` for on, `Some(false)` for off, `None` for indeterminate.
    /// Errors when the element exposes no toggle state at all.
    fn toggle_state(&self) -> Result<Option<bool>, AutomationError>;
    /// `None` when the element is not a range control.
    fn range_value(&self) -> Result<Option<RangeValue>, AutomationError>;
    fn set_range_value(&self, value: f64) -> Result<(), AutomationError>;
    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
}

/// Handle to a single live accessibility node.
#[derive(Clone)]
pub struct UIElement {
    inner: Arc<dyn UIElementImpl>,
}

impl UIElement {
    pub fn new(inner: Arc<dyn UIElementImpl>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    /// Name or the empty string, for matching and logging.
    pub fn name_or_empty(&self) -> String {
        self.inner.name().unwrap_or_default()
    }

    pub fn role(&self) -> ControlKind {
        self.inner.role()
    }

    pub fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.children()
    }

    pub fn is_visible(&self) -> Result<bool, AutomationError> {
        self.inner.is_visible()
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.inner.is_enabled()
    }

    pub fn focus(&self) -> Result<(), AutomationError> {
        self.inner.focus()
    }

    pub fn click(&self) -> Result<(), AutomationError> {
        self.inner.click()
    }

    pub fn toggle_state(&self) -> Result<Option<bool>, AutomationError> {
        self.inner.toggle_state()
    }

    pub fn range_value(&self) -> Result<Option<RangeValue>, AutomationError> {
        self.inner.range_value()
    }

    pub fn set_range_value(&self, value: f64) -> Result<(), AutomationError> {
        self.inner.set_range_value(value)
    }

    pub fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.set_text(text)
    }
}

impl fmt::Debug for UIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UIElement")
            .field("role", &self.role())
            .field("name", &self.name())
            .finish()
    }
}
