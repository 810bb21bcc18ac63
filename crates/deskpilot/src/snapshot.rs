//! Flattened, serializable views of a window's controls.

use crate::discovery::descendants;
use crate::element::{ControlKind, RangeValue, UIElement};
use crate::Desktop;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    On,
    Off,
    Indeterminate,
}

impl From<Option<bool>> for ToggleState {
    fn from(state: Option<bool>) -> Self {
        match state {
            Some(true) => ToggleState::On,
            Some(false) => ToggleState::Off,
            None => ToggleState::Indeterminate,
        }
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToggleState::On => "On",
            ToggleState::Off => "Off",
            ToggleState::Indeterminate => "Indeterminate",
        };
        f.write_str(label)
    }
}

/// One control as presented to the decision oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    /// Accessible name, or an [`unnamed_label`] for unnamed toggles.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControlKind,
    pub clickable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ToggleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RangeValue>,
}

impl ControlSnapshot {
    /// Snapshot of a single node, or `None` for nodes not worth presenting
    /// (unnamed controls other than toggles and checkboxes).
    ///
    /// `unnamed_ordinal` is the 1-based position of this node among the
    /// unnamed controls of its kind; it only matters when the node has no name.
    pub fn capture(node: &UIElement, unnamed_ordinal: usize) -> Option<Self> {
        let kind = node.role();

        let state = if kind.is_toggle() {
            node.toggle_state().ok().map(ToggleState::from)
        } else {
            None
        };
        let value = if kind == ControlKind::Slider {
            node.range_value().ok().flatten()
        } else {
            None
        };

        let name = match node.name() {
            Some(name) => name,
            None if kind.is_toggle() => unnamed_label(&kind, unnamed_ordinal),
            None => return None,
        };

        Some(Self {
            clickable: kind.is_clickable(),
            name,
            kind,
            state,
            value,
        })
    }
}

/// Display name for an unnamed control: `[Unnamed CheckBox #2]`.
///
/// The label never carries the control's state, so it stays the same after
/// the control is toggled.
pub fn unnamed_label(kind: &ControlKind, ordinal: usize) -> String {
    format!("[Unnamed {kind} #{ordinal}]")
}

/// Kind and 1-based ordinal of an [`unnamed_label`]. A label without an
/// ordinal refers to the first unnamed control of that kind.
pub fn parse_unnamed_label(label: &str) -> Option<(ControlKind, usize)> {
    let inner = label.trim().strip_prefix("[Unnamed ")?.strip_suffix(']')?;
    // A trailing state such as " - On" is ignored.
    let inner = inner.split(" - ").next().unwrap_or(inner).trim();
    let (kind, ordinal) = match inner.rsplit_once(" #") {
        Some((kind, n)) => (kind, n.trim().parse::<usize>().ok().filter(|n| *n > 0)?),
        None => (inner, 1),
    };
    Some((ControlKind::from_role(kind), ordinal))
}

/// A window title plus every presentable control under it, in tree order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub window: String,
    pub controls: Vec<ControlSnapshot>,
}

impl UiSnapshot {
    pub fn capture(window: &UIElement) -> Self {
        let title = window.name_or_empty();
        let mut unnamed: HashMap<ControlKind, usize> = HashMap::new();
        let controls: Vec<ControlSnapshot> = descendants(window)
            .filter_map(|n| {
                let ordinal = if n.name().is_none() {
                    let count = unnamed.entry(n.role()).or_default();
                    *count += 1;
                    *count
                } else {
                    0
                };
                ControlSnapshot::capture(&n, ordinal)
            })
            .collect();
        info!("[snapshot] {} controls in '{}'", controls.len(), title);
        for control in controls.iter().take(20) {
            match control.state {
                Some(state) => debug!("[snapshot]   - {}: '{}' ({state})", control.kind, control.name),
                None => debug!("[snapshot]   - {}: '{}'", control.kind, control.name),
            }
        }
        Self {
            window: title,
            controls,
        }
    }

    /// Controls whose name is not in `exclude`.
    pub fn without<S: AsRef<str>>(&self, exclude: &[S]) -> Vec<ControlSnapshot> {
        self.controls
            .iter()
            .filter(|c| !exclude.iter().any(|e| e.as_ref() == c.name))
            .cloned()
            .collect()
    }
}

impl Desktop {
    /// Find (optionally after launching) a window and snapshot its controls.
    ///
    /// `ms-settings:` URIs also accept any window titled "Settings".
    pub async fn introspect<S: AsRef<str>>(
        &self,
        terms: &[S],
        open_command: Option<&str>,
    ) -> Option<UiSnapshot> {
        let mut terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        if let Some(command) = open_command {
            if command.contains("ms-settings") {
                terms.push("Settings".to_string());
            }
            if let Err(e) = self.launch(command).await {
                info!("[snapshot] Failed to open '{command}': {e}");
            }
        }
        let window = self.find_window(&terms, self.timings().window_timeout()).await?;
        Some(UiSnapshot::capture(&window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_labels_parse_back() {
        let label = unnamed_label(&ControlKind::CheckBox, 3);
        assert_eq!(label, "[Unnamed CheckBox #3]");
        assert_eq!(parse_unnamed_label(&label), Some((ControlKind::CheckBox, 3)));
        assert_eq!(
            parse_unnamed_label("[Unnamed ToggleButton - On]"),
            Some((ControlKind::ToggleButton, 1))
        );
        assert_eq!(parse_unnamed_label("[Unnamed ToggleButton #0]"), None);
        assert_eq!(parse_unnamed_label("Bluetooth"), None);
    }
}
