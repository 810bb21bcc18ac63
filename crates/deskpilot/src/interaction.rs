//! Clicking, toggling and value assignment on located controls.

use crate::discovery::{descendants, first_of_kind};
use crate::element::{ControlKind, RangeValue, UIElement};
use crate::errors::AutomationError;
use crate::Desktop;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Symbolic or numeric target for a range control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderTarget {
    Min,
    Max,
    Mid,
    Exact(f64),
}

impl SliderTarget {
    /// Parse a case-insensitive symbol (`min`, `fastest`, `mute`, `50`, `37.5`, ...).
    pub fn parse(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim().to_lowercase();
        match symbol.as_str() {
            "slow" | "slowest" | "min" | "minimum" | "mute" | "zero" | "0" => Some(Self::Min),
            "fast" | "fastest" | "max" | "maximum" | "unmute" | "full" | "100" => Some(Self::Max),
            "medium" | "middle" | "mid" | "50" => Some(Self::Mid),
            other => other
                .trim_end_matches('%')
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Exact),
        }
    }

    /// Parse a JSON value: numbers are exact, strings go through [`SliderTarget::parse`].
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Exact),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Concrete value within `range`. Exact values are clamped.
    pub fn resolve(&self, range: &RangeValue) -> f64 {
        match self {
            Self::Min => range.min,
            Self::Max => range.max,
            Self::Mid => range.midpoint(),
            Self::Exact(v) => range.clamp(*v),
        }
    }
}

impl Desktop {
    /// Click a control that is visible and enabled.
    ///
    /// Focus is attempted first and its failure ignored. Returns `false`
    /// instead of an error for anything that prevents the click.
    #[instrument(skip(self, control), fields(control = %control.name_or_empty()))]
    pub async fn click(&self, control: &UIElement) -> bool {
        let visible = control.is_visible().unwrap_or(false);
        let enabled = control.is_enabled().unwrap_or(false);
        if !visible || !enabled {
            info!("[interaction] Control not clickable: visible={visible}, enabled={enabled}");
            return false;
        }

        if control.focus().is_ok() {
            sleep(self.timings().focus_settle()).await;
        }

        match control.click() {
            Ok(()) => {
                sleep(self.timings().click_settle()).await;
                info!("[interaction] Clicked: '{}'", control.name_or_empty());
                true
            }
            Err(e) => {
                warn!("[interaction] Click failed: {e}");
                false
            }
        }
    }

    /// Bring a toggle to `desired`, clicking only when its state differs.
    ///
    /// When the state cannot be read, a single unconditional click is made.
    #[instrument(skip(self, control), fields(control = %control.name_or_empty()))]
    pub async fn set_toggle(&self, control: &UIElement, desired: bool) -> bool {
        match control.toggle_state() {
            Ok(Some(current)) if current == desired => {
                debug!("[interaction] Toggle already {}", on_off(desired));
                true
            }
            Ok(Some(_)) => {
                if let Err(e) = control.click() {
                    warn!("[interaction] Toggle click failed: {e}");
                    return false;
                }
                sleep(self.timings().click_settle()).await;
                info!("[interaction] Set toggle to {}", on_off(desired));
                true
            }
            Ok(None) | Err(_) => {
                warn!("[interaction] Toggle state unreadable; clicking once");
                control.click().is_ok()
            }
        }
    }

    /// Assign a value: range position for sliders, text for everything else.
    #[instrument(skip(self, control, value), fields(control = %control.name_or_empty()))]
    pub fn set_value(&self, control: &UIElement, value: &Value) -> Result<(), AutomationError> {
        if control.role() == ControlKind::Slider {
            let target = SliderTarget::from_value(value).ok_or_else(|| {
                AutomationError::InvalidArgument(format!("not a slider value: {value}"))
            })?;
            let range = control.range_value()?.ok_or_else(|| {
                AutomationError::UnsupportedOperation(format!(
                    "'{}' exposes no range",
                    control.name_or_empty()
                ))
            })?;
            let resolved = target.resolve(&range);
            info!("[interaction] Setting slider to {resolved} ({target:?})");
            return control.set_range_value(resolved);
        }

        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        control.set_text(&text)
    }

    /// Move the first slider found below `parent` to `target`.
    pub fn adjust_first_slider(
        &self,
        parent: &UIElement,
        target: &str,
    ) -> Result<String, AutomationError> {
        let Some(slider) = first_of_kind(parent, &ControlKind::Slider) else {
            let available: Vec<String> = descendants(parent)
                .map(|n| format!("{}: '{}'", n.role(), n.name_or_empty()))
                .collect();
            debug!("[interaction] Available controls: {available:?}");
            return Err(AutomationError::ElementNotFound(format!(
                "no slider in '{}'",
                parent.name_or_empty()
            )));
        };
        adjust_slider(&slider, target)?;
        Ok(format!("Adjusted slider to '{target}'"))
    }
}

/// Move `slider` to a symbolic or numeric target.
pub fn adjust_slider(slider: &UIElement, target: &str) -> Result<f64, AutomationError> {
    let parsed = SliderTarget::parse(target).ok_or_else(|| {
        AutomationError::InvalidArgument(format!("unrecognised slider target '{target}'"))
    })?;
    let range = slider.range_value()?.ok_or_else(|| {
        AutomationError::UnsupportedOperation(format!(
            "'{}' exposes no range",
            slider.name_or_empty()
        ))
    })?;
    let value = parsed.resolve(&range);
    slider.set_range_value(value)?;
    info!(
        "[interaction] Slider '{}' set to {value} (range {}..{})",
        slider.name_or_empty(),
        range.min,
        range.max
    );
    Ok(value)
}

fn on_off(state: bool) -> &'static str {
    if state {
        "On"
    } else {
        "Off"
    }
}
