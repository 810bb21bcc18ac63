//! Path-based navigation through Control Panel, the Settings app or a tray icon.
//!
//! `ui_path` is `[root, target, tab]`: the root window to open, the entry to
//! click inside it, and optionally a tab in the dialog that opens. The final
//! `action` then sets a checkbox or a slider and confirms with Apply / OK.

use super::volume::set_volume;
use crate::discovery::{find_control, first_of_kind};
use crate::element::{ControlKind, UIElement};
use crate::errors::AutomationError;
use crate::interaction::adjust_slider;
use crate::navigation::desired_state;
use crate::registry::{ActionArgs, ActionHandler};
use crate::Desktop;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

const VOLUME_KEYWORDS: &[&str] = &["volume", "sound", "speaker", "audio", "mute"];
const CONTROL_PANEL_TERMS: &[&str] = &["control panel", "settings", "all control panel items"];
const SETTINGS_TERMS: &[&str] = &["settings", "system settings", "windows settings", "sound", "system"];
const DIALOG_TERMS: &[&str] = &["properties", "options"];

/// Slider names too vague to search for; the first slider in the dialog is used instead.
const GENERIC_SLIDER_NAMES: &[&str] =
    &["speed", "motion", "pointer", "rate", "slider", "volume", "brightness"];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SettingsAction {
    Checkbox {
        name: String,
        #[serde(default = "checked")]
        value: Value,
    },
    Slider {
        #[serde(default)]
        name: String,
        value: Value,
    },
}

fn checked() -> Value {
    Value::Bool(true)
}

impl SettingsAction {
    fn value(&self) -> &Value {
        match self {
            Self::Checkbox { value, .. } | Self::Slider { value, .. } => value,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Checkbox { name, .. } | Self::Slider { name, .. } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsArgs {
    ui_path: Vec<String>,
    action: SettingsAction,
}

impl SettingsArgs {
    fn is_volume_request(&self) -> bool {
        let mut haystack = self.ui_path.join(" ").to_lowercase();
        haystack.push(' ');
        haystack.push_str(&self.action.name().to_lowercase());
        VOLUME_KEYWORDS.iter().any(|k| haystack.contains(k))
    }
}

/// Map the second path element onto a Settings page URI.
fn settings_uri(category: Option<&str>) -> &'static str {
    let Some(category) = category.map(str::to_lowercase) else {
        return "ms-settings:";
    };
    if category.contains("sound") || category.contains("audio") {
        "ms-settings:sound"
    } else if category.contains("display") {
        "ms-settings:display"
    } else if category.contains("bluetooth") {
        "ms-settings:bluetooth"
    } else {
        "ms-settings:"
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct NavigateSettings {
    desktop: Desktop,
}

impl NavigateSettings {
    pub fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }

    /// Open (or locate) the window named by the first path element.
    async fn open_root(&self, root: &str, category: Option<&str>) -> Option<UIElement> {
        let timeout = self.desktop.timings().window_timeout();
        let lowered = root.to_lowercase();

        if lowered.contains("control") {
            if let Err(e) = self.desktop.launch("control").await {
                warn!("[settings] Could not open Control Panel: {e}");
                return None;
            }
            return self.desktop.find_window(CONTROL_PANEL_TERMS, timeout).await;
        }

        if lowered.contains("settings") {
            let uri = settings_uri(category);
            info!("[settings] Opening Settings with URI: {uri}");
            if let Err(e) = self.desktop.launch(uri).await {
                warn!("[settings] Could not open Settings: {e}");
                return None;
            }
            return self.desktop.find_window(SETTINGS_TERMS, timeout).await;
        }

        // Anything else is treated as a tray icon first, then as a window title.
        if let Some(taskbar) = self.desktop.find_taskbar(timeout).await {
            if let Some(icon) = find_control(&taskbar, root, Some(&ControlKind::Button), true) {
                info!("[settings] Clicking tray icon '{root}'");
                if self.desktop.click(&icon).await {
                    let popup_terms = [root, "volume", "slider"];
                    if let Some(popup) = self.desktop.find_window(&popup_terms, timeout).await {
                        return Some(popup);
                    }
                }
            } else {
                info!("[settings] '{root}' is not a tray icon, looking for a window");
            }
        }
        self.desktop.find_window(&[root], timeout).await
    }

    async fn confirm(&self, parent: &UIElement) {
        for label in ["Apply", "OK"] {
            if let Some(button) = find_control(parent, label, Some(&ControlKind::Button), false) {
                self.desktop.click(&button).await;
            }
        }
    }

    #[instrument(skip(self, args))]
    async fn navigate(&self, args: &SettingsArgs) -> Result<String, AutomationError> {
        let root = args.ui_path.first().ok_or_else(|| {
            AutomationError::InvalidArgument("ui_path must name at least one element".to_string())
        })?;
        info!("[settings] Navigating path: {:?}", args.ui_path);

        let window = self
            .open_root(root, args.ui_path.get(1).map(String::as_str))
            .await
            .ok_or_else(|| {
                AutomationError::ElementNotFound(format!("target window or icon '{root}'"))
            })?;
        info!("[settings] Found window: {}", window.name_or_empty());

        let mut dialog = None;
        if let Some(target) = args.ui_path.get(1) {
            let control = find_control(&window, target, None, true).ok_or_else(|| {
                AutomationError::ElementNotFound(format!(
                    "'{target}' in '{}'",
                    window.name_or_empty()
                ))
            })?;
            info!("[settings] Clicking on: {}", control.name_or_empty());
            if !self.desktop.click(&control).await {
                return Err(AutomationError::ActionFailed(format!(
                    "could not click '{target}'"
                )));
            }
            let mut terms: Vec<&str> = DIALOG_TERMS.to_vec();
            terms.push(target);
            dialog = self
                .desktop
                .find_window(&terms, self.desktop.timings().window_timeout())
                .await;
        }

        if let Some(tab) = args.ui_path.get(2) {
            match &dialog {
                Some(d) => match find_control(d, tab, Some(&ControlKind::TabItem), true) {
                    Some(tab_control) => {
                        info!("[settings] Switching to tab: {}", tab_control.name_or_empty());
                        self.desktop.click(&tab_control).await;
                    }
                    None => warn!("[settings] Could not find tab '{tab}'"),
                },
                None => warn!("[settings] No properties/options dialog to switch tabs in"),
            }
        }

        let parent = dialog.as_ref().unwrap_or(&window);
        let message = match &args.action {
            SettingsAction::Checkbox { name, value } => {
                let desired = desired_state(value).ok_or_else(|| {
                    AutomationError::InvalidArgument(format!("checkbox value {value} is not on/off"))
                })?;
                let checkbox = find_control(parent, name, Some(&ControlKind::CheckBox), true)
                    .ok_or_else(|| AutomationError::ElementNotFound(format!("checkbox '{name}'")))?;
                if !self.desktop.set_toggle(&checkbox, desired).await {
                    return Err(AutomationError::ActionFailed(format!(
                        "could not set checkbox '{name}'"
                    )));
                }
                format!("Successfully set '{name}' to {desired}")
            }
            SettingsAction::Slider { name, value } => {
                let slider = if GENERIC_SLIDER_NAMES.contains(&name.to_lowercase().as_str()) {
                    first_of_kind(parent, &ControlKind::Slider)
                } else {
                    find_control(parent, name, Some(&ControlKind::Slider), true)
                }
                .ok_or_else(|| AutomationError::ElementNotFound(format!("slider '{name}'")))?;
                let target = value_text(value);
                adjust_slider(&slider, &target)?;
                format!("Successfully adjusted '{name}' to '{target}'")
            }
        };

        self.confirm(parent).await;
        Ok(message)
    }
}

#[async_trait]
impl ActionHandler for NavigateSettings {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: SettingsArgs = args.parse()?;
        if args.is_volume_request() {
            info!("[settings] Volume request, using the volume strategy chain");
            return set_volume(&self.desktop, &value_text(args.action.value())).await;
        }
        Ok(Value::String(self.navigate(&args).await?))
    }

    fn description(&self) -> &str {
        "Walk a Control Panel / Settings path and set a checkbox or slider"
    }
}
