//! System volume through a chain of increasingly blunt strategies.
//!
//! 1. the taskbar speaker icon and the slider in its popup,
//! 2. an already-open quick settings panel,
//! 3. media-key injection,
//! 4. the Sound page of the Settings app.

use crate::element::ControlKind;
use crate::errors::AutomationError;
use crate::interaction::SliderTarget;
use crate::platforms::MediaKey;
use crate::registry::{ActionArgs, ActionHandler};
use crate::strategy::{Strategy, StrategyChain};
use crate::{discovery, Desktop};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::time::sleep;
use tracing::info;

/// Tray icon names, tried in order.
const TRAY_ICON_NAMES: &[&str] = &["speakers", "volume", "sound", "audio", "notification chevron"];
const VOLUME_POPUP_TERMS: &[&str] = &["volume", "slider", "sound"];
const QUICK_SETTINGS_TERMS: &[&str] = &["quick settings", "notification center"];
const SETTINGS_SOUND_URI: &str = "ms-settings:sound";
const SETTINGS_SOUND_TERMS: &[&str] = &["settings", "sound", "system"];

/// Key presses needed to sweep the whole volume range (each press moves 2%).
const FULL_SWEEP_PRESSES: u32 = 50;

pub struct TrayIconStrategy {
    desktop: Desktop,
    target: String,
}

#[async_trait]
impl Strategy for TrayIconStrategy {
    fn name(&self) -> &str {
        "tray_icon"
    }

    async fn attempt(&self) -> Result<String, AutomationError> {
        let timeout = self.desktop.timings().window_timeout();
        let taskbar = self
            .desktop
            .find_taskbar(timeout)
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("taskbar".to_string()))?;
        let (icon_name, icon) =
            discovery::find_any_control(&taskbar, TRAY_ICON_NAMES, Some(&ControlKind::Button))
                .ok_or_else(|| {
                    AutomationError::ElementNotFound("volume icon in the taskbar".to_string())
                })?;

        info!("[volume] Found tray icon: {icon_name}");
        if !self.desktop.click(&icon).await {
            return Err(AutomationError::ActionFailed(format!(
                "could not click tray icon '{icon_name}'"
            )));
        }
        sleep(self.desktop.timings().launch_settle()).await;

        let popup = self
            .desktop
            .find_window(VOLUME_POPUP_TERMS, timeout)
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("volume popup".to_string()))?;
        self.desktop.adjust_first_slider(&popup, &self.target)
    }
}

pub struct QuickSettingsStrategy {
    desktop: Desktop,
    target: String,
}

#[async_trait]
impl Strategy for QuickSettingsStrategy {
    fn name(&self) -> &str {
        "quick_settings"
    }

    async fn attempt(&self) -> Result<String, AutomationError> {
        let panel = self
            .desktop
            .find_window(QUICK_SETTINGS_TERMS, self.desktop.timings().window_timeout())
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("quick settings panel".to_string()))?;
        self.desktop.adjust_first_slider(&panel, &self.target)
    }
}

pub struct MediaKeyStrategy {
    desktop: Desktop,
    target: String,
}

impl MediaKeyStrategy {
    /// Key presses for a target on a 0-100 scale: sweep to zero, then step up.
    fn presses(target: SliderTarget) -> Vec<(MediaKey, u32)> {
        let up = match target {
            SliderTarget::Min => 0,
            SliderTarget::Max => FULL_SWEEP_PRESSES,
            SliderTarget::Mid => FULL_SWEEP_PRESSES / 2,
            SliderTarget::Exact(v) => (v.clamp(0.0, 100.0) / 2.0).round() as u32,
        };
        if up >= FULL_SWEEP_PRESSES {
            return vec![(MediaKey::VolumeUp, FULL_SWEEP_PRESSES)];
        }
        let mut presses = vec![(MediaKey::VolumeDown, FULL_SWEEP_PRESSES)];
        if up > 0 {
            presses.push((MediaKey::VolumeUp, up));
        }
        presses
    }
}

#[async_trait]
impl Strategy for MediaKeyStrategy {
    fn name(&self) -> &str {
        "media_keys"
    }

    async fn attempt(&self) -> Result<String, AutomationError> {
        let target = SliderTarget::parse(&self.target).ok_or_else(|| {
            AutomationError::InvalidArgument(format!("unrecognised volume '{}'", self.target))
        })?;
        for (key, repeat) in Self::presses(target) {
            self.desktop.press_media_key(key, repeat)?;
        }
        Ok(format!("Volume set to '{}' with media keys", self.target))
    }
}

pub struct SettingsPageStrategy {
    desktop: Desktop,
    target: String,
}

#[async_trait]
impl Strategy for SettingsPageStrategy {
    fn name(&self) -> &str {
        "settings_page"
    }

    async fn attempt(&self) -> Result<String, AutomationError> {
        self.desktop.launch(SETTINGS_SOUND_URI).await?;
        let window = self
            .desktop
            .find_window(SETTINGS_SOUND_TERMS, self.desktop.timings().window_timeout())
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("Sound settings window".to_string()))?;
        self.desktop.adjust_first_slider(&window, &self.target)
    }
}

/// The four volume strategies in fallback order.
pub fn volume_chain(desktop: &Desktop, target: &str) -> StrategyChain {
    StrategyChain::new("volume")
        .then(TrayIconStrategy {
            desktop: desktop.clone(),
            target: target.to_string(),
        })
        .then(QuickSettingsStrategy {
            desktop: desktop.clone(),
            target: target.to_string(),
        })
        .then(MediaKeyStrategy {
            desktop: desktop.clone(),
            target: target.to_string(),
        })
        .then(SettingsPageStrategy {
            desktop: desktop.clone(),
            target: target.to_string(),
        })
}

/// Run the volume chain after checking that `target` is a usable level.
pub async fn set_volume(desktop: &Desktop, target: &str) -> Result<Value, AutomationError> {
    if SliderTarget::parse(target).is_none() {
        return Err(AutomationError::InvalidArgument(format!(
            "unrecognised volume '{target}'; use min, max, mid or a number"
        )));
    }
    let success = volume_chain(desktop, target).run().await?;
    Ok(json!({
        "strategy": success.strategy,
        "message": success.message,
        "failed_strategies": success.failures,
    }))
}

pub struct SetVolume {
    desktop: Desktop,
}

impl SetVolume {
    pub fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }
}

#[derive(Deserialize)]
struct VolumeArgs {
    value: Value,
}

#[async_trait]
impl ActionHandler for SetVolume {
    async fn call(&self, args: &Map<String, Value>) -> Result<Value, AutomationError> {
        let args: VolumeArgs = args.parse()?;
        let target = match args.value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(AutomationError::InvalidArgument(format!(
                    "volume must be a string or number, got {other}"
                )))
            }
        };
        set_volume(&self.desktop, &target).await
    }

    fn description(&self) -> &str {
        "Set the system volume (min, max, mid or 0-100)"
    }
}
