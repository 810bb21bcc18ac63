use super::element::WindowsUIElement;
use super::input::send_media_key;
use crate::element::UIElement;
use crate::platforms::{shell_start_args, AccessibilityEngine, MediaKey};
use crate::AutomationError;
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};
use uiautomation::types::TreeScope;
use uiautomation::UIAutomation;

/// Shared, thread-safe handle to the UI Automation COM client.
pub(crate) struct ThreadSafeAutomation(pub UIAutomation);

// UIAutomation is created in the multithreaded apartment, so its COM pointers
// may be used from any thread.
unsafe impl Send for ThreadSafeAutomation {}
unsafe impl Sync for ThreadSafeAutomation {}

pub struct WindowsEngine {
    automation: Arc<ThreadSafeAutomation>,
}

impl WindowsEngine {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = UIAutomation::new().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to initialize UI Automation: {e}"))
        })?;
        info!("[windows] UI Automation client initialized");
        Ok(Self {
            automation: Arc::new(ThreadSafeAutomation(automation)),
        })
    }
}

impl AccessibilityEngine for WindowsEngine {
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        let automation = &self.automation.0;
        let root = automation.get_root_element().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get desktop root: {e}"))
        })?;
        let condition = automation.create_true_condition().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to create true condition: {e}"))
        })?;
        let windows = root
            .find_all(TreeScope::Children, &condition)
            .map_err(|e| {
                AutomationError::PlatformError(format!("Failed to enumerate windows: {e}"))
            })?;

        Ok(windows
            .into_iter()
            .map(|w| WindowsUIElement::wrap(w, self.automation.clone()))
            .collect())
    }

    fn open(&self, target: &str) -> Result<(), AutomationError> {
        let args = shell_start_args(target)?;
        debug!("[windows] cmd {:?}", args);
        Command::new("cmd").args(&args).spawn().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to open '{}': {e}", target.trim()))
        })?;
        Ok(())
    }

    fn press_media_key(&self, key: MediaKey, repeat: u32) -> Result<(), AutomationError> {
        send_media_key(key, repeat)
    }
}
