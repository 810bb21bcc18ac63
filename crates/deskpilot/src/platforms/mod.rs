//! Accessibility backends.
//!
//! The rest of the crate only talks to [`AccessibilityEngine`]; the Windows UI
//! Automation implementation lives in [`windows`].

use crate::element::UIElement;
use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(target_os = "windows")]
pub mod windows;

/// Hardware media keys used for volume control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

/// A live accessibility tree plus the few OS services the automation layer needs.
pub trait AccessibilityEngine: Send + Sync {
    /// Top-level windows in the platform's enumeration order.
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError>;

    /// Start a program, shell command or URI (`control`, `ms-settings:sound`, ...).
    /// Returns once the launch was requested, not once the window exists.
    fn open(&self, target: &str) -> Result<(), AutomationError>;

    /// Inject a media key `repeat` times.
    fn press_media_key(&self, key: MediaKey, repeat: u32) -> Result<(), AutomationError>;
}

/// `cmd` arguments that start `target` the way the shell would:
/// `/C start "" <program> <args>...`.
///
/// `target` is a whole command line (`notepad C:\notes.txt`, `control /name
/// Microsoft.Sound`, `ms-settings:sound`). It is split on whitespace, with
/// double quotes grouping words, so the program and each of its arguments reach
/// `start` as separate tokens. A leading `start` is dropped.
pub fn shell_start_args(target: &str) -> Result<Vec<String>, AutomationError> {
    let mut words = split_command_line(target);
    if words.first().is_some_and(|w| w.eq_ignore_ascii_case("start")) {
        words.remove(0);
    }
    if words.is_empty() {
        return Err(AutomationError::InvalidArgument("nothing to open".to_string()));
    }
    // The empty argument is the window title `start` expects before the program.
    let mut args = vec!["/C".to_string(), "start".to_string(), String::new()];
    args.extend(words);
    Ok(args)
}

fn split_command_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    for c in line.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    words.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        words.push(current);
    }
    words
}

/// Create the engine for the current platform.
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsEngine::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(AutomationError::UnsupportedOperation(
            "no accessibility engine for this platform; only Windows UI Automation is supported"
                .to_string(),
        ))
    }
}
