//! Built-in plan actions.

pub mod app;
pub mod settings;
pub mod ui;
pub mod volume;

use crate::config::NavigationConfig;
use crate::oracle::DecisionOracle;
use crate::registry::ActionRegistry;
use crate::Desktop;
use std::sync::Arc;

/// Identifiers registered by [`default_registry`], sorted.
pub const BUILTIN_ACTIONS: &[&str] = &[
    "ai_navigate",
    "chat",
    "execute_ui_action",
    "introspect_ui",
    "launch_app",
    "navigate_settings",
    "set_volume",
];

/// Registry with every built-in action bound to `desktop`.
///
/// `ai_navigate` is registered either way; without an oracle it fails with
/// `UnsupportedOperation` when called.
pub fn default_registry(
    desktop: Desktop,
    oracle: Option<Arc<dyn DecisionOracle>>,
    navigation: NavigationConfig,
) -> ActionRegistry {
    ActionRegistry::builder()
        .handler("chat", app::Chat)
        .handler("launch_app", app::LaunchApp::new(desktop.clone()))
        .handler("introspect_ui", ui::IntrospectUi::new(desktop.clone()))
        .handler("execute_ui_action", ui::ExecuteUiAction::new(desktop.clone()))
        .handler(
            "ai_navigate",
            ui::AiNavigate::new(desktop.clone(), oracle, navigation),
        )
        .handler("set_volume", volume::SetVolume::new(desktop.clone()))
        .handler("navigate_settings", settings::NavigateSettings::new(desktop))
        .build()
}
