//! Built-in actions dispatched through the default registry.

use super::fake_desktop::*;
use crate::actions::{default_registry, BUILTIN_ACTIONS};
use crate::actions::volume::volume_chain;
use crate::element::ControlKind;
use crate::errors::AutomationError;
use crate::oracle::{DecisionOracle, UiActionType};
use crate::platforms::MediaKey;
use crate::registry::ActionRegistry;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn registry(engine: &Arc<FakeEngine>) -> ActionRegistry {
    default_registry(desktop(engine), None, quick_navigation())
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn call(registry: &ActionRegistry, action: &str, value: Value) -> Result<Value, AutomationError> {
    registry.get(action).unwrap().call(&args(value)).await
}

#[test]
fn test_default_registry_names() {
    let engine = FakeEngine::builder().build();
    let names: Vec<String> = registry(&engine).names().map(String::from).collect();
    assert_eq!(names, BUILTIN_ACTIONS);
}

#[tokio::test]
async fn test_chat_and_launch_app() {
    let engine = FakeEngine::builder().build();
    let registry = registry(&engine);

    let reply = call(&registry, "chat", json!({"message": "hello"})).await.unwrap();
    assert_eq!(reply, json!("hello"));

    let launched = call(&registry, "launch_app", json!({"command": "notepad", "args": "todo.txt"}))
        .await
        .unwrap();
    assert_eq!(launched, json!({"launched": "notepad todo.txt"}));
    assert_eq!(engine.opened(), vec!["notepad todo.txt"]);

    let err = call(&registry, "launch_app", json!({"command": "  "})).await.unwrap_err();
    assert!(matches!(err, AutomationError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_introspect_ui_lists_controls() {
    let engine = FakeEngine::builder()
        .window(
            window("Notepad")
                .child(node(ControlKind::MenuItem, "File"))
                .child(node(ControlKind::Edit, "Text editor")),
        )
        .build();
    let registry = registry(&engine);

    let output = call(&registry, "introspect_ui", json!({"window_search_terms": ["notepad"]}))
        .await
        .unwrap();
    assert_eq!(output["window"], "Notepad");
    assert_eq!(output["controls"][0], json!({"name": "File", "type": "MenuItem", "clickable": true}));
    assert_eq!(output["controls"][1]["type"], "Edit");

    let err = call(&registry, "introspect_ui", json!({"window_search_terms": ["paint"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
}

#[tokio::test]
async fn test_ai_navigate_needs_an_oracle() {
    let engine = FakeEngine::builder().window(window("Settings")).build();
    let registry = registry(&engine);

    let err = call(
        &registry,
        "ai_navigate",
        json!({"goal": "turn on bluetooth", "window_search_terms": ["Settings"]}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AutomationError::UnsupportedOperation(_)));
}

#[tokio::test]
async fn test_ai_navigate_with_oracle_returns_outcome() {
    let engine = FakeEngine::builder()
        .window(window("Settings").child(toggle(ControlKind::ToggleButton, "Bluetooth", Some(false))))
        .build();
    let oracle = ScriptedOracle::new(vec![Ok(act(
        "Bluetooth",
        UiActionType::Toggle,
        Some(json!("on")),
    ))]);
    let registry = default_registry(
        desktop(&engine),
        Some(oracle as Arc<dyn DecisionOracle>),
        quick_navigation(),
    );

    let output = call(
        &registry,
        "ai_navigate",
        json!({"goal": "turn on bluetooth", "window_search_terms": ["Settings"]}),
    )
    .await
    .unwrap();

    assert_eq!(output["status"], "achieved");
    assert_eq!(output["steps_completed"], json!(["Toggled 'Bluetooth'"]));
    assert_eq!(engine.node("Bluetooth").toggled(), Some(true));
}

fn volume_desktop() -> Arc<FakeEngine> {
    FakeEngine::builder()
        .window(window("Taskbar").child(button("Speakers: 40%").reveals("Volume control")))
        .hidden_window(window("Volume control").child(slider("Master volume", 0.0, 100.0, 40.0)))
        .build()
}

#[tokio::test]
async fn test_volume_through_tray_icon() {
    let engine = volume_desktop();
    let registry = registry(&engine);

    let output = call(&registry, "set_volume", json!({"value": "max"})).await.unwrap();

    assert_eq!(output["strategy"], "tray_icon");
    assert_eq!(output["failed_strategies"], json!([]));
    assert_eq!(engine.node("Master volume").position(), Some(100.0));
    assert!(engine.media_keys().is_empty());
}

#[tokio::test]
async fn test_volume_falls_back_to_media_keys() {
    let engine = FakeEngine::builder().window(window("Notepad")).build();

    let success = volume_chain(&desktop(&engine), "mid").run().await.unwrap();

    assert_eq!(success.strategy, "media_keys");
    let failed: Vec<&str> = success.failures.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(failed, vec!["tray_icon", "quick_settings"]);
    assert_eq!(
        engine.media_keys(),
        vec![(MediaKey::VolumeDown, 50), (MediaKey::VolumeUp, 25)]
    );
    assert!(engine.opened().is_empty());
}

#[tokio::test]
async fn test_volume_settings_page_is_last_resort() {
    let engine = FakeEngine::builder()
        .failing_media_keys()
        .hidden_window(window("Sound - Settings").child(slider("Volume", 0.0, 100.0, 80.0)))
        .on_open("ms-settings:sound", "Sound - Settings")
        .build();

    let success = volume_chain(&desktop(&engine), "min").run().await.unwrap();

    assert_eq!(success.strategy, "settings_page");
    assert_eq!(success.failures.len(), 3);
    assert_eq!(engine.node("Volume").position(), Some(0.0));
}

#[tokio::test]
async fn test_volume_exhaustion_lists_every_strategy() {
    let engine = FakeEngine::builder().failing_media_keys().build();
    let registry = registry(&engine);

    match call(&registry, "set_volume", json!({"value": 30})).await {
        Err(AutomationError::StrategiesExhausted(failures)) => {
            let names: Vec<&str> = failures.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["tray_icon", "quick_settings", "media_keys", "settings_page"]);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_volume_rejects_unknown_level() {
    let engine = volume_desktop();
    let registry = registry(&engine);

    let err = call(&registry, "set_volume", json!({"value": "loud"})).await.unwrap_err();
    assert!(matches!(err, AutomationError::InvalidArgument(_)));
    assert_eq!(engine.node("Speakers: 40%").clicks(), 0);
}

fn control_panel() -> Arc<FakeEngine> {
    FakeEngine::builder()
        .hidden_window(
            window("All Control Panel Items")
                .child(node(ControlKind::Hyperlink, "File Explorer Options").reveals("File Explorer Options"))
                .child(node(ControlKind::Hyperlink, "Mouse").reveals("Mouse Properties")),
        )
        .hidden_window(
            window("File Explorer Options")
                .child(node(ControlKind::TabItem, "General"))
                .child(node(ControlKind::TabItem, "View"))
                .child(toggle(ControlKind::CheckBox, "Hide extensions for known file types", Some(true)))
                .child(button("OK"))
                .child(button("Cancel"))
                .child(button("Apply")),
        )
        .hidden_window(
            window("Mouse Properties")
                .child(node(ControlKind::TabItem, "Pointer Options"))
                .child(slider("Select a pointer speed", 1.0, 20.0, 10.0))
                .child(button("OK"))
                .child(button("Apply")),
        )
        .on_open("control", "All Control Panel Items")
        .build()
}

#[tokio::test]
async fn test_navigate_settings_checkbox_flow() {
    let engine = control_panel();
    let registry = registry(&engine);

    let output = call(
        &registry,
        "navigate_settings",
        json!({
            "ui_path": ["Control Panel", "File Explorer Options", "View"],
            "action": {"type": "checkbox", "name": "Hide extensions", "value": false}
        }),
    )
    .await
    .unwrap();

    assert_eq!(output, json!("Successfully set 'Hide extensions' to false"));
    assert_eq!(engine.opened(), vec!["control"]);
    assert_eq!(
        engine.node("Hide extensions for known file types").toggled(),
        Some(false)
    );
    assert_eq!(
        engine.click_log(),
        vec![
            "File Explorer Options",
            "View",
            "Hide extensions for known file types",
            "Apply",
            "OK",
        ]
    );
}

#[tokio::test]
async fn test_navigate_settings_generic_slider_uses_first_slider() {
    let engine = control_panel();
    let registry = registry(&engine);

    call(
        &registry,
        "navigate_settings",
        json!({
            "ui_path": ["Control Panel", "Mouse", "Pointer Options"],
            "action": {"type": "slider", "name": "speed", "value": "fast"}
        }),
    )
    .await
    .unwrap();

    assert_eq!(engine.node("Select a pointer speed").position(), Some(20.0));
    assert_eq!(engine.click_log(), vec!["Mouse", "Pointer Options", "Apply", "OK"]);
}

#[tokio::test]
async fn test_navigate_settings_routes_volume_to_the_chain() {
    let engine = volume_desktop();
    let registry = registry(&engine);

    let output = call(
        &registry,
        "navigate_settings",
        json!({
            "ui_path": ["Speakers"],
            "action": {"type": "slider", "name": "level", "value": "min"}
        }),
    )
    .await
    .unwrap();

    assert_eq!(output["strategy"], "tray_icon");
    assert_eq!(engine.node("Master volume").position(), Some(0.0));
}

#[tokio::test]
async fn test_navigate_settings_missing_target_fails() {
    let engine = control_panel();
    let registry = registry(&engine);

    let err = call(
        &registry,
        "navigate_settings",
        json!({
            "ui_path": ["Control Panel", "Keyboard"],
            "action": {"type": "checkbox", "name": "Repeat"}
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
}
