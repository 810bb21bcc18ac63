//! Window search, control search and snapshots over the fake tree.

use super::fake_desktop::*;
use crate::discovery::{find_any_control, find_control, first_of_kind};
use crate::element::ControlKind;
use crate::snapshot::{ToggleState, UiSnapshot};
use std::time::Duration;

#[tokio::test]
async fn test_shell_windows_are_never_returned() {
    let engine = FakeEngine::builder()
        .window(window("Taskbar").child(button("Speakers")))
        .window(window("Program Manager"))
        .window(window("start"))
        .build();
    let desktop = desktop(&engine);

    assert!(desktop.find_window(&[""], Duration::ZERO).await.is_none());
    assert!(desktop.find_window(&["task"], Duration::ZERO).await.is_none());
    assert!(desktop.find_window(&["Program"], Duration::ZERO).await.is_none());
    assert!(desktop.find_taskbar(Duration::ZERO).await.is_some());
}

#[tokio::test]
async fn test_first_window_in_enumeration_order_wins() {
    let engine = FakeEngine::builder()
        .window(window("Taskbar"))
        .window(window("Sound - Settings"))
        .window(window("Settings"))
        .build();
    let desktop = desktop(&engine);

    let found = desktop
        .find_window(&["settings", "sound"], Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(found.name_or_empty(), "Sound - Settings");

    let any = desktop.find_window(&[""], Duration::ZERO).await.unwrap();
    assert_eq!(any.name_or_empty(), "Sound - Settings");
}

#[tokio::test]
async fn test_hidden_window_appears_after_open() {
    let engine = FakeEngine::builder()
        .hidden_window(window("Control Panel"))
        .on_open("control", "Control Panel")
        .build();
    let desktop = desktop(&engine);

    assert!(desktop.find_window(&["control"], Duration::ZERO).await.is_none());
    desktop.launch("control").await.unwrap();
    assert!(desktop.find_window(&["control"], Duration::ZERO).await.is_some());
    assert_eq!(engine.opened(), vec!["control"]);
}

fn settings_tree() -> NodeSpec {
    window("Settings")
        .child(
            node(ControlKind::Group, "Bluetooth & devices")
                .child(button("Add device"))
                .child(toggle(ControlKind::ToggleButton, "Bluetooth", Some(false))),
        )
        .child(toggle(ControlKind::CheckBox, "Bluetooth notifications", Some(true)))
        .child(slider("Volume", 0.0, 100.0, 40.0))
        .child(toggle(ControlKind::ToggleButton, "", Some(true)))
        .child(node(ControlKind::Text, ""))
}

#[tokio::test]
async fn test_find_control_matches_in_tree_order() {
    let engine = FakeEngine::builder().window(settings_tree()).build();
    let desktop = desktop(&engine);
    let window = desktop.find_window(&["settings"], Duration::ZERO).await.unwrap();

    let partial = find_control(&window, "bluetooth", None, true).unwrap();
    assert_eq!(partial.name_or_empty(), "Bluetooth & devices");

    let exact = find_control(&window, "BLUETOOTH", None, false).unwrap();
    assert_eq!(exact.name_or_empty(), "Bluetooth");

    let checkbox = find_control(&window, "bluetooth", Some(&ControlKind::CheckBox), true).unwrap();
    assert_eq!(checkbox.name_or_empty(), "Bluetooth notifications");

    assert!(find_control(&window, "wifi", None, true).is_none());
}

#[tokio::test]
async fn test_find_any_control_reports_matched_name() {
    let engine = FakeEngine::builder().window(settings_tree()).build();
    let desktop = desktop(&engine);
    let window = desktop.find_window(&["settings"], Duration::ZERO).await.unwrap();

    let (matched, control) =
        find_any_control(&window, &["speakers", "add"], Some(&ControlKind::Button)).unwrap();
    assert_eq!(matched, "add");
    assert_eq!(control.name_or_empty(), "Add device");

    let slider = first_of_kind(&window, &ControlKind::Slider).unwrap();
    assert_eq!(slider.name_or_empty(), "Volume");
}

#[tokio::test]
async fn test_snapshot_names_unnamed_toggles_and_drops_unnamed_text() {
    let engine = FakeEngine::builder().window(settings_tree()).build();
    let desktop = desktop(&engine);
    let window = desktop.find_window(&["settings"], Duration::ZERO).await.unwrap();

    let snapshot = UiSnapshot::capture(&window);
    assert_eq!(snapshot.window, "Settings");
    let names: Vec<&str> = snapshot.controls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Bluetooth & devices",
            "Add device",
            "Bluetooth",
            "Bluetooth notifications",
            "Volume",
            "[Unnamed ToggleButton #1]",
        ]
    );

    let bluetooth = &snapshot.controls[2];
    assert_eq!(bluetooth.state, Some(ToggleState::Off));
    assert!(bluetooth.clickable);
    let volume = &snapshot.controls[4];
    assert_eq!(volume.value.map(|v| v.current), Some(40.0));

    let remaining = snapshot.without(&["Add device", "Bluetooth"]);
    assert_eq!(remaining.len(), snapshot.controls.len() - 2);
}

#[tokio::test]
async fn test_introspect_with_settings_uri_accepts_settings_window() {
    let engine = FakeEngine::builder()
        .hidden_window(settings_tree())
        .on_open("ms-settings:bluetooth", "Settings")
        .build();
    let desktop = desktop(&engine);

    let snapshot = desktop
        .introspect(&["Bluetooth & other devices"], Some("ms-settings:bluetooth"))
        .await
        .unwrap();
    assert_eq!(snapshot.window, "Settings");
    assert_eq!(engine.opened(), vec!["ms-settings:bluetooth"]);
}
