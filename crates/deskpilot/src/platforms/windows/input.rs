//! Keyboard injection for Windows.

use crate::platforms::MediaKey;
use crate::AutomationError;
use std::mem::size_of;
use tracing::debug;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    VIRTUAL_KEY, VK_VOLUME_DOWN, VK_VOLUME_MUTE, VK_VOLUME_UP,
};

fn virtual_key(key: MediaKey) -> VIRTUAL_KEY {
    match key {
        MediaKey::VolumeUp => VK_VOLUME_UP,
        MediaKey::VolumeDown => VK_VOLUME_DOWN,
        MediaKey::VolumeMute => VK_VOLUME_MUTE,
    }
}

fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Press and release a media key `repeat` times through `SendInput`.
pub fn send_media_key(key: MediaKey, repeat: u32) -> Result<(), AutomationError> {
    let vk = virtual_key(key);
    let mut inputs = Vec::with_capacity(repeat as usize * 2);
    for _ in 0..repeat {
        inputs.push(key_input(vk, KEYBD_EVENT_FLAGS(0)));
        inputs.push(key_input(vk, KEYEVENTF_KEYUP));
    }
    if inputs.is_empty() {
        return Ok(());
    }

    let sent = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) };
    debug!("[input] sent {sent}/{} key events for {key:?}", inputs.len());
    if sent as usize != inputs.len() {
        return Err(AutomationError::PlatformError(format!(
            "SendInput injected {sent} of {} key events",
            inputs.len()
        )));
    }
    Ok(())
}
