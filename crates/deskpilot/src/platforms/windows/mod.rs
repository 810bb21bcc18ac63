//! Windows platform implementation on top of UI Automation (uiautomation crate).

pub mod element;
pub mod engine;
pub mod input;

pub use element::WindowsUIElement;
pub use engine::WindowsEngine;
pub use input::send_media_key;
