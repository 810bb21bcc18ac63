mod action_tests;
mod discovery_tests;
mod fake_desktop;
