//! Window and control lookup over the live accessibility tree.
//!
//! Nothing here caches elements. Every call re-reads the tree, and "not found"
//! is reported as `None` rather than an error.

use crate::element::{ControlKind, UIElement};
use crate::Desktop;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn, Level};

/// Shell surfaces that are never returned by [`Desktop::find_window`].
pub const EXCLUDED_WINDOW_TITLES: &[&str] = &["Taskbar", "Program Manager", "Start"];

/// Upper bound on nodes visited by a single traversal.
const MAX_TRAVERSAL_NODES: usize = 20_000;

/// Number of window titles listed when a search fails.
const MAX_REPORTED_TITLES: usize = 20;

pub fn is_excluded_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty()
        || EXCLUDED_WINDOW_TITLES
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(title))
}

/// The first search term matching `title`, if any. An empty term matches
/// every title. Excluded titles never match.
pub fn matching_term<'a, S: AsRef<str>>(title: &str, terms: &'a [S]) -> Option<&'a str> {
    if is_excluded_title(title) {
        return None;
    }
    let title = title.to_lowercase();
    terms.iter().map(AsRef::as_ref).find(|term| {
        let term = term.trim();
        term.is_empty() || title.contains(&term.to_lowercase())
    })
}

impl Desktop {
    /// Poll the top-level windows until one matches `terms` or `timeout` elapses.
    ///
    /// Windows are checked in enumeration order and the first match wins. At
    /// least one poll always happens, even with a zero timeout.
    #[instrument(skip(self, terms))]
    pub async fn find_window<S: AsRef<str>>(
        &self,
        terms: &[S],
        timeout: Duration,
    ) -> Option<UIElement> {
        debug!(
            "[discovery] Searching for window with terms: {:?}",
            terms.iter().map(AsRef::as_ref).collect::<Vec<_>>()
        );
        let deadline = Instant::now() + timeout;
        let mut seen = BTreeSet::new();

        loop {
            match self.engine().top_level_windows() {
                Ok(windows) => {
                    for window in windows {
                        let Some(title) = window.name() else { continue };
                        if is_excluded_title(&title) {
                            continue;
                        }
                        if let Some(term) = matching_term(&title, terms) {
                            if term.trim().is_empty() {
                                info!("[discovery] Found window (any): '{title}'");
                            } else {
                                info!("[discovery] Found window: '{title}' (matched '{term}')");
                            }
                            return Some(window);
                        }
                        seen.insert(title);
                    }
                }
                Err(e) => warn!("[discovery] Window enumeration failed: {e}"),
            }

            if Instant::now() >= deadline {
                break;
            }
            sleep(self.timings().poll_interval()).await;
        }

        info!("[discovery] Window not found after {:?}", timeout);
        if !seen.is_empty() {
            debug!(
                "[discovery] Windows seen during search: {:?}",
                seen.iter().take(MAX_REPORTED_TITLES).collect::<Vec<_>>()
            );
        }
        None
    }

    /// Locate the shell taskbar, which [`Desktop::find_window`] deliberately skips.
    pub async fn find_taskbar(&self, timeout: Duration) -> Option<UIElement> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(windows) = self.engine().top_level_windows() {
                if let Some(taskbar) = windows.into_iter().find(|w| {
                    w.name()
                        .is_some_and(|t| t.trim().eq_ignore_ascii_case("Taskbar"))
                }) {
                    return Some(taskbar);
                }
            }
            if Instant::now() >= deadline {
                debug!("[discovery] Taskbar not found");
                return None;
            }
            sleep(self.timings().poll_interval()).await;
        }
    }
}

/// Pre-order, depth-first walk over every node below a parent.
///
/// Children are read lazily. A node whose children cannot be read is treated
/// as a leaf.
pub struct Descendants {
    stack: Vec<UIElement>,
    visited: usize,
}

impl Iterator for Descendants {
    type Item = UIElement;

    fn next(&mut self) -> Option<UIElement> {
        if self.visited >= MAX_TRAVERSAL_NODES {
            if !self.stack.is_empty() {
                warn!("[discovery] Traversal stopped after {MAX_TRAVERSAL_NODES} nodes");
                self.stack.clear();
            }
            return None;
        }
        let node = self.stack.pop()?;
        self.visited += 1;
        if let Ok(children) = node.children() {
            self.stack.extend(children.into_iter().rev());
        }
        Some(node)
    }
}

pub fn descendants(parent: &UIElement) -> Descendants {
    let stack = parent
        .children()
        .map(|c| c.into_iter().rev().collect())
        .unwrap_or_default();
    Descendants { stack, visited: 0 }
}

/// First descendant of `parent` whose name matches `name`.
///
/// `kind` is applied before the name check. With `partial_match` the name is a
/// case-insensitive substring; otherwise the whole name must match ignoring case.
pub fn find_control(
    parent: &UIElement,
    name: &str,
    kind: Option<&ControlKind>,
    partial_match: bool,
) -> Option<UIElement> {
    let wanted = name.trim().to_lowercase();
    let found = descendants(parent).find(|node| {
        if kind.is_some_and(|k| node.role() != *k) {
            return false;
        }
        let Some(text) = node.name() else { return false };
        let text = text.to_lowercase();
        if partial_match {
            text.contains(&wanted)
        } else {
            text.trim() == wanted
        }
    });

    match &found {
        Some(control) => debug!(
            "[discovery] Found control: {} '{}'",
            control.role(),
            control.name_or_empty()
        ),
        None if tracing::enabled!(Level::DEBUG) => {
            let available: Vec<String> = descendants(parent)
                .filter(|n| kind.map_or(true, |k| n.role() == *k))
                .filter_map(|n| n.name().map(|name| format!("{}: '{}'", n.role(), name)))
                .collect();
            debug!(
                "[discovery] Control '{}' ({}) not found; available: {:?}",
                name,
                kind.map_or("any".to_string(), ToString::to_string),
                available
            );
        }
        None => {}
    }
    found
}

/// Same as [`find_control`] but tries each name in turn.
pub fn find_any_control<S: AsRef<str>>(
    parent: &UIElement,
    names: &[S],
    kind: Option<&ControlKind>,
) -> Option<(String, UIElement)> {
    names.iter().find_map(|name| {
        find_control(parent, name.as_ref(), kind, true).map(|c| (name.as_ref().to_string(), c))
    })
}

/// First descendant of the given kind, regardless of name.
pub fn first_of_kind(parent: &UIElement, kind: &ControlKind) -> Option<UIElement> {
    descendants(parent).find(|node| node.role() == *kind)
}
