//! In-memory accessibility tree for driving the desktop layer without a real session.

use crate::config::{DiscoveryConfig, NavigationConfig};
use crate::element::{ControlKind, RangeValue, UIElement, UIElementImpl};
use crate::errors::AutomationError;
use crate::oracle::{Decision, DecisionOracle, DecisionRequest, UiActionType};
use crate::platforms::{AccessibilityEngine, MediaKey};
use crate::Desktop;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// State shared by the engine and every node it owns.
#[derive(Debug, Default)]
pub struct Shared {
    revealed: Mutex<HashSet<String>>,
    opened: Mutex<Vec<String>>,
    keys: Mutex<Vec<(MediaKey, u32)>>,
    clicks: Mutex<Vec<String>>,
}

/// Blueprint for a node; turned into a [`FakeNode`] by [`FakeEngineBuilder::build`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    name: Option<String>,
    kind: ControlKind,
    visible: bool,
    enabled: bool,
    toggle: Option<Option<bool>>,
    unreadable_toggle: bool,
    range: Option<RangeValue>,
    reveals: Option<String>,
    children: Vec<NodeSpec>,
}

pub fn node(kind: ControlKind, name: &str) -> NodeSpec {
    NodeSpec {
        name: Some(name.to_string()).filter(|n| !n.is_empty()),
        kind,
        visible: true,
        enabled: true,
        toggle: None,
        unreadable_toggle: false,
        range: None,
        reveals: None,
        children: Vec::new(),
    }
}

pub fn window(title: &str) -> NodeSpec {
    node(ControlKind::Window, title)
}

pub fn button(name: &str) -> NodeSpec {
    node(ControlKind::Button, name)
}

pub fn toggle(kind: ControlKind, name: &str, state: Option<bool>) -> NodeSpec {
    node(kind, name).state(state)
}

pub fn slider(name: &str, min: f64, max: f64, current: f64) -> NodeSpec {
    node(ControlKind::Slider, name).range(min, max, current)
}

impl NodeSpec {
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn state(mut self, state: Option<bool>) -> Self {
        self.toggle = Some(state);
        self
    }

    /// Toggle-kind node whose state read fails.
    pub fn unreadable(mut self) -> Self {
        self.unreadable_toggle = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64, current: f64) -> Self {
        self.range = Some(RangeValue { current, min, max });
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Clicking this node makes the hidden window `title` appear.
    pub fn reveals(mut self, title: &str) -> Self {
        self.reveals = Some(title.to_string());
        self
    }

    fn build(self, shared: &Arc<Shared>) -> Arc<FakeNode> {
        Arc::new(FakeNode {
            name: self.name,
            kind: self.kind,
            visible: self.visible,
            enabled: self.enabled,
            toggle: Mutex::new(self.toggle),
            unreadable_toggle: self.unreadable_toggle,
            range: Mutex::new(self.range),
            text: Mutex::new(None),
            reveals: self.reveals,
            clicks: AtomicUsize::new(0),
            children: self.children.into_iter().map(|c| c.build(shared)).collect(),
            shared: shared.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeNode {
    name: Option<String>,
    kind: ControlKind,
    visible: bool,
    enabled: bool,
    toggle: Mutex<Option<Option<bool>>>,
    unreadable_toggle: bool,
    range: Mutex<Option<RangeValue>>,
    text: Mutex<Option<String>>,
    reveals: Option<String>,
    clicks: AtomicUsize,
    children: Vec<Arc<FakeNode>>,
    shared: Arc<Shared>,
}

impl FakeNode {
    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn toggled(&self) -> Option<bool> {
        self.toggle.lock().unwrap().flatten()
    }

    pub fn position(&self) -> Option<f64> {
        self.range.lock().unwrap().map(|r| r.current)
    }

    pub fn text(&self) -> Option<String> {
        self.text.lock().unwrap().clone()
    }

    fn find(self: &Arc<Self>, name: &str) -> Option<Arc<FakeNode>> {
        if self.name.as_deref() == Some(name) {
            return Some(self.clone());
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

impl UIElementImpl for FakeNode {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn role(&self) -> ControlKind {
        self.kind.clone()
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .children
            .iter()
            .map(|c| UIElement::new(c.clone() as Arc<dyn UIElementImpl>))
            .collect())
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        Ok(self.visible)
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        Ok(self.enabled)
    }

    fn focus(&self) -> Result<(), AutomationError> {
        Ok(())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        self.shared
            .clicks
            .lock()
            .unwrap()
            .push(self.name.clone().unwrap_or_default());
        if let Some(state) = self.toggle.lock().unwrap().as_mut() {
            *state = Some(!state.unwrap_or(false));
        }
        if let Some(title) = &self.reveals {
            self.shared.revealed.lock().unwrap().insert(title.clone());
        }
        Ok(())
    }

    fn toggle_state(&self) -> Result<Option<bool>, AutomationError> {
        if self.unreadable_toggle {
            return Err(AutomationError::PlatformError("toggle pattern unavailable".into()));
        }
        self.toggle.lock().unwrap().ok_or_else(|| {
            AutomationError::UnsupportedOperation("not a toggle".to_string())
        })
    }

    fn range_value(&self) -> Result<Option<RangeValue>, AutomationError> {
        Ok(*self.range.lock().unwrap())
    }

    fn set_range_value(&self, value: f64) -> Result<(), AutomationError> {
        match self.range.lock().unwrap().as_mut() {
            Some(range) => {
                range.current = value;
                Ok(())
            }
            None => Err(AutomationError::UnsupportedOperation("not a range".to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        *self.text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

struct FakeWindow {
    root: Arc<FakeNode>,
    hidden: bool,
}

pub struct FakeEngine {
    windows: Vec<FakeWindow>,
    /// Windows that appear when a target is opened.
    on_open: HashMap<String, Vec<String>>,
    fail_keys: bool,
    shared: Arc<Shared>,
}

#[derive(Default)]
pub struct FakeEngineBuilder {
    windows: Vec<(NodeSpec, bool)>,
    on_open: HashMap<String, Vec<String>>,
    fail_keys: bool,
}

impl FakeEngineBuilder {
    pub fn window(mut self, tree: NodeSpec) -> Self {
        self.windows.push((tree, false));
        self
    }

    /// A window that only appears once revealed by a click or an open.
    pub fn hidden_window(mut self, tree: NodeSpec) -> Self {
        self.windows.push((tree, true));
        self
    }

    pub fn on_open(mut self, target: &str, title: &str) -> Self {
        self.on_open
            .entry(target.to_string())
            .or_default()
            .push(title.to_string());
        self
    }

    pub fn failing_media_keys(mut self) -> Self {
        self.fail_keys = true;
        self
    }

    pub fn build(self) -> Arc<FakeEngine> {
        let shared = Arc::new(Shared::default());
        let windows = self
            .windows
            .into_iter()
            .map(|(tree, hidden)| FakeWindow {
                root: tree.build(&shared),
                hidden,
            })
            .collect();
        Arc::new(FakeEngine {
            windows,
            on_open: self.on_open,
            fail_keys: self.fail_keys,
            shared,
        })
    }
}

impl FakeEngine {
    pub fn builder() -> FakeEngineBuilder {
        FakeEngineBuilder::default()
    }

    /// First node named `name` in any window, hidden or not.
    pub fn node(&self, name: &str) -> Arc<FakeNode> {
        self.windows
            .iter()
            .find_map(|w| w.root.find(name))
            .unwrap_or_else(|| panic!("no fake node named '{name}'"))
    }

    pub fn opened(&self) -> Vec<String> {
        self.shared.opened.lock().unwrap().clone()
    }

    pub fn media_keys(&self) -> Vec<(MediaKey, u32)> {
        self.shared.keys.lock().unwrap().clone()
    }

    /// Names of clicked nodes in click order.
    pub fn click_log(&self) -> Vec<String> {
        self.shared.clicks.lock().unwrap().clone()
    }
}

impl AccessibilityEngine for FakeEngine {
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        let revealed = self.shared.revealed.lock().unwrap();
        Ok(self
            .windows
            .iter()
            .filter(|w| {
                !w.hidden
                    || w.root
                        .name
                        .as_ref()
                        .is_some_and(|title| revealed.contains(title))
            })
            .map(|w| UIElement::new(w.root.clone() as Arc<dyn UIElementImpl>))
            .collect())
    }

    fn open(&self, target: &str) -> Result<(), AutomationError> {
        self.shared.opened.lock().unwrap().push(target.to_string());
        if let Some(titles) = self.on_open.get(target) {
            self.shared
                .revealed
                .lock()
                .unwrap()
                .extend(titles.iter().cloned());
        }
        Ok(())
    }

    fn press_media_key(&self, key: MediaKey, repeat: u32) -> Result<(), AutomationError> {
        if self.fail_keys {
            return Err(AutomationError::PlatformError("SendInput blocked".to_string()));
        }
        self.shared.keys.lock().unwrap().push((key, repeat));
        Ok(())
    }
}

pub fn desktop(engine: &Arc<FakeEngine>) -> Desktop {
    Desktop::with_engine(engine.clone(), DiscoveryConfig::immediate())
}

pub fn quick_navigation() -> NavigationConfig {
    NavigationConfig {
        max_attempts: 3,
        max_steps: 10,
        settle_delay_ms: 0,
        retry_delay_ms: 0,
    }
}

/// Oracle that replays canned decisions and records every request.
///
/// Once the script runs out it reports completion.
#[derive(Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<Decision, AutomationError>>>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedOracle {
    pub fn new(script: Vec<Result<Decision, AutomationError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<DecisionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision, AutomationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Decision::Complete { reasoning: None }))
    }
}

pub fn act(element_name: &str, action_type: UiActionType, value: Option<Value>) -> Decision {
    Decision::Act {
        element_name: element_name.to_string(),
        action_type,
        value,
        reasoning: None,
    }
}

pub fn not_found() -> Decision {
    Decision::NotFound {
        reasoning: Some("nothing relevant".to_string()),
    }
}
