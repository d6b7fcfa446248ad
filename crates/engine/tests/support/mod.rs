//! In-memory page used by the engine integration tests
//!
//! Nodes declare the exact selector strings they answer to, so queries never
//! need a CSS engine. Scripts are recognized by name. Overlay options are only
//! visible between a click on an overlay trigger and an Escape.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use fieldcheck_engine::selectors;
use fieldcheck_engine::{DriverError, DriverResult, ElementHandle, KeyInput, PageDriver, Script, ScriptArg};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click(ElementHandle),
    ScriptClick(ElementHandle),
    Keys(ElementHandle, Vec<KeyInput>),
    Clear(ElementHandle),
    Script(String, Option<ElementHandle>),
}

#[derive(Debug, Default)]
struct Node {
    parent: Option<ElementHandle>,
    selectors: Vec<String>,
    text: VecDeque<String>,
    attrs: HashMap<String, String>,
    selected: bool,
    click_fails: bool,
    keys_fail: bool,
    clear_fails: bool,
    in_overlay: bool,
    opens_overlay: bool,
}

#[derive(Debug)]
struct Registered {
    container: ElementHandle,
    hidden_polls: usize,
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<(ElementHandle, Node)>,
    fields: HashMap<String, Registered>,
    dom_ids: HashMap<String, ElementHandle>,
    readonly: HashMap<ElementHandle, Value>,
    options: VecDeque<Vec<String>>,
    overlay_open: bool,
    on_blur: HashMap<ElementHandle, (ElementHandle, String, String)>,
    actions: Vec<Action>,
    fresh_calls: usize,
    collect_calls: usize,
}

impl State {
    fn node(&self, el: &ElementHandle) -> DriverResult<&Node> {
        self.nodes
            .iter()
            .find(|(h, _)| h == el)
            .map(|(_, n)| n)
            .ok_or_else(|| DriverError::StaleElement(el.to_string()))
    }

    fn node_mut(&mut self, el: &ElementHandle) -> DriverResult<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|(h, _)| h == el)
            .map(|(_, n)| n)
            .ok_or_else(|| DriverError::StaleElement(el.to_string()))
    }

    fn is_below(&self, el: &ElementHandle, scope: &ElementHandle) -> bool {
        let mut current = self.node(el).ok().and_then(|n| n.parent.clone());
        while let Some(parent) = current {
            if &parent == scope {
                return true;
            }
            current = self.node(&parent).ok().and_then(|n| n.parent.clone());
        }
        false
    }

    fn apply_click(&mut self, el: &ElementHandle) -> DriverResult<()> {
        let node = self.node_mut(el)?;
        if node.selectors.iter().any(|s| s == selectors::CHECKBOX_CONTROL) {
            node.selected = !node.selected;
        }
        let opens_overlay = node.opens_overlay;
        if opens_overlay {
            self.overlay_open = true;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakePage {
    state: Arc<Mutex<State>>,
}

impl FakePage {
    pub fn new() -> Self {
        let page = Self::default();
        page.add(None, &[selectors::BODY]);
        page
    }

    /// A page with no `body` element.
    pub fn bare() -> Self {
        Self::default()
    }

    pub fn body(&self) -> Option<ElementHandle> {
        self.state
            .lock()
            .nodes
            .iter()
            .find(|(_, n)| n.selectors.iter().any(|s| s == selectors::BODY))
            .map(|(h, _)| h.clone())
    }

    pub fn add(&self, parent: Option<&ElementHandle>, selectors: &[&str]) -> ElementHandle {
        let mut state = self.state.lock();
        let handle = ElementHandle::new(format!("el-{}", state.nodes.len()));
        state.nodes.push((
            handle.clone(),
            Node {
                parent: parent.cloned(),
                selectors: selectors.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        ));
        handle
    }

    /// A field host registered under `id`, resolvable through `field_fresh`.
    pub fn field(&self, id: &str) -> ElementHandle {
        let host = self.add(None, &[selectors::FIELD_HOSTS[0]]);
        self.set_attr(&host, selectors::FIELD_ID_ATTR, id);
        self.state.lock().fields.insert(
            id.to_string(),
            Registered {
                container: host.clone(),
                hidden_polls: 0,
            },
        );
        host
    }

    /// An option row rendered inside the overlay panel.
    pub fn option(&self, text: &str) -> ElementHandle {
        let option = self.add(None, &[selectors::VISIBLE_OPTION]);
        self.set_text(&option, &[text]);
        self.state.lock().node_mut(&option).map(|n| n.in_overlay = true).ok();
        option
    }

    /// The visible option panel; rendered only while the overlay is open.
    pub fn panel(&self) -> ElementHandle {
        let panel = self.add(None, &[selectors::VISIBLE_PANEL]);
        self.state.lock().node_mut(&panel).map(|n| n.in_overlay = true).ok();
        panel
    }

    pub fn set_attr(&self, el: &ElementHandle, name: &str, value: &str) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Rendered text per read; the last entry sticks.
    pub fn set_text(&self, el: &ElementHandle, reads: &[&str]) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.text = reads.iter().map(|s| s.to_string()).collect();
        }
    }

    pub fn set_dom_id(&self, el: &ElementHandle, id: &str) {
        self.state.lock().dom_ids.insert(id.to_string(), el.clone());
    }

    pub fn set_selected(&self, el: &ElementHandle, selected: bool) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.selected = selected;
        }
    }

    pub fn fail_clicks(&self, el: &ElementHandle) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.click_fails = true;
        }
    }

    pub fn fail_keys(&self, el: &ElementHandle) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.keys_fail = true;
        }
    }

    pub fn fail_clear(&self, el: &ElementHandle) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.clear_fails = true;
        }
    }

    pub fn opens_overlay(&self, el: &ElementHandle) {
        if let Ok(node) = self.state.lock().node_mut(el) {
            node.opens_overlay = true;
        }
    }

    /// Payload returned by the readonly-signal script for `container`.
    pub fn set_readonly_state(&self, container: &ElementHandle, state: Value) {
        self.state.lock().readonly.insert(container.clone(), state);
    }

    /// Successive option-collection results; the last one repeats.
    pub fn set_option_reads(&self, reads: &[&[&str]]) {
        self.state.lock().options = reads
            .iter()
            .map(|read| read.iter().map(|s| s.to_string()).collect())
            .collect();
    }

    /// `field_fresh(id)` answers `None` for the next `polls` calls.
    pub fn hide_field_for(&self, id: &str, polls: usize) {
        if let Some(entry) = self.state.lock().fields.get_mut(id) {
            entry.hidden_polls = polls;
        }
    }

    /// Blurring `control` sets `attr` on `target`.
    pub fn on_blur(&self, control: &ElementHandle, target: &ElementHandle, attr: &str, value: &str) {
        self.state
            .lock()
            .on_blur
            .insert(control.clone(), (target.clone(), attr.to_string(), value.to_string()));
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    /// Direct plus scripted clicks that reached `el`
    pub fn clicks_on(&self, el: &ElementHandle) -> usize {
        self.state
            .lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Click(h) | Action::ScriptClick(h) if h == el))
            .count()
    }

    pub fn scripts_run(&self, name: &str) -> usize {
        self.state
            .lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Script(n, _) if n == name))
            .count()
    }

    /// Key batches sent to `el` that contained `key`
    pub fn keys_sent(&self, el: &ElementHandle, key: &KeyInput) -> usize {
        self.state
            .lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Keys(h, keys) if h == el && keys.contains(key)))
            .count()
    }

    pub fn attr(&self, el: &ElementHandle, name: &str) -> Option<String> {
        self.state.lock().node(el).ok().and_then(|n| n.attrs.get(name).cloned())
    }

    pub fn is_checked(&self, el: &ElementHandle) -> bool {
        self.state.lock().node(el).map(|n| n.selected).unwrap_or(false)
    }

    pub fn overlay_open(&self) -> bool {
        self.state.lock().overlay_open
    }

    pub fn fresh_calls(&self) -> usize {
        self.state.lock().fresh_calls
    }

    pub fn collect_calls(&self) -> usize {
        self.state.lock().collect_calls
    }

    pub fn driver(&self) -> Arc<dyn PageDriver> {
        Arc::new(self.clone())
    }
}

fn element_arg(args: &[ScriptArg], index: usize) -> Option<ElementHandle> {
    match args.get(index) {
        Some(ScriptArg::Element(el)) => Some(el.clone()),
        _ => None,
    }
}

fn text_arg(args: &[ScriptArg], index: usize) -> Option<String> {
    match args.get(index) {
        Some(ScriptArg::Text(text)) => Some(text.clone()),
        _ => None,
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn field_fresh(&self, field_id: &str) -> DriverResult<Option<ElementHandle>> {
        let mut state = self.state.lock();
        state.fresh_calls += 1;
        let Some(entry) = state.fields.get_mut(field_id) else {
            return Ok(None);
        };
        if entry.hidden_polls > 0 {
            entry.hidden_polls -= 1;
            return Ok(None);
        }
        Ok(Some(entry.container.clone()))
    }

    async fn find_all(&self, scope: Option<&ElementHandle>, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let state = self.state.lock();
        Ok(state
            .nodes
            .iter()
            .filter(|(_, n)| n.selectors.iter().any(|s| s == selector))
            .filter(|(_, n)| !n.in_overlay || state.overlay_open)
            .filter(|(h, _)| scope.map_or(true, |scope| state.is_below(h, scope)))
            .map(|(h, _)| h.clone())
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> DriverResult<Option<ElementHandle>> {
        Ok(self.state.lock().dom_ids.get(id).cloned())
    }

    async fn text(&self, el: &ElementHandle) -> DriverResult<String> {
        let mut state = self.state.lock();
        let node = state.node_mut(el)?;
        let text = if node.text.len() > 1 {
            node.text.pop_front()
        } else {
            node.text.front().cloned()
        };
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, el: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        Ok(self.state.lock().node(el)?.attrs.get(name).cloned())
    }

    async fn is_selected(&self, el: &ElementHandle) -> DriverResult<bool> {
        Ok(self.state.lock().node(el)?.selected)
    }

    async fn click(&self, el: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state.lock();
        if state.node(el)?.click_fails {
            return Err(DriverError::NotInteractable(el.to_string()));
        }
        state.apply_click(el)?;
        state.actions.push(Action::Click(el.clone()));
        Ok(())
    }

    async fn send_keys(&self, el: &ElementHandle, keys: &[KeyInput]) -> DriverResult<()> {
        let mut state = self.state.lock();
        let node = state.node_mut(el)?;
        if node.keys_fail {
            return Err(DriverError::NotInteractable(el.to_string()));
        }
        for key in keys {
            match key {
                KeyInput::Delete => {
                    node.attrs.insert("value".to_string(), String::new());
                }
                KeyInput::Text(text) => {
                    let value = node.attrs.entry("value".to_string()).or_default();
                    value.push_str(text);
                }
                _ => {}
            }
        }
        if keys.contains(&KeyInput::Escape) {
            state.overlay_open = false;
        }
        state.actions.push(Action::Keys(el.clone(), keys.to_vec()));
        Ok(())
    }

    async fn clear(&self, el: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state.lock();
        let node = state.node_mut(el)?;
        if node.clear_fails {
            return Err(DriverError::NotInteractable(el.to_string()));
        }
        node.attrs.insert("value".to_string(), String::new());
        state.actions.push(Action::Clear(el.clone()));
        Ok(())
    }

    async fn execute(&self, script: &Script, args: &[ScriptArg]) -> DriverResult<Value> {
        let mut state = self.state.lock();
        let target = element_arg(args, 0);
        state.actions.push(Action::Script(script.name.to_string(), target.clone()));
        let result = match script.name {
            "readonly_signals" => target
                .and_then(|el| state.readonly.get(&el).cloned())
                .unwrap_or_else(|| json!({})),
            "click" => {
                let el = target.ok_or_else(|| DriverError::Other("click without element".into()))?;
                state.apply_click(&el)?;
                state.actions.push(Action::ScriptClick(el));
                Value::Null
            }
            "assign_value" => {
                let el = target.ok_or_else(|| DriverError::Other("assign without element".into()))?;
                let value = text_arg(args, 1).unwrap_or_default();
                state.node_mut(&el)?.attrs.insert("value".to_string(), value);
                Value::Null
            }
            "blur" | "change_and_blur" => {
                if let Some(el) = target {
                    if let Some((node, attr, value)) = state.on_blur.get(&el).cloned() {
                        state.node_mut(&node)?.attrs.insert(attr, value);
                    }
                }
                Value::Null
            }
            "outer_html" => {
                let el = target.ok_or_else(|| DriverError::Other("outer_html without element".into()))?;
                json!(format!("<crt-input id=\"{}\">\n  <div class=\"empty\"></div>\n</crt-input>", el))
            }
            "collect_options" => {
                state.collect_calls += 1;
                let read = if state.options.len() > 1 {
                    state.options.pop_front()
                } else {
                    state.options.front().cloned()
                };
                match read {
                    Some(options) if state.overlay_open => json!(options),
                    _ => json!([]),
                }
            }
            "overlay_html" => json!("<div class=\"cdk-overlay-pane\"></div>"),
            _ => Value::Null,
        };
        Ok(result)
    }
}
