use crate::debounce::Debouncer;
use crate::page::EditorField;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Opaque handle on a node of the host document
pub type NodeId = usize;

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// The live document of the host CMS, as far as the panel touches it
pub trait HostDocument: Send + Sync {
    /// Inline-editable node bound to `property`
    fn editable_node(&self, property: &str) -> Option<NodeId>;

    fn inner_html(&self, node: NodeId) -> Option<String>;

    fn set_inner_html(&self, node: NodeId, html: &str);
}

/// A rich-text editor instance attached to a host node
pub trait RichTextEditor: Send + Sync {
    fn set_data(&self, html: &str);
}

/// Rich-text editors the host has attached so far; the host attaches them
/// asynchronously, so a node may not have one yet
pub trait EditorRegistry: Send + Sync {
    fn find_editor_for(&self, node: NodeId) -> Option<Arc<dyn RichTextEditor>>;
}

/// Registry for hosts without rich-text editors
pub struct NoEditors;

impl EditorRegistry for NoEditors {
    fn find_editor_for(&self, _node: NodeId) -> Option<Arc<dyn RichTextEditor>> {
        None
    }
}

/// How a value reached the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Through the node's rich-text editor
    Editor,
    /// By replacing the node's markup
    Markup,
    /// The host has no editable node for the field
    Missing,
}

/// Carries edited values into the host document's editable nodes.
///
/// Writes are debounced per field, so a burst of keystrokes becomes a single write
/// and edits to different fields never cancel each other.
pub struct EditorFieldBridge {
    host: Arc<dyn HostDocument>,
    editors: Arc<dyn EditorRegistry>,
    pending: HashMap<EditorField, Debouncer>,
}

impl EditorFieldBridge {
    pub fn new(
        host: Arc<dyn HostDocument>,
        editors: Arc<dyn EditorRegistry>,
        write_delay: Duration,
    ) -> Self {
        let pending = EditorField::ALL
            .into_iter()
            .map(|field| (field, Debouncer::new(write_delay)))
            .collect();
        Self {
            host,
            editors,
            pending,
        }
    }

    /// Writes `value` into the node backing `field` right away
    pub fn write(&self, field: EditorField, value: &str) -> WriteOutcome {
        let property = field.host_property();
        let Some(node) = self.host.editable_node(property) else {
            ::log::warn!("Host document has no editable node for {}", property);
            return WriteOutcome::Missing;
        };

        if let Some(editor) = self.editors.find_editor_for(node) {
            editor.set_data(value);
            ::log::debug!("Updated {} through its rich-text editor", property);
            return WriteOutcome::Editor;
        }

        let current = self.host.inner_html(node).unwrap_or_default();
        self.host.set_inner_html(node, &rewrap(&current, value));
        ::log::debug!("Updated {} markup directly", property);
        WriteOutcome::Markup
    }

    /// Writes `value` once `field` has been idle for the write delay, then runs
    /// `after_write`. A newer value for the same field supersedes this one.
    pub fn schedule_write<F>(self: &Arc<Self>, field: EditorField, value: String, after_write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(debouncer) = self.pending.get(&field) else {
            return;
        };
        let bridge = Arc::clone(self);
        debouncer.schedule(async move {
            bridge.write(field, &value);
            after_write.await;
        });
    }

    /// Drops every write still waiting
    pub fn cancel_pending(&self) {
        for debouncer in self.pending.values() {
            debouncer.cancel();
        }
    }
}

/// New inner markup for a node currently holding `current`.
///
/// A node whose only child is an element keeps that element and gets `value` inside
/// it; the host's inline-editing markers live on such wrappers.
pub fn rewrap(current: &str, value: &str) -> String {
    let fragment = Html::parse_fragment(current);
    let mut children = fragment.root_element().children();
    let only_child = match (children.next(), children.next()) {
        (Some(child), None) => ElementRef::wrap(child),
        _ => None,
    };

    match only_child {
        Some(wrapper) if !VOID_ELEMENTS.contains(&wrapper.value().name()) => {
            let element = wrapper.value();
            let mut open = format!("<{}", element.name());
            for (name, attr) in element.attrs() {
                open.push_str(&format!(" {}=\"{}\"", name, escape_attr(attr)));
            }
            format!("{}>{}</{}>", open, value, element.name())
        }
        _ => value.to_string(),
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Host document held in memory, for hosts that hand the panel plain markup
#[derive(Default)]
pub struct MemoryDocument {
    properties: HashMap<String, NodeId>,
    nodes: Mutex<Vec<String>>,
    writes: Mutex<usize>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an editable node for `property` holding `inner_html`
    pub fn with_property(mut self, property: &str, inner_html: &str) -> Self {
        let nodes = self.nodes.get_mut().unwrap_or_else(|e| e.into_inner());
        nodes.push(inner_html.to_string());
        self.properties.insert(property.to_string(), nodes.len() - 1);
        self
    }

    /// Current markup of the node bound to `property`
    pub fn property_html(&self, property: &str) -> Option<String> {
        let node = *self.properties.get(property)?;
        self.inner_html(node)
    }

    /// Number of markup replacements so far
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostDocument for MemoryDocument {
    fn editable_node(&self, property: &str) -> Option<NodeId> {
        self.properties.get(property).copied()
    }

    fn inner_html(&self, node: NodeId) -> Option<String> {
        let nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner());
        nodes.get(node).cloned()
    }

    fn set_inner_html(&self, node: NodeId, html: &str) {
        let mut nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = nodes.get_mut(node) {
            *slot = html.to_string();
            *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        }
    }
}

/// Registry the host fills as its editors come up
#[derive(Default)]
pub struct MemoryEditorRegistry {
    editors: Mutex<HashMap<NodeId, Arc<dyn RichTextEditor>>>,
}

impl MemoryEditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node: NodeId, editor: Arc<dyn RichTextEditor>) {
        let mut editors = self.editors.lock().unwrap_or_else(|e| e.into_inner());
        editors.insert(node, editor);
    }
}

impl EditorRegistry for MemoryEditorRegistry {
    fn find_editor_for(&self, node: NodeId) -> Option<Arc<dyn RichTextEditor>> {
        let editors = self.editors.lock().unwrap_or_else(|e| e.into_inner());
        editors.get(&node).cloned()
    }
}
