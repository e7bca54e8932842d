use weave_core::collections::map::HashMap;
use weave_core::{
    event_name, is_listener_prop, ElementKind, Handler, HostAdapter, HostError, HostId, PropValue,
    Props,
};

/// One primitive mutation observed by the [`MemoryHost`], in call order.
/// Handler and value payloads are asserted through node state instead, so
/// the log stays comparable with `==`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    Create { id: HostId, label: String },
    SetProperty { id: HostId, name: String },
    ClearProperty { id: HostId, name: String },
    AddListener { id: HostId, event: String },
    RemoveListener { id: HostId, event: String },
    AppendChild { parent: HostId, child: HostId },
    RemoveChild { parent: HostId, child: HostId },
}

pub struct MemoryNode {
    label: String,
    properties: HashMap<String, PropValue>,
    listeners: HashMap<String, Handler>,
    children: Vec<HostId>,
}

impl MemoryNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            properties: HashMap::new(),
            listeners: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    /// The `nodeValue` string of a text node.
    pub fn text(&self) -> Option<&str> {
        self.property(weave_core::TEXT_VALUE)
            .and_then(PropValue::as_text)
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn children(&self) -> &[HostId] {
        &self.children
    }
}

/// In-memory host tree that records every adapter call in an ordered op log.
///
/// Node ids are append-only slot indices; detached nodes keep their slot so
/// dangling references fail loudly rather than aliasing.
#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pre-existing container node to render into. Not logged:
    /// the container exists before the renderer gets involved.
    pub fn create_root(&mut self) -> HostId {
        let id = self.nodes.len();
        self.nodes.push(Some(MemoryNode::new("#root")));
        id
    }

    pub fn node(&self, id: HostId) -> &MemoryNode {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("memory host node {id} missing"))
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drains the op log, returning everything observed since the last call.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fires the listener registered for `event` on `id`, as a host event
    /// loop would. Returns whether a listener was attached.
    pub fn dispatch(&self, id: HostId, event: &str) -> bool {
        let handler = self.node(id).listeners.get(event).cloned();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn dump_tree(&self, root: Option<HostId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: HostId, depth: usize) {
        let indent = "  ".repeat(depth);
        if let Some(Some(node)) = self.nodes.get(id) {
            match node.text() {
                Some(text) => {
                    output.push_str(&format!("{}[{}] {} {:?}\n", indent, id, node.label, text))
                }
                None => output.push_str(&format!("{}[{}] {}\n", indent, id, node.label)),
            }
            for child_id in &node.children {
                self.dump_node(output, *child_id, depth + 1);
            }
        } else {
            output.push_str(&format!("{}[{}] (missing)\n", indent, id));
        }
    }

    fn node_mut(&mut self, id: HostId) -> Result<&mut MemoryNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(HostError::Missing { id })
    }
}

impl HostAdapter for MemoryHost {
    fn create_node(&mut self, kind: &ElementKind, props: &Props) -> Result<HostId, HostError> {
        let label = match kind {
            ElementKind::Host(tag) => tag.to_string(),
            ElementKind::Text => "#text".to_string(),
            ElementKind::Component(_) => {
                return Err(HostError::Unsupported {
                    kind: kind.label().to_string(),
                })
            }
        };
        let id = self.nodes.len();
        let mut node = MemoryNode::new(label.clone());
        for (name, value) in props.iter() {
            if is_listener_prop(name) {
                if let Some(handler) = value.as_handler() {
                    node.listeners
                        .insert(event_name(name), Handler::clone(handler));
                }
            } else {
                node.properties.insert(name.to_string(), value.clone());
            }
        }
        self.nodes.push(Some(node));
        self.ops.push(HostOp::Create { id, label });
        Ok(id)
    }

    fn set_property(&mut self, id: HostId, name: &str, value: &PropValue) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.properties.insert(name.to_string(), value.clone());
        self.ops.push(HostOp::SetProperty {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    fn clear_property(&mut self, id: HostId, name: &str) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.properties.remove(name);
        self.ops.push(HostOp::ClearProperty {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        id: HostId,
        event: &str,
        handler: &Handler,
    ) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.listeners
            .insert(event.to_string(), Handler::clone(handler));
        self.ops.push(HostOp::AddListener {
            id,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        id: HostId,
        event: &str,
        handler: &Handler,
    ) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        // Detach only the registration being named, like a host event API.
        let matches = node
            .listeners
            .get(event)
            .is_some_and(|current| std::rc::Rc::ptr_eq(current, handler));
        if matches {
            node.listeners.remove(event);
        }
        self.ops.push(HostOp::RemoveListener {
            id,
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError> {
        if self.nodes.get(child).and_then(Option::as_ref).is_none() {
            return Err(HostError::Missing { id: child });
        }
        let node = self.node_mut(parent)?;
        node.children.push(child);
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError> {
        let node = self.node_mut(parent)?;
        let position = node
            .children
            .iter()
            .position(|existing| *existing == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        node.children.remove(position);
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn create_applies_initial_props_and_listeners() {
        let mut host = MemoryHost::new();
        let mut props = Props::new();
        props.insert("title", "greeting");
        props.insert("onClick", PropValue::handler(|| {}));
        let id = host
            .create_node(&ElementKind::Host("div".into()), &props)
            .expect("create");
        let node = host.node(id);
        assert_eq!(node.label(), "div");
        assert_eq!(
            node.property("title").and_then(PropValue::as_text),
            Some("greeting")
        );
        assert!(node.has_listener("click"));
        assert_eq!(
            host.ops(),
            &[HostOp::Create {
                id,
                label: "div".into()
            }]
        );
    }

    #[test]
    fn dispatch_fires_the_registered_handler() {
        let mut host = MemoryHost::new();
        let fired = Rc::new(Cell::new(0));
        let observed = Rc::clone(&fired);
        let id = host
            .create_node(&ElementKind::Host("button".into()), &Props::new())
            .expect("create");
        host.add_listener(id, "click", &(Rc::new(move || observed.set(observed.get() + 1)) as Handler))
            .expect("add listener");
        assert!(host.dispatch(id, "click"));
        assert!(!host.dispatch(id, "change"));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn remove_child_rejects_non_children() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let id = host
            .create_node(&ElementKind::Host("div".into()), &Props::new())
            .expect("create");
        assert_eq!(
            host.remove_child(root, id),
            Err(HostError::NotAChild {
                parent: root,
                child: id
            })
        );
    }

    #[test]
    fn dump_tree_shows_structure_and_text() {
        let mut host = MemoryHost::new();
        let root = host.create_root();
        let div = host
            .create_node(&ElementKind::Host("div".into()), &Props::new())
            .expect("create");
        let mut text_props = Props::new();
        text_props.insert(weave_core::TEXT_VALUE, "hi");
        let text = host
            .create_node(&ElementKind::Text, &text_props)
            .expect("create");
        host.append_child(root, div).expect("append");
        host.append_child(div, text).expect("append");
        let dump = host.dump_tree(Some(root));
        assert!(dump.contains("#root"));
        assert!(dump.contains("div"));
        assert!(dump.contains("\"hi\""));
    }
}
