use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context as _, anyhow};
use kuchiki::traits::TendrilSink as _;
use kuchiki::{ElementData, NodeDataRef, NodeRef};

type ChangeHandler = Rc<dyn Fn(&Element) -> anyhow::Result<()>>;

struct Binding {
    node: NodeRef,
    handler: ChangeHandler,
}

/// A parsed HTML page plus the change listeners attached to its elements.
///
/// Single-threaded like a browser document: listeners run synchronously inside
/// [`Document::click`] / [`Document::dispatch_change`].
pub struct Document {
    root: NodeRef,
    bindings: RefCell<Vec<Binding>>,
}

/// Handle to one element of a [`Document`].
#[derive(Clone)]
pub struct Element {
    node: NodeDataRef<ElementData>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
            bindings: RefCell::new(Vec::new()),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let html =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(Self::parse(&html))
    }

    /// The `<html>` element. html5ever synthesizes one for any input, so the
    /// error branch only guards documents built some other way.
    pub fn document_element(&self) -> anyhow::Result<Element> {
        let node = self
            .root
            .select_first("html")
            .map_err(|()| anyhow!("document has no root element"))?;
        Ok(Element { node })
    }

    pub fn root_attribute(&self, name: &str) -> Option<String> {
        self.document_element().ok()?.attribute(name)
    }

    pub fn set_root_attribute(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.document_element()?.set_attribute(name, value);
        Ok(())
    }

    pub fn remove_root_attribute(&self, name: &str) -> anyhow::Result<()> {
        self.document_element()?.remove_attribute(name);
        Ok(())
    }

    /// Every element matching `selector`, in document order, as of now.
    pub fn query_all(&self, selector: &str) -> anyhow::Result<Vec<Element>> {
        let nodes = self
            .root
            .select(selector)
            .map_err(|()| anyhow!("invalid selector {selector:?}"))?;
        Ok(nodes.map(|node| Element { node }).collect())
    }

    pub fn on_change<F>(&self, element: &Element, handler: F)
    where
        F: Fn(&Element) -> anyhow::Result<()> + 'static,
    {
        self.bindings.borrow_mut().push(Binding {
            node: element.as_node().clone(),
            handler: Rc::new(handler),
        });
    }

    /// Simulates a user click: a checkbox flips its checked state and then
    /// fires `change`. Clicks on anything else, or on a disabled checkbox,
    /// change nothing and fire nothing.
    pub fn click(&self, element: &Element) -> usize {
        if !element.is_checkbox() || element.is_disabled() {
            return 0;
        }
        element.set_checked(!element.is_checked());
        self.dispatch_change(element)
    }

    /// Runs every change listener bound to `element` and returns how many ran.
    ///
    /// A failing listener is logged and does not stop the others.
    pub fn dispatch_change(&self, element: &Element) -> usize {
        let handlers: Vec<ChangeHandler> = self
            .bindings
            .borrow()
            .iter()
            .filter(|b| Rc::ptr_eq(&b.node.0, &element.as_node().0))
            .map(|b| b.handler.clone())
            .collect();

        for handler in &handlers {
            if let Err(err) = handler(element) {
                let err = format!("{err:#}");
                tracing::error!(error = %err, "uncaught error in change listener");
            }
        }
        handlers.len()
    }

    /// Parses `html` and appends its top-level nodes to the first element
    /// matching `parent_selector`.
    pub fn append_html(&self, parent_selector: &str, html: &str) -> anyhow::Result<()> {
        let parent = self
            .root
            .select_first(parent_selector)
            .map_err(|()| anyhow!("no element matches {parent_selector:?}"))?;

        let fragment = kuchiki::parse_html().one(html);
        let body = fragment
            .select_first("body")
            .map_err(|()| anyhow!("fragment has no body"))?;
        let children: Vec<NodeRef> = body.as_node().children().collect();
        for child in children {
            parent.as_node().append(child);
        }
        Ok(())
    }

    pub fn to_html(&self) -> anyhow::Result<String> {
        let mut out = Vec::new();
        self.root.serialize(&mut out).context("serialize document")?;
        String::from_utf8(out).context("document html not utf-8")
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let html = self.to_html()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        std::fs::write(path, html).with_context(|| format!("write {}", path.display()))
    }
}

impl Element {
    fn as_node(&self) -> &NodeRef {
        self.node.as_node()
    }

    pub fn local_name(&self) -> String {
        self.node.name.local.to_string()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.node
            .attributes
            .borrow()
            .get(name)
            .map(|v| v.to_string())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.node
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.node.attributes.borrow_mut().remove(name);
    }

    /// Reads `data-{key}`.
    pub fn data(&self, key: &str) -> Option<String> {
        self.attribute(&format!("data-{key}"))
    }

    pub fn is_checkbox(&self) -> bool {
        self.local_name() == "input"
            && self
                .attribute("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("checkbox"))
    }

    pub fn is_disabled(&self) -> bool {
        self.node.attributes.borrow().contains("disabled")
    }

    pub fn is_checked(&self) -> bool {
        self.node.attributes.borrow().contains("checked")
    }

    /// Programmatic state change; fires no listeners.
    pub fn set_checked(&self, checked: bool) {
        if checked {
            self.set_attribute("checked", "");
        } else {
            self.remove_attribute("checked");
        }
    }
}
