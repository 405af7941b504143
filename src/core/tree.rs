use serde_json::{Map, Value};

/// Deepest element nesting the tree builder will follow.
pub const MAX_DEPTH: usize = 256;

/// Owned XML tree for one parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name, namespace prefix dropped.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build an owned element from a roxmltree element node.
    ///
    /// Comments and processing instructions are skipped. Returns `None` when
    /// the subtree nests deeper than [`MAX_DEPTH`].
    pub fn from_node(node: roxmltree::Node) -> Option<Self> {
        Self::from_node_at(node, 0)
    }

    fn from_node_at(node: roxmltree::Node, depth: usize) -> Option<Self> {
        if depth >= MAX_DEPTH {
            return None;
        }

        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();

        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(XmlNode::Element(Self::from_node_at(child, depth + 1)?));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    children.push(XmlNode::Text(text.to_string()));
                }
            }
        }

        Some(Self {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.name == name)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenation of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Render the element in the usual XML-to-object JSON shape.
    ///
    /// Child elements are grouped into arrays by name, attributes sit under
    /// `"$"` and text under `"_"`; whitespace-only text next to children or
    /// attributes is dropped. An element with text only collapses to that
    /// text, whitespace included.
    pub fn to_json(&self) -> Value {
        let text = self.text();
        let significant = !text.trim().is_empty();
        let has_elements = self.elements().next().is_some();

        if !has_elements && self.attributes.is_empty() {
            return Value::String(text);
        }

        let mut object = Map::new();
        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            object.insert("$".to_string(), Value::Object(attrs));
        }
        if significant {
            object.insert("_".to_string(), Value::String(text));
        }
        for element in self.elements() {
            let slot = object
                .entry(element.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(element.to_json());
            }
        }
        Value::Object(object)
    }
}
