//! DOM tree data structures.

mod style;

pub use style::CascadedValue;
pub use style::ComputedStyle;
pub use style::ResolvedStyle;
pub use style::Specificity;
pub use style::StyleValue;

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The document node always occupies the first arena slot.
    pub const DOCUMENT: Self = Self(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Name/value pair of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag_name: String,
    pub attributes: Vec<Attribute>,
    pub computed_style: ComputedStyle,
    pub style: ResolvedStyle,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes,
            computed_style: ComputedStyle::default(),
            style: ResolvedStyle::default(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn class(&self) -> Option<&str> {
        self.attribute("class")
    }

    /// Re-derives `style` from `computed_style`.
    pub fn refresh_style(&mut self) {
        self.style = self.computed_style.resolve();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// Arena slot. `parent` is a plain index; children are owned by position in
/// the arena and listed in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// Arena-backed document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Text(content) => Some(content.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Direct children that are elements, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub fn append_element(&mut self, parent: NodeId, element: ElementData) -> NodeId {
        self.append(parent, NodeData::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        self.append(parent, NodeData::Text(content.to_owned()))
    }

    /// Appends to an existing text node; other node kinds are left untouched.
    pub fn push_text(&mut self, text_node: NodeId, ch: char) {
        if let Some(Node {
            data: NodeData::Text(content),
            ..
        }) = self.nodes.get_mut(text_node.0)
        {
            content.push(ch);
        }
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });

        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }

        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn text_bytes(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match &node.data {
                NodeData::Text(content) => content.len(),
                _ => 0,
            })
            .sum()
    }

    /// `id` and everything below it, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if self.node(current).is_none() {
                continue;
            }
            out.push(current);
            pending.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag(&self, tag_name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .is_some_and(|element| element.tag_name.eq_ignore_ascii_case(tag_name))
            })
            .collect()
    }

    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.element(*id).and_then(ElementData::id) == Some(id_value))
    }

    /// Whitespace-collapsed text of the first `<title>` element.
    pub fn title(&self) -> String {
        let Some(title) = self.elements_by_tag("title").into_iter().next() else {
            return String::new();
        };

        let raw: String = self
            .children(title)
            .iter()
            .filter_map(|child| self.text(*child))
            .collect();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
