//! Node types for the annotation tree.
//!
//! A document is a tree of [`Node`] values: container kinds own an ordered
//! sequence of children, leaf kinds carry a text value, and every node carries
//! an open [`Extras`] map that extensions write their contributions into.

use serde::{Deserialize, Serialize};

/// Open per-node metadata bag.
///
/// String-keyed JSON values, namespaced informally by extension id or feature
/// name (`frequency`, `difficulty`, `genderVariants`, ...). The type is
/// deliberately open: extensions are third-party and must be able to add keys
/// the core has never heard of. Hosts that want typed access to a known
/// namespace deserialize the sub-value with `serde_json::from_value`.
pub type Extras = serde_json::Map<String, serde_json::Value>;

/// Discriminant for [`Node`] variants.
///
/// Used for dispatch, requirement declarations (`required_nodes` /
/// `provided_nodes`), visit-pass selection, and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Paragraph,
    Sentence,
    Word,
    Clause,
    Phrase,
    Syllable,
    Text,
    Punctuation,
    Whitespace,
    Symbol,
    Character,
}

impl NodeKind {
    /// Stable lowercase name, identical to the serialized `type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Sentence => "sentence",
            NodeKind::Word => "word",
            NodeKind::Clause => "clause",
            NodeKind::Phrase => "phrase",
            NodeKind::Syllable => "syllable",
            NodeKind::Text => "text",
            NodeKind::Punctuation => "punctuation",
            NodeKind::Whitespace => "whitespace",
            NodeKind::Symbol => "symbol",
            NodeKind::Character => "character",
        }
    }

    /// Whether nodes of this kind own a child sequence.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Root
                | NodeKind::Paragraph
                | NodeKind::Sentence
                | NodeKind::Word
                | NodeKind::Clause
                | NodeKind::Phrase
                | NodeKind::Syllable
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of container nodes: an ordered child sequence plus extras.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
}

impl Branch {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            extras: Extras::new(),
        }
    }
}

/// Payload of leaf nodes: a text value plus extras.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Leaf {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
}

impl Leaf {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            extras: Extras::new(),
        }
    }
}

/// A node in the annotation tree.
///
/// Tagged union over a fixed set of kinds. Containers (`root`, `paragraph`,
/// `sentence`, `word`, `clause`, `phrase`, `syllable`) hold a [`Branch`];
/// leaves (`text`, `punctuation`, `whitespace`, `symbol`, `character`) hold a
/// [`Leaf`]. `clause`, `phrase`, `syllable` and `character` are introduced by
/// extension transforms, never by callers' initial segmentation.
///
/// Child ownership is exclusive: a node appears in at most one tree, and
/// subtrees are never shared. The serialized form is internally tagged:
///
/// ```json
/// {"type": "word", "children": [{"type": "text", "value": "perro"}]}
/// ```
///
/// # Example
///
/// ```rust
/// use annotree::{Node, NodeKind};
///
/// let doc = Node::root(vec![Node::sentence(vec![
///     Node::word("perro"),
///     Node::punctuation("."),
/// ])]);
/// assert_eq!(doc.kind(), NodeKind::Root);
/// assert_eq!(doc.text(), "perro.");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Root(Branch),
    Paragraph(Branch),
    Sentence(Branch),
    Word(Branch),
    Clause(Branch),
    Phrase(Branch),
    Syllable(Branch),
    Text(Leaf),
    Punctuation(Leaf),
    Whitespace(Leaf),
    Symbol(Leaf),
    Character(Leaf),
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root(Branch::new(children))
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(Branch::new(children))
    }

    pub fn sentence(children: Vec<Node>) -> Self {
        Node::Sentence(Branch::new(children))
    }

    /// A word wrapping a single text leaf with the given surface form.
    pub fn word(surface: impl Into<String>) -> Self {
        Node::Word(Branch::new(vec![Node::text_leaf(surface)]))
    }

    /// A word with explicit children (syllables, characters, mixed leaves).
    pub fn word_with_children(children: Vec<Node>) -> Self {
        Node::Word(Branch::new(children))
    }

    pub fn clause(children: Vec<Node>) -> Self {
        Node::Clause(Branch::new(children))
    }

    pub fn phrase(children: Vec<Node>) -> Self {
        Node::Phrase(Branch::new(children))
    }

    pub fn syllable(children: Vec<Node>) -> Self {
        Node::Syllable(Branch::new(children))
    }

    pub fn text_leaf(value: impl Into<String>) -> Self {
        Node::Text(Leaf::new(value))
    }

    pub fn punctuation(value: impl Into<String>) -> Self {
        Node::Punctuation(Leaf::new(value))
    }

    pub fn whitespace(value: impl Into<String>) -> Self {
        Node::Whitespace(Leaf::new(value))
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Node::Symbol(Leaf::new(value))
    }

    pub fn character(value: impl Into<String>) -> Self {
        Node::Character(Leaf::new(value))
    }

    /// Attach an extras entry, builder style.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras_mut().insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Root(_) => NodeKind::Root,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Sentence(_) => NodeKind::Sentence,
            Node::Word(_) => NodeKind::Word,
            Node::Clause(_) => NodeKind::Clause,
            Node::Phrase(_) => NodeKind::Phrase,
            Node::Syllable(_) => NodeKind::Syllable,
            Node::Text(_) => NodeKind::Text,
            Node::Punctuation(_) => NodeKind::Punctuation,
            Node::Whitespace(_) => NodeKind::Whitespace,
            Node::Symbol(_) => NodeKind::Symbol,
            Node::Character(_) => NodeKind::Character,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    /// Child sequence of a container node, `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root(b)
            | Node::Paragraph(b)
            | Node::Sentence(b)
            | Node::Word(b)
            | Node::Clause(b)
            | Node::Phrase(b)
            | Node::Syllable(b) => Some(&b.children),
            _ => None,
        }
    }

    /// Mutable child sequence of a container node, `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root(b)
            | Node::Paragraph(b)
            | Node::Sentence(b)
            | Node::Word(b)
            | Node::Clause(b)
            | Node::Phrase(b)
            | Node::Syllable(b) => Some(&mut b.children),
            _ => None,
        }
    }

    /// Text value of a leaf node, `None` for containers.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Text(l)
            | Node::Punctuation(l)
            | Node::Whitespace(l)
            | Node::Symbol(l)
            | Node::Character(l) => Some(&l.value),
            _ => None,
        }
    }

    pub fn extras(&self) -> &Extras {
        match self {
            Node::Root(b)
            | Node::Paragraph(b)
            | Node::Sentence(b)
            | Node::Word(b)
            | Node::Clause(b)
            | Node::Phrase(b)
            | Node::Syllable(b) => &b.extras,
            Node::Text(l)
            | Node::Punctuation(l)
            | Node::Whitespace(l)
            | Node::Symbol(l)
            | Node::Character(l) => &l.extras,
        }
    }

    pub fn extras_mut(&mut self) -> &mut Extras {
        match self {
            Node::Root(b)
            | Node::Paragraph(b)
            | Node::Sentence(b)
            | Node::Word(b)
            | Node::Clause(b)
            | Node::Phrase(b)
            | Node::Syllable(b) => &mut b.extras,
            Node::Text(l)
            | Node::Punctuation(l)
            | Node::Whitespace(l)
            | Node::Symbol(l)
            | Node::Character(l) => &mut l.extras,
        }
    }

    /// Concatenated leaf values of the whole subtree, in document order.
    pub fn text(&self) -> String {
        fn collect(node: &Node, out: &mut String) {
            if let Some(value) = node.value() {
                out.push_str(value);
            }
            if let Some(children) = node.children() {
                for child in children {
                    collect(child, out);
                }
            }
        }

        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}
