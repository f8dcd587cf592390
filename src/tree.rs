//! Typed syntax-tree data model.
//!
//! A [`SyntaxTree`] is an immutable, arena-backed tree of typed nodes built
//! from one source file. Node kinds form a closed sum type so that every
//! traversal and classification site matches exhaustively; adding a kind is
//! a compile-time-checked change.

use std::fmt;

/// Index of a node within its owning [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A base-class reference recorded on a class definition.
///
/// `class T(TestCase)` yields `Name("TestCase")`; `class T(unittest.TestCase)`
/// yields `Attribute("TestCase")` (the final attribute only). Base expressions
/// outside these two shapes are not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRef {
    Name(String),
    Attribute(String),
}

/// What a node represents, with kind-specific fields.
///
/// Structural conventions:
/// - a `Call`'s first child is its callee expression, remaining children are
///   arguments;
/// - a `Decorator`'s first child is the decorated expression;
/// - a `FunctionDef`/`ClassDef` owns its `Decorator` nodes as leading
///   children, followed by parameter and body nodes;
/// - constructs outside these kinds are flattened during lowering: their
///   children attach to the nearest modeled ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Module,
    ClassDef { name: String, bases: Vec<BaseRef> },
    FunctionDef { name: String },
    Decorator,
    Call,
    Assert,
    Attribute { attr: String },
    Name { id: String },
}

impl NodeKind {
    /// The fieldless tag of this kind, used for `find_all` queries.
    pub fn tag(&self) -> Kind {
        match self {
            NodeKind::Module => Kind::Module,
            NodeKind::ClassDef { .. } => Kind::ClassDef,
            NodeKind::FunctionDef { .. } => Kind::FunctionDef,
            NodeKind::Decorator => Kind::Decorator,
            NodeKind::Call => Kind::Call,
            NodeKind::Assert => Kind::Assert,
            NodeKind::Attribute { .. } => Kind::Attribute,
            NodeKind::Name { .. } => Kind::Name,
        }
    }
}

/// Fieldless mirror of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Module,
    ClassDef,
    FunctionDef,
    Decorator,
    Call,
    Assert,
    Attribute,
    Name,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Module => "module",
            Kind::ClassDef => "class-definition",
            Kind::FunctionDef => "function-definition",
            Kind::Decorator => "decorator",
            Kind::Call => "call",
            Kind::Assert => "assert",
            Kind::Attribute => "attribute",
            Kind::Name => "name",
        };
        write!(f, "{}", s)
    }
}

/// One node of a [`SyntaxTree`].
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// 1-indexed source line of the construct.
    pub line: usize,
}

/// An arena-backed syntax tree for one source file.
///
/// The tree is rooted at a `Module` node; every non-root node has exactly one
/// parent, so ancestor walks always terminate at the root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    total_lines: usize,
}

impl SyntaxTree {
    pub(crate) fn new(total_lines: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            total_lines,
        };
        tree.push(NodeKind::Module, None, 1);
        tree
    }

    pub(crate) fn push(&mut self, kind: NodeKind, parent: Option<NodeId>, line: usize) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
            line,
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        id
    }

    /// The `Module` node the tree is rooted at.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Plain line count of the raw source text, blank and comment lines
    /// included.
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Name of a function definition, or `None` for any other kind.
    pub fn function_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::FunctionDef { name } => Some(name),
            _ => None,
        }
    }

    /// Decorator nodes attached to a function or class definition.
    pub fn decorators(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.kind(c).tag() == Kind::Decorator)
            .collect()
    }

    /// The expression a decorator applies, e.g. the `given(...)` call in
    /// `@given(...)`.
    pub fn decorator_expr(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Decorator => self.children(id).first().copied(),
            _ => None,
        }
    }

    /// The callee expression of a call node.
    pub fn call_callee(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Call => self.children(id).first().copied(),
            _ => None,
        }
    }
}
