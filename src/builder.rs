//! Builds typed syntax trees from Python source files.
//!
//! Parsing is a single tree-sitter pass followed by a lowering walk that maps
//! the concrete syntax tree onto the closed [`NodeKind`] set. A file that
//! fails to read or parse yields a [`BuildError`]; callers skip such files
//! and continue the batch.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Node as TsNode, Parser};

use crate::tree::{BaseRef, NodeId, NodeKind, SyntaxTree};

/// Why a file contributed no syntax tree.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error in {}", path.display())]
    Syntax { path: PathBuf },
    #[error("grammar incompatible with linked tree-sitter: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

/// Parse one file into a [`SyntaxTree`].
pub fn build(path: &Path) -> Result<SyntaxTree, BuildError> {
    let text = fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    build_source(path, &text)
}

/// Parse source text into a [`SyntaxTree`]. `path` is used for error
/// reporting only.
pub fn build_source(path: &Path, text: &str) -> Result<SyntaxTree, BuildError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;

    let ts_tree = parser.parse(text, None).ok_or_else(|| BuildError::Syntax {
        path: path.to_path_buf(),
    })?;

    // A tree containing ERROR or MISSING nodes contributes nothing; there is
    // no partial-parse recovery.
    let root = ts_tree.root_node();
    if root.has_error() {
        return Err(BuildError::Syntax {
            path: path.to_path_buf(),
        });
    }

    let mut lowering = Lowering {
        text,
        tree: SyntaxTree::new(text.lines().count()),
    };
    let module = lowering.tree.root();
    lowering.lower_children(root, module);
    Ok(lowering.tree)
}

struct Lowering<'a> {
    text: &'a str,
    tree: SyntaxTree,
}

impl<'a> Lowering<'a> {
    fn node_text(&self, node: TsNode<'_>) -> &'a str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId, ts: TsNode<'_>) -> NodeId {
        self.tree
            .push(kind, Some(parent), ts.start_position().row + 1)
    }

    fn lower(&mut self, ts: TsNode<'_>, parent: NodeId) {
        match ts.kind() {
            "function_definition" | "class_definition" => {
                let id = self.lower_definition(ts, parent);
                self.lower_definition_children(ts, id);
            }
            // The wrapper dissolves: decorators become leading children of
            // the inner definition node.
            "decorated_definition" => match ts.child_by_field_name("definition") {
                Some(def)
                    if matches!(def.kind(), "function_definition" | "class_definition") =>
                {
                    let id = self.lower_definition(def, parent);
                    let mut cursor = ts.walk();
                    for child in ts.named_children(&mut cursor) {
                        if child.kind() == "decorator" {
                            self.lower(child, id);
                        }
                    }
                    self.lower_definition_children(def, id);
                }
                _ => self.lower_children(ts, parent),
            },
            "decorator" => {
                let id = self.push(NodeKind::Decorator, parent, ts);
                self.lower_children(ts, id);
            }
            "call" => {
                let id = self.push(NodeKind::Call, parent, ts);
                if let Some(callee) = ts.child_by_field_name("function") {
                    self.lower(callee, id);
                }
                if let Some(args) = ts.child_by_field_name("arguments") {
                    self.lower_children(args, id);
                }
            }
            "assert_statement" => {
                let id = self.push(NodeKind::Assert, parent, ts);
                self.lower_children(ts, id);
            }
            "attribute" => {
                let attr = ts
                    .child_by_field_name("attribute")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default();
                let id = self.push(NodeKind::Attribute { attr }, parent, ts);
                if let Some(object) = ts.child_by_field_name("object") {
                    self.lower(object, id);
                }
            }
            "identifier" => {
                let id = self.node_text(ts).to_string();
                self.push(NodeKind::Name { id }, parent, ts);
            }
            // Everything else flattens: children attach to the nearest
            // modeled ancestor.
            _ => self.lower_children(ts, parent),
        }
    }

    fn lower_children(&mut self, ts: TsNode<'_>, parent: NodeId) {
        let mut cursor = ts.walk();
        for child in ts.named_children(&mut cursor) {
            self.lower(child, parent);
        }
    }

    fn lower_definition(&mut self, def: TsNode<'_>, parent: NodeId) -> NodeId {
        let name = def
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string())
            .unwrap_or_default();
        let kind = if def.kind() == "class_definition" {
            NodeKind::ClassDef {
                name,
                bases: self.class_bases(def),
            }
        } else {
            NodeKind::FunctionDef { name }
        };
        self.push(kind, parent, def)
    }

    /// Lowers a definition's children, skipping the name identifier and the
    /// superclass list (both captured as fields on the definition node).
    fn lower_definition_children(&mut self, def: TsNode<'_>, id: NodeId) {
        let name = def.child_by_field_name("name").map(|n| n.id());
        let supers = def.child_by_field_name("superclasses").map(|n| n.id());
        let mut cursor = def.walk();
        for child in def.named_children(&mut cursor) {
            if Some(child.id()) == name || Some(child.id()) == supers {
                continue;
            }
            self.lower(child, id);
        }
    }

    fn class_bases(&self, def: TsNode<'_>) -> Vec<BaseRef> {
        let Some(args) = def.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut bases = Vec::new();
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            match arg.kind() {
                "identifier" => bases.push(BaseRef::Name(self.node_text(arg).to_string())),
                "attribute" => {
                    if let Some(attr) = arg.child_by_field_name("attribute") {
                        bases.push(BaseRef::Attribute(self.node_text(attr).to_string()));
                    }
                }
                // keyword arguments (metaclass=...) and other expressions
                // are not base-class references
                _ => {}
            }
        }
        bases
    }
}
