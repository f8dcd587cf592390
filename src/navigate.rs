//! Structural queries over one parsed source file.

use std::path::{Path, PathBuf};

use crate::builder::{self, BuildError};
use crate::tree::{Kind, NodeId, SyntaxTree};

/// Wraps one [`SyntaxTree`] and answers structural queries against it.
///
/// Navigators exist only for files that parsed successfully; callers filter
/// out build failures before querying.
#[derive(Debug)]
pub struct Navigator {
    tree: SyntaxTree,
    path: PathBuf,
}

impl Navigator {
    /// Parse `path` and wrap the resulting tree.
    pub fn build(path: &Path) -> Result<Self, BuildError> {
        Ok(Self {
            tree: builder::build(path)?,
            path: path.to_path_buf(),
        })
    }

    /// Parse source text directly; `path` is a label for reporting.
    pub fn from_source<P: AsRef<Path>>(path: P, text: &str) -> Result<Self, BuildError> {
        let path = path.as_ref();
        Ok(Self {
            tree: builder::build_source(path, text)?,
            path: path.to_path_buf(),
        })
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Plain line count of the underlying source text.
    pub fn total_lines(&self) -> usize {
        self.tree.total_lines()
    }

    /// All nodes of `kind` in the whole tree, in lexical order.
    pub fn find_all(&self, kind: Kind) -> Vec<NodeId> {
        self.find_all_under(kind, self.tree.root())
    }

    /// All nodes of `kind` reachable from `root`, in pre-order depth-first
    /// (lexical) order. `root` itself is included when it matches, and
    /// matches nested inside other matches are returned too.
    pub fn find_all_under(&self, kind: Kind, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.tree.kind(id).tag() == kind {
                out.push(id);
            }
            for &child in self.tree.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Ordered ancestor chain from the tree root to `node`: root first, the
    /// node itself included last.
    pub fn get_path_to(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.tree.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// A [`FunctionRecord`] view of a function-definition node.
    pub fn function_record(&self, func: NodeId) -> Option<FunctionRecord<'_>> {
        let name = self.tree.function_name(func)?;
        let class_chain = self
            .get_path_to(func)
            .into_iter()
            .filter(|&n| self.tree.kind(n).tag() == Kind::ClassDef)
            .collect();
        Some(FunctionRecord {
            id: func,
            name,
            line: self.tree.node(func).line,
            class_chain,
            decorators: self.tree.decorators(func),
        })
    }
}

/// Borrowed view of one function definition: its name, enclosing-class chain
/// (outermost first, empty for module-level functions), and decorator nodes.
#[derive(Debug)]
pub struct FunctionRecord<'a> {
    pub id: NodeId,
    pub name: &'a str,
    pub line: usize,
    pub class_chain: Vec<NodeId>,
    pub decorators: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn nav(source: &str) -> Navigator {
        Navigator::from_source("test.py", source).unwrap()
    }

    #[test]
    fn test_find_all_lexical_order_includes_nested() {
        let source = "\
def outer():
    def inner():
        pass
    return inner

class Holder:
    def method(self):
        pass

def last():
    pass
";
        let n = nav(source);
        let names: Vec<_> = n
            .find_all(Kind::FunctionDef)
            .into_iter()
            .map(|f| n.tree().function_name(f).unwrap().to_string())
            .collect();
        assert_eq!(names, ["outer", "inner", "method", "last"]);
    }

    #[test]
    fn test_find_all_under_includes_matching_root() {
        let n = nav("def outer():\n    def inner():\n        pass\n");
        let outer = n.find_all(Kind::FunctionDef)[0];
        let under = n.find_all_under(Kind::FunctionDef, outer);
        assert_eq!(under.len(), 2);
        assert_eq!(under[0], outer);
    }

    #[test]
    fn test_get_path_to_is_root_first_and_inclusive() {
        let n = nav("class Outer:\n    class Inner:\n        def f(self):\n            pass\n");
        let func = n.find_all(Kind::FunctionDef)[0];
        let path = n.get_path_to(func);

        assert_eq!(path.first().copied(), Some(n.tree().root()));
        assert_eq!(path.last().copied(), Some(func));
        let tags: Vec<_> = path.iter().map(|&id| n.tree().kind(id).tag()).collect();
        assert_eq!(
            tags,
            [Kind::Module, Kind::ClassDef, Kind::ClassDef, Kind::FunctionDef]
        );
    }

    #[test]
    fn test_function_record_class_chain() {
        let n = nav("class TestOuter:\n    def test_f(self):\n        assert True\n\ndef free():\n    pass\n");
        let funcs = n.find_all(Kind::FunctionDef);

        let method = n.function_record(funcs[0]).unwrap();
        assert_eq!(method.name, "test_f");
        assert_eq!(method.class_chain.len(), 1);
        let NodeKind::ClassDef { name, .. } = n.tree().kind(method.class_chain[0]) else {
            panic!("expected class in chain");
        };
        assert_eq!(name, "TestOuter");

        let free = n.function_record(funcs[1]).unwrap();
        assert_eq!(free.name, "free");
        assert!(free.class_chain.is_empty());
    }

    #[test]
    fn test_total_lines_matches_raw_text() {
        let n = nav("\n\nx = 1\n");
        assert_eq!(n.total_lines(), 3);
    }

    #[test]
    fn test_queries_are_deterministic() {
        let source = "def test_a():\n    assert 1\n\ndef test_b():\n    assert 2\n";
        let n = nav(source);
        assert_eq!(n.find_all(Kind::FunctionDef), n.find_all(Kind::FunctionDef));
        assert_eq!(n.find_all(Kind::Assert), n.find_all(Kind::Assert));
    }
}
