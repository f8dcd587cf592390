//! Heuristic classification of function definitions.
//!
//! Every function definition in a file receives exactly one [`Label`]. The
//! heuristics combine naming conventions, class inheritance, and decorators,
//! because no single signal is reliable across the test frameworks observed
//! in the wild: bare functions, class-based suites, parametrized tests, and
//! property-based frameworks all look different. An assertion gate excludes
//! test-named helpers (fixtures, setup functions) that never assert anything.

use serde::{Deserialize, Serialize};

use crate::navigate::{FunctionRecord, Navigator};
use crate::tree::{BaseRef, Kind, NodeId, NodeKind, SyntaxTree};

/// Classification outcome for one function definition. Total and mutually
/// exclusive: there is no "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    NonTest,
    Unit,
    PropertyBased,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Label::NonTest => "non-test",
            Label::Unit => "unit",
            Label::PropertyBased => "property-based",
        };
        write!(f, "{}", s)
    }
}

/// One labeled function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledFunction {
    pub name: String,
    pub file: String,
    pub line: usize,
    pub label: Label,
}

/// All labeled functions of one file, or of several files merged together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileClassification {
    pub functions: Vec<LabeledFunction>,
}

impl FileClassification {
    /// Merge another classification into this one. Merging is associative
    /// and commutative with respect to every derived count.
    pub fn merge(&mut self, other: FileClassification) {
        self.functions.extend(other.functions);
    }

    pub fn count(&self, label: Label) -> usize {
        self.functions.iter().filter(|f| f.label == label).count()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Label every function definition in the file.
pub fn classify_file(nav: &Navigator) -> FileClassification {
    let file = nav.path().display().to_string();
    let functions = nav
        .find_all(Kind::FunctionDef)
        .into_iter()
        .filter_map(|func| nav.function_record(func))
        .map(|record| LabeledFunction {
            name: record.name.to_string(),
            file: file.clone(),
            line: record.line,
            label: label_function(nav, &record),
        })
        .collect();
    FileClassification { functions }
}

fn label_function(nav: &Navigator, record: &FunctionRecord<'_>) -> Label {
    if !is_test_candidate(nav, record) || !has_assertion(nav, record.id) {
        return Label::NonTest;
    }
    if uses_given_decorator(nav, record.id) {
        Label::PropertyBased
    } else {
        Label::Unit
    }
}

/// A class holds tests if it is named like a suite ("Test" prefix) or
/// inherits `TestCase` (bare or qualified), and does not define its own
/// `__init__` anywhere in its body.
fn is_test_bearing_class(nav: &Navigator, class_id: NodeId) -> bool {
    let NodeKind::ClassDef { name, bases } = nav.tree().kind(class_id) else {
        return false;
    };
    let suite_name = name.starts_with("Test");
    let inherits_testcase = bases.iter().any(|base| match base {
        BaseRef::Name(n) => n == "TestCase",
        BaseRef::Attribute(attr) => attr == "TestCase",
    });
    if !suite_name && !inherits_testcase {
        return false;
    }
    nav.find_all_under(Kind::FunctionDef, class_id)
        .into_iter()
        .all(|f| nav.tree().function_name(f) != Some("__init__"))
}

/// Module-level functions qualify by the "test" name prefix alone. Methods
/// qualify only under a test-bearing class, by name prefix or by a bare
/// `staticmethod`/`classmethods` decorator.
fn is_test_candidate(nav: &Navigator, record: &FunctionRecord<'_>) -> bool {
    if record.class_chain.is_empty() {
        return record.name.starts_with("test");
    }
    if !record
        .class_chain
        .iter()
        .any(|&class| is_test_bearing_class(nav, class))
    {
        return false;
    }
    if record.name.starts_with("test") {
        return true;
    }
    record.decorators.iter().any(|&dec| {
        matches!(
            decorator_expr_kind(nav.tree(), dec),
            Some(NodeKind::Name { id }) if id == "staticmethod" || id == "classmethods"
        )
    })
}

/// The assertion gate: a plain `assert` statement anywhere in the subtree,
/// or a call whose callee is an attribute named `assert*` (instance-style
/// assertions such as `self.assertEqual(...)`).
fn has_assertion(nav: &Navigator, func: NodeId) -> bool {
    if !nav.find_all_under(Kind::Assert, func).is_empty() {
        return true;
    }
    nav.find_all_under(Kind::Call, func).into_iter().any(|call| {
        matches!(
            nav.tree().call_callee(call).map(|c| nav.tree().kind(c)),
            Some(NodeKind::Attribute { attr }) if attr.starts_with("assert")
        )
    })
}

/// True if any function definition in the subtree (the function itself or a
/// nested closure) is decorated with a `given(...)` call, bare or qualified.
fn uses_given_decorator(nav: &Navigator, func: NodeId) -> bool {
    nav.find_all_under(Kind::FunctionDef, func)
        .into_iter()
        .any(|f| {
            nav.tree()
                .decorators(f)
                .into_iter()
                .any(|dec| is_given_call(nav.tree(), dec))
        })
}

fn is_given_call(tree: &SyntaxTree, dec: NodeId) -> bool {
    let Some(expr) = tree.decorator_expr(dec) else {
        return false;
    };
    if tree.kind(expr).tag() != Kind::Call {
        return false;
    }
    match tree.call_callee(expr).map(|callee| tree.kind(callee)) {
        Some(NodeKind::Name { id }) => id == "given",
        Some(NodeKind::Attribute { attr }) => attr == "given",
        _ => false,
    }
}

fn decorator_expr_kind<'a>(tree: &'a SyntaxTree, dec: NodeId) -> Option<&'a NodeKind> {
    tree.decorator_expr(dec).map(|expr| tree.kind(expr))
}
