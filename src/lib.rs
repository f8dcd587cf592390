//! Testcensus - test-suite census for source repositories.
//!
//! Testcensus parses a corpus of Python source files, classifies every
//! function definition as a non-test function, a unit test, or a
//! property-based test, and aggregates the counts (together with externally
//! supplied repository metrics) into one row per repository.
//!
//! # Architecture
//!
//! The pipeline is tree-sitter based, leaves first:
//!
//! - `tree`: typed syntax-tree data model (closed node-kind sum type)
//! - `builder`: tree-sitter parsing and lowering into the typed tree
//! - `navigate`: structural queries over one parsed file
//! - `classify`: the multi-signal function classifier
//! - `aggregate`: per-repository aggregation into metrics rows
//! - `driver`: sequential / parallel batch runs over many repositories
//! - `report`: CSV, JSON, and terminal output
//! - `cli`: command-line interface

pub mod aggregate;
pub mod builder;
pub mod classify;
pub mod cli;
pub mod driver;
pub mod navigate;
pub mod report;
pub mod tree;

pub use aggregate::{
    aggregate, collect_py_files, repo_dir_name, RepoCensus, RepoMetadata, RepoMetricsRow,
    SkippedFile,
};
pub use builder::{build, build_source, BuildError};
pub use classify::{classify_file, FileClassification, Label, LabeledFunction};
pub use driver::{load_tasks, Driver, RepoTask};
pub use navigate::{FunctionRecord, Navigator};
pub use tree::{BaseRef, Kind, Node, NodeId, NodeKind, SyntaxTree};
