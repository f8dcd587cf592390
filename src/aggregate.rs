//! Per-repository aggregation of classification results.
//!
//! One repository checkout in, one metrics row out. Files that fail to parse
//! are excluded from every count and reported back to the caller; a
//! repository with zero parseable files still yields a valid all-zero row.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::classify::{classify_file, FileClassification, Label};
use crate::navigate::Navigator;

/// Externally supplied per-repository record, one JSONL line per repository.
/// Commit and bug counts arrive later in the pipeline and are carried through
/// verbatim when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub repo_id: String,
    #[serde(rename = "#fuzz_target", default)]
    pub fuzz_targets: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<u64>,
}

/// One output row per repository. Field names mirror the tabular output
/// columns; `#proptery_based` is accepted on input as a historical alias of
/// `#property_based`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetricsRow {
    pub repo_id: String,
    #[serde(rename = "#files")]
    pub files: usize,
    #[serde(rename = "#lines")]
    pub lines: usize,
    #[serde(rename = "#funcs")]
    pub funcs: usize,
    #[serde(rename = "#unit")]
    pub unit: usize,
    #[serde(rename = "#property_based", alias = "#proptery_based")]
    pub property_based: usize,
    #[serde(rename = "#fuzz_target")]
    pub fuzz_targets: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<u64>,
}

/// A file excluded from the census, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregation result: the metrics row plus the files that contributed
/// nothing.
#[derive(Debug, Clone)]
pub struct RepoCensus {
    pub row: RepoMetricsRow,
    pub skipped: Vec<SkippedFile>,
}

/// Maps a `owner/name` repository id to its on-disk checkout directory name
/// `owner+name`.
pub fn repo_dir_name(repo_id: &str) -> String {
    repo_id.replace('/', "+")
}

/// All `.py` files under `root`, recursively, sorted for determinism.
pub fn collect_py_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("py"))
        .collect();
    files.sort();
    files
}

/// Classify every parseable source file under `repo_root` and fold the
/// results into one metrics row. Label merging is a plain concatenation, so
/// the final counts do not depend on file order.
pub fn aggregate(repo_root: &Path, metadata: &RepoMetadata) -> RepoCensus {
    let mut merged = FileClassification::default();
    let mut files = 0usize;
    let mut lines = 0usize;
    let mut skipped = Vec::new();

    for path in collect_py_files(repo_root) {
        match Navigator::build(&path) {
            Ok(nav) => {
                files += 1;
                lines += nav.total_lines();
                merged.merge(classify_file(&nav));
            }
            Err(err) => skipped.push(SkippedFile {
                path,
                reason: err.to_string(),
            }),
        }
    }

    let row = RepoMetricsRow {
        repo_id: metadata.repo_id.clone(),
        files,
        lines,
        funcs: merged.count(Label::NonTest),
        unit: merged.count(Label::Unit),
        property_based: merged.count(Label::PropertyBased),
        fuzz_targets: metadata.fuzz_targets,
        commits: metadata.commits,
        bugs: metadata.bugs,
    };
    RepoCensus { row, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn meta(repo_id: &str) -> RepoMetadata {
        RepoMetadata {
            repo_id: repo_id.to_string(),
            fuzz_targets: 4,
            commits: None,
            bugs: None,
        }
    }

    #[test]
    fn test_repo_dir_name() {
        assert_eq!(repo_dir_name("numpy/numpy"), "numpy+numpy");
        assert_eq!(repo_dir_name("flat"), "flat");
    }

    #[test]
    fn test_end_to_end_example() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("a.py"),
            "def test_add():\n    assert 1 + 1 == 2\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("b.py"),
            "class TestMath(unittest.TestCase):\n    def test_sub(self):\n        self.assertEqual(2 - 1, 1)\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("c.py"),
            "def helper_one():\n    return 1\n\ndef helper_two():\n    return 2\n",
        )
        .unwrap();

        let census = aggregate(temp.path(), &meta("acme/widgets"));
        assert!(census.skipped.is_empty());
        assert_eq!(census.row.files, 3);
        assert_eq!(census.row.funcs, 2);
        assert_eq!(census.row.unit, 2);
        assert_eq!(census.row.property_based, 0);
        assert_eq!(census.row.fuzz_targets, 4);
    }

    #[test]
    fn test_parse_failure_isolation() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("good.py"),
            "def test_ok():\n    assert True\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("also_good.py"),
            "x = 1\ny = 2\n",
        )
        .unwrap();
        fs::write(temp.path().join("broken.py"), "def broken(:\n").unwrap();

        let census = aggregate(temp.path(), &meta("acme/widgets"));
        assert_eq!(census.skipped.len(), 1);
        assert!(census.skipped[0].path.ends_with("broken.py"));
        assert_eq!(census.row.files, 2);
        assert_eq!(census.row.lines, 4);
        assert_eq!(census.row.unit, 1);
    }

    #[test]
    fn test_line_count_additivity() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n\n# done\n").unwrap();
        fs::write(temp.path().join("b.py"), "y = 2\n").unwrap();

        let census = aggregate(temp.path(), &meta("acme/widgets"));
        assert_eq!(census.row.lines, 4);
    }

    #[test]
    fn test_empty_repo_yields_zero_row() {
        let temp = TempDir::new().unwrap();
        let census = aggregate(temp.path(), &meta("acme/empty"));
        assert!(census.skipped.is_empty());
        assert_eq!(census.row.files, 0);
        assert_eq!(census.row.lines, 0);
        assert_eq!(census.row.funcs, 0);
        assert_eq!(census.row.unit, 0);
        assert_eq!(census.row.property_based, 0);
        assert_eq!(census.row.fuzz_targets, 4);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let sources = [
            "def test_a():\n    assert 1\n",
            "def helper():\n    pass\n",
            "@given(st.text())\ndef test_p(s):\n    assert s == s\n",
        ];
        let classifications: Vec<FileClassification> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| {
                let nav = Navigator::from_source(format!("f{}.py", i), src).unwrap();
                classify_file(&nav)
            })
            .collect();

        // [A, B] + [C] vs [A] + [B, C]
        let mut left = FileClassification::default();
        left.merge(classifications[0].clone());
        left.merge(classifications[1].clone());
        left.merge(classifications[2].clone());

        let mut right_tail = FileClassification::default();
        right_tail.merge(classifications[1].clone());
        right_tail.merge(classifications[2].clone());
        let mut right = classifications[0].clone();
        right.merge(right_tail);

        for label in [Label::NonTest, Label::Unit, Label::PropertyBased] {
            assert_eq!(left.count(label), right.count(label));
        }
    }

    #[test]
    fn test_subdirectories_are_walked() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg").join("tests");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("test_deep.py"),
            "def test_deep():\n    assert True\n",
        )
        .unwrap();
        fs::write(temp.path().join("README.md"), "not python").unwrap();

        let census = aggregate(temp.path(), &meta("acme/nested"));
        assert_eq!(census.row.files, 1);
        assert_eq!(census.row.unit, 1);
    }

    #[test]
    fn test_metadata_counts_copied_verbatim() {
        let temp = TempDir::new().unwrap();
        let metadata = RepoMetadata {
            repo_id: "acme/widgets".to_string(),
            fuzz_targets: 7,
            commits: Some(123),
            bugs: Some(9),
        };
        let census = aggregate(temp.path(), &metadata);
        assert_eq!(census.row.fuzz_targets, 7);
        assert_eq!(census.row.commits, Some(123));
        assert_eq!(census.row.bugs, Some(9));
    }

    #[test]
    fn test_metadata_jsonl_field_names() {
        let record = r##"{"repo_id": "acme/widgets", "#fuzz_target": 3}"##;
        let metadata: RepoMetadata = serde_json::from_str(record).unwrap();
        assert_eq!(metadata.repo_id, "acme/widgets");
        assert_eq!(metadata.fuzz_targets, 3);
        assert_eq!(metadata.commits, None);
    }

    #[test]
    fn test_row_accepts_legacy_property_spelling() {
        let row = r##"{
            "repo_id": "acme/widgets",
            "#files": 1, "#lines": 10, "#funcs": 2,
            "#unit": 1, "#proptery_based": 1, "#fuzz_target": 0
        }"##;
        let row: RepoMetricsRow = serde_json::from_str(row).unwrap();
        assert_eq!(row.property_based, 1);
    }
}
