//! Output formatting for census results.
//!
//! Supports three output formats:
//! - CSV: the tabular dataset consumed downstream, fixed header
//! - JSON: full rows for programmatic consumption
//! - Pretty: colored per-function listing for terminal inspection

use std::io::Write;

use colored::Colorize;

use crate::aggregate::RepoMetricsRow;
use crate::classify::{FileClassification, Label};

/// Column order of the tabular output.
const CSV_HEADER: [&str; 7] = [
    "repo_id",
    "#files",
    "#lines",
    "#funcs",
    "#unit",
    "#property_based",
    "#fuzz_target",
];

/// Write rows as CSV with the fixed header.
pub fn write_csv<W: Write>(out: W, rows: &[RepoMetricsRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(&[
            row.repo_id.clone(),
            row.files.to_string(),
            row.lines.to_string(),
            row.funcs.to_string(),
            row.unit.to_string(),
            row.property_based.to_string(),
            row.fuzz_targets.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write full rows (including commit/bug counts when present) as JSON.
pub fn write_json<W: Write>(out: W, rows: &[RepoMetricsRow]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(out, rows)?;
    Ok(())
}

/// Write labeled functions as JSON.
pub fn write_labels_json<W: Write>(out: W, labels: &FileClassification) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(out, &labels.functions)?;
    Ok(())
}

/// Write a colored per-function listing with a count summary.
pub fn write_pretty<W: Write>(out: &mut W, labels: &FileClassification) -> anyhow::Result<()> {
    for func in &labels.functions {
        let tag = match func.label {
            Label::NonTest => "non-test".dimmed(),
            Label::Unit => "unit".green(),
            Label::PropertyBased => "property-based".cyan(),
        };
        writeln!(
            out,
            "{}:{} {} [{}]",
            func.file,
            func.line,
            func.name.bold(),
            tag
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{} non-test, {} unit, {} property-based",
        labels.count(Label::NonTest),
        labels.count(Label::Unit),
        labels.count(Label::PropertyBased)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> RepoMetricsRow {
        RepoMetricsRow {
            repo_id: "acme/widgets".to_string(),
            files: 3,
            lines: 120,
            funcs: 2,
            unit: 2,
            property_based: 1,
            fuzz_targets: 4,
            commits: None,
            bugs: None,
        }
    }

    #[test]
    fn test_csv_header_is_exact() {
        let mut out = Vec::new();
        write_csv(&mut out, &[sample_row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("repo_id,#files,#lines,#funcs,#unit,#property_based,#fuzz_target")
        );
        assert_eq!(lines.next(), Some("acme/widgets,3,120,2,2,1,4"));
    }

    #[test]
    fn test_json_round_trips_rows() {
        let rows = vec![RepoMetricsRow {
            commits: Some(10),
            bugs: Some(2),
            ..sample_row()
        }];
        let mut out = Vec::new();
        write_json(&mut out, &rows).unwrap();
        let parsed: Vec<RepoMetricsRow> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_pretty_lists_every_function() {
        use crate::classify::LabeledFunction;

        colored::control::set_override(false);
        let labels = FileClassification {
            functions: vec![
                LabeledFunction {
                    name: "test_a".to_string(),
                    file: "a.py".to_string(),
                    line: 1,
                    label: Label::Unit,
                },
                LabeledFunction {
                    name: "helper".to_string(),
                    file: "a.py".to_string(),
                    line: 5,
                    label: Label::NonTest,
                },
            ],
        };
        let mut out = Vec::new();
        write_pretty(&mut out, &labels).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a.py:1 test_a [unit]"));
        assert!(text.contains("a.py:5 helper [non-test]"));
        assert!(text.contains("1 non-test, 1 unit, 0 property-based"));
    }
}
