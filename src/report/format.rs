//! Plain-text formatting for the log file and terminal.
//!
//! Formatting lives here so the driver and store only deal in data.

use crate::app::pipeline::{DatasetStatus, RunReport};
use crate::io::store::SampleRow;

const MAX_CELL: usize = 24;

/// One line per dataset plus the consolidated-view status.
pub fn format_run_summary(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("=== ingest_data - Elexon BMRS ingest ===\n");
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            DatasetStatus::Stored { rows, dropped: 0 } => format!("stored {rows} row(s)"),
            DatasetStatus::Stored { rows, dropped } => {
                format!("stored {rows} row(s), dropped {dropped} outside range")
            }
            DatasetStatus::FetchFailed { kind, message } => format!("FAILED ({kind}) {message}"),
            DatasetStatus::StoreFailed { message } => format!("FAILED (store) {message}"),
        };
        out.push_str(&format!("{:<12} {line}\n", outcome.dataset.id()));
    }

    let view = if report.consolidated { "built" } else { "skipped" };
    out.push_str(&format!("{:<12} {view}", "view elexon"));
    out
}

/// Render sampled rows as an aligned text table.
pub fn format_sample(rows: &[SampleRow]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".to_string();
    };

    let header: Vec<String> = first.columns.iter().map(|c| truncate(c, MAX_CELL)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.values.iter().map(|v| truncate(v, MAX_CELL)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_line(&header, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_line(&rule, &widths));
    for row in &body {
        out.push('\n');
        out.push_str(&format_line(row, &widths));
    }
    out
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect();
    parts.join(" ").trim_end().to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::DatasetOutcome;
    use crate::domain::Dataset;

    #[test]
    fn summary_lists_each_dataset() {
        let report = RunReport {
            outcomes: vec![
                DatasetOutcome {
                    dataset: Dataset::Temperature,
                    status: DatasetStatus::Stored { rows: 1, dropped: 0 },
                },
                DatasetOutcome {
                    dataset: Dataset::Demand,
                    status: DatasetStatus::FetchFailed {
                        kind: "status",
                        message: "HTTP 401".to_string(),
                    },
                },
            ],
            consolidated: false,
        };

        let text = format_run_summary(&report);
        assert!(text.contains("temperature  stored 1 row(s)"), "{text}");
        assert!(text.contains("demand       FAILED (status) HTTP 401"), "{text}");
        assert!(text.ends_with("view elexon  skipped"), "{text}");
    }

    #[test]
    fn sample_is_aligned() {
        let columns = vec!["timestamp".to_string(), "mw".to_string()];
        let rows = vec![
            SampleRow {
                columns: columns.clone(),
                values: vec!["2023-01-01T00:00:00Z".to_string(), "21000".to_string()],
            },
            SampleRow {
                columns,
                values: vec!["2023-01-01T00:30:00Z".to_string(), "NULL".to_string()],
            },
        ];

        let text = format_sample(&rows);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "timestamp            mw");
        assert_eq!(lines[2], "2023-01-01T00:00:00Z 21000");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_sample() {
        assert_eq!(format_sample(&[]), "(no rows)");
    }
}
