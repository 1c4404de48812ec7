// Status aggregation for the scrape endpoint — count rows, emit gauge lines.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::store::record::Record;

/// Content type for the exposition body.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Count equipment rows per distinct Status value.
///
/// Raw strings, not the status enum: a value this code never writes
/// still gets counted and exposed.
pub fn count_statuses(records: &[Record]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for record in records {
        let status = record
            .fields
            .get("Status")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

/// Render the counts as Prometheus gauge lines with a shared timestamp.
pub fn render_exposition(counts: &BTreeMap<String, u64>, timestamp_ms: u64) -> String {
    let mut lines = vec![
        "# HELP status_count Count of equipment in a given status".to_string(),
        "# TYPE status_count gauge".to_string(),
    ];
    for (status, count) in counts {
        lines.push(format!(
            "status_count{{status=\"{}\"}} {} {}",
            status, count, timestamp_ms
        ));
    }
    lines.join("\n")
}

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn equipment_row(id: i64, status: &str) -> Record {
        Record {
            id,
            fields: json!({"Status": status, "Location": "workshop"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_count_statuses() {
        let rows = vec![
            equipment_row(1, "Available"),
            equipment_row(2, "In Use"),
            equipment_row(3, "Available"),
            equipment_row(4, "Broken"),
        ];
        let counts = count_statuses(&rows);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["Available"], 2);
        assert_eq!(counts["In Use"], 1);
        // Unexpected status values are still counted.
        assert_eq!(counts["Broken"], 1);
    }

    #[test]
    fn test_render_exposition() {
        let mut counts = BTreeMap::new();
        counts.insert("Available".to_string(), 3);
        counts.insert("In Use".to_string(), 1);

        let body = render_exposition(&counts, 1_700_000_000_000);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "# HELP status_count Count of equipment in a given status"
        );
        assert_eq!(lines[1], "# TYPE status_count gauge");
        assert_eq!(
            lines[2],
            "status_count{status=\"Available\"} 3 1700000000000"
        );
        assert_eq!(lines[3], "status_count{status=\"In Use\"} 1 1700000000000");
    }

    #[test]
    fn test_render_exposition_empty() {
        let body = render_exposition(&BTreeMap::new(), 1);
        // Header only when no rows were observed.
        assert_eq!(body.lines().count(), 2);
    }
}
