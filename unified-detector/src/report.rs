use anyhow::Context;
use std::collections::BTreeMap;

/// Two-column `Label,Count` export of per-label detection counts
pub fn label_counts_csv(counts: &BTreeMap<String, usize>) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Label", "Count"])?;
    for (label, count) in counts {
        writer.write_record([label.as_str(), count.to_string().as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{count_labels, Detection};

    #[test]
    fn test_header_only_for_no_detections() {
        let csv = label_counts_csv(&BTreeMap::new()).unwrap();
        assert_eq!(csv, "Label,Count\n");
    }

    #[test]
    fn test_counts_rows() {
        let detections = vec![
            Detection::new("Wall", 0.9, [0.0, 0.0, 1.0, 1.0]),
            Detection::new("Door", 0.8, [0.0, 0.0, 1.0, 1.0]),
            Detection::new("Wall", 0.7, [0.0, 0.0, 1.0, 1.0]),
        ];
        let csv = label_counts_csv(&count_labels(&detections)).unwrap();
        assert_eq!(csv, "Label,Count\nDoor,1\nWall,2\n");
    }

    #[test]
    fn test_labels_with_commas_are_quoted() {
        let mut counts = BTreeMap::new();
        counts.insert("Sink, double".to_string(), 2);
        let csv = label_counts_csv(&counts).unwrap();
        assert_eq!(csv, "Label,Count\n\"Sink, double\",2\n");
    }
}
