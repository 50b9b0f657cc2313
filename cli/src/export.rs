use anyhow::{Context, Result};
use common::HistoryEntry;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 8] = ["date", "status", "emails_processed", "priority", "description", "subject", "sender", "deadline"];

/// Write one CSV row per task across all history entries, newest first.
pub fn write_history<W: Write>(writer: W, history: &[HistoryEntry]) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    let mut rows = 0;
    for entry in history {
        let emails = entry.emails_processed.to_string();
        for task in &entry.tasks {
            let priority = task.priority.to_string();
            csv.write_record([
                entry.date.as_str(),
                entry.status.as_str(),
                emails.as_str(),
                priority.as_str(),
                task.description.as_str(),
                task.subject_or(""),
                task.sender_or(""),
                task.deadline.as_deref().unwrap_or(""),
            ])?;
            rows += 1;
        }
    }
    csv.flush()?;
    Ok(rows)
}

pub fn export_to_file(path: &Path, history: &[HistoryEntry]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {:?}", path))?;
    write_history(file, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn one_row_per_task() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let history = common::sample::sample_history(now);

        let mut buf = Vec::new();
        let rows = write_history(&mut buf, &history).unwrap();
        assert_eq!(rows, 3);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("date,status,emails_processed"));
        assert!(lines[3].contains("legal@company.com"));
    }

    #[test]
    fn empty_history_writes_header_only() {
        let mut buf = Vec::new();
        assert_eq!(write_history(&mut buf, &[]).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }
}
