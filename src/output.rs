use crate::config::OutputFormat;
use crate::model::LogEntry;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A parsed entry as written by the command line front end.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<'a> {
    #[serde(flatten)]
    pub entry: &'a LogEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<FixedOffset>>,
}

impl<'a> Record<'a> {
    pub fn new(entry: &'a LogEntry, year: Option<i32>) -> Record<'a> {
        Record {
            entry,
            logged_at: entry.logged_at(year),
        }
    }
}

pub fn render(record: &Record<'_>, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(record),
        OutputFormat::Pretty => serde_json::to_string_pretty(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn entry() -> LogEntry {
        LogEntry {
            timestamp: "Jul 21 05:38:28".to_string(),
            protocol: "ICMP".to_string(),
            icmp_type: 8,
            ..LogEntry::default()
        }
    }

    #[test]
    fn json_is_a_single_line() {
        let entry = entry();
        let line = render(&Record::new(&entry, None), OutputFormat::Json).unwrap();
        assert!(!line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["protocol"], "ICMP");
        assert_eq!(value["type"], 8);
        assert!(value.get("loggedAt").is_none());
    }

    #[test]
    fn logged_at_is_added_when_resolvable() {
        let entry = entry();
        let line = render(&Record::new(&entry, Some(2023)), OutputFormat::Pretty).unwrap();
        assert!(line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        let logged_at = value["loggedAt"].as_str().unwrap();
        assert_eq!(
            DateTime::parse_from_rfc3339(logged_at).ok(),
            entry.logged_at(Some(2023))
        );
    }
}
