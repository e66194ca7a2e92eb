use crate::error::ParseError;
use crate::parser;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One netfilter packet log line, broken into fields.
///
/// Fields missing from the line hold their zero value; a missing `MAC=` and an
/// empty `MAC=` look the same here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub hostname: String,
    pub kernel_timestamp: f64,
    pub prefix: String,
    pub input_interface: String,
    pub output_interface: String,
    pub mac_address: String,

    pub source: String,
    pub destination: String,
    pub length: u64,
    pub tos: u8,
    pub precedence: u8,
    pub ttl: u64,
    pub id: u64,
    pub congestion_experienced: bool,
    pub do_not_fragment: bool,
    pub more_fragments_following: bool,
    #[serde(rename = "frag")]
    pub fragment_offset: i64,
    pub ip_options: String,
    pub protocol: String,

    #[serde(rename = "type")]
    pub icmp_type: i64,
    #[serde(rename = "code")]
    pub icmp_code: i64,
    /// Echo identifier, only printed for ICMP echo request/reply.
    pub icmp_id: u64,

    pub source_port: u16,
    pub destination_port: u16,
    /// TCP sequence number, or the echo sequence for ICMP echo.
    pub sequence: u64,
    pub ack_sequence: u64,
    pub window_size: u64,
    #[serde(rename = "res")]
    pub reserved: u64,
    pub urgent: bool,
    pub ack: bool,
    pub push: bool,
    pub reset: bool,
    pub syn: bool,
    pub fin: bool,
    #[serde(rename = "urgp")]
    pub urgent_pointer: u64,
    #[serde(rename = "tcpOption")]
    pub tcp_options: String,
}

impl LogEntry {
    /// Resolves `timestamp` to a point in time.
    ///
    /// RFC 3339 timestamps are taken as they are. Classic syslog timestamps
    /// (`Jul 21 05:38:28`) carry neither year nor zone, so they need `year` and
    /// are read as UTC.
    pub fn logged_at(&self, year: Option<i32>) -> Option<DateTime<FixedOffset>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(at);
        }

        let year = year?;
        let naive = NaiveDateTime::parse_from_str(
            &format!("{} {}", year, self.timestamp),
            "%Y %b %e %H:%M:%S",
        )
        .ok()?;
        Some(FixedOffset::east_opt(0)?.from_utc_datetime(&naive))
    }
}

impl FromStr for LogEntry {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        parser::parse(line)
    }
}
