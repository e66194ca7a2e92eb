use crate::error::{NumberError, ParseError};
use crate::model::LogEntry;
use regex::{Captures, Regex};
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::LazyLock;

// Tokens appear in the order nf_log prints them. Numeric slots take the whole
// token so that a malformed value surfaces as a conversion error instead of a
// format mismatch.
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<timestamp>.+)\s+(?P<hostname>\S+)\s+kernel:\s+",
        r"\[\s*(?P<kernel_timestamp>[^\]]+)\]\s+",
        r"(?:(?P<prefix>.+)\s+)?",
        r"IN=(?P<in>\S*)\s+OUT=(?P<out>\S*)\s+",
        r"(?:MAC=(?P<mac>\S*)\s+)?",
        r"SRC=(?P<src>\S*)\s+DST=(?P<dst>\S*)\s+",
        r"LEN=(?P<len>\S*)\s+",
        r"TOS=(?:0x(?P<tos>\S+))?\s+PREC=(?:0x(?P<prec>\S+))?\s+",
        r"TTL=(?P<ttl>\S*)\s+ID=(?P<id>\S*)\s+",
        r"(?P<ce>CE\s+)?(?P<df>DF\s+)?(?P<mf>MF\s+)?",
        r"(?:FRAG=(?P<frag>\S*)\s+)?",
        r"(?:OPT \((?P<ip_opt>.+)\)\s+)?",
        r"PROTO=(?P<proto>\S+)",
        r"(?:\s+TYPE=(?P<type>\S+))?(?:\s+CODE=(?P<code>\S+))?(?:\s+ID=(?P<icmp_id>\S*))?",
        r"(?:\s+SPT=(?P<spt>\S*))?(?:\s+DPT=(?P<dpt>\S*))?",
        r"(?:\s+SEQ=(?P<seq>\S*))?(?:\s+ACK=(?P<ack_seq>\S*))?",
        r"(?:\s+WINDOW=(?P<window>\S*))?(?:\s+RES=0x(?P<res>\S*))?",
        r"(?P<urg>\s+URG\b)?(?P<ack>\s+ACK\b)?(?P<psh>\s+PSH\b)?",
        r"(?P<rst>\s+RST\b)?(?P<syn>\s+SYN\b)?(?P<fin>\s+FIN\b)?",
        r"(?:\s+URGP=(?P<urgp>\S*))?",
        r"(?:\s+OPT \((?P<tcp_opt>.*)\))?",
    ))
    .expect("log line pattern is valid")
});

/// Parses one netfilter packet log line.
///
/// Fails with [`ParseError::FormatUnmatched`] when the line is not a packet
/// log line at all, and with [`ParseError::NumberConversion`] when it is but a
/// numeric field holds something that is not a number of the right size.
pub fn parse(line: &str) -> Result<LogEntry, ParseError> {
    let caps = LOG_LINE
        .captures(line)
        .ok_or(ParseError::FormatUnmatched)?;

    let kernel_timestamp = match text(&caps, "kernel_timestamp") {
        "" => 0.0,
        raw => raw
            .parse::<f64>()
            .map_err(|e| conversion("kernel_timestamp", e))?,
    };

    Ok(LogEntry {
        timestamp: owned(&caps, "timestamp"),
        hostname: owned(&caps, "hostname"),
        kernel_timestamp,
        prefix: owned(&caps, "prefix"),
        input_interface: owned(&caps, "in"),
        output_interface: owned(&caps, "out"),
        mac_address: owned(&caps, "mac"),

        source: owned(&caps, "src"),
        destination: owned(&caps, "dst"),
        length: decimal(&caps, "len")?,
        tos: hex(&caps, "tos")?,
        precedence: hex(&caps, "prec")?,
        ttl: decimal(&caps, "ttl")?,
        id: decimal(&caps, "id")?,
        congestion_experienced: flag(&caps, "ce"),
        do_not_fragment: flag(&caps, "df"),
        more_fragments_following: flag(&caps, "mf"),
        fragment_offset: decimal(&caps, "frag")?,
        ip_options: owned(&caps, "ip_opt"),
        protocol: owned(&caps, "proto"),

        icmp_type: decimal(&caps, "type")?,
        icmp_code: decimal(&caps, "code")?,
        icmp_id: decimal(&caps, "icmp_id")?,

        source_port: decimal(&caps, "spt")?,
        destination_port: decimal(&caps, "dpt")?,
        sequence: decimal(&caps, "seq")?,
        ack_sequence: decimal(&caps, "ack_seq")?,
        window_size: decimal(&caps, "window")?,
        reserved: hex(&caps, "res")?,
        urgent: flag(&caps, "urg"),
        ack: flag(&caps, "ack"),
        push: flag(&caps, "psh"),
        reset: flag(&caps, "rst"),
        syn: flag(&caps, "syn"),
        fin: flag(&caps, "fin"),
        urgent_pointer: decimal(&caps, "urgp")?,
        tcp_options: owned(&caps, "tcp_opt"),
    })
}

fn text<'t>(caps: &Captures<'t>, group: &str) -> &'t str {
    caps.name(group).map_or("", |m| m.as_str())
}

fn owned(caps: &Captures<'_>, group: &str) -> String {
    text(caps, group).to_string()
}

fn flag(caps: &Captures<'_>, group: &str) -> bool {
    !text(caps, group).is_empty()
}

fn decimal<T>(caps: &Captures<'_>, group: &'static str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError> + Default,
{
    match text(caps, group) {
        "" => Ok(T::default()),
        raw => raw.parse().map_err(|e| conversion(group, e)),
    }
}

trait FromHex: Sized {
    fn from_hex(raw: &str) -> Result<Self, ParseIntError>;
}

macro_rules! impl_from_hex {
    ($($ty:ty),*) => {
        $(
            impl FromHex for $ty {
                fn from_hex(raw: &str) -> Result<Self, ParseIntError> {
                    <$ty>::from_str_radix(raw, 16)
                }
            }
        )*
    };
}

impl_from_hex!(u8, u64);

fn hex<T>(caps: &Captures<'_>, group: &'static str) -> Result<T, ParseError>
where
    T: FromHex + Default,
{
    match text(caps, group) {
        "" => Ok(T::default()),
        raw => T::from_hex(raw).map_err(|e| conversion(group, e)),
    }
}

fn conversion(group: &'static str, source: impl Into<NumberError>) -> ParseError {
    ParseError::NumberConversion {
        field: field_name(group),
        source: source.into(),
    }
}

// Errors name fields by their log keys; only these groups are named differently.
fn field_name(group: &'static str) -> &'static str {
    match group {
        "kernel_timestamp" => "kernel-timestamp",
        "ack_seq" => "ack",
        "icmp_id" => "icmp-id",
        other => other,
    }
}
