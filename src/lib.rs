//! Parser for netfilter (iptables) kernel packet log lines.

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;

pub use error::{NumberError, ParseError};
pub use model::LogEntry;
pub use parser::parse;
