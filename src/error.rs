use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Reasons a log line could not be turned into a [`LogEntry`](crate::model::LogEntry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("given log text is not matched with the log format")]
    FormatUnmatched,

    #[error("failed to convert field `{field}` to number: {source}")]
    NumberConversion {
        field: &'static str,
        #[source]
        source: NumberError,
    },
}

impl ParseError {
    /// Name of the field that failed conversion, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ParseError::FormatUnmatched => None,
            ParseError::NumberConversion { field, .. } => Some(*field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error(transparent)]
    Int(#[from] ParseIntError),

    #[error(transparent)]
    Float(#[from] ParseFloatError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_is_reported_only_for_conversions() {
        assert_eq!(ParseError::FormatUnmatched.field(), None);

        let source = "x".parse::<u16>().unwrap_err();
        let err = ParseError::NumberConversion {
            field: "len",
            source: source.into(),
        };
        assert_eq!(err.field(), Some("len"));
        assert!(err.to_string().contains("`len`"));
    }
}
