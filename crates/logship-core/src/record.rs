//! Normalized log record model.
//!
//! A [`LogRecord`] is the immutable value that flows through the pipeline:
//! created by an event adapter at the moment an application log call
//! happens, handed to the collector on enqueue, and never mutated after
//! that. The wire form is camelCase JSON; a batch is serialized as a JSON
//! array of records.

use serde::{Deserialize, Serialize};

/// Normalized severity of a log record.
///
/// Framework level strings are parsed case-insensitively; anything the
/// pipeline does not recognize maps to [`Severity::Info`] rather than
/// failing the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Parses a framework level string, case-insensitively.
    #[must_use]
    pub fn parse(level: &str) -> Self {
        match level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Severity::Trace,
            "DEBUG" => Severity::Debug,
            "WARN" | "WARNING" => Severity::Warn,
            "ERROR" => Severity::Error,
            "FATAL" | "CRITICAL" => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// True for levels that also warrant a structured error report.
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    /// Lowercase wire label for this severity.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

/// Source location attached to an error report when no cause chain is
/// available (logger call site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub module: String,
    pub function: String,
    pub line: u32,
}

/// Structured error payload carried by error-level records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Error type/classification, when the source framework provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Call site of the log statement that produced the report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Request-scoped detail attached to records produced during web request
/// handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
}

/// Immutable, normalized log record.
///
/// Ownership passes to the collector on enqueue. Correlation fields are
/// resolved by the adapter layer from an ambient context; they are plain
/// data here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Event time in epoch milliseconds.
    pub epoch_ms: i64,
    pub severity: Severity,
    pub message: String,
    /// Structured error report, present for error-level events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// User the event occurred under, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Correlation id linking records of one logical transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestDetail>,
}

impl LogRecord {
    /// Creates a record with the mandatory fields; optional detail starts
    /// empty and is filled in by the adapter.
    #[must_use]
    pub fn new(epoch_ms: i64, severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            epoch_ms,
            severity,
            message: message.into(),
            error: None,
            user: None,
            transaction_id: None,
            request: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse("ERROR"), Severity::Error);
        assert_eq!(Severity::parse("Error"), Severity::Error);
        assert_eq!(Severity::parse("  warn "), Severity::Warn);
        assert_eq!(Severity::parse("WARNING"), Severity::Warn);
    }

    #[test]
    fn test_severity_parse_unknown_maps_to_info() {
        assert_eq!(Severity::parse("notice"), Severity::Info);
        assert_eq!(Severity::parse(""), Severity::Info);
    }

    #[test]
    fn test_severity_is_error() {
        assert!(Severity::Error.is_error());
        assert!(Severity::Fatal.is_error());
        assert!(!Severity::Warn.is_error());
        assert!(!Severity::Info.is_error());
    }

    #[test]
    fn test_record_serializes_camel_case_and_skips_empty_options() {
        let record = LogRecord::new(1_700_000_000_123, Severity::Info, "hello");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["epochMs"], 1_700_000_000_123_i64);
        assert_eq!(json["severity"], "info");
        assert_eq!(json["message"], "hello");
        assert!(json.get("error").is_none());
        assert!(json.get("transactionId").is_none());
    }

    #[test]
    fn test_record_round_trips_with_error_detail() {
        let mut record = LogRecord::new(42, Severity::Error, "boom");
        record.error = Some(ErrorDetail {
            message: "boom".to_string(),
            kind: Some("io".to_string()),
            location: Some(SourceLocation {
                module: "billing::invoices".to_string(),
                function: "post".to_string(),
                line: 88,
            }),
        });
        record.transaction_id = Some("txn-1".to_string());

        let json = serde_json::to_string(&record).unwrap();
        let back: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
