//! Event adapters: framework log events in, normalized records out.
//!
//! An [`EventAdapter`] converts one framework-specific event into a
//! [`LogRecord`], deterministically. Ambient correlation detail (user,
//! transaction id, request) is not read from global state: the caller
//! resolves an [`AmbientContext`] once per event through a
//! [`ContextResolver`] and threads it into the adapter call.
//!
//! Two context sources exist in practice: a *linked* in-process monitoring
//! context and a *fallback* request-scoped context. Precedence is fixed,
//! linked first, fallback second, applied per field.

use std::sync::Arc;

use crate::record::{ErrorDetail, LogRecord, RequestDetail, Severity, SourceLocation};

/// Failure to map a framework event into a record. The offending event is
/// dropped; an adapter failure never corrupts a batch.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("event has an empty message")]
    EmptyMessage,
}

/// A source of ambient correlation detail.
///
/// Implementations are expected to be cheap; each accessor is consulted at
/// most once per event.
pub trait ContextProvider: Send + Sync {
    fn user(&self) -> Option<String>;
    fn transaction_id(&self) -> Option<String>;
    fn request(&self) -> Option<RequestDetail>;
}

/// Correlation detail resolved for a single event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbientContext {
    pub user: Option<String>,
    pub transaction_id: Option<String>,
    pub request: Option<RequestDetail>,
}

impl AmbientContext {
    /// A context carrying no correlation detail.
    #[must_use]
    pub fn empty() -> Self {
        AmbientContext::default()
    }
}

/// Resolves an [`AmbientContext`] from up to two providers with fixed
/// precedence: the linked in-process monitor first, the request-scoped
/// fallback second. Each field falls back independently.
#[derive(Clone, Default)]
pub struct ContextResolver {
    linked: Option<Arc<dyn ContextProvider>>,
    fallback: Option<Arc<dyn ContextProvider>>,
}

impl ContextResolver {
    #[must_use]
    pub fn new(
        linked: Option<Arc<dyn ContextProvider>>,
        fallback: Option<Arc<dyn ContextProvider>>,
    ) -> Self {
        ContextResolver { linked, fallback }
    }

    /// Resolves the context once; call per event, not per field.
    #[must_use]
    pub fn resolve(&self) -> AmbientContext {
        AmbientContext {
            user: self.field(|p| p.user()),
            transaction_id: self.field(|p| p.transaction_id()),
            request: self.field(|p| p.request()),
        }
    }

    fn field<T>(&self, get: impl Fn(&dyn ContextProvider) -> Option<T>) -> Option<T> {
        self.linked
            .as_deref()
            .and_then(&get)
            .or_else(|| self.fallback.as_deref().and_then(&get))
    }
}

/// Deterministic mapping from a framework event type `E` to a record.
pub trait EventAdapter<E>: Send + Sync {
    /// Builds the normalized record for `event`, enriched from `ctx`.
    fn to_record(&self, event: &E, ctx: &AmbientContext) -> Result<LogRecord, AdapterError>;

    /// Whether the event's level warrants a structured error report.
    fn is_error_level(&self, event: &E) -> bool;
}

/// A plain log event submitted directly by application code, without going
/// through a logging framework.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Event time in epoch milliseconds.
    pub epoch_ms: i64,
    /// Raw framework level string; `None` defaults to info.
    pub level: Option<String>,
    pub message: String,
    /// Message of an attached error cause, when one exists.
    pub cause: Option<String>,
    /// Call site, used for the error report when no cause is attached.
    pub location: Option<SourceLocation>,
}

/// Adapter for [`LogEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventAdapter;

impl EventAdapter<LogEvent> for LogEventAdapter {
    fn to_record(&self, event: &LogEvent, ctx: &AmbientContext) -> Result<LogRecord, AdapterError> {
        if event.message.trim().is_empty() {
            return Err(AdapterError::EmptyMessage);
        }

        let severity = event
            .level
            .as_deref()
            .map_or(Severity::Info, Severity::parse);

        let mut record = LogRecord::new(event.epoch_ms, severity, event.message.clone());

        if severity.is_error() {
            // With an attached cause the report carries it as the error
            // kind; otherwise the call site stands in for the missing
            // cause chain.
            record.error = Some(match &event.cause {
                Some(cause) => ErrorDetail {
                    message: event.message.clone(),
                    kind: Some(cause.clone()),
                    location: None,
                },
                None => ErrorDetail {
                    message: event.message.clone(),
                    kind: None,
                    location: event.location.clone(),
                },
            });
        }

        record.user = ctx.user.clone();
        record.transaction_id = ctx.transaction_id.clone();
        record.request = ctx.request.clone();

        Ok(record)
    }

    fn is_error_level(&self, event: &LogEvent) -> bool {
        event
            .level
            .as_deref()
            .is_some_and(|level| Severity::parse(level).is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider {
        user: Option<&'static str>,
        transaction_id: Option<&'static str>,
    }

    impl ContextProvider for StaticProvider {
        fn user(&self) -> Option<String> {
            self.user.map(str::to_string)
        }

        fn transaction_id(&self) -> Option<String> {
            self.transaction_id.map(str::to_string)
        }

        fn request(&self) -> Option<RequestDetail> {
            None
        }
    }

    fn event(level: Option<&str>, message: &str) -> LogEvent {
        LogEvent {
            epoch_ms: 1_000,
            level: level.map(str::to_string),
            message: message.to_string(),
            cause: None,
            location: None,
        }
    }

    #[test]
    fn test_resolver_prefers_linked_provider() {
        let linked = Arc::new(StaticProvider {
            user: Some("apm-user"),
            transaction_id: Some("apm-txn"),
        });
        let fallback = Arc::new(StaticProvider {
            user: Some("servlet-user"),
            transaction_id: Some("servlet-txn"),
        });
        let resolver = ContextResolver::new(Some(linked), Some(fallback));

        let ctx = resolver.resolve();
        assert_eq!(ctx.user.as_deref(), Some("apm-user"));
        assert_eq!(ctx.transaction_id.as_deref(), Some("apm-txn"));
    }

    #[test]
    fn test_resolver_falls_back_per_field() {
        let linked = Arc::new(StaticProvider {
            user: None,
            transaction_id: Some("apm-txn"),
        });
        let fallback = Arc::new(StaticProvider {
            user: Some("servlet-user"),
            transaction_id: Some("servlet-txn"),
        });
        let resolver = ContextResolver::new(Some(linked), Some(fallback));

        let ctx = resolver.resolve();
        assert_eq!(ctx.user.as_deref(), Some("servlet-user"));
        assert_eq!(ctx.transaction_id.as_deref(), Some("apm-txn"));
    }

    #[test]
    fn test_resolver_with_no_providers_is_empty() {
        let resolver = ContextResolver::default();
        assert_eq!(resolver.resolve(), AmbientContext::empty());
    }

    #[test]
    fn test_adapter_maps_basic_event() {
        let adapter = LogEventAdapter;
        let record = adapter
            .to_record(&event(Some("info"), "started"), &AmbientContext::empty())
            .unwrap();

        assert_eq!(record.epoch_ms, 1_000);
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.message, "started");
        assert!(record.error.is_none());
    }

    #[test]
    fn test_adapter_rejects_empty_message() {
        let adapter = LogEventAdapter;
        let result = adapter.to_record(&event(Some("info"), "   "), &AmbientContext::empty());
        assert!(matches!(result, Err(AdapterError::EmptyMessage)));
    }

    #[test]
    fn test_adapter_error_level_is_case_insensitive() {
        let adapter = LogEventAdapter;
        assert!(adapter.is_error_level(&event(Some("ERROR"), "x")));
        assert!(adapter.is_error_level(&event(Some("error"), "x")));
        assert!(adapter.is_error_level(&event(Some("Fatal"), "x")));
        assert!(!adapter.is_error_level(&event(Some("warn"), "x")));
        assert!(!adapter.is_error_level(&event(None, "x")));
    }

    #[test]
    fn test_adapter_builds_error_detail_from_cause() {
        let adapter = LogEventAdapter;
        let mut ev = event(Some("error"), "payment failed");
        ev.cause = Some("connection reset".to_string());

        let record = adapter.to_record(&ev, &AmbientContext::empty()).unwrap();
        let error = record.error.unwrap();
        assert_eq!(error.message, "payment failed");
        assert_eq!(error.kind.as_deref(), Some("connection reset"));
        assert!(error.location.is_none());
    }

    #[test]
    fn test_adapter_uses_call_site_without_cause() {
        let adapter = LogEventAdapter;
        let mut ev = event(Some("error"), "payment failed");
        ev.location = Some(SourceLocation {
            module: "billing".to_string(),
            function: "charge".to_string(),
            line: 7,
        });

        let record = adapter.to_record(&ev, &AmbientContext::empty()).unwrap();
        let error = record.error.unwrap();
        assert!(error.kind.is_none());
        assert_eq!(error.location.unwrap().line, 7);
    }

    #[test]
    fn test_adapter_threads_ambient_context() {
        let adapter = LogEventAdapter;
        let ctx = AmbientContext {
            user: Some("alice".to_string()),
            transaction_id: Some("txn-9".to_string()),
            request: Some(RequestDetail {
                method: "GET".to_string(),
                path: "/orders".to_string(),
                client_address: None,
            }),
        };

        let record = adapter.to_record(&event(None, "hit"), &ctx).unwrap();
        assert_eq!(record.user.as_deref(), Some("alice"));
        assert_eq!(record.transaction_id.as_deref(), Some("txn-9"));
        assert_eq!(record.request.unwrap().path, "/orders");
    }
}
