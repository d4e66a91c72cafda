//! Bridge from `tracing` events to the structured logger.
//!
//! # Responsibilities
//! - Receive events emitted by the transport stack (tonic, hyper, tower-http)
//! - Convert event fields into log pairs and hand them to [`Logger`]
//!
//! # Design Decisions
//! - The event's own file and line become `source_location`, so the logger
//!   does not attribute library events to this module
//! - Spans are not recorded; only events produce log lines
//! - `RUST_LOG` overrides the filter derived from the logger threshold

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::observability::logging::{Logger, Severity, SourceLocation, Value};

/// `tracing_subscriber` layer writing every event through a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, Value::Str(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::Uint(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::Str(value.to_string()));
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = Severity::from_tracing(metadata.level());
        if !self.logger.is_allowed(severity) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut fields: Vec<(String, Value)> = Vec::with_capacity(visitor.fields.len() + 3);
        fields.push((
            "message".to_string(),
            Value::Str(visitor.message.unwrap_or_else(|| metadata.name().to_string())),
        ));
        fields.push(("target".to_string(), Value::from(metadata.target())));
        fields.extend(visitor.fields);
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            let location = SourceLocation {
                file: file.to_string(),
                line,
                function: metadata.module_path().map(str::to_string),
            };
            fields.push(("source_location".to_string(), Value::Location(location)));
        }

        self.logger.log(severity, fields);
    }
}

/// Install the global subscriber: an [`EnvFilter`] plus a [`LoggerLayer`].
pub fn init(logger: &Logger) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.threshold().tracing_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerLayer::new(logger.clone()))
        .try_init()
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<serde_json::Value> {
        let buffer = Buffer::default();
        let logger = Logger::builder().writer(buffer.clone()).build();
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn events_become_records() {
        let records = capture(|| tracing::warn!(peer = "10.0.0.1", attempts = 3, "connection reset"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "connection reset");
        assert_eq!(records[0]["severity"], "warn");
        assert_eq!(records[0]["peer"], "10.0.0.1");
        assert_eq!(records[0]["attempts"], 3);
        assert!(records[0]["source_location"]["file"].as_str().unwrap().ends_with("tracing.rs"));
    }

    #[test]
    fn logger_threshold_applies() {
        let records = capture(|| {
            tracing::debug!("dropped");
            tracing::trace!("dropped too");
            tracing::info!("kept");
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "kept");
    }
}
