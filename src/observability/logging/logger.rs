//! Structured logger.
//!
//! # Responsibilities
//! - Filter records by severity threshold
//! - Enrich records with timestamp, service metadata, context pairs and call site
//! - Turn errors into records carrying a stacktrace
//! - Serialise writes to one shared output stream
//!
//! # Design Decisions
//! - Loggers are cheap immutable handles; `with*` returns a derived copy
//! - All derived loggers share one writer behind a mutex, so lines never interleave
//! - The call site comes from `#[track_caller]`; wrappers that log on behalf of
//!   their caller should be `#[track_caller]` too
//! - A failed write degrades to a raw dump on stderr and never propagates

use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};

use super::format::{Format, JsonFormat, TemplateFormat, QUICK_TEMPLATE};
use super::record::{Record, SourceLocation, Value};
use super::severity::{Severity, SeverityMask};
use super::stacktrace::{BoxError, TracedError};
use crate::version;

/// Anything that can count logged errors, usually a metrics counter.
pub trait Incrementable: Send + Sync {
    fn inc(&self);
}

impl Incrementable for metrics::Counter {
    fn inc(&self) {
        self.increment(1);
    }
}

impl Incrementable for AtomicU64 {
    fn inc(&self) {
        self.fetch_add(1, Ordering::Relaxed);
    }
}

/// Output format selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Template(String),
}

impl LogFormat {
    /// `""`/`json` select JSON, `quick` the compact template, anything else is a template.
    pub fn parse(format: &str) -> Self {
        match format {
            "" | "json" => LogFormat::Json,
            "quick" => LogFormat::Template(QUICK_TEMPLATE.to_string()),
            template => LogFormat::Template(template.to_string()),
        }
    }
}

/// What a call to one of the severity methods carries.
#[derive(Debug)]
pub enum Entry {
    /// No arguments at all.
    Nothing,
    /// An error was expected but absent.
    NilError,
    /// Plain text.
    Message(String),
    /// An error, wrapped with a stacktrace unless it already has one.
    Error(BoxError),
    /// An error plus descriptive context.
    ErrorWithContext(BoxError, String),
    /// Context text followed by an error: the reversed argument order.
    MessageThenError(String, BoxError),
}

impl Entry {
    pub fn error<E: Into<BoxError>>(err: E) -> Self {
        Entry::Error(err.into())
    }

    pub fn error_with_context<E: Into<BoxError>>(err: E, context: impl Into<String>) -> Self {
        Entry::ErrorWithContext(err.into(), context.into())
    }

    pub fn message_then_error<E: Into<BoxError>>(context: impl Into<String>, err: E) -> Self {
        Entry::MessageThenError(context.into(), err.into())
    }
}

impl From<()> for Entry {
    fn from(_: ()) -> Self {
        Entry::Nothing
    }
}

impl From<&str> for Entry {
    fn from(text: &str) -> Self {
        Entry::Message(text.to_string())
    }
}

impl From<String> for Entry {
    fn from(text: String) -> Self {
        Entry::Message(text)
    }
}

impl From<TracedError> for Entry {
    fn from(err: TracedError) -> Self {
        Entry::Error(Box::new(err))
    }
}

impl From<BoxError> for Entry {
    fn from(err: BoxError) -> Self {
        Entry::Error(err)
    }
}

impl<E: Into<BoxError>> From<Option<E>> for Entry {
    fn from(err: Option<E>) -> Self {
        match err {
            Some(err) => Entry::Error(err.into()),
            None => Entry::NilError,
        }
    }
}

struct Sink {
    writer: Mutex<Box<dyn Write + Send>>,
    format: Box<dyn Format>,
    timestamps: bool,
    metadata: Vec<(String, Value)>,
}

impl Sink {
    fn emit(&self, record: &Record) {
        let result = self
            .format
            .format(record)
            .map_err(io::Error::from)
            .and_then(|line| {
                let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer.write_all(line.as_bytes())?;
                writer.flush()
            });

        if let Err(err) = result {
            raw_dump(record, &err);
        }
    }
}

/// Last-resort output. Ignores its own failures.
fn raw_dump(record: &Record, err: &io::Error) {
    let mut body = format!("\tseverity: {}\n", record.severity());
    for (key, value) in record.fields() {
        body.push_str(&format!("{key}: {value}\n"));
    }
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Error when trying to log message: {err}");
    let _ = writeln!(stderr, "Falling back to raw output");
    let _ = writeln!(stderr, "<<<BEGIN LOG\n{body}\nEND LOG>>>");
}

/// Builder for [`Logger`].
pub struct LoggerBuilder {
    format: LogFormat,
    colors: bool,
    writer: Box<dyn Write + Send>,
    timestamps: bool,
    metadata: Vec<(String, Value)>,
    threshold: SeverityMask,
}

impl LoggerBuilder {
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Colour template output. Ignored for JSON.
    pub fn colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    /// Add a `time` field to every record.
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// A pair written on every record, ahead of context pairs.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub fn threshold(mut self, threshold: impl Into<SeverityMask>) -> Self {
        self.threshold = threshold.into();
        self
    }

    pub fn build(self) -> Logger {
        let format: Box<dyn Format> = match self.format {
            LogFormat::Json => Box::new(JsonFormat),
            LogFormat::Template(template) => {
                Box::new(TemplateFormat::new(template).with_colors(self.colors))
            }
        };
        Logger {
            sink: Arc::new(Sink {
                writer: Mutex::new(self.writer),
                format,
                timestamps: self.timestamps,
                metadata: self.metadata,
            }),
            context: Arc::new(Vec::new()),
            threshold: self.threshold,
            prefix: None,
            error_counter: None,
            caller_skip: None,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            colors: false,
            writer: Box::new(io::stdout()),
            timestamps: false,
            metadata: Vec::new(),
            threshold: SeverityMask::DEFAULT,
        }
    }
}

/// Structured key/value logger.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<Sink>,
    context: Arc<Vec<(String, Value)>>,
    threshold: SeverityMask,
    prefix: Option<Arc<str>>,
    error_counter: Option<Arc<dyn Incrementable>>,
    caller_skip: Option<usize>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold.to_string())
            .field("context", &self.context)
            .field("prefix", &self.prefix)
            .field("error_counter", &self.error_counter.is_some())
            .finish()
    }
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Stdout logger stamped with time, service name and commit.
    pub fn new(format: LogFormat, colors: bool) -> Self {
        Self::builder()
            .format(format)
            .colors(colors)
            .timestamps(true)
            .metadata("name", version::NAME)
            .metadata("commit", version::COMMIT)
            .build()
    }

    /// A logger that drops everything.
    pub fn discard() -> Self {
        Self::builder().writer(io::sink()).threshold(SeverityMask::from_level(Severity::Critical)).build()
    }

    pub fn threshold(&self) -> SeverityMask {
        self.threshold
    }

    pub fn is_allowed(&self, severity: Severity) -> bool {
        self.threshold.allows(severity)
    }

    /// Set the threshold from a level name. Unknown names enable every level and log the error.
    #[track_caller]
    pub fn set_level(&mut self, level: &str) {
        match SeverityMask::parse(level) {
            Ok(mask) => self.threshold = mask,
            Err(err) => {
                self.threshold = SeverityMask::ALL;
                self.error(Entry::error(err));
            }
        }
    }

    #[must_use]
    pub fn with_threshold(&self, threshold: impl Into<SeverityMask>) -> Self {
        let mut derived = self.clone();
        derived.threshold = threshold.into();
        derived
    }

    /// Derived logger adding `key=value` to every record.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut derived = self.clone();
        Arc::make_mut(&mut derived.context).push((key.into(), value.into()));
        derived
    }

    /// Derived logger prefixing every message with `[prefix] `.
    #[must_use]
    pub fn with_prefix(&self, prefix: impl AsRef<str>) -> Self {
        let mut derived = self.clone();
        derived.prefix = Some(Arc::from(prefix.as_ref()));
        derived
    }

    /// Derived logger bumping `counter` once for every error or critical call.
    #[must_use]
    pub fn with_error_counter(&self, counter: Arc<dyn Incrementable>) -> Self {
        let mut derived = self.clone();
        derived.error_counter = Some(counter);
        derived
    }

    /// Derived logger resolving the call site from the stack, `skip` frames above the
    /// first frame outside the logger, instead of from `#[track_caller]`.
    #[must_use]
    pub fn with_caller_skip(&self, skip: usize) -> Self {
        let mut derived = self.clone();
        derived.caller_skip = Some(skip);
        derived
    }

    #[track_caller]
    pub fn debug(&self, entry: impl Into<Entry>) {
        self.dispatch(Severity::Debug, entry.into(), Location::caller());
    }

    #[track_caller]
    pub fn info(&self, entry: impl Into<Entry>) {
        self.dispatch(Severity::Info, entry.into(), Location::caller());
    }

    #[track_caller]
    pub fn notice(&self, entry: impl Into<Entry>) {
        self.dispatch(Severity::Notice, entry.into(), Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, entry: impl Into<Entry>) {
        self.dispatch(Severity::Warn, entry.into(), Location::caller());
    }

    /// Log an error with its stacktrace.
    ///
    /// ```no_run
    /// # use calculator_service::observability::logging::{Entry, Logger};
    /// # let logger = Logger::discard();
    /// # let err = std::io::Error::other("boom");
    /// logger.error(());
    /// logger.error("plain text becomes an error");
    /// logger.error(Entry::error(err));
    /// ```
    #[track_caller]
    pub fn error(&self, entry: impl Into<Entry>) {
        self.dispatch(Severity::Error, entry.into(), Location::caller());
    }

    /// Log at critical severity, then exit the process with status 1.
    #[track_caller]
    pub fn critical(&self, entry: impl Into<Entry>) -> ! {
        self.dispatch(Severity::Critical, entry.into(), Location::caller());
        std::process::exit(1)
    }

    /// Log `entry` at `severity` without any process side effects.
    #[track_caller]
    pub fn log_entry(&self, severity: Severity, entry: impl Into<Entry>) {
        self.dispatch(severity, entry.into(), Location::caller());
    }

    /// Log raw key/value pairs at `severity`.
    #[track_caller]
    pub fn log<K, V, I>(&self, severity: Severity, fields: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        if severity.is_error() {
            self.inc_error_counter();
        }
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.write(severity, fields, Location::caller());
    }

    fn dispatch(&self, severity: Severity, entry: Entry, location: &'static Location<'static>) {
        if severity.is_error() {
            self.inc_error_counter();
        }

        match entry {
            Entry::Nothing if severity.is_error() => {
                self.log_error(&TracedError::msg("No Error message has been provided"), severity, location);
            }
            Entry::Nothing => {
                self.write_message(severity, "No message has been provided".to_string(), location);
            }
            Entry::NilError => {
                self.log_error(&TracedError::msg("error is nil"), Severity::Critical, location);
            }
            Entry::Error(err) => {
                self.log_error(&TracedError::wrap(err), severity, location);
            }
            Entry::ErrorWithContext(err, context) => {
                self.log_error(&TracedError::wrap(err).context(context), severity, location);
            }
            Entry::MessageThenError(context, err) => {
                self.log_error(
                    &TracedError::msg("parameter order in the logger should be (error, string), not (string, error)"),
                    Severity::Critical,
                    location,
                );
                self.log_error(&TracedError::wrap(err).context(context), severity, location);
            }
            Entry::Message(text) if severity.is_error() => {
                self.log_error(&TracedError::msg(text), severity, location);
            }
            Entry::Message(text) => {
                self.write_message(severity, text, location);
            }
        }
    }

    fn log_error(&self, err: &TracedError, severity: Severity, location: &'static Location<'static>) {
        let fields = vec![
            ("message".to_string(), Value::Str(err.to_string())),
            ("stacktrace".to_string(), Value::Stacktrace(err.stacktrace().clone())),
        ];
        self.write(severity, fields, location);
    }

    fn write_message(&self, severity: Severity, text: String, location: &'static Location<'static>) {
        self.write(severity, vec![("message".to_string(), Value::Str(text))], location);
    }

    fn write(&self, severity: Severity, fields: Vec<(String, Value)>, location: &'static Location<'static>) {
        if !self.threshold.allows(severity) {
            return;
        }

        let mut record = Record::new(severity);
        if self.sink.timestamps {
            record.push("time", Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true));
        }
        for (key, value) in self.sink.metadata.iter().chain(self.context.iter()) {
            record.push(key.clone(), value.clone());
        }
        record.push("severity", severity.as_str());
        for (key, value) in fields {
            record.push(key, value);
        }

        if let Some(prefix) = &self.prefix {
            if let Some(message) = record.get_mut("message") {
                *message = Value::Str(format!("[{prefix}] {message}"));
            }
        }

        if !record.contains("source_location") {
            let source = match self.caller_skip {
                Some(skip) => SourceLocation::capture(skip).unwrap_or_else(|| SourceLocation::from_caller(location)),
                None => SourceLocation::from_caller(location),
            };
            record.push("source_location", source);
        }

        self.sink.emit(&record);
    }

    fn inc_error_counter(&self) {
        if let Some(counter) = &self.error_counter {
            counter.inc();
        }
    }
}
