//! Stacktrace capture and stacktrace-carrying errors.
//!
//! # Responsibilities
//! - Capture the call stack at the point an error is wrapped
//! - Resolve frames lazily into `function @ file:line` form
//! - Wrap arbitrary errors exactly once, keeping the first capture point
//!
//! # Design Decisions
//! - Capture is cheap (unresolved addresses); symbolication happens on first render
//! - Every frame up to the last one inside the logger is dropped, so a trace
//!   starts at the code that called the logger
//! - At most [`MAX_FRAMES`] frames are kept

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Boxed error accepted by the logger and by [`TracedError::wrap`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Upper bound on recorded frames.
pub const MAX_FRAMES: usize = 32;

/// One resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}:{}", self.function, self.file, self.line)
    }
}

struct Captured {
    raw: backtrace::Backtrace,
    skip: usize,
    frames: OnceLock<Vec<StackFrame>>,
}

/// A captured call stack. Clones share the same capture.
#[derive(Clone)]
pub struct Stacktrace {
    inner: Arc<Captured>,
}

impl Stacktrace {
    /// Capture the current stack, dropping logger-internal frames and then `skip` more.
    pub fn capture(skip: usize) -> Self {
        Self {
            inner: Arc::new(Captured {
                raw: backtrace::Backtrace::new_unresolved(),
                skip,
                frames: OnceLock::new(),
            }),
        }
    }

    /// Resolved frames, innermost first.
    pub fn frames(&self) -> &[StackFrame] {
        self.inner.frames.get_or_init(|| {
            let mut raw = self.inner.raw.clone();
            raw.resolve();
            let all: Vec<StackFrame> = raw
                .frames()
                .iter()
                .flat_map(|frame| frame.symbols())
                .map(|symbol| StackFrame {
                    function: symbol
                        .name()
                        .map(|name| format!("{name:#}"))
                        .unwrap_or_else(|| "<unknown>".to_string()),
                    file: symbol
                        .filename()
                        .map(relative_to_cwd)
                        .unwrap_or_else(|| "<unknown>".to_string()),
                    line: symbol.lineno().unwrap_or(0),
                })
                .collect();
            let first_outside = all
                .iter()
                .rposition(|frame| is_internal(&frame.function))
                .map_or(0, |last| last + 1);
            all.into_iter()
                .skip(first_outside + self.inner.skip)
                .take(MAX_FRAMES)
                .collect()
        })
    }

    /// Whether both values come from the same capture.
    pub fn same_capture(&self, other: &Stacktrace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Arrow-joined single-line rendering: `[a @ f:1 <- b @ g:2]`.
    pub fn to_chain(&self) -> String {
        let lines: Vec<String> = self.frames().iter().map(ToString::to_string).collect();
        format!("[{}]", lines.join(" <- "))
    }

    /// Multi-line rendering used after template log lines.
    pub fn to_block(&self) -> String {
        let mut out = String::new();
        for frame in self.frames() {
            out.push_str(&format!("\t{}\n\t\t{}:{}\n", frame.function, frame.file, frame.line));
        }
        out
    }
}

impl fmt::Debug for Stacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stacktrace")
            .field("skip", &self.inner.skip)
            .field("resolved", &self.inner.frames.get().is_some())
            .finish()
    }
}

impl fmt::Display for Stacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_chain())
    }
}

impl serde::Serialize for Stacktrace {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.frames().iter().map(ToString::to_string))
    }
}

fn is_internal(function: &str) -> bool {
    function.starts_with("backtrace::")
        || (function.contains("observability::logging::") && !function.contains("::tests::"))
}

/// Make `path` relative to the working directory when it lives below it.
pub(crate) fn relative_to_cwd(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Name of the function executing `file:line` somewhere up the current stack.
///
/// Used to complete a [`std::panic::Location`], which carries no function name.
pub(crate) fn function_at(file: &str, line: u32) -> Option<String> {
    let mut exact = None;
    let mut same_file = None;
    let mut depth = 0;

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let Some(filename) = symbol.filename() else {
                return;
            };
            if !filename.ends_with(file) {
                return;
            }
            let name = symbol.name().map(|name| format!("{name:#}"));
            if symbol.lineno() == Some(line) && exact.is_none() {
                exact = name;
            } else if same_file.is_none() {
                same_file = name;
            }
        });
        depth += 1;
        exact.is_none() && depth < 2 * MAX_FRAMES
    });

    exact.or(same_file)
}

/// An error annotated with the stack captured where it was first wrapped.
#[derive(Debug)]
pub struct TracedError {
    context: Vec<String>,
    cause: BoxError,
    stack: Stacktrace,
}

impl TracedError {
    /// Wrap `err`, capturing the stack unless it already carries one.
    pub fn wrap<E: Into<BoxError>>(err: E) -> Self {
        let err = err.into();
        match err.downcast::<TracedError>() {
            Ok(traced) => *traced,
            Err(err) => {
                let stack = match find_stacktrace(err.as_ref()) {
                    Some(stack) => stack,
                    None => Stacktrace::capture(0),
                };
                Self {
                    context: Vec::new(),
                    cause: err,
                    stack,
                }
            }
        }
    }

    /// A new error from plain text, with a fresh stacktrace.
    pub fn msg(text: impl Into<String>) -> Self {
        Self::wrap(text.into())
    }

    /// Prefix `text` to the message, keeping the capture point.
    pub fn context(mut self, text: impl Into<String>) -> Self {
        self.context.insert(0, text.into());
        self
    }

    pub fn stacktrace(&self) -> &Stacktrace {
        &self.stack
    }

    /// The wrapped error, without context.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

impl fmt::Display for TracedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for context in &self.context {
            write!(f, "{context}: ")?;
        }
        write!(f, "{}", self.cause)
    }
}

impl StdError for TracedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Innermost stacktrace carried anywhere in the source chain of `err`.
pub fn find_stacktrace(err: &(dyn StdError + 'static)) -> Option<Stacktrace> {
    let mut found = None;
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(traced) = e.downcast_ref::<TracedError>() {
            found = Some(traced.stack.clone());
        }
        current = e.source();
    }
    found
}
