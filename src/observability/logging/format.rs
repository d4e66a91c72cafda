//! Record formatters.
//!
//! # Responsibilities
//! - Render a [`Record`] as one JSON object per line
//! - Render a [`Record`] through a `$key` template, with `$.` expanding to the leftovers
//!
//! # Design Decisions
//! - Formatters are pure: record in, newline-terminated text out
//! - Template placeholders are case-insensitive and match `$[A-Za-z_]+`
//! - Leftover pairs are rendered in logfmt, keyed `$name`, and keep input order

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::OnceLock;

use colored::Colorize;
use regex::Regex;

use super::record::{is_reserved, Record};
use super::severity::Severity;

/// Template used by the `quick` log format.
pub const QUICK_TEMPLATE: &str = "[$severity_s][$source_location] $message $.";

/// Turns a record into text ready to be written.
pub trait Format: Send + Sync {
    /// Render `record`, including the trailing newline.
    fn format(&self, record: &Record) -> Result<String, serde_json::Error>;
}

/// One JSON object per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn format(&self, record: &Record) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        Ok(line)
    }
}

/// Template rendering such as `[$severity_s] $message $.`.
#[derive(Debug, Clone)]
pub struct TemplateFormat {
    template: String,
    colors: bool,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$[A-Za-z_]+").expect("placeholder pattern is valid"))
}

impl TemplateFormat {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            colors: false,
        }
    }

    /// Colour the message by severity and highlight stack traces.
    pub fn with_colors(mut self, colors: bool) -> Self {
        if colors {
            colored::control::set_override(true);
        }
        self.colors = colors;
        self
    }

    fn colorize(&self, severity: Severity, text: &str) -> String {
        if !self.colors {
            return text.to_string();
        }
        match severity {
            Severity::Debug => text.cyan().to_string(),
            Severity::Info => text.green().to_string(),
            Severity::Notice => text.green().bold().underline().to_string(),
            Severity::Warn => text.yellow().bold().underline().to_string(),
            Severity::Error | Severity::Critical => text.red().bold().underline().to_string(),
        }
    }
}

impl Format for TemplateFormat {
    fn format(&self, record: &Record) -> Result<String, serde_json::Error> {
        let mut values: HashMap<String, String> = HashMap::new();
        let mut params: Vec<String> = Vec::new();

        for (key, value) in record.fields() {
            let key = key.to_lowercase();
            if !is_reserved(&key) && !params.contains(&key) {
                params.push(key.clone());
            }
            values.insert(key, value.to_string());
        }
        values.insert("severity".into(), record.severity().as_str().into());
        values.insert("severity_s".into(), record.severity().short().into());

        let mut referenced: HashSet<String> = HashSet::new();
        let rendered = placeholder_pattern().replace_all(&self.template, |caps: &regex::Captures<'_>| {
            let key = caps[0][1..].to_lowercase();
            let value = values.get(&key).cloned().unwrap_or_default();
            let value = if key == "message" {
                self.colorize(record.severity(), &value)
            } else {
                value
            };
            referenced.insert(key);
            value
        });

        let leftover_keys: Vec<(String, &str)> = params
            .iter()
            .filter(|key| !referenced.contains(*key))
            .map(|key| (format!("${key}"), values.get(key).map(String::as_str).unwrap_or("")))
            .collect();
        let leftovers: Vec<(&str, &str)> = leftover_keys.iter().map(|(key, value)| (key.as_str(), *value)).collect();
        let leftovers = if leftovers.is_empty() {
            String::new()
        } else {
            format!("({})", logfmt(&leftovers))
        };

        let mut out = rendered.replace("$.", &leftovers);
        out.push('\n');

        if let Some(stacktrace) = record.stacktrace() {
            if self.colors {
                out.push_str(&"Stack Trace:".bright_red().to_string());
                out.push('\n');
            } else {
                out.push_str("Stack Trace:\n");
            }
            out.push_str(&stacktrace.to_block());
        }

        Ok(out)
    }
}

/// Encode pairs as `key=value key2="quoted value"`.
pub fn logfmt(pairs: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{key}={}", logfmt_value(value));
    }
    out
}

fn logfmt_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c <= ' ' || c == '=' || c == '"' || c == '\u{7f}');
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::record::SourceLocation;
    use crate::observability::logging::stacktrace::TracedError;

    fn sample() -> Record {
        let mut record = Record::new(Severity::Warn);
        record.push("severity", "warn");
        record.push("message", "disk almost full");
        record.push("mount", "/var");
        record.push("used", 93);
        record.push(
            "source_location",
            SourceLocation {
                file: "src/disk.rs".into(),
                line: 7,
                function: None,
            },
        );
        record
    }

    #[test]
    fn json_is_one_line() {
        let line = JsonFormat.format(&sample()).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "disk almost full");
        assert_eq!(value["used"], 93);
        assert_eq!(value["source_location"]["file"], "src/disk.rs");
        assert_eq!(value["source_location"]["line"], 7);
    }

    #[test]
    fn json_keeps_input_order() {
        let line = JsonFormat.format(&sample()).unwrap();
        let severity = line.find("\"severity\"").unwrap();
        let message = line.find("\"message\"").unwrap();
        let mount = line.find("\"mount\"").unwrap();
        assert!(severity < message && message < mount);
    }

    #[test]
    fn template_substitutes_and_collects_leftovers() {
        let line = TemplateFormat::new("[$severity_s] $message $.").format(&sample()).unwrap();
        assert_eq!(line, "[W] disk almost full ($mount=/var $used=93)\n");
    }

    #[test]
    fn referenced_keys_are_not_repeated() {
        let line = TemplateFormat::new("$MOUNT: $message $.").format(&sample()).unwrap();
        assert_eq!(line, "/var: disk almost full ($used=93)\n");
    }

    #[test]
    fn no_leftovers_render_empty() {
        let line = TemplateFormat::new("$message$.").format(&sample()).unwrap();
        assert!(line.starts_with("disk almost full("));

        let mut bare = Record::new(Severity::Info);
        bare.push("message", "hello");
        let line = TemplateFormat::new("$message $.").format(&bare).unwrap();
        assert_eq!(line, "hello \n");
    }

    #[test]
    fn quick_template_shows_location() {
        let line = TemplateFormat::new(QUICK_TEMPLATE).format(&sample()).unwrap();
        assert!(line.starts_with("[W][src/disk.rs:7] disk almost full"));
    }

    #[test]
    fn unknown_placeholder_is_empty() {
        let line = TemplateFormat::new("<$nothing_here>").format(&sample()).unwrap();
        assert_eq!(line, "<>\n");
    }

    #[test]
    fn stacktrace_block_follows_line() {
        let err = TracedError::msg("broken");
        let mut record = Record::new(Severity::Error);
        record.push("message", err.to_string());
        record.push("stacktrace", err.stacktrace().clone());

        let out = TemplateFormat::new("$message").format(&record).unwrap();
        assert!(out.starts_with("broken\nStack Trace:\n"));
        assert!(!out.contains("stacktrace="));
    }

    #[test]
    fn logfmt_quotes_when_needed() {
        assert_eq!(logfmt(&[("a", "b")]), "a=b");
        assert_eq!(logfmt(&[("a", "two words"), ("b", "")]), r#"a="two words" b="""#);
        assert_eq!(logfmt(&[("q", "say \"hi\"")]), r#"q="say \"hi\"""#);
    }
}
