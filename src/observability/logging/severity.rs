//! Log severities and threshold masks.
//!
//! # Responsibilities
//! - Define the ordered set of severities
//! - Expand a threshold into "this level and everything more severe"
//! - Parse and print level names
//!
//! # Design Decisions
//! - Every severity owns one bit; a threshold is a mask, so filtering is one AND
//! - Parsing is case-insensitive and accepts the common aliases (`warning`, `err`, `fatal`)
//! - The empty string parses to the most permissive level

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single log severity, ordered from least to most important.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug = 1 << 0,
    Info = 1 << 1,
    Notice = 1 << 2,
    Warn = 1 << 3,
    Error = 1 << 4,
    Critical = 1 << 5,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warn,
        Severity::Error,
        Severity::Critical,
    ];

    /// The bit this severity occupies in a [`SeverityMask`].
    pub const fn bit(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// One-character form used by compact templates.
    pub fn short(self) -> &'static str {
        match self {
            Severity::Debug => "D",
            Severity::Info => "I",
            Severity::Notice => "N",
            Severity::Warn => "W",
            Severity::Error => "E",
            Severity::Critical => "!",
        }
    }

    /// True for the severities that carry stacktraces and bump the error counter.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }

    /// Map a `tracing` level onto a severity. `TRACE` folds into debug.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("loglevel is set to unknown value `{0}`")]
pub struct UnrecognizedLevel(pub String);

impl FromStr for Severity {
    type Err = UnrecognizedLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "notice" => Ok(Severity::Notice),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" | "err" => Ok(Severity::Error),
            "fatal" | "critical" => Ok(Severity::Critical),
            _ => Err(UnrecognizedLevel(s.to_string())),
        }
    }
}

/// A set of allowed severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityMask(u8);

const VALID_BITS: u8 = (Severity::Critical.bit() << 1) - 1;

impl SeverityMask {
    /// Every severity passes.
    pub const ALL: SeverityMask = SeverityMask(VALID_BITS);

    /// Everything except debug.
    pub const DEFAULT: SeverityMask = SeverityMask::from_level(Severity::Info);

    /// `level` and every more severe level.
    pub const fn from_level(level: Severity) -> Self {
        Self(!(level.bit() - 1) & VALID_BITS)
    }

    /// Parse a level name and expand it into a threshold mask.
    pub fn parse(level: &str) -> Result<Self, UnrecognizedLevel> {
        level.parse::<Severity>().map(Self::from_level)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn allows(self, level: Severity) -> bool {
        self.0 & level.bit() != 0
    }

    /// Least severe level contained in the mask.
    pub fn lowest(self) -> Option<Severity> {
        Severity::ALL.into_iter().find(|s| self.allows(*s))
    }

    /// Equivalent `tracing` filter directive, as close as the coarser scale allows.
    pub fn tracing_directive(self) -> &'static str {
        match self.lowest() {
            Some(Severity::Debug) => "debug",
            Some(Severity::Info) | Some(Severity::Notice) => "info",
            Some(Severity::Warn) => "warn",
            Some(_) => "error",
            None => "off",
        }
    }
}

impl Default for SeverityMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Severity> for SeverityMask {
    fn from(level: Severity) -> Self {
        Self::from_level(level)
    }
}

impl fmt::Display for SeverityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Severity::ALL
            .into_iter()
            .filter(|s| self.allows(*s))
            .map(Severity::as_str)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

/// Whether `level` passes a filter configured at `threshold`.
pub fn allowed(threshold: Severity, level: Severity) -> bool {
    SeverityMask::from_level(threshold).allows(level)
}
