//! Build and process identity.
//!
//! Name and version come from the package. Commit, branch and build time are
//! read from `GIT_COMMIT`, `GIT_BRANCH` and `BUILD_TIME` at compile time and
//! fall back to development placeholders.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const COMMIT: &str = match option_env!("GIT_COMMIT") {
    Some(commit) => commit,
    None => "NO_COMMIT",
};

pub const BRANCH: &str = match option_env!("GIT_BRANCH") {
    Some(branch) => branch,
    None => "NO_BRANCH",
};

pub const BUILD_TIME: &str = match option_env!("BUILD_TIME") {
    Some(time) => time,
    None => "NO_BUILD_TIME",
};

static START_TIME: OnceLock<DateTime<Utc>> = OnceLock::new();

/// Process start time. Fixed by the first call; `main` calls it early.
pub fn start_time() -> DateTime<Utc> {
    *START_TIME.get_or_init(Utc::now)
}

/// Payload served on `/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub build_time: String,
    pub start_time: String,
    pub commit: String,
    pub branch: String,
}

impl VersionInfo {
    /// Identity of the running binary.
    pub fn current() -> Self {
        Self {
            name: NAME.to_string(),
            version: VERSION.to_string(),
            build_time: BUILD_TIME.to_string(),
            start_time: start_time().to_rfc3339_opts(SecondsFormat::Secs, true),
            commit: COMMIT.to_string(),
            branch: BRANCH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_time_is_stable() {
        let first = start_time();
        assert_eq!(first, start_time());
    }

    #[test]
    fn payload_uses_package_identity() {
        let info = VersionInfo::current();
        assert_eq!(info.name, "calculator-service");
        assert!(!info.commit.is_empty());

        let json = serde_json::to_value(&info).unwrap();
        for key in ["name", "version", "build_time", "start_time", "commit", "branch"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
