//! Aggregation of per-user verdicts into plugin output.
//!
//! Output follows the Nagios/Icinga plugin convention: a summary line, one
//! detail line per user, and an exit code taken from [`Severity`].
//!
//! ```text
//! CRITICAL for user(s) admin
//! OK:  root (None: forbidden, Hostbased: forbidden, ...)
//! CRITICAL: admin (None: forbidden, Hostbased: forbidden, Password: allowed but should be forbidden, ...)
//! ```

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::probe::error::ProbeError;
use crate::probe::transport::ProbeTarget;
use crate::probe::types::{ReportDocument, UserVerdict};

/// Monitoring plugin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    /// The check itself failed; never used for policy violations.
    Unknown,
}

impl Severity {
    /// Process exit code for this state.
    pub fn exit_code(&self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Output format of the plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary line followed by one line per user
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

/// Detail line for one user: `"<TAG>: <user> (<methods>)"`.
///
/// The username is right-aligned to five columns so short names line up.
pub fn format_status_line(ok: bool, username: &str, outputs: &[String]) -> String {
    let tag = if ok { Severity::Ok } else { Severity::Critical };
    format!("{}: {:>5} ({})", tag, username, outputs.join(", "))
}

/// Single line printed when the run aborts.
pub fn render_unknown(error: &ProbeError) -> String {
    format!("{}: {}", error.severity(), error)
}

/// Verdicts for all configured users, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    verdicts: Vec<UserVerdict>,
}

impl ProbeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, verdict: UserVerdict) {
        self.verdicts.push(verdict);
    }

    pub fn verdicts(&self) -> &[UserVerdict] {
        &self.verdicts
    }

    /// CRITICAL if any user failed, else OK.
    pub fn severity(&self) -> Severity {
        if self.verdicts.iter().all(|v| v.ok) {
            Severity::Ok
        } else {
            Severity::Critical
        }
    }

    pub fn failing_users(&self) -> Vec<&str> {
        self.verdicts
            .iter()
            .filter(|v| !v.ok)
            .map(|v| v.username.as_str())
            .collect()
    }

    pub fn checked_users(&self) -> Vec<&str> {
        self.verdicts.iter().map(|v| v.username.as_str()).collect()
    }

    /// Summary naming all users when OK, or only the failing ones.
    pub fn summary(&self) -> String {
        match self.severity() {
            Severity::Ok => format!("OK, checked user(s) {}", self.checked_users().join(", ")),
            _ => format!("CRITICAL for user(s) {}", self.failing_users().join(", ")),
        }
    }

    /// Summary line followed by each user's detail line.
    pub fn render_text(&self) -> String {
        let mut lines = vec![self.summary()];
        lines.extend(self.verdicts.iter().map(|v| v.status_line.clone()));
        lines.join("\n")
    }

    pub fn to_document(
        &self,
        target: &ProbeTarget,
        checked_at: impl Into<String>,
    ) -> ReportDocument {
        ReportDocument {
            status: self.severity(),
            summary: self.summary(),
            checked_at: checked_at.into(),
            host: target.host.clone(),
            port: target.port,
            users: self.verdicts.clone(),
        }
    }

    /// Render in the requested format.
    pub fn render(
        &self,
        format: OutputFormat,
        target: &ProbeTarget,
        checked_at: impl Into<String>,
    ) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.to_document(target, checked_at))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn verdict(username: &str, ok: bool) -> UserVerdict {
        let outputs = vec!["None: forbidden".to_string()];
        UserVerdict {
            username: username.to_string(),
            methods: Vec::new(),
            ok,
            status_line: format_status_line(ok, username, &outputs),
        }
    }

    fn target() -> ProbeTarget {
        ProbeTarget {
            host: "example.com".to_string(),
            port: 22,
            timeout: Duration::from_secs(10),
        }
    }

    mod severity {
        use super::*;

        #[test]
        fn test_exit_codes() {
            assert_eq!(Severity::Ok.exit_code(), 0);
            assert_eq!(Severity::Warning.exit_code(), 1);
            assert_eq!(Severity::Critical.exit_code(), 2);
            assert_eq!(Severity::Unknown.exit_code(), 3);
        }

        #[test]
        fn test_display() {
            assert_eq!(Severity::Ok.to_string(), "OK");
            assert_eq!(Severity::Critical.to_string(), "CRITICAL");
            assert_eq!(Severity::Unknown.to_string(), "UNKNOWN");
        }

        #[test]
        fn test_ordering_by_badness() {
            assert!(Severity::Ok < Severity::Warning);
            assert!(Severity::Critical < Severity::Unknown);
        }
    }

    mod status_line {
        use super::*;

        #[test]
        fn test_short_username_is_padded() {
            let line = format_status_line(true, "bob", &["None: forbidden".to_string()]);
            assert_eq!(line, "OK:   bob (None: forbidden)");
        }

        #[test]
        fn test_long_username_is_not_truncated() {
            let line = format_status_line(
                false,
                "administrator",
                &[
                    "None: forbidden".to_string(),
                    "Password: allowed but should be forbidden".to_string(),
                ],
            );
            assert_eq!(
                line,
                "CRITICAL: administrator (None: forbidden, Password: allowed but should be forbidden)"
            );
        }
    }

    mod aggregation {
        use super::*;

        #[test]
        fn test_all_ok() {
            let mut report = ProbeReport::new();
            report.push(verdict("root", true));
            report.push(verdict("admin", true));

            assert_eq!(report.severity(), Severity::Ok);
            assert_eq!(report.summary(), "OK, checked user(s) root, admin");
            assert!(report.failing_users().is_empty());
        }

        #[test]
        fn test_single_failure_is_critical() {
            let mut report = ProbeReport::new();
            report.push(verdict("root", true));
            report.push(verdict("admin", false));
            report.push(verdict("deploy", true));

            assert_eq!(report.severity(), Severity::Critical);
            assert_eq!(report.summary(), "CRITICAL for user(s) admin");
        }

        #[test]
        fn test_multiple_failures_in_order() {
            let mut report = ProbeReport::new();
            report.push(verdict("zed", false));
            report.push(verdict("root", true));
            report.push(verdict("amy", false));

            assert_eq!(report.failing_users(), vec!["zed", "amy"]);
            assert_eq!(report.summary(), "CRITICAL for user(s) zed, amy");
        }

        #[test]
        fn test_render_text_lists_every_user() {
            let mut report = ProbeReport::new();
            report.push(verdict("root", true));
            report.push(verdict("admin", false));

            assert_eq!(
                report.render_text(),
                "CRITICAL for user(s) admin\n\
                 OK:  root (None: forbidden)\n\
                 CRITICAL: admin (None: forbidden)"
            );
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn test_unknown_line() {
            assert_eq!(
                render_unknown(&ProbeError::MissingHost),
                "UNKNOWN: --host has to be set! See --help for more details."
            );
        }

        #[test]
        fn test_json_render() {
            let mut report = ProbeReport::new();
            report.push(verdict("root", true));

            let json = report
                .render(OutputFormat::Json, &target(), "2024-05-01T10:00:00+00:00")
                .unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();

            assert_eq!(value["status"], "OK");
            assert_eq!(value["host"], "example.com");
            assert_eq!(value["checked_at"], "2024-05-01T10:00:00+00:00");
            assert_eq!(value["users"].as_array().unwrap().len(), 1);
        }

        #[test]
        fn test_text_render_ignores_target() {
            let mut report = ProbeReport::new();
            report.push(verdict("root", true));
            let text = report.render(OutputFormat::Text, &target(), "").unwrap();
            assert_eq!(text, report.render_text());
        }
    }
}
