//! Serializable result types for probe runs.
//!
//! These types back both the plain-text plugin output and the JSON report.

use serde::{Deserialize, Serialize};

use crate::probe::method::{AuthMethod, Policy};
use crate::probe::report::Severity;

/// Result for one authentication method of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: String,
    pub display_name: String,
    pub policy: Policy,
    /// Whether the server offered the method
    pub offered: bool,
    pub ok: bool,
    pub explanation: String,
}

impl From<&AuthMethod> for MethodResult {
    fn from(method: &AuthMethod) -> Self {
        let evaluation = method.evaluate();
        Self {
            method: method.name.to_string(),
            display_name: method.display_name.to_string(),
            policy: method.policy,
            offered: method.offered,
            ok: evaluation.ok,
            explanation: evaluation.explanation.to_string(),
        }
    }
}

impl MethodResult {
    /// `"<DisplayName>: <explanation>"`
    pub fn output(&self) -> String {
        format!("{}: {}", self.display_name, self.explanation)
    }
}

/// Pass/fail outcome for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVerdict {
    pub username: String,
    /// Per-method results in registry order
    pub methods: Vec<MethodResult>,
    /// True only if every method result is ok
    pub ok: bool,
    /// Formatted detail line, e.g. `OK:  root (None: forbidden, ...)`
    pub status_line: String,
}

/// Full JSON report for one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportDocument {
    pub status: Severity,
    pub summary: String,
    /// When the report was produced (RFC3339 format)
    pub checked_at: String,
    pub host: String,
    pub port: u16,
    pub users: Vec<UserVerdict>,
}
