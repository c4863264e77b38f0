//! A single SSH authentication method and its declared policy.
//!
//! The policy is a three-state enum rather than a pair of `allowed`/`ignored`
//! flags, so "allowed and ignored at the same time" cannot be expressed.
//!
//! # Evaluation Table
//!
//! | Policy | Offered | ok    | Explanation                        |
//! |--------|---------|-------|------------------------------------|
//! | Ignore | any     | true  | `ignored`                          |
//! | Allow  | true    | true  | `allowed`                          |
//! | Forbid | false   | true  | `forbidden`                        |
//! | Allow  | false   | false | `forbidden but should be allowed`  |
//! | Forbid | true    | false | `allowed but should be forbidden`  |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::probe::error::ProbeError;

/// Declared requirement for one authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// The server must offer the method.
    Allow,
    /// The server must not offer the method.
    Forbid,
    /// The method is not checked.
    Ignore,
}

impl Policy {
    /// Parse an override token.
    ///
    /// Only the first character is significant and it is case-sensitive:
    /// `a` → Allow, `f` → Forbid, `i` → Ignore. So `"a"`, `"allow"` and
    /// `"anything"` are all Allow, while `"A"` and `""` are rejected.
    pub fn from_token(token: &str) -> Result<Self, ProbeError> {
        match token.chars().next() {
            Some('a') => Ok(Policy::Allow),
            Some('f') => Ok(Policy::Forbid),
            Some('i') => Ok(Policy::Ignore),
            _ => Err(ProbeError::InvalidPolicyToken {
                token: token.to_string(),
            }),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Allow => write!(f, "allowed"),
            Policy::Forbid => write!(f, "forbidden"),
            Policy::Ignore => write!(f, "ignored"),
        }
    }
}

/// Outcome of comparing a policy against what the server offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub ok: bool,
    pub explanation: &'static str,
}

impl Evaluation {
    fn new(ok: bool, explanation: &'static str) -> Self {
        Self { ok, explanation }
    }
}

/// One authentication method with its policy and the observed offered flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMethod {
    /// Protocol identifier matched against the diagnostic text (lowercase).
    pub name: &'static str,
    /// Label used in reports.
    pub display_name: &'static str,
    pub policy: Policy,
    /// Whether the server offered the method in this run.
    pub offered: bool,
}

impl AuthMethod {
    pub const fn new(name: &'static str, display_name: &'static str, policy: Policy) -> Self {
        Self {
            name,
            display_name,
            policy,
            offered: false,
        }
    }

    /// Set the policy from an override token (see [`Policy::from_token`]).
    ///
    /// The policy is left untouched when the token is rejected.
    pub fn set_policy(&mut self, token: &str) -> Result<(), ProbeError> {
        self.policy = Policy::from_token(token)?;
        Ok(())
    }

    /// Mark the method offered if its name occurs in `auth_line`.
    ///
    /// `auth_line` must already be lower-cased. A method that is already
    /// offered stays offered.
    pub fn set_offered_if_present(&mut self, auth_line: &str) {
        if auth_line.contains(self.name) {
            self.offered = true;
        }
    }

    /// Compare the policy against the offered flag.
    pub fn evaluate(&self) -> Evaluation {
        match (self.policy, self.offered) {
            (Policy::Ignore, _) => Evaluation::new(true, "ignored"),
            (Policy::Allow, true) => Evaluation::new(true, "allowed"),
            (Policy::Forbid, false) => Evaluation::new(true, "forbidden"),
            (Policy::Allow, false) => Evaluation::new(false, "forbidden but should be allowed"),
            (Policy::Forbid, true) => Evaluation::new(false, "allowed but should be forbidden"),
        }
    }
}

/// Report form: `"<DisplayName>: <explanation>"`.
impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_name, self.evaluate().explanation)
    }
}
