//! Error types for the authentication method probe.
//!
//! Errors fall into two groups:
//!
//! 1. **Configuration errors**: bad override tokens, unknown method names, a
//!    missing host. These are raised before any probing happens.
//!
//! 2. **Infrastructure errors**: the SSH client could not be run, failed in an
//!    unexpected way, or the server could not be verified as OpenSSH. These mean
//!    the check itself is broken and abort the whole run.
//!
//! Both groups map to [`Severity::Unknown`]. A server offering a method that the
//! policy forbids is *not* an error: it is reported through a
//! [`UserVerdict`](crate::probe::types::UserVerdict) with `ok == false` and
//! ends up as [`Severity::Critical`].

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::probe::report::Severity;

/// Errors that abort a probe run.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Override token did not start with `a`, `f` or `i`.
    #[error("unknown state {token:?}, need a[llow], f[orbid], i[gnore]")]
    InvalidPolicyToken { token: String },

    /// Override named a method that is not in the registry.
    #[error("unknown authentication method {name:?}")]
    MethodNotFound { name: String },

    #[error("--host has to be set! See --help for more details.")]
    MissingHost,

    /// Any other unusable command line or environment value.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Can't find ssh binary {binary:?}: {source}")]
    TransportUnavailable {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("ssh for user {user} did not finish within {timeout:?}")]
    TransportTimeout { user: String, timeout: Duration },

    /// The client failed, but not with the expected authentication failure.
    #[error("Error running ssh for user {user}: {}\n{output}", describe_exit(.exit_code))]
    UnexpectedFailure {
        user: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("SSH binary is not OpenSSH - only OpenSSH is supported! (user {user})")]
    UnsupportedServer { user: String },

    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProbeError {
    /// Monitoring severity for this error. Always UNKNOWN.
    pub fn severity(&self) -> Severity {
        Severity::Unknown
    }

    /// True for errors raised before any probe ran.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProbeError::InvalidPolicyToken { .. }
                | ProbeError::MethodNotFound { .. }
                | ProbeError::MissingHost
                | ProbeError::InvalidArgument(_)
        )
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classification {
        use super::*;

        #[test]
        fn test_configuration_errors() {
            assert!(
                ProbeError::InvalidPolicyToken {
                    token: "x".to_string()
                }
                .is_configuration()
            );
            assert!(
                ProbeError::MethodNotFound {
                    name: "kerberos".to_string()
                }
                .is_configuration()
            );
            assert!(ProbeError::MissingHost.is_configuration());
            assert!(ProbeError::InvalidArgument("bad".to_string()).is_configuration());
        }

        #[test]
        fn test_infrastructure_errors() {
            let unavailable = ProbeError::TransportUnavailable {
                binary: "ssh".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            };
            let unsupported = ProbeError::UnsupportedServer {
                user: "root".to_string(),
            };
            assert!(!unavailable.is_configuration());
            assert!(!unsupported.is_configuration());
        }

        #[test]
        fn test_every_error_is_unknown_severity() {
            let errors = vec![
                ProbeError::MissingHost,
                ProbeError::TransportTimeout {
                    user: "root".to_string(),
                    timeout: Duration::from_secs(15),
                },
                ProbeError::UnexpectedFailure {
                    user: "root".to_string(),
                    exit_code: Some(1),
                    output: String::new(),
                },
            ];
            for err in errors {
                assert_eq!(err.severity(), Severity::Unknown);
            }
        }
    }

    mod messages {
        use super::*;

        #[test]
        fn test_invalid_token_message() {
            let err = ProbeError::InvalidPolicyToken {
                token: "yes".to_string(),
            };
            assert_eq!(
                err.to_string(),
                "unknown state \"yes\", need a[llow], f[orbid], i[gnore]"
            );
        }

        #[test]
        fn test_unexpected_failure_includes_exit_status_and_output() {
            let err = ProbeError::UnexpectedFailure {
                user: "admin".to_string(),
                exit_code: Some(1),
                output: "ssh: could not resolve hostname".to_string(),
            };
            let msg = err.to_string();
            assert!(msg.contains("exit status 1"));
            assert!(msg.contains("could not resolve hostname"));
        }

        #[test]
        fn test_unexpected_failure_without_exit_code() {
            let err = ProbeError::UnexpectedFailure {
                user: "admin".to_string(),
                exit_code: None,
                output: String::new(),
            };
            assert!(err.to_string().contains("terminated by signal"));
        }
    }
}
