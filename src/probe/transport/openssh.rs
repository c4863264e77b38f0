//! OpenSSH client transport probe.
//!
//! Runs the system `ssh` binary in verbose batch mode:
//!
//! ```text
//! ssh -v -o "BatchMode yes" -o "PubkeyAuthentication no" \
//!     -o "StrictHostKeyChecking no" -o "ConnectTimeout <secs>" \
//!     -l <user> -p <port> <host> exit
//! ```
//!
//! Public key authentication is disabled so local keys never log in; the
//! server still lists `publickey` among the methods that can continue.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::probe::error::ProbeError;

use super::traits::{ProbeOutput, ProbeStatus, ProbeTarget, TransportProbe};

/// Extra time granted on top of `ConnectTimeout` before the client is killed.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Build the argument list passed to the ssh binary.
pub fn build_ssh_args(target: &ProbeTarget, username: &str) -> Vec<String> {
    vec![
        "-v".to_string(),
        "-o".to_string(),
        "BatchMode yes".to_string(),
        "-o".to_string(),
        "PubkeyAuthentication no".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking no".to_string(),
        "-o".to_string(),
        format!("ConnectTimeout {}", target.timeout.as_secs()),
        "-l".to_string(),
        username.to_string(),
        "-p".to_string(),
        target.port.to_string(),
        target.host.clone(),
        "exit".to_string(),
    ]
}

/// Transport probe backed by the OpenSSH command line client.
#[derive(Debug, Clone)]
pub struct OpenSshProbe {
    binary: String,
}

impl OpenSshProbe {
    /// Create a probe that runs `binary` (a name on `PATH` or a full path).
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for OpenSshProbe {
    fn default() -> Self {
        Self::new("ssh")
    }
}

#[async_trait]
impl TransportProbe for OpenSshProbe {
    async fn probe(
        &self,
        target: &ProbeTarget,
        username: &str,
    ) -> Result<ProbeOutput, ProbeError> {
        let args = build_ssh_args(target, username);
        debug!("Running {} {:?}", self.binary, args);

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::TransportUnavailable {
                binary: self.binary.clone(),
                source,
            })?;

        let deadline = target.timeout.saturating_add(KILL_GRACE);
        let output = tokio::time::timeout(deadline, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(
                    "ssh for {}@{}:{} exceeded {:?}, killing client",
                    username, target.host, target.port, deadline
                );
                ProbeError::TransportTimeout {
                    user: username.to_string(),
                    timeout: deadline,
                }
            })?
            .map_err(|source| ProbeError::TransportUnavailable {
                binary: self.binary.clone(),
                source,
            })?;

        let status = if output.status.success() {
            ProbeStatus::Succeeded
        } else {
            ProbeStatus::Failed {
                exit_code: output.status.code(),
            }
        };

        // ssh -v writes its debug lines to stderr
        let mut diagnostic = output.stderr;
        diagnostic.extend_from_slice(&output.stdout);

        debug!(
            "ssh for {}@{} finished with {:?} ({} bytes of output)",
            username,
            target.host,
            status,
            diagnostic.len()
        );

        Ok(ProbeOutput { diagnostic, status })
    }

    fn name(&self) -> &'static str {
        "openssh"
    }
}
