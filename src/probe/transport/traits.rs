//! Transport probe trait and its input/output types.

use std::time::Duration;

use async_trait::async_trait;

use crate::probe::error::ProbeError;

/// Exit code OpenSSH uses for every error, including rejected authentication.
pub const GENERIC_FAILURE_EXIT_CODE: i32 = 255;

/// Host to probe, shared by all users of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

/// How the client process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The client exited successfully, so the login went through.
    Succeeded,
    /// The client failed. `exit_code` is `None` when killed by a signal.
    Failed { exit_code: Option<i32> },
}

impl ProbeStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, ProbeStatus::Succeeded)
    }

    /// Failure with OpenSSH's catch-all exit code.
    pub fn is_generic_failure(&self) -> bool {
        matches!(
            self,
            ProbeStatus::Failed {
                exit_code: Some(GENERIC_FAILURE_EXIT_CODE)
            }
        )
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProbeStatus::Succeeded => Some(0),
            ProbeStatus::Failed { exit_code } => *exit_code,
        }
    }
}

/// Raw client output plus exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    /// Combined stderr and stdout, not yet normalized.
    pub diagnostic: Vec<u8>,
    pub status: ProbeStatus,
}

/// Trait for transport probes.
///
/// Implementations must be `Send + Sync` and must return within a bounded
/// time derived from [`ProbeTarget::timeout`].
#[async_trait]
pub trait TransportProbe: Send + Sync {
    /// Attempt a login as `username` and capture the client diagnostics.
    ///
    /// # Returns
    ///
    /// * `Ok(ProbeOutput)` - The client ran; success or failure is in `status`
    /// * `Err(ProbeError)` - The client could not be run or did not finish in time
    async fn probe(&self, target: &ProbeTarget, username: &str)
    -> Result<ProbeOutput, ProbeError>;

    /// Name of this probe, used in logs.
    fn name(&self) -> &'static str;
}
