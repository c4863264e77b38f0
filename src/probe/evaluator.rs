//! Per-user evaluation of a probe attempt.
//!
//! ## Evaluation Steps
//!
//! 1. **Probe**: run the transport probe for the user (bounded by the timeout).
//!
//! 2. **Classify**: a successful login means method `none` is accepted. A
//!    failure is only expected when it has OpenSSH's generic exit code *and*
//!    the output lists the methods that can continue. Anything else aborts the
//!    run with UNKNOWN.
//!
//! 3. **Verify**: the output must identify OpenSSH, whatever the outcome.
//!
//! 4. **Mark**: the first auth line is extracted and every method of a fresh
//!    registry copy is marked offered if its name appears on it.
//!
//! 5. **Evaluate**: every method is evaluated (a failure never short-circuits
//!    the rest) and the user verdict is built.
//!
//! Users are processed one after another. The first infrastructure error
//! aborts the whole run and no partial report is produced.

use tracing::{debug, info, warn};

use crate::probe::error::ProbeError;
use crate::probe::parser::{extract_auth_line, has_auth_line, is_openssh, normalize, offered_names};
use crate::probe::registry::{NONE_METHOD, PolicyRegistry};
use crate::probe::report::{ProbeReport, format_status_line};
use crate::probe::transport::{ProbeOutput, ProbeTarget, TransportProbe};
use crate::probe::types::{MethodResult, UserVerdict};

/// Accepted shapes of a probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The client logged in without further authentication.
    LoginSucceeded,
    /// The server rejected the login and listed the methods that can continue.
    AuthenticationRejected,
}

/// Decide whether a probe attempt is usable.
///
/// `text` is the normalized diagnostic output of `output`.
pub fn classify(
    username: &str,
    output: &ProbeOutput,
    text: &str,
) -> Result<ProbeOutcome, ProbeError> {
    let outcome = if output.status.succeeded() {
        ProbeOutcome::LoginSucceeded
    } else if output.status.is_generic_failure() && has_auth_line(text) {
        ProbeOutcome::AuthenticationRejected
    } else {
        return Err(ProbeError::UnexpectedFailure {
            user: username.to_string(),
            exit_code: output.status.exit_code(),
            output: text.to_string(),
        });
    };

    if !is_openssh(text) {
        return Err(ProbeError::UnsupportedServer {
            user: username.to_string(),
        });
    }

    Ok(outcome)
}

/// Set offered flags on a per-user registry copy.
pub fn mark_offered(registry: &mut PolicyRegistry, outcome: ProbeOutcome, auth_line: &str) {
    if outcome == ProbeOutcome::LoginSucceeded
        && let Some(none) = registry.get_mut(NONE_METHOD)
    {
        none.offered = true;
    }

    for method in registry.iter_mut() {
        method.set_offered_if_present(auth_line);
    }
}

/// Evaluate every method of a marked registry into a verdict.
pub fn build_verdict(username: &str, registry: &PolicyRegistry) -> UserVerdict {
    let methods: Vec<MethodResult> = registry.iter().map(MethodResult::from).collect();
    let ok = methods.iter().all(|m| m.ok);
    let outputs: Vec<String> = methods.iter().map(MethodResult::output).collect();

    UserVerdict {
        username: username.to_string(),
        status_line: format_status_line(ok, username, &outputs),
        methods,
        ok,
    }
}

/// Turn one probe attempt into a verdict, using a fresh copy of `template`.
pub fn evaluate_output(
    username: &str,
    template: &PolicyRegistry,
    output: &ProbeOutput,
) -> Result<UserVerdict, ProbeError> {
    let text = normalize(&output.diagnostic);
    debug!("ssh output for {}:\n{}", username, text);

    let outcome = classify(username, output, &text)?;
    let auth_line = extract_auth_line(&text).unwrap_or_default();
    debug!(
        "{}: outcome {:?}, offered {:?}",
        username,
        outcome,
        offered_names(auth_line)
    );

    let mut registry = template.copy();
    mark_offered(&mut registry, outcome, auth_line);

    Ok(build_verdict(username, &registry))
}

/// Runs the probe for each user and evaluates the result.
pub struct UserEvaluator<P> {
    probe: P,
    target: ProbeTarget,
    template: PolicyRegistry,
}

impl<P: TransportProbe> UserEvaluator<P> {
    /// `template` already carries the configured overrides.
    pub fn new(probe: P, target: ProbeTarget, template: PolicyRegistry) -> Self {
        Self {
            probe,
            target,
            template,
        }
    }

    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    /// Probe and evaluate a single user.
    pub async fn evaluate(&self, username: &str) -> Result<UserVerdict, ProbeError> {
        info!(
            "Probing {}@{}:{} with {} (timeout {}s)",
            username,
            self.target.host,
            self.target.port,
            self.probe.name(),
            self.target.timeout.as_secs()
        );

        let output = self.probe.probe(&self.target, username).await?;
        let verdict = evaluate_output(username, &self.template, &output)?;

        if !verdict.ok {
            warn!("Policy mismatch for {}: {}", username, verdict.status_line);
        }
        Ok(verdict)
    }

    /// Evaluate all users in order, stopping at the first error.
    pub async fn evaluate_all(&self, users: &[String]) -> Result<ProbeReport, ProbeError> {
        let mut report = ProbeReport::new();
        for user in users {
            report.push(self.evaluate(user).await?);
        }
        Ok(report)
    }
}
