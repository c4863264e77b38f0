//! Transport probes that produce SSH client diagnostic output.
//!
//! The evaluator only depends on the [`TransportProbe`] trait, so tests can
//! feed it scripted output while production runs the OpenSSH client.
//!
//! # Available Probes
//!
//! - [`OpenSshProbe`]: runs `ssh -v` in batch mode and captures its output

mod openssh;
mod traits;

pub use openssh::{OpenSshProbe, build_ssh_args};
pub use traits::{GENERIC_FAILURE_EXIT_CODE, ProbeOutput, ProbeStatus, ProbeTarget, TransportProbe};
