//! SSH authentication method probe.
//!
//! This module is organized into the following submodules:
//!
//! - `method`: A single authentication method, its policy and evaluation rule
//! - `registry`: Ordered default methods and per-user working copies
//! - `parser`: Normalization and parsing of `ssh -v` output
//! - `evaluator`: Per-user probe classification and verdicts
//! - `report`: Aggregation into plugin output and severity
//! - `transport`: Transport probes that run the SSH client
//! - `config`: Configuration resolution with environment variable support
//! - `error`: Configuration and infrastructure errors
//! - `types`: Serializable result types

pub mod config;
pub mod error;
pub mod evaluator;
pub mod method;
pub mod parser;
pub mod registry;
pub mod report;
pub mod transport;
pub mod types;

pub use config::{ProbeConfig, ProbeParams};
pub use error::ProbeError;
pub use evaluator::UserEvaluator;
pub use method::{AuthMethod, Policy};
pub use registry::{DEFAULT_REGISTRY, PolicyRegistry};
pub use report::{OutputFormat, ProbeReport, Severity};
pub use transport::{OpenSshProbe, ProbeTarget, TransportProbe};
