//! Configuration resolution for the probe.
//!
//! Values are resolved with a three-tier priority system:
//!
//! 1. **Parameter** - Value given on the command line (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CHECK_SSH_HOST` | - | Host to probe (required) |
//! | `CHECK_SSH_PORT` | 22 | SSH port |
//! | `CHECK_SSH_TIMEOUT` | 10s | Connect timeout in seconds |
//! | `CHECK_SSH_BINARY` | `ssh` | SSH client binary |

use std::env;
use std::time::Duration;

use tracing::debug;

use crate::probe::error::ProbeError;
use crate::probe::registry::{DEFAULT_REGISTRY, PolicyRegistry};
use crate::probe::transport::ProbeTarget;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default connect timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default SSH client binary
pub const DEFAULT_SSH_BINARY: &str = "ssh";

/// User checked when none is configured
pub const DEFAULT_USER: &str = "root";

/// Environment variable name for the host
pub const HOST_ENV_VAR: &str = "CHECK_SSH_HOST";

/// Environment variable name for the port
pub const PORT_ENV_VAR: &str = "CHECK_SSH_PORT";

/// Environment variable name for the timeout
pub const TIMEOUT_ENV_VAR: &str = "CHECK_SSH_TIMEOUT";

/// Environment variable name for the ssh binary
pub const SSH_BINARY_ENV_VAR: &str = "CHECK_SSH_BINARY";

/// Resolve the host with priority: parameter -> env var. There is no default.
///
/// A host starting with `-` is rejected; ssh would read it as an option.
pub fn resolve_host(host_param: Option<String>) -> Result<String, ProbeError> {
    // Priority 1: Use parameter if provided
    if let Some(host) = host_param.filter(|h| !h.is_empty()) {
        return check_host(host);
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_host) = env::var(HOST_ENV_VAR)
        && !env_host.is_empty()
    {
        return check_host(env_host);
    }

    Err(ProbeError::MissingHost)
}

fn check_host(host: String) -> Result<String, ProbeError> {
    if host.starts_with('-') {
        return Err(ProbeError::InvalidArgument(format!(
            "invalid host {:?}: must not start with '-'",
            host
        )));
    }
    Ok(host)
}

/// Resolve the port with priority: parameter -> env var -> default
pub fn resolve_port(port_param: Option<u16>) -> u16 {
    // Priority 1: Use parameter if provided
    if let Some(port) = port_param {
        return port;
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_port) = env::var(PORT_ENV_VAR)
        && let Ok(port) = env_port.parse::<u16>()
    {
        return port;
    }

    // Priority 3: Default value
    DEFAULT_PORT
}

/// Resolve the timeout in seconds with priority: parameter -> env var -> default
pub fn resolve_timeout(timeout_param: Option<u64>) -> u64 {
    // Priority 1: Use parameter if provided
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_timeout) = env::var(TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        return timeout;
    }

    // Priority 3: Default value
    DEFAULT_TIMEOUT_SECS
}

/// Resolve the ssh binary with priority: parameter -> env var -> default
pub fn resolve_ssh_binary(binary_param: Option<String>) -> String {
    if let Some(binary) = binary_param.filter(|b| !b.is_empty()) {
        return binary;
    }

    if let Ok(env_binary) = env::var(SSH_BINARY_ENV_VAR)
        && !env_binary.is_empty()
    {
        return env_binary;
    }

    DEFAULT_SSH_BINARY.to_string()
}

/// Users to check; `root` when none were given.
pub fn resolve_users(users: Vec<String>) -> Vec<String> {
    if users.is_empty() {
        vec![DEFAULT_USER.to_string()]
    } else {
        users
    }
}

/// Unresolved settings as they arrive from the front end.
#[derive(Debug, Clone, Default)]
pub struct ProbeParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub users: Vec<String>,
    pub ssh_binary: Option<String>,
    /// `(method name, token)` pairs, applied in order
    pub overrides: Vec<(String, String)>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub target: ProbeTarget,
    pub users: Vec<String>,
    pub ssh_binary: String,
    /// Default registry with all overrides applied
    pub template: PolicyRegistry,
}

impl ProbeConfig {
    /// Resolve parameters, environment and defaults into a configuration.
    ///
    /// Fails on a missing host, a zero timeout, or a bad override.
    pub fn resolve(params: ProbeParams) -> Result<Self, ProbeError> {
        let host = resolve_host(params.host)?;
        let port = resolve_port(params.port);
        let timeout_secs = resolve_timeout(params.timeout_secs);
        if timeout_secs == 0 {
            return Err(ProbeError::InvalidArgument(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        let mut template = DEFAULT_REGISTRY.copy();
        for (name, token) in &params.overrides {
            template.apply_override(name, token)?;
            debug!("Policy override {}={}", name, token);
        }

        Ok(Self {
            target: ProbeTarget {
                host,
                port,
                timeout: Duration::from_secs(timeout_secs),
            },
            users: resolve_users(params.users),
            ssh_binary: resolve_ssh_binary(params.ssh_binary),
            template,
        })
    }
}
