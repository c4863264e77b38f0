//! Ordered registry of known authentication methods.
//!
//! [`DEFAULT_REGISTRY`] is a process-wide, read-only template. Configuration
//! overrides are applied to a clone of it once at startup, and every user
//! then gets an independent copy via [`PolicyRegistry::copy`], so offered
//! flags never leak between users.

use once_cell::sync::Lazy;

use crate::probe::error::ProbeError;
use crate::probe::method::{AuthMethod, Policy};

/// Name of the method that is forced offered when a login succeeds.
pub const NONE_METHOD: &str = "none";

/// Default methods in report order.
const DEFAULT_METHODS: [AuthMethod; 7] = [
    AuthMethod::new(NONE_METHOD, "None", Policy::Forbid),
    AuthMethod::new("hostbased", "Hostbased", Policy::Forbid),
    AuthMethod::new("password", "Password", Policy::Forbid),
    AuthMethod::new("keyboardinteractive", "KeyboardInteractive", Policy::Forbid),
    AuthMethod::new("publickey", "PublicKey", Policy::Allow),
    AuthMethod::new("gssapikeyex", "GssapiKeyex", Policy::Ignore),
    AuthMethod::new("gssapiwithmic", "GssapiWithMic", Policy::Ignore),
];

/// Process-wide default registry.
pub static DEFAULT_REGISTRY: Lazy<PolicyRegistry> = Lazy::new(PolicyRegistry::defaults);

/// Ordered collection of authentication methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRegistry {
    methods: Vec<AuthMethod>,
}

impl PolicyRegistry {
    /// The seven known methods with their default policies.
    pub fn defaults() -> Self {
        Self {
            methods: DEFAULT_METHODS.to_vec(),
        }
    }

    /// Set the policy of the method called `name` from an override token.
    pub fn apply_override(&mut self, name: &str, token: &str) -> Result<(), ProbeError> {
        let method = self
            .get_mut(name)
            .ok_or_else(|| ProbeError::MethodNotFound {
                name: name.to_string(),
            })?;
        method.set_policy(token)
    }

    /// Independent working copy for one user evaluation.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn get(&self, name: &str) -> Option<&AuthMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AuthMethod> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthMethod> {
        self.methods.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AuthMethod> {
        self.methods.iter_mut()
    }

    /// Method names in report order.
    pub fn names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.name).collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}
