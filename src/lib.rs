//! Monitoring plugin that checks which SSH authentication methods a server
//! offers for one or more users and compares them against a policy.

pub mod probe;
