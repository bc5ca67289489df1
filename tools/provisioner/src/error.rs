//! Provisioner-specific error types.

use aws_client::AwsError;
use thiserror::Error;

/// Errors that can occur while provisioning the fleet.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// AWS API error
    #[error("AWS error: {0}")]
    Aws(#[from] AwsError),

    /// A required resource (VPC, launch template, named resource) is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// No remediable address space left anywhere in the VPC
    #[error("address space exhausted: {0}")]
    Exhausted(String),

    /// A bounded wait ran out of wall-clock budget
    #[error("timed out: {0}")]
    Timeout(String),

    /// The load balancer entered a terminal failed state
    #[error("load balancer failed to activate: {0}")]
    ActivationFailed(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
