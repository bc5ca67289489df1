//! Idempotent resource reconcilers
//!
//! Every managed resource follows the same contract: attempt creation,
//! and when the provider reports a name collision, fetch and return the
//! existing resource instead of failing. Creation reaches the same end
//! state whether the resource pre-exists or not.

pub mod autoscaling;
pub mod listener;
pub mod load_balancer;
pub mod target_group;

#[cfg(test)]
mod load_balancer_test;

use crate::error::ProvisionError;
use aws_client::AwsError;
use std::future::Future;
use tracing::info;

/// Whether the provider is reporting a duplicate-name collision
pub fn is_already_exists(err: &AwsError) -> bool {
    matches!(err, AwsError::Api { code, .. } if code == "AlreadyExists" || code.starts_with("Duplicate"))
}

/// Run `create`; on a name collision run `fetch` and return the existing
/// resource. Any other error is a hard failure for the resource.
pub async fn create_or_fetch<T, C, F>(
    kind: &str,
    name: &str,
    create: C,
    fetch: F,
) -> Result<T, ProvisionError>
where
    C: Future<Output = Result<T, AwsError>>,
    F: Future<Output = Result<T, AwsError>>,
{
    match create.await {
        Ok(resource) => {
            info!("Created {} {}", kind, name);
            Ok(resource)
        }
        Err(err) if is_already_exists(&err) => {
            info!("{} {} already exists, fetching", kind, name);
            Ok(fetch.await?)
        }
        Err(err) => Err(err.into()),
    }
}
