//! Listener reconciler
//!
//! Listeners carry no name, so idempotency is a port match among the
//! parent load balancer's existing listeners.

use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use aws_client::Listener;
use tracing::info;

impl Provisioner {
    /// Create the service listener, or return the one already bound to
    /// the service port.
    pub(crate) async fn ensure_listener(
        &self,
        load_balancer_arn: &str,
        target_group_arn: &str,
    ) -> Result<Listener, ProvisionError> {
        let port = self.config.service_port;
        let existing = self.client.describe_listeners(load_balancer_arn).await?;
        if let Some(listener) = existing.into_iter().find(|l| l.port == port) {
            info!("Listener on port {} already exists", port);
            return Ok(listener);
        }

        let listener = self
            .client
            .create_listener(load_balancer_arn, "TCP", port, target_group_arn)
            .await?;
        info!("Created listener {} on port {}", listener.arn, port);
        Ok(listener)
    }
}
