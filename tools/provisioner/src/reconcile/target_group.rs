//! Target group reconciler

use super::create_or_fetch;
use crate::config::{self, TARGET_GROUP_NAME};
use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use aws_client::{TargetGroup, TargetGroupSpec};

impl Provisioner {
    /// Create the fleet's TCP target group, or adopt the existing one.
    pub(crate) async fn ensure_target_group(&self) -> Result<TargetGroup, ProvisionError> {
        let port = self.config.service_port;
        let spec = TargetGroupSpec {
            name: TARGET_GROUP_NAME.to_string(),
            protocol: "TCP".to_string(),
            port,
            vpc_id: self.config.vpc_id.clone(),
            target_type: "instance".to_string(),
            health_check_protocol: "TCP".to_string(),
            health_check_port: port.to_string(),
            health_check_enabled: true,
            tags: config::resource_tags(TARGET_GROUP_NAME),
        };
        create_or_fetch(
            "target group",
            TARGET_GROUP_NAME,
            self.client.create_target_group(&spec),
            self.client.describe_target_group_by_name(TARGET_GROUP_NAME),
        )
        .await
    }
}
