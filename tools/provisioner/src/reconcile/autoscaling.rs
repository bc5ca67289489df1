//! Autoscaling group and scaling-policy reconcilers

use super::is_already_exists;
use crate::config::{self, ASG_NAME};
use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use aws_client::{AutoScalingGroupSpec, AwsError, ScalingPolicy, ScalingPolicySpec};
use std::time::Duration;
use tracing::{info, warn};

/// Wait between deleting a scaling policy and recreating it, so the
/// deletion can propagate
const POLICY_RECREATE_DELAY: Duration = Duration::from_secs(2);

/// Grace period before load-balancer health checks count against a new
/// instance, in seconds
const HEALTH_CHECK_GRACE_PERIOD: u32 = 300;

impl Provisioner {
    /// Create the autoscaling group on the given subnets, or accept the
    /// existing group.
    ///
    /// The launch template is verified first; a missing template aborts
    /// before anything is created.
    pub(crate) async fn ensure_auto_scaling_group(
        &self,
        target_group_arn: &str,
        subnet_ids: &[String],
    ) -> Result<(), ProvisionError> {
        let template_id = &self.config.launch_template_id;
        match self.client.describe_launch_template(template_id).await {
            Ok(template) => info!("Launch template verified: {}", template.id),
            Err(AwsError::NotFound(_)) => {
                return Err(ProvisionError::NotFound(format!(
                    "launch template {template_id} does not exist"
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let spec = AutoScalingGroupSpec {
            name: ASG_NAME.to_string(),
            launch_template_id: template_id.clone(),
            launch_template_version: "$Latest".to_string(),
            min_size: self.config.min_size,
            max_size: self.config.max_size,
            desired_capacity: self.config.desired_capacity,
            subnet_ids: subnet_ids.to_vec(),
            target_group_arns: vec![target_group_arn.to_string()],
            health_check_type: "ELB".to_string(),
            health_check_grace_period: HEALTH_CHECK_GRACE_PERIOD,
            tags: config::resource_tags(ASG_NAME),
        };
        match self.client.create_auto_scaling_group(&spec).await {
            Ok(()) => {
                info!("Created auto scaling group {}", ASG_NAME);
                Ok(())
            }
            Err(err) if is_already_exists(&err) => {
                info!("Auto scaling group {} already exists", ASG_NAME);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create the target-tracking scaling policy. An existing policy is
    /// deleted and recreated, since policies cannot be patched in place.
    pub(crate) async fn ensure_scaling_policy(&self) -> Result<ScalingPolicy, ProvisionError> {
        let spec = ScalingPolicySpec {
            group_name: ASG_NAME.to_string(),
            policy_name: format!("{ASG_NAME}-target-tracking"),
            target_value: self.config.cpu_target,
            predefined_metric_type: "ASGAverageCPUUtilization".to_string(),
            disable_scale_in: false,
        };
        match self.client.put_scaling_policy(&spec).await {
            Ok(policy) => {
                info!(
                    "Created scaling policy {} targeting {}% average CPU",
                    policy.name, policy.target_value
                );
                Ok(policy)
            }
            Err(err) if is_already_exists(&err) => {
                warn!("Scaling policy {} already exists, recreating", spec.policy_name);
                self.client
                    .delete_scaling_policy(&spec.group_name, &spec.policy_name)
                    .await?;
                tokio::time::sleep(POLICY_RECREATE_DELAY).await;
                let policy = self.client.put_scaling_policy(&spec).await?;
                info!("Recreated scaling policy {}", policy.name);
                Ok(policy)
            }
            Err(err) => Err(err.into()),
        }
    }
}
