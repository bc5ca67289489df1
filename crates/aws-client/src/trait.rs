//! AwsClientTrait for mocking
//!
//! This trait abstracts the AWS client so the provisioner can be unit
//! tested without an AWS account. The concrete `AwsClient` implements it,
//! and tests use the in-memory `MockAwsClient`.

use crate::error::AwsError;
use crate::models::*;

/// Trait over the EC2, ELBv2, and Auto Scaling operations the provisioner
/// drives.
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime.
#[async_trait::async_trait]
pub trait AwsClientTrait: Send + Sync {
    /// The region this client talks to
    fn region(&self) -> &str;

    // EC2 operations
    async fn describe_vpc(&self, vpc_id: &str) -> Result<Vpc, AwsError>;
    async fn describe_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, AwsError>;
    /// Zones currently in the `available` state
    async fn describe_availability_zones(&self) -> Result<Vec<String>, AwsError>;
    async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr_block: &str,
        availability_zone: Option<&str>,
        tags: &[Tag],
    ) -> Result<Subnet, AwsError>;
    async fn describe_launch_template(&self, template_id: &str) -> Result<LaunchTemplate, AwsError>;

    // ELBv2 operations
    async fn create_load_balancer(
        &self,
        name: &str,
        lb_type: LoadBalancerType,
        subnet_ids: &[String],
        scheme: LoadBalancerScheme,
        tags: &[Tag],
    ) -> Result<LoadBalancer, AwsError>;
    async fn describe_load_balancer_by_name(&self, name: &str) -> Result<LoadBalancer, AwsError>;
    async fn describe_load_balancer(&self, arn: &str) -> Result<LoadBalancer, AwsError>;
    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<TargetGroup, AwsError>;
    async fn describe_target_group_by_name(&self, name: &str) -> Result<TargetGroup, AwsError>;
    async fn describe_listeners(&self, load_balancer_arn: &str) -> Result<Vec<Listener>, AwsError>;
    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        protocol: &str,
        port: u16,
        target_group_arn: &str,
    ) -> Result<Listener, AwsError>;

    // Auto Scaling operations
    async fn create_auto_scaling_group(&self, spec: &AutoScalingGroupSpec) -> Result<(), AwsError>;
    async fn describe_auto_scaling_group(&self, name: &str) -> Result<AutoScalingGroup, AwsError>;
    async fn set_instance_warmup(&self, group_name: &str, warmup_seconds: u32) -> Result<(), AwsError>;
    async fn set_default_cooldown(&self, group_name: &str, cooldown_seconds: u32) -> Result<(), AwsError>;
    async fn put_scaling_policy(&self, spec: &ScalingPolicySpec) -> Result<ScalingPolicy, AwsError>;
    async fn delete_scaling_policy(&self, group_name: &str, policy_name: &str) -> Result<(), AwsError>;
}
