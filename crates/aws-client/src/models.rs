//! AWS API models
//!
//! These models cover the slice of the EC2, ELBv2, and Auto Scaling APIs
//! the provisioner drives. Fields follow the wire names of the underlying
//! APIs.

use serde::{Deserialize, Serialize};

/// Key/value tag applied to a resource at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Build a tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// State of a VPC CIDR block association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CidrBlockState {
    Associating,
    Associated,
    Disassociating,
    Disassociated,
    Failing,
    Failed,
}

/// A CIDR block associated with a VPC (primary or secondary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CidrBlockAssociation {
    pub cidr_block: String,
    pub state: CidrBlockState,
}

/// A VPC with its declared address blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Vpc {
    pub vpc_id: String,
    /// Primary CIDR block
    pub cidr_block: String,
    /// All block associations, including one for the primary block
    pub cidr_block_associations: Vec<CidrBlockAssociation>,
}

/// A subnet carved out of a VPC's address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Subnet {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub availability_zone: String,
    /// Addresses still free in this subnet
    pub available_ip_address_count: u32,
    pub tags: Vec<Tag>,
}

/// Load balancer provisioning state, as polled via describe calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerState {
    Provisioning,
    Active,
    Failed,
}

/// Load balancer flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerType {
    Network,
    Application,
}

/// Whether the load balancer faces the internet or stays internal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerScheme {
    InternetFacing,
    Internal,
}

/// A load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoadBalancer {
    pub arn: String,
    pub name: String,
    pub dns_name: String,
    pub state: LoadBalancerState,
    pub lb_type: LoadBalancerType,
    pub scheme: LoadBalancerScheme,
    /// Subnets the load balancer is attached to
    pub subnets: Vec<String>,
}

/// Request body for creating a target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetGroupSpec {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub vpc_id: String,
    pub target_type: String,
    pub health_check_protocol: String,
    pub health_check_port: String,
    pub health_check_enabled: bool,
    pub tags: Vec<Tag>,
}

/// A target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetGroup {
    pub arn: String,
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub vpc_id: String,
}

/// A listener on a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Listener {
    pub arn: String,
    pub load_balancer_arn: String,
    pub protocol: String,
    pub port: u16,
    /// Target group the default forward action points at
    pub target_group_arn: Option<String>,
}

/// A launch template, as far as the provisioner cares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LaunchTemplate {
    pub id: String,
    pub name: Option<String>,
    pub latest_version: i64,
}

/// Request body for creating an auto scaling group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutoScalingGroupSpec {
    pub name: String,
    pub launch_template_id: String,
    /// Template version selector, e.g. `$Latest`
    pub launch_template_version: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    pub subnet_ids: Vec<String>,
    pub target_group_arns: Vec<String>,
    pub health_check_type: String,
    pub health_check_grace_period: u32,
    pub tags: Vec<Tag>,
}

/// An auto scaling group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutoScalingGroup {
    pub name: String,
    pub launch_template_id: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    pub subnet_ids: Vec<String>,
    pub target_group_arns: Vec<String>,
    pub health_check_type: String,
    pub default_instance_warmup: Option<u32>,
    pub default_cooldown: Option<u32>,
}

/// Request body for putting a target-tracking scaling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScalingPolicySpec {
    pub group_name: String,
    pub policy_name: String,
    pub target_value: f64,
    pub predefined_metric_type: String,
    pub disable_scale_in: bool,
}

/// A target-tracking scaling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScalingPolicy {
    pub arn: String,
    pub name: String,
    pub group_name: String,
    pub target_value: f64,
    pub predefined_metric_type: String,
    pub disable_scale_in: bool,
}
