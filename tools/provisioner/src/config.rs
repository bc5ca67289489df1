//! Configuration and fixed naming conventions

use aws_client::Tag;
use clap::Parser;

/// Name of the network load balancer fronting the fleet
pub const NLB_NAME: &str = "cpu-stresser-nlb";

/// Name of the fleet's target group
pub const TARGET_GROUP_NAME: &str = "cpu-stresser-tg";

/// Name of the fleet's auto scaling group
pub const ASG_NAME: &str = "cpu-stresser-asg";

/// Project tag stamped on every resource this tool creates
pub const PROJECT_TAG: &str = "cpu-stresser";

/// AMI the launch template boots the fleet from
pub const AMI_ID: &str = "ami-07b9762960a9da859";

const DEFAULT_LAUNCH_TEMPLATE_ID: &str = "lt-0eb3866711e320093";

/// Deploy the cpu-stresser fleet behind a network load balancer.
#[derive(Debug, Clone, Parser)]
#[command(name = "provisioner")]
pub struct Config {
    /// VPC to deploy into
    #[arg(env = "VPC_ID")]
    pub vpc_id: String,

    /// Subnets for the load balancer, comma separated
    #[arg(env = "SUBNET_IDS", value_delimiter = ',')]
    pub subnet_ids: Vec<String>,

    /// AWS region
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Launch template the autoscaling group boots instances from
    #[arg(long, env = "LAUNCH_TEMPLATE_ID", default_value = DEFAULT_LAUNCH_TEMPLATE_ID)]
    pub launch_template_id: String,

    /// Port the fleet's service listens on
    #[arg(long, default_value_t = 8080)]
    pub service_port: u16,

    /// Minimum fleet size
    #[arg(long, default_value_t = 1)]
    pub min_size: u32,

    /// Maximum fleet size
    #[arg(long, default_value_t = 5)]
    pub max_size: u32,

    /// Desired fleet size at creation
    #[arg(long, default_value_t = 2)]
    pub desired_capacity: u32,

    /// Target average CPU utilization (percent) for the scaling policy
    #[arg(long, default_value_t = 50.0)]
    pub cpu_target: f64,

    /// Seconds between load-balancer activation polls
    #[arg(long, default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Wall-clock budget for load-balancer activation, in seconds
    #[arg(long, default_value_t = 300)]
    pub activation_timeout_secs: u64,

    /// Instance warmup period for the autoscaling group, in seconds
    #[arg(long, default_value_t = 60)]
    pub instance_warmup_secs: u32,

    /// Default cooldown for the autoscaling group, in seconds
    #[arg(long, default_value_t = 300)]
    pub default_cooldown_secs: u32,
}

/// Standard tag set for a resource created by this tool
pub fn resource_tags(name: &str) -> Vec<Tag> {
    vec![Tag::new("Name", name), Tag::new("Project", PROJECT_TAG)]
}
