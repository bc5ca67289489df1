//! Shared helpers for provisioner unit tests

use crate::config::Config;
use crate::provisioner::Provisioner;
use aws_client::{
    CidrBlockAssociation, CidrBlockState, LaunchTemplate, MockAwsClient, Subnet, Vpc,
};
use std::sync::Arc;

/// VPC id used across the unit tests
pub const TEST_VPC: &str = "vpc-0f00";

/// A Config as the CLI would have parsed it, pointed at the test VPC
pub fn test_config(subnet_ids: &[&str]) -> Config {
    Config {
        vpc_id: TEST_VPC.to_string(),
        subnet_ids: subnet_ids.iter().map(|s| (*s).to_string()).collect(),
        region: "us-east-1".to_string(),
        launch_template_id: "lt-0123456789abcdef0".to_string(),
        service_port: 8080,
        min_size: 1,
        max_size: 5,
        desired_capacity: 2,
        cpu_target: 50.0,
        poll_interval_secs: 10,
        activation_timeout_secs: 300,
        instance_warmup_secs: 60,
        default_cooldown_secs: 300,
    }
}

pub fn test_vpc(cidr: &str) -> Vpc {
    Vpc {
        vpc_id: TEST_VPC.to_string(),
        cidr_block: cidr.to_string(),
        cidr_block_associations: vec![CidrBlockAssociation {
            cidr_block: cidr.to_string(),
            state: CidrBlockState::Associated,
        }],
    }
}

pub fn test_subnet(id: &str, cidr: &str, zone: &str, free: u32) -> Subnet {
    Subnet {
        subnet_id: id.to_string(),
        vpc_id: TEST_VPC.to_string(),
        cidr_block: cidr.to_string(),
        availability_zone: zone.to_string(),
        available_ip_address_count: free,
        tags: Vec::new(),
    }
}

/// Mock seeded with the test VPC, three zones, and the launch template
pub fn mock_client(config: &Config, vpc_cidr: &str) -> MockAwsClient {
    let mock = MockAwsClient::new(config.region.as_str());
    mock.add_vpc(test_vpc(vpc_cidr));
    mock.set_zones(vec![
        "us-east-1a".to_string(),
        "us-east-1b".to_string(),
        "us-east-1c".to_string(),
    ]);
    mock.add_launch_template(LaunchTemplate {
        id: config.launch_template_id.clone(),
        name: Some("cpu-stresser".to_string()),
        latest_version: 1,
    });
    mock
}

pub fn provisioner(mock: &MockAwsClient, config: Config) -> Provisioner {
    Provisioner::new(Arc::new(mock.clone()), config)
}
