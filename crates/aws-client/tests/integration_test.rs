//! Integration tests for the AWS client
//!
//! These tests require real AWS credentials and a VPC to poke at.
//! Set AWS credentials in the environment and TEST_VPC_ID to run.

use aws_client::{AwsClient, AwsClientTrait};

#[tokio::test]
#[ignore] // Requires AWS credentials
async fn test_describe_availability_zones() {
    let region = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let client = AwsClient::new(&region).await;

    let zones = client
        .describe_availability_zones()
        .await
        .expect("Failed to describe availability zones");

    println!("Found {} availability zones", zones.len());
    assert!(!zones.is_empty());
}

#[tokio::test]
#[ignore] // Requires AWS credentials and TEST_VPC_ID
async fn test_describe_vpc_and_subnets() {
    let region = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let vpc_id = std::env::var("TEST_VPC_ID").expect("TEST_VPC_ID environment variable must be set");

    let client = AwsClient::new(&region).await;

    let vpc = client.describe_vpc(&vpc_id).await.expect("Failed to describe VPC");
    println!("VPC {} primary CIDR: {}", vpc.vpc_id, vpc.cidr_block);

    let subnets = client
        .describe_subnets(&vpc_id)
        .await
        .expect("Failed to describe subnets");
    for subnet in &subnets {
        println!(
            "{}: {} ({}) {} free",
            subnet.subnet_id, subnet.cidr_block, subnet.availability_zone,
            subnet.available_ip_address_count
        );
    }
}

#[tokio::test]
#[ignore] // Requires AWS credentials
async fn test_describe_missing_auto_scaling_group() {
    let region = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let client = AwsClient::new(&region).await;

    let result = client.describe_auto_scaling_group("does-not-exist-anywhere").await;
    assert!(result.is_err(), "Expected a not-found error");
}

#[tokio::test]
#[ignore] // Requires AWS credentials
async fn test_describe_missing_load_balancer() {
    let region = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let client = AwsClient::new(&region).await;

    let result = client
        .describe_load_balancer_by_name("does-not-exist-anywhere")
        .await;
    assert!(result.is_err(), "Expected a not-found error");
}
