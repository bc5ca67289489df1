//! Unit tests for the load-balancer retry orchestrator

use crate::config::NLB_NAME;
use crate::error::ProvisionError;
use crate::test_utils::{mock_client, provisioner, test_config, test_subnet};
use aws_client::{AwsClientTrait, AwsError, LoadBalancerScheme, LoadBalancerType};

fn insufficient_space(message: &str) -> AwsError {
    AwsError::api("InvalidSubnet", message)
}

#[tokio::test]
async fn succeeds_first_try_with_healthy_subnets() {
    let config = test_config(&["subnet-111", "subnet-222"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.add_subnet(test_subnet("subnet-222", "10.0.1.0/24", "us-east-1b", 200));

    let p = provisioner(&mock, config.clone());
    let (lb, used) = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap();
    assert_eq!(used, config.subnet_ids);
    assert_eq!(lb.subnets, config.subnet_ids);
}

#[tokio::test]
async fn replaces_offending_subnet_with_existing_spare() {
    let config = test_config(&["subnet-111", "subnet-333"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 2));
    mock.add_subnet(test_subnet("subnet-222", "10.0.1.0/24", "us-east-1b", 20));
    mock.add_subnet(test_subnet("subnet-333", "10.0.2.0/24", "us-east-1c", 40));
    mock.push_create_load_balancer_error(insufficient_space(
        "Not enough IP space in subnet-111. At least 8 free IP addresses are required.",
    ));

    let p = provisioner(&mock, config.clone());
    let (lb, used) = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap();

    // The rejected subnet is gone, the spare with room takes its place.
    assert_eq!(used, vec!["subnet-333".to_string(), "subnet-222".to_string()]);
    assert_eq!(mock.load_balancer(NLB_NAME).unwrap().subnets, used);
    assert!(!lb.arn.is_empty());
}

#[tokio::test]
async fn carves_a_new_subnet_when_no_spare_qualifies() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 2));
    mock.push_create_load_balancer_error(insufficient_space(
        "Not enough IP space in subnet-111. At least 8 free IP addresses are required.",
    ));

    let p = provisioner(&mock, config.clone());
    let (_, used) = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap();

    assert_eq!(used.len(), 1);
    let created = mock.subnet(&used[0]).unwrap();
    assert_eq!(created.cidr_block, "10.0.1.0/24");
    assert_eq!(created.availability_zone, "us-east-1b");
}

#[tokio::test]
async fn unparsable_rejection_discards_the_whole_set() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 2));
    mock.add_subnet(test_subnet("subnet-222", "10.0.1.0/24", "us-east-1b", 20));
    mock.push_create_load_balancer_error(insufficient_space(
        "One of the provided subnets does not have enough free IP addresses.",
    ));

    let p = provisioner(&mock, config.clone());
    let (_, used) = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap();
    assert_eq!(used, vec!["subnet-222".to_string()]);
}

#[tokio::test]
async fn exhausted_vpc_is_fatal() {
    // Both halves of the lone /24 block are taken and neither has room.
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/24");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/25", "us-east-1a", 2));
    mock.add_subnet(test_subnet("subnet-222", "10.0.0.128/25", "us-east-1b", 3));
    mock.push_create_load_balancer_error(insufficient_space(
        "Not enough IP space in subnet-111. At least 8 free IP addresses are required.",
    ));

    let p = provisioner(&mock, config.clone());
    let err = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Exhausted(_)));
    assert!(mock.load_balancer(NLB_NAME).is_none());
}

#[tokio::test]
async fn duplicate_name_resolves_to_the_existing_balancer() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    let existing = mock
        .create_load_balancer(
            NLB_NAME,
            LoadBalancerType::Network,
            &["subnet-999999".to_string()],
            LoadBalancerScheme::InternetFacing,
            &[],
        )
        .await
        .unwrap();

    let p = provisioner(&mock, config.clone());
    let (lb, used) = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap();
    assert_eq!(lb.arn, existing.arn);
    assert_eq!(used, config.subnet_ids);
}

#[tokio::test]
async fn retry_budget_bounds_a_misbehaving_provider() {
    // The provider rejects every attempt without ever naming a subnet.
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 2));
    mock.add_subnet(test_subnet("subnet-aa1", "10.0.1.0/24", "us-east-1b", 20));
    mock.add_subnet(test_subnet("subnet-aa2", "10.0.2.0/24", "us-east-1c", 20));
    mock.add_subnet(test_subnet("subnet-aa3", "10.0.3.0/24", "us-east-1a", 20));
    for _ in 0..6 {
        mock.push_create_load_balancer_error(insufficient_space(
            "One of the provided subnets does not have enough free IP addresses.",
        ));
    }

    let p = provisioner(&mock, config.clone());
    let err = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Exhausted(_)));
}

#[tokio::test]
async fn unrelated_errors_propagate_verbatim() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.push_create_load_balancer_error(AwsError::api(
        "AccessDenied",
        "User is not authorized to perform elasticloadbalancing:CreateLoadBalancer",
    ));

    let p = provisioner(&mock, config.clone());
    let err = p
        .ensure_load_balancer(&config.vpc_id, &config.subnet_ids)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Aws(AwsError::Api { ref code, .. }) if code == "AccessDenied"
    ));
}
