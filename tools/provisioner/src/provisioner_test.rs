//! Unit tests for the deployment sequencer

use crate::config::{ASG_NAME, NLB_NAME};
use crate::error::ProvisionError;
use crate::test_utils::{mock_client, provisioner, test_config, test_subnet};
use aws_client::{AutoScalingGroupSpec, AwsClientTrait, AwsError, LoadBalancerState, Tag};

#[tokio::test]
async fn deploy_runs_every_step() {
    let config = test_config(&["subnet-111", "subnet-222"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.add_subnet(test_subnet("subnet-222", "10.0.1.0/24", "us-east-1b", 200));

    let p = provisioner(&mock, config.clone());
    let report = p.deploy().await.unwrap();

    assert!(report.fully_provisioned());
    assert_eq!(report.subnets_used, config.subnet_ids);
    assert!(report.scaling_policy_arn.is_some());
    assert!(!report.load_balancer_dns.is_empty());

    let group = mock.auto_scaling_group(ASG_NAME).unwrap();
    assert_eq!(group.subnet_ids, config.subnet_ids);
    assert_eq!(group.target_group_arns, vec![report.target_group_arn.clone()]);
    assert_eq!(group.default_instance_warmup, Some(60));
    assert_eq!(group.default_cooldown, Some(300));

    let listeners = mock.all_listeners();
    assert_eq!(listeners.len(), 1);
    assert_eq!(listeners[0].port, 8080);
    assert_eq!(listeners[0].target_group_arn.as_deref(), Some(report.target_group_arn.as_str()));
}

#[tokio::test]
async fn remediated_subnets_flow_through_to_the_autoscaling_group() {
    let config = test_config(&["subnet-111", "subnet-333"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 2));
    mock.add_subnet(test_subnet("subnet-222", "10.0.1.0/24", "us-east-1b", 20));
    mock.add_subnet(test_subnet("subnet-333", "10.0.2.0/24", "us-east-1c", 40));
    mock.push_create_load_balancer_error(AwsError::api(
        "InvalidSubnet",
        "Not enough IP space in subnet-111. At least 8 free IP addresses are required.",
    ));

    let p = provisioner(&mock, config.clone());
    let report = p.deploy().await.unwrap();

    // Placement follows the working set from the last successful attempt,
    // not the original input.
    assert_eq!(
        report.subnets_used,
        vec!["subnet-333".to_string(), "subnet-222".to_string()]
    );
    let group = mock.auto_scaling_group(ASG_NAME).unwrap();
    assert_eq!(group.subnet_ids, report.subnets_used);
}

#[tokio::test]
async fn preexisting_group_does_not_stop_the_pipeline() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.create_auto_scaling_group(&AutoScalingGroupSpec {
        name: ASG_NAME.to_string(),
        launch_template_id: config.launch_template_id.clone(),
        launch_template_version: "$Latest".to_string(),
        min_size: 1,
        max_size: 5,
        desired_capacity: 2,
        subnet_ids: vec!["subnet-111".to_string()],
        target_group_arns: Vec::new(),
        health_check_type: "ELB".to_string(),
        health_check_grace_period: 300,
        tags: vec![Tag::new("Name", ASG_NAME)],
    })
    .await
    .unwrap();

    let p = provisioner(&mock, config);
    let report = p.deploy().await.unwrap();

    assert!(report.warnings.is_empty());
    assert!(report.scaling_policy_arn.is_some());
}

#[tokio::test]
async fn scaling_policy_failure_is_a_warning_not_an_error() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.push_put_scaling_policy_error(AwsError::api("InternalFailure", "try again later"));

    let p = provisioner(&mock, config);
    let report = p.deploy().await.unwrap();

    assert_eq!(report.scaling_policy_arn, None);
    assert_eq!(report.warnings.len(), 1);
    assert!(!report.fully_provisioned());
    // The fleet itself is up regardless.
    assert!(mock.auto_scaling_group(ASG_NAME).is_some());
}

#[tokio::test(start_paused = true)]
async fn activation_timeout_fails_the_deployment() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.set_initial_load_balancer_state(LoadBalancerState::Provisioning);

    let p = provisioner(&mock, config);
    let err = p.deploy().await.unwrap_err();

    assert!(matches!(err, ProvisionError::Timeout(_)));
    // Nothing past the activation gate was created.
    assert!(mock.auto_scaling_group(ASG_NAME).is_none());
    assert!(mock.all_listeners().is_empty());
}

#[tokio::test(start_paused = true)]
async fn activation_resumes_once_the_balancer_settles() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    mock.add_subnet(test_subnet("subnet-111", "10.0.0.0/24", "us-east-1a", 200));
    mock.set_initial_load_balancer_state(LoadBalancerState::Provisioning);

    let p = provisioner(&mock, config.clone());
    let mock_flipper = mock.clone();
    let flip = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(35)).await;
        mock_flipper.set_load_balancer_state(NLB_NAME, LoadBalancerState::Active);
    });

    let report = p.deploy().await.unwrap();
    flip.await.unwrap();
    assert_eq!(report.subnets_used, config.subnet_ids);
}

#[tokio::test]
async fn listener_is_matched_by_port_not_name() {
    let config = test_config(&["subnet-111"]);
    let mock = mock_client(&config, "10.0.0.0/16");
    let lb = mock
        .create_load_balancer(
            NLB_NAME,
            aws_client::LoadBalancerType::Network,
            &["subnet-111".to_string()],
            aws_client::LoadBalancerScheme::InternetFacing,
            &[],
        )
        .await
        .unwrap();
    let first = mock
        .create_listener(&lb.arn, "TCP", 8080, "arn:tg/original")
        .await
        .unwrap();

    let p = provisioner(&mock, config);
    let adopted = p.ensure_listener(&lb.arn, "arn:tg/other").await.unwrap();

    assert_eq!(adopted.arn, first.arn);
    assert_eq!(mock.all_listeners().len(), 1);
}

#[tokio::test]
async fn empty_subnet_input_is_rejected_up_front() {
    let config = test_config(&[]);
    let mock = mock_client(&config, "10.0.0.0/16");

    let p = provisioner(&mock, config);
    let err = p.deploy().await.unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidConfig(_)));
}
