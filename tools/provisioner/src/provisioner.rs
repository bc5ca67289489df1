//! Deployment sequencing
//!
//! Drives the fixed pipeline: resolve network inputs, create the load
//! balancer (with address-space remediation), wait for it to activate,
//! then target group, listener, and autoscaling group. Steps through the
//! autoscaling group are fail-fast; the warmup/cooldown attributes and
//! the scaling policy are best-effort and surface as warnings in the
//! deployment report instead of aborting.

use crate::config::{self, Config};
use crate::error::ProvisionError;
use aws_client::{AwsClientTrait, LoadBalancerState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Outcome of a full deployment run
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub load_balancer_arn: String,
    pub load_balancer_dns: String,
    pub target_group_arn: String,
    pub listener_arn: String,
    pub auto_scaling_group: String,
    /// The subnet set the load balancer was finally created with; also
    /// the autoscaling group's placement
    pub subnets_used: Vec<String>,
    /// Absent when the best-effort policy step failed
    pub scaling_policy_arn: Option<String>,
    /// Best-effort steps that failed, one entry each
    pub warnings: Vec<String>,
}

impl DeploymentReport {
    /// True when every step, including the best-effort ones, succeeded
    pub fn fully_provisioned(&self) -> bool {
        self.scaling_policy_arn.is_some() && self.warnings.is_empty()
    }
}

/// Drives the deployment pipeline against a cloud provider client
pub struct Provisioner {
    pub(crate) client: Arc<dyn AwsClientTrait>,
    pub(crate) config: Config,
}

impl Provisioner {
    pub fn new(client: Arc<dyn AwsClientTrait>, config: Config) -> Self {
        Self { client, config }
    }

    /// Run the full deployment. Fail-fast through the autoscaling group;
    /// warmup, cooldown, and the scaling policy degrade to warnings.
    pub async fn deploy(&self) -> Result<DeploymentReport, ProvisionError> {
        let cfg = &self.config;

        info!("Step 1: resolving network inputs");
        if cfg.subnet_ids.is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "at least one subnet id is required".to_string(),
            ));
        }
        info!("Using VPC {} with subnets {:?}", cfg.vpc_id, cfg.subnet_ids);

        info!("Step 2: creating network load balancer {}", config::NLB_NAME);
        let (load_balancer, subnets_used) =
            self.ensure_load_balancer(&cfg.vpc_id, &cfg.subnet_ids).await?;
        self.wait_for_active(&load_balancer.arn).await?;

        info!("Step 3: creating target group {}", config::TARGET_GROUP_NAME);
        let target_group = self.ensure_target_group().await?;

        info!("Step 4: creating listener on port {}", cfg.service_port);
        let listener = self.ensure_listener(&load_balancer.arn, &target_group.arn).await?;

        info!("Step 5: creating auto scaling group {}", config::ASG_NAME);
        self.ensure_auto_scaling_group(&target_group.arn, &subnets_used).await?;

        info!("Step 6: configuring warmup and cooldown");
        let mut warnings = Vec::new();
        if let Err(err) = self
            .client
            .set_instance_warmup(config::ASG_NAME, cfg.instance_warmup_secs)
            .await
        {
            warn!("Failed to set instance warmup: {}", err);
            warnings.push(format!("instance warmup not set: {err}"));
        }
        if let Err(err) = self
            .client
            .set_default_cooldown(config::ASG_NAME, cfg.default_cooldown_secs)
            .await
        {
            warn!("Failed to set default cooldown: {}", err);
            warnings.push(format!("default cooldown not set: {err}"));
        }

        info!("Step 7: creating target-tracking scaling policy");
        let scaling_policy_arn = match self.ensure_scaling_policy().await {
            Ok(policy) => Some(policy.arn),
            Err(err) => {
                warn!(
                    "Failed to create scaling policy, fleet will need manual scaling: {}",
                    err
                );
                warnings.push(format!("scaling policy not created: {err}"));
                None
            }
        };

        // The DNS name is only assigned once the load balancer settles;
        // refresh it, falling back to whatever creation returned.
        let load_balancer_dns = match self.client.describe_load_balancer(&load_balancer.arn).await {
            Ok(lb) => lb.dns_name,
            Err(err) => {
                debug!("Could not refresh load balancer DNS: {}", err);
                load_balancer.dns_name.clone()
            }
        };

        Ok(DeploymentReport {
            load_balancer_arn: load_balancer.arn,
            load_balancer_dns,
            target_group_arn: target_group.arn,
            listener_arn: listener.arn,
            auto_scaling_group: config::ASG_NAME.to_string(),
            subnets_used,
            scaling_policy_arn,
            warnings,
        })
    }

    /// Poll the load balancer until it reports `active`, bounded by the
    /// configured wall-clock timeout.
    pub(crate) async fn wait_for_active(&self, arn: &str) -> Result<(), ProvisionError> {
        info!("Waiting for load balancer to become active");
        let timeout = Duration::from_secs(self.config.activation_timeout_secs);
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let deadline = Instant::now() + timeout;

        loop {
            let lb = self.client.describe_load_balancer(arn).await?;
            match lb.state {
                LoadBalancerState::Active => {
                    info!("Load balancer is active");
                    return Ok(());
                }
                LoadBalancerState::Failed => {
                    return Err(ProvisionError::ActivationFailed(format!(
                        "load balancer {} entered failed state",
                        lb.name
                    )));
                }
                LoadBalancerState::Provisioning => {
                    debug!("Load balancer state: provisioning");
                }
            }
            if Instant::now() >= deadline {
                return Err(ProvisionError::Timeout(format!(
                    "load balancer not active after {}s",
                    timeout.as_secs()
                )));
            }
            sleep(poll_interval).await;
        }
    }
}
