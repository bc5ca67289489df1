//! cpu-stresser infrastructure provisioner
//!
//! Deploys the fleet's network load balancer, target group, listener,
//! autoscaling group, and target-tracking scaling policy, reusing any
//! resource that already exists. When the provider rejects a subnet for
//! lacking free addresses, a replacement is found or carved out of the
//! VPC's remaining address space before creation is retried.

mod allocator;
mod classify;
mod config;
mod error;
mod provisioner;
mod reconcile;

#[cfg(test)]
mod provisioner_test;
#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use aws_client::AwsClient;
use clap::Parser;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Deployment failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), ProvisionError> {
    for var in ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"] {
        if env::var(var).is_err() {
            return Err(ProvisionError::InvalidConfig(format!(
                "{var} is not set; export your AWS credentials first"
            )));
        }
    }

    info!("Region: {}", config.region);
    info!("AMI: {}", config::AMI_ID);
    info!("Launch template: {}", config.launch_template_id);

    let client = AwsClient::new(&config.region).await;
    let provisioner = Provisioner::new(Arc::new(client), config);
    let report = provisioner.deploy().await?;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => info!("Deployment complete:\n{}", json),
        Err(_) => info!("Deployment complete: {:?}", report),
    }
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    Ok(())
}
