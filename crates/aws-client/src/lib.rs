//! AWS API client for the cpu-stresser provisioner
//!
//! A typed surface over the slice of EC2, ELBv2, and Auto Scaling the
//! provisioner needs: VPC/subnet inventory, subnet creation, load
//! balancers, target groups, listeners, autoscaling groups, and scaling
//! policies.
//!
//! # Example
//!
//! ```no_run
//! use aws_client::{AwsClient, AwsClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client for a region
//! let client = AwsClient::new("us-east-1").await;
//!
//! // Read a VPC's address blocks
//! let vpc = client.describe_vpc("vpc-0123456789abcdef0").await?;
//! println!("primary CIDR: {}", vpc.cidr_block);
//!
//! // List its subnets with their free-address counts
//! let subnets = client.describe_subnets(&vpc.vpc_id).await?;
//! for subnet in subnets {
//!     println!("{}: {} free", subnet.subnet_id, subnet.available_ip_address_count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Structured errors**: provider error codes survive into [`AwsError`]
//!   so callers can recover from duplicate names and rejected subnets
//! - **Mockable**: every operation lives on [`AwsClientTrait`]; enable the
//!   `test-util` feature for the in-memory [`MockAwsClient`]

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod aws_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use aws_trait::AwsClientTrait;
pub use client::AwsClient;
pub use error::AwsError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockAwsClient;
