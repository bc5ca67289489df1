//! Load-balancer reconciler and address-space remediation
//!
//! Creating a network load balancer fails when a supplied subnet has
//! fewer free addresses than the provider requires. The retry loop here
//! swaps rejected subnets for existing ones with room, or carves a new
//! range out of the VPC, until creation succeeds or the VPC is out of
//! space. Each cycle either grows the excluded set or appends a
//! verified-free subnet, and the attempt cap bounds the loop even when
//! the provider keeps returning unparsable errors.

use crate::allocator::{self, Candidate, DEFAULT_SUBNET_PREFIX, MIN_FREE_ADDRESSES};
use crate::classify::{CreateFailure, classify_load_balancer_error};
use crate::config::{self, NLB_NAME};
use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use aws_client::{LoadBalancer, LoadBalancerScheme, LoadBalancerType};
use std::collections::HashSet;
use tracing::{info, warn};

/// Creation attempts beyond one per caller-supplied subnet
const RETRY_HEADROOM: usize = 3;

impl Provisioner {
    /// Create the fleet's load balancer, remediating subnets the provider
    /// rejects for insufficient address space.
    ///
    /// Returns the load balancer together with the subnet set creation
    /// finally succeeded with. Autoscaling-group placement must use that
    /// set, not the caller's input.
    pub(crate) async fn ensure_load_balancer(
        &self,
        vpc_id: &str,
        subnet_ids: &[String],
    ) -> Result<(LoadBalancer, Vec<String>), ProvisionError> {
        let tags = config::resource_tags(NLB_NAME);
        let mut working: Vec<String> = subnet_ids.to_vec();
        let mut excluded: HashSet<String> = HashSet::new();
        let max_attempts = subnet_ids.len() + RETRY_HEADROOM;

        for attempt in 1..=max_attempts {
            let created = self
                .client
                .create_load_balancer(
                    NLB_NAME,
                    LoadBalancerType::Network,
                    &working,
                    LoadBalancerScheme::InternetFacing,
                    &tags,
                )
                .await;
            let err = match created {
                Ok(lb) => {
                    info!("Created load balancer {} with {} subnet(s)", lb.arn, working.len());
                    return Ok((lb, working));
                }
                Err(err) => err,
            };

            match classify_load_balancer_error(&err) {
                CreateFailure::DuplicateName => {
                    info!("Load balancer {} already exists, fetching", NLB_NAME);
                    let lb = self.client.describe_load_balancer_by_name(NLB_NAME).await?;
                    return Ok((lb, working));
                }
                CreateFailure::InsufficientAddressSpace { offending } => {
                    if offending.is_empty() {
                        // Unparsable message: the whole current set is suspect.
                        warn!(
                            "Provider rejected the subnet set for lack of address space \
                             without naming a subnet; replacing all {} subnet(s)",
                            working.len()
                        );
                        excluded.extend(working.drain(..));
                    } else {
                        warn!(
                            "Subnet(s) {:?} lack the {} free addresses the load balancer needs",
                            offending, MIN_FREE_ADDRESSES
                        );
                        excluded.extend(offending);
                        working.retain(|id| !excluded.contains(id));
                    }

                    let replacement = self.find_replacement_subnet(vpc_id, &working, &excluded).await?;
                    info!(
                        "Retrying load balancer creation with subnet {} (attempt {}/{})",
                        replacement,
                        attempt + 1,
                        max_attempts
                    );
                    working.push(replacement);
                }
                CreateFailure::Fatal => return Err(err.into()),
            }
        }

        Err(ProvisionError::Exhausted(format!(
            "load balancer creation still rejected after {max_attempts} attempts; \
             every remediation the VPC offered has been tried"
        )))
    }

    /// Find or create a subnet with enough free addresses, preferring an
    /// existing one in a zone the working set does not cover yet.
    async fn find_replacement_subnet(
        &self,
        vpc_id: &str,
        working: &[String],
        excluded: &HashSet<String>,
    ) -> Result<String, ProvisionError> {
        let space = allocator::load_address_space(self.client.as_ref(), vpc_id).await?;
        let zones = self.client.describe_availability_zones().await?;

        let working_zones: HashSet<&str> = space
            .subnets
            .iter()
            .filter(|s| working.contains(&s.id))
            .map(|s| s.zone.as_str())
            .collect();
        let qualifying: Vec<_> = space
            .subnets
            .iter()
            .filter(|s| {
                !excluded.contains(&s.id)
                    && !working.contains(&s.id)
                    && s.available_ips >= MIN_FREE_ADDRESSES
            })
            .collect();
        if let Some(record) = qualifying
            .iter()
            .find(|s| !working_zones.contains(s.zone.as_str()))
            .or_else(|| qualifying.first())
        {
            info!(
                "Reusing existing subnet {} ({}, {} free addresses) in {}",
                record.id, record.cidr, record.available_ips, record.zone
            );
            return Ok(record.id.clone());
        }

        info!(
            "No existing subnet has {} free addresses, carving a new range",
            MIN_FREE_ADDRESSES
        );
        // An offending subnet still occupies its CIDR on the provider side,
        // so the overlap check runs against the full snapshot.
        let candidate = space
            .find_available_range(&HashSet::new(), DEFAULT_SUBNET_PREFIX, &zones)
            .or_else(|| {
                warn!("No free range at any size; falling back to the high-address window");
                space.suggest_range(&zones)
            });
        match candidate {
            Some(candidate) => self.create_fleet_subnet(vpc_id, &candidate).await,
            None => Err(ProvisionError::Exhausted(format!(
                "no free address range of any size left in {vpc_id}; add a secondary \
                 CIDR block, delete unused subnets, or supply a subnet with at least \
                 {MIN_FREE_ADDRESSES} free addresses"
            ))),
        }
    }

    async fn create_fleet_subnet(
        &self,
        vpc_id: &str,
        candidate: &Candidate,
    ) -> Result<String, ProvisionError> {
        let name = format!("{}-subnet-{}", config::PROJECT_TAG, chrono::Utc::now().timestamp());
        let subnet = self
            .client
            .create_subnet(
                vpc_id,
                &candidate.cidr.to_string(),
                Some(&candidate.zone),
                &config::resource_tags(&name),
            )
            .await?;
        info!(
            "Created subnet {} ({}) in {}",
            subnet.subnet_id, subnet.cidr_block, subnet.availability_zone
        );
        Ok(subnet.subnet_id)
    }
}
