//! VPC address-space inventory and CIDR allocation
//!
//! Reads a VPC's declared CIDR blocks and live subnets into a snapshot,
//! then computes free, non-overlapping ranges for new subnets. The
//! allocator never talks to the provider itself beyond the initial read;
//! carving the range is the caller's explicit step.

use crate::error::ProvisionError;
use aws_client::{AwsClientTrait, CidrBlockState};
use ipnet::Ipv4Net;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Conventional prefix length for newly carved subnets
pub const DEFAULT_SUBNET_PREFIX: u8 = 24;

/// Minimum free addresses the provider requires per load-balancer subnet
pub const MIN_FREE_ADDRESSES: u32 = 8;

/// How many of the highest-numbered ranges `suggest_range` considers at
/// the default size, and at each fallback size
const SUGGEST_WINDOW: usize = 20;
const SUGGEST_WINDOW_FALLBACK: usize = 10;

/// An existing subnet as the allocator sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetRecord {
    pub id: String,
    pub cidr: Ipv4Net,
    pub zone: String,
    pub available_ips: u32,
}

/// A proposed (CIDR, zone) placement for a new subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub cidr: Ipv4Net,
    pub zone: String,
}

/// Snapshot of a VPC's declared CIDR blocks and live subnets
#[derive(Debug, Clone)]
pub struct AddressSpace {
    /// Declared blocks in declaration order, primary first
    pub cidr_blocks: Vec<Ipv4Net>,
    pub subnets: Vec<SubnetRecord>,
}

/// Read a VPC's address blocks and subnets into an [`AddressSpace`].
///
/// Collects the primary CIDR plus associated secondary CIDRs (blocks in
/// any other association state are ignored) and every subnet with its
/// zone and free-address count. Non-IPv4 CIDRs are skipped. A missing
/// VPC or failed describe call is a hard error; callers must not retry.
pub async fn load_address_space(
    client: &dyn AwsClientTrait,
    vpc_id: &str,
) -> Result<AddressSpace, ProvisionError> {
    let vpc = client.describe_vpc(vpc_id).await?;

    let mut cidr_blocks: Vec<Ipv4Net> = Vec::new();
    let associated = vpc
        .cidr_block_associations
        .iter()
        .filter(|a| a.state == CidrBlockState::Associated)
        .map(|a| a.cidr_block.as_str());
    for raw in std::iter::once(vpc.cidr_block.as_str()).chain(associated) {
        match raw.parse::<Ipv4Net>() {
            Ok(net) => {
                if !cidr_blocks.contains(&net) {
                    cidr_blocks.push(net);
                }
            }
            Err(_) => warn!("Skipping non-IPv4 CIDR block {} on {}", raw, vpc_id),
        }
    }

    let mut subnets = Vec::new();
    for subnet in client.describe_subnets(vpc_id).await? {
        match subnet.cidr_block.parse::<Ipv4Net>() {
            Ok(cidr) => subnets.push(SubnetRecord {
                id: subnet.subnet_id,
                cidr,
                zone: subnet.availability_zone,
                available_ips: subnet.available_ip_address_count,
            }),
            Err(_) => warn!(
                "Skipping subnet {} with non-IPv4 CIDR {}",
                subnet.subnet_id, subnet.cidr_block
            ),
        }
    }

    debug!(
        "VPC {} has {} CIDR block(s) and {} subnet(s)",
        vpc_id,
        cidr_blocks.len(),
        subnets.len()
    );
    Ok(AddressSpace { cidr_blocks, subnets })
}

impl AddressSpace {
    /// Zones hosting at least one live (non-excluded) subnet
    pub fn zones_in_use(&self, exclude_ids: &HashSet<String>) -> HashSet<String> {
        self.subnets
            .iter()
            .filter(|s| !exclude_ids.contains(&s.id))
            .map(|s| s.zone.clone())
            .collect()
    }

    fn live_networks(&self, exclude_ids: &HashSet<String>) -> Vec<Ipv4Net> {
        self.subnets
            .iter()
            .filter(|s| !exclude_ids.contains(&s.id))
            .map(|s| s.cidr)
            .collect()
    }

    /// Find a free, non-overlapping range of `preferred_prefix` (falling
    /// back to smaller ranges down to /27 when the request is at least
    /// the conventional /24), placed in a zone chosen by [`select_zone`].
    ///
    /// `exclude_ids` removes subnets from the snapshot for both the
    /// overlap check and the zone-usage computation. `None` means the
    /// VPC is exhausted at every tried size: there is no room, as
    /// opposed to a provider error.
    pub fn find_available_range(
        &self,
        exclude_ids: &HashSet<String>,
        preferred_prefix: u8,
        available_zones: &[String],
    ) -> Option<Candidate> {
        let used = self.live_networks(exclude_ids);
        let zones_in_use = self.zones_in_use(exclude_ids);
        let sizes = candidate_prefix_lengths(preferred_prefix);

        for block in &self.cidr_blocks {
            for &size in &sizes {
                // A block too small for this size is skipped, not an error.
                let Ok(forward) = block.subnets(size) else {
                    continue;
                };
                let found = first_free(forward, &used).or_else(|| {
                    debug!("Forward scan of {} at /{} found nothing, scanning in reverse", block, size);
                    let all: Vec<Ipv4Net> = match block.subnets(size) {
                        Ok(ranges) => ranges.collect(),
                        Err(_) => return None,
                    };
                    first_free(all.into_iter().rev(), &used)
                });
                if let Some(cidr) = found {
                    let zone = select_zone(available_zones, &zones_in_use)?;
                    debug!("Found available range {} in {}", cidr, zone);
                    return Some(Candidate { cidr, zone });
                }
            }
        }
        None
    }

    /// Suggest a likely-free range from the highest-numbered end of each
    /// block. Advisory only: the window is checked against the snapshot,
    /// but callers still own validating the suggestion before use.
    pub fn suggest_range(&self, available_zones: &[String]) -> Option<Candidate> {
        let none_excluded = HashSet::new();
        let used = self.live_networks(&none_excluded);
        let zone = select_zone(available_zones, &self.zones_in_use(&none_excluded))?;

        for block in &self.cidr_blocks {
            if let Some(cidr) = tail_window_scan(block, DEFAULT_SUBNET_PREFIX, SUGGEST_WINDOW, &used)
            {
                debug!("Suggesting {} (no conflicts in the current snapshot)", cidr);
                return Some(Candidate { cidr, zone });
            }
            for size in (DEFAULT_SUBNET_PREFIX + 1)..=27 {
                if let Some(cidr) = tail_window_scan(block, size, SUGGEST_WINDOW_FALLBACK, &used) {
                    debug!("Suggesting {} (no conflicts in the current snapshot)", cidr);
                    return Some(Candidate { cidr, zone });
                }
            }
        }
        None
    }
}

/// Pick a placement zone, preferring one not already hosting a subnet.
/// Duplicate-zone placement is legal, just not preferred; `None` only
/// when the provider reports zero available zones.
pub fn select_zone(available_zones: &[String], zones_in_use: &HashSet<String>) -> Option<String> {
    available_zones
        .iter()
        .find(|zone| !zones_in_use.contains(*zone))
        .or_else(|| available_zones.first())
        .cloned()
}

/// Two CIDR ranges overlap when either contains the other's base address.
/// Exact for aligned CIDR intervals.
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

fn first_free(ranges: impl Iterator<Item = Ipv4Net>, used: &[Ipv4Net]) -> Option<Ipv4Net> {
    let mut ranges = ranges;
    ranges.find(|range| !used.iter().any(|u| overlaps(range, u)))
}

/// Scan the last `window` ranges of `size` within `block`, highest first.
fn tail_window_scan(block: &Ipv4Net, size: u8, window: usize, used: &[Ipv4Net]) -> Option<Ipv4Net> {
    let all: Vec<Ipv4Net> = block.subnets(size).ok()?.collect();
    let tail_start = all.len().saturating_sub(window);
    first_free(all[tail_start..].iter().copied().rev(), used)
}

/// Candidate sizes in increasing specificity: the requested prefix, then
/// /25../27 when the request is at least the conventional default. A
/// request for a range larger than the default is tried as-is only.
fn candidate_prefix_lengths(preferred: u8) -> Vec<u8> {
    if preferred >= DEFAULT_SUBNET_PREFIX {
        let mut sizes = vec![preferred];
        sizes.extend(((DEFAULT_SUBNET_PREFIX + 1)..=27).filter(|&s| s > preferred));
        sizes
    } else {
        vec![preferred]
    }
}
