//! Classification of load-balancer creation failures
//!
//! The provider signals a rejected subnet through an `InvalidSubnet` code
//! whose free text usually, but not always, names the subnet. The
//! classifier reads the structured code first and only then falls back to
//! the known message shapes; an unparsable message yields an empty
//! offender list, which callers must treat as "the whole set is suspect".

use aws_client::AwsError;
use regex::Regex;
use std::sync::LazyLock;

static SUBNET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"subnet-[0-9a-f]+").expect("subnet id pattern is valid"));

/// How a failed load-balancer creation should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateFailure {
    /// Name collision; fetch the existing resource instead
    DuplicateName,
    /// One or more subnets lack the free addresses the provider requires.
    /// An empty list means the message did not name a subnet.
    InsufficientAddressSpace { offending: Vec<String> },
    /// Anything else; fatal for the attempt
    Fatal,
}

/// Classify a `create_load_balancer` error.
pub fn classify_load_balancer_error(err: &AwsError) -> CreateFailure {
    let AwsError::Api { code, message } = err else {
        return CreateFailure::Fatal;
    };
    match code.as_str() {
        "DuplicateLoadBalancerName" => CreateFailure::DuplicateName,
        "InvalidSubnet"
            if message.contains("Not enough IP space")
                || message.contains("free IP addresses") =>
        {
            CreateFailure::InsufficientAddressSpace {
                offending: extract_subnet_ids(message),
            }
        }
        _ => CreateFailure::Fatal,
    }
}

/// Pull subnet-id tokens out of a free-text provider message, in first
/// occurrence order, deduplicated.
pub fn extract_subnet_ids(message: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for found in SUBNET_ID.find_iter(message) {
        let id = found.as_str().to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_is_recognized() {
        let err = AwsError::api(
            "DuplicateLoadBalancerName",
            "A load balancer with the name 'cpu-stresser-nlb' already exists",
        );
        assert_eq!(classify_load_balancer_error(&err), CreateFailure::DuplicateName);
    }

    #[test]
    fn insufficient_space_names_the_subnet() {
        let err = AwsError::api(
            "InvalidSubnet",
            "Not enough IP space in subnet-0a1b2c3d. At least 8 free IP addresses are required.",
        );
        assert_eq!(
            classify_load_balancer_error(&err),
            CreateFailure::InsufficientAddressSpace {
                offending: vec!["subnet-0a1b2c3d".to_string()],
            }
        );
    }

    #[test]
    fn unparsable_message_yields_empty_offenders() {
        let err = AwsError::api(
            "InvalidSubnet",
            "One of the provided subnets does not have enough free IP addresses.",
        );
        assert_eq!(
            classify_load_balancer_error(&err),
            CreateFailure::InsufficientAddressSpace { offending: vec![] }
        );
    }

    #[test]
    fn invalid_subnet_with_unrelated_message_is_fatal() {
        let err = AwsError::api("InvalidSubnet", "The subnet is in an unsupported state.");
        assert_eq!(classify_load_balancer_error(&err), CreateFailure::Fatal);
    }

    #[test]
    fn other_codes_and_kinds_are_fatal() {
        let api = AwsError::api("ValidationError", "something else entirely");
        assert_eq!(classify_load_balancer_error(&api), CreateFailure::Fatal);

        let not_found = AwsError::NotFound("vpc vpc-123".to_string());
        assert_eq!(classify_load_balancer_error(&not_found), CreateFailure::Fatal);
    }

    #[test]
    fn extracts_multiple_ids_deduplicated_in_order() {
        let message = "Not enough IP space in subnet-aa11 and subnet-bb22; \
                       subnet-aa11 has 2 free IP addresses";
        assert_eq!(
            extract_subnet_ids(message),
            vec!["subnet-aa11".to_string(), "subnet-bb22".to_string()]
        );
    }

    #[test]
    fn no_token_means_no_ids() {
        assert!(extract_subnet_ids("no identifiers in here").is_empty());
    }
}
