//! Concrete AWS client
//!
//! Maps the provisioner's typed operations onto the official SDK clients
//! for EC2, ELBv2, and Auto Scaling. All SDK errors are flattened into
//! [`AwsError`] at this edge: structured error codes survive verbatim so
//! callers can classify duplicate-name and address-space failures.

use crate::aws_trait::AwsClientTrait;
use crate::error::AwsError;
use crate::models::*;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::VpcCidrBlockStateCode;
use tracing::debug;

/// AWS API client backed by the official SDK
pub struct AwsClient {
    region: String,
    ec2: aws_sdk_ec2::Client,
    elbv2: aws_sdk_elasticloadbalancingv2::Client,
    autoscaling: aws_sdk_autoscaling::Client,
}

impl AwsClient {
    /// Create a client for the given region, resolving credentials from
    /// the default provider chain (environment, profile, instance role).
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            region: region.to_string(),
            ec2: aws_sdk_ec2::Client::new(&config),
            elbv2: aws_sdk_elasticloadbalancingv2::Client::new(&config),
            autoscaling: aws_sdk_autoscaling::Client::new(&config),
        }
    }
}

/// Flatten an SDK error into [`AwsError`], preserving the service error
/// code when one exists.
fn sdk_err<E, R>(context: &str, err: SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata,
{
    let message = ProvideErrorMetadata::message(&err).unwrap_or_default().to_string();
    match ProvideErrorMetadata::code(&err) {
        Some(code) if code.contains("NotFound") => {
            AwsError::NotFound(format!("{context}: [{code}] {message}"))
        }
        Some(code) => AwsError::Api {
            code: code.to_string(),
            message,
        },
        None => AwsError::Transport(format!("{context}: {err}")),
    }
}

fn build_err(context: &str, err: impl std::fmt::Display) -> AwsError {
    AwsError::InvalidRequest(format!("{context}: {err}"))
}

fn subnet_from_sdk(subnet: &aws_sdk_ec2::types::Subnet) -> Subnet {
    Subnet {
        subnet_id: subnet.subnet_id().unwrap_or_default().to_string(),
        vpc_id: subnet.vpc_id().unwrap_or_default().to_string(),
        cidr_block: subnet.cidr_block().unwrap_or_default().to_string(),
        availability_zone: subnet.availability_zone().unwrap_or_default().to_string(),
        available_ip_address_count: u32::try_from(subnet.available_ip_address_count().unwrap_or(0))
            .unwrap_or(0),
        tags: subnet
            .tags()
            .iter()
            .filter_map(|t| Some(Tag::new(t.key()?, t.value()?)))
            .collect(),
    }
}

fn lb_from_sdk(lb: &aws_sdk_elasticloadbalancingv2::types::LoadBalancer) -> LoadBalancer {
    use aws_sdk_elasticloadbalancingv2::types::{
        LoadBalancerSchemeEnum, LoadBalancerStateEnum, LoadBalancerTypeEnum,
    };
    LoadBalancer {
        arn: lb.load_balancer_arn().unwrap_or_default().to_string(),
        name: lb.load_balancer_name().unwrap_or_default().to_string(),
        dns_name: lb.dns_name().unwrap_or_default().to_string(),
        state: match lb.state().and_then(|s| s.code()) {
            Some(LoadBalancerStateEnum::Active | LoadBalancerStateEnum::ActiveImpaired) => {
                LoadBalancerState::Active
            }
            Some(LoadBalancerStateEnum::Failed) => LoadBalancerState::Failed,
            _ => LoadBalancerState::Provisioning,
        },
        lb_type: match lb.r#type() {
            Some(LoadBalancerTypeEnum::Application) => LoadBalancerType::Application,
            _ => LoadBalancerType::Network,
        },
        scheme: match lb.scheme() {
            Some(LoadBalancerSchemeEnum::Internal) => LoadBalancerScheme::Internal,
            _ => LoadBalancerScheme::InternetFacing,
        },
        subnets: lb
            .availability_zones()
            .iter()
            .filter_map(|az| az.subnet_id().map(str::to_string))
            .collect(),
    }
}

fn tg_from_sdk(tg: &aws_sdk_elasticloadbalancingv2::types::TargetGroup) -> TargetGroup {
    TargetGroup {
        arn: tg.target_group_arn().unwrap_or_default().to_string(),
        name: tg.target_group_name().unwrap_or_default().to_string(),
        protocol: tg.protocol().map(|p| p.as_str().to_string()).unwrap_or_default(),
        port: tg.port().and_then(|p| u16::try_from(p).ok()).unwrap_or_default(),
        vpc_id: tg.vpc_id().unwrap_or_default().to_string(),
    }
}

fn listener_from_sdk(listener: &aws_sdk_elasticloadbalancingv2::types::Listener) -> Listener {
    Listener {
        arn: listener.listener_arn().unwrap_or_default().to_string(),
        load_balancer_arn: listener.load_balancer_arn().unwrap_or_default().to_string(),
        protocol: listener.protocol().map(|p| p.as_str().to_string()).unwrap_or_default(),
        port: listener.port().and_then(|p| u16::try_from(p).ok()).unwrap_or_default(),
        target_group_arn: listener
            .default_actions()
            .iter()
            .find_map(|a| a.target_group_arn().map(str::to_string)),
    }
}

fn group_from_sdk(group: &aws_sdk_autoscaling::types::AutoScalingGroup) -> AutoScalingGroup {
    AutoScalingGroup {
        name: group.auto_scaling_group_name().unwrap_or_default().to_string(),
        launch_template_id: group
            .launch_template()
            .and_then(|t| t.launch_template_id())
            .unwrap_or_default()
            .to_string(),
        min_size: u32::try_from(group.min_size().unwrap_or(0)).unwrap_or(0),
        max_size: u32::try_from(group.max_size().unwrap_or(0)).unwrap_or(0),
        desired_capacity: u32::try_from(group.desired_capacity().unwrap_or(0)).unwrap_or(0),
        subnet_ids: group
            .vpc_zone_identifier()
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        target_group_arns: group.target_group_arns().to_vec(),
        health_check_type: group.health_check_type().unwrap_or_default().to_string(),
        default_instance_warmup: group
            .default_instance_warmup()
            .and_then(|w| u32::try_from(w).ok()),
        default_cooldown: group.default_cooldown().and_then(|c| u32::try_from(c).ok()),
    }
}

#[async_trait::async_trait]
impl AwsClientTrait for AwsClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn describe_vpc(&self, vpc_id: &str) -> Result<Vpc, AwsError> {
        debug!("Describing VPC {}", vpc_id);
        let out = self
            .ec2
            .describe_vpcs()
            .vpc_ids(vpc_id)
            .send()
            .await
            .map_err(|e| sdk_err("describe_vpcs", e))?;
        let vpc = out
            .vpcs()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("vpc {vpc_id}")))?;
        let cidr_block_associations = vpc
            .cidr_block_association_set()
            .iter()
            .filter_map(|assoc| {
                let cidr_block = assoc.cidr_block()?.to_string();
                let state = match assoc.cidr_block_state().and_then(|s| s.state()) {
                    Some(VpcCidrBlockStateCode::Associated) => CidrBlockState::Associated,
                    Some(VpcCidrBlockStateCode::Associating) => CidrBlockState::Associating,
                    Some(VpcCidrBlockStateCode::Disassociating) => CidrBlockState::Disassociating,
                    Some(VpcCidrBlockStateCode::Failing) => CidrBlockState::Failing,
                    Some(VpcCidrBlockStateCode::Failed) => CidrBlockState::Failed,
                    _ => CidrBlockState::Disassociated,
                };
                Some(CidrBlockAssociation { cidr_block, state })
            })
            .collect();
        Ok(Vpc {
            vpc_id: vpc.vpc_id().unwrap_or_default().to_string(),
            cidr_block: vpc.cidr_block().unwrap_or_default().to_string(),
            cidr_block_associations,
        })
    }

    async fn describe_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, AwsError> {
        let filter = aws_sdk_ec2::types::Filter::builder()
            .name("vpc-id")
            .values(vpc_id)
            .build();
        let out = self
            .ec2
            .describe_subnets()
            .filters(filter)
            .send()
            .await
            .map_err(|e| sdk_err("describe_subnets", e))?;
        Ok(out.subnets().iter().map(subnet_from_sdk).collect())
    }

    async fn describe_availability_zones(&self) -> Result<Vec<String>, AwsError> {
        let filter = aws_sdk_ec2::types::Filter::builder()
            .name("state")
            .values("available")
            .build();
        let out = self
            .ec2
            .describe_availability_zones()
            .filters(filter)
            .send()
            .await
            .map_err(|e| sdk_err("describe_availability_zones", e))?;
        Ok(out
            .availability_zones()
            .iter()
            .filter_map(|z| z.zone_name().map(str::to_string))
            .collect())
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr_block: &str,
        availability_zone: Option<&str>,
        tags: &[Tag],
    ) -> Result<Subnet, AwsError> {
        use aws_sdk_ec2::types::{ResourceType, TagSpecification};
        debug!("Creating subnet {} in {}", cidr_block, vpc_id);
        let mut req = self.ec2.create_subnet().vpc_id(vpc_id).cidr_block(cidr_block);
        if let Some(zone) = availability_zone {
            req = req.availability_zone(zone);
        }
        if !tags.is_empty() {
            let sdk_tags = tags
                .iter()
                .map(|t| {
                    aws_sdk_ec2::types::Tag::builder()
                        .key(&t.key)
                        .value(&t.value)
                        .build()
                })
                .collect();
            req = req.tag_specifications(
                TagSpecification::builder()
                    .resource_type(ResourceType::Subnet)
                    .set_tags(Some(sdk_tags))
                    .build(),
            );
        }
        let out = req.send().await.map_err(|e| sdk_err("create_subnet", e))?;
        let subnet = out
            .subnet()
            .ok_or_else(|| AwsError::InvalidRequest("create_subnet returned no subnet".to_string()))?;
        Ok(subnet_from_sdk(subnet))
    }

    async fn describe_launch_template(&self, template_id: &str) -> Result<LaunchTemplate, AwsError> {
        let out = self
            .ec2
            .describe_launch_templates()
            .launch_template_ids(template_id)
            .send()
            .await
            .map_err(|e| sdk_err("describe_launch_templates", e))?;
        let template = out
            .launch_templates()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("launch template {template_id}")))?;
        Ok(LaunchTemplate {
            id: template.launch_template_id().unwrap_or_default().to_string(),
            name: template.launch_template_name().map(str::to_string),
            latest_version: template.latest_version_number().unwrap_or(1),
        })
    }

    async fn create_load_balancer(
        &self,
        name: &str,
        lb_type: LoadBalancerType,
        subnet_ids: &[String],
        scheme: LoadBalancerScheme,
        tags: &[Tag],
    ) -> Result<LoadBalancer, AwsError> {
        use aws_sdk_elasticloadbalancingv2::types::{LoadBalancerSchemeEnum, LoadBalancerTypeEnum};
        debug!("Creating load balancer {} on {} subnet(s)", name, subnet_ids.len());
        let mut sdk_tags = Vec::with_capacity(tags.len());
        for tag in tags {
            sdk_tags.push(
                aws_sdk_elasticloadbalancingv2::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
                    .map_err(|e| build_err("load balancer tag", e))?,
            );
        }
        let out = self
            .elbv2
            .create_load_balancer()
            .name(name)
            .r#type(match lb_type {
                LoadBalancerType::Network => LoadBalancerTypeEnum::Network,
                LoadBalancerType::Application => LoadBalancerTypeEnum::Application,
            })
            .scheme(match scheme {
                LoadBalancerScheme::InternetFacing => LoadBalancerSchemeEnum::InternetFacing,
                LoadBalancerScheme::Internal => LoadBalancerSchemeEnum::Internal,
            })
            .set_subnets(Some(subnet_ids.to_vec()))
            .set_tags((!sdk_tags.is_empty()).then_some(sdk_tags))
            .send()
            .await
            .map_err(|e| sdk_err("create_load_balancer", e))?;
        let lb = out
            .load_balancers()
            .first()
            .ok_or_else(|| AwsError::InvalidRequest("create_load_balancer returned nothing".to_string()))?;
        Ok(lb_from_sdk(lb))
    }

    async fn describe_load_balancer_by_name(&self, name: &str) -> Result<LoadBalancer, AwsError> {
        let out = self
            .elbv2
            .describe_load_balancers()
            .names(name)
            .send()
            .await
            .map_err(|e| sdk_err("describe_load_balancers", e))?;
        let lb = out
            .load_balancers()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("load balancer {name}")))?;
        Ok(lb_from_sdk(lb))
    }

    async fn describe_load_balancer(&self, arn: &str) -> Result<LoadBalancer, AwsError> {
        let out = self
            .elbv2
            .describe_load_balancers()
            .load_balancer_arns(arn)
            .send()
            .await
            .map_err(|e| sdk_err("describe_load_balancers", e))?;
        let lb = out
            .load_balancers()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("load balancer {arn}")))?;
        Ok(lb_from_sdk(lb))
    }

    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<TargetGroup, AwsError> {
        use aws_sdk_elasticloadbalancingv2::types::{ProtocolEnum, TargetTypeEnum};
        debug!("Creating target group {}", spec.name);
        let mut sdk_tags = Vec::with_capacity(spec.tags.len());
        for tag in &spec.tags {
            sdk_tags.push(
                aws_sdk_elasticloadbalancingv2::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
                    .map_err(|e| build_err("target group tag", e))?,
            );
        }
        let out = self
            .elbv2
            .create_target_group()
            .name(&spec.name)
            .protocol(ProtocolEnum::from(spec.protocol.as_str()))
            .port(i32::from(spec.port))
            .vpc_id(&spec.vpc_id)
            .target_type(TargetTypeEnum::from(spec.target_type.as_str()))
            .health_check_protocol(ProtocolEnum::from(spec.health_check_protocol.as_str()))
            .health_check_port(&spec.health_check_port)
            .health_check_enabled(spec.health_check_enabled)
            .set_tags((!sdk_tags.is_empty()).then_some(sdk_tags))
            .send()
            .await
            .map_err(|e| sdk_err("create_target_group", e))?;
        let tg = out
            .target_groups()
            .first()
            .ok_or_else(|| AwsError::InvalidRequest("create_target_group returned nothing".to_string()))?;
        Ok(tg_from_sdk(tg))
    }

    async fn describe_target_group_by_name(&self, name: &str) -> Result<TargetGroup, AwsError> {
        let out = self
            .elbv2
            .describe_target_groups()
            .names(name)
            .send()
            .await
            .map_err(|e| sdk_err("describe_target_groups", e))?;
        let tg = out
            .target_groups()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("target group {name}")))?;
        Ok(tg_from_sdk(tg))
    }

    async fn describe_listeners(&self, load_balancer_arn: &str) -> Result<Vec<Listener>, AwsError> {
        let out = self
            .elbv2
            .describe_listeners()
            .load_balancer_arn(load_balancer_arn)
            .send()
            .await
            .map_err(|e| sdk_err("describe_listeners", e))?;
        Ok(out.listeners().iter().map(listener_from_sdk).collect())
    }

    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        protocol: &str,
        port: u16,
        target_group_arn: &str,
    ) -> Result<Listener, AwsError> {
        use aws_sdk_elasticloadbalancingv2::types::{Action, ActionTypeEnum, ProtocolEnum};
        debug!("Creating listener on port {}", port);
        let action = Action::builder()
            .r#type(ActionTypeEnum::Forward)
            .target_group_arn(target_group_arn)
            .build()
            .map_err(|e| build_err("listener action", e))?;
        let out = self
            .elbv2
            .create_listener()
            .load_balancer_arn(load_balancer_arn)
            .protocol(ProtocolEnum::from(protocol))
            .port(i32::from(port))
            .default_actions(action)
            .send()
            .await
            .map_err(|e| sdk_err("create_listener", e))?;
        let listener = out
            .listeners()
            .first()
            .ok_or_else(|| AwsError::InvalidRequest("create_listener returned nothing".to_string()))?;
        Ok(listener_from_sdk(listener))
    }

    async fn create_auto_scaling_group(&self, spec: &AutoScalingGroupSpec) -> Result<(), AwsError> {
        use aws_sdk_autoscaling::types::LaunchTemplateSpecification;
        debug!("Creating auto scaling group {}", spec.name);
        let template = LaunchTemplateSpecification::builder()
            .launch_template_id(&spec.launch_template_id)
            .version(&spec.launch_template_version)
            .build();
        let mut req = self
            .autoscaling
            .create_auto_scaling_group()
            .auto_scaling_group_name(&spec.name)
            .launch_template(template)
            .min_size(spec.min_size as i32)
            .max_size(spec.max_size as i32)
            .desired_capacity(spec.desired_capacity as i32)
            .vpc_zone_identifier(spec.subnet_ids.join(","))
            .health_check_type(&spec.health_check_type)
            .health_check_grace_period(spec.health_check_grace_period as i32);
        for arn in &spec.target_group_arns {
            req = req.target_group_arns(arn);
        }
        for tag in &spec.tags {
            req = req.tags(
                aws_sdk_autoscaling::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .propagate_at_launch(true)
                    .build()
                    .map_err(|e| build_err("auto scaling group tag", e))?,
            );
        }
        req.send()
            .await
            .map_err(|e| sdk_err("create_auto_scaling_group", e))?;
        Ok(())
    }

    async fn describe_auto_scaling_group(&self, name: &str) -> Result<AutoScalingGroup, AwsError> {
        let out = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .send()
            .await
            .map_err(|e| sdk_err("describe_auto_scaling_groups", e))?;
        let group = out
            .auto_scaling_groups()
            .first()
            .ok_or_else(|| AwsError::NotFound(format!("auto scaling group {name}")))?;
        Ok(group_from_sdk(group))
    }

    async fn set_instance_warmup(&self, group_name: &str, warmup_seconds: u32) -> Result<(), AwsError> {
        self.autoscaling
            .update_auto_scaling_group()
            .auto_scaling_group_name(group_name)
            .default_instance_warmup(warmup_seconds as i32)
            .send()
            .await
            .map_err(|e| sdk_err("update_auto_scaling_group", e))?;
        Ok(())
    }

    async fn set_default_cooldown(&self, group_name: &str, cooldown_seconds: u32) -> Result<(), AwsError> {
        self.autoscaling
            .update_auto_scaling_group()
            .auto_scaling_group_name(group_name)
            .default_cooldown(cooldown_seconds as i32)
            .send()
            .await
            .map_err(|e| sdk_err("update_auto_scaling_group", e))?;
        Ok(())
    }

    async fn put_scaling_policy(&self, spec: &ScalingPolicySpec) -> Result<ScalingPolicy, AwsError> {
        use aws_sdk_autoscaling::types::{
            MetricType, PredefinedMetricSpecification, TargetTrackingConfiguration,
        };
        debug!("Putting scaling policy {}", spec.policy_name);
        let metric = PredefinedMetricSpecification::builder()
            .predefined_metric_type(MetricType::from(spec.predefined_metric_type.as_str()))
            .build()
            .map_err(|e| build_err("predefined metric", e))?;
        let config = TargetTrackingConfiguration::builder()
            .target_value(spec.target_value)
            .predefined_metric_specification(metric)
            .disable_scale_in(spec.disable_scale_in)
            .build()
            .map_err(|e| build_err("target tracking configuration", e))?;
        let out = self
            .autoscaling
            .put_scaling_policy()
            .auto_scaling_group_name(&spec.group_name)
            .policy_name(&spec.policy_name)
            .policy_type("TargetTrackingScaling")
            .target_tracking_configuration(config)
            .enabled(true)
            .send()
            .await
            .map_err(|e| sdk_err("put_scaling_policy", e))?;
        Ok(ScalingPolicy {
            arn: out.policy_arn().unwrap_or_default().to_string(),
            name: spec.policy_name.clone(),
            group_name: spec.group_name.clone(),
            target_value: spec.target_value,
            predefined_metric_type: spec.predefined_metric_type.clone(),
            disable_scale_in: spec.disable_scale_in,
        })
    }

    async fn delete_scaling_policy(&self, group_name: &str, policy_name: &str) -> Result<(), AwsError> {
        self.autoscaling
            .delete_policy()
            .auto_scaling_group_name(group_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| sdk_err("delete_policy", e))?;
        Ok(())
    }
}
