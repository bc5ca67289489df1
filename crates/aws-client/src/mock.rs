//! Mock AWS client for unit testing
//!
//! Stores resources in memory and can be seeded with VPCs, subnets, zones,
//! and launch templates. Failure queues let tests script provider errors
//! for specific operations (e.g. an insufficient-address-space rejection
//! on load balancer creation) that are consumed in order before calls
//! succeed again.

use crate::aws_trait::AwsClientTrait;
use crate::error::AwsError;
use crate::models::*;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// In-memory mock of [`AwsClientTrait`]
#[derive(Clone)]
pub struct MockAwsClient {
    region: String,
    vpcs: Arc<Mutex<BTreeMap<String, Vpc>>>,
    subnets: Arc<Mutex<BTreeMap<String, Subnet>>>,
    zones: Arc<Mutex<Vec<String>>>,
    launch_templates: Arc<Mutex<BTreeMap<String, LaunchTemplate>>>,
    load_balancers: Arc<Mutex<BTreeMap<String, LoadBalancer>>>,
    target_groups: Arc<Mutex<BTreeMap<String, TargetGroup>>>,
    listeners: Arc<Mutex<Vec<Listener>>>,
    groups: Arc<Mutex<BTreeMap<String, AutoScalingGroup>>>,
    policies: Arc<Mutex<BTreeMap<String, ScalingPolicy>>>,
    create_load_balancer_errors: Arc<Mutex<VecDeque<AwsError>>>,
    put_scaling_policy_errors: Arc<Mutex<VecDeque<AwsError>>>,
    initial_lb_state: Arc<Mutex<LoadBalancerState>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockAwsClient {
    /// Create an empty mock for the given region
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            vpcs: Arc::new(Mutex::new(BTreeMap::new())),
            subnets: Arc::new(Mutex::new(BTreeMap::new())),
            zones: Arc::new(Mutex::new(Vec::new())),
            launch_templates: Arc::new(Mutex::new(BTreeMap::new())),
            load_balancers: Arc::new(Mutex::new(BTreeMap::new())),
            target_groups: Arc::new(Mutex::new(BTreeMap::new())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            groups: Arc::new(Mutex::new(BTreeMap::new())),
            policies: Arc::new(Mutex::new(BTreeMap::new())),
            create_load_balancer_errors: Arc::new(Mutex::new(VecDeque::new())),
            put_scaling_policy_errors: Arc::new(Mutex::new(VecDeque::new())),
            initial_lb_state: Arc::new(Mutex::new(LoadBalancerState::Active)),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Seed a VPC (for test setup)
    pub fn add_vpc(&self, vpc: Vpc) {
        self.vpcs.lock().unwrap().insert(vpc.vpc_id.clone(), vpc);
    }

    /// Seed a subnet (for test setup)
    pub fn add_subnet(&self, subnet: Subnet) {
        self.subnets.lock().unwrap().insert(subnet.subnet_id.clone(), subnet);
    }

    /// Seed the available zones (for test setup)
    pub fn set_zones(&self, zones: Vec<String>) {
        *self.zones.lock().unwrap() = zones;
    }

    /// Seed a launch template (for test setup)
    pub fn add_launch_template(&self, template: LaunchTemplate) {
        self.launch_templates
            .lock()
            .unwrap()
            .insert(template.id.clone(), template);
    }

    /// Queue an error for the next `create_load_balancer` call
    pub fn push_create_load_balancer_error(&self, err: AwsError) {
        self.create_load_balancer_errors.lock().unwrap().push_back(err);
    }

    /// Queue an error for the next `put_scaling_policy` call
    pub fn push_put_scaling_policy_error(&self, err: AwsError) {
        self.put_scaling_policy_errors.lock().unwrap().push_back(err);
    }

    /// State newly created load balancers report until changed
    pub fn set_initial_load_balancer_state(&self, state: LoadBalancerState) {
        *self.initial_lb_state.lock().unwrap() = state;
    }

    /// Flip an existing load balancer's state (for activation tests)
    pub fn set_load_balancer_state(&self, name: &str, state: LoadBalancerState) {
        if let Some(lb) = self.load_balancers.lock().unwrap().get_mut(name) {
            lb.state = state;
        }
    }

    /// Fetch a seeded or created subnet (for assertions)
    pub fn subnet(&self, subnet_id: &str) -> Option<Subnet> {
        self.subnets.lock().unwrap().get(subnet_id).cloned()
    }

    /// Fetch a created load balancer by name (for assertions)
    pub fn load_balancer(&self, name: &str) -> Option<LoadBalancer> {
        self.load_balancers.lock().unwrap().get(name).cloned()
    }

    /// Fetch a created auto scaling group (for assertions)
    pub fn auto_scaling_group(&self, name: &str) -> Option<AutoScalingGroup> {
        self.groups.lock().unwrap().get(name).cloned()
    }

    /// Fetch a created scaling policy (for assertions)
    pub fn scaling_policy(&self, group_name: &str, policy_name: &str) -> Option<ScalingPolicy> {
        self.policies
            .lock()
            .unwrap()
            .get(&policy_key(group_name, policy_name))
            .cloned()
    }

    /// All listeners created so far (for assertions)
    pub fn all_listeners(&self) -> Vec<Listener> {
        self.listeners.lock().unwrap().clone()
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    fn default_zone(&self) -> String {
        self.zones
            .lock()
            .unwrap()
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{}a", self.region))
    }
}

fn policy_key(group_name: &str, policy_name: &str) -> String {
    format!("{group_name}/{policy_name}")
}

/// Free addresses a fresh subnet of the given CIDR starts with (the
/// provider reserves five addresses per subnet)
fn fresh_subnet_capacity(cidr_block: &str) -> u32 {
    let prefix: u32 = cidr_block
        .rsplit('/')
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(32);
    if prefix >= 32 {
        return 0;
    }
    u32::try_from((1u64 << (32 - prefix)).saturating_sub(5)).unwrap_or(u32::MAX)
}

#[async_trait::async_trait]
impl AwsClientTrait for MockAwsClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn describe_vpc(&self, vpc_id: &str) -> Result<Vpc, AwsError> {
        self.vpcs
            .lock()
            .unwrap()
            .get(vpc_id)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("vpc {vpc_id}")))
    }

    async fn describe_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>, AwsError> {
        Ok(self
            .subnets
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.vpc_id == vpc_id)
            .cloned()
            .collect())
    }

    async fn describe_availability_zones(&self) -> Result<Vec<String>, AwsError> {
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr_block: &str,
        availability_zone: Option<&str>,
        tags: &[Tag],
    ) -> Result<Subnet, AwsError> {
        if !self.vpcs.lock().unwrap().contains_key(vpc_id) {
            return Err(AwsError::NotFound(format!("vpc {vpc_id}")));
        }
        let subnet = Subnet {
            subnet_id: format!("subnet-{:08x}", self.next_id()),
            vpc_id: vpc_id.to_string(),
            cidr_block: cidr_block.to_string(),
            availability_zone: availability_zone
                .map(str::to_string)
                .unwrap_or_else(|| self.default_zone()),
            available_ip_address_count: fresh_subnet_capacity(cidr_block),
            tags: tags.to_vec(),
        };
        self.subnets
            .lock()
            .unwrap()
            .insert(subnet.subnet_id.clone(), subnet.clone());
        Ok(subnet)
    }

    async fn describe_launch_template(&self, template_id: &str) -> Result<LaunchTemplate, AwsError> {
        self.launch_templates
            .lock()
            .unwrap()
            .get(template_id)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("launch template {template_id}")))
    }

    async fn create_load_balancer(
        &self,
        name: &str,
        lb_type: LoadBalancerType,
        subnet_ids: &[String],
        scheme: LoadBalancerScheme,
        tags: &[Tag],
    ) -> Result<LoadBalancer, AwsError> {
        let _ = tags;
        if let Some(err) = self.create_load_balancer_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut load_balancers = self.load_balancers.lock().unwrap();
        if load_balancers.contains_key(name) {
            return Err(AwsError::api(
                "DuplicateLoadBalancerName",
                format!("A load balancer with the name '{name}' already exists"),
            ));
        }
        let id = self.next_id();
        let lb = LoadBalancer {
            arn: format!(
                "arn:aws:elasticloadbalancing:{}:123456789012:loadbalancer/net/{}/{:012x}",
                self.region, name, id
            ),
            name: name.to_string(),
            dns_name: format!("{}-{:012x}.elb.{}.amazonaws.com", name, id, self.region),
            state: *self.initial_lb_state.lock().unwrap(),
            lb_type,
            scheme,
            subnets: subnet_ids.to_vec(),
        };
        load_balancers.insert(name.to_string(), lb.clone());
        Ok(lb)
    }

    async fn describe_load_balancer_by_name(&self, name: &str) -> Result<LoadBalancer, AwsError> {
        self.load_balancers
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("load balancer {name}")))
    }

    async fn describe_load_balancer(&self, arn: &str) -> Result<LoadBalancer, AwsError> {
        self.load_balancers
            .lock()
            .unwrap()
            .values()
            .find(|lb| lb.arn == arn)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("load balancer {arn}")))
    }

    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<TargetGroup, AwsError> {
        let mut target_groups = self.target_groups.lock().unwrap();
        if target_groups.contains_key(&spec.name) {
            return Err(AwsError::api(
                "DuplicateTargetGroupName",
                format!("A target group with the name '{}' already exists", spec.name),
            ));
        }
        let tg = TargetGroup {
            arn: format!(
                "arn:aws:elasticloadbalancing:{}:123456789012:targetgroup/{}/{:012x}",
                self.region,
                spec.name,
                self.next_id()
            ),
            name: spec.name.clone(),
            protocol: spec.protocol.clone(),
            port: spec.port,
            vpc_id: spec.vpc_id.clone(),
        };
        target_groups.insert(spec.name.clone(), tg.clone());
        Ok(tg)
    }

    async fn describe_target_group_by_name(&self, name: &str) -> Result<TargetGroup, AwsError> {
        self.target_groups
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("target group {name}")))
    }

    async fn describe_listeners(&self, load_balancer_arn: &str) -> Result<Vec<Listener>, AwsError> {
        Ok(self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.load_balancer_arn == load_balancer_arn)
            .cloned()
            .collect())
    }

    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        protocol: &str,
        port: u16,
        target_group_arn: &str,
    ) -> Result<Listener, AwsError> {
        let listener = Listener {
            arn: format!(
                "arn:aws:elasticloadbalancing:{}:123456789012:listener/net/{:012x}",
                self.region,
                self.next_id()
            ),
            load_balancer_arn: load_balancer_arn.to_string(),
            protocol: protocol.to_string(),
            port,
            target_group_arn: Some(target_group_arn.to_string()),
        };
        self.listeners.lock().unwrap().push(listener.clone());
        Ok(listener)
    }

    async fn create_auto_scaling_group(&self, spec: &AutoScalingGroupSpec) -> Result<(), AwsError> {
        let mut groups = self.groups.lock().unwrap();
        if groups.contains_key(&spec.name) {
            return Err(AwsError::api(
                "AlreadyExists",
                format!("AutoScalingGroup by this name already exists: {}", spec.name),
            ));
        }
        groups.insert(
            spec.name.clone(),
            AutoScalingGroup {
                name: spec.name.clone(),
                launch_template_id: spec.launch_template_id.clone(),
                min_size: spec.min_size,
                max_size: spec.max_size,
                desired_capacity: spec.desired_capacity,
                subnet_ids: spec.subnet_ids.clone(),
                target_group_arns: spec.target_group_arns.clone(),
                health_check_type: spec.health_check_type.clone(),
                default_instance_warmup: None,
                default_cooldown: None,
            },
        );
        Ok(())
    }

    async fn describe_auto_scaling_group(&self, name: &str) -> Result<AutoScalingGroup, AwsError> {
        self.groups
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AwsError::NotFound(format!("auto scaling group {name}")))
    }

    async fn set_instance_warmup(&self, group_name: &str, warmup_seconds: u32) -> Result<(), AwsError> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_name)
            .ok_or_else(|| AwsError::NotFound(format!("auto scaling group {group_name}")))?;
        group.default_instance_warmup = Some(warmup_seconds);
        Ok(())
    }

    async fn set_default_cooldown(&self, group_name: &str, cooldown_seconds: u32) -> Result<(), AwsError> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_name)
            .ok_or_else(|| AwsError::NotFound(format!("auto scaling group {group_name}")))?;
        group.default_cooldown = Some(cooldown_seconds);
        Ok(())
    }

    async fn put_scaling_policy(&self, spec: &ScalingPolicySpec) -> Result<ScalingPolicy, AwsError> {
        if let Some(err) = self.put_scaling_policy_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut policies = self.policies.lock().unwrap();
        let key = policy_key(&spec.group_name, &spec.policy_name);
        if policies.contains_key(&key) {
            return Err(AwsError::api(
                "AlreadyExists",
                format!("Scaling policy {} already exists", spec.policy_name),
            ));
        }
        let policy = ScalingPolicy {
            arn: format!(
                "arn:aws:autoscaling:{}:123456789012:scalingPolicy:{:012x}:autoScalingGroupName/{}:policyName/{}",
                self.region,
                self.next_id(),
                spec.group_name,
                spec.policy_name
            ),
            name: spec.policy_name.clone(),
            group_name: spec.group_name.clone(),
            target_value: spec.target_value,
            predefined_metric_type: spec.predefined_metric_type.clone(),
            disable_scale_in: spec.disable_scale_in,
        };
        policies.insert(key, policy.clone());
        Ok(policy)
    }

    async fn delete_scaling_policy(&self, group_name: &str, policy_name: &str) -> Result<(), AwsError> {
        self.policies
            .lock()
            .unwrap()
            .remove(&policy_key(group_name, policy_name))
            .map(|_| ())
            .ok_or_else(|| AwsError::NotFound(format!("scaling policy {policy_name}")))
    }
}
