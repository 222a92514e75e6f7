//! In-memory cloud used by the pipeline tests
//!
//! Every listing is served in pages of `page_size` items and every call is
//! recorded so tests can assert on what was asked of which region.

#![allow(dead_code)]

use async_trait::async_trait;
use oci_inventory::error::{InventoryError, InventoryResult};
use oci_inventory::inventory::{
    AvailabilityDomainDirectory, BlockStorageInventory, CompartmentDirectory, ComputeInventory,
    RegionServices, ServiceProvider,
};
use oci_inventory::resource::{AvailabilityDomain, Compartment, Page, RegionSubscription};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeCloud {
    tenancy: String,
    subscriptions: Vec<RegionSubscription>,
    compartments: HashMap<String, Compartment>,
    children: HashMap<String, Vec<String>>,
    domains: HashMap<String, Vec<String>>,
    instances: HashMap<(String, String), Vec<Value>>,
    boot_volumes: HashMap<(String, String, String), Vec<Value>>,
    volumes: HashMap<(String, String), Vec<Value>>,
    failing_compartments: HashSet<String>,
    failing_instances: HashSet<(String, String)>,
    missing: HashSet<String>,
    page_size: usize,
    calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    /// A tenancy whose root compartment id is `tenancy`
    pub fn new(tenancy: &str, root_name: &str) -> Self {
        let mut cloud = Self {
            tenancy: tenancy.to_string(),
            page_size: 100,
            ..Default::default()
        };
        cloud
            .compartments
            .insert(tenancy.to_string(), Compartment::new(tenancy, root_name));
        cloud
    }

    pub fn region(mut self, name: &str, is_home: bool) -> Self {
        self.subscriptions
            .push(RegionSubscription::new(name, is_home));
        self
    }

    pub fn compartment(mut self, parent: &str, id: &str, name: &str) -> Self {
        self.compartments
            .entry(id.to_string())
            .or_insert_with(|| Compartment::new(id, name).with_parent(parent));
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(id.to_string());
        self
    }

    pub fn domains(mut self, region: &str, names: &[&str]) -> Self {
        self.domains.insert(
            region.to_string(),
            names.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn instance(mut self, region: &str, compartment: &str, data: Value) -> Self {
        self.instances
            .entry((region.to_string(), compartment.to_string()))
            .or_default()
            .push(data);
        self
    }

    pub fn boot_volume(mut self, region: &str, domain: &str, compartment: &str, data: Value) -> Self {
        self.boot_volumes
            .entry((region.to_string(), domain.to_string(), compartment.to_string()))
            .or_default()
            .push(data);
        self
    }

    pub fn volume(mut self, region: &str, compartment: &str, data: Value) -> Self {
        self.volumes
            .entry((region.to_string(), compartment.to_string()))
            .or_default()
            .push(data);
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn fail_compartment_listing(mut self, id: &str) -> Self {
        self.failing_compartments.insert(id.to_string());
        self
    }

    pub fn fail_instances(mut self, region: &str, compartment: &str) -> Self {
        self.failing_instances
            .insert((region.to_string(), compartment.to_string()));
        self
    }

    /// `get_compartment` fails for this id
    pub fn hide_compartment(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }

    pub fn provider(self) -> FakeProvider {
        let home = self
            .subscriptions
            .iter()
            .find(|s| s.is_home_region)
            .or(self.subscriptions.first())
            .map(|s| s.region_name.clone())
            .unwrap_or_else(|| "home".to_string());
        FakeProvider {
            cloud: Arc::new(self),
            home,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn paginate<T: Clone>(&self, items: &[T], page: Option<String>) -> Page<T> {
        let start: usize = page.and_then(|p| p.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(items.len());
        let slice = items.get(start..end).unwrap_or_default().to_vec();
        let next = (end < items.len()).then(|| end.to_string());
        Page::new(slice, next)
    }
}

pub struct FakeProvider {
    pub cloud: Arc<FakeCloud>,
    home: String,
}

impl FakeProvider {
    pub fn calls(&self) -> Vec<String> {
        self.cloud.calls.lock().unwrap().clone()
    }

    /// Calls whose description starts with `prefix`
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

impl ServiceProvider for FakeProvider {
    type Services = FakeRegion;

    fn tenancy_id(&self) -> &str {
        &self.cloud.tenancy
    }

    fn home_region(&self) -> &str {
        &self.home
    }

    fn connect(&self, region: &str) -> InventoryResult<FakeRegion> {
        self.cloud.record(format!("connect {}", region));
        Ok(FakeRegion {
            cloud: Arc::clone(&self.cloud),
            region: region.to_string(),
        })
    }
}

pub struct FakeRegion {
    cloud: Arc<FakeCloud>,
    region: String,
}

impl FakeRegion {
    fn key(&self, compartment: &str) -> (String, String) {
        (self.region.clone(), compartment.to_string())
    }
}

#[async_trait]
impl CompartmentDirectory for FakeRegion {
    async fn list_compartments(
        &self,
        parent_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Compartment>> {
        self.cloud
            .record(format!("list_compartments {} {}", self.region, parent_id));
        if self.cloud.failing_compartments.contains(parent_id) {
            return Err(InventoryError::directory(parent_id, "API request failed: 500"));
        }
        let children: Vec<Compartment> = self
            .cloud
            .children
            .get(parent_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.cloud.compartments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(self.cloud.paginate(&children, page))
    }

    async fn get_compartment(&self, compartment_id: &str) -> InventoryResult<Compartment> {
        self.cloud
            .record(format!("get_compartment {} {}", self.region, compartment_id));
        if self.cloud.missing.contains(compartment_id) {
            return Err(InventoryError::directory(compartment_id, "API request failed: 404"));
        }
        self.cloud
            .compartments
            .get(compartment_id)
            .cloned()
            .ok_or_else(|| InventoryError::directory(compartment_id, "API request failed: 404"))
    }

    async fn list_region_subscriptions(
        &self,
        tenancy_id: &str,
    ) -> InventoryResult<Vec<RegionSubscription>> {
        self.cloud
            .record(format!("list_region_subscriptions {} {}", self.region, tenancy_id));
        Ok(self.cloud.subscriptions.clone())
    }
}

#[async_trait]
impl AvailabilityDomainDirectory for FakeRegion {
    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> InventoryResult<Vec<AvailabilityDomain>> {
        self.cloud.record(format!(
            "list_availability_domains {} {}",
            self.region, compartment_id
        ));
        Ok(self
            .cloud
            .domains
            .get(&self.region)
            .map(|names| names.iter().map(|n| AvailabilityDomain::new(n)).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ComputeInventory for FakeRegion {
    async fn list_instances(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        self.cloud
            .record(format!("list_instances {} {}", self.region, compartment_id));
        let key = self.key(compartment_id);
        if self.cloud.failing_instances.contains(&key) {
            return Err(InventoryError::listing(
                &self.region,
                "instances",
                "API request failed: 503",
            ));
        }
        let items = self.cloud.instances.get(&key).cloned().unwrap_or_default();
        Ok(self.cloud.paginate(&items, page))
    }
}

#[async_trait]
impl BlockStorageInventory for FakeRegion {
    async fn list_boot_volumes(
        &self,
        availability_domain: &str,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        self.cloud.record(format!(
            "list_boot_volumes {} {} {}",
            self.region, availability_domain, compartment_id
        ));
        let key = (
            self.region.clone(),
            availability_domain.to_string(),
            compartment_id.to_string(),
        );
        let items = self.cloud.boot_volumes.get(&key).cloned().unwrap_or_default();
        Ok(self.cloud.paginate(&items, page))
    }

    async fn list_volumes(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        self.cloud
            .record(format!("list_volumes {} {}", self.region, compartment_id));
        let items = self
            .cloud
            .volumes
            .get(&self.key(compartment_id))
            .cloned()
            .unwrap_or_default();
        Ok(self.cloud.paginate(&items, page))
    }
}

impl RegionServices for FakeRegion {
    fn region(&self) -> &str {
        &self.region
    }
}
