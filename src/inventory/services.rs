//! Remote service capabilities
//!
//! The collection pipeline only talks to the cloud through these traits.
//! [`crate::oci::OciClient`] implements them over REST; tests substitute
//! in-memory fakes.

use crate::error::InventoryResult;
use crate::resource::{AvailabilityDomain, Compartment, Page, RegionSubscription};
use async_trait::async_trait;
use serde_json::Value;

/// Compartment hierarchy and tenancy subscriptions
#[async_trait]
pub trait CompartmentDirectory: Send + Sync {
    /// One page of the immediate children of `parent_id`
    async fn list_compartments(
        &self,
        parent_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Compartment>>;

    async fn get_compartment(&self, compartment_id: &str) -> InventoryResult<Compartment>;

    async fn list_region_subscriptions(
        &self,
        tenancy_id: &str,
    ) -> InventoryResult<Vec<RegionSubscription>>;
}

/// Availability domains of the connected region
#[async_trait]
pub trait AvailabilityDomainDirectory: Send + Sync {
    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> InventoryResult<Vec<AvailabilityDomain>>;
}

/// Compute instances of the connected region
#[async_trait]
pub trait ComputeInventory: Send + Sync {
    async fn list_instances(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>>;
}

/// Boot and block volumes of the connected region
#[async_trait]
pub trait BlockStorageInventory: Send + Sync {
    /// Boot volumes are scoped to an availability domain
    async fn list_boot_volumes(
        &self,
        availability_domain: &str,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>>;

    async fn list_volumes(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>>;
}

/// Every capability bound to a single region
pub trait RegionServices:
    CompartmentDirectory + AvailabilityDomainDirectory + ComputeInventory + BlockStorageInventory
{
    fn region(&self) -> &str;
}

/// Produces region-scoped service handles
pub trait ServiceProvider: Send + Sync {
    type Services: RegionServices;

    /// Tenancy the credentials belong to
    fn tenancy_id(&self) -> &str;

    /// Region used for tenancy-wide identity calls
    fn home_region(&self) -> &str;

    fn connect(&self, region: &str) -> InventoryResult<Self::Services>;
}
