//! Region Driver
//!
//! Walks every subscribed region in turn and concatenates the aggregated
//! resources into one [`Inventory`].

use super::aggregator::ResourceAggregator;
use super::services::{CompartmentDirectory, ServiceProvider};
use crate::config::RunConfig;
use crate::error::InventoryResult;
use crate::resource::{CompartmentRegistry, Inventory};

pub struct RegionDriver<P: ServiceProvider> {
    config: RunConfig,
    provider: P,
}

impl<P: ServiceProvider> RegionDriver<P> {
    pub fn new(config: RunConfig, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Aggregation root: the configured compartment, else the tenancy
    pub fn root_compartment_id(&self) -> &str {
        self.config
            .root_compartment_id
            .as_deref()
            .unwrap_or_else(|| self.provider.tenancy_id())
    }

    /// Collect every selected region, sequentially
    pub async fn run(&self) -> InventoryResult<Inventory> {
        let root = self.root_compartment_id().to_string();
        tracing::info!("tenancy_id : {}", self.provider.tenancy_id());
        tracing::info!("compartment_id : {}", root);

        let home = self.provider.connect(self.provider.home_region())?;
        let mut inventory = Inventory::default();

        self.register_root(&home, &root, &mut inventory.compartments)
            .await?;

        let subscriptions = home
            .list_region_subscriptions(self.provider.tenancy_id())
            .await?;
        tracing::info!("{} region subscriptions", subscriptions.len());

        for subscription in &subscriptions {
            if self.config.home_region_only && !subscription.is_home_region {
                tracing::debug!("Skipping non-home region {}", subscription.region_name);
                continue;
            }

            let services = self.provider.connect(&subscription.region_name)?;
            let aggregator = ResourceAggregator::new(&services, &self.config);
            let records = aggregator
                .aggregate(&root, &mut inventory.compartments)
                .await?;

            tracing::info!(
                "{}: {} resources collected",
                subscription.region_name,
                records.len()
            );
            inventory.records.extend(records);
        }

        Ok(inventory)
    }

    /// Register the aggregation root once, before any region is walked
    async fn register_root<D: CompartmentDirectory + ?Sized>(
        &self,
        directory: &D,
        root: &str,
        registry: &mut CompartmentRegistry,
    ) -> InventoryResult<()> {
        let result = directory.get_compartment(root).await;
        if let Some(compartment) = self.config.compartment_failures.tolerate(result)? {
            registry.register(compartment);
        }
        Ok(())
    }
}
