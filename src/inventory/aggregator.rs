//! Resource Aggregator
//!
//! Collects instances, boot volumes and block volumes of one region for a
//! compartment and, recursively, for its descendants. Child compartments
//! come first, then the compartment's own instances, boot volumes (per
//! availability domain) and block volumes.

use super::services::RegionServices;
use super::walker::CompartmentWalker;
use crate::config::RunConfig;
use crate::error::{InventoryError, InventoryResult};
use crate::resource::{collect_all, CompartmentRegistry, ResourceKind, ResourceRecord};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashSet;

pub struct ResourceAggregator<'a, S: RegionServices> {
    services: &'a S,
    config: &'a RunConfig,
}

impl<'a, S: RegionServices> ResourceAggregator<'a, S> {
    pub fn new(services: &'a S, config: &'a RunConfig) -> Self {
        Self { services, config }
    }

    /// Aggregate resources under `compartment_id`, registering every
    /// descendant compartment discovered on the way.
    pub async fn aggregate(
        &self,
        compartment_id: &str,
        registry: &mut CompartmentRegistry,
    ) -> InventoryResult<Vec<ResourceRecord>> {
        let mut visited = HashSet::new();
        visited.insert(compartment_id.to_string());
        self.aggregate_compartment(compartment_id, registry, &mut visited)
            .await
    }

    fn aggregate_compartment<'b>(
        &'b self,
        compartment_id: &'b str,
        registry: &'b mut CompartmentRegistry,
        visited: &'b mut HashSet<String>,
    ) -> BoxFuture<'b, InventoryResult<Vec<ResourceRecord>>> {
        Box::pin(async move {
            let mut records = Vec::new();

            if self.config.recursive {
                let walker =
                    CompartmentWalker::new(self.services, self.config.compartment_failures);
                for child in walker.children(compartment_id).await? {
                    let Some(child_id) = walker.enter(child, registry, visited) else {
                        continue;
                    };
                    let child_records = self
                        .aggregate_compartment(&child_id, registry, visited)
                        .await?;
                    records.extend(child_records);
                }
            }

            tracing::info!(
                "{} resources in : {}",
                self.services.region(),
                compartment_id
            );

            for kind in ResourceKind::ALL {
                if self.config.collects(kind) {
                    records.extend(self.collect_kind(kind, compartment_id).await?);
                }
            }

            Ok(records)
        })
    }

    /// Collect one kind for one compartment, tagging each record
    async fn collect_kind(
        &self,
        kind: ResourceKind,
        compartment_id: &str,
    ) -> InventoryResult<Vec<ResourceRecord>> {
        let result = match kind {
            ResourceKind::Instance => {
                collect_all(|page| self.services.list_instances(compartment_id, page)).await
            }
            ResourceKind::BootVolume => self.boot_volumes(compartment_id).await,
            ResourceKind::Volume => {
                collect_all(|page| self.services.list_volumes(compartment_id, page)).await
            }
        };

        let items = self
            .config
            .inventory_failures
            .recover(result.map_err(|e| self.tag_error(e, kind)))?;

        tracing::debug!(
            "{} {} in {}",
            items.len(),
            kind.resource_name(),
            compartment_id
        );

        let region = self.services.region();
        Ok(items
            .into_iter()
            .map(|data| ResourceRecord::new(kind, region, data))
            .collect())
    }

    /// Boot volume listings are scoped to an availability domain
    async fn boot_volumes(&self, compartment_id: &str) -> InventoryResult<Vec<Value>> {
        let domains = self
            .services
            .list_availability_domains(compartment_id)
            .await?;

        let mut volumes = Vec::new();
        for domain in &domains {
            let items = collect_all(|page| {
                self.services
                    .list_boot_volumes(&domain.name, compartment_id, page)
            })
            .await?;
            volumes.extend(items);
        }
        Ok(volumes)
    }

    /// Ensure listing failures carry the region they happened in
    fn tag_error(&self, err: InventoryError, kind: ResourceKind) -> InventoryError {
        match err {
            InventoryError::InventoryList { .. } => err,
            other => {
                let status = other.status();
                InventoryError::listing(self.services.region(), kind.resource_name(), other)
                    .with_status(status)
            }
        }
    }
}
