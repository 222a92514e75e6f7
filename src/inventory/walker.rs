//! Compartment Walker
//!
//! Lists the children of a compartment and registers each one as the
//! aggregator descends into it, so parents are registered before any of
//! their descendants.

use super::services::CompartmentDirectory;
use crate::error::{FailurePolicy, InventoryResult};
use crate::resource::{collect_all, Compartment, CompartmentRegistry};
use std::collections::HashSet;

pub struct CompartmentWalker<'a, D: CompartmentDirectory + ?Sized> {
    directory: &'a D,
    policy: FailurePolicy,
}

impl<'a, D: CompartmentDirectory + ?Sized> CompartmentWalker<'a, D> {
    pub fn new(directory: &'a D, policy: FailurePolicy) -> Self {
        Self { directory, policy }
    }

    /// Immediate children of `parent_id`, all pages drained.
    ///
    /// Under [`FailurePolicy::BestEffort`] a failed listing is logged and the
    /// compartment is treated as a leaf.
    pub async fn children(&self, parent_id: &str) -> InventoryResult<Vec<Compartment>> {
        let result =
            collect_all(|page| self.directory.list_compartments(parent_id, page)).await;
        self.policy.recover(result)
    }

    /// Enter a discovered child: mark it visited and register it.
    ///
    /// Returns the child's id when the walk should descend into it, or
    /// `None` when the id was reached before, so a cyclic hierarchy
    /// terminates.
    pub fn enter(
        &self,
        compartment: Compartment,
        registry: &mut CompartmentRegistry,
        visited: &mut HashSet<String>,
    ) -> Option<String> {
        if !visited.insert(compartment.id.clone()) {
            tracing::warn!(
                "Compartment {} ({}) reached twice, skipping",
                compartment.name,
                compartment.id
            );
            return None;
        }
        let id = compartment.id.clone();
        registry.register(compartment);
        Some(id)
    }
}
