//! Inventory collection
//!
//! - [`services`] - Capability traits for the remote services
//! - [`walker`] - Depth-first compartment discovery
//! - [`aggregator`] - Per-region resource collection
//! - [`driver`] - Iteration over region subscriptions

pub mod aggregator;
pub mod driver;
pub mod services;
pub mod walker;

pub use aggregator::ResourceAggregator;
pub use driver::RegionDriver;
pub use services::{
    AvailabilityDomainDirectory, BlockStorageInventory, CompartmentDirectory, ComputeInventory,
    RegionServices, ServiceProvider,
};
pub use walker::CompartmentWalker;
