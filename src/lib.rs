//! oci-inventory
//!
//! Enumerates compute instances, boot volumes and block volumes across the
//! subscribed regions and nested compartments of an OCI tenancy and writes
//! them to a single CSV report.

pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod oci;
pub mod resource;

pub use config::{Config, RunConfig};
pub use error::{FailurePolicy, InventoryError, InventoryResult};
pub use export::CsvExporter;
pub use inventory::RegionDriver;
