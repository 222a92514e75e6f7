//! Inventory data model
//!
//! Compartments, region subscriptions and the tagged resource records
//! collected from the compute and block storage services.

use super::accessor::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Kind of a collected resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[value(name = "instance")]
    Instance,
    #[value(name = "bootvolume")]
    BootVolume,
    #[value(name = "volume")]
    Volume,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Instance,
        ResourceKind::BootVolume,
        ResourceKind::Volume,
    ];

    /// Label written to the `resource_type` column
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::BootVolume => "bootvolume",
            ResourceKind::Volume => "volume",
        }
    }

    /// Name used in logs and error messages
    pub fn resource_name(self) -> &'static str {
        match self {
            ResourceKind::Instance => "instances",
            ResourceKind::BootVolume => "boot volumes",
            ResourceKind::Volume => "block volumes",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compartment as returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Parent compartment (absent for the tenancy itself)
    #[serde(default)]
    pub compartment_id: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Compartment {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            compartment_id: None,
            lifecycle_state: Some("ACTIVE".to_string()),
            description: None,
        }
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.compartment_id = Some(parent_id.to_string());
        self
    }
}

impl Attributes for Compartment {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        let value = match name {
            "id" => Value::String(self.id.clone()),
            "name" => Value::String(self.name.clone()),
            "compartment_id" => Value::String(self.compartment_id.clone()?),
            "lifecycle_state" => Value::String(self.lifecycle_state.clone()?),
            "description" => Value::String(self.description.clone()?),
            _ => return None,
        };
        Some(Cow::Owned(value))
    }
}

/// Region the tenancy is subscribed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSubscription {
    pub region_name: String,
    #[serde(default)]
    pub region_key: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_home_region: bool,
}

impl RegionSubscription {
    pub fn new(region_name: &str, is_home_region: bool) -> Self {
        Self {
            region_name: region_name.to_string(),
            region_key: None,
            status: Some("READY".to_string()),
            is_home_region,
        }
    }
}

/// Availability domain within a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDomain {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl AvailabilityDomain {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
        }
    }
}

/// A collected resource tagged with its kind and region
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub region: String,
    /// Normalised (snake_case) record as returned by the service
    pub data: Value,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, region: &str, data: Value) -> Self {
        Self {
            kind,
            region: region.to_string(),
            data,
        }
    }

    /// Owning compartment id, if the record carries one
    pub fn compartment_id(&self) -> Option<&str> {
        self.data.get("compartment_id").and_then(|v| v.as_str())
    }
}

impl Attributes for ResourceRecord {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.data.attribute(name)
    }
}

/// Compartments discovered during a run, keyed by id in discovery order
#[derive(Debug, Clone, Default)]
pub struct CompartmentRegistry {
    by_id: HashMap<String, Compartment>,
    order: Vec<String>,
}

impl CompartmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compartment. Returns false if the id was already known;
    /// the first registration wins.
    pub fn register(&mut self, compartment: Compartment) -> bool {
        if self.by_id.contains_key(&compartment.id) {
            return false;
        }
        self.order.push(compartment.id.clone());
        self.by_id.insert(compartment.id.clone(), compartment);
        true
    }

    /// Resolve a compartment name
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|c| c.name.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Compartment ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Position of a compartment in registration order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }
}

/// Result of a full collection run
#[derive(Debug, Default)]
pub struct Inventory {
    pub records: Vec<ResourceRecord>,
    pub compartments: CompartmentRegistry,
}

impl Inventory {
    /// Record counts per (region, kind), for the run summary
    pub fn counts(&self) -> BTreeMap<(String, ResourceKind), usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts
                .entry((record.region.clone(), record.kind))
                .or_insert(0) += 1;
        }
        counts
    }
}
