//! Property Schema Registry
//!
//! Declares which property paths are exported for each resource kind. The
//! default schema is embedded from `resources/properties.json`; an override
//! can be loaded from a YAML or JSON file.

use super::model::ResourceKind;
use crate::error::{InventoryError, InventoryResult};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// Embedded default schema (compiled into the binary)
const DEFAULT_SCHEMA: &str = include_str!("../resources/properties.json");

/// Property paths exported for one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KindProperties {
    pub kind: ResourceKind,
    pub properties: Vec<String>,
}

/// Ordered mapping kind -> property paths
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PropertySchema {
    pub kinds: Vec<KindProperties>,
}

/// Property columns split into those common to every kind and the rest
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyColumns {
    pub shared: Vec<String>,
    pub specific: Vec<String>,
}

impl PropertyColumns {
    /// Shared columns followed by specific columns
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.shared
            .iter()
            .chain(self.specific.iter())
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.shared.len() + self.specific.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static DEFAULT: OnceLock<PropertySchema> = OnceLock::new();

/// Get the default schema (parsed from embedded JSON on first access)
pub fn default_schema() -> &'static PropertySchema {
    DEFAULT.get_or_init(|| {
        serde_json::from_str(DEFAULT_SCHEMA)
            .unwrap_or_else(|e| panic!("Failed to parse embedded property schema: {}", e))
    })
}

impl PropertySchema {
    pub fn new(kinds: Vec<KindProperties>) -> InventoryResult<Self> {
        let schema = Self { kinds };
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema file; `.json` is parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> InventoryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::Schema(format!("cannot read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let schema: PropertySchema = if is_json {
            serde_json::from_str(&content).map_err(|e| InventoryError::Schema(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| InventoryError::Schema(e.to_string()))?
        };

        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> InventoryResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.kinds {
            if !seen.insert(entry.kind) {
                return Err(InventoryError::Schema(format!(
                    "kind {} is declared more than once",
                    entry.kind
                )));
            }
            if entry.properties.iter().any(|p| p.trim().is_empty()) {
                return Err(InventoryError::Schema(format!(
                    "kind {} has an empty property path",
                    entry.kind
                )));
            }
        }
        Ok(())
    }

    /// Keep only the given kinds, preserving declaration order
    pub fn retain_kinds(&mut self, kinds: &[ResourceKind]) {
        self.kinds.retain(|entry| kinds.contains(&entry.kind));
    }

    pub fn properties_for(&self, kind: ResourceKind) -> Option<&[String]> {
        self.kinds
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.properties.as_slice())
    }

    /// Partition every distinct path into shared and specific columns.
    ///
    /// A path is shared when every kind lists it. Both lists keep the order
    /// in which paths are first seen walking kinds in declaration order.
    pub fn columns(&self) -> PropertyColumns {
        let mut kind_count: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();

        for entry in &self.kinds {
            let mut in_kind = HashSet::new();
            for path in &entry.properties {
                let path = path.as_str();
                if !in_kind.insert(path) {
                    continue;
                }
                let count = kind_count.entry(path).or_insert(0);
                if *count == 0 {
                    first_seen.push(path);
                }
                *count += 1;
            }
        }

        let total = self.kinds.len();
        let mut columns = PropertyColumns::default();
        for path in first_seen {
            if kind_count[path] == total {
                columns.shared.push(path.to_string());
            } else {
                columns.specific.push(path.to_string());
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(kind: ResourceKind, props: &[&str]) -> KindProperties {
        KindProperties {
            kind,
            properties: props.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_schema_loads_successfully() {
        let schema = default_schema();
        assert_eq!(schema.kinds.len(), 3);
        assert!(schema
            .properties_for(ResourceKind::Instance)
            .is_some_and(|p| p.contains(&"shape".to_string())));
    }

    #[test]
    fn test_default_schema_shares_identity_columns() {
        let columns = default_schema().columns();
        assert_eq!(
            &columns.shared[..5],
            &[
                "compartment_id",
                "id",
                "display_name",
                "lifecycle_state",
                "availability_domain"
            ]
        );
        assert!(columns.specific.contains(&"shape".to_string()));
        assert!(columns.specific.contains(&"vpus_per_gb".to_string()));
    }

    #[test]
    fn test_partition_keeps_first_seen_order() {
        let schema = PropertySchema::new(vec![
            kind(ResourceKind::Instance, &["id", "shape", "name"]),
            kind(ResourceKind::BootVolume, &["size", "name", "id"]),
            kind(ResourceKind::Volume, &["name", "id", "size", "vpus"]),
        ])
        .unwrap();

        let columns = schema.columns();
        assert_eq!(columns.shared, vec!["id", "name"]);
        assert_eq!(columns.specific, vec!["shape", "size", "vpus"]);
    }

    #[test]
    fn test_duplicate_paths_within_kind_count_once() {
        let schema = PropertySchema::new(vec![
            kind(ResourceKind::Instance, &["id", "id"]),
            kind(ResourceKind::Volume, &["size"]),
        ])
        .unwrap();

        let columns = schema.columns();
        assert!(columns.shared.is_empty());
        assert_eq!(columns.specific, vec!["id", "size"]);
    }

    #[test]
    fn test_single_kind_shares_everything() {
        let schema =
            PropertySchema::new(vec![kind(ResourceKind::Volume, &["id", "size"])]).unwrap();
        let columns = schema.columns();
        assert_eq!(columns.shared, vec!["id", "size"]);
        assert!(columns.specific.is_empty());
    }

    #[test]
    fn test_empty_schema_has_no_columns() {
        let schema = PropertySchema::new(Vec::new()).unwrap();
        assert!(schema.columns().is_empty());
    }

    #[test]
    fn test_duplicate_kind_is_rejected() {
        let result = PropertySchema::new(vec![
            kind(ResourceKind::Volume, &["id"]),
            kind(ResourceKind::Volume, &["size"]),
        ]);
        assert!(matches!(result, Err(InventoryError::Schema(_))));
    }

    #[test]
    fn test_retain_kinds() {
        let mut schema = default_schema().clone();
        schema.retain_kinds(&[ResourceKind::Volume]);
        assert_eq!(schema.kinds.len(), 1);
        assert!(schema.properties_for(ResourceKind::Instance).is_none());
    }

    #[test]
    fn test_load_yaml_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "kinds:\n  - kind: instance\n    properties: [id, shape]\n  - kind: bootvolume\n    properties: [id, size_in_gbs]\n",
        )
        .unwrap();

        let schema = PropertySchema::load(&path).unwrap();
        let columns = schema.columns();
        assert_eq!(columns.shared, vec!["id"]);
        assert_eq!(columns.specific, vec!["shape", "size_in_gbs"]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = PropertySchema::load(Path::new("/nonexistent/schema.yaml"));
        assert!(matches!(result, Err(InventoryError::Schema(_))));
    }
}
