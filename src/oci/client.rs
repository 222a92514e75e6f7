//! OCI Client
//!
//! Region-scoped client for the identity and core (compute, block storage)
//! REST APIs, implementing the inventory service capabilities.

use super::auth::RequestSigner;
use super::http::{api_status, JsonPage, OciHttpClient};
use crate::error::{InventoryError, InventoryResult};
use crate::inventory::services::{
    AvailabilityDomainDirectory, BlockStorageInventory, CompartmentDirectory, ComputeInventory,
    RegionServices, ServiceProvider,
};
use crate::resource::{AvailabilityDomain, Compartment, Page, RegionSubscription};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// REST API version shared by identity and core services
pub const API_VERSION: &str = "20160918";

/// Keys whose values are user-defined maps; their inner keys are kept as-is
const USER_MAP_KEYS: &[&str] = &[
    "freeformTags",
    "definedTags",
    "systemTags",
    "metadata",
    "extendedMetadata",
];

/// Main OCI client, bound to one region
#[derive(Clone)]
pub struct OciClient {
    signer: Arc<dyn RequestSigner>,
    http: OciHttpClient,
    region: String,
    endpoint_override: Option<String>,
}

impl OciClient {
    pub fn new(signer: Arc<dyn RequestSigner>, region: &str) -> Result<Self> {
        Ok(Self {
            signer,
            http: OciHttpClient::new()?,
            region: region.to_string(),
            endpoint_override: None,
        })
    }

    /// Send every service call to a single base URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint_override = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Same credentials, different region
    pub fn for_region(&self, region: &str) -> Self {
        Self {
            region: region.to_string(),
            ..self.clone()
        }
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    fn service_base(&self, service: &str) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.{}.oraclecloud.com", service, self.region),
        }
    }

    /// Build Identity API URL
    pub fn identity_url(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        build_url(&self.service_base("identity"), path, query)
    }

    /// Build Core Services (compute / block storage) API URL
    pub fn core_url(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        build_url(&self.service_base("iaas"), path, query)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn get(&self, url: &str) -> Result<JsonPage> {
        self.http.get(url, self.signer.as_ref()).await
    }

    /// One page of a listing returning resource records
    async fn get_records(&self, url: Result<String>) -> Result<Page<Value>> {
        let page = self.get(&url?).await?;
        let items = into_array(page.body)?
            .into_iter()
            .map(normalize_keys)
            .collect();
        Ok(Page::new(items, page.next_page))
    }

    /// Listing failure in this region carrying the HTTP status, if any
    fn listing_error(&self, resource: &str, err: anyhow::Error) -> InventoryError {
        InventoryError::listing(&self.region, resource, format!("{:#}", err))
            .with_status(api_status(&err).map(|s| s.as_u16()))
    }

    /// One page of a listing returning typed items
    async fn get_typed<T: DeserializeOwned>(&self, url: Result<String>) -> Result<Page<T>> {
        let page = self.get(&url?).await?;
        let items = serde_json::from_value(Value::Array(into_array(page.body)?))
            .context("Unexpected listing payload")?;
        Ok(Page::new(items, page.next_page))
    }
}

/// Compartment failure carrying the HTTP status, if any
fn directory_error(compartment_id: &str, err: anyhow::Error) -> InventoryError {
    InventoryError::directory(compartment_id, format!("{:#}", err))
        .with_status(api_status(&err).map(|s| s.as_u16()))
}

fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(&format!("{}/{}/{}", base, API_VERSION, path))
        .with_context(|| format!("Invalid endpoint {}", base))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// Query parameters with an optional continuation token
fn paged<'a>(params: &[(&'a str, &'a str)], page: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
    let mut query = params.to_vec();
    if let Some(token) = page {
        query.push(("page", token));
    }
    query
}

fn into_array(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(anyhow::anyhow!(
            "Expected a JSON array, got {}",
            json_type(&other)
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert a camelCase API key to snake_case (`sizeInGBs` -> `size_in_gbs`)
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Rewrite object keys to snake_case, recursively, leaving user-defined
/// maps (tags, metadata) untouched
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, inner) in map {
                let inner = if USER_MAP_KEYS.contains(&key.as_str()) {
                    inner
                } else {
                    normalize_keys(inner)
                };
                normalized.insert(camel_to_snake(&key), inner);
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

// =============================================================================
// Service capabilities
// =============================================================================

#[async_trait]
impl CompartmentDirectory for OciClient {
    async fn list_compartments(
        &self,
        parent_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Compartment>> {
        let query = paged(&[("compartmentId", parent_id)], page.as_deref());
        self.get_typed(self.identity_url("compartments", &query))
            .await
            .map_err(|e| directory_error(parent_id, e))
    }

    async fn get_compartment(&self, compartment_id: &str) -> InventoryResult<Compartment> {
        let fetch = async {
            let path = format!("compartments/{}", urlencoding::encode(compartment_id));
            let page = self.get(&self.identity_url(&path, &[])?).await?;
            serde_json::from_value::<Compartment>(page.body).context("Unexpected compartment payload")
        };
        fetch
            .await
            .map_err(|e| directory_error(compartment_id, e))
    }

    async fn list_region_subscriptions(
        &self,
        tenancy_id: &str,
    ) -> InventoryResult<Vec<RegionSubscription>> {
        let path = format!(
            "tenancies/{}/regionSubscriptions",
            urlencoding::encode(tenancy_id)
        );
        self.get_typed(self.identity_url(&path, &[]))
            .await
            .map(|page| page.items)
            .map_err(|e| directory_error(tenancy_id, e))
    }
}

#[async_trait]
impl AvailabilityDomainDirectory for OciClient {
    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> InventoryResult<Vec<AvailabilityDomain>> {
        self.get_typed(self.identity_url("availabilityDomains", &[("compartmentId", compartment_id)]))
            .await
            .map(|page| page.items)
            .map_err(|e| self.listing_error("availability domains", e))
    }
}

#[async_trait]
impl ComputeInventory for OciClient {
    async fn list_instances(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        let query = paged(&[("compartmentId", compartment_id)], page.as_deref());
        self.get_records(self.core_url("instances", &query))
            .await
            .map_err(|e| self.listing_error("instances", e))
    }
}

#[async_trait]
impl BlockStorageInventory for OciClient {
    async fn list_boot_volumes(
        &self,
        availability_domain: &str,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        let query = paged(
            &[
                ("availabilityDomain", availability_domain),
                ("compartmentId", compartment_id),
            ],
            page.as_deref(),
        );
        self.get_records(self.core_url("bootVolumes", &query))
            .await
            .map_err(|e| self.listing_error("boot volumes", e))
    }

    async fn list_volumes(
        &self,
        compartment_id: &str,
        page: Option<String>,
    ) -> InventoryResult<Page<Value>> {
        let query = paged(&[("compartmentId", compartment_id)], page.as_deref());
        self.get_records(self.core_url("volumes", &query))
            .await
            .map_err(|e| self.listing_error("block volumes", e))
    }
}

impl RegionServices for OciClient {
    fn region(&self) -> &str {
        &self.region
    }
}

impl ServiceProvider for OciClient {
    type Services = OciClient;

    fn tenancy_id(&self) -> &str {
        self.signer.tenancy_id()
    }

    fn home_region(&self) -> &str {
        &self.region
    }

    fn connect(&self, region: &str) -> InventoryResult<OciClient> {
        Ok(self.for_region(region))
    }
}
