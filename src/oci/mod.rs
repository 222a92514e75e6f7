//! OCI API interaction module
//!
//! This module provides the REST plumbing for Oracle Cloud Infrastructure:
//! credentials, the HTTP client and the region-scoped service client.
//!
//! # Module Structure
//!
//! - [`auth`] - Tenancy resolution and request signing
//! - [`client`] - Region-scoped client implementing the inventory services
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oci_inventory::oci::{OciClient, SecurityTokenSigner};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let signer = SecurityTokenSigner::new("token".as_ref(), "oci_api_key.pem".as_ref())?;
//!     let client = OciClient::new(Arc::new(signer), "us-ashburn-1")?;
//!     let frankfurt = client.for_region("eu-frankfurt-1");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{default_key_file, default_token_file, RequestSigner, SecurityTokenSigner};
pub use client::OciClient;
pub use http::{api_status, format_api_error, ApiError};
