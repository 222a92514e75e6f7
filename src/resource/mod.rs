//! Resource abstraction layer
//!
//! Data model and helpers shared by collection and export.
//!
//! # Architecture
//!
//! - [`model`] - Compartments, subscriptions and tagged resource records
//! - [`accessor`] - Dotted-path field extraction with defaults
//! - [`fetcher`] - Pagination over listing operations
//! - [`registry`] - Per-kind property schema and its column partition
//!
//! # Example
//!
//! ```ignore
//! use oci_inventory::resource::{default_schema, get};
//!
//! let columns = default_schema().columns();
//! for path in columns.all() {
//!     println!("{} = {}", path, get(&record, path, ""));
//! }
//! ```

pub mod accessor;
pub mod fetcher;
pub mod model;
pub mod registry;

pub use accessor::{get, try_get, value_to_text, Attributes};
pub use fetcher::{collect_all, Page};
pub use model::*;
pub use registry::{default_schema, KindProperties, PropertyColumns, PropertySchema};
