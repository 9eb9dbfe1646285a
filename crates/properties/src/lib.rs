//! Property editor engine for Herald channels and senders.
//!
//! Channel and sender configuration is stored by the backend as a nested
//! key/value object ([`Properties`]). Operators edit it through one of two
//! representations, and this crate converts between them and validates the
//! result before submission:
//!
//! - **Hierarchical KV** ([`HierarchicalKv`]): top-level scalars become a flat
//!   list of [`FlatEntry`] values, nested objects become a tree of
//!   [`HierNode`]s. A node may carry its own scalar alongside children, which
//!   is stored under [`RESERVED_VALUE_KEY`] in the canonical object.
//! - **Property rows** ([`PropertyRows`]): a single-level list of
//!   [`PropertyRow`]s, each either a scalar or an object holding one level of
//!   [`ObjectRow`]s.
//!
//! Every operation is synchronous and pure apart from drawing ids from the
//! engine's [`IdGenerator`]. Validation problems are reported as data
//! ([`Validation`], [`RowValidation`]); only merging and decoding return
//! errors.
//!
//! # Example
//!
//! ```
//! use herald_properties::HierarchicalKv;
//! use serde_json::json;
//!
//! let kv = HierarchicalKv::default();
//! let input = json!({ "host": "smtp.example.com", "tls": { "__value": "on", "port": "465" } });
//! let split = kv.split_properties(&input).unwrap();
//! assert!(kv.validate_flat_entries(&split.flat_entries).is_valid());
//! assert!(kv.validate_hier_nodes(&split.hier_nodes).is_valid());
//!
//! let merged = kv.merge_properties(&split.flat_entries, &split.hier_nodes).unwrap();
//! assert_eq!(merged.to_json(), input);
//! ```

/// Engine limits and localized messages.
pub mod config;
/// Error types for decoding, merging and configuration.
pub mod error;
/// Entity identifiers and their generators.
pub mod ids;
/// Reserved key, key normalization and the shared sibling-scope scan.
pub mod keys;
/// Hierarchical KV engine: flat entries plus a tree of nodes.
pub mod kv;
/// Property-row engine: a single level of scalar or object rows.
pub mod rows;
/// Canonical properties model and JSON coercion.
pub mod value;

pub use config::{EngineConfig, Messages};
pub use error::{ConfigError, MergeError, PropertiesError};
pub use ids::{EntityId, EntityKind, IdGenerator, ProcessIds, RandomIds, SequentialIds};
pub use keys::{Keyed, RESERVED_VALUE_KEY, Validation, is_usable_key, normalize_key, remove_by_id};
pub use kv::{FlatEntry, FlatEntryDraft, HierNode, HierNodeDraft, HierarchicalKv, SplitProperties};
pub use rows::{ObjectRow, ObjectRowDraft, PropertyRow, PropertyRowDraft, PropertyRows, RowKind, RowValidation};
pub use value::{Properties, PropertyValue};
