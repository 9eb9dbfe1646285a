//! Hierarchical KV engine.
//!
//! Top-level scalar properties are edited as a flat list of [`FlatEntry`]
//! values; top-level objects are edited as a tree of [`HierNode`]s. A node
//! can hold a scalar and children at once: in the canonical object the
//! scalar lives under [`RESERVED_VALUE_KEY`] next to the children's keys.
//!
//! ```text
//! { "host": "smtp",              flat:  host = smtp
//!   "tls": {                     tree:  tls = on
//!     "__value": "on",                    └─ port = 465
//!     "port": "465" } }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::config::EngineConfig;
use crate::error::{MergeError, PropertiesError};
use crate::ids::{EntityId, EntityKind, IdGenerator, ProcessIds};
use crate::keys::{Keyed, RESERVED_VALUE_KEY, Validation, fold_key, is_usable_key, normalize_key, scan_siblings};
use crate::value::{Properties, PropertyValue, coerce_scalar};


/// An editable top-level scalar property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
	/// UI identity.
	pub id: EntityId,
	/// Property key as typed.
	pub key: String,
	/// Scalar value.
	pub value: String,
}

/// A node of the hierarchical representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierNode {
	/// UI identity.
	pub id: EntityId,
	/// Property key as typed.
	pub key: String,
	/// The node's own scalar; may be empty.
	pub value: String,
	/// Child nodes in edit order.
	pub children: Vec<HierNode>,
}

impl Keyed for FlatEntry {
	fn id(&self) -> &EntityId {
		&self.id
	}

	fn key(&self) -> &str {
		&self.key
	}
}

impl Keyed for HierNode {
	fn id(&self) -> &EntityId {
		&self.id
	}

	fn key(&self) -> &str {
		&self.key
	}
}

/// Field overrides for [`HierarchicalKv::create_flat_entry`].
#[derive(Debug, Clone, Default)]
pub struct FlatEntryDraft {
	/// Initial key.
	pub key: String,
	/// Initial value.
	pub value: String,
}

/// Field overrides for [`HierarchicalKv::create_hier_node`].
#[derive(Debug, Clone, Default)]
pub struct HierNodeDraft {
	/// Initial key.
	pub key: String,
	/// Initial scalar value.
	pub value: String,
	/// Initial children.
	pub children: Vec<HierNode>,
}

/// Both editable halves of a properties object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitProperties {
	/// Top-level scalar properties, in document order.
	pub flat_entries: Vec<FlatEntry>,
	/// Top-level object properties, in document order.
	pub hier_nodes: Vec<HierNode>,
}

/// Converts, validates and merges the flat + tree representation.
#[derive(Clone)]
pub struct HierarchicalKv {
	ids: Arc<dyn IdGenerator>,
	config: EngineConfig,
}

impl Default for HierarchicalKv {
	fn default() -> Self {
		Self::new(Arc::new(ProcessIds), EngineConfig::default())
	}
}

impl fmt::Debug for HierarchicalKv {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HierarchicalKv")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl HierarchicalKv {
	/// Creates an engine drawing ids from `ids`.
	pub fn new(ids: Arc<dyn IdGenerator>, config: EngineConfig) -> Self {
		Self { ids, config }
	}

	/// Active configuration.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Creates a flat entry with a fresh id. No validation happens here.
	pub fn create_flat_entry(&self, draft: FlatEntryDraft) -> FlatEntry {
		FlatEntry {
			id: self.ids.next_id(EntityKind::Flat),
			key: draft.key,
			value: draft.value,
		}
	}

	/// Shorthand for [`Self::create_flat_entry`].
	pub fn flat_entry(&self, key: impl Into<String>, value: impl Into<String>) -> FlatEntry {
		self.create_flat_entry(FlatEntryDraft {
			key: key.into(),
			value: value.into(),
		})
	}

	/// Creates a tree node with a fresh id. No validation happens here.
	pub fn create_hier_node(&self, draft: HierNodeDraft) -> HierNode {
		HierNode {
			id: self.ids.next_id(EntityKind::Hier),
			key: draft.key,
			value: draft.value,
			children: draft.children,
		}
	}

	/// Shorthand for [`Self::create_hier_node`].
	pub fn hier_node(&self, key: impl Into<String>, value: impl Into<String>, children: Vec<HierNode>) -> HierNode {
		self.create_hier_node(HierNodeDraft {
			key: key.into(),
			value: value.into(),
			children,
		})
	}

	/// Partitions a backend properties object into flat entries (scalar
	/// values) and tree nodes (object values).
	///
	/// Anything other than a JSON object yields two empty lists. Objects
	/// nested past [`EngineConfig::max_depth`] fail with
	/// [`PropertiesError::DepthExceeded`].
	pub fn split_properties(&self, properties: &JsonValue) -> Result<SplitProperties, PropertiesError> {
		let JsonValue::Object(map) = properties else {
			tracing::debug!(found = crate::value::json_type_name(properties), "split of non-object properties");
			return Ok(SplitProperties::default());
		};

		let mut split = SplitProperties::default();
		for (key, value) in map {
			match value {
				JsonValue::Object(child) => split.hier_nodes.push(self.object_to_node(key, child, 1)?),
				scalar => split.flat_entries.push(self.flat_entry(key.as_str(), coerce_scalar(scalar))),
			}
		}

		tracing::debug!(flat = split.flat_entries.len(), hier = split.hier_nodes.len(), "split properties");
		Ok(split)
	}

	fn object_to_node(&self, key: &str, object: &Map<String, JsonValue>, depth: usize) -> Result<HierNode, PropertiesError> {
		if depth > self.config.max_depth {
			tracing::warn!(max_depth = self.config.max_depth, key, "properties exceed depth cap");
			return Err(PropertiesError::DepthExceeded {
				max: self.config.max_depth,
			});
		}

		let value = object.get(RESERVED_VALUE_KEY).map(coerce_scalar).unwrap_or_default();
		let children = object
			.iter()
			.filter(|(child_key, _)| child_key.as_str() != RESERVED_VALUE_KEY)
			.map(|(child_key, child)| match child {
				JsonValue::Object(grandchildren) => self.object_to_node(child_key, grandchildren, depth + 1),
				scalar => Ok(self.hier_node(normalize_key(child_key), coerce_scalar(scalar), Vec::new())),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(self.hier_node(normalize_key(key), value, children))
	}

	/// Flags flat entries with an empty, reserved or case-insensitively
	/// duplicated key.
	pub fn validate_flat_entries(&self, entries: &[FlatEntry]) -> Validation {
		let mut invalid = HashSet::new();
		scan_siblings(entries, &mut invalid);
		tracing::trace!(entries = entries.len(), invalid = invalid.len(), "validated flat entries");
		Validation::new(invalid, &self.config.messages.flat_entries)
	}

	/// Flags tree nodes with an empty or reserved key at any depth, or a key
	/// duplicated among its siblings.
	///
	/// Every node is visited once. Nodes below [`EngineConfig::max_depth`]
	/// are flagged without being descended into.
	pub fn validate_hier_nodes(&self, nodes: &[HierNode]) -> Validation {
		let mut invalid = HashSet::new();
		self.check_level(nodes, 1, &mut invalid);
		tracing::trace!(roots = nodes.len(), invalid = invalid.len(), "validated hierarchical nodes");
		Validation::new(invalid, &self.config.messages.hier_nodes)
	}

	fn check_level(&self, nodes: &[HierNode], depth: usize, invalid: &mut HashSet<EntityId>) {
		if depth > self.config.max_depth {
			tracing::warn!(max_depth = self.config.max_depth, nodes = nodes.len(), "nodes exceed depth cap");
			invalid.extend(nodes.iter().map(|node| node.id.clone()));
			return;
		}

		scan_siblings(nodes, invalid);
		for node in nodes.iter().filter(|node| !node.children.is_empty()) {
			self.check_level(&node.children, depth + 1, invalid);
		}
	}

	/// Folds both representations back into one properties object.
	///
	/// Entries and nodes with an empty or reserved key are skipped, so a
	/// user-typed [`RESERVED_VALUE_KEY`] never reaches the output even when
	/// validation was bypassed; only a node's own scalar is written under it.
	/// A node with both a non-empty scalar and children is written as an
	/// object whose [`RESERVED_VALUE_KEY`] holds the scalar. If a top-level key appears on
	/// both sides (case-insensitive) the merge fails with
	/// [`MergeError::KeyCollision`] naming every such key.
	pub fn merge_properties(&self, flat_entries: &[FlatEntry], hier_nodes: &[HierNode]) -> Result<Properties, MergeError> {
		let flat = flat_entries_to_properties(flat_entries);
		let hier = self.nodes_to_properties(hier_nodes, 1)?;

		let flat_keys: HashSet<String> = flat.keys().map(fold_key).collect();
		let collisions: Vec<String> = hier
			.keys()
			.filter(|key| flat_keys.contains(&fold_key(key)))
			.map(String::from)
			.collect();

		if !collisions.is_empty() {
			tracing::debug!(keys = ?collisions, "flat and hierarchical keys collide");
			return Err(MergeError::KeyCollision {
				message: self.config.messages.describe_collision(&collisions),
				keys: collisions,
			});
		}

		let mut merged = flat;
		merged.extend(hier);
		tracing::debug!(keys = merged.len(), "merged properties");
		Ok(merged)
	}

	fn nodes_to_properties(&self, nodes: &[HierNode], depth: usize) -> Result<Properties, MergeError> {
		let mut output = Properties::new();
		for node in nodes {
			let key = normalize_key(&node.key);
			if !is_usable_key(key) {
				continue;
			}
			if depth > self.config.max_depth {
				return Err(MergeError::DepthExceeded {
					max: self.config.max_depth,
				});
			}

			let children = self.nodes_to_properties(&node.children, depth + 1)?;
			let value = if children.is_empty() {
				PropertyValue::Text(node.value.clone())
			} else if node.value.is_empty() {
				PropertyValue::Object(children)
			} else {
				let mut object = Properties::new();
				object.insert(RESERVED_VALUE_KEY, node.value.as_str());
				object.extend(children);
				PropertyValue::Object(object)
			};
			output.insert(key, value);
		}
		Ok(output)
	}
}

fn flat_entries_to_properties(entries: &[FlatEntry]) -> Properties {
	let mut output = Properties::new();
	for entry in entries {
		let key = normalize_key(&entry.key);
		if is_usable_key(key) {
			output.insert(key, entry.value.as_str());
		}
	}
	output
}

/// Finds the node with `id` at any depth.
pub fn find_node_mut<'a>(nodes: &'a mut [HierNode], id: &EntityId) -> Option<&'a mut HierNode> {
	for node in nodes {
		if node.id == *id {
			return Some(node);
		}
		if let Some(found) = find_node_mut(&mut node.children, id) {
			return Some(found);
		}
	}
	None
}

/// Appends `child` under the node with `parent_id`.
///
/// Returns false, dropping `child`, when no such node exists.
pub fn add_child(nodes: &mut [HierNode], parent_id: &EntityId, child: HierNode) -> bool {
	match find_node_mut(nodes, parent_id) {
		Some(parent) => {
			parent.children.push(child);
			true
		}
		None => false,
	}
}

/// Detaches the node with `id`, and its subtree, from any depth.
pub fn remove_node(nodes: &mut Vec<HierNode>, id: &EntityId) -> Option<HierNode> {
	if let Some(pos) = nodes.iter().position(|node| node.id == *id) {
		return Some(nodes.remove(pos));
	}
	nodes.iter_mut().find_map(|node| remove_node(&mut node.children, id))
}
