//! Engine configuration.
//!
//! The engine reads an optional `properties` block from a KDL document;
//! other top-level nodes belong to other consumers of the same file and are
//! ignored.
//!
//! ```kdl
//! properties {
//!     max-depth 16
//!     messages {
//!         flat-entries "Flat properties contain an empty, reserved or duplicate key."
//!         key-collision "Keys defined twice: "
//!         key-separator ", "
//!     }
//! }
//! ```

use kdl::{KdlDocument, KdlNode};

use crate::error::ConfigError;

/// Default cap on hierarchical nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Limits and messages used by both engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
	/// Deepest nesting level accepted for hierarchical nodes. Top-level nodes
	/// are level 1.
	pub max_depth: usize,
	/// Validation and merge messages.
	pub messages: Messages,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			messages: Messages::default(),
		}
	}
}

/// User-facing messages, one per validation scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
	/// Flat entries contain a bad key.
	pub flat_entries: String,
	/// Hierarchical nodes contain a bad key.
	pub hier_nodes: String,
	/// Top-level property rows contain a bad key.
	pub property_rows: String,
	/// One object row group contains a bad key.
	pub object_rows: String,
	/// Prefix of the merge collision message; colliding keys follow it.
	pub key_collision: String,
	/// Separator between colliding keys.
	pub key_separator: String,
}

impl Default for Messages {
	fn default() -> Self {
		Self {
			flat_entries: "Flat properties contain an empty key, a reserved key, or a duplicate key.".into(),
			hier_nodes: "Hierarchical properties contain an empty key, a reserved key, or a duplicate sibling key."
				.into(),
			property_rows: "Property keys contain an empty key, a reserved key, or a duplicate key.".into(),
			object_rows: "Object properties contain an empty key, a reserved key, or a duplicate key.".into(),
			key_collision: "Flat and hierarchical properties share keys: ".into(),
			key_separator: ", ".into(),
		}
	}
}

impl Messages {
	/// Simplified Chinese messages.
	pub fn zh_cn() -> Self {
		Self {
			flat_entries: "基础属性存在空键、保留键或重复键，请检查后再提交。".into(),
			hier_nodes: "层级属性存在空键、保留键或同级重复键，请检查后再提交。".into(),
			property_rows: "属性键存在空值、保留键或重复键，请检查后再提交。".into(),
			object_rows: "对象属性存在空键、保留键或重复键，请检查后再提交。".into(),
			key_collision: "基础属性与层级属性存在重复键：".into(),
			key_separator: "、".into(),
		}
	}

	/// Collision message naming `keys` in order.
	pub fn describe_collision(&self, keys: &[String]) -> String {
		format!("{}{}", self.key_collision, keys.join(&self.key_separator))
	}
}

impl EngineConfig {
	/// Parses the `properties` block of a KDL document.
	///
	/// A document without the block yields the defaults.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		let doc: KdlDocument = input.parse()?;
		let mut config = Self::default();

		let Some(children) = doc.get("properties").and_then(KdlNode::children) else {
			return Ok(config);
		};

		for node in children.nodes() {
			match node.name().value() {
				"max-depth" => config.max_depth = parse_depth(node)?,
				"messages" => parse_messages(node, &mut config.messages)?,
				other => return Err(ConfigError::UnknownField(other.to_string())),
			}
		}

		Ok(config)
	}
}

fn parse_depth(node: &KdlNode) -> Result<usize, ConfigError> {
	let invalid = || ConfigError::InvalidValue {
		field: "max-depth".into(),
		reason: "expected a positive integer".into(),
	};
	let depth = node.entry(0).and_then(|e| e.value().as_integer()).ok_or_else(invalid)?;
	usize::try_from(depth).ok().filter(|d| *d > 0).ok_or_else(invalid)
}

fn parse_messages(node: &KdlNode, messages: &mut Messages) -> Result<(), ConfigError> {
	let Some(children) = node.children() else {
		return Ok(());
	};

	for child in children.nodes() {
		let name = child.name().value();
		let slot = match name {
			"flat-entries" => &mut messages.flat_entries,
			"hier-nodes" => &mut messages.hier_nodes,
			"property-rows" => &mut messages.property_rows,
			"object-rows" => &mut messages.object_rows,
			"key-collision" => &mut messages.key_collision,
			"key-separator" => &mut messages.key_separator,
			other => return Err(ConfigError::UnknownField(format!("messages.{other}"))),
		};
		let text = child
			.entry(0)
			.and_then(|e| e.value().as_string())
			.ok_or_else(|| ConfigError::InvalidValue {
				field: format!("messages.{name}"),
				reason: "expected a string".into(),
			})?;
		*slot = text.to_string();
	}

	Ok(())
}
