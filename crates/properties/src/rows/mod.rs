//! Property-row engine.
//!
//! Properties are edited as one level of [`PropertyRow`]s. A row is either a
//! scalar ([`RowKind::Text`]) or an object ([`RowKind::Object`]) whose
//! contents are a flat list of [`ObjectRow`]s; deeper nesting is not
//! representable and nested objects arrive as JSON text.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::EngineConfig;
use crate::ids::{EntityId, EntityKind, IdGenerator, ProcessIds};
use crate::keys::{Keyed, is_usable_key, normalize_key, scan_siblings};
use crate::value::{Properties, PropertyValue, coerce_scalar};


/// Which field of a [`PropertyRow`] is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
	/// `value` holds the property.
	#[default]
	#[serde(rename = "string")]
	Text,
	/// `object_rows` holds the property.
	#[serde(rename = "object")]
	Object,
}

/// A top-level property row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRow {
	/// UI identity.
	pub id: EntityId,
	/// Property key as typed.
	pub key: String,
	/// Scalar or object.
	#[serde(rename = "type")]
	pub kind: RowKind,
	/// Scalar value, used when `kind` is [`RowKind::Text`].
	pub value: String,
	/// Object members, used when `kind` is [`RowKind::Object`].
	pub object_rows: Vec<ObjectRow>,
}

/// A member of an object row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRow {
	/// UI identity.
	pub id: EntityId,
	/// Member key as typed.
	pub key: String,
	/// Member value.
	pub value: String,
}

impl Keyed for PropertyRow {
	fn id(&self) -> &EntityId {
		&self.id
	}

	fn key(&self) -> &str {
		&self.key
	}
}

impl Keyed for ObjectRow {
	fn id(&self) -> &EntityId {
		&self.id
	}

	fn key(&self) -> &str {
		&self.key
	}
}

/// Field overrides for [`PropertyRows::create_property_row`].
#[derive(Debug, Clone, Default)]
pub struct PropertyRowDraft {
	/// Initial key.
	pub key: String,
	/// Initial kind; defaults to [`RowKind::Text`].
	pub kind: RowKind,
	/// Initial scalar.
	pub value: String,
	/// Initial object members.
	pub object_rows: Vec<ObjectRow>,
}

/// Field overrides for [`PropertyRows::create_object_row`].
#[derive(Debug, Clone, Default)]
pub struct ObjectRowDraft {
	/// Initial key.
	pub key: String,
	/// Initial value.
	pub value: String,
}

/// Two-tier validation outcome: a page-level result for top-level rows and
/// per-row results for each object row's members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowValidation {
	/// Top-level rows with an empty, reserved or duplicated key.
	pub row_invalid_ids: HashSet<EntityId>,
	/// Flagged members, keyed by the owning row's id. Only rows with at least
	/// one flagged member appear.
	pub object_invalid_ids: HashMap<EntityId, HashSet<EntityId>>,
	/// Row-scoped message for every key of `object_invalid_ids`.
	pub object_errors: HashMap<EntityId, String>,
	/// Page-level message; reflects top-level rows only.
	pub message: Option<String>,
}

impl RowValidation {
	/// True when neither tier flagged anything.
	pub fn is_valid(&self) -> bool {
		self.row_invalid_ids.is_empty() && self.object_invalid_ids.is_empty()
	}

	/// Flagged members of the object row `row_id`.
	pub fn object_members(&self, row_id: &EntityId) -> Option<&HashSet<EntityId>> {
		self.object_invalid_ids.get(row_id)
	}
}

/// Converts and validates the property-row representation.
#[derive(Clone)]
pub struct PropertyRows {
	ids: Arc<dyn IdGenerator>,
	config: EngineConfig,
}

impl Default for PropertyRows {
	fn default() -> Self {
		Self::new(Arc::new(ProcessIds), EngineConfig::default())
	}
}

impl fmt::Debug for PropertyRows {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyRows").field("config", &self.config).finish_non_exhaustive()
	}
}

impl PropertyRows {
	/// Creates an engine drawing ids from `ids`.
	pub fn new(ids: Arc<dyn IdGenerator>, config: EngineConfig) -> Self {
		Self { ids, config }
	}

	/// Active configuration.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Creates a row with a fresh id.
	pub fn create_property_row(&self, draft: PropertyRowDraft) -> PropertyRow {
		PropertyRow {
			id: self.ids.next_id(EntityKind::Property),
			key: draft.key,
			kind: draft.kind,
			value: draft.value,
			object_rows: draft.object_rows,
		}
	}

	/// Scalar row shorthand.
	pub fn text_row(&self, key: impl Into<String>, value: impl Into<String>) -> PropertyRow {
		self.create_property_row(PropertyRowDraft {
			key: key.into(),
			value: value.into(),
			..PropertyRowDraft::default()
		})
	}

	/// Object row shorthand.
	pub fn object_row_group(&self, key: impl Into<String>, object_rows: Vec<ObjectRow>) -> PropertyRow {
		self.create_property_row(PropertyRowDraft {
			key: key.into(),
			kind: RowKind::Object,
			object_rows,
			..PropertyRowDraft::default()
		})
	}

	/// Creates an object member with a fresh id.
	pub fn create_object_row(&self, draft: ObjectRowDraft) -> ObjectRow {
		ObjectRow {
			id: self.ids.next_id(EntityKind::Object),
			key: draft.key,
			value: draft.value,
		}
	}

	/// Object member shorthand.
	pub fn object_row(&self, key: impl Into<String>, value: impl Into<String>) -> ObjectRow {
		self.create_object_row(ObjectRowDraft {
			key: key.into(),
			value: value.into(),
		})
	}

	/// Switches which field of `row` is authoritative.
	///
	/// The other field is kept so that toggling back restores what was typed.
	/// A row switched to [`RowKind::Object`] with no members gets one blank
	/// member to edit.
	pub fn set_row_kind(&self, row: &mut PropertyRow, kind: RowKind) {
		row.kind = kind;
		if kind == RowKind::Object && row.object_rows.is_empty() {
			row.object_rows.push(self.create_object_row(ObjectRowDraft::default()));
		}
	}

	/// Converts a backend properties object into rows, in document order.
	///
	/// Always returns at least one row: input that is not an object, or an
	/// empty object, yields a single blank row to edit.
	pub fn properties_to_rows(&self, properties: &JsonValue) -> Vec<PropertyRow> {
		let JsonValue::Object(map) = properties else {
			return vec![self.create_property_row(PropertyRowDraft::default())];
		};

		let rows: Vec<_> = map
			.iter()
			.map(|(key, value)| match value {
				JsonValue::Object(members) => {
					let object_rows = members
						.iter()
						.map(|(member_key, member)| self.object_row(member_key.as_str(), coerce_scalar(member)))
						.collect();
					self.object_row_group(normalize_key(key), object_rows)
				}
				scalar => self.text_row(normalize_key(key), coerce_scalar(scalar)),
			})
			.collect();

		tracing::debug!(rows = rows.len(), "converted properties to rows");
		if rows.is_empty() {
			return vec![self.create_property_row(PropertyRowDraft::default())];
		}
		rows
	}

	/// Folds rows back into properties.
	///
	/// Rows and members whose key is empty or reserved are dropped silently;
	/// call [`Self::validate_property_rows`] first to report them.
	pub fn rows_to_properties(&self, rows: &[PropertyRow]) -> Properties {
		let mut output = Properties::new();
		for row in rows {
			let key = normalize_key(&row.key);
			if !is_usable_key(key) {
				continue;
			}
			let value = match row.kind {
				RowKind::Object => PropertyValue::Object(
					row.object_rows
						.iter()
						.filter(|member| is_usable_key(&member.key))
						.map(|member| (normalize_key(&member.key).to_string(), PropertyValue::from(member.value.as_str())))
						.collect(),
				),
				RowKind::Text => PropertyValue::from(row.value.as_str()),
			};
			output.insert(key, value);
		}
		output
	}

	/// Validates top-level rows, then each object row's members in isolation.
	pub fn validate_property_rows(&self, rows: &[PropertyRow]) -> RowValidation {
		let mut validation = RowValidation::default();
		scan_siblings(rows, &mut validation.row_invalid_ids);

		for row in rows.iter().filter(|row| row.kind == RowKind::Object) {
			let mut members = HashSet::new();
			scan_siblings(&row.object_rows, &mut members);
			if !members.is_empty() {
				validation.object_invalid_ids.insert(row.id.clone(), members);
				validation
					.object_errors
					.insert(row.id.clone(), self.config.messages.object_rows.clone());
			}
		}

		if !validation.row_invalid_ids.is_empty() {
			validation.message = Some(self.config.messages.property_rows.clone());
		}

		tracing::trace!(
			rows = rows.len(),
			invalid_rows = validation.row_invalid_ids.len(),
			invalid_objects = validation.object_invalid_ids.len(),
			"validated property rows"
		);
		validation
	}
}
