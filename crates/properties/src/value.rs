//! Canonical properties: the nested key/value object exchanged with the
//! backend as the `properties` field of channel and sender requests.
//!
//! Leaves are always strings. Backend JSON is coerced on the way in: `null`
//! becomes `""`, numbers and booleans become their JSON text, and arrays
//! become compact JSON text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{PropertiesError, Result};

/// Insertion-ordered mapping from key to scalar or nested properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, PropertyValue>);

/// A property value: a scalar string or a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
	/// Scalar leaf.
	Text(String),
	/// Nested object.
	Object(Properties),
}

impl PropertyValue {
	/// Returns the scalar, if this is a leaf.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Object(_) => None,
		}
	}

	/// Returns the nested object, if any.
	pub fn as_object(&self) -> Option<&Properties> {
		match self {
			Self::Object(object) => Some(object),
			Self::Text(_) => None,
		}
	}

	fn to_json(&self) -> JsonValue {
		match self {
			Self::Text(text) => JsonValue::String(text.clone()),
			Self::Object(object) => object.to_json(),
		}
	}
}

impl From<String> for PropertyValue {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&str> for PropertyValue {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<Properties> for PropertyValue {
	fn from(object: Properties) -> Self {
		Self::Object(object)
	}
}

impl Properties {
	/// Creates an empty object.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of top-level keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether there are no keys.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Looks up a top-level key (case-sensitive).
	pub fn get(&self, key: &str) -> Option<&PropertyValue> {
		self.0.get(key)
	}

	/// Inserts or replaces a key, keeping the original position on replace.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
		self.0.insert(key.into(), value.into())
	}

	/// Top-level keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value))
	}

	/// Converts a backend JSON object, coercing scalars to strings.
	///
	/// Nested objects deeper than `max_depth` levels below the root fail with
	/// [`PropertiesError::DepthExceeded`].
	pub fn from_json(value: &JsonValue, max_depth: usize) -> Result<Self> {
		match value {
			JsonValue::Object(map) => object_from_json(map, 0, max_depth),
			other => Err(PropertiesError::NotAnObject {
				found: json_type_name(other),
			}),
		}
	}

	/// Parses the raw JSON text typed into a properties text field.
	///
	/// Blank text is an empty object.
	pub fn parse(text: &str, max_depth: usize) -> Result<Self> {
		if text.trim().is_empty() {
			return Ok(Self::new());
		}
		let value: JsonValue = serde_json::from_str(text)?;
		Self::from_json(&value, max_depth)
	}

	/// Wire form for a request body.
	pub fn to_json(&self) -> JsonValue {
		let map: Map<String, JsonValue> = self.0.iter().map(|(key, value)| (key.clone(), value.to_json())).collect();
		JsonValue::Object(map)
	}

	/// Indented JSON for the text editor.
	pub fn to_pretty_string(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

impl FromIterator<(String, PropertyValue)> for Properties {
	fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl Extend<(String, PropertyValue)> for Properties {
	fn extend<I: IntoIterator<Item = (String, PropertyValue)>>(&mut self, iter: I) {
		self.0.extend(iter);
	}
}

impl IntoIterator for Properties {
	type Item = (String, PropertyValue);
	type IntoIter = indexmap::map::IntoIter<String, PropertyValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

fn object_from_json(map: &Map<String, JsonValue>, depth: usize, max_depth: usize) -> Result<Properties> {
	if depth > max_depth {
		return Err(PropertiesError::DepthExceeded { max: max_depth });
	}
	map.iter()
		.map(|(key, value)| -> Result<(String, PropertyValue)> {
			let value = match value {
				JsonValue::Object(child) => PropertyValue::Object(object_from_json(child, depth + 1, max_depth)?),
				scalar => PropertyValue::Text(coerce_scalar(scalar)),
			};
			Ok((key.clone(), value))
		})
		.collect()
}

/// String form of a JSON value held where only scalars fit.
pub(crate) fn coerce_scalar(value: &JsonValue) -> String {
	match value {
		JsonValue::Null => String::new(),
		JsonValue::String(text) => text.clone(),
		other => other.to_string(),
	}
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "boolean",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
