//! Property tests for the conversions between canonical properties and the
//! editable representations.

use herald_properties::{EngineConfig, RESERVED_VALUE_KEY};
use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue};

use crate::common::engines;

const KEY: &str = "[a-z][a-z0-9_-]{0,5}";

fn to_object(entries: impl IntoIterator<Item = (String, JsonValue)>) -> JsonValue {
	JsonValue::Object(entries.into_iter().collect::<Map<_, _>>())
}

/// Nested properties without empty objects; a node may carry its own value.
fn arb_nested() -> impl Strategy<Value = JsonValue> {
	let leaf = "[ -~]{0,8}".prop_map(JsonValue::String);
	leaf.prop_recursive(4, 48, 4, |inner| {
		(
			prop::collection::btree_map(KEY, inner, 1..4),
			prop::option::of("[a-z]{1,4}"),
		)
			.prop_map(|(children, own_value)| {
				let own = own_value.map(|v| (RESERVED_VALUE_KEY.to_string(), JsonValue::String(v)));
				to_object(own.into_iter().chain(children))
			})
	})
}

fn arb_properties() -> impl Strategy<Value = JsonValue> {
	prop::collection::btree_map(KEY, arb_nested(), 0..6).prop_map(to_object)
}

/// One level of nesting, as the row editor supports.
fn arb_single_level() -> impl Strategy<Value = JsonValue> {
	let scalar = "[ -~]{0,8}".prop_map(JsonValue::String);
	let object = prop::collection::btree_map(KEY, "[ -~]{0,8}".prop_map(JsonValue::String), 0..4).prop_map(to_object);
	prop::collection::btree_map(KEY, prop_oneof![scalar, object], 0..6).prop_map(to_object)
}

fn mixed_case(key: &str, mask: u32) -> String {
	key.chars()
		.enumerate()
		.map(|(i, c)| if mask & (1 << (i % 32)) != 0 { c.to_ascii_uppercase() } else { c })
		.collect()
}

proptest! {
	/// Splitting then merging returns the original object.
	#[test]
	fn split_merge_round_trip(input in arb_properties()) {
		let (kv, _) = engines(EngineConfig::default());
		let split = kv.split_properties(&input).unwrap();
		prop_assert!(kv.validate_flat_entries(&split.flat_entries).is_valid());
		prop_assert!(kv.validate_hier_nodes(&split.hier_nodes).is_valid());

		let merged = kv.merge_properties(&split.flat_entries, &split.hier_nodes).unwrap();
		prop_assert_eq!(merged.to_json(), input);
	}

	/// Rows of single-level properties fold back to the same object.
	#[test]
	fn rows_round_trip(input in arb_single_level()) {
		let (_, rows) = engines(EngineConfig::default());
		let converted = rows.properties_to_rows(&input);
		prop_assert!(!converted.is_empty());
		prop_assert!(rows.validate_property_rows(&converted).is_valid() || input.as_object().is_some_and(Map::is_empty));
		prop_assert_eq!(rows.rows_to_properties(&converted).to_json(), input);
	}

	/// A key and a re-cased copy of it are both flagged in every engine.
	#[test]
	fn duplicate_detection_ignores_case(key in KEY, mask in any::<u32>()) {
		let (kv, rows) = engines(EngineConfig::default());
		let other = mixed_case(&key, mask);

		let entries = vec![kv.flat_entry(key.as_str(), "1"), kv.flat_entry(other.as_str(), "2")];
		prop_assert_eq!(kv.validate_flat_entries(&entries).invalid_ids.len(), 2);

		let nodes = vec![kv.hier_node(key.as_str(), "1", Vec::new()), kv.hier_node(other.as_str(), "2", Vec::new())];
		prop_assert_eq!(kv.validate_hier_nodes(&nodes).invalid_ids.len(), 2);

		let top = vec![rows.text_row(key.as_str(), "1"), rows.text_row(other.as_str(), "2")];
		prop_assert_eq!(rows.validate_property_rows(&top).row_invalid_ids.len(), 2);

		let grouped = rows.object_row_group("group", vec![rows.object_row(key.as_str(), "1"), rows.object_row(other.as_str(), "2")]);
		let group_id = grouped.id.clone();
		let result = rows.validate_property_rows(&[grouped]);
		prop_assert!(result.row_invalid_ids.is_empty());
		prop_assert_eq!(result.object_members(&group_id).map(|m| m.len()), Some(2));
	}
}
