//! End-to-end editing sessions as the channel and sender forms run them.

use std::collections::HashSet;

use herald_properties::kv::{add_child, find_node_mut, remove_node};
use herald_properties::{EngineConfig, EntityId, MergeError, Messages, Properties, RowKind, remove_by_id};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::engines;

#[test]
fn hierarchical_session_edits_and_submits() {
	let (kv, _) = engines(EngineConfig::default());
	let fetched = json!({
		"host": "smtp.example.com",
		"port": 465,
		"tls": { "__value": "on", "verify": "true" },
	});

	let mut split = kv.split_properties(&fetched).unwrap();
	assert_eq!(split.flat_entries.len(), 2);
	assert_eq!(split.hier_nodes.len(), 1);

	// Operator adds a nested credential block and a blank child they forget to fill.
	let auth = kv.hier_node("auth", "", vec![kv.hier_node("user", "ops", Vec::new())]);
	let auth_id = auth.id.clone();
	split.hier_nodes.push(auth);
	let blank = kv.hier_node("", "", Vec::new());
	let blank_id = blank.id.clone();
	assert!(add_child(&mut split.hier_nodes, &auth_id, blank));

	let validation = kv.validate_hier_nodes(&split.hier_nodes);
	assert_eq!(validation.invalid_ids, HashSet::from([blank_id.clone()]));
	assert!(validation.message.is_some());

	// Fixing the key clears the banner.
	find_node_mut(&mut split.hier_nodes, &blank_id).unwrap().key = "password".into();
	assert!(kv.validate_hier_nodes(&split.hier_nodes).is_valid());
	assert!(kv.validate_flat_entries(&split.flat_entries).is_valid());

	let properties = kv.merge_properties(&split.flat_entries, &split.hier_nodes).unwrap();
	let body = json!({ "name": "Email", "type": "EMAIL", "properties": properties });
	assert_eq!(
		body["properties"],
		json!({
			"host": "smtp.example.com",
			"port": "465",
			"tls": { "__value": "on", "verify": "true" },
			"auth": { "user": "ops", "password": "" },
		})
	);
}

#[test]
fn moving_a_key_between_halves_is_reported() {
	let (kv, _) = engines(EngineConfig::default());
	let mut split = kv.split_properties(&json!({ "region": "cn", "limits": { "qps": "10" } })).unwrap();

	split.flat_entries.push(kv.flat_entry("Limits", "none"));
	let err = kv.merge_properties(&split.flat_entries, &split.hier_nodes).unwrap_err();
	assert_eq!(
		err,
		MergeError::KeyCollision {
			keys: vec!["limits".into()],
			message: "Flat and hierarchical properties share keys: limits".into(),
		}
	);

	let moved = split.flat_entries.last().map(|e| e.id.clone()).unwrap();
	assert!(remove_by_id(&mut split.flat_entries, &moved).is_some());
	let limits_id = split.hier_nodes[0].id.clone();
	assert!(remove_node(&mut split.hier_nodes, &limits_id).is_some());

	let properties = kv.merge_properties(&split.flat_entries, &split.hier_nodes).unwrap();
	assert_eq!(properties.to_json(), json!({ "region": "cn" }));
}

#[test]
fn row_session_with_text_editor_fallback() {
	let (_, rows) = engines(EngineConfig::default());
	let typed = r#"{ "sender": "ops", "webhook": { "url": "https://example.com/hook", "retries": 3 } }"#;
	let parsed = Properties::parse(typed, rows.config().max_depth).unwrap();

	let mut edited = rows.properties_to_rows(&parsed.to_json());
	assert_eq!(edited.len(), 2);
	assert_eq!(edited[1].kind, RowKind::Object);

	edited.push(rows.text_row("SENDER", "dup"));
	let validation = rows.validate_property_rows(&edited);
	assert_eq!(validation.row_invalid_ids.len(), 2);

	edited.pop();
	edited[1].object_rows.push(rows.object_row("url", "https://other.example.com"));
	let validation = rows.validate_property_rows(&edited);
	assert!(validation.row_invalid_ids.is_empty());
	assert_eq!(validation.object_members(&edited[1].id).map(HashSet::len), Some(2));

	edited[1].object_rows.pop();
	assert!(rows.validate_property_rows(&edited).is_valid());
	assert_eq!(
		rows.rows_to_properties(&edited).to_json(),
		json!({ "sender": "ops", "webhook": { "url": "https://example.com/hook", "retries": "3" } })
	);
}

#[test]
fn kdl_config_localizes_both_engines() {
	let config = EngineConfig::parse(
		r#"
properties {
    max-depth 2
    messages {
        flat-entries "基础属性存在空键、保留键或重复键，请检查后再提交。"
        object-rows "对象属性存在空键、保留键或重复键，请检查后再提交。"
    }
}
"#,
	)
	.unwrap();
	let (kv, rows) = engines(config);

	let flat = kv.validate_flat_entries(&[kv.flat_entry("", "x")]);
	assert_eq!(flat.message.as_deref(), Some(Messages::zh_cn().flat_entries.as_str()));

	let row = rows.object_row_group("cfg", vec![rows.object_row("", "x")]);
	let row_id: EntityId = row.id.clone();
	let result = rows.validate_property_rows(&[row]);
	assert_eq!(result.object_errors.get(&row_id), Some(&Messages::zh_cn().object_rows));

	assert!(kv.split_properties(&json!({ "a": { "b": { "c": { "d": "x" } } } })).is_err());
}

#[test]
fn ids_are_unique_across_engines() {
	let (kv, rows) = engines(EngineConfig::default());
	let a = kv.flat_entry("a", "1").id;
	let b = rows.text_row("a", "1").id;
	let c = kv.hier_node("a", "1", Vec::new()).id;
	let d = rows.object_row("a", "1").id;
	let ids: HashSet<&str> = [a.as_str(), b.as_str(), c.as_str(), d.as_str()].into_iter().collect();
	assert_eq!(ids.len(), 4);
	assert_eq!(row_kind_of(&rows.properties_to_rows(&json!({ "x": {} }))), [RowKind::Object]);
}

fn row_kind_of(rows: &[herald_properties::PropertyRow]) -> Vec<RowKind> {
	rows.iter().map(|row| row.kind).collect()
}
