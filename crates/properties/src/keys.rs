//! Key rules shared by both engines.
//!
//! A key is usable when its trimmed form is non-empty and is not
//! [`RESERVED_VALUE_KEY`]. Within one sibling scope, keys must also be unique
//! under case-insensitive comparison; both the first holder of a key and
//! every later duplicate are reported.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ids::EntityId;

/// Key holding a node's own scalar when the node also has children.
pub const RESERVED_VALUE_KEY: &str = "__value";

/// An editable entity identified by id and named by a key.
pub trait Keyed {
	/// Identity of the entity.
	fn id(&self) -> &EntityId;
	/// Key as typed by the user, untrimmed.
	fn key(&self) -> &str;
}

/// Trims surrounding whitespace from a key.
pub fn normalize_key(key: &str) -> &str {
	key.trim()
}

/// Whether `key` may name a property once trimmed.
pub fn is_usable_key(key: &str) -> bool {
	let key = normalize_key(key);
	!key.is_empty() && key != RESERVED_VALUE_KEY
}

/// Case-folded form used for duplicate and collision checks.
pub(crate) fn fold_key(key: &str) -> String {
	normalize_key(key).to_lowercase()
}

/// Adds the id of every unusable or duplicated entity in one sibling scope
/// to `invalid`.
///
/// Empty keys are already invalid and take no part in the duplicate scan.
/// Each sibling is visited once.
pub(crate) fn scan_siblings<'a, T>(siblings: impl IntoIterator<Item = &'a T>, invalid: &mut HashSet<EntityId>)
where
	T: Keyed + 'a,
{
	let mut seen: HashMap<String, &'a EntityId> = HashMap::new();
	for item in siblings {
		let key = normalize_key(item.key());
		if !is_usable_key(key) {
			invalid.insert(item.id().clone());
		}
		if key.is_empty() {
			continue;
		}
		match seen.entry(key.to_lowercase()) {
			Entry::Occupied(first) => {
				invalid.insert((*first.get()).clone());
				invalid.insert(item.id().clone());
			}
			Entry::Vacant(slot) => {
				slot.insert(item.id());
			}
		}
	}
}

/// Removes the entity with `id` from a sibling list, returning it.
pub fn remove_by_id<T: Keyed>(items: &mut Vec<T>, id: &EntityId) -> Option<T> {
	let pos = items.iter().position(|item| item.id() == id)?;
	Some(items.remove(pos))
}

/// Outcome of validating one representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
	/// Entities with an empty, reserved or duplicated key.
	pub invalid_ids: HashSet<EntityId>,
	/// Page-level message; present iff `invalid_ids` is non-empty.
	pub message: Option<String>,
}

impl Validation {
	pub(crate) fn new(invalid_ids: HashSet<EntityId>, message: &str) -> Self {
		let message = (!invalid_ids.is_empty()).then(|| message.to_string());
		Self { invalid_ids, message }
	}

	/// True when nothing was flagged.
	pub fn is_valid(&self) -> bool {
		self.invalid_ids.is_empty()
	}

	/// Whether `id` was flagged.
	pub fn is_flagged(&self, id: &EntityId) -> bool {
		self.invalid_ids.contains(id)
	}
}
