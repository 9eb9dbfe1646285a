//! Entity identifiers.
//!
//! Ids exist only for UI identity and validation reporting; they are never
//! persisted. Engines draw them from an injected [`IdGenerator`] so tests can
//! use a seeded [`SequentialIds`] while editors share [`ProcessIds`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counter behind [`ProcessIds`], shared by every editor in the process.
static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier of an editable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
	/// Wraps an existing id string.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for EntityId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

/// Kind of entity an id is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
	/// [`crate::FlatEntry`].
	Flat,
	/// [`crate::HierNode`].
	Hier,
	/// [`crate::PropertyRow`].
	Property,
	/// [`crate::ObjectRow`].
	Object,
}

impl EntityKind {
	/// Prefix used in generated ids.
	pub fn prefix(self) -> &'static str {
		match self {
			Self::Flat => "flat",
			Self::Hier => "hier",
			Self::Property => "prop",
			Self::Object => "obj",
		}
	}
}

/// Source of fresh entity ids.
pub trait IdGenerator: Send + Sync {
	/// Returns an id never handed out before by this generator.
	fn next_id(&self, kind: EntityKind) -> EntityId;
}

/// Monotonic counter producing `<prefix>-<n>`.
#[derive(Debug, Default)]
pub struct SequentialIds {
	next: AtomicU64,
}

impl SequentialIds {
	/// Creates a generator whose first id uses `start`.
	pub const fn starting_at(start: u64) -> Self {
		Self { next: AtomicU64::new(start) }
	}
}

impl IdGenerator for SequentialIds {
	fn next_id(&self, kind: EntityKind) -> EntityId {
		let n = self.next.fetch_add(1, Ordering::Relaxed);
		EntityId(format!("{}-{n}", kind.prefix()))
	}
}

/// Process-wide counter shared by all engines built with `Default`.
///
/// Unique for the lifetime of the process only; the sequence restarts with
/// the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIds;

impl IdGenerator for ProcessIds {
	fn next_id(&self, kind: EntityKind) -> EntityId {
		let n = NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed);
		EntityId(format!("{}-{n}", kind.prefix()))
	}
}

/// Random v4 UUIDs, `<prefix>-<uuid>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
	fn next_id(&self, kind: EntityKind) -> EntityId {
		EntityId(format!("{}-{}", kind.prefix(), Uuid::new_v4()))
	}
}
