//! Error types for property conversion, merging and configuration.

use thiserror::Error;

/// Errors from decoding canonical properties.
#[derive(Debug, Error)]
pub enum PropertiesError {
	/// The properties text is not valid JSON.
	#[error("invalid properties JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// The root value is not a JSON object.
	#[error("properties must be a JSON object, found {found}")]
	NotAnObject {
		/// JSON type name of the rejected value.
		found: &'static str,
	},

	/// Nested objects go deeper than the configured cap.
	#[error("properties nest deeper than {max} levels")]
	DepthExceeded {
		/// The configured depth cap.
		max: usize,
	},
}

/// Errors from folding the editable representations back into properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
	/// The same key (case-insensitive) appears in both the flat and the
	/// hierarchical set.
	#[error("{message}")]
	KeyCollision {
		/// Colliding keys, in hierarchical key order.
		keys: Vec<String>,
		/// Localized description naming every colliding key.
		message: String,
	},

	/// A hierarchical node sits deeper than the configured cap.
	#[error("hierarchical properties nest deeper than {max} levels")]
	DepthExceeded {
		/// The configured depth cap.
		max: usize,
	},
}

/// Errors from parsing engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// KDL syntax error.
	#[error("KDL parse error: {0}")]
	Kdl(#[from] kdl::KdlError),

	/// A node that the `properties` block does not understand.
	#[error("unknown config field: {0}")]
	UnknownField(String),

	/// A known field carrying a value of the wrong shape.
	#[error("invalid value for '{field}': {reason}")]
	InvalidValue {
		/// Field name as written in the document.
		field: String,
		/// What was expected.
		reason: String,
	},
}

/// Result type for property decoding.
pub type Result<T> = std::result::Result<T, PropertiesError>;
