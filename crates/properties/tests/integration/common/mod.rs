//! Shared setup for property engine integration tests.

use std::sync::Arc;

use herald_properties::{EngineConfig, HierarchicalKv, PropertyRows, SequentialIds};

/// Installs a fmt subscriber once per test binary.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Both engines sharing one seeded id generator.
pub fn engines(config: EngineConfig) -> (HierarchicalKv, PropertyRows) {
	init_tracing();
	let ids = Arc::new(SequentialIds::starting_at(1));
	(HierarchicalKv::new(ids.clone(), config.clone()), PropertyRows::new(ids, config))
}
