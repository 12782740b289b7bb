//! Test support: logging setup and in-memory service fixtures.

use std::sync::{Arc, Once};

use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::application::services::ConfigService;
use crate::domain::Value;
use crate::infrastructure::traits::{MemoryNodeStore, NodeStore};

static TEST_SETUP: Once = Once::new();

/// Install a stderr subscriber once per test binary. Level comes from
/// `RUST_LOG`, defaulting to debug.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_test_writer()
                .with_filter(env_filter),
        );

        // Only set if we haven't already set a global subscriber
        if tracing::dispatcher::has_been_set() {
            debug!("Tracing subscriber already set");
        } else if let Err(e) = subscriber.try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
        info!("Test Setup complete");
    });
}

/// Service over a fresh in-memory store, plus the store for inspection.
pub fn memory_service() -> (ConfigService, Arc<MemoryNodeStore>) {
    init_test_setup();
    let store = Arc::new(MemoryNodeStore::new());
    let service = ConfigService::new(Arc::clone(&store) as Arc<dyn NodeStore>);
    (service, store)
}

/// Build a map value from literal pairs.
pub fn map_of(entries: Vec<(&str, Value)>) -> Value {
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_memory_service_when_created_then_tree_is_empty() {
        let (service, _store) = memory_service();

        assert_eq!(service.read("").unwrap(), Value::empty_map());
    }
}
