//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::ConfigService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileNodeStore, NodeStore};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub config: ConfigService,
}

impl ServiceContainer {
    /// Create a new service container backed by the configured store file.
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(FileNodeStore::new(settings.store_path.clone()));
        Self::with_deps(settings, store)
    }

    /// Create a service container with a custom store (for testing).
    pub fn with_deps(settings: Settings, store: Arc<dyn NodeStore>) -> Self {
        let settings = Arc::new(settings);
        let config = ConfigService::new(store);

        Self { settings, config }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::application::Format;
    use crate::domain::Value;
    use crate::infrastructure::traits::MemoryNodeStore;

    #[test]
    fn given_custom_store_when_wiring_then_service_writes_into_it() {
        let store = Arc::new(MemoryNodeStore::new());
        let settings = Settings {
            store_path: PathBuf::from("/unused/nodes.json"),
            default_format: Format::Prop,
        };

        let container =
            ServiceContainer::with_deps(settings, Arc::clone(&store) as Arc<dyn NodeStore>);
        container.config.put("a", Format::Value, "1").unwrap();

        assert_eq!(container.settings.default_format, Format::Prop);
        assert_eq!(container.config.read("a").unwrap(), Value::Int(1));
        assert_eq!(store.fetch().unwrap().len(), 2);
    }
}
