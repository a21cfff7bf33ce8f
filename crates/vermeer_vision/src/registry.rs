//! Provider registry and factory.
//!
//! Providers are constructed through an explicitly built name→constructor
//! map injected at startup. There is no global registration and no implicit
//! discovery: what the registry holds is exactly what a process can serve.

use crate::gemini::GeminiProvider;
use crate::provider::VisionProvider;
use crate::vertex::VertexProvider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vermeer_core::{MediaKind, VermeerConfig};
use vermeer_error::{ConfigError, VermeerResult};

/// Constructor for a vision provider.
pub type ProviderConstructor =
    Arc<dyn Fn(&VermeerConfig) -> VermeerResult<Arc<dyn VisionProvider>> + Send + Sync>;

/// Name → constructor map, built once at startup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the two built-in backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("gemini", |config| {
            Ok(Arc::new(GeminiProvider::new(config)?) as Arc<dyn VisionProvider>)
        });
        registry.register("vertex", |config| {
            Ok(Arc::new(VertexProvider::new(config)?) as Arc<dyn VisionProvider>)
        });
        registry
    }

    /// Register a constructor under a name, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&VermeerConfig) -> VermeerResult<Arc<dyn VisionProvider>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Option<&ProviderConstructor> {
        self.constructors.get(name)
    }
}

/// Builds providers on demand and caches them for the process lifetime.
///
/// The cache is write-once per name; every caller asking for the same
/// backend shares one instance.
pub struct ProviderFactory {
    registry: ProviderRegistry,
    config: Arc<VermeerConfig>,
    built: Mutex<HashMap<String, Arc<dyn VisionProvider>>>,
}

impl ProviderFactory {
    /// Create a factory over a registry and an immutable config snapshot.
    pub fn new(registry: ProviderRegistry, config: Arc<VermeerConfig>) -> Self {
        Self {
            registry,
            config,
            built: Mutex::new(HashMap::new()),
        }
    }

    /// The config snapshot this factory was built with.
    pub fn config(&self) -> &VermeerConfig {
        &self.config
    }

    /// Get (building if needed) the provider registered under a name.
    pub fn provider(&self, name: &str) -> VermeerResult<Arc<dyn VisionProvider>> {
        let constructor = self.registry.get(name).ok_or_else(|| {
            ConfigError::new(format!(
                "Unknown provider '{}': registered providers are {}",
                name,
                self.registry.names().join(", ")
            ))
        })?;

        let mut built = self
            .built
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(provider) = built.get(name) {
            return Ok(provider.clone());
        }

        let provider = constructor(&self.config)?;
        built.insert(name.to_string(), provider.clone());
        Ok(provider)
    }

    /// Get the provider configured for a media kind.
    pub fn for_kind(&self, kind: MediaKind) -> VermeerResult<Arc<dyn VisionProvider>> {
        let name = self.config.providers.for_kind(kind).to_string();
        self.provider(&name)
    }
}
