use std::collections::BTreeMap;
use std::sync::Arc;

use super::SocialConnector;

/// Read-only table of configured OAuth providers keyed by provider name.
///
/// Built once at startup and shared by reference; there is no way to add a provider afterwards.
#[derive(Clone, Default)]
pub struct SocialConnectorRegistry {
    connectors: BTreeMap<String, Arc<dyn SocialConnector>>,
}

impl SocialConnectorRegistry {
    /// Creates a registry from `(provider name, connector)` pairs.
    #[must_use]
    pub fn new(connectors: impl IntoIterator<Item = (String, Arc<dyn SocialConnector>)>) -> Self {
        Self {
            connectors: connectors.into_iter().collect(),
        }
    }

    /// Returns the connector registered under the provider name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SocialConnector>> {
        self.connectors.get(name).cloned()
    }

    /// Returns the registered provider names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connectors.keys().map(String::as_str)
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Returns whether no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl std::fmt::Debug for SocialConnectorRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SocialConnectorRegistry")
            .field("providers", &self.connectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
