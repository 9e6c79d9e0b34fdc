use std::sync::Arc;
use weavecore::IntegrationAdapter;

/// Registry of available integration adapters
///
/// Constructed once at process start and injected by reference wherever it
/// is needed; there is no global singleton. Lookups are pure.
pub struct IntegrationRegistry {
    adapters: Vec<Arc<dyn IntegrationAdapter>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Register an adapter. Re-registering an id replaces the adapter in
    /// place so registration order (the match tie-breaker) is stable.
    pub fn register(&mut self, adapter: Arc<dyn IntegrationAdapter>) {
        tracing::info!("Registering integration: {}", adapter.id());
        if let Some(slot) = self.adapters.iter_mut().find(|a| a.id() == adapter.id()) {
            *slot = adapter;
        } else {
            self.adapters.push(adapter);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn IntegrationAdapter>> {
        self.adapters.iter().find(|a| a.id() == id).cloned()
    }

    pub fn all(&self) -> &[Arc<dyn IntegrationAdapter>] {
        &self.adapters
    }

    /// Suggest an adapter for a step from free-text keyword matching.
    ///
    /// The step's name, description and capability tags are concatenated
    /// into one lowercase haystack; the adapter with the most keywords
    /// appearing as substrings wins, ties broken by registration order.
    /// Advisory only: the planner uses this to pre-populate integration
    /// ids, the engine never calls it to override an explicit assignment.
    pub fn find_match(&self, text: &str, capabilities: &[String]) -> Option<&str> {
        let mut haystack = text.to_lowercase();
        for capability in capabilities {
            haystack.push(' ');
            haystack.push_str(&capability.to_lowercase());
        }

        let mut best: Option<(&str, usize)> = None;
        for adapter in &self.adapters {
            let hits = adapter
                .keywords()
                .iter()
                .filter(|kw| haystack.contains(&kw.to_lowercase()))
                .count();
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((adapter.id(), hits));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
