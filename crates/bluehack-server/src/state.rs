//! Application state shared across handlers.

use std::sync::Arc;

use bluehack_core::{Config, Discoverer, Ingestor, PollIntervals, Registry, Scanner};

/// Shared application state handle.
pub type SharedState = Arc<AppState>;

/// Everything a handler needs, built once at start-up.
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Validating access to the registry.
    pub ingestor: Ingestor,
    /// Discovery session.
    pub scanner: Scanner,
}

impl AppState {
    /// Create the registry and wire the façade and scanner to it.
    #[must_use]
    pub fn new(config: Config, discoverer: Arc<dyn Discoverer>) -> SharedState {
        let ingestor = Ingestor::new(Registry::shared());
        let scanner = Scanner::new(
            discoverer,
            ingestor.clone(),
            PollIntervals::from(&config.scan),
        );
        Arc::new(Self {
            config,
            ingestor,
            scanner,
        })
    }
}
