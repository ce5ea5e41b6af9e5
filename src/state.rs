use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::oauth::ProviderClient;

/// The application's state.
///
/// Cloned into every handler; the configuration behind the `Arc` is never
/// mutated after startup, so no locking is needed.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Client for the identity provider's endpoints.
    pub provider: ProviderClient,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: Config) -> Result<Self> {
        let provider = ProviderClient::new(&config.google)
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;
        tracing::info!(
            "✅ Provider client initialized (timeout {}s)",
            config.google.timeout.as_secs()
        );

        Ok(AppState {
            config: Arc::new(config),
            provider,
        })
    }
}
