use std::sync::Arc;

use forecourt_agent::runtime::AgentRuntime;
use forecourt_core::config::{AppConfig, ConfigError, LoadOptions};
use forecourt_core::{CatalogEngine, Dataset, KeywordKnowledgeBase, SessionStore};
use forecourt_messenger::send::{MessageSender, NoopSender, SendApiClient};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub engine: Arc<CatalogEngine>,
    pub sessions: Arc<SessionStore>,
    pub runtime: Arc<AgentRuntime>,
    pub sender: Arc<dyn MessageSender>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let dataset = Dataset::load(&config.catalog.path);
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        path = %config.catalog.path.display(),
        vehicles = dataset.len(),
        "catalog dataset loaded"
    );

    let engine = Arc::new(CatalogEngine::new(dataset));
    let sessions = Arc::new(SessionStore::new());
    let runtime = Arc::new(AgentRuntime::with_defaults(
        Arc::clone(&engine),
        Arc::clone(&sessions),
        Arc::new(KeywordKnowledgeBase),
    ));

    let sender: Arc<dyn MessageSender> = if config.messenger.enabled {
        Arc::new(SendApiClient::new(
            config.messenger.api_base_url.clone(),
            config.messenger.page_access_token.clone(),
        ))
    } else {
        Arc::new(NoopSender)
    };
    info!(
        event_name = "system.bootstrap.transport_mode",
        correlation_id = "bootstrap",
        transport_mode = if config.messenger.enabled { "send_api" } else { "noop" },
        "outbound transport initialized"
    );

    Ok(Application { config, engine, sessions, runtime, sender })
}

#[cfg(test)]
mod tests {
    use forecourt_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[test]
    fn missing_catalog_degrades_to_an_empty_engine() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                catalog_path: Some("does/not/exist.csv".into()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should tolerate a missing catalog");

        assert!(app.engine.dataset().is_empty());
        assert!(app.sessions.list_active().is_empty());
        assert_eq!(app.runtime.capability_names().len(), 3);
    }

    #[test]
    fn enabling_delivery_without_tokens_fails_fast() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                messenger_enabled: Some(true),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("validation failure").to_string();
        assert!(message.contains("verify_token"));
    }
}
