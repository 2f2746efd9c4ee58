pub mod config;
pub mod logging_system;

pub use config::{Config, ConfigError, Environment, LogFormat, LogLevel};
pub use logging_system::{InitializationError, LogDirective, LoggingSystem, setup_logging};

use crate::domain::RecordFactory;
use crate::reliability::{DeliveryOrchestrator, DiskFallback, HttpDeliveryOrchestrator};
use crate::sender::{ClientError, HttpRemoteSink};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),
    #[error("Logging setup error: {0}")]
    Logging(#[from] InitializationError),
}

/// Composition root: owns the one orchestrator shared by every caller.
pub struct App {
    config: Config,
    orchestrator: Arc<HttpDeliveryOrchestrator>,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let config = match &config.config_file {
            Some(config_file) => Config::from_file(config_file)?,
            None => config,
        };

        let orchestrator = Arc::new(build_orchestrator(&config)?);

        info!(
            "log-relay v{} ready: source={}, endpoint={}, max_attempts={}, fallback={}",
            crate::VERSION,
            orchestrator.factory().source(),
            config.endpoint,
            config.max_attempts,
            orchestrator.local().file_path().display()
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> Arc<HttpDeliveryOrchestrator> {
        Arc::clone(&self.orchestrator)
    }
}

pub fn build_orchestrator(config: &Config) -> Result<HttpDeliveryOrchestrator, AppError> {
    let remote = HttpRemoteSink::from_policy(config.retry_policy()?)?;
    let local = DiskFallback::new(config.disk_config());
    let factory = RecordFactory::new(config.source());

    Ok(DeliveryOrchestrator::new(remote, local, factory))
}
