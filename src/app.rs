//! Application module
//!
//! Wires the configured engine and share service into a session, and
//! re-exports the main application type from the frontend module.

use std::sync::Arc;

use crate::config::{AppConfig, NormaliseBinding};
use crate::engine::{LocalEngine, RemoteNormalise};
use crate::error::Result;
use crate::session::{SessionController, SessionOptions};
use crate::share::{HttpShareService, ShareService};

pub use crate::frontend::LabApp;

/// Load the engine described by `config` and create a session around it
pub async fn launch_session(config: AppConfig, options: SessionOptions) -> Result<SessionController> {
    let share: Arc<dyn ShareService> = Arc::new(HttpShareService::from_config(&config)?);

    match config.service.normalise {
        NormaliseBinding::Local => {
            tracing::info!("Loading local engine");
            SessionController::bootstrap(LocalEngine::load(config.engine), share, options).await
        }
        NormaliseBinding::Remote => {
            let origin = config.service_origin()?;
            let timeout = config.service.timeout();
            tracing::info!("Loading local engine with remote normalise at {}", origin);
            let load = async move {
                let local = LocalEngine::load(config.engine).await?;
                RemoteNormalise::new(local, &origin, timeout)
            };
            SessionController::bootstrap(load, share, options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_local_session() {
        let config = AppConfig::default();
        let session = launch_session(
            config,
            SessionOptions {
                show_welcome: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(session.catalog().contains(crate::engine::ComponentKind::Processor, "script"));
        assert_eq!(session.log().len(), 1);
    }

    #[tokio::test]
    async fn test_launch_with_bad_engine_config_fails() {
        let mut config = AppConfig::default();
        config.engine.execute_timeout_secs = 0;
        let err = match launch_session(config, SessionOptions::default()).await {
            Ok(_) => panic!("launch should fail"),
            Err(e) => e,
        };
        assert!(!err.is_recoverable());
    }
}
