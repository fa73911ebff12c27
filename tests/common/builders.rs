//! Session builders

use std::sync::Arc;

use streamlab_rs::config::EngineConfig;
use streamlab_rs::engine::{ComputeEngine, LocalEngine};
use streamlab_rs::session::{SessionController, SessionOptions};
use streamlab_rs::share::ShareService;

use super::mock_helpers::RecordingShare;

/// Session options without the welcome text, so logs start empty
pub fn quiet_options(config: &str, input: &str) -> SessionOptions {
    SessionOptions {
        initial_config: config.to_string(),
        initial_input: input.to_string(),
        show_welcome: false,
    }
}

/// Session backed by the local engine and a share service that records calls
pub fn local_session(config: &str, input: &str) -> (SessionController, Arc<RecordingShare>) {
    let share = Arc::new(RecordingShare::succeeding("abc123"));
    let session = session_with(
        Arc::new(LocalEngine::new(EngineConfig::default())),
        share.clone(),
        config,
        input,
    );
    (session, share)
}

/// Session around any engine and share service
pub fn session_with(
    engine: Arc<dyn ComputeEngine>,
    share: Arc<dyn ShareService>,
    config: &str,
    input: &str,
) -> SessionController {
    SessionController::new(engine, share, quiet_options(config, input))
}
