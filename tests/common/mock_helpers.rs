//! Mock construction helpers

use std::sync::Mutex;

use async_trait::async_trait;
use mockall::mock;
use streamlab_rs::engine::{ComponentKind, ComputeEngine, EngineResult, ExecutionReport};
use streamlab_rs::error::{LabError, Result};
use streamlab_rs::session::OutputLog;
use streamlab_rs::share::ShareService;
use url::Url;

mock! {
    pub Engine {}

    #[async_trait]
    impl ComputeEngine for Engine {
        fn version(&self) -> String;
        fn list_components(&self, kind: ComponentKind) -> Vec<String>;
        fn insert_component(
            &self,
            kind: ComponentKind,
            name: &str,
            config: &str,
        ) -> EngineResult<Option<String>>;
        async fn normalise(&self, config: &str) -> EngineResult<String>;
        async fn compile(&self, config: &str, log: &OutputLog) -> EngineResult<()>;
        async fn execute(&self, input: &str, log: &OutputLog) -> EngineResult<ExecutionReport>;
    }
}

/// A mock engine with an empty catalog, ready for expectations
pub fn mock_engine() -> MockEngine {
    let mut engine = MockEngine::new();
    engine.expect_version().return_const("mock".to_string());
    engine
        .expect_list_components()
        .returning(|_| Vec::new());
    engine
}

/// Share service that records every bundle it receives
pub struct RecordingShare {
    id: Option<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingShare {
    pub fn succeeding(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            id: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ShareService for RecordingShare {
    async fn share(&self, input: &str, config: &str) -> Result<Url> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((input.to_string(), config.to_string()));
        }
        match &self.id {
            Some(id) => Url::parse(&format!("http://lab.test/l/{}", id))
                .map_err(|e| LabError::Transport(e.to_string())),
            None => Err(LabError::Status {
                status: 500,
                body: String::new(),
            }),
        }
    }
}
