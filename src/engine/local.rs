//! In-process compute engine
//!
//! [`LocalEngine`] holds at most one compiled pipeline. Compile always drops
//! the previous pipeline before building the new one, so a failed compile
//! leaves nothing loaded.

use super::batch::{parse_batches, Batch};
use super::processors::Processor;
use super::resources::Resources;
use super::stream_config::{self, StreamConfig};
use super::{ComponentKind, ComputeEngine, EngineError, EngineResult, ExecutionReport};
use crate::config::{EngineConfig, ScriptLimits};
use crate::session::output::OutputLog;
use async_trait::async_trait;
use rhai::Engine;
use std::sync::{Arc, Mutex, PoisonError};

/// Where script `print` and `debug` output goes while a pipeline runs
type LogSink = Arc<Mutex<Option<OutputLog>>>;

fn sink_write(sink: &LogSink, text: &str) {
    let guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(log) = guard.as_ref() {
        log.log(text);
    }
}

/// Build a sandboxed Rhai engine whose output goes to `sink`
fn script_engine(limits: &ScriptLimits, sink: LogSink) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);

    let print_sink = sink.clone();
    engine.on_print(move |text| sink_write(&print_sink, text));
    engine.on_debug(move |text, _source, pos| {
        sink_write(&sink, &format!("{} {}", pos, text));
    });
    engine
}

/// A loaded pipeline
struct CompiledPipeline {
    engine: Engine,
    processors: Vec<Processor>,
    sink: LogSink,
}

impl CompiledPipeline {
    fn build(config: &StreamConfig, limits: &ScriptLimits) -> EngineResult<Self> {
        let sink = LogSink::default();
        let engine = script_engine(limits, sink.clone());
        let resources = Resources::build(&config.resources)?;
        let processors = config
            .pipeline
            .processors
            .iter()
            .enumerate()
            .map(|(i, conf)| Processor::build(i, conf, &engine, &resources))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self {
            engine,
            processors,
            sink,
        })
    }

    async fn run(&self, batch: Batch, batch_index: usize) -> EngineResult<Vec<Batch>> {
        let mut batches = vec![batch];
        for proc in &self.processors {
            batches = proc.apply(&self.engine, batches, batch_index).await?;
        }
        batches.retain(|b| !b.is_empty());
        Ok(batches)
    }

    fn attach(&self, log: Option<OutputLog>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = log;
    }
}

/// The default, in-process engine
pub struct LocalEngine {
    config: EngineConfig,
    loaded: Mutex<Option<Arc<CompiledPipeline>>>,
}

impl LocalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loaded: Mutex::new(None),
        }
    }

    /// Initialise the engine
    ///
    /// Fails when the configured limits cannot produce a usable engine.
    pub async fn load(config: EngineConfig) -> EngineResult<Self> {
        if config.execute_timeout_secs == 0 {
            return Err(EngineError::Load(
                "execute timeout must be greater than zero".to_string(),
            ));
        }
        if config.script.max_operations == 0 {
            return Err(EngineError::Load(
                "script operation limit must be greater than zero".to_string(),
            ));
        }
        tracing::debug!("Local engine loaded (v{})", env!("CARGO_PKG_VERSION"));
        Ok(Self::new(config))
    }

    /// Whether a compiled pipeline is loaded
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<CompiledPipeline>> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, pipeline: Option<Arc<CompiledPipeline>>) {
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = pipeline;
    }
}

#[async_trait]
impl ComputeEngine for LocalEngine {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn list_components(&self, kind: ComponentKind) -> Vec<String> {
        StreamConfig::component_names(kind)
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn insert_component(
        &self,
        kind: ComponentKind,
        name: &str,
        config: &str,
    ) -> EngineResult<Option<String>> {
        stream_config::insert_component(config, kind, name).map(Some)
    }

    async fn normalise(&self, config: &str) -> EngineResult<String> {
        stream_config::normalise(config)
    }

    async fn compile(&self, config: &str, log: &OutputLog) -> EngineResult<()> {
        self.replace(None);

        let parsed = StreamConfig::parse(config)?;
        for lint in parsed.validate()? {
            log.lint(lint);
        }
        let pipeline = CompiledPipeline::build(&parsed, &self.config.script)?;
        tracing::debug!(
            "Compiled pipeline with {} processor(s)",
            pipeline.processors.len()
        );
        self.replace(Some(Arc::new(pipeline)));
        Ok(())
    }

    async fn execute(&self, input: &str, log: &OutputLog) -> EngineResult<ExecutionReport> {
        let pipeline = self.current().ok_or(EngineError::NotCompiled)?;
        let timeout = self.config.execute_timeout();
        let mut report = ExecutionReport::default();

        pipeline.attach(Some(log.clone()));
        for (index, batch) in parse_batches(input).into_iter().enumerate() {
            report.batches += 1;
            match tokio::time::timeout(timeout, pipeline.run(batch, index)).await {
                Err(_) => {
                    pipeline.attach(None);
                    return Err(EngineError::Timeout);
                }
                Ok(Err(e)) => {
                    tracing::debug!("Batch {} failed: {}", index, e);
                    report.failed_batches += 1;
                    log.error(format!("Error: failed to process batch {}: {}", index, e));
                }
                Ok(Ok(outputs)) => {
                    for out in outputs {
                        report.messages_out += out.len();
                        for msg in out {
                            log.plain(msg);
                        }
                        log.plain("");
                    }
                }
            }
        }
        pipeline.attach(None);

        tracing::debug!(
            "Executed {} batch(es), {} failed",
            report.batches,
            report.failed_batches
        );
        Ok(report)
    }
}
