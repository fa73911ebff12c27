//! Runtime processors
//!
//! A [`Processor`] is built from its [`ProcessorConfig`] at compile time, so
//! script syntax errors and missing resources surface before any input runs.
//! Processors map a list of batches to a new list of batches, which lets
//! `split` fan a batch out and `archive` fold one in.

use super::batch::Batch;
use super::resources::{CacheResource, RateLimitResource, Resources};
use super::stream_config::{CacheOperator, ProcessorConfig, TextOperator};
use super::{EngineError, EngineResult};
use rhai::{Dynamic, Engine, Scope, AST};
use std::sync::Arc;

/// Placeholder replaced by the message content in cache keys
const CONTENT_PLACEHOLDER: &str = "${content}";

/// A compiled processor
pub enum Processor {
    Noop,
    Text {
        operator: TextOperator,
        value: String,
        replacement: String,
    },
    Script(AST),
    Filter(AST),
    Split,
    Archive(String),
    Cache {
        cache: Arc<CacheResource>,
        operator: CacheOperator,
        key: String,
    },
    RateLimit(Arc<RateLimitResource>),
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Processor {
    /// Build a processor, compiling scripts and resolving resources
    pub fn build(
        index: usize,
        config: &ProcessorConfig,
        engine: &Engine,
        resources: &Resources,
    ) -> EngineResult<Self> {
        let script_err =
            |e: rhai::ParseError| EngineError::Script(format!("processor {}: {}", index, e));

        let proc = match config {
            ProcessorConfig::Noop { .. } => Processor::Noop,
            ProcessorConfig::Text {
                operator,
                value,
                replacement,
            } => Processor::Text {
                operator: *operator,
                value: value.clone(),
                replacement: replacement.clone(),
            },
            ProcessorConfig::Script { source } => {
                Processor::Script(engine.compile(source).map_err(script_err)?)
            }
            ProcessorConfig::Filter { check } => {
                Processor::Filter(engine.compile_expression(check).map_err(script_err)?)
            }
            ProcessorConfig::Split { .. } => Processor::Split,
            ProcessorConfig::Archive { separator } => Processor::Archive(separator.clone()),
            ProcessorConfig::Cache {
                resource,
                operator,
                key,
            } => Processor::Cache {
                cache: resources.cache(resource)?,
                operator: *operator,
                key: key.clone(),
            },
            ProcessorConfig::RateLimit { resource } => {
                Processor::RateLimit(resources.rate_limit(resource)?)
            }
        };
        Ok(proc)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Processor::Noop => "noop",
            Processor::Text { .. } => "text",
            Processor::Script(_) => "script",
            Processor::Filter(_) => "filter",
            Processor::Split => "split",
            Processor::Archive(_) => "archive",
            Processor::Cache { .. } => "cache",
            Processor::RateLimit(_) => "rate_limit",
        }
    }

    fn fail(&self, message: impl Into<String>) -> EngineError {
        EngineError::Processor {
            processor: self.name().to_string(),
            message: message.into(),
        }
    }

    /// Run every batch through this processor
    pub async fn apply(
        &self,
        engine: &Engine,
        batches: Vec<Batch>,
        batch_index: usize,
    ) -> EngineResult<Vec<Batch>> {
        match self {
            Processor::Noop => Ok(batches),
            Processor::Split => Ok(batches
                .into_iter()
                .flatten()
                .map(|msg| vec![msg])
                .collect()),
            Processor::Archive(separator) => Ok(batches
                .into_iter()
                .filter(|b| !b.is_empty())
                .map(|b| vec![b.join(separator)])
                .collect()),
            Processor::RateLimit(limit) => {
                for _ in batches.iter().flatten() {
                    limit.acquire().await;
                }
                Ok(batches)
            }
            _ => batches
                .into_iter()
                .map(|batch| self.apply_messages(engine, batch, batch_index))
                .collect(),
        }
    }

    fn apply_messages(&self, engine: &Engine, batch: Batch, batch_index: usize) -> EngineResult<Batch> {
        let mut out = Batch::with_capacity(batch.len());
        for (index, msg) in batch.into_iter().enumerate() {
            if let Some(msg) = self.apply_message(engine, msg, index, batch_index)? {
                out.push(msg);
            }
        }
        Ok(out)
    }

    fn apply_message(
        &self,
        engine: &Engine,
        msg: String,
        index: usize,
        batch_index: usize,
    ) -> EngineResult<Option<String>> {
        match self {
            Processor::Text {
                operator,
                value,
                replacement,
            } => Ok(Some(apply_text(*operator, &msg, value, replacement))),
            Processor::Script(ast) => {
                let mut scope = message_scope(&msg, index, batch_index);
                let result = engine
                    .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
                    .map_err(|e| self.fail(e.to_string()))?;
                if result.is_unit() {
                    return Ok(None);
                }
                if result.is_string() {
                    return Ok(result.into_string().ok());
                }
                Ok(Some(result.to_string()))
            }
            Processor::Filter(ast) => {
                let mut scope = message_scope(&msg, index, batch_index);
                let keep = engine
                    .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
                    .map_err(|e| self.fail(e.to_string()))?
                    .as_bool()
                    .map_err(|ty| self.fail(format!("check returned {} instead of bool", ty)))?;
                Ok(keep.then_some(msg))
            }
            Processor::Cache {
                cache,
                operator,
                key,
            } => {
                let key = key.replace(CONTENT_PLACEHOLDER, &msg);
                match operator {
                    CacheOperator::Set => {
                        cache.set(&key, &msg);
                        Ok(Some(msg))
                    }
                    CacheOperator::Get => cache
                        .get(&key)
                        .map(Some)
                        .ok_or_else(|| self.fail(format!("key '{}' not found", key))),
                    CacheOperator::Delete => {
                        cache.delete(&key);
                        Ok(Some(msg))
                    }
                }
            }
            _ => Ok(Some(msg)),
        }
    }
}

fn message_scope(msg: &str, index: usize, batch_index: usize) -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push("content", msg.to_string());
    scope.push("index", index as i64);
    scope.push("batch_index", batch_index as i64);
    scope
}

fn apply_text(operator: TextOperator, msg: &str, value: &str, replacement: &str) -> String {
    match operator {
        TextOperator::ToUpper => msg.to_uppercase(),
        TextOperator::ToLower => msg.to_lowercase(),
        TextOperator::Trim => msg.trim().to_string(),
        TextOperator::Prepend => format!("{}{}", value, msg),
        TextOperator::Append => format!("{}{}", msg, value),
        TextOperator::Replace if value.is_empty() => msg.to_string(),
        TextOperator::Replace => msg.replace(value, replacement),
    }
}
