//! Pipeline configuration model
//!
//! The lab reads YAML of the form:
//!
//! ```yaml
//! pipeline:
//!   processors:
//!     - type: text
//!       operator: to_upper
//! resources:
//!   caches:
//!     example:
//!       type: memory
//!       ttl_secs: 300
//! ```
//!
//! Every section is optional. `input` and `output` are pinned to the lab's
//! own connectors, which feed the input buffer in and the output log out.
//! Normalising parses with defaults filled in and serialises back, so the
//! result lists every field of every component and is stable under repeated
//! normalisation.

use super::{ComponentKind, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on `example<N>` label candidates
const MAX_LABEL_CANDIDATES: usize = 10_000;

// Connector variants are empty structs rather than unit variants so that
// `deny_unknown_fields` rejects stray keys next to `type`.

/// Input connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum InputConfig {
    /// Messages come from the input buffer
    Lab {},
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig::Lab {}
    }
}

/// Buffer between input and pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BufferConfig {
    None {},
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig::None {}
    }
}

/// Output connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum OutputConfig {
    /// Results go to the output log
    Lab {},
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Lab {}
    }
}

/// Text processor operators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperator {
    #[default]
    ToUpper,
    ToLower,
    Trim,
    Prepend,
    Append,
    Replace,
}

/// Cache processor operators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOperator {
    #[default]
    Set,
    Get,
    Delete,
}

fn default_script() -> String {
    "content".to_string()
}

fn default_check() -> String {
    "true".to_string()
}

fn default_separator() -> String {
    "\n".to_string()
}

fn default_cache_key() -> String {
    "${content}".to_string()
}

/// A processor in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ProcessorConfig {
    Noop {},
    Text {
        #[serde(default)]
        operator: TextOperator,
        #[serde(default)]
        value: String,
        #[serde(default)]
        replacement: String,
    },
    Script {
        #[serde(default = "default_script")]
        source: String,
    },
    Filter {
        #[serde(default = "default_check")]
        check: String,
    },
    Split {},
    Archive {
        #[serde(default = "default_separator")]
        separator: String,
    },
    Cache {
        #[serde(default)]
        resource: String,
        #[serde(default)]
        operator: CacheOperator,
        #[serde(default = "default_cache_key")]
        key: String,
    },
    RateLimit {
        #[serde(default)]
        resource: String,
    },
}

impl ProcessorConfig {
    /// Processor type names, sorted
    pub const NAMES: &'static [&'static str] = &[
        "archive",
        "cache",
        "filter",
        "noop",
        "rate_limit",
        "script",
        "split",
        "text",
    ];

    /// Default configuration for a processor type
    pub fn default_for(name: &str) -> Option<Self> {
        let conf = match name {
            "noop" => ProcessorConfig::Noop {},
            "text" => ProcessorConfig::Text {
                operator: TextOperator::default(),
                value: String::new(),
                replacement: String::new(),
            },
            "script" => ProcessorConfig::Script {
                source: default_script(),
            },
            "filter" => ProcessorConfig::Filter {
                check: default_check(),
            },
            "split" => ProcessorConfig::Split {},
            "archive" => ProcessorConfig::Archive {
                separator: default_separator(),
            },
            "cache" => ProcessorConfig::Cache {
                resource: String::new(),
                operator: CacheOperator::default(),
                key: default_cache_key(),
            },
            "rate_limit" => ProcessorConfig::RateLimit {
                resource: String::new(),
            },
            _ => return None,
        };
        Some(conf)
    }

    /// Type name as written in YAML
    pub fn type_name(&self) -> &'static str {
        match self {
            ProcessorConfig::Noop { .. } => "noop",
            ProcessorConfig::Text { .. } => "text",
            ProcessorConfig::Script { .. } => "script",
            ProcessorConfig::Filter { .. } => "filter",
            ProcessorConfig::Split { .. } => "split",
            ProcessorConfig::Archive { .. } => "archive",
            ProcessorConfig::Cache { .. } => "cache",
            ProcessorConfig::RateLimit { .. } => "rate_limit",
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_cap() -> usize {
    1000
}

fn default_count() -> u32 {
    1000
}

fn default_interval_ms() -> u64 {
    1000
}

/// A cache resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CacheConfig {
    Memory {
        #[serde(default = "default_ttl_secs")]
        ttl_secs: u64,
    },
    Lru {
        #[serde(default = "default_cap")]
        cap: usize,
    },
}

impl CacheConfig {
    pub const NAMES: &'static [&'static str] = &["lru", "memory"];

    pub fn default_for(name: &str) -> Option<Self> {
        match name {
            "memory" => Some(CacheConfig::Memory {
                ttl_secs: default_ttl_secs(),
            }),
            "lru" => Some(CacheConfig::Lru { cap: default_cap() }),
            _ => None,
        }
    }
}

/// A rate limit resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum RateLimitConfig {
    Local {
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
    },
}

impl RateLimitConfig {
    pub const NAMES: &'static [&'static str] = &["local"];

    pub fn default_for(name: &str) -> Option<Self> {
        match name {
            "local" => Some(RateLimitConfig::Local {
                count: default_count(),
                interval_ms: default_interval_ms(),
            }),
            _ => None,
        }
    }
}

/// Processing steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub processors: Vec<ProcessorConfig>,
}

/// Named resources shared by processors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub caches: BTreeMap<String, CacheConfig>,
    #[serde(default)]
    pub rate_limits: BTreeMap<String, RateLimitConfig>,
}

/// A complete lab configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

impl StreamConfig {
    /// Parse YAML, treating a document with no content as all defaults
    pub fn parse(text: &str) -> EngineResult<Self> {
        let blank = text.lines().all(|l| {
            let l = l.trim();
            l.is_empty() || l.starts_with('#')
        });
        if blank {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Serialise to YAML
    pub fn to_yaml(&self) -> EngineResult<String> {
        serde_yaml::to_string(self).map_err(|e| EngineError::Parse(e.to_string()))
    }

    /// Names offered for insertion
    pub fn component_names(kind: ComponentKind) -> &'static [&'static str] {
        match kind {
            ComponentKind::Processor => ProcessorConfig::NAMES,
            ComponentKind::Cache => CacheConfig::NAMES,
            ComponentKind::RateLimit => RateLimitConfig::NAMES,
        }
    }

    /// Insert a default component of a type
    ///
    /// Processors are appended to the pipeline. Caches and rate limits are
    /// added under the first free label of `example`, `example1`, ...
    pub fn insert(&mut self, kind: ComponentKind, name: &str) -> EngineResult<()> {
        let unknown = || EngineError::UnknownComponent {
            kind,
            name: name.to_string(),
        };

        match kind {
            ComponentKind::Processor => {
                let conf = ProcessorConfig::default_for(name).ok_or_else(unknown)?;
                self.pipeline.processors.push(conf);
            }
            ComponentKind::Cache => {
                let conf = CacheConfig::default_for(name).ok_or_else(unknown)?;
                let label = free_label(&self.resources.caches).ok_or(EngineError::NoFreeLabel(kind))?;
                self.resources.caches.insert(label, conf);
            }
            ComponentKind::RateLimit => {
                let conf = RateLimitConfig::default_for(name).ok_or_else(unknown)?;
                let label =
                    free_label(&self.resources.rate_limits).ok_or(EngineError::NoFreeLabel(kind))?;
                self.resources.rate_limits.insert(label, conf);
            }
        }
        Ok(())
    }

    /// Check cross references and return lint warnings
    ///
    /// Processors naming a resource that does not exist are errors. Resources
    /// nothing refers to and an empty pipeline only produce lints.
    pub fn validate(&self) -> EngineResult<Vec<String>> {
        let mut lints = Vec::new();
        let mut used_caches = BTreeSet::new();
        let mut used_rate_limits = BTreeSet::new();

        for (i, proc) in self.pipeline.processors.iter().enumerate() {
            match proc {
                ProcessorConfig::Cache { resource, .. } => {
                    if !self.resources.caches.contains_key(resource) {
                        return Err(EngineError::Validation(format!(
                            "processor {} ({}): cache resource '{}' not found",
                            i,
                            proc.type_name(),
                            resource
                        )));
                    }
                    used_caches.insert(resource.as_str());
                }
                ProcessorConfig::RateLimit { resource } => {
                    if !self.resources.rate_limits.contains_key(resource) {
                        return Err(EngineError::Validation(format!(
                            "processor {} ({}): rate limit resource '{}' not found",
                            i,
                            proc.type_name(),
                            resource
                        )));
                    }
                    used_rate_limits.insert(resource.as_str());
                }
                _ => {}
            }
        }

        for (label, conf) in &self.resources.caches {
            if let CacheConfig::Lru { cap: 0 } = conf {
                return Err(EngineError::Validation(format!(
                    "cache resource '{}': cap must be greater than zero",
                    label
                )));
            }
            if !used_caches.contains(label.as_str()) {
                lints.push(format!("cache resource '{}' is never used", label));
            }
        }

        for (label, conf) in &self.resources.rate_limits {
            let RateLimitConfig::Local { count, interval_ms } = conf;
            if *count == 0 || *interval_ms == 0 {
                return Err(EngineError::Validation(format!(
                    "rate limit resource '{}': count and interval_ms must be greater than zero",
                    label
                )));
            }
            if !used_rate_limits.contains(label.as_str()) {
                lints.push(format!("rate limit resource '{}' is never used", label));
            }
        }

        if self.pipeline.processors.is_empty() {
            lints.push("pipeline has no processors, messages pass through unchanged".to_string());
        }

        Ok(lints)
    }
}

fn free_label<V>(existing: &BTreeMap<String, V>) -> Option<String> {
    (0..MAX_LABEL_CANDIDATES)
        .map(|i| {
            if i == 0 {
                "example".to_string()
            } else {
                format!("example{}", i)
            }
        })
        .find(|candidate| !existing.contains_key(candidate))
}

/// Parse and re-serialise a configuration
pub fn normalise(text: &str) -> EngineResult<String> {
    StreamConfig::parse(text)?.to_yaml()
}

/// Insert a component and return the normalised result
pub fn insert_component(text: &str, kind: ComponentKind, name: &str) -> EngineResult<String> {
    let mut conf = StreamConfig::parse(text)?;
    conf.insert(kind, name)?;
    conf.to_yaml()
}
