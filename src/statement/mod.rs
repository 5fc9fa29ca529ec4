#![forbid(unsafe_code)]

//! Mapped statements: a render engine with identity, execution hints, and a
//! lazily created per-statement text cache.

mod cache;

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::debug;

use crate::error::{Result, SqlsetError};
use crate::mapping::BindingDescriptor;
use crate::render::{RenderContext, RenderedResult, StatementSource};
use crate::value::Value;

pub use cache::{CacheStats, DEFAULT_TEXT_CACHE_CAPACITY};

use cache::{CacheMetrics, SqlTextCache};

/// How the executing engine should run a statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Text executed as-is.
    Plain,
    /// Precompiled with bound values.
    #[default]
    Prepared,
    /// Stored-procedure call.
    Callable,
}

impl FromStr for StatementKind {
    type Err = SqlsetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAIN" | "STATEMENT" => Ok(StatementKind::Plain),
            "PREPARED" => Ok(StatementKind::Prepared),
            "CALLABLE" => Ok(StatementKind::Callable),
            _ => Err(SqlsetError::InvalidAttribute {
                attribute: "statementType",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Plain => "PLAIN",
            StatementKind::Prepared => "PREPARED",
            StatementKind::Callable => "CALLABLE",
        })
    }
}

/// A loaded statement. Immutable apart from its text cache, and safe to
/// share across threads.
pub struct MappedStatement {
    id: String,
    namespace: String,
    qualified_id: String,
    resource: String,
    description: Option<String>,
    fetch_size: i64,
    timeout: i64,
    kind: StatementKind,
    declared_kind: Option<StatementKind>,
    source: StatementSource,
    cache_capacity: usize,
    cache: OnceLock<SqlTextCache>,
    metrics: CacheMetrics,
}

impl fmt::Debug for MappedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedStatement")
            .field("qualified_id", &self.qualified_id)
            .field("resource", &self.resource)
            .field("kind", &self.kind)
            .field("fetch_size", &self.fetch_size)
            .field("timeout", &self.timeout)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl MappedStatement {
    /// Starts a statement around an already-built render engine.
    pub fn builder(id: impl Into<String>, source: StatementSource) -> MappedStatementBuilder {
        MappedStatementBuilder {
            id: id.into(),
            namespace: String::new(),
            resource: String::new(),
            description: None,
            fetch_size: 0,
            timeout: 0,
            kind: StatementKind::Prepared,
            declared_kind: None,
            cache_capacity: DEFAULT_TEXT_CACHE_CAPACITY,
            source,
        }
    }

    /// Identifier within the namespace.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `namespace.id`.
    pub fn qualified_id(&self) -> &str {
        &self.qualified_id
    }

    /// Definition resource that declared the statement.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Human description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fetch-size hint; 0 leaves the engine default.
    pub fn fetch_size(&self) -> i64 {
        self.fetch_size
    }

    /// Timeout hint in seconds; 0 means none.
    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    /// Kind the executing engine should use.
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Kind as written in the definition, if any.
    pub fn declared_kind(&self) -> Option<StatementKind> {
        self.declared_kind
    }

    /// Parameter descriptors.
    pub fn parameter_mappings(&self) -> &[BindingDescriptor] {
        self.source.parameter_mappings()
    }

    /// Result descriptors.
    pub fn result_mappings(&self) -> &[BindingDescriptor] {
        self.source.result_mappings()
    }

    /// Underlying render engine.
    pub fn source(&self) -> &StatementSource {
        &self.source
    }

    /// Number of tree walks so far.
    pub fn walk_count(&self) -> u64 {
        self.source.walk_count()
    }

    /// Cache counters and current size.
    pub fn cache_stats(&self) -> CacheStats {
        let entries = self.cache.get().map_or(0, SqlTextCache::len);
        self.metrics.snapshot(entries)
    }

    /// Renders against `parameter`, always walking the tree.
    pub fn render(&self, parameter: &Value) -> Result<RenderedResult> {
        self.source.render(&RenderContext::new(parameter, None))
    }

    /// Renders with `extra` merged into the resolution scope. A non-map extra
    /// is exposed under [`crate::render::ADDITIONAL_PARAMETER_KEY`].
    pub fn render_with(&self, parameter: &Value, extra: &Value) -> Result<RenderedResult> {
        self.source.render(&RenderContext::new(parameter, Some(extra)))
    }

    /// Renders through the text cache when `cache_key` is given.
    ///
    /// A hit reuses the cached text and placeholder plan and only resolves
    /// values; a miss renders fully and stores the text under `cache_key`.
    pub fn render_cached(
        &self,
        parameter: &Value,
        extra: Option<&Value>,
        cache_key: Option<&str>,
    ) -> Result<RenderedResult> {
        let ctx = RenderContext::new(parameter, extra);
        let Some((key, cache)) = cache_key.and_then(|key| Some((key, self.text_cache()?))) else {
            self.metrics.bypass();
            return self.source.render(&ctx);
        };

        let started = Instant::now();
        if let Some(cached) = cache.get(key) {
            self.metrics.hit();
            let result = self.source.render_from_cached(&cached, &ctx)?;
            debug!(
                statement = %self.qualified_id,
                key,
                build_micros = started.elapsed().as_micros() as u64,
                "sqlset.statement.cache_hit"
            );
            return Ok(result);
        }

        self.metrics.miss();
        let cached = Arc::new(self.source.render_text(&ctx)?);
        let result = self.source.render_from_cached(&cached, &ctx)?;
        let evicted = cache.insert(key, cached);
        self.metrics.insert(evicted);
        debug!(
            statement = %self.qualified_id,
            key,
            evicted,
            build_micros = started.elapsed().as_micros() as u64,
            "sqlset.statement.cache_miss"
        );
        Ok(result)
    }

    fn text_cache(&self) -> Option<&SqlTextCache> {
        let capacity = NonZeroUsize::new(self.cache_capacity)?;
        Some(self.cache.get_or_init(|| {
            debug!(
                statement = %self.qualified_id,
                capacity = self.cache_capacity,
                "sqlset.statement.cache_init"
            );
            SqlTextCache::new(capacity)
        }))
    }
}

/// Builder for [`MappedStatement`].
#[derive(Debug)]
pub struct MappedStatementBuilder {
    id: String,
    namespace: String,
    resource: String,
    description: Option<String>,
    fetch_size: i64,
    timeout: i64,
    kind: StatementKind,
    declared_kind: Option<StatementKind>,
    cache_capacity: usize,
    source: StatementSource,
}

impl MappedStatementBuilder {
    /// Sets the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the defining resource.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the fetch-size hint.
    pub fn fetch_size(mut self, fetch_size: i64) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    /// Sets the timeout hint.
    pub fn timeout(mut self, timeout: i64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the resolved kind.
    pub fn kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Records the kind as declared.
    pub fn declared_kind(mut self, kind: Option<StatementKind>) -> Self {
        self.declared_kind = kind;
        self
    }

    /// Sets the text cache capacity; 0 disables caching.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Finishes the statement.
    pub fn build(self) -> MappedStatement {
        let qualified_id = if self.namespace.is_empty() {
            self.id.clone()
        } else {
            format!("{}.{}", self.namespace, self.id)
        };
        MappedStatement {
            id: self.id,
            namespace: self.namespace,
            qualified_id,
            resource: self.resource,
            description: self.description,
            fetch_size: self.fetch_size,
            timeout: self.timeout,
            kind: self.kind,
            declared_kind: self.declared_kind,
            source: self.source,
            cache_capacity: self.cache_capacity,
            cache: OnceLock::new(),
            metrics: CacheMetrics::default(),
        }
    }
}
