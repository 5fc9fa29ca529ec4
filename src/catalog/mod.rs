#![forbid(unsafe_code)]

//! Namespace-scoped registry of mapped statements and row mappers.
//!
//! Loading a resource is idempotent: the second load of the same resource id
//! is a no-op. After [`Catalog::seal`] the catalog refuses further mutation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexSet;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::builder::{parse_sqlset, BuildContext};
use crate::config::{CatalogOptions, DuplicatePolicy};
use crate::error::{Result, SqlsetError};
use crate::mapping::{TypeAliasRegistry, ValueType};
use crate::rowmap::{PropertySink, RowMapper, TargetRegistry};
use crate::source::{DefinitionSource, DirectorySource, Element};
use crate::statement::MappedStatement;

/// Outcome of one [`Catalog::load`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Resource id.
    pub resource: String,
    /// Resolved namespace; `None` when the resource was already loaded.
    pub namespace: Option<String>,
    /// Statements registered.
    pub statements: usize,
    /// Row mappers registered.
    pub row_mappers: usize,
    /// Entries skipped because they failed to build or were duplicates.
    pub skipped: usize,
    /// True when the call was a no-op.
    pub already_loaded: bool,
}

#[derive(Default)]
struct CatalogState {
    resources: IndexSet<String>,
    statements: HashMap<String, Arc<MappedStatement>>,
    row_mappers: HashMap<String, Arc<RowMapper>>,
}

fn qualify(namespace: &str, id: &str) -> String {
    if namespace.is_empty() {
        id.to_owned()
    } else {
        format!("{namespace}.{id}")
    }
}

/// The statement catalog.
pub struct Catalog {
    options: CatalogOptions,
    aliases: TypeAliasRegistry,
    targets: TargetRegistry,
    state: RwLock<CatalogState>,
    sealed: AtomicBool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CatalogOptions::default())
    }
}

impl Catalog {
    /// Empty catalog with built-in aliases and the record target.
    pub fn new(options: CatalogOptions) -> Self {
        Self {
            options,
            aliases: TypeAliasRegistry::new(),
            targets: TargetRegistry::new(),
            state: RwLock::new(CatalogState::default()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Options every loaded statement is built with.
    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// Type alias table.
    pub fn aliases(&self) -> &TypeAliasRegistry {
        &self.aliases
    }

    /// Registered row-mapper targets.
    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Adds a type alias for subsequent loads.
    pub fn register_alias(&mut self, alias: &str, ty: ValueType) -> Result<()> {
        self.aliases.register_alias(alias, ty)
    }

    /// Makes `T` available as a row-mapper `class` for subsequent loads.
    pub fn register_target<T: PropertySink + Default + 'static>(&mut self, name: &str) {
        self.targets.register::<T>(name);
    }

    /// Freezes the catalog. Lookups keep working; loads and registrations fail.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            let state = self.state.read();
            info!(
                resources = state.resources.len(),
                statements = state.statements.len(),
                row_mappers = state.row_mappers.len(),
                "sqlset.catalog.sealed"
            );
        }
    }

    /// Whether [`Catalog::seal`] was called.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if self.is_sealed() {
            return Err(SqlsetError::Sealed(what.to_owned()));
        }
        Ok(())
    }

    /// Whether `resource` was loaded.
    pub fn is_loaded(&self, resource: &str) -> bool {
        self.state.read().resources.contains(resource)
    }

    /// Records `resource` as loaded without parsing anything. Returns false
    /// when it already was.
    pub fn mark_loaded(&self, resource: &str) -> Result<bool> {
        self.ensure_open(resource)?;
        Ok(self.state.write().resources.insert(resource.to_owned()))
    }

    /// Forgets that `resource` was loaded so it can be loaded again.
    /// Registered entries stay in place until overwritten.
    pub fn forget_resource(&self, resource: &str) -> Result<bool> {
        self.ensure_open(resource)?;
        Ok(self.state.write().resources.shift_remove(resource))
    }

    /// Loaded resource ids in load order.
    pub fn loaded_resources(&self) -> Vec<String> {
        self.state.read().resources.iter().cloned().collect()
    }

    /// Reads and loads a definition source, skipping the read when the
    /// resource is already loaded.
    pub fn load_source(&self, source: &dyn DefinitionSource) -> Result<LoadReport> {
        let resource = source.resource_id();
        if self.is_loaded(resource) {
            return Ok(self.already_loaded(resource));
        }
        let root = source.document()?;
        self.load(resource, &root)
    }

    /// Loads every definition file under `root` whose name matches the
    /// configured prefix and suffix.
    ///
    /// Files that fail to read or parse are logged and left unloaded; the
    /// scan continues. A sealed catalog still fails on the first new file.
    pub fn load_directory(&self, root: impl AsRef<Path>) -> Result<Vec<LoadReport>> {
        let scan = DirectorySource::new(root)
            .with_prefix(self.options.definition_prefix.clone())
            .with_suffix(self.options.definition_suffix.clone());
        let mut reports = Vec::new();
        for source in scan.sources()? {
            match self.load_source(&source) {
                Ok(report) => reports.push(report),
                Err(err @ SqlsetError::Sealed(_)) => return Err(err),
                Err(err) => {
                    warn!(resource = source.resource_id(), error = %err, "sqlset.load.resource_failed");
                }
            }
        }
        info!(root = %scan.root().display(), resources = reports.len(), "sqlset.load.directory");
        Ok(reports)
    }

    fn already_loaded(&self, resource: &str) -> LoadReport {
        debug!(resource, "sqlset.load.already_loaded");
        LoadReport {
            resource: resource.to_owned(),
            already_loaded: true,
            ..LoadReport::default()
        }
    }

    /// Loads one statement-set document.
    ///
    /// Fails only when the catalog is sealed or the resource as a whole is
    /// invalid; bad entries are logged and skipped.
    pub fn load(&self, resource: &str, root: &Element) -> Result<LoadReport> {
        if self.is_loaded(resource) {
            return Ok(self.already_loaded(resource));
        }
        self.ensure_open(resource)?;
        let started = Instant::now();
        info!(resource, "sqlset.load.begin");

        let ctx = BuildContext::new(&self.options, &self.aliases, &self.targets);
        let parsed = parse_sqlset(resource, root, &ctx)?;

        let mut state = self.state.write();
        if state.resources.contains(resource) {
            drop(state);
            return Ok(self.already_loaded(resource));
        }
        self.ensure_open(resource)?;
        state.resources.insert(resource.to_owned());

        let mut report = LoadReport {
            resource: resource.to_owned(),
            namespace: Some(parsed.namespace.clone()),
            skipped: parsed.skipped.len(),
            ..LoadReport::default()
        };
        for stmt in parsed.statements {
            match self.insert_statement(&mut state, stmt) {
                Ok(_) => report.statements += 1,
                Err(err) => {
                    warn!(resource, error = %err, "sqlset.load.entry_skipped");
                    report.skipped += 1;
                }
            }
        }
        for mapper in parsed.row_mappers {
            match self.insert_row_mapper(&mut state, mapper) {
                Ok(_) => report.row_mappers += 1,
                Err(err) => {
                    warn!(resource, error = %err, "sqlset.load.entry_skipped");
                    report.skipped += 1;
                }
            }
        }
        drop(state);

        info!(
            resource,
            namespace = parsed.namespace.as_str(),
            statements = report.statements,
            row_mappers = report.row_mappers,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sqlset.load.completed"
        );
        Ok(report)
    }

    fn insert_statement(&self, state: &mut CatalogState, stmt: MappedStatement) -> Result<Arc<MappedStatement>> {
        let key = stmt.qualified_id().to_owned();
        if state.statements.contains_key(&key) {
            match self.options.duplicate_policy {
                DuplicatePolicy::Reject => return Err(SqlsetError::DuplicateStatement(key)),
                DuplicatePolicy::LastWriteWins => {
                    warn!(statement = key.as_str(), resource = stmt.resource(), "sqlset.load.statement_replaced")
                }
            }
        }
        let stmt = Arc::new(stmt);
        state.statements.insert(key, Arc::clone(&stmt));
        Ok(stmt)
    }

    fn insert_row_mapper(&self, state: &mut CatalogState, mapper: RowMapper) -> Result<Arc<RowMapper>> {
        let key = mapper.qualified_id().to_owned();
        if state.row_mappers.contains_key(&key) {
            match self.options.duplicate_policy {
                DuplicatePolicy::Reject => return Err(SqlsetError::DuplicateStatement(key)),
                DuplicatePolicy::LastWriteWins => {
                    warn!(row_mapper = key.as_str(), resource = mapper.resource(), "sqlset.load.row_mapper_replaced")
                }
            }
        }
        let mapper = Arc::new(mapper);
        state.row_mappers.insert(key, Arc::clone(&mapper));
        Ok(mapper)
    }

    /// Registers a statement built outside a definition document, under its
    /// own namespace and id. Honors the duplicate policy.
    pub fn register_statement(&self, stmt: MappedStatement) -> Result<Arc<MappedStatement>> {
        self.ensure_open(stmt.qualified_id())?;
        let mut state = self.state.write();
        self.insert_statement(&mut state, stmt)
    }

    /// Registers a row mapper built outside a definition document.
    pub fn register_row_mapper(&self, mapper: RowMapper) -> Result<Arc<RowMapper>> {
        self.ensure_open(mapper.qualified_id())?;
        let mut state = self.state.write();
        self.insert_row_mapper(&mut state, mapper)
    }

    /// Statement `namespace.id`.
    pub fn statement(&self, namespace: &str, id: &str) -> Result<Arc<MappedStatement>> {
        self.statement_by_qualified(&qualify(namespace, id))
    }

    /// Statement by its qualified id.
    pub fn statement_by_qualified(&self, qualified_id: &str) -> Result<Arc<MappedStatement>> {
        self.state
            .read()
            .statements
            .get(qualified_id)
            .cloned()
            .ok_or_else(|| SqlsetError::StatementNotFound(qualified_id.to_owned()))
    }

    /// Whether statement `namespace.id` exists.
    pub fn has_statement(&self, namespace: &str, id: &str) -> bool {
        self.state.read().statements.contains_key(&qualify(namespace, id))
    }

    /// Row mapper `namespace.id`.
    pub fn row_mapper(&self, namespace: &str, id: &str) -> Result<Arc<RowMapper>> {
        let key = qualify(namespace, id);
        self.state
            .read()
            .row_mappers
            .get(&key)
            .cloned()
            .ok_or(SqlsetError::RowMapperNotFound(key))
    }

    /// Sorted qualified statement ids.
    pub fn statement_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.state.read().statements.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted qualified row-mapper ids.
    pub fn row_mapper_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.state.read().row_mappers.keys().cloned().collect();
        ids.sort();
        ids
    }
}
