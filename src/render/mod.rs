#![forbid(unsafe_code)]

//! Render engine: walks a statement's node tree against a parameter object and
//! produces final command text plus the ordered values bound to its `?`
//! placeholders.

mod bind;
/// Parameter resolution scope.
pub mod context;
/// Render tree nodes.
pub mod node;
mod template;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::mapping::BindingDescriptor;
use crate::value::Value;

pub use context::{RenderContext, ADDITIONAL_PARAMETER_KEY, PARAMETER_OBJECT_KEY};
pub use node::{Node, Placeholder};

use node::RenderBuffer;

/// One value bound to a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundValue {
    /// Marker path or descriptor name the value was resolved from.
    pub name: String,
    /// Value after parameter-side transforms; `Null` when unresolved.
    pub value: Value,
    /// False when the parameter object had no such property. Callers that
    /// require every value can reject the result on this flag.
    pub resolved: bool,
}

/// Final text plus ordered bound values for one render call.
#[derive(Clone, Debug)]
pub struct RenderedResult {
    sql: String,
    values: Vec<BoundValue>,
    parameter_mappings: Arc<[BindingDescriptor]>,
}

impl RenderedResult {
    /// Command text with `?` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    /// Bound values without their names.
    pub fn value_list(&self) -> Vec<Value> {
        self.values.iter().map(|b| b.value.clone()).collect()
    }

    /// Parameter descriptors of the statement that produced this result.
    pub fn parameter_mappings(&self) -> &[BindingDescriptor] {
        &self.parameter_mappings
    }

    /// True when every bound value was found in the parameter object.
    pub fn fully_resolved(&self) -> bool {
        self.values.iter().all(|b| b.resolved)
    }

    /// Splits into text and values.
    pub fn into_parts(self) -> (String, Vec<BoundValue>) {
        (self.sql, self.values)
    }
}

/// Rendered text plus the plan describing what feeds each placeholder.
/// This is what the text cache stores; it never carries values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedSql {
    sql: String,
    plan: Vec<Placeholder>,
}

impl CachedSql {
    /// Cached command text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder plan in text order.
    pub fn plan(&self) -> &[Placeholder] {
        &self.plan
    }
}

/// A statement's render tree together with its binding descriptors.
#[derive(Debug)]
pub struct StatementSource {
    root: Node,
    parameters: Arc<[BindingDescriptor]>,
    results: Vec<BindingDescriptor>,
    binding_order: Vec<usize>,
    walks: AtomicU64,
}

impl StatementSource {
    /// Combines a tree with its descriptors. Only `in`/`inout` descriptors take
    /// part in slot binding, ordered by `index` and then declaration order.
    pub fn new(root: Node, parameters: Vec<BindingDescriptor>, results: Vec<BindingDescriptor>) -> Self {
        let mut binding_order: Vec<usize> = parameters
            .iter()
            .enumerate()
            .filter(|(_, d)| d.mode().binds_value())
            .map(|(i, _)| i)
            .collect();
        binding_order.sort_by_key(|&i| parameters[i].index());
        Self {
            root,
            parameters: parameters.into(),
            results,
            binding_order,
            walks: AtomicU64::new(0),
        }
    }

    /// Render tree root.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Parameter descriptors in declaration order.
    pub fn parameter_mappings(&self) -> &[BindingDescriptor] {
        &self.parameters
    }

    /// Result descriptors in declaration order.
    pub fn result_mappings(&self) -> &[BindingDescriptor] {
        &self.results
    }

    /// Number of tree walks performed so far.
    pub fn walk_count(&self) -> u64 {
        self.walks.load(Ordering::Relaxed)
    }

    /// Walks the tree and binds values.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<RenderedResult> {
        let CachedSql { sql, plan } = self.render_text(ctx)?;
        let values = self.bind(&plan, ctx)?;
        Ok(self.result(sql, values))
    }

    /// Walks the tree, producing text and placeholder plan but no values.
    pub fn render_text(&self, ctx: &RenderContext<'_>) -> Result<CachedSql> {
        self.walks.fetch_add(1, Ordering::Relaxed);
        let mut out = RenderBuffer::default();
        self.root.render_into(ctx, &mut out)?;
        Ok(CachedSql {
            sql: out.sql,
            plan: out.plan,
        })
    }

    /// Reuses cached text and re-resolves values without walking the tree.
    pub fn render_from_cached(&self, cached: &CachedSql, ctx: &RenderContext<'_>) -> Result<RenderedResult> {
        let values = self.bind(&cached.plan, ctx)?;
        Ok(self.result(cached.sql.clone(), values))
    }

    fn result(&self, sql: String, values: Vec<BoundValue>) -> RenderedResult {
        RenderedResult {
            sql,
            values,
            parameter_mappings: Arc::clone(&self.parameters),
        }
    }

    fn named_descriptor(&self, path: &str) -> Option<usize> {
        self.binding_order
            .iter()
            .copied()
            .find(|&i| self.parameters[i].name() == path || self.parameters[i].property() == path)
    }

    /// Descriptors left for literal slots once named markers in `plan` have
    /// claimed theirs, in binding order.
    fn slot_descriptors(&self, plan: &[Placeholder]) -> Vec<usize> {
        let claimed: HashSet<usize> = plan
            .iter()
            .filter_map(|p| match p {
                Placeholder::Named(path) => self.named_descriptor(path),
                Placeholder::Slot(_) => None,
            })
            .collect();
        self.binding_order
            .iter()
            .copied()
            .filter(|i| !claimed.contains(i))
            .collect()
    }

    fn bind(&self, plan: &[Placeholder], ctx: &RenderContext<'_>) -> Result<Vec<BoundValue>> {
        let slot_descriptors = self.slot_descriptors(plan);
        let mut values = Vec::with_capacity(plan.len());
        for placeholder in plan {
            match placeholder {
                Placeholder::Slot(ordinal) => {
                    let Some(&idx) = slot_descriptors.get(*ordinal) else {
                        trace!(slot = ordinal, "sqlset.render.unbound_slot");
                        continue;
                    };
                    let descriptor = &self.parameters[idx];
                    let raw = ctx.resolve_descriptor(descriptor, *ordinal);
                    values.push(BoundValue {
                        name: descriptor.name().to_owned(),
                        resolved: raw.is_some(),
                        value: bind::prepare(descriptor, raw.cloned().unwrap_or_default())?,
                    });
                }
                Placeholder::Named(path) => {
                    let raw = ctx.lookup(path);
                    let value = raw.cloned().unwrap_or_default();
                    let value = match self.named_descriptor(path) {
                        Some(idx) => bind::prepare(&self.parameters[idx], value)?,
                        None => value,
                    };
                    values.push(BoundValue {
                        name: path.clone(),
                        resolved: raw.is_some(),
                        value,
                    });
                }
            }
        }
        Ok(values)
    }
}
