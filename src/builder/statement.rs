use crate::error::{Result, SqlsetError};
use crate::render::StatementSource;
use crate::source::Element;
use crate::statement::{MappedStatement, StatementKind};

use super::mappings::{build_parameter_mappings, build_result_mappings};
use super::nodes::build_node_tree;
use super::BuildContext;

/// `id`, falling back to `name`.
pub(crate) fn entry_id(el: &Element) -> Result<String> {
    el.non_blank_attr("id")
        .or_else(|| el.non_blank_attr("name"))
        .map(|id| id.trim().to_owned())
        .ok_or_else(|| SqlsetError::MissingAttribute {
            element: el.name.clone(),
            attribute: "id",
        })
}

/// Builds one statement entry (`sql-query` or `sql`).
pub fn build_statement(
    el: &Element,
    namespace: &str,
    resource: &str,
    ctx: &BuildContext<'_>,
) -> Result<MappedStatement> {
    let id = entry_id(el)?;
    let description = el
        .attr_or_child_text("description")
        .filter(|d| !d.trim().is_empty());
    let fetch_size = el.int_attr("fetchSize", 0)?;
    let timeout = match el.int_attr("timeout", 0)? {
        t if t > 0 => t,
        _ => ctx.options.default_statement_timeout,
    };
    let declared_kind = el
        .non_blank_attr("statementType")
        .map(str::parse::<StatementKind>)
        .transpose()?;
    let kind = if ctx.options.honor_declared_kind {
        declared_kind.unwrap_or_default()
    } else {
        StatementKind::Prepared
    };

    let parameters = build_parameter_mappings(el, ctx.aliases)?;
    let results = build_result_mappings(el, ctx.aliases)?;
    let source = StatementSource::new(build_node_tree(el), parameters, results);

    Ok(MappedStatement::builder(id, source)
        .namespace(namespace)
        .resource(resource)
        .description(description)
        .fetch_size(fetch_size)
        .timeout(timeout)
        .kind(kind)
        .declared_kind(declared_kind)
        .cache_capacity(ctx.options.text_cache_capacity)
        .build())
}
