use crate::error::{Result, SqlsetError};
use crate::rowmap::RowMapper;
use crate::source::Element;

use super::mappings::build_column_mappings;
use super::statement::entry_id;
use super::BuildContext;

/// Builds one `row-mapper` entry. An unregistered `class` yields
/// [`SqlsetError::TargetTypeNotFound`], which the loader treats as a skip.
pub fn build_row_mapper(
    el: &Element,
    namespace: &str,
    resource: &str,
    ctx: &BuildContext<'_>,
) -> Result<RowMapper> {
    let id = entry_id(el)?;
    let class = el
        .non_blank_attr("class")
        .ok_or_else(|| SqlsetError::MissingAttribute {
            element: el.name.clone(),
            attribute: "class",
        })?;
    let target = ctx.targets.resolve(class)?;
    let mappings = build_column_mappings(el, ctx.aliases)?;
    Ok(RowMapper::new(namespace, id, target, mappings).with_resource(resource))
}
