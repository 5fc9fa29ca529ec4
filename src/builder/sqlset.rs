use tracing::{debug, warn};

use crate::error::{Result, SqlsetError};
use crate::rowmap::RowMapper;
use crate::source::Element;
use crate::statement::MappedStatement;

use super::row_mapper::build_row_mapper;
use super::statement::build_statement;
use super::BuildContext;

/// Root element of a statement-set document.
pub const ROOT_ELEMENT: &str = "sqlset";
/// Statement entry tags, in load order.
pub const STATEMENT_ELEMENTS: [&str; 2] = ["sql-query", "sql"];
/// Row-mapper entry tag.
pub const ROW_MAPPER_ELEMENT: &str = "row-mapper";

/// Declared namespace if non-blank, else the declared name.
pub fn resolve_namespace(name: Option<&str>, namespace: Option<&str>) -> Option<String> {
    [namespace, name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// An entry that failed to build and was left out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Entry tag.
    pub element: String,
    /// Entry id when one could be read.
    pub id: Option<String>,
    /// Why the entry was skipped.
    pub reason: String,
}

/// Everything one resource declares, ready to register.
#[derive(Debug)]
pub struct ParsedSet {
    /// Resolved namespace.
    pub namespace: String,
    /// Declared name.
    pub name: Option<String>,
    /// Declared version.
    pub version: Option<String>,
    /// Declared description.
    pub description: Option<String>,
    /// Built statements in load order.
    pub statements: Vec<MappedStatement>,
    /// Built row mappers in document order.
    pub row_mappers: Vec<RowMapper>,
    /// Entries left out.
    pub skipped: Vec<SkippedEntry>,
}

fn skip(resource: &str, el: &Element, err: &SqlsetError, skipped: &mut Vec<SkippedEntry>) {
    let id = el
        .non_blank_attr("id")
        .or_else(|| el.non_blank_attr("name"))
        .map(str::to_owned);
    match err {
        SqlsetError::TargetTypeNotFound(class) => warn!(
            resource,
            id = id.as_deref().unwrap_or(""),
            class = class.as_str(),
            "sqlset.load.row_mapper_target_missing"
        ),
        _ => warn!(
            resource,
            element = el.name.as_str(),
            id = id.as_deref().unwrap_or(""),
            error = %err,
            "sqlset.load.entry_skipped"
        ),
    }
    skipped.push(SkippedEntry {
        element: el.name.clone(),
        id,
        reason: err.to_string(),
    });
}

/// Builds every entry of one statement-set document without registering
/// anything. Namespace and root errors fail the whole resource; entry errors
/// are logged and recorded in [`ParsedSet::skipped`].
pub fn parse_sqlset(resource: &str, root: &Element, ctx: &BuildContext<'_>) -> Result<ParsedSet> {
    if root.name != ROOT_ELEMENT {
        return Err(SqlsetError::UnexpectedRoot {
            resource: resource.to_owned(),
            found: root.name.clone(),
        });
    }
    let name = root.attr_or_child_text("name").filter(|s| !s.is_empty());
    let namespace = resolve_namespace(
        name.as_deref(),
        root.attr_or_child_text("namespace").as_deref(),
    )
    .ok_or_else(|| SqlsetError::Namespace {
        resource: resource.to_owned(),
    })?;

    let mut statements = Vec::new();
    let mut row_mappers = Vec::new();
    let mut skipped = Vec::new();

    for tag in STATEMENT_ELEMENTS {
        for el in root.elements_named(tag) {
            match build_statement(el, &namespace, resource, ctx) {
                Ok(stmt) => {
                    debug!(resource, statement = stmt.qualified_id(), "sqlset.load.statement_built");
                    statements.push(stmt);
                }
                Err(err) => skip(resource, el, &err, &mut skipped),
            }
        }
    }
    for el in root.elements_named(ROW_MAPPER_ELEMENT) {
        match build_row_mapper(el, &namespace, resource, ctx) {
            Ok(mapper) => row_mappers.push(mapper),
            Err(err) => skip(resource, el, &err, &mut skipped),
        }
    }

    Ok(ParsedSet {
        namespace,
        name,
        version: root.attr_or_child_text("version").filter(|s| !s.is_empty()),
        description: root.attr_or_child_text("description").filter(|s| !s.is_empty()),
        statements,
        row_mappers,
        skipped,
    })
}
