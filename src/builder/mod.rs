#![forbid(unsafe_code)]

//! Load-time builders turning definition elements into render trees,
//! descriptors, statements, and row mappers. Builders are pure; the catalog
//! registers what they return.

/// Binding descriptor construction.
pub mod mappings;
/// Render tree construction.
pub mod nodes;
/// Row-mapper entries.
pub mod row_mapper;
/// Whole statement-set documents.
pub mod sqlset;
/// Statement entries.
pub mod statement;

use crate::config::CatalogOptions;
use crate::mapping::TypeAliasRegistry;
use crate::rowmap::TargetRegistry;

pub use mappings::{build_column_mappings, build_descriptor, build_parameter_mappings, build_result_mappings};
pub use nodes::build_node_tree;
pub use row_mapper::build_row_mapper;
pub use sqlset::{parse_sqlset, resolve_namespace, ParsedSet, SkippedEntry};
pub use statement::build_statement;

/// Shared inputs for building one resource.
#[derive(Clone, Copy, Debug)]
pub struct BuildContext<'a> {
    /// Catalog-wide options.
    pub options: &'a CatalogOptions,
    /// Type alias table.
    pub aliases: &'a TypeAliasRegistry,
    /// Row-mapper target names.
    pub targets: &'a TargetRegistry,
}

impl<'a> BuildContext<'a> {
    /// Bundles the inputs.
    pub fn new(
        options: &'a CatalogOptions,
        aliases: &'a TypeAliasRegistry,
        targets: &'a TargetRegistry,
    ) -> Self {
        Self {
            options,
            aliases,
            targets,
        }
    }
}
