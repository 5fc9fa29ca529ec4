//! Dynamic statement definitions: load statement sets into a catalog, render
//! them against parameter objects, and map result rows back into targets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mapping;
pub mod render;
pub mod rowmap;
pub mod source;
pub mod statement;
pub mod value;

pub use catalog::{Catalog, LoadReport};
pub use config::{CatalogOptions, DuplicatePolicy};
pub use error::{Result, SqlsetError};
pub use mapping::{BindingDescriptor, ParameterMode, TypeAliasRegistry, ValueType};
pub use render::{BoundValue, RenderedResult};
pub use rowmap::{MapRow, PropertySink, Row, RowMapper, TargetRegistry};
pub use source::{DefinitionSource, DirectorySource, Element, JsonDefinitionSource};
pub use statement::{CacheStats, MappedStatement, StatementKind};
pub use value::Value;
