#![forbid(unsafe_code)]

//! Row mapping: materialises external rows into typed targets through
//! column-to-property binding descriptors.

mod transform;

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::{Result, SqlsetError};
use crate::mapping::BindingDescriptor;
use crate::value::{Value, ValueMap};

/// One row handed over by the executing engine.
pub trait Row {
    /// Column names in cursor order.
    fn columns(&self) -> Vec<&str>;
    /// Raw value of a column, `None` when the row has no such column.
    fn get(&self, column: &str) -> Option<Value>;
}

/// Row backed by an ordered map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapRow {
    values: ValueMap,
}

impl MapRow {
    /// Empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Adds or replaces a column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }
}

impl From<ValueMap> for MapRow {
    fn from(values: ValueMap) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Row for MapRow {
    fn columns(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    fn get(&self, column: &str) -> Option<Value> {
        self.values.get(column).cloned()
    }
}

/// Receives mapped values by property name.
pub trait PropertySink {
    /// Assigns `value` to `property`.
    fn set(&mut self, property: &str, value: Value) -> Result<()>;
}

impl PropertySink for ValueMap {
    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        self.insert(property.to_owned(), value);
        Ok(())
    }
}

/// Schemaless record target: a `Null` value becomes a map on first assignment.
impl PropertySink for Value {
    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match self {
            Value::Map(map) => map.set(property, value),
            Value::Null => {
                let mut map = ValueMap::new();
                map.insert(property.to_owned(), value);
                *self = Value::Map(map);
                Ok(())
            }
            other => Err(SqlsetError::Property {
                property: property.to_owned(),
                reason: format!("target is a {}, not a record", other.type_name()),
            }),
        }
    }
}

/// A registered row-mapper target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetType {
    name: String,
    type_id: TypeId,
    rust_name: &'static str,
}

impl TargetType {
    /// Name the target was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type name of the target.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Names the embedding application gives its row targets.
#[derive(Clone, Debug)]
pub struct TargetRegistry {
    types: HashMap<String, TargetType>,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetRegistry {
    /// Registry with the schemaless record target under `map` and `record`.
    pub fn new() -> Self {
        let mut registry = Self {
            types: HashMap::new(),
        };
        registry.register::<Value>("map");
        registry.register::<Value>("hashmap");
        registry.register::<Value>("record");
        registry
    }

    /// Registers `T` under `name` (case-insensitive).
    pub fn register<T: PropertySink + Default + 'static>(&mut self, name: &str) {
        self.types.insert(
            name.trim().to_ascii_lowercase(),
            TargetType {
                name: name.trim().to_owned(),
                type_id: TypeId::of::<T>(),
                rust_name: type_name::<T>(),
            },
        );
    }

    /// Resolves a declared target name. Qualified names fall back to their
    /// final segment.
    pub fn resolve(&self, name: &str) -> Result<TargetType> {
        let key = name.trim().to_ascii_lowercase();
        self.types
            .get(&key)
            .or_else(|| {
                key.rsplit_once('.')
                    .and_then(|(_, simple)| self.types.get(simple))
            })
            .cloned()
            .ok_or_else(|| SqlsetError::TargetTypeNotFound(name.to_owned()))
    }
}

/// A target type plus column-to-property descriptors, indexed by column.
pub struct RowMapper {
    id: String,
    namespace: String,
    qualified_id: String,
    resource: String,
    target: TargetType,
    mappings: Vec<BindingDescriptor>,
    by_column: HashMap<String, usize>,
    by_column_folded: HashMap<String, usize>,
}

impl fmt::Debug for RowMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMapper")
            .field("qualified_id", &self.qualified_id)
            .field("target", &self.target.name)
            .field("mappings", &self.mappings.len())
            .finish()
    }
}

impl RowMapper {
    /// Builds a mapper. A descriptor's column defaults to its name; on a
    /// repeated column the first descriptor wins.
    pub fn new(
        namespace: impl Into<String>,
        id: impl Into<String>,
        target: TargetType,
        mappings: Vec<BindingDescriptor>,
    ) -> Self {
        let namespace = namespace.into();
        let id = id.into();
        let qualified_id = if namespace.is_empty() {
            id.clone()
        } else {
            format!("{namespace}.{id}")
        };
        let mut by_column = HashMap::with_capacity(mappings.len());
        let mut by_column_folded = HashMap::with_capacity(mappings.len());
        for (idx, mapping) in mappings.iter().enumerate() {
            let column = mapping.column().unwrap_or(mapping.name());
            by_column.entry(column.to_owned()).or_insert(idx);
            by_column_folded.entry(column.to_ascii_lowercase()).or_insert(idx);
        }
        Self {
            id,
            namespace,
            qualified_id,
            resource: String::new(),
            target,
            mappings,
            by_column,
            by_column_folded,
        }
    }

    /// Records the defining resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
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

    /// Defining resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Declared target.
    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// Column mappings in declaration order.
    pub fn mappings(&self) -> &[BindingDescriptor] {
        &self.mappings
    }

    /// Descriptor for a column: exact match first, then ASCII case-insensitive.
    pub fn mapping_for(&self, column: &str) -> Option<&BindingDescriptor> {
        self.by_column
            .get(column)
            .or_else(|| self.by_column_folded.get(&column.to_ascii_lowercase()))
            .map(|&idx| &self.mappings[idx])
    }

    /// Materialises one row into a fresh `T`.
    ///
    /// Columns without a descriptor are ignored. A failing transform logs and
    /// assigns the raw value instead.
    pub fn map_row<T>(&self, row: &dyn Row) -> Result<T>
    where
        T: PropertySink + Default + 'static,
    {
        if !self.target.is::<T>() {
            return Err(SqlsetError::TargetMismatch {
                mapper: self.qualified_id.clone(),
                expected: self.target.name.clone(),
                found: type_name::<T>(),
            });
        }
        let mut target = T::default();
        for column in row.columns() {
            let Some(descriptor) = self.mapping_for(column) else {
                continue;
            };
            let raw = row.get(column).unwrap_or_default();
            let value = match transform::apply(descriptor, raw.clone()) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        mapper = %self.qualified_id,
                        column,
                        property = descriptor.property(),
                        error = %err,
                        "sqlset.rowmap.transform_fallback"
                    );
                    raw
                }
            };
            target.set(descriptor.property(), value)?;
        }
        Ok(target)
    }

    /// Materialises every row, stopping at the first assignment failure.
    pub fn map_rows<T, R, I>(&self, rows: I) -> Result<Vec<T>>
    where
        T: PropertySink + Default + 'static,
        R: Row,
        I: IntoIterator<Item = R>,
    {
        rows.into_iter().map(|row| self.map_row::<T>(&row)).collect()
    }
}
