use crate::error::{Result, SqlsetError};
use crate::mapping::{BindingDescriptor, NativeType, ParameterMode, TypeAliasRegistry, ValueTransforms};
use crate::source::Element;

/// Path of parameter declarations under a statement.
pub const PARAMETER_PATH: &str = "parameter-mappings/parameter";
/// Path of result declarations under a statement.
pub const RESULT_PATH: &str = "result-mappings/result";
/// Column mapping declarations under a row mapper.
pub const COLUMN_MAPPING_ELEMENT: &str = "parameterMapping";

fn copied(el: &Element, key: &str) -> Option<String> {
    el.non_blank_attr(key).map(|v| v.trim().to_owned())
}

/// Builds one descriptor from a parameter, result, or column mapping element.
///
/// `name` is required. Transform attributes are copied only when present.
/// Declared type names go through the alias table; an unknown name fails.
pub fn build_descriptor(el: &Element, aliases: &TypeAliasRegistry) -> Result<BindingDescriptor> {
    let name = el
        .non_blank_attr("name")
        .ok_or_else(|| SqlsetError::MissingAttribute {
            element: el.name.clone(),
            attribute: "name",
        })?;
    let mode = match el.non_blank_attr("mode") {
        Some(raw) => raw.parse::<ParameterMode>()?,
        None => ParameterMode::None,
    };

    let mut builder = BindingDescriptor::builder(name.trim())
        .index(el.int_attr("index", 0)?)
        .mode(mode)
        .primary(el.bool_attr("primary", false)?)
        .size(el.int_attr("size", 0)?)
        .transforms(ValueTransforms {
            encoding: copied(el, "encoding"),
            pattern: copied(el, "pattern"),
            cipher: copied(el, "cipher"),
            cipher_key: copied(el, "cipherKey"),
            cipher_key_alg: copied(el, "cipherKeyAlg"),
            digest: copied(el, "digest"),
        });
    if let Some(property) = el.non_blank_attr("property") {
        builder = builder.property(property.trim());
    }
    if let Some(column) = el.non_blank_attr("column") {
        builder = builder.column(column.trim());
    }
    if let Some(native) = el.non_blank_attr("jdbcType") {
        builder = builder.native_type(native.parse::<NativeType>()?);
    }
    if let Some(declared) = el.non_blank_attr("javaType") {
        builder = builder.value_type(aliases.resolve(declared)?);
    }
    Ok(builder.build())
}

fn build_all<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
    aliases: &TypeAliasRegistry,
) -> Result<Vec<BindingDescriptor>> {
    elements
        .into_iter()
        .map(|el| build_descriptor(el, aliases))
        .collect()
}

/// Parameter descriptors of a statement, in declaration order.
pub fn build_parameter_mappings(statement: &Element, aliases: &TypeAliasRegistry) -> Result<Vec<BindingDescriptor>> {
    build_all(statement.eval_path(PARAMETER_PATH), aliases)
}

/// Result descriptors of a statement, in declaration order.
pub fn build_result_mappings(statement: &Element, aliases: &TypeAliasRegistry) -> Result<Vec<BindingDescriptor>> {
    build_all(statement.eval_path(RESULT_PATH), aliases)
}

/// Column mappings of a row mapper, in declaration order.
pub fn build_column_mappings(row_mapper: &Element, aliases: &TypeAliasRegistry) -> Result<Vec<BindingDescriptor>> {
    build_all(row_mapper.elements_named(COLUMN_MAPPING_ELEMENT), aliases)
}
