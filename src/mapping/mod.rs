#![forbid(unsafe_code)]

//! Binding descriptors and the type vocabulary they are declared with.

/// Parameter, result, and column mapping descriptors.
pub mod descriptor;

/// Language-level types, store-native types, and the alias table.
pub mod types;

pub use descriptor::{BindingDescriptor, BindingDescriptorBuilder, ParameterMode, ValueTransforms};
pub use types::{NativeType, TypeAliasRegistry, ValueType};
