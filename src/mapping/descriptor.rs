use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SqlsetError};

use super::types::{NativeType, ValueType};

/// Direction a bound value travels relative to the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterMode {
    /// Supplied by the caller.
    In,
    /// Produced by the store (callable statements).
    Out,
    /// Both supplied and produced.
    InOut,
    /// Documentation-only mapping; never bound.
    #[default]
    None,
}

impl ParameterMode {
    /// Whether this direction contributes a bound value at render time.
    pub fn binds_value(self) -> bool {
        matches!(self, ParameterMode::In | ParameterMode::InOut)
    }
}

impl FromStr for ParameterMode {
    type Err = SqlsetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(ParameterMode::In),
            "OUT" => Ok(ParameterMode::Out),
            "INOUT" => Ok(ParameterMode::InOut),
            "NONE" | "" => Ok(ParameterMode::None),
            _ => Err(SqlsetError::InvalidAttribute {
                attribute: "mode",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ParameterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterMode::In => "IN",
            ParameterMode::Out => "OUT",
            ParameterMode::InOut => "INOUT",
            ParameterMode::None => "NONE",
        };
        f.write_str(name)
    }
}

/// Optional value transforms attached to a descriptor. Absent fields mean
/// "no transform".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueTransforms {
    /// Character-encoding conversion (`FROM>TO` or `TO`), or the raw encoding
    /// (`HEX`/`BASE64`) of an encrypted column.
    pub encoding: Option<String>,
    /// Textual pattern used when parsing dates.
    pub pattern: Option<String>,
    /// Symmetric cipher transformation name.
    pub cipher: Option<String>,
    /// Hex-encoded cipher key.
    pub cipher_key: Option<String>,
    /// Algorithm of the cipher key.
    pub cipher_key_alg: Option<String>,
    /// Digest algorithm applied to bound values.
    pub digest: Option<String>,
}

impl ValueTransforms {
    /// True when no transform is configured.
    pub fn is_empty(&self) -> bool {
        *self == ValueTransforms::default()
    }
}

/// Typed description of one named value crossing the boundary, either a
/// statement parameter, a declared result, or a row-mapper column mapping.
///
/// Built once at load time and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingDescriptor {
    name: String,
    property: String,
    column: Option<String>,
    index: i64,
    mode: ParameterMode,
    primary: bool,
    size: i64,
    native_type: Option<NativeType>,
    value_type: Option<ValueType>,
    transforms: ValueTransforms,
}

impl BindingDescriptor {
    /// Starts a descriptor named `name`; the target property defaults to the name.
    pub fn builder(name: impl Into<String>) -> BindingDescriptorBuilder {
        let name = name.into();
        BindingDescriptorBuilder {
            inner: BindingDescriptor {
                property: name.clone(),
                name,
                column: None,
                index: 0,
                mode: ParameterMode::None,
                primary: false,
                size: 0,
                native_type: None,
                value_type: None,
                transforms: ValueTransforms::default(),
            },
        }
    }

    /// Logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property the value is read from (parameters) or written to (rows).
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Source/target column name.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Ordinal position; 0 means "declaration order".
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Direction.
    pub fn mode(&self) -> ParameterMode {
        self.mode
    }

    /// Marks key-bearing fields.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Fixed size, 0 when unset.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Declared store-native type.
    pub fn native_type(&self) -> Option<NativeType> {
        self.native_type
    }

    /// Declared language-level type.
    pub fn value_type(&self) -> Option<&ValueType> {
        self.value_type.as_ref()
    }

    /// Declared language type, falling back to the native type's default.
    pub fn effective_type(&self) -> Option<ValueType> {
        self.value_type
            .clone()
            .or_else(|| self.native_type.map(NativeType::default_value_type))
    }

    /// Configured transforms.
    pub fn transforms(&self) -> &ValueTransforms {
        &self.transforms
    }
}

/// Builder for [`BindingDescriptor`].
#[derive(Clone, Debug)]
pub struct BindingDescriptorBuilder {
    inner: BindingDescriptor,
}

impl BindingDescriptorBuilder {
    /// Overrides the target property.
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.inner.property = property.into();
        self
    }

    /// Sets the column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.inner.column = Some(column.into());
        self
    }

    /// Sets the ordinal position.
    pub fn index(mut self, index: i64) -> Self {
        self.inner.index = index;
        self
    }

    /// Sets the direction.
    pub fn mode(mut self, mode: ParameterMode) -> Self {
        self.inner.mode = mode;
        self
    }

    /// Marks the descriptor as key-bearing.
    pub fn primary(mut self, primary: bool) -> Self {
        self.inner.primary = primary;
        self
    }

    /// Sets a fixed size.
    pub fn size(mut self, size: i64) -> Self {
        self.inner.size = size;
        self
    }

    /// Sets the store-native type.
    pub fn native_type(mut self, ty: NativeType) -> Self {
        self.inner.native_type = Some(ty);
        self
    }

    /// Sets the language-level type.
    pub fn value_type(mut self, ty: ValueType) -> Self {
        self.inner.value_type = Some(ty);
        self
    }

    /// Sets the encoding transform.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.inner.transforms.encoding = Some(encoding.into());
        self
    }

    /// Sets the textual pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.inner.transforms.pattern = Some(pattern.into());
        self
    }

    /// Configures symmetric decryption.
    pub fn cipher(
        mut self,
        cipher: impl Into<String>,
        key_hex: impl Into<String>,
        key_alg: Option<String>,
    ) -> Self {
        self.inner.transforms.cipher = Some(cipher.into());
        self.inner.transforms.cipher_key = Some(key_hex.into());
        self.inner.transforms.cipher_key_alg = key_alg;
        self
    }

    /// Replaces every transform at once.
    pub fn transforms(mut self, transforms: ValueTransforms) -> Self {
        self.inner.transforms = transforms;
        self
    }

    /// Sets the digest algorithm.
    pub fn digest(mut self, digest: impl Into<String>) -> Self {
        self.inner.transforms.digest = Some(digest.into());
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> BindingDescriptor {
        self.inner
    }
}
