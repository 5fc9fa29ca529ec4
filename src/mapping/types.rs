#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SqlsetError};

/// Canonical language-level type a bound value or mapped property carries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    Bytes,
    Locale,
    Object,
    Map,
    List,
    Collection,
    Iterator,
    ResultSet,
    Array(Box<ValueType>),
}

impl ValueType {
    /// Textual types take the decrypt/encoding branch during row mapping.
    pub fn is_textual(&self) -> bool {
        matches!(self, ValueType::String)
    }

    /// Boolean types use the 1/0 convention during row mapping.
    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean)
    }

    /// Integral types (any width).
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ValueType::Byte | ValueType::Short | ValueType::Int | ValueType::Long
        )
    }

    /// Inclusive range accepted by an integral type.
    pub(crate) fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            ValueType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            ValueType::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            ValueType::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            ValueType::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Array(inner) => write!(f, "{inner}[]"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Store-native column type names as they appear in `jdbcType` attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Clob,
    NClob,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Boolean,
    Array,
    Cursor,
    Struct,
    Other,
    Null,
}

impl NativeType {
    /// Language type used for coercion when a descriptor declares no explicit one.
    pub fn default_value_type(self) -> ValueType {
        match self {
            NativeType::Bit | NativeType::Boolean => ValueType::Boolean,
            NativeType::TinyInt => ValueType::Byte,
            NativeType::SmallInt => ValueType::Short,
            NativeType::Integer => ValueType::Int,
            NativeType::BigInt => ValueType::Long,
            NativeType::Float | NativeType::Double => ValueType::Double,
            NativeType::Real => ValueType::Float,
            NativeType::Numeric | NativeType::Decimal => ValueType::Decimal,
            NativeType::Char
            | NativeType::VarChar
            | NativeType::LongVarChar
            | NativeType::NChar
            | NativeType::NVarChar
            | NativeType::LongNVarChar
            | NativeType::Clob
            | NativeType::NClob => ValueType::String,
            NativeType::Date | NativeType::Time | NativeType::Timestamp => ValueType::Date,
            NativeType::Binary
            | NativeType::VarBinary
            | NativeType::LongVarBinary
            | NativeType::Blob => ValueType::Bytes,
            NativeType::Array => ValueType::List,
            NativeType::Cursor => ValueType::ResultSet,
            NativeType::Struct | NativeType::Other | NativeType::Null => ValueType::Object,
        }
    }
}

impl FromStr for NativeType {
    type Err = SqlsetError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_ascii_uppercase().as_str() {
            "BIT" => NativeType::Bit,
            "TINYINT" => NativeType::TinyInt,
            "SMALLINT" => NativeType::SmallInt,
            "INTEGER" | "INT" => NativeType::Integer,
            "BIGINT" => NativeType::BigInt,
            "FLOAT" => NativeType::Float,
            "REAL" => NativeType::Real,
            "DOUBLE" => NativeType::Double,
            "NUMERIC" => NativeType::Numeric,
            "DECIMAL" => NativeType::Decimal,
            "CHAR" => NativeType::Char,
            "VARCHAR" => NativeType::VarChar,
            "LONGVARCHAR" => NativeType::LongVarChar,
            "NCHAR" => NativeType::NChar,
            "NVARCHAR" => NativeType::NVarChar,
            "LONGNVARCHAR" => NativeType::LongNVarChar,
            "CLOB" => NativeType::Clob,
            "NCLOB" => NativeType::NClob,
            "DATE" => NativeType::Date,
            "TIME" => NativeType::Time,
            "TIMESTAMP" => NativeType::Timestamp,
            "BINARY" => NativeType::Binary,
            "VARBINARY" => NativeType::VarBinary,
            "LONGVARBINARY" => NativeType::LongVarBinary,
            "BLOB" => NativeType::Blob,
            "BOOLEAN" => NativeType::Boolean,
            "ARRAY" => NativeType::Array,
            "CURSOR" => NativeType::Cursor,
            "STRUCT" => NativeType::Struct,
            "OTHER" => NativeType::Other,
            "NULL" => NativeType::Null,
            _ => return Err(SqlsetError::UnknownTypeAlias(s.to_owned())),
        };
        Ok(ty)
    }
}

/// Case-insensitive alias table resolving declared type names to [`ValueType`].
///
/// Primitive aliases carry a leading underscore (`_int`); the unprefixed form
/// names the nullable wrapper. Both resolve to the same canonical type here
/// because [`crate::Value`] is nullable everywhere.
#[derive(Clone, Debug)]
pub struct TypeAliasRegistry {
    aliases: HashMap<String, ValueType>,
}

impl Default for TypeAliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeAliasRegistry {
    /// Registry pre-populated with the built-in aliases.
    pub fn new() -> Self {
        let mut registry = Self {
            aliases: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        use ValueType as T;
        let scalars: [(&str, T); 11] = [
            ("byte", T::Byte),
            ("short", T::Short),
            ("int", T::Int),
            ("integer", T::Int),
            ("long", T::Long),
            ("float", T::Float),
            ("double", T::Double),
            ("boolean", T::Boolean),
            ("date", T::Date),
            ("decimal", T::Decimal),
            ("bigdecimal", T::Decimal),
        ];
        for (alias, ty) in scalars {
            let primitive = !matches!(ty, T::Date | T::Decimal);
            self.insert(alias, ty.clone());
            self.insert(&format!("{alias}[]"), T::Array(Box::new(ty.clone())));
            if primitive {
                self.insert(&format!("_{alias}"), ty.clone());
                self.insert(&format!("_{alias}[]"), T::Array(Box::new(ty)));
            }
        }
        // a primitive byte array is a binary payload, not a list of bytes
        self.insert("_byte[]", T::Bytes);
        self.insert("bytes", T::Bytes);
        self.insert("string", T::String);
        self.insert("object", T::Object);
        self.insert("object[]", T::Array(Box::new(T::Object)));
        self.insert("locale", T::Locale);
        self.insert("resultset", T::ResultSet);
        self.insert("map", T::Map);
        self.insert("hashmap", T::Map);
        self.insert("list", T::List);
        self.insert("arraylist", T::List);
        self.insert("collection", T::Collection);
        self.insert("iterator", T::Iterator);
    }

    fn insert(&mut self, alias: &str, ty: ValueType) {
        self.aliases.insert(alias.to_ascii_lowercase(), ty);
    }

    /// Registers an additional alias. Re-registering the same mapping is a no-op;
    /// rebinding an alias to a different type is rejected.
    pub fn register_alias(&mut self, alias: &str, ty: ValueType) -> Result<()> {
        let key = alias.to_ascii_lowercase();
        if let Some(existing) = self.aliases.get(&key) {
            if *existing != ty {
                return Err(SqlsetError::AliasConflict {
                    alias: alias.to_owned(),
                    existing: existing.to_string(),
                });
            }
            return Ok(());
        }
        self.aliases.insert(key, ty);
        Ok(())
    }

    /// Resolves a declared type name. Fully qualified names resolve by their
    /// final segment (`java.lang.String` and `String` are the same alias).
    pub fn resolve(&self, name: &str) -> Result<ValueType> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(ty) = self.aliases.get(&key) {
            return Ok(ty.clone());
        }
        if let Some((_, simple)) = key.rsplit_once('.') {
            if let Some(ty) = self.aliases.get(simple) {
                return Ok(ty.clone());
            }
        }
        Err(SqlsetError::UnknownTypeAlias(name.to_owned()))
    }
}
