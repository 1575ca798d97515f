use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::TableReference;
use crate::builders::Unset;
use crate::builders::table_field_schema::TableFieldSchemaBuilder;
use crate::util;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table<S = Box<str>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<S>,
    pub table_reference: TableReference<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<Box<str>, S>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema<S>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub num_rows: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub num_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub ty: Option<TableType>,
}

impl<S> Table<S> {
    /// A table with only the parts needed for a `tables.insert` call.
    pub const fn new(table_reference: TableReference<S>, schema: Option<TableSchema<S>>) -> Self {
        Self {
            etag: None,
            id: None,
            self_link: None,
            table_reference,
            friendly_name: None,
            description: None,
            labels: None,
            schema,
            num_rows: None,
            num_bytes: None,
            location: None,
            ty: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    Table,
    View,
    External,
    MaterializedView,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema<S = Box<str>> {
    pub fields: Vec<TableFieldSchema<S>>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFieldSchema<S = Box<str>> {
    pub name: S,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableFieldSchema<S>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value_expression: Option<S>,
}

impl<S> TableFieldSchema<S> {
    pub const fn builder(name: S) -> TableFieldSchemaBuilder<S, Unset> {
        TableFieldSchemaBuilder::new(name)
    }

    pub const fn new(name: S, ty: FieldType, mode: FieldMode) -> Self {
        Self {
            name,
            ty,
            mode,
            fields: Vec::new(),
            max_length: None,
            description: None,
            default_value_expression: None,
        }
    }

    pub fn map_as_ref<T: ?Sized>(&self) -> TableFieldSchema<&T>
    where
        S: AsRef<T>,
    {
        self.map(&mut <S as AsRef<T>>::as_ref)
    }

    pub fn map<'a, T: 'a, F>(&'a self, map_fn: &mut F) -> TableFieldSchema<T>
    where
        F: FnMut(&'a S) -> T,
    {
        TableFieldSchema {
            name: map_fn(&self.name),
            ty: self.ty,
            mode: self.mode,
            fields: self.fields.iter().map(|field| field.map(map_fn)).collect(),
            description: self.description.as_ref().map(&mut *map_fn),
            max_length: self.max_length,
            default_value_expression: self.default_value_expression.as_ref().map(&mut *map_fn),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Repeated,
    Required,
}

impl FieldMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nullable => "NULLABLE",
            Self::Repeated => "REPEATED",
            Self::Required => "REQUIRED",
        }
    }
}

impl fmt::Display for FieldMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NULLABLE" => Ok(Self::Nullable),
            "REPEATED" => Ok(Self::Repeated),
            "REQUIRED" => Ok(Self::Required),
            _ => Err(UnknownVariant::new("field mode", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Bytes,
    #[serde(alias = "INT64")]
    Integer,
    #[serde(alias = "FLOAT64")]
    Float,
    #[serde(alias = "BOOLEAN")]
    Bool,
    Timestamp,
    Date,
    Time,
    DateTime,
    Geography,
    Numeric,
    BigNumeric,
    Json,
    #[serde(alias = "STRUCT")]
    Record,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Bool => "BOOL",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Geography => "GEOGRAPHY",
            Self::Numeric => "NUMERIC",
            Self::BigNumeric => "BIGNUMERIC",
            Self::Json => "JSON",
            Self::Record => "RECORD",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_uppercase().as_str() {
            "STRING" => Self::String,
            "BYTES" => Self::Bytes,
            "INTEGER" | "INT64" => Self::Integer,
            "FLOAT" | "FLOAT64" => Self::Float,
            "BOOL" | "BOOLEAN" => Self::Bool,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" => Self::DateTime,
            "GEOGRAPHY" => Self::Geography,
            "NUMERIC" => Self::Numeric,
            "BIGNUMERIC" => Self::BigNumeric,
            "JSON" => Self::Json,
            "RECORD" | "STRUCT" => Self::Record,
            _ => return Err(UnknownVariant::new("field type", s)),
        };

        Ok(ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: Box<str>,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
