use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bigquery_rs::resources::table::{FieldMode, FieldType, TableFieldSchema, TableSchema};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// An explicit, ordered table schema. Records are validated against it before they're sent,
/// and it's used as the schema for tables that need one declared up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<TableFieldSchema>,
}

impl Schema {
    /// Builds a schema from field definitions, rejecting empty schemas and duplicate names
    /// (at any nesting level).
    pub fn from_fields(fields: impl IntoIterator<Item = TableFieldSchema>) -> Result<Self, SchemaError> {
        let fields: Vec<_> = fields.into_iter().collect();

        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        check_unique(&fields, None)?;
        Ok(Self { fields })
    }

    /// Parses a comma separated list of 'name:TYPE[:MODE]' definitions, i.e
    /// 'name:STRING,age:INTEGER:REQUIRED'. Mode defaults to 'NULLABLE'.
    ///
    /// Nested 'RECORD' fields can't be expressed this way, use [`Schema::from_fields`] with
    /// [`TableFieldSchema::builder`] for those.
    pub fn parse(definition: &str) -> Result<Self, SchemaError> {
        let mut fields = Vec::new();

        for part in definition.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let invalid = || SchemaError::InvalidDefinition(part.into());

            let mut pieces = part.split(':').map(str::trim);

            let (Some(name), Some(ty)) = (pieces.next(), pieces.next()) else {
                return Err(invalid());
            };

            let mode = pieces
                .next()
                .map(str::parse::<FieldMode>)
                .transpose()?
                .unwrap_or_default();

            if name.is_empty() || pieces.next().is_some() {
                return Err(invalid());
            }

            let ty = ty.parse::<FieldType>()?;
            if ty == FieldType::Record {
                return Err(invalid());
            }

            fields.push(TableFieldSchema::new(Box::from(name), ty, mode));
        }

        Self::from_fields(fields)
    }

    #[inline]
    pub fn fields(&self) -> &[TableFieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&TableFieldSchema> {
        self.fields.iter().find(|field| &*field.name == name)
    }

    pub fn to_table_schema(&self) -> TableSchema {
        TableSchema {
            fields: self.fields.clone(),
        }
    }

    /// Checks a record against this schema: every field in the record has to be declared,
    /// values have to match the declared type and mode, and 'REQUIRED' fields have to be
    /// present. Declared fields that are absent (or null) are fine unless required.
    pub fn validate(&self, record: &Record) -> Result<(), SchemaError> {
        validate_object(&self.fields, &record.0, None)
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}:{}", field.name, field.ty, field.mode)?;
        }

        Ok(())
    }
}

fn check_unique(fields: &[TableFieldSchema], parent: Option<&str>) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(fields.len());

    for field in fields {
        let path = field_path(parent, &field.name);

        if !seen.insert(&*field.name) {
            return Err(SchemaError::DuplicateField(path));
        }

        if !field.fields.is_empty() {
            check_unique(&field.fields, Some(&path))?;
        }
    }

    Ok(())
}

fn field_path(parent: Option<&str>, name: &str) -> Box<str> {
    match parent {
        Some(parent) => format!("{parent}.{name}").into_boxed_str(),
        None => name.into(),
    }
}

fn validate_object(
    fields: &[TableFieldSchema],
    object: &Map<String, Value>,
    parent: Option<&str>,
) -> Result<(), SchemaError> {
    if let Some(unknown) = object
        .keys()
        .find(|key| !fields.iter().any(|field| &*field.name == key.as_str()))
    {
        return Err(SchemaError::UnknownField {
            field: field_path(parent, unknown),
        });
    }

    for field in fields {
        let path = field_path(parent, &field.name);

        match (object.get(&*field.name).filter(|value| !value.is_null()), field.mode) {
            (None, FieldMode::Required) => return Err(SchemaError::MissingRequired { field: path }),
            (None, _) => (),
            (Some(Value::Array(items)), FieldMode::Repeated) => {
                for item in items {
                    validate_value(field, item, &path)?;
                }
            }
            (Some(value), FieldMode::Repeated) => {
                return Err(SchemaError::TypeMismatch {
                    field: path,
                    expected: field.ty,
                    found: json_kind(value),
                });
            }
            (Some(value), _) => validate_value(field, value, &path)?,
        }
    }

    Ok(())
}

fn validate_value(field: &TableFieldSchema, value: &Value, path: &str) -> Result<(), SchemaError> {
    let matches = match field.ty {
        FieldType::String
        | FieldType::Bytes
        | FieldType::Date
        | FieldType::Time
        | FieldType::DateTime
        | FieldType::Geography => value.is_string(),
        // integers are also accepted as strings, since that's how BigQuery encodes int64s.
        FieldType::Integer => match value {
            Value::Number(num) => num.as_i64().is_some(),
            Value::String(s) => s.parse::<i64>().is_ok(),
            _ => false,
        },
        FieldType::Float => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        FieldType::Numeric | FieldType::BigNumeric => value.is_number() || value.is_string(),
        // either an RFC 3339 string or seconds since the epoch
        FieldType::Timestamp => value.is_string() || value.is_number(),
        FieldType::Bool => value.is_boolean(),
        FieldType::Json => true,
        FieldType::Record => match value {
            Value::Object(object) => return validate_object(&field.fields, object, Some(path)),
            _ => false,
        },
    };

    if matches {
        Ok(())
    } else {
        Err(SchemaError::TypeMismatch {
            field: path.into(),
            expected: field.ty,
            found: json_kind(value),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A single row: field names mapped to JSON values.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Converts any serializable value into a record. The value has to serialize as a map
    /// (i.e a struct with named fields).
    pub fn from_serialize<T>(value: &T) -> Result<Self, SchemaError>
    where
        T: serde::Serialize + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(SchemaError::NotAnObject {
                found: json_kind(&other),
            }),
            Err(error) => Err(SchemaError::Serialize(error.to_string().into_boxed_str())),
        }
    }

    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[inline]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
