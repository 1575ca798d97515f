use super::Unset;
use crate::table::{FieldMode, FieldType, TableFieldSchema};

#[derive(Debug, Clone, PartialEq)]
pub struct TableFieldSchemaBuilder<S, Ty> {
    name: S,
    ty: Ty,
    // optional fields
    fields: Vec<TableFieldSchema<S>>,
    max_length: Option<u64>,
    description: Option<S>,
    default_value_expression: Option<S>,
}

impl<S> TableFieldSchemaBuilder<S, Unset> {
    pub(crate) const fn new(name: S) -> Self {
        Self {
            name,
            ty: Unset,
            fields: Vec::new(),
            max_length: None,
            description: None,
            default_value_expression: None,
        }
    }
}

macro_rules! define_ty_builder_fn {
    ($($name:ident($ty_variant:ident)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(self) -> TableFieldSchemaBuilder<S, FieldType> {
                self.with_type(FieldType::$ty_variant)
            }
        )*
    };
}

impl<S, Ty> TableFieldSchemaBuilder<S, Ty> {
    pub fn description(mut self, description: S) -> Self {
        self.description = Some(description);
        self
    }

    pub fn max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn default_value_expression(mut self, expression: S) -> Self {
        self.default_value_expression = Some(expression);
        self
    }
}

impl<S> TableFieldSchemaBuilder<S, Unset> {
    fn with_type(self, ty: FieldType) -> TableFieldSchemaBuilder<S, FieldType> {
        TableFieldSchemaBuilder {
            name: self.name,
            ty,
            fields: self.fields,
            max_length: self.max_length,
            description: self.description,
            default_value_expression: self.default_value_expression,
        }
    }

    /// A nested 'RECORD' field, containing the given sub-fields.
    pub fn record(
        mut self,
        fields: impl IntoIterator<Item = TableFieldSchema<S>>,
    ) -> TableFieldSchemaBuilder<S, FieldType> {
        self.fields = fields.into_iter().collect();
        self.with_type(FieldType::Record)
    }

    define_ty_builder_fn! {
        string(String),
        bytes(Bytes),
        int(Integer),
        float(Float),
        numeric(Numeric),
        geography(Geography),
        json(Json),
        bool(Bool),
        timestamp(Timestamp),
        time(Time),
        date(Date),
        datetime(DateTime),
    }
}

macro_rules! define_mode_builder_fn {
    ($($name:ident($mode_variant:ident)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(self) -> TableFieldSchema<S> {
                self.build_with_mode(FieldMode::$mode_variant)
            }
        )*
    };
}

impl<S> TableFieldSchemaBuilder<S, FieldType> {
    fn build_with_mode(self, mode: FieldMode) -> TableFieldSchema<S> {
        TableFieldSchema {
            name: self.name,
            ty: self.ty,
            mode,
            fields: self.fields,
            max_length: self.max_length,
            description: self.description,
            default_value_expression: self.default_value_expression,
        }
    }

    define_mode_builder_fn! {
        required(Required),
        repeated(Repeated),
        nullable(Nullable),
    }
}
