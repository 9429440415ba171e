//! Declarative row schemas.
//!
//! A [`RowSchema`] names the fields a row decodes into, the column each field
//! reads from (its alias, else its own name), whether the field is required,
//! its default, and the [`ValueType`] its cell text is coerced to. Schemas are
//! plain data: build them in code or load them from YAML/JSON, then call
//! [`RowSchema::validate`] before use.

mod schema;
mod validation;
mod value;

pub use schema::{Constraints, FieldSpec, RowSchema, ValueType};
pub use validation::{SchemaIssue, ValidationError};
pub use value::{CoerceError, FieldValue};

/// JSON Schema describing the schema file format.
pub fn generate_schema_value() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(RowSchema))
        .expect("generated JSON schema must serialize")
}

/// Pretty-printed form of [`generate_schema_value`].
pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value())
        .expect("generated JSON schema must serialize")
}
