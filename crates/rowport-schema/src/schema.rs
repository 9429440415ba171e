use std::collections::{BTreeMap, HashSet};
use std::fmt;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::validation::{SchemaIssue, ValidationError};
use crate::value::FieldValue;

/// Declarative description of the rows below a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "Rowport Row Schema",
    description = "Fields a spreadsheet row decodes into, keyed by header column."
)]
#[serde(deny_unknown_fields)]
pub struct RowSchema {
    /// Human readable schema name.
    pub name: String,
    #[serde(default)]
    /// Keep header columns that match no field as extras instead of dropping them.
    pub permissive: bool,
    /// Ordered field definitions.
    pub fields: Vec<FieldSpec>,
}

/// One schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Field name used in decoded records.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Header text to read from instead of the field name.
    pub alias: Option<String>,
    #[serde(rename = "type")]
    /// Type the cell text is coerced to.
    pub value_type: ValueType,
    #[serde(default = "default_true")]
    /// Whether an absent value is an error (defaults to true).
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Value substituted when the column is missing or the cell is empty.
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Scalar value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Datetime => "datetime",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Number | ValueType::Integer)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints checked after a value is coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Minimum allowed numeric value.
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Maximum allowed numeric value.
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Enumerated set of allowed values.
    pub r#enum: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Regular expression the cell text must match.
    pub pattern: Option<String>,
}

impl RowSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissive: false,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Field whose name is `name`.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate the schema and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(SchemaIssue::new("name", "schema name must not be empty"));
        }

        let names: HashSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        let mut seen_names = HashSet::new();
        let mut seen_aliases: BTreeMap<&str, usize> = BTreeMap::new();

        for (idx, field) in self.fields.iter().enumerate() {
            let path = format!("fields[{idx}]");

            if field.name.is_empty() {
                issues.push(SchemaIssue::new(
                    format!("{path}.name"),
                    "field name must not be empty",
                ));
            } else if !seen_names.insert(field.name.as_str()) {
                issues.push(SchemaIssue::new(
                    format!("{path}.name"),
                    format!("duplicate field name `{}`", field.name),
                ));
            }

            if let Some(alias) = &field.alias {
                if alias.is_empty() {
                    issues.push(SchemaIssue::new(
                        format!("{path}.alias"),
                        "alias must not be empty",
                    ));
                } else {
                    if let Some(first) = seen_aliases.insert(alias.as_str(), idx) {
                        issues.push(SchemaIssue::new(
                            format!("{path}.alias"),
                            format!("alias `{alias}` already used by fields[{first}]"),
                        ));
                    }
                    if alias != &field.name && names.contains(alias.as_str()) {
                        issues.push(SchemaIssue::new(
                            format!("{path}.alias"),
                            format!("alias `{alias}` collides with another field's name"),
                        ));
                    }
                }
            }

            if let Some(constraints) = &field.constraints {
                validate_constraints(field, constraints, &path, &mut issues);
            }

            if let Some(default) = &field.default {
                match FieldValue::from_json(field.value_type, default) {
                    Ok(FieldValue::Empty) if field.required => issues.push(SchemaIssue::new(
                        format!("{path}.default"),
                        "required field cannot default to null",
                    )),
                    Ok(_) => {}
                    Err(err) => issues.push(SchemaIssue::new(
                        format!("{path}.default"),
                        format!("default does not match field type: {err}"),
                    )),
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

fn validate_constraints(
    field: &FieldSpec,
    constraints: &Constraints,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) {
    let has_bounds = constraints.min.is_some() || constraints.max.is_some();
    if has_bounds && !field.value_type.is_numeric() {
        issues.push(SchemaIssue::new(
            format!("{path}.constraints"),
            format!("min/max apply only to numeric fields, not {}", field.value_type),
        ));
    }
    if let (Some(min), Some(max)) = (constraints.min, constraints.max)
        && min > max
    {
        issues.push(SchemaIssue::new(
            format!("{path}.constraints"),
            format!("min ({min}) must not exceed max ({max})"),
        ));
    }
    if let Some(pattern) = &constraints.pattern
        && let Err(err) = Regex::new(pattern)
    {
        issues.push(SchemaIssue::new(
            format!("{path}.constraints.pattern"),
            format!("invalid regex: {err}"),
        ));
    }
    if let Some(values) = &constraints.r#enum {
        if values.is_empty() {
            issues.push(SchemaIssue::new(
                format!("{path}.constraints.enum"),
                "enum must list at least one value",
            ));
        }
        for (i, value) in values.iter().enumerate() {
            if let Err(err) = FieldValue::from_json(field.value_type, value) {
                issues.push(SchemaIssue::new(
                    format!("{path}.constraints.enum[{i}]"),
                    err.to_string(),
                ));
            }
        }
    }
}

impl FieldSpec {
    /// Required field with no alias, default or constraints.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            value_type,
            required: true,
            default: None,
            constraints: None,
            description: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Header text this field prefers: its alias when set, else its name.
    pub fn column(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl std::str::FromStr for RowSchema {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowSchema::from_yaml_str(s)
    }
}
