//! Row codecs: turn a header plus one row of cell text into a caller-facing
//! value and back.
//!
//! [`DictCodec`] yields plain [`RowView`]s, [`SchemaCodec`] yields
//! schema-validated [`TypedRow`]s and [`RecordCodec`] goes one step further
//! into any serde type. The cursor, planner and reducer are written once
//! against [`RowDecoder`] / [`RowEncoder`].

use std::collections::BTreeMap;
use std::marker::PhantomData;

use regex::Regex;
use rowport_schema::{FieldSpec, FieldValue, RowSchema, ValueType};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::RangeError;

/// Decodes one data row against the range header.
pub trait RowDecoder {
    type Item;

    /// `row_number` is the 1-based sheet row the cells came from.
    fn decode(
        &self,
        header: &[String],
        row: &[String],
        row_number: u32,
    ) -> Result<Self::Item, RangeError>;
}

/// Encodes a decoded item back into cells aligned with the header.
pub trait RowEncoder: RowDecoder {
    /// Output has exactly `header.len()` cells.
    fn encode(
        &self,
        item: &Self::Item,
        header: &[String],
        row_number: u32,
    ) -> Result<Vec<String>, RangeError>;
}

impl<D: RowDecoder + ?Sized> RowDecoder for &D {
    type Item = D::Item;

    fn decode(
        &self,
        header: &[String],
        row: &[String],
        row_number: u32,
    ) -> Result<Self::Item, RangeError> {
        (**self).decode(header, row, row_number)
    }
}

impl<E: RowEncoder + ?Sized> RowEncoder for &E {
    fn encode(
        &self,
        item: &Self::Item,
        header: &[String],
        row_number: u32,
    ) -> Result<Vec<String>, RangeError> {
        (**self).encode(item, header, row_number)
    }
}

/// Split a fetched grid into header and data rows.
///
/// Zero rows is an [`RangeError::EmptyRange`]; a lone header yields no data.
pub fn split_header<'g>(
    grid: &'g [Vec<String>],
    span: &str,
) -> Result<(&'g [String], &'g [Vec<String>]), RangeError> {
    match grid.split_first() {
        Some((header, rows)) => Ok((header.as_slice(), rows)),
        None => Err(RangeError::EmptyRange {
            span: span.to_string(),
        }),
    }
}

/// A row with no cells, or only empty cells, ends every traversal.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

/// Ordered column to cell mapping for one row.
///
/// A column whose cell was absent from a short row maps to `None` (missing),
/// which is distinct from `Some("")`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowView {
    cells: Vec<(String, Option<String>)>,
}

impl RowView {
    /// Pair header columns with row cells positionally.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let cells = header
            .iter()
            .enumerate()
            .map(|(i, column)| (column.clone(), row.get(i).cloned()))
            .collect();
        Self { cells }
    }

    /// Cell text for `column`; `None` when the column is unknown or missing.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether `column` is in the header but had no cell in this row.
    pub fn is_missing(&self, column: &str) -> bool {
        self.cells.iter().any(|(c, v)| c == column && v.is_none())
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.cells.iter().any(|(c, _)| c == column)
    }

    /// Set a cell, appending the column when it is new. Returns the old value.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| c == column) {
            Some((_, slot)) => slot.replace(value),
            None => {
                self.cells.push((column.to_string(), Some(value)));
                None
            }
        }
    }

    /// Mark a cell missing; it encodes as an empty cell.
    pub fn clear(&mut self, column: &str) -> Option<String> {
        self.cells
            .iter_mut()
            .find(|(c, _)| c == column)
            .and_then(|(_, slot)| slot.take())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Decoder for untyped rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct DictCodec;

impl RowDecoder for DictCodec {
    type Item = RowView;

    fn decode(&self, header: &[String], row: &[String], _row_number: u32) -> Result<RowView, RangeError> {
        Ok(RowView::from_row(header, row))
    }
}

impl RowEncoder for DictCodec {
    fn encode(
        &self,
        item: &RowView,
        header: &[String],
        _row_number: u32,
    ) -> Result<Vec<String>, RangeError> {
        Ok(header
            .iter()
            .map(|column| item.get(column).unwrap_or_default().to_string())
            .collect())
    }
}

/// A row decoded through a [`RowSchema`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypedRow {
    row: u32,
    fields: BTreeMap<String, FieldValue>,
    extras: BTreeMap<String, String>,
}

impl TypedRow {
    pub fn new(row: u32) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    /// 1-based sheet row this record was read from.
    pub fn row_number(&self) -> u32 {
        self.row
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Replace a field value. Names outside the schema are ignored on encode.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.to_string(), value.into())
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Cells of columns no field claimed; empty unless the schema is permissive.
    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }

    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extras.get(column).map(String::as_str)
    }

    pub fn set_extra(&mut self, column: &str, value: impl Into<String>) -> Option<String> {
        self.extras.insert(column.to_string(), value.into())
    }

    /// JSON object of fields followed by extras (extras never shadow fields).
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::new();
        for (column, text) in &self.extras {
            map.insert(column.clone(), JsonValue::String(text.clone()));
        }
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

#[derive(Clone, Debug)]
struct CompiledField {
    name: String,
    value_type: ValueType,
    required: bool,
    default: Option<FieldValue>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
    allowed: Option<Vec<FieldValue>>,
}

impl CompiledField {
    /// Only called on validated specs, so defaults, enums and patterns compile.
    fn compile(spec: &FieldSpec) -> Result<Self, RangeError> {
        let coerce_err = |err: rowport_schema::CoerceError| RangeError::field(&spec.name, 0, err.to_string());
        let default = spec
            .default
            .as_ref()
            .map(|v| FieldValue::from_json(spec.value_type, v))
            .transpose()
            .map_err(coerce_err)?;
        let constraints = spec.constraints.clone().unwrap_or_default();
        let pattern = constraints
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|err| RangeError::field(&spec.name, 0, err.to_string()))?;
        let allowed = constraints
            .r#enum
            .as_ref()
            .map(|values| {
                values
                    .iter()
                    .map(|v| FieldValue::from_json(spec.value_type, v))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(coerce_err)?;
        Ok(Self {
            name: spec.name.clone(),
            value_type: spec.value_type,
            required: spec.required,
            default,
            min: constraints.min,
            max: constraints.max,
            pattern,
            allowed,
        })
    }

    fn check(&self, value: &FieldValue) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min
                && n < min
            {
                return Err(format!("value {value} is below the minimum {min}"));
            }
            if let Some(max) = self.max
                && n > max
            {
                return Err(format!("value {value} is above the maximum {max}"));
            }
        }
        if let Some(pattern) = &self.pattern {
            let text = value.to_string();
            if !pattern.is_match(&text) {
                return Err(format!("`{text}` does not match pattern `{}`", pattern.as_str()));
            }
        }
        if let Some(allowed) = &self.allowed
            && !allowed.contains(value)
        {
            return Err(format!("`{value}` is not one of the allowed values"));
        }
        Ok(())
    }

    fn resolve(&self, raw: Option<&str>, row: u32) -> Result<FieldValue, RangeError> {
        let value = match raw.filter(|text| !text.is_empty()) {
            Some(text) => FieldValue::parse(self.value_type, text)
                .map_err(|err| RangeError::field(&self.name, row, err.to_string()))?,
            None => match &self.default {
                Some(default) => default.clone(),
                None if !self.required => FieldValue::Empty,
                None => return Err(RangeError::field(&self.name, row, "required value is missing")),
            },
        };
        self.check(&value)
            .map_err(|reason| RangeError::field(&self.name, row, reason))?;
        Ok(value)
    }
}

/// A [`RowSchema`] validated and compiled once, then applied to every row.
///
/// Header resolution per field: a column equal to the alias, otherwise a
/// column equal to the field name. Columns no field claims are kept as
/// extras when the schema is permissive and dropped otherwise.
#[derive(Clone, Debug)]
pub struct SchemaCodec {
    schema: RowSchema,
    fields: Vec<CompiledField>,
    by_alias: FxHashMap<String, usize>,
    by_name: FxHashMap<String, usize>,
}

impl SchemaCodec {
    pub fn new(schema: RowSchema) -> Result<Self, RangeError> {
        schema.validate()?;
        let fields = schema
            .fields
            .iter()
            .map(CompiledField::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let by_alias = schema
            .fields
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.alias.clone().map(|alias| (alias, i)))
            .collect();
        let by_name = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Ok(Self {
            schema,
            fields,
            by_alias,
            by_name,
        })
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Field a header column writes back from: alias match, then name match.
    fn field_for_column(&self, column: &str) -> Option<usize> {
        self.by_alias
            .get(column)
            .or_else(|| self.by_name.get(column))
            .copied()
    }

    /// Column index each field reads from, in field order.
    fn columns_for(&self, header: &[String]) -> Vec<Option<usize>> {
        let mut alias_cols = vec![None; self.fields.len()];
        let mut name_cols = vec![None; self.fields.len()];
        for (col, column) in header.iter().enumerate() {
            if let Some(&f) = self.by_alias.get(column.as_str()) {
                alias_cols[f].get_or_insert(col);
            }
            if let Some(&f) = self.by_name.get(column.as_str()) {
                name_cols[f].get_or_insert(col);
            }
        }
        alias_cols
            .into_iter()
            .zip(name_cols)
            .map(|(alias, name)| alias.or(name))
            .collect()
    }
}

impl RowDecoder for SchemaCodec {
    type Item = TypedRow;

    fn decode(&self, header: &[String], row: &[String], row_number: u32) -> Result<TypedRow, RangeError> {
        let columns = self.columns_for(header);
        let mut typed = TypedRow::new(row_number);
        for (field, col) in self.fields.iter().zip(&columns) {
            let raw = col.and_then(|c| row.get(c)).map(String::as_str);
            let value = field.resolve(raw, row_number)?;
            typed.fields.insert(field.name.clone(), value);
        }
        if self.schema.permissive {
            for (col, column) in header.iter().enumerate() {
                if columns.contains(&Some(col)) {
                    continue;
                }
                if let Some(cell) = row.get(col) {
                    typed.extras.insert(column.clone(), cell.clone());
                }
            }
        }
        Ok(typed)
    }
}

impl RowEncoder for SchemaCodec {
    fn encode(
        &self,
        item: &TypedRow,
        header: &[String],
        _row_number: u32,
    ) -> Result<Vec<String>, RangeError> {
        Ok(header
            .iter()
            .map(|column| match self.field_for_column(column) {
                Some(f) => item
                    .get(&self.fields[f].name)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                None if self.schema.permissive => {
                    item.extra(column).unwrap_or_default().to_string()
                }
                None => String::new(),
            })
            .collect())
    }
}

/// Schema-validated rows deserialized into `T`.
///
/// Decoding runs the [`SchemaCodec`] first, then builds `T` from the JSON
/// object of fields and extras, so permissive extras reach a
/// `#[serde(flatten)]` map on `T`.
pub struct RecordCodec<T> {
    schema: SchemaCodec,
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordCodec<T> {
    pub fn new(schema: RowSchema) -> Result<Self, RangeError> {
        Ok(Self::from_codec(SchemaCodec::new(schema)?))
    }

    pub fn from_codec(schema: SchemaCodec) -> Self {
        Self {
            schema,
            _record: PhantomData,
        }
    }

    pub fn schema(&self) -> &RowSchema {
        self.schema.schema()
    }
}

impl<T> Clone for RecordCodec<T> {
    fn clone(&self) -> Self {
        Self::from_codec(self.schema.clone())
    }
}

impl<T: DeserializeOwned> RowDecoder for RecordCodec<T> {
    type Item = T;

    fn decode(&self, header: &[String], row: &[String], row_number: u32) -> Result<T, RangeError> {
        let typed = self.schema.decode(header, row, row_number)?;
        serde_json::from_value(typed.to_json()).map_err(|source| RangeError::Record {
            row: row_number,
            source,
        })
    }
}

impl<T: Serialize + DeserializeOwned> RowEncoder for RecordCodec<T> {
    fn encode(&self, item: &T, header: &[String], row_number: u32) -> Result<Vec<String>, RangeError> {
        let record_err = |source| RangeError::Record {
            row: row_number,
            source,
        };
        let value = serde_json::to_value(item).map_err(record_err)?;
        let JsonValue::Object(mut map) = value else {
            return Err(record_err(serde::ser::Error::custom(
                "record must serialize to a map",
            )));
        };

        let mut typed = TypedRow::new(row_number);
        for field in &self.schema.fields {
            let value = match map.remove(&field.name) {
                Some(v) => FieldValue::from_json(field.value_type, &v)
                    .map_err(|err| RangeError::field(&field.name, row_number, err.to_string()))?,
                None => FieldValue::Empty,
            };
            typed.fields.insert(field.name.clone(), value);
        }
        if self.schema.schema.permissive {
            for (column, value) in map {
                let text = match value {
                    JsonValue::Null => String::new(),
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                };
                typed.extras.insert(column, text);
            }
        }
        self.schema.encode(&typed, header, row_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowport_schema::Constraints;
    use serde::Deserialize;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn employee_schema() -> RowSchema {
        RowSchema::new("employee")
            .field(FieldSpec::new("name", ValueType::String))
            .field(FieldSpec::new("email", ValueType::String).alias("Email Address"))
            .field(FieldSpec::new("age", ValueType::Integer).optional())
    }

    #[test]
    fn row_view_marks_missing_cells() {
        let view = RowView::from_row(&header(&["a", "b", "c"]), &header(&["1", ""]));
        assert_eq!(view.get("a"), Some("1"));
        assert_eq!(view.get("b"), Some(""));
        assert_eq!(view.get("c"), None);
        assert!(view.is_missing("c"));
        assert!(!view.is_missing("b"));
        assert_eq!(view.columns().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn row_view_ignores_cells_beyond_header() {
        let view = RowView::from_row(&header(&["a"]), &header(&["1", "2"]));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn dict_encode_follows_header_order() {
        let mut view = RowView::from_row(&header(&["a", "b"]), &header(&["1"]));
        view.set("b", "x");
        view.set("z", "ignored");
        let cells = DictCodec.encode(&view, &header(&["b", "a", "c"]), 2).unwrap();
        assert_eq!(cells, vec!["x", "1", ""]);
    }

    #[test]
    fn alias_wins_over_field_name() {
        let codec = SchemaCodec::new(employee_schema()).unwrap();
        let hdr = header(&["name", "email", "Email Address"]);
        let typed = codec
            .decode(&hdr, &header(&["Ann", "wrong@x", "right@x"]), 2)
            .unwrap();
        assert_eq!(typed.get("email"), Some(&FieldValue::Text("right@x".into())));
        assert_eq!(typed.get("age"), Some(&FieldValue::Empty));
    }

    #[test]
    fn falls_back_to_field_name_without_alias_column() {
        let codec = SchemaCodec::new(employee_schema()).unwrap();
        let typed = codec
            .decode(&header(&["name", "email"]), &header(&["Ann", "a@x"]), 2)
            .unwrap();
        assert_eq!(typed.get("email"), Some(&FieldValue::Text("a@x".into())));
    }

    #[test]
    fn missing_required_value_is_reported_with_row() {
        let codec = SchemaCodec::new(employee_schema()).unwrap();
        let err = codec
            .decode(&header(&["name", "Email Address"]), &header(&["Ann"]), 7)
            .unwrap_err();
        match err {
            RangeError::FieldValidation { field, row, .. } => {
                assert_eq!(field, "email");
                assert_eq!(row, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_fills_empty_and_missing_cells() {
        let schema = RowSchema::new("s")
            .field(FieldSpec::new("qty", ValueType::Integer).default_value(1))
            .field(FieldSpec::new("note", ValueType::String).optional().default_value("n/a"));
        let codec = SchemaCodec::new(schema).unwrap();
        let typed = codec.decode(&header(&["qty", "note"]), &header(&[""]), 2).unwrap();
        assert_eq!(typed.get("qty"), Some(&FieldValue::Int(1)));
        assert_eq!(typed.get("note"), Some(&FieldValue::Text("n/a".into())));
    }

    #[test]
    fn constraints_are_enforced() {
        let schema = RowSchema::new("s")
            .field(FieldSpec::new("score", ValueType::Number).constraints(Constraints {
                min: Some(0.0),
                max: Some(100.0),
                ..Constraints::default()
            }))
            .field(FieldSpec::new("code", ValueType::String).constraints(Constraints {
                pattern: Some("^[A-Z]{2}-\\d{3}$".into()),
                ..Constraints::default()
            }))
            .field(FieldSpec::new("tier", ValueType::String).optional().constraints(Constraints {
                r#enum: Some(vec!["gold".into(), "silver".into()]),
                ..Constraints::default()
            }));
        let codec = SchemaCodec::new(schema).unwrap();
        let hdr = header(&["score", "code", "tier"]);

        assert!(codec.decode(&hdr, &header(&["50", "AB-123", "gold"]), 2).is_ok());
        assert!(codec.decode(&hdr, &header(&["50", "AB-123"]), 2).is_ok());
        for bad in [
            header(&["101", "AB-123"]),
            header(&["-1", "AB-123"]),
            header(&["50", "ab-123"]),
            header(&["50", "AB-123", "bronze"]),
        ] {
            assert!(matches!(
                codec.decode(&hdr, &bad, 2),
                Err(RangeError::FieldValidation { .. })
            ));
        }
    }

    #[test]
    fn permissive_schema_keeps_extras() {
        let codec = SchemaCodec::new(employee_schema().permissive(true)).unwrap();
        let hdr = header(&["name", "Email Address", "team", "desk"]);
        let typed = codec
            .decode(&hdr, &header(&["Ann", "a@x", "infra"]), 2)
            .unwrap();
        assert_eq!(typed.extra("team"), Some("infra"));
        assert_eq!(typed.extra("desk"), None);

        let strict = SchemaCodec::new(employee_schema()).unwrap();
        let typed = strict.decode(&hdr, &header(&["Ann", "a@x", "infra"]), 2).unwrap();
        assert!(typed.extras().is_empty());
    }

    #[test]
    fn encode_resolves_alias_then_name_then_extras() {
        let codec = SchemaCodec::new(employee_schema().permissive(true)).unwrap();
        let hdr = header(&["Email Address", "name", "age", "team", "unknown"]);
        let mut typed = codec
            .decode(&hdr, &header(&["a@x", "Ann", "30", "infra"]), 2)
            .unwrap();
        typed.set("age", 31i64);
        assert_eq!(
            codec.encode(&typed, &hdr, 2).unwrap(),
            vec!["a@x", "Ann", "31", "infra", ""]
        );
    }

    #[test]
    fn invalid_schema_is_rejected_at_bind_time() {
        let schema = RowSchema::new("s")
            .field(FieldSpec::new("a", ValueType::String))
            .field(FieldSpec::new("a", ValueType::String));
        assert!(matches!(SchemaCodec::new(schema), Err(RangeError::Schema(_))));
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Employee {
        name: String,
        email: String,
        age: Option<i64>,
    }

    #[test]
    fn record_codec_round_trips_through_serde() {
        let codec = RecordCodec::<Employee>::new(employee_schema()).unwrap();
        let hdr = header(&["name", "Email Address", "age"]);
        let employee = codec.decode(&hdr, &header(&["Ann", "a@x", ""]), 2).unwrap();
        assert_eq!(
            employee,
            Employee {
                name: "Ann".into(),
                email: "a@x".into(),
                age: None
            }
        );
        let cells = codec.encode(&employee, &hdr, 2).unwrap();
        assert_eq!(cells, vec!["Ann", "a@x", ""]);
    }

    #[test]
    fn record_type_mismatch_is_a_record_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrong {
            name: i64,
        }
        let codec = RecordCodec::<Wrong>::new(employee_schema()).unwrap();
        let hdr = header(&["name", "Email Address"]);
        let err = codec.decode(&hdr, &header(&["Ann", "a@x"]), 4).unwrap_err();
        assert!(matches!(err, RangeError::Record { row: 4, .. }));
    }
}
