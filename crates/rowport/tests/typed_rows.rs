use std::collections::BTreeMap;

use chrono::NaiveDate;
use rowport::{
    FieldSpec, FieldValue, MemoryStore, RangeError, RowDecoder, RowEncoder, RowSchema,
    SchemaCodec, Spreadsheet, ValueType,
};
use rowport_testkit::{RecordingStore, employees, grid, products};
use serde::{Deserialize, Serialize};

fn employee_schema() -> RowSchema {
    RowSchema::new("employee")
        .field(FieldSpec::new("name", ValueType::String))
        .field(FieldSpec::new("email", ValueType::String).alias("Email Address"))
        .field(FieldSpec::new("age", ValueType::Integer).optional())
        .field(FieldSpec::new("active", ValueType::Boolean).default_value(true))
}

fn product_schema() -> RowSchema {
    RowSchema::new("product")
        .permissive(true)
        .field(FieldSpec::new("sku", ValueType::String))
        .field(FieldSpec::new("price", ValueType::Number).alias("Unit Price"))
        .field(FieldSpec::new("quantity", ValueType::Integer).optional())
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Employee {
    name: String,
    email: String,
    age: Option<i64>,
    active: bool,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: Option<i64>,
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

#[test]
fn typed_iteration_applies_types_defaults_and_sentinel() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet("Staff", employees()));
    let rows = sheet
        .range("Staff!A:D")
        .iter_typed(&employee_schema())?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("age"), Some(&FieldValue::Int(34)));
    assert_eq!(rows[0].get("active"), Some(&FieldValue::Boolean(true)));
    assert_eq!(rows[1].get("age"), Some(&FieldValue::Empty));
    assert_eq!(rows[1].get("active"), Some(&FieldValue::Boolean(false)));
    // Carol's row has no `active` cell at all; the default applies.
    assert_eq!(rows[2].get("active"), Some(&FieldValue::Boolean(true)));
    assert_eq!(
        rows.iter().map(|r| r.row_number()).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    Ok(())
}

#[test]
fn records_deserialize_into_structs() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet("Staff", employees()));
    let staff: Vec<Employee> = sheet
        .range("Staff!A:D")
        .iter_as::<Employee>(&employee_schema())?
        .collect::<Result<_, _>>()?;
    assert_eq!(
        staff[1],
        Employee {
            name: "Bob".into(),
            email: "bob@example.com".into(),
            age: None,
            active: false,
        }
    );
    Ok(())
}

#[test]
fn alias_column_beats_same_named_column() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet(
        "S",
        grid(&[
            &["name", "email", "Email Address"],
            &["Ann", "stale@x", "fresh@x"],
        ]),
    ));
    let schema = RowSchema::new("s")
        .field(FieldSpec::new("name", ValueType::String))
        .field(FieldSpec::new("email", ValueType::String).alias("Email Address"));
    let emails = sheet.range("S!A:C").reduce_typed(&schema, Vec::new(), |mut acc, row| {
        acc.push(row.get("email").cloned());
        acc
    })?;
    assert_eq!(emails, vec![Some(FieldValue::Text("fresh@x".into()))]);
    Ok(())
}

#[test]
fn decoded_rows_reencode_byte_for_byte() -> Result<(), RangeError> {
    let schema = RowSchema::new("mixed")
        .field(FieldSpec::new("label", ValueType::String))
        .field(FieldSpec::new("price", ValueType::Number).alias("Unit Price"))
        .field(FieldSpec::new("count", ValueType::Integer))
        .field(FieldSpec::new("ok", ValueType::Boolean))
        .field(FieldSpec::new("due", ValueType::Date))
        .field(FieldSpec::new("seen", ValueType::Datetime));
    let header = grid(&[&["label", "Unit Price", "count", "ok", "due", "seen"]]).remove(0);
    let rows = grid(&[
        &["  spaced ", "19.99", "7", "TRUE", "2025-01-31", "2025-01-31 08:30:00"],
        &["x", "95", "-3", "FALSE", "2024-02-29", "2024-02-29 23:59:59"],
    ]);
    let codec = SchemaCodec::new(schema)?;
    for (i, row) in rows.iter().enumerate() {
        let n = i as u32 + 2;
        let typed = codec.decode(&header, row, n)?;
        let encoded = codec.encode(&typed, &header, n)?;
        assert_eq!(&encoded, row);
    }
    Ok(())
}

#[test]
fn failing_row_aborts_with_field_and_row() {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet(
        "S",
        grid(&[&["name", "Email Address", "age"], &["Ann", "a@x", "30"], &["Ben", "b@x", "old"], &["Cy", "c@x", "5"]]),
    ));
    let mut cursor = sheet.range("S!A:C").iter_typed(&employee_schema()).unwrap();
    assert!(cursor.next().unwrap().is_ok());
    match cursor.next().unwrap() {
        Err(RangeError::FieldValidation { field, row, reason }) => {
            assert_eq!(field, "age");
            assert_eq!(row, 3);
            assert!(reason.contains("expected integer"));
        }
        other => panic!("expected field validation error, got {other:?}"),
    }
    assert!(cursor.next().is_none());
}

#[test]
fn map_typed_writes_canonical_values() -> Result<(), RangeError> {
    let store = RecordingStore::new(MemoryStore::new().with_sheet("Staff", employees()));
    let sheet = Spreadsheet::new(store);
    let report = sheet.range("Staff!A:D").map_typed(&employee_schema(), |mut row| {
        let age = row.get("age")?.as_i64()?;
        row.set("age", age + 1);
        Some(row)
    })?;
    assert_eq!(report.rows_updated, 2);
    let writes = sheet.store().writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0][0].address, "A2:D2");
    assert_eq!(writes[0][0].values, grid(&[&["Alice", "alice@example.com", "35", "TRUE"]]));
    assert_eq!(writes[0][1].address, "A4:D4");
    assert_eq!(writes[0][1].values, grid(&[&["Carol", "carol@example.com", "42", "TRUE"]]));
    Ok(())
}

#[test]
fn permissive_extras_survive_map_as() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet("Catalog", products()));
    let report = sheet
        .range("Catalog!A:D")
        .map_as::<Product, _>(&product_schema(), |mut product| {
            product.price *= 2.0;
            Some(product)
        })?;
    assert_eq!(report.rows_updated, 3);
    assert_eq!(
        sheet.store().rows("Catalog").unwrap(),
        grid(&[
            &["sku", "Unit Price", "quantity", "notes"],
            &["W-1", "39.98", "100", "fragile"],
            &["W-2", "10", "", ""],
            &["W-3", "241", "7", "backorder"],
        ])
    );
    Ok(())
}

#[test]
fn strict_schema_blanks_unmodelled_columns_on_write() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet("Catalog", products()));
    let strict = product_schema().permissive(false);
    sheet.range("Catalog!A:D").map_typed(&strict, |row| {
        assert!(row.extras().is_empty());
        (row.row_number() == 2).then_some(row)
    })?;
    assert_eq!(sheet.store().cell("Catalog", 2, 4).as_deref(), Some(""));
    assert_eq!(sheet.store().cell("Catalog", 4, 4).as_deref(), Some("backorder"));
    Ok(())
}

#[test]
fn reduce_as_sums_typed_values() -> Result<(), RangeError> {
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet("Catalog", products()));
    let stock_value = sheet.range("Catalog!A:D").reduce_as::<Product, _, _>(
        &product_schema(),
        0.0,
        |acc, p| acc + p.price * p.quantity.unwrap_or(0) as f64,
    )?;
    assert!((stock_value - (1999.0 + 843.5)).abs() < 1e-9);
    Ok(())
}

#[test]
fn explicit_default_overrides_empty_optional_cell() -> Result<(), RangeError> {
    let schema = RowSchema::new("s")
        .field(FieldSpec::new("id", ValueType::Integer))
        .field(
            FieldSpec::new("due", ValueType::Date)
                .optional()
                .default_value("2025-12-31"),
        );
    let sheet = Spreadsheet::new(MemoryStore::new().with_sheet(
        "S",
        grid(&[&["id", "due"], &["1", ""], &["2", "2025-06-01"], &["3"]]),
    ));
    let dues = sheet.range("S!A:B").reduce_typed(&schema, Vec::new(), |mut acc, row| {
        acc.push(row.get("due").cloned());
        acc
    })?;
    let date = |s: &str| Some(FieldValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()));
    assert_eq!(dues, vec![date("2025-12-31"), date("2025-06-01"), date("2025-12-31")]);
    Ok(())
}

#[test]
fn invalid_schema_fails_before_reading() {
    let store = RecordingStore::new(MemoryStore::new().with_sheet("Staff", employees()));
    let sheet = Spreadsheet::new(store);
    let schema = employee_schema().field(FieldSpec::new("name", ValueType::String));
    let err = sheet.range("Staff!A:D").iter_typed(&schema).err().unwrap();
    assert!(matches!(err, RangeError::Schema(_)));
    assert_eq!(sheet.store().read_count(), 0);
}
