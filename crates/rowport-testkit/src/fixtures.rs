use std::io::Write;

use rowport_store::RawGrid;
use tempfile::NamedTempFile;

/// Convert borrowed rows into an owned grid.
pub fn grid(rows: &[&[&str]]) -> RawGrid {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

/// Header plus three staff rows, then a blank row and a row that must never be read.
pub fn employees() -> RawGrid {
    grid(&[
        &["name", "Email Address", "age", "active"],
        &["Alice", "alice@example.com", "34", "TRUE"],
        &["Bob", "bob@example.com", "", "false"],
        &["Carol", "carol@example.com", "41"],
        &[],
        &["Hidden", "hidden@example.com", "99", "TRUE"],
    ])
}

/// Product catalogue with an aliased price column and an unmodelled `notes` column.
pub fn products() -> RawGrid {
    grid(&[
        &["sku", "Unit Price", "quantity", "notes"],
        &["W-1", "19.99", "100", "fragile"],
        &["W-2", "5", "", ""],
        &["W-3", "120.5", "7", "backorder"],
    ])
}

/// Write `contents` to a fresh temporary `.csv` file.
pub fn temp_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp csv");
    file.write_all(contents.as_bytes()).expect("write temp csv");
    file.flush().expect("flush temp csv");
    file
}
