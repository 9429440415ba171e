use rowport_store::{GridStore, MemoryStore, StoreError, UpdateInstruction};
use rowport_testkit::{employees, grid};

#[test]
fn worksheets_are_listed_in_insertion_order() -> Result<(), StoreError> {
    let store = MemoryStore::new()
        .with_sheet("Staff", employees())
        .with_sheet("Archive", Vec::new());
    let titles: Vec<String> = store
        .list_worksheets()?
        .into_iter()
        .map(|ws| ws.title)
        .collect();
    assert_eq!(titles, vec!["Staff", "Archive"]);

    let archive = store.worksheet_by_name("Archive")?;
    assert_eq!(archive.id, 1);
    assert!(matches!(
        store.worksheet_by_name("Missing"),
        Err(StoreError::WorksheetNotFound(name)) if name == "Missing"
    ));
    Ok(())
}

#[test]
fn read_keeps_interior_blank_rows() -> Result<(), StoreError> {
    let store = MemoryStore::new().with_sheet("Staff", employees());
    let ws = store.worksheet_by_name("Staff")?;
    let rows = store.read_cells(&ws, "A1:D10")?;
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[3], vec!["Carol", "carol@example.com", "41"]);
    assert!(rows[4].is_empty());
    Ok(())
}

#[test]
fn invalid_span_is_reported() -> Result<(), StoreError> {
    let store = MemoryStore::new().with_sheet("Staff", employees());
    let ws = store.worksheet_by_name("Staff")?;
    let err = store.read_cells(&ws, "not a span").unwrap_err();
    assert!(matches!(err, StoreError::InvalidSpan { .. }));
    Ok(())
}

#[test]
fn batch_write_is_all_or_nothing() -> Result<(), StoreError> {
    let store = MemoryStore::new().with_sheet("S", grid(&[&["a", "b"], &["1", "2"]]));
    let ws = store.worksheet_by_name("S")?;
    let updates = vec![
        UpdateInstruction::new("A2:B2", vec!["9".into(), "9".into()]),
        UpdateInstruction::new("bogus", vec!["x".into()]),
    ];
    assert!(store.batch_write(&ws, &updates).is_err());
    assert_eq!(store.rows("S").unwrap(), grid(&[&["a", "b"], &["1", "2"]]));

    store.batch_write(&ws, &updates[..1])?;
    assert_eq!(store.cell("S", 2, 1).as_deref(), Some("9"));
    assert_eq!(store.cell("S", 2, 2).as_deref(), Some("9"));
    Ok(())
}

#[test]
fn clear_empties_the_sheet() -> Result<(), StoreError> {
    let store = MemoryStore::new().with_sheet("Staff", employees());
    let ws = store.worksheet_by_name("Staff")?;
    store.clear(&ws)?;
    assert!(store.read_cells(&ws, "A:D")?.is_empty());
    Ok(())
}

#[test]
fn duplicate_sheet_titles_are_rejected() {
    let store = MemoryStore::new();
    store.add_sheet("Data").unwrap();
    assert!(matches!(
        store.add_sheet("Data"),
        Err(StoreError::Backend { .. })
    ));
}

#[test]
fn stale_handles_are_not_found() -> Result<(), StoreError> {
    let store = MemoryStore::new().with_sheet("Staff", employees());
    let mut ws = store.worksheet_by_name("Staff")?;
    ws.id = 42;
    assert!(matches!(
        store.read_cells(&ws, "A:D"),
        Err(StoreError::WorksheetNotFound(_))
    ));
    Ok(())
}

#[cfg(feature = "json")]
#[test]
fn json_snapshot_round_trips() -> Result<(), StoreError> {
    let json = r#"{"sheets": [{"name": "Inventory", "rows": [["sku", "qty"], ["A-1", "4"]]}]}"#;
    let store = MemoryStore::from_json_str(json)?;
    let ws = store.worksheet_by_name("Inventory")?;
    assert_eq!(store.read_cells(&ws, "A:B")?, grid(&[&["sku", "qty"], &["A-1", "4"]]));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("snapshot.json");
    store.save_path(&path)?;
    let reloaded = MemoryStore::open_path(&path)?;
    assert_eq!(reloaded.rows("Inventory"), store.rows("Inventory"));
    Ok(())
}
