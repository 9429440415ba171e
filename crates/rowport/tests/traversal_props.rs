use proptest::prelude::*;
use rowport::{MemoryStore, RawGrid, Spreadsheet};
use rowport_testkit::RecordingStore;

fn cell() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,6}"
}

fn header(width: usize) -> Vec<String> {
    (0..width).map(|i| format!("col{i}")).collect()
}

/// Header of `width` distinct columns plus up to `max_rows` rows with no blank cells.
fn dense_grid(max_rows: usize) -> impl Strategy<Value = RawGrid> {
    (1usize..=5).prop_flat_map(move |width| {
        proptest::collection::vec(proptest::collection::vec(cell(), width), 0..=max_rows).prop_map(
            move |mut rows| {
                rows.insert(0, header(width));
                rows
            },
        )
    })
}

fn sheet(rows: RawGrid) -> Spreadsheet<RecordingStore<MemoryStore>> {
    Spreadsheet::new(RecordingStore::new(MemoryStore::new().with_sheet("Data", rows)))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_dense_row_is_yielded_in_order(grid in dense_grid(12)) {
        let expected = grid.len() - 1;
        let sheet = sheet(grid.clone());
        let rows = sheet
            .range("Data!A:E")
            .iter()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        prop_assert_eq!(rows.len(), expected);
        for (view, raw) in rows.iter().zip(&grid[1..]) {
            let cells: Vec<&str> = view.iter().map(|(_, v)| v.unwrap_or_default()).collect();
            prop_assert_eq!(cells, raw.iter().map(String::as_str).collect::<Vec<_>>());
        }
        prop_assert_eq!(sheet.store().read_count(), 1);
    }

    #[test]
    fn blank_row_truncates_traversal(grid in dense_grid(10), cut in 0usize..10, width in 0usize..4) {
        let data_rows = grid.len() - 1;
        let cut = cut.min(data_rows);
        let mut rows = grid;
        rows.insert(cut + 1, vec![String::new(); width]);
        let sheet = sheet(rows);
        let count = sheet.range("Data!A:E").reduce(0usize, |n, _| n + 1).unwrap();
        prop_assert_eq!(count, cut);
    }

    #[test]
    fn untouched_rows_are_never_written(grid in dense_grid(10)) {
        let sheet = sheet(grid.clone());
        let report = sheet.range("Data!A:E").map(|_| None).unwrap();
        prop_assert_eq!(report.rows_scanned, grid.len() - 1);
        prop_assert_eq!(report.rows_updated, 0);
        prop_assert_eq!(sheet.store().write_count(), 0);
        prop_assert_eq!(sheet.store().inner().rows("Data").unwrap(), grid);
    }

    #[test]
    fn identity_map_rewrites_rows_unchanged(grid in dense_grid(10)) {
        let sheet = sheet(grid.clone());
        let report = sheet.range("Data!A:E").map(Some).unwrap();
        prop_assert_eq!(report.rows_updated, grid.len() - 1);
        prop_assert!(sheet.store().write_count() <= 1);
        prop_assert_eq!(sheet.store().inner().rows("Data").unwrap(), grid);
    }

    #[test]
    fn header_only_range_yields_nothing(width in 1usize..=5) {
        let sheet = sheet(vec![header(width)]);
        prop_assert_eq!(sheet.range("Data!A:E").iter().unwrap().count(), 0);
        let report = sheet.range("Data!A:E").map(Some).unwrap();
        prop_assert_eq!(report.rows_updated, 0);
        prop_assert_eq!(sheet.store().write_count(), 0);
    }
}
