#![no_main]

use libfuzzer_sys::fuzz_target;

use crossfilter_engine::{BinIndex, ColumnInput, ColumnStore};

/// Keep loads small; the interesting inputs are odd float bit patterns, not volume.
const MAX_ROWS: usize = 4_096;

fuzz_target!(|data: &[u8]| {
    let Some((&bins, rest)) = data.split_first() else {
        return;
    };
    let num_bins = bins as usize % 64 + 1;

    let values: Vec<f64> = rest
        .chunks_exact(8)
        .take(MAX_ROWS)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();
    let codes: Vec<Option<u32>> = values
        .iter()
        .map(|v| {
            let bits = v.to_bits();
            (bits & 1 == 0).then_some((bits >> 1) as u32 % 5)
        })
        .collect();

    let store = ColumnStore::load(vec![
        ColumnInput::continuous("linear", values.clone()),
        ColumnInput::angular("circular", values),
        ColumnInput::categorical("category", codes, vec!["a", "b", "c", "d", "e"]),
    ])
    .expect("equal-length columns with in-range codes always load");
    let index = BinIndex::build(&store, num_bins);

    let rows = store.row_count();
    for id in store.column_ids() {
        let set = index.get(id);
        let mut seen = vec![false; rows];
        for bin in 0..set.len() {
            for &row in set.bin_rows(bin) {
                assert!(!seen[row as usize], "row {row} binned twice");
                seen[row as usize] = true;
            }
        }
        for &row in set.missing() {
            assert!(!seen[row as usize], "missing row {row} also binned");
            seen[row as usize] = true;
        }
        assert!(seen.into_iter().all(|s| s), "some row was dropped");
    }
});
