//! Per-bin selected-row counts, the numbers each chart actually paints.
//!
//! Counts for bins with at most `sampling_threshold` rows are exact. Larger bins are estimated
//! from a fixed-stride sample of `sampling_threshold` member rows:
//! `round(selected_in_sample / sample_len * bin_len)`, so a full column refresh costs at most
//! `O(num_bins * sampling_threshold)`. The sample positions depend only on the bin, which makes
//! estimates deterministic for a given mask.

use crate::bins::{BinIndex, BinLabel, BinSet};
use crate::filter::FilterEngine;
use crate::mask::SelectionMask;
use crossfilter_columnar::{BitVec, ColumnId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedBinCounts {
    pub column: String,
    pub mask_version: u64,
    pub labels: Arc<[BinLabel]>,
    /// Selected rows per bin, parallel to `labels`.
    pub counts: Vec<u64>,
    /// All rows per bin, regardless of selection.
    pub totals: Vec<u64>,
    /// `true` where the count was extrapolated from a sample.
    pub estimated: Vec<bool>,
}

impl AggregatedBinCounts {
    pub fn selected_total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_exact(&self) -> bool {
        !self.estimated.iter().any(|e| *e)
    }
}

pub struct AggregationView {
    engine: Arc<FilterEngine>,
    bins: Arc<BinIndex>,
    sampling_threshold: usize,
    cache: Mutex<HashMap<ColumnId, Arc<AggregatedBinCounts>>>,
}

impl AggregationView {
    pub fn new(engine: Arc<FilterEngine>, bins: Arc<BinIndex>) -> Self {
        let sampling_threshold = engine.options().sampling_threshold;
        Self {
            engine,
            bins,
            sampling_threshold,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Counts for `column` against the last published mask, memoised until the mask changes.
    pub fn counts_for(&self, column: ColumnId) -> Arc<AggregatedBinCounts> {
        let mask = self.engine.mask();
        if let Some(hit) = self
            .cache
            .lock()
            .expect("aggregation cache poisoned")
            .get(&column)
        {
            if hit.mask_version == mask.version() {
                return hit.clone();
            }
        }

        let counts = Arc::new(self.aggregate(column, &mask, self.sampling_threshold));
        self.cache
            .lock()
            .expect("aggregation cache poisoned")
            .insert(column, counts.clone());
        counts
    }

    /// Exact counts for `column`, never sampled and never cached.
    pub fn exact_counts_for(&self, column: ColumnId) -> AggregatedBinCounts {
        let mask = self.engine.mask();
        self.aggregate(column, &mask, usize::MAX)
    }

    fn aggregate(
        &self,
        column: ColumnId,
        mask: &SelectionMask,
        threshold: usize,
    ) -> AggregatedBinCounts {
        let _state = self.engine.enter_aggregating();
        let set = self.bins.get(column);
        let totals = set.totals();
        let bins = set.len();

        let (counts, estimated) = if mask.is_all_selected() {
            (totals.clone(), vec![false; bins])
        } else if mask.is_none_selected() {
            (vec![0; bins], vec![false; bins])
        } else {
            count_bins(set, mask.bits(), threshold)
        };

        AggregatedBinCounts {
            column: self.engine.store().column(column).name().to_string(),
            mask_version: mask.version(),
            labels: set.labels().clone(),
            counts,
            totals,
            estimated,
        }
    }
}

fn count_bins(set: &BinSet, mask: &BitVec, threshold: usize) -> (Vec<u64>, Vec<bool>) {
    let mut counts = Vec::with_capacity(set.len());
    let mut estimated = Vec::with_capacity(set.len());
    for bin in 0..set.len() {
        let (count, sampled) = count_bin(set.bin_rows(bin), mask, threshold);
        counts.push(count);
        estimated.push(sampled);
    }
    (counts, estimated)
}

/// Selected rows among `rows`, exact up to `threshold` rows and stride-sampled above it.
pub(crate) fn count_bin(rows: &[u32], mask: &BitVec, threshold: usize) -> (u64, bool) {
    if rows.len() <= threshold {
        let hits = rows.iter().filter(|row| mask.get(**row as usize)).count();
        return (hits as u64, false);
    }

    let len = rows.len() as u64;
    let samples = threshold as u64;
    let mut hits = 0u64;
    for k in 0..samples {
        // `k * len` stays in u64 so 32-bit targets don't overflow on large bins.
        let row = rows[(k * len / samples) as usize];
        if mask.get(row as usize) {
            hits += 1;
        }
    }
    let estimate = (hits as f64 / samples as f64 * len as f64).round() as u64;
    (estimate, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_bins_are_counted_exactly() {
        let mut mask = BitVec::with_len_all_false(10);
        mask.set(2, true);
        mask.set(7, true);
        assert_eq!(count_bin(&[1, 2, 7, 9], &mask, 4), (2, false));
    }

    #[test]
    fn large_bins_extrapolate_from_stride_sample() {
        // Stride 3 over 12 rows samples rows 0, 3, 6, 9; two of them are selected.
        let mut mask = BitVec::with_len_all_false(12);
        for row in [0, 6] {
            mask.set(row, true);
        }
        let rows: Vec<u32> = (0..12).collect();
        assert_eq!(count_bin(&rows, &mask, 4), (6, true));
    }
}
