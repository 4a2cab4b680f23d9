//! Load-time bin indices.
//!
//! Every column is partitioned once into bins and the member row ids of each bin are cached in a
//! compressed-sparse-row layout: `rows[offsets[b]..offsets[b + 1]]` are the rows of bin `b`, in
//! ascending order. Filtering and aggregation afterwards only walk these lists and never rescan
//! raw values to find bin membership.
//!
//! Rows whose value is missing are kept out of every bin and recorded in [`BinSet::missing`], so
//! `sum(bin_len) + missing().len() == row_count` holds for every column.

use crossfilter_columnar::{CategoryOrder, Column, ColumnId, ColumnKind, ColumnStore, MISSING_CODE};
use std::sync::Arc;

pub const ANGULAR_DOMAIN: f64 = 360.0;

#[derive(Clone, Debug, PartialEq)]
pub enum BinLabel {
    /// `[lo, hi)`; the last bin of a continuous column also includes `hi` (the column maximum).
    Range { lo: f64, hi: f64 },
    Category { code: u32, label: Arc<str> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Domain {
    Linear { min: f64, max: f64, width: f64 },
    Circular { width: f64 },
    Categorical,
}

#[derive(Clone, Debug)]
pub struct BinSet {
    kind: ColumnKind,
    domain: Domain,
    labels: Arc<[BinLabel]>,
    offsets: Vec<u32>,
    rows: Vec<u32>,
    missing: Vec<u32>,
    /// Categorical only: `code_to_bin[code]` is the bin position of `code`.
    code_to_bin: Vec<u32>,
}

impl BinSet {
    /// Partition `column` into bins. `num_bins` applies to continuous and angular columns;
    /// categorical columns get one bin per label.
    pub fn build(column: &Column, num_bins: usize) -> Self {
        let num_bins = num_bins.max(1);
        match column.kind() {
            ColumnKind::Continuous => Self::build_linear(column, num_bins),
            ColumnKind::Angular => Self::build_circular(column, num_bins),
            ColumnKind::Categorical => Self::build_categorical(column),
        }
    }

    fn build_linear(column: &Column, num_bins: usize) -> Self {
        let values = column.numeric_values().unwrap_or(&[]);
        let stats = column.stats();
        let min = stats.min.unwrap_or(0.0);
        let max = stats.max.unwrap_or(min);
        // A flat column keeps every row in bin 0.
        let width = if max > min {
            (max - min) / num_bins as f64
        } else {
            1.0
        };
        let domain = Domain::Linear { min, max, width };

        let labels = (0..num_bins)
            .map(|b| {
                let lo = min + b as f64 * width;
                let hi = if b + 1 == num_bins && max > min {
                    max
                } else {
                    min + (b + 1) as f64 * width
                };
                BinLabel::Range { lo, hi }
            })
            .collect();

        let (offsets, rows, missing) = partition_rows(values.len(), num_bins, |row| {
            let v = values[row];
            (!v.is_nan()).then(|| linear_bin(v, min, width, num_bins))
        });

        Self {
            kind: ColumnKind::Continuous,
            domain,
            labels,
            offsets,
            rows,
            missing,
            code_to_bin: Vec::new(),
        }
    }

    fn build_circular(column: &Column, num_bins: usize) -> Self {
        let values = column.numeric_values().unwrap_or(&[]);
        let width = ANGULAR_DOMAIN / num_bins as f64;

        let labels = (0..num_bins)
            .map(|b| BinLabel::Range {
                lo: b as f64 * width,
                hi: (b + 1) as f64 * width,
            })
            .collect();

        let (offsets, rows, missing) = partition_rows(values.len(), num_bins, |row| {
            let v = values[row];
            (!v.is_nan()).then(|| circular_bin(v, width, num_bins))
        });

        Self {
            kind: ColumnKind::Angular,
            domain: Domain::Circular { width },
            labels,
            offsets,
            rows,
            missing,
            code_to_bin: Vec::new(),
        }
    }

    fn build_categorical(column: &Column) -> Self {
        let codes = column.category_codes().unwrap_or(&[]);
        let labels = column.labels().cloned().unwrap_or_else(|| Arc::from(Vec::new()));
        let categories = labels.len();

        let bin_order: Vec<u32> = match column.category_order().unwrap_or_default() {
            CategoryOrder::Explicit => (0..categories as u32).collect(),
            CategoryOrder::FirstSeen => {
                let mut seen = vec![false; categories];
                let mut order = Vec::with_capacity(categories);
                for &code in codes {
                    if code != MISSING_CODE && !seen[code as usize] {
                        seen[code as usize] = true;
                        order.push(code);
                        if order.len() == categories {
                            break;
                        }
                    }
                }
                order.extend((0..categories as u32).filter(|c| !seen[*c as usize]));
                order
            }
        };

        let mut code_to_bin = vec![0u32; categories];
        for (bin, &code) in bin_order.iter().enumerate() {
            code_to_bin[code as usize] = bin as u32;
        }

        let bin_labels = bin_order
            .iter()
            .map(|&code| BinLabel::Category {
                code,
                label: labels[code as usize].clone(),
            })
            .collect();

        let (offsets, rows, missing) = partition_rows(codes.len(), categories, |row| {
            code_to_bin.get(codes[row] as usize).copied()
        });

        Self {
            kind: ColumnKind::Categorical,
            domain: Domain::Categorical,
            labels: bin_labels,
            offsets,
            rows,
            missing,
            code_to_bin,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> &Arc<[BinLabel]> {
        &self.labels
    }

    /// Member rows of `bin`, ascending.
    pub fn bin_rows(&self, bin: usize) -> &[u32] {
        let start = self.offsets[bin] as usize;
        let end = self.offsets[bin + 1] as usize;
        &self.rows[start..end]
    }

    pub fn bin_len(&self, bin: usize) -> usize {
        (self.offsets[bin + 1] - self.offsets[bin]) as usize
    }

    pub fn totals(&self) -> Vec<u64> {
        self.offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect()
    }

    /// Rows excluded from every bin because their value is missing.
    pub fn missing(&self) -> &[u32] {
        &self.missing
    }

    /// Number of rows that fall into some bin.
    pub fn binned_rows(&self) -> usize {
        self.rows.len()
    }

    /// Bin a numeric value would fall into. `None` for categorical columns, `NaN`, and values
    /// outside a continuous column's `[min, max]`.
    pub fn bin_of_value(&self, v: f64) -> Option<usize> {
        if v.is_nan() {
            return None;
        }
        match self.domain {
            Domain::Linear { min, max, width } => {
                (v >= min && v <= max).then(|| linear_bin(v, min, width, self.len()) as usize)
            }
            Domain::Circular { width } => Some(circular_bin(
                crossfilter_columnar::normalize_degrees(v),
                width,
                self.len(),
            ) as usize),
            Domain::Categorical => None,
        }
    }

    /// Bin holding a category code, or `None` for unknown codes and numeric columns.
    pub fn bin_of_code(&self, code: u32) -> Option<usize> {
        self.code_to_bin.get(code as usize).map(|b| *b as usize)
    }

    /// Number of bin steps between `a` and `b`. Angular bins are measured around the circle, so
    /// the first and last bins are neighbours.
    pub fn circular_distance(&self, a: usize, b: usize) -> usize {
        let d = a.abs_diff(b);
        match self.domain {
            Domain::Circular { .. } => d.min(self.len() - d),
            _ => d,
        }
    }
}

#[inline]
fn linear_bin(v: f64, min: f64, width: f64, bins: usize) -> u32 {
    // Saturating float-to-int cast maps anything below `min` to bin 0; the clamp keeps `max`
    // in the last bin.
    (((v - min) / width) as usize).min(bins - 1) as u32
}

#[inline]
fn circular_bin(v: f64, width: f64, bins: usize) -> u32 {
    ((v / width) as usize % bins) as u32
}

/// Counting sort of `0..rows` into `bins` buckets.
///
/// `bin_for` is evaluated twice per row (count, then scatter) instead of materialising a
/// row-sized bin id buffer.
fn partition_rows(
    rows: usize,
    bins: usize,
    bin_for: impl Fn(usize) -> Option<u32>,
) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
    let mut counts = vec![0u32; bins];
    let mut missing = Vec::new();
    for row in 0..rows {
        match bin_for(row) {
            Some(b) => counts[b as usize] += 1,
            None => missing.push(row as u32),
        }
    }

    let mut offsets = Vec::with_capacity(bins + 1);
    let mut running = 0u32;
    offsets.push(0);
    for c in &counts {
        running += c;
        offsets.push(running);
    }

    let mut cursor: Vec<u32> = offsets[..bins].to_vec();
    let mut out = vec![0u32; running as usize];
    for row in 0..rows {
        if let Some(b) = bin_for(row) {
            let slot = &mut cursor[b as usize];
            out[*slot as usize] = row as u32;
            *slot += 1;
        }
    }

    (offsets, out, missing)
}

/// One [`BinSet`] per column of a [`ColumnStore`], built once at load time.
#[derive(Clone, Debug)]
pub struct BinIndex {
    sets: Vec<BinSet>,
    num_bins: usize,
}

impl BinIndex {
    pub fn build(store: &ColumnStore, num_bins: usize) -> Self {
        let sets: Vec<BinSet> = store
            .columns()
            .iter()
            .map(|column| BinSet::build(column, num_bins))
            .collect();
        log::debug!(
            "built bin index for {} columns ({} rows, {} bins per numeric column)",
            sets.len(),
            store.row_count(),
            num_bins
        );
        Self { sets, num_bins }
    }

    pub fn get(&self, column: ColumnId) -> &BinSet {
        &self.sets[column.index()]
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
