#![forbid(unsafe_code)]

use crate::types::ColumnKind;

/// Load-time statistics for a column, computed in the same pass that normalises its values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub kind: ColumnKind,
    pub missing_count: u64,
    /// Smallest valid value (numeric columns only).
    pub min: Option<f64>,
    /// Largest valid value (numeric columns only).
    pub max: Option<f64>,
    pub sum: Option<f64>,
    /// Number of categories that occur at least once (categorical columns only).
    pub distinct_count: Option<u64>,
}

impl ColumnStats {
    pub fn valid_count(&self, row_count: usize) -> u64 {
        (row_count as u64).saturating_sub(self.missing_count)
    }
}

pub(crate) struct NumericStatsBuilder {
    kind: ColumnKind,
    missing: u64,
    min: Option<f64>,
    max: Option<f64>,
    sum: f64,
}

impl NumericStatsBuilder {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            missing: 0,
            min: None,
            max: None,
            sum: 0.0,
        }
    }

    #[inline]
    pub fn push(&mut self, v: f64) {
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
        self.sum += v;
    }

    #[inline]
    pub fn push_missing(&mut self) {
        self.missing += 1;
    }

    pub fn finish(self) -> ColumnStats {
        let any_valid = self.min.is_some();
        ColumnStats {
            kind: self.kind,
            missing_count: self.missing,
            min: self.min,
            max: self.max,
            sum: any_valid.then_some(self.sum),
            distinct_count: None,
        }
    }
}

pub(crate) struct CategoryStatsBuilder {
    missing: u64,
    seen: Vec<bool>,
}

impl CategoryStatsBuilder {
    pub fn new(categories: usize) -> Self {
        Self {
            missing: 0,
            seen: vec![false; categories],
        }
    }

    /// `code` must already be validated against the label table.
    #[inline]
    pub fn push(&mut self, code: u32) {
        self.seen[code as usize] = true;
    }

    #[inline]
    pub fn push_missing(&mut self) {
        self.missing += 1;
    }

    pub fn finish(self) -> ColumnStats {
        ColumnStats {
            kind: ColumnKind::Categorical,
            missing_count: self.missing,
            min: None,
            max: None,
            sum: None,
            distinct_count: Some(self.seen.iter().filter(|s| **s).count() as u64),
        }
    }
}
