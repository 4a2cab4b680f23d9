use crate::bins::ANGULAR_DOMAIN;
use crate::error::PredicateError;
use crossfilter_columnar::{normalize_degrees, Column, ColumnKind, ColumnValues};
use std::collections::BTreeSet;

/// A per-column filter condition. Predicates on different columns combine with AND.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Half-open `[lo, hi)`. On angular columns the bounds are degrees spanning at most one full
    /// turn; bounds outside `[0, 360]` wrap, so `[-10, 10)` selects both sides of north.
    Range { lo: f64, hi: f64 },
    /// Accepted category codes.
    Categories(BTreeSet<u32>),
}

impl Predicate {
    pub fn range(lo: f64, hi: f64) -> Self {
        Predicate::Range { lo, hi }
    }

    pub fn categories(codes: impl IntoIterator<Item = u32>) -> Self {
        Predicate::Categories(codes.into_iter().collect())
    }

    fn label(&self) -> &'static str {
        match self {
            Predicate::Range { .. } => "range",
            Predicate::Categories(_) => "category",
        }
    }

    pub(crate) fn validate(&self, column: &Column) -> Result<(), PredicateError> {
        match (self, column.kind()) {
            (Predicate::Range { lo, hi }, ColumnKind::Continuous | ColumnKind::Angular) => {
                if !lo.is_finite() || !hi.is_finite() {
                    return Err(PredicateError::NonFiniteBound {
                        column: column.name().to_string(),
                        lo: *lo,
                        hi: *hi,
                    });
                }
                if lo > hi {
                    return Err(PredicateError::InvertedRange {
                        column: column.name().to_string(),
                        lo: *lo,
                        hi: *hi,
                    });
                }
                if column.kind() == ColumnKind::Angular && hi - lo > ANGULAR_DOMAIN {
                    return Err(PredicateError::AngularSpanTooWide {
                        column: column.name().to_string(),
                        lo: *lo,
                        hi: *hi,
                    });
                }
                Ok(())
            }
            (Predicate::Categories(codes), ColumnKind::Categorical) => {
                let categories = column.labels().map(|l| l.len()).unwrap_or(0);
                match codes.iter().find(|c| **c as usize >= categories) {
                    Some(code) => Err(PredicateError::UnknownCategory {
                        column: column.name().to_string(),
                        code: *code,
                        categories,
                    }),
                    None => Ok(()),
                }
            }
            (predicate, kind) => Err(PredicateError::KindMismatch {
                column: column.name().to_string(),
                kind,
                predicate: predicate.label(),
            }),
        }
    }
}

/// A validated predicate bound to its column's buffer for the row loop.
pub(crate) enum RowTest<'a> {
    Range {
        values: &'a [f64],
        lo: f64,
        hi: f64,
    },
    /// `[lo, 360) ∪ [0, hi)` over normalised angles.
    Wrapped {
        values: &'a [f64],
        lo: f64,
        hi: f64,
    },
    Categories {
        codes: &'a [u32],
        accepted: Vec<bool>,
    },
}

impl<'a> RowTest<'a> {
    /// `predicate` must have been validated against `column`.
    pub fn compile(predicate: &Predicate, column: &'a Column) -> Option<Self> {
        match (predicate, column.values()) {
            (Predicate::Range { lo, hi }, ColumnValues::Numeric(values)) => {
                if column.kind() == ColumnKind::Angular {
                    Some(angular_range(values, *lo, *hi))
                } else {
                    Some(RowTest::Range {
                        values,
                        lo: *lo,
                        hi: *hi,
                    })
                }
            }
            (
                Predicate::Categories(codes),
                ColumnValues::Categorical {
                    codes: data,
                    labels,
                    ..
                },
            ) => {
                let mut accepted = vec![false; labels.len()];
                for code in codes {
                    if let Some(slot) = accepted.get_mut(*code as usize) {
                        *slot = true;
                    }
                }
                Some(RowTest::Categories {
                    codes: data,
                    accepted,
                })
            }
            _ => None,
        }
    }

    /// Missing values never match: `NaN` fails both comparisons and the missing code is out of
    /// range for `accepted`.
    #[inline]
    pub fn test(&self, row: usize) -> bool {
        match self {
            RowTest::Range { values, lo, hi } => {
                let v = values[row];
                v >= *lo && v < *hi
            }
            RowTest::Wrapped { values, lo, hi } => {
                let v = values[row];
                v >= *lo || v < *hi
            }
            RowTest::Categories { codes, accepted } => accepted
                .get(codes[row] as usize)
                .copied()
                .unwrap_or(false),
        }
    }
}

/// Map a validated angular `[lo, hi)` onto stored values, which are normalised to `[0, 360)`.
fn angular_range(values: &[f64], lo: f64, hi: f64) -> RowTest<'_> {
    let in_domain = |d: f64| (0.0..=ANGULAR_DOMAIN).contains(&d);
    if (in_domain(lo) && in_domain(hi)) || lo == hi {
        return RowTest::Range { values, lo, hi };
    }
    if hi - lo >= ANGULAR_DOMAIN {
        return RowTest::Range {
            values,
            lo: 0.0,
            hi: ANGULAR_DOMAIN,
        };
    }

    let (lo, hi) = (normalize_degrees(lo), normalize_degrees(hi));
    if lo < hi {
        RowTest::Range { values, lo, hi }
    } else {
        RowTest::Wrapped { values, lo, hi }
    }
}
