#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::stats::{CategoryStatsBuilder, ColumnStats, NumericStatsBuilder};
use crate::types::{CategoryOrder, ColumnData, ColumnId, ColumnInput, ColumnKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Code stored for a missing categorical value. It never indexes into a label table.
pub const MISSING_CODE: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("column length mismatch for {column}: expected {expected} values, got {actual}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("column {column} has code {code} at row {row}, but only {categories} labels")]
    UnknownCategoryCode {
        column: String,
        row: usize,
        code: u32,
        categories: usize,
    },

    #[error("column {column} is declared {kind} but its values do not match that kind")]
    KindMismatch { column: String, kind: ColumnKind },

    #[error("{rows} rows exceed the supported maximum of {max}")]
    TooManyRows { rows: usize, max: usize },
}

/// Stored values of a column after ingestion.
#[derive(Clone, Debug)]
pub enum ColumnValues {
    /// Missing entries are stored as `NaN`, so every ordered comparison against them is false.
    Numeric(Vec<f64>),
    /// Missing entries are stored as [`MISSING_CODE`].
    Categorical {
        codes: Vec<u32>,
        labels: Arc<[Arc<str>]>,
        order: CategoryOrder,
    },
}

#[derive(Clone, Debug)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: ColumnValues,
    validity: Option<BitVec>,
    stats: ColumnStats,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn stats(&self) -> &ColumnStats {
        &self.stats
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric buffer for continuous/angular columns; angular values are already in `[0, 360)`.
    pub fn numeric_values(&self) -> Option<&[f64]> {
        match &self.values {
            ColumnValues::Numeric(values) => Some(values),
            ColumnValues::Categorical { .. } => None,
        }
    }

    pub fn category_codes(&self) -> Option<&[u32]> {
        match &self.values {
            ColumnValues::Categorical { codes, .. } => Some(codes),
            ColumnValues::Numeric(_) => None,
        }
    }

    pub fn labels(&self) -> Option<&Arc<[Arc<str>]>> {
        match &self.values {
            ColumnValues::Categorical { labels, .. } => Some(labels),
            ColumnValues::Numeric(_) => None,
        }
    }

    pub fn category_order(&self) -> Option<CategoryOrder> {
        match &self.values {
            ColumnValues::Categorical { order, .. } => Some(*order),
            ColumnValues::Numeric(_) => None,
        }
    }

    /// `None` when the column has no missing values.
    pub fn validity(&self) -> Option<&BitVec> {
        self.validity.as_ref()
    }

    pub fn is_valid(&self, row: usize) -> bool {
        match &self.validity {
            Some(validity) => row < validity.len() && validity.get(row),
            None => row < self.len(),
        }
    }

    fn from_input(input: ColumnInput) -> Result<Self, SchemaError> {
        let ColumnInput { name, kind, data } = input;
        match (kind, data) {
            (ColumnKind::Continuous | ColumnKind::Angular, ColumnData::Numeric(values)) => {
                Ok(Self::numeric(name, kind, values))
            }
            (
                ColumnKind::Categorical,
                ColumnData::Categorical {
                    codes,
                    labels,
                    order,
                },
            ) => Self::categorical(name, codes, labels, order),
            (kind, _) => Err(SchemaError::KindMismatch { column: name, kind }),
        }
    }

    fn numeric(name: String, kind: ColumnKind, mut values: Vec<f64>) -> Self {
        let mut stats = NumericStatsBuilder::new(kind);
        let mut validity = BitVec::with_capacity_bits(values.len());
        let angular = kind == ColumnKind::Angular;

        for v in values.iter_mut() {
            if !v.is_finite() {
                *v = f64::NAN;
                stats.push_missing();
                validity.push(false);
                continue;
            }
            if angular {
                *v = normalize_degrees(*v);
            }
            stats.push(*v);
            validity.push(true);
        }

        Self {
            name,
            kind,
            values: ColumnValues::Numeric(values),
            validity: (!validity.all_true()).then_some(validity),
            stats: stats.finish(),
        }
    }

    fn categorical(
        name: String,
        codes: Vec<Option<u32>>,
        labels: Vec<String>,
        order: CategoryOrder,
    ) -> Result<Self, SchemaError> {
        let mut stats = CategoryStatsBuilder::new(labels.len());
        let mut validity = BitVec::with_capacity_bits(codes.len());
        let mut stored = Vec::with_capacity(codes.len());

        for (row, code) in codes.into_iter().enumerate() {
            match code {
                Some(code) if (code as usize) < labels.len() => {
                    stats.push(code);
                    validity.push(true);
                    stored.push(code);
                }
                Some(code) => {
                    return Err(SchemaError::UnknownCategoryCode {
                        column: name,
                        row,
                        code,
                        categories: labels.len(),
                    });
                }
                None => {
                    stats.push_missing();
                    validity.push(false);
                    stored.push(MISSING_CODE);
                }
            }
        }

        let labels: Arc<[Arc<str>]> = labels.into_iter().map(Arc::<str>::from).collect();
        Ok(Self {
            name,
            kind: ColumnKind::Categorical,
            values: ColumnValues::Categorical {
                codes: stored,
                labels,
                order,
            },
            validity: (!validity.all_true()).then_some(validity),
            stats: stats.finish(),
        })
    }
}

/// Map any finite angle in degrees into `[0, 360)`.
pub fn normalize_degrees(v: f64) -> f64 {
    let d = v.rem_euclid(360.0);
    // `rem_euclid` can round tiny negative inputs up to exactly 360.0.
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Immutable snapshot of a dataset: one compact buffer per column, all of the same length.
///
/// There is no mutation API. Loading new data means building a new store (and a new dependent
/// bin index and filter engine).
#[derive(Clone, Debug, Default)]
pub struct ColumnStore {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl ColumnStore {
    /// Validate and ingest `inputs`. Either every column loads or none does.
    pub fn load(inputs: Vec<ColumnInput>) -> Result<Self, SchemaError> {
        let rows = inputs.first().map(|c| c.data.len()).unwrap_or(0);
        if rows > u32::MAX as usize {
            return Err(SchemaError::TooManyRows {
                rows,
                max: u32::MAX as usize,
            });
        }

        let mut index = HashMap::with_capacity(inputs.len());
        for (idx, input) in inputs.iter().enumerate() {
            if input.data.len() != rows {
                return Err(SchemaError::ColumnLengthMismatch {
                    column: input.name.clone(),
                    expected: rows,
                    actual: input.data.len(),
                });
            }
            if index.insert(input.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    column: input.name.clone(),
                });
            }
        }

        let columns = inputs
            .into_iter()
            .map(Column::from_input)
            .collect::<Result<Vec<_>, _>>()?;

        for column in &columns {
            if rows > 0 && column.stats.missing_count as usize == rows {
                log::warn!("column {} has no valid values", column.name);
            }
        }
        log::debug!("loaded {} rows across {} columns", rows, columns.len());

        Ok(Self {
            columns,
            index,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.index.get(name).copied().map(ColumnId)
    }

    /// Resolve `name`, failing with [`SchemaError::UnknownColumn`].
    pub fn require(&self, name: &str) -> Result<ColumnId, SchemaError> {
        self.column_id(name)
            .ok_or_else(|| SchemaError::UnknownColumn {
                column: name.to_string(),
            })
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.columns[id.0]
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.column_id(name).map(|id| self.column(id))
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(Column::kind)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        (0..self.columns.len()).map(ColumnId)
    }
}
