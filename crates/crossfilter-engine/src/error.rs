use crossfilter_columnar::{ColumnKind, SchemaError};

pub type CrossfilterResult<T> = Result<T, CrossfilterError>;

/// A predicate rejected at `set_predicate` time. The column keeps its previous predicate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredicateError {
    #[error("inverted range for {column}: lower bound {lo} is above upper bound {hi}")]
    InvertedRange { column: String, lo: f64, hi: f64 },

    #[error("non-finite range bound for {column}: [{lo}, {hi})")]
    NonFiniteBound { column: String, lo: f64, hi: f64 },

    #[error("angular range for {column} spans more than a full turn: [{lo}, {hi})")]
    AngularSpanTooWide { column: String, lo: f64, hi: f64 },

    #[error("unknown category code {code} for {column} ({categories} categories)")]
    UnknownCategory {
        column: String,
        code: u32,
        categories: usize,
    },

    #[error("a {predicate} predicate cannot filter {kind} column {column}")]
    KindMismatch {
        column: String,
        kind: ColumnKind,
        predicate: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("engine option {field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrossfilterError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    InvalidPredicate(#[from] PredicateError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl CrossfilterError {
    /// Structural problems: bad column lengths, unknown columns, unlabelled codes.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, CrossfilterError::Schema(_))
    }

    pub fn is_invalid_predicate(&self) -> bool {
        matches!(self, CrossfilterError::InvalidPredicate(_))
    }
}
