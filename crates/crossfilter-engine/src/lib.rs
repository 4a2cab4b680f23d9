//! Cross-filtering engine: load-time bin indices, per-column predicates, cooperative selection
//! recomputation and per-bin aggregation for linked histogram/category views.
//!
//! Data flows one way: [`ColumnStore`] (static) → [`BinIndex`] (built once) → [`FilterEngine`]
//! (recomputed on predicate changes) → [`SelectionMask`] → [`AggregationView`] → renderer.

mod aggregate;
mod bins;
mod error;
mod events;
mod filter;
mod mask;
mod options;
mod predicate;
mod session;
mod summary;

pub use crate::aggregate::{AggregatedBinCounts, AggregationView};
pub use crate::bins::{BinIndex, BinLabel, BinSet, ANGULAR_DOMAIN};
pub use crate::error::{CrossfilterError, CrossfilterResult, OptionsError, PredicateError};
pub use crate::events::{EngineObserver, SelectionChanged};
pub use crate::filter::{EngineState, FilterEngine, HostScheduler, TokioYield};
pub use crate::mask::SelectionMask;
pub use crate::options::EngineOptions;
pub use crate::predicate::Predicate;
pub use crate::session::{Crossfilter, CrossfilterBuilder};
pub use crate::summary::{summarize, SelectionSummary};

pub use crossfilter_columnar::{
    CategoryOrder, Column, ColumnData, ColumnId, ColumnInput, ColumnKind, ColumnStore, SchemaError,
};
