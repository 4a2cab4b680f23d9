//! Compact, immutable columnar storage for interactive cross-filtering.
//!
//! This crate focuses on:
//! - One compact buffer per column (`f64` for continuous/angular, `u32` codes for categorical).
//! - Ingestion-time normalisation (non-finite values become missing, angles wrap into `[0, 360)`).
//! - Load-time column statistics used to pick bin ranges.
//! - The bit vector shared by validity bitmaps and selection masks.

#![forbid(unsafe_code)]

#[cfg(feature = "arrow")]
pub mod arrow;
mod bitmap;
mod stats;
mod store;
mod types;

pub use crate::bitmap::{BitVec, IterOnes};
pub use crate::stats::ColumnStats;
pub use crate::store::{
    normalize_degrees, Column, ColumnStore, ColumnValues, SchemaError, MISSING_CODE,
};
pub use crate::types::{CategoryOrder, ColumnData, ColumnId, ColumnInput, ColumnKind};
