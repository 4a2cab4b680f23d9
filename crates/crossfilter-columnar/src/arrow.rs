#![forbid(unsafe_code)]

//! Conversion from in-memory Arrow arrays into [`ColumnInput`]s.
//!
//! Only array-level interop lives here. Reading IPC or Parquet files is the loader's job.

use crate::types::{CategoryOrder, ColumnData, ColumnInput, ColumnKind};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type,
    UInt8Type,
};
use arrow_array::Array;
use arrow_schema::DataType;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrowInteropError {
    #[error("column {column}: unsupported arrow type {data_type} for a {kind} column")]
    UnsupportedType {
        column: String,
        kind: ColumnKind,
        data_type: DataType,
    },

    #[error("column {column}: negative dictionary key {key} at row {row}")]
    NegativeDictionaryKey { column: String, row: usize, key: i32 },
}

fn numeric_values(array: &dyn Array) -> Option<Vec<f64>> {
    macro_rules! collect {
        ($t:ty) => {
            array
                .as_primitive::<$t>()
                .iter()
                .map(|v| v.map(|v| v as f64).unwrap_or(f64::NAN))
                .collect()
        };
    }

    let values = match array.data_type() {
        DataType::Float64 => collect!(Float64Type),
        DataType::Float32 => collect!(Float32Type),
        DataType::Int8 => collect!(Int8Type),
        DataType::Int16 => collect!(Int16Type),
        DataType::Int32 => collect!(Int32Type),
        DataType::Int64 => collect!(Int64Type),
        DataType::UInt8 => collect!(UInt8Type),
        DataType::UInt16 => collect!(UInt16Type),
        DataType::UInt32 => collect!(UInt32Type),
        _ => return None,
    };
    Some(values)
}

/// Build a continuous or angular input from a primitive Arrow array. Nulls become missing values.
pub fn numeric_input(
    name: impl Into<String>,
    kind: ColumnKind,
    array: &dyn Array,
) -> Result<ColumnInput, ArrowInteropError> {
    let name = name.into();
    let values = if kind.is_numeric() {
        numeric_values(array)
    } else {
        None
    };
    let Some(values) = values else {
        return Err(ArrowInteropError::UnsupportedType {
            column: name,
            kind,
            data_type: array.data_type().clone(),
        });
    };

    Ok(ColumnInput {
        name,
        kind,
        data: ColumnData::Numeric(values),
    })
}

/// Null keys become missing codes. Keys past the label count are left for
/// [`ColumnStore::load`](crate::ColumnStore::load) to reject.
fn dictionary_codes(
    column: &str,
    keys: impl IntoIterator<Item = Option<i32>>,
) -> Result<Vec<Option<u32>>, ArrowInteropError> {
    keys.into_iter()
        .enumerate()
        .map(|(row, key)| match key {
            None => Ok(None),
            Some(key) => u32::try_from(key).map(Some).map_err(|_| {
                ArrowInteropError::NegativeDictionaryKey {
                    column: column.to_string(),
                    row,
                    key,
                }
            }),
        })
        .collect()
}

/// Build a categorical input from a `Dictionary<Int32, Utf8>` array (codes and labels are taken
/// as-is) or from a plain `Utf8` array (dictionary-encoded here in first-seen order).
pub fn categorical_input(
    name: impl Into<String>,
    array: &dyn Array,
) -> Result<ColumnInput, ArrowInteropError> {
    let name = name.into();
    match array.data_type() {
        DataType::Dictionary(key, value)
            if key.as_ref() == &DataType::Int32 && value.as_ref() == &DataType::Utf8 =>
        {
            let dict = array.as_dictionary::<Int32Type>();
            let labels = dict
                .values()
                .as_string::<i32>()
                .iter()
                .map(|s| s.unwrap_or_default().to_string())
                .collect();
            let codes = dictionary_codes(&name, dict.keys().iter())?;
            Ok(ColumnInput {
                name,
                kind: ColumnKind::Categorical,
                data: ColumnData::Categorical {
                    codes,
                    labels,
                    order: CategoryOrder::Explicit,
                },
            })
        }
        DataType::Utf8 => {
            let mut labels: Vec<String> = Vec::new();
            let mut lookup: HashMap<&str, u32> = HashMap::new();
            let strings = array.as_string::<i32>();
            let codes = strings
                .iter()
                .map(|s| {
                    s.map(|s| {
                        *lookup.entry(s).or_insert_with(|| {
                            labels.push(s.to_string());
                            (labels.len() - 1) as u32
                        })
                    })
                })
                .collect();
            Ok(ColumnInput {
                name,
                kind: ColumnKind::Categorical,
                data: ColumnData::Categorical {
                    codes,
                    labels,
                    order: CategoryOrder::FirstSeen,
                },
            })
        }
        other => Err(ArrowInteropError::UnsupportedType {
            column: name,
            kind: ColumnKind::Categorical,
            data_type: other.clone(),
        }),
    }
}
