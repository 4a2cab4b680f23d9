use crate::mask::SelectionMask;
use crossfilter_columnar::{Column, ColumnKind};
use ordered_float::OrderedFloat;

/// Descriptive statistics of a numeric column over the selected rows.
///
/// Missing values are skipped. `std_dev` is the population standard deviation.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSummary {
    pub column: String,
    pub mask_version: u64,
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    /// Angular columns only: direction of the summed unit vectors, in `[0, 360)`. `None` when
    /// the selection is empty or the directions cancel out.
    pub circular_mean: Option<f64>,
}

/// `None` for categorical columns.
pub fn summarize(column: &Column, mask: &SelectionMask) -> Option<SelectionSummary> {
    let values = column.numeric_values()?;
    let mut selected: Vec<OrderedFloat<f64>> = mask
        .iter_selected()
        .map(|row| values[row])
        .filter(|v| !v.is_nan())
        .map(OrderedFloat)
        .collect();

    let count = selected.len();
    let mut summary = SelectionSummary {
        column: column.name().to_string(),
        mask_version: mask.version(),
        count,
        min: None,
        max: None,
        mean: None,
        median: None,
        std_dev: None,
        circular_mean: None,
    };
    if count == 0 {
        return Some(summary);
    }

    let n = count as f64;
    let mean = selected.iter().map(|v| v.0).sum::<f64>() / n;
    let variance = selected.iter().map(|v| (v.0 - mean).powi(2)).sum::<f64>() / n;

    summary.min = selected.iter().min().map(|v| v.0);
    summary.max = selected.iter().max().map(|v| v.0);
    summary.mean = Some(mean);
    summary.std_dev = Some(variance.sqrt());
    if column.kind() == ColumnKind::Angular {
        summary.circular_mean = circular_mean(selected.iter().map(|v| v.0));
    }
    summary.median = Some(median(&mut selected));

    Some(summary)
}

/// Median of a non-empty slice; averages the two middle values for even lengths.
fn median(values: &mut [OrderedFloat<f64>]) -> f64 {
    let len = values.len();
    let (lower, upper, _) = values.select_nth_unstable(len / 2);
    let upper = upper.0;
    if len % 2 == 1 {
        return upper;
    }
    // After selection every element left of `mid` is <= `upper`; the largest of them is the
    // other middle value.
    match lower.iter().max() {
        Some(lower) => (lower.0 + upper) / 2.0,
        None => upper,
    }
}

fn circular_mean(degrees: impl Iterator<Item = f64>) -> Option<f64> {
    let (mut sin, mut cos, mut n) = (0.0f64, 0.0f64, 0usize);
    for d in degrees {
        let r = d.to_radians();
        sin += r.sin();
        cos += r.cos();
        n += 1;
    }
    if n == 0 || sin.hypot(cos) < 1e-9 * n as f64 {
        return None;
    }
    Some(crossfilter_columnar::normalize_degrees(sin.atan2(cos).to_degrees()))
}
