mod common;

use common::{exact_small_batches, load, Dataset};
use crossfilter_engine::{ColumnInput, Crossfilter, Predicate};
use pretty_assertions::assert_eq;

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value present");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn summary_covers_only_selected_rows() {
    let cf = Crossfilter::load(vec![
        ColumnInput::continuous("x", vec![1.0, 2.0, 3.0, 4.0, 100.0, f64::NAN]),
        ColumnInput::categorical(
            "keep",
            vec![Some(0), Some(0), Some(0), Some(0), Some(1), Some(0)],
            vec!["yes", "no"],
        ),
    ])
    .unwrap();
    cf.set_predicate("keep", Predicate::categories([0])).unwrap();
    cf.recompute().await;

    let summary = cf.selection_summary("x").unwrap().unwrap();
    assert_eq!(summary.count, 4);
    assert_eq!(summary.mask_version, 1);
    assert_eq!((summary.min, summary.max), (Some(1.0), Some(4.0)));
    assert_close(summary.mean, 2.5);
    assert_close(summary.median, 2.5);
    assert_close(summary.std_dev, 1.25f64.sqrt());
    assert_eq!(summary.circular_mean, None);
}

#[tokio::test(flavor = "current_thread")]
async fn angular_summary_reports_a_circular_mean() {
    let cf = Crossfilter::load(vec![ColumnInput::angular(
        "dir",
        vec![350.0, 10.0, 20.0, 180.0],
    )])
    .unwrap();
    cf.set_predicate("dir", Predicate::range(0.0, 30.0)).unwrap();
    cf.recompute().await;

    let summary = cf.selection_summary("dir").unwrap().unwrap();
    assert_eq!(summary.count, 2);
    assert_close(summary.circular_mean, 15.0);

    cf.clear_all();
    cf.set_predicate("dir", Predicate::range(340.0, 360.0)).unwrap();
    cf.recompute().await;
    let west = cf.selection_summary("dir").unwrap().unwrap();
    assert_close(west.circular_mean, 350.0);
}

#[tokio::test(flavor = "current_thread")]
async fn empty_selection_summary_has_no_statistics() {
    let dataset = Dataset::generate(200, 1);
    let cf = load(&dataset, exact_small_batches());
    cf.set_predicate("age", Predicate::range(300.0, 400.0)).unwrap();
    cf.recompute().await;

    let summary = cf.selection_summary("age").unwrap().unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.mean, None);
    assert_eq!(summary.median, None);
}

#[test]
fn categorical_columns_have_no_summary() {
    let cf = load(&Dataset::generate(50, 1), exact_small_batches());
    assert_eq!(cf.selection_summary("team").unwrap(), None);
    assert!(cf.selection_summary("nope").unwrap_err().is_schema_error());
}

#[test]
fn unfiltered_summary_spans_the_whole_column() {
    let dataset = Dataset::generate(1_000, 12);
    let cf = load(&dataset, exact_small_batches());
    let summary = cf.selection_summary("age").unwrap().unwrap();
    assert_eq!(summary.count, 1_000);
    assert_eq!((summary.min, summary.max), (Some(0.0), Some(100.0)));
    assert_close(
        summary.mean,
        dataset.age.iter().sum::<f64>() / 1_000.0,
    );
}
