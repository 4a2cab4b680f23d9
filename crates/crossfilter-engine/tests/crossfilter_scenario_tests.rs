mod common;

use common::{exact_small_batches, observed, Dataset};
use crossfilter_engine::{
    ColumnInput, Crossfilter, CrossfilterError, EngineOptions, OptionsError, Predicate,
    SchemaError,
};
use pretty_assertions::assert_eq;

#[tokio::test(flavor = "current_thread")]
async fn brushing_age_refilters_team_and_clearing_restores_totals() {
    let dataset = Dataset::generate(10_000, 2024);
    let (cf, observer, _) = observed(&dataset, exact_small_batches());

    let age = cf.aggregated_counts("age").unwrap();
    assert_eq!(age.totals.iter().sum::<u64>(), 10_000);
    assert_eq!(age.counts.len(), 50);
    let team_before = cf.aggregated_counts("team").unwrap();

    cf.set_predicate("age", Predicate::range(20.0, 30.0)).unwrap();
    cf.recompute().await;

    let rows = dataset.rows_where(|row| (20.0..30.0).contains(&dataset.age[row]));
    let changes = observer.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].selected_count, rows.len());
    assert_eq!(changes[0].total_count, 10_000);

    let team = cf.aggregated_counts("team").unwrap();
    assert_eq!(team.counts, dataset.team_counts(&rows));
    assert_eq!(team.totals, team_before.totals);

    cf.clear_all();
    cf.recompute().await;

    let team_after = cf.aggregated_counts("team").unwrap();
    assert_eq!(team_after.counts, team_before.counts);
    assert_eq!(observer.changes().len(), 2);
    assert_eq!(observer.changes()[1].selected_count, 10_000);
}

#[tokio::test(flavor = "current_thread")]
async fn angular_brushes_on_either_side_of_north() {
    let dataset = Dataset::generate(5_000, 77);
    let (cf, _, _) = observed(&dataset, exact_small_batches());

    cf.set_predicate("dir", Predicate::range(350.0, 360.0)).unwrap();
    let north_west = cf.recompute().await.selected_count();
    cf.set_predicate("dir", Predicate::range(0.0, 10.0)).unwrap();
    let north_east = cf.recompute().await.selected_count();

    let expected_west = dataset.rows_where(|row| dataset.dir[row] >= 350.0).len();
    let expected_east = dataset.rows_where(|row| dataset.dir[row] < 10.0).len();
    assert_eq!((north_west, north_east), (expected_west, expected_east));

    let dir = cf.aggregated_counts("dir").unwrap();
    // Only the bins covering [0, 10) have selected rows.
    let populated: Vec<usize> = dir
        .counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(bin, _)| bin)
        .collect();
    assert!(populated.iter().all(|bin| *bin <= 1), "{populated:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn one_brush_across_north_covers_both_sides() {
    let dataset = Dataset::generate(5_000, 78);
    let (cf, _, _) = observed(&dataset, exact_small_batches());

    cf.set_predicate("dir", Predicate::range(-10.0, 10.0)).unwrap();
    let mask = cf.recompute().await;

    let expected = dataset.rows_where(|row| dataset.dir[row] >= 350.0 || dataset.dir[row] < 10.0);
    assert_eq!(mask.selected_rows(), expected);

    // 50 bins of 7.2 degrees: the first two and the last two hold the selection.
    let dir = cf.aggregated_counts("dir").unwrap();
    let populated: Vec<usize> = dir
        .counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(bin, _)| bin)
        .collect();
    assert_eq!(populated, vec![0, 1, 48, 49]);
}

#[test]
fn mismatched_column_lengths_fail_the_whole_load() {
    let err = Crossfilter::load(vec![
        ColumnInput::continuous("a", vec![1.0, 2.0, 3.0]),
        ColumnInput::continuous("b", vec![1.0, 2.0]),
    ])
    .err()
    .unwrap();

    assert!(err.is_schema_error());
    assert_eq!(
        err.to_string(),
        "column length mismatch for b: expected 3 values, got 2"
    );
}

#[test]
fn duplicate_and_unlabelled_columns_are_schema_errors() {
    let duplicate = Crossfilter::load(vec![
        ColumnInput::continuous("a", vec![1.0]),
        ColumnInput::angular("a", vec![1.0]),
    ])
    .err()
    .unwrap();
    assert_eq!(
        duplicate,
        CrossfilterError::Schema(SchemaError::DuplicateColumn {
            column: "a".to_string()
        })
    );

    let unlabelled = Crossfilter::load(vec![ColumnInput::categorical(
        "team",
        vec![Some(0), Some(4)],
        vec!["A", "B"],
    )])
    .err()
    .unwrap();
    assert_eq!(
        unlabelled,
        CrossfilterError::Schema(SchemaError::UnknownCategoryCode {
            column: "team".to_string(),
            row: 1,
            code: 4,
            categories: 2,
        })
    );
}

#[test]
fn zero_options_are_rejected_before_loading() {
    let err = Crossfilter::builder()
        .options(EngineOptions {
            num_bins: 0,
            ..EngineOptions::default()
        })
        .load(Dataset::generate(10, 1).columns())
        .err()
        .unwrap();
    assert_eq!(
        err,
        CrossfilterError::Options(OptionsError::Zero { field: "num_bins" })
    );
}

#[tokio::test(flavor = "current_thread")]
async fn reload_starts_from_a_fresh_selection() {
    let dataset = Dataset::generate(1_000, 8);
    let cf = Crossfilter::load(dataset.columns()).unwrap();
    cf.set_predicate("age", Predicate::range(0.0, 10.0)).unwrap();
    cf.recompute().await;
    assert!(cf.selected_count() < 1_000);

    let reloaded = Crossfilter::load(Dataset::generate(300, 9).columns()).unwrap();
    assert_eq!(reloaded.row_count(), 300);
    assert_eq!(reloaded.selected_count(), 300);
    assert_eq!(reloaded.mask().version(), 0);
    assert!(reloaded.engine().active_predicates().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn filtered_row_indices_are_ascending_row_ids() {
    let dataset = Dataset::generate(2_000, 10);
    let (cf, _, _) = observed(&dataset, exact_small_batches());
    cf.set_predicate("team", Predicate::categories([2])).unwrap();
    cf.set_predicate("age", Predicate::range(0.0, 50.0)).unwrap();
    cf.recompute().await;

    let indices = cf.filtered_row_indices();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        indices,
        dataset.rows_where(|row| dataset.team[row] == 2 && dataset.age[row] < 50.0)
    );
    assert_eq!(cf.column_names(), vec!["age", "dir", "team"]);
}
