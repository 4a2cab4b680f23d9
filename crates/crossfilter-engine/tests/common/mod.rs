#![allow(dead_code)]

use crossfilter_engine::{
    ColumnInput, Crossfilter, EngineObserver, EngineOptions, HostScheduler, SelectionChanged,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEAMS: [&str; 3] = ["A", "B", "C"];

/// Raw values of the three-column dashboard dataset, kept so tests can compute expectations
/// directly.
pub struct Dataset {
    pub age: Vec<f64>,
    pub dir: Vec<f64>,
    pub team: Vec<u32>,
}

impl Dataset {
    /// `age` spans exactly `[0, 100]` (rows 0 and 1 pin the extremes).
    pub fn generate(rows: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut age: Vec<f64> = (0..rows).map(|_| rng.gen_range(0.0..100.0)).collect();
        if rows >= 2 {
            age[0] = 0.0;
            age[1] = 100.0;
        }
        let dir = (0..rows).map(|_| rng.gen_range(0.0..360.0)).collect();
        let team = (0..rows).map(|_| rng.gen_range(0..TEAMS.len() as u32)).collect();
        Self { age, dir, team }
    }

    pub fn columns(&self) -> Vec<ColumnInput> {
        vec![
            ColumnInput::continuous("age", self.age.clone()),
            ColumnInput::angular("dir", self.dir.clone()),
            ColumnInput::categorical(
                "team",
                self.team.iter().map(|c| Some(*c)).collect(),
                TEAMS.to_vec(),
            ),
        ]
    }

    pub fn rows_where(&self, keep: impl Fn(usize) -> bool) -> Vec<u32> {
        (0..self.age.len())
            .filter(|row| keep(*row))
            .map(|row| row as u32)
            .collect()
    }

    pub fn team_counts(&self, rows: &[u32]) -> Vec<u64> {
        let mut counts = vec![0u64; TEAMS.len()];
        for row in rows {
            counts[self.team[*row as usize] as usize] += 1;
        }
        counts
    }
}

/// Options that keep every count exact and force many small batches.
pub fn exact_small_batches() -> EngineOptions {
    EngineOptions {
        num_bins: 50,
        sampling_threshold: usize::MAX,
        batch_rows: 64,
    }
}

pub fn load(dataset: &Dataset, options: EngineOptions) -> Crossfilter {
    Crossfilter::builder()
        .options(options)
        .load(dataset.columns())
        .unwrap()
}

#[derive(Default)]
pub struct RecordingObserver {
    pub loaded: Mutex<Vec<(usize, Vec<String>)>>,
    pub changes: Mutex<Vec<SelectionChanged>>,
}

impl RecordingObserver {
    pub fn changes(&self) -> Vec<SelectionChanged> {
        self.changes.lock().unwrap().clone()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_data_loaded(&self, row_count: usize, column_names: &[String]) {
        self.loaded
            .lock()
            .unwrap()
            .push((row_count, column_names.to_vec()));
    }

    fn on_selection_changed(&self, change: &SelectionChanged) {
        self.changes.lock().unwrap().push(*change);
    }
}

/// Yields to tokio and counts how often the engine handed control back.
#[derive(Default)]
pub struct CountingScheduler {
    yields: AtomicUsize,
}

impl CountingScheduler {
    pub fn yields(&self) -> usize {
        self.yields.load(Ordering::SeqCst)
    }
}

impl HostScheduler for CountingScheduler {
    fn yield_now(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.yields.fetch_add(1, Ordering::SeqCst);
        Box::pin(tokio::task::yield_now())
    }
}

pub fn observed(
    dataset: &Dataset,
    options: EngineOptions,
) -> (Crossfilter, Arc<RecordingObserver>, Arc<CountingScheduler>) {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = Arc::new(CountingScheduler::default());
    let crossfilter = Crossfilter::builder()
        .options(options)
        .scheduler(scheduler.clone())
        .observer(observer.clone())
        .load(dataset.columns())
        .unwrap();
    (crossfilter, observer, scheduler)
}
