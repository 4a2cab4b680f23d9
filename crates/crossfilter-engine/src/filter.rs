//! Predicate state and selection-mask recomputation.
//!
//! The engine owns every piece of mutable filter state for one loaded dataset. Predicate edits
//! are cheap and synchronous; they only bump a generation counter. [`FilterEngine::recompute`]
//! then evaluates all active predicates in one forward pass over the rows, in batches separated
//! by cooperative yields to the host, and publishes the resulting mask as a new version.
//!
//! Recomputes are serialised. A pass snapshots the predicate generation when it starts; if the
//! generation moved by the time the pass ends, its result is dropped and exactly one follow-up
//! pass runs against the latest predicates. Readers only ever see published masks. The number of
//! dropped passes is reported with the published mask, and a long streak of them is logged at
//! warn level.

use crate::error::{CrossfilterResult, PredicateError};
use crate::events::{EngineObserver, SelectionChanged};
use crate::mask::SelectionMask;
use crate::options::EngineOptions;
use crate::predicate::{Predicate, RowTest};
use crossfilter_columnar::{BitVec, ColumnId, ColumnStore};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// A warning is logged each time this many more consecutive passes have been superseded.
const SUPERSEDED_PASSES_WARNING: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Filtering,
    Aggregating,
}

/// The host's cooperative scheduling primitive.
///
/// A browser host would resolve the future on the next idle or animation callback; native
/// hosts typically hand control back to their async runtime.
pub trait HostScheduler: Send + Sync {
    fn yield_now(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Yields to the surrounding tokio runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioYield;

impl HostScheduler for TokioYield {
    fn yield_now(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::task::yield_now())
    }
}

#[derive(Debug, Default)]
struct PredicateState {
    predicates: BTreeMap<ColumnId, Predicate>,
    generation: u64,
}

#[derive(Debug)]
struct Published {
    mask: Arc<SelectionMask>,
    generation: u64,
}

pub struct FilterEngine {
    store: Arc<ColumnStore>,
    options: EngineOptions,
    scheduler: Arc<dyn HostScheduler>,
    observers: Vec<Arc<dyn EngineObserver>>,
    predicates: Mutex<PredicateState>,
    published: Mutex<Published>,
    state: Mutex<EngineState>,
    recompute_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("rows", &self.store.row_count())
            .field("options", &self.options)
            .field("state", &self.state())
            .field("mask_version", &self.mask().version())
            .finish_non_exhaustive()
    }
}

impl FilterEngine {
    pub fn new(
        store: Arc<ColumnStore>,
        options: EngineOptions,
        scheduler: Arc<dyn HostScheduler>,
        observers: Vec<Arc<dyn EngineObserver>>,
    ) -> Self {
        let mask = Arc::new(SelectionMask::all_selected(store.row_count()));
        Self {
            store,
            options,
            scheduler,
            observers,
            predicates: Mutex::new(PredicateState::default()),
            published: Mutex::new(Published {
                mask,
                generation: 0,
            }),
            state: Mutex::new(EngineState::Idle),
            recompute_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ColumnStore> {
        &self.store
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replace (or with `None`, clear) the predicate on `column`.
    ///
    /// Unknown columns fail with a schema error and invalid predicates with
    /// [`PredicateError`]; in both cases the column keeps its previous predicate.
    pub fn set_predicate(
        &self,
        column: &str,
        predicate: Option<Predicate>,
    ) -> CrossfilterResult<()> {
        let id = self.store.require(column)?;
        if let Some(predicate) = &predicate {
            predicate
                .validate(self.store.column(id))
                .inspect_err(|err: &PredicateError| log::warn!("rejected predicate: {err}"))?;
        }

        let mut state = self.predicates.lock().expect("predicate state poisoned");
        let changed = match predicate {
            Some(predicate) => {
                if state.predicates.get(&id) == Some(&predicate) {
                    false
                } else {
                    state.predicates.insert(id, predicate);
                    true
                }
            }
            None => state.predicates.remove(&id).is_some(),
        };
        if changed {
            state.generation += 1;
        }
        Ok(())
    }

    pub fn clear_predicate(&self, column: &str) -> CrossfilterResult<()> {
        self.set_predicate(column, None)
    }

    pub fn clear_all(&self) {
        let mut state = self.predicates.lock().expect("predicate state poisoned");
        if !state.predicates.is_empty() {
            state.predicates.clear();
            state.generation += 1;
        }
    }

    pub fn predicate(&self, column: &str) -> Option<Predicate> {
        let id = self.store.column_id(column)?;
        self.predicates
            .lock()
            .expect("predicate state poisoned")
            .predicates
            .get(&id)
            .cloned()
    }

    /// Active predicates in column order.
    pub fn active_predicates(&self) -> Vec<(String, Predicate)> {
        let state = self.predicates.lock().expect("predicate state poisoned");
        state
            .predicates
            .iter()
            .map(|(id, p)| (self.store.column(*id).name().to_string(), p.clone()))
            .collect()
    }

    /// Whether predicates changed since the last published mask.
    pub fn is_dirty(&self) -> bool {
        let generation = self
            .predicates
            .lock()
            .expect("predicate state poisoned")
            .generation;
        generation != self.published_generation()
    }

    /// The last published mask.
    pub fn mask(&self) -> Arc<SelectionMask> {
        self.published
            .lock()
            .expect("published mask poisoned")
            .mask
            .clone()
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().expect("engine state poisoned")
    }

    /// Mark the engine as filtering until the guard drops, including when the recompute future
    /// is dropped mid-pass.
    fn enter_filtering(&self) -> StateGuard<'_> {
        *self.state.lock().expect("engine state poisoned") = EngineState::Filtering;
        StateGuard {
            engine: self,
            entered: Some(EngineState::Filtering),
        }
    }

    /// Mark the engine as aggregating until the guard drops. No-op while a recompute is running.
    pub(crate) fn enter_aggregating(&self) -> StateGuard<'_> {
        let mut state = self.state.lock().expect("engine state poisoned");
        let entered = (*state == EngineState::Idle).then_some(EngineState::Aggregating);
        if let Some(next) = entered {
            *state = next;
        }
        StateGuard {
            engine: self,
            entered,
        }
    }

    fn published_generation(&self) -> u64 {
        self.published
            .lock()
            .expect("published mask poisoned")
            .generation
    }

    /// Bring the published mask up to date with the current predicates.
    ///
    /// Returns immediately when nothing changed. Concurrent callers queue behind the running
    /// recompute and then observe its result.
    pub async fn recompute(&self) -> Arc<SelectionMask> {
        let _gate = self.recompute_gate.lock().await;
        let mut passes = 0usize;
        let mut superseded = 0usize;

        loop {
            let (generation, predicates) = {
                let state = self.predicates.lock().expect("predicate state poisoned");
                if state.generation == self.published_generation() {
                    return self.mask();
                }
                (state.generation, state.predicates.clone())
            };

            passes += 1;
            log::debug!(
                "selection pass {passes} started: generation {generation}, {} active predicates",
                predicates.len()
            );

            let bits = {
                let _filtering = self.enter_filtering();
                self.evaluate(&predicates).await
            };

            let latest = self
                .predicates
                .lock()
                .expect("predicate state poisoned")
                .generation;
            if latest != generation {
                superseded += 1;
                log::debug!(
                    "selection pass for generation {generation} superseded by generation {latest}"
                );
                if superseded % SUPERSEDED_PASSES_WARNING == 0 {
                    log::warn!(
                        "{superseded} selection passes superseded in a row; predicates are \
                         changing faster than a pass completes"
                    );
                }
                continue;
            }

            return self.publish(bits, generation, superseded);
        }
    }

    fn publish(&self, bits: BitVec, generation: u64, superseded: usize) -> Arc<SelectionMask> {
        let mask = {
            let mut published = self.published.lock().expect("published mask poisoned");
            let mask = Arc::new(SelectionMask::new(bits, published.mask.version() + 1));
            published.mask = mask.clone();
            published.generation = generation;
            mask
        };

        let change = SelectionChanged {
            mask_version: mask.version(),
            selected_count: mask.selected_count(),
            total_count: mask.row_count(),
            superseded_passes: superseded,
        };
        log::debug!(
            "published selection mask v{}: {} of {} rows selected after {} superseded passes",
            change.mask_version,
            change.selected_count,
            change.total_count,
            change.superseded_passes
        );
        for observer in &self.observers {
            observer.on_selection_changed(&change);
        }
        mask
    }

    /// One forward pass over every row, testing all active predicates per row.
    async fn evaluate(&self, predicates: &BTreeMap<ColumnId, Predicate>) -> BitVec {
        let rows = self.store.row_count();
        if predicates.is_empty() {
            return BitVec::with_len_all_true(rows);
        }

        let tests: Vec<RowTest<'_>> = predicates
            .iter()
            .filter_map(|(id, predicate)| RowTest::compile(predicate, self.store.column(*id)))
            .collect();

        let total_words = (rows + 63) / 64;
        let batch_words = self.options.batch_words();
        let mut words = vec![0u64; total_words];

        let mut word = 0;
        while word < total_words {
            let end = (word + batch_words).min(total_words);
            fill_words(&mut words[word..end], word * 64, rows, &tests);
            word = end;

            if word < total_words {
                log::trace!("selection batch done at row {}", word * 64);
                self.scheduler.yield_now().await;
            }
        }

        BitVec::from_words(words, rows)
    }
}

/// Evaluate rows `first_row..` into `words`, stopping at `rows`.
fn fill_words(words: &mut [u64], first_row: usize, rows: usize, tests: &[RowTest<'_>]) {
    for (i, out) in words.iter_mut().enumerate() {
        let base = first_row + i * 64;
        let end = (base + 64).min(rows);
        let mut word = 0u64;
        for row in base..end {
            if tests.iter().all(|t| t.test(row)) {
                word |= 1u64 << (row - base);
            }
        }
        *out = word;
    }
}

/// Restores [`EngineState::Idle`] on drop if the engine is still in the state it entered.
pub(crate) struct StateGuard<'a> {
    engine: &'a FilterEngine,
    entered: Option<EngineState>,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if let Some(entered) = self.entered {
            let mut state = self.engine.state.lock().expect("engine state poisoned");
            if *state == entered {
                *state = EngineState::Idle;
            }
        }
    }
}
