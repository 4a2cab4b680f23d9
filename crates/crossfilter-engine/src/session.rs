use crate::aggregate::{AggregatedBinCounts, AggregationView};
use crate::bins::BinIndex;
use crate::error::CrossfilterResult;
use crate::events::EngineObserver;
use crate::filter::{EngineState, FilterEngine, HostScheduler, TokioYield};
use crate::mask::SelectionMask;
use crate::options::EngineOptions;
use crate::predicate::Predicate;
use crate::summary::{summarize, SelectionSummary};
use crossfilter_columnar::{ColumnInput, ColumnStore};
use std::sync::Arc;

/// Configures and loads a [`Crossfilter`].
pub struct CrossfilterBuilder {
    options: EngineOptions,
    scheduler: Arc<dyn HostScheduler>,
    observers: Vec<Arc<dyn EngineObserver>>,
}

impl Default for CrossfilterBuilder {
    fn default() -> Self {
        Self {
            options: EngineOptions::default(),
            scheduler: Arc::new(TokioYield),
            observers: Vec::new(),
        }
    }
}

impl CrossfilterBuilder {
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn HostScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Ingest `columns`, build every bin index, and notify observers.
    ///
    /// Nothing is kept on failure; a reload always builds a fresh store, bin index and engine.
    pub fn load(self, columns: Vec<ColumnInput>) -> CrossfilterResult<Crossfilter> {
        self.options.validate()?;
        let store = Arc::new(ColumnStore::load(columns)?);
        let bins = Arc::new(BinIndex::build(&store, self.options.num_bins));
        let engine = Arc::new(FilterEngine::new(
            store.clone(),
            self.options,
            self.scheduler,
            self.observers.clone(),
        ));
        let view = AggregationView::new(engine.clone(), bins.clone());

        let names = store.column_names();
        for observer in &self.observers {
            observer.on_data_loaded(store.row_count(), &names);
        }

        Ok(Crossfilter {
            store,
            bins,
            engine,
            view,
        })
    }
}

/// One loaded dataset with its bin index, filter engine and aggregation view.
///
/// This is the surface an external renderer talks to: predicates in, selection notifications and
/// per-bin counts out.
pub struct Crossfilter {
    store: Arc<ColumnStore>,
    bins: Arc<BinIndex>,
    engine: Arc<FilterEngine>,
    view: AggregationView,
}

impl Crossfilter {
    pub fn builder() -> CrossfilterBuilder {
        CrossfilterBuilder::default()
    }

    /// Load with default options and no observers.
    pub fn load(columns: Vec<ColumnInput>) -> CrossfilterResult<Self> {
        Self::builder().load(columns)
    }

    pub fn store(&self) -> &Arc<ColumnStore> {
        &self.store
    }

    pub fn bins(&self) -> &Arc<BinIndex> {
        &self.bins
    }

    pub fn engine(&self) -> &Arc<FilterEngine> {
        &self.engine
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.store.column_names()
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn set_predicate(&self, column: &str, predicate: Predicate) -> CrossfilterResult<()> {
        self.engine.set_predicate(column, Some(predicate))
    }

    pub fn clear_predicate(&self, column: &str) -> CrossfilterResult<()> {
        self.engine.clear_predicate(column)
    }

    pub fn clear_all(&self) {
        self.engine.clear_all()
    }

    /// See [`FilterEngine::recompute`].
    pub async fn recompute(&self) -> Arc<SelectionMask> {
        self.engine.recompute().await
    }

    pub fn mask(&self) -> Arc<SelectionMask> {
        self.engine.mask()
    }

    pub fn selected_count(&self) -> usize {
        self.engine.mask().selected_count()
    }

    /// Per-bin counts against the last published mask (sampled for large bins).
    pub fn aggregated_counts(&self, column: &str) -> CrossfilterResult<Arc<AggregatedBinCounts>> {
        let id = self.store.require(column)?;
        Ok(self.view.counts_for(id))
    }

    pub fn exact_aggregated_counts(&self, column: &str) -> CrossfilterResult<AggregatedBinCounts> {
        let id = self.store.require(column)?;
        Ok(self.view.exact_counts_for(id))
    }

    /// Row ids selected by the last published mask, ascending.
    pub fn filtered_row_indices(&self) -> Vec<u32> {
        self.engine.mask().selected_rows()
    }

    /// Statistics over the selected rows of a numeric column; `None` for categorical columns.
    pub fn selection_summary(&self, column: &str) -> CrossfilterResult<Option<SelectionSummary>> {
        let id = self.store.require(column)?;
        Ok(summarize(self.store.column(id), &self.engine.mask()))
    }
}
