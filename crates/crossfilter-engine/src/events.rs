/// Published once per completed recompute that produced a new mask version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionChanged {
    pub mask_version: u64,
    pub selected_count: usize,
    pub total_count: usize,
    /// Passes discarded because predicates changed while they ran.
    pub superseded_passes: usize,
}

impl SelectionChanged {
    /// Share of rows still selected; `1.0` for an empty dataset.
    pub fn fraction(&self) -> f64 {
        if self.total_count == 0 {
            1.0
        } else {
            self.selected_count as f64 / self.total_count as f64
        }
    }
}

/// Receives engine notifications on behalf of an external renderer.
///
/// Both callbacks run synchronously on the thread driving the engine, after the corresponding
/// state is fully published.
pub trait EngineObserver: Send + Sync {
    fn on_data_loaded(&self, _row_count: usize, _column_names: &[String]) {}

    fn on_selection_changed(&self, _change: &SelectionChanged) {}
}
