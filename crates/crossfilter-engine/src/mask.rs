use crossfilter_columnar::BitVec;

/// The published "is this row visible" vector.
///
/// Masks are immutable once published; the filter engine swaps in a new `Arc<SelectionMask>`
/// with a higher version after each completed recompute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionMask {
    bits: BitVec,
    version: u64,
}

impl SelectionMask {
    pub(crate) fn all_selected(rows: usize) -> Self {
        Self {
            bits: BitVec::with_len_all_true(rows),
            version: 0,
        }
    }

    pub(crate) fn new(bits: BitVec, version: u64) -> Self {
        Self { bits, version }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn row_count(&self) -> usize {
        self.bits.len()
    }

    pub fn selected_count(&self) -> usize {
        self.bits.count_ones()
    }

    #[inline]
    pub fn is_selected(&self, row: usize) -> bool {
        row < self.bits.len() && self.bits.get(row)
    }

    pub fn is_all_selected(&self) -> bool {
        self.bits.all_true()
    }

    pub fn is_none_selected(&self) -> bool {
        self.bits.all_false()
    }

    pub fn bits(&self) -> &BitVec {
        &self.bits
    }

    pub fn iter_selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    pub fn selected_rows(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.selected_count());
        out.extend(self.bits.iter_ones().map(|row| row as u32));
        out
    }
}
