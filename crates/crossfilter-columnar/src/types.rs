#![forbid(unsafe_code)]

use std::fmt;

/// How a column's values are interpreted for binning and filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Real-valued with a linear `[min, max]` domain.
    #[default]
    Continuous,
    /// Degrees on a circle; values are normalised into `[0, 360)` and wrap instead of clamping.
    Angular,
    /// A small set of integer codes, each mapped to a display label.
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Continuous | ColumnKind::Angular)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Continuous => "continuous",
            ColumnKind::Angular => "angular",
            ColumnKind::Categorical => "categorical",
        })
    }
}

/// Order in which categorical bins are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryOrder {
    /// One bin per entry of the label table, in code order (empty categories included).
    #[default]
    Explicit,
    /// Bins follow the order in which codes first appear in the data; unobserved labels are
    /// appended afterwards in code order.
    FirstSeen,
}

/// Position of a column inside a [`crate::ColumnStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub(crate) usize);

impl ColumnId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Raw values handed over by an external loader.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    /// Numeric buffer for continuous and angular columns. Non-finite entries are treated as
    /// missing.
    Numeric(Vec<f64>),
    /// Pre-mapped category codes; `labels[code]` is the display label for `code`.
    Categorical {
        codes: Vec<Option<u32>>,
        labels: Vec<String>,
        order: CategoryOrder,
    },
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One column of already-parsed input.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInput {
    pub name: String,
    pub kind: ColumnKind,
    pub data: ColumnData,
}

impl ColumnInput {
    pub fn continuous(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Continuous,
            data: ColumnData::Numeric(values),
        }
    }

    pub fn angular(name: impl Into<String>, degrees: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Angular,
            data: ColumnData::Numeric(degrees),
        }
    }

    pub fn categorical(
        name: impl Into<String>,
        codes: Vec<Option<u32>>,
        labels: Vec<impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            data: ColumnData::Categorical {
                codes,
                labels: labels.into_iter().map(Into::into).collect(),
                order: CategoryOrder::Explicit,
            },
        }
    }

    /// Switch a categorical input to first-seen bin order. No-op for numeric inputs.
    pub fn with_category_order(mut self, order: CategoryOrder) -> Self {
        if let ColumnData::Categorical { order: o, .. } = &mut self.data {
            *o = order;
        }
        self
    }
}
