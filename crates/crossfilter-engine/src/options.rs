use crate::error::OptionsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Number of equal-width bins for continuous and angular columns.
    pub num_bins: usize,
    /// Bins with more rows than this are counted from a fixed-stride sample of this many rows.
    pub sampling_threshold: usize,
    /// Rows evaluated between cooperative yields during a recompute. Rounded up to a multiple
    /// of 64 so each batch fills whole mask words.
    pub batch_rows: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            num_bins: 50,
            sampling_threshold: 1_000,
            batch_rows: 100_000,
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.num_bins == 0 {
            return Err(OptionsError::Zero { field: "num_bins" });
        }
        if self.sampling_threshold == 0 {
            return Err(OptionsError::Zero {
                field: "sampling_threshold",
            });
        }
        if self.batch_rows == 0 {
            return Err(OptionsError::Zero {
                field: "batch_rows",
            });
        }
        Ok(())
    }

    pub(crate) fn batch_words(&self) -> usize {
        ((self.batch_rows + 63) / 64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_round_up_to_whole_words() {
        let options = EngineOptions {
            batch_rows: 65,
            ..EngineOptions::default()
        };
        assert_eq!(options.batch_words(), 2);
        assert_eq!(EngineOptions::default().batch_words(), 1_563);
    }

    #[test]
    fn zero_fields_are_rejected() {
        let options = EngineOptions {
            sampling_threshold: 0,
            ..EngineOptions::default()
        };
        assert_eq!(
            options.validate(),
            Err(OptionsError::Zero {
                field: "sampling_threshold"
            })
        );
        assert_eq!(EngineOptions::default().validate(), Ok(()));
    }
}
