use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use crate::storage::{ArrayStorage, StoredArray};

use super::scan_properties::SpectrumSummary;

/// The reasons a set of signal arrays can be rejected before anything is
/// persisted. Both conditions are validated over the complete input first,
/// so a failed write never leaves a partially stored spectrum behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalWriteError {
    #[error("The m/z values must be sorted in ascending order, found an inversion at index {0}")]
    MzOutOfOrder(usize),
    #[error("The m/z and intensity arrays must have the same length ({mz_len} != {intensity_len})")]
    LengthMismatch { mz_len: usize, intensity_len: usize },
}

/// One spectrum's paired m/z and intensity arrays together with the summary
/// statistics derived from them.
///
/// All three are produced by a single [`SignalArrays::store`] call and are
/// immutable afterwards, so any reader holding a `SignalArrays` observes the
/// arrays and their statistics as one consistent unit.
#[derive(Debug, Clone)]
pub struct SignalArrays {
    mz: StoredArray<f64>,
    intensity: StoredArray<f32>,
    summary: SpectrumSummary,
}

impl SignalArrays {
    /// Validate `mzs` and `intensities`, write them through `storage`, and
    /// derive their summary.
    ///
    /// When `storage` is `None` the arrays stay in process memory. A storage
    /// I/O failure also keeps them in memory and is logged rather than
    /// surfaced, because the spectrum is still fully functional afterwards.
    pub fn store(
        storage: Option<&Arc<dyn ArrayStorage>>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Result<Self, SignalWriteError> {
        if mzs.len() != intensities.len() {
            return Err(SignalWriteError::LengthMismatch {
                mz_len: mzs.len(),
                intensity_len: intensities.len(),
            });
        }
        validate_mz_order(mzs)?;
        let summary = SpectrumSummary::compute(mzs, intensities);
        Ok(Self {
            mz: StoredArray::store(storage, mzs),
            intensity: StoredArray::store(storage, intensities),
            summary,
        })
    }

    pub fn len(&self) -> usize {
        self.summary.count
    }

    pub fn is_empty(&self) -> bool {
        self.summary.count == 0
    }

    /// Whether both arrays reached the backing store
    pub fn is_persisted(&self) -> bool {
        self.mz.is_persisted() && self.intensity.is_persisted()
    }

    pub fn summary(&self) -> &SpectrumSummary {
        &self.summary
    }

    /// The m/z of the `i`th data point.
    ///
    /// # Panics
    /// If `i` is out of bounds.
    pub fn mz_value(&self, i: usize) -> f64 {
        self.mz
            .get(i)
            .unwrap_or_else(|| panic!("m/z index {i} out of bounds for {} data points", self.len()))
    }

    /// The intensity of the `i`th data point.
    ///
    /// # Panics
    /// If `i` is out of bounds.
    pub fn intensity_value(&self, i: usize) -> f32 {
        self.intensity.get(i).unwrap_or_else(|| {
            panic!(
                "intensity index {i} out of bounds for {} data points",
                self.len()
            )
        })
    }

    pub fn read_mzs(&self, dst: &mut Vec<f64>) {
        self.mz.read_into(dst)
    }

    pub fn read_intensities(&self, dst: &mut Vec<f32>) {
        self.intensity.read_into(dst)
    }

    pub fn mzs(&self) -> Cow<'_, [f64]> {
        self.mz.view()
    }

    pub fn intensities(&self) -> Cow<'_, [f32]> {
        self.intensity.view()
    }
}

/// Check that `mzs` is non-decreasing, reporting the index of the first
/// element that is greater than its successor.
pub(crate) fn validate_mz_order(mzs: &[f64]) -> Result<(), SignalWriteError> {
    for (i, pair) in mzs.windows(2).enumerate() {
        if pair[0] > pair[1] {
            return Err(SignalWriteError::MzOutOfOrder(i));
        }
    }
    Ok(())
}
