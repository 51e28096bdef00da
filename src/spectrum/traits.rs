use std::iter::FusedIterator;

use mzpeaks::{peak::MZPoint, CentroidPeak};

use super::scan_properties::SpectrumType;

/// The uniform read API every spectrum-like entity exposes, whether it owns
/// its arrays ([`Scan`](crate::spectrum::Scan), [`Frame`](crate::spectrum::Frame),
/// [`MassList`](crate::masslist::MassList)) or addresses a slice of someone
/// else's ([`MobilityScan`](crate::spectrum::MobilityScan)).
///
/// An entity that never received data behaves as an empty spectrum: indexed
/// reads are out of bounds, bulk reads produce zero-length results, and the
/// derived summary accessors return `None`.
pub trait SpectrumLike {
    /// The number of data points in the spectrum
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the signal is centroided or a sampled profile
    fn spectrum_type(&self) -> SpectrumType;

    /// The m/z of the `i`th data point.
    ///
    /// # Panics
    /// If `i` is out of bounds.
    fn mz_value(&self, i: usize) -> f64;

    /// The intensity of the `i`th data point.
    ///
    /// # Panics
    /// If `i` is out of bounds.
    fn intensity_value(&self, i: usize) -> f32;

    /// Copy all m/z values into `dst`, reusing its capacity when it is
    /// already large enough
    fn read_mz_values(&self, dst: &mut Vec<f64>);

    /// Copy all intensity values into `dst`, reusing its capacity when it is
    /// already large enough
    fn read_intensity_values(&self, dst: &mut Vec<f32>);

    /// The minimum and maximum m/z, or `None` for an empty spectrum
    fn mz_range(&self) -> Option<(f64, f64)>;

    /// The total ion current, or `None` when it was never computed
    fn tic(&self) -> Option<f32>;

    /// The most intense data point, or `None` when it is not known
    fn base_peak(&self) -> Option<CentroidPeak>;

    fn base_peak_mz(&self) -> Option<f64> {
        self.base_peak().map(|p| p.mz)
    }

    fn base_peak_intensity(&self) -> Option<f32> {
        self.base_peak().map(|p| p.intensity)
    }

    /// Get the `i`th data point, or `None` past the end of the spectrum
    fn get(&self, i: usize) -> Option<MZPoint> {
        if i < self.len() {
            Some(MZPoint::new(self.mz_value(i), self.intensity_value(i)))
        } else {
            None
        }
    }

    /// Iterate over the (m/z, intensity) pairs of this spectrum in order.
    /// The sequence is forward-only and single-pass; calling this method
    /// again restarts it from the beginning.
    fn iter_points(&self) -> PointIter<'_, Self>
    where
        Self: Sized,
    {
        PointIter::new(self)
    }
}

/// An [`MZPoint`] cursor over any [`SpectrumLike`]'s data points
pub struct PointIter<'a, S: SpectrumLike> {
    source: &'a S,
    i: usize,
    n: usize,
}

impl<'a, S: SpectrumLike> PointIter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        let n = source.len();
        Self { source, i: 0, n }
    }
}

impl<S: SpectrumLike> Iterator for PointIter<'_, S> {
    type Item = MZPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.i;
        if i >= self.n {
            None
        } else {
            self.i += 1;
            self.source.get(i)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n.saturating_sub(self.i);
        (remaining, Some(remaining))
    }
}

impl<S: SpectrumLike> ExactSizeIterator for PointIter<'_, S> {}

impl<S: SpectrumLike> FusedIterator for PointIter<'_, S> {}

impl<S: SpectrumLike> DoubleEndedIterator for PointIter<'_, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.n <= self.i {
            None
        } else {
            self.n -= 1;
            self.source.get(self.n)
        }
    }
}
