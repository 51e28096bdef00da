use std::sync::{Arc, OnceLock};

use mzpeaks::CentroidPeak;

use crate::masslist::MassListSet;
use crate::storage::ArrayStorage;

use super::scan_properties::{ScanPolarity, SpectrumType};
use super::signal::{SignalArrays, SignalWriteError};
use super::traits::SpectrumLike;

/// An ordinary acquisition spectrum whose arrays are set at most once.
///
/// A `Scan` is created empty (or through [`Scan::with_data`]) and its arrays
/// are published through a one-shot cell, so every reader observes either no
/// data at all or the complete arrays together with their derived summary.
/// Once non-empty data is in place the scan is immutable, except for its
/// mass lists which may be attached and replaced throughout its life.
#[derive(Debug)]
pub struct Scan {
    scan_number: usize,
    ms_level: u8,
    retention_time: f32,
    polarity: ScanPolarity,
    spectrum_type: SpectrumType,
    data: OnceLock<Arc<SignalArrays>>,
    mass_lists: MassListSet,
}

impl Scan {
    pub fn new(
        scan_number: usize,
        ms_level: u8,
        retention_time: f32,
        polarity: ScanPolarity,
        spectrum_type: SpectrumType,
    ) -> Self {
        Self {
            scan_number,
            ms_level,
            retention_time,
            polarity,
            spectrum_type,
            data: OnceLock::new(),
            mass_lists: MassListSet::default(),
        }
    }

    /// Create a scan and store its arrays in one step, the preferred path at
    /// import time
    #[allow(clippy::too_many_arguments)]
    pub fn with_data(
        scan_number: usize,
        ms_level: u8,
        retention_time: f32,
        polarity: ScanPolarity,
        spectrum_type: SpectrumType,
        storage: Option<&Arc<dyn ArrayStorage>>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Result<Self, SignalWriteError> {
        let scan = Self::new(scan_number, ms_level, retention_time, polarity, spectrum_type);
        scan.set_data_points(storage, mzs, intensities)?;
        Ok(scan)
    }

    /// Validate and store this scan's arrays, deriving their summary.
    ///
    /// Malformed input is surfaced as a [`SignalWriteError`] before anything
    /// is persisted. A backing store I/O failure is absorbed by keeping the
    /// arrays in memory.
    ///
    /// # Panics
    /// If arrays were already stored for this scan. Only aggregate
    /// [`Frame`](crate::spectrum::Frame)s may be re-populated.
    pub fn set_data_points(
        &self,
        storage: Option<&Arc<dyn ArrayStorage>>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Result<(), SignalWriteError> {
        if self.data.get().is_some() {
            panic!(
                "Data points for scan {} are already stored and immutable",
                self.scan_number
            );
        }
        let arrays = Arc::new(SignalArrays::store(storage, mzs, intensities)?);
        if self.data.set(arrays).is_err() {
            panic!(
                "Data points for scan {} are already stored and immutable",
                self.scan_number
            );
        }
        Ok(())
    }

    /// The stored arrays and their summary, or `None` before any were set
    pub fn signal(&self) -> Option<&Arc<SignalArrays>> {
        self.data.get()
    }

    pub fn scan_number(&self) -> usize {
        self.scan_number
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    /// The scan start time, in minutes
    pub fn retention_time(&self) -> f32 {
        self.retention_time
    }

    pub fn polarity(&self) -> ScanPolarity {
        self.polarity
    }

    /// The named mass lists attached to this scan
    pub fn mass_lists(&self) -> &MassListSet {
        &self.mass_lists
    }
}

impl SpectrumLike for Scan {
    fn len(&self) -> usize {
        self.signal().map(|s| s.len()).unwrap_or_default()
    }

    fn spectrum_type(&self) -> SpectrumType {
        self.spectrum_type
    }

    fn mz_value(&self, i: usize) -> f64 {
        self.signal()
            .unwrap_or_else(|| panic!("Scan {} has no data points", self.scan_number))
            .mz_value(i)
    }

    fn intensity_value(&self, i: usize) -> f32 {
        self.signal()
            .unwrap_or_else(|| panic!("Scan {} has no data points", self.scan_number))
            .intensity_value(i)
    }

    fn read_mz_values(&self, dst: &mut Vec<f64>) {
        match self.signal() {
            Some(signal) => signal.read_mzs(dst),
            None => dst.clear(),
        }
    }

    fn read_intensity_values(&self, dst: &mut Vec<f32>) {
        match self.signal() {
            Some(signal) => signal.read_intensities(dst),
            None => dst.clear(),
        }
    }

    fn mz_range(&self) -> Option<(f64, f64)> {
        self.signal()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().mz_range)
    }

    fn tic(&self) -> Option<f32> {
        self.signal()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().tic)
    }

    fn base_peak(&self) -> Option<CentroidPeak> {
        self.signal()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().base_peak.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::MemoryMapStore;

    fn make_scan() -> Scan {
        Scan::new(1, 1, 0.5, ScanPolarity::Positive, SpectrumType::Centroid)
    }

    #[test]
    fn test_set_and_read() {
        let scan = make_scan();
        let mzs = [100.0, 200.0, 300.0];
        let intensities = [5.0f32, 25.0, 10.0];
        scan.set_data_points(None, &mzs, &intensities).unwrap();

        assert_eq!(scan.len(), 3);
        let mut buf = Vec::new();
        scan.read_mz_values(&mut buf);
        assert_eq!(buf, mzs);
        let mut buf = Vec::new();
        scan.read_intensity_values(&mut buf);
        assert_eq!(buf, intensities);

        assert_eq!(scan.tic(), Some(40.0));
        assert_eq!(scan.base_peak_mz(), Some(200.0));
        assert_eq!(scan.base_peak_intensity(), Some(25.0));
        assert_eq!(scan.mz_range(), Some((100.0, 300.0)));
    }

    #[test]
    fn test_with_data_persisted() {
        let store: Arc<dyn ArrayStorage> = Arc::new(MemoryMapStore::new().unwrap());
        let scan = Scan::with_data(
            7,
            2,
            12.25,
            ScanPolarity::Negative,
            SpectrumType::Profile,
            Some(&store),
            &[400.0, 401.0],
            &[1.0, 2.0],
        )
        .unwrap();
        assert!(scan.signal().unwrap().is_persisted());
        assert_eq!(scan.scan_number(), 7);
        assert_eq!(scan.ms_level(), 2);
        assert_eq!(scan.retention_time(), 12.25);
        assert_eq!(scan.polarity(), ScanPolarity::Negative);
        assert_eq!(scan.mz_value(1), 401.0);
    }

    #[test]
    #[should_panic(expected = "already stored and immutable")]
    fn test_rewrite_rejected() {
        let scan = make_scan();
        scan.set_data_points(None, &[1.0, 2.0], &[1.0, 1.0]).unwrap();
        let _ = scan.set_data_points(None, &[3.0, 4.0], &[1.0, 1.0]);
    }

    #[test]
    fn test_invalid_input_leaves_scan_empty() {
        let scan = make_scan();
        let err = scan
            .set_data_points(None, &[2.0, 1.0], &[1.0, 1.0])
            .unwrap_err();
        assert_eq!(err, SignalWriteError::MzOutOfOrder(0));
        assert!(scan.is_empty());
        assert!(scan.tic().is_none());

        // A rejected write does not consume the one-shot slot
        scan.set_data_points(None, &[1.0, 2.0], &[1.0, 1.0]).unwrap();
        assert_eq!(scan.len(), 2);
    }

    #[test]
    fn test_empty_scan_reads() {
        let scan = make_scan();
        assert!(scan.is_empty());
        let mut buf = vec![9.0f64; 4];
        scan.read_mz_values(&mut buf);
        assert!(buf.is_empty());
        assert!(scan.tic().is_none());
        assert!(scan.base_peak().is_none());
        assert!(scan.mz_range().is_none());
        assert!(scan.get(0).is_none());
        assert_eq!(scan.iter_points().count(), 0);
    }

    #[test]
    fn test_iteration() {
        let scan = make_scan();
        scan.set_data_points(None, &[10.0, 20.0, 30.0], &[1.0, 2.0, 3.0])
            .unwrap();
        let points: Vec<_> = scan.iter_points().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].mz, 20.0);
        assert_eq!(points[1].intensity, 2.0);

        // A fresh iterator restarts the sequence
        assert_eq!(scan.iter_points().next().unwrap().mz, 10.0);
        assert_eq!(scan.iter_points().rev().next().unwrap().mz, 30.0);
    }
}
