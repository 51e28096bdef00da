use std::sync::{Arc, OnceLock};

use mzpeaks::CentroidPeak;
use parking_lot::RwLock;
use thiserror::Error;

use crate::masslist::MassListSet;
use crate::storage::{ArrayStorage, StoredArray};

use super::mobility::MobilityScan;
use super::scan_properties::{MobilityType, ScanPolarity, SpectrumType};
use super::signal::{validate_mz_order, SignalArrays, SignalWriteError};
use super::traits::SpectrumLike;

/// The fragmentation trigger metadata recorded for a precursor isolated
/// within a frame, covering a contiguous range of its sub-scans.
#[derive(Debug, Clone, PartialEq)]
pub struct ImsMsMsInfo {
    /// The m/z the quadrupole isolated
    pub precursor_mz: f64,
    /// The first and last sub-scan index (inclusive) the isolation covers
    pub scan_range: (usize, usize),
    pub collision_energy: f32,
    pub precursor_charge: Option<i32>,
}

impl ImsMsMsInfo {
    pub fn new(
        precursor_mz: f64,
        scan_range: (usize, usize),
        collision_energy: f32,
        precursor_charge: Option<i32>,
    ) -> Self {
        Self {
            precursor_mz,
            scan_range,
            collision_energy,
            precursor_charge,
        }
    }

    /// Whether `scan_index` falls inside the sub-scan range this isolation
    /// event covers
    pub fn contains_scan(&self, scan_index: usize) -> bool {
        let (start, end) = self.scan_range;
        (start..=end).contains(&scan_index)
    }
}

/// The reasons a frame's sub-scan data can be rejected. Validation covers
/// every sub-scan before anything is persisted, so a failed write never
/// leaves a partially populated frame behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameWriteError {
    #[error("Mobility scan {scan}: {source}")]
    Scan {
        scan: usize,
        source: SignalWriteError,
    },
    #[error("Expected {expected} mobility scans to match the frame's mobility dimension, got {got}")]
    ScanCountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanEntry {
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) base_peak_index: Option<u32>,
}

/// The shared buffers all of a frame's sub-scans draw from.
///
/// Every sub-scan's samples are concatenated into one m/z and one intensity
/// array, stored once through the backing store, and addressed by the
/// per-scan offset table. Sub-scans hold no arrays of their own, which is
/// what keeps frames with hundreds of mobility scans affordable.
#[derive(Debug)]
pub struct MobilityScanStorage {
    mz: StoredArray<f64>,
    intensity: StoredArray<f32>,
    entries: Vec<ScanEntry>,
    mass_lists: Vec<MassListSet>,
}

impl MobilityScanStorage {
    fn build(
        storage: Option<&Arc<dyn ArrayStorage>>,
        scans: &[(Vec<f64>, Vec<f32>)],
    ) -> Result<Self, FrameWriteError> {
        let mut entries = Vec::with_capacity(scans.len());
        let mut offset = 0usize;
        for (scan, (mzs, intensities)) in scans.iter().enumerate() {
            if mzs.len() != intensities.len() {
                return Err(FrameWriteError::Scan {
                    scan,
                    source: SignalWriteError::LengthMismatch {
                        mz_len: mzs.len(),
                        intensity_len: intensities.len(),
                    },
                });
            }
            // Each sub-scan is ordered on its own; the concatenation as a
            // whole is not.
            validate_mz_order(mzs).map_err(|source| FrameWriteError::Scan { scan, source })?;
            let base_peak_index = intensities
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i as u32);
            entries.push(ScanEntry {
                offset,
                len: mzs.len(),
                base_peak_index,
            });
            offset += mzs.len();
        }

        let mut all_mzs = Vec::with_capacity(offset);
        let mut all_intensities = Vec::with_capacity(offset);
        for (mzs, intensities) in scans {
            all_mzs.extend_from_slice(mzs);
            all_intensities.extend_from_slice(intensities);
        }

        let mass_lists = (0..scans.len()).map(|_| MassListSet::default()).collect();
        Ok(Self {
            mz: StoredArray::store(storage, &all_mzs),
            intensity: StoredArray::store(storage, &all_intensities),
            entries,
            mass_lists,
        })
    }

    /// The number of sub-scans sharing these buffers
    pub fn num_scans(&self) -> usize {
        self.entries.len()
    }

    /// The total number of samples across all sub-scans
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Whether the shared buffers reached the backing store
    pub fn is_persisted(&self) -> bool {
        self.mz.is_persisted() && self.intensity.is_persisted()
    }

    pub(crate) fn entry(&self, scan_index: usize) -> Option<&ScanEntry> {
        self.entries.get(scan_index)
    }

    pub(crate) fn mz_at(&self, absolute: usize) -> f64 {
        self.mz.get(absolute).unwrap_or_else(|| {
            panic!(
                "Absolute sample index {absolute} out of bounds for {} samples",
                self.len()
            )
        })
    }

    pub(crate) fn intensity_at(&self, absolute: usize) -> f32 {
        self.intensity.get(absolute).unwrap_or_else(|| {
            panic!(
                "Absolute sample index {absolute} out of bounds for {} samples",
                self.len()
            )
        })
    }

    pub(crate) fn read_mz_slice(&self, offset: usize, count: usize, dst: &mut Vec<f64>) {
        self.mz.slice_into(offset, count, dst)
    }

    pub(crate) fn read_intensity_slice(&self, offset: usize, count: usize, dst: &mut Vec<f32>) {
        self.intensity.slice_into(offset, count, dst)
    }

    pub(crate) fn mass_lists_for(&self, scan_index: usize) -> &MassListSet {
        &self.mass_lists[scan_index]
    }
}

/// An aggregate acquisition event composed of many short mobility sub-scans.
///
/// A frame carries two storage surfaces. Its own merged spectrum behaves
/// like a [`Scan`](crate::spectrum::Scan)'s, except that it may be
/// re-populated: the merged signal is recomputed whenever the constituent
/// sub-scans are reprocessed, and each rewrite is validated and published as
/// a complete snapshot that replaces the previous one. Readers that already
/// hold the previous snapshot keep reading it unchanged.
///
/// The second surface is the sub-scan storage, set once, which
/// [`MobilityScan`] views address by offset and count.
#[derive(Debug)]
pub struct Frame {
    frame_number: usize,
    ms_level: u8,
    retention_time: f32,
    polarity: ScanPolarity,
    spectrum_type: SpectrumType,
    mobility_type: MobilityType,
    /// One mobility value per sub-scan index
    mobilities: Vec<f64>,
    msms_infos: Vec<ImsMsMsInfo>,
    signal: RwLock<Option<Arc<SignalArrays>>>,
    scan_data: OnceLock<MobilityScanStorage>,
    mass_lists: MassListSet,
}

impl Frame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frame_number: usize,
        ms_level: u8,
        retention_time: f32,
        polarity: ScanPolarity,
        spectrum_type: SpectrumType,
        mobility_type: MobilityType,
        mobilities: Vec<f64>,
    ) -> Self {
        Self {
            frame_number,
            ms_level,
            retention_time,
            polarity,
            spectrum_type,
            mobility_type,
            mobilities,
            msms_infos: Vec::new(),
            signal: RwLock::new(None),
            scan_data: OnceLock::new(),
            mass_lists: MassListSet::default(),
        }
    }

    /// Record a fragmentation event. Part of frame assembly, before the
    /// frame is shared.
    pub fn push_msms_info(&mut self, info: ImsMsMsInfo) {
        self.msms_infos.push(info);
    }

    /// Validate and store this frame's merged arrays, replacing any arrays
    /// stored before.
    ///
    /// Unlike an ordinary scan, a frame may be re-populated: its merged
    /// spectrum is an artifact of its sub-scans and is recomputed when they
    /// are. The new arrays and their summary are published together; readers
    /// that captured the previous snapshot are unaffected.
    pub fn set_data_points(
        &self,
        storage: Option<&Arc<dyn ArrayStorage>>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Result<(), SignalWriteError> {
        let arrays = Arc::new(SignalArrays::store(storage, mzs, intensities)?);
        *self.signal.write() = Some(arrays);
        Ok(())
    }

    /// The current merged arrays and summary as one consistent unit, or
    /// `None` before any were stored. The snapshot stays valid across a
    /// concurrent re-population.
    pub fn signal_snapshot(&self) -> Option<Arc<SignalArrays>> {
        self.signal.read().clone()
    }

    /// Store the samples of all sub-scans, concatenated into this frame's
    /// shared buffers.
    ///
    /// `scans` holds one `(mzs, intensities)` pair per sub-scan, index
    /// aligned with the mobility table given at construction. Each sub-scan
    /// is validated independently.
    ///
    /// # Panics
    /// If sub-scan data was already stored for this frame.
    pub fn set_mobility_scan_data(
        &self,
        storage: Option<&Arc<dyn ArrayStorage>>,
        scans: &[(Vec<f64>, Vec<f32>)],
    ) -> Result<(), FrameWriteError> {
        if scans.len() != self.mobilities.len() {
            return Err(FrameWriteError::ScanCountMismatch {
                expected: self.mobilities.len(),
                got: scans.len(),
            });
        }
        let built = MobilityScanStorage::build(storage, scans)?;
        if self.scan_data.set(built).is_err() {
            panic!(
                "Mobility scan data for frame {} is already stored and immutable",
                self.frame_number
            );
        }
        Ok(())
    }

    /// The shared sub-scan storage, or `None` before it was set
    pub fn mobility_scan_storage(&self) -> Option<&MobilityScanStorage> {
        self.scan_data.get()
    }

    pub(crate) fn scan_data(&self) -> &MobilityScanStorage {
        self.scan_data.get().unwrap_or_else(|| {
            panic!(
                "Mobility scan data for frame {} was never stored",
                self.frame_number
            )
        })
    }

    /// The number of sub-scans this frame was declared with
    pub fn num_mobility_scans(&self) -> usize {
        self.mobilities.len()
    }

    /// A view of the `index`th sub-scan, or `None` when the index is out of
    /// range or no sub-scan data was stored yet
    pub fn mobility_scan(&self, index: usize) -> Option<MobilityScan<'_>> {
        let entry = self.scan_data.get()?.entry(index)?;
        Some(MobilityScan::new(
            self,
            index,
            entry.offset,
            entry.len,
            entry.base_peak_index,
        ))
    }

    /// Iterate over views of all sub-scans in index order
    pub fn mobility_scans(&self) -> impl Iterator<Item = MobilityScan<'_>> {
        (0..self.num_mobility_scans()).filter_map(|i| self.mobility_scan(i))
    }

    /// The mobility value of the `index`th sub-scan.
    ///
    /// # Panics
    /// If `index` is out of bounds for the mobility dimension.
    pub fn mobility_for(&self, index: usize) -> f64 {
        self.mobilities[index]
    }

    pub fn mobilities(&self) -> &[f64] {
        &self.mobilities
    }

    /// The fragmentation event covering the given sub-scan, if any
    pub fn ims_msms_info_for(&self, scan_index: usize) -> Option<&ImsMsMsInfo> {
        self.msms_infos.iter().find(|i| i.contains_scan(scan_index))
    }

    pub fn msms_infos(&self) -> &[ImsMsMsInfo] {
        &self.msms_infos
    }

    pub fn frame_number(&self) -> usize {
        self.frame_number
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    /// The frame's acquisition time, in minutes, shared by all sub-scans
    pub fn retention_time(&self) -> f32 {
        self.retention_time
    }

    pub fn polarity(&self) -> ScanPolarity {
        self.polarity
    }

    pub fn mobility_type(&self) -> MobilityType {
        self.mobility_type
    }

    /// The named mass lists attached to the frame itself. Sub-scans carry
    /// their own, reachable through [`MobilityScan::mass_lists`].
    pub fn mass_lists(&self) -> &MassListSet {
        &self.mass_lists
    }
}

impl SpectrumLike for Frame {
    fn len(&self) -> usize {
        self.signal_snapshot().map(|s| s.len()).unwrap_or_default()
    }

    fn spectrum_type(&self) -> SpectrumType {
        self.spectrum_type
    }

    fn mz_value(&self, i: usize) -> f64 {
        self.signal_snapshot()
            .unwrap_or_else(|| panic!("Frame {} has no data points", self.frame_number))
            .mz_value(i)
    }

    fn intensity_value(&self, i: usize) -> f32 {
        self.signal_snapshot()
            .unwrap_or_else(|| panic!("Frame {} has no data points", self.frame_number))
            .intensity_value(i)
    }

    fn read_mz_values(&self, dst: &mut Vec<f64>) {
        match self.signal_snapshot() {
            Some(signal) => signal.read_mzs(dst),
            None => dst.clear(),
        }
    }

    fn read_intensity_values(&self, dst: &mut Vec<f32>) {
        match self.signal_snapshot() {
            Some(signal) => signal.read_intensities(dst),
            None => dst.clear(),
        }
    }

    fn mz_range(&self) -> Option<(f64, f64)> {
        self.signal_snapshot()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().mz_range)
    }

    fn tic(&self) -> Option<f32> {
        self.signal_snapshot()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().tic)
    }

    fn base_peak(&self) -> Option<CentroidPeak> {
        self.signal_snapshot()
            .filter(|s| !s.is_empty())
            .map(|s| s.summary().base_peak.clone())
    }
}
