use mzpeaks::CentroidPeak;

use crate::masslist::MassListSet;

use super::frame::{Frame, ImsMsMsInfo};
use super::scan_properties::SpectrumType;
use super::traits::SpectrumLike;

/// One sub-scan within a [`Frame`], addressing a slice of the frame's shared
/// buffers by offset and count.
///
/// A `MobilityScan` owns no arrays. Every read translates the local index
/// into the shared buffers, and every cross-cutting property (retention
/// time, mobility, spectrum type, MS/MS metadata) is answered by the frame,
/// parameterized by this scan's index. The borrow on the frame keeps a view
/// from outliving the buffers it addresses.
#[derive(Debug, Clone, Copy)]
pub struct MobilityScan<'a> {
    frame: &'a Frame,
    index: usize,
    offset: usize,
    len: usize,
    base_peak_index: Option<u32>,
}

impl<'a> MobilityScan<'a> {
    pub(crate) fn new(
        frame: &'a Frame,
        index: usize,
        offset: usize,
        len: usize,
        base_peak_index: Option<u32>,
    ) -> Self {
        Self {
            frame,
            index,
            offset,
            len,
            base_peak_index,
        }
    }

    /// This sub-scan's index within its frame
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frame(&self) -> &'a Frame {
        self.frame
    }

    /// Where this sub-scan's samples begin in the frame's shared buffers
    pub fn storage_offset(&self) -> usize {
        self.offset
    }

    /// The index of the most intense sample within this sub-scan, when one
    /// exists
    pub fn base_peak_index(&self) -> Option<usize> {
        self.base_peak_index.map(|i| i as usize)
    }

    /// The ion mobility value this sub-scan was acquired at
    pub fn mobility(&self) -> f64 {
        self.frame.mobility_for(self.index)
    }

    /// The acquisition time of the parent frame, in minutes
    pub fn retention_time(&self) -> f32 {
        self.frame.retention_time()
    }

    /// The fragmentation event covering this sub-scan, if any
    pub fn msms_info(&self) -> Option<&'a ImsMsMsInfo> {
        self.frame.ims_msms_info_for(self.index)
    }

    /// The named mass lists attached to this sub-scan
    pub fn mass_lists(&self) -> &'a MassListSet {
        self.frame.scan_data().mass_lists_for(self.index)
    }

    fn absolute(&self, i: usize) -> usize {
        assert!(
            i < self.len,
            "Sample index {i} out of bounds for mobility scan of {} samples",
            self.len
        );
        self.offset + i
    }
}

impl SpectrumLike for MobilityScan<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn spectrum_type(&self) -> SpectrumType {
        self.frame.spectrum_type()
    }

    fn mz_value(&self, i: usize) -> f64 {
        self.frame.scan_data().mz_at(self.absolute(i))
    }

    fn intensity_value(&self, i: usize) -> f32 {
        self.frame.scan_data().intensity_at(self.absolute(i))
    }

    fn read_mz_values(&self, dst: &mut Vec<f64>) {
        self.frame.scan_data().read_mz_slice(self.offset, self.len, dst)
    }

    fn read_intensity_values(&self, dst: &mut Vec<f32>) {
        self.frame
            .scan_data()
            .read_intensity_slice(self.offset, self.len, dst)
    }

    fn mz_range(&self) -> Option<(f64, f64)> {
        if self.len == 0 {
            None
        } else {
            Some((self.mz_value(0), self.mz_value(self.len - 1)))
        }
    }

    /// Sub-scans do not cache a total ion current of their own
    fn tic(&self) -> Option<f32> {
        None
    }

    fn base_peak(&self) -> Option<CentroidPeak> {
        self.base_peak_index.map(|i| {
            CentroidPeak::new(
                self.mz_value(i as usize),
                self.intensity_value(i as usize),
                i,
            )
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::super::frame::Frame;
    use super::super::scan_properties::{MobilityType, ScanPolarity, SpectrumType};
    use super::*;
    use crate::masslist::MassList;
    use crate::storage::{ArrayStorage, MemoryMapStore};

    fn make_frame() -> Frame {
        let frame = Frame::new(
            9,
            1,
            3.75,
            ScanPolarity::Positive,
            SpectrumType::Profile,
            MobilityType::Tims,
            vec![1.25, 1.15, 1.05],
        );
        frame
            .set_mobility_scan_data(
                None,
                &[
                    (vec![100.0, 200.0], vec![10.0, 20.0]),
                    (vec![], vec![]),
                    (vec![150.0, 160.0, 170.0], vec![5.0, 50.0, 15.0]),
                ],
            )
            .unwrap();
        frame
    }

    #[test]
    fn test_delegation_to_frame() {
        let frame = make_frame();
        let scan = frame.mobility_scan(2).unwrap();
        assert_eq!(scan.index(), 2);
        assert_eq!(scan.retention_time(), 3.75);
        assert_eq!(scan.mobility(), 1.05);
        assert_eq!(scan.spectrum_type(), SpectrumType::Profile);
        assert_eq!(scan.frame().frame_number(), 9);
    }

    #[test]
    fn test_indexed_reads() {
        let frame = make_frame();
        let scan = frame.mobility_scan(2).unwrap();
        assert_eq!(scan.storage_offset(), 2);
        assert_eq!(scan.len(), 3);
        assert_eq!(scan.mz_value(0), 150.0);
        assert_eq!(scan.intensity_value(1), 50.0);
        assert_eq!(scan.mz_range(), Some((150.0, 170.0)));

        let mut buf = Vec::new();
        scan.read_mz_values(&mut buf);
        assert_eq!(buf, [150.0, 160.0, 170.0]);
        let mut buf = Vec::new();
        scan.read_intensity_values(&mut buf);
        assert_eq!(buf, [5.0, 50.0, 15.0]);
    }

    #[test]
    fn test_persisted_shared_buffers() {
        let store: Arc<dyn ArrayStorage> = Arc::new(MemoryMapStore::new().unwrap());
        let frame = Frame::new(
            1,
            1,
            0.0,
            ScanPolarity::Unknown,
            SpectrumType::Centroid,
            MobilityType::Tims,
            vec![0.9, 0.8],
        );
        frame
            .set_mobility_scan_data(
                Some(&store),
                &[
                    (vec![300.0, 310.0], vec![1.0, 2.0]),
                    (vec![305.0], vec![3.0]),
                ],
            )
            .unwrap();
        assert!(frame.mobility_scan_storage().unwrap().is_persisted());
        let scan = frame.mobility_scan(1).unwrap();
        assert_eq!(scan.mz_value(0), 305.0);
        assert_eq!(scan.intensity_value(0), 3.0);
    }

    #[test]
    fn test_base_peak() {
        let frame = make_frame();
        let scan = frame.mobility_scan(2).unwrap();
        assert_eq!(scan.base_peak_index(), Some(1));
        let bp = scan.base_peak().unwrap();
        assert_eq!(bp.mz, 160.0);
        assert_eq!(bp.intensity, 50.0);
        assert_eq!(scan.base_peak_mz(), Some(160.0));
    }

    #[test]
    fn test_empty_sub_scan() {
        let frame = make_frame();
        let scan = frame.mobility_scan(1).unwrap();
        assert!(scan.is_empty());
        assert!(scan.base_peak().is_none());
        assert!(scan.base_peak_mz().is_none());
        assert!(scan.mz_range().is_none());
        assert!(scan.tic().is_none());
        let mut buf = Vec::new();
        scan.read_mz_values(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "out of bounds for mobility scan")]
    fn test_out_of_bounds_read() {
        let frame = make_frame();
        let scan = frame.mobility_scan(0).unwrap();
        scan.mz_value(2);
    }

    #[test]
    fn test_iteration() {
        let frame = make_frame();
        let scan = frame.mobility_scan(2).unwrap();
        let points: Vec<_> = scan.iter_points().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].mz, 150.0);
        assert_eq!(points[2].intensity, 15.0);
        // restartable on request
        assert_eq!(scan.iter_points().count(), 3);
    }

    #[test]
    fn test_msms_info_delegation() {
        let mut frame = Frame::new(
            2,
            2,
            1.0,
            ScanPolarity::Positive,
            SpectrumType::Centroid,
            MobilityType::Tims,
            vec![1.0, 0.9],
        );
        frame.push_msms_info(ImsMsMsInfo::new(512.3, (1, 1), 42.0, None));
        frame
            .set_mobility_scan_data(None, &[(vec![1.0], vec![1.0]), (vec![2.0], vec![2.0])])
            .unwrap();

        assert!(frame.mobility_scan(0).unwrap().msms_info().is_none());
        let info = frame.mobility_scan(1).unwrap().msms_info().unwrap();
        assert_eq!(info.precursor_mz, 512.3);
    }

    #[test]
    fn test_sub_scan_mass_lists() {
        let frame = make_frame();
        let scan = frame.mobility_scan(0).unwrap();
        assert!(scan.mass_lists().is_empty());

        let list = Arc::new(MassList::new("centroid", None, &[110.0], &[5.0]).unwrap());
        scan.mass_lists().add(list);
        assert_eq!(scan.mass_lists().len(), 1);
        assert!(scan.mass_lists().get("centroid").is_some());

        // attached to this sub-scan only
        assert!(frame.mobility_scan(2).unwrap().mass_lists().is_empty());
        assert!(frame.mass_lists().is_empty());
    }
}
