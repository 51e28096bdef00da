use mzpeaks::CentroidPeak;

/**
The kind of signal a spectrum carries, either discrete centroided peaks or
a continuously sampled profile curve.

Acquisition software does not always record which one it produced, so the
`Unknown` option is retained for partially initialized entities.
*/
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumType {
    #[default]
    Unknown = 0,
    Centroid = 1,
    Profile = 2,
}

/// The polarity of the ion source during a scan
#[repr(i8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolarity {
    #[default]
    Unknown = 0,
    Positive = 1,
    Negative = -1,
}

/// The ion mobility separation scheme a frame's sub-scans were acquired with
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MobilityType {
    #[default]
    Unknown,
    /// Trapped ion mobility, scanned in decreasing 1/K0
    Tims,
    DriftTube,
    TravelingWave,
    Faims,
}

/// A set of common summary metrics describing a spectrum, computed once when
/// its arrays are stored and cached alongside them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpectrumSummary {
    /// The total ion current, the sum of all intensities
    pub tic: f32,
    /// The base peak, the most intense data point in the spectrum
    pub base_peak: CentroidPeak,
    /// The minimum and maximum m/z observed
    pub mz_range: (f64, f64),
    /// The number of data points in the spectrum
    pub count: usize,
}

impl SpectrumSummary {
    pub fn new(tic: f32, base_peak: CentroidPeak, mz_range: (f64, f64), count: usize) -> Self {
        Self {
            tic,
            base_peak,
            mz_range,
            count,
        }
    }

    /// Fold `mzs` and `intensities` down to their summary in a single pass.
    /// Assumes `mzs` is already sorted ascending, which callers have
    /// validated before storing.
    pub fn compute(mzs: &[f64], intensities: &[f32]) -> Self {
        let (tic, (bpmz, bpint, bpidx)) = mzs.iter().zip(intensities.iter()).enumerate().fold(
            (0.0f32, (0.0f64, 0.0f32, 0usize)),
            |(mut tic, (mut bpmz, mut bpint, mut bpidx)), (idx, (mz, int))| {
                tic += int;
                if *int > bpint {
                    bpint = *int;
                    bpmz = *mz;
                    bpidx = idx;
                }
                (tic, (bpmz, bpint, bpidx))
            },
        );
        let mz_range = if mzs.is_empty() {
            (0.0, 0.0)
        } else {
            (*mzs.first().unwrap(), *mzs.last().unwrap())
        };
        Self::new(
            tic,
            CentroidPeak::new(bpmz, bpint, bpidx as u32),
            mz_range,
            mzs.len(),
        )
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
