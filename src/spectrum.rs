//! The spectrum-like entities of the storage layer: write-once [`Scan`]s,
//! re-writable aggregate [`Frame`]s, and the [`MobilityScan`] views that
//! address slices of a frame's shared buffers.
pub(crate) mod frame;
pub(crate) mod mobility;
pub(crate) mod scan;
pub(crate) mod scan_properties;
pub(crate) mod signal;
pub(crate) mod traits;

pub use frame::{Frame, FrameWriteError, ImsMsMsInfo, MobilityScanStorage};
pub use mobility::MobilityScan;
pub use scan::Scan;
pub use scan_properties::{MobilityType, ScanPolarity, SpectrumSummary, SpectrumType};
pub use signal::{SignalArrays, SignalWriteError};
pub use traits::{PointIter, SpectrumLike};
