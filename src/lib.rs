//! `mzstore` is a storage and addressing layer for the very large paired
//! m/z and intensity arrays a mass spectrometry acquisition produces. It
//! keeps the arrays out of process memory by writing them once through an
//! append-only, memory-mapped backing store, while still offering fast,
//! allocation-light random access for downstream analysis.
//!
//! The layer is built from three pieces:
//!
//! - [`storage`]: the [`ArrayStorage`] contract and its memory-mapped
//!   implementation [`MemoryMapStore`], plus [`StoredArray`] which records
//!   whether an array was persisted or fell back to process memory.
//! - [`spectrum`]: the spectrum-like entities. A [`Scan`] stores its arrays
//!   at most once; a [`Frame`] may be re-populated and additionally owns the
//!   shared buffers its [`MobilityScan`] views address by offset and count.
//! - [`masslist`]: named derived peak sets with replace-on-name-collision
//!   semantics, attachable to any spectrum-like owner.
//!
//! ```
//! use std::sync::Arc;
//! use mzstore::prelude::*;
//! use mzstore::{MemoryMapStore, Scan, ScanPolarity, SpectrumType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn ArrayStorage> = Arc::new(MemoryMapStore::new()?);
//! let scan = Scan::with_data(
//!     1,
//!     1,
//!     0.25,
//!     ScanPolarity::Positive,
//!     SpectrumType::Centroid,
//!     Some(&store),
//!     &[204.08, 366.14, 528.19],
//!     &[1200.0, 3400.0, 900.0],
//! )?;
//! assert_eq!(scan.base_peak_mz(), Some(366.14));
//! assert_eq!(scan.tic(), Some(5500.0));
//! # Ok(())
//! # }
//! ```
pub mod masslist;
pub mod prelude;
pub mod spectrum;
pub mod storage;

pub use crate::masslist::{MassList, MassListSet};
pub use crate::spectrum::{
    Frame, FrameWriteError, ImsMsMsInfo, MobilityScan, MobilityScanStorage, MobilityType,
    PointIter, Scan, ScanPolarity, SignalArrays, SignalWriteError, SpectrumSummary, SpectrumType,
};
pub use crate::storage::{ArrayStorage, MemoryMapStore, StorageHandle, StoredArray};
