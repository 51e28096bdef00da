//! Named, replace-on-collision secondary indexes attached to spectrum-like
//! entities, typically the centroided peaks derived from a profile signal.
use std::sync::Arc;

use indexmap::IndexMap;
use mzpeaks::CentroidPeak;
use parking_lot::Mutex;

use crate::spectrum::{SignalArrays, SignalWriteError, SpectrumLike, SpectrumType};
use crate::storage::ArrayStorage;

/// A named set of derived peaks attached to a scan, frame, or mobility scan.
///
/// A mass list stores its arrays under the same validation and persistence
/// rules as any other spectrum and exposes the full read API, but it is
/// always centroided signal.
#[derive(Debug, Clone)]
pub struct MassList {
    name: String,
    signal: SignalArrays,
}

impl MassList {
    /// Validate and store the peaks for a new mass list
    pub fn new(
        name: impl Into<String>,
        storage: Option<&Arc<dyn ArrayStorage>>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Result<Self, SignalWriteError> {
        Ok(Self {
            name: name.into(),
            signal: SignalArrays::store(storage, mzs, intensities)?,
        })
    }

    /// The name this list is registered under, unique per owner
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signal(&self) -> &SignalArrays {
        &self.signal
    }
}

impl SpectrumLike for MassList {
    fn len(&self) -> usize {
        self.signal.len()
    }

    fn spectrum_type(&self) -> SpectrumType {
        SpectrumType::Centroid
    }

    fn mz_value(&self, i: usize) -> f64 {
        self.signal.mz_value(i)
    }

    fn intensity_value(&self, i: usize) -> f32 {
        self.signal.intensity_value(i)
    }

    fn read_mz_values(&self, dst: &mut Vec<f64>) {
        self.signal.read_mzs(dst)
    }

    fn read_intensity_values(&self, dst: &mut Vec<f32>) {
        self.signal.read_intensities(dst)
    }

    fn mz_range(&self) -> Option<(f64, f64)> {
        (!self.signal.is_empty()).then(|| self.signal.summary().mz_range)
    }

    fn tic(&self) -> Option<f32> {
        (!self.signal.is_empty()).then(|| self.signal.summary().tic)
    }

    fn base_peak(&self) -> Option<CentroidPeak> {
        (!self.signal.is_empty()).then(|| self.signal.summary().base_peak.clone())
    }
}

/// The mass lists attached to one owner, keyed by name.
///
/// Names are a unique key: adding a list whose name is already present
/// replaces the old list. Mutations are serialized behind a mutex so
/// concurrent adds and removes cannot corrupt the name-uniqueness
/// invariant; lookups hand out `Arc` clones that stay valid after the
/// list is replaced or removed.
#[derive(Debug, Default)]
pub struct MassListSet {
    inner: Mutex<IndexMap<String, Arc<MassList>>>,
}

impl MassListSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `list`, replacing and returning any list already registered
    /// under the same name
    pub fn add(&self, list: Arc<MassList>) -> Option<Arc<MassList>> {
        self.inner.lock().insert(list.name().to_string(), list)
    }

    /// Detach `list` by identity. Removing a list that is absent, or a
    /// different instance that shares its name, is a no-op.
    pub fn remove(&self, list: &Arc<MassList>) -> bool {
        let mut inner = self.inner.lock();
        let is_same = inner
            .get(list.name())
            .is_some_and(|current| Arc::ptr_eq(current, list));
        if is_same {
            inner.shift_remove(list.name());
        }
        is_same
    }

    /// Look up a list by name
    pub fn get(&self, name: &str) -> Option<Arc<MassList>> {
        self.inner.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// The registered names, in attachment order
    pub fn names(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }

    /// A snapshot of all attached lists, in attachment order
    pub fn lists(&self) -> Vec<Arc<MassList>> {
        self.inner.lock().values().cloned().collect()
    }
}
