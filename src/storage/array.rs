use std::borrow::Cow;
use std::fmt::{self, Formatter};
use std::mem;
use std::sync::Arc;

use bytemuck::Pod;

use super::store::{ArrayStorage, StorageHandle};

/// One immutable numeric array and the record of where it actually lives.
///
/// The two variants make the persistence outcome observable: an array that
/// reached the backing store is addressed by its [`StorageHandle`], while an
/// array the store could not accept is retained in process memory. Readers
/// never need to care which path was taken, but tests and diagnostics can.
pub enum StoredArray<T: Pod> {
    /// The array lives in the backing store and is read back on demand
    Persisted {
        store: Arc<dyn ArrayStorage>,
        handle: StorageHandle,
    },
    /// The array is resident in process memory, either because no backing
    /// store was supplied or because persistence failed
    InMemory(Arc<[T]>),
}

impl<T: Pod> Clone for StoredArray<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Persisted { store, handle } => Self::Persisted {
                store: Arc::clone(store),
                handle: *handle,
            },
            Self::InMemory(data) => Self::InMemory(Arc::clone(data)),
        }
    }
}

impl<T: Pod> fmt::Debug for StoredArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredArray")
            .field("len", &self.len())
            .field("persisted", &self.is_persisted())
            .finish()
    }
}

impl<T: Pod> StoredArray<T> {
    /// Write `data` through `storage`, falling back to process memory when no
    /// store was supplied or the store reports an I/O failure.
    ///
    /// The fallback is deliberately silent towards the caller: the data is
    /// still fully readable afterwards, so the degradation is only surfaced
    /// as a warning-level diagnostic.
    pub fn store(storage: Option<&Arc<dyn ArrayStorage>>, data: &[T]) -> Self {
        match storage {
            Some(store) => match store.store_bytes(bytemuck::cast_slice(data)) {
                Ok(handle) => Self::Persisted {
                    store: Arc::clone(store),
                    handle,
                },
                Err(e) => {
                    log::warn!(
                        "Error while storing {} data points on disk, keeping them in memory instead: {e}",
                        data.len()
                    );
                    Self::InMemory(data.into())
                }
            },
            None => Self::InMemory(data.into()),
        }
    }

    /// Wrap an array that is intended to stay in process memory
    pub fn wrap(data: &[T]) -> Self {
        Self::InMemory(data.into())
    }

    /// The number of elements in the array
    pub fn len(&self) -> usize {
        match self {
            Self::Persisted { handle, .. } => handle.byte_len() / mem::size_of::<T>(),
            Self::InMemory(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the array made it into the backing store
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }

    /// Read the `i`th element, or `None` past the end of the array
    pub fn get(&self, i: usize) -> Option<T> {
        if i >= self.len() {
            return None;
        }
        match self {
            Self::Persisted { store, handle } => {
                let mut value = T::zeroed();
                store.read_bytes(*handle, i * mem::size_of::<T>(), bytemuck::bytes_of_mut(&mut value));
                Some(value)
            }
            Self::InMemory(data) => data.get(i).copied(),
        }
    }

    /// Copy `count` elements starting at `start` into `dst`, reusing its
    /// capacity when it is already large enough.
    ///
    /// # Panics
    /// If `start + count` reaches past the end of the array.
    pub fn slice_into(&self, start: usize, count: usize, dst: &mut Vec<T>) {
        assert!(
            start + count <= self.len(),
            "Slice of {count} elements at {start} overruns array of {} elements",
            self.len()
        );
        dst.clear();
        dst.resize(count, T::zeroed());
        match self {
            Self::Persisted { store, handle } => {
                store.read_bytes(
                    *handle,
                    start * mem::size_of::<T>(),
                    bytemuck::cast_slice_mut(dst.as_mut_slice()),
                );
            }
            Self::InMemory(data) => dst.copy_from_slice(&data[start..start + count]),
        }
    }

    /// Copy the whole array into `dst`, reusing its capacity when possible
    pub fn read_into(&self, dst: &mut Vec<T>) {
        self.slice_into(0, self.len(), dst)
    }

    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.read_into(&mut out);
        out
    }

    /// Borrow the array when it is memory-resident, otherwise copy it out of
    /// the backing store.
    pub fn view(&self) -> Cow<'_, [T]> {
        match self {
            Self::Persisted { .. } => Cow::Owned(self.to_vec()),
            Self::InMemory(data) => Cow::Borrowed(data),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use std::sync::Arc;

    use super::super::store::MemoryMapStore;
    use super::*;

    /// A backing store whose writes always fail, for exercising the
    /// in-memory fallback path.
    struct FailingStorage;

    impl ArrayStorage for FailingStorage {
        fn store_bytes(&self, _data: &[u8]) -> io::Result<StorageHandle> {
            Err(io::Error::new(io::ErrorKind::Other, "disk is full"))
        }

        fn read_bytes(&self, _handle: StorageHandle, _byte_offset: usize, _dst: &mut [u8]) {
            unreachable!("no handle can ever be issued by FailingStorage")
        }
    }

    #[test]
    fn test_in_memory() {
        let data = [1.0f64, 2.0, 3.0];
        let arr = StoredArray::store(None, &data);
        assert!(!arr.is_persisted());
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(1), Some(2.0));
        assert_eq!(arr.get(3), None);
        assert_eq!(arr.to_vec(), data);
        assert!(matches!(arr.view(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_persisted() {
        let store: Arc<dyn ArrayStorage> = Arc::new(MemoryMapStore::new().unwrap());
        let data = [100.0f64, 200.0, 300.0, 400.0];
        let arr = StoredArray::store(Some(&store), &data);
        assert!(arr.is_persisted());
        assert_eq!(arr.len(), 4);
        assert_eq!(arr.get(2), Some(300.0));
        assert_eq!(arr.to_vec(), data);

        let mut window = Vec::new();
        arr.slice_into(1, 2, &mut window);
        assert_eq!(window, [200.0, 300.0]);
        assert!(matches!(arr.view(), Cow::Owned(_)));
    }

    #[test_log::test]
    fn test_fallback_on_store_failure() {
        let store: Arc<dyn ArrayStorage> = Arc::new(FailingStorage);
        let data = [5.0f32, 10.0, 2.5];
        let arr = StoredArray::store(Some(&store), &data);
        assert!(!arr.is_persisted());
        assert_eq!(arr.to_vec(), data);
    }

    #[test]
    fn test_empty() {
        let arr: StoredArray<f64> = StoredArray::store(None, &[]);
        assert!(arr.is_empty());
        assert_eq!(arr.get(0), None);
        assert!(arr.to_vec().is_empty());
    }

    #[test]
    fn test_buffer_reuse() {
        let arr = StoredArray::wrap(&[1.0f64, 2.0]);
        let mut dst = Vec::with_capacity(16);
        arr.read_into(&mut dst);
        assert_eq!(dst, [1.0, 2.0]);
        assert!(dst.capacity() >= 16);
    }
}
