use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use memmap2::Mmap;
use parking_lot::{Mutex, RwLock};

/// An opaque reference to one immutable array held by an [`ArrayStorage`].
///
/// A handle is only meaningful to the store that issued it. The entity that
/// stored the array owns the handle exclusively; dependents address subsets
/// of the array by offset and count, never by holding a handle of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageHandle {
    offset: u64,
    len: u64,
}

impl StorageHandle {
    /// The size of the stored array in bytes
    pub fn byte_len(&self) -> usize {
        self.len as usize
    }

    pub(crate) fn byte_offset(&self) -> u64 {
        self.offset
    }
}

/// The contract an append-only array store must satisfy.
///
/// `store_bytes` may fail with an I/O error, which callers are expected to
/// absorb by retaining the array in process memory instead (see
/// [`StoredArray::store`](crate::storage::StoredArray::store)). `read_bytes`
/// on a handle this store issued must not fail: a read that cannot be
/// satisfied means the handle was forged or crossed stores, which is a
/// caller bug and panics.
pub trait ArrayStorage: Send + Sync {
    /// Append `data` to the store, returning a handle to the immutable copy
    fn store_bytes(&self, data: &[u8]) -> io::Result<StorageHandle>;

    /// Fill `dst` from the stored array, starting `byte_offset` bytes into
    /// the region named by `handle`.
    ///
    /// # Panics
    /// If the requested range reaches past the end of the stored array.
    fn read_bytes(&self, handle: StorageHandle, byte_offset: usize, dst: &mut [u8]);
}

struct StoreWriter {
    file: File,
    len: u64,
}

struct MapState {
    map: Option<Mmap>,
    mapped_len: u64,
}

/// The production [`ArrayStorage`]: an anonymous temporary file that arrays
/// are appended to once and read back through a memory map.
///
/// Writes are serialized behind a mutex. Reads share the current mapping and
/// only take the exclusive path when a handle reaches past the mapped length,
/// in which case the file is remapped to its grown size. Stored regions are
/// never rewritten, so concurrent readers need no further coordination.
pub struct MemoryMapStore {
    writer: Mutex<StoreWriter>,
    map: RwLock<MapState>,
}

impl std::fmt::Debug for MemoryMapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMapStore")
            .field("len", &self.writer.lock().len)
            .field("mapped_len", &self.map.read().mapped_len)
            .finish()
    }
}

impl MemoryMapStore {
    /// Create a store backed by a temporary file in the system temp directory.
    /// The file is unlinked immediately, so it disappears with the store.
    pub fn new() -> io::Result<Self> {
        Self::from_file(tempfile::tempfile()?)
    }

    /// Create a store backed by a temporary file under `dir`, for callers
    /// that need the backing file on a specific volume.
    pub fn in_directory<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        Self::from_file(tempfile::tempfile_in(dir)?)
    }

    fn from_file(file: File) -> io::Result<Self> {
        Ok(Self {
            writer: Mutex::new(StoreWriter { file, len: 0 }),
            map: RwLock::new(MapState {
                map: None,
                mapped_len: 0,
            }),
        })
    }

    /// The total number of bytes committed to the store so far
    pub fn len(&self) -> usize {
        self.writer.lock().len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remap the file so the mapping covers at least `required` bytes.
    /// Regions below the committed length are stable, so a mapping taken
    /// here remains valid for every handle already issued.
    fn grow_mapping(&self, required: u64) {
        let mut state = self.map.write();
        if state.mapped_len >= required {
            return;
        }
        let writer = self.writer.lock();
        debug_assert!(writer.len >= required);
        log::debug!(
            "Growing memory map from {} to {} bytes",
            state.mapped_len,
            writer.len
        );
        let map = unsafe { Mmap::map(&writer.file) }
            .unwrap_or_else(|e| panic!("Failed to map backing store file: {e}"));
        state.mapped_len = map.len() as u64;
        state.map = Some(map);
    }
}

impl ArrayStorage for MemoryMapStore {
    fn store_bytes(&self, data: &[u8]) -> io::Result<StorageHandle> {
        let mut writer = self.writer.lock();
        let offset = writer.len;
        writer.file.write_all(data)?;
        writer.len += data.len() as u64;
        Ok(StorageHandle {
            offset,
            len: data.len() as u64,
        })
    }

    fn read_bytes(&self, handle: StorageHandle, byte_offset: usize, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        assert!(
            byte_offset + dst.len() <= handle.byte_len(),
            "Read of {} bytes at offset {} overruns stored array of {} bytes",
            dst.len(),
            byte_offset,
            handle.byte_len()
        );
        let start = handle.byte_offset() + byte_offset as u64;
        let end = start + dst.len() as u64;
        {
            let state = self.map.read();
            if let Some(map) = state.map.as_ref().filter(|_| state.mapped_len >= end) {
                dst.copy_from_slice(&map[start as usize..end as usize]);
                return;
            }
        }
        self.grow_mapping(end);
        let state = self.map.read();
        let map = state
            .map
            .as_ref()
            .unwrap_or_else(|| panic!("Backing store mapping missing after growth to {end} bytes"));
        dst.copy_from_slice(&map[start as usize..end as usize]);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store_f64(store: &MemoryMapStore, data: &[f64]) -> StorageHandle {
        store.store_bytes(bytemuck::cast_slice(data)).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let store = MemoryMapStore::new().unwrap();
        let data = [100.0f64, 200.5, 300.25, 400.125];
        let handle = store_f64(&store, &data);
        assert_eq!(handle.byte_len(), data.len() * 8);

        let mut back = [0.0f64; 4];
        store.read_bytes(handle, 0, bytemuck::cast_slice_mut(&mut back));
        assert_eq!(back, data);
    }

    #[test]
    fn test_interleaved_types() {
        let store = MemoryMapStore::new().unwrap();
        let mzs = [100.0f64, 200.0, 300.0];
        let intensities = [10.0f32, 20.0, 30.0, 40.0, 50.0];
        let h_mz = store_f64(&store, &mzs);
        let h_int = store.store_bytes(bytemuck::cast_slice(&intensities)).unwrap();
        let h_mz2 = store_f64(&store, &mzs[..2]);

        // The f32 block leaves the following f64 block at a 4-byte offset,
        // which the byte-copy read path has to tolerate.
        let mut one = [0.0f64; 1];
        store.read_bytes(h_mz2, 8, bytemuck::cast_slice_mut(&mut one));
        assert_eq!(one[0], 200.0);

        let mut ints = [0.0f32; 5];
        store.read_bytes(h_int, 0, bytemuck::cast_slice_mut(&mut ints));
        assert_eq!(ints, intensities);

        let mut back = [0.0f64; 3];
        store.read_bytes(h_mz, 0, bytemuck::cast_slice_mut(&mut back));
        assert_eq!(back, mzs);

        assert_eq!(store.len(), 24 + 20 + 16);
    }

    #[test]
    fn test_partial_reads() {
        let store = MemoryMapStore::new().unwrap();
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let handle = store_f64(&store, &data);

        let mut window = [0.0f64; 3];
        store.read_bytes(handle, 5 * 8, bytemuck::cast_slice_mut(&mut window));
        assert_eq!(window, [5.0, 6.0, 7.0]);

        // Reads after the mapping has grown once should not remap again
        store.read_bytes(handle, 97 * 8, bytemuck::cast_slice_mut(&mut window));
        assert_eq!(window, [97.0, 98.0, 99.0]);
    }

    #[test]
    fn test_empty_array() {
        let store = MemoryMapStore::new().unwrap();
        let handle = store.store_bytes(&[]).unwrap();
        assert_eq!(handle.byte_len(), 0);
        let mut dst: [u8; 0] = [];
        store.read_bytes(handle, 0, &mut dst);
        assert!(store.is_empty());
    }

    #[test]
    #[should_panic(expected = "overruns stored array")]
    fn test_overrun_read_panics() {
        let store = MemoryMapStore::new().unwrap();
        let handle = store_f64(&store, &[1.0, 2.0]);
        let mut too_big = [0.0f64; 3];
        store.read_bytes(handle, 0, bytemuck::cast_slice_mut(&mut too_big));
    }

    #[test]
    fn test_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryMapStore::in_directory(dir.path()).unwrap();
        let handle = store_f64(&store, &[7.5, 8.5]);
        let mut back = [0.0f64; 2];
        store.read_bytes(handle, 0, bytemuck::cast_slice_mut(&mut back));
        assert_eq!(back, [7.5, 8.5]);
    }
}
