use crate::error::{CacheError, Result};
use fanws_memory::{
    EvictionRequest, EvictionResult, MemoryCategory, MemoryEvictor, MemoryManager,
    MemoryRegistration, MemoryTracker,
};
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// On-demand reader for large text files.
///
/// The file length comes from metadata; content is only read when a chunk is
/// requested or lines are iterated. Chunks are cached after the first read.
pub struct LazyTextLoader {
    path: PathBuf,
    size: u64,
    chunk_size: usize,
    chunks: Mutex<BTreeMap<usize, Arc<[u8]>>>,
    registration: OnceLock<MemoryRegistration>,
    tracker: OnceLock<MemoryTracker>,
}

impl LazyTextLoader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_chunk_size(path, DEFAULT_CHUNK_SIZE)
    }

    /// Open `path` with a custom chunk size (clamped to at least one byte).
    pub fn with_chunk_size(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|err| CacheError::from_io(path, err))?;
        if !metadata.is_file() {
            return Err(CacheError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            chunk_size: chunk_size.max(1),
            chunks: Mutex::new(BTreeMap::new()),
            registration: OnceLock::new(),
            tracker: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total byte length at open time.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.size.div_ceil(self.chunk_size as u64) as usize
    }

    /// Raw bytes of the `index`-th chunk (0-based), reading from disk at most once.
    pub fn read_chunk(&self, index: usize) -> Result<Arc<[u8]>> {
        let chunks = self.chunk_count();
        if index >= chunks {
            return Err(CacheError::ChunkOutOfRange { index, chunks });
        }

        if let Some(chunk) = self.chunks.lock().get(&index) {
            return Ok(chunk.clone());
        }

        let offset = index as u64 * self.chunk_size as u64;
        let len = (self.size - offset).min(self.chunk_size as u64);
        let chunk: Arc<[u8]> = self
            .read_range(offset, len)
            .map_err(|err| CacheError::from_io(&self.path, err))?
            .into();

        // Another reader may have cached the chunk meanwhile; only charge new bytes.
        let chunk = match self.chunks.lock().entry(index) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                if let Some(tracker) = self.tracker.get() {
                    tracker.add_bytes(chunk.len() as i64);
                }
                slot.insert(chunk).clone()
            }
        };
        Ok(chunk)
    }

    /// The `index`-th chunk decoded as UTF-8. Invalid sequences, including
    /// characters split across a chunk boundary, become U+FFFD.
    pub fn read_chunk_text(&self, index: usize) -> Result<String> {
        let chunk = self.read_chunk(index)?;
        Ok(String::from_utf8_lossy(&chunk).into_owned())
    }

    /// Stream the file line by line without loading it whole.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped; a final line without a
    /// terminator is still yielded.
    pub fn lines(&self) -> Result<Lines> {
        let file = File::open(&self.path).map_err(|err| CacheError::from_io(&self.path, err))?;
        Ok(Lines {
            reader: BufReader::with_capacity(self.chunk_size, file),
            buf: Vec::new(),
        })
    }

    /// Bytes currently held in the chunk cache.
    pub fn cached_bytes(&self) -> u64 {
        cached_total(&self.chunks.lock())
    }

    /// Drop every cached chunk; returns the bytes released.
    pub fn release_chunks(&self) -> u64 {
        let mut cached = self.chunks.lock();
        let freed = cached_total(&cached);
        cached.clear();
        self.update_tracker_locked(&cached);
        freed
    }

    /// Register with `manager` so pressure can release cached chunks.
    pub fn register_with(self: &Arc<Self>, manager: &MemoryManager) {
        if self.registration.get().is_some() {
            return;
        }
        let registration = manager.register_evictor(
            format!("lazy_text:{}", self.path.display()),
            MemoryCategory::LazyText,
            self.clone() as Arc<dyn MemoryEvictor>,
        );
        let tracker = registration.tracker();
        tracker.set_bytes(self.cached_bytes());
        if self.registration.set(registration).is_ok() {
            let _ = self.tracker.set(tracker);
        }
    }

    fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity(len as usize);
        file.take(len).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn update_tracker_locked(&self, cached: &BTreeMap<usize, Arc<[u8]>>) {
        if let Some(tracker) = self.tracker.get() {
            tracker.set_bytes(cached_total(cached));
        }
    }
}

fn cached_total(cached: &BTreeMap<usize, Arc<[u8]>>) -> u64 {
    cached.values().map(|chunk| chunk.len() as u64).sum()
}

impl MemoryEvictor for LazyTextLoader {
    fn name(&self) -> &str {
        self.registration
            .get()
            .map(MemoryRegistration::name)
            .unwrap_or("lazy_text")
    }

    fn category(&self) -> MemoryCategory {
        MemoryCategory::LazyText
    }

    fn evict(&self, request: EvictionRequest) -> EvictionResult {
        let mut cached = self.chunks.lock();
        let before = cached_total(&cached);
        let mut after = before;
        // Trailing chunks are released first.
        while after > request.target_bytes {
            let Some((_index, chunk)) = cached.pop_last() else {
                break;
            };
            after = after.saturating_sub(chunk.len() as u64);
        }
        self.update_tracker_locked(&cached);
        EvictionResult {
            before_bytes: before,
            after_bytes: after,
        }
    }
}

impl std::fmt::Debug for LazyTextLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyTextLoader")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("chunk_size", &self.chunk_size)
            .field("cached_chunks", &self.chunks.lock().len())
            .finish()
    }
}

/// Line iterator returned by [`LazyTextLoader::lines`].
pub struct Lines {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl Iterator for Lines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
