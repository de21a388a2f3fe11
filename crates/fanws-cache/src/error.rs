use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors produced by lazy text loading.
///
/// Cache lookups never fail: a miss is `None`, and capacity pressure is handled
/// by eviction.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{path} is not a regular file")]
    NotAFile { path: PathBuf },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk {index} is out of range ({chunks} chunks)")]
    ChunkOutOfRange { index: usize, chunks: usize },
}

impl CacheError {
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            CacheError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
