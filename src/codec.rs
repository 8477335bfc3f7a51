//! JSON persistence for the two record streams.
//!
//! Loading is fail-soft: a missing, unreadable or corrupt file is treated the
//! same as a file that was never written, and the caller gets an empty list.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const APP_NAME: &str = "spatial-tags";

/// Errors surfaced by [`PersistenceCodec::try_load`] and [`PersistenceCodec::save`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Malformed records in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One of the two independent record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    BoundingBoxes,
    Annotations,
}

impl Stream {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::BoundingBoxes => "BoundingBoxTags.json",
            Self::Annotations => "SerializableTags.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceCodec {
    dir: PathBuf,
}

impl PersistenceCodec {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, stream: Stream) -> PathBuf {
        self.dir.join(stream.file_name())
    }

    /// Load every record of `stream`. Never fails; problems are logged.
    pub fn load<R: DeserializeOwned>(&self, stream: Stream) -> Vec<R> {
        match self.try_load(stream) {
            Ok(Some(records)) => records,
            Ok(None) => {
                tracing::debug!("No saved {} found, starting empty", stream.file_name());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load records, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Load `stream`, distinguishing "never saved" (`Ok(None)`) from failures.
    pub fn try_load<R: DeserializeOwned>(&self, stream: Stream) -> Result<Option<Vec<R>>, CodecError> {
        let path = self.path(stream);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CodecError::Io { path, source }),
        };

        let json = String::from_utf8(bytes).map_err(|source| CodecError::Utf8 {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Loading {}: {}", stream.file_name(), json);

        let records = serde_json::from_str(&json).map_err(|source| CodecError::Json { path, source })?;
        Ok(Some(records))
    }

    /// Overwrite `stream` with `records`.
    pub fn save<R: Serialize>(&self, records: &[R], stream: Stream) -> Result<(), CodecError> {
        let path = self.path(stream);
        fs::create_dir_all(&self.dir).map_err(|source| CodecError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string(records).map_err(|source| CodecError::Json {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Saving {}: {}", stream.file_name(), json);

        fs::write(&path, json.as_bytes()).map_err(|source| CodecError::Io { path, source })
    }
}

/// Application-private data directory, overridable with `SPATIAL_TAGS_DATA_DIR`.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("SPATIAL_TAGS_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}
