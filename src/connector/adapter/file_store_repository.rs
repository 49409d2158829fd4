use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::FileLock;
use crate::application::StoreRepository;
use crate::domain::{
    DomainError, FlatL2Index, IndexKind, NormalizedEntry, StoreFiles, VectorStore,
};

pub const INDEX_FILE_NAME: &str = "index.bin";
pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const FORMAT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    kind: IndexKind,
    dimension: usize,
    count: usize,
    /// SHA-256 of the `metadata.json` bytes written alongside this index.
    metadata_digest: [u8; 32],
    data: Vec<f32>,
}

/// Stores an index as `index.bin` (bincode) next to `metadata.json`.
///
/// The index header pins the exact metadata file it was saved with, so a
/// pair from two different saves is refused on load.
pub struct FileStoreRepository {
    dir: PathBuf,
}

impl FileStoreRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE_NAME)
    }

    fn encode(store: &VectorStore) -> Result<(Vec<u8>, Vec<u8>), DomainError> {
        let metadata = serde_json::to_vec_pretty(store.entries())
            .map_err(|e| DomainError::persistence(format!("cannot encode metadata: {}", e)))?;

        let index = store.index();
        let file = IndexFile {
            format_version: FORMAT_VERSION,
            kind: index.kind(),
            dimension: index.dimension(),
            count: index.len(),
            metadata_digest: digest(&metadata),
            data: index.to_raw_vec(),
        };
        let index = bincode::serialize(&file)
            .map_err(|e| DomainError::persistence(format!("cannot encode index: {}", e)))?;

        Ok((index, metadata))
    }

    fn read_index(&self, path: &Path) -> Result<(FlatL2Index, [u8; 32]), DomainError> {
        let bytes = fs::read(path).map_err(|e| {
            DomainError::persistence(format!("cannot open {}: {}", path.display(), e))
        })?;

        let contents: IndexFile = bincode::deserialize(&bytes).map_err(|e| {
            DomainError::persistence(format!("cannot decode {}: {}", path.display(), e))
        })?;

        if contents.format_version != FORMAT_VERSION {
            return Err(DomainError::persistence(format!(
                "{} has format version {}, expected {}",
                path.display(),
                contents.format_version,
                FORMAT_VERSION
            )));
        }
        if contents.data.len() != contents.count * contents.dimension {
            return Err(DomainError::persistence(format!(
                "{} declares {}x{} values but holds {}",
                path.display(),
                contents.count,
                contents.dimension,
                contents.data.len()
            )));
        }

        let index = match contents.kind {
            IndexKind::FlatL2 => {
                FlatL2Index::from_raw(contents.dimension, contents.count, contents.data)
                    .map_err(|e| DomainError::persistence(e.to_string()))?
            }
        };
        Ok((index, contents.metadata_digest))
    }

    fn read_metadata(
        &self,
        path: &Path,
        expected_digest: &[u8; 32],
    ) -> Result<Vec<NormalizedEntry>, DomainError> {
        let bytes = fs::read(path).map_err(|e| {
            DomainError::persistence(format!("cannot open {}: {}", path.display(), e))
        })?;

        if digest(&bytes) != *expected_digest {
            return Err(DomainError::persistence(format!(
                "{} does not belong to the index next to it",
                path.display()
            )));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::persistence(format!("cannot decode {}: {}", path.display(), e))
        })
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(bytes));
    out
}

fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

/// Writes `bytes` to the staging file next to `path`.
fn stage(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    let tmp_path = staging_path(path);
    let file = File::create(&tmp_path).map_err(|e| {
        DomainError::persistence(format!("cannot create {}: {}", tmp_path.display(), e))
    })?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| DomainError::persistence(format!("cannot write {}: {}", tmp_path.display(), e)))
}

fn commit(path: &Path) -> Result<(), DomainError> {
    fs::rename(staging_path(path), path).map_err(|e| {
        DomainError::persistence(format!("cannot move {} into place: {}", path.display(), e))
    })
}

fn discard_staged(paths: &[&Path]) {
    for path in paths {
        let tmp_path = staging_path(path);
        if tmp_path.is_file() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                warn!("Could not remove {}: {}", tmp_path.display(), e);
            }
        }
    }
}

#[async_trait]
impl StoreRepository for FileStoreRepository {
    async fn save(&self, store: &VectorStore) -> Result<StoreFiles, DomainError> {
        let (index_bytes, metadata_bytes) = Self::encode(store)?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            DomainError::persistence(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let _lock = FileLock::try_acquire(&self.dir)?;

        let index_path = self.index_path();
        let metadata_path = self.metadata_path();

        // Nothing is renamed until both files are fully on disk.
        let written = stage(&index_path, &index_bytes)
            .and_then(|_| stage(&metadata_path, &metadata_bytes))
            .and_then(|_| commit(&metadata_path))
            .and_then(|_| commit(&index_path));

        if let Err(e) = written {
            discard_staged(&[&index_path, &metadata_path]);
            return Err(e);
        }
        debug!(
            "Wrote {} and {}",
            index_path.display(),
            metadata_path.display()
        );

        Ok(StoreFiles {
            index_path,
            metadata_path,
            record_count: store.len(),
        })
    }

    async fn load(&self) -> Result<VectorStore, DomainError> {
        if !self.dir.is_dir() {
            return Err(DomainError::persistence(format!(
                "no store at {}",
                self.dir.display()
            )));
        }

        let _lock = FileLock::try_acquire_shared(&self.dir)?;

        let (index, metadata_digest) = self.read_index(&self.index_path())?;
        let entries = self.read_metadata(&self.metadata_path(), &metadata_digest)?;

        if index.len() != entries.len() {
            return Err(DomainError::persistence(format!(
                "index holds {} vectors but metadata holds {} entries",
                index.len(),
                entries.len()
            )));
        }

        info!(
            "Loaded {} records ({} dimensions) from {}",
            entries.len(),
            index.dimension(),
            self.dir.display()
        );

        VectorStore::new(index, entries).map_err(|e| DomainError::persistence(e.to_string()))
    }
}
