use std::ffi::OsString;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Tweet, UserRecord};

/// An element of a collection file.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn record_id(&self) -> Uuid;
}

/// One collection persisted as a single pretty-printed JSON array.
///
/// Readers share the lock; `append` holds it exclusively for the whole
/// read-modify-write so no reader sees a half-replaced file.
pub struct Collection<R> {
    path: PathBuf,
    lock: RwLock<()>,
    _records: PhantomData<fn() -> R>,
}

impl<R: Record> Collection<R> {
    /// Opens the collection at `path`, writing an empty array if nothing is there yet.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let collection = Collection {
            path: path.into(),
            lock: RwLock::new(()),
            _records: PhantomData,
        };

        match fs::metadata(&collection.path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "Initialising empty {} collection at {}",
                    R::COLLECTION,
                    collection.path.display()
                );
                collection.persist(&[]).await?;
            }
            Err(source) => {
                return Err(AppError::StorageUnavailable {
                    path: collection.path,
                    source,
                })
            }
        }

        Ok(collection)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> AppResult<Vec<R>> {
        let _guard = self.lock.read().await;
        self.load().await
    }

    /// Appends `record` as the last element. Fails with `Duplicate` if its id is taken.
    pub async fn append(&self, record: R) -> AppResult<R> {
        let _guard = self.lock.write().await;
        let mut records = self.load().await?;

        let id = record.record_id();
        if records.iter().any(|existing| existing.record_id() == id) {
            return Err(AppError::Duplicate {
                collection: R::COLLECTION,
                id,
            });
        }

        records.push(record.clone());
        self.persist(&records).await?;
        debug!(
            "Appended {} record {} ({} total)",
            R::COLLECTION,
            id,
            records.len()
        );
        Ok(record)
    }

    async fn load(&self) -> AppResult<Vec<R>> {
        let bytes = fs::read(&self.path)
            .await
            .map_err(|source| self.unavailable(source))?;
        serde_json::from_slice(&bytes).map_err(|source| AppError::CorruptData {
            collection: R::COLLECTION,
            path: self.path.clone(),
            source,
        })
    }

    // Write-temp-then-rename so a crash leaves either the old or the new array.
    async fn persist(&self, records: &[R]) -> AppResult<()> {
        let body = serde_json::to_vec_pretty(records).map_err(|source| AppError::Encode {
            collection: R::COLLECTION,
            source,
        })?;

        let tmp = self.tmp_path();
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|source| self.unavailable(source))?;
        file.write_all(&body)
            .await
            .map_err(|source| self.unavailable(source))?;
        file.sync_all()
            .await
            .map_err(|source| self.unavailable(source))?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.unavailable(source))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(R::COLLECTION));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, source: std::io::Error) -> AppError {
        AppError::StorageUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

pub struct Store {
    pub users: Collection<UserRecord>,
    pub tweets: Collection<Tweet>,
}

impl Store {
    pub async fn open(config: &StorageConfig) -> AppResult<Self> {
        let users = Collection::open(&config.users_path).await?;
        let tweets = Collection::open(&config.tweets_path).await?;
        Ok(Store { users, tweets })
    }
}
