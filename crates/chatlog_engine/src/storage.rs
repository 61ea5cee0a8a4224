use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chatlog_core::{Channel, DatabaseStatistics, Message, MessageFilter, Server, User};
use futures_util::stream::BoxStream;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::UpgradeStep;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    DownloadsAutoStart,
}

/// Finite enumeration; each call starts over from the beginning.
pub type EntityStream<'a, T> = BoxStream<'a, Result<T, StorageError>>;

#[async_trait]
pub trait Database: Send + Sync {
    fn statistics(&self) -> DatabaseStatistics;

    /// Receiver that observes every statistics change.
    fn subscribe_statistics(&self) -> watch::Receiver<DatabaseStatistics>;

    /// Counts messages matching `filter`. Returns [`StorageError::Cancelled`]
    /// once `cancel` fires.
    async fn count_messages(
        &self,
        filter: &MessageFilter,
        cancel: &CancellationToken,
    ) -> Result<i64, StorageError>;

    fn servers(&self) -> EntityStream<'_, Server>;
    fn channels(&self) -> EntityStream<'_, Channel>;
    fn users(&self) -> EntityStream<'_, User>;

    async fn setting(&self, key: SettingsKey) -> Result<Option<String>, StorageError>;
    async fn set_setting(&self, key: SettingsKey, value: &str) -> Result<(), StorageError>;

    async fn add_servers(&self, servers: Vec<Server>) -> Result<(), StorageError>;
    async fn add_channels(&self, channels: Vec<Channel>) -> Result<(), StorageError>;
    async fn add_users(&self, users: Vec<User>) -> Result<(), StorageError>;
    async fn add_messages(&self, messages: Vec<Message>) -> Result<(), StorageError>;
}

/// Shared handle to an open database, passed between the engine and the UI.
#[derive(Clone)]
pub struct DatabaseHandle(Arc<dyn Database>);

impl DatabaseHandle {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self(database)
    }

    pub fn database(&self) -> Arc<dyn Database> {
        self.0.clone()
    }
}

impl Deref for DatabaseHandle {
    type Target = dyn Database;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseHandle")
            .field(&self.0.statistics())
            .finish()
    }
}

impl PartialEq for DatabaseHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DatabaseHandle {}

/// Database that was opened but may still need schema upgrade steps.
pub struct OpenedDatabase {
    pub database: Arc<dyn Database>,
    pub pending_upgrade: Vec<Box<dyn UpgradeStep>>,
}

#[async_trait]
pub trait DatabaseOpener: Send + Sync {
    async fn open_or_create(&self, path: &Path) -> Result<OpenedDatabase, StorageError>;
}
