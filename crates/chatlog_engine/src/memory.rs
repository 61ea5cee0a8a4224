use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chatlog_core::{Channel, DatabaseStatistics, Message, MessageFilter, Server, User};
use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    Database, DatabaseOpener, EngineSettings, EntityStream, OpenedDatabase, SettingsKey,
    StorageError,
};

#[derive(Default)]
struct Tables {
    servers: BTreeMap<u64, Server>,
    channels: BTreeMap<u64, Channel>,
    users: BTreeMap<u64, User>,
    messages: BTreeMap<u64, Message>,
    settings: HashMap<SettingsKey, String>,
}

impl Tables {
    fn statistics(&self) -> DatabaseStatistics {
        DatabaseStatistics {
            total_servers: self.servers.len() as i64,
            total_channels: self.channels.len() as i64,
            total_users: self.users.len() as i64,
            total_messages: self.messages.len() as i64,
        }
    }
}

/// In-process database used by the headless app and by tests.
///
/// Counting walks the message table in id order, one page at a time, and
/// checks the cancellation token between pages.
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
    page_size: usize,
    statistics_tx: watch::Sender<DatabaseStatistics>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::with_page_size(EngineSettings::default().count_page_size)
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let (statistics_tx, _) = watch::channel(DatabaseStatistics::default());
        Self {
            tables: RwLock::new(Tables::default()),
            page_size: page_size.max(1),
            statistics_tx,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Unavailable("table lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Unavailable("table lock poisoned".into()))
    }

    fn modify(&self, apply: impl FnOnce(&mut Tables)) -> Result<(), StorageError> {
        let statistics = {
            let mut tables = self.write()?;
            apply(&mut tables);
            tables.statistics()
        };
        self.statistics_tx.send_if_modified(|current| {
            if *current == statistics {
                false
            } else {
                *current = statistics;
                true
            }
        });
        Ok(())
    }

    /// Counts one page after `cursor`; returns the matches and the last id seen.
    fn count_page(
        &self,
        filter: &MessageFilter,
        cursor: Option<u64>,
    ) -> Result<(i64, Option<u64>), StorageError> {
        let tables = self.read()?;
        let lower = cursor.map_or(Bound::Unbounded, Bound::Excluded);
        let mut matches = 0;
        let mut last = None;
        for (id, message) in tables
            .messages
            .range((lower, Bound::Unbounded))
            .take(self.page_size)
        {
            if filter.matches(message) {
                matches += 1;
            }
            last = Some(*id);
        }
        Ok((matches, last))
    }

    fn snapshot<T: Clone + Send + 'static>(
        &self,
        select: impl FnOnce(&Tables) -> Vec<T>,
    ) -> EntityStream<'_, T> {
        match self.read() {
            Ok(tables) => stream::iter(select(&tables).into_iter().map(Ok)).boxed(),
            Err(err) => stream::once(async move { Err(err) }).boxed(),
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn statistics(&self) -> DatabaseStatistics {
        *self.statistics_tx.borrow()
    }

    fn subscribe_statistics(&self) -> watch::Receiver<DatabaseStatistics> {
        self.statistics_tx.subscribe()
    }

    async fn count_messages(
        &self,
        filter: &MessageFilter,
        cancel: &CancellationToken,
    ) -> Result<i64, StorageError> {
        let mut total = 0;
        let mut cursor = None;
        loop {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let (matches, last) = self.count_page(filter, cursor)?;
            total += matches;
            match last {
                Some(id) => cursor = Some(id),
                None => return Ok(total),
            }
            tokio::task::yield_now().await;
        }
    }

    fn servers(&self) -> EntityStream<'_, Server> {
        self.snapshot(|tables| tables.servers.values().cloned().collect())
    }

    fn channels(&self) -> EntityStream<'_, Channel> {
        self.snapshot(|tables| tables.channels.values().cloned().collect())
    }

    fn users(&self) -> EntityStream<'_, User> {
        self.snapshot(|tables| tables.users.values().cloned().collect())
    }

    async fn setting(&self, key: SettingsKey) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.settings.get(&key).cloned())
    }

    async fn set_setting(&self, key: SettingsKey, value: &str) -> Result<(), StorageError> {
        self.modify(|tables| {
            tables.settings.insert(key, value.to_string());
        })
    }

    async fn add_servers(&self, servers: Vec<Server>) -> Result<(), StorageError> {
        self.modify(|tables| {
            tables
                .servers
                .extend(servers.into_iter().map(|server| (server.id, server)));
        })
    }

    async fn add_channels(&self, channels: Vec<Channel>) -> Result<(), StorageError> {
        self.modify(|tables| {
            tables
                .channels
                .extend(channels.into_iter().map(|channel| (channel.id, channel)));
        })
    }

    async fn add_users(&self, users: Vec<User>) -> Result<(), StorageError> {
        self.modify(|tables| {
            tables
                .users
                .extend(users.into_iter().map(|user| (user.id, user)));
        })
    }

    async fn add_messages(&self, messages: Vec<Message>) -> Result<(), StorageError> {
        self.modify(|tables| {
            tables
                .messages
                .extend(messages.into_iter().map(|message| (message.id, message)));
        })
    }
}

/// Opens one [`MemoryDatabase`] per path and hands the same instance back on reopen.
pub struct MemoryOpener {
    page_size: usize,
    databases: Mutex<HashMap<PathBuf, Arc<MemoryDatabase>>>,
}

impl MemoryOpener {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            page_size: settings.count_page_size,
            databases: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DatabaseOpener for MemoryOpener {
    async fn open_or_create(&self, path: &Path) -> Result<OpenedDatabase, StorageError> {
        let mut databases = self
            .databases
            .lock()
            .map_err(|_| StorageError::Unavailable("opener lock poisoned".into()))?;
        let database = databases
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(MemoryDatabase::with_page_size(self.page_size)))
            .clone();
        Ok(OpenedDatabase {
            database,
            pending_upgrade: Vec::new(),
        })
    }
}
