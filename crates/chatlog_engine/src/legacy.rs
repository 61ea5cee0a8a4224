//! Reader for the legacy JSON archive format.
//!
//! Layout: `meta.users` maps user id to `{name, tag?}`, `meta.userindex` lists
//! user ids so messages can reference senders by index, `meta.servers` is an
//! array of `{name, type}` without ids, `meta.channels` maps channel id to
//! `{server, name}` where `server` indexes `meta.servers`, and
//! `data.<channel id>.<message id>` holds `{u, t, m?, te?}`.
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chatlog_core::{Channel, Message, PendingServer, Server, ServerKind, User};
use chrono::{DateTime, Utc};
use engine_logging::engine_info;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    BatchSummary, Database, FileSystem, ImportBatch, ImportError, ImportLabels, ImportOutcome,
    Interaction, ProgressTree,
};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown server type '{0}'")]
    UnknownServerType(String),
    #[error("invalid {entity} id '{value}'")]
    InvalidId { entity: &'static str, value: String },
    #[error("channel {channel} references missing server #{index}")]
    MissingServer { channel: u64, index: usize },
    #[error("message {message} references missing user #{index}")]
    MissingUser { message: u64, index: usize },
    #[error("message {message} has invalid timestamp {timestamp}")]
    InvalidTimestamp { message: u64, timestamp: i64 },
}

#[derive(Debug, Deserialize)]
struct LegacyArchive {
    meta: LegacyMeta,
    #[serde(default)]
    data: BTreeMap<String, BTreeMap<String, LegacyMessage>>,
}

#[derive(Debug, Deserialize)]
struct LegacyMeta {
    #[serde(default)]
    users: BTreeMap<String, LegacyUser>,
    #[serde(default)]
    userindex: Vec<String>,
    #[serde(default)]
    servers: Vec<LegacyServer>,
    #[serde(default)]
    channels: BTreeMap<String, LegacyChannel>,
}

#[derive(Debug, Deserialize)]
struct LegacyUser {
    name: String,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyServer {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct LegacyChannel {
    server: usize,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LegacyMessage {
    u: usize,
    t: i64,
    #[serde(default)]
    m: Option<String>,
    #[serde(default)]
    te: Option<i64>,
}

/// Hands out ids for servers whose real id is unknown, counting down from
/// `u64::MAX` so they stay clear of real snowflakes.
#[derive(Debug)]
pub struct FakeSnowflake {
    next: AtomicU64,
}

impl Default for FakeSnowflake {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(u64::MAX),
        }
    }
}

impl FakeSnowflake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_sub(1, Ordering::Relaxed)
    }
}

fn parse_kind(kind: &str) -> Result<ServerKind, ArchiveError> {
    match kind {
        "SERVER" => Ok(ServerKind::Server),
        "GROUP" => Ok(ServerKind::Group),
        "DM" => Ok(ServerKind::DirectMessage),
        other => Err(ArchiveError::UnknownServerType(other.to_string())),
    }
}

fn parse_id(entity: &'static str, value: &str) -> Result<u64, ArchiveError> {
    value.parse().map_err(|_| ArchiveError::InvalidId {
        entity,
        value: value.to_string(),
    })
}

/// Reads and parses on the blocking pool.
async fn read_archive(reader: impl Read + Send + 'static) -> Result<LegacyArchive, ImportError> {
    let parsed = tokio::task::spawn_blocking(move || {
        serde_json::from_reader::<_, LegacyArchive>(reader)
    })
    .await
    .map_err(|err| ImportError::Other(format!("archive reader stopped: {err}")))?;
    Ok(parsed.map_err(ArchiveError::from)?)
}

/// Imports one legacy archive into `target`.
///
/// Asks the user for the real ids of the archived servers first; a cancelled
/// prompt skips the archive without writing anything.
pub async fn import_legacy_archive(
    reader: impl Read + Send + 'static,
    target: &dyn Database,
    snowflake: &FakeSnowflake,
    interaction: &dyn Interaction,
) -> Result<ImportOutcome, ImportError> {
    let archive = read_archive(reader).await?;
    let meta = archive.meta;

    let mut pending = Vec::with_capacity(meta.servers.len());
    for (key, server) in meta.servers.iter().enumerate() {
        pending.push(PendingServer {
            key,
            name: server.name.clone(),
            kind: parse_kind(&server.kind)?,
        });
    }

    let mapping = if pending.is_empty() {
        Default::default()
    } else {
        match interaction.ask_for_server_ids(pending.clone()).await {
            Some(mapping) => mapping,
            None => {
                return Ok(ImportOutcome::Skipped(
                    "server ids not provided".to_string(),
                ));
            }
        }
    };

    let server_ids: Vec<u64> = pending
        .iter()
        .map(|server| {
            mapping
                .get(&server.key)
                .copied()
                .unwrap_or_else(|| snowflake.next())
        })
        .collect();

    let servers: Vec<Server> = pending
        .into_iter()
        .zip(&server_ids)
        .map(|(server, id)| Server {
            id: *id,
            name: server.name,
            kind: server.kind,
        })
        .collect();

    let mut channels = Vec::with_capacity(meta.channels.len());
    for (id, channel) in &meta.channels {
        let id = parse_id("channel", id)?;
        let server = *server_ids
            .get(channel.server)
            .ok_or(ArchiveError::MissingServer {
                channel: id,
                index: channel.server,
            })?;
        channels.push(Channel {
            id,
            server,
            name: channel.name.clone(),
        });
    }

    let mut users = Vec::with_capacity(meta.users.len());
    for (id, user) in &meta.users {
        users.push(User {
            id: parse_id("user", id)?,
            name: user.name.clone(),
            discriminator: user.tag.clone(),
        });
    }
    let user_index = meta
        .userindex
        .iter()
        .map(|id| parse_id("user", id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut messages = Vec::new();
    let mut edited = 0usize;
    for (channel_id, channel_messages) in &archive.data {
        let channel = parse_id("channel", channel_id)?;
        for (message_id, message) in channel_messages {
            let id = parse_id("message", message_id)?;
            let sender = *user_index.get(message.u).ok_or(ArchiveError::MissingUser {
                message: id,
                index: message.u,
            })?;
            let timestamp = DateTime::<Utc>::from_timestamp_millis(message.t)
                .ok_or(ArchiveError::InvalidTimestamp {
                    message: id,
                    timestamp: message.t,
                })?
                .naive_utc();
            if message.te.is_some() {
                edited += 1;
            }
            messages.push(Message {
                id,
                channel,
                sender,
                timestamp,
                text: message.m.clone().unwrap_or_default(),
            });
        }
    }

    engine_info!(
        "Legacy archive: {} servers, {} channels, {} users, {} messages ({} edited)",
        servers.len(),
        channels.len(),
        users.len(),
        messages.len(),
        edited
    );

    target.add_servers(servers).await?;
    target.add_channels(channels).await?;
    target.add_users(users).await?;
    target.add_messages(messages).await?;

    Ok(ImportOutcome::Succeeded)
}

/// Imports each archive in `paths` into `target`, one at a time.
pub async fn import_legacy_archives(
    target: &dyn Database,
    paths: &[PathBuf],
    fs: &dyn FileSystem,
    interaction: &dyn Interaction,
    progress: &mut ProgressTree,
) -> BatchSummary {
    let snowflake = FakeSnowflake::new();
    let snowflake = &snowflake;
    let batch = ImportBatch::new(fs, interaction, ImportLabels::legacy_archive());

    batch
        .run(paths, progress, move |path| {
            let opened = fs.open_read(&path);
            async move {
                match opened {
                    Ok(reader) => {
                        import_legacy_archive(reader, target, snowflake, interaction).await
                    }
                    Err(err) => Err(ImportError::from(err)),
                }
            }
        })
        .await
}
