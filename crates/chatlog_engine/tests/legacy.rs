mod common;

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use chatlog_core::{Channel, DatabaseStatistics, ServerIdMapping, ServerKind, User};
use chatlog_engine::{
    import_legacy_archive, import_legacy_archives, Database, FakeSnowflake, ImportOutcome,
    MemoryDatabase, OsFileSystem, ProgressTree,
};
use common::{init_logging, ScriptedInteraction};
use futures_util::TryStreamExt;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const ARCHIVE: &str = r#"{
  "meta": {
    "users": {
      "1": { "name": "alice", "tag": "1234" },
      "2": { "name": "bob" }
    },
    "userindex": ["1", "2"],
    "servers": [
      { "name": "Guild", "type": "SERVER" },
      { "name": "bob", "type": "DM" }
    ],
    "channels": {
      "10": { "server": 0, "name": "general" },
      "11": { "server": 1, "name": "bob" }
    }
  },
  "data": {
    "10": {
      "100": { "u": 0, "t": 1600000000000, "m": "hello" },
      "101": { "u": 1, "t": 1600000060000, "m": "hi", "te": 1600000070000 }
    },
    "11": {
      "102": { "u": 1, "t": 1600000120000 }
    }
  }
}"#;

/// Remembers which thread pulled bytes out of it.
struct ThreadRecordingReader {
    inner: Cursor<&'static str>,
    reader_thread: Arc<Mutex<Option<ThreadId>>>,
}

impl Read for ThreadRecordingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        *self.reader_thread.lock().unwrap() = Some(thread::current().id());
        self.inner.read(buf)
    }
}

fn write_archive(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn archive_is_imported_with_mapped_and_fake_server_ids() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive = write_archive(&dir, "archive.txt", ARCHIVE);
    let missing = dir.path().join("gone.txt");
    let interaction =
        ScriptedInteraction::new().with_server_ids(Some(ServerIdMapping::from([(0, 555)])));
    let database = MemoryDatabase::new();
    let mut progress = ProgressTree::new(1);

    let summary = import_legacy_archives(
        &database,
        &[archive, missing],
        &OsFileSystem,
        &interaction,
        &mut progress,
    )
    .await;

    assert_eq!((summary.total, summary.succeeded, summary.finished), (2, 1, 2));
    assert_eq!(
        summary.outcomes(),
        vec![
            ImportOutcome::Succeeded,
            ImportOutcome::Skipped("file no longer exists".to_string()),
        ]
    );
    assert_eq!(
        interaction.notification_messages(),
        vec!["File 'gone.txt' no longer exists.".to_string()]
    );
    assert_eq!(
        database.statistics(),
        DatabaseStatistics {
            total_servers: 2,
            total_channels: 2,
            total_users: 2,
            total_messages: 3,
        }
    );

    let asked = interaction.asked_servers();
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0][1].kind, ServerKind::DirectMessage);

    let mut servers: Vec<(u64, String)> = database
        .servers()
        .map_ok(|server| (server.id, server.name))
        .try_collect()
        .await
        .unwrap();
    servers.sort();
    assert_eq!(
        servers,
        vec![(555, "Guild".to_string()), (u64::MAX, "bob".to_string())]
    );

    let channels: Vec<Channel> = database.channels().try_collect().await.unwrap();
    assert_eq!(
        channels,
        vec![
            Channel {
                id: 10,
                server: 555,
                name: "general".to_string()
            },
            Channel {
                id: 11,
                server: u64::MAX,
                name: "bob".to_string()
            },
        ]
    );

    let users: Vec<User> = database.users().try_collect().await.unwrap();
    assert_eq!(users[0].discriminator.as_deref(), Some("1234"));
    assert_eq!(users[1].discriminator, None);
}

#[tokio::test]
async fn cancelled_server_prompt_skips_the_archive() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive = write_archive(&dir, "archive.txt", ARCHIVE);
    let interaction = ScriptedInteraction::new().with_server_ids(None);
    let database = MemoryDatabase::new();
    let mut progress = ProgressTree::new(1);

    let summary =
        import_legacy_archives(&database, &[archive], &OsFileSystem, &interaction, &mut progress)
            .await;

    assert_eq!(
        summary.outcomes(),
        vec![ImportOutcome::Skipped("server ids not provided".to_string())]
    );
    assert!(interaction.notifications().is_empty());
    assert_eq!(database.statistics(), DatabaseStatistics::default());
}

#[tokio::test]
async fn broken_archive_fails_and_the_next_one_still_imports() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let broken = write_archive(&dir, "broken.txt", "{ \"meta\": ");
    let good = write_archive(&dir, "good.txt", ARCHIVE);
    let interaction = ScriptedInteraction::new();
    let database = MemoryDatabase::new();
    let mut progress = ProgressTree::new(1);

    let summary = import_legacy_archives(
        &database,
        &[broken, good],
        &OsFileSystem,
        &interaction,
        &mut progress,
    )
    .await;

    assert_eq!((summary.succeeded, summary.failed()), (1, 1));
    let messages = interaction.notification_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("File 'broken.txt' could not be imported: archive is not valid JSON"));
    assert_eq!(database.statistics().total_messages, 3);
}

#[tokio::test]
async fn unknown_server_type_fails_the_item() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive = write_archive(
        &dir,
        "odd.txt",
        r#"{ "meta": { "servers": [ { "name": "x", "type": "CHANNEL" } ] } }"#,
    );
    let interaction = ScriptedInteraction::new();
    let database = MemoryDatabase::new();
    let mut progress = ProgressTree::new(1);

    let summary =
        import_legacy_archives(&database, &[archive], &OsFileSystem, &interaction, &mut progress)
            .await;

    assert_eq!(
        summary.outcomes(),
        vec![ImportOutcome::Failed("unknown server type 'CHANNEL'".to_string())]
    );
    assert!(interaction.asked_servers().is_empty());
}

#[tokio::test]
async fn archive_is_read_off_the_runtime_thread() {
    init_logging();
    let reader_thread = Arc::new(Mutex::new(None));
    let reader = ThreadRecordingReader {
        inner: Cursor::new(ARCHIVE),
        reader_thread: Arc::clone(&reader_thread),
    };
    let interaction = ScriptedInteraction::new();
    let database = MemoryDatabase::new();

    let outcome = import_legacy_archive(reader, &database, &FakeSnowflake::new(), &interaction)
        .await
        .unwrap();

    assert_eq!(outcome, ImportOutcome::Succeeded);
    assert_eq!(database.statistics().total_messages, 3);
    let reader_thread = reader_thread.lock().unwrap().expect("archive was never read");
    assert_ne!(reader_thread, thread::current().id());
}
