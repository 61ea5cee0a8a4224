#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chatlog_core::{PendingServer, ServerIdMapping};
use chatlog_engine::{Decision, EngineEvent, FileSystem, Interaction, ProgressSink};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Answers prompts from a script and records everything shown to the user.
#[derive(Default)]
pub struct ScriptedInteraction {
    confirms: Mutex<VecDeque<Decision>>,
    server_ids: Mutex<VecDeque<Option<ServerIdMapping>>>,
    confirmed: Mutex<Vec<String>>,
    notifications: Mutex<Vec<(String, String)>>,
    asked: Mutex<Vec<Vec<PendingServer>>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirms(self, decisions: impl IntoIterator<Item = Decision>) -> Self {
        self.confirms.lock().unwrap().extend(decisions);
        self
    }

    pub fn with_server_ids(self, answer: Option<ServerIdMapping>) -> Self {
        self.server_ids.lock().unwrap().push_back(answer);
        self
    }

    pub fn confirm_titles(&self) -> Vec<String> {
        self.confirmed.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn notification_messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }

    pub fn asked_servers(&self) -> Vec<Vec<PendingServer>> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn confirm(&self, title: &str, _message: &str) -> Decision {
        self.confirmed.lock().unwrap().push(title.to_string());
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Decision::No)
    }

    async fn notify(&self, title: &str, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    async fn ask_for_server_ids(&self, servers: Vec<PendingServer>) -> Option<ServerIdMapping> {
        self.asked.lock().unwrap().push(servers);
        self.server_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some(ServerIdMapping::new()))
    }
}

/// File system with a fixed set of existing paths, all empty.
#[derive(Default)]
pub struct FakeFs {
    existing: BTreeSet<PathBuf>,
}

impl FakeFs {
    pub fn with_files<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            existing: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl FileSystem for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        if self.exists(path) {
            Ok(Box::new(Cursor::new(Vec::new())))
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
