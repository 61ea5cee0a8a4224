use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use engine_logging::{engine_error, engine_info};
use tokio::runtime::Handle;

use crate::choices::{load_channel_choices, load_user_choices};
use crate::interaction::ui_bridge;
use crate::legacy::import_legacy_archives;
use crate::open::open_database;
use crate::progress::ChannelProgressSink;
use crate::{
    ChoiceKind, DatabaseHandle, DatabaseOpener, EngineEvent, EngineSettings, FileSystem,
    Interaction, ProgressSink, ProgressTree, RestartableTask, UiBridge, UiInbox, UiRequest,
    UPGRADE_PROGRESS_DEPTHS,
};

enum EngineCommand {
    OpenDatabase {
        path: PathBuf,
    },
    ImportLegacyArchives {
        target: DatabaseHandle,
        paths: Vec<PathBuf>,
    },
    LoadChoices {
        target: DatabaseHandle,
        kind: ChoiceKind,
        included: Option<BTreeSet<u64>>,
    },
}

struct EngineContext {
    settings: EngineSettings,
    opener: Arc<dyn DatabaseOpener>,
    fs: Arc<dyn FileSystem>,
    bridge: UiBridge,
}

/// UI-side handle to the background engine.
///
/// Commands run on a tokio runtime owned by a dedicated thread. Results come
/// back as [`EngineEvent`]s and user prompts as [`UiRequest`]s, both polled
/// by the UI loop.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    ui_inbox: UiInbox,
    runtime: Handle,
}

impl EngineHandle {
    pub fn new(
        settings: EngineSettings,
        opener: Arc<dyn DatabaseOpener>,
        fs: Arc<dyn FileSystem>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let handle = runtime.handle().clone();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (bridge, ui_inbox) = ui_bridge();
        let context = Arc::new(EngineContext {
            settings,
            opener,
            fs,
            bridge,
        });

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let context = context.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&context, command, event_tx).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            ui_inbox,
            runtime: handle,
        })
    }

    pub fn open_database(&self, path: impl Into<PathBuf>) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::OpenDatabase { path: path.into() });
    }

    pub fn import_legacy_archives(&self, target: DatabaseHandle, paths: Vec<PathBuf>) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::ImportLegacyArchives { target, paths });
    }

    pub fn load_choices(
        &self,
        target: DatabaseHandle,
        kind: ChoiceKind,
        included: Option<BTreeSet<u64>>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::LoadChoices {
            target,
            kind,
            included,
        });
    }

    /// A restartable task whose work runs on the engine runtime.
    /// Work still running when the handle is dropped is abandoned and never delivered.
    pub fn restartable<T: Send + 'static>(&self) -> RestartableTask<T> {
        RestartableTask::new(self.runtime.clone())
    }

    pub fn runtime(&self) -> Handle {
        self.runtime.clone()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn try_recv_ui_request(&self) -> Option<UiRequest> {
        self.ui_inbox.try_recv()
    }
}

async fn handle_command(
    context: &EngineContext,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx.clone()));

    match command {
        EngineCommand::OpenDatabase { path } => {
            let mut progress = ProgressTree::with_sink(UPGRADE_PROGRESS_DEPTHS, sink);
            let result = open_database(
                &path,
                context.opener.as_ref(),
                context.fs.as_ref(),
                &context.bridge,
                &context.settings,
                &mut progress,
            )
            .await;
            let event = match result {
                Ok(Some(database)) => EngineEvent::DatabaseSelected(database),
                Ok(None) => EngineEvent::OpenAborted { path },
                Err(err) => {
                    engine_error!("Opening {:?} failed: {}", path, err);
                    EngineEvent::OpenFailed {
                        path,
                        error: err.to_string(),
                    }
                }
            };
            let _ = event_tx.send(event);
        }
        EngineCommand::ImportLegacyArchives { target, paths } => {
            let mut progress = ProgressTree::with_sink(1, sink);
            let summary = import_legacy_archives(
                &*target,
                &paths,
                context.fs.as_ref(),
                &context.bridge,
                &mut progress,
            )
            .await;
            let _ = event_tx.send(EngineEvent::ImportCompleted {
                summary,
                progress: progress.channels().to_vec(),
            });
        }
        EngineCommand::LoadChoices {
            target,
            kind,
            included,
        } => {
            let result = match kind {
                ChoiceKind::Channels => load_channel_choices(&*target, included.as_ref()).await,
                ChoiceKind::Users => load_user_choices(&*target, included.as_ref()).await,
            };
            match result {
                Ok(items) => {
                    engine_info!("Loaded {} {:?} choices", items.len(), kind);
                    let _ = event_tx.send(EngineEvent::ChoicesLoaded { kind, items });
                }
                Err(err) => {
                    engine_error!("Loading {:?} choices failed: {}", kind, err);
                    context
                        .bridge
                        .notify(kind.dialog_title(), &format!("{}{}", kind.error_prefix(), err))
                        .await;
                    let _ = event_tx.send(EngineEvent::ChoicesFailed {
                        kind,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}
