//! Chatlog engine: restartable counting, progress reporting, imports and upgrades.
mod choices;
mod engine;
mod fs;
mod import;
mod interaction;
mod legacy;
mod memory;
mod open;
mod progress;
mod restartable;
mod settings;
mod storage;
mod types;
mod upgrade;

pub use choices::{load_channel_choices, load_user_choices, ChoiceKind};
pub use engine::EngineHandle;
pub use fs::{FileSystem, OsFileSystem};
pub use import::{BatchSummary, ImportBatch, ImportError, ImportLabels, ImportOutcome, ItemReport};
pub use interaction::{ui_bridge, Decision, Interaction, UiBridge, UiInbox, UiRequest};
pub use legacy::{import_legacy_archive, import_legacy_archives, ArchiveError, FakeSnowflake};
pub use memory::{MemoryDatabase, MemoryOpener};
pub use open::{open_database, OpenError, AUTO_DOWNLOADS_MESSAGE, AUTO_DOWNLOADS_TITLE};
pub use progress::{ChannelProgressSink, ProgressChannel, ProgressSink, ProgressTree};
pub use restartable::{Generation, RestartableTask};
pub use settings::{EngineSettings, UpgradePacing};
pub use storage::{
    Database, DatabaseHandle, DatabaseOpener, EntityStream, OpenedDatabase, SettingsKey,
    StorageError,
};
pub use types::EngineEvent;
pub use upgrade::{
    SchemaUpgradeCoordinator, StepError, UpgradeError, UpgradeReporter, UpgradeState, UpgradeStep,
    UPGRADE_CONFIRM_MESSAGE, UPGRADE_CONFIRM_TITLE, UPGRADE_PROGRESS_DEPTHS,
};
