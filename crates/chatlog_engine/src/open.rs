use std::path::Path;

use engine_logging::engine_info;
use thiserror::Error;

use crate::{
    DatabaseHandle, DatabaseOpener, Decision, EngineSettings, FileSystem, Interaction,
    ProgressTree, SchemaUpgradeCoordinator, SettingsKey, StorageError, UpgradeError, UpgradeState,
};

pub const AUTO_DOWNLOADS_TITLE: &str = "Automatic Downloads";
pub const AUTO_DOWNLOADS_MESSAGE: &str = "Do you want to automatically download files hosted \
    on the chat service? You can change this later in the Downloads tab.";

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("could not open database: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
}

/// Opens or creates the database at `path`, upgrading its schema when needed.
///
/// Returns `Ok(None)` when the user declines the upgrade. A new database asks
/// once whether downloads should start automatically.
pub async fn open_database(
    path: &Path,
    opener: &dyn DatabaseOpener,
    fs: &dyn FileSystem,
    interaction: &dyn Interaction,
    settings: &EngineSettings,
    progress: &mut ProgressTree,
) -> Result<Option<DatabaseHandle>, OpenError> {
    let is_new = !fs.exists(path);
    let opened = opener.open_or_create(path).await?;

    if !opened.pending_upgrade.is_empty() {
        let mut coordinator = SchemaUpgradeCoordinator::new(interaction, settings.upgrade_pacing);
        if coordinator.run(opened.pending_upgrade, progress).await? == UpgradeState::Aborted {
            return Ok(None);
        }
    }

    if is_new
        && interaction
            .confirm(AUTO_DOWNLOADS_TITLE, AUTO_DOWNLOADS_MESSAGE)
            .await
            == Decision::Yes
    {
        opened
            .database
            .set_setting(SettingsKey::DownloadsAutoStart, "true")
            .await?;
    }

    engine_info!("Opened database {:?} (new: {})", path, is_new);
    Ok(Some(DatabaseHandle::new(opened.database)))
}
