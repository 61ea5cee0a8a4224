use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

use crate::{ArchiveError, FileSystem, Interaction, ProgressTree, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Succeeded,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub name: String,
    pub outcome: ImportOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub finished: usize,
    pub items: Vec<ItemReport>,
}

impl BatchSummary {
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ImportOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ImportOutcome::Failed(_)))
    }

    pub fn outcomes(&self) -> Vec<ImportOutcome> {
        self.items.iter().map(|item| item.outcome.clone()).collect()
    }

    fn count(&self, predicate: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.items
            .iter()
            .filter(|item| predicate(&item.outcome))
            .count()
    }
}

/// Titles and nouns used in notifications and logs for one kind of import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLabels {
    pub title: String,
    pub error_title: String,
    pub item_noun: String,
}

impl ImportLabels {
    pub fn legacy_archive() -> Self {
        Self {
            title: "Legacy Archive Import".to_string(),
            error_title: "Legacy Archive Error".to_string(),
            item_noun: "archive file".to_string(),
        }
    }
}

/// Sequential importer over a list of input files.
///
/// A missing file or a failing item is reported to the user and tallied;
/// the loop always runs to the end.
pub struct ImportBatch<'a> {
    fs: &'a dyn FileSystem,
    interaction: &'a dyn Interaction,
    labels: ImportLabels,
}

impl<'a> ImportBatch<'a> {
    pub fn new(fs: &'a dyn FileSystem, interaction: &'a dyn Interaction, labels: ImportLabels) -> Self {
        Self {
            fs,
            interaction,
            labels,
        }
    }

    pub async fn run<F, Fut>(
        &self,
        items: &[PathBuf],
        progress: &mut ProgressTree,
        mut import_one: F,
    ) -> BatchSummary
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = Result<ImportOutcome, ImportError>>,
    {
        let total = items.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };

        for path in items {
            let name = display_name(path);
            progress.update(0, name.as_str(), summary.finished as u64, total as u64);
            summary.finished += 1;
            engine_info!(
                "{}: {} '{}' ({}/{})",
                self.labels.title,
                self.labels.item_noun,
                name,
                summary.finished,
                total
            );

            let outcome = if !self.fs.exists(path) {
                engine_warn!("{} '{}' no longer exists", self.labels.item_noun, name);
                self.interaction
                    .notify(
                        &self.labels.error_title,
                        &format!("File '{name}' no longer exists."),
                    )
                    .await;
                ImportOutcome::Skipped("file no longer exists".to_string())
            } else {
                match import_one(path.clone()).await {
                    Ok(ImportOutcome::Failed(message)) => self.report_failure(&name, message).await,
                    Ok(outcome) => outcome,
                    Err(err) => self.report_failure(&name, err.to_string()).await,
                }
            };

            if outcome == ImportOutcome::Succeeded {
                summary.succeeded += 1;
            }
            summary.items.push(ItemReport { name, outcome });
        }

        progress.update(0, "Done", summary.finished as u64, total as u64);
        engine_info!(
            "{}: {} of {} imported, {} skipped, {} failed",
            self.labels.title,
            summary.succeeded,
            total,
            summary.skipped(),
            summary.failed()
        );
        summary
    }

    async fn report_failure(&self, name: &str, message: String) -> ImportOutcome {
        engine_warn!("{} '{}' could not be imported: {}", self.labels.item_noun, name, message);
        self.interaction
            .notify(
                &self.labels.error_title,
                &format!("File '{name}' could not be imported: {message}"),
            )
            .await;
        ImportOutcome::Failed(message)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
