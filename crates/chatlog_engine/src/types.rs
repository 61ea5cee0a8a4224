use std::path::PathBuf;

use chatlog_core::CheckBoxItem;

use crate::{BatchSummary, ChoiceKind, DatabaseHandle, ProgressChannel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Snapshot of every progress level of the running operation.
    Progress(Vec<ProgressChannel>),
    /// A database finished opening (and upgrading) and is ready for use.
    DatabaseSelected(DatabaseHandle),
    /// The user declined a required schema upgrade.
    OpenAborted { path: PathBuf },
    /// Opening failed; after a failed upgrade the file may be inconsistent.
    OpenFailed { path: PathBuf, error: String },
    ImportCompleted {
        summary: BatchSummary,
        progress: Vec<ProgressChannel>,
    },
    ChoicesLoaded {
        kind: ChoiceKind,
        items: Vec<CheckBoxItem<u64>>,
    },
    /// Sent after the user was notified about the failure.
    ChoicesFailed { kind: ChoiceKind, error: String },
}
