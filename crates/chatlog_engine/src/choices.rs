use std::collections::{BTreeSet, HashMap};

use chatlog_core::{channel_choices, user_choices, Channel, CheckBoxItem, Server, User};
use futures_util::TryStreamExt;

use crate::{Database, StorageError};

/// Which inclusion checklist is being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    Channels,
    Users,
}

impl ChoiceKind {
    pub fn dialog_title(self) -> &'static str {
        match self {
            ChoiceKind::Channels => "Included Channels",
            ChoiceKind::Users => "Included Users",
        }
    }

    pub fn error_prefix(self) -> &'static str {
        match self {
            ChoiceKind::Channels => "Error loading channels: ",
            ChoiceKind::Users => "Error loading users: ",
        }
    }
}

pub async fn load_channel_choices(
    database: &dyn Database,
    included: Option<&BTreeSet<u64>>,
) -> Result<Vec<CheckBoxItem<u64>>, StorageError> {
    let servers: HashMap<u64, Server> = database
        .servers()
        .map_ok(|server| (server.id, server))
        .try_collect()
        .await?;
    let channels: Vec<Channel> = database.channels().try_collect().await?;
    Ok(channel_choices(&channels, &servers, included))
}

pub async fn load_user_choices(
    database: &dyn Database,
    included: Option<&BTreeSet<u64>>,
) -> Result<Vec<CheckBoxItem<u64>>, StorageError> {
    let users: Vec<User> = database.users().try_collect().await?;
    Ok(user_choices(&users, included))
}
