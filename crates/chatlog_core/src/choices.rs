//! Row builders for the inclusion checklists and the imported server-id form.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{Channel, Server, ServerKind, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBoxItem<T> {
    pub item: T,
    pub title: String,
    pub checked: bool,
}

pub fn channel_title(channel: &Channel, server: Option<&Server>) -> String {
    match server {
        Some(server) if server.kind == ServerKind::DirectMessage => {
            format!("[{}] {}", server.kind.tag(), channel.name)
        }
        Some(server) => format!("[{}] {} - {}", server.kind.tag(), server.name, channel.name),
        None => channel.name.clone(),
    }
}

pub fn user_title(user: &User) -> String {
    match &user.discriminator {
        Some(discriminator) => format!("{} #{}", user.name, discriminator),
        None => user.name.clone(),
    }
}

/// Builds channel rows sorted by title. Every row is checked when there is no
/// inclusion set yet.
pub fn channel_choices(
    channels: &[Channel],
    servers: &HashMap<u64, Server>,
    included: Option<&BTreeSet<u64>>,
) -> Vec<CheckBoxItem<u64>> {
    let items = channels
        .iter()
        .map(|channel| CheckBoxItem {
            item: channel.id,
            title: channel_title(channel, servers.get(&channel.server)),
            checked: included.is_none_or(|set| set.contains(&channel.id)),
        })
        .collect();
    sorted_by_title(items)
}

pub fn user_choices(users: &[User], included: Option<&BTreeSet<u64>>) -> Vec<CheckBoxItem<u64>> {
    let items = users
        .iter()
        .map(|user| CheckBoxItem {
            item: user.id,
            title: user_title(user),
            checked: included.is_none_or(|set| set.contains(&user.id)),
        })
        .collect();
    sorted_by_title(items)
}

pub fn selected_ids(items: &[CheckBoxItem<u64>]) -> BTreeSet<u64> {
    items
        .iter()
        .filter(|item| item.checked)
        .map(|item| item.item)
        .collect()
}

fn sorted_by_title(mut items: Vec<CheckBoxItem<u64>>) -> Vec<CheckBoxItem<u64>> {
    items.sort_by(|a, b| a.title.cmp(&b.title));
    items
}

/// A server read from an archive that does not carry its real id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingServer {
    /// Position of the server inside the archive.
    pub key: usize,
    pub name: String,
    pub kind: ServerKind,
}

/// Archive server key -> real server id.
pub type ServerIdMapping = BTreeMap<usize, u64>;

pub fn is_valid_snowflake(value: &str) -> bool {
    value.is_empty() || value.parse::<u64>().is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdRow {
    pub server: PendingServer,
    pub title: String,
    pub value: String,
}

impl ServerIdRow {
    pub fn is_valid(&self) -> bool {
        is_valid_snowflake(self.value.trim())
    }
}

/// Text-box form asking the user for the real ids of imported servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdForm {
    rows: Vec<ServerIdRow>,
}

impl ServerIdForm {
    pub const TITLE: &'static str = "Imported Server IDs";
    pub const DESCRIPTION: &'static str = "Please fill in the IDs of servers and direct messages. \
        Right-click each server or direct message, copy its ID, and paste it into the input field. \
        If a server no longer exists, leave its input field empty to use a random ID.";

    pub fn new(mut servers: Vec<PendingServer>) -> Self {
        servers.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        let rows = servers
            .into_iter()
            .map(|server| ServerIdRow {
                title: format!("{} ({})", server.name, server.kind.nice_name()),
                server,
                value: String::new(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ServerIdRow] {
        &self.rows
    }

    /// Sets the text of row `index`; out-of-range indices are ignored.
    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.value = value.into();
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rows.iter().all(ServerIdRow::is_valid)
    }

    /// Mapping of every valid, non-empty row. Blank rows are left for the
    /// importer to fill with generated ids.
    pub fn mapping(&self) -> ServerIdMapping {
        self.rows
            .iter()
            .filter_map(|row| {
                let value = row.value.trim();
                value
                    .parse::<u64>()
                    .ok()
                    .map(|id| (row.server.key, id))
            })
            .collect()
    }
}
