use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServerKind {
    Server,
    Group,
    DirectMessage,
}

impl ServerKind {
    /// Short bracketed tag used in channel titles.
    pub fn tag(self) -> &'static str {
        match self {
            ServerKind::Server => "SERVER",
            ServerKind::Group => "GROUP",
            ServerKind::DirectMessage => "DM",
        }
    }

    pub fn nice_name(self) -> &'static str {
        match self {
            ServerKind::Server => "Server",
            ServerKind::Group => "Group",
            ServerKind::DirectMessage => "Direct Message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Server {
    pub id: u64,
    pub name: String,
    pub kind: ServerKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: u64,
    pub server: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub channel: u64,
    pub sender: u64,
    pub timestamp: NaiveDateTime,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStatistics {
    pub total_servers: i64,
    pub total_channels: i64,
    pub total_users: i64,
    pub total_messages: i64,
}

/// A single statistics field that changed in the open database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsUpdate {
    TotalMessages(i64),
    TotalChannels(i64),
    TotalUsers(i64),
}

impl DatabaseStatistics {
    /// Every tracked field, for seeding a freshly opened panel.
    pub fn updates(&self) -> Vec<StatisticsUpdate> {
        vec![
            StatisticsUpdate::TotalMessages(self.total_messages),
            StatisticsUpdate::TotalChannels(self.total_channels),
            StatisticsUpdate::TotalUsers(self.total_users),
        ]
    }

    /// Lists the fields that differ between `self` and `next`.
    pub fn changes_to(&self, next: &DatabaseStatistics) -> Vec<StatisticsUpdate> {
        let mut changes = Vec::new();
        if self.total_messages != next.total_messages {
            changes.push(StatisticsUpdate::TotalMessages(next.total_messages));
        }
        if self.total_channels != next.total_channels {
            changes.push(StatisticsUpdate::TotalChannels(next.total_channels));
        }
        if self.total_users != next.total_users {
            changes.push(StatisticsUpdate::TotalUsers(next.total_users));
        }
        changes
    }
}
