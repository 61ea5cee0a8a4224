use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::Message;

/// Read-only snapshot of the active predicates. All `None` matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageFilter {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub channel_ids: Option<BTreeSet<u64>>,
    pub user_ids: Option<BTreeSet<u64>>,
}

impl MessageFilter {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.channel_ids.is_none()
            && self.user_ids.is_none()
    }

    pub fn matches(&self, message: &Message) -> bool {
        if self.start_date.is_some_and(|start| message.timestamp < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| message.timestamp > end) {
            return false;
        }
        if let Some(channels) = &self.channel_ids {
            if !channels.contains(&message.channel) {
                return false;
            }
        }
        if let Some(users) = &self.user_ids {
            if !users.contains(&message.sender) {
                return false;
            }
        }
        true
    }
}

/// Names of the editable filter fields, carried by filter-changed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    FilterByDate,
    StartDate,
    EndDate,
    FilterByChannel,
    IncludedChannels,
    FilterByUser,
    IncludedUsers,
}

/// A single edit to one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    FilterByDate(bool),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
    FilterByChannel(bool),
    IncludedChannels(Option<BTreeSet<u64>>),
    FilterByUser(bool),
    IncludedUsers(Option<BTreeSet<u64>>),
}

impl FilterEdit {
    pub fn field(&self) -> FilterField {
        match self {
            FilterEdit::FilterByDate(_) => FilterField::FilterByDate,
            FilterEdit::StartDate(_) => FilterField::StartDate,
            FilterEdit::EndDate(_) => FilterField::EndDate,
            FilterEdit::FilterByChannel(_) => FilterField::FilterByChannel,
            FilterEdit::IncludedChannels(_) => FilterField::IncludedChannels,
            FilterEdit::FilterByUser(_) => FilterField::FilterByUser,
            FilterEdit::IncludedUsers(_) => FilterField::IncludedUsers,
        }
    }
}

/// The user-editable fields of the filter panel.
///
/// Value sets are kept while their toggle is off so re-enabling a toggle
/// restores the previous selection, but they only reach [`MessageFilter`]
/// while the toggle is on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSettings {
    pub filter_by_date: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub filter_by_channel: bool,
    pub included_channels: Option<BTreeSet<u64>>,
    pub filter_by_user: bool,
    pub included_users: Option<BTreeSet<u64>>,
}

impl FilterSettings {
    pub fn has_any_filters(&self) -> bool {
        self.filter_by_date || self.filter_by_channel || self.filter_by_user
    }

    /// Applies an edit. Returns `false` when the field already held the value.
    pub fn apply(&mut self, edit: FilterEdit) -> bool {
        fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        match edit {
            FilterEdit::FilterByDate(value) => set(&mut self.filter_by_date, value),
            FilterEdit::StartDate(value) => set(&mut self.start_date, value),
            FilterEdit::EndDate(value) => set(&mut self.end_date, value),
            FilterEdit::FilterByChannel(value) => set(&mut self.filter_by_channel, value),
            FilterEdit::IncludedChannels(value) => set(&mut self.included_channels, value),
            FilterEdit::FilterByUser(value) => set(&mut self.filter_by_user, value),
            FilterEdit::IncludedUsers(value) => set(&mut self.included_users, value),
        }
    }

    pub fn create_filter(&self) -> MessageFilter {
        let mut filter = MessageFilter::default();

        if self.filter_by_date {
            filter.start_date = self.start_date.map(|date| date.and_time(NaiveTime::MIN));
            filter.end_date = self.end_date.map(end_of_day);
        }

        if self.filter_by_channel {
            filter.channel_ids = self.included_channels.clone();
        }

        if self.filter_by_user {
            filter.user_ids = self.included_users.clone();
        }

        filter
    }
}

/// Last representable millisecond of `date`: midnight of the next day minus 1 ms.
fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    match date.succ_opt() {
        Some(next) => next.and_time(NaiveTime::MIN) - Duration::milliseconds(1),
        None => NaiveDateTime::MAX,
    }
}
