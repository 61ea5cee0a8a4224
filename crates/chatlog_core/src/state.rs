use crate::format::{format_count, pluralize};
use crate::view_model::PanelViewModel;
use crate::{FilterSettings, MessageFilter};

pub const DEFAULT_VERB: &str = "Matches";

/// State of the message filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    verb: String,
    settings: FilterSettings,
    matching_count: Option<i64>,
    /// Filter that `matching_count` belongs to, or is being counted for.
    counted_filter: Option<MessageFilter>,
    total_messages: Option<i64>,
    total_channels: i64,
    total_users: i64,
    counting: bool,
    statistics_text: String,
    channel_filter_label: String,
    user_filter_label: String,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(DEFAULT_VERB)
    }
}

impl PanelState {
    pub fn new(verb: impl Into<String>) -> Self {
        let mut state = Self {
            verb: verb.into(),
            settings: FilterSettings::default(),
            matching_count: None,
            counted_filter: None,
            total_messages: None,
            total_channels: 0,
            total_users: 0,
            counting: false,
            statistics_text: String::new(),
            channel_filter_label: String::new(),
            user_filter_label: String::new(),
        };
        state.statistics_text = state.render_statistics_text();
        state.refresh_channel_label();
        state.refresh_user_label();
        state
    }

    pub fn view(&self) -> PanelViewModel {
        PanelViewModel {
            settings: self.settings.clone(),
            has_any_filters: self.settings.has_any_filters(),
            statistics_text: self.statistics_text.clone(),
            channel_filter_label: self.channel_filter_label.clone(),
            user_filter_label: self.user_filter_label.clone(),
            counting: self.counting,
        }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn create_filter(&self) -> MessageFilter {
        self.settings.create_filter()
    }

    pub fn matching_count(&self) -> Option<i64> {
        self.matching_count
    }

    pub fn total_messages(&self) -> Option<i64> {
        self.total_messages
    }

    pub fn is_counting(&self) -> bool {
        self.counting
    }

    pub fn statistics_text(&self) -> &str {
        &self.statistics_text
    }

    pub(crate) fn settings_mut(&mut self) -> &mut FilterSettings {
        &mut self.settings
    }

    pub(crate) fn set_matching_count(&mut self, count: Option<i64>) {
        self.matching_count = count;
    }

    pub(crate) fn counted_filter(&self) -> Option<&MessageFilter> {
        self.counted_filter.as_ref()
    }

    pub(crate) fn set_counted_filter(&mut self, filter: Option<MessageFilter>) {
        self.counted_filter = filter;
    }

    pub(crate) fn set_counting(&mut self, counting: bool) {
        self.counting = counting;
    }

    pub(crate) fn set_total_messages(&mut self, total: i64) {
        self.total_messages = Some(total);
    }

    pub(crate) fn set_total_channels(&mut self, total: i64) {
        self.total_channels = total;
    }

    pub(crate) fn set_total_users(&mut self, total: i64) {
        self.total_users = total;
    }

    /// Re-renders the statistics text; returns the new text when it changed.
    pub(crate) fn refresh_statistics_text(&mut self) -> Option<String> {
        let text = self.render_statistics_text();
        if text == self.statistics_text {
            return None;
        }
        self.statistics_text = text.clone();
        Some(text)
    }

    pub(crate) fn refresh_channel_label(&mut self) {
        let label = selection_label(
            self.settings.filter_by_channel,
            self.settings.included_channels.as_ref().map(|set| set.len()),
            self.total_channels,
            "channel",
        );
        if label != self.channel_filter_label {
            self.channel_filter_label = label;
        }
    }

    pub(crate) fn refresh_user_label(&mut self) {
        let label = selection_label(
            self.settings.filter_by_user,
            self.settings.included_users.as_ref().map(|set| set.len()),
            self.total_users,
            "user",
        );
        if label != self.user_filter_label {
            self.user_filter_label = label;
        }
    }

    fn render_statistics_text(&self) -> String {
        let matching = self
            .matching_count
            .map(format_count)
            .unwrap_or_else(|| "(...)".to_string());
        let total = self
            .total_messages
            .map(format_count)
            .unwrap_or_else(|| "(...)".to_string());
        let suffix = match self.total_messages {
            None | Some(1) => "message.",
            Some(_) => "messages.",
        };
        format!("{} {matching} out of {total} {suffix}", self.verb)
    }
}

fn selection_label(enabled: bool, selected: Option<usize>, total: i64, noun: &str) -> String {
    let included = match (enabled, selected) {
        (true, Some(count)) => i64::try_from(count).unwrap_or(i64::MAX),
        _ => total,
    };
    format!("Selected {} / {}.", format_count(included), pluralize(total, noun))
}
