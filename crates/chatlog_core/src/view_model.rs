use crate::FilterSettings;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelViewModel {
    pub settings: FilterSettings,
    pub has_any_filters: bool,
    pub statistics_text: String,
    pub channel_filter_label: String,
    pub user_filter_label: String,
    pub counting: bool,
}
