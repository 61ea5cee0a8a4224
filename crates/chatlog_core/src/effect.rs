use crate::{FilterField, MessageFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel any in-flight count and start counting for this filter.
    RestartCount(MessageFilter),
    /// Cancel any in-flight count without starting another.
    CancelCount,
    /// Outward notification that a filter field changed.
    FilterChanged(FilterField),
    /// Outward notification that the statistics text changed.
    StatisticsTextChanged(String),
}
