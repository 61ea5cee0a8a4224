use crate::{FilterEdit, StatisticsUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User changed one field of the filter panel.
    FilterEdited(FilterEdit),
    /// The open database reported a new statistics value.
    StatisticsChanged(StatisticsUpdate),
    /// Engine finished counting messages for the current filter.
    CountDelivered(i64),
    /// Panel is being closed.
    Closed,
}
