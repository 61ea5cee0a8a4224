//! Chatlog core: pure filter-panel state machine and view-model helpers.
mod choices;
mod effect;
mod filter;
mod format;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use choices::{
    channel_choices, channel_title, is_valid_snowflake, selected_ids, user_choices, user_title,
    CheckBoxItem, PendingServer, ServerIdForm, ServerIdMapping, ServerIdRow,
};
pub use effect::Effect;
pub use filter::{FilterEdit, FilterField, FilterSettings, MessageFilter};
pub use format::{format_count, pluralize};
pub use model::{
    Channel, DatabaseStatistics, Message, Server, ServerKind, StatisticsUpdate, User,
};
pub use msg::Msg;
pub use state::{PanelState, DEFAULT_VERB};
pub use update::update;
pub use view_model::PanelViewModel;
