use crate::{Effect, FilterField, Msg, PanelState, StatisticsUpdate};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: PanelState, msg: Msg) -> (PanelState, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::FilterEdited(edit) => {
            let field = edit.field();
            if !state.settings_mut().apply(edit) {
                return (state, effects);
            }
            refresh_filter_statistics(&mut state, &mut effects, false);
            effects.push(Effect::FilterChanged(field));

            match field {
                FilterField::FilterByChannel | FilterField::IncludedChannels => {
                    state.refresh_channel_label();
                }
                FilterField::FilterByUser | FilterField::IncludedUsers => {
                    state.refresh_user_label();
                }
                FilterField::FilterByDate | FilterField::StartDate | FilterField::EndDate => {}
            }
        }
        Msg::StatisticsChanged(StatisticsUpdate::TotalMessages(total)) => {
            state.set_total_messages(total);
            refresh_filter_statistics(&mut state, &mut effects, true);
        }
        Msg::StatisticsChanged(StatisticsUpdate::TotalChannels(total)) => {
            state.set_total_channels(total);
            state.refresh_channel_label();
        }
        Msg::StatisticsChanged(StatisticsUpdate::TotalUsers(total)) => {
            state.set_total_users(total);
            state.refresh_user_label();
        }
        Msg::CountDelivered(count) => {
            // A delivery that raced with a switch to the identity filter is stale.
            if state.is_counting() {
                state.set_counting(false);
                state.set_matching_count(Some(count));
                push_text_change(&mut state, &mut effects);
            }
        }
        Msg::Closed => {
            state.set_counting(false);
            state.set_counted_filter(None);
            effects.push(Effect::CancelCount);
        }
    }

    (state, effects)
}

/// Identity filters use the known total directly; anything else restarts the count.
/// An edit that leaves the effective filter unchanged keeps the current count
/// unless `force` is set.
fn refresh_filter_statistics(state: &mut PanelState, effects: &mut Vec<Effect>, force: bool) {
    let filter = state.create_filter();
    if !force && state.counted_filter() == Some(&filter) {
        return;
    }
    state.set_counted_filter(Some(filter.clone()));

    if filter.is_empty() {
        state.set_counting(false);
        effects.push(Effect::CancelCount);
        state.set_matching_count(state.total_messages());
        push_text_change(state, effects);
    } else {
        state.set_counting(true);
        state.set_matching_count(None);
        push_text_change(state, effects);
        effects.push(Effect::RestartCount(filter));
    }
}

fn push_text_change(state: &mut PanelState, effects: &mut Vec<Effect>) {
    if let Some(text) = state.refresh_statistics_text() {
        effects.push(Effect::StatisticsTextChanged(text));
    }
}
