use std::collections::BTreeSet;
use std::sync::Once;

use chatlog_core::{
    update, DatabaseStatistics, Effect, FilterEdit, FilterField, MessageFilter, Msg, PanelState,
    StatisticsUpdate,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn with_totals(messages: i64, channels: i64, users: i64) -> PanelState {
    let state = PanelState::new("Matches");
    let (state, _) = update(
        state,
        Msg::StatisticsChanged(StatisticsUpdate::TotalMessages(messages)),
    );
    let (state, _) = update(
        state,
        Msg::StatisticsChanged(StatisticsUpdate::TotalChannels(channels)),
    );
    let (state, _) = update(state, Msg::StatisticsChanged(StatisticsUpdate::TotalUsers(users)));
    state
}

fn edit(state: PanelState, edit: FilterEdit) -> (PanelState, Vec<Effect>) {
    update(state, Msg::FilterEdited(edit))
}

fn restarts(effects: &[Effect]) -> Vec<MessageFilter> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::RestartCount(filter) => Some(filter.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn initial_text_shows_unknown_counts() {
    init_logging();
    let state = PanelState::new("Matches");
    let view = state.view();

    assert_eq!(view.statistics_text, "Matches (...) out of (...) message.");
    assert_eq!(view.channel_filter_label, "Selected 0 / 0 channels.");
    assert_eq!(view.user_filter_label, "Selected 0 / 0 users.");
    assert!(!view.has_any_filters);
}

#[test]
fn total_messages_fill_in_identity_count() {
    init_logging();
    let (state, effects) = update(
        PanelState::new("Exports"),
        Msg::StatisticsChanged(StatisticsUpdate::TotalMessages(1500)),
    );

    assert_eq!(state.statistics_text(), "Exports 1,500 out of 1,500 messages.");
    assert_eq!(
        effects,
        vec![
            Effect::CancelCount,
            Effect::StatisticsTextChanged("Exports 1,500 out of 1,500 messages.".to_string()),
        ]
    );
}

#[test]
fn single_message_total_is_singular() {
    init_logging();
    let state = with_totals(1, 0, 0);
    assert_eq!(state.statistics_text(), "Matches 1 out of 1 message.");
}

#[test]
fn identity_filter_never_restarts_count() {
    init_logging();
    let state = with_totals(1500, 5, 3);

    let (state, e1) = edit(state, FilterEdit::FilterByChannel(true));
    let (state, e2) = edit(state, FilterEdit::FilterByUser(true));
    let (state, e3) = edit(
        state,
        FilterEdit::IncludedChannels(Some(BTreeSet::from([1, 2]))),
    );
    let (state, e4) = edit(state, FilterEdit::FilterByChannel(false));
    let (_state, e5) = edit(state, FilterEdit::StartDate(NaiveDate::from_ymd_opt(2020, 1, 1)));

    assert!(restarts(&e1).is_empty());
    assert!(restarts(&e2).is_empty());
    assert_eq!(restarts(&e3).len(), 1);
    assert!(restarts(&e4).is_empty());
    assert!(e4.contains(&Effect::CancelCount));
    assert!(restarts(&e5).is_empty());
}

#[test]
fn each_distinct_filter_value_restarts_once() {
    init_logging();
    let state = with_totals(1500, 5, 3);
    let (state, _) = edit(state, FilterEdit::FilterByUser(true));

    let (state, first) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::from([7]))));
    let (state, second) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::from([7, 8]))));
    let (_state, repeated) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::from([7, 8]))));

    assert_eq!(
        restarts(&first),
        vec![MessageFilter {
            user_ids: Some(BTreeSet::from([7])),
            ..Default::default()
        }]
    );
    assert_eq!(
        restarts(&second),
        vec![MessageFilter {
            user_ids: Some(BTreeSet::from([7, 8])),
            ..Default::default()
        }]
    );
    assert!(repeated.is_empty());
}

#[test]
fn restart_hides_previous_count_until_delivery() {
    init_logging();
    let state = with_totals(1500, 5, 3);
    let (state, _) = edit(state, FilterEdit::FilterByChannel(true));
    let (state, effects) = edit(
        state,
        FilterEdit::IncludedChannels(Some(BTreeSet::from([1, 2]))),
    );

    assert_eq!(
        effects,
        vec![
            Effect::StatisticsTextChanged("Matches (...) out of 1,500 messages.".to_string()),
            Effect::RestartCount(MessageFilter {
                channel_ids: Some(BTreeSet::from([1, 2])),
                ..Default::default()
            }),
            Effect::FilterChanged(FilterField::IncludedChannels),
        ]
    );
    assert!(state.is_counting());
    assert_eq!(state.view().channel_filter_label, "Selected 2 / 5 channels.");

    let (state, effects) = update(state, Msg::CountDelivered(42));
    assert_eq!(state.matching_count(), Some(42));
    assert!(!state.is_counting());
    assert_eq!(
        effects,
        vec![Effect::StatisticsTextChanged(
            "Matches 42 out of 1,500 messages.".to_string()
        )]
    );
}

#[test]
fn delivery_after_switching_to_identity_is_ignored() {
    init_logging();
    let state = with_totals(1500, 5, 3);
    let (state, _) = edit(state, FilterEdit::FilterByUser(true));
    let (state, _) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::from([4]))));
    let (state, _) = edit(state, FilterEdit::FilterByUser(false));

    let (state, effects) = update(state, Msg::CountDelivered(9));
    assert!(effects.is_empty());
    assert_eq!(state.matching_count(), Some(1500));
    assert_eq!(state.statistics_text(), "Matches 1,500 out of 1,500 messages.");
}

#[test]
fn total_change_restarts_active_filter() {
    init_logging();
    let state = with_totals(1500, 5, 3);
    let (state, _) = edit(state, FilterEdit::FilterByDate(true));
    let (state, effects) = edit(state, FilterEdit::EndDate(NaiveDate::from_ymd_opt(2021, 6, 30)));
    let expected = MessageFilter {
        end_date: NaiveDate::from_ymd_opt(2021, 6, 30)
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)),
        ..Default::default()
    };
    assert_eq!(restarts(&effects), vec![expected.clone()]);

    let (_state, effects) = update(
        state,
        Msg::StatisticsChanged(StatisticsUpdate::TotalMessages(1600)),
    );
    assert_eq!(restarts(&effects), vec![expected]);
}

#[test]
fn label_tracks_channel_totals() {
    init_logging();
    let state = with_totals(10, 1, 1);
    assert_eq!(state.view().channel_filter_label, "Selected 1 / 1 channel.");
    assert_eq!(state.view().user_filter_label, "Selected 1 / 1 user.");

    let (state, effects) = update(
        state,
        Msg::StatisticsChanged(StatisticsUpdate::TotalChannels(1200)),
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().channel_filter_label,
        "Selected 1,200 / 1,200 channels."
    );
}

#[test]
fn close_cancels_count() {
    init_logging();
    let state = with_totals(10, 1, 1);
    let (state, _) = edit(state, FilterEdit::FilterByUser(true));
    let (state, _) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::new())));
    assert!(state.is_counting());

    let (state, effects) = update(state, Msg::Closed);
    assert_eq!(effects, vec![Effect::CancelCount]);
    assert!(!state.is_counting());
}

#[test]
fn editing_an_inactive_field_keeps_the_running_count() {
    init_logging();
    let state = with_totals(1500, 5, 3);
    let (state, _) = edit(state, FilterEdit::FilterByChannel(true));
    let (state, _) = edit(state, FilterEdit::IncludedChannels(Some(BTreeSet::from([3]))));
    assert!(state.is_counting());

    let (state, effects) = edit(state, FilterEdit::IncludedUsers(Some(BTreeSet::from([9]))));
    assert_eq!(effects, vec![Effect::FilterChanged(FilterField::IncludedUsers)]);
    assert!(state.is_counting());

    let (state, _) = update(state, Msg::CountDelivered(12));
    let (state, effects) = edit(state, FilterEdit::StartDate(NaiveDate::from_ymd_opt(2022, 2, 2)));
    assert_eq!(effects, vec![Effect::FilterChanged(FilterField::StartDate)]);
    assert_eq!(state.matching_count(), Some(12));
}

#[test]
fn statistics_snapshot_diff_lists_changed_fields() {
    let before = DatabaseStatistics {
        total_servers: 1,
        total_channels: 2,
        total_users: 3,
        total_messages: 4,
    };
    let after = DatabaseStatistics {
        total_messages: 10,
        total_users: 5,
        ..before
    };

    assert_eq!(
        before.changes_to(&after),
        vec![
            StatisticsUpdate::TotalMessages(10),
            StatisticsUpdate::TotalUsers(5),
        ]
    );
    assert!(after.changes_to(&after).is_empty());
    assert_eq!(after.updates().len(), 3);
}
