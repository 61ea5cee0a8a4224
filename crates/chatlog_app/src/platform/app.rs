use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use chatlog_core::{update, Effect, FilterEdit, Msg, PanelState};
use chatlog_engine::{
    BatchSummary, ChoiceKind, DatabaseHandle, EngineEvent, EngineHandle, MemoryOpener,
    OsFileSystem,
};
use engine_logging::{engine_info, engine_warn};

use super::config::{self, AppConfig};
use super::effects::EffectRunner;
use super::presenter::ConsolePresenter;
use crate::Cli;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

type Presenter = ConsolePresenter<io::StdinLock<'static>, io::Stdout>;

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let loaded = config::load(&cli.config);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => AppConfig::default(),
    };
    config.init_logging();
    match loaded {
        Ok(Some(_)) => engine_info!("Loaded settings from {:?}", cli.config),
        Ok(None) => engine_warn!("No settings at {:?}; using defaults", cli.config),
        Err(err) => engine_warn!("{}; using defaults", err),
    }

    let settings = config.engine_settings();
    let opener = Arc::new(MemoryOpener::new(&settings));
    let engine = EngineHandle::new(settings, opener, Arc::new(OsFileSystem))
        .context("failed to start the engine")?;
    let mut presenter = ConsolePresenter::new(io::stdin().lock(), io::stdout(), cli.yes);

    engine.open_database(cli.database.clone());
    let opened = wait_for(&engine, &mut presenter, |event| match event {
        EngineEvent::DatabaseSelected(database) => Some(Ok(Some(database))),
        EngineEvent::OpenAborted { .. } => Some(Ok(None)),
        EngineEvent::OpenFailed { path, error } => Some(Err((path, error))),
        _ => None,
    })?;
    let database = match opened {
        Ok(Some(database)) => database,
        Ok(None) => {
            engine_info!("Upgrade of {:?} declined", cli.database);
            return Ok(());
        }
        Err((path, error)) => bail!("could not open {:?}: {}", path, error),
    };

    if !cli.imports.is_empty() {
        engine.import_legacy_archives(database.clone(), cli.imports.clone());
        let summary = wait_for(&engine, &mut presenter, |event| match event {
            EngineEvent::ImportCompleted { summary, .. } => Some(summary),
            _ => None,
        })?;
        report_summary(&mut presenter, &summary)?;
    }

    if cli.list_choices {
        let included_channels = id_set(&cli.channels);
        let included_users = id_set(&cli.users);
        for (kind, included) in [
            (ChoiceKind::Channels, included_channels),
            (ChoiceKind::Users, included_users),
        ] {
            engine.load_choices(database.clone(), kind, included);
            let items = wait_for(&engine, &mut presenter, |event| match event {
                EngineEvent::ChoicesLoaded { items, .. } => Some(Some(items)),
                EngineEvent::ChoicesFailed { .. } => Some(None),
                _ => None,
            })?;
            if let Some(items) = items {
                presenter.show_choices(kind, &items)?;
            }
        }
    }

    count_matches(&engine, database, &config, &cli, &mut presenter)
}

/// Drives the filter panel: seeds it with the database totals, applies the
/// command-line filter and waits for the count.
fn count_matches(
    engine: &EngineHandle,
    database: DatabaseHandle,
    config: &AppConfig,
    cli: &Cli,
    presenter: &mut Presenter,
) -> anyhow::Result<()> {
    let mut runner = EffectRunner::new(engine, database);
    let mut state = PanelState::new(config.verb.clone());

    for msg in runner.initial_messages() {
        state = dispatch(state, msg, &mut runner, presenter)?;
    }
    for edit in filter_edits(cli) {
        state = dispatch(state, Msg::FilterEdited(edit), &mut runner, presenter)?;
    }

    while state.is_counting() {
        for msg in runner.poll() {
            state = dispatch(state, msg, &mut runner, presenter)?;
        }
        if state.is_counting() && !runner.is_counting() {
            engine_warn!("Counting stopped without a result");
            break;
        }
        answer_requests(engine, presenter)?;
        thread::sleep(POLL_INTERVAL);
    }

    let view = state.view();
    engine_info!(
        "Final statistics: {} ({}; {})",
        view.statistics_text,
        view.channel_filter_label,
        view.user_filter_label
    );

    dispatch(state, Msg::Closed, &mut runner, presenter)?;
    runner.shutdown();
    Ok(())
}

fn dispatch(
    state: PanelState,
    msg: Msg,
    runner: &mut EffectRunner,
    presenter: &mut Presenter,
) -> io::Result<PanelState> {
    let (state, effects) = update(state, msg);
    for effect in runner.enqueue(effects) {
        if let Effect::StatisticsTextChanged(text) = effect {
            presenter.show_statistics(&text)?;
        }
    }
    Ok(state)
}

fn filter_edits(cli: &Cli) -> Vec<FilterEdit> {
    let mut edits = Vec::new();
    if cli.from.is_some() || cli.to.is_some() {
        edits.push(FilterEdit::StartDate(cli.from));
        edits.push(FilterEdit::EndDate(cli.to));
        edits.push(FilterEdit::FilterByDate(true));
    }
    if let Some(channels) = id_set(&cli.channels) {
        edits.push(FilterEdit::IncludedChannels(Some(channels)));
        edits.push(FilterEdit::FilterByChannel(true));
    }
    if let Some(users) = id_set(&cli.users) {
        edits.push(FilterEdit::IncludedUsers(Some(users)));
        edits.push(FilterEdit::FilterByUser(true));
    }
    edits
}

fn id_set(ids: &[u64]) -> Option<BTreeSet<u64>> {
    (!ids.is_empty()).then(|| ids.iter().copied().collect())
}

/// Polls the engine like the UI loop would until `pick` accepts an event.
fn wait_for<T, R: BufRead, W: Write>(
    engine: &EngineHandle,
    presenter: &mut ConsolePresenter<R, W>,
    mut pick: impl FnMut(EngineEvent) -> Option<T>,
) -> io::Result<T> {
    loop {
        answer_requests(engine, presenter)?;
        while let Some(event) = engine.try_recv() {
            match event {
                EngineEvent::Progress(channels) => presenter.show_progress(channels)?,
                other => {
                    if let Some(value) = pick(other) {
                        return Ok(value);
                    }
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn answer_requests<R: BufRead, W: Write>(
    engine: &EngineHandle,
    presenter: &mut ConsolePresenter<R, W>,
) -> io::Result<()> {
    while let Some(request) = engine.try_recv_ui_request() {
        presenter.answer(request)?;
    }
    Ok(())
}

fn report_summary(presenter: &mut Presenter, summary: &BatchSummary) -> io::Result<()> {
    presenter.show_summary(summary)?;
    if summary.failed() > 0 {
        engine_warn!("{} archive(s) could not be imported", summary.failed());
    }
    Ok(())
}
