use chatlog_core::{DatabaseStatistics, Effect, Msg};
use chatlog_engine::{Database, DatabaseHandle, EngineHandle, RestartableTask};
use engine_logging::{engine_debug, engine_info};
use tokio::sync::watch;

/// Carries out core effects against the open database and turns engine
/// results back into messages for the UI loop.
pub struct EffectRunner {
    database: DatabaseHandle,
    count: RestartableTask<i64>,
    statistics: Option<watch::Receiver<DatabaseStatistics>>,
    reported: DatabaseStatistics,
}

impl EffectRunner {
    pub fn new(engine: &EngineHandle, database: DatabaseHandle) -> Self {
        let statistics = database.subscribe_statistics();
        Self {
            database,
            count: engine.restartable(),
            statistics: Some(statistics),
            reported: DatabaseStatistics::default(),
        }
    }

    /// Messages that seed a freshly opened panel with the current totals.
    pub fn initial_messages(&mut self) -> Vec<Msg> {
        let current = match &mut self.statistics {
            Some(statistics) => *statistics.borrow_and_update(),
            None => return Vec::new(),
        };
        self.reported = current;
        current
            .updates()
            .into_iter()
            .map(Msg::StatisticsChanged)
            .collect()
    }

    /// Starts or cancels counts. Outward notifications are returned for the presenter.
    pub fn enqueue(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut outward = Vec::new();
        for effect in effects {
            match effect {
                Effect::RestartCount(filter) => {
                    let database = self.database.database();
                    let generation = self.count.restart(move |token| async move {
                        database.count_messages(&filter, &token).await
                    });
                    engine_debug!("Counting messages as {:?}", generation);
                }
                Effect::CancelCount => self.count.cancel(),
                Effect::FilterChanged(field) => {
                    engine_debug!("Filter field {:?} changed", field);
                    outward.push(Effect::FilterChanged(field));
                }
                Effect::StatisticsTextChanged(text) => {
                    outward.push(Effect::StatisticsTextChanged(text));
                }
            }
        }
        outward
    }

    /// Non-blocking: a finished count and any statistics changes since the last poll.
    pub fn poll(&mut self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        if let Some(count) = self.count.try_deliver() {
            msgs.push(Msg::CountDelivered(count));
        }
        if let Some(statistics) = &mut self.statistics {
            if statistics.has_changed().unwrap_or(false) {
                let current = *statistics.borrow_and_update();
                msgs.extend(
                    self.reported
                        .changes_to(&current)
                        .into_iter()
                        .map(Msg::StatisticsChanged),
                );
                self.reported = current;
            }
        }
        msgs
    }

    pub fn is_counting(&self) -> bool {
        self.count.is_running()
    }

    /// Cancels the running count and stops listening for statistics changes.
    pub fn shutdown(&mut self) {
        self.count.cancel();
        if self.statistics.take().is_some() {
            engine_info!("Filter panel closed");
        }
    }
}
