use std::fmt::Display;
use std::future::Future;

use engine_logging::{engine_debug, engine_trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Identifies one unit of work started by [`RestartableTask::restart`].
/// Never reused within a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

enum Completion<T> {
    Finished(T),
    Abandoned,
}

type CompletionTx<T> = mpsc::UnboundedSender<(Generation, Completion<T>)>;

/// Owned by a spawned unit. Reports `Abandoned` when the unit is dropped
/// before finishing, as happens when its runtime shuts down.
struct CompletionReporter<T> {
    generation: Generation,
    tx: Option<CompletionTx<T>>,
}

impl<T> CompletionReporter<T> {
    fn report(mut self, completion: Completion<T>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((self.generation, completion));
        }
    }
}

impl<T> Drop for CompletionReporter<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((self.generation, Completion::Abandoned));
        }
    }
}

struct Running {
    generation: Generation,
    token: CancellationToken,
}

/// Single-slot supervisor for a computation that is restarted whenever its input changes.
///
/// The task is owned by the UI-bound context. Work runs on the engine runtime;
/// its completion is queued tagged with its generation and only handed out by
/// [`try_deliver`](Self::try_deliver) / [`next_delivery`](Self::next_delivery)
/// while that generation is still the current one. At most one value is
/// delivered per restart.
pub struct RestartableTask<T> {
    runtime: Handle,
    last_generation: u64,
    current: Option<Running>,
    completed_tx: CompletionTx<T>,
    completed_rx: mpsc::UnboundedReceiver<(Generation, Completion<T>)>,
}

impl<T: Send + 'static> RestartableTask<T> {
    pub fn new(runtime: Handle) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            last_generation: 0,
            current: None,
            completed_tx,
            completed_rx,
        }
    }

    /// Cancels the running unit, if any, and starts `work` as the new current unit.
    ///
    /// `work` receives the unit's cancellation token and should check it at its
    /// own await points. Errors are logged and never delivered.
    pub fn restart<F, Fut, E>(&mut self, work: F) -> Generation
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.cancel();

        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        let token = CancellationToken::new();
        let future = work(token.clone());
        let reporter = CompletionReporter {
            generation,
            tx: Some(self.completed_tx.clone()),
        };
        let guard = token.clone();

        self.runtime.spawn(async move {
            let completion = tokio::select! {
                _ = guard.cancelled() => Completion::Abandoned,
                result = future => match result {
                    Ok(value) => Completion::Finished(value),
                    Err(err) => {
                        engine_debug!("Restartable work {:?} failed: {}", generation, err);
                        Completion::Abandoned
                    }
                },
            };
            reporter.report(completion);
        });

        engine_trace!("Restartable work {:?} started", generation);
        self.current = Some(Running { generation, token });
        generation
    }

    /// Invalidates the current unit without starting another.
    pub fn cancel(&mut self) {
        if let Some(running) = self.current.take() {
            engine_trace!("Restartable work {:?} cancelled", running.generation);
            running.token.cancel();
        }
    }

    pub fn current(&self) -> Option<Generation> {
        self.current.as_ref().map(|running| running.generation)
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Non-blocking: returns the current unit's result if it has arrived.
    pub fn try_deliver(&mut self) -> Option<T> {
        while let Ok((generation, completion)) = self.completed_rx.try_recv() {
            if let Some(value) = self.accept(generation, completion) {
                return Some(value);
            }
        }
        None
    }

    /// Waits for the current unit to finish. Returns `None` right away when
    /// nothing is running, and `None` when the current unit fails or its
    /// runtime shuts down before it completes.
    pub async fn next_delivery(&mut self) -> Option<T> {
        while self.current.is_some() {
            let (generation, completion) = self.completed_rx.recv().await?;
            if let Some(value) = self.accept(generation, completion) {
                return Some(value);
            }
        }
        None
    }

    fn accept(&mut self, generation: Generation, completion: Completion<T>) -> Option<T> {
        if self.current() != Some(generation) {
            engine_trace!("Discarding stale result of {:?}", generation);
            return None;
        }
        self.current = None;
        match completion {
            Completion::Finished(value) => Some(value),
            Completion::Abandoned => None,
        }
    }
}

impl<T> Drop for RestartableTask<T> {
    fn drop(&mut self) {
        if let Some(running) = self.current.take() {
            running.token.cancel();
        }
    }
}
