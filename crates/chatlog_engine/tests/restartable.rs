mod common;

use std::convert::Infallible;
use std::time::Duration;

use chatlog_engine::RestartableTask;
use common::init_logging;
use pretty_assertions::assert_eq;
use tokio::runtime::{Builder, Handle};
use tokio::time::sleep;

fn task<T: Send + 'static>() -> RestartableTask<T> {
    init_logging();
    RestartableTask::new(Handle::current())
}

#[tokio::test(start_paused = true)]
async fn only_the_latest_restart_is_delivered() {
    let mut task = task::<u32>();

    // Earlier units take longer, so they would finish after the last one.
    for value in 0..10u32 {
        let delay = Duration::from_millis(u64::from(100 - value * 10));
        task.restart(move |_token| async move {
            sleep(delay).await;
            Ok::<_, Infallible>(value)
        });
    }

    assert_eq!(task.next_delivery().await, Some(9));
    assert!(!task.is_running());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(task.try_deliver(), None);
}

#[tokio::test(start_paused = true)]
async fn stale_completion_is_discarded() {
    let mut task = task::<u32>();
    task.restart(|_token| async {
        sleep(Duration::from_millis(50)).await;
        Ok::<_, Infallible>(1)
    });
    task.restart(|_token| async { Ok::<_, Infallible>(2) });

    assert_eq!(task.next_delivery().await, Some(2));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(task.try_deliver(), None);
}

#[tokio::test(start_paused = true)]
async fn cancel_then_late_completion_delivers_nothing() {
    let mut task = task::<u32>();
    task.restart(|_token| async {
        sleep(Duration::from_millis(10)).await;
        Ok::<_, Infallible>(5)
    });
    task.cancel();
    assert!(!task.is_running());

    sleep(Duration::from_millis(50)).await;
    assert_eq!(task.try_deliver(), None);
    assert_eq!(task.next_delivery().await, None);
}

#[tokio::test]
async fn restart_cancels_the_previous_token() {
    let mut task = task::<u32>();
    let mut first = None;
    task.restart(|token| {
        first = Some(token.clone());
        async move {
            token.cancelled().await;
            Ok::<_, Infallible>(0)
        }
    });
    let first = first.expect("work was started");
    assert!(!first.is_cancelled());

    task.restart(|_token| async { Ok::<_, Infallible>(7) });
    assert!(first.is_cancelled());
    assert_eq!(task.next_delivery().await, Some(7));
}

#[tokio::test]
async fn failed_work_is_not_delivered() {
    let mut task = task::<u32>();
    task.restart(|_token| async { Err::<u32, _>("storage went away") });

    assert_eq!(task.next_delivery().await, None);
    assert!(!task.is_running());
}

#[tokio::test]
async fn generations_are_never_reused() {
    let mut task = task::<u32>();
    let first = task.restart(|_token| async { Ok::<_, Infallible>(1) });
    task.cancel();
    let second = task.restart(|_token| async { Ok::<_, Infallible>(2) });

    assert!(second > first);
    assert_eq!(task.current(), Some(second));
    assert_eq!(task.next_delivery().await, Some(2));
    assert_eq!(task.current(), None);
}

#[tokio::test]
async fn dropping_the_task_cancels_running_work() {
    let mut task = task::<u32>();
    let mut token = None;
    task.restart(|unit| {
        token = Some(unit.clone());
        async move {
            unit.cancelled().await;
            Ok::<_, Infallible>(0)
        }
    });
    drop(task);
    assert!(token.expect("work was started").is_cancelled());
}

#[test]
fn runtime_shutdown_ends_the_wait_for_a_delivery() {
    init_logging();
    let engine_runtime = Builder::new_current_thread().enable_all().build().unwrap();
    let mut task = RestartableTask::<u32>::new(engine_runtime.handle().clone());
    task.restart(|_token| async {
        std::future::pending::<()>().await;
        Ok::<_, Infallible>(1)
    });
    drop(engine_runtime);

    let caller = Builder::new_current_thread().enable_all().build().unwrap();
    let delivered = caller.block_on(async {
        tokio::time::timeout(Duration::from_secs(5), task.next_delivery()).await
    });
    assert_eq!(delivered, Ok(None));
    assert!(!task.is_running());
}
