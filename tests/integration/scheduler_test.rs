use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use sysbridge::core::threads::{IntervalHandle, UpdateStep, UpdateWorker, MIN_INTERVAL};
use sysbridge::{BridgeError, Result};

const WAIT: Duration = Duration::from_secs(5);

struct Recorder {
    ticks: Sender<(Instant, Option<u32>)>,
}

impl UpdateStep for Recorder {
    type Params = u32;

    async fn update(&mut self, params: Option<u32>) -> Result<()> {
        let _ = self.ticks.send((Instant::now(), params));
        Ok(())
    }
}

fn recorder(interval: Duration) -> (UpdateWorker, Sender<u32>, Receiver<(Instant, Option<u32>)>) {
    let (ticks_tx, ticks_rx) = unbounded();
    let (requests_tx, requests_rx) = unbounded();
    let worker = UpdateWorker::spawn(
        "test-update",
        Recorder { ticks: ticks_tx },
        IntervalHandle::new(interval),
        requests_rx,
    )
    .unwrap();
    (worker, requests_tx, ticks_rx)
}

#[test]
fn test_natural_ticks_follow_interval() {
    let (mut worker, _requests, ticks) = recorder(Duration::from_millis(200));

    let (first, params) = ticks.recv_timeout(WAIT).unwrap();
    assert_eq!(params, None);
    let (second, _) = ticks.recv_timeout(WAIT).unwrap();
    let (third, _) = ticks.recv_timeout(WAIT).unwrap();

    for gap in [second - first, third - second] {
        assert!(gap >= Duration::from_millis(150), "gap too short: {:?}", gap);
        assert!(gap < Duration::from_millis(1000), "gap too long: {:?}", gap);
    }

    assert!(worker.interrupt(Some(WAIT)));
}

#[test]
fn test_forced_tick_keeps_natural_cadence() {
    let (mut worker, requests, ticks) = recorder(Duration::from_millis(1000));

    let (start, _) = ticks.recv_timeout(WAIT).unwrap();
    thread::sleep(Duration::from_millis(400));
    requests.send(7).unwrap();

    let (forced_at, params) = ticks.recv_timeout(WAIT).unwrap();
    assert_eq!(params, Some(7));
    assert!(forced_at - start < Duration::from_millis(800));

    // The natural tick still lands on start + interval, not forced_at + interval
    let (natural_at, params) = ticks.recv_timeout(WAIT).unwrap();
    assert_eq!(params, None);
    let since_start = natural_at - start;
    assert!(since_start >= Duration::from_millis(900), "{:?}", since_start);
    assert!(since_start < Duration::from_millis(1300), "{:?}", since_start);

    assert!(worker.interrupt(Some(WAIT)));
}

#[test]
fn test_forced_requests_run_in_order() {
    let (mut worker, requests, ticks) = recorder(Duration::from_secs(60));
    ticks.recv_timeout(WAIT).unwrap();

    requests.send(1).unwrap();
    requests.send(2).unwrap();

    assert_eq!(ticks.recv_timeout(WAIT).unwrap().1, Some(1));
    assert_eq!(ticks.recv_timeout(WAIT).unwrap().1, Some(2));
    assert!(ticks.recv_timeout(Duration::from_millis(200)).is_err());

    assert!(worker.interrupt(Some(WAIT)));
}

#[test]
fn test_no_tick_after_interrupt() {
    let (mut worker, requests, ticks) = recorder(Duration::from_millis(30));
    ticks.recv_timeout(WAIT).unwrap();

    assert!(worker.interrupt(Some(WAIT)));
    assert!(!worker.is_alive());
    while ticks.try_recv().is_ok() {}

    let _ = requests.send(3);
    thread::sleep(Duration::from_millis(200));
    assert!(ticks.try_recv().is_err());
}

#[test]
fn test_interrupt_wakes_long_wait() {
    let (mut worker, _requests, ticks) = recorder(Duration::from_secs(3600));
    ticks.recv_timeout(WAIT).unwrap();

    let started = Instant::now();
    assert!(worker.interrupt(None));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_interval_change_applies_to_next_schedule() {
    let interval = IntervalHandle::new(Duration::from_millis(400));
    let (ticks_tx, ticks) = unbounded();
    let (_requests_tx, requests_rx) = unbounded::<u32>();
    let mut worker = UpdateWorker::spawn(
        "interval-update",
        Recorder { ticks: ticks_tx },
        interval.clone(),
        requests_rx,
    )
    .unwrap();

    let (first, _) = ticks.recv_timeout(WAIT).unwrap();
    interval.set(Duration::from_millis(50));

    let (second, _) = ticks.recv_timeout(WAIT).unwrap();
    let (third, _) = ticks.recv_timeout(WAIT).unwrap();

    // next_run was computed before the change
    assert!(second - first >= Duration::from_millis(300));
    assert!(third - second < Duration::from_millis(300));
    assert_eq!(worker.interval().get(), Duration::from_millis(50));

    assert!(worker.interrupt(Some(WAIT)));
}

#[test]
fn test_closed_request_channel_keeps_ticking() {
    let (mut worker, requests, ticks) = recorder(Duration::from_millis(50));
    drop(requests);

    for _ in 0..3 {
        assert_eq!(ticks.recv_timeout(WAIT).unwrap().1, None);
    }
    assert!(worker.is_alive());
    assert!(worker.interrupt(Some(WAIT)));
}

struct Flaky {
    calls: u32,
    ticks: Sender<u32>,
}

impl UpdateStep for Flaky {
    type Params = ();

    async fn update(&mut self, _params: Option<()>) -> Result<()> {
        self.calls += 1;
        let _ = self.ticks.send(self.calls);
        match self.calls {
            1 => Err(BridgeError::other("step failed")),
            2 => panic!("step panicked"),
            _ => Ok(()),
        }
    }
}

#[test]
fn test_failing_step_does_not_stop_worker() {
    let (ticks_tx, ticks) = unbounded();
    let (_requests_tx, requests_rx) = unbounded::<()>();
    let mut worker = UpdateWorker::spawn(
        "flaky-update",
        Flaky {
            calls: 0,
            ticks: ticks_tx,
        },
        IntervalHandle::new(Duration::from_millis(30)),
        requests_rx,
    )
    .unwrap();

    for expected in 1..=3 {
        assert_eq!(ticks.recv_timeout(WAIT).unwrap(), expected);
    }
    assert!(worker.is_alive());
    assert!(worker.interrupt(Some(WAIT)));
}

struct Sleeper {
    done: Sender<()>,
}

impl UpdateStep for Sleeper {
    type Params = ();

    async fn update(&mut self, _params: Option<()>) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = self.done.send(());
        Ok(())
    }
}

#[test]
fn test_step_may_await_timers() {
    let (done_tx, done) = unbounded();
    let (_requests_tx, requests_rx) = unbounded::<()>();
    let mut worker = UpdateWorker::spawn(
        "sleeper-update",
        Sleeper { done: done_tx },
        IntervalHandle::new(Duration::from_millis(30)),
        requests_rx,
    )
    .unwrap();

    assert!(done.recv_timeout(WAIT).is_ok());
    assert!(done.recv_timeout(WAIT).is_ok());
    assert!(worker.is_alive());
    assert!(worker.interrupt(Some(WAIT)));
}

#[test]
fn test_zero_interval_still_serves_forced_requests() {
    let interval = IntervalHandle::new(Duration::ZERO);
    assert_eq!(interval.get(), MIN_INTERVAL);

    let (ticks_tx, ticks) = unbounded();
    let (requests_tx, requests_rx) = unbounded();
    let mut worker = UpdateWorker::spawn(
        "busy-update",
        Recorder { ticks: ticks_tx },
        interval,
        requests_rx,
    )
    .unwrap();

    ticks.recv_timeout(WAIT).unwrap();
    requests_tx.send(9).unwrap();

    let deadline = Instant::now() + WAIT;
    let mut served = false;
    while !served && Instant::now() < deadline {
        if let Ok((_, params)) = ticks.recv_timeout(WAIT) {
            served = params == Some(9);
        }
    }
    assert!(served);
    assert!(worker.interrupt(Some(WAIT)));
}
