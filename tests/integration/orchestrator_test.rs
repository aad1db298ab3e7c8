use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use sysbridge::core::config::Settings;
use sysbridge::core::modules::{
    Media, MediaSession, MediaStatus, Memory, ModuleBinding, ModuleName, ModuleSet, ModuleUpdate, Sensors,
};
use sysbridge::{DataUpdate, Result};

const WAIT: Duration = Duration::from_secs(5);

struct NoSensors;

impl ModuleUpdate for NoSensors {
    const NAME: ModuleName = ModuleName::Sensors;
    type Output = Sensors;

    fn update_all_data(&mut self) -> Result<Sensors> {
        Ok(Sensors::default())
    }
}

struct FixedMemory;

impl ModuleUpdate for FixedMemory {
    const NAME: ModuleName = ModuleName::Memory;
    type Output = Memory;

    fn update_all_data(&mut self) -> Result<Memory> {
        Ok(Memory {
            total_bytes: 8192,
            ..Default::default()
        })
    }
}

/// Always reports the same playback status.
struct StaticSession(MediaStatus);

impl MediaSession for StaticSession {
    fn current_media(&mut self) -> Result<Option<Media>> {
        Ok(Some(Media {
            updated_at: 1.0,
            status: Some(self.0),
            title: Some("Song".to_string()),
            ..Default::default()
        }))
    }
}

fn settings() -> Settings {
    Settings {
        data_interval_ms: 60_000,
        module_stagger_ms: 0,
        shutdown_timeout_ms: 1_000,
        ..Default::default()
    }
}

fn orchestrator() -> (DataUpdate, Receiver<ModuleName>) {
    let (tx, rx) = unbounded();
    let set = ModuleSet::new(NoSensors).register(ModuleBinding::new(FixedMemory));
    let update = DataUpdate::new(&settings(), set, move |name| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(name);
        }
    })
    .unwrap();
    (update, rx)
}

fn wait_for(notifications: &Receiver<ModuleName>, wanted: ModuleName) -> bool {
    while let Ok(name) = notifications.recv_timeout(WAIT) {
        if name == wanted {
            return true;
        }
    }
    false
}

#[test]
fn test_request_update_writes_state_and_notifies() {
    let (update, notifications) = orchestrator();

    update.request_update(None).unwrap();
    assert!(update.is_data_running());

    let mut seen = vec![
        notifications.recv_timeout(WAIT).unwrap(),
        notifications.recv_timeout(WAIT).unwrap(),
    ];
    seen.sort();
    assert_eq!(seen, vec![ModuleName::Memory, ModuleName::Sensors]);

    let data = update.data();
    assert_eq!(data.memory().map(|m| m.total_bytes), Some(8192));
    assert_eq!(data.sensors(), Some(Sensors::default()));
    assert!(data.cpu().is_none());

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_forced_update_while_running() {
    let (update, notifications) = orchestrator();

    update.request_update(None).unwrap();
    assert!(wait_for(&notifications, ModuleName::Memory));

    // The next natural tick is a minute away, so this one must be forced
    std::thread::sleep(Duration::from_millis(100));
    update.request_update(Some(vec![ModuleName::Memory])).unwrap();
    assert!(wait_for(&notifications, ModuleName::Memory));

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_request_update_restarts_interrupted_worker() {
    let (update, notifications) = orchestrator();

    update.request_update(None).unwrap();
    assert!(wait_for(&notifications, ModuleName::Memory));

    assert!(update.interrupt_data(Some(WAIT)));
    assert!(!update.is_data_running());
    std::thread::sleep(Duration::from_millis(100));

    update.request_update(None).unwrap();
    assert!(update.is_data_running());
    assert!(wait_for(&notifications, ModuleName::Memory));

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_media_heartbeat_without_session() {
    let (update, notifications) = orchestrator();

    update.request_media_update().unwrap();
    assert!(wait_for(&notifications, ModuleName::Media));

    let media = update.data().media().unwrap();
    assert!(media.updated_at > 0.0);
    assert_eq!(
        media,
        Media {
            updated_at: media.updated_at,
            ..Default::default()
        }
    );

    // Only the media field was written
    assert_eq!(update.data().populated(), vec![ModuleName::Media]);

    // Already running: no-op
    update.request_media_update().unwrap();
    assert!(update.is_media_running());
    assert!(notifications.recv_timeout(Duration::from_millis(300)).is_err());

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_media_interval_follows_playback() {
    let (update, notifications) = orchestrator();
    let update = update.with_media_session(Box::new(StaticSession(MediaStatus::Playing)));

    update.request_media_update().unwrap();
    assert!(wait_for(&notifications, ModuleName::Media));

    assert_eq!(update.media_interval(), Duration::from_secs(5));
    assert_eq!(update.data().media().and_then(|m| m.title), Some("Song".to_string()));

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_media_interval_idle_when_paused() {
    let (update, notifications) = orchestrator();
    update.set_media_interval(Duration::from_secs(5));
    let update = update.with_media_session(Box::new(StaticSession(MediaStatus::Paused)));

    update.request_media_update().unwrap();
    assert!(wait_for(&notifications, ModuleName::Media));
    assert_eq!(update.media_interval(), Duration::from_secs(20));

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_interrupts_stop_both_schedules() {
    let (update, notifications) = orchestrator();

    update.request_update(None).unwrap();
    update.request_media_update().unwrap();
    assert!(wait_for(&notifications, ModuleName::Media));

    assert!(update.interrupt_data(Some(WAIT)));
    assert!(update.interrupt_media(Some(WAIT)));
    assert!(!update.is_data_running());
    assert!(!update.is_media_running());

    update.shutdown(Duration::from_secs(1));
}

#[test]
fn test_drop_without_shutdown() {
    let (update, notifications) = orchestrator();
    update.request_update(None).unwrap();
    assert!(wait_for(&notifications, ModuleName::Memory));
    drop(update);
}
